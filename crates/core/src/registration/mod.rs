//! Registration: turning a purchase request into booked stock, a registrant
//! with attendees, and a pending order.

mod codes;
mod repository;
mod types;
mod workflow;

pub use codes::{code_suffix, Codes, MAX_CODE_ATTEMPTS};
pub use repository::RegistrantRepository;
pub use types::{
    Attendee, AttendeeData, RegisterRequest, RegisterResponse, Registrant, RegistrantData,
    RegistrationError, TicketDemand,
};
pub use workflow::{gateway_deadline, RegistrationService};
