//! Database schema, applied idempotently whenever a [`super::Database`] is opened.

pub(super) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS ticket_types (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    title TEXT NOT NULL,
    description TEXT,
    price INTEGER NOT NULL CHECK (price >= 0),
    total INTEGER NOT NULL CHECK (total >= 0),
    available INTEGER NOT NULL CHECK (available >= 0),
    booked INTEGER NOT NULL CHECK (booked >= 0),
    sold INTEGER NOT NULL CHECK (sold >= 0),
    status TEXT NOT NULL,
    is_presale INTEGER NOT NULL DEFAULT 0,
    order_priority INTEGER NOT NULL DEFAULT 0,
    deleted INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK (available + booked + sold = total)
);

CREATE INDEX IF NOT EXISTS idx_ticket_types_priority ON ticket_types(order_priority);

CREATE TABLE IF NOT EXISTS registrants (
    id TEXT PRIMARY KEY,
    unique_code TEXT NOT NULL UNIQUE,
    ticket_id TEXT NOT NULL REFERENCES ticket_types(id),
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    phone TEXT NOT NULL,
    gender TEXT,
    birthdate TEXT,
    total_cost INTEGER NOT NULL,
    total_tickets INTEGER NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_registrants_email ON registrants(email);

CREATE TABLE IF NOT EXISTS attendees (
    id TEXT PRIMARY KEY,
    registrant_id TEXT NOT NULL REFERENCES registrants(id),
    ticket_id TEXT NOT NULL REFERENCES ticket_types(id),
    name TEXT NOT NULL,
    gender TEXT,
    birthdate TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_attendees_registrant_id ON attendees(registrant_id);

CREATE TABLE IF NOT EXISTS orders (
    id TEXT PRIMARY KEY,
    registrant_id TEXT NOT NULL UNIQUE REFERENCES registrants(id),
    order_number TEXT NOT NULL UNIQUE,
    amount INTEGER NOT NULL,
    currency TEXT NOT NULL,
    payment_gateway TEXT NOT NULL,
    payment_method TEXT,
    payment_status TEXT NOT NULL,
    payment_token TEXT,
    payment_url TEXT,
    payment_transaction_id TEXT,
    payment_metadata TEXT,
    payment_time TEXT,
    expires_at TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_orders_payment_status ON orders(payment_status);
"#;
