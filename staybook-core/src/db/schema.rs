//! Table definitions for the branch and accounts databases

/// Current schema version for both database kinds
pub const SCHEMA_VERSION: i32 = 1;

pub(crate) const VERSION_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    );
";

pub(crate) const HOTEL_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS rooms (
        room_number INTEGER PRIMARY KEY AUTOINCREMENT,
        type TEXT,
        price_rate REAL,
        status TEXT DEFAULT 'Available',
        capacity INTEGER,
        description TEXT
    );

    CREATE TABLE IF NOT EXISTS reservations (
        guest_id INTEGER PRIMARY KEY AUTOINCREMENT,
        guest_name TEXT NOT NULL,
        contact TEXT,
        room_number INTEGER,
        checkin_date TEXT,
        checkout_date TEXT,
        payment_status TEXT,
        FOREIGN KEY (room_number) REFERENCES rooms(room_number)
    );

    CREATE INDEX IF NOT EXISTS idx_reservations_room ON reservations(room_number);
";

pub(crate) const ACCOUNTS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS admin_table (
        admin_id INTEGER PRIMARY KEY AUTOINCREMENT,
        password TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS branches_table (
        uid INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT UNIQUE NOT NULL,
        address TEXT NOT NULL,
        contact TEXT NOT NULL,
        password TEXT NOT NULL
    );
";
