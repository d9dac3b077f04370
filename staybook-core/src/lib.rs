pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod manager;
pub mod models;
pub mod password;
pub mod shard;
pub mod validation;

// Re-export commonly used types
pub use config::{get_config_path, Config};
pub use db::{AccountDatabase, HotelDatabase};
pub use error::{HotelError, Result};
pub use filter::{ReservationFilter, RoomFilter};
pub use manager::Staybook;
pub use models::{
    Branch, BranchDraft, DashboardSummary, PaymentStatus, ReconcileReport, Reservation,
    ReservationDraft, Room, RoomDraft, RoomStatus, Session, ADMINISTRATOR, DATE_FORMAT,
};
pub use shard::BranchDirectory;
