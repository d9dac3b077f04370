use chrono::NaiveDate;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Date format used for reservation dates in the database
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Display name used for the administrator session
pub const ADMINISTRATOR: &str = "Administrator";

/// Represents the occupancy status of a room
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RoomStatus {
    #[default]
    Available,
    Occupied,
    Maintenance,
}

impl RoomStatus {
    /// All statuses in display order
    pub const ALL: [RoomStatus; 3] = [
        RoomStatus::Available,
        RoomStatus::Occupied,
        RoomStatus::Maintenance,
    ];

    /// Text stored in the `status` column
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "Available",
            RoomStatus::Occupied => "Occupied",
            RoomStatus::Maintenance => "Maintenance",
        }
    }

    /// Lowercase spellings read as this status, including older aliases
    pub fn spellings(&self) -> &'static [&'static str] {
        match self {
            RoomStatus::Available => &["available"],
            RoomStatus::Occupied => &["occupied"],
            RoomStatus::Maintenance => &["maintenance", "under-maintenance", "under maintenance"],
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        RoomStatus::ALL
            .into_iter()
            .find(|status| status.spellings().contains(&lower.as_str()))
            .ok_or_else(|| {
                format!(
                    "Invalid room status: {}. Valid values: available, occupied, maintenance",
                    s
                )
            })
    }
}

/// Represents the payment state of a reservation
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [
        PaymentStatus::Unpaid,
        PaymentStatus::Partial,
        PaymentStatus::Paid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::Partial => "Partial",
            PaymentStatus::Paid => "Paid",
        }
    }

    /// Lowercase spellings read as this status, including older aliases
    pub fn spellings(&self) -> &'static [&'static str] {
        match self {
            PaymentStatus::Unpaid => &["unpaid", "pending"],
            PaymentStatus::Partial => &["partial", "partially-paid"],
            PaymentStatus::Paid => &["paid"],
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        PaymentStatus::ALL
            .into_iter()
            .find(|status| status.spellings().contains(&lower.as_str()))
            .ok_or_else(|| {
                format!(
                    "Invalid payment status: {}. Valid values: unpaid, partial, paid",
                    s
                )
            })
    }
}

/// A room in a branch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    /// Assigned by the database
    pub room_number: i64,
    pub room_type: String,
    /// Nightly rate
    pub price_rate: f64,
    pub status: RoomStatus,
    pub capacity: u32,
    pub description: String,
}

/// Field values for creating or editing a room
#[derive(Debug, Clone, PartialEq)]
pub struct RoomDraft {
    pub room_type: String,
    pub price_rate: f64,
    pub status: RoomStatus,
    pub capacity: u32,
    pub description: String,
}

impl RoomDraft {
    pub fn new(room_type: impl Into<String>, price_rate: f64, capacity: u32) -> Self {
        Self {
            room_type: room_type.into(),
            price_rate,
            status: RoomStatus::Available,
            capacity,
            description: String::new(),
        }
    }

    /// Starts a draft from an existing room, for partial edits
    pub fn from_room(room: &Room) -> Self {
        Self {
            room_type: room.room_type.clone(),
            price_rate: room.price_rate,
            status: room.status,
            capacity: room.capacity,
            description: room.description.clone(),
        }
    }
}

/// A guest reservation holding one room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reservation {
    pub guest_id: i64,
    pub guest_name: String,
    pub contact: String,
    pub room_number: i64,
    pub checkin_date: NaiveDate,
    pub checkout_date: NaiveDate,
    pub payment_status: PaymentStatus,
}

impl Reservation {
    /// Number of nights between check-in and check-out
    pub fn nights(&self) -> i64 {
        (self.checkout_date - self.checkin_date).num_days()
    }
}

/// Field values for creating or editing a reservation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationDraft {
    pub guest_name: String,
    pub contact: String,
    pub room_number: i64,
    pub checkin_date: NaiveDate,
    pub checkout_date: NaiveDate,
    pub payment_status: PaymentStatus,
}

impl ReservationDraft {
    pub fn from_reservation(reservation: &Reservation) -> Self {
        Self {
            guest_name: reservation.guest_name.clone(),
            contact: reservation.contact.clone(),
            room_number: reservation.room_number,
            checkin_date: reservation.checkin_date,
            checkout_date: reservation.checkout_date,
            payment_status: reservation.payment_status,
        }
    }
}

/// A branch account. The branch username also names its database file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Branch {
    pub uid: i64,
    pub username: String,
    pub address: String,
    pub contact: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Field values for creating or editing a branch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchDraft {
    pub username: String,
    pub address: String,
    pub contact: String,
    pub password: String,
    pub confirm_password: String,
}

impl BranchDraft {
    /// Starts an edit draft from an existing branch, keeping its password
    pub fn from_branch(branch: &Branch) -> Self {
        Self {
            username: branch.username.clone(),
            address: branch.address.clone(),
            contact: branch.contact.clone(),
            password: String::new(),
            confirm_password: String::new(),
        }
    }

    /// True when an edit leaves the password unchanged
    pub fn keeps_password(&self) -> bool {
        self.password.is_empty() && self.confirm_password.is_empty()
    }
}

/// An authenticated login
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Administrator,
    Branch(String),
}

impl Session {
    pub fn display_name(&self) -> &str {
        match self {
            Session::Administrator => ADMINISTRATOR,
            Session::Branch(name) => name,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Session::Administrator)
    }
}

/// Dashboard figures for a branch. Serializes with its occupancy rate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSummary {
    pub total_rooms: usize,
    pub available_rooms: usize,
    pub occupied_rooms: usize,
    pub maintenance_rooms: usize,
    pub reservations: usize,
    /// Reservations that are not fully paid
    pub outstanding_payments: usize,
}

impl DashboardSummary {
    /// Share of rooms that are occupied, from 0.0 to 1.0
    pub fn occupancy_rate(&self) -> f64 {
        if self.total_rooms == 0 {
            0.0
        } else {
            self.occupied_rooms as f64 / self.total_rooms as f64
        }
    }
}

impl Serialize for DashboardSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DashboardSummary", 7)?;
        state.serialize_field("total_rooms", &self.total_rooms)?;
        state.serialize_field("available_rooms", &self.available_rooms)?;
        state.serialize_field("occupied_rooms", &self.occupied_rooms)?;
        state.serialize_field("maintenance_rooms", &self.maintenance_rooms)?;
        state.serialize_field("reservations", &self.reservations)?;
        state.serialize_field("outstanding_payments", &self.outstanding_payments)?;
        state.serialize_field("occupancy_rate", &self.occupancy_rate())?;
        state.end()
    }
}

/// Rooms whose status was corrected by a reconcile pass
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Rooms whose stored status text was rewritten in its canonical form
    pub normalized: Vec<i64>,
    pub marked_occupied: Vec<i64>,
    pub marked_available: Vec<i64>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.normalized.is_empty()
            && self.marked_occupied.is_empty()
            && self.marked_available.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_status_parse() {
        assert_eq!("available".parse::<RoomStatus>(), Ok(RoomStatus::Available));
        assert_eq!(" Occupied ".parse::<RoomStatus>(), Ok(RoomStatus::Occupied));
        assert_eq!(
            "under-maintenance".parse::<RoomStatus>(),
            Ok(RoomStatus::Maintenance)
        );
        assert!("booked".parse::<RoomStatus>().is_err());
    }

    #[test]
    fn test_payment_status_parse() {
        assert_eq!("PAID".parse::<PaymentStatus>(), Ok(PaymentStatus::Paid));
        assert_eq!("pending".parse::<PaymentStatus>(), Ok(PaymentStatus::Unpaid));
        assert!("free".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_reservation_nights() {
        let reservation = Reservation {
            guest_id: 1,
            guest_name: "Ana".to_string(),
            contact: "0917".to_string(),
            room_number: 1,
            checkin_date: NaiveDate::from_ymd_opt(2026, 3, 30).unwrap(),
            checkout_date: NaiveDate::from_ymd_opt(2026, 4, 2).unwrap(),
            payment_status: PaymentStatus::Paid,
        };
        assert_eq!(reservation.nights(), 3);
    }

    #[test]
    fn test_occupancy_rate() {
        let empty = DashboardSummary::default();
        assert_eq!(empty.occupancy_rate(), 0.0);

        let summary = DashboardSummary {
            total_rooms: 4,
            occupied_rooms: 1,
            ..Default::default()
        };
        assert!((summary.occupancy_rate() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_serializes_occupancy_rate() {
        let summary = DashboardSummary {
            total_rooms: 4,
            occupied_rooms: 2,
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&summary).unwrap();
        assert!(yaml.contains("occupancy_rate: 0.5"));
        assert!(yaml.contains("total_rooms: 4"));
    }

    #[test]
    fn test_status_spellings_round_trip_through_parse() {
        for status in RoomStatus::ALL {
            for spelling in status.spellings() {
                assert_eq!(spelling.to_uppercase().parse::<RoomStatus>(), Ok(status));
            }
        }
        for status in PaymentStatus::ALL {
            for spelling in status.spellings() {
                assert_eq!(spelling.parse::<PaymentStatus>(), Ok(status));
            }
        }
    }

    #[test]
    fn test_session_display_name() {
        assert_eq!(Session::Administrator.display_name(), "Administrator");
        assert_eq!(Session::Branch("iloilo".to_string()).display_name(), "iloilo");
        assert!(Session::Administrator.is_admin());
    }
}
