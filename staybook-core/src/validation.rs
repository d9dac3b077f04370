//! Form validation applied before any write reaches a database
//!
//! Every check returns `HotelError::Validation` carrying the message shown
//! to the operator. Text fields are trimmed first.

use chrono::NaiveDate;

use crate::error::{HotelError, Result};
use crate::models::{BranchDraft, ReservationDraft, RoomDraft, RoomStatus};

/// Default minimum password length for administrator and branch accounts
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

const FILL_ALL_FIELDS: &str = "Please fill in all fields";

/// Builds a room draft from raw form text
pub fn parse_room_form(
    room_type: &str,
    price_rate: &str,
    capacity: &str,
    status: RoomStatus,
    description: &str,
) -> Result<RoomDraft> {
    let price_rate = price_rate.trim();
    let capacity = capacity.trim();

    if price_rate.is_empty() || capacity.is_empty() {
        return Err(HotelError::validation(FILL_ALL_FIELDS));
    }

    let (price_rate, capacity) = match (price_rate.parse::<f64>(), capacity.parse::<u32>()) {
        (Ok(p), Ok(c)) => (p, c),
        _ => {
            return Err(HotelError::validation(
                "Price must be a number and capacity must be a whole number",
            ))
        }
    };

    let draft = RoomDraft {
        room_type: room_type.trim().to_string(),
        price_rate,
        status,
        capacity,
        description: description.trim().to_string(),
    };
    validate_room(&draft)?;
    Ok(draft)
}

/// Checks a room draft
pub fn validate_room(draft: &RoomDraft) -> Result<()> {
    if draft.room_type.trim().is_empty() {
        return Err(HotelError::validation(FILL_ALL_FIELDS));
    }
    if !draft.price_rate.is_finite() || draft.price_rate < 0.0 {
        return Err(HotelError::validation("Price must be a non-negative number"));
    }
    if draft.capacity == 0 {
        return Err(HotelError::validation("Capacity must be at least 1"));
    }
    Ok(())
}

/// True when the contact is a non-empty run of ASCII digits
pub fn is_valid_contact(contact: &str) -> bool {
    !contact.is_empty() && contact.chars().all(|c| c.is_ascii_digit())
}

/// Checks a reservation draft.
///
/// `earliest_checkin` is today's date for new reservations. Edits pass
/// `None` so that stays already in progress can still be changed.
pub fn validate_reservation(
    draft: &ReservationDraft,
    earliest_checkin: Option<NaiveDate>,
) -> Result<()> {
    if draft.guest_name.trim().is_empty() || draft.contact.trim().is_empty() {
        return Err(HotelError::validation(FILL_ALL_FIELDS));
    }

    if !is_valid_contact(draft.contact.trim()) {
        return Err(HotelError::validation("Contact must only consist of digits"));
    }

    if draft.checkout_date <= draft.checkin_date {
        return Err(HotelError::validation(
            "Check-out date must be after the check-in date.",
        ));
    }

    if let Some(earliest) = earliest_checkin {
        if draft.checkin_date < earliest {
            return Err(HotelError::validation("Check-in date cannot be in the past."));
        }
    }

    Ok(())
}

/// Trims every text field of a reservation draft
pub fn normalize_reservation(draft: &ReservationDraft) -> ReservationDraft {
    ReservationDraft {
        guest_name: draft.guest_name.trim().to_string(),
        contact: draft.contact.trim().to_string(),
        ..draft.clone()
    }
}

/// Trims every text field of a branch draft
pub fn normalize_branch(draft: &BranchDraft) -> BranchDraft {
    BranchDraft {
        username: draft.username.trim().to_string(),
        address: draft.address.trim().to_string(),
        contact: draft.contact.trim().to_string(),
        password: draft.password.trim().to_string(),
        confirm_password: draft.confirm_password.trim().to_string(),
    }
}

/// Checks a branch draft (already normalized)
pub fn validate_branch(draft: &BranchDraft, min_password_length: usize) -> Result<()> {
    if draft.username.is_empty()
        || draft.password.is_empty()
        || draft.confirm_password.is_empty()
        || draft.address.is_empty()
        || draft.contact.is_empty()
    {
        return Err(HotelError::validation(FILL_ALL_FIELDS));
    }

    if draft.password != draft.confirm_password {
        return Err(HotelError::validation("Passwords do not match"));
    }

    check_password_length(&draft.password, min_password_length)?;

    if !is_valid_contact(&draft.contact) {
        return Err(HotelError::validation("Contact must only consist of digits"));
    }

    Ok(())
}

/// Checks a branch edit. Leaving both password fields blank keeps the
/// current password, so only the other fields are checked then.
pub fn validate_branch_update(draft: &BranchDraft, min_password_length: usize) -> Result<()> {
    if !draft.keeps_password() {
        return validate_branch(draft, min_password_length);
    }

    if draft.username.is_empty() || draft.address.is_empty() || draft.contact.is_empty() {
        return Err(HotelError::validation(FILL_ALL_FIELDS));
    }

    if !is_valid_contact(&draft.contact) {
        return Err(HotelError::validation("Contact must only consist of digits"));
    }

    Ok(())
}

/// Checks the administrator password form
pub fn validate_admin_password(
    password: &str,
    confirm_password: &str,
    min_password_length: usize,
) -> Result<()> {
    let password = password.trim();
    let confirm_password = confirm_password.trim();

    if password.is_empty() || confirm_password.is_empty() {
        return Err(HotelError::validation(
            "Please enter both password and confirm password.",
        ));
    }

    check_password_length(password, min_password_length)?;

    if password != confirm_password {
        return Err(HotelError::validation("Passwords do not match."));
    }

    Ok(())
}

fn check_password_length(password: &str, min_password_length: usize) -> Result<()> {
    if password.chars().count() < min_password_length {
        return Err(HotelError::Validation(format!(
            "Password must be at least {} characters",
            min_password_length
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reservation_draft() -> ReservationDraft {
        ReservationDraft {
            guest_name: "Juan Dela Cruz".to_string(),
            contact: "09171234567".to_string(),
            room_number: 1,
            checkin_date: date(2026, 5, 1),
            checkout_date: date(2026, 5, 3),
            payment_status: PaymentStatus::Unpaid,
        }
    }

    fn branch_draft() -> BranchDraft {
        BranchDraft {
            username: "iloilo".to_string(),
            address: "Iznart St".to_string(),
            contact: "0331234".to_string(),
            password: "secret123".to_string(),
            confirm_password: "secret123".to_string(),
        }
    }

    fn message(err: HotelError) -> String {
        match err {
            HotelError::Validation(msg) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_room_form() {
        let draft =
            parse_room_form(" Deluxe ", "2500.50", " 2 ", RoomStatus::Available, " Sea view ")
                .unwrap();
        assert_eq!(draft.room_type, "Deluxe");
        assert_eq!(draft.price_rate, 2500.50);
        assert_eq!(draft.capacity, 2);
        assert_eq!(draft.description, "Sea view");
    }

    #[test]
    fn test_parse_room_form_rejects_missing_and_bad_numbers() {
        let err = parse_room_form("Deluxe", "", "2", RoomStatus::Available, "").unwrap_err();
        assert_eq!(message(err), "Please fill in all fields");

        let err = parse_room_form("Deluxe", "abc", "2", RoomStatus::Available, "").unwrap_err();
        assert_eq!(
            message(err),
            "Price must be a number and capacity must be a whole number"
        );

        let err = parse_room_form("Deluxe", "100", "2.5", RoomStatus::Available, "").unwrap_err();
        assert!(matches!(err, HotelError::Validation(_)));

        let err = parse_room_form("Deluxe", "-1", "2", RoomStatus::Available, "").unwrap_err();
        assert!(matches!(err, HotelError::Validation(_)));

        let err = parse_room_form("Deluxe", "100", "0", RoomStatus::Available, "").unwrap_err();
        assert!(matches!(err, HotelError::Validation(_)));
    }

    #[test]
    fn test_reservation_validation() {
        assert!(validate_reservation(&reservation_draft(), None).is_ok());

        let mut draft = reservation_draft();
        draft.contact = "0917-123".to_string();
        assert_eq!(
            message(validate_reservation(&draft, None).unwrap_err()),
            "Contact must only consist of digits"
        );

        let mut draft = reservation_draft();
        draft.checkout_date = draft.checkin_date;
        assert_eq!(
            message(validate_reservation(&draft, None).unwrap_err()),
            "Check-out date must be after the check-in date."
        );

        let mut draft = reservation_draft();
        draft.guest_name = "  ".to_string();
        assert_eq!(
            message(validate_reservation(&draft, None).unwrap_err()),
            "Please fill in all fields"
        );
    }

    #[test]
    fn test_reservation_checkin_not_in_past() {
        let draft = reservation_draft();
        assert!(validate_reservation(&draft, Some(date(2026, 5, 1))).is_ok());
        assert!(validate_reservation(&draft, Some(date(2026, 5, 2))).is_err());
    }

    #[test]
    fn test_branch_validation_order() {
        assert!(validate_branch(&branch_draft(), 8).is_ok());

        let mut draft = branch_draft();
        draft.address.clear();
        assert_eq!(message(validate_branch(&draft, 8).unwrap_err()), "Please fill in all fields");

        let mut draft = branch_draft();
        draft.confirm_password = "secret124".to_string();
        assert_eq!(message(validate_branch(&draft, 8).unwrap_err()), "Passwords do not match");

        let mut draft = branch_draft();
        draft.password = "short".to_string();
        draft.confirm_password = "short".to_string();
        assert_eq!(
            message(validate_branch(&draft, 8).unwrap_err()),
            "Password must be at least 8 characters"
        );

        let mut draft = branch_draft();
        draft.contact = "call me".to_string();
        assert_eq!(
            message(validate_branch(&draft, 8).unwrap_err()),
            "Contact must only consist of digits"
        );
    }

    #[test]
    fn test_branch_update_can_keep_password() {
        let mut draft = branch_draft();
        draft.password.clear();
        draft.confirm_password.clear();
        assert!(validate_branch_update(&draft, 8).is_ok());

        draft.password = "newpassword".to_string();
        assert_eq!(
            message(validate_branch_update(&draft, 8).unwrap_err()),
            "Please fill in all fields"
        );
    }

    #[test]
    fn test_normalize_branch_trims() {
        let draft = BranchDraft {
            username: "  bacolod ".to_string(),
            ..branch_draft()
        };
        assert_eq!(normalize_branch(&draft).username, "bacolod");
    }

    #[test]
    fn test_admin_password_validation() {
        assert!(validate_admin_password("adminpass", "adminpass", 8).is_ok());
        assert_eq!(
            message(validate_admin_password("", "adminpass", 8).unwrap_err()),
            "Please enter both password and confirm password."
        );
        assert_eq!(
            message(validate_admin_password("short", "short", 8).unwrap_err()),
            "Password must be at least 8 characters"
        );
        assert_eq!(
            message(validate_admin_password("adminpass", "adminpasz", 8).unwrap_err()),
            "Passwords do not match."
        );
    }
}
