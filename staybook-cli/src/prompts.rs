use anyhow::Result;
use chrono::NaiveDate;
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode, Select, Text};

use staybook_core::{PaymentStatus, Room, RoomStatus};

/// Prompts for a password without echo or confirmation
pub fn prompt_password(label: &str) -> Result<String> {
    let password = Password::new(label)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    Ok(password)
}

/// Prompts for a new password and its confirmation, returned separately so
/// the caller's validation can report a mismatch
pub fn prompt_new_password(label: &str) -> Result<(String, String)> {
    let password = prompt_password(label)?;
    let confirm = prompt_password("Confirm password:")?;
    Ok((password, confirm))
}

/// Prompts the user to pick a branch from the login list
pub fn prompt_select_branch(names: Vec<String>) -> Result<String> {
    if names.is_empty() {
        anyhow::bail!("No branches found. Ask the administrator to add one.");
    }
    Ok(Select::new("Branch:", names).prompt()?)
}

pub fn prompt_text(label: &str) -> Result<String> {
    Ok(Text::new(label).prompt()?)
}

/// Prompts for text, keeping `default` when the answer is left blank
pub fn prompt_text_with_default(label: &str, default: &str) -> Result<String> {
    Ok(Text::new(label).with_default(default).prompt()?)
}

/// Prompts for a status, starting on the current one
pub fn prompt_room_status(current: RoomStatus) -> Result<RoomStatus> {
    let options = RoomStatus::ALL.to_vec();
    let start = options.iter().position(|s| *s == current).unwrap_or(0);
    Ok(Select::new("Status:", options).with_starting_cursor(start).prompt()?)
}

/// Prompts for a room type, offering the common ones
pub fn prompt_room_type() -> Result<String> {
    let options = vec!["Single", "Double", "Twin", "Deluxe", "Suite", "Family", "Other"];
    let choice = Select::new("Room type:", options).prompt()?;
    if choice == "Other" {
        return prompt_text("Room type name:");
    }
    Ok(choice.to_string())
}

/// Initial status of a new room; occupancy only comes from reservations
pub fn prompt_new_room_status() -> Result<RoomStatus> {
    let options = vec![RoomStatus::Available, RoomStatus::Maintenance];
    Ok(Select::new("Status:", options).prompt()?)
}

pub fn prompt_payment_status(current: PaymentStatus) -> Result<PaymentStatus> {
    let options = PaymentStatus::ALL.to_vec();
    let start = options.iter().position(|s| *s == current).unwrap_or(0);
    Ok(Select::new("Payment status:", options)
        .with_starting_cursor(start)
        .prompt()?)
}

/// Prompts for one of the given rooms and returns its number
pub fn prompt_select_room(rooms: &[Room]) -> Result<i64> {
    if rooms.is_empty() {
        anyhow::bail!("No available rooms. Add a room or cancel a reservation first.");
    }

    let options: Vec<String> = rooms
        .iter()
        .map(|r| {
            format!(
                "{} - {} ({} guests, {:.2})",
                r.room_number, r.room_type, r.capacity, r.price_rate
            )
        })
        .collect();

    let selection = Select::new("Room:", options.clone()).prompt()?;
    let index = options
        .iter()
        .position(|o| o == &selection)
        .ok_or_else(|| anyhow::anyhow!("Room selection failed"))?;
    Ok(rooms[index].room_number)
}

pub fn prompt_date(label: &str, default: NaiveDate) -> Result<NaiveDate> {
    let date = CustomType::<NaiveDate>::new(label)
        .with_default(default)
        .with_help_message("YYYY-MM-DD")
        .with_error_message("Please enter a date as YYYY-MM-DD")
        .prompt()?;
    Ok(date)
}

/// Asks before a destructive action
pub fn confirm(message: &str) -> Result<bool> {
    Ok(Confirm::new(message).with_default(false).prompt()?)
}
