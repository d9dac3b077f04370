use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use colored::{ColoredString, Colorize};

use staybook_core::{
    Branch, DashboardSummary, PaymentStatus, ReconcileReport, Reservation, Room, RoomStatus,
    DATE_FORMAT,
};

pub fn room_status(status: RoomStatus) -> ColoredString {
    colour_room_status(status.as_str(), status)
}

pub fn payment_status(status: PaymentStatus) -> ColoredString {
    match status {
        PaymentStatus::Paid => status.as_str().green(),
        PaymentStatus::Partial => status.as_str().yellow(),
        PaymentStatus::Unpaid => status.as_str().red(),
    }
}

/// Formats a date with the configured format, falling back to YYYY-MM-DD
/// when the format string is invalid
pub fn format_date(date: NaiveDate, format: &str) -> String {
    let items = StrftimeItems::new(format);
    if items.clone().any(|item| matches!(item, Item::Error)) {
        return date.format(DATE_FORMAT).to_string();
    }
    date.format_with_items(items).to_string()
}

pub fn print_rooms(rooms: &[Room]) {
    if rooms.is_empty() {
        println!("{}", "No rooms found.".yellow());
        return;
    }

    println!(
        "{:<6} | {:<12} | {:>10} | {:<11} | {:>8} | {}",
        "Room", "Type", "Rate", "Status", "Capacity", "Description"
    );
    println!("{}", "-".repeat(80));

    for room in rooms {
        // Pad before colouring so escape codes do not break alignment
        let status = format!("{:<11}", room.status.as_str());
        println!(
            "{:<6} | {:<12} | {:>10.2} | {} | {:>8} | {}",
            room.room_number,
            truncate(&room.room_type, 12),
            room.price_rate,
            colour_room_status(&status, room.status),
            room.capacity,
            truncate(&room.description, 30)
        );
    }
}

pub fn print_room(room: &Room) {
    println!("{} {}", "Room".bold(), room.room_number.to_string().bold());
    println!("Type:        {}", room.room_type);
    println!("Rate:        {:.2}", room.price_rate);
    println!("Status:      {}", room_status(room.status));
    println!("Capacity:    {}", room.capacity);
    println!("Description: {}", room.description);
}

pub fn print_reservations(reservations: &[Reservation], date_format: &str) {
    if reservations.is_empty() {
        println!("{}", "No reservations found.".yellow());
        return;
    }

    println!(
        "{:<5} | {:<24} | {:<13} | {:<5} | {:<13} | {:<13} | {}",
        "ID", "Guest", "Contact", "Room", "Check-in", "Check-out", "Payment"
    );
    println!("{}", "-".repeat(100));

    for r in reservations {
        println!(
            "{:<5} | {:<24} | {:<13} | {:<5} | {:<13} | {:<13} | {}",
            r.guest_id,
            truncate(&r.guest_name, 24),
            r.contact,
            r.room_number,
            format_date(r.checkin_date, date_format),
            format_date(r.checkout_date, date_format),
            payment_status(r.payment_status)
        );
    }
}

pub fn print_reservation(r: &Reservation, date_format: &str) {
    println!("{} {}", "Reservation".bold(), r.guest_id.to_string().bold());
    println!("Guest:     {}", r.guest_name);
    println!("Contact:   {}", r.contact);
    println!("Room:      {}", r.room_number);
    println!("Check-in:  {}", format_date(r.checkin_date, date_format));
    println!("Check-out: {}", format_date(r.checkout_date, date_format));
    println!("Nights:    {}", r.nights());
    println!("Payment:   {}", payment_status(r.payment_status));
}

pub fn print_branches(branches: &[Branch]) {
    if branches.is_empty() {
        println!("{}", "No branches found.".yellow());
        return;
    }

    println!("{:<5} | {:<20} | {:<30} | {}", "UID", "Username", "Address", "Contact");
    println!("{}", "-".repeat(80));
    for b in branches {
        println!(
            "{:<5} | {:<20} | {:<30} | {}",
            b.uid,
            b.username,
            truncate(&b.address, 30),
            b.contact
        );
    }
}

pub fn print_branch(branch: &Branch) {
    println!("{} {}", "Branch".bold(), branch.username.bold());
    println!("UID:     {}", branch.uid);
    println!("Address: {}", branch.address);
    println!("Contact: {}", branch.contact);
}

pub fn print_summary(branch: &str, summary: &DashboardSummary) {
    println!("{} {}", "Dashboard for".bold(), branch.bold());
    println!("{}", "-".repeat(40));
    println!("Rooms:            {}", summary.total_rooms);
    println!("  Available:      {}", summary.available_rooms.to_string().green());
    println!("  Occupied:       {}", summary.occupied_rooms.to_string().red());
    println!("  Maintenance:    {}", summary.maintenance_rooms.to_string().yellow());
    println!("Occupancy:        {:.0}%", summary.occupancy_rate() * 100.0);
    println!("Reservations:     {}", summary.reservations);
    println!("Unsettled:        {}", summary.outstanding_payments);
}

pub fn print_reconcile_report(report: &ReconcileReport) {
    if report.is_clean() {
        println!("{}", "All room statuses match their reservations.".green());
        return;
    }
    for room in &report.normalized {
        println!("Room {} status text normalized", room);
    }
    for room in &report.marked_occupied {
        println!("Room {} marked {}", room, room_status(RoomStatus::Occupied));
    }
    for room in &report.marked_available {
        println!("Room {} marked {}", room, room_status(RoomStatus::Available));
    }
}

fn colour_room_status(text: &str, status: RoomStatus) -> ColoredString {
    match status {
        RoomStatus::Available => text.green(),
        RoomStatus::Occupied => text.red(),
        RoomStatus::Maintenance => text.yellow(),
    }
}

/// Shortens text to `max` characters, marking the cut with "..."
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Suite", 12), "Suite");
        assert_eq!(truncate("Presidential Suite", 12), "President...");
        assert_eq!(truncate("abcdef", 3), "...");
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(format_date(date, "%b %d, %Y"), "Oct 19, 2026");
        assert_eq!(format_date(date, "%Y-%m-%d"), "2026-10-19");
        assert_eq!(format_date(date, "%Q bogus"), "2026-10-19");
    }
}
