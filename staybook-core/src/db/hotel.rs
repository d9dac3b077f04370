//! Branch database: rooms and reservations
//!
//! A room's status mirrors whether a reservation holds it. Every operation
//! that changes a reservation also moves the affected room statuses, inside
//! the same transaction, so the two tables never disagree after a commit.

use chrono::{Local, NaiveDate};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

use crate::error::{HotelError, Result};
use crate::filter::{ReservationFilter, RoomFilter};
use crate::models::{
    DashboardSummary, PaymentStatus, ReconcileReport, Reservation, ReservationDraft, Room,
    RoomDraft, RoomStatus, DATE_FORMAT,
};
use crate::validation::{normalize_reservation, validate_reservation, validate_room};

use super::schema::HOTEL_SCHEMA;

const ROOM_COLUMNS: &str = "room_number, type, price_rate, status, capacity, description";

const RESERVATION_COLUMNS: &str = "guest_id, guest_name, contact, room_number, checkin_date, \
                                   checkout_date, payment_status";

/// Rooms and reservations of a single branch
pub struct HotelDatabase {
    path: PathBuf,
    conn: Connection,
}

impl HotelDatabase {
    /// Opens (creating if needed) the branch database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = super::open_connection(&path, HOTEL_SCHEMA)?;
        Ok(Self { path, conn })
    }

    #[cfg(test)]
    pub(crate) fn in_memory() -> Result<Self> {
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: super::open_in_memory(HOTEL_SCHEMA)?,
        })
    }

    /// Returns the path to the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Rooms
    // =========================================================================

    pub fn list_rooms(&self) -> Result<Vec<Room>> {
        self.search_rooms(&RoomFilter::default())
    }

    /// Rooms that can take a new reservation
    pub fn list_available_rooms(&self) -> Result<Vec<Room>> {
        self.search_rooms(&RoomFilter {
            status: Some(RoomStatus::Available),
            ..Default::default()
        })
    }

    pub fn search_rooms(&self, filter: &RoomFilter) -> Result<Vec<Room>> {
        let clause = filter.to_where();
        let sql = format!(
            "SELECT {} FROM rooms{} ORDER BY room_number",
            ROOM_COLUMNS,
            clause.sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rooms = stmt
            .query_map(params_from_iter(clause.params.iter()), room_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rooms)
    }

    pub fn get_room(&self, room_number: i64) -> Result<Option<Room>> {
        fetch_room(&self.conn, room_number)
    }

    /// Adds a room. New rooms cannot start out occupied.
    pub fn add_room(&self, draft: &RoomDraft) -> Result<Room> {
        validate_room(draft)?;
        if draft.status == RoomStatus::Occupied {
            return Err(HotelError::validation(
                "A new room cannot be occupied. Add a reservation instead.",
            ));
        }

        self.conn.execute(
            "INSERT INTO rooms (type, price_rate, capacity, description, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                draft.room_type.trim(),
                draft.price_rate,
                draft.capacity,
                draft.description.trim(),
                draft.status.as_str(),
            ],
        )?;

        let room_number = self.conn.last_insert_rowid();
        tracing::info!(room_number, room_type = %draft.room_type, "room added");
        require_room(&self.conn, room_number)
    }

    /// Updates a room's fields.
    ///
    /// An occupied room keeps its status until its reservation is cancelled,
    /// and only a reservation can make a room occupied.
    pub fn update_room(&mut self, room_number: i64, draft: &RoomDraft) -> Result<Room> {
        validate_room(draft)?;

        let tx = self.conn.transaction()?;
        let current = require_room(&tx, room_number)?;

        if current.status == RoomStatus::Occupied && draft.status != RoomStatus::Occupied {
            return Err(HotelError::RoomOccupied(room_number));
        }
        if current.status != RoomStatus::Occupied && draft.status == RoomStatus::Occupied {
            return Err(HotelError::InvalidStatusChange(room_number));
        }

        tx.execute(
            "UPDATE rooms SET type = ?1, price_rate = ?2, status = ?3, capacity = ?4,
                              description = ?5
             WHERE room_number = ?6",
            params![
                draft.room_type.trim(),
                draft.price_rate,
                draft.status.as_str(),
                draft.capacity,
                draft.description.trim(),
                room_number,
            ],
        )?;
        let updated = require_room(&tx, room_number)?;
        tx.commit()?;

        tracing::info!(room_number, "room updated");
        Ok(updated)
    }

    /// Sets only the status column. Callers own the occupancy rule.
    pub fn update_room_status(&self, room_number: i64, status: RoomStatus) -> Result<()> {
        set_room_status(&self.conn, room_number, status)
    }

    /// Deletes a room that no reservation refers to
    pub fn delete_room(&mut self, room_number: i64) -> Result<Room> {
        let tx = self.conn.transaction()?;
        let room = require_room(&tx, room_number)?;

        if reservation_count(&tx, room_number)? > 0 {
            return Err(HotelError::RoomOccupied(room_number));
        }

        tx.execute("DELETE FROM rooms WHERE room_number = ?1", [room_number])
            .map_err(|e| map_foreign_key(e, room_number))?;
        tx.commit()?;

        tracing::info!(room_number, "room deleted");
        Ok(room)
    }

    // =========================================================================
    // Reservations
    // =========================================================================

    pub fn list_reservations(&self) -> Result<Vec<Reservation>> {
        self.search_reservations(&ReservationFilter::default())
    }

    pub fn search_reservations(&self, filter: &ReservationFilter) -> Result<Vec<Reservation>> {
        let clause = filter.to_where();
        let sql = format!(
            "SELECT {} FROM reservations{} ORDER BY guest_id",
            RESERVATION_COLUMNS,
            clause.sql()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let reservations = stmt
            .query_map(params_from_iter(clause.params.iter()), reservation_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(reservations)
    }

    pub fn get_reservation(&self, guest_id: i64) -> Result<Option<Reservation>> {
        fetch_reservation(&self.conn, guest_id)
    }

    /// Books an available room and marks it occupied. Check-in cannot be
    /// earlier than today.
    pub fn add_reservation(&mut self, draft: &ReservationDraft) -> Result<Reservation> {
        let draft = normalize_reservation(draft);
        validate_reservation(&draft, Some(Local::now().date_naive()))?;

        let tx = self.conn.transaction()?;
        require_available(&tx, draft.room_number)?;

        tx.execute(
            "INSERT INTO reservations (guest_name, contact, room_number, checkin_date,
                                       checkout_date, payment_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                draft.guest_name,
                draft.contact,
                draft.room_number,
                format_date(draft.checkin_date),
                format_date(draft.checkout_date),
                draft.payment_status.as_str(),
            ],
        )?;
        let guest_id = tx.last_insert_rowid();
        set_room_status(&tx, draft.room_number, RoomStatus::Occupied)?;

        let reservation = fetch_reservation(&tx, guest_id)?
            .ok_or_else(|| HotelError::not_found("Reservation", guest_id))?;
        tx.commit()?;

        tracing::info!(guest_id, room_number = draft.room_number, "reservation added");
        Ok(reservation)
    }

    /// Updates a reservation, moving occupancy when the room changes
    pub fn update_reservation(
        &mut self,
        guest_id: i64,
        draft: &ReservationDraft,
    ) -> Result<Reservation> {
        let draft = normalize_reservation(draft);
        validate_reservation(&draft, None)?;

        let tx = self.conn.transaction()?;
        let existing = fetch_reservation(&tx, guest_id)?
            .ok_or_else(|| HotelError::not_found("Reservation", guest_id))?;
        let room_changed = existing.room_number != draft.room_number;

        if room_changed {
            require_available(&tx, draft.room_number)?;
        }

        tx.execute(
            "UPDATE reservations SET guest_name = ?1, contact = ?2, room_number = ?3,
                                     checkin_date = ?4, checkout_date = ?5, payment_status = ?6
             WHERE guest_id = ?7",
            params![
                draft.guest_name,
                draft.contact,
                draft.room_number,
                format_date(draft.checkin_date),
                format_date(draft.checkout_date),
                draft.payment_status.as_str(),
                guest_id,
            ],
        )?;

        if room_changed {
            release_room(&tx, existing.room_number)?;
            set_room_status(&tx, draft.room_number, RoomStatus::Occupied)?;
        }

        let updated = fetch_reservation(&tx, guest_id)?
            .ok_or_else(|| HotelError::not_found("Reservation", guest_id))?;
        tx.commit()?;

        if room_changed {
            tracing::info!(
                guest_id,
                from = existing.room_number,
                to = draft.room_number,
                "reservation moved to another room"
            );
        } else {
            tracing::info!(guest_id, "reservation updated");
        }
        Ok(updated)
    }

    /// Cancels a reservation and frees its room
    pub fn delete_reservation(&mut self, guest_id: i64) -> Result<Reservation> {
        let tx = self.conn.transaction()?;
        let reservation = fetch_reservation(&tx, guest_id)?
            .ok_or_else(|| HotelError::not_found("Reservation", guest_id))?;

        tx.execute("DELETE FROM reservations WHERE guest_id = ?1", [guest_id])?;
        release_room(&tx, reservation.room_number)?;
        tx.commit()?;

        tracing::info!(guest_id, room_number = reservation.room_number, "reservation deleted");
        Ok(reservation)
    }

    /// Room choices when editing a reservation: its current room first,
    /// then every available room
    pub fn rooms_for_reservation_edit(&self, guest_id: i64) -> Result<Vec<Room>> {
        let reservation = self
            .get_reservation(guest_id)?
            .ok_or_else(|| HotelError::not_found("Reservation", guest_id))?;

        let mut rooms = Vec::new();
        if let Some(current) = self.get_room(reservation.room_number)? {
            rooms.push(current);
        }
        rooms.extend(
            self.list_available_rooms()?
                .into_iter()
                .filter(|r| r.room_number != reservation.room_number),
        );
        Ok(rooms)
    }

    // =========================================================================
    // Maintenance and reporting
    // =========================================================================

    /// Makes every room status agree with the reservations table.
    ///
    /// Status text from older releases (any case, `Under Maintenance`,
    /// blank or unknown values) is first rewritten in the form the rest of
    /// the queries expect. Then rooms held by a reservation become occupied
    /// and occupied rooms with no reservation become available. Maintenance
    /// rooms without reservations are left as they are.
    pub fn reconcile_room_statuses(&mut self) -> Result<ReconcileReport> {
        let tx = self.conn.transaction()?;
        let mut report = ReconcileReport::default();

        {
            let mut stmt =
                tx.prepare("SELECT room_number, status FROM rooms ORDER BY room_number")?;
            let stored = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, Option<String>>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            for (room_number, text) in stored {
                let status = read_room_status(text.as_deref());
                if text.as_deref() != Some(status.as_str()) {
                    tracing::warn!(room_number, stored = ?text, %status, "normalizing room status");
                    set_room_status(&tx, room_number, status)?;
                    report.normalized.push(room_number);
                }
            }
        }

        {
            let mut stmt = tx.prepare(
                "SELECT room_number FROM rooms
                 WHERE status IS NOT 'Occupied'
                   AND room_number IN (SELECT room_number FROM reservations)
                 ORDER BY room_number",
            )?;
            report.marked_occupied = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<i64>>>()?;

            let mut stmt = tx.prepare(
                "SELECT room_number FROM rooms
                 WHERE status = 'Occupied'
                   AND room_number NOT IN
                       (SELECT room_number FROM reservations WHERE room_number IS NOT NULL)
                 ORDER BY room_number",
            )?;
            report.marked_available = stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<i64>>>()?;
        }

        for &room_number in &report.marked_occupied {
            tracing::warn!(room_number, "room has a reservation but was not occupied");
            set_room_status(&tx, room_number, RoomStatus::Occupied)?;
        }
        for &room_number in &report.marked_available {
            tracing::warn!(room_number, "room was occupied without a reservation");
            set_room_status(&tx, room_number, RoomStatus::Available)?;
        }

        tx.commit()?;
        Ok(report)
    }

    /// Figures shown on the branch dashboard
    pub fn summary(&self) -> Result<DashboardSummary> {
        let mut summary = DashboardSummary::default();

        for room in self.list_rooms()? {
            summary.total_rooms += 1;
            match room.status {
                RoomStatus::Available => summary.available_rooms += 1,
                RoomStatus::Occupied => summary.occupied_rooms += 1,
                RoomStatus::Maintenance => summary.maintenance_rooms += 1,
            }
        }

        for reservation in self.list_reservations()? {
            summary.reservations += 1;
            if reservation.payment_status != PaymentStatus::Paid {
                summary.outstanding_payments += 1;
            }
        }

        Ok(summary)
    }
}

fn fetch_room(conn: &Connection, room_number: i64) -> Result<Option<Room>> {
    let sql = format!("SELECT {} FROM rooms WHERE room_number = ?1", ROOM_COLUMNS);
    Ok(conn.query_row(&sql, [room_number], room_from_row).optional()?)
}

fn require_room(conn: &Connection, room_number: i64) -> Result<Room> {
    fetch_room(conn, room_number)?.ok_or_else(|| HotelError::not_found("Room", room_number))
}

fn fetch_reservation(conn: &Connection, guest_id: i64) -> Result<Option<Reservation>> {
    let sql = format!(
        "SELECT {} FROM reservations WHERE guest_id = ?1",
        RESERVATION_COLUMNS
    );
    Ok(conn.query_row(&sql, [guest_id], reservation_from_row).optional()?)
}

fn set_room_status(conn: &Connection, room_number: i64, status: RoomStatus) -> Result<()> {
    let rows = conn.execute(
        "UPDATE rooms SET status = ?1 WHERE room_number = ?2",
        params![status.as_str(), room_number],
    )?;
    if rows == 0 {
        return Err(HotelError::not_found("Room", room_number));
    }
    Ok(())
}

fn reservation_count(conn: &Connection, room_number: i64) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM reservations WHERE room_number = ?1",
        [room_number],
        |row| row.get(0),
    )?)
}

fn require_available(conn: &Connection, room_number: i64) -> Result<()> {
    let room = require_room(conn, room_number)?;
    if room.status != RoomStatus::Available {
        return Err(HotelError::RoomUnavailable(room_number));
    }
    Ok(())
}

/// Marks a room available once nothing holds it. A room deleted out from
/// under an old reservation is skipped.
fn release_room(conn: &Connection, room_number: i64) -> Result<()> {
    if reservation_count(conn, room_number)? > 0 {
        return Ok(());
    }
    match set_room_status(conn, room_number, RoomStatus::Available) {
        Err(HotelError::NotFound { .. }) => Ok(()),
        other => other,
    }
}

fn map_foreign_key(err: rusqlite::Error, room_number: i64) -> HotelError {
    match err.sqlite_error_code() {
        Some(rusqlite::ErrorCode::ConstraintViolation) => HotelError::RoomOccupied(room_number),
        _ => HotelError::Database(err),
    }
}

/// Stored status text as read; blank or unknown text reads as available
fn read_room_status(text: Option<&str>) -> RoomStatus {
    text.and_then(|s| s.parse().ok()).unwrap_or_default()
}

fn room_from_row(row: &Row<'_>) -> rusqlite::Result<Room> {
    let status: Option<String> = row.get(3)?;
    Ok(Room {
        room_number: row.get(0)?,
        room_type: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        price_rate: row.get::<_, Option<f64>>(2)?.unwrap_or_default(),
        status: read_room_status(status.as_deref()),
        capacity: row.get::<_, Option<u32>>(4)?.unwrap_or_default(),
        description: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
    })
}

fn reservation_from_row(row: &Row<'_>) -> rusqlite::Result<Reservation> {
    let payment: Option<String> = row.get(6)?;
    Ok(Reservation {
        guest_id: row.get(0)?,
        guest_name: row.get(1)?,
        contact: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        room_number: row.get(3)?,
        checkin_date: parse_date(row, 4)?,
        checkout_date: parse_date(row, 5)?,
        payment_status: payment
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default(),
    })
}

fn parse_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
