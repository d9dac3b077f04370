//! Search and filter criteria for the room, reservation and branch tables
//!
//! Filters compile to a SQL `WHERE` clause plus owned parameter values, so
//! searching happens in SQLite rather than over loaded rows.

use rusqlite::types::Value;

use crate::models::{PaymentStatus, RoomStatus};

/// Criteria for listing rooms. Empty criteria match every room.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomFilter {
    pub status: Option<RoomStatus>,
    /// Exact room type, compared case-insensitively
    pub room_type: Option<String>,
    pub min_capacity: Option<u32>,
    pub max_price: Option<f64>,
    /// Substring matched against type and description
    pub query: Option<String>,
}

/// Criteria for listing reservations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationFilter {
    pub payment_status: Option<PaymentStatus>,
    pub room_number: Option<i64>,
    /// Substring matched against guest name and contact
    pub query: Option<String>,
}

/// A compiled `WHERE` clause
#[derive(Debug, Default)]
pub(crate) struct WhereClause {
    conditions: Vec<String>,
    pub(crate) params: Vec<Value>,
}

impl WhereClause {
    /// Adds a condition. Each `?` in `condition` consumes the next value and
    /// is renumbered so conditions can be combined freely.
    fn push(&mut self, condition: &str, values: Vec<Value>) {
        let mut values = values.into_iter();
        let mut numbered = String::with_capacity(condition.len() + 4);
        for ch in condition.chars() {
            if ch != '?' {
                numbered.push(ch);
                continue;
            }
            let value = values.next().unwrap_or(Value::Null);
            self.params.push(value);
            numbered.push_str(&format!("?{}", self.params.len()));
        }
        self.conditions.push(numbered);
    }

    /// Matches a status column against every accepted spelling, ignoring
    /// case and surrounding spaces
    fn push_spellings(&mut self, column: &str, spellings: &[&str]) {
        let placeholders = vec!["?"; spellings.len()].join(", ");
        let values = spellings
            .iter()
            .map(|s| Value::Text(s.to_string()))
            .collect();
        self.push(
            &format!("lower(trim({})) IN ({})", column, placeholders),
            values,
        );
    }

    fn push_text_search(&mut self, columns: &[&str], query: &str) {
        let pattern = like_pattern(query);
        let condition = columns
            .iter()
            .map(|col| format!("{} LIKE ? ESCAPE '\\'", col))
            .collect::<Vec<_>>()
            .join(" OR ");
        let values = columns.iter().map(|_| Value::Text(pattern.clone())).collect();
        self.push(&format!("({})", condition), values);
    }

    /// SQL text, empty when there are no conditions
    pub(crate) fn sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }
}

impl RoomFilter {
    pub fn is_empty(&self) -> bool {
        *self == RoomFilter::default()
    }

    pub(crate) fn to_where(&self) -> WhereClause {
        let mut clause = WhereClause::default();
        if let Some(status) = self.status {
            clause.push_spellings("status", status.spellings());
        }
        if let Some(room_type) = non_blank(&self.room_type) {
            clause.push(
                "type = ? COLLATE NOCASE",
                vec![Value::Text(room_type.to_string())],
            );
        }
        if let Some(min_capacity) = self.min_capacity {
            clause.push("capacity >= ?", vec![Value::Integer(i64::from(min_capacity))]);
        }
        if let Some(max_price) = self.max_price {
            clause.push("price_rate <= ?", vec![Value::Real(max_price)]);
        }
        if let Some(query) = non_blank(&self.query) {
            clause.push_text_search(&["type", "description"], query);
        }
        clause
    }
}

impl ReservationFilter {
    pub fn is_empty(&self) -> bool {
        *self == ReservationFilter::default()
    }

    pub(crate) fn to_where(&self) -> WhereClause {
        let mut clause = WhereClause::default();
        if let Some(payment) = self.payment_status {
            clause.push_spellings("payment_status", payment.spellings());
        }
        if let Some(room_number) = self.room_number {
            clause.push("room_number = ?", vec![Value::Integer(room_number)]);
        }
        if let Some(query) = non_blank(&self.query) {
            clause.push_text_search(&["guest_name", "contact"], query);
        }
        clause
    }
}

/// Compiles a free-text branch search over username, address and contact
pub(crate) fn branch_search(query: &str) -> WhereClause {
    let mut clause = WhereClause::default();
    if !query.trim().is_empty() {
        clause.push_text_search(&["username", "address", "contact"], query.trim());
    }
    clause
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Escapes LIKE wildcards and wraps the query for substring matching
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.trim().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_has_no_where() {
        assert_eq!(RoomFilter::default().to_where().sql(), "");
        assert!(RoomFilter::default().is_empty());
        assert_eq!(branch_search("   ").sql(), "");
    }

    #[test]
    fn test_room_filter_numbers_placeholders() {
        let filter = RoomFilter {
            status: Some(RoomStatus::Maintenance),
            min_capacity: Some(2),
            query: Some("sea".to_string()),
            ..Default::default()
        };
        let clause = filter.to_where();
        assert_eq!(
            clause.sql(),
            " WHERE lower(trim(status)) IN (?1, ?2, ?3) AND capacity >= ?4 AND \
             (type LIKE ?5 ESCAPE '\\' OR description LIKE ?6 ESCAPE '\\')"
        );
        assert_eq!(clause.params.len(), 6);
        assert_eq!(clause.params[0], Value::Text("maintenance".to_string()));
        assert_eq!(clause.params[2], Value::Text("under maintenance".to_string()));
        assert_eq!(clause.params[3], Value::Integer(2));
        assert_eq!(clause.params[5], Value::Text("%sea%".to_string()));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_reservation_filter() {
        let filter = ReservationFilter {
            payment_status: Some(PaymentStatus::Unpaid),
            room_number: Some(7),
            query: None,
        };
        let clause = filter.to_where();
        assert_eq!(
            clause.sql(),
            " WHERE lower(trim(payment_status)) IN (?1, ?2) AND room_number = ?3"
        );
        assert_eq!(clause.params[1], Value::Text("pending".to_string()));
        assert_eq!(clause.params[2], Value::Integer(7));
    }
}
