use chrono::NaiveDate;

/// Generated integer key of a `product` row
pub type ProductId = i32;

/// Generated integer key of a `property` row
pub type PropertyId = i32;

/// Property entries beyond this count are silently dropped on creation
pub const MAX_PROPERTIES_PER_PRODUCT: usize = 10;

/// Render a date the way the listing endpoint reports it: `MM/DD/YYYY`
pub fn format_available_on(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

/// Parse an availability date as supplied by a client.
///
/// Accepts ISO `YYYY-MM-DD` (optionally followed by a time part) and `MM/DD/YYYY`.
pub fn parse_available_on(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);

    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%m/%d/%Y"))
        .ok()
}
