use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

pub fn current_timestamp() -> i64 {
  Local::now().timestamp()
}

// The CMSes are not consistent about date formats:
// the REST one sends full RFC 3339 timestamps, the
// query one often has date-only event dates, and
// legacy records sometimes have no offset at all.
// chrono formatting reference:
// https://docs.rs/chrono/0.4.19/chrono/format/strftime/index.html
pub fn parse_flexible_date(value: &str) -> Option<i64> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return None;
  }
  if let Ok(d) = DateTime::parse_from_rfc3339(trimmed) {
    return Some(d.timestamp());
  }
  if let Ok(d) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
    return Some(d.and_utc().timestamp());
  }
  if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
    return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
  }
  None
}

// Comparator for sorting records newest first.
// Dates we can't parse go to the end, ties and
// unparseable pairs fall back to a reverse string
// comparison to keep the order deterministic.
pub fn newest_first(a: &str, b: &str) -> Ordering {
  match (parse_flexible_date(a), parse_flexible_date(b)) {
    (Some(ta), Some(tb)) => tb.cmp(&ta).then_with(|| b.cmp(a)),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => b.cmp(a)
  }
}
