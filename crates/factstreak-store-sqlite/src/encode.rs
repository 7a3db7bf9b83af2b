//! Encoding and decoding helpers between the domain record and the plain
//! values stored on a `users` row.
//!
//! Dates are stored as `YYYY-MM-DD` text. The fact log is stored as a compact
//! JSON array. Anything that does not decode cleanly is reported as corrupt
//! state; nothing is defaulted.

use chrono::NaiveDate;
use factstreak_core::{
  Error as CoreError,
  record::{GamificationRecord, LearnedFact},
};

use crate::Result;

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(username: &str, s: &str) -> Result<NaiveDate, CoreError> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| {
    CoreError::corrupt(username, format!("last_activity_date {s:?} is not a date: {e}"))
  })
}

// ─── Fact log ────────────────────────────────────────────────────────────────

pub fn encode_fact_log(facts: &[LearnedFact]) -> Result<String> {
  Ok(serde_json::to_string(facts)?)
}

pub fn decode_fact_log(username: &str, raw: Option<&str>) -> Result<Vec<LearnedFact>, CoreError> {
  let raw = raw.ok_or_else(|| CoreError::corrupt(username, "facts_learned is NULL"))?;
  serde_json::from_str(raw).map_err(|e| {
    CoreError::corrupt(username, format!("facts_learned is not a valid fact list: {e}"))
  })
}

// ─── Counters ────────────────────────────────────────────────────────────────

fn decode_counter(username: &str, column: &str, value: Option<i64>) -> Result<u32, CoreError> {
  let value = value.ok_or_else(|| CoreError::corrupt(username, format!("{column} is NULL")))?;
  u32::try_from(value)
    .map_err(|_| CoreError::corrupt(username, format!("{column} is out of range: {value}")))
}

// ─── Row ─────────────────────────────────────────────────────────────────────

/// The gamification columns of a `users` row, exactly as SQLite returned them.
pub struct RawRecord {
  pub facts_learned:      Option<String>,
  pub current_streak:     Option<i64>,
  pub longest_streak:     Option<i64>,
  pub last_activity_date: Option<String>,
  pub total_facts_count:  Option<i64>,
}

impl RawRecord {
  /// Column list matching the field order of [`RawRecord::from_row`].
  pub const COLUMNS: &'static str =
    "facts_learned, current_streak, longest_streak, last_activity_date, total_facts_count";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      facts_learned:      row.get(0)?,
      current_streak:     row.get(1)?,
      longest_streak:     row.get(2)?,
      last_activity_date: row.get(3)?,
      total_facts_count:  row.get(4)?,
    })
  }

  /// Decode and validate; any inconsistency is corrupt state.
  pub fn into_record(self, username: &str) -> Result<GamificationRecord, CoreError> {
    let record = GamificationRecord {
      username:           username.to_owned(),
      facts_learned:      decode_fact_log(username, self.facts_learned.as_deref())?,
      current_streak:     decode_counter(username, "current_streak", self.current_streak)?,
      longest_streak:     decode_counter(username, "longest_streak", self.longest_streak)?,
      last_activity_date: self
        .last_activity_date
        .as_deref()
        .map(|s| decode_date(username, s))
        .transpose()?,
      total_facts_count:  decode_counter(username, "total_facts_count", self.total_facts_count)?,
    };
    record.validate()?;
    Ok(record)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn raw(facts: Option<&str>) -> RawRecord {
    RawRecord {
      facts_learned:      facts.map(str::to_owned),
      current_streak:     Some(0),
      longest_streak:     Some(0),
      last_activity_date: None,
      total_facts_count:  Some(0),
    }
  }

  #[test]
  fn default_row_decodes_to_empty_record() {
    let record = raw(Some("[]")).into_record("alice").unwrap();
    assert_eq!(record, GamificationRecord::empty("alice"));
  }

  #[test]
  fn not_json_is_corrupt() {
    let err = raw(Some("not-json")).into_record("alice").unwrap_err();
    assert!(matches!(err, CoreError::CorruptState { ref username, .. } if username == "alice"));
  }

  #[test]
  fn json_object_is_not_a_fact_list() {
    let err = raw(Some(r#"{"id":1}"#)).into_record("alice").unwrap_err();
    assert!(matches!(err, CoreError::CorruptState { .. }));
  }

  #[test]
  fn null_fact_log_is_corrupt() {
    let err = raw(None).into_record("alice").unwrap_err();
    assert!(matches!(err, CoreError::CorruptState { .. }));
  }

  #[test]
  fn negative_counter_is_corrupt() {
    let mut r = raw(Some("[]"));
    r.longest_streak = Some(-1);
    assert!(matches!(r.into_record("alice"), Err(CoreError::CorruptState { .. })));
  }

  #[test]
  fn bad_date_is_corrupt() {
    let mut r = raw(Some("[]"));
    r.current_streak = Some(1);
    r.longest_streak = Some(1);
    r.last_activity_date = Some("yesterday".into());
    assert!(matches!(r.into_record("alice"), Err(CoreError::CorruptState { .. })));
  }

  #[test]
  fn date_roundtrip_format() {
    let d = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
    assert_eq!(encode_date(d), "2024-01-09");
    assert_eq!(decode_date("alice", "2024-01-09").unwrap(), d);
  }
}
