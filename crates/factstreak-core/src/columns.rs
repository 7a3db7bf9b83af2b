//! Column specs for idempotent schema evolution, and the reports produced by
//! applying or verifying them.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The table that carries gamification state.
pub const USERS_TABLE: &str = "users";

// ─── Column specs ────────────────────────────────────────────────────────────

/// SQL storage type of an added column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
  Text,
  Integer,
  Date,
}

impl ColumnType {
  pub fn sql(self) -> &'static str {
    match self {
      Self::Text => "TEXT",
      Self::Integer => "INTEGER",
      Self::Date => "DATE",
    }
  }
}

/// Default applied to existing rows when the column is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDefault {
  /// No `DEFAULT` clause; existing rows read back as NULL.
  Unset,
  Integer(i64),
  Text(&'static str),
}

impl ColumnDefault {
  /// The `DEFAULT ...` clause, if any. Text literals are single-quoted with
  /// embedded quotes doubled.
  pub fn sql(self) -> Option<String> {
    match self {
      Self::Unset => None,
      Self::Integer(n) => Some(format!("DEFAULT {n}")),
      Self::Text(s) => Some(format!("DEFAULT '{}'", s.replace('\'', "''"))),
    }
  }
}

/// One column a table is required to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
  pub name:    &'static str,
  pub kind:    ColumnType,
  pub default: ColumnDefault,
}

impl ColumnSpec {
  pub const fn new(name: &'static str, kind: ColumnType, default: ColumnDefault) -> Self {
    Self { name, kind, default }
  }

  /// Build the `ALTER TABLE ... ADD COLUMN ...` statement for `table`.
  pub fn add_column_sql(&self, table: &str) -> Result<String> {
    validate_identifier(table)?;
    validate_identifier(self.name)?;
    let mut sql = format!(
      "ALTER TABLE \"{table}\" ADD COLUMN \"{}\" {}",
      self.name,
      self.kind.sql()
    );
    if let Some(default) = self.default.sql() {
      sql.push(' ');
      sql.push_str(&default);
    }
    Ok(sql)
  }
}

/// Columns added to [`USERS_TABLE`], in the order they are applied.
pub const GAMIFICATION_COLUMNS: [ColumnSpec; 5] = [
  ColumnSpec::new("facts_learned", ColumnType::Text, ColumnDefault::Text("[]")),
  ColumnSpec::new("current_streak", ColumnType::Integer, ColumnDefault::Integer(0)),
  ColumnSpec::new("last_activity_date", ColumnType::Date, ColumnDefault::Unset),
  ColumnSpec::new("longest_streak", ColumnType::Integer, ColumnDefault::Integer(0)),
  ColumnSpec::new("total_facts_count", ColumnType::Integer, ColumnDefault::Integer(0)),
];

/// Table and column names are interpolated into DDL, so only plain
/// `[A-Za-z_][A-Za-z0-9_]*` identifiers are accepted.
pub fn validate_identifier(ident: &str) -> Result<()> {
  let mut chars = ident.chars();
  let valid = match chars.next() {
    Some(c) if c.is_ascii_alphabetic() || c == '_' => {
      chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
    _ => false,
  };
  if valid { Ok(()) } else { Err(Error::InvalidIdentifier(ident.to_owned())) }
}

// ─── Evolution report ────────────────────────────────────────────────────────

/// What happened to a single column during an evolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnChange {
  /// The column was missing and has been added.
  Added,
  /// The store refused the addition because the column already exists.
  AlreadyPresent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnOutcome {
  pub name:   String,
  pub change: ColumnChange,
}

/// Per-column outcomes of `ensure_columns`, in application order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionReport {
  pub table:    String,
  pub outcomes: Vec<ColumnOutcome>,
}

impl EvolutionReport {
  pub fn new(table: impl Into<String>) -> Self {
    Self { table: table.into(), outcomes: Vec::new() }
  }

  pub fn push(&mut self, name: &str, change: ColumnChange) {
    self.outcomes.push(ColumnOutcome { name: name.to_owned(), change });
  }

  pub fn added(&self) -> Vec<&str> { self.names_with(ColumnChange::Added) }

  pub fn already_present(&self) -> Vec<&str> {
    self.names_with(ColumnChange::AlreadyPresent)
  }

  fn names_with(&self, change: ColumnChange) -> Vec<&str> {
    self
      .outcomes
      .iter()
      .filter(|o| o.change == change)
      .map(|o| o.name.as_str())
      .collect()
  }
}

// ─── Live schema ─────────────────────────────────────────────────────────────

/// One row of the live column list of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
  pub position:      i64,
  pub name:          String,
  pub decl_type:     String,
  pub not_null:      bool,
  pub default_value: Option<String>,
  pub primary_key:   bool,
}

/// Which required columns a table currently has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnReport {
  pub present: Vec<String>,
  pub missing: Vec<String>,
}

impl ColumnReport {
  /// Compare a live column list against the required specs, keeping the
  /// order of `required`.
  pub fn compare(live: &[ColumnInfo], required: &[ColumnSpec]) -> Self {
    let (present, missing): (Vec<_>, Vec<_>) = required
      .iter()
      .map(|spec| spec.name)
      .partition(|name| live.iter().any(|c| c.name.eq_ignore_ascii_case(name)));
    Self {
      present: present.into_iter().map(str::to_owned).collect(),
      missing: missing.into_iter().map(str::to_owned).collect(),
    }
  }

  pub fn is_complete(&self) -> bool { self.missing.is_empty() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn add_column_sql_with_text_default() {
    let sql = GAMIFICATION_COLUMNS[0].add_column_sql("users").unwrap();
    assert_eq!(
      sql,
      "ALTER TABLE \"users\" ADD COLUMN \"facts_learned\" TEXT DEFAULT '[]'"
    );
  }

  #[test]
  fn add_column_sql_without_default() {
    let sql = GAMIFICATION_COLUMNS[2].add_column_sql("users").unwrap();
    assert_eq!(sql, "ALTER TABLE \"users\" ADD COLUMN \"last_activity_date\" DATE");
  }

  #[test]
  fn text_default_quotes_are_doubled() {
    assert_eq!(
      ColumnDefault::Text("it's").sql().as_deref(),
      Some("DEFAULT 'it''s'")
    );
  }

  #[test]
  fn identifiers_are_validated() {
    assert!(validate_identifier("users").is_ok());
    assert!(validate_identifier("_private2").is_ok());
    for bad in ["", "2users", "users; DROP TABLE users", "a-b", "na\"me"] {
      assert_eq!(
        validate_identifier(bad),
        Err(Error::InvalidIdentifier(bad.to_owned()))
      );
    }
  }

  #[test]
  fn bad_table_name_rejected_before_sql_is_built() {
    let err = GAMIFICATION_COLUMNS[1].add_column_sql("users x").unwrap_err();
    assert!(matches!(err, Error::InvalidIdentifier(_)));
  }

  #[test]
  fn column_report_keeps_required_order() {
    let live = vec![
      ColumnInfo {
        position:      0,
        name:          "id".into(),
        decl_type:     "INTEGER".into(),
        not_null:      false,
        default_value: None,
        primary_key:   true,
      },
      ColumnInfo {
        position:      1,
        name:          "longest_streak".into(),
        decl_type:     "INTEGER".into(),
        not_null:      false,
        default_value: Some("0".into()),
        primary_key:   false,
      },
    ];
    let report = ColumnReport::compare(&live, &GAMIFICATION_COLUMNS);
    assert_eq!(report.present, ["longest_streak"]);
    assert_eq!(
      report.missing,
      ["facts_learned", "current_streak", "last_activity_date", "total_facts_count"]
    );
    assert!(!report.is_complete());
  }

  #[test]
  fn evolution_report_partitions_outcomes() {
    let mut report = EvolutionReport::new("users");
    report.push("a", ColumnChange::AlreadyPresent);
    report.push("b", ColumnChange::Added);
    report.push("c", ColumnChange::Added);
    assert_eq!(report.added(), ["b", "c"]);
    assert_eq!(report.already_present(), ["a"]);
  }
}
