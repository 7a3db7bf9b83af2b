//! [`SchemaEvolver`] for [`SqliteStore`]: idempotent `ALTER TABLE ... ADD
//! COLUMN` runs, plus live column introspection.
//!
//! Each `ALTER` is its own implicit transaction, so a run that fails partway
//! keeps the columns it already added. Re-running with the same specs
//! converges.

use factstreak_core::{
  columns::{ColumnChange, ColumnInfo, ColumnReport, ColumnSpec, EvolutionReport, validate_identifier},
  store::SchemaEvolver,
};

use crate::{Error, Result, SqliteStore};

/// Read the live column list of `table` via `pragma_table_info`. An unknown
/// table yields an empty list.
pub(crate) fn live_columns(
  conn: &rusqlite::Connection,
  table: &str,
) -> rusqlite::Result<Vec<ColumnInfo>> {
  let mut stmt = conn.prepare(
    "SELECT cid, name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1)",
  )?;
  stmt
    .query_map(rusqlite::params![table], |row| {
      Ok(ColumnInfo {
        position:      row.get(0)?,
        name:          row.get(1)?,
        decl_type:     row.get(2)?,
        not_null:      row.get::<_, i64>(3)? != 0,
        default_value: row.get(4)?,
        primary_key:   row.get::<_, i64>(5)? != 0,
      })
    })?
    .collect()
}

fn has_column(columns: &[ColumnInfo], name: &str) -> bool {
  columns.iter().any(|c| c.name.eq_ignore_ascii_case(name))
}

/// Apply `statements` (column name, `ALTER` SQL) to `table` in order.
///
/// A failed `ALTER` counts as [`ColumnChange::AlreadyPresent`] only when the
/// live column list shows the column afterwards; otherwise the original
/// failure is returned with the column it happened on.
fn evolve(
  conn: &rusqlite::Connection,
  table: &str,
  statements: &[(&'static str, String)],
) -> Result<EvolutionReport> {
  let mut report = EvolutionReport::new(table);

  for (column, sql) in statements {
    match conn.execute(sql, []) {
      Ok(_) => {
        tracing::info!(table, column, "added column");
        report.push(column, ColumnChange::Added);
      }
      Err(err) => match live_columns(conn, table) {
        Ok(live) if has_column(&live, column) => {
          tracing::debug!(table, column, "column already present");
          report.push(column, ColumnChange::AlreadyPresent);
        }
        _ => {
          return Err(Error::SchemaEvolution {
            table:  table.to_owned(),
            column: (*column).to_owned(),
            source: err,
          });
        }
      },
    }
  }

  Ok(report)
}

impl SchemaEvolver for SqliteStore {
  type Error = Error;

  async fn ensure_columns(&self, table: &str, columns: &[ColumnSpec]) -> Result<EvolutionReport> {
    // Build every statement first so a bad identifier is rejected before the
    // store is touched.
    let statements = columns
      .iter()
      .map(|spec| Ok((spec.name, spec.add_column_sql(table)?)))
      .collect::<Result<Vec<_>>>()?;
    let table = table.to_owned();

    let report = self
      .conn
      .call(move |conn| Ok(evolve(conn, &table, &statements)))
      .await??;

    tracing::info!(
      table = %report.table,
      added = report.added().len(),
      already_present = report.already_present().len(),
      "schema evolution finished"
    );
    Ok(report)
  }

  async fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
    validate_identifier(table)?;
    let table = table.to_owned();

    let columns = self
      .conn
      .call(move |conn| Ok(live_columns(conn, &table)?))
      .await?;
    Ok(columns)
  }

  async fn verify_columns(&self, table: &str, columns: &[ColumnSpec]) -> Result<ColumnReport> {
    let live = self.table_columns(table).await?;
    Ok(ColumnReport::compare(&live, columns))
  }
}
