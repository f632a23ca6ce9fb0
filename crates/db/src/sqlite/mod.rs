//! SQLite-Backend-Implementierungen fuer alle Repository-Traits

pub mod bans;
pub mod channels;
pub mod pool;
pub mod registrations;
pub mod servers;

pub use pool::SqliteDb;

use sqlx::Row;

use crate::error::{DbError, DbResult};

/// Liest eine INTEGER-Spalte und prueft den Wertebereich des Zieltyps
pub(crate) fn zahl<T: TryFrom<i64>>(row: &sqlx::sqlite::SqliteRow, col: &str) -> DbResult<T> {
    let wert: i64 = row.try_get(col)?;
    T::try_from(wert)
        .map_err(|_| DbError::UngueltigeDaten(format!("Wert {wert} in '{col}' ausserhalb des Bereichs")))
}

pub(crate) fn parse_datetime(
    row: &sqlx::sqlite::SqliteRow,
    col: &str,
) -> DbResult<chrono::DateTime<chrono::Utc>> {
    let s: String = row.try_get(col)?;
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| DbError::intern(format!("Ungueltige DateTime in '{col}': {e}")))
}

pub(crate) fn parse_opt_datetime(
    row: &sqlx::sqlite::SqliteRow,
    col: &str,
) -> DbResult<Option<chrono::DateTime<chrono::Utc>>> {
    let s: Option<String> = row.try_get(col)?;
    s.as_deref()
        .map(|v| {
            chrono::DateTime::parse_from_rfc3339(v)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .map_err(|e| DbError::intern(format!("Ungueltige DateTime in '{col}': {e}")))
        })
        .transpose()
}
