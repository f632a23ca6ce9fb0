//! SQLite-Implementierung des RegistrationRepository

use altfunk_core::{GlobalFlags, ServerId};
use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NeueRegistrierung, RegistrierungRecord};
use crate::repository::{DbResult, RegistrationRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{parse_datetime, zahl};

impl RegistrationRepository for SqliteDb {
    async fn registrierung_nach_login(
        &self,
        server: ServerId,
        login: &str,
    ) -> DbResult<Option<RegistrierungRecord>> {
        let row = sqlx::query(
            "SELECT id, server_id, login, passwort_hash, global_flags, created_at
             FROM registrations WHERE server_id = ? AND login = ?",
        )
        .bind(i64::from(server.inner()))
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_registrierung(&r)).transpose()
    }

    async fn registrierung_anlegen(
        &self,
        data: NeueRegistrierung<'_>,
    ) -> DbResult<RegistrierungRecord> {
        let now = Utc::now();

        let ergebnis = sqlx::query(
            "INSERT INTO registrations (server_id, login, passwort_hash, global_flags, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(i64::from(data.server_id.inner()))
        .bind(data.login)
        .bind(data.passwort_hash)
        .bind(i64::from(data.global_flags.raw()))
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await;

        let id = match ergebnis {
            Ok(r) => r.last_insert_rowid(),
            Err(e) => {
                let fehler = DbError::from(e);
                if fehler.ist_eindeutigkeit() {
                    return Err(DbError::Eindeutigkeit(format!(
                        "Login '{}' existiert bereits",
                        data.login
                    )));
                }
                return Err(fehler);
            }
        };

        Ok(RegistrierungRecord {
            id,
            server_id: data.server_id,
            login: data.login.to_string(),
            passwort_hash: data.passwort_hash.to_string(),
            global_flags: data.global_flags,
            created_at: now,
        })
    }
}

fn row_to_registrierung(row: &sqlx::sqlite::SqliteRow) -> DbResult<RegistrierungRecord> {
    Ok(RegistrierungRecord {
        id: row.try_get("id")?,
        server_id: ServerId(zahl(row, "server_id")?),
        login: row.try_get("login")?,
        passwort_hash: row.try_get("passwort_hash")?,
        global_flags: GlobalFlags::from_raw(zahl(row, "global_flags")?),
        created_at: parse_datetime(row, "created_at")?,
    })
}
