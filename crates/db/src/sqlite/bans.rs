//! SQLite-Implementierung des BanRepository

use altfunk_core::ServerId;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use crate::models::{BanRecord, NeuerBan};
use crate::repository::{BanRepository, DbResult};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::{parse_datetime, parse_opt_datetime, zahl};

impl BanRepository for SqliteDb {
    async fn ban_fuer_ip(&self, server: ServerId, ip: &str) -> DbResult<Option<BanRecord>> {
        let jetzt = zeitstempel(&Utc::now());
        let row = sqlx::query(
            "SELECT id, server_id, ip, grund, expires_at, created_at
             FROM bans
             WHERE server_id = ? AND ip = ?
               AND (expires_at IS NULL OR expires_at > ?)
             ORDER BY id
             LIMIT 1",
        )
        .bind(i64::from(server.inner()))
        .bind(ip)
        .bind(&jetzt)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_ban(&r)).transpose()
    }

    async fn ban_anlegen(&self, data: NeuerBan<'_>) -> DbResult<BanRecord> {
        let now = Utc::now();
        let expires_str = data.expires_at.as_ref().map(zeitstempel);

        let id = sqlx::query(
            "INSERT INTO bans (server_id, ip, grund, expires_at, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(i64::from(data.server_id.inner()))
        .bind(data.ip)
        .bind(data.grund)
        .bind(&expires_str)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(BanRecord {
            id,
            server_id: data.server_id,
            ip: data.ip.to_string(),
            grund: data.grund.to_string(),
            expires_at: data.expires_at,
            created_at: now,
        })
    }
}

/// Feste Breite, damit SQLite die Zeitpunkte als Text vergleichen kann
fn zeitstempel(zeit: &DateTime<Utc>) -> String {
    zeit.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn row_to_ban(row: &sqlx::sqlite::SqliteRow) -> DbResult<BanRecord> {
    Ok(BanRecord {
        id: row.try_get("id")?,
        server_id: ServerId(zahl(row, "server_id")?),
        ip: row.try_get("ip")?,
        grund: row.try_get("grund")?,
        expires_at: parse_opt_datetime(row, "expires_at")?,
        created_at: parse_datetime(row, "created_at")?,
    })
}
