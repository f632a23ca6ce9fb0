//! SQLite-Implementierung des ServerRepository

use altfunk_core::{CodecMaske, ServerId};
use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NeuerServer, ServerRecord};
use crate::repository::{DbResult, ServerRepository};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::zahl;

impl ServerRepository for SqliteDb {
    async fn aktive_server(&self) -> DbResult<Vec<ServerRecord>> {
        let rows = sqlx::query(
            "SELECT id, name, maschine, willkommen, passwort, port, codecs, aktiv
             FROM servers WHERE aktiv = 1 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_server).collect()
    }

    async fn server_anlegen(&self, data: NeuerServer<'_>) -> DbResult<ServerRecord> {
        let now_str = Utc::now().to_rfc3339();

        let rowid = sqlx::query(
            "INSERT INTO servers (name, maschine, willkommen, passwort, port, codecs, aktiv, created_at)
             VALUES (?, ?, ?, ?, ?, ?, 1, ?)",
        )
        .bind(data.name)
        .bind(data.maschine)
        .bind(data.willkommen)
        .bind(data.passwort)
        .bind(i64::from(data.port))
        .bind(i64::from(data.codecs.0))
        .bind(&now_str)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        let id = u32::try_from(rowid)
            .map_err(|_| DbError::intern(format!("Server-ID {rowid} ausserhalb des Bereichs")))?;

        Ok(ServerRecord {
            id: ServerId(id),
            name: data.name.to_string(),
            maschine: data.maschine.to_string(),
            willkommen: data.willkommen.to_string(),
            passwort: data.passwort.to_string(),
            port: data.port,
            codecs: data.codecs,
            aktiv: true,
        })
    }
}

fn row_to_server(row: &sqlx::sqlite::SqliteRow) -> DbResult<ServerRecord> {
    let aktiv: i64 = row.try_get("aktiv")?;
    Ok(ServerRecord {
        id: ServerId(zahl(row, "id")?),
        name: row.try_get("name")?,
        maschine: row.try_get("maschine")?,
        willkommen: row.try_get("willkommen")?,
        passwort: row.try_get("passwort")?,
        port: zahl(row, "port")?,
        codecs: CodecMaske(zahl(row, "codecs")?),
        aktiv: aktiv != 0,
    })
}
