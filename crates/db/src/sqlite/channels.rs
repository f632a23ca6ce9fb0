//! SQLite-Implementierung des ChannelRepository

use altfunk_core::{ChannelFlags, ChannelId, ServerId};
use sqlx::Row;
use tracing::debug;

use crate::error::DbError;
use crate::models::KanalRecord;
use crate::repository::{ChannelRepository, DbResult};
use crate::sqlite::pool::SqliteDb;
use crate::sqlite::zahl;

impl ChannelRepository for SqliteDb {
    async fn kanaele_laden(&self, server: ServerId) -> DbResult<Vec<KanalRecord>> {
        let rows = sqlx::query(
            "SELECT server_id, id, parent_id, name, thema, beschreibung, flags, codec,
                    passwort, sort_order, max_nutzer
             FROM channels WHERE server_id = ?
             ORDER BY parent_id IS NOT NULL, id",
        )
        .bind(i64::from(server.inner()))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_kanal).collect()
    }

    async fn kanal_aktualisieren(&self, kanal: &KanalRecord) -> DbResult<()> {
        let affected = sqlx::query(
            "UPDATE channels
             SET parent_id = ?, name = ?, thema = ?, beschreibung = ?, flags = ?, codec = ?,
                 passwort = ?, sort_order = ?, max_nutzer = ?
             WHERE server_id = ? AND id = ?",
        )
        .bind(kanal.parent_id.map(|p| i64::from(p.inner())))
        .bind(&kanal.name)
        .bind(&kanal.thema)
        .bind(&kanal.beschreibung)
        .bind(i64::from(kanal.flags.raw()))
        .bind(i64::from(kanal.codec))
        .bind(&kanal.passwort)
        .bind(i64::from(kanal.sort_order))
        .bind(i64::from(kanal.max_nutzer))
        .bind(i64::from(kanal.server_id.inner()))
        .bind(i64::from(kanal.id.inner()))
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(DbError::nicht_gefunden(format!(
                "{} auf {}",
                kanal.id, kanal.server_id
            )));
        }
        Ok(())
    }

    async fn kanal_registrieren(&self, kanal: &KanalRecord) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO channels
             (server_id, id, parent_id, name, thema, beschreibung, flags, codec,
              passwort, sort_order, max_nutzer)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (server_id, id) DO UPDATE SET
                parent_id = excluded.parent_id,
                name = excluded.name,
                thema = excluded.thema,
                beschreibung = excluded.beschreibung,
                flags = excluded.flags,
                codec = excluded.codec,
                passwort = excluded.passwort,
                sort_order = excluded.sort_order,
                max_nutzer = excluded.max_nutzer",
        )
        .bind(i64::from(kanal.server_id.inner()))
        .bind(i64::from(kanal.id.inner()))
        .bind(kanal.parent_id.map(|p| i64::from(p.inner())))
        .bind(&kanal.name)
        .bind(&kanal.thema)
        .bind(&kanal.beschreibung)
        .bind(i64::from(kanal.flags.raw()))
        .bind(i64::from(kanal.codec))
        .bind(&kanal.passwort)
        .bind(i64::from(kanal.sort_order))
        .bind(i64::from(kanal.max_nutzer))
        .execute(&self.pool)
        .await?;

        debug!(kanal = %kanal.id, server = %kanal.server_id, "Kanal registriert");
        Ok(())
    }

    async fn kanal_abmelden(&self, server: ServerId, id: ChannelId) -> DbResult<bool> {
        let affected = sqlx::query("DELETE FROM channels WHERE server_id = ? AND id = ?")
            .bind(i64::from(server.inner()))
            .bind(i64::from(id.inner()))
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}

fn row_to_kanal(row: &sqlx::sqlite::SqliteRow) -> DbResult<KanalRecord> {
    let parent: Option<i64> = row.try_get("parent_id")?;
    let parent_id = parent
        .map(|p| {
            u32::try_from(p)
                .map(ChannelId)
                .map_err(|_| DbError::UngueltigeDaten(format!("parent_id {p} ausserhalb des Bereichs")))
        })
        .transpose()?;

    Ok(KanalRecord {
        server_id: ServerId(zahl(row, "server_id")?),
        id: ChannelId(zahl(row, "id")?),
        parent_id,
        name: row.try_get("name")?,
        thema: row.try_get("thema")?,
        beschreibung: row.try_get("beschreibung")?,
        flags: ChannelFlags::from_raw(zahl(row, "flags")?),
        codec: zahl(row, "codec")?,
        passwort: row.try_get("passwort")?,
        sort_order: zahl(row, "sort_order")?,
        max_nutzer: zahl(row, "max_nutzer")?,
    })
}
