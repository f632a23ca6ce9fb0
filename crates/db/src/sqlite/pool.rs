//! SQLite-Pool mit eingebetteten Migrationen

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::DatabaseConfig;

/// Gemeinsamer Zugang zu allen Repositories
///
/// Ein `SqliteDb` wird von allen virtuellen Servern geteilt; jede Tabelle
/// ist ueber `server_id` partitioniert.
#[derive(Debug, Clone)]
pub struct SqliteDb {
    pub(crate) pool: SqlitePool,
}

impl SqliteDb {
    /// Oeffnet (oder erzeugt) die Datenbankdatei und migriert das Schema
    pub async fn oeffnen(config: &DatabaseConfig) -> DbResult<Self> {
        let journal = if config.sqlite_wal {
            SqliteJournalMode::Wal
        } else {
            SqliteJournalMode::Delete
        };
        let opts = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(journal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_verbindungen.max(1))
            .connect_with(opts)
            .await?;
        info!(url = %config.url, wal = config.sqlite_wal, "Datenbank geoeffnet");

        let db = Self { pool };
        db.migrationen_ausfuehren().await?;
        Ok(db)
    }

    /// In-Memory-Datenbank fuer Tests
    pub async fn in_memory() -> DbResult<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        // Jede Verbindung haette sonst ihre eigene leere Datenbank
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .connect_with(opts)
            .await?;

        let db = Self { pool };
        db.migrationen_ausfuehren().await?;
        Ok(db)
    }

    pub async fn migrationen_ausfuehren(&self) -> DbResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        debug!("Schema aktuell");
        Ok(())
    }

    /// Direkter Pool-Zugriff (fuer Tests)
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Schliesst alle Verbindungen (beim Herunterfahren)
    pub async fn schliessen(&self) {
        self.pool.close().await;
        info!("Datenbank geschlossen");
    }
}
