//! Repository-Traits fuer die Persistenz der Protokoll-Engine
//!
//! Die Engine haelt Server, Kanaele und Sessions im Speicher und ruft diese
//! Traits nur fuer Laden, Nachschlagen und das Spiegeln von Aenderungen auf.
//! Fehler werden von der Engine protokolliert, nie zurueckgerollt.

use altfunk_core::{ChannelId, ServerId};
use serde::{Deserialize, Serialize};

use crate::models::{
    BanRecord, KanalRecord, NeueRegistrierung, NeuerBan, NeuerServer, RegistrierungRecord,
    ServerRecord,
};

pub use crate::error::DbResult;

// ---------------------------------------------------------------------------
// Konfiguration
// ---------------------------------------------------------------------------

/// Verbindungsparameter der Datenbank
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite-URL, z.B. `sqlite://altfunk.db`
    pub url: String,
    pub max_verbindungen: u32,
    /// WAL-Journal aktivieren
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://altfunk.db".into(),
            max_verbindungen: 5,
            sqlite_wal: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Virtuelle Server
#[allow(async_fn_in_trait)]
pub trait ServerRepository: Send + Sync {
    /// Alle Server mit `aktiv = 1`, sortiert nach ID
    async fn aktive_server(&self) -> DbResult<Vec<ServerRecord>>;

    async fn server_anlegen(&self, data: NeuerServer<'_>) -> DbResult<ServerRecord>;
}

/// Registrierte Kanaele eines Servers
#[allow(async_fn_in_trait)]
pub trait ChannelRepository: Send + Sync {
    /// Laedt alle Kanaele, Wurzelkanaele zuerst
    async fn kanaele_laden(&self, server: ServerId) -> DbResult<Vec<KanalRecord>>;

    /// Schreibt alle veraenderlichen Felder; `NichtGefunden` wenn der Kanal fehlt
    async fn kanal_aktualisieren(&self, kanal: &KanalRecord) -> DbResult<()>;

    /// Legt den Kanal unter seiner bestehenden ID an (oder ueberschreibt ihn)
    async fn kanal_registrieren(&self, kanal: &KanalRecord) -> DbResult<()>;

    /// Entfernt den Kanal; `false` wenn er nicht gespeichert war
    async fn kanal_abmelden(&self, server: ServerId, id: ChannelId) -> DbResult<bool>;
}

/// Login-Daten registrierter Spieler
#[allow(async_fn_in_trait)]
pub trait RegistrationRepository: Send + Sync {
    async fn registrierung_nach_login(
        &self,
        server: ServerId,
        login: &str,
    ) -> DbResult<Option<RegistrierungRecord>>;

    async fn registrierung_anlegen(
        &self,
        data: NeueRegistrierung<'_>,
    ) -> DbResult<RegistrierungRecord>;
}

/// IP-Bans
#[allow(async_fn_in_trait)]
pub trait BanRepository: Send + Sync {
    /// Aktiver (nicht abgelaufener) Ban fuer die IP, falls vorhanden
    async fn ban_fuer_ip(&self, server: ServerId, ip: &str) -> DbResult<Option<BanRecord>>;

    async fn ban_anlegen(&self, data: NeuerBan<'_>) -> DbResult<BanRecord>;
}
