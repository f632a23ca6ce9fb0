//! Datenbankmodelle fuer Altfunk
//!
//! Diese Typen repraesentieren Datensaetze aus der Datenbank.
//! Sie sind von den Laufzeit-Typen der Protokoll-Engine getrennt und dienen
//! als reine Datenuebertragungsobjekte.

use altfunk_core::{ChannelFlags, ChannelId, CodecMaske, GlobalFlags, ServerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Virtueller Server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub id: ServerId,
    pub name: String,
    pub maschine: String,
    pub willkommen: String,
    /// Server-Passwort fuer anonyme Verbindungen (leer = keins)
    pub passwort: String,
    pub port: u16,
    pub codecs: CodecMaske,
    pub aktiv: bool,
}

/// Daten zum Anlegen eines virtuellen Servers
#[derive(Debug, Clone)]
pub struct NeuerServer<'a> {
    pub name: &'a str,
    pub maschine: &'a str,
    pub willkommen: &'a str,
    pub passwort: &'a str,
    pub port: u16,
    pub codecs: CodecMaske,
}

// ---------------------------------------------------------------------------
// Kanaele
// ---------------------------------------------------------------------------

/// Kanal-Datensatz; der Schluessel ist (server_id, id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KanalRecord {
    pub server_id: ServerId,
    pub id: ChannelId,
    pub parent_id: Option<ChannelId>,
    pub name: String,
    pub thema: String,
    pub beschreibung: String,
    pub flags: ChannelFlags,
    pub codec: u16,
    /// Klartext wie vom Client gesendet (max. 29 Zeichen)
    pub passwort: String,
    pub sort_order: u16,
    pub max_nutzer: u16,
}

// ---------------------------------------------------------------------------
// Registrierungen
// ---------------------------------------------------------------------------

/// Login-Daten eines registrierten Spielers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrierungRecord {
    pub id: i64,
    pub server_id: ServerId,
    pub login: String,
    pub passwort_hash: String,
    pub global_flags: GlobalFlags,
    pub created_at: DateTime<Utc>,
}

/// Daten zum Anlegen einer Registrierung
#[derive(Debug, Clone)]
pub struct NeueRegistrierung<'a> {
    pub server_id: ServerId,
    pub login: &'a str,
    pub passwort_hash: &'a str,
    pub global_flags: GlobalFlags,
}

// ---------------------------------------------------------------------------
// Bans
// ---------------------------------------------------------------------------

/// IP-Ban eines Servers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanRecord {
    pub id: i64,
    pub server_id: ServerId,
    pub ip: String,
    pub grund: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Daten zum Anlegen eines Bans
#[derive(Debug, Clone)]
pub struct NeuerBan<'a> {
    pub server_id: ServerId,
    pub ip: &'a str,
    pub grund: &'a str,
    pub expires_at: Option<DateTime<Utc>>,
}
