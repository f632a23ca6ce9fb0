//! Fehlertypen fuer die Protokoll-Engine

use altfunk_auth::AuthError;
use altfunk_db::DbError;
use altfunk_protocol::WireError;
use thiserror::Error;

/// Fehlertyp fuer die Protokoll-Engine
///
/// Handler geben diese Fehler nie an die Empfangsschleife weiter; sie
/// protokollieren und brechen nur die aktuelle Operation ab.
#[derive(Debug, Error)]
pub enum SignalingError {
    /// IO-Fehler (UDP-Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// Paket konnte nicht gebaut oder gelesen werden
    #[error("Paketfehler: {0}")]
    Wire(#[from] WireError),

    /// Anmeldung oder Ban-Pruefung fehlgeschlagen
    #[error("Authentifizierungsfehler: {0}")]
    Auth(#[from] AuthError),

    /// Persistenz nicht erreichbar
    #[error("Datenbankfehler: {0}")]
    Datenbank(#[from] DbError),

    /// Kein freier Bezeichner fuer eine neue Session
    #[error("Keine freie Session-ID")]
    KeineFreieId,

    /// Interner Fehler
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl SignalingError {
    /// Erstellt einen internen Fehler
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }
}

/// Result-Typ fuer die Protokoll-Engine
pub type SignalingResult<T> = Result<T, SignalingError>;
