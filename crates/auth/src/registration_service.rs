//! Anmeldung registrierter Spieler
//!
//! Die Verbindungsanfrage traegt Login und Passwort im Klartext. Der Dienst
//! laedt die Registrierung nach Login und prueft das Passwort gegen den
//! gespeicherten Argon2id-Hash.

use std::sync::Arc;

use altfunk_core::{GlobalFlags, ServerId};
use altfunk_db::{
    models::{NeueRegistrierung, RegistrierungRecord},
    repository::RegistrationRepository,
};

use crate::error::{AuthError, AuthResult};
use crate::password::{passwort_hashen, passwort_verifizieren};

/// Maximale Login-Laenge (Feldbreite im Verbindungspaket)
pub const LOGIN_MAX: usize = 29;

/// Anmeldung und Registrierung von Spielern eines Servers
pub struct RegistrationService<R: RegistrationRepository> {
    repo: Arc<R>,
}

impl<R: RegistrationRepository> RegistrationService<R> {
    pub fn neu(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Sucht die Registrierung zu (login, passwort)
    ///
    /// Unbekanntes Login und falsches Passwort ergeben beide `None`.
    pub async fn anmelden(
        &self,
        server: ServerId,
        login: &str,
        passwort: &str,
    ) -> AuthResult<Option<RegistrierungRecord>> {
        let Some(registrierung) = self.repo.registrierung_nach_login(server, login).await? else {
            tracing::debug!(server = %server, login, "Login unbekannt");
            return Ok(None);
        };

        if passwort_verifizieren(passwort, &registrierung.passwort_hash)? {
            Ok(Some(registrierung))
        } else {
            tracing::debug!(server = %server, login, "Passwort falsch");
            Ok(None)
        }
    }

    /// Legt eine neue Registrierung an
    pub async fn registrieren(
        &self,
        server: ServerId,
        login: &str,
        passwort: &str,
        global_flags: GlobalFlags,
    ) -> AuthResult<RegistrierungRecord> {
        if login.is_empty() || login.len() > LOGIN_MAX {
            return Err(AuthError::LoginUngueltig(format!(
                "Login muss 1 bis {LOGIN_MAX} Zeichen lang sein"
            )));
        }

        let hash = passwort_hashen(passwort)?;
        let ergebnis = self
            .repo
            .registrierung_anlegen(NeueRegistrierung {
                server_id: server,
                login,
                passwort_hash: &hash,
                global_flags,
            })
            .await;

        match ergebnis {
            Ok(registrierung) => {
                tracing::info!(server = %server, login, "Spieler registriert");
                Ok(registrierung)
            }
            Err(e) if e.ist_eindeutigkeit() => Err(AuthError::LoginVergeben(login.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}
