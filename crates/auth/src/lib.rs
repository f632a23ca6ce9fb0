//! altfunk-auth – Anmeldung, Bans und Privilegien
//!
//! Dieses Crate implementiert:
//! - Passwort-Hashing mit Argon2id
//! - RegistrationService (Login registrierter Spieler)
//! - BanService (IP-Bans pro Server)
//! - PrivilegeTable (Server-Privilegien und das `PrivilegeCheck`-Praedikat)

pub mod ban_service;
pub mod error;
pub mod password;
pub mod privileges;
pub mod registration_service;

// Bequeme Re-Exporte
pub use ban_service::BanService;
pub use error::{AuthError, AuthResult};
pub use password::{passwort_hashen, passwort_verifizieren};
pub use privileges::{PrivilegGruppe, Privilege, PrivilegeCheck, PrivilegeTable, SitzungsSicht};
pub use registration_service::RegistrationService;
