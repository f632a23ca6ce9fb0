//! altfunk-db – Persistenz der Protokoll-Engine
//!
//! Dieses Crate stellt das Repository-Pattern fuer virtuelle Server,
//! registrierte Kanaele, Registrierungen und IP-Bans bereit. Die einzige
//! Implementierung ist SQLite mit eingebetteten Migrationen.

pub mod error;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::{DbError, DbResult};
pub use repository::{
    BanRepository, ChannelRepository, DatabaseConfig, RegistrationRepository, ServerRepository,
};
pub use sqlite::SqliteDb;
