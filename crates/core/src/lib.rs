//! altfunk-core – Gemeinsame Typen und Flags
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Altfunk-Crates gemeinsam genutzt werden: Identifikatoren,
//! Flag-Bitsets der Legacy-Clients und die Codec-Tabelle.

pub mod flags;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use flags::{ChannelFlags, ChannelPrivileges, Codec, CodecMaske, GlobalFlags};
pub use types::{ChannelId, PrivateId, PublicId, ServerId};
