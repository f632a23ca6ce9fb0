//! Gemeinsame Identifikationstypen fuer Altfunk
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen. Auf dem Draht
//! sind alle IDs 32-Bit-Werte (little-endian).

use serde::{Deserialize, Serialize};

/// Geheime Session-ID – nur dem Client und dem Server bekannt
///
/// Beweist bei jedem eingehenden Paket den Besitz der Session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrivateId(pub u32);

impl PrivateId {
    /// Gibt den rohen Draht-Wert zurueck
    pub fn inner(&self) -> u32 {
        self.0
    }
}

// Die geheime ID wird absichtlich nicht ausgegeben
impl std::fmt::Display for PrivateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "private:****")
    }
}

/// Oeffentliche Session-ID – adressiert eine Session gegenueber allen Peers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicId(pub u32);

impl PublicId {
    /// Gibt den rohen Draht-Wert zurueck
    pub fn inner(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PublicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player:{}", self.0)
    }
}

/// Stabile, vom Server vergebene Kanal-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub u32);

impl ChannelId {
    /// Gibt den rohen Draht-Wert zurueck
    pub fn inner(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "channel:{}", self.0)
    }
}

/// ID eines virtuellen Servers (Datenbank-Schluessel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServerId(pub u32);

impl ServerId {
    /// Gibt den rohen Wert zurueck
    pub fn inner(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ServerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "server:{}", self.0)
    }
}
