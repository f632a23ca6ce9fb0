//! altfunk-protocol – Drahtformat der Legacy-Sprachclients
//!
//! Alle Pakete haben eine feste, versionierte Groesse. Ganzzahlen sind
//! little-endian, Strings sind Latin-1 mit Laengenbyte oder Null-Terminator.
//!
//! ## Paketklassen
//!
//! ```text
//! Klasse       Erstes Wort   Kopf    Pruefsumme
//! ----------   -----------   ----    ----------
//! Verbindung   0x000Xbef4    20 B    Offset 16
//! Steuerung    0xFFFFbef0    24 B    Offset 20
//! Quittung     0x0000bef1    16 B    keine
//! ```

pub mod checksum;
pub mod connection;
pub mod control;
pub mod error;
pub mod packet;
pub mod wire;

pub use connection::{AnnahmePaket, KeepaliveAnfrage, KeepaliveAntwort, VerbindungsAnfrage};
pub use control::{KanalAnfrage, Notiz, Quittung, SteuerKopf};
pub use error::{WireError, WireResult};
pub use packet::{Eingang, PacketFramer, PaketKlasse, PaketKopf};
pub use wire::{WireReader, WireWriter};
