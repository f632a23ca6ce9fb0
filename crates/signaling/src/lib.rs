//! altfunk-signaling – UDP-Protokoll-Engine
//!
//! Dieser Crate implementiert die Sitzungs- und Steuerlogik eines
//! virtuellen Servers fuer die Legacy-Sprachclients: Verbindungsaufbau,
//! Keepalive, Aenderungen an Kanal-Eigenschaften und die Verteilung der
//! Benachrichtigungen an alle Sessions.
//!
//! ## Architektur
//!
//! ```text
//! UdpServer (ein Socket pro virtuellem Server)
//!     |
//!     v
//! DatagramDispatcher (besitzt ServerZustand, seriell)
//!     |
//!     +-- ConnectionHandler  (Pruefsumme, Ban, Anmeldung, Annahme)
//!     +-- KeepaliveHandler   (Token zurueck, Zeitstempel)
//!     +-- ChannelHandler     (Name, Thema, Beschreibung, Flags/Codec,
//!     |                       Passwort, Reihenfolge, max. Nutzer)
//!     |
//!     v
//! BroadcastNotifier – eine Notiz, pro Empfaenger eigene IDs und Zaehler
//! ```

pub mod broadcast;
pub mod channel;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod server_state;
pub mod session;
pub mod transport;
pub mod udp;

#[cfg(test)]
mod testing;

// Bequeme Re-Exporte
pub use channel::{Kanal, KanalBaum};
pub use dispatcher::DatagramDispatcher;
pub use error::{SignalingError, SignalingResult};
pub use server_state::{Dienste, ServerKonfig, ServerZustand};
pub use session::{Session, SessionTable};
pub use transport::PacketTransport;
pub use udp::{Lebendigkeit, UdpServer};
