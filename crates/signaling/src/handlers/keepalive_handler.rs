//! Keepalive – Token zurueckschicken, Zeitstempel auffrischen

use std::net::SocketAddr;

use altfunk_protocol::{checksum, connection, KeepaliveAnfrage, KeepaliveAntwort};
use tokio::time::Instant;

use crate::server_state::ServerZustand;
use crate::transport::{unicast_senden, PacketTransport};

/// Beantwortet einen Keepalive; `true` wenn die Session gefunden wurde
pub async fn handle_keepalive<T: PacketTransport>(
    daten: &[u8],
    absender: SocketAddr,
    zustand: &mut ServerZustand,
    transport: &T,
) -> bool {
    if !checksum::pruefen(daten, connection::PRUEFSUMMEN_OFFSET) {
        tracing::trace!(absender = %absender, "Keepalive mit falscher Pruefsumme verworfen");
        return false;
    }

    let anfrage = match KeepaliveAnfrage::dekodieren(daten) {
        Ok(a) => a,
        Err(e) => {
            tracing::debug!(absender = %absender, fehler = %e, "Keepalive unlesbar");
            return false;
        }
    };

    let Some(session) = zustand
        .sessions
        .finden_mut(anfrage.public_id, anfrage.private_id)
    else {
        tracing::warn!(
            absender = %absender,
            public_id = %anfrage.public_id,
            "Keepalive fuer unbekannte Session"
        );
        return false;
    };

    let token = anfrage.token;
    if let Err(e) = unicast_senden(transport, session, |kopf| {
        KeepaliveAntwort { kopf, token }.kodieren()
    })
    .await
    {
        tracing::warn!(public_id = %session.public_id, fehler = %e, "Keepalive-Antwort nicht gesendet");
    }

    session.letzter_ping = Instant::now();
    tracing::trace!(public_id = %session.public_id, "Keepalive beantwortet");
    true
}
