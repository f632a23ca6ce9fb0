//! UDP-Empfangsschleife eines virtuellen Servers
//!
//! Ein Socket pro Server. Datagramme werden nacheinander vom
//! `DatagramDispatcher` verarbeitet; ein Intervall entfernt abgelaufene
//! Sessions. Die Schleife endet, sobald der Shutdown-Kanal `true` meldet.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use altfunk_db::repository::{BanRepository, ChannelRepository, RegistrationRepository};
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::dispatcher::DatagramDispatcher;
use crate::error::SignalingResult;
use crate::server_state::{Dienste, ServerZustand};

/// Groesster Empfangspuffer; das laengste Paket hat 436 Bytes
const PUFFER_GROESSE: usize = 2048;

/// Zeitgrenzen fuer die Lebendigkeit von Sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lebendigkeit {
    /// Ohne Keepalive laenger als das -> Session entfernen
    pub timeout: Duration,
    /// Abstand zwischen zwei Pruefungen
    pub pruef_intervall: Duration,
}

impl Default for Lebendigkeit {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            pruef_intervall: Duration::from_secs(10),
        }
    }
}

/// UDP-Server fuer einen virtuellen Server
pub struct UdpServer<D>
where
    D: ChannelRepository + RegistrationRepository + BanRepository,
{
    socket: Arc<UdpSocket>,
    dispatcher: DatagramDispatcher<D, UdpSocket>,
    lebendigkeit: Lebendigkeit,
}

impl<D> UdpServer<D>
where
    D: ChannelRepository + RegistrationRepository + BanRepository,
{
    /// Bindet den Socket und baut den Dispatcher
    pub async fn binden(
        adresse: SocketAddr,
        zustand: ServerZustand,
        db: Arc<D>,
        lebendigkeit: Lebendigkeit,
    ) -> SignalingResult<Self> {
        let socket = Arc::new(UdpSocket::bind(adresse).await?);
        let dienste = Dienste::neu(db, Arc::clone(&socket));
        Ok(Self {
            socket,
            dispatcher: DatagramDispatcher::neu(zustand, dienste),
            lebendigkeit,
        })
    }

    /// Tatsaechlich gebundene Adresse (Port 0 -> vom System vergeben)
    pub fn lokale_adresse(&self) -> SignalingResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Empfaengt und verarbeitet Datagramme bis zum Shutdown
    pub async fn starten(mut self, mut shutdown_rx: watch::Receiver<bool>) -> SignalingResult<()> {
        let lokale_adresse = self.socket.local_addr()?;
        let server = self.dispatcher.zustand().server_id();
        tracing::info!(
            server = %server,
            adresse = %lokale_adresse,
            kanaele = self.dispatcher.zustand().kanaele.len(),
            "UDP-Server gestartet"
        );

        let mut puffer = vec![0u8; PUFFER_GROESSE];
        let mut pruefung = tokio::time::interval(self.lebendigkeit.pruef_intervall);
        pruefung.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                ergebnis = self.socket.recv_from(&mut puffer) => {
                    match ergebnis {
                        Ok((laenge, absender)) => {
                            self.dispatcher.verarbeiten(&puffer[..laenge], absender).await;
                        }
                        Err(e) => {
                            // z.B. ICMP "port unreachable" einer frueheren Sendung
                            tracing::debug!(server = %server, fehler = %e, "UDP-Empfangsfehler");
                        }
                    }
                }

                _ = pruefung.tick() => {
                    let entfernt = self
                        .dispatcher
                        .abgelaufene_entfernen(self.lebendigkeit.timeout)
                        .await;
                    if !entfernt.is_empty() {
                        tracing::debug!(server = %server, anzahl = entfernt.len(), "Abgelaufene Sessions entfernt");
                    }
                }

                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(server = %server, "UDP-Server: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        tracing::info!(
            server = %server,
            sessions = self.dispatcher.zustand().sessions.len(),
            "UDP-Server gestoppt"
        );
        Ok(())
    }
}
