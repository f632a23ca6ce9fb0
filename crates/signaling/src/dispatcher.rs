//! Datagramm-Dispatcher – Routet eingehende Pakete an die Handler
//!
//! Das erste 32-Bit-Wort entscheidet:
//! - `0x0003bef4` Verbindungsanfrage
//! - `0x0001bef4` Keepalive
//! - `0x????bef0` Steuerpaket (obere Haelfte = Funktionscode)
//! - `0x0000bef1` Quittung des Clients (wird ignoriert)
//!
//! ## Steuerpakete
//! Jedes Steuerpaket einer bekannten Session wird sofort quittiert, auch
//! wenn die Anfrage spaeter abgelehnt wird. Ein Zaehler unterhalb des
//! erwarteten Werts ist eine Wiederholung: quittieren, nicht erneut anwenden.

use std::net::SocketAddr;
use std::time::Duration;

use altfunk_core::PublicId;
use altfunk_db::repository::{BanRepository, ChannelRepository, RegistrationRepository};
use altfunk_protocol::{
    checksum,
    control::{self, grund},
    Eingang, KanalAnfrage, Notiz, Quittung, SteuerKopf,
};
use tokio::time::Instant;

use crate::broadcast;
use crate::handlers::{channel_handler, connection_handler, keepalive_handler};
use crate::handlers::connection_handler::Handshake;
use crate::server_state::{Dienste, ServerZustand};
use crate::transport::PacketTransport;

/// Zentraler Dispatcher eines virtuellen Servers
///
/// Besitzt den Zustand exklusiv; alle Pakete eines Servers laufen seriell
/// durch `verarbeiten`.
pub struct DatagramDispatcher<D, T>
where
    D: ChannelRepository + RegistrationRepository + BanRepository,
    T: PacketTransport,
{
    zustand: ServerZustand,
    dienste: Dienste<D, T>,
}

impl<D, T> DatagramDispatcher<D, T>
where
    D: ChannelRepository + RegistrationRepository + BanRepository,
    T: PacketTransport,
{
    /// Erstellt einen neuen Dispatcher
    pub fn neu(zustand: ServerZustand, dienste: Dienste<D, T>) -> Self {
        Self { zustand, dienste }
    }

    pub fn zustand(&self) -> &ServerZustand {
        &self.zustand
    }

    pub fn zustand_mut(&mut self) -> &mut ServerZustand {
        &mut self.zustand
    }

    pub fn dienste(&self) -> &Dienste<D, T> {
        &self.dienste
    }

    /// Verarbeitet ein eingehendes Datagramm
    pub async fn verarbeiten(&mut self, daten: &[u8], absender: SocketAddr) {
        let eingang = match Eingang::erkennen(daten) {
            Ok(e) => e,
            Err(e) => {
                tracing::trace!(absender = %absender, fehler = %e, "Unbekanntes Datagramm verworfen");
                return;
            }
        };

        match eingang {
            Eingang::Verbinden => {
                let ergebnis = connection_handler::handle_verbinden(
                    daten,
                    absender,
                    &mut self.zustand,
                    &self.dienste,
                )
                .await;
                if let Handshake::Angenommen(public_id) = ergebnis {
                    tracing::debug!(
                        public_id = %public_id,
                        sessions = self.zustand.sessions.len(),
                        "Handshake abgeschlossen"
                    );
                }
            }
            Eingang::Keepalive => {
                keepalive_handler::handle_keepalive(
                    daten,
                    absender,
                    &mut self.zustand,
                    self.dienste.transport.as_ref(),
                )
                .await;
            }
            Eingang::Steuerung { funktion } => {
                self.steuerung_verarbeiten(daten, absender, funktion).await;
            }
            Eingang::Quittung => {
                tracing::trace!(absender = %absender, "Quittung des Clients");
            }
        }
    }

    async fn steuerung_verarbeiten(&mut self, daten: &[u8], absender: SocketAddr, funktion: u16) {
        if !checksum::pruefen(daten, control::PRUEFSUMMEN_OFFSET) {
            tracing::trace!(absender = %absender, funktion, "Steuerpaket mit falscher Pruefsumme verworfen");
            return;
        }
        let kopf = match SteuerKopf::dekodieren(daten) {
            Ok(k) => k.kopf,
            Err(e) => {
                tracing::debug!(absender = %absender, fehler = %e, "Steuerkopf unlesbar");
                return;
            }
        };

        let Some(session) = self
            .zustand
            .sessions
            .finden_mut(kopf.public_id, kopf.private_id)
        else {
            tracing::debug!(absender = %absender, public_id = %kopf.public_id, "Steuerpaket fuer unbekannte Session");
            return;
        };

        // Quittung immer, unabhaengig vom Ausgang
        let quittung = Quittung {
            private_id: session.private_id,
            public_id: session.public_id,
            zaehler: kopf.zaehler,
        };
        match quittung.kodieren() {
            Ok(paket) => {
                if let Err(e) = self.dienste.transport.senden(&paket, session.adresse).await {
                    tracing::warn!(public_id = %session.public_id, fehler = %e, "Quittung nicht gesendet");
                }
            }
            Err(e) => tracing::warn!(fehler = %e, "Quittung konnte nicht gebaut werden"),
        }

        if !session.eingang_annehmen(kopf.zaehler) {
            tracing::debug!(
                public_id = %session.public_id,
                zaehler = kopf.zaehler,
                erwartet = session.erwarteter_eingang,
                "Wiederholtes Steuerpaket nur quittiert"
            );
            return;
        }
        let akteur = session.public_id;

        let anfrage = match KanalAnfrage::dekodieren(daten) {
            Ok(a) => a,
            Err(e) => {
                tracing::debug!(public_id = %akteur, funktion, fehler = %e, "Steuerpaket nicht verarbeitet");
                return;
            }
        };

        let geaendert =
            channel_handler::handle_kanal_anfrage(anfrage, akteur, &mut self.zustand, &self.dienste)
                .await;
        tracing::trace!(public_id = %akteur, funktion, geaendert, "Steuerpaket verarbeitet");
    }

    /// Entfernt Sessions ohne Keepalive seit `timeout`
    ///
    /// Die verbleibenden Sessions erhalten je eine "Spieler weg"-Notiz.
    pub async fn abgelaufene_entfernen(&mut self, timeout: Duration) -> Vec<PublicId> {
        let abgelaufen = self.zustand.sessions.abgelaufene(Instant::now(), timeout);
        for &public_id in &abgelaufen {
            let Some(session) = self.zustand.sessions.entfernen(public_id) else {
                continue;
            };
            tracing::info!(
                server = %self.zustand.server_id(),
                public_id = %public_id,
                nickname = %session.nickname,
                "Session wegen Zeitueberschreitung entfernt"
            );
            let notiz = Notiz::SpielerWeg {
                spieler: public_id,
                grund: grund::TIMEOUT,
            };
            broadcast::an_alle_senden(
                self.dienste.transport.as_ref(),
                &mut self.zustand.sessions,
                &notiz,
            )
            .await;
        }
        abgelaufen
    }
}
