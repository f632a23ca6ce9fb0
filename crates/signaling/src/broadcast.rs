//! BroadcastNotifier – verteilt eine Notiz an alle Sessions
//!
//! Die Notiz wird einmal gebaut. Pro Empfaenger werden Private ID, Public ID
//! und dessen Broadcast-Zaehler in denselben Puffer geschrieben, die
//! Pruefsumme neu berechnet und das Paket versendet, bevor der naechste
//! Empfaenger an der Reihe ist.

use altfunk_core::PublicId;
use altfunk_protocol::{packet::empfaenger_setzen, Notiz};

use crate::session::SessionTable;
use crate::transport::PacketTransport;

/// Sendet `notiz` an alle Sessions und liefert die Zahl der Zustellungen
pub async fn an_alle_senden<T: PacketTransport>(
    transport: &T,
    sessions: &mut SessionTable,
    notiz: &Notiz,
) -> usize {
    an_alle_ausser_senden(transport, sessions, notiz, None).await
}

/// Wie `an_alle_senden`, laesst aber optional eine Session aus
pub async fn an_alle_ausser_senden<T: PacketTransport>(
    transport: &T,
    sessions: &mut SessionTable,
    notiz: &Notiz,
    ausgenommen: Option<PublicId>,
) -> usize {
    let mut paket = match notiz.kodieren() {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(funktion = notiz.funktion(), fehler = %e, "Notiz konnte nicht gebaut werden");
            return 0;
        }
    };

    // Momentaufnahme: Aenderungen der Tabelle waehrend des Versands stoeren nicht
    let empfaenger = sessions.public_ids();
    let mut zugestellt = 0;

    for public in empfaenger {
        if Some(public) == ausgenommen {
            continue;
        }
        let Some(session) = sessions.get_mut(public) else {
            continue;
        };
        if let Err(e) = empfaenger_setzen(&mut paket, &session.kopf_broadcast()) {
            tracing::warn!(public_id = %public, fehler = %e, "Empfaengerfelder nicht gesetzt");
            continue;
        }
        match transport.senden(&paket, session.adresse).await {
            Ok(()) => {
                session.zaehler_broadcast = session.zaehler_broadcast.wrapping_add(1);
                zugestellt += 1;
            }
            Err(e) => {
                tracing::warn!(
                    public_id = %public,
                    ziel = %session.adresse,
                    fehler = %e,
                    "Notiz nicht zugestellt"
                );
            }
        }
    }

    tracing::debug!(
        funktion = notiz.funktion(),
        zugestellt,
        "Notiz verteilt"
    );
    zugestellt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::testing::AufzeichnenderTransport;
    use altfunk_core::{ChannelId, PrivateId};
    use altfunk_protocol::{checksum, control, PaketKopf};

    fn tabelle(anzahl: u32) -> SessionTable {
        let mut tabelle = SessionTable::neu();
        for i in 1..=anzahl {
            let adresse = format!("10.0.0.{i}:4000").parse().unwrap();
            tabelle
                .einfuegen(Session::neu(PrivateId(1000 + i), PublicId(i), adresse))
                .unwrap();
        }
        tabelle
    }

    fn notiz() -> Notiz {
        Notiz::KanalReihenfolge {
            kanal: ChannelId(7),
            reihenfolge: 3,
            akteur: PublicId(1),
        }
    }

    #[tokio::test]
    async fn jeder_empfaenger_eigene_ids_und_zaehler() {
        let transport = AufzeichnenderTransport::neu();
        let mut sessions = tabelle(3);
        sessions.get_mut(PublicId(2)).unwrap().zaehler_broadcast = 40;

        let zugestellt = an_alle_senden(&transport, &mut sessions, &notiz()).await;
        assert_eq!(zugestellt, 3);

        let pakete = transport.pakete();
        assert_eq!(pakete.len(), 3);
        for (paket, ziel) in &pakete {
            let kopf = PaketKopf::lesen(paket).unwrap();
            let session = sessions.get(kopf.public_id).unwrap();
            assert_eq!(*ziel, session.adresse);
            assert_eq!(kopf.private_id, session.private_id);
            // Zaehler des Pakets ist der Wert vor dem Erhoehen
            assert_eq!(kopf.zaehler + 1, session.zaehler_broadcast);
            assert!(checksum::pruefen(paket, control::PRUEFSUMMEN_OFFSET));
        }
        assert_eq!(sessions.get(PublicId(2)).unwrap().zaehler_broadcast, 41);
    }

    #[tokio::test]
    async fn zaehler_steigt_um_anzahl_broadcasts() {
        let transport = AufzeichnenderTransport::neu();
        let mut sessions = tabelle(2);
        let vorher = sessions.get(PublicId(1)).unwrap().zaehler_broadcast;

        for _ in 0..5 {
            an_alle_senden(&transport, &mut sessions, &notiz()).await;
        }
        assert_eq!(sessions.get(PublicId(1)).unwrap().zaehler_broadcast, vorher + 5);
    }

    #[tokio::test]
    async fn fehlgeschlagener_versand_erhoeht_nicht() {
        let transport = AufzeichnenderTransport::neu();
        let mut sessions = tabelle(2);
        let gesperrt = sessions.get(PublicId(2)).unwrap().adresse;
        transport.ziel_sperren(gesperrt);

        let zugestellt = an_alle_senden(&transport, &mut sessions, &notiz()).await;
        assert_eq!(zugestellt, 1);
        assert_eq!(sessions.get(PublicId(1)).unwrap().zaehler_broadcast, 2);
        assert_eq!(sessions.get(PublicId(2)).unwrap().zaehler_broadcast, 1);
    }

    #[tokio::test]
    async fn ausgenommene_session_bekommt_nichts() {
        let transport = AufzeichnenderTransport::neu();
        let mut sessions = tabelle(3);

        let zugestellt =
            an_alle_ausser_senden(&transport, &mut sessions, &notiz(), Some(PublicId(2))).await;
        assert_eq!(zugestellt, 2);
        assert!(transport
            .pakete()
            .iter()
            .all(|(p, _)| PaketKopf::lesen(p).unwrap().public_id != PublicId(2)));
    }
}
