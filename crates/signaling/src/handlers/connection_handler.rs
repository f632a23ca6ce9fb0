//! Verbindungsaufbau – Pruefsumme, Ban, Anmeldung, Annahme
//!
//! Ablauf pro Verbindungsanfrage:
//! 1. Pruefsumme falsch -> verwerfen, keine Antwort
//! 2. IP gebannt -> Ablehnungspaket (436 Bytes, nur Platzhalter-IDs)
//! 3. Anonym: Serverpasswort muss passen, sonst verwerfen ohne Antwort
//! 4. Mit Login: Registrierung muss passen, sonst verwerfen ohne Antwort
//! 5. Session sichtbar machen, Annahmepaket senden, alle benachrichtigen

use std::net::SocketAddr;

use altfunk_core::{ChannelId, GlobalFlags, PublicId};
use altfunk_db::repository::{BanRepository, ChannelRepository, RegistrationRepository};
use altfunk_protocol::{
    checksum,
    connection::{self, FEHLER_OK, SERVER_VERSION},
    AnnahmePaket, Notiz, VerbindungsAnfrage,
};

use crate::broadcast;
use crate::server_state::{Dienste, ServerZustand};
use crate::session::Session;
use crate::transport::{unicast_senden, PacketTransport};

/// Ergebnis eines Verbindungsversuchs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handshake {
    Angenommen(PublicId),
    Gebannt,
    Verworfen,
}

/// Verarbeitet eine Verbindungsanfrage
pub async fn handle_verbinden<D, T>(
    daten: &[u8],
    absender: SocketAddr,
    zustand: &mut ServerZustand,
    dienste: &Dienste<D, T>,
) -> Handshake
where
    D: ChannelRepository + RegistrationRepository + BanRepository,
    T: PacketTransport,
{
    let server = zustand.server_id();

    if !checksum::pruefen(daten, connection::PRUEFSUMMEN_OFFSET) {
        tracing::trace!(absender = %absender, "Verbindungsanfrage mit falscher Pruefsumme verworfen");
        return Handshake::Verworfen;
    }

    // Ban-Pruefung vor allem anderen
    match dienste.bans.ist_gebannt(server, absender.ip()).await {
        Ok(Some(ban)) => {
            tracing::info!(
                server = %server,
                absender = %absender,
                grund = %ban.grund,
                "Verbindung einer gebannten IP abgelehnt"
            );
            ablehnung_senden(dienste, absender).await;
            return Handshake::Gebannt;
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(absender = %absender, fehler = %e, "Ban-Pruefung fehlgeschlagen");
            return Handshake::Verworfen;
        }
    }

    let anfrage = match VerbindungsAnfrage::dekodieren(daten) {
        Ok(a) => a,
        Err(e) => {
            tracing::debug!(absender = %absender, fehler = %e, "Verbindungsanfrage unlesbar");
            return Handshake::Verworfen;
        }
    };

    let (private_id, public_id) = match zustand.sessions.ids_vergeben() {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(absender = %absender, fehler = %e, "Keine Session-ID frei");
            return Handshake::Verworfen;
        }
    };

    // Noch nicht in der SessionTable
    let mut session = Session::neu(private_id, public_id, absender);
    session.nickname = anfrage.nickname.clone();
    session.client_name = anfrage.client_name.clone();
    session.betriebssystem = anfrage.betriebssystem.clone();
    session.client_version = anfrage.client_version;

    match &anfrage.login {
        None => {
            if anfrage.passwort != zustand.konfig.passwort {
                tracing::info!(absender = %absender, "Anonyme Verbindung: Serverpasswort falsch");
                return Handshake::Verworfen;
            }
            session.global = GlobalFlags::from_raw(GlobalFlags::UNREGISTERED);
        }
        Some(login) => {
            match dienste
                .registrierungen
                .anmelden(server, login, &anfrage.passwort)
                .await
            {
                Ok(Some(registrierung)) => {
                    session.global.hinzufuegen(registrierung.global_flags.raw());
                    session.global.hinzufuegen(GlobalFlags::REGISTERED);
                    session.registrierung = Some(registrierung);
                }
                Ok(None) => {
                    tracing::info!(absender = %absender, login = %login, "Anmeldung fehlgeschlagen");
                    return Handshake::Verworfen;
                }
                Err(e) => {
                    tracing::error!(absender = %absender, fehler = %e, "Registrierung nicht pruefbar");
                    return Handshake::Verworfen;
                }
            }
        }
    }

    session.kanal = zustand.kanaele.standard_kanal();

    if let Err(e) = zustand.sessions.einfuegen(session) {
        tracing::error!(fehler = %e, "Session konnte nicht eingetragen werden");
        return Handshake::Verworfen;
    }

    annahme_senden(zustand, dienste, public_id).await;

    let Some(session) = zustand.sessions.get(public_id) else {
        return Handshake::Verworfen;
    };
    tracing::info!(
        server = %server,
        public_id = %public_id,
        nickname = %session.nickname,
        registriert = session.ist_registriert(),
        absender = %absender,
        "Spieler verbunden"
    );

    let notiz = Notiz::NeuerSpieler {
        spieler: public_id,
        kanal: session.kanal.unwrap_or(ChannelId(0)),
        kanal_rechte: session.kanal_rechte,
        global: session.global,
        attribute: session.attribute,
        nickname: session.nickname.clone(),
    };
    broadcast::an_alle_senden(dienste.transport.as_ref(), &mut zustand.sessions, &notiz).await;

    Handshake::Angenommen(public_id)
}

async fn ablehnung_senden<D, T>(dienste: &Dienste<D, T>, ziel: SocketAddr)
where
    D: ChannelRepository + RegistrationRepository + BanRepository,
    T: PacketTransport,
{
    let paket = match AnnahmePaket::gebannt().kodieren() {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(fehler = %e, "Ablehnungspaket konnte nicht gebaut werden");
            return;
        }
    };
    if let Err(e) = dienste.transport.senden(&paket, ziel).await {
        tracing::warn!(ziel = %ziel, fehler = %e, "Ablehnung nicht gesendet");
    }
}

async fn annahme_senden<D, T>(zustand: &mut ServerZustand, dienste: &Dienste<D, T>, public_id: PublicId)
where
    D: ChannelRepository + RegistrationRepository + BanRepository,
    T: PacketTransport,
{
    let konfig = &zustand.konfig;
    let bitfeld = zustand.privileg_bitfeld;
    let Some(session) = zustand.sessions.get_mut(public_id) else {
        return;
    };

    let ergebnis = unicast_senden(dienste.transport.as_ref(), session, |kopf| {
        AnnahmePaket {
            kopf,
            server_name: konfig.name.clone(),
            maschine: konfig.maschine.clone(),
            server_version: SERVER_VERSION,
            fehlercode: FEHLER_OK,
            codecs: konfig.codecs,
            privilegien: bitfeld,
            sitzung_private: kopf.private_id,
            sitzung_public: kopf.public_id,
            willkommen: konfig.willkommen.clone(),
        }
        .kodieren()
    })
    .await;

    if let Err(e) = ergebnis {
        tracing::warn!(public_id = %public_id, fehler = %e, "Annahmepaket nicht gesendet");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::KanalBaum;
    use crate::server_state::ServerKonfig;
    use crate::testing::{AufzeichnenderTransport, TestDb};
    use altfunk_auth::{passwort_hashen, PrivilegeTable};
    use altfunk_core::{CodecMaske, ServerId};
    use altfunk_db::models::{BanRecord, RegistrierungRecord};
    use altfunk_protocol::{control, PaketKopf};
    use std::sync::Arc;

    fn zustand() -> ServerZustand {
        ServerZustand::neu(
            ServerKonfig {
                id: ServerId(1),
                name: "Altfunk".into(),
                maschine: "host".into(),
                willkommen: "Willkommen!".into(),
                passwort: "secret".into(),
                codecs: CodecMaske::STANDARD,
            },
            KanalBaum::mit_standardkanal("Lobby"),
            PrivilegeTable::standard(),
        )
    }

    fn dienste() -> Dienste<TestDb, AufzeichnenderTransport> {
        Dienste::neu(Arc::new(TestDb::default()), Arc::new(AufzeichnenderTransport::neu()))
    }

    fn anfrage(login: Option<&str>, passwort: &str) -> Vec<u8> {
        VerbindungsAnfrage {
            zaehler: 1,
            client_name: "TeamSpeak".into(),
            betriebssystem: "Linux".into(),
            client_version: [2, 0, 32, 60],
            login: login.map(String::from),
            passwort: passwort.into(),
            nickname: "anna".into(),
        }
        .kodieren()
        .unwrap()
    }

    fn absender() -> SocketAddr {
        "192.0.2.10:6000".parse().unwrap()
    }

    #[tokio::test]
    async fn anonym_mit_serverpasswort() {
        let mut zustand = zustand();
        let dienste = dienste();

        let ergebnis =
            handle_verbinden(&anfrage(None, "secret"), absender(), &mut zustand, &dienste).await;
        let Handshake::Angenommen(public) = ergebnis else {
            panic!("Annahme erwartet, erhalten: {ergebnis:?}");
        };

        let session = zustand.sessions.get(public).unwrap();
        assert!(!session.ist_registriert());
        assert_eq!(session.kanal, Some(ChannelId(1)));
        // Annahme erhoeht Unicast-, Notiz erhoeht Broadcast-Zaehler
        assert_eq!(session.zaehler_unicast, 2);
        assert_eq!(session.zaehler_broadcast, 2);

        let pakete = dienste.transport.pakete();
        assert_eq!(pakete.len(), 2);
        let annahme = AnnahmePaket::dekodieren(&pakete[0].0).unwrap();
        assert_eq!(annahme.fehlercode, FEHLER_OK);
        assert_eq!(annahme.sitzung_public, public);
        assert_eq!(annahme.sitzung_private, session.private_id);
        assert_eq!(annahme.willkommen, "Willkommen!");
        assert_eq!(annahme.privilegien, zustand.privileg_bitfeld);

        let notiz = Notiz::dekodieren(&pakete[1].0).unwrap();
        assert_eq!(notiz.funktion(), control::funktion::NEUER_SPIELER);
    }

    #[tokio::test]
    async fn anonym_mit_falschem_passwort() {
        let mut zustand = zustand();
        let dienste = dienste();

        let ergebnis =
            handle_verbinden(&anfrage(None, "wrong"), absender(), &mut zustand, &dienste).await;
        assert_eq!(ergebnis, Handshake::Verworfen);
        assert!(zustand.sessions.is_empty());
        assert!(dienste.transport.pakete().is_empty());
    }

    #[tokio::test]
    async fn falsche_pruefsumme_verworfen() {
        let mut zustand = zustand();
        let dienste = dienste();
        let mut paket = anfrage(None, "secret");
        paket[100] ^= 0x01;

        let ergebnis = handle_verbinden(&paket, absender(), &mut zustand, &dienste).await;
        assert_eq!(ergebnis, Handshake::Verworfen);
        assert!(dienste.transport.pakete().is_empty());
    }

    #[tokio::test]
    async fn gebannte_ip_bekommt_ablehnung() {
        let mut zustand = zustand();
        let dienste = dienste();
        dienste.db.bans.lock().unwrap().push(BanRecord {
            id: 1,
            server_id: ServerId(1),
            ip: "192.0.2.10".into(),
            grund: "Spam".into(),
            expires_at: None,
            created_at: chrono::Utc::now(),
        });

        let ergebnis =
            handle_verbinden(&anfrage(None, "secret"), absender(), &mut zustand, &dienste).await;
        assert_eq!(ergebnis, Handshake::Gebannt);
        assert!(zustand.sessions.is_empty());

        let pakete = dienste.transport.pakete();
        assert_eq!(pakete.len(), 1);
        assert_eq!(pakete[0].0.len(), connection::ANNAHME_GROESSE);
        let ablehnung = AnnahmePaket::dekodieren(&pakete[0].0).unwrap();
        assert!(ablehnung.ist_gebannt());
        assert_eq!(ablehnung, AnnahmePaket::gebannt());
    }

    #[tokio::test]
    async fn registrierter_login() {
        let mut zustand = zustand();
        let dienste = dienste();
        dienste.db.registrierungen.lock().unwrap().push(RegistrierungRecord {
            id: 1,
            server_id: ServerId(1),
            login: "anna".into(),
            passwort_hash: passwort_hashen("pw").unwrap(),
            global_flags: GlobalFlags::from_raw(GlobalFlags::SERVER_ADMIN),
            created_at: chrono::Utc::now(),
        });

        let ergebnis =
            handle_verbinden(&anfrage(Some("anna"), "pw"), absender(), &mut zustand, &dienste).await;
        let Handshake::Angenommen(public) = ergebnis else {
            panic!("Annahme erwartet");
        };
        let session = zustand.sessions.get(public).unwrap();
        assert!(session.ist_registriert());
        assert!(session.global.ist_server_admin());
        assert_eq!(session.registrierung.as_ref().unwrap().login, "anna");
    }

    #[tokio::test]
    async fn unbekannter_login_ohne_session() {
        let mut zustand = zustand();
        let dienste = dienste();

        let ergebnis =
            handle_verbinden(&anfrage(Some("bob"), "secret"), absender(), &mut zustand, &dienste)
                .await;
        assert_eq!(ergebnis, Handshake::Verworfen);
        assert!(zustand.sessions.is_empty());
        assert!(dienste.transport.pakete().is_empty());
    }

    #[tokio::test]
    async fn bestehende_sessions_werden_benachrichtigt() {
        let mut zustand = zustand();
        let dienste = dienste();

        let Handshake::Angenommen(erste) =
            handle_verbinden(&anfrage(None, "secret"), absender(), &mut zustand, &dienste).await
        else {
            panic!("Annahme erwartet");
        };
        dienste.transport.leeren();

        let zweiter: SocketAddr = "192.0.2.11:6000".parse().unwrap();
        handle_verbinden(&anfrage(None, "secret"), zweiter, &mut zustand, &dienste).await;

        let an_erste: Vec<_> = dienste
            .transport
            .pakete()
            .into_iter()
            .filter(|(p, _)| PaketKopf::lesen(p).unwrap().public_id == erste)
            .collect();
        assert_eq!(an_erste.len(), 1);
        assert!(matches!(
            Notiz::dekodieren(&an_erste[0].0).unwrap(),
            Notiz::NeuerSpieler { .. }
        ));
    }
}
