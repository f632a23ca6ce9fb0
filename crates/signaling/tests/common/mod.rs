//! Gemeinsame Hilfen fuer die Szenario-Tests

#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use altfunk_auth::PrivilegeTable;
use altfunk_core::{ChannelFlags, ChannelId, CodecMaske, GlobalFlags, ServerId};
use altfunk_db::{
    models::{
        BanRecord, KanalRecord, NeueRegistrierung, NeuerBan, NeuerServer, RegistrierungRecord,
    },
    repository::DbResult,
    BanRepository, ChannelRepository, RegistrationRepository, ServerRepository, SqliteDb,
};
use altfunk_protocol::{AnnahmePaket, VerbindungsAnfrage};
use altfunk_signaling::{
    DatagramDispatcher, Dienste, KanalBaum, PacketTransport, ServerKonfig, ServerZustand,
};

pub const SERVER_PASSWORT: &str = "secret";

/// Speichert alle gesendeten Pakete
#[derive(Default)]
pub struct AufzeichnenderTransport {
    pakete: Mutex<Vec<(Vec<u8>, SocketAddr)>>,
}

impl AufzeichnenderTransport {
    pub fn pakete(&self) -> Vec<(Vec<u8>, SocketAddr)> {
        self.pakete.lock().unwrap().clone()
    }

    pub fn an(&self, ziel: SocketAddr) -> Vec<Vec<u8>> {
        self.pakete()
            .into_iter()
            .filter(|(_, z)| *z == ziel)
            .map(|(p, _)| p)
            .collect()
    }

    pub fn leeren(&self) {
        self.pakete.lock().unwrap().clear();
    }
}

impl PacketTransport for AufzeichnenderTransport {
    async fn senden(&self, daten: &[u8], ziel: SocketAddr) -> io::Result<()> {
        self.pakete.lock().unwrap().push((daten.to_vec(), ziel));
        Ok(())
    }
}

/// SQLite im Speicher, zaehlt zusaetzlich die Kanal-Aktualisierungen
pub struct ZaehlendeDb {
    pub inner: SqliteDb,
    pub aktualisiert: Mutex<Vec<KanalRecord>>,
}

impl ChannelRepository for ZaehlendeDb {
    async fn kanaele_laden(&self, server: ServerId) -> DbResult<Vec<KanalRecord>> {
        self.inner.kanaele_laden(server).await
    }

    async fn kanal_aktualisieren(&self, kanal: &KanalRecord) -> DbResult<()> {
        self.aktualisiert.lock().unwrap().push(kanal.clone());
        self.inner.kanal_aktualisieren(kanal).await
    }

    async fn kanal_registrieren(&self, kanal: &KanalRecord) -> DbResult<()> {
        self.inner.kanal_registrieren(kanal).await
    }

    async fn kanal_abmelden(&self, server: ServerId, id: ChannelId) -> DbResult<bool> {
        self.inner.kanal_abmelden(server, id).await
    }
}

impl RegistrationRepository for ZaehlendeDb {
    async fn registrierung_nach_login(
        &self,
        server: ServerId,
        login: &str,
    ) -> DbResult<Option<RegistrierungRecord>> {
        self.inner.registrierung_nach_login(server, login).await
    }

    async fn registrierung_anlegen(
        &self,
        data: NeueRegistrierung<'_>,
    ) -> DbResult<RegistrierungRecord> {
        self.inner.registrierung_anlegen(data).await
    }
}

impl BanRepository for ZaehlendeDb {
    async fn ban_fuer_ip(&self, server: ServerId, ip: &str) -> DbResult<Option<BanRecord>> {
        self.inner.ban_fuer_ip(server, ip).await
    }

    async fn ban_anlegen(&self, data: NeuerBan<'_>) -> DbResult<BanRecord> {
        self.inner.ban_anlegen(data).await
    }
}

pub type TestDispatcher = DatagramDispatcher<ZaehlendeDb, AufzeichnenderTransport>;

/// Server mit Passwort "secret", Standardkanal 1 und registriertem Kanal 7 "Lobby"
pub async fn dispatcher() -> TestDispatcher {
    let db = SqliteDb::in_memory().await.unwrap();
    let server = db
        .server_anlegen(NeuerServer {
            name: "Altfunk",
            maschine: "testhost",
            willkommen: "Willkommen",
            passwort: SERVER_PASSWORT,
            port: 0,
            codecs: CodecMaske::STANDARD,
        })
        .await
        .unwrap();

    let mut standard = kanal_record(server.id, 1, "Standard");
    standard.flags = ChannelFlags::from_raw(ChannelFlags::DEFAULT);
    db.kanal_registrieren(&standard).await.unwrap();
    db.kanal_registrieren(&kanal_record(server.id, 7, "Lobby"))
        .await
        .unwrap();

    let kanaele = KanalBaum::aus_records(db.kanaele_laden(server.id).await.unwrap());
    let zustand = ServerZustand::neu(
        ServerKonfig::from(&server),
        kanaele,
        PrivilegeTable::standard(),
    );
    let db = Arc::new(ZaehlendeDb {
        inner: db,
        aktualisiert: Mutex::new(Vec::new()),
    });
    DatagramDispatcher::neu(
        zustand,
        Dienste::neu(db, Arc::new(AufzeichnenderTransport::default())),
    )
}

fn kanal_record(server: ServerId, id: u32, name: &str) -> KanalRecord {
    KanalRecord {
        server_id: server,
        id: ChannelId(id),
        parent_id: None,
        name: name.into(),
        thema: String::new(),
        beschreibung: String::new(),
        flags: ChannelFlags::default(),
        codec: 10,
        passwort: String::new(),
        sort_order: 0,
        max_nutzer: 0,
    }
}

/// Legt eine Registrierung mit Argon2-Hash an
pub async fn registrieren(dispatcher: &TestDispatcher, login: &str, passwort: &str, flags: u16) {
    let server = dispatcher.zustand().server_id();
    dispatcher
        .dienste()
        .registrierungen
        .registrieren(server, login, passwort, GlobalFlags::from_raw(flags))
        .await
        .unwrap();
}

pub fn verbinden(login: Option<&str>, passwort: &str, nickname: &str) -> Vec<u8> {
    VerbindungsAnfrage {
        zaehler: 1,
        client_name: "TeamSpeak".into(),
        betriebssystem: "Linux".into(),
        client_version: [2, 0, 32, 60],
        login: login.map(str::to_string),
        passwort: passwort.into(),
        nickname: nickname.into(),
    }
    .kodieren()
    .unwrap()
}

/// Verbindet einen Client und liefert das Annahmepaket
pub async fn verbunden(
    dispatcher: &mut TestDispatcher,
    adresse: SocketAddr,
    login: Option<&str>,
    passwort: &str,
    nickname: &str,
) -> AnnahmePaket {
    dispatcher
        .verarbeiten(&verbinden(login, passwort, nickname), adresse)
        .await;
    let pakete = dispatcher.dienste().transport.an(adresse);
    let annahme = pakete
        .iter()
        .find_map(|p| AnnahmePaket::dekodieren(p).ok())
        .expect("kein Annahmepaket");
    assert!(!annahme.ist_gebannt());
    annahme
}

pub fn adresse(letztes_oktett: u8) -> SocketAddr {
    SocketAddr::from(([192, 0, 2, letztes_oktett], 50_000))
}
