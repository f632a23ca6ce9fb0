//! Testhilfen: aufzeichnender Transport und In-Memory-Persistenz

use std::collections::HashSet;
use std::io;
use std::net::SocketAddr;
use std::sync::Mutex;

use altfunk_core::{ChannelId, ServerId};
use altfunk_db::{
    models::{BanRecord, KanalRecord, NeueRegistrierung, NeuerBan, RegistrierungRecord},
    repository::{BanRepository, ChannelRepository, DbResult, RegistrationRepository},
    DbError,
};

use crate::transport::PacketTransport;

/// Speichert alle gesendeten Pakete statt sie zu versenden
#[derive(Default)]
pub struct AufzeichnenderTransport {
    pakete: Mutex<Vec<(Vec<u8>, SocketAddr)>>,
    gesperrt: Mutex<HashSet<SocketAddr>>,
}

impl AufzeichnenderTransport {
    pub fn neu() -> Self {
        Self::default()
    }

    pub fn pakete(&self) -> Vec<(Vec<u8>, SocketAddr)> {
        self.pakete.lock().unwrap().clone()
    }

    pub fn leeren(&self) {
        self.pakete.lock().unwrap().clear();
    }

    /// Sendungen an `ziel` schlagen ab jetzt fehl
    pub fn ziel_sperren(&self, ziel: SocketAddr) {
        self.gesperrt.lock().unwrap().insert(ziel);
    }
}

impl PacketTransport for AufzeichnenderTransport {
    async fn senden(&self, daten: &[u8], ziel: SocketAddr) -> io::Result<()> {
        if self.gesperrt.lock().unwrap().contains(&ziel) {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "gesperrt"));
        }
        self.pakete.lock().unwrap().push((daten.to_vec(), ziel));
        Ok(())
    }
}

/// Aufgezeichneter Persistenz-Aufruf
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbAufruf {
    Aktualisiert(KanalRecord),
    Registriert(KanalRecord),
    Abgemeldet(ChannelId),
}

/// In-Memory-Persistenz fuer Handler-Tests
#[derive(Default)]
pub struct TestDb {
    pub aufrufe: Mutex<Vec<DbAufruf>>,
    pub registrierungen: Mutex<Vec<RegistrierungRecord>>,
    pub bans: Mutex<Vec<BanRecord>>,
    /// Alle Schreibzugriffe schlagen fehl
    pub defekt: Mutex<bool>,
}

impl TestDb {
    pub fn aufrufe(&self) -> Vec<DbAufruf> {
        self.aufrufe.lock().unwrap().clone()
    }

    fn schreiben(&self, aufruf: DbAufruf) -> DbResult<()> {
        if *self.defekt.lock().unwrap() {
            return Err(DbError::intern("Datenbank nicht erreichbar"));
        }
        self.aufrufe.lock().unwrap().push(aufruf);
        Ok(())
    }
}

impl ChannelRepository for TestDb {
    async fn kanaele_laden(&self, _server: ServerId) -> DbResult<Vec<KanalRecord>> {
        Ok(Vec::new())
    }

    async fn kanal_aktualisieren(&self, kanal: &KanalRecord) -> DbResult<()> {
        self.schreiben(DbAufruf::Aktualisiert(kanal.clone()))
    }

    async fn kanal_registrieren(&self, kanal: &KanalRecord) -> DbResult<()> {
        self.schreiben(DbAufruf::Registriert(kanal.clone()))
    }

    async fn kanal_abmelden(&self, _server: ServerId, id: ChannelId) -> DbResult<bool> {
        self.schreiben(DbAufruf::Abgemeldet(id))?;
        Ok(true)
    }
}

impl RegistrationRepository for TestDb {
    async fn registrierung_nach_login(
        &self,
        server: ServerId,
        login: &str,
    ) -> DbResult<Option<RegistrierungRecord>> {
        Ok(self
            .registrierungen
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.server_id == server && r.login == login)
            .cloned())
    }

    async fn registrierung_anlegen(
        &self,
        data: NeueRegistrierung<'_>,
    ) -> DbResult<RegistrierungRecord> {
        let mut registrierungen = self.registrierungen.lock().unwrap();
        let record = RegistrierungRecord {
            id: registrierungen.len() as i64 + 1,
            server_id: data.server_id,
            login: data.login.to_string(),
            passwort_hash: data.passwort_hash.to_string(),
            global_flags: data.global_flags,
            created_at: chrono::Utc::now(),
        };
        registrierungen.push(record.clone());
        Ok(record)
    }
}

impl BanRepository for TestDb {
    async fn ban_fuer_ip(&self, server: ServerId, ip: &str) -> DbResult<Option<BanRecord>> {
        Ok(self
            .bans
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.server_id == server && b.ip == ip)
            .cloned())
    }

    async fn ban_anlegen(&self, data: NeuerBan<'_>) -> DbResult<BanRecord> {
        let mut bans = self.bans.lock().unwrap();
        let ban = BanRecord {
            id: bans.len() as i64 + 1,
            server_id: data.server_id,
            ip: data.ip.to_string(),
            grund: data.grund.to_string(),
            expires_at: data.expires_at,
            created_at: chrono::Utc::now(),
        };
        bans.push(ban.clone());
        Ok(ban)
    }
}
