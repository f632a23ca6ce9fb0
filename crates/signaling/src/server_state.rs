//! Zustand eines virtuellen Servers
//!
//! `ServerZustand` ist alles, was Handler lesen und veraendern: Sessions,
//! Kanalbaum, Identitaet. `Dienste` buendelt die Kollaborateure (Persistenz,
//! Anmeldung, Bans, Transport). Ein Server wird seriell von genau einer
//! Empfangsschleife bearbeitet; der Zustand braucht deshalb keine Locks.

use std::sync::Arc;

use altfunk_auth::{BanService, PrivilegeCheck, PrivilegeTable, RegistrationService};
use altfunk_core::{CodecMaske, ServerId};
use altfunk_db::models::ServerRecord;
use altfunk_db::repository::{BanRepository, ChannelRepository, RegistrationRepository};
use altfunk_protocol::connection::PRIVILEGIEN_GROESSE;

use crate::channel::KanalBaum;
use crate::session::SessionTable;
use crate::transport::PacketTransport;

/// Identitaet und Zugang eines virtuellen Servers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerKonfig {
    pub id: ServerId,
    pub name: String,
    pub maschine: String,
    pub willkommen: String,
    /// Passwort fuer anonyme Verbindungen
    pub passwort: String,
    pub codecs: CodecMaske,
}

impl From<&ServerRecord> for ServerKonfig {
    fn from(record: &ServerRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            maschine: record.maschine.clone(),
            willkommen: record.willkommen.clone(),
            passwort: record.passwort.clone(),
            codecs: record.codecs,
        }
    }
}

/// Veraenderlicher Zustand eines Servers
pub struct ServerZustand {
    pub konfig: ServerKonfig,
    pub sessions: SessionTable,
    pub kanaele: KanalBaum,
    pub privilegien: Arc<dyn PrivilegeCheck>,
    /// Wird im Annahmepaket an jeden Client geschickt
    pub privileg_bitfeld: [u8; PRIVILEGIEN_GROESSE],
}

impl ServerZustand {
    pub fn neu(konfig: ServerKonfig, kanaele: KanalBaum, tabelle: PrivilegeTable) -> Self {
        let privileg_bitfeld = tabelle.bitfeld();
        Self {
            konfig,
            sessions: SessionTable::neu(),
            kanaele,
            privilegien: Arc::new(tabelle),
            privileg_bitfeld,
        }
    }

    pub fn server_id(&self) -> ServerId {
        self.konfig.id
    }
}

/// Kollaborateure eines Servers
pub struct Dienste<D, T>
where
    D: ChannelRepository + RegistrationRepository + BanRepository,
    T: PacketTransport,
{
    pub db: Arc<D>,
    pub bans: Arc<BanService<D>>,
    pub registrierungen: RegistrationService<D>,
    pub transport: Arc<T>,
}

impl<D, T> Dienste<D, T>
where
    D: ChannelRepository + RegistrationRepository + BanRepository,
    T: PacketTransport,
{
    pub fn neu(db: Arc<D>, transport: Arc<T>) -> Self {
        Self {
            bans: BanService::neu(Arc::clone(&db)),
            registrierungen: RegistrationService::neu(Arc::clone(&db)),
            db,
            transport,
        }
    }
}
