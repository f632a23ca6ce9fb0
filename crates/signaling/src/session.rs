//! SessionTable – alle verbundenen Spieler eines Servers
//!
//! Sessions sind nach Public ID geordnet. Die Reihenfolge bestimmt auch die
//! Reihenfolge beim Broadcast: bricht ein Broadcast ab, haben genau die
//! Sessions mit kleinerer Public ID die Notiz erhalten.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use altfunk_auth::SitzungsSicht;
use altfunk_core::{ChannelId, ChannelPrivileges, GlobalFlags, PrivateId, PublicId};
use altfunk_db::models::RegistrierungRecord;
use altfunk_protocol::PaketKopf;
use rand::Rng;
use tokio::time::Instant;

use crate::error::{SignalingError, SignalingResult};

/// Startwert beider Ausgangszaehler
pub const ZAEHLER_START: u32 = 1;

/// Versuche, eine freie Private ID zu wuerfeln
const ID_VERSUCHE: usize = 64;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Ein verbundener Client
#[derive(Debug, Clone)]
pub struct Session {
    pub private_id: PrivateId,
    pub public_id: PublicId,
    /// Absenderadresse des Handshakes; alle Antworten gehen hierhin
    pub adresse: SocketAddr,
    pub nickname: String,
    pub client_name: String,
    pub betriebssystem: String,
    pub client_version: [u16; 4],
    pub global: GlobalFlags,
    /// Registrierung, mit der sich die Session angemeldet hat
    pub registrierung: Option<RegistrierungRecord>,
    pub kanal: Option<ChannelId>,
    pub kanal_rechte: ChannelPrivileges,
    pub attribute: u16,
    /// Zaehler fuer Direktantworten (f4)
    pub zaehler_unicast: u32,
    /// Zaehler fuer Broadcast-Notizen (f0)
    pub zaehler_broadcast: u32,
    /// Naechster erwarteter Zaehler eingehender Steuerpakete
    pub erwarteter_eingang: u32,
    pub letzter_ping: Instant,
}

impl Session {
    pub fn neu(private_id: PrivateId, public_id: PublicId, adresse: SocketAddr) -> Self {
        Self {
            private_id,
            public_id,
            adresse,
            nickname: String::new(),
            client_name: String::new(),
            betriebssystem: String::new(),
            client_version: [0; 4],
            global: GlobalFlags::default(),
            registrierung: None,
            kanal: None,
            kanal_rechte: ChannelPrivileges::default(),
            attribute: 0,
            zaehler_unicast: ZAEHLER_START,
            zaehler_broadcast: ZAEHLER_START,
            erwarteter_eingang: 0,
            letzter_ping: Instant::now(),
        }
    }

    /// Kopf fuer die naechste Direktantwort
    pub fn kopf_unicast(&self) -> PaketKopf {
        PaketKopf::neu(self.private_id, self.public_id, self.zaehler_unicast)
    }

    /// Kopf fuer die naechste Broadcast-Notiz
    pub fn kopf_broadcast(&self) -> PaketKopf {
        PaketKopf::neu(self.private_id, self.public_id, self.zaehler_broadcast)
    }

    /// Sicht fuer die Privilegienpruefung
    pub fn sicht(&self) -> SitzungsSicht {
        SitzungsSicht {
            global: self.global,
            kanal: self.kanal,
            kanal_rechte: self.kanal_rechte,
        }
    }

    pub fn ist_registriert(&self) -> bool {
        self.global.ist_registriert()
    }

    /// Prueft einen eingehenden Steuerzaehler
    ///
    /// Liefert `false` fuer eine Wiederholung (Zaehler kleiner als erwartet).
    /// Sonst wird der naechste erwartete Zaehler auf `zaehler + 1` gesetzt.
    pub fn eingang_annehmen(&mut self, zaehler: u32) -> bool {
        if zaehler < self.erwarteter_eingang {
            return false;
        }
        self.erwarteter_eingang = zaehler.wrapping_add(1);
        true
    }
}

// ---------------------------------------------------------------------------
// SessionTable
// ---------------------------------------------------------------------------

/// Besitzt alle Sessions eines virtuellen Servers
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: BTreeMap<PublicId, Session>,
    naechste_public: u32,
}

impl SessionTable {
    pub fn neu() -> Self {
        Self {
            sessions: BTreeMap::new(),
            naechste_public: 1,
        }
    }

    /// Vergibt ein neues ID-Paar, ohne eine Session anzulegen
    ///
    /// Public IDs werden fortlaufend vergeben, Private IDs zufaellig und
    /// ungleich null.
    pub fn ids_vergeben(&mut self) -> SignalingResult<(PrivateId, PublicId)> {
        let public = self.freie_public_id()?;

        let mut rng = rand::thread_rng();
        for _ in 0..ID_VERSUCHE {
            let kandidat = PrivateId(rng.gen());
            if kandidat.inner() != 0 && !self.private_vergeben(kandidat) {
                return Ok((kandidat, public));
            }
        }
        Err(SignalingError::KeineFreieId)
    }

    fn freie_public_id(&mut self) -> SignalingResult<PublicId> {
        for _ in 0..=self.sessions.len() {
            let kandidat = PublicId(self.naechste_public);
            self.naechste_public = self.naechste_public.checked_add(1).unwrap_or(1);
            if kandidat.inner() != 0 && !self.sessions.contains_key(&kandidat) {
                return Ok(kandidat);
            }
        }
        Err(SignalingError::KeineFreieId)
    }

    fn private_vergeben(&self, id: PrivateId) -> bool {
        self.sessions.values().any(|s| s.private_id == id)
    }

    /// Macht die Session sichtbar
    ///
    /// Schlaegt fehl, wenn eine der beiden IDs bereits benutzt wird.
    pub fn einfuegen(&mut self, session: Session) -> SignalingResult<()> {
        if self.sessions.contains_key(&session.public_id) || self.private_vergeben(session.private_id) {
            return Err(SignalingError::intern(format!(
                "Session-ID bereits vergeben: {}",
                session.public_id
            )));
        }
        self.sessions.insert(session.public_id, session);
        Ok(())
    }

    pub fn entfernen(&mut self, public: PublicId) -> Option<Session> {
        self.sessions.remove(&public)
    }

    /// Sucht die Session zum ID-Paar eines eingehenden Pakets
    pub fn finden(&self, public: PublicId, private: PrivateId) -> Option<&Session> {
        self.sessions.get(&public).filter(|s| s.private_id == private)
    }

    pub fn finden_mut(&mut self, public: PublicId, private: PrivateId) -> Option<&mut Session> {
        self.sessions
            .get_mut(&public)
            .filter(|s| s.private_id == private)
    }

    pub fn get(&self, public: PublicId) -> Option<&Session> {
        self.sessions.get(&public)
    }

    pub fn get_mut(&mut self, public: PublicId) -> Option<&mut Session> {
        self.sessions.get_mut(&public)
    }

    /// Momentaufnahme aller Public IDs in Broadcast-Reihenfolge
    pub fn public_ids(&self) -> Vec<PublicId> {
        self.sessions.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// Sessions, deren letzter Keepalive aelter als `timeout` ist
    pub fn abgelaufene(&self, jetzt: Instant, timeout: Duration) -> Vec<PublicId> {
        self.sessions
            .values()
            .filter(|s| jetzt.saturating_duration_since(s.letzter_ping) > timeout)
            .map(|s| s.public_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
