//! Pakete der Verbindungsklasse (Funktionswort `0x000Xbef4`)
//!
//! Verbindungsanfrage, Annahme/Ablehnung und Keepalive. Alle Groessen sind
//! fest und muessen fuer die Legacy-Clients exakt stimmen.

use altfunk_core::{CodecMaske, PrivateId, PublicId};

use crate::error::{WireError, WireResult};
use crate::packet::{
    PacketFramer, PaketKopf, FUNKTION_ANNAHME, FUNKTION_KEEPALIVE, FUNKTION_KEEPALIVE_ANTWORT,
    FUNKTION_VERBINDEN,
};
use crate::wire::{latin1_dekodieren, latin1_kodieren, WireReader};

/// Offset der Pruefsumme in allen Verbindungspaketen
pub const PRUEFSUMMEN_OFFSET: usize = 16;

/// Groesse der Verbindungsanfrage
pub const VERBINDEN_GROESSE: usize = 180;
/// Groesse von Annahme- und Ablehnungspaket
pub const ANNAHME_GROESSE: usize = 436;
/// Groesse der Keepalive-Anfrage
pub const KEEPALIVE_GROESSE: usize = 20;
/// Groesse der Keepalive-Antwort
pub const KEEPALIVE_ANTWORT_GROESSE: usize = 24;

/// Breite der Namensfelder (ohne Laengenbyte)
pub const NAME_MAX: usize = 29;
/// Breite des Willkommensfelds (ohne Laengenbyte)
pub const WILLKOMMEN_MAX: usize = 255;
/// Breite des Privilegien-Bitfelds
pub const PRIVILEGIEN_GROESSE: usize = 71;

/// Server-Version im Annahmepaket
pub const SERVER_VERSION: [u16; 4] = [2, 0, 20, 1];

/// Fehlercode: Verbindung angenommen
pub const FEHLER_OK: u32 = 1;
/// Fehlercode: IP-Adresse gebannt
pub const FEHLER_GEBANNT: u32 = 0xFFFF_FFFA;

/// Platzhalter-IDs im Ablehnungspaket
const ABLEHNUNG_KOPF_PUBLIC: u32 = 5;
const ABLEHNUNG_KOPF_ZAEHLER: u32 = 2;
const ABLEHNUNG_PRIVATE: u32 = 0x0058_4430;
const ABLEHNUNG_PUBLIC: u32 = 5;

fn funktion_pruefen(daten: &[u8], erwartet: u32) -> WireResult<()> {
    let funktion = WireReader::neu(daten).u32()?;
    if funktion != erwartet {
        return Err(WireError::UnbekannterTyp(funktion));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// VerbindungsAnfrage
// ---------------------------------------------------------------------------

/// Verbindungsanfrage eines Clients (180 Bytes)
///
/// ```text
/// Offset  Len  Beschreibung
/// ------  ---  -----------
///  0..20       Verbindungskopf (IDs sind 0)
/// 20      30   Client-Name (Laengenbyte + 29)
/// 50      30   Betriebssystem (Laengenbyte + 29)
/// 80       8   Client-Version (4 x u16)
/// 88       2   unbenutzt
/// 90      30   Login (Laengenbyte + 29, Laenge 0 = anonym)
/// 120     30   Passwort (Laengenbyte + 29)
/// 150     30   Nickname (Laengenbyte + 29)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbindungsAnfrage {
    pub zaehler: u32,
    pub client_name: String,
    pub betriebssystem: String,
    pub client_version: [u16; 4],
    /// `None` wenn das Laengenbyte des Logins 0 ist (anonym)
    pub login: Option<String>,
    pub passwort: String,
    pub nickname: String,
}

impl VerbindungsAnfrage {
    pub fn dekodieren(daten: &[u8]) -> WireResult<Self> {
        WireError::mindestens(daten, VERBINDEN_GROESSE)?;
        funktion_pruefen(daten, FUNKTION_VERBINDEN)?;

        let zaehler = PaketKopf::lesen(daten)?.zaehler;
        let mut r = WireReader::ab(daten, 20)?;
        let client_name = latin1_dekodieren(r.fester_string(NAME_MAX)?);
        let betriebssystem = latin1_dekodieren(r.fester_string(NAME_MAX)?);
        let client_version = [r.u16()?, r.u16()?, r.u16()?, r.u16()?];
        r.ueberspringen(2)?;

        // Anonym entscheidet allein das Laengenbyte an Offset 90
        let login_laenge = daten[90];
        let login = latin1_dekodieren(r.fester_string(NAME_MAX)?);
        let passwort = latin1_dekodieren(r.fester_string(NAME_MAX)?);
        let nickname = latin1_dekodieren(r.fester_string(NAME_MAX)?);

        Ok(Self {
            zaehler,
            client_name,
            betriebssystem,
            client_version,
            login: (login_laenge != 0).then_some(login),
            passwort,
            nickname,
        })
    }

    pub fn kodieren(&self) -> WireResult<Vec<u8>> {
        let kopf = PaketKopf::neu(PrivateId(0), PublicId(0), self.zaehler);
        PacketFramer::verbindung(FUNKTION_VERBINDEN, VERBINDEN_GROESSE).bauen(&kopf, |w| {
            w.fester_string(&latin1_kodieren(&self.client_name), NAME_MAX)?;
            w.fester_string(&latin1_kodieren(&self.betriebssystem), NAME_MAX)?;
            for teil in self.client_version {
                w.u16(teil)?;
            }
            w.ueberspringen(2)?;
            let login = self.login.as_deref().map(latin1_kodieren).unwrap_or_default();
            w.fester_string(&login, NAME_MAX)?;
            w.fester_string(&latin1_kodieren(&self.passwort), NAME_MAX)?;
            w.fester_string(&latin1_kodieren(&self.nickname), NAME_MAX)
        })
    }
}

// ---------------------------------------------------------------------------
// AnnahmePaket
// ---------------------------------------------------------------------------

/// Antwort auf eine Verbindungsanfrage (436 Bytes)
///
/// ```text
/// Offset  Len  Beschreibung
/// ------  ---  -----------
///  0..20       Verbindungskopf (Funktion 0x0004bef4)
/// 20      30   Server-Name (Laengenbyte + 29)
/// 50      30   Server-Maschine (Laengenbyte + 29)
/// 80       8   Server-Version (4 x u16)
/// 88       4   Fehlercode (1 = OK, 0xFFFFFFFA = gebannt)
/// 92       2   Codec-Maske
/// 94       7   unbenutzt
/// 101     71   Privilegien-Bitfeld
/// 172      4   Private ID der Session
/// 176      4   Public ID der Session
/// 180    256   Willkommensnachricht (Laengenbyte + 255)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnahmePaket {
    pub kopf: PaketKopf,
    pub server_name: String,
    pub maschine: String,
    pub server_version: [u16; 4],
    pub fehlercode: u32,
    pub codecs: CodecMaske,
    pub privilegien: [u8; PRIVILEGIEN_GROESSE],
    pub sitzung_private: PrivateId,
    pub sitzung_public: PublicId,
    pub willkommen: String,
}

impl AnnahmePaket {
    /// Ablehnung wegen Bann: nur Platzhalter-IDs, keine Serverdaten
    pub fn gebannt() -> Self {
        Self {
            kopf: PaketKopf::neu(
                PrivateId(0),
                PublicId(ABLEHNUNG_KOPF_PUBLIC),
                ABLEHNUNG_KOPF_ZAEHLER,
            ),
            server_name: String::new(),
            maschine: String::new(),
            server_version: [0; 4],
            fehlercode: FEHLER_GEBANNT,
            codecs: CodecMaske(0),
            privilegien: [0; PRIVILEGIEN_GROESSE],
            sitzung_private: PrivateId(ABLEHNUNG_PRIVATE),
            sitzung_public: PublicId(ABLEHNUNG_PUBLIC),
            willkommen: String::new(),
        }
    }

    pub fn ist_gebannt(&self) -> bool {
        self.fehlercode == FEHLER_GEBANNT
    }

    pub fn kodieren(&self) -> WireResult<Vec<u8>> {
        PacketFramer::verbindung(FUNKTION_ANNAHME, ANNAHME_GROESSE).bauen(&self.kopf, |w| {
            w.fester_string(&latin1_kodieren(&self.server_name), NAME_MAX)?;
            w.fester_string(&latin1_kodieren(&self.maschine), NAME_MAX)?;
            for teil in self.server_version {
                w.u16(teil)?;
            }
            w.u32(self.fehlercode)?;
            w.u16(self.codecs.0)?;
            w.ueberspringen(7)?;
            w.bytes(&self.privilegien)?;
            w.u32(self.sitzung_private.inner())?;
            w.u32(self.sitzung_public.inner())?;
            w.fester_string(&latin1_kodieren(&self.willkommen), WILLKOMMEN_MAX)
        })
    }

    pub fn dekodieren(daten: &[u8]) -> WireResult<Self> {
        WireError::mindestens(daten, ANNAHME_GROESSE)?;
        funktion_pruefen(daten, FUNKTION_ANNAHME)?;

        let kopf = PaketKopf::lesen(daten)?;
        let mut r = WireReader::ab(daten, 20)?;
        let server_name = latin1_dekodieren(r.fester_string(NAME_MAX)?);
        let maschine = latin1_dekodieren(r.fester_string(NAME_MAX)?);
        let server_version = [r.u16()?, r.u16()?, r.u16()?, r.u16()?];
        let fehlercode = r.u32()?;
        let codecs = CodecMaske(r.u16()?);
        r.ueberspringen(7)?;
        let mut privilegien = [0u8; PRIVILEGIEN_GROESSE];
        privilegien.copy_from_slice(r.bytes(PRIVILEGIEN_GROESSE)?);

        Ok(Self {
            kopf,
            server_name,
            maschine,
            server_version,
            fehlercode,
            codecs,
            privilegien,
            sitzung_private: PrivateId(r.u32()?),
            sitzung_public: PublicId(r.u32()?),
            willkommen: latin1_dekodieren(r.fester_string(WILLKOMMEN_MAX)?),
        })
    }
}

// ---------------------------------------------------------------------------
// Keepalive
// ---------------------------------------------------------------------------

/// Keepalive eines Clients (20 Bytes, Token an Offset 12)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepaliveAnfrage {
    pub private_id: PrivateId,
    pub public_id: PublicId,
    pub token: u32,
}

impl KeepaliveAnfrage {
    pub fn dekodieren(daten: &[u8]) -> WireResult<Self> {
        WireError::mindestens(daten, KEEPALIVE_GROESSE)?;
        funktion_pruefen(daten, FUNKTION_KEEPALIVE)?;
        let kopf = PaketKopf::lesen(daten)?;
        Ok(Self {
            private_id: kopf.private_id,
            public_id: kopf.public_id,
            token: kopf.zaehler,
        })
    }

    pub fn kodieren(&self) -> WireResult<Vec<u8>> {
        let kopf = PaketKopf::neu(self.private_id, self.public_id, self.token);
        PacketFramer::verbindung(FUNKTION_KEEPALIVE, KEEPALIVE_GROESSE).bauen(&kopf, |_| Ok(()))
    }
}

/// Keepalive-Antwort des Servers (24 Bytes, Token an Offset 20)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepaliveAntwort {
    pub kopf: PaketKopf,
    pub token: u32,
}

impl KeepaliveAntwort {
    pub fn kodieren(&self) -> WireResult<Vec<u8>> {
        PacketFramer::verbindung(FUNKTION_KEEPALIVE_ANTWORT, KEEPALIVE_ANTWORT_GROESSE)
            .bauen(&self.kopf, |w| w.u32(self.token))
    }

    pub fn dekodieren(daten: &[u8]) -> WireResult<Self> {
        WireError::mindestens(daten, KEEPALIVE_ANTWORT_GROESSE)?;
        funktion_pruefen(daten, FUNKTION_KEEPALIVE_ANTWORT)?;
        Ok(Self {
            kopf: PaketKopf::lesen(daten)?,
            token: WireReader::ab(daten, 20)?.u32()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum;

    fn anfrage() -> VerbindungsAnfrage {
        VerbindungsAnfrage {
            zaehler: 1,
            client_name: "TeamSpeak".into(),
            betriebssystem: "Windows XP".into(),
            client_version: [2, 0, 32, 60],
            login: Some("anna".into()),
            passwort: "geheim".into(),
            nickname: "Anna".into(),
        }
    }

    #[test]
    fn verbindungsanfrage_feldpositionen() {
        let paket = anfrage().kodieren().unwrap();
        assert_eq!(paket.len(), VERBINDEN_GROESSE);
        assert!(checksum::pruefen(&paket, PRUEFSUMMEN_OFFSET));
        assert_eq!(paket[90], 4);
        assert_eq!(&paket[91..95], b"anna");
        assert_eq!(paket[120], 6);
        assert_eq!(&paket[121..127], b"geheim");
        assert_eq!(VerbindungsAnfrage::dekodieren(&paket).unwrap(), anfrage());
    }

    #[test]
    fn leeres_login_ist_anonym() {
        let mut a = anfrage();
        a.login = None;
        let paket = a.kodieren().unwrap();
        assert_eq!(paket[90], 0);
        assert_eq!(VerbindungsAnfrage::dekodieren(&paket).unwrap().login, None);
    }

    #[test]
    fn kurze_verbindungsanfrage_wird_abgelehnt() {
        let paket = anfrage().kodieren().unwrap();
        assert_eq!(
            VerbindungsAnfrage::dekodieren(&paket[..179]),
            Err(WireError::ZuKurz {
                erwartet: 180,
                erhalten: 179
            })
        );
    }

    #[test]
    fn annahme_layout() {
        let mut privilegien = [0u8; PRIVILEGIEN_GROESSE];
        privilegien[0] = 0b0000_0001;
        let annahme = AnnahmePaket {
            kopf: PaketKopf::neu(PrivateId(0xCAFE), PublicId(3), 1),
            server_name: "Altfunk".into(),
            maschine: "x".repeat(40),
            server_version: SERVER_VERSION,
            fehlercode: FEHLER_OK,
            codecs: CodecMaske::STANDARD,
            privilegien,
            sitzung_private: PrivateId(0xCAFE),
            sitzung_public: PublicId(3),
            willkommen: "Willkommen".into(),
        };
        let paket = annahme.kodieren().unwrap();
        assert_eq!(paket.len(), ANNAHME_GROESSE);
        assert_eq!(u32::from_le_bytes(paket[88..92].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes([paket[92], paket[93]]), 0x1FEF);
        assert_eq!(paket[101], 1);
        assert_eq!(u32::from_le_bytes(paket[172..176].try_into().unwrap()), 0xCAFE);
        assert_eq!(u32::from_le_bytes(paket[176..180].try_into().unwrap()), 3);
        assert_eq!(paket[180], 10);
        // Maschine wird auf 29 Zeichen gekuerzt
        let zurueck = AnnahmePaket::dekodieren(&paket).unwrap();
        assert_eq!(zurueck.maschine.len(), NAME_MAX);
        assert_eq!(zurueck.server_name, "Altfunk");
    }

    #[test]
    fn ablehnung_enthaelt_nur_platzhalter() {
        let paket = AnnahmePaket::gebannt().kodieren().unwrap();
        assert_eq!(paket.len(), ANNAHME_GROESSE);
        assert!(checksum::pruefen(&paket, PRUEFSUMMEN_OFFSET));
        assert_eq!(&paket[4..8], &[0, 0, 0, 0]);
        assert_eq!(u32::from_le_bytes(paket[8..12].try_into().unwrap()), 5);
        assert_eq!(u32::from_le_bytes(paket[12..16].try_into().unwrap()), 2);
        assert_eq!(
            u32::from_le_bytes(paket[88..92].try_into().unwrap()),
            FEHLER_GEBANNT
        );
        assert_eq!(
            u32::from_le_bytes(paket[172..176].try_into().unwrap()),
            0x0058_4430
        );
        assert!(paket[20..88].iter().all(|&b| b == 0));
        assert!(paket[92..172].iter().all(|&b| b == 0));
        assert!(paket[180..].iter().all(|&b| b == 0));
        assert!(AnnahmePaket::dekodieren(&paket).unwrap().ist_gebannt());
    }

    #[test]
    fn keepalive_antwort_spiegelt_token() {
        let antwort = KeepaliveAntwort {
            kopf: PaketKopf::neu(PrivateId(1), PublicId(2), 9),
            token: 0x1234,
        };
        let paket = antwort.kodieren().unwrap();
        assert_eq!(paket.len(), KEEPALIVE_ANTWORT_GROESSE);
        assert_eq!(&paket[0..4], &[0xf4, 0xbe, 0x02, 0x00]);
        assert_eq!(&paket[20..24], &0x1234u32.to_le_bytes());
        assert_eq!(KeepaliveAntwort::dekodieren(&paket).unwrap(), antwort);
    }

    #[test]
    fn keepalive_anfrage_liest_token_an_offset_12() {
        let anfrage = KeepaliveAnfrage {
            private_id: PrivateId(7),
            public_id: PublicId(8),
            token: 42,
        };
        let paket = anfrage.kodieren().unwrap();
        assert_eq!(paket.len(), KEEPALIVE_GROESSE);
        assert_eq!(&paket[12..16], &42u32.to_le_bytes());
        assert_eq!(KeepaliveAnfrage::dekodieren(&paket).unwrap(), anfrage);
    }
}
