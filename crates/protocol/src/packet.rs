//! PacketFramer – baut Pakete fester Groesse mit gemeinsamem Kopf
//!
//! ## Verbindungsklasse (Kopf = 20 Bytes)
//!
//! ```text
//! Offset  Len  Beschreibung
//! ------  ---  -----------
//!  0       4   Funktion (z.B. 0x0004bef4)
//!  4       4   Private ID
//!  8       4   Public ID
//! 12       4   Zaehler
//! 16       4   Pruefsumme
//! ```
//!
//! ## Steuerklasse (Kopf = 24 Bytes)
//!
//! ```text
//!  0       2   Typ (0xbef0)
//!  2       2   Funktion
//!  4       4   Private ID
//!  8       4   Public ID
//! 12       4   Zaehler
//! 16       4   Version
//! 20       4   Pruefsumme
//! ```

use altfunk_core::{PrivateId, PublicId};

use crate::checksum;
use crate::error::{WireError, WireResult};
use crate::wire::{WireReader, WireWriter};

/// Typfeld der Steuerpakete
pub const TYP_STEUERUNG: u16 = 0xbef0;
/// Typfeld der Quittungen
pub const TYP_QUITTUNG: u16 = 0xbef1;

/// Funktionswort: Verbindungsaufbau (Client -> Server)
pub const FUNKTION_VERBINDEN: u32 = 0x0003_bef4;
/// Funktionswort: Keepalive (Client -> Server)
pub const FUNKTION_KEEPALIVE: u32 = 0x0001_bef4;
/// Funktionswort: Keepalive-Antwort (Server -> Client)
pub const FUNKTION_KEEPALIVE_ANTWORT: u32 = 0x0002_bef4;
/// Funktionswort: Annahme oder Ablehnung (Server -> Client)
pub const FUNKTION_ANNAHME: u32 = 0x0004_bef4;

// ---------------------------------------------------------------------------
// PaketKopf
// ---------------------------------------------------------------------------

/// Empfaengerbezogene Kopffelder an Offset 4, 8 und 12
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaketKopf {
    pub private_id: PrivateId,
    pub public_id: PublicId,
    pub zaehler: u32,
}

impl PaketKopf {
    pub fn neu(private_id: PrivateId, public_id: PublicId, zaehler: u32) -> Self {
        Self {
            private_id,
            public_id,
            zaehler,
        }
    }

    /// Kopf ohne Empfaenger (wird beim Broadcast pro Empfaenger gesetzt)
    pub fn leer() -> Self {
        Self::neu(PrivateId(0), PublicId(0), 0)
    }

    /// Liest die Felder ab Offset 4
    pub fn lesen(daten: &[u8]) -> WireResult<Self> {
        let mut r = WireReader::ab(daten, 4)?;
        Ok(Self {
            private_id: PrivateId(r.u32()?),
            public_id: PublicId(r.u32()?),
            zaehler: r.u32()?,
        })
    }

    fn schreiben(&self, w: &mut WireWriter<'_>) -> WireResult<()> {
        w.u32(self.private_id.inner())?;
        w.u32(self.public_id.inner())?;
        w.u32(self.zaehler)
    }
}

// ---------------------------------------------------------------------------
// PaketKlasse
// ---------------------------------------------------------------------------

/// Kopf-Layout eines ausgehenden Pakets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaketKlasse {
    /// 32-Bit-Funktionswort, Pruefsumme an Offset 16
    Verbindung { funktion: u32 },
    /// `0xbef0` plus 16-Bit-Funktion, Pruefsumme an Offset 20
    Steuerung { funktion: u16 },
}

impl PaketKlasse {
    pub const fn kopf_groesse(self) -> usize {
        match self {
            Self::Verbindung { .. } => 20,
            Self::Steuerung { .. } => 24,
        }
    }

    pub const fn pruefsummen_offset(self) -> usize {
        match self {
            Self::Verbindung { .. } => 16,
            Self::Steuerung { .. } => 20,
        }
    }
}

/// Art eines eingehenden Datagramms anhand des ersten Worts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eingang {
    Verbinden,
    Keepalive,
    Steuerung { funktion: u16 },
    Quittung,
}

impl Eingang {
    /// Erkennt die Paketart; unbekannte Woerter ergeben `UnbekannterTyp`
    pub fn erkennen(daten: &[u8]) -> WireResult<Self> {
        let wort = WireReader::neu(daten).u32()?;
        match wort {
            FUNKTION_VERBINDEN => return Ok(Self::Verbinden),
            FUNKTION_KEEPALIVE => return Ok(Self::Keepalive),
            _ => {}
        }
        let typ = (wort & 0xffff) as u16;
        let funktion = (wort >> 16) as u16;
        match typ {
            TYP_STEUERUNG => Ok(Self::Steuerung { funktion }),
            TYP_QUITTUNG => Ok(Self::Quittung),
            _ => Err(WireError::UnbekannterTyp(wort)),
        }
    }
}

// ---------------------------------------------------------------------------
// PacketFramer
// ---------------------------------------------------------------------------

/// Baut ein Paket exakt der angegebenen Groesse
///
/// Die Groesse ist eine Konstante pro Paketart und wird nicht aus den
/// Nutzdaten abgeleitet. Der Aufrufer erhoeht den Zaehler der Session erst
/// nach erfolgreichem Versand.
#[derive(Debug, Clone, Copy)]
pub struct PacketFramer {
    klasse: PaketKlasse,
    groesse: usize,
}

impl PacketFramer {
    pub fn verbindung(funktion: u32, groesse: usize) -> Self {
        Self {
            klasse: PaketKlasse::Verbindung { funktion },
            groesse,
        }
    }

    pub fn steuerung(funktion: u16, groesse: usize) -> Self {
        Self {
            klasse: PaketKlasse::Steuerung { funktion },
            groesse,
        }
    }

    pub fn groesse(&self) -> usize {
        self.groesse
    }

    /// Schreibt Kopf und Nutzdaten und setzt die Pruefsumme
    ///
    /// Die Nutzdaten-Closure muss den Puffer exakt fuellen.
    pub fn bauen<F>(&self, kopf: &PaketKopf, nutzdaten: F) -> WireResult<Vec<u8>>
    where
        F: FnOnce(&mut WireWriter<'_>) -> WireResult<()>,
    {
        let mut paket = vec![0u8; self.groesse];
        let mut w = WireWriter::neu(&mut paket);

        match self.klasse {
            PaketKlasse::Verbindung { funktion } => {
                w.u32(funktion)?;
                kopf.schreiben(&mut w)?;
            }
            PaketKlasse::Steuerung { funktion } => {
                w.u16(TYP_STEUERUNG)?;
                w.u16(funktion)?;
                kopf.schreiben(&mut w)?;
                // Version
                w.u32(0)?;
            }
        }
        // Pruefsumme wird am Ende gesetzt
        w.ueberspringen(checksum::SLOT_GROESSE)?;

        nutzdaten(&mut w)?;
        debug_assert_eq!(
            w.position(),
            self.groesse,
            "Paket nicht vollstaendig gefuellt"
        );

        checksum::setzen(&mut paket, self.klasse.pruefsummen_offset())?;
        Ok(paket)
    }
}

/// Setzt die Empfaengerfelder eines fertigen Steuerpakets neu
///
/// Schreibt Private ID, Public ID und Zaehler an Offset 4, 8 und 12 und
/// berechnet die Pruefsumme an Offset 20 neu.
pub fn empfaenger_setzen(paket: &mut [u8], kopf: &PaketKopf) -> WireResult<()> {
    WireError::mindestens(paket, 24)?;
    let mut w = WireWriter::neu(&mut paket[4..16]);
    kopf.schreiben(&mut w)?;
    checksum::setzen(paket, 20)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbindungskopf_layout() {
        let kopf = PaketKopf::neu(PrivateId(0x11), PublicId(0x22), 3);
        let paket = PacketFramer::verbindung(FUNKTION_KEEPALIVE_ANTWORT, 24)
            .bauen(&kopf, |w| w.u32(0xabcd))
            .unwrap();
        assert_eq!(paket.len(), 24);
        assert_eq!(&paket[0..4], &[0xf4, 0xbe, 0x02, 0x00]);
        assert_eq!(PaketKopf::lesen(&paket).unwrap(), kopf);
        assert!(checksum::pruefen(&paket, 16));
    }

    #[test]
    fn steuerkopf_layout() {
        let paket = PacketFramer::steuerung(0x00ce, 28)
            .bauen(&PaketKopf::leer(), |w| w.u32(7))
            .unwrap();
        assert_eq!(&paket[0..4], &[0xf0, 0xbe, 0xce, 0x00]);
        assert_eq!(&paket[16..20], &[0, 0, 0, 0]);
        assert!(checksum::pruefen(&paket, 20));
    }

    #[test]
    fn nutzdaten_ueber_groesse_schlagen_fehl() {
        let ergebnis = PacketFramer::steuerung(0x00ce, 26).bauen(&PaketKopf::leer(), |w| w.u32(7));
        assert!(matches!(ergebnis, Err(WireError::Ueberlauf { .. })));
    }

    #[test]
    fn empfaenger_umschreiben_erneuert_pruefsumme() {
        let mut paket = PacketFramer::steuerung(0x00d4, 34)
            .bauen(&PaketKopf::leer(), |w| {
                w.u32(1)?;
                w.u16(2)?;
                w.u32(3)
            })
            .unwrap();
        let kopf = PaketKopf::neu(PrivateId(99), PublicId(4), 17);
        empfaenger_setzen(&mut paket, &kopf).unwrap();
        assert_eq!(PaketKopf::lesen(&paket).unwrap(), kopf);
        assert!(checksum::pruefen(&paket, 20));
    }

    #[test]
    fn eingang_erkennen() {
        assert_eq!(
            Eingang::erkennen(&FUNKTION_VERBINDEN.to_le_bytes()).unwrap(),
            Eingang::Verbinden
        );
        assert_eq!(
            Eingang::erkennen(&FUNKTION_KEEPALIVE.to_le_bytes()).unwrap(),
            Eingang::Keepalive
        );
        assert_eq!(
            Eingang::erkennen(&[0xf0, 0xbe, 0xd5, 0x00]).unwrap(),
            Eingang::Steuerung { funktion: 0x00d5 }
        );
        assert_eq!(
            Eingang::erkennen(&[0xf1, 0xbe, 0x00, 0x00]).unwrap(),
            Eingang::Quittung
        );
        assert_eq!(
            Eingang::erkennen(&[0xf2, 0xbe, 0x00, 0x00]),
            Err(WireError::UnbekannterTyp(0x0000_bef2))
        );
        assert!(Eingang::erkennen(&[0xf0, 0xbe]).is_err());
    }
}
