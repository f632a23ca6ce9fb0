//! Cursor-basiertes Lesen und Schreiben fester Paketfelder
//!
//! `WireWriter` und `WireReader` fuehren einen Cursor ueber einen
//! Byte-Puffer und lehnen jeden Zugriff jenseits des Puffer-Endes mit
//! `WireError::Ueberlauf` ab. Ganzzahlen sind little-endian.
//!
//! ## Feste Strings
//!
//! ```text
//! +--------+------------------------------+
//! | Laenge | Inhalt (max Bytes, 0-gepolstert) |
//! +--------+------------------------------+
//!   1 Byte   max Bytes
//! ```
//!
//! Der Cursor rueckt immer um `1 + max` vor, unabhaengig vom Inhalt.

use crate::error::{WireError, WireResult};

/// Kuerzt eine Quelle auf `min(max, quelle.len())` Bytes
pub fn gekuerzt(quelle: &[u8], max: usize) -> &[u8] {
    &quelle[..quelle.len().min(max)]
}

/// Dekodiert Latin-1 (jedes Byte ist genau ein Zeichen)
pub fn latin1_dekodieren(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Kodiert nach Latin-1; Zeichen ausserhalb von U+00FF werden zu `?`
pub fn latin1_kodieren(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

// ---------------------------------------------------------------------------
// WireWriter
// ---------------------------------------------------------------------------

/// Schreib-Cursor ueber einen vorab genullten Puffer
#[derive(Debug)]
pub struct WireWriter<'a> {
    puffer: &'a mut [u8],
    position: usize,
}

impl<'a> WireWriter<'a> {
    pub fn neu(puffer: &'a mut [u8]) -> Self {
        Self {
            puffer,
            position: 0,
        }
    }

    /// Aktuelle Cursor-Position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Verbleibende Bytes bis zum Puffer-Ende
    pub fn verbleibend(&self) -> usize {
        self.puffer.len() - self.position
    }

    fn reservieren(&mut self, laenge: usize) -> WireResult<&mut [u8]> {
        if laenge > self.verbleibend() {
            return Err(WireError::Ueberlauf {
                offset: self.position,
                benoetigt: laenge,
                verfuegbar: self.verbleibend(),
            });
        }
        let start = self.position;
        self.position += laenge;
        Ok(&mut self.puffer[start..start + laenge])
    }

    pub fn u8(&mut self, wert: u8) -> WireResult<()> {
        self.reservieren(1)?[0] = wert;
        Ok(())
    }

    pub fn u16(&mut self, wert: u16) -> WireResult<()> {
        self.reservieren(2)?.copy_from_slice(&wert.to_le_bytes());
        Ok(())
    }

    pub fn u32(&mut self, wert: u32) -> WireResult<()> {
        self.reservieren(4)?.copy_from_slice(&wert.to_le_bytes());
        Ok(())
    }

    pub fn bytes(&mut self, daten: &[u8]) -> WireResult<()> {
        self.reservieren(daten.len())?.copy_from_slice(daten);
        Ok(())
    }

    /// Ueberspringt `laenge` Bytes (bleiben null)
    pub fn ueberspringen(&mut self, laenge: usize) -> WireResult<()> {
        self.reservieren(laenge).map(|_| ())
    }

    /// Schreibt Laengenbyte plus `max` Bytes breites, 0-gepolstertes Feld
    ///
    /// Laengere Quellen werden auf `min(max, len)` gekuerzt.
    pub fn fester_string(&mut self, quelle: &[u8], max: usize) -> WireResult<()> {
        let inhalt = gekuerzt(quelle, max.min(usize::from(u8::MAX)));
        let feld = self.reservieren(1 + max)?;
        feld[0] = inhalt.len() as u8;
        feld[1..1 + inhalt.len()].copy_from_slice(inhalt);
        Ok(())
    }

    /// Schreibt die Bytes gefolgt von einem Null-Terminator
    pub fn c_string(&mut self, quelle: &[u8]) -> WireResult<()> {
        self.bytes(quelle)?;
        self.u8(0)
    }
}

// ---------------------------------------------------------------------------
// WireReader
// ---------------------------------------------------------------------------

/// Lese-Cursor ueber ein empfangenes Datagramm
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    daten: &'a [u8],
    position: usize,
}

impl<'a> WireReader<'a> {
    pub fn neu(daten: &'a [u8]) -> Self {
        Self { daten, position: 0 }
    }

    /// Startet an einem festen Offset
    pub fn ab(daten: &'a [u8], offset: usize) -> WireResult<Self> {
        let mut leser = Self::neu(daten);
        leser.ueberspringen(offset)?;
        Ok(leser)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn verbleibend(&self) -> usize {
        self.daten.len() - self.position
    }

    fn nehmen(&mut self, laenge: usize) -> WireResult<&'a [u8]> {
        if laenge > self.verbleibend() {
            return Err(WireError::Ueberlauf {
                offset: self.position,
                benoetigt: laenge,
                verfuegbar: self.verbleibend(),
            });
        }
        let start = self.position;
        self.position += laenge;
        Ok(&self.daten[start..start + laenge])
    }

    pub fn u8(&mut self) -> WireResult<u8> {
        Ok(self.nehmen(1)?[0])
    }

    pub fn u16(&mut self) -> WireResult<u16> {
        let b = self.nehmen(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self) -> WireResult<u32> {
        let b = self.nehmen(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn bytes(&mut self, laenge: usize) -> WireResult<&'a [u8]> {
        self.nehmen(laenge)
    }

    pub fn ueberspringen(&mut self, laenge: usize) -> WireResult<()> {
        self.nehmen(laenge).map(|_| ())
    }

    /// Liest Laengenbyte plus `max` Bytes breites Feld
    ///
    /// Gueltig sind `min(max, laenge)` Bytes, hoechstens bis zum ersten
    /// Null-Byte. Der Cursor rueckt immer um `1 + max` vor.
    pub fn fester_string(&mut self, max: usize) -> WireResult<&'a [u8]> {
        let laenge = usize::from(self.u8()?);
        let feld = self.nehmen(max)?;
        let inhalt = gekuerzt(feld, laenge);
        let ende = inhalt.iter().position(|&b| b == 0).unwrap_or(inhalt.len());
        Ok(&inhalt[..ende])
    }

    /// Liest bis zum Null-Terminator oder bis zum Datagramm-Ende
    pub fn c_string(&mut self) -> &'a [u8] {
        let rest = &self.daten[self.position..];
        match rest.iter().position(|&b| b == 0) {
            Some(ende) => {
                self.position += ende + 1;
                &rest[..ende]
            }
            None => {
                self.position = self.daten.len();
                rest
            }
        }
    }
}
