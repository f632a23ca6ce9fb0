//! Fehlertypen fuer das Drahtformat

use thiserror::Error;

/// Fehler beim Lesen oder Schreiben eines Pakets
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Lese- oder Schreibzugriff jenseits des Puffer-Endes
    #[error("Pufferueberlauf an Offset {offset}: {benoetigt} Bytes benoetigt, {verfuegbar} verfuegbar")]
    Ueberlauf {
        offset: usize,
        benoetigt: usize,
        verfuegbar: usize,
    },

    /// Datagramm kuerzer als das feste Layout
    #[error("Paket zu kurz: {erhalten} Bytes (erwartet mindestens {erwartet})")]
    ZuKurz { erwartet: usize, erhalten: usize },

    /// Unbekanntes Funktions- oder Typfeld
    #[error("Unbekannter Pakettyp: {0:#010x}")]
    UnbekannterTyp(u32),
}

impl WireError {
    /// Prueft eine Mindestlaenge und liefert sonst `ZuKurz`
    pub fn mindestens(daten: &[u8], erwartet: usize) -> WireResult<()> {
        if daten.len() < erwartet {
            return Err(Self::ZuKurz {
                erwartet,
                erhalten: daten.len(),
            });
        }
        Ok(())
    }
}

/// Result-Typ fuer das Drahtformat
pub type WireResult<T> = Result<T, WireError>;
