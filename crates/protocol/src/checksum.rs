//! Pruefsumme ueber das gesamte Paket
//!
//! 16-Bit-Pruefsumme: die unteren 16 Bit einer CRC-32 (IEEE) ueber alle
//! Bytes des Pakets, wobei der 4-Byte-Slot waehrend der Berechnung als null
//! gilt. Sie steht little-endian in den ersten zwei Bytes des Slots, die
//! oberen zwei bleiben null. Verbindungspakete tragen den Slot an Offset 16,
//! Steuerpakete an Offset 20.

use crate::error::{WireError, WireResult};

/// Breite des Pruefsummen-Slots
pub const SLOT_GROESSE: usize = 4;

fn slot_pruefen(daten: &[u8], offset: usize) -> WireResult<()> {
    WireError::mindestens(daten, offset + SLOT_GROESSE)
}

/// Berechnet die Pruefsumme mit genulltem Slot an `offset`
pub fn berechnen(daten: &[u8], offset: usize) -> WireResult<u16> {
    slot_pruefen(daten, offset)?;
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&daten[..offset]);
    hasher.update(&[0u8; SLOT_GROESSE]);
    hasher.update(&daten[offset + SLOT_GROESSE..]);
    Ok((hasher.finalize() & 0xFFFF) as u16)
}

/// Berechnet die Pruefsumme und schreibt sie in den Slot
pub fn setzen(daten: &mut [u8], offset: usize) -> WireResult<()> {
    let summe = berechnen(daten, offset)?;
    let slot = &mut daten[offset..offset + SLOT_GROESSE];
    slot[..2].copy_from_slice(&summe.to_le_bytes());
    slot[2..].fill(0);
    Ok(())
}

/// Vergleicht die gespeicherte mit der neu berechneten Pruefsumme
///
/// Zu kurze Pakete gelten als ungueltig. Die oberen Slot-Bytes zaehlen nicht.
pub fn pruefen(daten: &[u8], offset: usize) -> bool {
    let Ok(erwartet) = berechnen(daten, offset) else {
        return false;
    };
    u16::from_le_bytes([daten[offset], daten[offset + 1]]) == erwartet
}
