//! Steuerpakete (Typ `0xbef0`) und Quittungen (Typ `0xbef1`)
//!
//! Anfragen und Benachrichtigungen teilen sich den 24-Byte-Steuerkopf und
//! dieselben Funktionscodes. Die Nutzdaten beginnen an Offset 24.
//!
//! ## Benachrichtigungen
//!
//! ```text
//! Funktion  Nutzdaten                                          Groesse
//! --------  -------------------------------------------------  -------
//! 0x00ce    Kanal u32, Akteur u32, Name (null-terminiert)      32 + n + 1
//! 0x00cf    Kanal u32, Akteur u32, Thema (null-terminiert)     32 + n + 1
//! 0x00d0    Kanal u32, Akteur u32, Beschreibung (null-term.)   32 + n + 1
//! 0x00cd    Kanal u32, Flags u16, Codec u16, Akteur u32        36
//! 0x00d4    Kanal u32, Reihenfolge u16, Akteur u32             34
//! 0x00d5    Kanal u32, Max. Nutzer u16, Akteur u32             34
//! 0x0064    Spieler u32, Kanal u32, Rechte u16, Global u16,
//!           Attribute u16, Nickname (Laengenbyte + 29)         68
//! 0x0065    Spieler u32, Grund u16, reserviert u32             34
//! ```

use altfunk_core::{ChannelFlags, ChannelId, ChannelPrivileges, GlobalFlags, PrivateId, PublicId};

use crate::connection::NAME_MAX;
use crate::error::{WireError, WireResult};
use crate::packet::{PacketFramer, PaketKopf, TYP_QUITTUNG, TYP_STEUERUNG};
use crate::wire::{latin1_dekodieren, latin1_kodieren, WireReader, WireWriter};

/// Groesse des gemeinsamen Steuerkopfs
pub const KOPF_GROESSE: usize = 24;
/// Offset der Pruefsumme im Steuerkopf
pub const PRUEFSUMMEN_OFFSET: usize = 20;
/// Groesse einer Quittung
pub const QUITTUNG_GROESSE: usize = 16;

/// Funktionscodes der Steuerpakete
pub mod funktion {
    pub const NEUER_SPIELER: u16 = 0x0064;
    pub const SPIELER_WEG: u16 = 0x0065;
    pub const KANAL_PASSWORT: u16 = 0x00cb;
    pub const KANAL_FLAGS_CODEC: u16 = 0x00cd;
    pub const KANAL_NAME: u16 = 0x00ce;
    pub const KANAL_THEMA: u16 = 0x00cf;
    pub const KANAL_BESCHREIBUNG: u16 = 0x00d0;
    pub const KANAL_REIHENFOLGE: u16 = 0x00d4;
    pub const KANAL_MAX_NUTZER: u16 = 0x00d5;
}

/// Gruende in der Benachrichtigung "Spieler weg"
pub mod grund {
    pub const TIMEOUT: u16 = 1;
}

// ---------------------------------------------------------------------------
// SteuerKopf
// ---------------------------------------------------------------------------

/// Dekodierter 24-Byte-Steuerkopf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SteuerKopf {
    pub funktion: u16,
    pub kopf: PaketKopf,
    pub version: u32,
}

impl SteuerKopf {
    pub fn dekodieren(daten: &[u8]) -> WireResult<Self> {
        WireError::mindestens(daten, KOPF_GROESSE)?;
        let mut r = WireReader::neu(daten);
        let typ = r.u16()?;
        let funktion = r.u16()?;
        if typ != TYP_STEUERUNG {
            return Err(WireError::UnbekannterTyp(
                (u32::from(funktion) << 16) | u32::from(typ),
            ));
        }
        let kopf = PaketKopf::lesen(daten)?;
        r.ueberspringen(12)?;
        Ok(Self {
            funktion,
            kopf,
            version: r.u32()?,
        })
    }
}

fn text_groesse(text: &[u8]) -> usize {
    KOPF_GROESSE + 4 + 4 + text.len() + 1
}

// ---------------------------------------------------------------------------
// KanalAnfrage
// ---------------------------------------------------------------------------

/// Anfrage eines Clients, eine Kanal-Eigenschaft zu aendern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KanalAnfrage {
    Name { kanal: ChannelId, name: String },
    Thema { kanal: ChannelId, thema: String },
    Beschreibung { kanal: ChannelId, beschreibung: String },
    FlagsCodec { kanal: ChannelId, flags: ChannelFlags, codec: u16 },
    Passwort { kanal: ChannelId, passwort: String },
    Reihenfolge { kanal: ChannelId, reihenfolge: u16 },
    MaxNutzer { kanal: ChannelId, max_nutzer: u16 },
}

impl KanalAnfrage {
    /// Dekodiert die Nutzdaten ab Offset 24 anhand des Funktionscodes
    pub fn dekodieren(daten: &[u8]) -> WireResult<Self> {
        let kopf = SteuerKopf::dekodieren(daten)?;
        let mut r = WireReader::ab(daten, KOPF_GROESSE)?;
        let kanal = ChannelId(r.u32()?);

        let anfrage = match kopf.funktion {
            funktion::KANAL_NAME => Self::Name {
                kanal,
                name: latin1_dekodieren(r.c_string()),
            },
            funktion::KANAL_THEMA => Self::Thema {
                kanal,
                thema: latin1_dekodieren(r.c_string()),
            },
            funktion::KANAL_BESCHREIBUNG => Self::Beschreibung {
                kanal,
                beschreibung: latin1_dekodieren(r.c_string()),
            },
            funktion::KANAL_FLAGS_CODEC => Self::FlagsCodec {
                kanal,
                flags: ChannelFlags::from_raw(r.u16()?),
                codec: r.u16()?,
            },
            funktion::KANAL_PASSWORT => Self::Passwort {
                kanal,
                passwort: latin1_dekodieren(r.fester_string(NAME_MAX)?),
            },
            funktion::KANAL_REIHENFOLGE => Self::Reihenfolge {
                kanal,
                reihenfolge: r.u16()?,
            },
            funktion::KANAL_MAX_NUTZER => Self::MaxNutzer {
                kanal,
                max_nutzer: r.u16()?,
            },
            andere => return Err(WireError::UnbekannterTyp(u32::from(andere))),
        };
        Ok(anfrage)
    }

    pub fn funktion(&self) -> u16 {
        match self {
            Self::Name { .. } => funktion::KANAL_NAME,
            Self::Thema { .. } => funktion::KANAL_THEMA,
            Self::Beschreibung { .. } => funktion::KANAL_BESCHREIBUNG,
            Self::FlagsCodec { .. } => funktion::KANAL_FLAGS_CODEC,
            Self::Passwort { .. } => funktion::KANAL_PASSWORT,
            Self::Reihenfolge { .. } => funktion::KANAL_REIHENFOLGE,
            Self::MaxNutzer { .. } => funktion::KANAL_MAX_NUTZER,
        }
    }

    pub fn kanal(&self) -> ChannelId {
        match self {
            Self::Name { kanal, .. }
            | Self::Thema { kanal, .. }
            | Self::Beschreibung { kanal, .. }
            | Self::FlagsCodec { kanal, .. }
            | Self::Passwort { kanal, .. }
            | Self::Reihenfolge { kanal, .. }
            | Self::MaxNutzer { kanal, .. } => *kanal,
        }
    }

    /// Kodiert die Anfrage wie ein Client sie sendet
    pub fn kodieren(&self, kopf: &PaketKopf) -> WireResult<Vec<u8>> {
        let kanal = self.kanal().inner();
        match self {
            Self::Name { name: text, .. }
            | Self::Thema { thema: text, .. }
            | Self::Beschreibung {
                beschreibung: text,
                ..
            } => {
                let text = latin1_kodieren(text);
                PacketFramer::steuerung(self.funktion(), KOPF_GROESSE + 4 + text.len() + 1)
                    .bauen(kopf, |w| {
                        w.u32(kanal)?;
                        w.c_string(&text)
                    })
            }
            Self::FlagsCodec { flags, codec, .. } => {
                PacketFramer::steuerung(self.funktion(), KOPF_GROESSE + 8).bauen(kopf, |w| {
                    w.u32(kanal)?;
                    w.u16(flags.raw())?;
                    w.u16(*codec)
                })
            }
            Self::Passwort { passwort, .. } => {
                PacketFramer::steuerung(self.funktion(), KOPF_GROESSE + 4 + 1 + NAME_MAX).bauen(
                    kopf,
                    |w| {
                        w.u32(kanal)?;
                        w.fester_string(&latin1_kodieren(passwort), NAME_MAX)
                    },
                )
            }
            Self::Reihenfolge { reihenfolge: wert, .. } | Self::MaxNutzer { max_nutzer: wert, .. } => {
                PacketFramer::steuerung(self.funktion(), KOPF_GROESSE + 6).bauen(kopf, |w| {
                    w.u32(kanal)?;
                    w.u16(*wert)
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Notiz
// ---------------------------------------------------------------------------

/// Benachrichtigung an alle Sessions
///
/// `kodieren` laesst die Empfaengerfelder leer; sie werden pro Empfaenger
/// mit `packet::empfaenger_setzen` gesetzt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notiz {
    KanalName {
        kanal: ChannelId,
        akteur: PublicId,
        name: String,
    },
    KanalThema {
        kanal: ChannelId,
        akteur: PublicId,
        thema: String,
    },
    KanalBeschreibung {
        kanal: ChannelId,
        akteur: PublicId,
        beschreibung: String,
    },
    KanalFlagsCodec {
        kanal: ChannelId,
        flags: ChannelFlags,
        codec: u16,
        akteur: PublicId,
    },
    KanalReihenfolge {
        kanal: ChannelId,
        reihenfolge: u16,
        akteur: PublicId,
    },
    KanalMaxNutzer {
        kanal: ChannelId,
        max_nutzer: u16,
        akteur: PublicId,
    },
    NeuerSpieler {
        spieler: PublicId,
        kanal: ChannelId,
        kanal_rechte: ChannelPrivileges,
        global: GlobalFlags,
        attribute: u16,
        nickname: String,
    },
    SpielerWeg {
        spieler: PublicId,
        grund: u16,
    },
}

impl Notiz {
    pub fn funktion(&self) -> u16 {
        match self {
            Self::KanalName { .. } => funktion::KANAL_NAME,
            Self::KanalThema { .. } => funktion::KANAL_THEMA,
            Self::KanalBeschreibung { .. } => funktion::KANAL_BESCHREIBUNG,
            Self::KanalFlagsCodec { .. } => funktion::KANAL_FLAGS_CODEC,
            Self::KanalReihenfolge { .. } => funktion::KANAL_REIHENFOLGE,
            Self::KanalMaxNutzer { .. } => funktion::KANAL_MAX_NUTZER,
            Self::NeuerSpieler { .. } => funktion::NEUER_SPIELER,
            Self::SpielerWeg { .. } => funktion::SPIELER_WEG,
        }
    }

    pub fn kodieren(&self) -> WireResult<Vec<u8>> {
        let kopf = PaketKopf::leer();
        let funktion = self.funktion();
        match self {
            Self::KanalName {
                kanal,
                akteur,
                name: text,
            }
            | Self::KanalThema {
                kanal,
                akteur,
                thema: text,
            }
            | Self::KanalBeschreibung {
                kanal,
                akteur,
                beschreibung: text,
            } => {
                let text = latin1_kodieren(text);
                PacketFramer::steuerung(funktion, text_groesse(&text)).bauen(&kopf, |w| {
                    w.u32(kanal.inner())?;
                    w.u32(akteur.inner())?;
                    w.c_string(&text)
                })
            }
            Self::KanalFlagsCodec {
                kanal,
                flags,
                codec,
                akteur,
            } => PacketFramer::steuerung(funktion, KOPF_GROESSE + 12).bauen(&kopf, |w| {
                w.u32(kanal.inner())?;
                w.u16(flags.raw())?;
                w.u16(*codec)?;
                w.u32(akteur.inner())
            }),
            Self::KanalReihenfolge {
                kanal,
                reihenfolge: wert,
                akteur,
            }
            | Self::KanalMaxNutzer {
                kanal,
                max_nutzer: wert,
                akteur,
            } => PacketFramer::steuerung(funktion, KOPF_GROESSE + 10).bauen(&kopf, |w| {
                w.u32(kanal.inner())?;
                w.u16(*wert)?;
                w.u32(akteur.inner())
            }),
            Self::NeuerSpieler {
                spieler,
                kanal,
                kanal_rechte,
                global,
                attribute,
                nickname,
            } => PacketFramer::steuerung(funktion, KOPF_GROESSE + 14 + 1 + NAME_MAX).bauen(
                &kopf,
                |w| {
                    w.u32(spieler.inner())?;
                    w.u32(kanal.inner())?;
                    w.u16(kanal_rechte.raw())?;
                    w.u16(global.raw())?;
                    w.u16(*attribute)?;
                    w.fester_string(&latin1_kodieren(nickname), NAME_MAX)
                },
            ),
            Self::SpielerWeg { spieler, grund } => {
                PacketFramer::steuerung(funktion, KOPF_GROESSE + 10).bauen(&kopf, |w| {
                    w.u32(spieler.inner())?;
                    w.u16(*grund)?;
                    // reserviert
                    w.u32(0)
                })
            }
        }
    }

    pub fn dekodieren(daten: &[u8]) -> WireResult<Self> {
        let kopf = SteuerKopf::dekodieren(daten)?;
        let mut r = WireReader::ab(daten, KOPF_GROESSE)?;

        let notiz = match kopf.funktion {
            funktion::KANAL_NAME | funktion::KANAL_THEMA | funktion::KANAL_BESCHREIBUNG => {
                let kanal = ChannelId(r.u32()?);
                let akteur = PublicId(r.u32()?);
                let text = latin1_dekodieren(r.c_string());
                match kopf.funktion {
                    funktion::KANAL_NAME => Self::KanalName {
                        kanal,
                        akteur,
                        name: text,
                    },
                    funktion::KANAL_THEMA => Self::KanalThema {
                        kanal,
                        akteur,
                        thema: text,
                    },
                    _ => Self::KanalBeschreibung {
                        kanal,
                        akteur,
                        beschreibung: text,
                    },
                }
            }
            funktion::KANAL_FLAGS_CODEC => Self::KanalFlagsCodec {
                kanal: ChannelId(r.u32()?),
                flags: ChannelFlags::from_raw(r.u16()?),
                codec: r.u16()?,
                akteur: PublicId(r.u32()?),
            },
            funktion::KANAL_REIHENFOLGE => Self::KanalReihenfolge {
                kanal: ChannelId(r.u32()?),
                reihenfolge: r.u16()?,
                akteur: PublicId(r.u32()?),
            },
            funktion::KANAL_MAX_NUTZER => Self::KanalMaxNutzer {
                kanal: ChannelId(r.u32()?),
                max_nutzer: r.u16()?,
                akteur: PublicId(r.u32()?),
            },
            funktion::NEUER_SPIELER => Self::NeuerSpieler {
                spieler: PublicId(r.u32()?),
                kanal: ChannelId(r.u32()?),
                kanal_rechte: ChannelPrivileges::from_raw(r.u16()?),
                global: GlobalFlags::from_raw(r.u16()?),
                attribute: r.u16()?,
                nickname: latin1_dekodieren(r.fester_string(NAME_MAX)?),
            },
            funktion::SPIELER_WEG => Self::SpielerWeg {
                spieler: PublicId(r.u32()?),
                grund: r.u16()?,
            },
            andere => return Err(WireError::UnbekannterTyp(u32::from(andere))),
        };
        Ok(notiz)
    }
}

// ---------------------------------------------------------------------------
// Quittung
// ---------------------------------------------------------------------------

/// Quittung fuer ein empfangenes Steuerpaket (16 Bytes, ohne Pruefsumme)
///
/// ```text
///  0   2   Typ (0xbef1)
///  2   2   0x0000
///  4   4   Private ID
///  8   4   Public ID
/// 12   4   Zaehler des quittierten Pakets
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quittung {
    pub private_id: PrivateId,
    pub public_id: PublicId,
    pub zaehler: u32,
}

impl Quittung {
    pub fn kodieren(&self) -> WireResult<Vec<u8>> {
        let mut paket = vec![0u8; QUITTUNG_GROESSE];
        let mut w = WireWriter::neu(&mut paket);
        w.u16(TYP_QUITTUNG)?;
        w.u16(0)?;
        w.u32(self.private_id.inner())?;
        w.u32(self.public_id.inner())?;
        w.u32(self.zaehler)?;
        debug_assert_eq!(w.position(), QUITTUNG_GROESSE);
        Ok(paket)
    }

    pub fn dekodieren(daten: &[u8]) -> WireResult<Self> {
        WireError::mindestens(daten, QUITTUNG_GROESSE)?;
        let mut r = WireReader::neu(daten);
        let typ = r.u16()?;
        if typ != TYP_QUITTUNG {
            return Err(WireError::UnbekannterTyp(u32::from(typ)));
        }
        r.ueberspringen(2)?;
        Ok(Self {
            private_id: PrivateId(r.u32()?),
            public_id: PublicId(r.u32()?),
            zaehler: r.u32()?,
        })
    }
}
