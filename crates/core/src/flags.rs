//! Flag-Bitsets und Codec-Tabelle der Legacy-Clients
//!
//! Die Bitwerte sind Teil des Drahtformats und duerfen nicht veraendert
//! werden.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GlobalFlags
// ---------------------------------------------------------------------------

/// Serverweite Flags einer Session (u16 auf dem Draht)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GlobalFlags(u16);

impl GlobalFlags {
    /// Anonyme Session (keine Bits gesetzt)
    pub const UNREGISTERED: u16 = 0x0000;
    /// Server-Administrator
    pub const SERVER_ADMIN: u16 = 0x0001;
    /// Darf sich selbst registrieren
    pub const ALLOW_REG: u16 = 0x0002;
    /// Ueber Login-Daten angemeldet
    pub const REGISTERED: u16 = 0x0004;

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Prueft ob alle Bits aus `maske` gesetzt sind
    pub const fn enthaelt(self, maske: u16) -> bool {
        self.0 & maske == maske
    }

    /// Setzt die Bits aus `maske` zusaetzlich
    pub fn hinzufuegen(&mut self, maske: u16) {
        self.0 |= maske;
    }

    pub const fn ist_registriert(self) -> bool {
        self.0 & Self::REGISTERED != 0
    }

    pub const fn ist_server_admin(self) -> bool {
        self.0 & Self::SERVER_ADMIN != 0
    }
}

// ---------------------------------------------------------------------------
// ChannelFlags
// ---------------------------------------------------------------------------

/// Flags eines Kanals (u16 auf dem Draht)
///
/// ```text
/// Bit  Wert  Bedeutung
///  -   0x00  registriert (kein Bit)
///  0   0x01  unregistriert (fluechtig, nicht in der Datenbank)
///  1   0x02  moderiert
///  2   0x04  passwortgeschuetzt
///  3   0x08  Unterkanaele erlaubt
///  4   0x10  Standardkanal
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ChannelFlags(u16);

impl ChannelFlags {
    pub const UNREGISTERED: u16 = 0x0001;
    pub const MODERATED: u16 = 0x0002;
    pub const PASSWORD: u16 = 0x0004;
    pub const SUBCHANNELS: u16 = 0x0008;
    pub const DEFAULT: u16 = 0x0010;

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Prueft ob ein bestimmtes Flag gesetzt ist
    pub const fn hat(self, flag: u16) -> bool {
        self.0 & flag != 0
    }

    /// Prueft ob sich ein Flag zwischen `self` und `andere` unterscheidet
    pub const fn unterscheidet_sich(self, andere: Self, flag: u16) -> bool {
        (self.0 & flag) != (andere.0 & flag)
    }

    pub fn setzen(&mut self, flag: u16) {
        self.0 |= flag;
    }

    pub fn entfernen(&mut self, flag: u16) {
        self.0 &= !flag;
    }

    /// Registrierte Kanaele werden in der Datenbank gespiegelt
    pub const fn ist_registriert(self) -> bool {
        !self.hat(Self::UNREGISTERED)
    }
}

// ---------------------------------------------------------------------------
// ChannelPrivileges
// ---------------------------------------------------------------------------

/// Rechte einer Session in ihrem aktuellen Kanal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ChannelPrivileges(u16);

impl ChannelPrivileges {
    pub const CHANNEL_ADMIN: u16 = 0x0001;
    pub const OPERATOR: u16 = 0x0002;
    pub const VOICE: u16 = 0x0004;
    pub const AUTO_OPERATOR: u16 = 0x0008;
    pub const AUTO_VOICE: u16 = 0x0010;

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn hat(self, recht: u16) -> bool {
        self.0 & recht != 0
    }
}

// ---------------------------------------------------------------------------
// Codecs
// ---------------------------------------------------------------------------

/// Sprach-Codecs der Legacy-Clients (Bitposition in der Codec-Maske)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum Codec {
    Celp51 = 0,
    Celp63 = 1,
    Gsm148 = 2,
    Gsm164 = 3,
    CelpWin52 = 4,
    Speex34 = 5,
    Speex52 = 6,
    Speex72 = 7,
    Speex93 = 8,
    Speex123 = 9,
    Speex163 = 10,
    Speex196 = 11,
    Speex259 = 12,
}

impl Codec {
    /// Alle bekannten Codecs in Draht-Reihenfolge
    pub const ALLE: [Codec; 13] = [
        Codec::Celp51,
        Codec::Celp63,
        Codec::Gsm148,
        Codec::Gsm164,
        Codec::CelpWin52,
        Codec::Speex34,
        Codec::Speex52,
        Codec::Speex72,
        Codec::Speex93,
        Codec::Speex123,
        Codec::Speex163,
        Codec::Speex196,
        Codec::Speex259,
    ];

    /// Konvertiert einen Draht-Wert in einen `Codec`
    pub fn from_u16(wert: u16) -> Option<Self> {
        Self::ALLE.get(usize::from(wert)).copied()
    }
}

/// Bitmaske der vom Server unterstuetzten Codecs (`1 << codec`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodecMaske(pub u16);

impl CodecMaske {
    /// Alle Codecs ausser CelpWin 5.2
    pub const STANDARD: CodecMaske = CodecMaske(0x1FEF);

    /// Baut eine Maske aus einer Liste von Codecs
    pub fn aus_codecs(codecs: &[Codec]) -> Self {
        Self(codecs.iter().fold(0u16, |maske, c| maske | (1 << *c as u16)))
    }

    pub fn unterstuetzt(&self, codec: Codec) -> bool {
        self.0 & (1 << codec as u16) != 0
    }
}

impl Default for CodecMaske {
    fn default() -> Self {
        Self::STANDARD
    }
}
