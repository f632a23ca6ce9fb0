//! Server-Privilegien der Legacy-Clients
//!
//! Jedes Privileg ist einer Menge von Gruppen freigegeben. Die Gruppen einer
//! Session ergeben sich aus ihren globalen Flags und ihren Rechten im
//! aktuellen Kanal. Die Tabelle wird im Annahmepaket als Bitfeld an den
//! Client geschickt (Bit `privileg * 6 + gruppe`, LSB zuerst).

use altfunk_core::{ChannelId, ChannelPrivileges, GlobalFlags};

/// Groesse des Bitfelds im Annahmepaket
pub const BITFELD_GROESSE: usize = 71;

/// Gruppen, denen ein Privileg freigegeben werden kann
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PrivilegGruppe {
    ServerAdmin = 0,
    KanalAdmin = 1,
    Operator = 2,
    Voice = 3,
    Registriert = 4,
    Anonym = 5,
}

impl PrivilegGruppe {
    pub const ANZAHL: usize = 6;

    pub const ALLE: [PrivilegGruppe; Self::ANZAHL] = [
        Self::ServerAdmin,
        Self::KanalAdmin,
        Self::Operator,
        Self::Voice,
        Self::Registriert,
        Self::Anonym,
    ];

    fn maske(self) -> u8 {
        1 << self as u8
    }
}

/// Privilegien in der Reihenfolge des Bitfelds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Privilege {
    // Administration
    AdmDelServer,
    AdmAddServer,
    AdmListServers,
    AdmSetPermissions,
    AdmChangeUserPass,
    AdmChangeOwnPass,
    AdmListRegistrations,
    AdmRegisterPlayer,
    AdmChangeServerCodecs,
    AdmChangeServerType,
    AdmChangeServerPass,
    AdmChangeServerWelcome,
    AdmChangeServerMaxUsers,
    AdmChangeServerName,
    AdmChangeWebpostUrl,
    AdmChangeServerPort,
    AdmStartServer,
    AdmStopServer,
    AdmMovePlayer,
    AdmBanIp,
    // Kanaele
    ChaDelete,
    ChaCreateModerated,
    ChaCreateSubchanneled,
    ChaCreateDefault,
    ChaCreateUnregistered,
    ChaCreateRegistered,
    ChaJoinRegistered,
    ChaJoinWoPass,
    ChaChangeCodec,
    ChaChangeMaxUsers,
    ChaChangeOrder,
    ChaChangeDesc,
    ChaChangeTopic,
    ChaChangePass,
    ChaChangeName,
    // Spieler
    PlGrantAllowReg,
    PlGrantVoice,
    PlGrantAutoVoice,
    PlGrantOp,
    PlGrantAutoOp,
    PlGrantCa,
    PlGrantSa,
    PlRegisterPlayer,
    PlRevokeAllowReg,
    PlRevokeVoice,
    PlRevokeAutoVoice,
    PlRevokeOp,
    PlRevokeAutoOp,
    PlRevokeCa,
    PlRevokeSa,
    PlAllowSelfReg,
    PlDelRegistration,
    // Sonstiges
    OtherChCommander,
    OtherChKick,
    OtherSvKick,
    OtherTextPl,
    OtherTextAllCh,
    OtherTextInCh,
    OtherTextAll,
}

impl Privilege {
    pub const ANZAHL: usize = Privilege::OtherTextAll as usize + 1;

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Sicht der Privilegienpruefung auf eine Session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SitzungsSicht {
    pub global: GlobalFlags,
    /// Aktueller Kanal der Session
    pub kanal: Option<ChannelId>,
    /// Rechte im aktuellen Kanal
    pub kanal_rechte: ChannelPrivileges,
}

impl SitzungsSicht {
    /// Gruppen der Session fuer eine Pruefung im Kontext `kanal`
    ///
    /// Kanalgruppen zaehlen nur, wenn der Kontext der aktuelle Kanal ist.
    pub fn gruppen(&self, kanal: Option<ChannelId>) -> u8 {
        let mut maske = if self.global.ist_registriert() {
            PrivilegGruppe::Registriert.maske()
        } else {
            PrivilegGruppe::Anonym.maske()
        };
        if self.global.ist_server_admin() {
            maske |= PrivilegGruppe::ServerAdmin.maske();
        }

        if kanal.is_some() && kanal == self.kanal {
            let rechte = self.kanal_rechte;
            if rechte.hat(ChannelPrivileges::CHANNEL_ADMIN) {
                maske |= PrivilegGruppe::KanalAdmin.maske();
            }
            if rechte.hat(ChannelPrivileges::OPERATOR) {
                maske |= PrivilegGruppe::Operator.maske();
            }
            if rechte.hat(ChannelPrivileges::VOICE) {
                maske |= PrivilegGruppe::Voice.maske();
            }
        }
        maske
    }
}

/// Boolesches Praedikat, das die Kanal-Handler vor jeder Aenderung befragen
pub trait PrivilegeCheck: Send + Sync {
    fn hat_privileg(
        &self,
        sitzung: &SitzungsSicht,
        privileg: Privilege,
        kanal: Option<ChannelId>,
    ) -> bool;
}

/// Zuordnung Privileg -> Gruppenmaske
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegeTable {
    gruppen: [u8; Privilege::ANZAHL],
}

impl PrivilegeTable {
    /// Tabelle ohne jede Freigabe
    pub fn leer() -> Self {
        Self {
            gruppen: [0; Privilege::ANZAHL],
        }
    }

    /// Zurueckhaltende Standardbelegung
    pub fn standard() -> Self {
        use PrivilegGruppe::*;
        use Privilege::*;

        let mut tabelle = Self::leer();

        // Server-Admins duerfen alles
        for maske in tabelle.gruppen.iter_mut() {
            *maske |= ServerAdmin.maske();
        }

        for p in [
            ChaDelete,
            ChaCreateModerated,
            ChaCreateSubchanneled,
            ChaChangeCodec,
            ChaChangeMaxUsers,
            ChaChangeOrder,
            ChaChangeDesc,
            ChaChangeTopic,
            ChaChangePass,
            ChaChangeName,
            ChaJoinWoPass,
            PlGrantVoice,
            PlGrantAutoVoice,
            PlGrantOp,
            PlGrantAutoOp,
            PlRevokeVoice,
            PlRevokeAutoVoice,
            PlRevokeOp,
            PlRevokeAutoOp,
            OtherChKick,
        ] {
            tabelle.gewaehren(p, KanalAdmin);
        }

        for p in [ChaChangeTopic, PlGrantVoice, PlRevokeVoice, OtherChKick] {
            tabelle.gewaehren(p, Operator);
        }

        for p in [
            AdmChangeOwnPass,
            ChaCreateUnregistered,
            ChaJoinRegistered,
            OtherChCommander,
            OtherTextPl,
            OtherTextAllCh,
            OtherTextInCh,
        ] {
            tabelle.gewaehren(p, Registriert);
        }

        for p in [ChaCreateUnregistered, OtherTextPl, OtherTextInCh] {
            tabelle.gewaehren(p, Anonym);
        }

        tabelle.gewaehren(OtherTextInCh, Voice);
        tabelle
    }

    pub fn gewaehren(&mut self, privileg: Privilege, gruppe: PrivilegGruppe) {
        self.gruppen[privileg.index()] |= gruppe.maske();
    }

    pub fn entziehen(&mut self, privileg: Privilege, gruppe: PrivilegGruppe) {
        self.gruppen[privileg.index()] &= !gruppe.maske();
    }

    pub fn erlaubt(&self, privileg: Privilege, gruppe: PrivilegGruppe) -> bool {
        self.gruppen[privileg.index()] & gruppe.maske() != 0
    }

    /// Bitfeld fuer das Annahmepaket
    pub fn bitfeld(&self) -> [u8; BITFELD_GROESSE] {
        let mut feld = [0u8; BITFELD_GROESSE];
        for (privileg, maske) in self.gruppen.iter().enumerate() {
            for gruppe in PrivilegGruppe::ALLE {
                if maske & gruppe.maske() != 0 {
                    let bit = privileg * PrivilegGruppe::ANZAHL + gruppe as usize;
                    feld[bit / 8] |= 1 << (bit % 8);
                }
            }
        }
        feld
    }
}

impl Default for PrivilegeTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl PrivilegeCheck for PrivilegeTable {
    fn hat_privileg(
        &self,
        sitzung: &SitzungsSicht,
        privileg: Privilege,
        kanal: Option<ChannelId>,
    ) -> bool {
        self.gruppen[privileg.index()] & sitzung.gruppen(kanal) != 0
    }
}
