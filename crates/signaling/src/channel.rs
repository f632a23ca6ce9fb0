//! Kanalbaum eines virtuellen Servers
//!
//! Kanaele liegen in einer Arena nach ID; Eltern werden nur ueber ihre ID
//! referenziert. Sessions halten ebenfalls nur die Kanal-ID.

use std::collections::BTreeMap;

use altfunk_core::{ChannelFlags, ChannelId, Codec, ServerId};
use altfunk_db::models::KanalRecord;
use altfunk_protocol::wire::gekuerzt;

/// Maximale Passwortlaenge (Feldbreite im Steuerpaket)
pub const PASSWORT_MAX: usize = 29;

/// Ein Kanal im Speicher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kanal {
    pub id: ChannelId,
    /// `None` fuer Wurzelkanaele
    pub eltern: Option<ChannelId>,
    pub name: String,
    pub thema: String,
    pub beschreibung: String,
    pub flags: ChannelFlags,
    pub codec: u16,
    passwort: String,
    pub sort_order: u16,
    pub max_nutzer: u16,
}

impl Kanal {
    pub fn neu(id: ChannelId, name: impl Into<String>) -> Self {
        Self {
            id,
            eltern: None,
            name: name.into(),
            thema: String::new(),
            beschreibung: String::new(),
            flags: ChannelFlags::default(),
            codec: Codec::Speex163 as u16,
            passwort: String::new(),
            sort_order: 0,
            max_nutzer: 0,
        }
    }

    pub fn ist_wurzel(&self) -> bool {
        self.eltern.is_none()
    }

    pub fn ist_registriert(&self) -> bool {
        self.flags.ist_registriert()
    }

    pub fn passwort(&self) -> &str {
        &self.passwort
    }

    /// Setzt das Passwort (gekuerzt auf die Feldbreite) und das Flag
    pub fn passwort_setzen(&mut self, passwort: &str) {
        let bytes = gekuerzt(passwort.as_bytes(), PASSWORT_MAX);
        // An einer Zeichengrenze kuerzen
        let mut laenge = bytes.len();
        while !passwort.is_char_boundary(laenge) {
            laenge -= 1;
        }
        self.passwort = passwort[..laenge].to_string();
        self.flags.setzen(ChannelFlags::PASSWORD);
    }

    /// Loescht Passwort und Flag gemeinsam
    pub fn passwort_entfernen(&mut self) {
        self.passwort.clear();
        self.flags.entfernen(ChannelFlags::PASSWORD);
    }

    pub fn aus_record(record: KanalRecord) -> Self {
        let mut kanal = Self {
            id: record.id,
            eltern: record.parent_id,
            name: record.name,
            thema: record.thema,
            beschreibung: record.beschreibung,
            flags: record.flags,
            codec: record.codec,
            passwort: record.passwort,
            sort_order: record.sort_order,
            max_nutzer: record.max_nutzer,
        };
        // Flag und Passwort muessen zusammenpassen
        if kanal.passwort.is_empty() {
            kanal.flags.entfernen(ChannelFlags::PASSWORD);
        } else {
            kanal.flags.setzen(ChannelFlags::PASSWORD);
        }
        kanal
    }

    pub fn als_record(&self, server: ServerId) -> KanalRecord {
        KanalRecord {
            server_id: server,
            id: self.id,
            parent_id: self.eltern,
            name: self.name.clone(),
            thema: self.thema.clone(),
            beschreibung: self.beschreibung.clone(),
            flags: self.flags,
            codec: self.codec,
            passwort: self.passwort.clone(),
            sort_order: self.sort_order,
            max_nutzer: self.max_nutzer,
        }
    }
}

/// Alle Kanaele eines Servers
#[derive(Debug, Clone, Default)]
pub struct KanalBaum {
    kanaele: BTreeMap<ChannelId, Kanal>,
}

impl KanalBaum {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Baut den Baum aus gespeicherten Kanaelen
    ///
    /// Unterkanaele ohne vorhandenen Elternkanal werden verworfen.
    pub fn aus_records(records: Vec<KanalRecord>) -> Self {
        let mut baum = Self::neu();
        let (wurzeln, kinder): (Vec<_>, Vec<_>) =
            records.into_iter().partition(|r| r.parent_id.is_none());

        for record in wurzeln {
            baum.einfuegen(Kanal::aus_record(record));
        }

        // Ebene fuer Ebene einfuegen, bis sich nichts mehr bewegt
        let mut offen = kinder;
        while !offen.is_empty() {
            let vorher = offen.len();
            let (bereit, rest): (Vec<_>, Vec<_>) = offen.into_iter().partition(|r| {
                r.parent_id
                    .is_some_and(|p| baum.kanaele.contains_key(&p))
            });
            for record in bereit {
                baum.einfuegen(Kanal::aus_record(record));
            }
            offen = rest;
            if offen.len() == vorher {
                break;
            }
        }
        for record in offen {
            tracing::warn!(kanal = %record.id, "Unterkanal ohne Elternkanal verworfen");
        }
        baum
    }

    /// Baum mit einem einzigen unregistrierten Standardkanal
    pub fn mit_standardkanal(name: &str) -> Self {
        let mut kanal = Kanal::neu(ChannelId(1), name);
        kanal
            .flags
            .setzen(ChannelFlags::DEFAULT | ChannelFlags::UNREGISTERED);
        let mut baum = Self::neu();
        baum.einfuegen(kanal);
        baum
    }

    pub fn einfuegen(&mut self, kanal: Kanal) {
        self.kanaele.insert(kanal.id, kanal);
    }

    pub fn get(&self, id: ChannelId) -> Option<&Kanal> {
        self.kanaele.get(&id)
    }

    pub fn get_mut(&mut self, id: ChannelId) -> Option<&mut Kanal> {
        self.kanaele.get_mut(&id)
    }

    /// Direkte Unterkanaele
    pub fn kinder(&self, id: ChannelId) -> impl Iterator<Item = &Kanal> {
        self.kanaele
            .values()
            .filter(move |k| k.eltern == Some(id))
    }

    /// Kanal, den neue Sessions betreten
    ///
    /// Der erste Wurzelkanal mit DEFAULT-Flag, sonst der erste Wurzelkanal.
    pub fn standard_kanal(&self) -> Option<ChannelId> {
        let mut wurzeln = self.kanaele.values().filter(|k| k.ist_wurzel());
        let erste = wurzeln.clone().next().map(|k| k.id);
        wurzeln
            .find(|k| k.flags.hat(ChannelFlags::DEFAULT))
            .map(|k| k.id)
            .or(erste)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Kanal> {
        self.kanaele.values()
    }

    pub fn len(&self) -> usize {
        self.kanaele.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kanaele.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, parent: Option<u32>, flags: u16, passwort: &str) -> KanalRecord {
        KanalRecord {
            server_id: ServerId(1),
            id: ChannelId(id),
            parent_id: parent.map(ChannelId),
            name: format!("Kanal {id}"),
            thema: String::new(),
            beschreibung: String::new(),
            flags: ChannelFlags::from_raw(flags),
            codec: 0,
            passwort: passwort.into(),
            sort_order: 0,
            max_nutzer: 0,
        }
    }

    #[test]
    fn baum_aus_records() {
        let baum = KanalBaum::aus_records(vec![
            record(3, Some(1), 0, ""),
            record(1, None, 0, ""),
            record(2, None, ChannelFlags::DEFAULT, ""),
            record(9, Some(42), 0, ""),
            record(8, Some(3), 0, ""),
        ]);

        assert_eq!(baum.len(), 4);
        assert!(baum.get(ChannelId(9)).is_none());
        assert_eq!(baum.get(ChannelId(8)).unwrap().eltern, Some(ChannelId(3)));
        assert!(!baum.get(ChannelId(3)).unwrap().ist_wurzel());
        assert_eq!(baum.kinder(ChannelId(1)).count(), 1);
        assert_eq!(baum.standard_kanal(), Some(ChannelId(2)));
    }

    #[test]
    fn standard_kanal_ohne_flag() {
        let baum = KanalBaum::aus_records(vec![record(5, None, 0, ""), record(4, None, 0, "")]);
        assert_eq!(baum.standard_kanal(), Some(ChannelId(4)));
        assert_eq!(KanalBaum::neu().standard_kanal(), None);
    }

    #[test]
    fn passwort_und_flag_konsistent() {
        let mut kanal = Kanal::neu(ChannelId(1), "Lobby");
        kanal.passwort_setzen("geheim");
        assert!(kanal.flags.hat(ChannelFlags::PASSWORD));
        assert_eq!(kanal.passwort(), "geheim");

        kanal.passwort_entfernen();
        assert!(!kanal.flags.hat(ChannelFlags::PASSWORD));
        assert_eq!(kanal.passwort(), "");
    }

    #[test]
    fn passwort_wird_gekuerzt() {
        let mut kanal = Kanal::neu(ChannelId(1), "Lobby");
        kanal.passwort_setzen(&"p".repeat(40));
        assert_eq!(kanal.passwort().len(), PASSWORT_MAX);
    }

    #[test]
    fn geladenes_flag_folgt_passwort() {
        let ohne = Kanal::aus_record(record(1, None, ChannelFlags::PASSWORD, ""));
        assert!(!ohne.flags.hat(ChannelFlags::PASSWORD));
        let mit = Kanal::aus_record(record(1, None, 0, "x"));
        assert!(mit.flags.hat(ChannelFlags::PASSWORD));
    }

    #[test]
    fn record_rundreise() {
        let original = record(7, None, ChannelFlags::MODERATED, "pw");
        let kanal = Kanal::aus_record(original.clone());
        let zurueck = kanal.als_record(ServerId(1));
        assert_eq!(zurueck.name, original.name);
        assert!(zurueck.flags.hat(ChannelFlags::MODERATED));
        assert!(zurueck.flags.hat(ChannelFlags::PASSWORD));
        assert_eq!(zurueck.passwort, "pw");
    }
}
