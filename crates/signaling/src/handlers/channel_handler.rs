//! Kanal-Handler – Name, Thema, Beschreibung, Flags/Codec, Passwort,
//! Reihenfolge und maximale Nutzerzahl
//!
//! Gemeinsamer Ablauf:
//! 1. Kanal nach ID aufloesen, unbekannt -> stillschweigend ignorieren
//! 2. Privileg pruefen, verweigert -> nichts aendern, nichts senden
//! 3. Kanal im Speicher aendern
//! 4. Registrierte Kanaele persistieren (Fehler werden nur protokolliert)
//! 5. Neuen Wert an alle Sessions verteilen
//!
//! Die Quittung an den Absender verschickt der Dispatcher vorher.

use altfunk_auth::{Privilege, SitzungsSicht};
use altfunk_core::{ChannelFlags, ChannelId, PublicId};
use altfunk_db::models::KanalRecord;
use altfunk_db::repository::{BanRepository, ChannelRepository, RegistrationRepository};
use altfunk_protocol::{KanalAnfrage, Notiz};

use crate::broadcast;
use crate::server_state::{Dienste, ServerZustand};
use crate::session::Session;
use crate::transport::PacketTransport;

/// Flags, die ueber den Flags/Codec-Pfad geaendert werden, mit ihrem Privileg
const FLAG_PRIVILEGIEN: [(u16, Privilege); 4] = [
    (ChannelFlags::DEFAULT, Privilege::ChaCreateDefault),
    (ChannelFlags::MODERATED, Privilege::ChaCreateModerated),
    (ChannelFlags::SUBCHANNELS, Privilege::ChaCreateSubchanneled),
    (ChannelFlags::PASSWORD, Privilege::ChaChangePass),
];

/// Textfelder eines Kanals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextFeld {
    Name,
    Thema,
    Beschreibung,
}

impl TextFeld {
    fn privileg(self) -> Privilege {
        match self {
            Self::Name => Privilege::ChaChangeName,
            Self::Thema => Privilege::ChaChangeTopic,
            Self::Beschreibung => Privilege::ChaChangeDesc,
        }
    }

    fn notiz(self, kanal: ChannelId, akteur: PublicId, text: String) -> Notiz {
        match self {
            Self::Name => Notiz::KanalName {
                kanal,
                akteur,
                name: text,
            },
            Self::Thema => Notiz::KanalThema {
                kanal,
                akteur,
                thema: text,
            },
            Self::Beschreibung => Notiz::KanalBeschreibung {
                kanal,
                akteur,
                beschreibung: text,
            },
        }
    }
}

/// Verarbeitet eine Kanal-Anfrage; `true` wenn der Kanal geaendert wurde
pub async fn handle_kanal_anfrage<D, T>(
    anfrage: KanalAnfrage,
    akteur: PublicId,
    zustand: &mut ServerZustand,
    dienste: &Dienste<D, T>,
) -> bool
where
    D: ChannelRepository + RegistrationRepository + BanRepository,
    T: PacketTransport,
{
    let Some(sicht) = zustand.sessions.get(akteur).map(Session::sicht) else {
        tracing::debug!(public_id = %akteur, "Kanal-Anfrage ohne Session");
        return false;
    };
    let kanal = anfrage.kanal();
    if zustand.kanaele.get(kanal).is_none() {
        tracing::debug!(kanal = %kanal, public_id = %akteur, "Kanal-Anfrage fuer unbekannten Kanal");
        return false;
    }

    let kontext = Kontext {
        akteur,
        sicht,
        kanal,
    };
    match anfrage {
        KanalAnfrage::Name { name, .. } => {
            text_aendern(&kontext, TextFeld::Name, name, zustand, dienste).await
        }
        KanalAnfrage::Thema { thema, .. } => {
            text_aendern(&kontext, TextFeld::Thema, thema, zustand, dienste).await
        }
        KanalAnfrage::Beschreibung { beschreibung, .. } => {
            text_aendern(&kontext, TextFeld::Beschreibung, beschreibung, zustand, dienste).await
        }
        KanalAnfrage::FlagsCodec { flags, codec, .. } => {
            flags_codec_aendern(&kontext, flags, codec, zustand, dienste).await
        }
        KanalAnfrage::Passwort { passwort, .. } => {
            passwort_aendern(&kontext, &passwort, zustand, dienste).await
        }
        KanalAnfrage::Reihenfolge { reihenfolge, .. } => {
            reihenfolge_aendern(&kontext, reihenfolge, zustand, dienste).await
        }
        KanalAnfrage::MaxNutzer { max_nutzer, .. } => {
            max_nutzer_aendern(&kontext, max_nutzer, zustand, dienste).await
        }
    }
}

/// Wer aendert welchen Kanal
struct Kontext {
    akteur: PublicId,
    sicht: SitzungsSicht,
    kanal: ChannelId,
}

impl Kontext {
    fn darf(&self, zustand: &ServerZustand, privileg: Privilege, kanal: Option<ChannelId>) -> bool {
        let erlaubt = zustand.privilegien.hat_privileg(&self.sicht, privileg, kanal);
        if !erlaubt {
            tracing::debug!(
                public_id = %self.akteur,
                kanal = %self.kanal,
                privileg = ?privileg,
                "Privileg verweigert"
            );
        }
        erlaubt
    }
}

async fn text_aendern<D, T>(
    kontext: &Kontext,
    feld: TextFeld,
    text: String,
    zustand: &mut ServerZustand,
    dienste: &Dienste<D, T>,
) -> bool
where
    D: ChannelRepository + RegistrationRepository + BanRepository,
    T: PacketTransport,
{
    if !kontext.darf(zustand, feld.privileg(), Some(kontext.kanal)) {
        return false;
    }
    let server = zustand.server_id();
    let Some(kanal) = zustand.kanaele.get_mut(kontext.kanal) else {
        return false;
    };
    match feld {
        TextFeld::Name => kanal.name.clone_from(&text),
        TextFeld::Thema => kanal.thema.clone_from(&text),
        TextFeld::Beschreibung => kanal.beschreibung.clone_from(&text),
    }
    let registriert = kanal.ist_registriert();
    let record = kanal.als_record(server);

    persistieren(dienste, &record, registriert, registriert).await;
    let notiz = feld.notiz(kontext.kanal, kontext.akteur, text);
    broadcast::an_alle_senden(dienste.transport.as_ref(), &mut zustand.sessions, &notiz).await;
    true
}

async fn flags_codec_aendern<D, T>(
    kontext: &Kontext,
    flags: ChannelFlags,
    codec: u16,
    zustand: &mut ServerZustand,
    dienste: &Dienste<D, T>,
) -> bool
where
    D: ChannelRepository + RegistrationRepository + BanRepository,
    T: PacketTransport,
{
    let Some(kanal) = zustand.kanaele.get(kontext.kanal) else {
        return false;
    };
    let alt = kanal.flags;
    let wurzel = kanal.ist_wurzel();

    // Jede geaenderte Angabe einzeln pruefen, auch in Unterkanaelen;
    // eine Ablehnung verwirft alles
    let mut benoetigt: Vec<(Privilege, Option<ChannelId>)> = Vec::new();
    if alt.unterscheidet_sich(flags, ChannelFlags::UNREGISTERED) {
        if flags.hat(ChannelFlags::UNREGISTERED) {
            benoetigt.push((Privilege::ChaCreateUnregistered, None));
        } else {
            benoetigt.push((Privilege::ChaCreateRegistered, Some(kontext.kanal)));
        }
    }
    for (flag, privileg) in FLAG_PRIVILEGIEN {
        if alt.unterscheidet_sich(flags, flag) {
            benoetigt.push((privileg, Some(kontext.kanal)));
        }
    }
    if codec != kanal.codec {
        benoetigt.push((Privilege::ChaChangeCodec, Some(kontext.kanal)));
    }
    if !benoetigt
        .iter()
        .all(|&(privileg, kanal)| kontext.darf(zustand, privileg, kanal))
    {
        return false;
    }

    let server = zustand.server_id();
    let Some(kanal) = zustand.kanaele.get_mut(kontext.kanal) else {
        return false;
    };
    let vorher_registriert = kanal.ist_registriert();
    if wurzel {
        let mut neu = flags;
        // Passwortschutz ohne gespeichertes Passwort wird nicht uebernommen
        if neu.hat(ChannelFlags::PASSWORD) && kanal.passwort().is_empty() {
            neu.entfernen(ChannelFlags::PASSWORD);
        }
        kanal.flags = neu;
        if !neu.hat(ChannelFlags::PASSWORD) {
            kanal.passwort_entfernen();
        }
    } else if alt != flags {
        tracing::debug!(kanal = %kontext.kanal, "Flags eines Unterkanals bleiben unveraendert");
    }
    kanal.codec = codec;

    let jetzt_registriert = kanal.ist_registriert();
    let notiz = Notiz::KanalFlagsCodec {
        kanal: kontext.kanal,
        flags: kanal.flags,
        codec: kanal.codec,
        akteur: kontext.akteur,
    };
    let record = kanal.als_record(server);

    persistieren(dienste, &record, vorher_registriert, jetzt_registriert).await;
    broadcast::an_alle_senden(dienste.transport.as_ref(), &mut zustand.sessions, &notiz).await;
    true
}

async fn passwort_aendern<D, T>(
    kontext: &Kontext,
    passwort: &str,
    zustand: &mut ServerZustand,
    dienste: &Dienste<D, T>,
) -> bool
where
    D: ChannelRepository + RegistrationRepository + BanRepository,
    T: PacketTransport,
{
    if !kontext.darf(zustand, Privilege::ChaChangePass, Some(kontext.kanal)) {
        return false;
    }
    let server = zustand.server_id();
    let Some(kanal) = zustand.kanaele.get_mut(kontext.kanal) else {
        return false;
    };
    if !kanal.ist_wurzel() {
        tracing::debug!(kanal = %kontext.kanal, "Passwort nur fuer Wurzelkanaele");
        return false;
    }

    let flags_vorher = kanal.flags;
    if passwort.is_empty() {
        // Entfernen gehoert in den Flags-Pfad; Passwort und Flag fallen trotzdem weg
        tracing::error!(
            kanal = %kontext.kanal,
            public_id = %kontext.akteur,
            "Leeres Kanalpasswort ueber den Passwort-Pfad"
        );
        kanal.passwort_entfernen();
    } else {
        kanal.passwort_setzen(passwort);
    }

    let registriert = kanal.ist_registriert();
    let flags_geaendert = kanal.flags != flags_vorher;
    let notiz = Notiz::KanalFlagsCodec {
        kanal: kontext.kanal,
        flags: kanal.flags,
        codec: kanal.codec,
        akteur: kontext.akteur,
    };
    let record = kanal.als_record(server);

    persistieren(dienste, &record, registriert, registriert).await;
    if flags_geaendert {
        broadcast::an_alle_senden(dienste.transport.as_ref(), &mut zustand.sessions, &notiz).await;
    }
    true
}

async fn reihenfolge_aendern<D, T>(
    kontext: &Kontext,
    reihenfolge: u16,
    zustand: &mut ServerZustand,
    dienste: &Dienste<D, T>,
) -> bool
where
    D: ChannelRepository + RegistrationRepository + BanRepository,
    T: PacketTransport,
{
    if !kontext.darf(zustand, Privilege::ChaChangeOrder, Some(kontext.kanal)) {
        return false;
    }
    let server = zustand.server_id();
    let Some(kanal) = zustand.kanaele.get_mut(kontext.kanal) else {
        return false;
    };
    kanal.sort_order = reihenfolge;
    let registriert = kanal.ist_registriert();
    let record = kanal.als_record(server);

    persistieren(dienste, &record, registriert, registriert).await;
    let notiz = Notiz::KanalReihenfolge {
        kanal: kontext.kanal,
        reihenfolge,
        akteur: kontext.akteur,
    };
    broadcast::an_alle_senden(dienste.transport.as_ref(), &mut zustand.sessions, &notiz).await;
    true
}

async fn max_nutzer_aendern<D, T>(
    kontext: &Kontext,
    max_nutzer: u16,
    zustand: &mut ServerZustand,
    dienste: &Dienste<D, T>,
) -> bool
where
    D: ChannelRepository + RegistrationRepository + BanRepository,
    T: PacketTransport,
{
    if !kontext.darf(zustand, Privilege::ChaChangeMaxUsers, Some(kontext.kanal)) {
        return false;
    }
    let server = zustand.server_id();
    let Some(kanal) = zustand.kanaele.get_mut(kontext.kanal) else {
        return false;
    };
    kanal.max_nutzer = max_nutzer;
    let registriert = kanal.ist_registriert();
    let record = kanal.als_record(server);

    persistieren(dienste, &record, registriert, registriert).await;
    let notiz = Notiz::KanalMaxNutzer {
        kanal: kontext.kanal,
        max_nutzer,
        akteur: kontext.akteur,
    };
    broadcast::an_alle_senden(dienste.transport.as_ref(), &mut zustand.sessions, &notiz).await;
    true
}

/// Schreibt einen Kanal in die Datenbank
///
/// Ein Wechsel zwischen registriert und unregistriert meldet den Kanal an
/// oder ab, sonst werden nur registrierte Kanaele aktualisiert. Die Aenderung
/// im Speicher bleibt bei einem Fehler bestehen.
async fn persistieren<D, T>(
    dienste: &Dienste<D, T>,
    record: &KanalRecord,
    vorher_registriert: bool,
    jetzt_registriert: bool,
) where
    D: ChannelRepository + RegistrationRepository + BanRepository,
    T: PacketTransport,
{
    let ergebnis = match (vorher_registriert, jetzt_registriert) {
        (false, true) => dienste.db.kanal_registrieren(record).await,
        (true, false) => dienste
            .db
            .kanal_abmelden(record.server_id, record.id)
            .await
            .map(|_| ()),
        (true, true) => dienste.db.kanal_aktualisieren(record).await,
        (false, false) => return,
    };
    if let Err(e) = ergebnis {
        tracing::error!(kanal = %record.id, fehler = %e, "Kanal konnte nicht gespeichert werden");
    }
}
