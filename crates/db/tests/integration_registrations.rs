//! Integration-Tests fuer RegistrationRepository (In-Memory SQLite)

use altfunk_core::{CodecMaske, GlobalFlags, ServerId};
use altfunk_db::{
    models::{NeueRegistrierung, NeuerServer},
    DbError, RegistrationRepository, ServerRepository, SqliteDb,
};

async fn db_mit_server() -> (SqliteDb, ServerId) {
    let db = SqliteDb::in_memory()
        .await
        .expect("In-Memory DB konnte nicht erstellt werden");
    let server = db
        .server_anlegen(NeuerServer {
            name: "Altfunk",
            maschine: "",
            willkommen: "",
            passwort: "",
            port: 8767,
            codecs: CodecMaske::STANDARD,
        })
        .await
        .unwrap();
    (db, server.id)
}

#[tokio::test]
async fn registrierung_nach_login_finden() {
    let (db, server) = db_mit_server().await;

    let angelegt = db
        .registrierung_anlegen(NeueRegistrierung {
            server_id: server,
            login: "anna",
            passwort_hash: "$argon2id$platzhalter",
            global_flags: GlobalFlags::from_raw(GlobalFlags::SERVER_ADMIN),
        })
        .await
        .unwrap();

    let gefunden = db
        .registrierung_nach_login(server, "anna")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(gefunden.id, angelegt.id);
    assert!(gefunden.global_flags.ist_server_admin());
    assert!(db
        .registrierung_nach_login(server, "bob")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn doppelter_login_wird_abgelehnt() {
    let (db, server) = db_mit_server().await;
    let neu = || NeueRegistrierung {
        server_id: server,
        login: "anna",
        passwort_hash: "hash",
        global_flags: GlobalFlags::default(),
    };

    db.registrierung_anlegen(neu()).await.unwrap();
    let fehler = db.registrierung_anlegen(neu()).await.unwrap_err();
    assert!(matches!(fehler, DbError::Eindeutigkeit(_)));
}
