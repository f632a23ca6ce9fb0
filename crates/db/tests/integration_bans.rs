//! Integration-Tests fuer BanRepository (In-Memory SQLite)

use altfunk_core::{CodecMaske, ServerId};
use altfunk_db::{
    models::{NeuerBan, NeuerServer},
    BanRepository, ServerRepository, SqliteDb,
};
use chrono::{Duration, Utc};

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
async fn ban_fuer_ip_finden() {
    let (db, server) = db_mit_server().await;

    let ban = db
        .ban_anlegen(NeuerBan {
            server_id: server,
            ip: "10.0.0.7",
            grund: "Spam",
            expires_at: None,
        })
        .await
        .unwrap();

    let gefunden = db.ban_fuer_ip(server, "10.0.0.7").await.unwrap().unwrap();
    assert_eq!(gefunden.id, ban.id);
    assert_eq!(gefunden.grund, "Spam");
    assert!(db.ban_fuer_ip(server, "10.0.0.8").await.unwrap().is_none());
}

#[tokio::test]
async fn abgelaufener_ban_greift_nicht() {
    let (db, server) = db_mit_server().await;

    db.ban_anlegen(NeuerBan {
        server_id: server,
        ip: "10.0.0.7",
        grund: "Kurz",
        expires_at: Some(Utc::now() - Duration::hours(1)),
    })
    .await
    .unwrap();
    assert!(db.ban_fuer_ip(server, "10.0.0.7").await.unwrap().is_none());

    db.ban_anlegen(NeuerBan {
        server_id: server,
        ip: "10.0.0.7",
        grund: "Lang",
        expires_at: Some(Utc::now() + Duration::hours(1)),
    })
    .await
    .unwrap();
    let aktiv = db.ban_fuer_ip(server, "10.0.0.7").await.unwrap().unwrap();
    assert_eq!(aktiv.grund, "Lang");
}

#[tokio::test]
async fn bans_gelten_pro_server() {
    let (db, server) = db_mit_server().await;
    db.ban_anlegen(NeuerBan {
        server_id: server,
        ip: "10.0.0.7",
        grund: "",
        expires_at: None,
    })
    .await
    .unwrap();

    assert!(db
        .ban_fuer_ip(ServerId(server.inner() + 1), "10.0.0.7")
        .await
        .unwrap()
        .is_none());
}
