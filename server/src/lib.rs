//! altfunk-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;
pub mod logging;

use std::net::SocketAddr;
use std::sync::Arc;

use altfunk_auth::PrivilegeTable;
use altfunk_core::CodecMaske;
use altfunk_db::{
    models::{NeuerServer, ServerRecord},
    ChannelRepository, ServerRepository, SqliteDb,
};
use altfunk_signaling::{KanalBaum, ServerKonfig, ServerZustand, UdpServer};
use anyhow::{Context, Result};
use config::ServerConfig;
use futures_util::future::join_all;
use tokio::sync::watch;

/// Name des Kanals, den ein Server ohne gespeicherte Kanaele bekommt
const STANDARDKANAL: &str = "Standard";

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle virtuellen Server und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Datenbank oeffnen und migrieren
    /// 2. Aktive virtuelle Server laden (oder den konfigurierten anlegen)
    /// 3. Pro Server Kanaele laden und UDP-Socket binden
    /// 4. Alle Empfangsschleifen betreiben, bis Ctrl-C kommt
    pub async fn starten(self) -> Result<()> {
        let db = Arc::new(
            SqliteDb::oeffnen(&self.config.datenbank)
                .await
                .context("Datenbank konnte nicht geoeffnet werden")?,
        );

        let records = self.server_laden(&db).await?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut udp_server = Vec::with_capacity(records.len());
        for record in &records {
            udp_server.push(self.udp_server_bauen(record, &db).await?);
        }

        let laeufe = join_all(
            udp_server
                .into_iter()
                .map(|server| server.starten(shutdown_rx.clone())),
        );
        tokio::pin!(laeufe);

        tracing::info!(server = records.len(), "Altfunk laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        let ergebnisse = tokio::select! {
            ergebnisse = &mut laeufe => ergebnisse,
            signal = tokio::signal::ctrl_c() => {
                signal.context("Ctrl-C-Handler nicht verfuegbar")?;
                tracing::info!("Shutdown-Signal empfangen, Server wird beendet");
                let _ = shutdown_tx.send(true);
                laeufe.await
            }
        };

        for (record, ergebnis) in records.iter().zip(ergebnisse) {
            if let Err(e) = ergebnis {
                tracing::error!(server = %record.id, fehler = %e, "UDP-Server mit Fehler beendet");
            }
        }
        db.schliessen().await;
        Ok(())
    }

    /// Aktive Server aus der Datenbank; ohne Eintrag wird der konfigurierte angelegt
    async fn server_laden(&self, db: &SqliteDb) -> Result<Vec<ServerRecord>> {
        let records = db
            .aktive_server()
            .await
            .context("Virtuelle Server konnten nicht geladen werden")?;
        if !records.is_empty() {
            return Ok(records);
        }

        let s = &self.config.server;
        tracing::info!(name = %s.name, "Keine virtuellen Server gespeichert, lege den konfigurierten an");
        let record = db
            .server_anlegen(NeuerServer {
                name: &s.name,
                maschine: &s.maschine,
                willkommen: &s.willkommen,
                passwort: &s.passwort,
                port: self.config.netzwerk.udp_port,
                codecs: CodecMaske(s.codecs),
            })
            .await
            .context("Konfigurierter Server konnte nicht angelegt werden")?;
        Ok(vec![record])
    }

    async fn udp_server_bauen(
        &self,
        record: &ServerRecord,
        db: &Arc<SqliteDb>,
    ) -> Result<UdpServer<SqliteDb>> {
        let kanaele = db
            .kanaele_laden(record.id)
            .await
            .with_context(|| format!("Kanaele von {} nicht ladbar", record.id))?;
        let kanaele = if kanaele.is_empty() {
            KanalBaum::mit_standardkanal(STANDARDKANAL)
        } else {
            KanalBaum::aus_records(kanaele)
        };

        let adresse: SocketAddr = self
            .config
            .udp_bind_adresse(record.port)
            .parse()
            .with_context(|| format!("Ungueltige Bind-Adresse fuer {}", record.id))?;

        let zustand = ServerZustand::neu(
            ServerKonfig::from(record),
            kanaele,
            PrivilegeTable::standard(),
        );
        let server = UdpServer::binden(adresse, zustand, Arc::clone(db), self.config.lebendigkeit())
            .await
            .with_context(|| format!("UDP-Socket {adresse} nicht bindbar"))?;

        tracing::info!(
            server = %record.id,
            name = %record.name,
            adresse = %adresse,
            "Virtueller Server bereit"
        );
        Ok(server)
    }
}
