//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use std::time::Duration;

use altfunk_core::CodecMaske;
use altfunk_db::DatabaseConfig;
use altfunk_signaling::Lebendigkeit;
use serde::{Deserialize, Serialize};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Virtueller Server, falls die Datenbank noch keinen kennt
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Datenbank-Einstellungen
    pub datenbank: DatabaseConfig,
    /// Lebendigkeit der Sessions
    pub sitzung: SitzungEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
    /// Name der Maschine im Annahmepaket
    pub maschine: String,
    /// Willkommensnachricht (max. 255 Zeichen)
    pub willkommen: String,
    /// Passwort fuer anonyme Verbindungen (leer = keins)
    pub passwort: String,
    /// Erlaubte Codecs als Bitmaske
    pub codecs: u16,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Altfunk Server".into(),
            maschine: String::new(),
            willkommen: String::new(),
            passwort: String::new(),
            codecs: CodecMaske::STANDARD.0,
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer alle UDP-Sockets
    pub bind_adresse: String,
    /// UDP-Port fuer Server ohne eigenen Port
    pub udp_port: u16,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            udp_port: 8767,
        }
    }
}

/// Lebendigkeit der Sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SitzungEinstellungen {
    /// Sekunden ohne Keepalive bis zur Entfernung
    pub timeout_sek: u64,
    /// Sekunden zwischen zwei Pruefungen
    pub pruef_intervall_sek: u64,
}

impl Default for SitzungEinstellungen {
    fn default() -> Self {
        Self {
            timeout_sek: 60,
            pruef_intervall_sek: 10,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Bind-Adresse fuer einen Server; Port 0 nimmt den konfigurierten Port
    pub fn udp_bind_adresse(&self, port: u16) -> String {
        let port = if port == 0 { self.netzwerk.udp_port } else { port };
        format!("{}:{}", self.netzwerk.bind_adresse, port)
    }

    pub fn lebendigkeit(&self) -> Lebendigkeit {
        Lebendigkeit {
            timeout: Duration::from_secs(self.sitzung.timeout_sek),
            pruef_intervall: Duration::from_secs(self.sitzung.pruef_intervall_sek.max(1)),
        }
    }
}
