//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable:
//! - `ALTFUNK_LOG_LEVEL`: Filter (z.B. `debug` oder `altfunk_signaling=trace`)
//! - `ALTFUNK_LOG_FORMAT`: Format (text/json)
//!
//! Ohne Umgebungsvariablen gelten die Werte aus der Konfigurationsdatei.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialisiert das Logging-System.
pub fn logging_initialisieren(level: &str, format: &str) {
    let filter = EnvFilter::try_from_env("ALTFUNK_LOG_LEVEL")
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format = std::env::var("ALTFUNK_LOG_FORMAT").unwrap_or_else(|_| format.to_string());
    if !log_format_gueltig(&format) {
        eprintln!("Unbekanntes Log-Format '{format}', verwende text");
    }

    match format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_current_span(true)
                .init();
        }
        _ => {
            fmt().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_gueltige_werte() {
        assert!(log_format_gueltig("text"));
        assert!(log_format_gueltig("json"));
    }

    #[test]
    fn log_format_ungueltige_werte() {
        assert!(!log_format_gueltig("xml"));
        assert!(!log_format_gueltig("JSON")); // Gross-/Kleinschreibung
        assert!(!log_format_gueltig(""));
    }
}
