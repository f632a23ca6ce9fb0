//! Ban-Service fuer Altfunk
//!
//! IP-Bans pro virtuellem Server. Gebannte Adressen bekommen auf ihre
//! Verbindungsanfrage ein Ablehnungspaket statt einer Session.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use altfunk_core::ServerId;
use chrono::Utc;

use altfunk_db::{
    models::{BanRecord, NeuerBan},
    repository::BanRepository,
};

use crate::error::{AuthError, AuthResult};

/// Ban-Service – Verwaltung von IP-Sperren
pub struct BanService<B: BanRepository> {
    ban_repo: Arc<B>,
}

impl<B: BanRepository> BanService<B> {
    /// Erstellt einen neuen BanService
    pub fn neu(ban_repo: Arc<B>) -> Arc<Self> {
        Arc::new(Self { ban_repo })
    }

    /// Bannt eine IP-Adresse
    ///
    /// `dauer` – optionale Dauer; `None` = permanenter Ban
    pub async fn ip_bannen(
        &self,
        server: ServerId,
        ip: IpAddr,
        grund: &str,
        dauer: Option<Duration>,
    ) -> AuthResult<BanRecord> {
        let laeuft_ab_am = dauer
            .map(|d| {
                chrono::Duration::from_std(d)
                    .map(|d| Utc::now() + d)
                    .map_err(|e| AuthError::intern(format!("Ban-Dauer ungueltig: {e}")))
            })
            .transpose()?;

        let ip_text = ip.to_string();
        let ban = self
            .ban_repo
            .ban_anlegen(NeuerBan {
                server_id: server,
                ip: &ip_text,
                grund,
                expires_at: laeuft_ab_am,
            })
            .await?;

        tracing::info!(
            server = %server,
            ip = %ip,
            ban_id = ban.id,
            permanent = laeuft_ab_am.is_none(),
            "IP gebannt"
        );

        Ok(ban)
    }

    /// Aktiver Ban fuer die Adresse, falls vorhanden
    pub async fn ist_gebannt(&self, server: ServerId, ip: IpAddr) -> AuthResult<Option<BanRecord>> {
        Ok(self.ban_repo.ban_fuer_ip(server, &ip.to_string()).await?)
    }
}
