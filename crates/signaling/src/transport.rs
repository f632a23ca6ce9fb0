//! Transport-Abstraktion fuer ausgehende Datagramme

use std::io;
use std::net::SocketAddr;

use altfunk_protocol::{PaketKopf, WireResult};
use tokio::net::UdpSocket;

use crate::error::SignalingResult;
use crate::session::Session;

/// Versendet fertige Pakete an eine Adresse
#[allow(async_fn_in_trait)]
pub trait PacketTransport {
    async fn senden(&self, daten: &[u8], ziel: SocketAddr) -> io::Result<()>;
}

impl PacketTransport for UdpSocket {
    async fn senden(&self, daten: &[u8], ziel: SocketAddr) -> io::Result<()> {
        let gesendet = self.send_to(daten, ziel).await?;
        if gesendet != daten.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("nur {gesendet} von {} Bytes gesendet", daten.len()),
            ));
        }
        Ok(())
    }
}

/// Baut eine Direktantwort fuer `session` und versendet sie
///
/// Der Unicast-Zaehler der Session steigt erst, nachdem der Transport den
/// Versand bestaetigt hat.
pub async fn unicast_senden<T, F>(
    transport: &T,
    session: &mut Session,
    bauen: F,
) -> SignalingResult<()>
where
    T: PacketTransport,
    F: FnOnce(PaketKopf) -> WireResult<Vec<u8>>,
{
    let paket = bauen(session.kopf_unicast())?;
    transport.senden(&paket, session.adresse).await?;
    session.zaehler_unicast = session.zaehler_unicast.wrapping_add(1);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::AufzeichnenderTransport;
    use altfunk_core::{PrivateId, PublicId};
    use altfunk_protocol::{KeepaliveAntwort, WireError};

    fn session() -> Session {
        Session::neu(PrivateId(5), PublicId(6), "127.0.0.1:4000".parse().unwrap())
    }

    fn antwort(kopf: PaketKopf) -> WireResult<Vec<u8>> {
        KeepaliveAntwort { kopf, token: 1 }.kodieren()
    }

    #[tokio::test]
    async fn erfolgreicher_versand_erhoeht_zaehler() {
        let transport = AufzeichnenderTransport::neu();
        let mut s = session();
        let vorher = s.zaehler_unicast;

        unicast_senden(&transport, &mut s, antwort).await.unwrap();

        assert_eq!(s.zaehler_unicast, vorher + 1);
        let pakete = transport.pakete();
        assert_eq!(pakete.len(), 1);
        assert_eq!(PaketKopf::lesen(&pakete[0].0).unwrap().zaehler, vorher);
    }

    #[tokio::test]
    async fn fehlgeschlagener_versand_laesst_zaehler_stehen() {
        let transport = AufzeichnenderTransport::neu();
        let mut s = session();
        transport.ziel_sperren(s.adresse);
        let vorher = s.zaehler_unicast;

        let ergebnis = unicast_senden(&transport, &mut s, antwort).await;

        assert!(matches!(ergebnis, Err(crate::SignalingError::Io(_))));
        assert_eq!(s.zaehler_unicast, vorher);
    }

    #[tokio::test]
    async fn baufehler_sendet_nichts() {
        let transport = AufzeichnenderTransport::neu();
        let mut s = session();
        let vorher = s.zaehler_unicast;

        let ergebnis = unicast_senden(&transport, &mut s, |_| {
            Err(WireError::UnbekannterTyp(0x42))
        })
        .await;

        assert!(matches!(ergebnis, Err(crate::SignalingError::Wire(_))));
        assert!(transport.pakete().is_empty());
        assert_eq!(s.zaehler_unicast, vorher);
    }

    #[tokio::test]
    async fn udp_socket_als_transport() {
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let empfaenger = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let ziel = empfaenger.local_addr().unwrap();

        sender.senden(b"altfunk", ziel).await.unwrap();

        let mut puffer = [0u8; 16];
        let (n, von) = empfaenger.recv_from(&mut puffer).await.unwrap();
        assert_eq!(&puffer[..n], b"altfunk");
        assert_eq!(von, sender.local_addr().unwrap());
    }
}
