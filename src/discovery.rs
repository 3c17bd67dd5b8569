use crate::error::{CalaosError, Result};
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;

const DISCOVERY_PORT: u16 = 4545;
const DISCOVERY_MESSAGE: &[u8] = b"CALAOS_DISCOVER";
const REPLY_PREFIX: &[u8] = b"CALAOS_IP ";
const REPLY_BUFFER_SIZE: usize = 64;
const LISTEN_WINDOW: Duration = Duration::from_millis(500);

/// Default overall discovery timeout
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Discover a Calaos server on the local network
///
/// Broadcasts the magic discovery datagram and waits for the first server
/// to answer, repeating the broadcast every listen window until `timeout`
/// has elapsed. Returns [`CalaosError::NoServerFound`] when nothing
/// answered in time.
///
/// # Example
///
/// ```no_run
/// use calaos_client::discover;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let address = discover(calaos_client::DISCOVERY_TIMEOUT).await?;
///     println!("Found Calaos server at {}", address);
///     Ok(())
/// }
/// ```
pub async fn discover(timeout: Duration) -> Result<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
    socket.set_broadcast(true)?;

    let deadline = Instant::now() + timeout;
    let mut buf = [0u8; REPLY_BUFFER_SIZE];

    while Instant::now() < deadline {
        socket
            .send_to(DISCOVERY_MESSAGE, (Ipv4Addr::BROADCAST, DISCOVERY_PORT))
            .await?;

        match tokio::time::timeout(LISTEN_WINDOW, socket.recv_from(&mut buf)).await {
            Ok(Ok((len, peer))) => {
                if let Some(address) = parse_reply(&buf[..len]) {
                    tracing::debug!("Calaos server announced {} from {}", address, peer);
                    return Ok(address);
                }
                tracing::debug!("Ignoring unrelated datagram from {}", peer);
            }
            Ok(Err(e)) => return Err(e.into()),
            // Listen window elapsed without an answer; broadcast again
            Err(_) => {}
        }
    }

    Err(CalaosError::NoServerFound)
}

fn parse_reply(datagram: &[u8]) -> Option<IpAddr> {
    let rest = datagram.strip_prefix(REPLY_PREFIX)?;
    std::str::from_utf8(rest).ok()?.trim().parse().ok()
}
