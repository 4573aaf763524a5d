use anyhow::{bail, Context, Result};
use bytes::{Buf, BytesMut};
use chrono::prelude::*;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::debug;

const NTP_PORT: u16 = 123;
const PACKET_SIZE: usize = 48;
const NTP_DELTA: i64 = 2_208_988_800; // seconds between 1900-01-01 and 1970-01-01
const ANY_ADDR: &str = "0.0.0.0:0";

/// Client request: LI = 0, VN = 3, Mode = 3
pub fn request() -> [u8; PACKET_SIZE] {
    let mut packet = [0u8; PACKET_SIZE];
    packet[0] = 0x1B;
    packet
}

/// Extracts the transmit timestamp of a server reply
pub fn decode(packet: &[u8]) -> Result<DateTime<Utc>> {
    if packet.len() < PACKET_SIZE {
        bail!("NTP reply too short: {} bytes", packet.len());
    }
    let mode = packet[0] & 0x07;
    if mode != 4 && mode != 5 {
        bail!("Not an NTP server reply (mode {mode})");
    }
    let mut transmit = &packet[40..48];
    let secs = transmit.get_u32() as i64;
    let frac = transmit.get_u32() as u64;
    if secs == 0 {
        bail!("NTP reply carries no transmit time");
    }
    let nanos = ((frac * 1_000_000_000) >> 32) as u32;
    DateTime::from_timestamp(secs - NTP_DELTA, nanos).context("NTP timestamp out of range")
}

/// Asks `host` for the current UTC time. `host` is a name or address
/// served on the NTP port, or a full `ip:port` socket address.
pub async fn query(host: &str, wait: Duration) -> Result<DateTime<Utc>> {
    let socket = UdpSocket::bind(ANY_ADDR).await?;
    let connected = match host.parse::<SocketAddr>() {
        Ok(addr) => socket.connect(addr).await,
        Err(_) => socket.connect((host, NTP_PORT)).await,
    };
    connected.with_context(|| format!("Resolving NTP server {host}"))?;
    socket.send(&request()).await?;
    let mut buffer = BytesMut::with_capacity(PACKET_SIZE * 2);
    let len = timeout(wait, socket.recv_buf(&mut buffer))
        .await
        .with_context(|| format!("No NTP reply from {host} within {wait:?}"))??;
    debug!("NTP reply of {len} bytes from {host}");
    decode(&buffer[..len])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(secs: u32, frac: u32) -> Vec<u8> {
        let mut packet = vec![0u8; PACKET_SIZE];
        packet[0] = 0x24; // LI 0, VN 4, Mode 4
        packet[40..44].copy_from_slice(&secs.to_be_bytes());
        packet[44..48].copy_from_slice(&frac.to_be_bytes());
        packet
    }

    #[test]
    fn builds_client_request() {
        let packet = request();
        assert_eq!(packet.len(), 48);
        assert_eq!(packet[0], 0x1B);
        assert!(packet[1..].iter().all(|b| *b == 0));
    }

    #[test]
    fn decodes_transmit_timestamp() {
        // 2024-01-01T00:00:00Z is 1704067200 in Unix time
        let secs = (1_704_067_200 + NTP_DELTA) as u32;
        let time = decode(&reply(secs, 0x8000_0000)).unwrap();
        assert_eq!(time, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::TimeDelta::milliseconds(500));
    }

    #[test]
    fn rejects_short_or_empty_replies() {
        assert!(decode(&[0x24; 20]).is_err());
        assert!(decode(&reply(0, 0)).is_err());
        let mut client = reply(3_913_056_000, 0);
        client[0] = 0x1B;
        assert!(decode(&client).is_err());
    }
}
