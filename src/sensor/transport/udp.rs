use super::RawLine;
use bytes::BytesMut;
use std::io;
use std::io::{Error, ErrorKind};
use tokio::net::UdpSocket;

const BUF_SIZE: usize = 256;
const ANY_ADDR: &str = "0.0.0.0";

pub struct Transport {
    socket: UdpSocket,
    buffer: BytesMut,
}

impl Transport {
    pub async fn new(port: u16) -> Result<Self, io::Error> {
        let mut endpoint = String::from(ANY_ADDR);
        endpoint.push(':');
        endpoint.push_str(&port.to_string());
        Ok(Self {
            socket: UdpSocket::bind(endpoint).await?,
            buffer: BytesMut::with_capacity(BUF_SIZE),
        })
    }

    pub fn local_port(&self) -> Result<u16, io::Error> {
        Ok(self.socket.local_addr()?.port())
    }

    pub async fn reading(&mut self) -> Result<RawLine, io::Error> {
        let (len, src) = self.socket.recv_buf_from(&mut self.buffer).await?;
        let line = std::str::from_utf8(&self.buffer[..len])
            .map(|s| s.trim().to_string())
            .map_err(|_| Error::new(ErrorKind::InvalidData, format!("Invalid UTF-8 from {src}")));
        self.buffer.clear();
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn receives_trimmed_datagrams() {
        let mut transport = Transport::new(0).await.unwrap();
        let port = transport.local_port().unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender
            .send_to(b"{\"t\": 21.5, \"rh\": 40.0}\n", ("127.0.0.1", port))
            .await
            .unwrap();
        let line = transport.reading().await.unwrap();
        assert_eq!(line, "{\"t\": 21.5, \"rh\": 40.0}");
    }
}
