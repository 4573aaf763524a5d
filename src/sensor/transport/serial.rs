// Serial Port Stuff

use super::RawLine;
use bytes::BytesMut;
use futures::stream::StreamExt;
use std::io;
use std::io::{Error, ErrorKind};
use tokio_serial::SerialPortBuilderExt;
use tokio_serial::SerialStream;
use tokio_util::codec::{Decoder, Framed};

pub struct LineCodec;

impl Decoder for LineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let newline = src.as_ref().iter().position(|b| *b == b'\n');
        if let Some(n) = newline {
            let line = src.split_to(n + 1);
            return match std::str::from_utf8(line.as_ref()) {
                Ok(s) => Ok(Some(s.to_string())),
                Err(_) => Err(Error::new(ErrorKind::InvalidData, "Invalid String")),
            };
        }
        Ok(None)
    }
}

type SerialReader = Framed<SerialStream, LineCodec>;

pub struct Transport {
    reader: SerialReader,
}

impl Transport {
    pub fn new(tty: &str, baud: u32) -> Result<Self, io::Error> {
        #[allow(unused_mut)]
        let mut port = tokio_serial::new(tty, baud).open_native_async()?;
        #[cfg(unix)]
        port.set_exclusive(false)?;
        Ok(Self {
            reader: LineCodec.framed(port),
        })
    }

    pub async fn reading(&mut self) -> Result<RawLine, io::Error> {
        match self.reader.next().await {
            Some(line) => Ok(line?.trim().to_string()),
            None => Err(Error::new(ErrorKind::UnexpectedEof, "Serial port closed")),
        }
    }
}
