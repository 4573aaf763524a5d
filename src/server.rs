// Single client, one request per connection HTTP endpoint for the data log
use super::datalog::DataLog;
use super::Sample;
use anyhow::Result;
use regex::Regex;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, info, warn};

const BUF_SIZE: usize = 1024;
const READ_TIMEOUT: Duration = Duration::from_secs(2);
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_LINE: &str = r"^([A-Z]+) (\S+) HTTP/1\.[01]\r?$";

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Response {
    fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    fn text(status: u16, body: &str) -> Self {
        Self::new(status, "text/plain; charset=utf-8", body)
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            404 => "Not Found",
            405 => "Method Not Allowed",
            _ => "Internal Server Error",
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len()
        )
        .into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

pub struct Server {
    listener: TcpListener,
    request_line: Regex,
    reply_timeout: Duration,
}

impl Server {
    pub async fn bind(port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        info!("Serving the data log on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            request_line: Regex::new(REQUEST_LINE)?,
            reply_timeout: REPLY_TIMEOUT,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        self.listener.accept().await
    }

    /// Extracts method and path from the first request line
    pub fn parse<'a>(&self, request: &'a str) -> Option<(&'a str, &'a str)> {
        let first = request.lines().next()?;
        let caps = self.request_line.captures(first)?;
        Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
    }

    pub fn respond(&self, request: &str, datalog: &mut DataLog, sample: &Sample) -> Response {
        let (method, path) = match self.parse(request) {
            Some(parsed) => parsed,
            None => return Response::text(400, "Bad request\n"),
        };
        if method != "GET" {
            return Response::text(405, "Only GET is supported\n");
        }
        // Query strings are ignored, so old "/delete?" form links keep working
        let path = path.split('?').next().unwrap_or(path);
        match path {
            "/" => Response::new(200, "text/html; charset=utf-8", webpage(sample)),
            "/data.csv" => match datalog.contents() {
                Ok(body) => Response::new(200, "text/csv", body),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Response::text(404, "No data file\n"),
                Err(e) => Response::text(500, &format!("Reading data file failed: {e}\n")),
            },
            "/delete" => match datalog.reset() {
                Ok(true) => Response::text(200, "Data file deleted\n"),
                Ok(false) => Response::text(404, "No data file to delete, a new one was created\n"),
                Err(e) => Response::text(500, &format!("Deleting data file failed: {e}\n")),
            },
            _ => Response::text(404, "Not found\n"),
        }
    }

    /// Reads one request from `stream`, answers it and closes the connection
    pub async fn serve(
        &self,
        mut stream: TcpStream,
        peer: SocketAddr,
        datalog: &mut DataLog,
        sample: &Sample,
    ) -> Result<()> {
        let mut buffer = [0u8; BUF_SIZE];
        let len = match timeout(READ_TIMEOUT, stream.read(&mut buffer)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("HTTP client {peer} sent nothing within {READ_TIMEOUT:?}");
                return Ok(());
            }
        };
        let request = String::from_utf8_lossy(&buffer[..len]);
        let response = self.respond(&request, datalog, sample);
        debug!(
            "HTTP {peer} {:?} -> {}",
            request.lines().next().unwrap_or_default(),
            response.status
        );
        self.reply(&mut stream, peer, &response.to_bytes()).await?;
        Ok(())
    }

    /// Sends `bytes` and closes our side. Returns false when the client
    /// did not take them within the reply timeout.
    async fn reply(&self, stream: &mut TcpStream, peer: SocketAddr, bytes: &[u8]) -> io::Result<bool> {
        let send = async {
            stream.write_all(bytes).await?;
            stream.shutdown().await?;
            Ok::<_, io::Error>(())
        };
        match timeout(self.reply_timeout, send).await {
            Ok(result) => result.map(|_| true),
            Err(_) => {
                warn!(
                    "HTTP client {peer} took no reply of {} bytes within {:?}, dropping it",
                    bytes.len(),
                    self.reply_timeout
                );
                Ok(false)
            }
        }
    }
}

fn webpage(sample: &Sample) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>thermoclock</title></head>
<body>
<p><a href="./data.csv" download>Download data</a></p>
<p><a href="./delete">Delete data file</a></p>
<p>Temperature is {:.1} &deg;C</p>
<p>Humidity is {:.1} %</p>
<p>Last reading at {}</p>
</body>
</html>
"#,
        sample.temperature,
        sample.humidity,
        sample.timestamp.format("%Y-%m-%d %H:%M:%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("thermoclock-http-{}-{name}.csv", std::process::id()));
        let _ = fs::remove_file(&path);
        path
    }

    fn sample() -> Sample {
        let at = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(18, 30, 0).unwrap();
        Sample::new(at, 19.84, 52.0)
    }

    async fn server() -> Server {
        Server::bind(0).await.unwrap()
    }

    #[tokio::test]
    async fn parses_request_lines() {
        let server = server().await;
        assert_eq!(server.parse("GET / HTTP/1.1\r\nHost: x\r\n\r\n"), Some(("GET", "/")));
        assert_eq!(server.parse("POST /delete HTTP/1.0\r\n"), Some(("POST", "/delete")));
        assert_eq!(server.parse("garbage"), None);
        assert_eq!(server.parse(""), None);
    }

    #[tokio::test]
    async fn serves_routes() {
        let server = server().await;
        let path = scratch("routes");
        let mut log = DataLog::open(&path).unwrap();
        log.append(&sample(), sample().timestamp).unwrap();

        let index = server.respond("GET / HTTP/1.1\r\n\r\n", &mut log, &sample());
        assert_eq!(index.status, 200);
        assert!(String::from_utf8(index.body).unwrap().contains("Temperature is 19.8"));

        let csv = server.respond("GET /data.csv HTTP/1.1\r\n\r\n", &mut log, &sample());
        assert_eq!(csv.status, 200);
        assert_eq!(csv.content_type, "text/csv");
        assert_eq!(csv.body, fs::read(&path).unwrap());

        let missing = server.respond("GET /nope HTTP/1.1\r\n\r\n", &mut log, &sample());
        assert_eq!(missing.status, 404);
        let post = server.respond("POST / HTTP/1.1\r\n\r\n", &mut log, &sample());
        assert_eq!(post.status, 405);
        let bad = server.respond("hello\r\n", &mut log, &sample());
        assert_eq!(bad.status, 400);
        fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn delete_recreates_the_log() {
        let server = server().await;
        let path = scratch("delete");
        let mut log = DataLog::open(&path).unwrap();
        log.append(&sample(), sample().timestamp).unwrap();

        let deleted = server.respond("GET /delete HTTP/1.1\r\n\r\n", &mut log, &sample());
        assert_eq!(deleted.status, 200);
        assert_eq!(fs::read_to_string(&path).unwrap(), "Date,Time,Temperature,Humidity\n");

        fs::remove_file(&path).unwrap();
        let missing = server.respond("GET /delete? HTTP/1.1\r\n\r\n", &mut log, &sample());
        assert_eq!(missing.status, 404);
        assert!(path.exists());
        fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn client_that_never_reads_is_dropped() {
        let mut server = server().await;
        server.reply_timeout = Duration::from_millis(200);
        let port = server.local_addr().unwrap().port();
        let client = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let (mut stream, peer) = server.accept().await.unwrap();

        let body = vec![b'x'; 64 * 1024 * 1024];
        let started = std::time::Instant::now();
        let sent = server.reply(&mut stream, peer, &body).await.unwrap();
        assert!(!sent);
        assert!(started.elapsed() < Duration::from_secs(5));
        drop(client);
    }

    #[tokio::test]
    async fn answers_over_tcp() {
        let server = server().await;
        let port = server.local_addr().unwrap().port();
        let path = scratch("tcp");
        let mut log = DataLog::open(&path).unwrap();

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
            stream.write_all(b"GET /data.csv HTTP/1.1\r\nHost: pico\r\n\r\n").await.unwrap();
            let mut reply = String::new();
            stream.read_to_string(&mut reply).await.unwrap();
            reply
        });
        let (stream, peer) = server.accept().await.unwrap();
        server.serve(stream, peer, &mut log, &sample()).await.unwrap();
        let reply = client.await.unwrap();
        assert!(reply.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(reply.contains("Content-Type: text/csv\r\n"));
        assert!(reply.ends_with("\r\n\r\nDate,Time,Temperature,Humidity\n"));
        fs::remove_file(path).unwrap();
    }
}
