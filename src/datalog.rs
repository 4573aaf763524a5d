use super::{round, Sample, Timestamp};
use csv::{ReaderBuilder, Terminator, WriterBuilder};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const HEADER: &str = "Date,Time,Temperature,Humidity";
const COLUMNS: [&str; 4] = ["Date", "Time", "Temperature", "Humidity"];
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// The dedup key of a log row
pub fn key(at: &Timestamp) -> String {
    format!("{},{}", at.format(DATE_FORMAT), at.format(TIME_FORMAT))
}

/// Append-only CSV of readings, skipping rows whose timestamp was just written
#[derive(Debug)]
pub struct DataLog {
    path: PathBuf,
    last_key: Option<String>,
}

impl DataLog {
    /// Opens the log, rewriting it with a fresh header when missing, empty,
    /// unreadable or headed by anything else. A torn last row is dropped.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let last_key = match fs::read(&path) {
            Ok(bytes) => {
                let rows = complete_rows(&bytes);
                if rows.len() < bytes.len() {
                    warn!(
                        "{} ends in a partial row, dropping {} bytes",
                        path.display(),
                        bytes.len() - rows.len()
                    );
                    OpenOptions::new()
                        .write(true)
                        .open(&path)?
                        .set_len(rows.len() as u64)?;
                }
                match scan(rows) {
                    Ok(Some(last_key)) => last_key,
                    Ok(None) => {
                        warn!("{} has no valid header, starting a new log", path.display());
                        create(&path)?;
                        None
                    }
                    Err(e) => {
                        warn!("Unreadable data log {}: {e}, starting a new one", path.display());
                        create(&path)?;
                        None
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Creating data log {}", path.display());
                create(&path)?;
                None
            }
            Err(e) => {
                warn!("Unreadable data log {}: {e}, starting a new one", path.display());
                create(&path)?;
                None
            }
        };
        debug!("Data log {} last key {:?}", path.display(), last_key);
        Ok(Self { path, last_key })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_key(&self) -> Option<&str> {
        self.last_key.as_deref()
    }

    /// Writes one row for `sample` stamped `at`. Returns false for a repeated key.
    pub fn append(&mut self, sample: &Sample, at: Timestamp) -> io::Result<bool> {
        let key = key(&at);
        if self.last_key.as_deref() == Some(key.as_str()) {
            debug!("Skipping duplicate log row {key}");
            return Ok(false);
        }
        let file = OpenOptions::new().append(true).create(true).open(&self.path)?;
        let mut writer = writer(file);
        writer.write_record([
            at.format(DATE_FORMAT).to_string(),
            at.format(TIME_FORMAT).to_string(),
            format!("{:.2}", round(sample.temperature, 2)),
            format!("{:.1}", round(sample.humidity, 1)),
        ])?;
        writer.flush()?;
        info!("Information written at {key}");
        self.last_key = Some(key);
        Ok(true)
    }

    pub fn contents(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }

    /// Removes the log and starts a new one. Returns whether there was a file to remove.
    pub fn reset(&mut self) -> io::Result<bool> {
        let existed = match fs::remove_file(&self.path) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(e),
        };
        create(&self.path)?;
        self.last_key = None;
        warn!("Data log {} deleted and recreated", self.path.display());
        Ok(existed)
    }
}

fn writer(file: File) -> csv::Writer<File> {
    WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(file)
}

fn create(path: &Path) -> io::Result<()> {
    let mut writer = writer(File::create(path)?);
    writer.write_record(COLUMNS)?;
    writer.flush()
}

// Everything up to and including the last newline
fn complete_rows(bytes: &[u8]) -> &[u8] {
    match bytes.iter().rposition(|b| *b == b'\n') {
        Some(end) => &bytes[..=end],
        None => &[],
    }
}

// Ok(None) for a bad header, Ok(Some(key)) otherwise
fn scan(rows: &[u8]) -> csv::Result<Option<Option<String>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(rows);
    let mut records = reader.records();
    let header = match records.next() {
        Some(record) => record?,
        None => return Ok(None),
    };
    if !header.iter().eq(COLUMNS) {
        return Ok(None);
    }
    let mut last = None;
    for record in records {
        let record = record?;
        if let (Some(date), Some(time)) = (record.get(0), record.get(1)) {
            last = Some(format!("{date},{time}"));
        }
    }
    Ok(Some(last))
}
