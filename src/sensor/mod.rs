pub mod payload;
pub mod transport;

use super::settings::SensorSource;
use anyhow::{bail, Result};
pub use payload::Measurement;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use transport::serial;
use transport::udp;
use transport::Transport;

/// Readings older than this are not trusted
pub const MAX_AGE: Duration = Duration::from_secs(60);

/// Supplies the latest temperature/humidity measurement on demand
pub trait SensorReader {
    fn measurements(&mut self) -> Result<Measurement>;

    /// Ambient light or knob level over the full 16 bit range, if the board has one
    fn light_level(&mut self) -> Option<u16> {
        None
    }
}

impl<T: SensorReader + ?Sized> SensorReader for &mut T {
    fn measurements(&mut self) -> Result<Measurement> {
        (**self).measurements()
    }

    fn light_level(&mut self) -> Option<u16> {
        (**self).light_level()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Reading {
    pub measurement: Measurement,
    pub received: Instant,
}

type Latest = Option<Reading>;

/// Background sensor task publishing its latest reading
pub struct SensorFeed {
    latest: watch::Receiver<Latest>,
    max_age: Duration,
    task: JoinHandle<()>,
}

impl SensorFeed {
    pub async fn start(source: &SensorSource, ideal: f64) -> Result<Self> {
        let (tx, rx) = watch::channel(None);
        let task = match source {
            SensorSource::Udp { port } => {
                let t = udp::Transport::new(*port).await?;
                info!("Listening for sensor readings on UDP port {}", t.local_port()?);
                tokio::spawn(transport_task(Transport::Udp(t), tx))
            }
            SensorSource::Serial { tty, baud } => {
                let t = serial::Transport::new(tty, *baud)?;
                info!("Reading sensor on {tty} at {baud} baud");
                tokio::spawn(transport_task(Transport::Serial(t), tx))
            }
            SensorSource::Simulate { period } => {
                info!("Simulating sensor readings every {period:?}");
                tokio::spawn(simulate_task(*period, ideal, tx))
            }
        };
        Ok(Self {
            latest: rx,
            max_age: MAX_AGE,
            task,
        })
    }

    /// Waits until the first reading has arrived
    pub async fn first(&mut self) -> Result<Measurement> {
        let reading = self.latest.wait_for(|r| r.is_some()).await?;
        match *reading {
            Some(r) => Ok(r.measurement),
            None => bail!("Sensor feed closed"),
        }
    }

    pub fn latest(&self) -> Latest {
        *self.latest.borrow()
    }
}

impl SensorReader for SensorFeed {
    fn measurements(&mut self) -> Result<Measurement> {
        let reading = match self.latest() {
            Some(r) => r,
            None => bail!("No sensor reading received yet"),
        };
        let age = reading.received.elapsed();
        if age > self.max_age {
            bail!("Latest sensor reading is {}s old", age.as_secs());
        }
        Ok(reading.measurement)
    }

    fn light_level(&mut self) -> Option<u16> {
        self.latest().and_then(|r| r.measurement.light)
    }
}

impl Drop for SensorFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn transport_task(mut transport: Transport, tx: watch::Sender<Latest>) {
    loop {
        let line = match transport.reading().await {
            Ok(line) => line,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                error!("Sensor transport closed: {e}");
                return;
            }
            Err(e) => {
                warn!("Sensor transport error: {e}");
                continue;
            }
        };
        match payload::decode(&line) {
            Ok(measurement) => {
                debug!("{measurement:?}");
                tx.send_replace(Some(Reading {
                    measurement,
                    received: Instant::now(),
                }));
            }
            Err(e) => warn!("{e:#}"),
        }
    }
}

/// Slow oscillation around the ideal temperature, one full swing per hour
pub fn simulated(elapsed: Duration, ideal: f64) -> Measurement {
    let phase = elapsed.as_secs_f64() / 3600.0 * std::f64::consts::TAU;
    Measurement::new(ideal + 3.5 * phase.sin(), 50.0 + 10.0 * phase.cos())
}

async fn simulate_task(period: Duration, ideal: f64, tx: watch::Sender<Latest>) {
    let begin = Instant::now();
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        let measurement = simulated(begin.elapsed(), ideal);
        tx.send_replace(Some(Reading {
            measurement,
            received: Instant::now(),
        }));
    }
}
