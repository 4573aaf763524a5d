pub mod dst;
pub mod ntp;

use super::Timestamp;
use anyhow::Result;
use chrono::prelude::*;
use chrono::TimeDelta;
use std::time::Duration;
use tracing::{info, warn};

const NTP_TIMEOUT: Duration = Duration::from_secs(1);

/// Source of local wall-clock time
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// System clock corrected by the last NTP answer and shifted to UK local time
#[derive(Debug)]
pub struct NetworkClock {
    correction: TimeDelta, // NTP time minus system time at the last sync
    dst: bool,
    synced: Option<DateTime<Utc>>,
}

impl NetworkClock {
    pub fn new(dst: bool) -> Self {
        Self {
            correction: TimeDelta::zero(),
            dst,
            synced: None,
        }
    }

    pub fn utc(&self) -> DateTime<Utc> {
        Utc::now() + self.correction
    }

    pub fn to_local(&self, utc: DateTime<Utc>) -> Timestamp {
        let local = if self.dst { utc + dst::offset(utc) } else { utc };
        local.naive_utc()
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.synced
    }

    /// Queries the NTP server. On failure the previous correction stays in place.
    pub async fn sync(&mut self, host: &str) -> Result<()> {
        match ntp::query(host, NTP_TIMEOUT).await {
            Ok(server) => {
                self.correction = server - Utc::now();
                self.synced = Some(server);
                info!(
                    "Clock synced with {host}, correction {} ms, local time {}",
                    self.correction.num_milliseconds(),
                    self.now().format("%Y-%m-%d %H:%M:%S")
                );
                Ok(())
            }
            Err(e) => {
                warn!("Time sync with {host} failed, keeping previous clock: {e:#}");
                Err(e)
            }
        }
    }
}

impl Clock for NetworkClock {
    fn now(&self) -> Timestamp {
        self.to_local(self.utc())
    }
}
