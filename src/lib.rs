pub mod clock;
pub mod controller;
pub mod datalog;
pub mod devices;
pub mod sensor;
pub mod server;
pub mod settings;
pub mod station;

use chrono::prelude::*;

// Local wall-clock time, already DST adjusted by the clock source
pub type Timestamp = NaiveDateTime;

/// One temperature/humidity reading stamped with the local time it was taken
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: Timestamp,
    pub temperature: f64,
    pub humidity: f64,
}

impl Sample {
    pub fn new(timestamp: Timestamp, temperature: f64, humidity: f64) -> Self {
        Self {
            timestamp,
            temperature,
            humidity,
        }
    }
}

/// Rounds to the given number of decimal places
pub fn round(x: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (x * factor).round() / factor
}
