use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_NTP_HOST: &str = "pool.ntp.org";
pub const DEFAULT_UDP_PORT: u16 = 2255;
pub const DEFAULT_BAUD: u32 = 9600;

#[cfg(unix)]
pub const DEFAULT_TTY: &str = "/dev/ttyUSB0";

#[cfg(windows)]
pub const DEFAULT_TTY: &str = "COM1";

/// Where the temperature/humidity readings come from
#[derive(Debug, Clone, PartialEq)]
pub enum SensorSource {
    /// JSON datagrams on a local UDP port
    Udp { port: u16 },
    /// JSON lines on a serial port
    Serial { tty: String, baud: u32 },
    /// Built-in generator, no hardware needed
    Simulate { period: Duration },
}

/// Indicator scale: ideal temperature in the middle of 2*half_width+1 levels
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleSettings {
    pub ideal: f64,
    pub step: f64,
    pub half_width: usize,
    pub clamp_below: f64, // degrees below ideal still told apart
    pub clamp_above: f64, // degrees above ideal still told apart
    pub cells: usize,     // physical cells in the ring
    pub cell_offset: i32, // rotates the lit cell around the ring
    pub brightness: u8,   // peak channel value of the palette
}

impl Default for ScaleSettings {
    fn default() -> Self {
        let half_width = 6;
        let step = 0.5;
        Self {
            ideal: 20.0,
            step,
            half_width,
            clamp_below: half_width as f64 * step,
            clamp_above: half_width as f64 * step,
            cells: 2 * half_width + 1,
            cell_offset: 0,
            brightness: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_file: PathBuf,
    pub tick: Duration,
    pub log_every: u32, // minutes between log rows
    pub backlight_threshold: u16,
    pub restart_hour: u32,
    pub ntp_host: String,
    pub dst: bool,
    pub http_port: Option<u16>,
    pub scale: ScaleSettings,
    pub source: SensorSource,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data.csv"),
            tick: Duration::from_millis(400),
            log_every: 30,
            backlight_threshold: 32000,
            restart_hour: 3,
            ntp_host: DEFAULT_NTP_HOST.into(),
            dst: true,
            http_port: None,
            scale: ScaleSettings::default(),
            source: SensorSource::Udp {
                port: DEFAULT_UDP_PORT,
            },
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let scale = &self.scale;
        for (name, value) in [
            ("ideal temperature", scale.ideal),
            ("step", scale.step),
            ("lower clamp bound", scale.clamp_below),
            ("upper clamp bound", scale.clamp_above),
        ] {
            if !value.is_finite() {
                bail!("Indicator {name} must be a finite number, got {value}");
            }
        }
        if !(scale.step > 0.0) {
            bail!("Indicator step must be positive, got {}", scale.step);
        }
        if scale.half_width == 0 {
            bail!("Indicator half width must be at least 1");
        }
        if scale.clamp_below < 0.0 || scale.clamp_above < 0.0 {
            bail!("Clamp bounds must not be negative");
        }
        if scale.cells == 0 {
            bail!("The indicator ring needs at least one cell");
        }
        if self.log_every == 0 || self.log_every > 60 {
            bail!("Log interval must be 1..=60 minutes, got {}", self.log_every);
        }
        if self.restart_hour > 23 {
            bail!("Restart hour must be 0..=23, got {}", self.restart_hour);
        }
        if self.tick.is_zero() || self.tick >= Duration::from_secs(1) {
            bail!("Tick interval must be shorter than one second, got {:?}", self.tick);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.scale.cells, 13);
        assert_eq!(settings.scale.clamp_below, 3.0);
        assert_eq!(settings.log_every, 30);
    }

    #[test]
    fn rejects_non_finite_scale() {
        let mut settings = Settings::default();
        settings.scale.ideal = f64::NAN;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.scale.step = f64::INFINITY;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.scale.clamp_above = f64::NAN;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.scale.clamp_below = f64::INFINITY;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_bad_values() {
        let mut settings = Settings::default();
        settings.scale.step = 0.0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.log_every = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.tick = Duration::from_secs(2);
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.restart_hour = 24;
        assert!(settings.validate().is_err());
    }
}
