use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use thermoclock::settings::{
    ScaleSettings, SensorSource, Settings, DEFAULT_BAUD, DEFAULT_NTP_HOST, DEFAULT_TTY,
    DEFAULT_UDP_PORT,
};
use std::time::Duration;

pub fn parse() -> Cli {
    Cli::parse()
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Turn console debugging information on
    #[arg(short, long)]
    pub console: bool,

    /// Log to a file
    #[arg(short, long, value_name = "FILE", default_value = "thermoclock.log")]
    pub log_file: PathBuf,

    /// Verbosity: -v info, -vv debug, -vvv trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// CSV file the readings are appended to
    #[arg(short, long, value_name = "FILE", env = "THERMOCLOCK_DATA", default_value = "data.csv")]
    pub data_file: PathBuf,

    /// Serve the data file over HTTP on this port
    #[arg(long, value_name = "PORT", env = "THERMOCLOCK_HTTP_PORT")]
    pub http_port: Option<u16>,

    /// NTP server used to set the clock, a host name or ip:port
    #[arg(long, env = "NTP_HOST", default_value = DEFAULT_NTP_HOST)]
    pub ntp_host: String,

    /// Don't apply UK daylight saving time
    #[arg(long)]
    pub no_dst: bool,

    /// Minutes between rows written to the data file
    #[arg(long, value_name = "MINUTES", default_value_t = 30)]
    pub log_every: u32,

    /// Milliseconds between loop iterations
    #[arg(long, value_name = "MS", default_value_t = 400)]
    pub tick_ms: u64,

    /// Light level below which the display backlight is switched off
    #[arg(long, default_value_t = 32000)]
    pub backlight_threshold: u16,

    /// Hour of the day of the scheduled restart
    #[arg(long, default_value_t = 3)]
    pub restart_hour: u32,

    #[command(flatten)]
    pub scale: Scale,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct Scale {
    /// Temperature shown by the middle indicator level
    #[arg(long, default_value_t = 20.0)]
    pub ideal_temp: f64,

    /// Degrees per indicator level
    #[arg(long, default_value_t = 0.5)]
    pub step: f64,

    /// Indicator levels on each side of the ideal temperature
    #[arg(long, default_value_t = 6)]
    pub half_width: usize,

    /// Degrees below ideal still told apart (defaults to the whole scale)
    #[arg(long)]
    pub clamp_below: Option<f64>,

    /// Degrees above ideal still told apart (defaults to the whole scale)
    #[arg(long)]
    pub clamp_above: Option<f64>,

    /// Cells in the LED ring (defaults to one per level)
    #[arg(long)]
    pub cells: Option<usize>,

    /// Rotates the lit cell around the ring
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub cell_offset: i32,

    /// Peak LED channel value
    #[arg(long, default_value_t = 10)]
    pub brightness: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sensor readings arrive as JSON datagrams
    Udp {
        /// Local UDP port
        #[arg(short, long, default_value_t = DEFAULT_UDP_PORT)]
        port: u16,
    },

    /// Sensor readings arrive as JSON lines on a serial port
    Serial {
        /// Serial device
        #[arg(short, long, default_value = DEFAULT_TTY)]
        tty: String,

        /// Baud rate
        #[arg(short, long, default_value_t = DEFAULT_BAUD)]
        baud: u32,
    },

    /// Generate readings, no sensor needed
    Simulate {
        /// Seconds between generated readings
        #[arg(short, long, default_value_t = 2)]
        period: u64,
    },
}

impl Cli {
    pub fn settings(&self) -> Settings {
        let span = self.scale.half_width as f64 * self.scale.step;
        let source = match &self.command {
            Commands::Udp { port } => SensorSource::Udp { port: *port },
            Commands::Serial { tty, baud } => SensorSource::Serial {
                tty: tty.clone(),
                baud: *baud,
            },
            Commands::Simulate { period } => SensorSource::Simulate {
                period: Duration::from_secs(*period),
            },
        };
        Settings {
            data_file: self.data_file.clone(),
            tick: Duration::from_millis(self.tick_ms),
            log_every: self.log_every,
            backlight_threshold: self.backlight_threshold,
            restart_hour: self.restart_hour,
            ntp_host: self.ntp_host.clone(),
            dst: !self.no_dst,
            http_port: self.http_port,
            scale: ScaleSettings {
                ideal: self.scale.ideal_temp,
                step: self.scale.step,
                half_width: self.scale.half_width,
                clamp_below: self.scale.clamp_below.unwrap_or(span),
                clamp_above: self.scale.clamp_above.unwrap_or(span),
                cells: self.scale.cells.unwrap_or(2 * self.scale.half_width + 1),
                cell_offset: self.scale.cell_offset,
                brightness: self.scale.brightness,
            },
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_library_settings() {
        let cli = Cli::try_parse_from(["thermoclock", "simulate"]).unwrap();
        let settings = cli.settings();
        let defaults = Settings::default();
        assert_eq!(settings.scale, defaults.scale);
        assert_eq!(settings.tick, defaults.tick);
        assert_eq!(settings.log_every, defaults.log_every);
        assert_eq!(settings.source, SensorSource::Simulate { period: Duration::from_secs(2) });
    }

    #[test]
    fn nan_ideal_temperature_fails_validation() {
        let cli = Cli::try_parse_from(["thermoclock", "--ideal-temp", "NaN", "simulate"]).unwrap();
        assert!(cli.scale.ideal_temp.is_nan());
        assert!(cli.settings().validate().is_err());
    }

    #[test]
    fn scale_options() {
        let cli = Cli::try_parse_from([
            "thermoclock",
            "--half-width",
            "10",
            "--clamp-below",
            "5",
            "--cells",
            "12",
            "--cell-offset",
            "-4",
            "udp",
            "--port",
            "3000",
        ])
        .unwrap();
        let settings = cli.settings();
        assert_eq!(settings.scale.half_width, 10);
        assert_eq!(settings.scale.clamp_below, 5.0);
        assert_eq!(settings.scale.clamp_above, 5.0);
        assert_eq!(settings.scale.cells, 12);
        assert_eq!(settings.scale.cell_offset, -4);
        assert_eq!(settings.source, SensorSource::Udp { port: 3000 });
    }
}
