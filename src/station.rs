// Runs the controller in real time: startup, ticks, animations, HTTP and restarts
use super::clock::{Clock, NetworkClock};
use super::controller::{animation, Controller};
use super::datalog::DataLog;
use super::devices::{DisplayDriver, IndicatorDriver, Ring, Rgb, TextLcd};
use super::sensor::SensorFeed;
use super::server::Server;
use super::settings::Settings;
use super::Sample;
use anyhow::{Context, Result};
use chrono::prelude::*;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, error, info};

const DATE_SCREEN: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Restart,
    Shutdown,
}

/// Long lived resources that survive a restart
pub struct Station {
    settings: Settings,
    feed: SensorFeed,
    server: Option<Server>,
}

impl Station {
    pub async fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let feed = SensorFeed::start(&settings.source, settings.scale.ideal)
            .await
            .context("Starting the sensor feed")?;
        let server = match settings.http_port {
            Some(port) => Some(Server::bind(port).await.context("Binding the HTTP port")?),
            None => None,
        };
        Ok(Self {
            settings,
            feed,
            server,
        })
    }

    /// Runs sessions until `shutdown` completes, starting over on every scheduled restart
    pub async fn run<F: Future>(&mut self, shutdown: F) -> Result<()> {
        tokio::pin!(shutdown);
        loop {
            match self.session(&mut shutdown).await? {
                Exit::Restart => info!("Restarting"),
                Exit::Shutdown => return Ok(()),
            }
        }
    }

    async fn session<F: Future>(&mut self, shutdown: &mut std::pin::Pin<&mut F>) -> Result<Exit> {
        let settings = self.settings.clone();
        let mut clock = NetworkClock::new(settings.dst);
        // On failure sync has logged it and the system clock is used
        clock.sync(&settings.ntp_host).await.ok();

        let datalog = DataLog::open(&settings.data_file)
            .with_context(|| format!("Opening {}", settings.data_file.display()))?;
        let mut lcd = TextLcd::new();
        let mut ring = Ring::new(settings.scale.cells);
        ring.fill(Rgb::OFF);
        ring.write();

        lcd.move_to(0, 0);
        lcd.put_str("Waiting for");
        lcd.move_to(0, 1);
        lcd.put_str("sensor");
        let first = tokio::select! {
            m = self.feed.first() => m?,
            _ = shutdown.as_mut() => return Ok(Exit::Shutdown),
        };
        info!("First reading {:.2} C {:.1}%", first.t, first.rh);

        let now = clock.now();
        show_date(&mut lcd, now);
        info!("{}", lcd.frame());
        sleep(DATE_SCREEN).await;
        lcd.clear();

        let initial = Sample::new(clock.now(), first.t, first.rh);
        let mut controller = Controller::new(&settings, &mut self.feed, lcd, ring, datalog, initial);
        let mut ticker = interval(settings.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut frame = String::new();
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let tick = controller.tick(clock.now());
                    let current = controller.display().frame();
                    if current != frame {
                        debug!("lcd [{current}]");
                        frame = current;
                    }
                    if let Some(animation) = tick.animation {
                        animation::play(controller.ring_mut(), &animation).await;
                    }
                    if tick.restart {
                        return Ok(Exit::Restart);
                    }
                }
                accepted = accept(self.server.as_ref()) => {
                    let server = self.server.as_ref().context("HTTP server gone")?;
                    match accepted {
                        Ok((stream, peer)) => {
                            let sample = *controller.sample();
                            if let Err(e) = server.serve(stream, peer, controller.datalog_mut(), &sample).await {
                                error!("HTTP client {peer}: {e:#}");
                            }
                        }
                        Err(e) => error!("HTTP accept failed: {e}"),
                    }
                }
                _ = shutdown.as_mut() => {
                    info!("Shutting down");
                    return Ok(Exit::Shutdown);
                }
            }
        }
    }
}

async fn accept(
    server: Option<&Server>,
) -> std::io::Result<(tokio::net::TcpStream, std::net::SocketAddr)> {
    match server {
        Some(s) => s.accept().await,
        None => std::future::pending().await,
    }
}

pub fn show_date<D: DisplayDriver>(lcd: &mut D, now: NaiveDateTime) {
    lcd.clear();
    lcd.move_to(6, 0);
    lcd.put_str("Date");
    lcd.move_to(4, 1);
    lcd.put_str(&format!("{}-{}-{}", now.day(), now.month(), now.year()));
}
