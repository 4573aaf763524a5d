//! The display and logging state machine.
//!
//! A `Controller` owns the sensor, the display and the indicator ring and is
//! advanced by calling [`Controller::tick`] with the current local time. Each
//! minute alternates between 10 s of temperature extremes and 10 s of clock.

pub mod animation;
pub mod extremes;
pub mod scale;

use super::datalog::DataLog;
use super::devices::{DisplayDriver, IndicatorDriver, Rgb};
use super::sensor::SensorReader;
use super::settings::Settings;
use super::{round, Sample, Timestamp};
use animation::Animation;
use chrono::prelude::*;
use extremes::DailyExtremes;
use scale::{Clamp, Scale};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    ShowingTime,
    ShowingTemperatureExtremes,
}

/// Screen shown during a given second of the minute
pub fn phase(second: u32) -> DisplayState {
    if second % 20 < 10 {
        DisplayState::ShowingTemperatureExtremes
    } else {
        DisplayState::ShowingTime
    }
}

/// What the caller has to do after a tick
#[derive(Debug, Default)]
pub struct Tick {
    pub animation: Option<Animation>,
    pub restart: bool,
    pub logged: bool,
}

pub struct Controller<S, D, I> {
    sensor: S,
    display: D,
    ring: I,
    datalog: DataLog,
    scale: Scale,
    cell_offset: i32,
    log_every: u32,
    backlight_threshold: u16,
    restart_hour: u32,
    state: Option<DisplayState>,
    extremes: DailyExtremes,
    sample: Sample,
    sensor_fault: bool,
    clamp: Option<Clamp>,
    last_hour_mark: Option<(NaiveDate, u32)>,
}

impl<S, D, I> Controller<S, D, I>
where
    S: SensorReader,
    D: DisplayDriver,
    I: IndicatorDriver,
{
    pub fn new(
        settings: &Settings,
        sensor: S,
        display: D,
        ring: I,
        datalog: DataLog,
        initial: Sample,
    ) -> Self {
        let start = initial.timestamp;
        // Starting right on an hour boundary must not replay it
        let last_hour_mark = if start.minute() == 0 && start.second() == 0 {
            Some((start.date(), start.hour()))
        } else {
            None
        };
        let scale = Scale::new(&settings.scale);
        for (t, level) in scale.entries() {
            debug!("Indicator level {level:2} <- {t:.1} C");
        }
        Self {
            sensor,
            display,
            ring,
            datalog,
            scale,
            cell_offset: settings.scale.cell_offset,
            log_every: settings.log_every,
            backlight_threshold: settings.backlight_threshold,
            restart_hour: settings.restart_hour,
            state: None,
            extremes: DailyExtremes::new(start.date(), initial.temperature),
            sample: initial,
            sensor_fault: false,
            clamp: None,
            last_hour_mark,
        }
    }

    pub fn tick(&mut self, now: Timestamp) -> Tick {
        let mut tick = Tick::default();
        self.update_backlight();
        match phase(now.second()) {
            DisplayState::ShowingTemperatureExtremes => self.show_extremes(now),
            DisplayState::ShowingTime => self.show_time(now),
        }
        let level = self.show_level();

        if now.second() == 0 && now.minute() % self.log_every == 0 {
            tick.logged = self.write_log(now);
        }

        if now.minute() == 0 && now.second() == 0 {
            let mark = (now.date(), now.hour());
            if self.last_hour_mark != Some(mark) {
                self.last_hour_mark = Some(mark);
                tick.animation = self.on_the_hour(now.hour(), level);
                if now.hour() == self.restart_hour {
                    info!("Scheduled restart at {:02}:00", now.hour());
                    tick.restart = true;
                }
            }
        }
        tick
    }

    fn update_backlight(&mut self) {
        match self.sensor.light_level() {
            Some(level) if level < self.backlight_threshold => self.display.backlight_off(),
            _ => self.display.backlight_on(),
        }
    }

    fn refresh_sample(&mut self, now: Timestamp) {
        match self.sensor.measurements() {
            Ok(m) => {
                if self.sensor_fault {
                    info!("Sensor readings are back");
                }
                self.sensor_fault = false;
                self.sample = Sample::new(now, m.t, m.rh);
            }
            Err(e) => {
                if !self.sensor_fault {
                    warn!("Sensor read failed, holding the last sample: {e:#}");
                }
                self.sensor_fault = true;
            }
        }
    }

    fn show_extremes(&mut self, now: Timestamp) {
        self.refresh_sample(now);
        let previous_day = self.extremes.day;
        self.extremes = self.extremes.update(now.date(), self.sample.temperature);
        let new_day = self.extremes.day != previous_day;
        if new_day {
            info!(
                "New day {}, extremes reset to {:.1}",
                self.extremes.day, self.extremes.low
            );
        }
        let current = format!("{:.1}", round(self.sample.temperature, 1));
        if self.state != Some(DisplayState::ShowingTemperatureExtremes) || new_day {
            self.state = Some(DisplayState::ShowingTemperatureExtremes);
            self.display.clear();
            self.display.put_str("Current:");
            self.display.move_to(0, 1);
            self.display.put_str("L:       H:");
            self.display.move_to(3, 1);
            self.display.put_str(&format!("{:.1}", self.extremes.low));
            self.display.move_to(12, 1);
            self.display.put_str(&format!("{:.1}", self.extremes.high));
        }
        self.display.move_to(12, 0);
        self.display.put_str(&format!("{current:<4}"));
        debug!(
            "{} temperature {:.2} humidity {:.1}% low {:.1} high {:.1}",
            now.format("%H:%M:%S"),
            self.sample.temperature,
            self.sample.humidity,
            self.extremes.low,
            self.extremes.high
        );
    }

    fn show_time(&mut self, now: Timestamp) {
        if self.state != Some(DisplayState::ShowingTime) {
            self.state = Some(DisplayState::ShowingTime);
            self.display.clear();
        }
        self.display.move_to(6, 0);
        self.display.put_str("Time");
        self.display.move_to(4, 1);
        self.display.put_str(&now.format("%H:%M:%S").to_string());
    }

    fn show_level(&mut self) -> usize {
        let t = self.sample.temperature;
        let clamp = self.scale.clamped(t);
        if clamp != self.clamp {
            match clamp {
                Some(Clamp::Low) => warn!("*** Temperature very low *** ({t:.1})"),
                Some(Clamp::High) => warn!("*** Temperature very high *** ({t:.1})"),
                None => info!("Temperature back in range ({t:.1})"),
            }
            self.clamp = clamp;
        }
        let level = self.scale.level(t);
        let cell = scale::cell(level, self.cell_offset, self.ring.cells());
        self.ring.fill(Rgb::OFF);
        self.ring.set_cell(cell, self.scale.color(level));
        self.ring.write();
        level
    }

    fn write_log(&mut self, now: Timestamp) -> bool {
        match self.datalog.append(&self.sample, now) {
            Ok(written) => written,
            Err(e) => {
                error!("Writing {} failed: {e}", self.datalog.path().display());
                false
            }
        }
    }

    fn on_the_hour(&mut self, hour: u32, level: usize) -> Option<Animation> {
        let cells = self.ring.cells();
        let color = self.scale.color(level);
        let mut animation = Animation::default();
        if hour % 12 == 0 {
            animation = animation.then(Animation::sweep(cells, color));
        }
        animation = animation.then(Animation::pulse(cells, color, hour % 12));
        if animation.is_empty() {
            return None;
        }
        let cell = scale::cell(level, self.cell_offset, cells);
        Some(animation.rest_on(cells, cell, color))
    }

    pub fn state(&self) -> Option<DisplayState> {
        self.state
    }

    pub fn extremes(&self) -> DailyExtremes {
        self.extremes
    }

    pub fn sample(&self) -> &Sample {
        &self.sample
    }

    pub fn sensor_fault(&self) -> bool {
        self.sensor_fault
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn ring(&self) -> &I {
        &self.ring
    }

    pub fn ring_mut(&mut self) -> &mut I {
        &mut self.ring
    }

    pub fn datalog(&self) -> &DataLog {
        &self.datalog
    }

    pub fn datalog_mut(&mut self) -> &mut DataLog {
        &mut self.datalog
    }

    pub fn into_parts(self) -> (S, D, I, DataLog) {
        (self.sensor, self.display, self.ring, self.datalog)
    }
}
