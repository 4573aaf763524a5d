use crate::devices::{IndicatorDriver, Rgb};
use std::time::Duration;
use tokio::time::sleep;

pub const SWEEP_STEP: Duration = Duration::from_millis(50);
pub const PULSE_ON: Duration = Duration::from_millis(300);
pub const PULSE_OFF: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub cells: Vec<Rgb>,
    pub hold: Duration,
}

impl Frame {
    fn dark(cells: usize, hold: Duration) -> Self {
        Self {
            cells: vec![Rgb::OFF; cells],
            hold,
        }
    }

    fn single(cells: usize, i: usize, color: Rgb, hold: Duration) -> Self {
        let mut frame = Self::dark(cells, hold);
        frame.cells[i] = color;
        frame
    }

    fn full(cells: usize, color: Rgb, hold: Duration) -> Self {
        Self {
            cells: vec![color; cells],
            hold,
        }
    }
}

/// Indicator frames played back to back, the last one left on the ring
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Animation {
    pub frames: Vec<Frame>,
}

impl Animation {
    /// One lit cell chasing around the ring, `cells` times over
    pub fn sweep(cells: usize, color: Rgb) -> Self {
        let mut frames = Vec::with_capacity(cells * cells + 1);
        for _ in 0..cells {
            for i in 0..cells {
                frames.push(Frame::single(cells, i, color, SWEEP_STEP));
            }
        }
        frames.push(Frame::dark(cells, Duration::ZERO));
        Self { frames }
    }

    /// The whole ring flashing `count` times
    pub fn pulse(cells: usize, color: Rgb, count: u32) -> Self {
        let mut frames = Vec::with_capacity(2 * count as usize);
        for _ in 0..count {
            frames.push(Frame::full(cells, color, PULSE_ON));
            frames.push(Frame::dark(cells, PULSE_OFF));
        }
        Self { frames }
    }

    pub fn then(mut self, other: Animation) -> Self {
        self.frames.extend(other.frames);
        self
    }

    /// Ends on a static frame with `i` lit
    pub fn rest_on(mut self, cells: usize, i: usize, color: Rgb) -> Self {
        self.frames.push(Frame::single(cells, i, color, Duration::ZERO));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn duration(&self) -> Duration {
        self.frames.iter().map(|f| f.hold).sum()
    }

    pub fn pulses(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| f.hold == PULSE_ON && f.cells.iter().all(|c| !c.is_off()))
            .count()
    }
}

pub async fn play<I: IndicatorDriver>(ring: &mut I, animation: &Animation) {
    for frame in animation.frames.iter() {
        ring.fill(Rgb::OFF);
        for (i, color) in frame.cells.iter().enumerate() {
            if !color.is_off() {
                ring.set_cell(i, *color);
            }
        }
        ring.write();
        if !frame.hold.is_zero() {
            sleep(frame.hold).await;
        }
    }
}
