use crate::devices::Rgb;
use crate::settings::ScaleSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clamp {
    Low,
    High,
}

/// Quantization of temperatures into indicator levels `0..=2*half_width`,
/// the ideal temperature sitting on the middle level.
#[derive(Debug, Clone)]
pub struct Scale {
    ideal: f64,
    step: f64,
    half_width: usize,
    min: f64,
    max: f64,
    palette: Vec<Rgb>,
}

impl Scale {
    pub fn new(settings: &ScaleSettings) -> Self {
        let span = settings.half_width as f64 * settings.step;
        Self {
            ideal: settings.ideal,
            step: settings.step,
            half_width: settings.half_width,
            min: settings.ideal - settings.clamp_below.min(span),
            max: settings.ideal + settings.clamp_above.min(span),
            palette: palette(2 * settings.half_width + 1, settings.brightness),
        }
    }

    pub fn levels(&self) -> usize {
        2 * self.half_width + 1
    }

    /// Which side of the range `t` was clamped to, if any
    pub fn clamped(&self, t: f64) -> Option<Clamp> {
        if t < self.min {
            Some(Clamp::Low)
        } else if t > self.max {
            Some(Clamp::High)
        } else {
            None
        }
    }

    pub fn level(&self, t: f64) -> usize {
        let t = t.clamp(self.min, self.max);
        let offset = ((t - self.ideal) / self.step).round_ties_even() as i64 + self.half_width as i64;
        offset.clamp(0, 2 * self.half_width as i64) as usize
    }

    pub fn color(&self, level: usize) -> Rgb {
        self.palette[level.min(self.palette.len() - 1)]
    }

    /// The quantized temperature of every level, coldest first
    pub fn entries(&self) -> impl Iterator<Item = (f64, usize)> + '_ {
        (0..self.levels()).map(move |i| {
            (
                self.ideal + (i as f64 - self.half_width as f64) * self.step,
                i,
            )
        })
    }
}

/// Blue through green to red in `n` steps, `peak` being the brightest channel value
pub fn palette(n: usize, peak: u8) -> Vec<Rgb> {
    let peak = peak as f64;
    let scale = |f: f64| (f * peak).round() as u8;
    (0..n)
        .map(|i| {
            let pos = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.5 };
            if pos <= 0.5 {
                let f = pos * 2.0;
                Rgb(0, scale(f), scale(1.0 - f))
            } else {
                let f = (pos - 0.5) * 2.0;
                Rgb(scale(f), scale(1.0 - f), 0)
            }
        })
        .collect()
}

/// Physical ring cell showing `level`
pub fn cell(level: usize, offset: i32, cells: usize) -> usize {
    (level as i64 + offset as i64).rem_euclid(cells as i64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_scale() -> Scale {
        Scale::new(&ScaleSettings::default())
    }

    #[test]
    fn ideal_is_the_middle_level() {
        let scale = default_scale();
        assert_eq!(scale.levels(), 13);
        assert_eq!(scale.level(20.0), 6);
        assert_eq!(scale.level(20.5), 7);
        assert_eq!(scale.level(19.4), 5);
    }

    #[test]
    fn half_steps_round_to_even_levels() {
        let scale = default_scale();
        assert_eq!(scale.level(20.25), 6);
        assert_eq!(scale.level(20.75), 8);
        assert_eq!(scale.level(19.75), 6);
        assert_eq!(scale.level(19.25), 4);
    }

    #[test]
    fn out_of_range_clamps_to_the_ends() {
        let scale = default_scale();
        assert_eq!(scale.level(23.0), 12);
        assert_eq!(scale.level(16.0), 0);
        assert_eq!(scale.level(45.0), 12);
        assert_eq!(scale.level(-10.0), 0);
        assert_eq!(scale.clamped(16.0), Some(Clamp::Low));
        assert_eq!(scale.clamped(23.5), Some(Clamp::High));
        assert_eq!(scale.clamped(21.0), None);
    }

    #[test]
    fn levels_are_monotonic_and_bounded() {
        let scale = default_scale();
        let mut previous = 0;
        let mut t = 10.0;
        while t < 30.0 {
            let level = scale.level(t);
            assert!(level >= previous);
            assert!(level <= 12);
            previous = level;
            t += 0.05;
        }
    }

    #[test]
    fn narrower_clamp_bounds() {
        let settings = ScaleSettings {
            half_width: 10,
            clamp_below: 2.5,
            clamp_above: 2.5,
            cells: 21,
            ..ScaleSettings::default()
        };
        let scale = Scale::new(&settings);
        assert_eq!(scale.levels(), 21);
        assert_eq!(scale.level(20.0), 10);
        assert_eq!(scale.level(30.0), 15);
        assert_eq!(scale.level(10.0), 5);
    }

    #[test]
    fn entries_cover_the_scale() {
        let entries: Vec<_> = default_scale().entries().collect();
        assert_eq!(entries.len(), 13);
        assert_eq!(entries[0], (17.0, 0));
        assert_eq!(entries[6], (20.0, 6));
        assert_eq!(entries[12], (23.0, 12));
    }

    #[test]
    fn palette_runs_blue_green_red() {
        let colors = palette(13, 10);
        assert_eq!(colors.len(), 13);
        assert_eq!(colors[0], Rgb(0, 0, 10));
        assert_eq!(colors[6], Rgb(0, 10, 0));
        assert_eq!(colors[12], Rgb(10, 0, 0));
        assert!(colors.iter().all(|c| !c.is_off()));
    }

    #[test]
    fn cell_offset_wraps_around() {
        assert_eq!(cell(6, 0, 13), 6);
        assert_eq!(cell(2, -4, 12), 10);
        assert_eq!(cell(11, 3, 12), 2);
    }
}
