use std::fmt;
use tracing::trace;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const OFF: Rgb = Rgb(0, 0, 0);

    pub fn is_off(&self) -> bool {
        *self == Self::OFF
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.0, self.1, self.2)
    }
}

/// Addressable LED ring. Changes are staged until `write`.
pub trait IndicatorDriver {
    fn cells(&self) -> usize;
    fn fill(&mut self, color: Rgb);
    fn set_cell(&mut self, i: usize, color: Rgb);
    fn write(&mut self);
}

/// In-memory ring keeping the staged and the last written colors
#[derive(Debug, Clone)]
pub struct Ring {
    staged: Vec<Rgb>,
    shown: Vec<Rgb>,
    writes: usize,
}

impl Ring {
    pub fn new(cells: usize) -> Self {
        Self {
            staged: vec![Rgb::OFF; cells],
            shown: vec![Rgb::OFF; cells],
            writes: 0,
        }
    }

    pub fn shown(&self) -> &[Rgb] {
        &self.shown
    }

    /// Indices of the cells currently lit
    pub fn lit(&self) -> Vec<usize> {
        self.shown
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_off())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl IndicatorDriver for Ring {
    fn cells(&self) -> usize {
        self.staged.len()
    }

    fn fill(&mut self, color: Rgb) {
        self.staged.iter_mut().for_each(|c| *c = color);
    }

    fn set_cell(&mut self, i: usize, color: Rgb) {
        if let Some(c) = self.staged.get_mut(i) {
            *c = color;
        }
    }

    fn write(&mut self) {
        self.shown.clone_from(&self.staged);
        self.writes += 1;
        trace!(
            "ring {}",
            self.shown
                .iter()
                .map(|c| if c.is_off() { '.' } else { 'o' })
                .collect::<String>()
        );
    }
}
