// JSON parsing stuff
use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// What a sensor board sends: {"t": 21.4, "rh": 48.2, "light": 41000}
#[derive(Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    pub t: f64,
    pub rh: f64,
    #[serde(default)]
    pub light: Option<u16>,
}

impl Measurement {
    pub fn new(t: f64, rh: f64) -> Self {
        Self { t, rh, light: None }
    }
}

pub fn decode(line: &str) -> Result<Measurement> {
    let m: Measurement =
        serde_json::from_str(line).with_context(|| format!("Invalid sensor payload {line:?}"))?;
    if !m.t.is_finite() || !m.rh.is_finite() {
        bail!("Sensor payload with non finite values {line:?}");
    }
    if !(0.0..=100.0).contains(&m.rh) {
        bail!("Relative humidity out of range in {line:?}");
    }
    Ok(m)
}
