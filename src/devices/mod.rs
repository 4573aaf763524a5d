pub mod display;
pub mod indicator;

pub use display::{DisplayDriver, TextLcd};
pub use indicator::{IndicatorDriver, Rgb, Ring};
