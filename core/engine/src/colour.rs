use chrono::{Duration, NaiveDate};
use serde::{Serialize, Serializer};
use std::fmt;

/// An RGB triple. Channels are signed: scales extrapolate outside their
/// declared range and may land outside `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub i32, pub i32, pub i32);

impl Rgb {
    pub const YELLOW: Rgb = Rgb(255, 255, 0);
    pub const GREEN: Rgb = Rgb(87, 187, 138);
    pub const RED: Rgb = Rgb(230, 124, 115);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const DANDELION: Rgb = Rgb(255, 214, 102);
    pub const GREY_UNKNOWN: Rgb = Rgb(217, 217, 217);
    pub const GREY_NOT_IN_USE: Rgb = Rgb(183, 183, 183);
}

/// A display colour: an RGB value, or transparent for absent values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Colour {
    Rgb(Rgb),
    #[default]
    Transparent,
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Colour::Rgb(Rgb(r, g, b)) => write!(f, "rgb({}, {}, {})", r, g, b),
            Colour::Transparent => write!(f, "transparent"),
        }
    }
}

impl Serialize for Colour {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<Rgb> for Colour {
    fn from(value: Rgb) -> Self {
        Colour::Rgb(value)
    }
}

/// A value type a colour scale can span.
pub trait ScaleDomain: Copy + PartialOrd {
    /// Signed distance from `origin` to `self`, in the domain's natural unit.
    fn offset_from(&self, origin: &Self) -> f64;

    fn is_nan(&self) -> bool {
        false
    }
}

impl ScaleDomain for f64 {
    fn offset_from(&self, origin: &Self) -> f64 {
        self - origin
    }

    fn is_nan(&self) -> bool {
        f64::is_nan(*self)
    }
}

impl ScaleDomain for i64 {
    fn offset_from(&self, origin: &Self) -> f64 {
        (*self - *origin) as f64
    }
}

impl ScaleDomain for NaiveDate {
    fn offset_from(&self, origin: &Self) -> f64 {
        (*self - *origin).num_days() as f64
    }
}

impl ScaleDomain for Duration {
    fn offset_from(&self, origin: &Self) -> f64 {
        (*self - *origin).num_milliseconds() as f64 / 1000.0
    }
}

/// Linear interpolation between two colours over `start..end`.
///
/// The ratio is not clamped, so values outside the range extrapolate. A
/// zero-width range maps everything to the start colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColourScale<T> {
    pub start_value: T,
    pub end_value: T,
    pub start_colour: Rgb,
    pub end_colour: Rgb,
}

impl<T: ScaleDomain> ColourScale<T> {
    pub fn new(start_value: T, end_value: T, start_colour: Rgb, end_colour: Rgb) -> Self {
        Self {
            start_value,
            end_value,
            start_colour,
            end_colour,
        }
    }

    /// Colour for an optional value; `None` is transparent.
    pub fn colour_for(&self, value: Option<T>) -> Colour {
        match value {
            Some(value) => self.colour_for_value(value),
            None => Colour::Transparent,
        }
    }

    pub fn colour_for_value(&self, value: T) -> Colour {
        if value.is_nan() {
            return Colour::Rgb(Rgb::GREY_UNKNOWN);
        }
        let width = self.end_value.offset_from(&self.start_value);
        if width == 0.0 {
            return Colour::Rgb(self.start_colour);
        }
        let ratio = value.offset_from(&self.start_value) / width;
        let channel = |start: i32, end: i32| (start as f64 + ratio * (end - start) as f64) as i32;
        Colour::Rgb(Rgb(
            channel(self.start_colour.0, self.end_colour.0),
            channel(self.start_colour.1, self.end_colour.1),
            channel(self.start_colour.2, self.end_colour.2),
        ))
    }
}

/// Two linear scales joined at a midpoint. Values strictly above the
/// midpoint use the upper scale; the midpoint itself uses the lower one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidPointColourScale<T> {
    pub mid_value: T,
    low: ColourScale<T>,
    high: ColourScale<T>,
}

impl<T: ScaleDomain> MidPointColourScale<T> {
    pub fn new(
        start_value: T,
        mid_value: T,
        end_value: T,
        start_colour: Rgb,
        mid_colour: Rgb,
        end_colour: Rgb,
    ) -> Self {
        Self {
            mid_value,
            low: ColourScale::new(start_value, mid_value, start_colour, mid_colour),
            high: ColourScale::new(mid_value, end_value, mid_colour, end_colour),
        }
    }

    pub fn colour_for(&self, value: Option<T>) -> Colour {
        match value {
            Some(value) => self.colour_for_value(value),
            None => Colour::Transparent,
        }
    }

    pub fn colour_for_value(&self, value: T) -> Colour {
        if value > self.mid_value {
            self.high.colour_for_value(value)
        } else {
            self.low.colour_for_value(value)
        }
    }
}
