use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::metadata::{MetadataError, Result};

/// Unsigned Exif-style rational.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rational {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub const fn whole(value: u32) -> Self {
        Self::new(value, 1)
    }

    pub fn to_f64(self) -> Option<f64> {
        if self.denominator == 0 {
            None
        } else {
            Some(self.numerator as f64 / self.denominator as f64)
        }
    }

    /// Closest fraction to `value` whose denominator does not exceed
    /// `max_denominator`, found by walking the continued fraction expansion
    /// and checking the last semiconvergent.
    pub fn approximate(value: f64, max_denominator: u32) -> Option<Self> {
        if !value.is_finite() || value < 0.0 || max_denominator == 0 {
            return None;
        }
        if value > u32::MAX as f64 {
            return None;
        }

        let max_den = max_denominator as u64;
        let (mut p0, mut q0, mut p1, mut q1) = (0u64, 1u64, 1u64, 0u64);
        let mut x = value;

        loop {
            let a = x.floor();
            if a > u32::MAX as f64 {
                break;
            }
            let a = a as u64;
            let q2 = q0 + a * q1;
            if q2 > max_den {
                break;
            }
            let p2 = p0 + a * p1;
            (p0, q0, p1, q1) = (p1, q1, p2, q2);

            let frac = x - a as f64;
            if frac < 1e-12 {
                break;
            }
            x = 1.0 / frac;
        }

        // Semiconvergent between the last two convergents.
        let k = (max_den - q0) / q1;
        let (sp, sq) = (p0 + k * p1, q0 + k * q1);

        let convergent_error = (p1 as f64 / q1 as f64 - value).abs();
        let semi_error = (sp as f64 / sq as f64 - value).abs();

        let (numerator, denominator) = if convergent_error <= semi_error {
            (p1, q1)
        } else {
            (sp, sq)
        };

        Some(Self::new(
            u32::try_from(numerator).ok()?,
            u32::try_from(denominator).ok()?,
        ))
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    pub fn letter(self) -> char {
        match self {
            Self::North => 'N',
            Self::South => 'S',
            Self::East => 'E',
            Self::West => 'W',
        }
    }

    pub fn is_latitude(self) -> bool {
        matches!(self, Self::North | Self::South)
    }

    pub fn is_negative(self) -> bool {
        matches!(self, Self::South | Self::West)
    }

    pub fn for_sign(negative: bool, is_latitude: bool) -> Self {
        match (negative, is_latitude) {
            (false, true) => Self::North,
            (true, true) => Self::South,
            (false, false) => Self::East,
            (true, false) => Self::West,
        }
    }
}

impl TryFrom<char> for Hemisphere {
    type Error = MetadataError;

    fn try_from(letter: char) -> Result<Self> {
        match letter.to_ascii_uppercase() {
            'N' => Ok(Self::North),
            'S' => Ok(Self::South),
            'E' => Ok(Self::East),
            'W' => Ok(Self::West),
            other => Err(MetadataError::InvalidCoordinate(format!(
                "unknown hemisphere letter {other:?}"
            ))),
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A latitude or longitude in signed decimal degrees.
///
/// The sign is never stored separately: the hemisphere letter is derived from
/// it on demand, so `to_decimal_degrees` and `hemisphere` always agree.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    degrees: f64,
    is_latitude: bool,
}

impl GeoCoordinate {
    pub const MAX_DEGREES: f64 = 180.0;

    pub fn new(degrees: f64, is_latitude: bool) -> Result<Self> {
        if !degrees.is_finite() {
            return Err(MetadataError::InvalidCoordinate(format!(
                "{degrees} is not a finite number of degrees"
            )));
        }
        if degrees.abs() > Self::MAX_DEGREES {
            return Err(MetadataError::InvalidCoordinate(format!(
                "{degrees} is outside -180..=180 degrees"
            )));
        }
        Ok(Self {
            degrees,
            is_latitude,
        })
    }

    pub fn latitude(degrees: f64) -> Result<Self> {
        Self::new(degrees, true)
    }

    pub fn longitude(degrees: f64) -> Result<Self> {
        Self::new(degrees, false)
    }

    pub fn to_decimal_degrees(self) -> f64 {
        self.degrees
    }

    pub fn magnitude(self) -> f64 {
        self.degrees.abs()
    }

    pub fn is_latitude(self) -> bool {
        self.is_latitude
    }

    pub fn hemisphere(self) -> Hemisphere {
        Hemisphere::for_sign(self.degrees < 0.0, self.is_latitude)
    }

    pub fn approx_eq(self, other: Self, tolerance: f64) -> bool {
        self.is_latitude == other.is_latitude && (self.degrees - other.degrees).abs() <= tolerance
    }
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}{}", self.magnitude(), self.hemisphere())
    }
}

/// Degrees/minutes/seconds form with an explicit hemisphere.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Sexagesimal {
    pub degrees: u32,
    pub minutes: u32,
    pub seconds: Rational,
    pub hemisphere: Hemisphere,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approximate_finds_exact_small_fractions() {
        assert_eq!(Rational::approximate(51.5, 1_000_000), Some(Rational::new(103, 2)));
        assert_eq!(Rational::approximate(0.0, 1_000_000), Some(Rational::new(0, 1)));
        assert_eq!(Rational::approximate(12.0, 10), Some(Rational::whole(12)));
    }

    #[test]
    fn approximate_respects_denominator_limit() {
        let pi = Rational::approximate(std::f64::consts::PI, 1000).expect("pi should approximate");
        assert_eq!(pi, Rational::new(355, 113));

        let fine = Rational::approximate(48.858_370_1, 1_000_000).expect("should approximate");
        assert!(fine.denominator <= 1_000_000);
        let value = fine.to_f64().expect("denominator should be non-zero");
        assert!((value - 48.858_370_1).abs() < 1e-6);
    }

    #[test]
    fn approximate_rejects_unrepresentable_input() {
        assert_eq!(Rational::approximate(-1.0, 100), None);
        assert_eq!(Rational::approximate(f64::NAN, 100), None);
        assert_eq!(Rational::approximate(1.0, 0), None);
    }

    #[test]
    fn hemisphere_follows_sign_and_axis() {
        let south = GeoCoordinate::latitude(-33.9).expect("valid latitude");
        assert_eq!(south.hemisphere(), Hemisphere::South);
        let east = GeoCoordinate::longitude(0.0).expect("valid longitude");
        assert_eq!(east.hemisphere(), Hemisphere::East);
        assert!(Hemisphere::try_from('x').is_err());
        assert_eq!(Hemisphere::try_from('w').expect("lowercase accepted"), Hemisphere::West);
    }

    #[test]
    fn coordinate_rejects_out_of_range_degrees() {
        assert!(GeoCoordinate::latitude(180.5).is_err());
        assert!(GeoCoordinate::longitude(f64::INFINITY).is_err());
        assert!(GeoCoordinate::longitude(-180.0).is_ok());
    }
}
