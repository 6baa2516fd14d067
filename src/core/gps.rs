//! Conversions between decimal degrees and the sexagesimal and rational forms
//! used by the XMP and Exif GPS tags.

use crate::core::metadata::{MetadataError, Result};
use crate::models::{GeoCoordinate, Hemisphere, Rational, Sexagesimal};

/// Largest denominator used when approximating a coordinate as a rational.
pub const MAX_DENOMINATOR: u32 = 1_000_000;

/// Decimal places kept for fractional minutes in XMP coordinate strings.
const XMP_MINUTE_PRECISION: usize = 8;

/// `degrees + minutes/60 + seconds/3600`, negated for `S` and `W`.
pub fn decode_sexagesimal(
    degrees: u32,
    minutes: u32,
    seconds: Rational,
    hemisphere: Hemisphere,
) -> Result<GeoCoordinate> {
    let seconds = rational_component(seconds, "seconds")?;
    let magnitude = dms_to_decimal(degrees as f64, minutes as f64, seconds);
    signed(magnitude, hemisphere)
}

pub fn encode_sexagesimal(coord: GeoCoordinate) -> Result<Sexagesimal> {
    let value = coord.magnitude();
    let mut degrees = value.trunc() as u32;
    let minutes_full = (value - degrees as f64) * 60.0;
    let mut minutes = minutes_full.trunc() as u32;
    let seconds_full = (minutes_full - minutes as f64) * 60.0;

    let mut seconds = Rational::approximate(seconds_full, MAX_DENOMINATOR).ok_or_else(|| {
        MetadataError::InvalidCoordinate(format!("cannot express {seconds_full} seconds"))
    })?;

    // Rounding can push the seconds up to a full minute.
    if seconds.numerator >= 60 * seconds.denominator {
        seconds.numerator -= 60 * seconds.denominator;
        minutes += 1;
    }
    if minutes >= 60 {
        minutes -= 60;
        degrees += 1;
    }

    Ok(Sexagesimal {
        degrees,
        minutes,
        seconds,
        hemisphere: coord.hemisphere(),
    })
}

/// Accepts either a single rational in decimal degrees or a
/// degrees/minutes/seconds triple.
pub fn decode_rational_triple(values: &[Rational], hemisphere: Hemisphere) -> Result<GeoCoordinate> {
    let magnitude = match values {
        [scalar] => rational_component(*scalar, "degrees")?,
        [degrees, minutes, seconds] => dms_to_decimal(
            rational_component(*degrees, "degrees")?,
            rational_component(*minutes, "minutes")?,
            rational_component(*seconds, "seconds")?,
        ),
        other => {
            return Err(MetadataError::InvalidCoordinate(format!(
                "expected 1 or 3 rational components, found {}",
                other.len()
            )))
        }
    };
    signed(magnitude, hemisphere)
}

/// Always a single rational of the unsigned magnitude, never split into
/// degrees/minutes/seconds.
pub fn encode_rational_triple(coord: GeoCoordinate) -> Result<(Rational, Hemisphere)> {
    let magnitude = coord.magnitude();
    let fraction = Rational::approximate(magnitude, MAX_DENOMINATOR).ok_or_else(|| {
        MetadataError::InvalidCoordinate(format!("cannot express {magnitude} degrees"))
    })?;
    Ok((fraction, coord.hemisphere()))
}

/// Convert DMS components to decimal degrees.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}

/// Parse an XMP `GPSCoordinate` string: `DDD,MM,SSk` or `DDD,MM.mmk`.
pub fn parse_xmp_coordinate(value: &str) -> Result<Sexagesimal> {
    let invalid = || MetadataError::InvalidCoordinate(format!("malformed XMP coordinate {value:?}"));

    let value = value.trim();
    let letter = value.chars().last().ok_or_else(invalid)?;
    let hemisphere = Hemisphere::try_from(letter)?;
    let body = &value[..value.len() - letter.len_utf8()];

    let parts = body.split(',').map(str::trim).collect::<Vec<_>>();
    let (degrees, minutes, seconds) = match parts.as_slice() {
        [degrees, minutes] => {
            let degrees = degrees.parse::<u32>().map_err(|_| invalid())?;
            let minutes = parse_non_negative(minutes).ok_or_else(invalid)?;
            let whole = minutes.trunc();
            (degrees, whole, (minutes - whole) * 60.0)
        }
        [degrees, minutes, seconds] => {
            let degrees = degrees.parse::<u32>().map_err(|_| invalid())?;
            let minutes = minutes.parse::<u32>().map_err(|_| invalid())?;
            let seconds = parse_non_negative(seconds).ok_or_else(invalid)?;
            (degrees, minutes as f64, seconds)
        }
        _ => return Err(invalid()),
    };

    let seconds = Rational::approximate(seconds, MAX_DENOMINATOR).ok_or_else(invalid)?;

    Ok(Sexagesimal {
        degrees,
        minutes: minutes as u32,
        seconds,
        hemisphere,
    })
}

/// Format as `DDD,MM,SSk` when the seconds are whole, otherwise as
/// `DDD,MM.mmk` with the seconds folded into fractional minutes.
pub fn format_xmp_coordinate(value: &Sexagesimal) -> String {
    let letter = value.hemisphere.letter();

    if value.seconds.denominator == 1 {
        return format!(
            "{},{},{}{letter}",
            value.degrees, value.minutes, value.seconds.numerator
        );
    }

    let seconds = value.seconds.to_f64().unwrap_or(0.0);
    let minutes = value.minutes as f64 + seconds / 60.0;
    let formatted = format!("{minutes:.prec$}", prec = XMP_MINUTE_PRECISION);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{},{trimmed}{letter}", value.degrees)
}

fn parse_non_negative(value: &str) -> Option<f64> {
    let parsed = value.parse::<f64>().ok()?;
    (parsed.is_finite() && parsed >= 0.0 && !value.starts_with('-')).then_some(parsed)
}

fn rational_component(value: Rational, label: &str) -> Result<f64> {
    value.to_f64().ok_or_else(|| {
        MetadataError::InvalidCoordinate(format!("{label} {value} has a zero denominator"))
    })
}

fn signed(magnitude: f64, hemisphere: Hemisphere) -> Result<GeoCoordinate> {
    let degrees = if hemisphere.is_negative() {
        -magnitude
    } else {
        magnitude
    };
    GeoCoordinate::new(degrees, hemisphere.is_latitude())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_xmp_coordinate_shapes() {
        let whole = parse_xmp_coordinate("51,30,15N").expect("whole seconds should parse");
        assert_eq!(whole.degrees, 51);
        assert_eq!(whole.minutes, 30);
        assert_eq!(whole.seconds, Rational::whole(15));
        assert_eq!(whole.hemisphere, Hemisphere::North);

        let fractional = parse_xmp_coordinate("0,7.5W").expect("fractional minutes should parse");
        assert_eq!(fractional.minutes, 7);
        assert_eq!(fractional.seconds, Rational::whole(30));
        assert_eq!(fractional.hemisphere, Hemisphere::West);
    }

    #[test]
    fn rejects_malformed_xmp_coordinates() {
        for input in ["", "51N", "51,-3,0N", "51,-3.5N", "51,30,0Q", "a,b,cN", "51,30,0,1N"] {
            assert!(
                parse_xmp_coordinate(input).is_err(),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn formats_whole_and_fractional_seconds() {
        let whole = Sexagesimal {
            degrees: 51,
            minutes: 30,
            seconds: Rational::whole(0),
            hemisphere: Hemisphere::North,
        };
        assert_eq!(format_xmp_coordinate(&whole), "51,30,0N");

        let fractional = Sexagesimal {
            degrees: 2,
            minutes: 17,
            seconds: Rational::new(3, 2),
            hemisphere: Hemisphere::East,
        };
        assert_eq!(format_xmp_coordinate(&fractional), "2,17.025E");
    }
}
