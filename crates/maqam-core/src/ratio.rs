//! Frequency ratios as `num_rational::Ratio<u64>`, plus the text form used
//! in catalogs (`"3/2"`, `"4:3"`, `"2"`).

use num_rational::Ratio;
use num_traits::{CheckedDiv, CheckedMul, ToPrimitive};
use std::str::FromStr;

/// A reduced positive frequency ratio such as `3/2`.
pub type Fraction = Ratio<u64>;

pub const UNISON: Fraction = Ratio::new_raw(1, 1);

/// Largest denominator tried when approximating a decimal ratio.
const MAX_APPROX_DENOMINATOR: u64 = 64;

/// Error parsing a fraction string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid fraction: {0:?}")]
pub struct ParseFractionError(pub String);

/// Parse `"3/2"`, `"4:3"` or a bare integer. Zero terms are rejected.
pub fn parse(s: &str) -> Result<Fraction, ParseFractionError> {
    let err = || ParseFractionError(s.to_string());
    let text: String = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ':' { '/' } else { c })
        .collect();
    let fraction = Fraction::from_str(&text).map_err(|_| err())?;
    if *fraction.numer() == 0 {
        return Err(err());
    }
    Ok(fraction)
}

/// Always `n/d`, so integers keep their denominator (`2/1`).
pub fn to_text(fraction: &Fraction) -> String {
    format!("{}/{}", fraction.numer(), fraction.denom())
}

pub fn to_f64(fraction: &Fraction) -> f64 {
    fraction
        .to_f64()
        .unwrap_or_else(|| *fraction.numer() as f64 / *fraction.denom() as f64)
}

/// The interval from `from` up to `to`, `None` on overflow.
pub fn interval(from: &Fraction, to: &Fraction) -> Option<Fraction> {
    to.checked_div(from)
}

/// Multiply by `2^octaves`, halving for negative shifts.
pub fn shift_octaves(fraction: &Fraction, octaves: i32) -> Option<Fraction> {
    let factor = Fraction::from_integer(1u64.checked_shl(octaves.unsigned_abs())?);
    if octaves >= 0 {
        fraction.checked_mul(&factor)
    } else {
        fraction.checked_div(&factor)
    }
}

/// Closest fraction with a denominator up to 64. Non-positive or
/// non-finite input gives unison.
pub fn approximate(decimal: f64) -> Fraction {
    if !decimal.is_finite() || decimal <= 0.0 {
        return UNISON;
    }
    let mut best = UNISON;
    let mut best_error = (decimal - 1.0).abs();
    for den in 1..=MAX_APPROX_DENOMINATOR {
        let num = (decimal * den as f64).round();
        if num < 1.0 || num > u64::MAX as f64 {
            continue;
        }
        let error = (decimal - num / den as f64).abs();
        if error < best_error {
            best = Ratio::new(num as u64, den);
            best_error = error;
        }
    }
    best
}

/// Serde adapter writing a [`Fraction`] as its `n/d` text.
pub mod text {
    use super::Fraction;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(fraction: &Fraction, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_text(fraction))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fraction, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    fn frac(s: &str) -> Fraction {
        parse(s).unwrap()
    }

    #[test]
    fn parses_and_reduces() {
        assert_eq!(frac("6/4"), Ratio::new(3, 2));
        assert_eq!(to_text(&frac("4:3")), "4/3");
        assert_eq!(to_text(&frac("2")), "2/1");
        assert!(parse("0/5").is_err());
        assert!(parse("3/0").is_err());
        assert!(parse("abc").is_err());
    }

    #[test]
    fn interval_between_fractions() {
        assert_eq!(interval(&frac("3/2"), &frac("4/3")), Some(Ratio::new(8, 9)));
        assert_eq!(interval(&frac("5/4"), &frac("6/5")), Some(Ratio::new(24, 25)));
        assert_eq!(interval(&UNISON, &frac("3/2")), Some(frac("3/2")));
    }

    #[test]
    fn ordering_is_exact() {
        assert!(frac("256/243") < frac("9/8"));
        assert!(frac("3/2") > frac("40/27"));
    }

    #[test]
    fn octave_shifts() {
        assert_eq!(shift_octaves(&frac("3/2"), 1), Some(Ratio::from_integer(3)));
        assert_eq!(shift_octaves(&frac("3/2"), -2), Some(Ratio::new(3, 8)));
        assert_eq!(shift_octaves(&frac("9/8"), 0), Some(frac("9/8")));
        assert_eq!(shift_octaves(&frac("3/2"), 70), None);
    }

    #[test]
    fn approximation_finds_simple_ratios() {
        assert_eq!(approximate(1.5), Ratio::new(3, 2));
        assert_eq!(approximate(1.125), Ratio::new(9, 8));
        assert_eq!(approximate(-1.0), UNISON);
        assert!((to_f64(&approximate(1.5)) - 1.5).abs() < 1e-12);
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Step {
        #[serde(with = "text")]
        ratio: Fraction,
    }

    #[test]
    fn serde_uses_text_form() {
        let json = serde_json::to_string(&Step { ratio: frac("9/8") }).unwrap();
        assert_eq!(json, r#"{"ratio":"9/8"}"#);
        let back: Step = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ratio, frac("9/8"));
        assert!(serde_json::from_str::<Step>(r#"{"ratio":"0/1"}"#).is_err());
    }
}
