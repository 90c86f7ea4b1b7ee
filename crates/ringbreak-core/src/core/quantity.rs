use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum QuantityError {
    #[error("Quantity magnitude must be finite and non-negative, got {0}")]
    InvalidMagnitude(f64),
    #[error("Could not parse a magnitude from '{0}'")]
    MissingMagnitude(String),
    #[error("Unknown {kind} unit '{unit}' in '{input}'")]
    UnknownUnit {
        kind: &'static str,
        unit: String,
        input: String,
    },
}

fn check_magnitude(value: f64) -> Result<f64, QuantityError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(QuantityError::InvalidMagnitude(value))
    }
}

/// Renders whole numbers without a fractional part so that `500.0 ps` becomes `500ps`.
fn fmt_magnitude(value: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        write!(f, "{:.0}", value)
    } else {
        write!(f, "{}", value)
    }
}

/// Splits `"12.5 ps"` into `(12.5, "ps")`, tolerating whitespace between the parts.
fn split_quantity(input: &str) -> Result<(f64, &str), QuantityError> {
    let trimmed = input.trim();
    let split_at = trimmed
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
        .unwrap_or(trimmed.len());
    // `e` is ambiguous with unit names; back off if the suffix was swallowed.
    let (mut number, mut unit) = trimmed.split_at(split_at);
    while number.ends_with(['e', 'E']) {
        let cut = number.len() - 1;
        number = &trimmed[..cut];
        unit = &trimmed[cut..];
    }
    let value: f64 = number
        .parse()
        .map_err(|_| QuantityError::MissingMagnitude(input.to_string()))?;
    Ok((check_magnitude(value)?, unit.trim()))
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthUnit {
    Angstrom,
    Nanometer,
}

impl LengthUnit {
    fn symbol(self) -> &'static str {
        match self {
            LengthUnit::Angstrom => "A",
            LengthUnit::Nanometer => "nm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    value: f64,
    unit: LengthUnit,
}

impl Length {
    pub fn new(value: f64, unit: LengthUnit) -> Result<Self, QuantityError> {
        Ok(Self {
            value: check_magnitude(value)?,
            unit,
        })
    }

    pub(crate) const fn angstroms_unchecked(value: f64) -> Self {
        Self {
            value,
            unit: LengthUnit::Angstrom,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> LengthUnit {
        self.unit
    }

    pub fn as_angstroms(&self) -> f64 {
        match self.unit {
            LengthUnit::Angstrom => self.value,
            LengthUnit::Nanometer => self.value * 10.0,
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_magnitude(self.value, f)?;
        f.write_str(self.unit.symbol())
    }
}

impl FromStr for Length {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, unit) = split_quantity(s)?;
        let unit = match unit {
            "A" | "Å" | "angstrom" | "angstroms" => LengthUnit::Angstrom,
            "nm" | "nanometer" | "nanometers" => LengthUnit::Nanometer,
            other => {
                return Err(QuantityError::UnknownUnit {
                    kind: "length",
                    unit: other.to_string(),
                    input: s.to_string(),
                });
            }
        };
        Length::new(value, unit)
    }
}

string_serde!(Length);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeUnit {
    Femtosecond,
    Picosecond,
    Nanosecond,
    Second,
}

impl TimeUnit {
    fn in_femtoseconds(self) -> f64 {
        match self {
            TimeUnit::Femtosecond => 1.0,
            TimeUnit::Picosecond => 1e3,
            TimeUnit::Nanosecond => 1e6,
            TimeUnit::Second => 1e15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Time {
    value: f64,
    unit: TimeUnit,
}

impl Time {
    pub fn new(value: f64, unit: TimeUnit) -> Result<Self, QuantityError> {
        Ok(Self {
            value: check_magnitude(value)?,
            unit,
        })
    }

    pub(crate) const fn new_unchecked(value: f64, unit: TimeUnit) -> Self {
        Self { value, unit }
    }

    pub fn picoseconds(value: u64) -> Self {
        Self::new_unchecked(value as f64, TimeUnit::Picosecond)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn as_femtoseconds(&self) -> f64 {
        self.value * self.unit.in_femtoseconds()
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }

    /// Expresses `self` in `unit`, keeping the physical duration unchanged.
    pub fn to_unit(&self, unit: TimeUnit) -> Self {
        Self {
            value: self.as_femtoseconds() / unit.in_femtoseconds(),
            unit,
        }
    }

    /// Adds `other` to `self`, reporting the sum in the unit of `self`.
    pub fn extended_by(&self, other: Time) -> Self {
        Self {
            value: self.value + other.to_unit(self.unit).value,
            unit: self.unit,
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_magnitude(self.value, f)?;
        match self.unit {
            TimeUnit::Femtosecond => f.write_str("fs"),
            TimeUnit::Picosecond => f.write_str("ps"),
            TimeUnit::Nanosecond => f.write_str("ns"),
            TimeUnit::Second => f.write_str(" s"),
        }
    }
}

impl FromStr for Time {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, unit) = split_quantity(s)?;
        let unit = match unit {
            "fs" | "femtosecond" | "femtoseconds" => TimeUnit::Femtosecond,
            "ps" | "picosecond" | "picoseconds" => TimeUnit::Picosecond,
            "ns" | "nanosecond" | "nanoseconds" => TimeUnit::Nanosecond,
            "s" | "second" | "seconds" => TimeUnit::Second,
            other => {
                return Err(QuantityError::UnknownUnit {
                    kind: "time",
                    unit: other.to_string(),
                    input: s.to_string(),
                });
            }
        };
        Time::new(value, unit)
    }
}

string_serde!(Time);

/// An energy in kcal/mol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Energy {
    kcal_per_mol: f64,
}

impl Energy {
    pub fn kcal_per_mol(value: f64) -> Result<Self, QuantityError> {
        Ok(Self {
            kcal_per_mol: check_magnitude(value)?,
        })
    }

    pub fn value(&self) -> f64 {
        self.kcal_per_mol
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_magnitude(self.kcal_per_mol, f)?;
        f.write_str(" kcal mol-1")
    }
}

impl FromStr for Energy {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, unit) = split_quantity(s)?;
        match unit {
            "" | "kcal mol-1" | "kcal/mol" => Energy::kcal_per_mol(value),
            other => Err(QuantityError::UnknownUnit {
                kind: "energy",
                unit: other.to_string(),
                input: s.to_string(),
            }),
        }
    }
}

string_serde!(Energy);

/// A harmonic-style force constant in kcal mol⁻¹ Å⁻².
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceConstant {
    value: f64,
}

impl ForceConstant {
    pub fn kcal_per_mol_per_angstrom2(value: f64) -> Result<Self, QuantityError> {
        Ok(Self {
            value: check_magnitude(value)?,
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl fmt::Display for ForceConstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_magnitude(self.value, f)?;
        f.write_str(" kcal mol-1 A-2")
    }
}

impl FromStr for ForceConstant {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (value, unit) = split_quantity(s)?;
        match unit {
            "" | "kcal mol-1 A-2" => ForceConstant::kcal_per_mol_per_angstrom2(value),
            other => Err(QuantityError::UnknownUnit {
                kind: "force constant",
                unit: other.to_string(),
                input: s.to_string(),
            }),
        }
    }
}

string_serde!(ForceConstant);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_times_render_without_fraction() {
        assert_eq!(Time::picoseconds(500).to_string(), "500ps");
        assert_eq!(
            Time::new(2.0, TimeUnit::Femtosecond).unwrap().to_string(),
            "2fs"
        );
        assert_eq!(Time::new(30.0, TimeUnit::Second).unwrap().to_string(), "30 s");
    }

    #[test]
    fn fractional_magnitudes_are_preserved() {
        assert_eq!(
            Time::new(0.5, TimeUnit::Femtosecond).unwrap().to_string(),
            "0.5fs"
        );
        assert_eq!(
            Energy::kcal_per_mol(2.5).unwrap().to_string(),
            "2.5 kcal mol-1"
        );
    }

    #[test]
    fn length_renders_with_angstrom_symbol() {
        assert_eq!(Length::angstroms_unchecked(12.0).to_string(), "12A");
        assert_eq!(
            Length::new(1.2, LengthUnit::Nanometer)
                .unwrap()
                .as_angstroms(),
            12.0
        );
    }

    #[test]
    fn negative_and_non_finite_magnitudes_are_rejected() {
        assert_eq!(
            Time::new(-1.0, TimeUnit::Picosecond),
            Err(QuantityError::InvalidMagnitude(-1.0))
        );
        assert!(Energy::kcal_per_mol(f64::NAN).is_err());
        assert!(ForceConstant::kcal_per_mol_per_angstrom2(f64::INFINITY).is_err());
    }

    #[test]
    fn extension_is_expressed_in_the_base_unit() {
        let base = Time::picoseconds(500);
        assert_eq!(base.extended_by(Time::picoseconds(50)).to_string(), "550ps");

        let one_ns = Time::new(1.0, TimeUnit::Nanosecond).unwrap();
        assert_eq!(base.extended_by(one_ns).to_string(), "1500ps");
    }

    #[test]
    fn parses_boundary_strings_back_into_quantities() {
        assert_eq!("12A".parse::<Length>().unwrap().as_angstroms(), 12.0);
        assert_eq!("30 s".parse::<Time>().unwrap().unit(), TimeUnit::Second);
        assert_eq!("100ps".parse::<Time>().unwrap().value(), 100.0);
        assert_eq!("1e3fs".parse::<Time>().unwrap().as_femtoseconds(), 1000.0);
        assert_eq!("5 kcal mol-1".parse::<Energy>().unwrap().value(), 5.0);
        assert_eq!(
            "10 kcal mol-1 A-2".parse::<ForceConstant>().unwrap().value(),
            10.0
        );
    }

    #[test]
    fn unknown_units_are_reported_with_kind() {
        let err = "5 parsecs".parse::<Length>().unwrap_err();
        assert!(matches!(err, QuantityError::UnknownUnit { kind: "length", .. }));
        assert!(matches!(
            "ps".parse::<Time>(),
            Err(QuantityError::MissingMagnitude(_))
        ));
    }
}
