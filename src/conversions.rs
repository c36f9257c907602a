//! Historical unit and currency conversions.
//!
//! Australia moved to decimal currency on 14 February 1966 (£1 = $2, 1s = 10c,
//! 1d = 10/12c) and agriculture went metric over the 1970s. Every quantity that
//! reaches the store passes through one of the functions below.

use regex::Regex;
use thiserror::Error;

pub const POUNDS_TO_DOLLARS: f64 = 2.0;
pub const SHILLINGS_TO_CENTS: f64 = 10.0;
pub const PENCE_TO_CENTS: f64 = 10.0 / 12.0;

pub const GALLONS_IMP_TO_LITRES: f64 = 4.54609;
pub const QUARTS_TO_LITRES: f64 = 1.13652;
pub const PINTS_TO_LITRES: f64 = 0.56826;

pub const LBS_TO_KG: f64 = 0.453592;
/// Imperial (long) ton to metric tonne
pub const TONS_IMP_TO_TONNES: f64 = 1.01605;
pub const TONS_SHORT_TO_TONNES: f64 = 0.907185;
/// Imperial hundredweight
pub const CWT_TO_KG: f64 = 50.8023;

pub const ACRES_TO_HECTARES: f64 = 0.404686;

/// Decimal places kept for physical quantities
pub const QUANTITY_PRECISION: u32 = 6;
/// Decimal places kept for prices
pub const PRICE_PRECISION: u32 = 4;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Unknown {kind} unit: {unit}")]
    UnknownUnit { kind: &'static str, unit: String },

    #[error("Unsupported target: {price}/{per}")]
    UnsupportedTarget { price: String, per: String },
}

impl ConversionError {
    fn unknown(kind: &'static str, unit: &str) -> Self {
        ConversionError::UnknownUnit {
            kind,
            unit: unit.to_string(),
        }
    }
}

/// Round half away from zero to `places` decimal places
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Convert an amount in pounds, shillings and pence to decimal dollars
///
/// Example: (1, 2, 6) is 270 pence, 225 cents, $2.25
pub fn parse_pre_decimal_price(pounds: f64, shillings: f64, pence: f64) -> f64 {
    let total_pence = pounds * 240.0 + shillings * 12.0 + pence;
    let total_cents = total_pence * PENCE_TO_CENTS;
    round_to(total_cents / 100.0, PRICE_PRECISION)
}

/// Parse a historical price string into decimal dollars
///
/// Notations are tried in a fixed order and the first match wins:
/// - `$1.50` decimal
/// - `£1/2/6` pounds/shillings/pence
/// - `3s 6d` or `3s6d` shillings and pence
/// - `42d` pence only
/// - `15/6` shillings/pence
/// - `1.50` plain number
///
/// Returns `None` when the string matches no notation. Callers must not
/// treat `None` as zero.
pub fn parse_price_string(input: &str) -> Option<f64> {
    let s = input.trim();

    if let Some(decimal) = s.strip_prefix('$') {
        return parse_finite(&decimal.replace(',', ""));
    }

    if s.contains('£') {
        let stripped = s.replace('£', "");
        let parts: Vec<&str> = stripped.split('/').map(str::trim).collect();
        let pounds = parse_component(parts.first().copied())?;
        let shillings = parse_component(parts.get(1).copied())?;
        let pence = parse_component(parts.get(2).copied())?;
        return Some(parse_pre_decimal_price(pounds, shillings, pence));
    }

    if s.contains('s') {
        let re = Regex::new(r"^(\d+)\s*s\s*(\d*)\s*d?").ok()?;
        if let Some(caps) = re.captures(s) {
            let shillings: f64 = caps.get(1)?.as_str().parse().ok()?;
            let pence = parse_component(caps.get(2).map(|m| m.as_str()))?;
            return Some(parse_pre_decimal_price(0.0, shillings, pence));
        }
    }

    if let Some(pence) = s.strip_suffix('d') {
        let pence = parse_finite(pence)?;
        return Some(parse_pre_decimal_price(0.0, 0.0, pence));
    }

    if let Some((shillings, pence)) = s.split_once('/') {
        let shillings = parse_finite(shillings)?;
        let pence = parse_component(Some(pence.trim()))?;
        return Some(parse_pre_decimal_price(0.0, shillings, pence));
    }

    parse_finite(&s.replace(',', ""))
}

/// `f64::from_str` accepts "nan" and "inf", which are not prices
fn parse_finite(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Empty or absent £sd components count as zero; anything else must be numeric
fn parse_component(part: Option<&str>) -> Option<f64> {
    match part {
        None | Some("") => Some(0.0),
        Some(text) => parse_finite(text),
    }
}

fn litres_per_unit(unit: &str) -> Option<f64> {
    let factor = match unit {
        "litres" => 1.0,
        "megalitres" => 1_000_000.0,
        "gallons" | "imperial_gallons" => GALLONS_IMP_TO_LITRES,
        "quarts" => QUARTS_TO_LITRES,
        "pints" => PINTS_TO_LITRES,
        "million_gallons" => GALLONS_IMP_TO_LITRES * 1_000_000.0,
        "thousand_gallons" => GALLONS_IMP_TO_LITRES * 1_000.0,
        _ => return None,
    };
    Some(factor)
}

fn units_per_litre(unit: &str) -> Option<f64> {
    let factor = match unit {
        "litres" => 1.0,
        "megalitres" => 1e-6,
        "gallons" => 1.0 / GALLONS_IMP_TO_LITRES,
        _ => return None,
    };
    Some(factor)
}

fn kg_per_unit(unit: &str) -> Option<f64> {
    let factor = match unit {
        "kg" => 1.0,
        "tonnes" => 1_000.0,
        "kilotonnes" => 1_000_000.0,
        "lbs" | "pounds" => LBS_TO_KG,
        "tons" | "imperial_tons" => TONS_IMP_TO_TONNES * 1_000.0,
        "short_tons" => TONS_SHORT_TO_TONNES * 1_000.0,
        "cwt" => CWT_TO_KG,
        "thousand_tons" => TONS_IMP_TO_TONNES * 1_000_000.0,
        _ => return None,
    };
    Some(factor)
}

fn units_per_kg(unit: &str) -> Option<f64> {
    let factor = match unit {
        "kg" => 1.0,
        "tonnes" => 0.001,
        "lbs" => 1.0 / LBS_TO_KG,
        _ => return None,
    };
    Some(factor)
}

/// Convert a volume through litres. Targets are litres, megalitres or gallons.
pub fn convert_volume(value: f64, from: &str, to: &str) -> Result<f64, ConversionError> {
    let to_litres = litres_per_unit(from).ok_or_else(|| ConversionError::unknown("volume", from))?;
    let from_litres = units_per_litre(to).ok_or_else(|| ConversionError::unknown("volume", to))?;
    Ok(round_to(value * to_litres * from_litres, QUANTITY_PRECISION))
}

/// Convert a weight through kilograms. Targets are kg, tonnes or lbs.
pub fn convert_weight(value: f64, from: &str, to: &str) -> Result<f64, ConversionError> {
    let to_kg = kg_per_unit(from).ok_or_else(|| ConversionError::unknown("weight", from))?;
    let from_kg = units_per_kg(to).ok_or_else(|| ConversionError::unknown("weight", to))?;
    Ok(round_to(value * to_kg * from_kg, QUANTITY_PRECISION))
}

/// Convert an area through hectares
pub fn convert_area(value: f64, from: &str, to: &str) -> Result<f64, ConversionError> {
    let hectares_per = |unit: &str| match unit {
        "hectares" => Some(1.0),
        "acres" => Some(ACRES_TO_HECTARES),
        "square_kilometres" => Some(100.0),
        _ => None,
    };
    let to_ha = hectares_per(from).ok_or_else(|| ConversionError::unknown("area", from))?;
    let from_ha = hectares_per(to).ok_or_else(|| ConversionError::unknown("area", to))?;
    Ok(round_to(value * to_ha / from_ha, QUANTITY_PRECISION))
}

fn price_to_cents(value: f64, price_unit: &str) -> Result<f64, ConversionError> {
    match price_unit {
        "pence" => Ok(value * PENCE_TO_CENTS),
        "shillings" => Ok(value * SHILLINGS_TO_CENTS),
        "pounds" => Ok(value * POUNDS_TO_DOLLARS * 100.0),
        "cents" | "dollars_cents" => Ok(value),
        "dollars" => Ok(value * 100.0),
        other => Err(ConversionError::unknown("price", other)),
    }
}

fn cents_to_target(cents: f64, price: &str, per: &str, canonical_per: &str) -> Result<f64, ConversionError> {
    match price {
        "cents" if per == canonical_per => Ok(round_to(cents, PRICE_PRECISION)),
        "dollars" if per == canonical_per => Ok(round_to(cents / 100.0, PRICE_PRECISION)),
        _ => Err(ConversionError::UnsupportedTarget {
            price: price.to_string(),
            per: per.to_string(),
        }),
    }
}

/// Convert a price per volume unit (e.g. pence per gallon) to cents or dollars per litre
pub fn convert_price_per_volume(
    value: f64,
    price_unit: &str,
    volume_unit: &str,
    to_price: &str,
    to_volume: &str,
) -> Result<f64, ConversionError> {
    let cents = price_to_cents(value, price_unit)?;
    let litres = match volume_unit {
        "gallon" => GALLONS_IMP_TO_LITRES,
        "quart" => QUARTS_TO_LITRES,
        "litre" => 1.0,
        other => return Err(ConversionError::unknown("volume", other)),
    };
    cents_to_target(cents / litres, to_price, to_volume, "litre")
}

/// Convert a price per weight unit (e.g. pence per lb) to cents or dollars per kg
pub fn convert_price_per_weight(
    value: f64,
    price_unit: &str,
    weight_unit: &str,
    to_price: &str,
    to_weight: &str,
) -> Result<f64, ConversionError> {
    let cents = price_to_cents(value, price_unit)?;
    let kg = match weight_unit {
        "lb" => LBS_TO_KG,
        "cwt" => CWT_TO_KG,
        "ton" => TONS_IMP_TO_TONNES * 1_000.0,
        "kg" => 1.0,
        "tonne" => 1_000.0,
        other => return Err(ConversionError::unknown("weight", other)),
    };
    cents_to_target(cents / kg, to_price, to_weight, "kg")
}

/// How a source column's raw number becomes a canonical value
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    /// Source is already in canonical units
    Identity,
    /// Fixed multiplier, e.g. '000 head to head
    Scale(f64),
    Volume { from: &'static str, to: &'static str },
    Weight { from: &'static str, to: &'static str },
    /// Price per volume to cents per litre
    PricePerVolume { price: &'static str, volume: &'static str },
    /// Price per weight to cents per kg
    PricePerWeight { price: &'static str, weight: &'static str },
}

impl Conversion {
    pub fn apply(&self, value: f64) -> Result<f64, ConversionError> {
        match self {
            Conversion::Identity => Ok(value),
            Conversion::Scale(factor) => Ok(round_to(value * factor, QUANTITY_PRECISION)),
            Conversion::Volume { from, to } => convert_volume(value, from, to),
            Conversion::Weight { from, to } => convert_weight(value, from, to),
            Conversion::PricePerVolume { price, volume } => {
                convert_price_per_volume(value, price, volume, "cents", "litre")
            }
            Conversion::PricePerWeight { price, weight } => {
                convert_price_per_weight(value, price, weight, "cents", "kg")
            }
        }
    }
}

/// Financial year label for the year starting in `year`, e.g. 1965 -> "1965-66"
pub fn fy_label(year: i32) -> String {
    let next = (i64::from(year) + 1).rem_euclid(100);
    format!("{year}-{next:02}")
}

/// Start year of a financial year label, e.g. "1965-66" -> 1965
pub fn parse_fy(label: &str) -> Option<i32> {
    let s = label.trim();
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];
    if digits.is_empty() {
        return None;
    }
    let magnitude: i64 = digits.parse().ok()?;
    i32::try_from(sign * magnitude).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pound_is_two_dollars() {
        assert_eq!(parse_pre_decimal_price(1.0, 0.0, 0.0), 2.0);
        assert_eq!(parse_pre_decimal_price(1.0, 2.0, 6.0), 2.25);
    }

    #[test]
    fn test_shilling_is_ten_cents() {
        assert_eq!(parse_pre_decimal_price(0.0, 1.0, 0.0), 0.1);
    }

    #[test]
    fn test_price_string_notation_order() {
        // '$' wins even when the rest would look like shillings/pence
        assert_eq!(parse_price_string("$1,234.50"), Some(1234.5));
        assert_eq!(parse_price_string("£1//"), Some(2.0));
        assert_eq!(parse_price_string("3s6d"), Some(0.35));
        assert_eq!(parse_price_string("  42d "), Some(0.35));
        assert_eq!(parse_price_string("1,250"), Some(1250.0));
    }

    #[test]
    fn test_unparseable_price_is_none() {
        assert_eq!(parse_price_string("about tuppence"), None);
        assert_eq!(parse_price_string(""), None);
        assert_eq!(parse_price_string("$"), None);
        assert_eq!(parse_price_string("xd"), None);
        assert_eq!(parse_price_string("nan"), None);
        assert_eq!(parse_price_string("infinity"), None);
        assert_eq!(parse_price_string("$inf"), None);
        assert_eq!(parse_price_string("$NaN"), None);
        assert_eq!(parse_price_string("infd"), None);
        assert_eq!(parse_price_string("£inf/0/0"), None);
    }

    #[test]
    fn test_scale_conversion_rounds_noise() {
        let converted = Conversion::Scale(1000.0).apply(1.1).unwrap();
        assert_eq!(converted, 1100.0);
    }

    #[test]
    fn test_fy_label_century_wrap() {
        assert_eq!(fy_label(1965), "1965-66");
        assert_eq!(fy_label(1999), "1999-00");
        assert_eq!(fy_label(5), "5-06");
    }

    #[test]
    fn test_parse_fy_rejects_labels_without_year() {
        assert_eq!(parse_fy("FY"), None);
        assert_eq!(parse_fy(""), None);
        assert_eq!(parse_fy("2001–02"), Some(2001));
    }
}
