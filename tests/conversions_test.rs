// Properties of the unit and pre-decimal currency conversions

use dairy_stats::conversions::{
    convert_area, convert_price_per_volume, convert_price_per_weight, convert_volume,
    convert_weight, fy_label, parse_fy, parse_pre_decimal_price, parse_price_string, round_to,
    Conversion, ConversionError,
};

fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_pre_decimal_price_matches_pence_formula() {
    for pounds in 0..4 {
        for shillings in 0..20 {
            for pence in 0..12 {
                let (p, s, d) = (pounds as f64, shillings as f64, pence as f64);
                let expected = round_to((p * 240.0 + s * 12.0 + d) * (10.0 / 12.0) / 100.0, 4);
                assert_eq!(parse_pre_decimal_price(p, s, d), expected, "{pounds}/{shillings}/{pence}");
            }
        }
    }
    assert_eq!(parse_pre_decimal_price(1.0, 2.0, 6.0), 2.25);
}

#[test]
fn test_price_string_notations() {
    assert_eq!(parse_price_string("3s 6d"), Some(0.35));
    assert_eq!(parse_price_string("3s6d"), Some(0.35));
    assert_eq!(parse_price_string("15/6"), Some(1.55));
    assert_eq!(parse_price_string("42d"), Some(0.35));
    assert_eq!(parse_price_string("$1.50"), Some(1.50));
    assert_eq!(parse_price_string("£1/2/6"), Some(2.25));
    assert_eq!(parse_price_string("1.50"), Some(1.50));
}

#[test]
fn test_unparseable_price_string_is_none_not_zero() {
    assert_eq!(parse_price_string("n.a."), None);
    assert_eq!(parse_price_string(""), None);
    assert_eq!(parse_price_string("about a shilling"), None);
}

#[test]
fn test_volume_round_trips_through_litres() {
    for unit in ["litres", "megalitres", "gallons"] {
        let x = 123.456;
        let litres = convert_volume(x, unit, "litres").unwrap();
        let back = convert_volume(litres, "litres", unit).unwrap();
        assert_close(back, x, 1e-5);
    }
}

#[test]
fn test_weight_round_trips_through_kilograms() {
    for unit in ["kg", "tonnes", "lbs"] {
        let x = 98.765;
        let kg = convert_weight(x, unit, "kg").unwrap();
        let back = convert_weight(kg, "kg", unit).unwrap();
        assert_close(back, x, 1e-5);
    }
}

#[test]
fn test_imperial_reference_values() {
    assert_close(convert_volume(1.0, "gallons", "litres").unwrap(), 4.54609, 1e-9);
    assert_close(convert_weight(1.0, "tons", "tonnes").unwrap(), 1.01605, 1e-9);
    assert_close(convert_volume(1.0, "million_gallons", "megalitres").unwrap(), 4.54609, 1e-6);
    assert_close(convert_weight(2.0, "kilotonnes", "tonnes").unwrap(), 2000.0, 1e-9);
    assert_close(convert_area(1.0, "acres", "hectares").unwrap(), 0.404686, 1e-9);
}

#[test]
fn test_unknown_units_are_errors() {
    assert_eq!(
        convert_volume(1.0, "furlongs", "litres"),
        Err(ConversionError::UnknownUnit {
            kind: "volume",
            unit: "furlongs".to_string(),
        })
    );
    assert!(matches!(
        convert_volume(1.0, "litres", "pints"),
        Err(ConversionError::UnknownUnit { .. })
    ));
    assert!(matches!(
        convert_weight(1.0, "stone", "kg"),
        Err(ConversionError::UnknownUnit { .. })
    ));
    assert!(matches!(
        convert_area(1.0, "roods", "hectares"),
        Err(ConversionError::UnknownUnit { .. })
    ));
}

#[test]
fn test_price_per_volume_and_weight() {
    // 12 pence per gallon is 10 cents over 4.54609 litres
    assert_close(
        convert_price_per_volume(12.0, "pence", "gallon", "cents", "litre").unwrap(),
        2.1997,
        1e-9,
    );
    // $3,500 per tonne is 350 cents per kg
    assert_close(
        convert_price_per_weight(3500.0, "dollars", "tonne", "cents", "kg").unwrap(),
        350.0,
        1e-9,
    );
    assert!(matches!(
        convert_price_per_weight(1.0, "guineas", "lb", "cents", "kg"),
        Err(ConversionError::UnknownUnit { .. })
    ));
    assert!(matches!(
        convert_price_per_volume(1.0, "cents", "litre", "cents", "gallon"),
        Err(ConversionError::UnsupportedTarget { .. })
    ));
}

#[test]
fn test_conversion_descriptors() {
    assert_eq!(Conversion::Scale(1000.0).apply(1.698).unwrap(), 1698.0);
    assert_eq!(
        Conversion::Weight {
            from: "kilotonnes",
            to: "tonnes"
        }
        .apply(0.5)
        .unwrap(),
        500.0
    );
    assert_eq!(Conversion::Identity.apply(7.25).unwrap(), 7.25);
}

#[test]
fn test_fy_label_round_trips() {
    for year in (-2100..=2100).chain([i32::MIN, i32::MAX, 0, 99, 1899, 1999]) {
        assert_eq!(parse_fy(&fy_label(year)), Some(year), "year {year}");
    }
    assert_eq!(fy_label(1965), "1965-66");
    assert_eq!(fy_label(1999), "1999-00");
}
