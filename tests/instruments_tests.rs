use exchange_matcher::instrument::*;

#[test]
fn asset_display_and_parse() {
    assert_eq!(Asset::USD.to_string(), "USD");
    assert_eq!(Asset::CAD.to_string(), "CAD");
    assert_eq!(Asset::EUR.to_string(), "EUR");

    assert_eq!("USD".parse::<Asset>().unwrap(), Asset::USD);
    assert_eq!("CAD".parse::<Asset>().unwrap(), Asset::CAD);
    assert_eq!("EUR".parse::<Asset>().unwrap(), Asset::EUR);
    assert!("JPY".parse::<Asset>().is_err());
}

#[test]
fn pair_display_and_parse_supported() {
    assert_eq!(USD_CAD.to_string(), "USD-CAD");
    assert_eq!(EUR_USD.to_string(), "EUR-USD");
    assert_eq!(USD_CAD.code(), "USD-CAD");

    assert_eq!("USD-CAD".parse::<Pair>().unwrap(), USD_CAD);
    assert_eq!("EUR-USD".parse::<Pair>().unwrap(), EUR_USD);
}

#[test]
fn pair_parse_rejects_unsupported() {
    // Known assets, but not a pair with a book.
    let e = "CAD-USD".parse::<Pair>().unwrap_err();
    assert!(e.contains("unsupported"));
    assert!("".parse::<Pair>().is_err());
}

#[test]
fn serde_pair_is_string_roundtrip() {
    let s = serde_json::to_string(&EUR_USD).unwrap();
    assert_eq!(s, "\"EUR-USD\"");

    let p: Pair = serde_json::from_str("\"USD-CAD\"").unwrap();
    assert_eq!(p, USD_CAD);
}

#[test]
fn serde_pair_rejects_object_form() {
    let bad = r#"{ "base": "EUR", "quote": "USD" }"#;
    assert!(serde_json::from_str::<Pair>(bad).is_err());
}

#[test]
fn supported_and_fromstr_in_sync() {
    for p in Pair::supported() {
        let parsed = p.code().parse::<Pair>().unwrap();
        assert_eq!(&parsed, p);
        assert_eq!(parsed.to_string(), p.code());
    }
}

#[test]
fn pair_is_hashable_and_equatable() {
    use std::collections::HashMap;
    let mut m = HashMap::new();
    m.insert(EUR_USD, 42u32);
    assert_eq!(m.get(&"EUR-USD".parse::<Pair>().unwrap()), Some(&42));
    assert_eq!(m.get(&USD_CAD), None);
}
