//! Naming-scheme round-trip and legacy-decoding tests for `unitpm-core`.
//!
//! Each `#[case]` is isolated.

use rstest::rstest;
use unitpm_core::{CoreError, Identifier, UnitNaming};

fn naming() -> UnitNaming {
    UnitNaming::default()
}

// ---------------------------------------------------------------------------
// 1. encode → decode
// ---------------------------------------------------------------------------

#[rstest]
#[case(0, "api")]
#[case(1, "worker")]
#[case(42, "my-app")]
#[case(7, "a-b-c-d")]
#[case(3, "-leading")]
#[case(9, "123")]
#[case(10, "12-34")]
#[case(u32::MAX, "big")]
#[case(5, "アプリ")]
#[case(8, "with.dots")]
fn encode_then_decode_roundtrips(#[case] id: u32, #[case] name: &str) {
    let unit = naming().encode(id, name);
    assert_eq!(naming().decode(&unit).expect("decode"), (id, name.to_string()));

    let file = naming().file_name(id, name);
    assert_eq!(naming().decode(&file).expect("decode file"), (id, name.to_string()));
}

#[rstest]
#[case("svc-", 3, "api")]
#[case("x", 0, "y")]
#[case("app@", 11, "edge-proxy")]
fn custom_prefix_roundtrips(#[case] prefix: &str, #[case] id: u32, #[case] name: &str) {
    let naming = UnitNaming::new(prefix);
    assert_eq!(naming.decode(&naming.encode(id, name)).unwrap(), (id, name.to_string()));
}

// ---------------------------------------------------------------------------
// 2. Legacy and malformed names
// ---------------------------------------------------------------------------

#[rstest]
#[case("pm2-legacy", "legacy")]
#[case("pm2-legacy.service", "legacy")]
#[case("pm2-web-api", "web-api")]
#[case("pm2-v2-api", "v2-api")]
#[case("pm2--x", "-x")]
#[case("pm2-99999999999-x", "99999999999-x")]
#[case("pm2-", "")]
fn legacy_forms_decode_as_id_zero(#[case] unit: &str, #[case] name: &str) {
    assert_eq!(naming().decode(unit).expect("lenient decode"), (0, name.to_string()));
}

#[rstest]
#[case("nginx.service")]
#[case("pm3-1-api")]
#[case("")]
#[case("PM2-1-api")]
fn foreign_prefix_is_invalid_format(#[case] unit: &str) {
    let err = naming().decode(unit).unwrap_err();
    assert!(matches!(err, CoreError::InvalidFormat { .. }), "got: {err}");
    assert!(err.to_string().contains("invalid unit name"));
}

// ---------------------------------------------------------------------------
// 3. Identifier resolution
// ---------------------------------------------------------------------------

#[rstest]
#[case("0", 0, "x", true)]
#[case("1", 1, "y", true)]
#[case("1", 0, "1", false)]
#[case("y", 1, "y", true)]
#[case("z", 1, "y", false)]
fn identifier_matches_ids_before_names(
    #[case] raw: &str,
    #[case] id: u32,
    #[case] name: &str,
    #[case] expected: bool,
) {
    assert_eq!(Identifier::parse(raw).matches(id, name), expected);
}
