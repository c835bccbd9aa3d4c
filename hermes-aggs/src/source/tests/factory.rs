use super::*;
use crate::config::ValuesSourceConfig;
use crate::context::{AggregationContext, FieldDataRegistry, FieldKind};
use crate::error::{Error, Result};
use crate::fielddata::ram::{RamGeoPointFieldData, RamGeoPointIndex};
use crate::script::ScriptValueType;
use crate::source::{GeoPointValuesSource, NumericValuesSource, Uniqueness, ValuesSource};
use crate::values::{GeoPoint, GeoPointValues, Order, hash_bytes};

fn compile(source: &str) -> Result<Box<dyn SearchScript>> {
    match source {
        "_value + 1" => Ok(plus_one()),
        "upper(_value)" => Ok(upper()),
        "doc.scores" => Ok(docs_script(vec![
            ScriptValue::from(vec![3i64, 1, 3]),
            ScriptValue::Double(0.5),
        ])),
        other => Err(Error::Script(format!("unknown script: {other}"))),
    }
}

/// tags: text, price: i64 (two segments), weight: f64, location: geo.
fn context() -> AggregationContext {
    let registry = FieldDataRegistry::new();
    registry.register_bytes(text_field(
        "tags",
        vec![vec![vec!["rust", "db", "rust"], vec![]]],
    ));
    registry.register_numeric(long_field(
        "price",
        vec![vec![vec![10, 20]], vec![vec![30]]],
    ));
    registry.register_numeric(double_field("weight", vec![vec![vec![0.25, 0.5]]]));

    let location = RamGeoPointIndex::new("location");
    location.insert(
        seg(0).id,
        RamGeoPointFieldData::from_docs(vec![vec![GeoPoint::new(52.5, 13.4)]]),
    );
    registry.register_geo_point(Arc::new(location));

    AggregationContext::new(Arc::new(registry), Arc::new(compile))
}

fn config(json: &str) -> ValuesSourceConfig {
    serde_json::from_str(json).unwrap()
}

// ── Wiring ───────────────────────────────────────────────────────────────

#[test]
fn test_bytes_field_source() {
    let ctx = context();
    let mut source = ctx.bytes_source(&config(r#"{"field": "tags"}"#)).unwrap();
    assert_eq!(source.uniqueness(), Uniqueness::Unique);
    source.set_next_segment(&seg(0)).unwrap();
    let values = source.bytes_values().unwrap();
    assert_eq!(values.order(), Order::Bytes);
    assert_eq!(strings(values, 0), vec!["db", "rust"]);
}

#[test]
fn test_bytes_source_over_numeric_and_geo_fields() {
    let ctx = context();
    let mut price = ctx.bytes_source(&ValuesSourceConfig::field("price")).unwrap();
    price.set_next_segment(&seg(1)).unwrap();
    assert_eq!(strings(price.bytes_values().unwrap(), 0), vec!["30"]);

    let mut location = ctx
        .bytes_source(&ValuesSourceConfig::field("location"))
        .unwrap();
    location.set_next_segment(&seg(0)).unwrap();
    assert_eq!(strings(location.bytes_values().unwrap(), 0), vec!["52.5,13.4"]);
}

#[test]
fn test_needs_hashes_reaches_storage() {
    let ctx = context();
    let mut source = ctx
        .bytes_source(&config(r#"{"field": "tags", "needs_hashes": true}"#))
        .unwrap();
    source.set_next_segment(&seg(0)).unwrap();
    let values = source.bytes_values().unwrap();
    assert_eq!(values.set_document(0).unwrap(), 2);
    let (value, hash) = values.next_value_with_hash();
    assert_eq!(value, b"db");
    assert_eq!(hash, hash_bytes(b"db"));
}

#[test]
fn test_numeric_field_with_script_overlay() {
    let ctx = context();
    let mut source = ctx
        .numeric_source(&ValuesSourceConfig::field("price").with_script("_value + 1"))
        .unwrap();
    assert!(source.is_floating_point());
    assert_eq!(source.uniqueness(), Uniqueness::Unknown);

    source.set_next_segment(&seg(0)).unwrap();
    assert_eq!(longs(source.long_values().unwrap(), 0), vec![11, 21]);
    source.set_next_segment(&seg(1)).unwrap();
    assert_eq!(longs(source.long_values().unwrap(), 0), vec![31]);
}

#[test]
fn test_bytes_field_with_script_overlay() {
    let ctx = context();
    let mut source = ctx
        .bytes_source(&config(r#"{"field": "tags", "script": "upper(_value)"}"#))
        .unwrap();
    source.set_next_segment(&seg(0)).unwrap();
    assert_eq!(strings(source.bytes_values().unwrap(), 0), vec!["DB", "RUST"]);
}

#[test]
fn test_numeric_script_source_and_value_type() {
    let ctx = context();
    let source = ctx
        .numeric_source(&config(r#"{"script": "doc.scores", "value_type": "long"}"#))
        .unwrap();
    assert!(!source.is_floating_point());

    let mut source = ctx
        .numeric_source(&ValuesSourceConfig::script("doc.scores"))
        .unwrap();
    assert!(source.is_floating_point());
    assert_eq!(longs(source.long_values().unwrap(), 0), vec![3, 1, 3]);
    assert_eq!(doubles(source.double_values().unwrap(), 1), vec![0.5]);
}

#[test]
fn test_ensure_unique_wraps_source() {
    let ctx = context();
    let mut source = ctx
        .numeric_source(
            &ValuesSourceConfig::script("doc.scores")
                .with_value_type(ScriptValueType::Long)
                .with_ensure_unique(true),
        )
        .unwrap();
    assert_eq!(source.uniqueness(), Uniqueness::Unique);
    assert!(!source.is_floating_point());
    let values = source.long_values().unwrap();
    assert_eq!(values.order(), Order::Numeric);
    assert_eq!(longs(values, 0), vec![1, 3]);

    let mut tags = ctx
        .bytes_source(&ValuesSourceConfig::field("tags").with_ensure_unique(true))
        .unwrap();
    tags.set_next_segment(&seg(0)).unwrap();
    assert_eq!(strings(tags.bytes_values().unwrap(), 0), vec!["db", "rust"]);
}

#[test]
fn test_geo_point_source() {
    let ctx = context();
    let mut source = ctx
        .geo_point_source(&ValuesSourceConfig::field("location"))
        .unwrap();
    source.set_next_segment(&seg(0)).unwrap();
    let points = source.geo_point_values().unwrap();
    assert_eq!(points.set_document(0).unwrap(), 1);
    assert_eq!(points.next_value(), GeoPoint::new(52.5, 13.4));
}

// ── Errors ───────────────────────────────────────────────────────────────

#[test]
fn test_missing_field_and_script_is_invalid() {
    let ctx = context();
    let empty = ValuesSourceConfig::default();
    assert!(matches!(ctx.bytes_source(&empty), Err(Error::InvalidConfig(_))));
    assert!(matches!(ctx.numeric_source(&empty), Err(Error::InvalidConfig(_))));
    assert!(matches!(ctx.geo_point_source(&empty), Err(Error::InvalidConfig(_))));
}

#[test]
fn test_unknown_field() {
    let ctx = context();
    let cfg = ValuesSourceConfig::field("nope");
    assert!(matches!(ctx.bytes_source(&cfg), Err(Error::FieldNotFound(f)) if f == "nope"));
    assert!(matches!(ctx.numeric_source(&cfg), Err(Error::FieldNotFound(_))));
    assert!(matches!(ctx.geo_point_source(&cfg), Err(Error::FieldNotFound(_))));
}

#[test]
fn test_wrong_field_kind() {
    let ctx = context();
    match ctx.numeric_source(&ValuesSourceConfig::field("tags")) {
        Err(Error::InvalidFieldType {
            field,
            expected,
            got,
        }) => {
            assert_eq!(field, "tags");
            assert_eq!(expected, "numeric");
            assert_eq!(got, "bytes");
        }
        other => panic!("expected a field type error, got {:?}", other.err()),
    }
    assert!(matches!(
        ctx.geo_point_source(&ValuesSourceConfig::field("price")),
        Err(Error::InvalidFieldType { got, .. }) if got == "i64"
    ));
}

#[test]
fn test_geo_point_rejects_scripts() {
    let ctx = context();
    let cfg = ValuesSourceConfig::field("location").with_script("_value + 1");
    assert!(matches!(ctx.geo_point_source(&cfg), Err(Error::InvalidConfig(_))));
}

#[test]
fn test_compile_errors_propagate() {
    let ctx = context();
    assert!(matches!(
        ctx.bytes_source(&ValuesSourceConfig::script("rm -rf")),
        Err(Error::Script(_))
    ));
}

#[test]
fn test_registry_replaces_field_kind() {
    let ctx = context();
    let registry = ctx.registry();
    assert_eq!(
        registry.field_kind("weight"),
        Some(FieldKind::Numeric(NumericType::F64))
    );
    registry.register_bytes(text_field("weight", vec![]));
    assert_eq!(registry.field_kind("weight"), Some(FieldKind::Bytes));
    assert!(registry.numeric_field("weight").is_none());
    assert!(registry.unregister("weight"));
    assert_eq!(registry.field_kind("weight"), None);
    assert!(!registry.unregister("weight"));
}
