use super::*;
use crate::error::Error;
use crate::script::ScriptValueType;
use crate::source::{
    BytesFieldData, BytesScript, NumericFieldData, NumericScript, NumericValuesSource,
    NumericWithScript, Uniqueness, ValuesSource, WithScript,
};
use crate::values::Order;

// ── Script-backed sources ────────────────────────────────────────────────

#[test]
fn test_results_are_flattened_per_document() {
    let script = docs_script(vec![
        ScriptValue::Null,
        ScriptValue::from(vec![ScriptValue::Long(3), ScriptValue::from("x")]),
        ScriptValue::Double(1.5),
        ScriptValue::Bool(true),
    ]);
    let mut source = BytesScript::new(script);
    assert_eq!(source.uniqueness(), Uniqueness::Unknown);

    let values = source.bytes_values().unwrap();
    assert!(values.is_multi_valued());
    assert_eq!(values.order(), Order::None);
    assert!(strings(values, 0).is_empty());
    assert_eq!(strings(values, 1), vec!["3", "x"]);
    assert_eq!(strings(values, 2), vec!["1.5"]);
    assert_eq!(strings(values, 3), vec!["true"]);
}

#[test]
fn test_numeric_coercions() {
    let script = docs_script(vec![
        ScriptValue::Double(2.7),
        ScriptValue::from(vec![ScriptValue::Long(1), ScriptValue::Double(-2.5)]),
        ScriptValue::from("12"),
    ]);
    let mut source = NumericScript::new(script, Some(ScriptValueType::Long));

    let values = source.long_values().unwrap();
    assert_eq!(longs(values, 0), vec![2]);
    assert_eq!(longs(values, 1), vec![1, -2]);
    assert!(matches!(values.set_document(2), Err(Error::Script(_))));

    let values = source.double_values().unwrap();
    assert_eq!(doubles(values, 1), vec![1.0, -2.5]);
    assert_eq!(values.order(), Order::None);
}

#[test]
fn test_script_sees_current_document() {
    let script = Box::new(FnScript::new(|ctx| {
        Ok(ScriptValue::Long(ctx.doc().map(|d| d as i64 * 10).unwrap_or(-1)))
    }));
    let mut source = NumericScript::new(script, None);
    let values = source.long_values().unwrap();
    assert_eq!(longs(values, 4), vec![40]);
    assert_eq!(longs(values, 0), vec![0]);
}

#[test]
fn test_floating_point_from_value_type() {
    let make = |value_type| NumericScript::new(docs_script(vec![]), value_type);
    assert!(make(None).is_floating_point());
    assert!(make(Some(ScriptValueType::Double)).is_floating_point());
    assert!(!make(Some(ScriptValueType::Long)).is_floating_point());
    assert!(!make(Some(ScriptValueType::String)).is_floating_point());
}

#[test]
fn test_script_errors_propagate() {
    let failing: Box<dyn SearchScript> =
        Box::new(FnScript::new(|_| Err(Error::Script("division by zero".into()))));
    let mut source = BytesScript::new(failing);
    let err = source.bytes_values().unwrap().set_document(0).unwrap_err();
    assert!(err.to_string().contains("division by zero"));
}

// ── Overlays ─────────────────────────────────────────────────────────────

#[test]
fn test_numeric_overlay_maps_every_value() {
    let field = long_field("n", vec![vec![vec![10, 20], vec![]]]);
    let mut source = NumericWithScript::new(Box::new(NumericFieldData::new(field)), plus_one());
    source.set_next_segment(&seg(0)).unwrap();

    let values = source.long_values().unwrap();
    assert_eq!(longs(values, 0), vec![11, 21]);
    assert!(longs(values, 1).is_empty());
    assert_eq!(doubles(source.double_values().unwrap(), 0), vec![11.0, 21.0]);
    assert_eq!(source.uniqueness(), Uniqueness::Unknown);
}

#[test]
fn test_numeric_overlay_is_floating_point() {
    let field = long_field("n", vec![]);
    let delegate = NumericFieldData::new(field);
    assert!(!delegate.is_floating_point());
    let source = NumericWithScript::new(Box::new(delegate), plus_one());
    assert!(source.is_floating_point());
    assert!(!source.delegate().is_floating_point());
}

#[test]
fn test_overlay_keeps_arity_and_order() {
    let delegate = BytesScript::new(docs_script(vec![ScriptValue::from(vec!["b", "a", "b"])]));
    let mut source = WithScript::new(Box::new(delegate), upper());
    let values = source.bytes_values().unwrap();
    assert!(values.is_multi_valued());
    assert_eq!(values.order(), Order::None);
    assert_eq!(strings(values, 0), vec!["B", "A", "B"]);
}

#[test]
fn test_overlay_over_field_follows_segments() {
    let text = text_field("t", vec![vec![vec!["b", "a"]], vec![vec!["c"]]]);
    let mut source = WithScript::new(Box::new(BytesFieldData::new(text)), upper());
    source.set_next_segment(&seg(0)).unwrap();
    assert_eq!(strings(source.bytes_values().unwrap(), 0), vec!["A", "B"]);
    source.set_next_segment(&seg(1)).unwrap();
    assert_eq!(strings(source.bytes_values().unwrap(), 0), vec!["C"]);
}

#[test]
fn test_overlay_binds_typed_value() {
    let script = Box::new(FnScript::new(|ctx| {
        Ok(ScriptValue::from(ctx.value().map(|v| v.type_name()).unwrap_or("none")))
    }));
    let field = double_field("f", vec![vec![vec![0.5]]]);
    let mut source = WithScript::new(Box::new(NumericFieldData::new(field)), script);
    source.set_next_segment(&seg(0)).unwrap();
    assert_eq!(strings(source.bytes_values().unwrap(), 0), vec!["text"]);
}
