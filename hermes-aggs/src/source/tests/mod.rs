//! Cross-variant source scenarios over the in-memory field data provider.

mod factory;
mod script;

use std::sync::Arc;

use crate::DocId;
use crate::fielddata::NumericType;
use crate::fielddata::ram::{
    RamBytesFieldData, RamBytesIndex, RamNumericFieldData, RamNumericIndex,
};
use crate::script::{FnScript, ScriptValue, SearchScript};
use crate::segment::{SegmentContext, SegmentId};
use crate::values::{BytesValues, DoubleValues, LongValues};

// ── Segments and fields ──────────────────────────────────────────────────

fn seg(ord: u32) -> SegmentContext {
    SegmentContext::new(SegmentId::from_u128(ord as u128 + 1), ord, 0)
}

/// Integer field; `segments[i]` holds the per-doc values of segment `seg(i)`.
fn long_field(name: &str, segments: Vec<Vec<Vec<i64>>>) -> Arc<RamNumericIndex> {
    let index = RamNumericIndex::new(name, NumericType::I64);
    for (ord, docs) in segments.into_iter().enumerate() {
        index.insert(seg(ord as u32).id, RamNumericFieldData::from_i64_docs(docs));
    }
    Arc::new(index)
}

fn double_field(name: &str, segments: Vec<Vec<Vec<f64>>>) -> Arc<RamNumericIndex> {
    let index = RamNumericIndex::new(name, NumericType::F64);
    for (ord, docs) in segments.into_iter().enumerate() {
        index.insert(seg(ord as u32).id, RamNumericFieldData::from_f64_docs(docs));
    }
    Arc::new(index)
}

fn text_field(name: &str, segments: Vec<Vec<Vec<&str>>>) -> Arc<RamBytesIndex> {
    let index = RamBytesIndex::new(name);
    for (ord, docs) in segments.into_iter().enumerate() {
        index.insert(seg(ord as u32).id, RamBytesFieldData::from_docs(docs));
    }
    Arc::new(index)
}

// ── Scripts ──────────────────────────────────────────────────────────────

/// Returns `docs[doc]` for every document, `Null` past the end.
fn docs_script(docs: Vec<ScriptValue>) -> Box<dyn SearchScript> {
    Box::new(FnScript::new(move |ctx| {
        Ok(ctx
            .doc()
            .and_then(|doc| docs.get(doc as usize))
            .cloned()
            .unwrap_or(ScriptValue::Null))
    }))
}

/// `_value + 1`
fn plus_one() -> Box<dyn SearchScript> {
    Box::new(FnScript::new(|ctx| match ctx.value() {
        Some(ScriptValue::Long(v)) => Ok(ScriptValue::Long(v + 1)),
        Some(ScriptValue::Double(v)) => Ok(ScriptValue::Double(v + 1.0)),
        Some(other) => Err(crate::Error::Script(format!(
            "cannot add 1 to {}",
            other.type_name()
        ))),
        None => Ok(ScriptValue::Null),
    }))
}

/// `_value.to_uppercase()`
fn upper() -> Box<dyn SearchScript> {
    Box::new(FnScript::new(|ctx| {
        Ok(ScriptValue::Text(
            ctx.value().map(|v| v.to_string()).unwrap_or_default().to_uppercase(),
        ))
    }))
}

// ── Readers ──────────────────────────────────────────────────────────────

fn longs(values: &mut dyn LongValues, doc: DocId) -> Vec<i64> {
    let count = values.set_document(doc).unwrap();
    (0..count).map(|_| values.next_value()).collect()
}

fn doubles(values: &mut dyn DoubleValues, doc: DocId) -> Vec<f64> {
    let count = values.set_document(doc).unwrap();
    (0..count).map(|_| values.next_value()).collect()
}

fn strings(values: &mut dyn BytesValues, doc: DocId) -> Vec<String> {
    let count = values.set_document(doc).unwrap();
    (0..count)
        .map(|_| String::from_utf8(values.next_value().to_vec()).unwrap())
        .collect()
}

/// Address of a stream, for instance identity checks.
fn addr<T: ?Sized>(r: &mut T) -> usize {
    r as *mut T as *mut () as usize
}
