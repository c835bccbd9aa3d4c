//! Script-transform overlays.
//!
//! An overlay reads the delegate's values for the current document and maps
//! each one through the script, with the raw value bound to `_value`. The
//! output keeps the delegate's arity and order: no reordering, no dedup.

use std::fmt::Write as _;

use super::{NumericValuesSource, ValuesSource};
use crate::DocId;
use crate::error::Result;
use crate::script::{ScriptValue, SearchScript, VALUE_VAR};
use crate::segment::SegmentContext;
use crate::values::{BytesBuffer, BytesValues, DoubleValues, LongValues, NumericBuffer};

/// The delegate together with the script and one buffer per stream kind.
///
/// Every stream kind evaluates the whole document in `set_document`; reads
/// only walk the buffer.
pub(crate) struct ScriptTransform<S: ?Sized> {
    script: Box<dyn SearchScript>,
    longs: NumericBuffer<i64>,
    doubles: NumericBuffer<f64>,
    bytes: BytesBuffer,
    scratch: String,
    delegate: Box<S>,
}

impl<S: ?Sized> ScriptTransform<S> {
    fn new(delegate: Box<S>, script: Box<dyn SearchScript>) -> Self {
        Self {
            script,
            longs: NumericBuffer::new(),
            doubles: NumericBuffer::new(),
            bytes: BytesBuffer::new(),
            scratch: String::new(),
            delegate,
        }
    }
}

impl<S: ValuesSource + ?Sized> BytesValues for ScriptTransform<S> {
    fn is_multi_valued(&self) -> bool {
        true
    }

    fn set_document(&mut self, doc: DocId) -> Result<usize> {
        let values = self.delegate.bytes_values()?;
        let count = values.set_document(doc)?;
        self.script.set_next_doc(doc);
        self.bytes.clear();
        for _ in 0..count {
            let raw = String::from_utf8_lossy(values.next_value());
            self.script.set_next_text(VALUE_VAR, &raw);
            let result = self.script.run()?;
            self.scratch.clear();
            let _ = write!(self.scratch, "{result}");
            self.bytes.push(self.scratch.as_bytes());
        }
        Ok(self.bytes.select())
    }

    fn next_value(&mut self) -> &[u8] {
        self.bytes.next()
    }
}

impl<S: NumericValuesSource + ?Sized> LongValues for ScriptTransform<S> {
    fn is_multi_valued(&self) -> bool {
        true
    }

    fn set_document(&mut self, doc: DocId) -> Result<usize> {
        let values = self.delegate.long_values()?;
        let count = values.set_document(doc)?;
        self.script.set_next_doc(doc);
        self.longs.clear();
        for _ in 0..count {
            self.script
                .set_next_var(VALUE_VAR, ScriptValue::Long(values.next_value()));
            self.longs.push(self.script.run_as_long()?);
        }
        Ok(self.longs.select())
    }

    fn next_value(&mut self) -> i64 {
        self.longs.next()
    }
}

impl<S: NumericValuesSource + ?Sized> DoubleValues for ScriptTransform<S> {
    fn is_multi_valued(&self) -> bool {
        true
    }

    fn set_document(&mut self, doc: DocId) -> Result<usize> {
        let values = self.delegate.double_values()?;
        let count = values.set_document(doc)?;
        self.script.set_next_doc(doc);
        self.doubles.clear();
        for _ in 0..count {
            self.script
                .set_next_var(VALUE_VAR, ScriptValue::Double(values.next_value()));
            self.doubles.push(self.script.run_as_double()?);
        }
        Ok(self.doubles.select())
    }

    fn next_value(&mut self) -> f64 {
        self.doubles.next()
    }
}

// ── Sources ──────────────────────────────────────────────────────────────

/// Byte-string overlay over any source.
pub struct WithScript {
    inner: ScriptTransform<dyn ValuesSource>,
}

impl WithScript {
    pub fn new(delegate: Box<dyn ValuesSource>, script: Box<dyn SearchScript>) -> Self {
        Self {
            inner: ScriptTransform::new(delegate, script),
        }
    }

    pub fn delegate(&self) -> &dyn ValuesSource {
        self.inner.delegate.as_ref()
    }
}

impl ValuesSource for WithScript {
    fn bytes_values(&mut self) -> Result<&mut dyn BytesValues> {
        Ok(&mut self.inner)
    }

    fn set_next_segment(&mut self, segment: &SegmentContext) -> Result<()> {
        self.inner.delegate.set_next_segment(segment)
    }
}

/// Numeric overlay over a numeric source.
///
/// Always reports floating point: the script may turn integers into
/// fractions.
pub struct NumericWithScript {
    inner: ScriptTransform<dyn NumericValuesSource>,
}

impl NumericWithScript {
    pub fn new(delegate: Box<dyn NumericValuesSource>, script: Box<dyn SearchScript>) -> Self {
        Self {
            inner: ScriptTransform::new(delegate, script),
        }
    }

    pub fn delegate(&self) -> &dyn NumericValuesSource {
        self.inner.delegate.as_ref()
    }
}

impl ValuesSource for NumericWithScript {
    fn bytes_values(&mut self) -> Result<&mut dyn BytesValues> {
        Ok(&mut self.inner)
    }

    fn set_next_segment(&mut self, segment: &SegmentContext) -> Result<()> {
        self.inner.delegate.set_next_segment(segment)
    }
}

impl NumericValuesSource for NumericWithScript {
    fn is_floating_point(&self) -> bool {
        true
    }

    fn long_values(&mut self) -> Result<&mut dyn LongValues> {
        Ok(&mut self.inner)
    }

    fn double_values(&mut self) -> Result<&mut dyn DoubleValues> {
        Ok(&mut self.inner)
    }
}
