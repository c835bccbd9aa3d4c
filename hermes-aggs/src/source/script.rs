//! Script-backed sources: every value comes from running a script per document.

use std::fmt::Write as _;

use super::{NumericValuesSource, ValuesSource};
use crate::DocId;
use crate::error::Result;
use crate::script::{ScriptValueType, SearchScript};
use crate::values::{BytesBuffer, BytesValues, DoubleValues, LongValues, NumericBuffer};

/// Runs the script once per document and buffers the flattened result in the
/// representation of the stream that asked.
pub(crate) struct ScriptValues {
    script: Box<dyn SearchScript>,
    longs: NumericBuffer<i64>,
    doubles: NumericBuffer<f64>,
    bytes: BytesBuffer,
    scratch: String,
}

impl ScriptValues {
    fn new(script: Box<dyn SearchScript>) -> Self {
        Self {
            script,
            longs: NumericBuffer::new(),
            doubles: NumericBuffer::new(),
            bytes: BytesBuffer::new(),
            scratch: String::new(),
        }
    }
}

impl BytesValues for ScriptValues {
    fn is_multi_valued(&self) -> bool {
        true
    }

    fn set_document(&mut self, doc: DocId) -> Result<usize> {
        self.script.set_next_doc(doc);
        let result = self.script.run()?;
        self.bytes.clear();
        for value in result.as_values() {
            self.scratch.clear();
            let _ = write!(self.scratch, "{value}");
            self.bytes.push(self.scratch.as_bytes());
        }
        Ok(self.bytes.select())
    }

    fn next_value(&mut self) -> &[u8] {
        self.bytes.next()
    }
}

impl LongValues for ScriptValues {
    fn is_multi_valued(&self) -> bool {
        true
    }

    fn set_document(&mut self, doc: DocId) -> Result<usize> {
        self.script.set_next_doc(doc);
        let result = self.script.run()?;
        self.longs.clear();
        for value in result.as_values() {
            self.longs.push(value.to_long()?);
        }
        Ok(self.longs.select())
    }

    fn next_value(&mut self) -> i64 {
        self.longs.next()
    }
}

impl DoubleValues for ScriptValues {
    fn is_multi_valued(&self) -> bool {
        true
    }

    fn set_document(&mut self, doc: DocId) -> Result<usize> {
        self.script.set_next_doc(doc);
        let result = self.script.run()?;
        self.doubles.clear();
        for value in result.as_values() {
            self.doubles.push(value.to_double()?);
        }
        Ok(self.doubles.select())
    }

    fn next_value(&mut self) -> f64 {
        self.doubles.next()
    }
}

/// Byte-string values computed by a script.
pub struct BytesScript {
    values: ScriptValues,
}

impl BytesScript {
    pub fn new(script: Box<dyn SearchScript>) -> Self {
        Self {
            values: ScriptValues::new(script),
        }
    }
}

impl ValuesSource for BytesScript {
    fn bytes_values(&mut self) -> Result<&mut dyn BytesValues> {
        Ok(&mut self.values)
    }
}

/// Numeric values computed by a script.
pub struct NumericScript {
    values: ScriptValues,
    value_type: Option<ScriptValueType>,
}

impl NumericScript {
    /// Without a declared `value_type` the script is assumed to produce
    /// floating-point values.
    pub fn new(script: Box<dyn SearchScript>, value_type: Option<ScriptValueType>) -> Self {
        Self {
            values: ScriptValues::new(script),
            value_type,
        }
    }
}

impl ValuesSource for NumericScript {
    fn bytes_values(&mut self) -> Result<&mut dyn BytesValues> {
        Ok(&mut self.values)
    }
}

impl NumericValuesSource for NumericScript {
    fn is_floating_point(&self) -> bool {
        self.value_type
            .map(|t| t.is_floating_point())
            .unwrap_or(true)
    }

    fn long_values(&mut self) -> Result<&mut dyn LongValues> {
        Ok(&mut self.values)
    }

    fn double_values(&mut self) -> Result<&mut dyn DoubleValues> {
        Ok(&mut self.values)
    }
}
