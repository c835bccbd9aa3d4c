//! Script evaluator contract.
//!
//! Value sources never compile or interpret scripts themselves. They drive a
//! [`SearchScript`] per document (script-backed sources) or per value
//! (script-transform overlays, which bind the raw value to [`VALUE_VAR`]).

mod fn_script;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DocId;
use crate::error::{Error, Result};

pub use fn_script::{FnScript, ScriptContext};

/// Variable holding the raw value inside transform scripts.
pub const VALUE_VAR: &str = "_value";

// ── Script values ────────────────────────────────────────────────────────

/// Dynamically typed result of a script run.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Null,
    Bool(bool),
    Long(i64),
    Double(f64),
    Text(String),
    List(Vec<ScriptValue>),
}

impl ScriptValue {
    /// The per-document values this result stands for: nothing for `Null`,
    /// the elements of a `List`, the value itself otherwise.
    pub fn as_values(&self) -> &[ScriptValue] {
        match self {
            ScriptValue::Null => &[],
            ScriptValue::List(items) => items,
            scalar => std::slice::from_ref(scalar),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Null => "null",
            ScriptValue::Bool(_) => "bool",
            ScriptValue::Long(_) => "long",
            ScriptValue::Double(_) => "double",
            ScriptValue::Text(_) => "text",
            ScriptValue::List(_) => "list",
        }
    }

    /// Integer view. Doubles are truncated toward zero (saturating).
    pub fn to_long(&self) -> Result<i64> {
        match self {
            ScriptValue::Long(v) => Ok(*v),
            ScriptValue::Double(v) => Ok(*v as i64),
            other => Err(Error::Script(format!(
                "cannot convert {} to long",
                other.type_name()
            ))),
        }
    }

    /// Floating-point view. Longs are widened.
    pub fn to_double(&self) -> Result<f64> {
        match self {
            ScriptValue::Long(v) => Ok(*v as f64),
            ScriptValue::Double(v) => Ok(*v),
            other => Err(Error::Script(format!(
                "cannot convert {} to double",
                other.type_name()
            ))),
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Null => f.write_str("null"),
            ScriptValue::Bool(v) => write!(f, "{v}"),
            ScriptValue::Long(v) => write!(f, "{v}"),
            ScriptValue::Double(v) => write!(f, "{v}"),
            ScriptValue::Text(v) => f.write_str(v),
            ScriptValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<i64> for ScriptValue {
    fn from(v: i64) -> Self {
        ScriptValue::Long(v)
    }
}

impl From<f64> for ScriptValue {
    fn from(v: f64) -> Self {
        ScriptValue::Double(v)
    }
}

impl From<bool> for ScriptValue {
    fn from(v: bool) -> Self {
        ScriptValue::Bool(v)
    }
}

impl From<&str> for ScriptValue {
    fn from(v: &str) -> Self {
        ScriptValue::Text(v.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(v: String) -> Self {
        ScriptValue::Text(v)
    }
}

impl<T: Into<ScriptValue>> From<Vec<T>> for ScriptValue {
    fn from(v: Vec<T>) -> Self {
        ScriptValue::List(v.into_iter().map(Into::into).collect())
    }
}

// ── Declared value type ──────────────────────────────────────────────────

/// Value type a script is declared to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptValueType {
    String,
    Long,
    Double,
}

impl ScriptValueType {
    pub fn is_floating_point(&self) -> bool {
        matches!(self, ScriptValueType::Double)
    }
}

// ── Evaluator traits ─────────────────────────────────────────────────────

/// A compiled script bound to one aggregation traversal.
pub trait SearchScript: Send {
    /// Position the script on `doc` of the current segment.
    fn set_next_doc(&mut self, doc: DocId);

    /// Bind `name` for the following runs.
    fn set_next_var(&mut self, name: &str, value: ScriptValue);

    /// Bind `name` to text. Evaluators may reuse the previous binding's
    /// buffer; overlays call this once per value.
    fn set_next_text(&mut self, name: &str, value: &str) {
        self.set_next_var(name, ScriptValue::Text(value.to_owned()));
    }

    fn run(&mut self) -> Result<ScriptValue>;

    fn run_as_long(&mut self) -> Result<i64> {
        self.run()?.to_long()
    }

    fn run_as_double(&mut self) -> Result<f64> {
        self.run()?.to_double()
    }
}

/// Turns script source into a runnable [`SearchScript`].
pub trait ScriptCompiler: Send + Sync {
    fn compile(&self, source: &str) -> Result<Box<dyn SearchScript>>;
}

impl<F> ScriptCompiler for F
where
    F: Fn(&str) -> Result<Box<dyn SearchScript>> + Send + Sync,
{
    fn compile(&self, source: &str) -> Result<Box<dyn SearchScript>> {
        self(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_values_flattens() {
        assert!(ScriptValue::Null.as_values().is_empty());
        assert_eq!(ScriptValue::Long(3).as_values(), &[ScriptValue::Long(3)]);
        let list = ScriptValue::from(vec![1i64, 2, 3]);
        assert_eq!(list.as_values().len(), 3);
    }

    #[test]
    fn test_numeric_coercions() {
        assert_eq!(ScriptValue::Double(2.9).to_long().unwrap(), 2);
        assert_eq!(ScriptValue::Double(-2.9).to_long().unwrap(), -2);
        assert_eq!(ScriptValue::Long(4).to_double().unwrap(), 4.0);
        assert!(matches!(
            ScriptValue::from("4").to_long(),
            Err(Error::Script(_))
        ));
        assert!(ScriptValue::Bool(true).to_double().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ScriptValue::Long(-7).to_string(), "-7");
        assert_eq!(ScriptValue::Double(1.5).to_string(), "1.5");
        assert_eq!(ScriptValue::from("abc").to_string(), "abc");
        assert_eq!(ScriptValue::from(vec![1i64, 2]).to_string(), "[1, 2]");
    }

    #[test]
    fn test_value_type_serde() {
        let t: ScriptValueType = serde_json::from_str("\"double\"").unwrap();
        assert_eq!(t, ScriptValueType::Double);
        assert!(t.is_floating_point());
        assert!(!ScriptValueType::Long.is_floating_point());
        assert!(!ScriptValueType::String.is_floating_point());
    }
}
