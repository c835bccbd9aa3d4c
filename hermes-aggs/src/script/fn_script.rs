//! Closure-backed script evaluator.

use rustc_hash::FxHashMap;

use super::{ScriptValue, SearchScript, VALUE_VAR};
use crate::DocId;
use crate::error::Result;

/// Bindings visible to a running [`FnScript`].
#[derive(Debug, Default)]
pub struct ScriptContext {
    doc: Option<DocId>,
    vars: FxHashMap<String, ScriptValue>,
}

impl ScriptContext {
    /// Document the script was last positioned on.
    pub fn doc(&self) -> Option<DocId> {
        self.doc
    }

    pub fn var(&self, name: &str) -> Option<&ScriptValue> {
        self.vars.get(name)
    }

    /// The raw value bound by transform overlays.
    pub fn value(&self) -> Option<&ScriptValue> {
        self.var(VALUE_VAR)
    }
}

/// A [`SearchScript`] whose body is a Rust closure over the [`ScriptContext`].
///
/// ```
/// use hermes_aggs::{FnScript, ScriptValue, SearchScript};
///
/// let mut plus_one = FnScript::new(|ctx| match ctx.value() {
///     Some(ScriptValue::Long(v)) => Ok(ScriptValue::Long(v + 1)),
///     _ => Ok(ScriptValue::Null),
/// });
/// plus_one.set_next_var("_value", ScriptValue::Long(41));
/// assert_eq!(plus_one.run_as_long().unwrap(), 42);
/// ```
pub struct FnScript<F> {
    ctx: ScriptContext,
    body: F,
}

impl<F> FnScript<F>
where
    F: FnMut(&ScriptContext) -> Result<ScriptValue> + Send,
{
    pub fn new(body: F) -> Self {
        Self {
            ctx: ScriptContext::default(),
            body,
        }
    }

    /// Bind a variable before the script is handed to a value source.
    pub fn with_var(mut self, name: &str, value: impl Into<ScriptValue>) -> Self {
        self.set_next_var(name, value.into());
        self
    }
}

impl<F> SearchScript for FnScript<F>
where
    F: FnMut(&ScriptContext) -> Result<ScriptValue> + Send,
{
    fn set_next_doc(&mut self, doc: DocId) {
        self.ctx.doc = Some(doc);
    }

    fn set_next_var(&mut self, name: &str, value: ScriptValue) {
        match self.ctx.vars.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.ctx.vars.insert(name.to_string(), value);
            }
        }
    }

    fn set_next_text(&mut self, name: &str, value: &str) {
        match self.ctx.vars.get_mut(name) {
            Some(ScriptValue::Text(text)) => {
                text.clear();
                text.push_str(value);
            }
            _ => self.set_next_var(name, ScriptValue::Text(value.to_owned())),
        }
    }

    fn run(&mut self) -> Result<ScriptValue> {
        (self.body)(&self.ctx)
    }
}
