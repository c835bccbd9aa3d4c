//! Field registry and value source factory.
//!
//! [`AggregationContext`] turns a [`ValuesSourceConfig`] into the source
//! stack an aggregation reads from:
//!
//! | field | script | source                                         |
//! |-------|--------|------------------------------------------------|
//! | yes   | no     | field data                                     |
//! | no    | yes    | script                                         |
//! | yes   | yes    | script overlay over field data                 |
//!
//! `ensure_unique` wraps the result in a sort/dedupe normalizer.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::config::{NO_SOURCE, ValuesSourceConfig};
use crate::error::{Error, Result};
use crate::fielddata::{IndexFieldData, IndexGeoPointFieldData, IndexNumericFieldData, NumericType};
use crate::script::ScriptCompiler;
use crate::source::{
    BytesFieldData, BytesScript, BytesSortedAndUnique, GeoPointFieldData, GeoPointValuesSource,
    NumericFieldData, NumericScript, NumericSortedAndUnique, NumericValuesSource,
    NumericWithScript, ValuesSource, WithScript,
};

/// Kind of a registered field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Bytes,
    Numeric(NumericType),
    GeoPoint,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Bytes => "bytes",
            FieldKind::Numeric(t) => t.name(),
            FieldKind::GeoPoint => "geo_point",
        }
    }
}

// ── Registry ─────────────────────────────────────────────────────────────

/// Field name → field data handle. A name is registered under one kind;
/// registering it again replaces the previous handle whatever its kind.
#[derive(Default)]
pub struct FieldDataRegistry {
    bytes: RwLock<FxHashMap<String, Arc<dyn IndexFieldData>>>,
    numeric: RwLock<FxHashMap<String, Arc<dyn IndexNumericFieldData>>>,
    geo: RwLock<FxHashMap<String, Arc<dyn IndexGeoPointFieldData>>>,
}

impl FieldDataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_bytes(&self, index: Arc<dyn IndexFieldData>) {
        let name = index.field_name().to_string();
        self.unregister(&name);
        log::debug!("FieldDataRegistry: register bytes field '{name}'");
        self.bytes.write().insert(name, index);
    }

    pub fn register_numeric(&self, index: Arc<dyn IndexNumericFieldData>) {
        let name = index.field_name().to_string();
        self.unregister(&name);
        log::debug!(
            "FieldDataRegistry: register {} field '{name}'",
            index.numeric_type().name()
        );
        self.numeric.write().insert(name, index);
    }

    pub fn register_geo_point(&self, index: Arc<dyn IndexGeoPointFieldData>) {
        let name = index.field_name().to_string();
        self.unregister(&name);
        log::debug!("FieldDataRegistry: register geo_point field '{name}'");
        self.geo.write().insert(name, index);
    }

    /// Returns whether the field was registered.
    pub fn unregister(&self, name: &str) -> bool {
        let removed_bytes = self.bytes.write().remove(name).is_some();
        let removed_numeric = self.numeric.write().remove(name).is_some();
        let removed_geo = self.geo.write().remove(name).is_some();
        removed_bytes || removed_numeric || removed_geo
    }

    pub fn field_kind(&self, name: &str) -> Option<FieldKind> {
        if self.bytes.read().contains_key(name) {
            return Some(FieldKind::Bytes);
        }
        if let Some(index) = self.numeric.read().get(name) {
            return Some(FieldKind::Numeric(index.numeric_type()));
        }
        if self.geo.read().contains_key(name) {
            return Some(FieldKind::GeoPoint);
        }
        None
    }

    pub fn bytes_field(&self, name: &str) -> Option<Arc<dyn IndexFieldData>> {
        self.bytes.read().get(name).cloned()
    }

    pub fn numeric_field(&self, name: &str) -> Option<Arc<dyn IndexNumericFieldData>> {
        self.numeric.read().get(name).cloned()
    }

    pub fn geo_point_field(&self, name: &str) -> Option<Arc<dyn IndexGeoPointFieldData>> {
        self.geo.read().get(name).cloned()
    }
}

// ── Factory ──────────────────────────────────────────────────────────────

/// Builds value sources for one search over the registered fields.
pub struct AggregationContext {
    registry: Arc<FieldDataRegistry>,
    compiler: Arc<dyn ScriptCompiler>,
}

impl AggregationContext {
    pub fn new(registry: Arc<FieldDataRegistry>, compiler: Arc<dyn ScriptCompiler>) -> Self {
        Self { registry, compiler }
    }

    pub fn registry(&self) -> &Arc<FieldDataRegistry> {
        &self.registry
    }

    /// Byte-string source. Any field kind can be read as bytes.
    pub fn bytes_source(&self, config: &ValuesSourceConfig) -> Result<Box<dyn ValuesSource>> {
        let mut source: Box<dyn ValuesSource> = match (&config.field, &config.script) {
            (Some(field), None) => self.bytes_field(field)?,
            (None, Some(script)) => Box::new(BytesScript::new(self.compiler.compile(script)?)),
            (Some(field), Some(script)) => Box::new(WithScript::new(
                self.bytes_field(field)?,
                self.compiler.compile(script)?,
            )),
            (None, None) => return Err(Error::InvalidConfig(NO_SOURCE.to_string())),
        };
        if config.ensure_unique {
            source = Box::new(BytesSortedAndUnique::new(source));
        }
        source.set_needs_hashes(config.needs_hashes);
        log::debug!(
            "AggregationContext: bytes source field={:?} script={} unique={} hashes={}",
            config.field,
            config.script.is_some(),
            config.ensure_unique,
            config.needs_hashes
        );
        Ok(source)
    }

    /// Numeric source. The field, if any, must be numeric.
    pub fn numeric_source(
        &self,
        config: &ValuesSourceConfig,
    ) -> Result<Box<dyn NumericValuesSource>> {
        let mut source: Box<dyn NumericValuesSource> = match (&config.field, &config.script) {
            (Some(field), None) => self.numeric_field(field)?,
            (None, Some(script)) => Box::new(NumericScript::new(
                self.compiler.compile(script)?,
                config.value_type,
            )),
            (Some(field), Some(script)) => Box::new(NumericWithScript::new(
                self.numeric_field(field)?,
                self.compiler.compile(script)?,
            )),
            (None, None) => return Err(Error::InvalidConfig(NO_SOURCE.to_string())),
        };
        if config.ensure_unique {
            source = Box::new(NumericSortedAndUnique::new(source));
        }
        source.set_needs_hashes(config.needs_hashes);
        log::debug!(
            "AggregationContext: numeric source field={:?} script={} unique={} floating={}",
            config.field,
            config.script.is_some(),
            config.ensure_unique,
            source.is_floating_point()
        );
        Ok(source)
    }

    /// Geo-point source. Requires a geo-point field; scripts are rejected.
    pub fn geo_point_source(
        &self,
        config: &ValuesSourceConfig,
    ) -> Result<Box<dyn GeoPointValuesSource>> {
        if config.script.is_some() {
            return Err(Error::InvalidConfig(
                "geo_point sources do not support scripts".to_string(),
            ));
        }
        let Some(field) = &config.field else {
            return Err(Error::InvalidConfig(
                "geo_point sources require a field".to_string(),
            ));
        };
        let index = self
            .registry
            .geo_point_field(field)
            .ok_or_else(|| self.missing_or_mistyped(field, "geo_point"))?;
        let mut source = GeoPointFieldData::new(index);
        source.set_needs_hashes(config.needs_hashes);
        log::debug!("AggregationContext: geo_point source field={field:?}");
        Ok(Box::new(source))
    }

    fn bytes_field(&self, name: &str) -> Result<Box<dyn ValuesSource>> {
        if let Some(index) = self.registry.bytes_field(name) {
            return Ok(Box::new(BytesFieldData::new(index)));
        }
        if let Some(index) = self.registry.numeric_field(name) {
            return Ok(Box::new(NumericFieldData::new(index)));
        }
        if let Some(index) = self.registry.geo_point_field(name) {
            return Ok(Box::new(GeoPointFieldData::new(index)));
        }
        Err(Error::FieldNotFound(name.to_string()))
    }

    fn numeric_field(&self, name: &str) -> Result<Box<dyn NumericValuesSource>> {
        match self.registry.numeric_field(name) {
            Some(index) => Ok(Box::new(NumericFieldData::new(index))),
            None => Err(self.missing_or_mistyped(name, "numeric")),
        }
    }

    fn missing_or_mistyped(&self, name: &str, expected: &str) -> Error {
        match self.registry.field_kind(name) {
            Some(kind) => Error::InvalidFieldType {
                field: name.to_string(),
                expected: expected.to_string(),
                got: kind.name().to_string(),
            },
            None => Error::FieldNotFound(name.to_string()),
        }
    }
}
