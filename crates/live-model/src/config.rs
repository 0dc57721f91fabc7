//! Engine configuration and per-schema overrides.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Post-processing hook applied to every materialized array field.
///
/// Receives the converted elements and returns the vector that is stored.
pub type ArrayCtor = Arc<dyn Fn(Vec<Value>) -> Vec<Value> + Send + Sync>;

/// Engine-wide configuration.
///
/// Constructed once per [`crate::Engine`]; immutable afterwards. A schema
/// definition merges [`ConfigOverrides`] over it (override wins) and the
/// merged result is frozen into the schema.
#[derive(Clone)]
pub struct Config {
    /// Coerce non-string scalars to strings on conversion.
    pub cast_string: bool,
    /// Parse textual numbers on conversion.
    pub parse_numbers: bool,
    /// Attach a change signal to every instance.
    pub change_event: bool,
    /// Expose undeclared input properties through `get`.
    pub extra_properties: bool,
    /// Expose the internal working store via `plain_data`.
    pub embed_plain_data: bool,
    /// Post-process every materialized array field.
    pub array_constructor: Option<ArrayCtor>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cast_string: true,
            parse_numbers: true,
            change_event: true,
            extra_properties: false,
            embed_plain_data: true,
            array_constructor: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("cast_string", &self.cast_string)
            .field("parse_numbers", &self.parse_numbers)
            .field("change_event", &self.change_event)
            .field("extra_properties", &self.extra_properties)
            .field("embed_plain_data", &self.embed_plain_data)
            .field("array_constructor", &self.array_constructor.is_some())
            .finish()
    }
}

/// Per-schema configuration overrides. Unset fields fall back to the engine
/// config.
#[derive(Clone, Default)]
pub struct ConfigOverrides {
    pub cast_string: Option<bool>,
    pub parse_numbers: Option<bool>,
    pub change_event: Option<bool>,
    pub extra_properties: Option<bool>,
    pub embed_plain_data: Option<bool>,
    pub array_constructor: Option<ArrayCtor>,
}

impl ConfigOverrides {
    /// Merge these overrides over `base`, producing the effective config.
    pub fn apply(&self, base: &Config) -> Config {
        Config {
            cast_string: self.cast_string.unwrap_or(base.cast_string),
            parse_numbers: self.parse_numbers.unwrap_or(base.parse_numbers),
            change_event: self.change_event.unwrap_or(base.change_event),
            extra_properties: self.extra_properties.unwrap_or(base.extra_properties),
            embed_plain_data: self.embed_plain_data.unwrap_or(base.embed_plain_data),
            array_constructor: self
                .array_constructor
                .clone()
                .or_else(|| base.array_constructor.clone()),
        }
    }
}

impl fmt::Debug for ConfigOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOverrides")
            .field("cast_string", &self.cast_string)
            .field("parse_numbers", &self.parse_numbers)
            .field("change_event", &self.change_event)
            .field("extra_properties", &self.extra_properties)
            .field("embed_plain_data", &self.embed_plain_data)
            .field("array_constructor", &self.array_constructor.is_some())
            .finish()
    }
}
