//! Schema definition: the engine, per-schema options, and the compiled
//! schema handed to callers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use live_model_signal::Listener;
use serde_json::Value;

use crate::config::{Config, ConfigOverrides};
use crate::error::{ModelError, SchemaError};
use crate::events::ChangeEvent;
use crate::field::{self, FieldDecl, FieldKind};
use crate::instance::ModelInstance;

/// Hook run on the partially-built instance before field wiring; its return
/// value replaces the instance, which lets a caller install its own signal or
/// other extensions.
pub type PreInit = Arc<dyn Fn(ModelInstance) -> ModelInstance + Send + Sync>;

/// Hook invoked once per instance to obtain the listener attached to the
/// change signal, so a caller can wrap or route notifications.
pub type ListenerFactory = Arc<dyn Fn(&ModelInstance) -> Listener<ChangeEvent> + Send + Sync>;

/// Per-schema options: configuration overrides plus the instantiation hooks.
#[derive(Clone, Default)]
pub struct SchemaOptions {
    pub config: ConfigOverrides,
    pub pre_init: Option<PreInit>,
    pub on_change_listener: Option<ListenerFactory>,
}

impl SchemaOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cast_string(mut self, value: bool) -> Self {
        self.config.cast_string = Some(value);
        self
    }

    pub fn parse_numbers(mut self, value: bool) -> Self {
        self.config.parse_numbers = Some(value);
        self
    }

    pub fn change_event(mut self, value: bool) -> Self {
        self.config.change_event = Some(value);
        self
    }

    pub fn extra_properties(mut self, value: bool) -> Self {
        self.config.extra_properties = Some(value);
        self
    }

    pub fn embed_plain_data(mut self, value: bool) -> Self {
        self.config.embed_plain_data = Some(value);
        self
    }

    pub fn array_constructor<F>(mut self, ctor: F) -> Self
    where
        F: Fn(Vec<Value>) -> Vec<Value> + Send + Sync + 'static,
    {
        self.config.array_constructor = Some(Arc::new(ctor));
        self
    }

    pub fn pre_init<F>(mut self, hook: F) -> Self
    where
        F: Fn(ModelInstance) -> ModelInstance + Send + Sync + 'static,
    {
        self.pre_init = Some(Arc::new(hook));
        self
    }

    pub fn on_change_listener<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ModelInstance) -> Listener<ChangeEvent> + Send + Sync + 'static,
    {
        self.on_change_listener = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for SchemaOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaOptions")
            .field("config", &self.config)
            .field("pre_init", &self.pre_init.is_some())
            .field("on_change_listener", &self.on_change_listener.is_some())
            .finish()
    }
}

/// Entry point: holds the engine-wide configuration and defines schemas.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: Config,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compile a field map into a [`Schema`].
    ///
    /// Declarations are compiled in the order given; unknown type tags,
    /// unknown computed dependencies, and duplicate names fail here, not at
    /// first instantiation.
    pub fn define<S>(
        &self,
        fields: impl IntoIterator<Item = (S, FieldDecl)>,
        options: SchemaOptions,
    ) -> Result<Schema, SchemaError>
    where
        S: Into<String>,
    {
        let config = options.config.apply(&self.config);

        let mut compiled: IndexMap<String, FieldKind> = IndexMap::new();
        for (name, decl) in fields {
            let name = name.into();
            let kind = field::compile(&name, &decl, &config)?;
            if compiled.insert(name.clone(), kind).is_some() {
                return Err(SchemaError::DuplicateField(name));
            }
        }

        // Dependency graph: field name -> computed fields that read it, in
        // declaration order. Built once so cascade order is deterministic.
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        for (name, kind) in &compiled {
            let FieldKind::Computed(computed) = kind else {
                continue;
            };
            for dependency in &computed.depends_on {
                if !compiled.contains_key(dependency) {
                    return Err(SchemaError::UnknownDependency {
                        field: name.clone(),
                        dependency: dependency.clone(),
                    });
                }
                dependents
                    .entry(dependency.clone())
                    .or_default()
                    .push(name.clone());
            }
        }

        Ok(Schema {
            inner: Arc::new(SchemaInner {
                config,
                fields: compiled,
                dependents,
                pre_init: options.pre_init,
                on_change_listener: options.on_change_listener,
            }),
        })
    }
}

pub(crate) struct SchemaInner {
    pub(crate) config: Config,
    pub(crate) fields: IndexMap<String, FieldKind>,
    pub(crate) dependents: HashMap<String, Vec<String>>,
    pub(crate) pre_init: Option<PreInit>,
    pub(crate) on_change_listener: Option<ListenerFactory>,
}

/// A compiled schema. Cheap to clone; immutable; safe to share.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

impl Schema {
    /// Turn a raw JSON object into a live [`ModelInstance`].
    ///
    /// Produces a fresh instance per call; the input is taken by value and
    /// becomes the instance's private working store.
    pub fn instantiate(&self, raw: Value) -> Result<ModelInstance, ModelError> {
        ModelInstance::build(self.inner.clone(), raw)
    }

    /// The effective (merged) configuration this schema was defined with.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Compiled form of one declared field, if present.
    pub fn field(&self, name: &str) -> Option<&FieldKind> {
        self.inner.fields.get(name)
    }

    /// Declared field names, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.inner.fields.keys().map(String::as_str)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("fields", &self.inner.fields.keys().collect::<Vec<_>>())
            .field("config", &self.inner.config)
            .finish()
    }
}
