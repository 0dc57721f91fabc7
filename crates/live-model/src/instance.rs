//! Live model instances: per-call product of a schema, with uniform
//! `get`/`set` accessors over a private working store and synchronous change
//! propagation.

use std::fmt;
use std::sync::Arc;

use live_model_signal::Signal;
use serde_json::{Map, Value};

use crate::error::ModelError;
use crate::events::ChangeEvent;
use crate::field::{ComputedField, FieldKind};
use crate::schema::SchemaInner;

/// A model produced by [`crate::Schema::instantiate`].
///
/// Each instance owns its working store; no storage is shared with other
/// instances or with the caller's input. Mutation requires `&mut`, so a
/// single instance is never written from two logical tasks at once.
pub struct ModelInstance {
    schema: Arc<SchemaInner>,
    data: Map<String, Value>,
    signal: Option<Signal<ChangeEvent>>,
    /// Computed fields currently mid-set; their dependency fanout is
    /// suppressed so their own notification fires exactly once, last.
    cascading: Vec<String>,
}

impl ModelInstance {
    pub(crate) fn build(schema: Arc<SchemaInner>, raw: Value) -> Result<Self, ModelError> {
        let data = match raw {
            Value::Object(map) => map,
            other => return Err(ModelError::NotObject(other)),
        };

        let mut instance = Self {
            schema: schema.clone(),
            data,
            signal: schema.config.change_event.then(Signal::new),
            cascading: Vec::new(),
        };

        if let Some(hook) = schema.pre_init.clone() {
            instance = hook(instance);
        }

        for (name, kind) in &schema.fields {
            let FieldKind::Stored(descriptor) = kind else {
                // computed fields have no entry in the store
                continue;
            };
            if descriptor.is_array {
                let items = match instance.data.get(name) {
                    Some(Value::Array(items)) => items.clone(),
                    _ => return Err(ModelError::NotArray(name.clone())),
                };
                let mut converted = Vec::with_capacity(items.len());
                for item in items {
                    converted.push((descriptor.converter)(item)?);
                }
                let converted = match &schema.config.array_constructor {
                    Some(ctor) => ctor(converted),
                    None => converted,
                };
                instance.data.insert(name.clone(), Value::Array(converted));
            } else {
                let input = instance
                    .data
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| descriptor.default.clone());
                let converted = (descriptor.converter)(input)?;
                instance.data.insert(name.clone(), converted);
            }
        }

        if let Some(factory) = schema.on_change_listener.clone() {
            let listener = factory(&instance);
            if let Some(signal) = instance.signal.as_mut() {
                signal.listen(listener);
            }
        }

        Ok(instance)
    }

    /// Read a field.
    ///
    /// Declared stored fields read the working store; computed fields invoke
    /// their getter on demand (never cached). Undeclared names resolve to the
    /// raw stored value when `extra_properties` is enabled, `None` otherwise.
    pub fn get(&self, field: &str) -> Option<Value> {
        match self.schema.fields.get(field) {
            Some(FieldKind::Stored(_)) => self.data.get(field).cloned(),
            Some(FieldKind::Computed(computed)) => Some((computed.get)(self)),
            None if self.schema.config.extra_properties => self.data.get(field).cloned(),
            None => None,
        }
    }

    /// Write a field.
    ///
    /// Stored fields are written as-is (conversion runs at instantiation, not
    /// on write) and dispatch `(field, new, old)`; every computed field that
    /// depends on the written field then re-fires with its own before/after
    /// values. Writing a computed field runs its setter (whose nested
    /// assignments each notify first) and then dispatches the computed
    /// field's own event, always last in the cascade.
    ///
    /// Undeclared names are plain, non-notifying writes when
    /// `extra_properties` is enabled and an error otherwise.
    pub fn set(&mut self, field: &str, value: Value) -> Result<(), ModelError> {
        let schema = self.schema.clone();
        match schema.fields.get(field) {
            Some(FieldKind::Stored(_)) => {
                self.set_stored(field, value, &schema);
                Ok(())
            }
            Some(FieldKind::Computed(computed)) => self.set_computed(field, computed, value),
            None if schema.config.extra_properties => {
                self.data.insert(field.to_owned(), value);
                Ok(())
            }
            None => Err(ModelError::UnknownField(field.to_owned())),
        }
    }

    /// The change signal, when one is attached.
    pub fn on_change(&mut self) -> Option<&mut Signal<ChangeEvent>> {
        self.signal.as_mut()
    }

    /// Replace (or install) the change signal. Intended for `pre_init` hooks
    /// that bring their own notification channel.
    pub fn set_signal(&mut self, signal: Signal<ChangeEvent>) {
        self.signal = Some(signal);
    }

    /// The working store itself, when `embed_plain_data` is enabled.
    pub fn plain_data(&self) -> Option<&Map<String, Value>> {
        self.schema.config.embed_plain_data.then_some(&self.data)
    }

    /// Clone of the full working store as a JSON object.
    pub fn view(&self) -> Value {
        Value::Object(self.data.clone())
    }

    fn set_stored(&mut self, field: &str, value: Value, schema: &SchemaInner) {
        let notify = self.signal.is_some();

        // Dependent computed fields must report an old value from before the
        // write, so capture their getters' output first.
        let mut dependents: Vec<(String, Value)> = Vec::new();
        if notify {
            if let Some(names) = schema.dependents.get(field) {
                for name in names {
                    if self.cascading.iter().any(|active| active == name) {
                        continue;
                    }
                    if let Some(FieldKind::Computed(computed)) = schema.fields.get(name) {
                        dependents.push((name.clone(), (computed.get)(self)));
                    }
                }
            }
        }

        let old = self.data.get(field).cloned().unwrap_or(Value::Null);
        self.data.insert(field.to_owned(), value.clone());

        if notify {
            self.dispatch(ChangeEvent::new(field, value, old));
            for (name, before) in dependents {
                let Some(FieldKind::Computed(computed)) = schema.fields.get(&name) else {
                    continue;
                };
                let after = (computed.get)(self);
                self.dispatch(ChangeEvent::new(name, after, before));
            }
        }
    }

    fn set_computed(
        &mut self,
        field: &str,
        computed: &ComputedField,
        value: Value,
    ) -> Result<(), ModelError> {
        let before = (computed.get)(self);
        self.cascading.push(field.to_owned());
        let result = (computed.set)(self, value);
        self.cascading.pop();
        result?;
        let after = (computed.get)(self);
        if self.signal.is_some() {
            self.dispatch(ChangeEvent::new(field, after, before));
        }
        Ok(())
    }

    fn dispatch(&mut self, event: ChangeEvent) {
        if let Some(signal) = self.signal.as_mut() {
            signal.dispatch(&event);
        }
    }
}

impl fmt::Debug for ModelInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelInstance")
            .field("data", &self.data)
            .field("signal", &self.signal.is_some())
            .finish()
    }
}
