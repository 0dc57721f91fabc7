//! Change-event payload delivered through a model's signal.

use serde_json::Value;

/// A single field change: which field, what it became, what it was.
///
/// Delivered synchronously at the moment a tracked field's setter runs, in
/// listener-attachment order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub field: String,
    pub new_value: Value,
    pub old_value: Value,
}

impl ChangeEvent {
    pub fn new(field: impl Into<String>, new_value: Value, old_value: Value) -> Self {
        Self {
            field: field.into(),
            new_value,
            old_value,
        }
    }
}
