//! Field declarations and their compilation into canonical descriptors.
//!
//! Declarations are a tagged union covering the accepted shorthand shapes;
//! they are resolved exactly once, at schema-definition time, and never
//! re-inspected per instance.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::config::Config;
use crate::error::{ModelError, SchemaError};
use crate::instance::ModelInstance;

/// Conversion function mapping a raw value to its typed/coerced form.
pub type Converter = Arc<dyn Fn(Value) -> Result<Value, ModelError> + Send + Sync>;

/// Getter of a computed field, evaluated on demand against the instance.
pub type ComputedGet = Arc<dyn Fn(&ModelInstance) -> Value + Send + Sync>;

/// Setter of a computed field; expected to assign into the instance's own
/// declared fields through [`ModelInstance::set`].
pub type ComputedSet =
    Arc<dyn Fn(&mut ModelInstance, Value) -> Result<(), ModelError> + Send + Sync>;

/// Element type of a declaration: a built-in type tag or a caller-supplied
/// converter.
#[derive(Clone)]
pub enum TypeRef {
    /// Built-in type tag, `"string"` or `"number"`. Unknown tags fail at
    /// schema-definition time.
    Tag(String),
    /// Caller-supplied conversion function, used as-is.
    Converter(Converter),
}

impl TypeRef {
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag(tag.into())
    }

    pub fn converter<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, ModelError> + Send + Sync + 'static,
    {
        Self::Converter(Arc::new(f))
    }
}

impl From<&str> for TypeRef {
    fn from(tag: &str) -> Self {
        Self::Tag(tag.to_owned())
    }
}

impl From<String> for TypeRef {
    fn from(tag: String) -> Self {
        Self::Tag(tag)
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => f.debug_tuple("Tag").field(tag).finish(),
            Self::Converter(_) => f.write_str("Converter"),
        }
    }
}

/// A derived field: no backing storage, a getter/setter pair, and the set of
/// field names it reads. `depends_on` drives re-notification, not caching:
/// the getter runs on every read.
#[derive(Clone)]
pub struct ComputedField {
    pub depends_on: Vec<String>,
    pub get: ComputedGet,
    pub set: ComputedSet,
}

impl ComputedField {
    pub fn new<G, S>(depends_on: impl IntoIterator<Item = impl Into<String>>, get: G, set: S) -> Self
    where
        G: Fn(&ModelInstance) -> Value + Send + Sync + 'static,
        S: Fn(&mut ModelInstance, Value) -> Result<(), ModelError> + Send + Sync + 'static,
    {
        Self {
            depends_on: depends_on.into_iter().map(Into::into).collect(),
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }
}

impl fmt::Debug for ComputedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedField")
            .field("depends_on", &self.depends_on)
            .finish()
    }
}

/// One field declaration, in any of the accepted shorthand shapes.
#[derive(Clone, Debug)]
pub enum FieldDecl {
    /// Bare type: required, no default.
    Item(TypeRef),
    /// Array of the element type: required, no default.
    List(TypeRef),
    /// Fully spelled out: type (optionally array-of), required-ness, default.
    Full {
        item: TypeRef,
        array: bool,
        required: bool,
        default: Value,
    },
    /// Declaration by bare default value; the converter is inferred from the
    /// default's JSON type.
    DefaultValue(Value),
    /// Derived field with no backing storage.
    Computed(ComputedField),
}

impl FieldDecl {
    pub fn item(item: impl Into<TypeRef>) -> Self {
        Self::Item(item.into())
    }

    pub fn list(item: impl Into<TypeRef>) -> Self {
        Self::List(item.into())
    }

    pub fn full(item: impl Into<TypeRef>, required: bool, default: impl Into<Value>) -> Self {
        Self::Full {
            item: item.into(),
            array: false,
            required,
            default: default.into(),
        }
    }

    pub fn full_list(item: impl Into<TypeRef>, required: bool, default: impl Into<Value>) -> Self {
        Self::Full {
            item: item.into(),
            array: true,
            required,
            default: default.into(),
        }
    }

    pub fn default_value(default: impl Into<Value>) -> Self {
        Self::DefaultValue(default.into())
    }

    pub fn computed<G, S>(
        depends_on: impl IntoIterator<Item = impl Into<String>>,
        get: G,
        set: S,
    ) -> Self
    where
        G: Fn(&ModelInstance) -> Value + Send + Sync + 'static,
        S: Fn(&mut ModelInstance, Value) -> Result<(), ModelError> + Send + Sync + 'static,
    {
        Self::Computed(ComputedField::new(depends_on, get, set))
    }
}

/// Canonical compiled form of a stored-field declaration.
///
/// `required` is surfaced for introspection but not enforced at conversion
/// time: a missing value with a `null` default is handed to the converter,
/// which fails or coerces under the active policy.
#[derive(Clone)]
pub struct FieldDescriptor {
    pub is_array: bool,
    pub converter: Converter,
    pub required: bool,
    pub default: Value,
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("is_array", &self.is_array)
            .field("required", &self.required)
            .field("default", &self.default)
            .finish()
    }
}

/// A compiled field: either stored (descriptor-driven) or computed.
#[derive(Clone, Debug)]
pub enum FieldKind {
    Stored(FieldDescriptor),
    Computed(ComputedField),
}

/// Compile one declaration into its canonical form. Pure; called once per
/// field at schema-definition time.
pub(crate) fn compile(
    field: &str,
    decl: &FieldDecl,
    config: &Config,
) -> Result<FieldKind, SchemaError> {
    let descriptor = match decl {
        FieldDecl::Item(item) => FieldDescriptor {
            is_array: false,
            converter: resolve(field, item, config)?,
            required: true,
            default: Value::Null,
        },
        FieldDecl::List(item) => FieldDescriptor {
            is_array: true,
            converter: resolve(field, item, config)?,
            required: true,
            default: Value::Null,
        },
        FieldDecl::Full {
            item,
            array,
            required,
            default,
        } => FieldDescriptor {
            is_array: *array,
            converter: resolve(field, item, config)?,
            required: *required,
            default: default.clone(),
        },
        FieldDecl::DefaultValue(default) => FieldDescriptor {
            is_array: false,
            converter: infer_converter(default, config),
            required: false,
            default: default.clone(),
        },
        FieldDecl::Computed(computed) => return Ok(FieldKind::Computed(computed.clone())),
    };
    Ok(FieldKind::Stored(descriptor))
}

fn resolve(field: &str, item: &TypeRef, config: &Config) -> Result<Converter, SchemaError> {
    match item {
        TypeRef::Converter(converter) => Ok(converter.clone()),
        TypeRef::Tag(tag) => match tag.as_str() {
            "string" => Ok(string_converter(config.cast_string)),
            "number" => Ok(number_converter(config.parse_numbers)),
            _ => Err(SchemaError::UnknownTypeTag {
                field: field.to_owned(),
                tag: tag.clone(),
            }),
        },
    }
}

/// Converter inferred from a bare default value's JSON type.
fn infer_converter(default: &Value, config: &Config) -> Converter {
    match default {
        Value::String(_) => string_converter(config.cast_string),
        Value::Number(_) => number_converter(config.parse_numbers),
        _ => Arc::new(|value: Value| Ok(value)),
    }
}

fn string_converter(cast: bool) -> Converter {
    Arc::new(move |value: Value| match value {
        Value::String(_) => Ok(value),
        other if cast => Ok(Value::String(stringify(&other))),
        other => Err(ModelError::NotString(other)),
    })
}

fn number_converter(parse: bool) -> Converter {
    Arc::new(move |value: Value| match value {
        Value::Number(_) => Ok(value),
        Value::String(text) if parse => {
            match parse_float_prefix(&text).and_then(serde_json::Number::from_f64) {
                Some(number) => Ok(Value::Number(number)),
                None => Err(ModelError::NotNumber(Value::String(text))),
            }
        }
        other => Err(ModelError::NotNumber(other)),
    })
}

/// String rendition used by `cast_string`: scalars via their display form,
/// composites as JSON text, `null` as `"null"`.
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        composite => serde_json::to_string(composite).unwrap_or_default(),
    }
}

/// Parse the longest leading floating-point prefix of `text`; trailing
/// garbage is dropped. Returns `None` when no numeric prefix exists.
pub(crate) fn parse_float_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0usize;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let int_digits = end - int_start;

    let mut frac_digits = 0usize;
    if end < bytes.len() && bytes[end] == b'.' {
        let mut cursor = end + 1;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        frac_digits = cursor - end - 1;
        if int_digits > 0 || frac_digits > 0 {
            end = cursor;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut cursor = end + 1;
        if cursor < bytes.len() && (bytes[cursor] == b'+' || bytes[cursor] == b'-') {
            cursor += 1;
        }
        let exp_start = cursor;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        // "1e" or "1e+" parse as just "1"
        if cursor > exp_start {
            end = cursor;
        }
    }

    text[..end].parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::parse_float_prefix;

    #[test]
    fn parses_plain_and_signed_numbers() {
        assert_eq!(parse_float_prefix("42"), Some(42.0));
        assert_eq!(parse_float_prefix("-3.5"), Some(-3.5));
        assert_eq!(parse_float_prefix("+.5"), Some(0.5));
        assert_eq!(parse_float_prefix("1."), Some(1.0));
    }

    #[test]
    fn drops_trailing_garbage() {
        assert_eq!(parse_float_prefix("3.5abc"), Some(3.5));
        assert_eq!(parse_float_prefix("  7px"), Some(7.0));
        assert_eq!(parse_float_prefix("1e3rest"), Some(1000.0));
        assert_eq!(parse_float_prefix("2e"), Some(2.0));
        assert_eq!(parse_float_prefix("2e+"), Some(2.0));
    }

    #[test]
    fn rejects_non_numeric_prefixes() {
        assert_eq!(parse_float_prefix(""), None);
        assert_eq!(parse_float_prefix("abc"), None);
        assert_eq!(parse_float_prefix("."), None);
        assert_eq!(parse_float_prefix("-"), None);
        assert_eq!(parse_float_prefix("e10"), None);
    }
}
