//! Conversion between raw database values and typed members.
//!
//! Drivers return whatever representation the provider produced (SQLite hands back
//! every integer as `BigInt`, SQL Server returns `SCOPE_IDENTITY()` as a decimal).
//! Before a value reaches [`DbValue::from_value`] it is normalised to the member's
//! [`ValueKind`] by a [`TypeConverter`].
//!
//! Converters are looked up in a [`TypeConverterRegistry`] by the member's exact type,
//! then by its underlying type (`T` for `Option<T>`), and finally fall back to the
//! [`DefaultTypeConverter`].

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::error::{Error, Result};
use crate::value::{DbValue, Value, ValueKind};

/// Description of the type a value is converted into.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetType {
    /// Exact Rust type.
    pub type_id: TypeId,
    /// Type used for the converter lookup fallback (`T` for `Option<T>`).
    pub underlying_type_id: TypeId,
    /// Rust type name, for diagnostics.
    pub type_name: &'static str,
    /// Representation the type expects.
    pub kind: ValueKind,
    /// Whether NULL is a legal value.
    pub nullable: bool,
    /// The value of an unset member of this type.
    pub default_value: Value,
}

impl TargetType {
    /// Describe the Rust type `T`.
    pub fn of<T: DbValue>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            underlying_type_id: T::underlying_type_id(),
            type_name: std::any::type_name::<T>(),
            kind: T::KIND,
            nullable: T::NULLABLE,
            default_value: T::default_value(),
        }
    }

    /// A target accepting any value unchanged.
    pub fn any() -> Self {
        Self::of::<Value>()
    }
}

/// Converts values between their database and member representation.
pub trait TypeConverter: Send + Sync {
    /// Convert a raw database value into the representation of `target`.
    fn convert_from_db_value(&self, value: Value, target: &TargetType) -> Result<Value>;

    /// Convert a member value into the representation sent to the database.
    fn convert_to_db_value(&self, value: Value, _target: &TargetType) -> Result<Value> {
        Ok(value)
    }
}

/// Direct cast/coercion between value representations.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTypeConverter;

fn cannot_convert(value: &Value, target: &TargetType, message: &str) -> Error {
    Error::conversion(value.type_name(), target.type_name, message)
}

fn to_integer(value: &Value, target: &TargetType) -> Result<i64> {
    match value {
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Float(f) => float_to_integer(f64::from(*f), value, target),
        Value::Double(f) => float_to_integer(*f, value, target),
        Value::Decimal(s) | Value::Text(s) => {
            let trimmed = s.trim();
            if let Ok(v) = trimmed.parse::<i64>() {
                return Ok(v);
            }
            let f = trimmed
                .parse::<f64>()
                .map_err(|_| cannot_convert(value, target, "not a number"))?;
            float_to_integer(f, value, target)
        }
        other => other
            .as_i64()
            .ok_or_else(|| cannot_convert(value, target, "not a numeric value")),
    }
}

fn float_to_integer(f: f64, value: &Value, target: &TargetType) -> Result<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if f.fract() != 0.0 || !f.is_finite() || f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return Err(cannot_convert(value, target, "not an integral value"));
    }
    Ok(f as i64)
}

fn to_double(value: &Value, target: &TargetType) -> Result<f64> {
    match value {
        Value::Float(f) => Ok(f64::from(*f)),
        Value::Double(f) => Ok(*f),
        Value::Decimal(s) | Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| cannot_convert(value, target, "not a number")),
        other => other
            .as_i64()
            .map(|v| v as f64)
            .ok_or_else(|| cannot_convert(value, target, "not a numeric value")),
    }
}

fn narrow<T: TryFrom<i64>>(v: i64, value: &Value, target: &TargetType) -> Result<T> {
    T::try_from(v).map_err(|_| cannot_convert(value, target, "value out of range"))
}

impl TypeConverter for DefaultTypeConverter {
    fn convert_from_db_value(&self, value: Value, target: &TargetType) -> Result<Value> {
        if value.is_null() {
            if target.nullable {
                return Ok(Value::Null);
            }
            return Err(cannot_convert(
                &value,
                target,
                "NULL cannot be assigned to a non-nullable type",
            ));
        }
        if target.kind == ValueKind::Any || value.kind() == Some(target.kind) {
            return Ok(value);
        }

        let converted = match target.kind {
            ValueKind::Bool => match &value {
                Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => Value::Bool(true),
                    "false" | "0" => Value::Bool(false),
                    _ => return Err(cannot_convert(&value, target, "not a boolean")),
                },
                _ => Value::Bool(to_integer(&value, target)? != 0),
            },
            ValueKind::TinyInt => Value::TinyInt(narrow(to_integer(&value, target)?, &value, target)?),
            ValueKind::SmallInt => {
                Value::SmallInt(narrow(to_integer(&value, target)?, &value, target)?)
            }
            ValueKind::Int => Value::Int(narrow(to_integer(&value, target)?, &value, target)?),
            ValueKind::BigInt => Value::BigInt(to_integer(&value, target)?),
            ValueKind::Float => Value::Float(to_double(&value, target)? as f32),
            ValueKind::Double => Value::Double(to_double(&value, target)?),
            ValueKind::Decimal => match &value {
                Value::Text(s) => {
                    to_double(&value, target)?;
                    Value::Decimal(s.trim().to_string())
                }
                Value::Float(f) => Value::Decimal(f.to_string()),
                Value::Double(f) => Value::Decimal(f.to_string()),
                other => Value::Decimal(to_integer(other, target)?.to_string()),
            },
            ValueKind::Text => match value {
                Value::Decimal(s) => Value::Text(s),
                Value::Bool(b) => Value::Text(b.to_string()),
                Value::Float(f) => Value::Text(f.to_string()),
                Value::Double(f) => Value::Text(f.to_string()),
                Value::Json(j) => Value::Text(j.to_string()),
                Value::Bytes(b) => Value::Text(
                    String::from_utf8(b)
                        .map_err(|_| Error::conversion("Bytes", target.type_name, "invalid UTF-8"))?,
                ),
                other => match other.as_i64() {
                    Some(v) => Value::Text(v.to_string()),
                    None => return Err(cannot_convert(&other, target, "not representable as text")),
                },
            },
            ValueKind::Bytes => match value {
                Value::Text(s) => Value::Bytes(s.into_bytes()),
                other => return Err(cannot_convert(&other, target, "not a binary value")),
            },
            ValueKind::Json | ValueKind::Any => {
                return Err(cannot_convert(&value, target, "no coercion available"));
            }
        };

        Ok(converted)
    }
}

/// Stores JSON documents as text.
///
/// Registered for `serde_json::Value` by default.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonTypeConverter;

impl TypeConverter for JsonTypeConverter {
    fn convert_from_db_value(&self, value: Value, target: &TargetType) -> Result<Value> {
        match value {
            Value::Json(_) => Ok(value),
            Value::Text(ref s) => serde_json::from_str(s)
                .map(Value::Json)
                .map_err(|e| cannot_convert(&value, target, &e.to_string())),
            other => DefaultTypeConverter.convert_from_db_value(other, target),
        }
    }

    fn convert_to_db_value(&self, value: Value, _target: &TargetType) -> Result<Value> {
        match value {
            Value::Json(json) => Ok(Value::Text(json.to_string())),
            other => Ok(other),
        }
    }
}

/// Registry of type converters keyed by target type.
pub struct TypeConverterRegistry {
    converters: RwLock<HashMap<TypeId, Arc<dyn TypeConverter>>>,
    default: Arc<dyn TypeConverter>,
}

impl Default for TypeConverterRegistry {
    fn default() -> Self {
        let registry = Self::empty();
        registry.register::<serde_json::Value>(JsonTypeConverter);
        registry
    }
}

impl std::fmt::Debug for TypeConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .converters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("TypeConverterRegistry")
            .field("registered", &count)
            .finish_non_exhaustive()
    }
}

impl TypeConverterRegistry {
    /// A registry with no converters besides the default.
    pub fn empty() -> Self {
        Self {
            converters: RwLock::new(HashMap::new()),
            default: Arc::new(DefaultTypeConverter),
        }
    }

    /// The process-wide registry used by sessions and mapping metadata.
    pub fn global() -> &'static TypeConverterRegistry {
        static REGISTRY: OnceLock<TypeConverterRegistry> = OnceLock::new();
        REGISTRY.get_or_init(TypeConverterRegistry::default)
    }

    /// Register `converter` for the Rust type `T`, replacing any previous one.
    pub fn register<T: 'static>(&self, converter: impl TypeConverter + 'static) {
        tracing::debug!(
            target_type = std::any::type_name::<T>(),
            "Registering type converter"
        );
        self.converters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(TypeId::of::<T>(), Arc::new(converter));
    }

    /// The converter registered for exactly `type_id`, if any.
    pub fn for_type(&self, type_id: TypeId) -> Option<Arc<dyn TypeConverter>> {
        self.converters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .cloned()
    }

    /// The fallback converter.
    pub fn default_converter(&self) -> Arc<dyn TypeConverter> {
        Arc::clone(&self.default)
    }

    /// The converter to use for `target`.
    pub fn resolve(&self, target: &TargetType) -> Arc<dyn TypeConverter> {
        self.for_type(target.type_id)
            .or_else(|| self.for_type(target.underlying_type_id))
            .unwrap_or_else(|| self.default_converter())
    }

    /// Convert a raw database value into the representation of `target`.
    pub fn convert_from_db_value(&self, value: Value, target: &TargetType) -> Result<Value> {
        self.resolve(target).convert_from_db_value(value, target)
    }

    /// Convert a member value into its database representation.
    pub fn convert_to_db_value(&self, value: Value, target: &TargetType) -> Result<Value> {
        self.resolve(target).convert_to_db_value(value, target)
    }

    /// Convert a raw database value straight into `T`.
    pub fn convert<T: DbValue>(&self, value: Value) -> Result<T> {
        let target = TargetType::of::<T>();
        T::from_value(self.convert_from_db_value(value, &target)?)
    }
}
