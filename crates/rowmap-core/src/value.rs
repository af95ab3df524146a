//! Dynamic SQL values and their typed counterparts.

use std::any::TypeId;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A dynamically-typed SQL value.
///
/// Values travel in both directions: as command parameters and as results read back
/// from the database.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    /// The database NULL sentinel.
    #[default]
    Null,
    Bool(bool),
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    /// Exact numeric kept in its textual form.
    Decimal(String),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

/// The representation a typed member expects its value in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal,
    Text,
    Bytes,
    Json,
    /// Accepts any value unchanged.
    Any,
}

impl Value {
    /// Check if this value is NULL.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The kind of this value, or `None` for NULL.
    pub const fn kind(&self) -> Option<ValueKind> {
        Some(match self {
            Value::Null => return None,
            Value::Bool(_) => ValueKind::Bool,
            Value::TinyInt(_) => ValueKind::TinyInt,
            Value::SmallInt(_) => ValueKind::SmallInt,
            Value::Int(_) => ValueKind::Int,
            Value::BigInt(_) => ValueKind::BigInt,
            Value::Float(_) => ValueKind::Float,
            Value::Double(_) => ValueKind::Double,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::Text(_) => ValueKind::Text,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Json(_) => ValueKind::Json,
        })
    }

    /// Name of the variant, used in diagnostics.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::TinyInt(_) => "TinyInt",
            Value::SmallInt(_) => "SmallInt",
            Value::Int(_) => "Int",
            Value::BigInt(_) => "BigInt",
            Value::Float(_) => "Float",
            Value::Double(_) => "Double",
            Value::Decimal(_) => "Decimal",
            Value::Text(_) => "Text",
            Value::Bytes(_) => "Bytes",
            Value::Json(_) => "Json",
        }
    }

    /// Integer content widened to `i64`, for any integer variant.
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::TinyInt(v) => Some(*v as i64),
            Value::SmallInt(v) => Some(*v as i64),
            Value::Int(v) => Some(*v as i64),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// String content for text-like variants.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Decimal(s) => Some(s),
            _ => None,
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => Bool,
    i8 => TinyInt,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Float,
    f64 => Double,
    String => Text,
    Vec<u8> => Bytes,
    serde_json::Value => Json,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A Rust type that can be stored in a mapped member.
///
/// `KIND` tells converters which representation `from_value` expects; the type
/// converter registry normalises raw database values to that kind before
/// `from_value` is called.
pub trait DbValue: Sized + 'static {
    /// Representation expected by [`DbValue::from_value`].
    const KIND: ValueKind;
    /// Whether the type can hold the database NULL.
    const NULLABLE: bool = false;

    /// Convert the member value into a SQL value.
    fn to_value(&self) -> Value;

    /// Build the member value from a value already normalised to `KIND`.
    fn from_value(value: Value) -> Result<Self>;

    /// The value an unset member holds (e.g. `0` for integers, NULL for `Option`).
    fn default_value() -> Value;

    /// Type used for converter lookup when no converter is registered for `Self`.
    ///
    /// `Option<T>` reports `T`, so a converter registered for `T` also serves
    /// nullable members.
    fn underlying_type_id() -> TypeId {
        TypeId::of::<Self>()
    }
}

fn mismatch<T>(value: &Value, to: &'static str) -> Result<T> {
    Err(Error::conversion(
        value.type_name(),
        to,
        "unexpected value representation",
    ))
}

macro_rules! impl_db_value {
    ($ty:ty, $kind:ident, $variant:ident, $default:expr) => {
        impl DbValue for $ty {
            const KIND: ValueKind = ValueKind::$kind;

            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }

            fn from_value(value: Value) -> Result<Self> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => mismatch(&other, stringify!($ty)),
                }
            }

            fn default_value() -> Value {
                Value::$variant($default)
            }
        }
    };
}

impl_db_value!(bool, Bool, Bool, false);
impl_db_value!(i8, TinyInt, TinyInt, 0);
impl_db_value!(i16, SmallInt, SmallInt, 0);
impl_db_value!(i32, Int, Int, 0);
impl_db_value!(i64, BigInt, BigInt, 0);
impl_db_value!(f32, Float, Float, 0.0);
impl_db_value!(f64, Double, Double, 0.0);
impl_db_value!(String, Text, Text, String::new());
impl_db_value!(Vec<u8>, Bytes, Bytes, Vec::new());
impl_db_value!(serde_json::Value, Json, Json, serde_json::Value::Null);

impl DbValue for Value {
    const KIND: ValueKind = ValueKind::Any;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }

    fn default_value() -> Value {
        Value::Null
    }
}

impl<T: DbValue> DbValue for Option<T> {
    const KIND: ValueKind = T::KIND;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, DbValue::to_value)
    }

    fn from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(value).map(Some)
    }

    fn default_value() -> Value {
        Value::Null
    }

    fn underlying_type_id() -> TypeId {
        T::underlying_type_id()
    }
}
