//! Field-by-field introspection for configuration structs.
//!
//! Config structs get their parsing from `serde`; what serde does not give
//! is a uniform way to walk a struct's fields by name at runtime - for
//! dumping effective configuration to the log, or diffing two configs in a
//! test. [`struct_schema!`] generates that walk from a single field list,
//! so the visited fields and the declared [`StructSchema::FIELD_COUNT`]
//! cannot drift apart.
//!
//! ```
//! use pulse::{ struct_schema, StructSchema };
//!
//! #[derive(Clone)]
//! struct NetConfig {
//!     port: u16,
//!     verbose: bool,
//! }
//!
//! struct_schema!(NetConfig { port, verbose });
//!
//! let config = NetConfig { port: 9000, verbose: true };
//! let mut fields = Vec::new();
//! config.for_each_field(|name, value| fields.push(format!("{name}={value}")));
//! assert_eq!(fields, ["port=9000", "verbose=true"]);
//! ```

use std::fmt;

use tracing::debug;

/// A field's value, erased to the handful of shapes config fields take.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u16> for FieldValue {
    fn from(v: u16) -> Self {
        Self::UInt(v as u64)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        Self::UInt(v as u64)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<usize> for FieldValue {
    fn from(v: usize) -> Self {
        Self::UInt(v as u64)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Uniform field iteration over a struct, implemented by [`struct_schema!`].
pub trait StructSchema {
    /// Number of fields the schema covers.
    const FIELD_COUNT: usize;

    /// Visit every field in declaration order as `(name, value)`.
    fn for_each_field<F: FnMut(&'static str, FieldValue)>(&self, visit: F);
}

/// Implement [`StructSchema`] for an existing struct.
///
/// Every listed field must be `Clone` and convertible into [`FieldValue`].
/// The field list is the single source of truth for both the visit order
/// and `FIELD_COUNT`.
#[macro_export]
macro_rules! struct_schema {
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::schema::StructSchema for $ty {
            const FIELD_COUNT: usize = [$(stringify!($field)),+].len();

            fn for_each_field<F: FnMut(&'static str, $crate::schema::FieldValue)>(
                &self,
                mut visit: F
            ) {
                $(visit(
                    stringify!($field),
                    $crate::schema::FieldValue::from(self.$field.clone())
                );)+
            }
        }
    };
}

/// Dump every field of `value` to the log at debug level.
pub fn log_fields<T: StructSchema>(value: &T) {
    value.for_each_field(|name, field| {
        debug!(field = name, value = %field, "config field");
    });
}
