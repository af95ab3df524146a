//! Core types and traits for rowmap.
//!
//! `rowmap-core` is the **foundation layer** of the workspace. It defines the mapping
//! metadata engine and the data types every other crate builds on.
//!
//! # Role In The Architecture
//!
//! - **Mapping metadata**: [`Mapped`] is implemented by user types (normally through
//!   `#[derive(Mapped)]`); a [`MappingConvention`] turns its [`TypeDescriptor`] into
//!   a cached [`ObjectInfo`] describing the table, its columns and the identifier.
//! - **Contract layer**: [`Connection`] and [`Command`] are implemented by providers;
//!   the session never talks to a database any other way.
//! - **Data model**: [`Value`], [`Row`] and [`SqlQuery`] carry query inputs and outputs.
//! - **Conversion**: the [`TypeConverterRegistry`] normalises raw database values into
//!   member types.
//!
//! # Who Uses This Crate
//!
//! - `rowmap-macros` generates [`Mapped`] implementations defined here.
//! - `rowmap-dialect` consumes [`ObjectInfo`] and [`SqlCharacters`] to build SQL.
//! - `rowmap-session` drives [`Connection`]s for insert/update/delete/select flows.
//!
//! Most applications should use the `rowmap` facade.

pub mod connection;
pub mod convert;
pub mod delta;
pub mod error;
pub mod identifiers;
pub mod mapping;
pub mod query;
pub mod row;
pub mod value;

pub use connection::{Command, Connection};
pub use convert::{
    DefaultTypeConverter, JsonTypeConverter, TargetType, TypeConverter, TypeConverterRegistry,
};
pub use delta::{ObjectDelta, PropertyChange};
pub use error::{
    ArgumentError, BoxError, ConversionError, DomainError, DomainErrorKind, DriverError, Error,
    LifecycleError, Result,
};
pub use identifiers::{ParameterStyle, SqlCharacters, is_valid_identifier};
pub use mapping::{
    AttributeMappingConvention, ColumnAnnotation, ColumnInfo, ConventionMappingConvention,
    ConventionMappingSettings, IdentifierAnnotation, IdentifierStrategy, Mapped,
    MappingConvention, MemberDescriptor, ObjectInfo, TableAnnotation, TableInfo, TypeDescriptor,
    configure_mapping_convention, mapping_convention,
};
pub use query::SqlQuery;
pub use row::Row;
pub use value::{DbValue, Value, ValueKind};
