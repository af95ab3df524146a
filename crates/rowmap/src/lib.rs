//! rowmap - a lightweight object-relational mapping runtime.
//!
//! rowmap maps plain structs to relational rows, builds dialect-specific SQL for
//! them, and runs that SQL through a connection supplied by the caller:
//!
//! - **Mapping metadata** derived once per type from `#[derive(Mapped)]` and cached
//!   for the life of the process
//! - **SQL dialects** for SQL Server, MySQL, PostgreSQL and SQLite
//! - **Sessions** running lifecycle listeners around insert, update and delete, and
//!   reading generated identifiers back onto the inserted instance
//! - **Type conversion** between database values and member types through a
//!   pluggable converter registry
//!
//! Connectivity is not part of rowmap: a provider implements [`Connection`] and
//! [`Command`] and hands the connection to a [`SessionFactory`].
//!
//! # Quick Start
//!
//! ```ignore
//! use rowmap::prelude::*;
//!
//! #[derive(Mapped, Debug, Default)]
//! #[table(schema = "Sales", name = "Customers")]
//! struct Customer {
//!     #[column(name = "CustomerId")]
//!     #[identifier(strategy = "DbGenerated")]
//!     id: i32,
//!     #[column]
//!     name: String,
//!     #[column(name = "Created", allow_update = false)]
//!     created: String,
//! }
//!
//! let factory = SessionFactory::new(SessionConfig::for_database(DatabaseKind::MsSql));
//! let mut session = factory.open_session(connection);
//!
//! let mut customer = Customer { name: "Joe Bloggs".into(), ..Customer::default() };
//! session.insert(&mut customer)?;
//! let loaded: Option<Customer> = session.single(customer.id)?;
//! ```

pub use rowmap_core::{
    ArgumentError, AttributeMappingConvention, ColumnAnnotation, ColumnInfo, Command,
    Connection, ConventionMappingConvention, ConventionMappingSettings, ConversionError,
    DbValue, DefaultTypeConverter, DomainError, DomainErrorKind, DriverError, Error,
    IdentifierAnnotation, IdentifierStrategy, JsonTypeConverter, LifecycleError, Mapped,
    MappingConvention, MemberDescriptor, ObjectDelta, ObjectInfo, PropertyChange, Result, Row,
    SqlCharacters, SqlQuery, TableAnnotation, TableInfo, TargetType, TypeConverter,
    TypeConverterRegistry, TypeDescriptor, Value, ValueKind, configure_mapping_convention,
    mapping_convention,
};
pub use rowmap_dialect::{
    MsSqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect, SqlDialect,
};
pub use rowmap_macros::Mapped;
pub use rowmap_session::{
    AssignedListener, DatabaseKind, DbDriver, Listener, ListenerPipeline, MsSqlDriver,
    MySqlDriver, PostgreSqlDriver, SQLiteDriver, Session, SessionConfig, SessionFactory,
};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use rowmap::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Mapping
        DbValue,
        IdentifierStrategy,
        Mapped,
        ObjectDelta,
        ObjectInfo,
        // Data
        Row,
        SqlQuery,
        Value,
        // Errors
        DomainErrorKind,
        Error,
        Result,
        // Connectivity
        Command,
        Connection,
        // Session
        AssignedListener,
        DatabaseKind,
        Listener,
        Session,
        SessionConfig,
        SessionFactory,
    };
}
