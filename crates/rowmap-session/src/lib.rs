//! Session pipeline for rowmap.
//!
//! A [`Session`] owns one connection and runs the object-level operations on it:
//! listeners before the mutation, metadata lookup, query building through the
//! configured [`SqlDialect`], execution through the [`Connection`], identifier
//! resolution, and listeners after the mutation.
//!
//! # Example
//!
//! ```ignore
//! let factory = SessionFactory::new(
//!     SessionConfig::for_database(DatabaseKind::MsSql).with_listener(AssignedListener),
//! );
//! let mut session = factory.open_session(connection);
//!
//! let mut invoice = Invoice { total: 12.5, ..Invoice::default() };
//! session.insert(&mut invoice)?;       // invoice.id now holds the generated identifier
//! invoice.total = 15.0;
//! session.update(&mut invoice)?;
//! session.delete(&invoice)?;
//! ```
//!
//! Sessions are single-threaded: each wraps one connection and is used by one
//! caller at a time. Execution is synchronous.

pub mod driver;
pub mod listener;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use rowmap_core::{
    Command, Connection, DbValue, DomainErrorKind, Error, Mapped, ObjectDelta, ObjectInfo,
    Result, Row, SqlQuery, TypeConverterRegistry, Value,
};
use rowmap_dialect::{MsSqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect, SqlDialect};

pub use driver::{DbDriver, MsSqlDriver, MySqlDriver, PostgreSqlDriver, SQLiteDriver};
pub use listener::{AssignedListener, Listener, ListenerPipeline};

// ============================================================================
// Session Configuration
// ============================================================================

/// The database families rowmap ships a dialect and driver for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseKind {
    MsSql,
    MySql,
    PostgreSql,
    SQLite,
}

impl DatabaseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DatabaseKind::MsSql => "MsSql",
            DatabaseKind::MySql => "MySql",
            DatabaseKind::PostgreSql => "PostgreSql",
            DatabaseKind::SQLite => "SQLite",
        }
    }

    /// Parse a database name, ignoring case.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mssql" | "sqlserver" => Some(DatabaseKind::MsSql),
            "mysql" => Some(DatabaseKind::MySql),
            "postgresql" | "postgres" => Some(DatabaseKind::PostgreSql),
            "sqlite" => Some(DatabaseKind::SQLite),
            _ => None,
        }
    }
}

/// Dialect, driver and listeners used by every session opened from a factory.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub dialect: Arc<dyn SqlDialect>,
    pub driver: Arc<dyn DbDriver>,
    pub listeners: ListenerPipeline,
}

impl SessionConfig {
    pub fn new(dialect: Arc<dyn SqlDialect>, driver: Arc<dyn DbDriver>) -> Self {
        Self {
            dialect,
            driver,
            listeners: ListenerPipeline::new(),
        }
    }

    /// The matching dialect and driver pair for `kind`, without listeners.
    pub fn for_database(kind: DatabaseKind) -> Self {
        match kind {
            DatabaseKind::MsSql => Self::new(Arc::new(MsSqlDialect), Arc::new(MsSqlDriver)),
            DatabaseKind::MySql => Self::new(Arc::new(MySqlDialect), Arc::new(MySqlDriver)),
            DatabaseKind::PostgreSql => {
                Self::new(Arc::new(PostgreSqlDialect), Arc::new(PostgreSqlDriver))
            }
            DatabaseKind::SQLite => Self::new(Arc::new(SQLiteDialect), Arc::new(SQLiteDriver)),
        }
    }

    /// Register a listener after those already registered.
    pub fn with_listener(mut self, listener: impl Listener + 'static) -> Self {
        self.listeners = self.listeners.with(listener);
        self
    }

    pub fn with_driver(mut self, driver: Arc<dyn DbDriver>) -> Self {
        self.driver = driver;
        self
    }
}

/// Opens sessions sharing one configuration.
#[derive(Debug, Clone)]
pub struct SessionFactory {
    dialect: Arc<dyn SqlDialect>,
    driver: Arc<dyn DbDriver>,
    listeners: Arc<ListenerPipeline>,
}

impl SessionFactory {
    pub fn new(config: SessionConfig) -> Self {
        tracing::info!(
            dialect = config.dialect.name(),
            driver = config.driver.name(),
            listeners = config.listeners.len(),
            "Creating session factory"
        );
        Self {
            dialect: config.dialect,
            driver: config.driver,
            listeners: Arc::new(config.listeners),
        }
    }

    /// Open a session owning `connection`.
    pub fn open_session<C: Connection>(&self, connection: C) -> Session<C> {
        Session {
            connection: Some(connection),
            dialect: Arc::clone(&self.dialect),
            driver: Arc::clone(&self.driver),
            listeners: Arc::clone(&self.listeners),
        }
    }

    pub fn dialect(&self) -> &dyn SqlDialect {
        self.dialect.as_ref()
    }
}

// ============================================================================
// Command Execution
// ============================================================================

fn log_command(query: &SqlQuery) {
    tracing::debug!(
        sql = %query.command_text(),
        parameters = query.argument_count(),
        "Executing command"
    );
}

fn run_non_query<C: Connection>(connection: &mut C, query: &SqlQuery) -> Result<u64> {
    log_command(query);
    let mut command = connection.create_command(query)?;
    let rows_affected = command.execute_non_query()?;
    drop(command);
    connection.command_completed();
    Ok(rows_affected)
}

fn run_scalar<C: Connection>(connection: &mut C, query: &SqlQuery) -> Result<Value> {
    log_command(query);
    let mut command = connection.create_command(query)?;
    let value = command.execute_scalar()?;
    drop(command);
    connection.command_completed();
    Ok(value)
}

fn run_reader<C: Connection>(connection: &mut C, query: &SqlQuery) -> Result<Vec<Row>> {
    log_command(query);
    let mut command = connection.create_command(query)?;
    let rows = command.execute_reader()?;
    drop(command);
    connection.command_completed();
    Ok(rows)
}

/// Wrap a failure into an execution domain error unless it already is a domain error.
fn translate(error: Error) -> Error {
    if !error.is_domain() {
        tracing::warn!(error = %error, "Command execution failed");
    }
    error.into_execution()
}

fn ensure_query(query: &SqlQuery) -> Result<()> {
    if query.is_blank() {
        return Err(Error::argument(
            "sql_query",
            "the command text must not be empty",
        ));
    }
    Ok(())
}

fn ensure_identifier(identifier: &Value) -> Result<()> {
    if identifier.is_null() {
        return Err(Error::argument("identifier", "identifier must not be NULL"));
    }
    Ok(())
}

// ============================================================================
// Session
// ============================================================================

/// A unit of work over one connection.
///
/// Every operation fails with a lifecycle error once the session is disposed.
/// Failures raised while executing commands are reported as
/// [`DomainErrorKind::Execution`] errors carrying the original error as their
/// source; domain errors pass through unchanged.
pub struct Session<C: Connection> {
    connection: Option<C>,
    dialect: Arc<dyn SqlDialect>,
    driver: Arc<dyn DbDriver>,
    listeners: Arc<ListenerPipeline>,
}

impl<C: Connection> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("dialect", &self.dialect.name())
            .field("driver", &self.driver.name())
            .field("listeners", &self.listeners.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl<C: Connection> Session<C> {
    /// Open a session on `connection` using `config` directly.
    pub fn new(connection: C, config: &SessionConfig) -> Self {
        Self {
            connection: Some(connection),
            dialect: Arc::clone(&config.dialect),
            driver: Arc::clone(&config.driver),
            listeners: Arc::new(config.listeners.clone()),
        }
    }

    pub fn dialect(&self) -> &dyn SqlDialect {
        self.dialect.as_ref()
    }

    pub fn driver(&self) -> &dyn DbDriver {
        self.driver.as_ref()
    }

    pub fn listeners(&self) -> &ListenerPipeline {
        &self.listeners
    }

    pub fn is_disposed(&self) -> bool {
        self.connection.is_none()
    }

    /// Release the connection. Later operations fail with a lifecycle error.
    pub fn dispose(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
            tracing::debug!("Session disposed");
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(Error::disposed("session"));
        }
        Ok(())
    }

    fn connection(&mut self) -> Result<&mut C> {
        self.connection
            .as_mut()
            .ok_or_else(|| Error::disposed("session"))
    }

    fn non_query(&mut self, query: &SqlQuery) -> Result<u64> {
        run_non_query(self.connection()?, query).map_err(translate)
    }

    fn scalar(&mut self, query: &SqlQuery) -> Result<Value> {
        run_scalar(self.connection()?, query).map_err(translate)
    }

    fn reader(&mut self, query: &SqlQuery) -> Result<Vec<Row>> {
        run_reader(self.connection()?, query).map_err(translate)
    }

    // ========================================================================
    // Object Operations
    // ========================================================================

    /// Insert `instance` and assign its generated identifier.
    ///
    /// Listeners' `before_insert` hooks run first, in registration order, then
    /// `after_insert` hooks run in reverse order with the resolved identifier.
    #[tracing::instrument(level = "debug", skip(self, instance))]
    pub fn insert<T: Mapped>(&mut self, instance: &mut T) -> Result<()> {
        self.ensure_open()?;
        self.listeners.before_insert(instance)?;

        let object_info = instance.object_info()?;
        object_info.verify_instance_for_insert(instance)?;

        tracing::info!(
            model = object_info.type_name(),
            table = object_info.table_info().name(),
            "Inserting object"
        );

        let identifier = self.insert_returning_identifier(&object_info, instance)?;
        let identifier = if object_info.table_info().identifier_strategy().is_generated() {
            object_info
                .set_identifier_value(instance, identifier)
                .map_err(translate)?;
            object_info.get_identifier_value(instance)?
        } else {
            identifier
        };

        self.listeners.after_insert(instance, &identifier)
    }

    /// Run the insert, returning the identifier of the new row.
    ///
    /// Generated identifiers are read back, in order of preference, by one batched
    /// insert and select, by the insert followed by the select, or from the insert
    /// statement's own result when the dialect has no select statement.
    fn insert_returning_identifier(
        &mut self,
        object_info: &ObjectInfo,
        instance: &dyn Mapped,
    ) -> Result<Value> {
        let insert = self.dialect.build_insert_sql_query(object_info, instance)?;

        if !object_info.table_info().identifier_strategy().is_generated() {
            self.non_query(&insert)?;
            return object_info.get_identifier_value(instance);
        }

        let select_id = if self.dialect.supports_select_inserted_identifier() {
            self.dialect.build_select_insert_id_sql_query(object_info)
        } else {
            None
        };

        match select_id {
            Some(select_id) if self.driver.supports_batched_queries() => {
                let combined = self.driver.combine(&insert, &select_id);
                self.scalar(&combined)
            }
            Some(select_id) => {
                self.non_query(&insert)?;
                self.scalar(&select_id)
            }
            None => self.scalar(&insert),
        }
    }

    /// Update every updatable column of `instance`.
    ///
    /// Returns `true` if exactly one row was affected.
    #[tracing::instrument(level = "debug", skip(self, instance))]
    pub fn update<T: Mapped>(&mut self, instance: &mut T) -> Result<bool> {
        self.ensure_open()?;
        self.listeners.before_update(instance)?;

        let object_info = instance.object_info()?;
        if object_info.has_default_identifier_value(instance)? {
            return Err(Error::domain(
                DomainErrorKind::IdentifierNotSet,
                format!(
                    "the identifier of '{}' must be set before it can be updated",
                    object_info.type_name()
                ),
            ));
        }

        tracing::info!(
            model = object_info.type_name(),
            table = object_info.table_info().name(),
            "Updating object"
        );

        let query = self.dialect.build_update_sql_query(&object_info, instance)?;
        let rows_affected = self.non_query(&query)?;

        self.listeners.after_update(instance, rows_affected)?;
        Ok(rows_affected == 1)
    }

    /// Update only the members changed in `delta`. No listeners run.
    #[tracing::instrument(level = "debug", skip(self, delta))]
    pub fn update_delta(&mut self, delta: &ObjectDelta) -> Result<bool> {
        self.ensure_open()?;
        if delta.change_count() == 0 {
            return Err(Error::domain(
                DomainErrorKind::EmptyDelta,
                "an object delta must contain at least one change",
            ));
        }

        tracing::info!(
            model = delta.object_info().type_name(),
            changes = delta.change_count(),
            "Updating object delta"
        );

        let query = self.dialect.build_update_delta_sql_query(delta)?;
        Ok(self.non_query(&query)? == 1)
    }

    /// Delete the row backing `instance`.
    ///
    /// Returns `true` if exactly one row was affected.
    #[tracing::instrument(level = "debug", skip(self, instance))]
    pub fn delete<T: Mapped>(&mut self, instance: &T) -> Result<bool> {
        self.ensure_open()?;
        self.listeners.before_delete(instance)?;

        let object_info = instance.object_info()?;
        let identifier = object_info.get_identifier_value(instance)?;
        if object_info.is_default_identifier(&identifier) {
            return Err(Error::domain(
                DomainErrorKind::IdentifierNotSet,
                format!(
                    "the identifier of '{}' must be set before it can be deleted",
                    object_info.type_name()
                ),
            ));
        }

        tracing::info!(
            model = object_info.type_name(),
            table = object_info.table_info().name(),
            "Deleting object"
        );

        let query = self
            .dialect
            .build_delete_instance_sql_query(&object_info, instance)?;
        let rows_affected = self.non_query(&query)?;

        self.listeners.after_delete(instance, rows_affected)?;
        Ok(rows_affected == 1)
    }

    /// Delete the row of `T` with the given identifier. No listeners run.
    #[tracing::instrument(level = "debug", skip(self, identifier))]
    pub fn delete_by_id<T: Mapped>(&mut self, identifier: impl Into<Value>) -> Result<bool> {
        self.ensure_open()?;
        let identifier = identifier.into();
        ensure_identifier(&identifier)?;

        let object_info = ObjectInfo::for_type::<T>()?;
        tracing::info!(
            model = object_info.type_name(),
            table = object_info.table_info().name(),
            "Deleting object by identifier"
        );

        let query = self
            .dialect
            .build_delete_sql_query(&object_info, &identifier)?;
        Ok(self.non_query(&query)? == 1)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Load the row of `T` with the given identifier.
    #[tracing::instrument(level = "debug", skip(self, identifier))]
    pub fn single<T: Mapped + Default>(&mut self, identifier: impl Into<Value>) -> Result<Option<T>> {
        self.ensure_open()?;
        let identifier = identifier.into();
        ensure_identifier(&identifier)?;

        let object_info = ObjectInfo::for_type::<T>()?;
        let query = self.dialect.build_select_sql_query(&object_info, &identifier)?;
        let rows = self.reader(&query)?;

        tracing::debug!(
            model = object_info.type_name(),
            found = !rows.is_empty(),
            "Loaded object by identifier"
        );

        rows.first()
            .map(|row| materialize(&object_info, row))
            .transpose()
    }

    /// Materialise every row returned by `query` as a `T`.
    #[tracing::instrument(level = "debug", skip(self, query))]
    pub fn fetch<T: Mapped + Default>(&mut self, query: &SqlQuery) -> Result<Vec<T>> {
        self.ensure_open()?;
        ensure_query(query)?;

        let object_info = ObjectInfo::for_type::<T>()?;
        let rows = self.reader(query)?;
        tracing::debug!(model = object_info.type_name(), rows = rows.len(), "Fetched rows");

        rows.iter().map(|row| materialize(&object_info, row)).collect()
    }

    /// Execute a statement, returning the number of rows affected.
    #[tracing::instrument(level = "debug", skip(self, query))]
    pub fn execute(&mut self, query: &SqlQuery) -> Result<u64> {
        self.ensure_open()?;
        ensure_query(query)?;
        self.non_query(query)
    }

    /// Execute a statement, converting the first column of the first row to `T`.
    #[tracing::instrument(level = "debug", skip(self, query))]
    pub fn execute_scalar<T: DbValue>(&mut self, query: &SqlQuery) -> Result<T> {
        self.ensure_open()?;
        ensure_query(query)?;
        let value = self.scalar(query)?;
        TypeConverterRegistry::global()
            .convert::<T>(value)
            .map_err(translate)
    }
}

fn materialize<T: Mapped + Default>(object_info: &ObjectInfo, row: &Row) -> Result<T> {
    let mut instance = T::default();
    object_info.populate(&mut instance, row)?;
    Ok(instance)
}

impl<C: Connection> Drop for Session<C> {
    fn drop(&mut self) {
        self.dispose();
    }
}

// ============================================================================
// Tests
// ============================================================================
