//! The connectivity boundary.
//!
//! Opening connections, transaction scoping and provider-specific command creation
//! live outside rowmap. A provider plugs in by implementing [`Connection`] and
//! [`Command`]; the session only ever talks to these two traits.
//!
//! Commands are scoped resources. A `Command` is created per statement and dropped
//! on every exit path, so providers release statement handles and readers in `Drop`.

use crate::error::Result;
use crate::query::SqlQuery;
use crate::row::Row;
use crate::value::Value;

/// A live database connection able to create commands.
pub trait Connection {
    /// The command type created by this connection.
    type Command<'conn>: Command
    where
        Self: 'conn;

    /// Create a command for `query`, binding its arguments in order.
    fn create_command(&mut self, query: &SqlQuery) -> Result<Self::Command<'_>>;

    /// Called after a command completed successfully.
    ///
    /// Connection scope policies (e.g. closing the connection when no transaction is
    /// active) hook in here.
    fn command_completed(&mut self) {}

    /// Release the connection. Called once when the owning session is disposed.
    fn close(&mut self) {}
}

/// A prepared command bound to its arguments.
pub trait Command {
    /// Execute a statement returning the number of rows affected.
    fn execute_non_query(&mut self) -> Result<u64>;

    /// Execute a statement returning the first column of the first row.
    ///
    /// Returns `Value::Null` if the statement produced no rows.
    fn execute_scalar(&mut self) -> Result<Value>;

    /// Execute a statement returning all rows.
    fn execute_reader(&mut self) -> Result<Vec<Row>>;
}
