//! Database drivers.
//!
//! A driver describes what the underlying provider can execute: whether two
//! statements can be sent as one batch, and how to merge them. Executing commands
//! is the job of the [`Connection`](rowmap_core::Connection) the session was opened
//! with.

use std::fmt;

use rowmap_core::{SqlCharacters, SqlQuery};

/// Execution capabilities of a database provider.
pub trait DbDriver: Send + Sync + fmt::Debug {
    /// Short driver name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Placeholder and separator characters of the provider.
    fn sql_characters(&self) -> &'static SqlCharacters;

    /// Whether two statements can be executed as a single command.
    fn supports_batched_queries(&self) -> bool {
        true
    }

    /// Merge two queries into one batch.
    ///
    /// The second statement's placeholders are shifted past the first statement's
    /// parameters, so the combined argument list is the concatenation of both.
    fn combine(&self, first: &SqlQuery, second: &SqlQuery) -> SqlQuery {
        let chars = self.sql_characters();
        let second_text =
            chars.renumber_parameters(second.command_text(), first.argument_count());
        let command_text = format!(
            "{}{}\n{}",
            first.command_text(),
            chars.statement_separator,
            second_text
        );

        let mut arguments = Vec::with_capacity(first.argument_count() + second.argument_count());
        arguments.extend_from_slice(first.arguments());
        arguments.extend_from_slice(second.arguments());

        tracing::trace!(
            driver = self.name(),
            parameters = arguments.len(),
            "Combined queries into one batch"
        );
        SqlQuery::new(command_text, arguments)
    }
}

macro_rules! driver {
    ($(#[$doc:meta])* $name:ident, $label:literal, $chars:ident) => {
        $(#[$doc])*
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl DbDriver for $name {
            fn name(&self) -> &'static str {
                $label
            }

            fn sql_characters(&self) -> &'static SqlCharacters {
                &SqlCharacters::$chars
            }
        }
    };
}

driver!(
    /// Microsoft SQL Server driver.
    MsSqlDriver,
    "MsSql",
    MS_SQL
);
driver!(
    /// MySQL driver. Batching requires the provider's multi-statement option.
    MySqlDriver,
    "MySql",
    MY_SQL
);
driver!(
    /// PostgreSQL driver.
    PostgreSqlDriver,
    "PostgreSql",
    POSTGRE_SQL
);
driver!(
    /// SQLite driver.
    SQLiteDriver,
    "SQLite",
    SQLITE
);
