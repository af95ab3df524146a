//! SQL generation for rowmap.
//!
//! `rowmap-dialect` turns mapping metadata into parameterized statements. Every
//! builder is a pure function of an [`ObjectInfo`] (or an [`ObjectDelta`]) and an
//! instance or identifier; nothing here touches a connection.
//!
//! # Dialects
//!
//! | Dialect | Quoting | Placeholders | Inserted identifier |
//! |---------|---------|--------------|---------------------|
//! | [`MsSqlDialect`] | `[name]` | `@p0` | `SELECT SCOPE_IDENTITY()` |
//! | [`MySqlDialect`] | `` `name` `` | `?` | `SELECT LAST_INSERT_ID()` |
//! | [`PostgreSqlDialect`] | `"name"` | `$1` | `RETURNING` on the insert |
//! | [`SQLiteDialect`] | `"name"` | `?` | `SELECT last_insert_rowid()` |
//!
//! # Example
//!
//! ```ignore
//! let info = customer.object_info()?;
//! let query = MsSqlDialect.build_insert_sql_query(&info, &customer)?;
//! assert_eq!(
//!     query.command_text(),
//!     "INSERT INTO [Sales].[Customers] ([Created], [CustomerId], [Name]) VALUES (@p0, @p1, @p2)"
//! );
//! ```

use std::fmt;

use rowmap_core::{
    DomainErrorKind, Error, IdentifierStrategy, Mapped, ObjectDelta, ObjectInfo,
    Result, SqlCharacters, SqlQuery, TableInfo, TypeConverterRegistry, Value,
};

pub mod mssql;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

#[cfg(test)]
mod fixtures;

pub use mssql::MsSqlDialect;
pub use mysql::MySqlDialect;
pub use postgres::PostgreSqlDialect;
pub use sqlite::SQLiteDialect;

/// `identifier` as bound for the identifier column of a mapped type.
fn identifier_argument(object_info: &ObjectInfo, identifier: &Value) -> Result<Value> {
    let column = object_info.table_info().identifier();
    TypeConverterRegistry::global().convert_to_db_value(identifier.clone(), column.target())
}

/// The sequence feeding a [`IdentifierStrategy::Sequence`] identifier.
pub fn sequence_name(table: &TableInfo) -> Result<&str> {
    table.sequence_name().ok_or_else(|| {
        Error::mapping(format!(
            "table '{}' does not draw its identifier from a sequence",
            table.name()
        ))
    })
}

fn table_name(chars: &SqlCharacters, table: &TableInfo) -> String {
    chars.qualified_name(table.schema(), table.name())
}

/// Builds SQL statements for one database flavour.
///
/// Implementations supply the quoting/placeholder characters and the identifier
/// retrieval hooks; the statement builders are shared.
pub trait SqlDialect: Send + Sync + fmt::Debug {
    /// Short dialect name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Quoting and placeholder characters.
    fn sql_characters(&self) -> &'static SqlCharacters;

    /// Whether a generated identifier can be read with a separate statement.
    fn supports_select_inserted_identifier(&self) -> bool {
        true
    }

    /// Whether [`IdentifierStrategy::Sequence`] identifiers can be inserted.
    fn supports_sequences(&self) -> bool {
        false
    }

    /// Expression drawing the next value of the sequence feeding `table`.
    fn sequence_expression(&self, table: &TableInfo) -> Result<String> {
        Err(Error::domain(
            DomainErrorKind::Unsupported,
            format!(
                "the {} dialect does not support sequence identifiers (table '{}')",
                self.name(),
                table.name()
            ),
        ))
    }

    /// Clause appended to an INSERT so that it yields the generated identifier.
    fn insert_returning_clause(&self, _object_info: &ObjectInfo) -> Option<String> {
        None
    }

    /// Text of an INSERT writing no columns, after the table name.
    fn empty_insert_values(&self) -> &'static str {
        "DEFAULT VALUES"
    }

    /// Query reading the identifier generated by the previous insert.
    ///
    /// `None` when the dialect cannot express it, or the identifier is not generated.
    fn build_select_insert_id_sql_query(&self, object_info: &ObjectInfo) -> Option<SqlQuery>;

    /// INSERT writing every insertable column of `instance`.
    fn build_insert_sql_query(
        &self,
        object_info: &ObjectInfo,
        instance: &dyn Mapped,
    ) -> Result<SqlQuery> {
        let chars = self.sql_characters();
        let table = object_info.table_info();

        let mut columns = Vec::new();
        let mut values = Vec::new();
        let mut arguments = Vec::new();
        for column in table.insert_columns() {
            columns.push(chars.escape_sql(column.column_name()));
            if column.is_identifier() && table.identifier_strategy() == IdentifierStrategy::Sequence
            {
                values.push(self.sequence_expression(table)?);
            } else {
                values.push(chars.parameter_name(arguments.len()).into_owned());
                arguments.push(object_info.get_column_value(instance, column)?);
            }
        }

        let mut command_text = if columns.is_empty() {
            format!(
                "INSERT INTO {} {}",
                table_name(chars, table),
                self.empty_insert_values()
            )
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table_name(chars, table),
                columns.join(", "),
                values.join(", ")
            )
        };
        if let Some(returning) = self.insert_returning_clause(object_info) {
            command_text.push(' ');
            command_text.push_str(&returning);
        }

        tracing::trace!(dialect = self.name(), sql = %command_text, "Built insert");
        Ok(SqlQuery::new(command_text, arguments))
    }

    /// UPDATE writing every updatable column of `instance`, keyed on its identifier.
    fn build_update_sql_query(
        &self,
        object_info: &ObjectInfo,
        instance: &dyn Mapped,
    ) -> Result<SqlQuery> {
        let chars = self.sql_characters();
        let table = object_info.table_info();
        let identifier = table.identifier();

        let mut assignments = Vec::new();
        let mut arguments = Vec::new();
        for column in table.update_columns() {
            assignments.push(format!(
                "{} = {}",
                chars.escape_sql(column.column_name()),
                chars.parameter_name(arguments.len())
            ));
            arguments.push(object_info.get_column_value(instance, column)?);
        }
        if assignments.is_empty() {
            return Err(Error::mapping(format!(
                "type '{}' has no updatable columns",
                object_info.type_name()
            )));
        }

        let command_text = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            table_name(chars, table),
            assignments.join(", "),
            chars.escape_sql(identifier.column_name()),
            chars.parameter_name(arguments.len())
        );
        arguments.push(object_info.get_column_value(instance, identifier)?);

        tracing::trace!(dialect = self.name(), sql = %command_text, "Built update");
        Ok(SqlQuery::new(command_text, arguments))
    }

    /// UPDATE writing only the members changed in `delta`.
    fn build_update_delta_sql_query(&self, delta: &ObjectDelta) -> Result<SqlQuery> {
        let object_info = delta.object_info();
        let chars = self.sql_characters();
        let table = object_info.table_info();
        let identifier = table.identifier();

        if delta.change_count() == 0 {
            return Err(Error::domain(
                DomainErrorKind::EmptyDelta,
                "an object delta must contain at least one change",
            ));
        }

        let registry = TypeConverterRegistry::global();
        let mut assignments = Vec::with_capacity(delta.change_count());
        let mut arguments = Vec::with_capacity(delta.change_count() + 1);
        for change in delta.changes() {
            let column = table.column_for_member(&change.member).ok_or_else(|| {
                Error::mapping(format!(
                    "type '{}' has no mapped member named '{}'",
                    object_info.type_name(),
                    change.member
                ))
            })?;
            if column.is_identifier() {
                return Err(Error::mapping(format!(
                    "the identifier '{}.{}' cannot be changed by a delta",
                    object_info.type_name(),
                    change.member
                )));
            }
            assignments.push(format!(
                "{} = {}",
                chars.escape_sql(column.column_name()),
                chars.parameter_name(arguments.len())
            ));
            arguments.push(registry.convert_to_db_value(change.value.clone(), column.target())?);
        }

        let command_text = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            table_name(chars, table),
            assignments.join(", "),
            chars.escape_sql(identifier.column_name()),
            chars.parameter_name(arguments.len())
        );
        arguments.push(identifier_argument(object_info, delta.identifier())?);

        Ok(SqlQuery::new(command_text, arguments))
    }

    /// DELETE of the row with the given identifier.
    fn build_delete_sql_query(
        &self,
        object_info: &ObjectInfo,
        identifier: &Value,
    ) -> Result<SqlQuery> {
        let chars = self.sql_characters();
        let table = object_info.table_info();
        let command_text = format!(
            "DELETE FROM {} WHERE {} = {}",
            table_name(chars, table),
            chars.escape_sql(table.identifier_column()),
            chars.parameter_name(0)
        );
        let arguments = vec![identifier_argument(object_info, identifier)?];
        Ok(SqlQuery::new(command_text, arguments))
    }

    /// DELETE of the row backing `instance`.
    fn build_delete_instance_sql_query(
        &self,
        object_info: &ObjectInfo,
        instance: &dyn Mapped,
    ) -> Result<SqlQuery> {
        let identifier = object_info.get_identifier_value(instance)?;
        self.build_delete_sql_query(object_info, &identifier)
    }

    /// SELECT of every mapped column of the row with the given identifier.
    fn build_select_sql_query(
        &self,
        object_info: &ObjectInfo,
        identifier: &Value,
    ) -> Result<SqlQuery> {
        let chars = self.sql_characters();
        let table = object_info.table_info();
        let columns: Vec<String> = table
            .columns()
            .iter()
            .map(|c| chars.escape_sql(c.column_name()))
            .collect();
        let command_text = format!(
            "SELECT {} FROM {} WHERE {} = {}",
            columns.join(", "),
            table_name(chars, table),
            chars.escape_sql(table.identifier_column()),
            chars.parameter_name(0)
        );
        let arguments = vec![identifier_argument(object_info, identifier)?];
        Ok(SqlQuery::new(command_text, arguments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Badge, BadgeCode, BadgeCodeConverter, Customer, Invoice, Ticket};

    #[test]
    fn test_insert_assigned_includes_identifier() {
        let customer = Customer::sample();
        let info = customer.object_info().unwrap();
        let query = MsSqlDialect
            .build_insert_sql_query(&info, &customer)
            .unwrap();

        assert_eq!(
            query.command_text(),
            "INSERT INTO [Sales].[Customers] ([Created], [DoB], [CustomerId], [Name], [StatusId]) \
             VALUES (@p0, @p1, @p2, @p3, @p4)"
        );
        assert_eq!(query.arguments()[2], Value::Int(1234));
        assert_eq!(query.argument_count(), 5);
    }

    #[test]
    fn test_insert_db_generated_omits_identifier() {
        let invoice = Invoice::default();
        let info = invoice.object_info().unwrap();
        let query = SQLiteDialect.build_insert_sql_query(&info, &invoice).unwrap();

        assert_eq!(
            query.command_text(),
            "INSERT INTO \"Invoices\" (\"Total\", \"Note\") VALUES (?, ?)"
        );
        assert_eq!(query.arguments(), &[Value::Double(0.0), Value::Null]);
    }

    #[test]
    fn test_update_excludes_identifier_and_insert_only_columns() {
        let customer = Customer::sample();
        let info = customer.object_info().unwrap();
        let query = MsSqlDialect
            .build_update_sql_query(&info, &customer)
            .unwrap();

        assert_eq!(
            query.command_text(),
            "UPDATE [Sales].[Customers] SET [DoB] = @p0, [Name] = @p1, [StatusId] = @p2, \
             [Updated] = @p3 WHERE [CustomerId] = @p4"
        );
        assert_eq!(query.arguments().last(), Some(&Value::Int(1234)));
    }

    #[test]
    fn test_update_delta_writes_changes_only() {
        let mut delta = ObjectDelta::new::<Customer>(1234).unwrap();
        delta.add_change("name", "Fred").unwrap();
        let query = MsSqlDialect.build_update_delta_sql_query(&delta).unwrap();

        assert_eq!(
            query.command_text(),
            "UPDATE [Sales].[Customers] SET [Name] = @p0 WHERE [CustomerId] = @p1"
        );
        assert_eq!(
            query.arguments(),
            &[Value::Text("Fred".into()), Value::Int(1234)]
        );
    }

    #[test]
    fn test_update_delta_rejects_unknown_member_and_empty_delta() {
        let mut delta = ObjectDelta::new::<Customer>(1234).unwrap();
        let err = MsSqlDialect.build_update_delta_sql_query(&delta).unwrap_err();
        assert_eq!(err.domain_kind(), Some(DomainErrorKind::EmptyDelta));

        delta.add_change("nickname", "Fred").unwrap();
        let err = MsSqlDialect.build_update_delta_sql_query(&delta).unwrap_err();
        assert_eq!(err.domain_kind(), Some(DomainErrorKind::Mapping));
        assert!(err.to_string().contains("nickname"));
    }

    #[test]
    fn test_delete_and_select_by_identifier() {
        let info = ObjectInfo::for_type::<Invoice>().unwrap();
        let delete = PostgreSqlDialect
            .build_delete_sql_query(&info, &Value::BigInt(7))
            .unwrap();
        assert_eq!(
            delete.command_text(),
            "DELETE FROM \"Invoices\" WHERE \"InvoiceId\" = $1"
        );
        assert_eq!(delete.arguments(), &[Value::BigInt(7)]);

        let select = MySqlDialect
            .build_select_sql_query(&info, &Value::BigInt(7))
            .unwrap();
        assert_eq!(
            select.command_text(),
            "SELECT `InvoiceId`, `Total`, `Note` FROM `Invoices` WHERE `InvoiceId` = ?"
        );
    }

    #[test]
    fn test_delete_instance_uses_current_identifier() {
        let customer = Customer::sample();
        let info = customer.object_info().unwrap();
        let query = MsSqlDialect
            .build_delete_instance_sql_query(&info, &customer)
            .unwrap();
        assert_eq!(
            query.command_text(),
            "DELETE FROM [Sales].[Customers] WHERE [CustomerId] = @p0"
        );
        assert_eq!(query.arguments(), &[Value::Int(1234)]);
    }

    #[test]
    fn test_sequence_insert_requires_support() {
        let ticket = Ticket::default();
        let info = ticket.object_info().unwrap();
        let err = SQLiteDialect.build_insert_sql_query(&info, &ticket).unwrap_err();
        assert_eq!(err.domain_kind(), Some(DomainErrorKind::Unsupported));
    }

    #[test]
    fn test_identifiers_bind_through_the_converter_registry() {
        TypeConverterRegistry::global().register::<BadgeCode>(BadgeCodeConverter);
        let info = ObjectInfo::for_type::<Badge>().unwrap();
        let bound = Value::Text("AB-12".into());

        let delete = SQLiteDialect
            .build_delete_sql_query(&info, &Value::Text("ab-12".into()))
            .unwrap();
        assert_eq!(delete.arguments(), &[bound.clone()]);

        let badge = Badge {
            code: BadgeCode("ab-12".into()),
            holder: "Ada".into(),
        };
        let delete = SQLiteDialect
            .build_delete_instance_sql_query(&info, &badge)
            .unwrap();
        assert_eq!(delete.arguments(), &[bound.clone()]);

        let select = SQLiteDialect
            .build_select_sql_query(&info, &Value::Text("ab-12".into()))
            .unwrap();
        assert_eq!(select.arguments(), &[bound.clone()]);

        let mut delta = ObjectDelta::new::<Badge>("ab-12").unwrap();
        delta.add_change("holder", "Grace").unwrap();
        let update = SQLiteDialect.build_update_delta_sql_query(&delta).unwrap();
        assert_eq!(
            update.command_text(),
            "UPDATE \"Badges\" SET \"Holder\" = ? WHERE \"Code\" = ?"
        );
        assert_eq!(update.arguments(), &[Value::Text("Grace".into()), bound]);
    }
}
