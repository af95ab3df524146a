//! Microsoft SQL Server.

use rowmap_core::{IdentifierStrategy, ObjectInfo, Result, SqlCharacters, SqlQuery, TableInfo, Value};

use crate::{SqlDialect, sequence_name};

/// SQL Server dialect: `[name]` quoting, `@p0` placeholders.
///
/// Generated identifiers are read back with `SCOPE_IDENTITY()`; sequence identifiers
/// with the sequence's `current_value`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MsSqlDialect;

impl SqlDialect for MsSqlDialect {
    fn name(&self) -> &'static str {
        "MsSql"
    }

    fn sql_characters(&self) -> &'static SqlCharacters {
        &SqlCharacters::MS_SQL
    }

    fn supports_sequences(&self) -> bool {
        true
    }

    fn sequence_expression(&self, table: &TableInfo) -> Result<String> {
        Ok(format!(
            "NEXT VALUE FOR {}",
            self.sql_characters()
                .qualified_name(table.schema(), sequence_name(table)?)
        ))
    }

    fn build_select_insert_id_sql_query(&self, object_info: &ObjectInfo) -> Option<SqlQuery> {
        let table = object_info.table_info();
        match table.identifier_strategy() {
            IdentifierStrategy::DbGenerated => Some(SqlQuery::text("SELECT SCOPE_IDENTITY()")),
            IdentifierStrategy::Sequence => {
                let sequence = table.sequence_name()?;
                Some(SqlQuery::new(
                    format!(
                        "SELECT current_value FROM sys.sequences WHERE name = {}",
                        self.sql_characters().parameter_name(0)
                    ),
                    vec![Value::Text(sequence.to_string())],
                ))
            }
            IdentifierStrategy::Assigned | IdentifierStrategy::None => None,
        }
    }
}
