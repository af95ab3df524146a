//! PostgreSQL.

use rowmap_core::{ObjectInfo, Result, SqlCharacters, SqlQuery, TableInfo};

use crate::{SqlDialect, sequence_name};

/// PostgreSQL dialect: `"name"` quoting, `$1` placeholders.
///
/// Generated identifiers come back from the insert itself through `RETURNING`, so
/// there is no separate select-identifier statement.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgreSqlDialect;

impl SqlDialect for PostgreSqlDialect {
    fn name(&self) -> &'static str {
        "PostgreSql"
    }

    fn sql_characters(&self) -> &'static SqlCharacters {
        &SqlCharacters::POSTGRE_SQL
    }

    fn supports_select_inserted_identifier(&self) -> bool {
        false
    }

    fn supports_sequences(&self) -> bool {
        true
    }

    /// `nextval` on the quoted sequence name, so its case survives regclass lookup.
    fn sequence_expression(&self, table: &TableInfo) -> Result<String> {
        let sequence = self
            .sql_characters()
            .qualified_name(table.schema(), sequence_name(table)?);
        Ok(format!("nextval('{}')", sequence.replace('\'', "''")))
    }

    fn insert_returning_clause(&self, object_info: &ObjectInfo) -> Option<String> {
        let table = object_info.table_info();
        if !table.identifier_strategy().is_generated() {
            return None;
        }
        let column = table.identifier();
        Some(format!(
            "RETURNING {}",
            self.sql_characters().escape_sql(column.column_name())
        ))
    }

    fn build_select_insert_id_sql_query(&self, _object_info: &ObjectInfo) -> Option<SqlQuery> {
        None
    }
}
