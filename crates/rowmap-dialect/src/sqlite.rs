//! SQLite.

use rowmap_core::{IdentifierStrategy, ObjectInfo, SqlCharacters, SqlQuery};

use crate::SqlDialect;

/// SQLite dialect: `"name"` quoting, anonymous `?` placeholders, no sequences.
#[derive(Debug, Default, Clone, Copy)]
pub struct SQLiteDialect;

impl SqlDialect for SQLiteDialect {
    fn name(&self) -> &'static str {
        "SQLite"
    }

    fn sql_characters(&self) -> &'static SqlCharacters {
        &SqlCharacters::SQLITE
    }

    fn build_select_insert_id_sql_query(&self, object_info: &ObjectInfo) -> Option<SqlQuery> {
        (object_info.table_info().identifier_strategy() == IdentifierStrategy::DbGenerated)
            .then(|| SqlQuery::text("SELECT last_insert_rowid()"))
    }
}
