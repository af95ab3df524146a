//! MySQL and MariaDB.

use rowmap_core::{IdentifierStrategy, ObjectInfo, SqlCharacters, SqlQuery};

use crate::SqlDialect;

/// MySQL dialect: `` `name` `` quoting, anonymous `?` placeholders, no sequences.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "MySql"
    }

    fn sql_characters(&self) -> &'static SqlCharacters {
        &SqlCharacters::MY_SQL
    }

    fn empty_insert_values(&self) -> &'static str {
        "() VALUES ()"
    }

    fn build_select_insert_id_sql_query(&self, object_info: &ObjectInfo) -> Option<SqlQuery> {
        (object_info.table_info().identifier_strategy() == IdentifierStrategy::DbGenerated)
            .then(|| SqlQuery::text("SELECT LAST_INSERT_ID()"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{AuditEntry, Invoice, Ticket};
    use rowmap_core::{DomainErrorKind, Mapped, Value};

    #[test]
    fn test_insert_uses_anonymous_placeholders() {
        let invoice = Invoice {
            id: 0,
            total: 12.5,
            note: Some("net 30".into()),
        };
        let info = invoice.object_info().unwrap();
        let query = MySqlDialect.build_insert_sql_query(&info, &invoice).unwrap();
        assert_eq!(
            query.command_text(),
            "INSERT INTO `Invoices` (`Total`, `Note`) VALUES (?, ?)"
        );
        assert_eq!(
            query.arguments(),
            &[Value::Double(12.5), Value::Text("net 30".into())]
        );
    }

    #[test]
    fn test_insert_without_writable_columns() {
        let entry = AuditEntry::default();
        let info = entry.object_info().unwrap();
        let query = MySqlDialect.build_insert_sql_query(&info, &entry).unwrap();
        assert_eq!(query.command_text(), "INSERT INTO `AuditEntries` () VALUES ()");
    }

    #[test]
    fn test_select_insert_id() {
        let info = ObjectInfo::for_type::<Invoice>().unwrap();
        let query = MySqlDialect.build_select_insert_id_sql_query(&info).unwrap();
        assert_eq!(query.command_text(), "SELECT LAST_INSERT_ID()");
    }

    #[test]
    fn test_sequences_are_unsupported() {
        assert!(!MySqlDialect.supports_sequences());
        let ticket = Ticket::default();
        let info = ticket.object_info().unwrap();
        let err = MySqlDialect.build_insert_sql_query(&info, &ticket).unwrap_err();
        assert_eq!(err.domain_kind(), Some(DomainErrorKind::Unsupported));
        assert!(err.to_string().contains("MySql"));
    }
}
