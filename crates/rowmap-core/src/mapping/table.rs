//! Table and column metadata.

use serde::{Deserialize, Serialize};

use crate::convert::TargetType;
use crate::error::{Error, Result};
use crate::identifiers::is_valid_identifier;

/// How the identifier (primary key) of a row is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IdentifierStrategy {
    /// No strategy declared. Never valid for a mapped table.
    #[default]
    None,
    /// The caller sets the identifier before inserting.
    Assigned,
    /// The database generates the identifier (identity / auto-increment).
    DbGenerated,
    /// The identifier is drawn from a database sequence.
    Sequence,
}

impl IdentifierStrategy {
    /// Name of the strategy as written in mapping declarations.
    pub const fn as_str(&self) -> &'static str {
        match self {
            IdentifierStrategy::None => "None",
            IdentifierStrategy::Assigned => "Assigned",
            IdentifierStrategy::DbGenerated => "DbGenerated",
            IdentifierStrategy::Sequence => "Sequence",
        }
    }

    /// Parse a strategy name (case-insensitive).
    ///
    /// Returns `None` if the string is not a recognized strategy.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Some(IdentifierStrategy::None),
            "assigned" => Some(IdentifierStrategy::Assigned),
            "dbgenerated" | "db_generated" | "identity" => Some(IdentifierStrategy::DbGenerated),
            "sequence" => Some(IdentifierStrategy::Sequence),
            _ => None,
        }
    }

    /// True if the database produces the identifier value.
    pub const fn is_generated(&self) -> bool {
        matches!(
            self,
            IdentifierStrategy::DbGenerated | IdentifierStrategy::Sequence
        )
    }
}

/// A mapped column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    column_name: String,
    member_name: &'static str,
    target: TargetType,
    allow_insert: bool,
    allow_update: bool,
    is_identifier: bool,
}

impl ColumnInfo {
    /// Create column metadata.
    pub fn new(
        column_name: impl Into<String>,
        member_name: &'static str,
        target: TargetType,
        allow_insert: bool,
        allow_update: bool,
        is_identifier: bool,
    ) -> Self {
        Self {
            column_name: column_name.into(),
            member_name,
            target,
            allow_insert,
            allow_update,
            is_identifier,
        }
    }

    /// Database column name.
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// Name of the member bound to this column.
    pub fn member_name(&self) -> &'static str {
        self.member_name
    }

    /// Rust type of the bound member.
    pub fn target(&self) -> &TargetType {
        &self.target
    }

    /// Whether INSERT writes this column.
    pub fn allow_insert(&self) -> bool {
        self.allow_insert
    }

    /// Whether UPDATE writes this column.
    pub fn allow_update(&self) -> bool {
        self.allow_update
    }

    /// Whether this column holds the identifier.
    pub fn is_identifier(&self) -> bool {
        self.is_identifier
    }
}

/// Mapping of a type onto a table. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    schema: Option<String>,
    name: String,
    columns: Vec<ColumnInfo>,
    identifier_index: usize,
    identifier_strategy: IdentifierStrategy,
    sequence_name: Option<String>,
}

impl TableInfo {
    /// Build and validate table metadata for the type named `type_name`.
    ///
    /// Fails with a mapping error if a name is not a valid SQL identifier, a column
    /// name repeats, or the columns do not flag exactly one identifier with a
    /// strategy other than [`IdentifierStrategy::None`].
    pub fn new(
        type_name: &str,
        schema: Option<String>,
        name: String,
        columns: Vec<ColumnInfo>,
        identifier_strategy: IdentifierStrategy,
        sequence_name: Option<String>,
    ) -> Result<Self> {
        let invalid = |what: &str, value: &str| {
            Error::mapping(format!(
                "type '{type_name}' declares an invalid {what} name '{value}'"
            ))
        };

        if !is_valid_identifier(&name) {
            return Err(invalid("table", &name));
        }
        if let Some(schema) = schema.as_deref() {
            if !is_valid_identifier(schema) {
                return Err(invalid("schema", schema));
            }
        }
        if let Some(sequence) = sequence_name.as_deref() {
            if !is_valid_identifier(sequence) {
                return Err(invalid("sequence", sequence));
            }
        }

        for (idx, column) in columns.iter().enumerate() {
            if !is_valid_identifier(&column.column_name) {
                return Err(invalid("column", &column.column_name));
            }
            if columns[..idx]
                .iter()
                .any(|c| c.column_name.eq_ignore_ascii_case(&column.column_name))
            {
                return Err(Error::mapping(format!(
                    "type '{type_name}' maps more than one member to column '{}'",
                    column.column_name
                )));
            }
        }

        let mut identifiers = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_identifier)
            .map(|(idx, _)| idx);
        let identifier_index = identifiers.next().ok_or_else(|| {
            Error::mapping(format!(
                "type '{type_name}' does not declare an identifier"
            ))
        })?;
        if identifiers.next().is_some() {
            return Err(Error::mapping(format!(
                "type '{type_name}' declares more than one identifier"
            )));
        }
        if identifier_strategy == IdentifierStrategy::None {
            return Err(Error::mapping(format!(
                "type '{type_name}' declares an identifier without a strategy"
            )));
        }

        let sequence_name = match identifier_strategy {
            IdentifierStrategy::Sequence => Some(sequence_name.unwrap_or_else(|| {
                format!("{}_{}_seq", name, columns[identifier_index].column_name)
            })),
            _ => None,
        };

        Ok(Self {
            schema,
            name,
            columns,
            identifier_index,
            identifier_strategy,
            sequence_name,
        })
    }

    /// Schema name, if any.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in mapping order.
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// Name of the identifier column.
    pub fn identifier_column(&self) -> &str {
        &self.identifier().column_name
    }

    /// How identifier values are produced.
    pub fn identifier_strategy(&self) -> IdentifierStrategy {
        self.identifier_strategy
    }

    /// Sequence feeding the identifier, for [`IdentifierStrategy::Sequence`].
    pub fn sequence_name(&self) -> Option<&str> {
        self.sequence_name.as_deref()
    }

    /// The identifier column metadata.
    pub fn identifier(&self) -> &ColumnInfo {
        &self.columns[self.identifier_index]
    }

    /// Look a column up by name (case-insensitive).
    pub fn column(&self, column_name: &str) -> Option<&ColumnInfo> {
        self.columns
            .iter()
            .find(|c| c.column_name.eq_ignore_ascii_case(column_name))
    }

    /// Look a column up by the name of its member.
    pub fn column_for_member(&self, member_name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.member_name == member_name)
    }

    /// Columns written by INSERT, in order.
    pub fn insert_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|c| c.allow_insert)
    }

    /// Non-identifier columns written by UPDATE, in order.
    pub fn update_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns
            .iter()
            .filter(|c| c.allow_update && !c.is_identifier)
    }
}
