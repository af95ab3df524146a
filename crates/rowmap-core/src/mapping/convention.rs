//! Mapping conventions: strategies turning a [`TypeDescriptor`] into an [`ObjectInfo`].

use std::sync::{Arc, OnceLock};

use super::object_info::ObjectInfo;
use super::table::{ColumnInfo, IdentifierStrategy, TableInfo};
use super::{MemberDescriptor, TypeDescriptor};
use crate::error::{Error, Result};

/// Builds mapping metadata for a type.
pub trait MappingConvention: Send + Sync {
    /// Create the metadata for the described type.
    fn create_object_info(&self, descriptor: &TypeDescriptor) -> Result<ObjectInfo>;
}

static CONVENTION: OnceLock<Arc<dyn MappingConvention>> = OnceLock::new();

/// Select the mapping convention used for every type mapped from now on.
///
/// Can be called once, before the first type is mapped; later calls fail.
pub fn configure_mapping_convention(convention: Arc<dyn MappingConvention>) -> Result<()> {
    CONVENTION.set(convention).map_err(|_| {
        Error::argument(
            "convention",
            "the mapping convention has already been configured",
        )
    })?;
    tracing::info!("Mapping convention configured");
    Ok(())
}

/// The active mapping convention. Defaults to [`AttributeMappingConvention`].
pub fn mapping_convention() -> &'static dyn MappingConvention {
    CONVENTION
        .get_or_init(|| Arc::new(AttributeMappingConvention))
        .as_ref()
}

fn check_descriptor(descriptor: &TypeDescriptor) -> Result<()> {
    if descriptor.type_name.is_empty() {
        return Err(Error::argument("descriptor", "type name must not be empty"));
    }
    Ok(())
}

/// The single member carrying an identifier annotation, if any.
fn annotated_identifier(descriptor: &TypeDescriptor) -> Result<Option<&MemberDescriptor>> {
    let mut members = descriptor.members.iter().filter(|m| m.identifier.is_some());
    let first = members.next();
    if members.next().is_some() {
        return Err(Error::mapping(format!(
            "type '{}' declares more than one identifier",
            descriptor.type_name
        )));
    }
    Ok(first)
}

fn column_for(
    member: &MemberDescriptor,
    is_identifier: bool,
    strategy: IdentifierStrategy,
) -> ColumnInfo {
    let annotation = member.column.unwrap_or_default();
    let column_name = annotation.name.unwrap_or(member.name);
    // Generated identifiers are never written from the member.
    let allow_insert = if is_identifier {
        !matches!(strategy, IdentifierStrategy::DbGenerated)
    } else {
        annotation.allow_insert
    };
    ColumnInfo::new(
        column_name,
        member.name,
        member.target.clone(),
        allow_insert,
        annotation.allow_update,
        is_identifier,
    )
}

fn missing_identifier(descriptor: &TypeDescriptor) -> Error {
    Error::mapping(format!(
        "type '{}' does not declare an identifier",
        descriptor.type_name
    ))
}

fn build(
    descriptor: &TypeDescriptor,
    schema: Option<String>,
    table_name: String,
    members: &[&MemberDescriptor],
    identifier: &MemberDescriptor,
    strategy: IdentifierStrategy,
) -> Result<ObjectInfo> {
    let sequence = identifier
        .identifier
        .and_then(|a| a.sequence)
        .map(str::to_string);

    let columns = members
        .iter()
        .map(|m| column_for(m, m.name == identifier.name, strategy))
        .collect();

    let table_info = TableInfo::new(
        descriptor.type_name,
        schema,
        table_name,
        columns,
        strategy,
        sequence,
    )?;
    Ok(ObjectInfo::new(
        descriptor.type_id,
        descriptor.type_name,
        table_info,
    ))
}

/// Maps types from their explicit declarations.
///
/// The type must carry a table declaration and exactly one identifier; only members
/// declared as columns are mapped. An identifier without a declared strategy is
/// database generated.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttributeMappingConvention;

impl MappingConvention for AttributeMappingConvention {
    fn create_object_info(&self, descriptor: &TypeDescriptor) -> Result<ObjectInfo> {
        check_descriptor(descriptor)?;
        let table = descriptor.table.ok_or_else(|| {
            Error::mapping(format!(
                "type '{}' does not declare a table mapping",
                descriptor.type_name
            ))
        })?;

        let identifier =
            annotated_identifier(descriptor)?.ok_or_else(|| missing_identifier(descriptor))?;
        if identifier.column.is_none() {
            return Err(Error::mapping(format!(
                "identifier member '{}.{}' is not declared as a column",
                descriptor.type_name, identifier.name
            )));
        }
        let strategy = identifier
            .identifier
            .and_then(|a| a.strategy)
            .unwrap_or(IdentifierStrategy::DbGenerated);

        let members: Vec<&MemberDescriptor> = descriptor
            .members
            .iter()
            .filter(|m| m.column.is_some())
            .collect();

        build(
            descriptor,
            table.schema.map(str::to_string),
            table.name.to_string(),
            &members,
            identifier,
            strategy,
        )
    }
}

/// Settings for [`ConventionMappingConvention`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionMappingSettings {
    /// Strategy for identifiers without a declared one.
    pub default_identifier_strategy: IdentifierStrategy,
    /// Schema applied to types without a table declaration.
    pub schema: Option<String>,
}

impl Default for ConventionMappingSettings {
    fn default() -> Self {
        Self {
            default_identifier_strategy: IdentifierStrategy::DbGenerated,
            schema: None,
        }
    }
}

impl ConventionMappingSettings {
    /// Set the default identifier strategy.
    #[must_use]
    pub fn default_identifier_strategy(mut self, strategy: IdentifierStrategy) -> Self {
        self.default_identifier_strategy = strategy;
        self
    }

    /// Set the default schema.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

/// Maps types structurally.
///
/// The table is named after the type and every member becomes a column. The
/// identifier is the annotated member, otherwise the member named `id` or
/// `<type>_id`. Declarations, where present, still override names and flags.
#[derive(Debug, Default, Clone)]
pub struct ConventionMappingConvention {
    settings: ConventionMappingSettings,
}

impl ConventionMappingConvention {
    pub fn new(settings: ConventionMappingSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ConventionMappingSettings {
        &self.settings
    }
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

impl MappingConvention for ConventionMappingConvention {
    fn create_object_info(&self, descriptor: &TypeDescriptor) -> Result<ObjectInfo> {
        check_descriptor(descriptor)?;

        let identifier = match annotated_identifier(descriptor)? {
            Some(member) => member,
            None => {
                let type_key = format!("{}_id", snake_case(descriptor.type_name));
                descriptor
                    .members
                    .iter()
                    .find(|m| m.name.eq_ignore_ascii_case("id"))
                    .or_else(|| {
                        descriptor
                            .members
                            .iter()
                            .find(|m| m.name.eq_ignore_ascii_case(&type_key))
                    })
                    .ok_or_else(|| missing_identifier(descriptor))?
            }
        };
        let strategy = identifier
            .identifier
            .and_then(|a| a.strategy)
            .unwrap_or(self.settings.default_identifier_strategy);

        let (schema, table_name) = match descriptor.table {
            Some(table) => (
                table
                    .schema
                    .map(str::to_string)
                    .or_else(|| self.settings.schema.clone()),
                table.name.to_string(),
            ),
            None => (
                self.settings.schema.clone(),
                descriptor.type_name.to_string(),
            ),
        };

        let members: Vec<&MemberDescriptor> = descriptor.members.iter().collect();
        build(descriptor, schema, table_name, &members, identifier, strategy)
    }
}
