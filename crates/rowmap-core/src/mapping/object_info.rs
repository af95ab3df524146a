//! Per-type mapping metadata and the process-wide metadata cache.

use std::any::TypeId;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use super::convention::mapping_convention;
use super::table::{ColumnInfo, IdentifierStrategy, TableInfo};
use super::Mapped;
use crate::convert::TypeConverterRegistry;
use crate::error::{DomainErrorKind, Error, Result};
use crate::row::Row;
use crate::value::Value;

type Cache = RwLock<HashMap<TypeId, Arc<ObjectInfo>>>;

fn cache() -> &'static Cache {
    static CACHE: OnceLock<Cache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Mapping metadata for one Rust type.
///
/// Built once per type by the configured [`MappingConvention`](super::MappingConvention)
/// and shared through [`ObjectInfo::for_type`]. Methods taking an instance expect
/// an instance of the described type.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    type_id: TypeId,
    type_name: &'static str,
    table_info: TableInfo,
}

impl ObjectInfo {
    /// Create metadata for the type identified by `type_id`.
    pub fn new(type_id: TypeId, type_name: &'static str, table_info: TableInfo) -> Self {
        Self {
            type_id,
            type_name,
            table_info,
        }
    }

    /// The cached metadata for `T`, building it on first use.
    ///
    /// Concurrent first calls may both build; the first one stored wins and every
    /// caller receives that instance. Build failures are returned and not cached.
    #[tracing::instrument(level = "debug", skip_all, fields(type_name = std::any::type_name::<T>()))]
    pub fn for_type<T: Mapped>() -> Result<Arc<ObjectInfo>> {
        let type_id = TypeId::of::<T>();
        if let Some(info) = cache()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
        {
            return Ok(Arc::clone(info));
        }

        let built = Arc::new(mapping_convention().create_object_info(&T::describe())?);

        let mut cache = cache().write().unwrap_or_else(PoisonError::into_inner);
        match cache.entry(type_id) {
            Entry::Occupied(existing) => {
                tracing::debug!("Mapping metadata already cached by another caller");
                Ok(Arc::clone(existing.get()))
            }
            Entry::Vacant(slot) => {
                tracing::info!(
                    table = built.table_info.name(),
                    columns = built.table_info.columns().len(),
                    strategy = built.table_info.identifier_strategy().as_str(),
                    "Mapping metadata created"
                );
                Ok(Arc::clone(slot.insert(built)))
            }
        }
    }

    /// The cached metadata for `type_id`, if it was already built.
    pub fn cached(type_id: TypeId) -> Option<Arc<ObjectInfo>> {
        cache()
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .cloned()
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn table_info(&self) -> &TableInfo {
        &self.table_info
    }

    fn read_member(&self, instance: &dyn Mapped, member: &str) -> Result<Value> {
        instance.member_value(member).ok_or_else(|| {
            Error::mapping(format!(
                "type '{}' has no member named '{member}'",
                self.type_name
            ))
        })
    }

    /// Read the identifier member of `instance`.
    pub fn get_identifier_value(&self, instance: &dyn Mapped) -> Result<Value> {
        let identifier = self.table_info.identifier();
        self.read_member(instance, identifier.member_name())
    }

    /// Assign the identifier member of `instance`, converting `value` to the member's
    /// type first.
    pub fn set_identifier_value(&self, instance: &mut dyn Mapped, value: Value) -> Result<()> {
        let identifier = self.table_info.identifier();
        let converted =
            TypeConverterRegistry::global().convert_from_db_value(value, identifier.target())?;
        instance.set_member_value(identifier.member_name(), converted)
    }

    /// True if `identifier` is NULL or equals the default of the identifier type.
    pub fn is_default_identifier(&self, identifier: &Value) -> bool {
        if identifier.is_null() {
            return true;
        }
        *identifier == self.table_info.identifier().target().default_value
    }

    /// True if the identifier member of `instance` still holds its default value.
    pub fn has_default_identifier_value(&self, instance: &dyn Mapped) -> Result<bool> {
        let identifier = self.get_identifier_value(instance)?;
        Ok(self.is_default_identifier(&identifier))
    }

    /// Check that `instance` can be inserted under the identifier strategy.
    ///
    /// Generated identifiers must still be unset; assigned identifiers must be set.
    pub fn verify_instance_for_insert(&self, instance: &dyn Mapped) -> Result<()> {
        let strategy = self.table_info.identifier_strategy();
        let is_default = self.has_default_identifier_value(instance)?;
        if strategy.is_generated() && !is_default {
            return Err(Error::domain(
                DomainErrorKind::InvalidInstance,
                format!(
                    "the identifier of '{}' is generated by the database and must not be set before insert",
                    self.type_name
                ),
            ));
        }
        if strategy == IdentifierStrategy::Assigned && is_default {
            return Err(Error::domain(
                DomainErrorKind::InvalidInstance,
                format!(
                    "the identifier of '{}' is assigned and must be set before insert",
                    self.type_name
                ),
            ));
        }
        Ok(())
    }

    /// Read the member bound to `column` and convert it for the database.
    pub fn get_column_value(&self, instance: &dyn Mapped, column: &ColumnInfo) -> Result<Value> {
        let value = self.read_member(instance, column.member_name())?;
        TypeConverterRegistry::global().convert_to_db_value(value, column.target())
    }

    /// Assign the members of `instance` from a result row.
    ///
    /// Row columns are matched to mapped columns by name (case-insensitive); row
    /// columns without a mapping are ignored.
    pub fn populate(&self, instance: &mut dyn Mapped, row: &Row) -> Result<()> {
        let registry = TypeConverterRegistry::global();
        for (name, value) in row.iter() {
            let Some(column) = self.table_info.column(name) else {
                continue;
            };
            let converted = registry
                .convert_from_db_value(value.clone(), column.target())
                .map_err(|e| {
                    Error::mapping(format!(
                        "cannot read column '{name}' into '{}.{}': {e}",
                        self.type_name,
                        column.member_name()
                    ))
                })?;
            instance.set_member_value(column.member_name(), converted)?;
        }
        Ok(())
    }
}
