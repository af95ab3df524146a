//! Mapping metadata: how a Rust type maps onto a table.
//!
//! Mapping starts from a [`TypeDescriptor`], a data-only description of a type's
//! members and the annotations declared on them (normally produced by
//! `#[derive(Mapped)]`). A [`MappingConvention`] turns the descriptor into an
//! [`ObjectInfo`] holding the [`TableInfo`]; the result is cached for the life of the
//! process and shared by every session.
//!
//! ```ignore
//! #[derive(Mapped, Default)]
//! #[table(schema = "Sales", name = "Customers")]
//! struct Customer {
//!     #[column(name = "CustomerId")]
//!     #[identifier(strategy = "Assigned")]
//!     id: i32,
//!     #[column]
//!     name: String,
//! }
//!
//! let info = ObjectInfo::for_type::<Customer>()?;
//! assert_eq!(info.table_info().name(), "Customers");
//! ```

mod convention;
mod object_info;
mod table;

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::convert::TargetType;
use crate::error::Result;
use crate::value::{DbValue, Value};

pub use convention::{
    AttributeMappingConvention, ConventionMappingConvention, ConventionMappingSettings,
    MappingConvention, configure_mapping_convention, mapping_convention,
};
pub use object_info::ObjectInfo;
pub use table::{ColumnInfo, IdentifierStrategy, TableInfo};

/// A type whose instances can be persisted through a session.
///
/// Implemented by `#[derive(Mapped)]`. The trait is object safe apart from
/// [`Mapped::describe`], so listeners receive instances as `&mut dyn Mapped`.
pub trait Mapped: Any {
    /// Describe the members of this type and their annotations.
    fn describe() -> TypeDescriptor
    where
        Self: Sized;

    /// The cached mapping metadata for this instance's type.
    fn object_info(&self) -> Result<Arc<ObjectInfo>>;

    /// Read a member as a SQL value. `None` if the type has no such member.
    fn member_value(&self, member: &str) -> Option<Value>;

    /// Assign a member from a value already normalised to the member's kind.
    fn set_member_value(&mut self, member: &str, value: Value) -> Result<()>;
}

/// Table declaration on a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableAnnotation {
    pub schema: Option<&'static str>,
    pub name: &'static str,
}

impl TableAnnotation {
    /// Declare the table name.
    pub const fn new(name: &'static str) -> Self {
        Self { schema: None, name }
    }

    /// Set the schema.
    pub const fn schema(mut self, schema: &'static str) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// Column declaration on a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnAnnotation {
    /// Explicit column name; the member name is used when absent.
    pub name: Option<&'static str>,
    pub allow_insert: bool,
    pub allow_update: bool,
}

impl Default for ColumnAnnotation {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnAnnotation {
    /// A column named after its member, insertable and updatable.
    pub const fn new() -> Self {
        Self {
            name: None,
            allow_insert: true,
            allow_update: true,
        }
    }

    /// A column with an explicit name.
    pub const fn named(name: &'static str) -> Self {
        Self {
            name: Some(name),
            allow_insert: true,
            allow_update: true,
        }
    }

    /// Set whether the column is written by INSERT.
    pub const fn allow_insert(mut self, value: bool) -> Self {
        self.allow_insert = value;
        self
    }

    /// Set whether the column is written by UPDATE.
    pub const fn allow_update(mut self, value: bool) -> Self {
        self.allow_update = value;
        self
    }
}

/// Identifier declaration on a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IdentifierAnnotation {
    /// Declared strategy; the convention default applies when absent.
    pub strategy: Option<IdentifierStrategy>,
    /// Sequence name for [`IdentifierStrategy::Sequence`].
    pub sequence: Option<&'static str>,
}

impl IdentifierAnnotation {
    /// An identifier using the convention's default strategy.
    pub const fn new() -> Self {
        Self {
            strategy: None,
            sequence: None,
        }
    }

    /// An identifier with an explicit strategy.
    pub const fn with_strategy(strategy: IdentifierStrategy) -> Self {
        Self {
            strategy: Some(strategy),
            sequence: None,
        }
    }

    /// Set the sequence name.
    pub const fn sequence(mut self, name: &'static str) -> Self {
        self.sequence = Some(name);
        self
    }
}

/// A persistable member of a mapped type.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDescriptor {
    /// Member (field) name.
    pub name: &'static str,
    /// Rust type of the member.
    pub target: TargetType,
    pub column: Option<ColumnAnnotation>,
    pub identifier: Option<IdentifierAnnotation>,
}

impl MemberDescriptor {
    /// Describe a member of type `T` without annotations.
    pub fn new<T: DbValue>(name: &'static str) -> Self {
        Self {
            name,
            target: TargetType::of::<T>(),
            column: None,
            identifier: None,
        }
    }

    /// Attach a column annotation.
    #[must_use]
    pub fn column(mut self, column: ColumnAnnotation) -> Self {
        self.column = Some(column);
        self
    }

    /// Attach an identifier annotation.
    #[must_use]
    pub fn identifier(mut self, identifier: IdentifierAnnotation) -> Self {
        self.identifier = Some(identifier);
        self
    }
}

/// Data-only description of a mapped type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub type_id: TypeId,
    /// Short type name (e.g. `"Customer"`).
    pub type_name: &'static str,
    pub table: Option<TableAnnotation>,
    /// Members in declaration order.
    pub members: Vec<MemberDescriptor>,
}

impl TypeDescriptor {
    /// Start describing `T`.
    pub fn new<T: 'static>(type_name: &'static str) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name,
            table: None,
            members: Vec::new(),
        }
    }

    /// Attach the table declaration.
    #[must_use]
    pub fn table(mut self, table: TableAnnotation) -> Self {
        self.table = Some(table);
        self
    }

    /// Append a member.
    #[must_use]
    pub fn member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }
}
