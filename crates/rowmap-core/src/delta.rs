//! Partial updates.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::mapping::{Mapped, ObjectInfo};
use crate::value::Value;

/// A single member change in an [`ObjectDelta`].
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange {
    pub member: String,
    pub value: Value,
}

/// A set of member changes applied to one row identified by its identifier value.
///
/// Deltas update a row without loading the object first:
///
/// ```ignore
/// let mut delta = ObjectDelta::new::<Customer>(12_i32)?;
/// delta.add_change("name", "Fred Flintstone")?;
/// session.update_delta(&delta)?;
/// ```
#[derive(Debug, Clone)]
pub struct ObjectDelta {
    object_info: Arc<ObjectInfo>,
    identifier: Value,
    changes: Vec<PropertyChange>,
}

impl ObjectDelta {
    /// Start a delta for the row of `T` with the given identifier.
    ///
    /// Fails if the identifier is NULL or `T` cannot be mapped.
    pub fn new<T: Mapped>(identifier: impl Into<Value>) -> Result<Self> {
        let identifier = identifier.into();
        if identifier.is_null() {
            return Err(Error::argument("identifier", "identifier must not be NULL"));
        }
        Ok(Self {
            object_info: ObjectInfo::for_type::<T>()?,
            identifier,
            changes: Vec::new(),
        })
    }

    /// Record a new value for `member`. A later change to the same member replaces
    /// the earlier one.
    pub fn add_change(
        &mut self,
        member: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<&mut Self> {
        let member = member.into();
        if member.is_empty() {
            return Err(Error::argument("member", "member name must not be empty"));
        }
        let value = value.into();
        match self.changes.iter_mut().find(|c| c.member == member) {
            Some(existing) => existing.value = value,
            None => self.changes.push(PropertyChange { member, value }),
        }
        Ok(self)
    }

    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    pub fn changes(&self) -> &[PropertyChange] {
        &self.changes
    }

    pub fn identifier(&self) -> &Value {
        &self.identifier
    }

    pub fn object_info(&self) -> &Arc<ObjectInfo> {
        &self.object_info
    }
}
