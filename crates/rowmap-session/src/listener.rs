//! Lifecycle listeners.
//!
//! Listeners wrap the object-level mutations of a [`Session`](crate::Session).
//! Before-hooks run in registration order and after-hooks run in reverse
//! registration order, so a listener that sets state up in `before_*` tears it
//! down after every listener registered later has finished. The first error
//! aborts the remaining hooks and the database operation.

use std::fmt;
use std::sync::Arc;

use rowmap_core::{DomainErrorKind, Error, IdentifierStrategy, Mapped, Result, Value};

/// Hooks invoked around inserting, updating and deleting an instance.
///
/// Every hook defaults to a no-op.
#[allow(unused_variables)]
pub trait Listener: Send + Sync {
    fn before_insert(&self, instance: &mut dyn Mapped) -> Result<()> {
        Ok(())
    }

    /// Called with the identifier of the inserted row.
    fn after_insert(&self, instance: &mut dyn Mapped, identifier: &Value) -> Result<()> {
        Ok(())
    }

    fn before_update(&self, instance: &mut dyn Mapped) -> Result<()> {
        Ok(())
    }

    fn after_update(&self, instance: &mut dyn Mapped, rows_affected: u64) -> Result<()> {
        Ok(())
    }

    fn before_delete(&self, instance: &dyn Mapped) -> Result<()> {
        Ok(())
    }

    fn after_delete(&self, instance: &dyn Mapped, rows_affected: u64) -> Result<()> {
        Ok(())
    }
}

/// An ordered list of listeners.
#[derive(Clone, Default)]
pub struct ListenerPipeline {
    listeners: Vec<Arc<dyn Listener>>,
}

impl fmt::Debug for ListenerPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerPipeline")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ListenerPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener; it runs after every listener already registered.
    pub fn push(&mut self, listener: Arc<dyn Listener>) {
        self.listeners.push(listener);
    }

    /// Builder form of [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, listener: impl Listener + 'static) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub(crate) fn before_insert(&self, instance: &mut dyn Mapped) -> Result<()> {
        for listener in &self.listeners {
            listener.before_insert(instance)?;
        }
        Ok(())
    }

    pub(crate) fn after_insert(&self, instance: &mut dyn Mapped, identifier: &Value) -> Result<()> {
        for listener in self.listeners.iter().rev() {
            listener.after_insert(instance, identifier)?;
        }
        Ok(())
    }

    pub(crate) fn before_update(&self, instance: &mut dyn Mapped) -> Result<()> {
        for listener in &self.listeners {
            listener.before_update(instance)?;
        }
        Ok(())
    }

    pub(crate) fn after_update(&self, instance: &mut dyn Mapped, rows_affected: u64) -> Result<()> {
        for listener in self.listeners.iter().rev() {
            listener.after_update(instance, rows_affected)?;
        }
        Ok(())
    }

    pub(crate) fn before_delete(&self, instance: &dyn Mapped) -> Result<()> {
        for listener in &self.listeners {
            listener.before_delete(instance)?;
        }
        Ok(())
    }

    pub(crate) fn after_delete(&self, instance: &dyn Mapped, rows_affected: u64) -> Result<()> {
        for listener in self.listeners.iter().rev() {
            listener.after_delete(instance, rows_affected)?;
        }
        Ok(())
    }
}

/// Rejects instances of `Assigned` identifier types whose identifier is unset.
///
/// Types using any other strategy pass through untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssignedListener;

impl AssignedListener {
    fn verify(instance: &dyn Mapped, operation: &str) -> Result<()> {
        let object_info = instance.object_info()?;
        if object_info.table_info().identifier_strategy() != IdentifierStrategy::Assigned {
            return Ok(());
        }
        if object_info.has_default_identifier_value(instance)? {
            return Err(Error::domain(
                DomainErrorKind::IdentifierNotSet,
                format!(
                    "the identifier of {} must be assigned before {operation}",
                    object_info.type_name()
                ),
            ));
        }
        Ok(())
    }
}

impl Listener for AssignedListener {
    fn before_insert(&self, instance: &mut dyn Mapped) -> Result<()> {
        Self::verify(instance, "insert")
    }

    fn before_update(&self, instance: &mut dyn Mapped) -> Result<()> {
        Self::verify(instance, "update")
    }

    fn before_delete(&self, instance: &dyn Mapped) -> Result<()> {
        Self::verify(instance, "delete")
    }
}
