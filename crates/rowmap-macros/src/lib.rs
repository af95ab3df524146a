//! Procedural macros for rowmap.
//!
//! - `#[derive(Mapped)]` implements `rowmap_core::Mapped` for a struct with named
//!   fields.
//!
//! Declarations recognised by the derive:
//!
//! | Attribute | On | Arguments |
//! |-----------|----|-----------|
//! | `#[table]` | struct | `name` (required), `schema` |
//! | `#[column]` | field | `name`, `allow_insert`, `allow_update` |
//! | `#[identifier]` | field | `strategy` (`Assigned`, `DbGenerated`, `Sequence`), `sequence` |
//! | `#[transient]` | field | none; the field is never persisted |
//!
//! Generated code refers to `::rowmap_core`, so the crate must be a dependency of
//! the deriving crate.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod mapped_derive;

/// Derive `rowmap_core::Mapped`.
///
/// ```ignore
/// #[derive(Mapped, Default)]
/// #[table(schema = "Sales", name = "Customers")]
/// struct Customer {
///     #[column(name = "CustomerId")]
///     #[identifier(strategy = "Assigned")]
///     id: i32,
///     #[column(allow_update = false)]
///     created: String,
///     #[transient]
///     cached_total: Option<f64>,
/// }
/// ```
#[proc_macro_derive(Mapped, attributes(table, column, identifier, transient))]
pub fn derive_mapped(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match mapped_derive::parse_mapped(&input) {
        Ok(def) => mapped_derive::generate_mapped_impl(&def).into(),
        Err(err) => err.to_compile_error().into(),
    }
}
