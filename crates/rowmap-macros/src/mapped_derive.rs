//! Implementation of the Mapped derive macro.
//!
//! This module turns `#[table(...)]`, `#[column(...)]`, `#[identifier(...)]` and
//! `#[transient]` attributes into a `rowmap_core::Mapped` implementation whose
//! `describe()` reports the declarations verbatim. Interpreting them is left to the
//! mapping convention selected at runtime.

use std::sync::OnceLock;

use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use regex::Regex;
use syn::{Attribute, Data, DeriveInput, Error, Field, Fields, Ident, Lit, LitStr, Result, Type};

/// Parsed definition of a struct with `#[derive(Mapped)]`.
#[derive(Debug)]
pub struct MappedDef {
    /// The struct name.
    pub name: Ident,
    /// Generics from the struct.
    pub generics: syn::Generics,
    /// `#[table(...)]`, if present.
    pub table: Option<TableAttr>,
    /// Persistable fields, in declaration order.
    pub fields: Vec<MappedFieldDef>,
}

#[derive(Debug)]
pub struct TableAttr {
    pub name: String,
    pub schema: Option<String>,
}

#[derive(Debug, Default)]
pub struct ColumnAttr {
    pub name: Option<String>,
    pub allow_insert: Option<bool>,
    pub allow_update: Option<bool>,
}

#[derive(Debug, Default)]
pub struct IdentifierAttr {
    /// Strategy variant name, already validated.
    pub strategy: Option<String>,
    pub sequence: Option<String>,
}

/// A single persistable field.
#[derive(Debug)]
pub struct MappedFieldDef {
    pub name: Ident,
    pub ty: Type,
    pub column: Option<ColumnAttr>,
    pub identifier: Option<IdentifierAttr>,
}

const STRATEGIES: [&str; 3] = ["Assigned", "DbGenerated", "Sequence"];

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_$ ]{0,127}$").expect("identifier pattern is valid")
    })
}

/// Check a SQL name at compile time so mapping errors surface in the editor.
fn sql_name(lit: &LitStr) -> Result<String> {
    let value = lit.value();
    if !identifier_pattern().is_match(&value) || value.ends_with(' ') {
        return Err(Error::new_spanned(
            lit,
            format!("`{value}` is not a valid SQL identifier"),
        ));
    }
    Ok(value)
}

fn parse_str(lit: Lit, what: &str) -> Result<LitStr> {
    match lit {
        Lit::Str(s) => Ok(s),
        other => Err(Error::new_spanned(
            other,
            format!("expected string literal for {what}"),
        )),
    }
}

fn parse_bool(lit: Lit, what: &str) -> Result<bool> {
    match lit {
        Lit::Bool(b) => Ok(b.value),
        other => Err(Error::new_spanned(
            other,
            format!("expected `true` or `false` for {what}"),
        )),
    }
}

/// Parse a `DeriveInput` into a `MappedDef`.
pub fn parse_mapped(input: &DeriveInput) -> Result<MappedDef> {
    let name = input.ident.clone();
    let generics = input.generics.clone();

    let fields = match &input.data {
        Data::Struct(data) => parse_fields(&data.fields)?,
        Data::Enum(_) => {
            return Err(Error::new_spanned(
                input,
                "Mapped can only be derived for structs, not enums",
            ));
        }
        Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "Mapped can only be derived for structs, not unions",
            ));
        }
    };

    let table = parse_table_attr(&input.attrs)?;

    let identifiers = fields.iter().filter(|f| f.identifier.is_some()).count();
    if identifiers > 1 {
        return Err(Error::new_spanned(
            input,
            "only one field can be marked #[identifier]",
        ));
    }

    Ok(MappedDef {
        name,
        generics,
        table,
        fields,
    })
}

fn parse_table_attr(attrs: &[Attribute]) -> Result<Option<TableAttr>> {
    let mut table = None;
    for attr in attrs {
        if !attr.path().is_ident("table") {
            continue;
        }
        let mut name = None;
        let mut schema = None;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(sql_name(&parse_str(meta.value()?.parse()?, "name")?)?);
            } else if meta.path.is_ident("schema") {
                schema = Some(sql_name(&parse_str(meta.value()?.parse()?, "schema")?)?);
            } else {
                let attr_name = meta.path.to_token_stream().to_string();
                return Err(meta.error(format!(
                    "unknown table attribute `{attr_name}`. Valid attributes are: name, schema"
                )));
            }
            Ok(())
        })?;
        let name =
            name.ok_or_else(|| Error::new_spanned(attr, "#[table] requires `name = \"...\"`"))?;
        table = Some(TableAttr { name, schema });
    }
    Ok(table)
}

fn parse_fields(fields: &Fields) -> Result<Vec<MappedFieldDef>> {
    match fields {
        Fields::Named(named) => {
            let mut parsed = Vec::new();
            for field in &named.named {
                if let Some(def) = parse_field(field)? {
                    parsed.push(def);
                }
            }
            Ok(parsed)
        }
        Fields::Unnamed(_) => Err(Error::new_spanned(
            fields,
            "Mapped requires a struct with named fields",
        )),
        Fields::Unit => Ok(Vec::new()),
    }
}

/// Parse a field. Returns `None` for `#[transient]` fields.
fn parse_field(field: &Field) -> Result<Option<MappedFieldDef>> {
    let name = field
        .ident
        .clone()
        .ok_or_else(|| Error::new_spanned(field, "expected named field"))?;

    let mut column = None;
    let mut identifier = None;
    let mut transient = false;

    for attr in &field.attrs {
        if attr.path().is_ident("transient") {
            transient = true;
        } else if attr.path().is_ident("column") {
            column = Some(parse_column_attr(attr)?);
        } else if attr.path().is_ident("identifier") {
            identifier = Some(parse_identifier_attr(attr)?);
        }
    }

    if transient {
        if column.is_some() || identifier.is_some() {
            return Err(Error::new_spanned(
                field,
                "#[transient] cannot be combined with #[column] or #[identifier]",
            ));
        }
        return Ok(None);
    }

    Ok(Some(MappedFieldDef {
        name,
        ty: field.ty.clone(),
        column,
        identifier,
    }))
}

fn parse_column_attr(attr: &Attribute) -> Result<ColumnAttr> {
    let mut column = ColumnAttr::default();
    // A bare `#[column]` carries no arguments.
    if matches!(attr.meta, syn::Meta::Path(_)) {
        return Ok(column);
    }
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("name") {
            column.name = Some(sql_name(&parse_str(meta.value()?.parse()?, "name")?)?);
        } else if meta.path.is_ident("allow_insert") {
            column.allow_insert = Some(parse_bool(meta.value()?.parse()?, "allow_insert")?);
        } else if meta.path.is_ident("allow_update") {
            column.allow_update = Some(parse_bool(meta.value()?.parse()?, "allow_update")?);
        } else {
            let attr_name = meta.path.to_token_stream().to_string();
            return Err(meta.error(format!(
                "unknown column attribute `{attr_name}`. \
                 Valid attributes are: name, allow_insert, allow_update"
            )));
        }
        Ok(())
    })?;
    Ok(column)
}

fn parse_identifier_attr(attr: &Attribute) -> Result<IdentifierAttr> {
    let mut identifier = IdentifierAttr::default();
    if matches!(attr.meta, syn::Meta::Path(_)) {
        return Ok(identifier);
    }
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("strategy") {
            let lit = parse_str(meta.value()?.parse()?, "strategy")?;
            let value = lit.value();
            let Some(strategy) = STRATEGIES.iter().find(|s| s.eq_ignore_ascii_case(&value))
            else {
                return Err(Error::new_spanned(
                    lit,
                    format!(
                        "unknown identifier strategy `{value}`. \
                         Valid strategies are: Assigned, DbGenerated, Sequence"
                    ),
                ));
            };
            identifier.strategy = Some((*strategy).to_string());
        } else if meta.path.is_ident("sequence") {
            identifier.sequence = Some(sql_name(&parse_str(meta.value()?.parse()?, "sequence")?)?);
        } else {
            let attr_name = meta.path.to_token_stream().to_string();
            return Err(meta.error(format!(
                "unknown identifier attribute `{attr_name}`. Valid attributes are: strategy, sequence"
            )));
        }
        Ok(())
    })?;
    Ok(identifier)
}

fn generate_table(table: Option<&TableAttr>) -> TokenStream {
    let Some(table) = table else {
        return TokenStream::new();
    };
    let name = &table.name;
    let schema = table
        .schema
        .as_ref()
        .map(|schema| quote! { .schema(#schema) });
    quote! {
        .table(::rowmap_core::TableAnnotation::new(#name) #schema)
    }
}

fn generate_member(field: &MappedFieldDef) -> TokenStream {
    let ty = &field.ty;
    let member = field.name.to_string();

    let column = field.column.as_ref().map(|column| {
        let base = match &column.name {
            Some(name) => quote! { ::rowmap_core::ColumnAnnotation::named(#name) },
            None => quote! { ::rowmap_core::ColumnAnnotation::new() },
        };
        let insert = column
            .allow_insert
            .map(|value| quote! { .allow_insert(#value) });
        let update = column
            .allow_update
            .map(|value| quote! { .allow_update(#value) });
        quote! { .column(#base #insert #update) }
    });

    let identifier = field.identifier.as_ref().map(|identifier| {
        let base = match &identifier.strategy {
            Some(strategy) => {
                let variant = Ident::new(strategy, field.name.span());
                quote! {
                    ::rowmap_core::IdentifierAnnotation::with_strategy(
                        ::rowmap_core::IdentifierStrategy::#variant
                    )
                }
            }
            None => quote! { ::rowmap_core::IdentifierAnnotation::new() },
        };
        let sequence = identifier
            .sequence
            .as_ref()
            .map(|sequence| quote! { .sequence(#sequence) });
        quote! { .identifier(#base #sequence) }
    });

    quote! {
        ::rowmap_core::MemberDescriptor::new::<#ty>(#member) #column #identifier
    }
}

/// Generate the `Mapped` trait implementation.
pub fn generate_mapped_impl(def: &MappedDef) -> TokenStream {
    let name = &def.name;
    let name_str = name.to_string();
    let (impl_generics, ty_generics, where_clause) = def.generics.split_for_impl();

    let table = generate_table(def.table.as_ref());
    let members: Vec<TokenStream> = def.fields.iter().map(generate_member).collect();

    let field_idents: Vec<&Ident> = def.fields.iter().map(|f| &f.name).collect();
    let field_names: Vec<String> = field_idents.iter().map(ToString::to_string).collect();
    let field_types: Vec<&Type> = def.fields.iter().map(|f| &f.ty).collect();

    quote! {
        impl #impl_generics ::rowmap_core::Mapped for #name #ty_generics #where_clause {
            fn describe() -> ::rowmap_core::TypeDescriptor {
                ::rowmap_core::TypeDescriptor::new::<Self>(#name_str)
                    #table
                    #(.member(#members))*
            }

            fn object_info(
                &self,
            ) -> ::rowmap_core::Result<::std::sync::Arc<::rowmap_core::ObjectInfo>> {
                ::rowmap_core::ObjectInfo::for_type::<Self>()
            }

            fn member_value(&self, member: &str) -> ::std::option::Option<::rowmap_core::Value> {
                match member {
                    #(
                        #field_names => ::std::option::Option::Some(
                            ::rowmap_core::DbValue::to_value(&self.#field_idents)
                        ),
                    )*
                    _ => ::std::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn set_member_value(
                &mut self,
                member: &str,
                value: ::rowmap_core::Value,
            ) -> ::rowmap_core::Result<()> {
                match member {
                    #(
                        #field_names => {
                            self.#field_idents =
                                <#field_types as ::rowmap_core::DbValue>::from_value(value)?;
                        }
                    )*
                    _ => {
                        return ::std::result::Result::Err(::rowmap_core::Error::mapping(
                            ::std::format!("type '{}' has no member named '{}'", #name_str, member),
                        ));
                    }
                }
                ::std::result::Result::Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_parse_customer() {
        let input: DeriveInput = parse_quote! {
            #[table(schema = "Sales", name = "Customers")]
            struct Customer {
                #[column(name = "CustomerId")]
                #[identifier(strategy = "Assigned")]
                id: i32,
                #[column(allow_update = false)]
                created: String,
                #[transient]
                scratch: String,
                notes: String,
            }
        };
        let def = parse_mapped(&input).unwrap();

        let table = def.table.as_ref().unwrap();
        assert_eq!(table.name, "Customers");
        assert_eq!(table.schema.as_deref(), Some("Sales"));

        let names: Vec<String> = def.fields.iter().map(|f| f.name.to_string()).collect();
        assert_eq!(names, ["id", "created", "notes"]);

        let id = &def.fields[0];
        assert_eq!(id.column.as_ref().unwrap().name.as_deref(), Some("CustomerId"));
        assert_eq!(
            id.identifier.as_ref().unwrap().strategy.as_deref(),
            Some("Assigned")
        );
        assert_eq!(def.fields[1].column.as_ref().unwrap().allow_update, Some(false));
        assert!(def.fields[2].column.is_none());
    }

    #[test]
    fn test_bare_attributes() {
        let input: DeriveInput = parse_quote! {
            #[table(name = "Tags")]
            struct Tag {
                #[column]
                #[identifier]
                id: i64,
            }
        };
        let def = parse_mapped(&input).unwrap();
        let id = &def.fields[0];
        assert!(id.column.as_ref().unwrap().name.is_none());
        assert!(id.identifier.as_ref().unwrap().strategy.is_none());
    }

    #[test]
    fn test_strategy_is_normalised() {
        let input: DeriveInput = parse_quote! {
            #[table(name = "Tags")]
            struct Tag {
                #[column]
                #[identifier(strategy = "dbgenerated")]
                id: i64,
            }
        };
        let def = parse_mapped(&input).unwrap();
        assert_eq!(
            def.fields[0].identifier.as_ref().unwrap().strategy.as_deref(),
            Some("DbGenerated")
        );
    }

    #[test]
    fn test_rejects_bad_declarations() {
        let bad_strategy: DeriveInput = parse_quote! {
            struct Tag {
                #[identifier(strategy = "Guid")]
                id: i64,
            }
        };
        assert!(parse_mapped(&bad_strategy).is_err());

        let no_strategy: DeriveInput = parse_quote! {
            struct Tag {
                #[identifier(strategy = "None")]
                id: i64,
            }
        };
        assert!(parse_mapped(&no_strategy).is_err());

        let bad_name: DeriveInput = parse_quote! {
            #[table(name = "Tags; DROP TABLE x")]
            struct Tag {
                id: i64,
            }
        };
        assert!(parse_mapped(&bad_name).is_err());

        let two_ids: DeriveInput = parse_quote! {
            struct Tag {
                #[identifier]
                a: i64,
                #[identifier]
                b: i64,
            }
        };
        assert!(parse_mapped(&two_ids).is_err());

        let transient_column: DeriveInput = parse_quote! {
            struct Tag {
                #[transient]
                #[column]
                a: i64,
            }
        };
        assert!(parse_mapped(&transient_column).is_err());

        let tuple: DeriveInput = parse_quote! {
            struct Tag(i64);
        };
        assert!(parse_mapped(&tuple).is_err());
    }

    #[test]
    fn test_generated_impl_describes_members() {
        let input: DeriveInput = parse_quote! {
            #[table(name = "Tags")]
            struct Tag {
                #[column(name = "TagId")]
                #[identifier(strategy = "Sequence", sequence = "tag_seq")]
                id: i64,
            }
        };
        let def = parse_mapped(&input).unwrap();
        let tokens = generate_mapped_impl(&def).to_string();
        assert!(tokens.contains("TableAnnotation :: new (\"Tags\")"));
        assert!(tokens.contains("IdentifierStrategy :: Sequence"));
        assert!(tokens.contains(". sequence (\"tag_seq\")"));
        assert!(tokens.contains("ColumnAnnotation :: named (\"TagId\")"));
    }
}
