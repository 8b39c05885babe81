//! Attribute parsing for `#[stencil(...)]`.

use syn::{Attribute, LitStr};

/// Parsed `#[stencil(...)]` attributes on a type.
#[derive(Debug, Default)]
pub struct TypeAttrs {
    /// Type name reported to templates (default: `std::any::type_name::<Self>()`)
    pub name: Option<String>,
}

/// Parsed `#[stencil(...)]` attributes on a field.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    /// Name templates use for the field (default: the Rust field name)
    pub rename: Option<String>,
    /// Leave the field out of the model
    pub skip: bool,
}

impl TypeAttrs {
    /// Parse attributes from a list of `#[stencil(...)]` attributes.
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs {
            if !attr.path().is_ident("stencil") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    if value.value().trim().is_empty() {
                        return Err(syn::Error::new(value.span(), "model name cannot be empty"));
                    }
                    result.name = Some(value.value());
                } else {
                    return Err(meta.error(format!(
                        "unknown stencil attribute: {}",
                        meta.path.get_ident().map(|i| i.to_string()).unwrap_or_default()
                    )));
                }
                Ok(())
            })?;
        }

        Ok(result)
    }
}

impl FieldAttrs {
    /// Parse attributes from a list of `#[stencil(...)]` attributes.
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();

        for attr in attrs {
            if !attr.path().is_ident("stencil") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    result.rename = Some(value.value());
                } else if meta.path.is_ident("skip") {
                    result.skip = true;
                } else {
                    return Err(meta.error(format!(
                        "unknown stencil field attribute: {}",
                        meta.path.get_ident().map(|i| i.to_string()).unwrap_or_default()
                    )));
                }
                Ok(())
            })?;
        }

        Ok(result)
    }
}
