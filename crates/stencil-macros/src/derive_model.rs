//! Implementation of the `#[derive(Model)]` macro.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, Type, parse_macro_input, parse_quote};

use crate::attrs::{FieldAttrs, TypeAttrs};

pub fn derive_model_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_model_inner(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// A field that is part of the model.
struct ModelField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    name: String,
}

fn derive_model_inner(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let attrs = TypeAttrs::from_attrs(&input.attrs)?;
    let fields = collect_fields(input)?;

    let host_name = match &attrs.name {
        Some(explicit) => quote! { #explicit },
        None => quote! { ::core::any::type_name::<Self>() },
    };

    // Every field type must convert to a template value.
    let mut generics = input.generics.clone();
    {
        let where_clause = generics.make_where_clause();
        for field in &fields {
            let ty = field.ty;
            where_clause
                .predicates
                .push(parse_quote! { #ty: ::stencil::FieldValue });
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let shapes = fields.iter().map(|field| {
        let field_name = &field.name;
        let ty = field.ty;
        quote! {
            ::stencil::FieldShape::new(#field_name, <#ty as ::stencil::FieldValue>::kind())
        }
    });

    let arms = fields.iter().enumerate().map(|(index, field)| {
        let ident = field.ident;
        quote! {
            #index => ::core::option::Option::Some(::stencil::FieldValue::to_value(&self.#ident)),
        }
    });

    Ok(quote! {
        impl #impl_generics ::stencil::Model for #name #ty_generics #where_clause {
            fn shape() -> ::stencil::ModelShape {
                ::stencil::ModelShape::new(#host_name, ::std::vec![#(#shapes),*])
            }

            fn type_name(&self) -> &'static str {
                #host_name
            }

            fn field(&self, index: usize) -> ::core::option::Option<::stencil::Value<'_>> {
                match index {
                    #(#arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl #impl_generics ::stencil::FieldValue for #name #ty_generics #where_clause {
            fn kind() -> ::stencil::FieldKind {
                ::stencil::FieldKind::Object(<Self as ::stencil::Model>::shape)
            }

            fn to_value(&self) -> ::stencil::Value<'_> {
                ::stencil::Value::Object(self)
            }
        }
    })
}

/// Collect the non-skipped named fields, in declaration order.
fn collect_fields(input: &DeriveInput) -> syn::Result<Vec<ModelField<'_>>> {
    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Model can only be derived for structs with named fields",
                ));
            }
        },
        Data::Enum(data) => {
            return Err(syn::Error::new(
                data.enum_token.span,
                "Model cannot be derived for enums",
            ));
        }
        Data::Union(data) => {
            return Err(syn::Error::new(
                data.union_token.span,
                "Model cannot be derived for unions",
            ));
        }
    };

    let mut fields: Vec<ModelField<'_>> = Vec::with_capacity(named.len());
    for field in named {
        let attrs = FieldAttrs::from_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let name = attrs
            .rename
            .unwrap_or_else(|| ident.to_string().trim_start_matches("r#").to_string());
        if fields.iter().any(|f| f.name == name) {
            return Err(syn::Error::new_spanned(
                ident,
                format!("duplicate model field name '{name}'"),
            ));
        }
        fields.push(ModelField {
            ident,
            ty: &field.ty,
            name,
        });
    }
    Ok(fields)
}
