//! Stencil Proc Macros
//!
//! `#[derive(Model)]` describes a struct to the template compiler so its
//! fields can be referenced from templates and checked at compile time.
//!
//! # Example
//!
//! ```ignore
//! use stencil::Model;
//!
//! #[derive(Model)]
//! #[stencil(name = "shop::Order")]
//! pub struct Order {
//!     #[stencil(rename = "Id")]
//!     pub id: u64,
//!     pub customer: Option<String>,
//!     #[stencil(skip)]
//!     pub cache_key: u128,
//! }
//! ```

use proc_macro::TokenStream;

mod attrs;
mod derive_model;

/// Derive the `Model` and `FieldValue` traits for a struct with named fields.
///
/// The generated shape lists the fields in declaration order, so
/// `Model::field(i)` reads the `i`-th non-skipped field.
///
/// # Attributes
///
/// - `#[stencil(name = "...")]` - Override the type name (default: `std::any::type_name::<Self>()`)
///
/// # Field Attributes
///
/// - `#[stencil(rename = "...")]` - Name templates use for the field
/// - `#[stencil(skip)]` - Leave the field out of the model
///
/// Every other field's type must implement `FieldValue`: strings, scalars,
/// `Option<T>`, and other derived models.
#[proc_macro_derive(Model, attributes(stencil))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    derive_model::derive_model_impl(input)
}
