//! See the [`Reflect`](macro@Reflect) derive macro.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static REFLECT_ATTRIBUTE_NAME: &str = "reflect";

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod expand;
mod manifest;

// -----------------------------------------------------------------------------
// Macros

/// # Reflection Derivation
///
/// `#[derive(Reflect)]` implements `Reflect` and the kind trait matching the
/// shape of the type:
///
/// - `Struct` for `struct T { ... }` and unit structs `struct T;`
/// - `Tuple` for `struct T(...);`
/// - `Enum` for `enum T { ... }`
///
/// Type parameters receive a `Reflect` bound. Lifetime parameters are not
/// supported, since reflected values are `'static`.
///
/// ## Field attributes
///
/// - `#[reflect(skip)]`: the field does not exist for reflection. It is
///   neither read nor written, and it is not counted by `field_len`.
/// - `#[reflect(read_only)]`: the field is readable, but writers must refuse
///   to change it (`FieldInfo::is_read_only`).
/// - `#[reflect(rename = "name")]`: the reflected name of the field.
///
/// ```rust, ignore
/// #[derive(Reflect)]
/// struct Session {
///     #[reflect(rename = "user")]
///     user_name: String,
///     #[reflect(read_only)]
///     created: chrono::DateTime<chrono::Utc>,
///     #[reflect(skip)]
///     socket: Socket,
/// }
/// ```
///
/// ## Variant attributes
///
/// - `#[reflect(rename = "name")]`: the reflected variant name. Unit
///   variants are constructed by this name through `Enum::unit_variant`.
///
/// ## Type attributes
///
/// - `#[reflect(opaque)]`: reflect the type as a single leaf value. The type
///   must implement `Debug`, which becomes its reflected debug form.
///
/// ## Crate path
///
/// The generated code names `vc_reflect` by the path the deriving crate can
/// see: `::vc_reflect` when it depends on it directly, otherwise the
/// `reflect` re-export of `vc_convert`, `vc_agent` or `vc_probe`.
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    expand::derive_reflect(&ast)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
