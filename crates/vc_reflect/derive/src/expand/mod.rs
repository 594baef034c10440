use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use syn::{Data, DeriveInput, Fields, GenericParam, Generics, Path};

use crate::attributes::TypeAttributes;
use crate::manifest::reflect_crate_path;

// -----------------------------------------------------------------------------
// Modules

mod enums;
mod structs;

// -----------------------------------------------------------------------------
// Entry

pub(crate) fn derive_reflect(ast: &DeriveInput) -> syn::Result<TokenStream> {
    if let Some(lifetime) = ast.generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(
            lifetime,
            "`Reflect` requires `'static` types, lifetime parameters are not supported",
        ));
    }

    let attrs = TypeAttributes::parse(&ast.attrs)?;
    let vc_reflect = reflect_crate_path();
    let generics = with_reflect_bounds(&ast.generics, &vc_reflect);

    let body = if attrs.opaque {
        reflect_impl(ast, &generics, &vc_reflect, "Opaque")
    } else {
        match &ast.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(_) | Fields::Unit => {
                    structs::expand_struct(ast, &data.fields, &generics, &vc_reflect)?
                }
                Fields::Unnamed(_) => {
                    structs::expand_tuple(ast, &data.fields, &generics, &vc_reflect)?
                }
            },
            Data::Enum(data) => enums::expand_enum(ast, data, &generics, &vc_reflect)?,
            Data::Union(data) => {
                return Err(syn::Error::new_spanned(
                    data.union_token,
                    "`Reflect` cannot be derived for unions",
                ));
            }
        }
    };

    Ok(quote! {
        const _: () = {
            #body
        };
    })
}

// -----------------------------------------------------------------------------
// Shared pieces

/// Adds `T: Reflect` for every type parameter.
fn with_reflect_bounds(generics: &Generics, vc_reflect: &Path) -> Generics {
    let mut generics = generics.clone();
    for param in &mut generics.params {
        if let GenericParam::Type(param) = param {
            param.bounds.push(syn::parse_quote!(#vc_reflect::Reflect));
        }
    }
    generics
}

/// The `Reflect` impl for a type whose kind trait is named `kind`.
fn reflect_impl(ast: &DeriveInput, generics: &Generics, vc_reflect: &Path, kind: &str) -> TokenStream {
    let ident = &ast.ident;
    let kind = Ident::new(kind, Span::call_site());
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let exports = quote!(#vc_reflect::__macro_exports);

    let debug = if kind == "Opaque" {
        quote! {
            #[inline]
            fn reflect_debug(&self, f: &mut #exports::Formatter<'_>) -> #exports::FmtResult {
                #exports::Debug::fmt(self, f)
            }
        }
    } else {
        TokenStream::new()
    };

    quote! {
        impl #impl_generics #vc_reflect::Reflect for #ident #ty_generics #where_clause {
            #[inline]
            fn as_any(&self) -> &dyn #exports::Any {
                self
            }

            #[inline]
            fn as_any_mut(&mut self) -> &mut dyn #exports::Any {
                self
            }

            #[inline]
            fn into_any(self: #exports::Box<Self>) -> #exports::Box<dyn #exports::Any> {
                self
            }

            #[inline]
            fn reflect_kind(&self) -> #vc_reflect::ReflectKind {
                #vc_reflect::ReflectKind::#kind
            }

            #[inline]
            fn reflect_ref(&self) -> #vc_reflect::ReflectRef<'_> {
                #vc_reflect::ReflectRef::#kind(self)
            }

            #[inline]
            fn reflect_mut(&mut self) -> #vc_reflect::ReflectMut<'_> {
                #vc_reflect::ReflectMut::#kind(self)
            }

            fn replace(
                &mut self,
                value: #exports::Box<dyn #vc_reflect::Reflect>,
            ) -> #exports::Result<
                #exports::Box<dyn #vc_reflect::Reflect>,
                #exports::Box<dyn #vc_reflect::Reflect>,
            > {
                let value = <dyn #vc_reflect::Reflect>::take::<Self>(value)?;
                #exports::Ok(#exports::Box::new(#exports::replace(self, value)))
            }

            #debug
        }
    }
}
