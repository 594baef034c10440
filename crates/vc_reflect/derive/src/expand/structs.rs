use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Fields, Generics, Index, Member, Path};

use super::reflect_impl;
use crate::attributes::FieldAttributes;

/// A field visible to reflection.
struct ReflectedField {
    member: Member,
    name: String,
    read_only: bool,
}

fn reflected_fields(fields: &Fields) -> syn::Result<Vec<ReflectedField>> {
    let mut out = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let attrs = FieldAttributes::parse(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let (member, default_name) = match &field.ident {
            Some(ident) => (Member::Named(ident.clone()), ident.to_string()),
            None => (Member::Unnamed(Index::from(index)), index.to_string()),
        };
        out.push(ReflectedField {
            member,
            name: attrs.rename.unwrap_or(default_name),
            read_only: attrs.read_only,
        });
    }
    Ok(out)
}

// -----------------------------------------------------------------------------
// Struct

pub(super) fn expand_struct(
    ast: &DeriveInput,
    fields: &Fields,
    generics: &Generics,
    vc_reflect: &Path,
) -> syn::Result<TokenStream> {
    let fields = reflected_fields(fields)?;
    let ident = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let exports = quote!(#vc_reflect::__macro_exports);

    let names: Vec<_> = fields.iter().map(|field| &field.name).collect();
    let members: Vec<_> = fields.iter().map(|field| &field.member).collect();
    let indices: Vec<_> = (0..fields.len()).collect();
    let infos = fields.iter().map(|field| {
        let name = &field.name;
        let read_only = field.read_only;
        quote!(#vc_reflect::info::FieldInfo::new(#name).with_read_only(#read_only))
    });

    let reflect = reflect_impl(ast, generics, vc_reflect, "Struct");

    Ok(quote! {
        #reflect

        impl #impl_generics #vc_reflect::ops::Struct for #ident #ty_generics #where_clause {
            fn field_infos(&self) -> &'static [#vc_reflect::info::FieldInfo] {
                const FIELDS: &[#vc_reflect::info::FieldInfo] = &[#(#infos),*];
                FIELDS
            }

            fn field(&self, name: &str) -> #exports::Option<&dyn #vc_reflect::Reflect> {
                match name {
                    #(#names => #exports::Some(&self.#members),)*
                    _ => #exports::None,
                }
            }

            fn field_mut(&mut self, name: &str) -> #exports::Option<&mut dyn #vc_reflect::Reflect> {
                match name {
                    #(#names => #exports::Some(&mut self.#members),)*
                    _ => #exports::None,
                }
            }

            fn field_at(&self, index: usize) -> #exports::Option<&dyn #vc_reflect::Reflect> {
                match index {
                    #(#indices => #exports::Some(&self.#members),)*
                    _ => #exports::None,
                }
            }

            fn field_at_mut(&mut self, index: usize) -> #exports::Option<&mut dyn #vc_reflect::Reflect> {
                match index {
                    #(#indices => #exports::Some(&mut self.#members),)*
                    _ => #exports::None,
                }
            }

            #[inline]
            fn iter_fields(&self) -> #vc_reflect::ops::StructFieldIter<'_> {
                #vc_reflect::ops::StructFieldIter::new(self)
            }
        }
    })
}

// -----------------------------------------------------------------------------
// Tuple struct

pub(super) fn expand_tuple(
    ast: &DeriveInput,
    fields: &Fields,
    generics: &Generics,
    vc_reflect: &Path,
) -> syn::Result<TokenStream> {
    let fields = reflected_fields(fields)?;
    let ident = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let exports = quote!(#vc_reflect::__macro_exports);

    let members: Vec<_> = fields.iter().map(|field| &field.member).collect();
    let indices: Vec<_> = (0..fields.len()).collect();
    let len = fields.len();
    let is_newtype = len == 1;

    let reflect = reflect_impl(ast, generics, vc_reflect, "Tuple");

    Ok(quote! {
        #reflect

        impl #impl_generics #vc_reflect::ops::Tuple for #ident #ty_generics #where_clause {
            #[inline]
            fn field_len(&self) -> usize {
                #len
            }

            fn field(&self, index: usize) -> #exports::Option<&dyn #vc_reflect::Reflect> {
                match index {
                    #(#indices => #exports::Some(&self.#members),)*
                    _ => #exports::None,
                }
            }

            fn field_mut(&mut self, index: usize) -> #exports::Option<&mut dyn #vc_reflect::Reflect> {
                match index {
                    #(#indices => #exports::Some(&mut self.#members),)*
                    _ => #exports::None,
                }
            }

            #[inline]
            fn iter_fields(&self) -> #vc_reflect::ops::TupleFieldIter<'_> {
                #vc_reflect::ops::TupleFieldIter::new(self)
            }

            #[inline]
            fn is_newtype(&self) -> bool {
                #is_newtype
            }
        }
    })
}
