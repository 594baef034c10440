use proc_macro2::{Ident, Span, TokenStream};
use quote::{format_ident, quote};
use syn::{DataEnum, DeriveInput, Fields, Generics, Index, Member, Path};

use super::reflect_impl;
use crate::attributes::{FieldAttributes, VariantAttributes};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Shape {
    Unit,
    Tuple,
    Named,
}

/// A variant as seen by reflection.
struct ReflectedVariant {
    ident: Ident,
    name: String,
    shape: Shape,
    /// `(member, binding, name)` for each field that is not skipped.
    fields: Vec<(Member, Ident, String)>,
}

impl ReflectedVariant {
    /// `Self::V { a: __field_0, 1: __field_1, .. }`
    fn binding_pattern(&self) -> TokenStream {
        let ident = &self.ident;
        let members = self.fields.iter().map(|(member, _, _)| member);
        let bindings = self.fields.iter().map(|(_, binding, _)| binding);
        quote!(Self::#ident { #(#members: #bindings,)* .. })
    }

    fn kind(&self, vc_reflect: &Path) -> TokenStream {
        match self.shape {
            Shape::Unit => quote!(#vc_reflect::info::VariantKind::Unit),
            Shape::Tuple => quote!(#vc_reflect::info::VariantKind::Tuple),
            Shape::Named => quote!(#vc_reflect::info::VariantKind::Struct),
        }
    }

    /// `Self::V { .. }`
    fn any_pattern(&self) -> TokenStream {
        let ident = &self.ident;
        quote!(Self::#ident { .. })
    }
}

fn reflected_variants(data: &DataEnum) -> syn::Result<Vec<ReflectedVariant>> {
    let mut out = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        let attrs = VariantAttributes::parse(&variant.attrs)?;
        let shape = match &variant.fields {
            Fields::Unit => Shape::Unit,
            Fields::Unnamed(_) => Shape::Tuple,
            Fields::Named(_) => Shape::Named,
        };

        let mut fields = Vec::new();
        for (index, field) in variant.fields.iter().enumerate() {
            let field_attrs = FieldAttributes::parse(&field.attrs)?;
            if field_attrs.skip {
                continue;
            }
            let (member, default_name) = match &field.ident {
                Some(ident) => (Member::Named(ident.clone()), ident.to_string()),
                None => (Member::Unnamed(Index::from(index)), index.to_string()),
            };
            let binding = format_ident!("__field_{}", fields.len());
            fields.push((member, binding, field_attrs.rename.unwrap_or(default_name)));
        }

        out.push(ReflectedVariant {
            ident: variant.ident.clone(),
            name: attrs.rename.unwrap_or_else(|| variant.ident.to_string()),
            shape,
            fields,
        });
    }
    Ok(out)
}

// -----------------------------------------------------------------------------
// Enum

pub(super) fn expand_enum(
    ast: &DeriveInput,
    data: &DataEnum,
    generics: &Generics,
    vc_reflect: &Path,
) -> syn::Result<TokenStream> {
    if data.variants.is_empty() {
        return Err(syn::Error::new(
            Span::call_site(),
            "`Reflect` cannot be derived for enums without variants",
        ));
    }

    let variants = reflected_variants(data)?;
    let ident = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let exports = quote!(#vc_reflect::__macro_exports);

    let any_patterns: Vec<_> = variants.iter().map(ReflectedVariant::any_pattern).collect();
    let names: Vec<_> = variants.iter().map(|variant| &variant.name).collect();
    let indices: Vec<_> = (0..variants.len()).collect();
    let kinds: Vec<_> = variants.iter().map(|variant| variant.kind(vc_reflect)).collect();
    let lens: Vec<_> = variants.iter().map(|variant| variant.fields.len()).collect();

    // Struct variants, addressed by field name.
    let named: Vec<_> = variants.iter().filter(|variant| variant.shape == Shape::Named).collect();
    let named_patterns: Vec<_> = named.iter().map(|variant| variant.binding_pattern()).collect();
    let named_lookup: Vec<_> = named
        .iter()
        .map(|variant| {
            let names = variant.fields.iter().map(|(_, _, name)| name);
            let bindings = variant.fields.iter().map(|(_, binding, _)| binding);
            quote! {
                match name {
                    #(#names => #exports::Some(#bindings),)*
                    _ => #exports::None,
                }
            }
        })
        .collect();
    let named_any: Vec<_> = named.iter().map(|variant| variant.any_pattern()).collect();
    let name_at: Vec<_> = named
        .iter()
        .map(|variant| {
            let positions = 0..variant.fields.len();
            let names = variant.fields.iter().map(|(_, _, name)| name);
            quote! {
                match index {
                    #(#positions => #exports::Some(#names),)*
                    _ => #exports::None,
                }
            }
        })
        .collect();

    // Every variant with fields, addressed by position.
    let with_fields: Vec<_> = variants.iter().filter(|variant| !variant.fields.is_empty()).collect();
    let positional_patterns: Vec<_> = with_fields.iter().map(|variant| variant.binding_pattern()).collect();
    let positional_lookup: Vec<_> = with_fields
        .iter()
        .map(|variant| {
            let positions = 0..variant.fields.len();
            let bindings = variant.fields.iter().map(|(_, binding, _)| binding);
            quote! {
                match index {
                    #(#positions => #exports::Some(#bindings),)*
                    _ => #exports::None,
                }
            }
        })
        .collect();

    let units: Vec<_> = variants.iter().filter(|variant| variant.shape == Shape::Unit).collect();
    let unit_names: Vec<_> = units.iter().map(|variant| &variant.name).collect();
    let unit_idents: Vec<_> = units.iter().map(|variant| &variant.ident).collect();

    let reflect = reflect_impl(ast, generics, vc_reflect, "Enum");

    Ok(quote! {
        #reflect

        impl #impl_generics #vc_reflect::ops::Enum for #ident #ty_generics #where_clause {
            fn variant_name(&self) -> &'static str {
                match self {
                    #(#any_patterns => #names,)*
                }
            }

            fn variant_index(&self) -> usize {
                match self {
                    #(#any_patterns => #indices,)*
                }
            }

            fn variant_kind(&self) -> #vc_reflect::info::VariantKind {
                match self {
                    #(#any_patterns => #kinds,)*
                }
            }

            fn variant_names(&self) -> &'static [&'static str] {
                const NAMES: &[&str] = &[#(#names),*];
                NAMES
            }

            fn field_len(&self) -> usize {
                match self {
                    #(#any_patterns => #lens,)*
                }
            }

            #[allow(unreachable_patterns, unused_variables)]
            fn field(&self, name: &str) -> #exports::Option<&dyn #vc_reflect::Reflect> {
                match self {
                    #(#named_patterns => #named_lookup,)*
                    _ => #exports::None,
                }
            }

            #[allow(unreachable_patterns, unused_variables)]
            fn field_mut(&mut self, name: &str) -> #exports::Option<&mut dyn #vc_reflect::Reflect> {
                match self {
                    #(#named_patterns => #named_lookup,)*
                    _ => #exports::None,
                }
            }

            #[allow(unreachable_patterns, unused_variables)]
            fn field_at(&self, index: usize) -> #exports::Option<&dyn #vc_reflect::Reflect> {
                match self {
                    #(#positional_patterns => #positional_lookup,)*
                    _ => #exports::None,
                }
            }

            #[allow(unreachable_patterns, unused_variables)]
            fn field_at_mut(&mut self, index: usize) -> #exports::Option<&mut dyn #vc_reflect::Reflect> {
                match self {
                    #(#positional_patterns => #positional_lookup,)*
                    _ => #exports::None,
                }
            }

            #[allow(unreachable_patterns, unused_variables)]
            fn name_at(&self, index: usize) -> #exports::Option<&'static str> {
                match self {
                    #(#named_any => #name_at,)*
                    _ => #exports::None,
                }
            }

            fn unit_variant(&self, name: &str) -> #exports::Option<#exports::Box<dyn #vc_reflect::Reflect>> {
                match name {
                    #(#unit_names => #exports::Some(#exports::Box::new(Self::#unit_idents)),)*
                    _ => #exports::None,
                }
            }

            #[inline]
            fn iter_fields(&self) -> #vc_reflect::ops::VariantFieldIter<'_> {
                #vc_reflect::ops::VariantFieldIter::new(self)
            }
        }
    })
}
