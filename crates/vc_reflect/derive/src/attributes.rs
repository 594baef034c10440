use syn::{Attribute, LitStr};

use crate::REFLECT_ATTRIBUTE_NAME;

/// `#[reflect(..)]` on the type itself.
#[derive(Debug, Default)]
pub(crate) struct TypeAttributes {
    /// `#[reflect(opaque)]`
    pub opaque: bool,
}

/// `#[reflect(..)]` on a field.
#[derive(Debug, Default)]
pub(crate) struct FieldAttributes {
    /// `#[reflect(skip)]`
    pub skip: bool,
    /// `#[reflect(read_only)]`
    pub read_only: bool,
    /// `#[reflect(rename = "..")]`
    pub rename: Option<String>,
}

/// `#[reflect(..)]` on an enum variant.
#[derive(Debug, Default)]
pub(crate) struct VariantAttributes {
    /// `#[reflect(rename = "..")]`
    pub rename: Option<String>,
}

fn reflect_attributes(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs
        .iter()
        .filter(|attr| attr.path().is_ident(REFLECT_ATTRIBUTE_NAME))
}

impl TypeAttributes {
    pub(crate) fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in reflect_attributes(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("opaque") {
                    this.opaque = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown type attribute, expected `opaque`"))
                }
            })?;
        }
        Ok(this)
    }
}

impl FieldAttributes {
    pub(crate) fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in reflect_attributes(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    this.skip = true;
                    Ok(())
                } else if meta.path.is_ident("read_only") {
                    this.read_only = true;
                    Ok(())
                } else if meta.path.is_ident("rename") {
                    let name: LitStr = meta.value()?.parse()?;
                    this.rename = Some(name.value());
                    Ok(())
                } else {
                    Err(meta.error(
                        "unknown field attribute, expected `skip`, `read_only` or `rename = \"..\"`",
                    ))
                }
            })?;
        }
        Ok(this)
    }
}

impl VariantAttributes {
    pub(crate) fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in reflect_attributes(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let name: LitStr = meta.value()?.parse()?;
                    this.rename = Some(name.value());
                    Ok(())
                } else {
                    Err(meta.error("unknown variant attribute, expected `rename = \"..\"`"))
                }
            })?;
        }
        Ok(this)
    }
}
