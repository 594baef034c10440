use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use toml_edit::{Document, Item, Table};

/// The caller's `Cargo.toml`, used to find how it can name `vc_reflect`.
///
/// # Resolution rules
///
/// 1. `vc_reflect` listed in `dependencies`: `::vc_reflect`.
/// 2. One of the re-exporting crates listed: `::<crate>::reflect`, checked in
///    the order `vc_convert`, `vc_agent`, `vc_probe`.
/// 3. Repeat 1-2 for `dev-dependencies`.
/// 4. Otherwise `::vc_reflect`.
///
/// `vc_reflect` itself lists none of these and relies on
/// `extern crate self as vc_reflect;`.
struct Manifest {
    document: Document<Box<str>>,
    modified: SystemTime,
}

const REFLECT_CRATE: &str = "vc_reflect";
const REEXPORTING_CRATES: [&str; 3] = ["vc_convert", "vc_agent", "vc_probe"];

impl Manifest {
    fn path() -> Option<PathBuf> {
        let mut path = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR")?);
        path.push("Cargo.toml");
        Some(path)
    }

    fn load(path: &PathBuf, modified: SystemTime) -> Option<Self> {
        let text = std::fs::read_to_string(path).ok()?.into_boxed_str();
        let document = Document::parse(text).ok()?;
        Some(Self { document, modified })
    }

    fn find_in(deps: &Table) -> Option<String> {
        if deps.contains_key(REFLECT_CRATE) {
            return Some(format!("::{REFLECT_CRATE}"));
        }
        REEXPORTING_CRATES
            .iter()
            .find(|name| deps.contains_key(name))
            .map(|name| format!("::{name}::reflect"))
    }

    fn reflect_path(&self) -> Option<String> {
        ["dependencies", "dev-dependencies"]
            .iter()
            .find_map(|section| match self.document.get(section) {
                Some(Item::Table(deps)) => Self::find_in(deps),
                _ => None,
            })
    }
}

/// Returns the path of `vc_reflect` as seen from the crate being compiled.
pub(crate) fn reflect_crate_path() -> syn::Path {
    static MANIFESTS: RwLock<BTreeMap<PathBuf, Manifest>> = RwLock::new(BTreeMap::new());

    let fallback = || syn::parse_quote!(::vc_reflect);

    let Some(path) = Manifest::path() else {
        return fallback();
    };
    let Ok(modified) = std::fs::metadata(&path).and_then(|meta| meta.modified()) else {
        return fallback();
    };

    let cached = {
        let manifests = MANIFESTS.read().unwrap_or_else(PoisonError::into_inner);
        manifests
            .get(&path)
            .filter(|manifest| manifest.modified == modified)
            .map(Manifest::reflect_path)
    };

    let resolved = match cached {
        Some(resolved) => resolved,
        None => {
            let Some(manifest) = Manifest::load(&path, modified) else {
                return fallback();
            };
            let resolved = manifest.reflect_path();
            MANIFESTS
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(path, manifest);
            resolved
        }
    };

    resolved
        .and_then(|text| syn::parse_str(&text).ok())
        .unwrap_or_else(fallback)
}
