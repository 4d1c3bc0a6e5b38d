//! # Handler Sources
//!
//! Resolves handler paths such as `handlers::sales::total` against the Rust
//! source tree of the application, following `mod` declarations the way the
//! compiler does (inline modules, `name.rs`, `name/mod.rs`, `#[path]`).

use crate::error::{AppError, AppResult};
use crate::signature::{extract_signature, HandlerSignature};
use std::fs;
use std::path::{Path, PathBuf};
use syn::ext::IdentExt;
use syn::{ImplItem, Item, ItemMod};
use tracing::debug;

/// The source tree rooted at a crate root file (`src/lib.rs` or `src/main.rs`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTree {
    root: PathBuf,
}

/// Items of one module together with the directory its child modules live in.
struct ModuleScope {
    items: Vec<Item>,
    dir: PathBuf,
    file: PathBuf,
}

impl SourceTree {
    /// Creates a tree rooted at the given crate root file.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SourceTree { root: root.into() }
    }

    /// The crate root file.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a handler path to the signature of the function it names.
    ///
    /// Accepts `crate::` and `self::` prefixes and a trailing call such as `total(handler)`.
    /// When the second-to-last segment is not a module it is treated as a type
    /// and the function is looked up in its `impl` blocks.
    pub fn resolve(&self, function: &str) -> AppResult<HandlerSignature> {
        let segments = handler_path(function);
        let Some((fn_name, modules)) = segments.split_last() else {
            return Err(AppError::Resolve(format!(
                "empty handler path `{}`",
                function
            )));
        };

        let mut scope = self.root_scope()?;
        for (i, module) in modules.iter().enumerate() {
            if i + 1 == modules.len() && find_mod(&scope.items, module).is_none() {
                return find_method(&scope, module, fn_name);
            }
            scope = descend(scope, module)?;
        }

        find_fn(&scope, fn_name)
    }

    fn root_scope(&self) -> AppResult<ModuleScope> {
        let file = parse_source(&self.root)?;
        Ok(ModuleScope {
            items: file.items,
            dir: parent_dir(&self.root),
            file: self.root.clone(),
        })
    }
}

/// Splits `crate::a::b(handler)` or `self::a::b` into `["a", "b"]`.
fn handler_path(function: &str) -> Vec<&str> {
    let path = function.split('(').next().unwrap_or_default().trim();
    let mut segments: Vec<&str> = path
        .split("::")
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();
    // Paths are resolved from the crate root, where `self` and `crate` coincide.
    if matches!(segments.first(), Some(&"crate" | &"self")) {
        segments.remove(0);
    }
    segments
}

/// Reads and parses a Rust source file.
pub fn parse_source(path: &Path) -> AppResult<syn::File> {
    let code = fs::read_to_string(path).map_err(|error| AppError::ReadFile {
        filepath: path.to_path_buf(),
        error,
    })?;
    syn::parse_file(&code).map_err(|error| AppError::ParseFile {
        error,
        filepath: path.to_path_buf(),
        source_code: code,
    })
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

fn find_mod<'a>(items: &'a [Item], name: &str) -> Option<&'a ItemMod> {
    items.iter().find_map(|item| match item {
        Item::Mod(m) if m.ident.unraw() == name => Some(m),
        _ => None,
    })
}

fn descend(scope: ModuleScope, name: &str) -> AppResult<ModuleScope> {
    let module = find_mod(&scope.items, name).ok_or_else(|| {
        AppError::Resolve(format!(
            "module `{}` is not declared in {}",
            name,
            scope.file.display()
        ))
    })?;
    let child_dir = scope.dir.join(name);

    if let Some((_, items)) = &module.content {
        debug!(module = name, "descending into inline module");
        return Ok(ModuleScope {
            items: items.clone(),
            dir: child_dir,
            file: scope.file.clone(),
        });
    }

    let file = match path_attribute(module) {
        Some(path) => parent_dir(&scope.file).join(path),
        None => {
            let flat = scope.dir.join(format!("{}.rs", name));
            if flat.is_file() {
                flat
            } else {
                child_dir.join("mod.rs")
            }
        }
    };
    debug!(module = name, file = %file.display(), "descending into module file");

    let parsed = parse_source(&file)?;
    Ok(ModuleScope {
        items: parsed.items,
        dir: child_dir,
        file,
    })
}

/// Value of `#[path = "..."]` on a `mod` declaration.
fn path_attribute(module: &ItemMod) -> Option<String> {
    module
        .attrs
        .iter()
        .filter(|attr| attr.path().is_ident("path"))
        .find_map(|attr| match &attr.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
}

fn find_fn(scope: &ModuleScope, name: &str) -> AppResult<HandlerSignature> {
    scope
        .items
        .iter()
        .find_map(|item| match item {
            Item::Fn(f) if f.sig.ident.unraw() == name => Some(extract_signature(&f.attrs, &f.sig)),
            _ => None,
        })
        .ok_or_else(|| {
            AppError::Resolve(format!(
                "function `{}` not found in {}",
                name,
                scope.file.display()
            ))
        })
}

fn find_method(scope: &ModuleScope, type_name: &str, name: &str) -> AppResult<HandlerSignature> {
    scope
        .items
        .iter()
        .filter_map(|item| match item {
            Item::Impl(block) if impl_target(&block.self_ty).as_deref() == Some(type_name) => {
                Some(block)
            }
            _ => None,
        })
        .flat_map(|block| block.items.iter())
        .find_map(|item| match item {
            ImplItem::Fn(f) if f.sig.ident.unraw() == name => Some(extract_signature(&f.attrs, &f.sig)),
            _ => None,
        })
        .ok_or_else(|| {
            AppError::Resolve(format!(
                "`{}` is neither a module nor a type with a `{}` method in {}",
                type_name,
                name,
                scope.file.display()
            ))
        })
}

fn impl_target(ty: &syn::Type) -> Option<String> {
    match ty {
        syn::Type::Path(p) => p.path.segments.last().map(|s| s.ident.unraw().to_string()),
        _ => None,
    }
}
