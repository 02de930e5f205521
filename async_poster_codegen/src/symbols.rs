use std::collections::HashMap;

use proc_macro2::TokenStream;
use quote::{quote, ToTokens};
use syn::{Generics, Ident, Type};

use crate::marker::{AsyncMethodOptions, PosterOptions};

pub type TypeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// A trait declaration; wrappers are emitted as a companion extension trait.
    Trait,
    /// A nominal type with inherent methods.
    Type,
    /// A module of free functions, treated as a static member container.
    Module,
}

/// Declared accessibility, reduced to the levels the selection rules compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vis {
    Public,
    Crate,
    Super,
    Private,
}

impl Vis {
    pub fn from_syn(vis: &syn::Visibility) -> Self {
        match vis {
            syn::Visibility::Public(_) => Vis::Public,
            syn::Visibility::Crate(_) => Vis::Crate,
            syn::Visibility::Restricted(restricted) => {
                if restricted.path.is_ident("crate") {
                    Vis::Crate
                } else if restricted.path.is_ident("self") {
                    Vis::Private
                } else {
                    Vis::Super
                }
            }
            syn::Visibility::Inherited => Vis::Private,
        }
    }

    pub fn to_token_stream(self) -> TokenStream {
        match self {
            Vis::Public => quote!(pub),
            Vis::Crate => quote!(pub(crate)),
            Vis::Super => quote!(pub(super)),
            Vis::Private => TokenStream::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Param {
    pub ident: Ident,
    pub ty: Type,
}

/// One original method as seen by the selector.
#[derive(Debug, Clone)]
pub struct MethodSymbol {
    pub ident: Ident,
    pub vis: Vis,
    pub is_async: bool,
    pub is_static: bool,
    pub params: Vec<Param>,
    /// `None` for unit-returning methods.
    pub output: Option<Type>,
    /// Generic parameters of the method; the where clause is carried here when
    /// the declaration syntax was recoverable, and left empty otherwise.
    pub generics: Generics,
    pub options: Option<AsyncMethodOptions>,
    pub ignored: bool,
}

impl MethodSymbol {
    /// Identity key used for duplicate suppression across inheritance levels:
    /// the method name plus its ordered parameter type list.
    pub fn identity(&self) -> String {
        let mut key = self.ident.to_string();
        for param in &self.params {
            key.push('#');
            key.push_str(&param.ty.to_token_stream().to_string());
        }
        key
    }
}

/// One annotated (or reachable) type declaration under generation.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub ident: Ident,
    /// Module path of the declaration inside its crate.
    pub namespace: Vec<String>,
    /// Owning crate, compared when gating crate-restricted members.
    pub krate: String,
    pub generics: Generics,
    pub kind: TypeKind,
    pub vis: Vis,
    /// No instance members; terminates base traversal.
    pub is_static: bool,
    pub base: Option<TypeId>,
    pub markers: Vec<PosterOptions>,
    pub methods: Vec<MethodSymbol>,
}

impl TypeDescriptor {
    pub fn new(ident: Ident, kind: TypeKind) -> Self {
        Self {
            ident,
            namespace: Vec::new(),
            krate: String::new(),
            generics: Generics::default(),
            kind,
            vis: Vis::Private,
            is_static: false,
            base: None,
            markers: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn qualified_name(&self) -> String {
        let mut name = self.namespace.join("::");
        if !name.is_empty() {
            name.push_str("::");
        }
        name.push_str(&self.ident.to_string());
        name
    }

    /// Path tokens used to qualify delegation calls from an emitted unit.
    pub fn path_tokens(&self) -> TokenStream {
        let segments = self
            .namespace
            .iter()
            .map(|segment| Ident::new(segment, proc_macro2::Span::call_site()));
        let ident = &self.ident;
        quote!(#(#segments::)* #ident)
    }
}

/// The per-run symbol graph the driver walks. Built fresh per generation run,
/// immutable once handed to the driver, never persisted.
#[derive(Debug, Default)]
pub struct SymbolGraph {
    types: Vec<TypeDescriptor>,
    index: HashMap<String, TypeId>,
}

impl SymbolGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, descriptor: TypeDescriptor) -> TypeId {
        let id = self.types.len();
        self.index.insert(descriptor.qualified_name(), id);
        self.types.push(descriptor);
        id
    }

    pub fn get(&self, id: TypeId) -> &TypeDescriptor {
        &self.types[id]
    }

    pub fn get_mut(&mut self, id: TypeId) -> &mut TypeDescriptor {
        &mut self.types[id]
    }

    /// Lookup by fully qualified name; same-named types in different modules
    /// stay distinct.
    pub fn lookup(&self, qualified: &str) -> Option<TypeId> {
        self.index.get(qualified).copied()
    }

    /// First descriptor whose terminal identifier matches, for places where
    /// only a bare name is known (target paths, signature type names).
    pub fn lookup_ident(&self, ident: &str) -> Option<TypeId> {
        self.types
            .iter()
            .position(|descriptor| descriptor.ident == ident)
    }

    /// Resolves a marker target: the full path when the graph knows it as a
    /// qualified name, otherwise the terminal segment.
    pub fn lookup_path(&self, path: &syn::Path) -> Option<TypeId> {
        let qualified = path
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect::<Vec<_>>()
            .join("::");
        self.lookup(&qualified).or_else(|| {
            path.segments
                .last()
                .and_then(|segment| self.lookup_ident(&segment.ident.to_string()))
        })
    }

    pub fn set_base(&mut self, ty: TypeId, base: TypeId) {
        self.types[ty].base = Some(base);
    }

    /// Accessibility of a type referenced by bare name; types the graph has
    /// never seen (primitives, std, external crates) count as public.
    pub fn type_exposure(&self, ident: &str) -> Option<(Vis, &str)> {
        self.lookup_ident(ident)
            .map(|id| (self.types[id].vis, self.types[id].krate.as_str()))
    }

    /// Every descriptor carrying at least one poster marker, in insertion order.
    pub fn poster_types(&self) -> impl Iterator<Item = (TypeId, &TypeDescriptor)> {
        self.types
            .iter()
            .enumerate()
            .filter(|(_, descriptor)| !descriptor.markers.is_empty())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
