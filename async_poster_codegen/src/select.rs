//! Walks a type's member set (and, per `deep`, its base chain) applying the
//! eligibility rules in order, producing a deduplicated candidate list.

use std::collections::HashSet;

use log::{debug, trace};

use crate::error::Error;
use crate::marker::{MemberFlags, PosterOptions};
use crate::symbols::{MethodSymbol, SymbolGraph, TypeDescriptor, TypeId, Vis};

/// One original method accepted for wrapping, with its declaring level.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub method: &'a MethodSymbol,
    pub declaring: &'a TypeDescriptor,
}

/// Result of one traversal: accepted candidates in discovery order, plus the
/// identity keys of every ordinary method visited at any level. The latter is
/// consulted later so a wrapper is never emitted under a name that collides
/// with a method that already exists.
#[derive(Debug)]
pub struct Selection<'a> {
    pub candidates: Vec<Candidate<'a>>,
    pub visited: HashSet<String>,
}

pub fn select<'a>(
    graph: &'a SymbolGraph,
    root: TypeId,
    marker: &PosterOptions,
) -> Result<Selection<'a>, Error> {
    let root_descriptor = graph.get(root);
    let (walk_root, public_only) = match &marker.target {
        Some(path) => {
            let id = graph
                .lookup_path(path)
                .ok_or_else(|| Error::UnknownTarget(path_display(path)))?;
            (id, true)
        }
        None => (root, false),
    };

    let mut visited = HashSet::new();
    let mut accepted = HashSet::new();
    let mut candidates = Vec::new();
    let mut level = walk_root;
    let mut budget = marker.deep;

    loop {
        let descriptor = graph.get(level);
        for method in &descriptor.methods {
            let key = method.identity();
            // A shallower declaration has already claimed this identity.
            if !visited.insert(key.clone()) {
                trace!("{}: `{}` shadowed at a shallower level", descriptor.ident, key);
                continue;
            }
            if is_async_like(method) {
                trace!("{}: `{}` is already asynchronous", descriptor.ident, method.ident);
                continue;
            }
            if marker.ignore_methods.contains(&method.ident.to_string()) || method.ignored {
                trace!("{}: `{}` ignored by marker", descriptor.ident, method.ident);
                continue;
            }
            if !accessibility_permits(method, descriptor, root_descriptor, marker, public_only) {
                continue;
            }
            if !signature_exposable(method, graph, root_descriptor) {
                continue;
            }
            if method.params.iter().any(|param| is_borrowed(&param.ty)) {
                trace!(
                    "{}: `{}` has a borrowed parameter, cannot be captured",
                    descriptor.ident,
                    method.ident
                );
                continue;
            }
            if !accepted.insert(key) {
                continue;
            }
            candidates.push(Candidate {
                method,
                declaring: descriptor,
            });
        }

        if descriptor.is_static {
            break;
        }
        if budget == 0 {
            break;
        }
        budget -= 1;
        match descriptor.base {
            Some(base)
                if graph.get(base).vis == Vis::Public
                    || graph.get(base).krate == root_descriptor.krate =>
            {
                level = base;
            }
            _ => break,
        }
    }

    debug!(
        "selected {} candidate(s) on `{}`",
        candidates.len(),
        root_descriptor.ident
    );
    Ok(Selection {
        candidates,
        visited,
    })
}

fn accessibility_permits(
    method: &MethodSymbol,
    declaring: &TypeDescriptor,
    root: &TypeDescriptor,
    marker: &PosterOptions,
    public_only: bool,
) -> bool {
    // The target walk layers the public restriction on top of the flags
    // gate; it never widens what the flags admit.
    if public_only {
        return method.vis == Vis::Public && marker.flags.contains(MemberFlags::PUBLIC);
    }
    match method.vis {
        Vis::Public => marker.flags.contains(MemberFlags::PUBLIC),
        Vis::Super => marker.flags.contains(MemberFlags::PROTECTED),
        // Crate-restricted members from another crate are unreachable from the
        // generated unit.
        Vis::Crate => {
            marker.flags.contains(MemberFlags::INTERNAL) && declaring.krate == root.krate
        }
        // Private members are callable only from the root declaration itself.
        Vis::Private => {
            marker.flags.contains(MemberFlags::PRIVATE)
                && declaring.qualified_name() == root.qualified_name()
        }
    }
}

/// A wrapper must not leak a type its callers cannot see: every named type in
/// the signature that the graph knows to be non-public must live in the root
/// type's own crate.
fn signature_exposable(method: &MethodSymbol, graph: &SymbolGraph, root: &TypeDescriptor) -> bool {
    let mut names = Vec::new();
    if let Some(output) = &method.output {
        collect_type_names(output, &mut names);
    }
    for param in &method.params {
        collect_type_names(&param.ty, &mut names);
    }
    names.iter().all(|name| match graph.type_exposure(name) {
        Some((Vis::Public, _)) => true,
        Some((_, krate)) => krate == root.krate,
        None => true,
    })
}

fn collect_type_names(ty: &syn::Type, names: &mut Vec<String>) {
    match ty {
        syn::Type::Path(path) => {
            if let Some(segment) = path.path.segments.last() {
                names.push(segment.ident.to_string());
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    for arg in &args.args {
                        if let syn::GenericArgument::Type(inner) = arg {
                            collect_type_names(inner, names);
                        }
                    }
                }
            }
        }
        syn::Type::Reference(reference) => collect_type_names(&reference.elem, names),
        syn::Type::Paren(paren) => collect_type_names(&paren.elem, names),
        syn::Type::Group(group) => collect_type_names(&group.elem, names),
        syn::Type::Array(array) => collect_type_names(&array.elem, names),
        syn::Type::Slice(slice) => collect_type_names(&slice.elem, names),
        syn::Type::Tuple(tuple) => {
            for elem in &tuple.elems {
                collect_type_names(elem, names);
            }
        }
        _ => {}
    }
}

/// Already-asynchronous methods are skipped: declared `async`, named with an
/// `Async`/`_async` suffix, or returning a future-like handle.
pub(crate) fn is_async_like(method: &MethodSymbol) -> bool {
    if method.is_async {
        return true;
    }
    let name = method.ident.to_string();
    if name.ends_with("Async") || name.ends_with("_async") {
        return true;
    }
    match &method.output {
        Some(ty) => is_future_like(ty),
        None => false,
    }
}

fn is_future_like(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::ImplTrait(imp) => imp.bounds.iter().any(|bound| match bound {
            syn::TypeParamBound::Trait(bound) => {
                bound
                    .path
                    .segments
                    .last()
                    .map(|segment| segment.ident == "Future")
                    .unwrap_or(false)
            }
            _ => false,
        }),
        syn::Type::Path(path) => {
            let segment = match path.path.segments.last() {
                Some(segment) => segment,
                None => return false,
            };
            if segment.ident == "JoinHandle"
                || segment.ident == "BoxFuture"
                || segment.ident == "LocalBoxFuture"
            {
                return true;
            }
            // Pin<Box<dyn Future<..>>> and friends.
            if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                args.args.iter().any(|arg| match arg {
                    syn::GenericArgument::Type(inner) => is_future_like(inner),
                    _ => false,
                })
            } else {
                false
            }
        }
        syn::Type::TraitObject(object) => object.bounds.iter().any(|bound| match bound {
            syn::TypeParamBound::Trait(bound) => {
                bound
                    .path
                    .segments
                    .last()
                    .map(|segment| segment.ident == "Future")
                    .unwrap_or(false)
            }
            _ => false,
        }),
        syn::Type::Paren(paren) => is_future_like(&paren.elem),
        syn::Type::Group(group) => is_future_like(&group.elem),
        _ => false,
    }
}

/// Borrowed and raw-pointer parameters cannot be captured by value into a
/// `'static` deferred closure.
fn is_borrowed(ty: &syn::Type) -> bool {
    match ty {
        syn::Type::Reference(_) | syn::Type::Ptr(_) => true,
        syn::Type::Array(array) => is_borrowed(&array.elem),
        syn::Type::Slice(slice) => is_borrowed(&slice.elem),
        syn::Type::Paren(paren) => is_borrowed(&paren.elem),
        syn::Type::Group(group) => is_borrowed(&group.elem),
        syn::Type::Tuple(tuple) => tuple.elems.iter().any(is_borrowed),
        syn::Type::Path(path) => path.path.segments.iter().any(|segment| {
            if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                args.args.iter().any(|arg| match arg {
                    syn::GenericArgument::Type(inner) => is_borrowed(inner),
                    _ => false,
                })
            } else {
                false
            }
        }),
        _ => false,
    }
}

fn path_display(path: &syn::Path) -> String {
    use quote::ToTokens;
    path.to_token_stream().to_string().replace(' ', "")
}
