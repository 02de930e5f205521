//! Orchestrates one generation run: walks every marked type in the graph,
//! runs the selection/resolution/emission pipeline per marker, and publishes
//! one deduplicated output unit per target identity.

use std::collections::HashSet;

use log::{debug, trace};
use proc_macro2::TokenStream;

use crate::emit::emit;
use crate::error::Error;
use crate::marker::PosterOptions;
use crate::resolve::{resolve, ResolvedMethod};
use crate::select::select;
use crate::symbols::{SymbolGraph, TypeDescriptor, TypeId};

/// One emitted, independently compilable fragment of synthesized
/// declarations, tied to one target type identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUnit {
    /// Deterministic synthetic file identity: qualified type name with
    /// generic brackets stripped, plus a fixed suffix.
    pub identity: String,
    pub text: String,
}

pub struct Driver<'g> {
    graph: &'g SymbolGraph,
}

impl<'g> Driver<'g> {
    pub fn new(graph: &'g SymbolGraph) -> Self {
        Self { graph }
    }

    /// One generation run. A graph without marked types yields nothing; a
    /// marked type whose selection comes up empty still yields an (empty)
    /// reopening so downstream merging stays consistent. Identities already
    /// emitted earlier in the run are silently dropped, first-seen wins.
    pub fn run(&self) -> Result<Vec<OutputUnit>, Error> {
        let mut seen = HashSet::new();
        let mut units = Vec::new();

        for (id, descriptor) in self.graph.poster_types() {
            let identity = unit_identity(descriptor);
            if !seen.insert(identity.clone()) {
                debug!("dropping duplicate unit `{}`", identity);
                continue;
            }
            let mut fragments = TokenStream::new();
            for marker in &descriptor.markers {
                fragments.extend(generate_fragment(self.graph, id, marker)?);
            }
            let text = render(&identity, fragments)?;
            debug!("emitting `{}` ({} bytes)", identity, text.len());
            units.push(OutputUnit { identity, text });
        }

        Ok(units)
    }
}

/// Selection → resolution → emission for a single marker instance.
pub fn generate_fragment(
    graph: &SymbolGraph,
    root: TypeId,
    marker: &PosterOptions,
) -> Result<TokenStream, Error> {
    let selection = select(graph, root, marker)?;

    let mut resolved: Vec<ResolvedMethod<'_>> = Vec::new();
    for candidate in &selection.candidates {
        let method = resolve(*candidate, marker);
        // A method with the wrapper's exact name and parameters already
        // exists somewhere on the walk; generating it again would collide.
        if selection.visited.contains(&method.identity()) {
            trace!("`{}` already declared, not generated", method.name);
            continue;
        }
        resolved.push(method);
    }

    let walk_target = marker
        .target
        .as_ref()
        .and_then(|path| graph.lookup_path(path))
        .map(|id| graph.get(id));

    Ok(emit(graph.get(root), walk_target, marker, &resolved))
}

fn unit_identity(descriptor: &TypeDescriptor) -> String {
    let sanitized = descriptor
        .qualified_name()
        .replace("::", ".")
        .replace(['<', '>'], "");
    format!("{}_poster.g.rs", sanitized)
}

/// Every unit must reparse as a valid source file before it is published;
/// anything else is a generation defect surfaced to the caller.
fn render(identity: &str, tokens: TokenStream) -> Result<String, Error> {
    let text = tokens.to_string();
    syn::parse_file(&text).map_err(|source| Error::Render {
        identity: identity.to_owned(),
        source,
    })?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{MethodSymbol, Param, TypeKind, Vis};
    use pretty_assertions::assert_eq;
    use proc_macro2::Span;
    use syn::parse_quote;

    fn ident(name: &str) -> syn::Ident {
        syn::Ident::new(name, Span::call_site())
    }

    fn add_like(name: &str) -> MethodSymbol {
        MethodSymbol {
            ident: ident(name),
            vis: Vis::Public,
            is_async: false,
            is_static: false,
            params: vec![
                Param {
                    ident: ident("a"),
                    ty: parse_quote!(i32),
                },
                Param {
                    ident: ident("b"),
                    ty: parse_quote!(i32),
                },
            ],
            output: Some(parse_quote!(i32)),
            generics: syn::Generics::default(),
            options: None,
            ignored: false,
        }
    }

    fn marked(name: &str, methods: Vec<MethodSymbol>) -> TypeDescriptor {
        let mut descriptor = TypeDescriptor::new(ident(name), TypeKind::Type);
        descriptor.vis = Vis::Public;
        descriptor.krate = "demo".into();
        descriptor.markers = vec![PosterOptions::default()];
        descriptor.methods = methods;
        descriptor
    }

    #[test]
    fn unmarked_graph_is_a_no_op() {
        let mut graph = SymbolGraph::new();
        let mut descriptor = marked("C", vec![add_like("add")]);
        descriptor.markers.clear();
        graph.insert(descriptor);
        assert!(Driver::new(&graph).run().unwrap().is_empty());
    }

    #[test]
    fn generates_one_wrapper_per_eligible_method() {
        let mut graph = SymbolGraph::new();
        graph.insert(marked("C", vec![add_like("add"), add_like("add2")]));

        let units = Driver::new(&graph).run().unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].identity, "C_poster.g.rs");
        assert!(units[0].text.contains("addAsync"));
        assert!(units[0].text.contains("add2Async"));
        syn::parse_file(&units[0].text).unwrap();
    }

    #[test]
    fn identity_includes_namespace_and_strips_generics() {
        let mut descriptor = marked("Cache", vec![]);
        descriptor.namespace = vec!["store".into()];
        assert_eq!(unit_identity(&descriptor), "store.Cache_poster.g.rs");
    }

    #[test]
    fn existing_wrapper_name_suppresses_generation() {
        // `add` would resolve to `addAsync`, but a method with that exact
        // name and parameter list already exists; first-seen wins.
        let mut graph = SymbolGraph::new();
        graph.insert(marked("C", vec![add_like("add"), add_like("addAsync")]));

        let units = Driver::new(&graph).run().unwrap();
        assert!(!units[0].text.contains("fn addAsync"));
    }

    #[test]
    fn each_marker_contributes_an_independent_fragment() {
        let mut graph = SymbolGraph::new();
        let mut descriptor = marked("C", vec![add_like("add")]);
        descriptor.markers = vec![
            PosterOptions::default(),
            PosterOptions {
                template: Some("{0}Deferred".into()),
                ..PosterOptions::default()
            },
        ];
        graph.insert(descriptor);

        let units = Driver::new(&graph).run().unwrap();
        assert_eq!(units.len(), 1);
        assert!(units[0].text.contains("addAsync"));
        assert!(units[0].text.contains("addDeferred"));
    }

    #[test]
    fn empty_selection_still_emits_a_unit() {
        let mut graph = SymbolGraph::new();
        graph.insert(marked("C", vec![]));

        let units = Driver::new(&graph).run().unwrap();
        assert_eq!(units.len(), 1);
        let file = syn::parse_file(&units[0].text).unwrap();
        match &file.items[0] {
            syn::Item::Impl(item) => assert!(item.items.is_empty()),
            other => panic!("expected an empty impl, got {:?}", other),
        }
    }
}
