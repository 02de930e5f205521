//! Builds a [`SymbolGraph`] from parsed source files: traits and inherent
//! `impl` blocks become type descriptors, modules of free functions become
//! static member containers, and `impl Deref<Target = Base>` declares the
//! extends edge the deep walk follows.

use syn::{
    Attribute, FnArg, Ident, ImplItem, Item, ItemImpl, ItemTrait, Pat, ReturnType, Signature,
    TraitItem, Type,
};

use crate::error::Error;
use crate::marker::{is_ignore_attribute, AsyncMethodOptions, PosterOptions};
use crate::symbols::{MethodSymbol, Param, SymbolGraph, TypeDescriptor, TypeId, TypeKind, Vis};

pub struct SourceIndex {
    graph: SymbolGraph,
    krate: String,
    pending_bases: Vec<(String, String)>,
}

impl SourceIndex {
    pub fn new(krate: impl Into<String>) -> Self {
        Self {
            graph: SymbolGraph::new(),
            krate: krate.into(),
            pending_bases: Vec::new(),
        }
    }

    pub fn add_source(&mut self, source: &str) -> Result<(), Error> {
        let file = syn::parse_file(source)?;
        self.add_file(&file)
    }

    pub fn add_file(&mut self, file: &syn::File) -> Result<(), Error> {
        self.add_items(&file.items)
    }

    pub fn add_items(&mut self, items: &[Item]) -> Result<(), Error> {
        self.scan(items, &[])
    }

    /// Finishes indexing: wires the recorded extends edges and classifies
    /// member containers without instance methods as static.
    pub fn into_graph(mut self) -> SymbolGraph {
        for (ty, base) in std::mem::take(&mut self.pending_bases) {
            let base_id = self.graph.lookup(&base).or_else(|| {
                let terminal = base.rsplit("::").next().unwrap_or(&base);
                self.graph.lookup_ident(terminal)
            });
            if let (Some(ty), Some(base)) = (self.graph.lookup(&ty), base_id) {
                self.graph.set_base(ty, base);
            }
        }
        for id in 0..self.graph.len() {
            let descriptor = self.graph.get(id);
            if descriptor.kind == TypeKind::Type
                && !descriptor.methods.is_empty()
                && descriptor.methods.iter().all(|method| method.is_static)
            {
                self.graph.get_mut(id).is_static = true;
            }
        }
        self.graph
    }

    fn scan(&mut self, items: &[Item], namespace: &[String]) -> Result<(), Error> {
        for item in items {
            match item {
                Item::Mod(module) => {
                    if let Some((_, content)) = &module.content {
                        self.index_module(module, content, namespace)?;
                        let mut nested = namespace.to_vec();
                        nested.push(module.ident.to_string());
                        self.scan(content, &nested)?;
                    }
                }
                Item::Struct(item) => {
                    let id = self.ensure_type(&item.ident, namespace);
                    let descriptor = self.graph.get_mut(id);
                    descriptor.vis = Vis::from_syn(&item.vis);
                    descriptor.generics = item.generics.clone();
                    push_markers(self.graph.get_mut(id), &item.attrs)?;
                }
                Item::Enum(item) => {
                    let id = self.ensure_type(&item.ident, namespace);
                    let descriptor = self.graph.get_mut(id);
                    descriptor.vis = Vis::from_syn(&item.vis);
                    descriptor.generics = item.generics.clone();
                    push_markers(self.graph.get_mut(id), &item.attrs)?;
                }
                Item::Trait(item) => {
                    self.index_trait(item, namespace)?;
                }
                Item::Impl(item) => match &item.trait_ {
                    None => {
                        self.index_inherent_impl(item, namespace)?;
                    }
                    Some((_, path, _)) if path_ends_with(path, "Deref") => {
                        self.record_deref_base(item, namespace);
                    }
                    Some(_) => {}
                },
                _ => {}
            }
        }
        Ok(())
    }

    /// A module holding free functions acts as a static member container,
    /// addressable as a marker target.
    fn index_module(
        &mut self,
        module: &syn::ItemMod,
        content: &[Item],
        namespace: &[String],
    ) -> Result<(), Error> {
        let mut methods = Vec::new();
        for item in content {
            if let Item::Fn(function) = item {
                let mut method =
                    method_symbol(&function.sig, Vis::from_syn(&function.vis), &function.attrs)?;
                method.is_static = true;
                methods.push(method);
            }
        }
        let markers = collect_markers(&module.attrs)?;
        if methods.is_empty() && markers.is_empty() {
            return Ok(());
        }
        let mut descriptor = TypeDescriptor::new(module.ident.clone(), TypeKind::Module);
        descriptor.namespace = namespace.to_vec();
        descriptor.krate = self.krate.clone();
        descriptor.vis = Vis::from_syn(&module.vis);
        descriptor.is_static = true;
        descriptor.markers = markers;
        descriptor.methods = methods;
        self.graph.insert(descriptor);
        Ok(())
    }

    fn index_trait(&mut self, item: &ItemTrait, namespace: &[String]) -> Result<TypeId, Error> {
        let id = self.ensure_type(&item.ident, namespace);
        {
            let descriptor = self.graph.get_mut(id);
            descriptor.kind = TypeKind::Trait;
            descriptor.vis = Vis::from_syn(&item.vis);
            descriptor.generics = item.generics.clone();
        }
        push_markers(self.graph.get_mut(id), &item.attrs)?;
        for entry in &item.items {
            if let TraitItem::Method(method) = entry {
                let symbol = method_symbol(&method.sig, Vis::Public, &method.attrs)?;
                self.graph.get_mut(id).methods.push(symbol);
            }
        }
        Ok(id)
    }

    fn index_inherent_impl(
        &mut self,
        item: &ItemImpl,
        namespace: &[String],
    ) -> Result<TypeId, Error> {
        let ident = match self_type_ident(&item.self_ty) {
            Some(ident) => ident,
            None => return Err(Error::Parse(syn::Error::new_spanned(
                &item.self_ty,
                "poster requires a nominal self type",
            ))),
        };
        let id = self.ensure_type(&ident, namespace);
        if self.graph.get(id).generics.params.is_empty() {
            self.graph.get_mut(id).generics = item.generics.clone();
        }
        push_markers(self.graph.get_mut(id), &item.attrs)?;
        for entry in &item.items {
            if let ImplItem::Method(method) = entry {
                let symbol = method_symbol(&method.sig, Vis::from_syn(&method.vis), &method.attrs)?;
                self.graph.get_mut(id).methods.push(symbol);
            }
        }
        Ok(id)
    }

    fn record_deref_base(&mut self, item: &ItemImpl, namespace: &[String]) {
        let ty = match self_type_ident(&item.self_ty) {
            Some(ident) => qualified_in(namespace, &ident.to_string()),
            None => return,
        };
        for entry in &item.items {
            if let ImplItem::Type(target) = entry {
                if target.ident == "Target" {
                    if let Type::Path(path) = &target.ty {
                        let base = path
                            .path
                            .segments
                            .iter()
                            .map(|segment| segment.ident.to_string())
                            .collect::<Vec<_>>()
                            .join("::");
                        self.pending_bases.push((ty, base));
                    }
                    return;
                }
            }
        }
    }

    fn ensure_type(&mut self, ident: &Ident, namespace: &[String]) -> TypeId {
        if let Some(id) = self.graph.lookup(&qualified_in(namespace, &ident.to_string())) {
            return id;
        }
        let mut descriptor = TypeDescriptor::new(ident.clone(), TypeKind::Type);
        descriptor.namespace = namespace.to_vec();
        descriptor.krate = self.krate.clone();
        self.graph.insert(descriptor)
    }
}

/// Builds a single-type graph from one annotated `impl` block, the form the
/// attribute macro sees. Returns the graph and the descriptor id.
pub fn index_impl(item: &ItemImpl, krate: &str) -> Result<(SymbolGraph, TypeId), Error> {
    let mut index = SourceIndex::new(krate);
    let id = index.index_inherent_impl(item, &[])?;
    Ok((index.into_graph(), id))
}

/// Single-trait counterpart of [`index_impl`].
pub fn index_trait(item: &ItemTrait, krate: &str) -> Result<(SymbolGraph, TypeId), Error> {
    let mut index = SourceIndex::new(krate);
    let id = index.index_trait(item, &[])?;
    Ok((index.into_graph(), id))
}

/// Removes poster marker attributes from an impl block before it is emitted
/// back into the compilation; method-level markers are not real attributes
/// once the poster expansion has consumed them.
pub fn strip_marker_attrs_impl(item: &mut ItemImpl) {
    item.attrs.retain(|attr| !is_marker_attr(attr));
    for entry in &mut item.items {
        if let ImplItem::Method(method) = entry {
            method.attrs.retain(|attr| !is_marker_attr(attr));
        }
    }
}

pub fn strip_marker_attrs_trait(item: &mut ItemTrait) {
    item.attrs.retain(|attr| !is_marker_attr(attr));
    for entry in &mut item.items {
        if let TraitItem::Method(method) = entry {
            method.attrs.retain(|attr| !is_marker_attr(attr));
        }
    }
}

fn qualified_in(namespace: &[String], ident: &str) -> String {
    let mut name = namespace.join("::");
    if !name.is_empty() {
        name.push_str("::");
    }
    name.push_str(ident);
    name
}

fn is_marker_attr(attr: &Attribute) -> bool {
    attr.path.is_ident("poster")
        || attr.path.is_ident("async_method")
        || attr.path.is_ident("async_method_ignore")
}

fn method_symbol(sig: &Signature, vis: Vis, attrs: &[Attribute]) -> Result<MethodSymbol, Error> {
    let mut options = None;
    let mut ignored = false;
    for attr in attrs {
        if let Some(parsed) = AsyncMethodOptions::from_attribute(attr)? {
            options = Some(parsed);
        } else if is_ignore_attribute(attr) {
            ignored = true;
        }
    }

    let mut is_static = true;
    let mut params = Vec::new();
    for (position, input) in sig.inputs.iter().enumerate() {
        match input {
            FnArg::Receiver(_) => is_static = false,
            FnArg::Typed(typed) => {
                let ident = match &*typed.pat {
                    Pat::Ident(pat) => pat.ident.clone(),
                    _ => Ident::new(&format!("arg{}", position), proc_macro2::Span::call_site()),
                };
                params.push(Param {
                    ident,
                    ty: (*typed.ty).clone(),
                });
            }
        }
    }

    let output = match &sig.output {
        ReturnType::Default => None,
        ReturnType::Type(_, ty) => Some((**ty).clone()),
    };

    Ok(MethodSymbol {
        ident: sig.ident.clone(),
        vis,
        is_async: sig.asyncness.is_some(),
        is_static,
        params,
        output,
        generics: sig.generics.clone(),
        options,
        ignored,
    })
}

fn collect_markers(attrs: &[Attribute]) -> Result<Vec<PosterOptions>, Error> {
    let mut markers = Vec::new();
    for attr in attrs {
        if let Some(options) = PosterOptions::from_attribute(attr)? {
            markers.push(options);
        }
    }
    Ok(markers)
}

fn push_markers(descriptor: &mut TypeDescriptor, attrs: &[Attribute]) -> Result<(), Error> {
    for attr in attrs {
        if let Some(options) = PosterOptions::from_attribute(attr)? {
            descriptor.markers.push(options);
        }
    }
    Ok(())
}

fn self_type_ident(ty: &Type) -> Option<Ident> {
    match ty {
        Type::Path(path) => path.path.segments.last().map(|segment| segment.ident.clone()),
        Type::Group(group) => self_type_ident(&group.elem),
        Type::Paren(paren) => self_type_ident(&paren.elem),
        _ => None,
    }
}

fn path_ends_with(path: &syn::Path, ident: &str) -> bool {
    path.segments
        .last()
        .map(|segment| segment.ident == ident)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn graph_of(source: &str) -> SymbolGraph {
        let mut index = SourceIndex::new("demo");
        index.add_source(source).unwrap();
        index.into_graph()
    }

    #[test]
    fn indexes_marked_impl_blocks() {
        let graph = graph_of(
            r#"
            pub struct TestClass1;

            #[poster]
            impl TestClass1 {
                pub fn add1(&self) -> i32 { 0 }
                pub fn add2(&self) {}
            }
            "#,
        );
        let id = graph.lookup("TestClass1").unwrap();
        let descriptor = graph.get(id);
        assert_eq!(descriptor.markers.len(), 1);
        assert_eq!(descriptor.methods.len(), 2);
        assert!(!descriptor.is_static);
        assert_eq!(descriptor.vis, Vis::Public);
    }

    #[test]
    fn method_markers_are_recorded() {
        let graph = graph_of(
            r#"
            struct Io;

            #[poster]
            impl Io {
                #[async_method(template = "My{0}Async")]
                pub fn add3(&self) {}

                #[async_method_ignore]
                pub fn close(&self) {}
            }
            "#,
        );
        let descriptor = graph.get(graph.lookup("Io").unwrap());
        let add3 = &descriptor.methods[0];
        assert_eq!(
            add3.options.as_ref().unwrap().template.as_deref(),
            Some("My{0}Async")
        );
        assert!(descriptor.methods[1].ignored);
    }

    #[test]
    fn deref_impl_declares_the_extends_edge() {
        let graph = graph_of(
            r#"
            pub struct Base;
            impl Base {
                pub fn inherited(&self) {}
            }

            pub struct Child;
            #[poster(deep = 1)]
            impl Child {}

            impl std::ops::Deref for Child {
                type Target = Base;
                fn deref(&self) -> &Base { unimplemented!() }
            }
            "#,
        );
        let child = graph.get(graph.lookup("Child").unwrap());
        let base = child.base.expect("base edge recorded");
        assert_eq!(graph.get(base).ident.to_string(), "Base");
    }

    #[test]
    fn associated_only_types_are_static_containers() {
        let graph = graph_of(
            r#"
            struct Util;
            #[poster]
            impl Util {
                pub fn calc(n: u64) -> u64 { n }
            }
            "#,
        );
        assert!(graph.get(graph.lookup("Util").unwrap()).is_static);
    }

    #[test]
    fn modules_of_free_functions_are_indexed() {
        let graph = graph_of(
            r#"
            pub mod sys {
                pub fn stat(path: String) -> u64 { 0 }
            }
            "#,
        );
        let module = graph.get(graph.lookup("sys").unwrap());
        assert_eq!(module.kind, TypeKind::Module);
        assert!(module.is_static);
        assert_eq!(module.methods.len(), 1);
        assert!(module.methods[0].is_static);
    }

    #[test]
    fn namespaces_follow_module_nesting() {
        let graph = graph_of(
            r#"
            mod outer {
                mod inner {
                    pub struct Deep;
                    #[poster]
                    impl Deep {
                        pub fn run(&self) {}
                    }
                }
            }
            "#,
        );
        let descriptor = graph.get(graph.lookup("outer::inner::Deep").unwrap());
        assert_eq!(descriptor.qualified_name(), "outer::inner::Deep");
    }

    #[test]
    fn same_ident_in_different_modules_does_not_merge() {
        let graph = graph_of(
            r#"
            mod alpha {
                pub struct C;
                #[poster]
                impl C {
                    pub fn first(&self) -> u8 { 1 }
                }
            }
            mod beta {
                pub struct C;
                #[poster]
                impl C {
                    pub fn second(&self) -> u8 { 2 }
                }
            }
            "#,
        );
        let alpha = graph.get(graph.lookup("alpha::C").unwrap());
        let beta = graph.get(graph.lookup("beta::C").unwrap());
        assert_eq!(alpha.methods.len(), 1);
        assert_eq!(alpha.methods[0].ident.to_string(), "first");
        assert_eq!(beta.methods.len(), 1);
        assert_eq!(beta.methods[0].ident.to_string(), "second");
    }

    #[test]
    fn strip_removes_marker_attributes_only() {
        let mut item: ItemImpl = syn::parse_str(
            r#"
            impl Io {
                #[async_method(template = "My{0}Async")]
                #[inline]
                pub fn add(&self) {}
            }
            "#,
        )
        .unwrap();
        strip_marker_attrs_impl(&mut item);
        let method = match &item.items[0] {
            ImplItem::Method(method) => method,
            other => panic!("expected a method, got {:?}", other),
        };
        assert_eq!(method.attrs.len(), 1);
        assert!(method.attrs[0].path.is_ident("inline"));
    }
}
