use proc_macro::TokenStream;
use proc_macro_error::{abort, proc_macro_error};
use quote::quote;
use syn::spanned::Spanned;
use syn::{parse_macro_input, AttributeArgs, ItemImpl, ItemTrait};

use async_poster_codegen as codegen;

/// Opts a trait declaration or inherent impl block into async-wrapper
/// generation. For every eligible synchronous method, a companion wrapper is
/// appended that dispatches the original call through
/// `async_poster::runtime::spawn_blocking` and returns the pending handle.
///
/// Options: `target`, `flags(..)`, `ignore_methods(..)`, `deep`,
/// `precompile`, `template`. See the facade crate docs for their meaning.
#[proc_macro_error]
#[proc_macro_attribute]
pub fn poster(attr: TokenStream, tokens: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as AttributeArgs);
    let options = match codegen::PosterOptions::from_nested(&args) {
        Ok(options) => options,
        Err(error) => abort!(error.span(), "{}", error),
    };
    match syn::parse::<ItemTrait>(tokens.clone()) {
        Ok(item) => expand_trait(item, options),
        Err(_) => match syn::parse::<ItemImpl>(tokens) {
            Ok(item) => expand_impl(item, options),
            Err(error) => abort!(
                error.span(),
                "poster supports trait declarations and inherent impl blocks"
            ),
        },
    }
}

/// Per-method overrides inside a poster item: `template` and `precompile`.
/// Consumed by the enclosing `#[poster]` expansion; standalone use leaves the
/// function untouched.
#[proc_macro_error]
#[proc_macro_attribute]
pub fn async_method(attr: TokenStream, tokens: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as AttributeArgs);
    if let Err(error) = codegen::AsyncMethodOptions::from_nested(&args) {
        abort!(error.span(), "{}", error);
    }
    tokens
}

/// Excludes one method from wrapper generation.
#[proc_macro_attribute]
pub fn async_method_ignore(_: TokenStream, tokens: TokenStream) -> TokenStream {
    tokens
}

fn expand_impl(mut item: ItemImpl, options: codegen::PosterOptions) -> TokenStream {
    let (graph, id) = match codegen::index_impl(&item, "") {
        Ok(indexed) => indexed,
        Err(error) => abort!(item.span(), "{}", error),
    };
    // The attribute may be repeated; the invoking marker expands them all.
    // Remaining `#[poster]` attributes on the item were indexed alongside it.
    let mut markers = vec![options];
    markers.extend(graph.get(id).markers.iter().cloned());
    let mut generated = quote!();
    for marker in &markers {
        match codegen::generate_fragment(&graph, id, marker) {
            Ok(tokens) => generated.extend(tokens),
            Err(codegen::Error::UnknownTarget(target)) => abort!(
                item.span(),
                "target `{}` is not visible to the attribute macro; \
                 index the defining source with async_poster_codegen::SourceIndex instead",
                target
            ),
            Err(error) => abort!(item.span(), "{}", error),
        }
    }
    codegen::strip_marker_attrs_impl(&mut item);
    quote!(#item #generated).into()
}

fn expand_trait(mut item: ItemTrait, options: codegen::PosterOptions) -> TokenStream {
    let (graph, id) = match codegen::index_trait(&item, "") {
        Ok(indexed) => indexed,
        Err(error) => abort!(item.span(), "{}", error),
    };
    let mut markers = vec![options];
    markers.extend(graph.get(id).markers.iter().cloned());
    let mut generated = quote!();
    for marker in &markers {
        match codegen::generate_fragment(&graph, id, marker) {
            Ok(tokens) => generated.extend(tokens),
            Err(error) => abort!(item.span(), "{}", error),
        }
    }
    codegen::strip_marker_attrs_trait(&mut item);
    quote!(#item #generated).into()
}
