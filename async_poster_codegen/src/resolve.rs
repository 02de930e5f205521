//! Computes the synthesized method's name, return type, generic parameter
//! list and constraint clauses for each accepted candidate.

use proc_macro2::Span;
use quote::{quote, ToTokens};
use syn::{Generics, Ident, Type};

use crate::marker::{PosterOptions, DEFAULT_TEMPLATE};
use crate::select::Candidate;

/// A candidate with its wrapper surface fully decided.
#[derive(Debug)]
pub struct ResolvedMethod<'a> {
    pub candidate: Candidate<'a>,
    pub name: Ident,
    /// Full wrapper return type, `runtime::JoinHandle<T>`.
    pub output: Type,
    /// Method generics with the capture bounds pushed onto each type
    /// parameter; carries the recovered where clause, if any.
    pub generics: Generics,
}

impl<'a> ResolvedMethod<'a> {
    /// Identity of the wrapper itself: resolved name + original parameter
    /// types. Compared against the traversal's visited keys so generation
    /// never collides with a method that already exists.
    pub fn identity(&self) -> String {
        let mut key = self.name.to_string();
        for param in &self.candidate.method.params {
            key.push('#');
            key.push_str(&param.ty.to_token_stream().to_string());
        }
        key
    }
}

pub fn resolve<'a>(candidate: Candidate<'a>, marker: &PosterOptions) -> ResolvedMethod<'a> {
    let method = candidate.method;
    let name = Ident::new(&wrapper_name(method, marker), method.ident.span());

    let output = match &method.output {
        Some(ty) => syn::parse2(quote!(::async_poster::runtime::JoinHandle<#ty>)),
        None => syn::parse2(quote!(::async_poster::runtime::JoinHandle<()>)),
    }
    .unwrap();

    let mut generics = method.generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(syn::parse2(quote!(Send)).unwrap());
        param
            .bounds
            .push(syn::TypeParamBound::Lifetime(syn::Lifetime::new(
                "'static",
                Span::call_site(),
            )));
    }

    ResolvedMethod {
        candidate,
        name,
        output,
        generics,
    }
}

/// Per-method template override wins over the marker's template, which wins
/// over the default `{0}Async` pattern.
fn wrapper_name(method: &crate::symbols::MethodSymbol, marker: &PosterOptions) -> String {
    let template = method
        .options
        .as_ref()
        .and_then(|options| options.template.as_deref())
        .or(marker.template.as_deref())
        .unwrap_or(DEFAULT_TEMPLATE);
    template.replace("{0}", &method.ident.to_string())
}
