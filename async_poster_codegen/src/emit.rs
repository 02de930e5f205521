//! Renders the final declaration tokens for one marker: a companion extension
//! trait for trait declarations, free delegating functions when a `target` is
//! configured, or a reopened inherent `impl` block otherwise.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::LitStr;

use crate::marker::PosterOptions;
use crate::resolve::ResolvedMethod;
use crate::symbols::{TypeDescriptor, TypeKind};

pub fn emit(
    descriptor: &TypeDescriptor,
    walk_target: Option<&TypeDescriptor>,
    marker: &PosterOptions,
    resolved: &[ResolvedMethod<'_>],
) -> TokenStream {
    let body = match (descriptor.kind, walk_target) {
        (TypeKind::Trait, _) => emit_trait(descriptor, marker, resolved),
        (_, Some(target)) if target.is_static => emit_static_extension(target, marker, resolved),
        (_, Some(target)) => emit_instance_extension(target, marker, resolved),
        (_, None) => emit_normal(descriptor, marker, resolved),
    };
    match &marker.precompile {
        Some(feature) if !body.is_empty() => {
            let guard = cfg_guard(feature);
            quote! {
                #guard
                #body
            }
        }
        _ => body,
    }
}

/// Companion trait carrying only signatures. Visibility follows the original
/// trait; an async member is expected from every implementer that opts in.
fn emit_trait(
    descriptor: &TypeDescriptor,
    marker: &PosterOptions,
    resolved: &[ResolvedMethod<'_>],
) -> TokenStream {
    let vis = descriptor.vis.to_token_stream();
    let ext_ident = format_ident!("{}AsyncExt", descriptor.ident);
    let orig = descriptor.path_tokens();
    let generics = &descriptor.generics;
    let (_, ty_generics, where_clause) = descriptor.generics.split_for_impl();

    let methods = resolved.iter().map(|method| {
        let doc = cross_reference(descriptor, method);
        let guard = method_guard(marker, method);
        let name = &method.name;
        let method_generics = &method.generics;
        let method_where = &method.generics.where_clause;
        let output = &method.output;
        let receiver = if method.candidate.method.is_static {
            quote!()
        } else {
            quote!(&self,)
        };
        let params = param_list(method);
        quote! {
            #guard
            #doc
            #[allow(non_snake_case)]
            fn #name #method_generics (#receiver #(#params),*) -> #output #method_where;
        }
    });

    quote! {
        #vis trait #ext_ident #generics : #orig #ty_generics #where_clause {
            #(#methods)*
        }
    }
}

/// Free functions taking the target instance by value as first parameter,
/// delegating on it from inside the deferred closure.
fn emit_instance_extension(
    target: &TypeDescriptor,
    marker: &PosterOptions,
    resolved: &[ResolvedMethod<'_>],
) -> TokenStream {
    let target_path = target.path_tokens();
    let (_, target_ty_generics, _) = target.generics.split_for_impl();

    let fns = resolved.iter().map(|method| {
        let doc = cross_reference(target, method);
        let guard = method_guard(marker, method);
        let name = &method.name;
        let generics = merged_generics(target, method);
        let method_where = &generics.where_clause;
        let output = &method.output;
        let params = param_list(method);
        let orig = &method.candidate.method.ident;
        let turbofish = call_turbofish(method);
        let args = arg_list(method);
        quote! {
            #guard
            #doc
            #[allow(non_snake_case)]
            pub fn #name #generics (instance: #target_path #target_ty_generics, #(#params),*) -> #output #method_where {
                ::async_poster::runtime::spawn_blocking(move || instance.#orig #turbofish (#(#args),*))
            }
        }
    });

    quote!(#(#fns)*)
}

/// Free functions over a static target; no instance parameter, delegation is
/// fully qualified.
fn emit_static_extension(
    target: &TypeDescriptor,
    marker: &PosterOptions,
    resolved: &[ResolvedMethod<'_>],
) -> TokenStream {
    let target_path = target.path_tokens();

    let fns = resolved.iter().map(|method| {
        let doc = cross_reference(target, method);
        let guard = method_guard(marker, method);
        let name = &method.name;
        let generics = &method.generics;
        let method_where = &generics.where_clause;
        let output = &method.output;
        let params = param_list(method);
        let orig = &method.candidate.method.ident;
        let turbofish = call_turbofish(method);
        let args = arg_list(method);
        quote! {
            #guard
            #doc
            #[allow(non_snake_case)]
            pub fn #name #generics (#(#params),*) -> #output #method_where {
                ::async_poster::runtime::spawn_blocking(move || #target_path::#orig #turbofish (#(#args),*))
            }
        }
    });

    quote!(#(#fns)*)
}

/// Reopens the annotated type with an inherent `impl` block. Instance
/// wrappers clone `self` into the closure, so the type must be
/// `Clone + Send + 'static`; static originals delegate through their
/// declaring type's path.
fn emit_normal(
    descriptor: &TypeDescriptor,
    marker: &PosterOptions,
    resolved: &[ResolvedMethod<'_>],
) -> TokenStream {
    let self_path = descriptor.path_tokens();
    let (impl_generics, ty_generics, where_clause) = descriptor.generics.split_for_impl();

    let methods = resolved.iter().map(|method| {
        let doc = cross_reference(method.candidate.declaring, method);
        let guard = method_guard(marker, method);
        let vis = method.candidate.method.vis.to_token_stream();
        let name = &method.name;
        let generics = &method.generics;
        let method_where = &generics.where_clause;
        let output = &method.output;
        let params = param_list(method);
        let orig = &method.candidate.method.ident;
        let turbofish = call_turbofish(method);
        let args = arg_list(method);

        if method.candidate.method.is_static {
            let callee = if method.candidate.declaring.qualified_name()
                == descriptor.qualified_name()
            {
                quote!(Self)
            } else {
                method.candidate.declaring.path_tokens()
            };
            quote! {
                #guard
                #doc
                #[allow(non_snake_case)]
                #vis fn #name #generics (#(#params),*) -> #output #method_where {
                    ::async_poster::runtime::spawn_blocking(move || #callee::#orig #turbofish (#(#args),*))
                }
            }
        } else {
            quote! {
                #guard
                #doc
                #[allow(non_snake_case)]
                #vis fn #name #generics (&self, #(#params),*) -> #output #method_where {
                    let this = self.clone();
                    ::async_poster::runtime::spawn_blocking(move || this.#orig #turbofish (#(#args),*))
                }
            }
        }
    });

    quote! {
        impl #impl_generics #self_path #ty_generics #where_clause {
            #(#methods)*
        }
    }
}

fn param_list(method: &ResolvedMethod<'_>) -> Vec<TokenStream> {
    method
        .candidate
        .method
        .params
        .iter()
        .map(|param| {
            let ident = &param.ident;
            let ty = &param.ty;
            quote!(#ident: #ty)
        })
        .collect()
}

fn arg_list(method: &ResolvedMethod<'_>) -> Vec<TokenStream> {
    method
        .candidate
        .method
        .params
        .iter()
        .map(|param| {
            let ident = &param.ident;
            quote!(#ident)
        })
        .collect()
}

/// Explicit type arguments for the delegation call when the original method
/// is generic; inference cannot always recover them from the argument list.
fn call_turbofish(method: &ResolvedMethod<'_>) -> TokenStream {
    let idents: Vec<_> = method
        .candidate
        .method
        .generics
        .type_params()
        .map(|param| &param.ident)
        .collect();
    if idents.is_empty() {
        TokenStream::new()
    } else {
        quote!(::<#(#idents),*>)
    }
}

/// Free-function generics for extension shapes over a generic target: the
/// target's parameters come first, then the method's own.
fn merged_generics(target: &TypeDescriptor, method: &ResolvedMethod<'_>) -> syn::Generics {
    if target.generics.params.is_empty() {
        return method.generics.clone();
    }
    let mut generics = target.generics.clone();
    for param in method.generics.params.iter() {
        generics.params.push(param.clone());
    }
    generics.where_clause = match (
        generics.where_clause.take(),
        method.generics.where_clause.clone(),
    ) {
        (Some(mut ours), Some(theirs)) => {
            ours.predicates.extend(theirs.predicates);
            Some(ours)
        }
        (Some(clause), None) | (None, Some(clause)) => Some(clause),
        (None, None) => None,
    };
    generics
}

fn cross_reference(declaring: &TypeDescriptor, method: &ResolvedMethod<'_>) -> TokenStream {
    let text = format!(
        " Asynchronous counterpart of `{}::{}`.",
        declaring.qualified_name(),
        method.candidate.method.ident
    );
    quote!(#[doc = #text])
}

/// A method-level precompile guard applies only when the whole unit is not
/// already guarded by a type-level precompile.
fn method_guard(marker: &PosterOptions, method: &ResolvedMethod<'_>) -> TokenStream {
    if marker.precompile.is_some() {
        return TokenStream::new();
    }
    match method
        .candidate
        .method
        .options
        .as_ref()
        .and_then(|options| options.precompile.as_deref())
    {
        Some(feature) => cfg_guard(feature),
        None => TokenStream::new(),
    }
}

fn cfg_guard(feature: &str) -> TokenStream {
    let lit = LitStr::new(feature, proc_macro2::Span::call_site());
    quote!(#[cfg(feature = #lit)])
}
