//! Core pipeline behind the `poster` attribute: given a symbol graph of type
//! declarations, selects the synchronous methods eligible for wrapping,
//! resolves each wrapper's name and shape, and emits the companion
//! declarations as new source text.
//!
//! The graph can be built programmatically, from parsed files via
//! [`SourceIndex`] (build scripts), or from a single annotated item (the
//! attribute macro path). Generation itself is a single-threaded, pure
//! transform; the concurrency lives in the code it emits.

mod driver;
mod emit;
mod error;
mod marker;
mod resolve;
mod select;
mod source;
mod symbols;

pub use driver::{generate_fragment, Driver, OutputUnit};
pub use emit::emit;
pub use error::Error;
pub use marker::{AsyncMethodOptions, MemberFlags, PosterOptions, DEFAULT_TEMPLATE};
pub use resolve::{resolve, ResolvedMethod};
pub use select::{select, Candidate, Selection};
pub use source::{
    index_impl, index_trait, strip_marker_attrs_impl, strip_marker_attrs_trait, SourceIndex,
};
pub use symbols::{
    MethodSymbol, Param, SymbolGraph, TypeDescriptor, TypeId, TypeKind, Vis,
};
