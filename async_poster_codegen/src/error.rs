use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The marker names a target type the symbol graph has never seen.
    #[error("poster target `{0}` is not present in the symbol graph")]
    UnknownTarget(String),

    /// Malformed marker options or unparseable input source.
    #[error("invalid poster input: {0}")]
    Parse(#[from] syn::Error),

    /// An emitted unit failed to reparse as Rust. This is a generation defect
    /// and must abort consumption of the unit.
    #[error("generated unit `{identity}` is not valid Rust: {source}")]
    Render {
        identity: String,
        #[source]
        source: syn::Error,
    },
}
