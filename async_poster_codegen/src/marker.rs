//! The closed set of options recognized on the `poster` and `async_method`
//! markers. Options are parsed once per attribute and passed explicitly
//! through the selection/emission pipeline.

use std::ops::BitOr;

use syn::{Attribute, Lit, Meta, NestedMeta, Path};

pub const DEFAULT_TEMPLATE: &str = "{0}Async";

/// Accessibility levels eligible for wrapper generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberFlags(u8);

impl MemberFlags {
    pub const PUBLIC: MemberFlags = MemberFlags(1);
    pub const PROTECTED: MemberFlags = MemberFlags(2);
    pub const PRIVATE: MemberFlags = MemberFlags(4);
    pub const INTERNAL: MemberFlags = MemberFlags(8);
    pub const ALL: MemberFlags = MemberFlags(1 | 2 | 4 | 8);

    pub fn empty() -> MemberFlags {
        MemberFlags(0)
    }

    pub fn contains(self, other: MemberFlags) -> bool {
        self.0 & other.0 == other.0
    }

    fn from_ident(path: &Path) -> Option<MemberFlags> {
        if path.is_ident("public") {
            Some(MemberFlags::PUBLIC)
        } else if path.is_ident("protected") {
            Some(MemberFlags::PROTECTED)
        } else if path.is_ident("private") {
            Some(MemberFlags::PRIVATE)
        } else if path.is_ident("internal") {
            Some(MemberFlags::INTERNAL)
        } else {
            None
        }
    }
}

impl BitOr for MemberFlags {
    type Output = MemberFlags;

    fn bitor(self, rhs: MemberFlags) -> MemberFlags {
        MemberFlags(self.0 | rhs.0)
    }
}

impl Default for MemberFlags {
    fn default() -> Self {
        MemberFlags::ALL
    }
}

/// Type-level poster marker options. A type may carry several markers, each
/// driving an independent fragment of the output unit.
#[derive(Debug, Clone, Default)]
pub struct PosterOptions {
    /// When set, generation walks this type's public members instead of the
    /// annotated type's own members.
    pub target: Option<Path>,
    pub flags: MemberFlags,
    /// Method names excluded unconditionally.
    pub ignore_methods: Vec<String>,
    /// Number of base-type hops to traverse; 0 keeps declared members only.
    pub deep: u32,
    /// Feature name guarding the emitted unit with `#[cfg(feature = ...)]`.
    pub precompile: Option<String>,
    /// Wrapper name pattern; `{0}` is replaced by the original method name.
    pub template: Option<String>,
}

impl PosterOptions {
    /// Parses the nested arguments of one `#[poster(...)]` attribute.
    pub fn from_nested(nested: &[NestedMeta]) -> syn::Result<PosterOptions> {
        let mut options = PosterOptions::default();
        for meta in nested {
            match meta {
                NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("target") => {
                    options.target = Some(lit_path(&nv.lit)?);
                }
                NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("deep") => {
                    options.deep = lit_int(&nv.lit)?;
                }
                NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("precompile") => {
                    options.precompile = Some(lit_str(&nv.lit)?);
                }
                NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("template") => {
                    options.template = Some(lit_str(&nv.lit)?);
                }
                NestedMeta::Meta(Meta::List(list)) if list.path.is_ident("flags") => {
                    let mut flags = MemberFlags::empty();
                    for entry in &list.nested {
                        match entry {
                            NestedMeta::Meta(Meta::Path(path)) => {
                                flags = flags
                                    | MemberFlags::from_ident(path).ok_or_else(|| {
                                        syn::Error::new_spanned(
                                            path,
                                            "expected one of `public`, `protected`, `private`, `internal`",
                                        )
                                    })?;
                            }
                            other => {
                                return Err(syn::Error::new_spanned(
                                    other,
                                    "expected an accessibility name",
                                ))
                            }
                        }
                    }
                    options.flags = flags;
                }
                NestedMeta::Meta(Meta::List(list)) if list.path.is_ident("ignore_methods") => {
                    for entry in &list.nested {
                        match entry {
                            NestedMeta::Lit(lit) => options.ignore_methods.push(lit_str(lit)?),
                            other => {
                                return Err(syn::Error::new_spanned(
                                    other,
                                    "expected a string literal method name",
                                ))
                            }
                        }
                    }
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "unrecognized poster option; expected `target`, `flags`, \
                         `ignore_methods`, `deep`, `precompile` or `template`",
                    ))
                }
            }
        }
        Ok(options)
    }

    /// Parses a `#[poster]` or `#[poster(...)]` attribute already attached to
    /// an item. Returns `None` for unrelated attributes.
    pub fn from_attribute(attr: &Attribute) -> syn::Result<Option<PosterOptions>> {
        if !attr.path.is_ident("poster") {
            return Ok(None);
        }
        match attr.parse_meta()? {
            Meta::Path(_) => Ok(Some(PosterOptions::default())),
            Meta::List(list) => {
                let nested: Vec<NestedMeta> = list.nested.into_iter().collect();
                PosterOptions::from_nested(&nested).map(Some)
            }
            Meta::NameValue(nv) => Err(syn::Error::new_spanned(
                nv,
                "poster options must be written as `#[poster(...)]`",
            )),
        }
    }
}

/// Method-level marker options, overriding the containing marker per method.
#[derive(Debug, Clone, Default)]
pub struct AsyncMethodOptions {
    pub precompile: Option<String>,
    pub template: Option<String>,
}

impl AsyncMethodOptions {
    pub fn from_nested(nested: &[NestedMeta]) -> syn::Result<AsyncMethodOptions> {
        let mut options = AsyncMethodOptions::default();
        for meta in nested {
            match meta {
                NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("precompile") => {
                    options.precompile = Some(lit_str(&nv.lit)?);
                }
                NestedMeta::Meta(Meta::NameValue(nv)) if nv.path.is_ident("template") => {
                    options.template = Some(lit_str(&nv.lit)?);
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "unrecognized async_method option; expected `precompile` or `template`",
                    ))
                }
            }
        }
        Ok(options)
    }

    pub fn from_attribute(attr: &Attribute) -> syn::Result<Option<AsyncMethodOptions>> {
        if !attr.path.is_ident("async_method") {
            return Ok(None);
        }
        match attr.parse_meta()? {
            Meta::Path(_) => Ok(Some(AsyncMethodOptions::default())),
            Meta::List(list) => {
                let nested: Vec<NestedMeta> = list.nested.into_iter().collect();
                AsyncMethodOptions::from_nested(&nested).map(Some)
            }
            Meta::NameValue(nv) => Err(syn::Error::new_spanned(
                nv,
                "async_method options must be written as `#[async_method(...)]`",
            )),
        }
    }
}

pub fn is_ignore_attribute(attr: &Attribute) -> bool {
    attr.path.is_ident("async_method_ignore")
}

fn lit_str(lit: &Lit) -> syn::Result<String> {
    match lit {
        Lit::Str(s) => Ok(s.value()),
        other => Err(syn::Error::new_spanned(other, "expected a string literal")),
    }
}

fn lit_int(lit: &Lit) -> syn::Result<u32> {
    match lit {
        Lit::Int(value) => value.base10_parse(),
        other => Err(syn::Error::new_spanned(other, "expected an integer literal")),
    }
}

fn lit_path(lit: &Lit) -> syn::Result<Path> {
    match lit {
        Lit::Str(s) => s.parse(),
        other => Err(syn::Error::new_spanned(
            other,
            "expected a string literal type path",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use syn::parse_quote;

    fn poster_options(attr: Attribute) -> PosterOptions {
        PosterOptions::from_attribute(&attr).unwrap().unwrap()
    }

    #[test]
    fn bare_marker_defaults_to_all_flags() {
        let options = poster_options(parse_quote!(#[poster]));
        assert!(options.flags.contains(MemberFlags::ALL));
        assert_eq!(options.deep, 0);
        assert_eq!(options.template, None);
        assert!(options.target.is_none());
    }

    #[test]
    fn parses_every_recognized_option() {
        let options = poster_options(parse_quote!(#[poster(
            target = "io::SyncIo",
            flags(public, internal),
            ignore_methods("close", "flush"),
            deep = 2,
            precompile = "blocking",
            template = "{0}Deferred"
        )]));
        assert!(options.target.is_some());
        assert!(options.flags.contains(MemberFlags::PUBLIC));
        assert!(options.flags.contains(MemberFlags::INTERNAL));
        assert!(!options.flags.contains(MemberFlags::PRIVATE));
        assert_eq!(options.ignore_methods, vec!["close", "flush"]);
        assert_eq!(options.deep, 2);
        assert_eq!(options.precompile.as_deref(), Some("blocking"));
        assert_eq!(options.template.as_deref(), Some("{0}Deferred"));
    }

    #[test]
    fn rejects_unknown_options() {
        let attr: Attribute = parse_quote!(#[poster(depth = 3)]);
        assert!(PosterOptions::from_attribute(&attr).is_err());
    }

    #[test]
    fn unrelated_attributes_are_skipped() {
        let attr: Attribute = parse_quote!(#[derive(Clone)]);
        assert!(PosterOptions::from_attribute(&attr).unwrap().is_none());
    }

    #[test]
    fn method_options_reject_type_level_keys() {
        let attr: Attribute = parse_quote!(#[async_method(deep = 1)]);
        assert!(AsyncMethodOptions::from_attribute(&attr).is_err());
    }
}
