//! Parsing of `#[xml(...)]` attributes.

use heck::{ToKebabCase, ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Ident, LitStr, Token};

pub(crate) const ATTRIBUTE_NAME: &str = "xml";

/// Case conversion applied by `rename_all`.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RenameRule {
    Pascal,
    Camel,
    Snake,
    Kebab,
    ScreamingSnake,
}

impl RenameRule {
    fn parse(lit: &LitStr) -> syn::Result<Self> {
        match lit.value().as_str() {
            "PascalCase" => Ok(Self::Pascal),
            "camelCase" => Ok(Self::Camel),
            "snake_case" => Ok(Self::Snake),
            "kebab-case" => Ok(Self::Kebab),
            "SCREAMING_SNAKE_CASE" => Ok(Self::ScreamingSnake),
            other => Err(syn::Error::new(
                lit.span(),
                format!("unknown rename rule `{}`", other),
            )),
        }
    }

    pub(crate) fn apply(self, name: &str) -> String {
        match self {
            Self::Pascal => name.to_upper_camel_case(),
            Self::Camel => name.to_lower_camel_case(),
            Self::Snake => name.to_snake_case(),
            Self::Kebab => name.to_kebab_case(),
            Self::ScreamingSnake => name.to_shouty_snake_case(),
        }
    }
}

/// A declared constructor or factory: a path and the captured names bound
/// to its arguments, in order.
pub(crate) struct Callable {
    pub(crate) path: syn::ExprPath,
    pub(crate) args: Vec<String>,
}

impl Callable {
    fn parse(meta: &ParseNestedMeta<'_>) -> syn::Result<Self> {
        let content;
        syn::parenthesized!(content in meta.input);
        let path: syn::ExprPath = content.parse()?;
        let mut args = Vec::new();
        while !content.is_empty() {
            content.parse::<Token![,]>()?;
            if content.is_empty() {
                break;
            }
            if content.peek(LitStr) {
                args.push(content.parse::<LitStr>()?.value());
            } else {
                args.push(content.call(Ident::parse_any)?.unraw().to_string());
            }
        }
        Ok(Self { path, args })
    }
}

/// Attributes on the struct or enum.
#[derive(Default)]
pub(crate) struct ContainerAttrs {
    pub(crate) root: Option<String>,
    pub(crate) namespace: Option<String>,
    pub(crate) prefix: Option<String>,
    pub(crate) rename: Option<String>,
    pub(crate) rename_all: Option<RenameRule>,
    pub(crate) constructors: Vec<Callable>,
    pub(crate) factories: Vec<Callable>,
}

impl ContainerAttrs {
    pub(crate) fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident(ATTRIBUTE_NAME)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("root") {
                    parsed.root = Some(string_value(&meta)?);
                } else if meta.path.is_ident("namespace") {
                    parsed.namespace = Some(string_value(&meta)?);
                } else if meta.path.is_ident("prefix") {
                    parsed.prefix = Some(string_value(&meta)?);
                } else if meta.path.is_ident("rename") {
                    parsed.rename = Some(string_value(&meta)?);
                } else if meta.path.is_ident("rename_all") {
                    let lit: LitStr = meta.value()?.parse()?;
                    parsed.rename_all = Some(RenameRule::parse(&lit)?);
                } else if meta.path.is_ident("constructor") {
                    parsed.constructors.push(Callable::parse(&meta)?);
                } else if meta.path.is_ident("factory") {
                    parsed.factories.push(Callable::parse(&meta)?);
                } else {
                    return Err(meta.error("unknown xml container attribute"));
                }
                Ok(())
            })?;
        }
        Ok(parsed)
    }

    /// Returns true when a root-name hint must be attached.
    pub(crate) fn has_root_hint(&self) -> bool {
        self.root.is_some() || self.namespace.is_some() || self.prefix.is_some()
    }
}

/// Encoding requested for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Encoding {
    #[default]
    Default,
    Attribute,
    Element,
    Text,
    Ignore,
}

/// Attributes on a struct field.
#[derive(Default)]
pub(crate) struct FieldAttrs {
    pub(crate) encoding: Encoding,
    /// Name given to `attribute = ".."` or `element = ".."`.
    pub(crate) hint_name: Option<String>,
    pub(crate) rename: Option<String>,
    pub(crate) namespace: Option<String>,
    pub(crate) prefix: Option<String>,
}

impl FieldAttrs {
    pub(crate) fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident(ATTRIBUTE_NAME)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("attribute") {
                    parsed.set_encoding(&meta, Encoding::Attribute)?;
                    parsed.hint_name = optional_string_value(&meta)?;
                } else if meta.path.is_ident("element") {
                    parsed.set_encoding(&meta, Encoding::Element)?;
                    parsed.hint_name = optional_string_value(&meta)?;
                } else if meta.path.is_ident("text") {
                    parsed.set_encoding(&meta, Encoding::Text)?;
                } else if meta.path.is_ident("ignore") {
                    parsed.set_encoding(&meta, Encoding::Ignore)?;
                } else if meta.path.is_ident("rename") {
                    parsed.rename = Some(string_value(&meta)?);
                } else if meta.path.is_ident("namespace") {
                    parsed.namespace = Some(string_value(&meta)?);
                } else if meta.path.is_ident("prefix") {
                    parsed.prefix = Some(string_value(&meta)?);
                } else {
                    return Err(meta.error("unknown xml field attribute"));
                }
                Ok(())
            })?;
        }
        Ok(parsed)
    }

    fn set_encoding(&mut self, meta: &ParseNestedMeta<'_>, encoding: Encoding) -> syn::Result<()> {
        if self.encoding != Encoding::Default {
            return Err(meta.error(
                "`attribute`, `element`, `text` and `ignore` are mutually exclusive",
            ));
        }
        self.encoding = encoding;
        Ok(())
    }
}

/// Attributes on an enum variant.
#[derive(Default)]
pub(crate) struct VariantAttrs {
    pub(crate) rename: Option<String>,
}

impl VariantAttrs {
    pub(crate) fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident(ATTRIBUTE_NAME)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    parsed.rename = Some(string_value(&meta)?);
                    Ok(())
                } else {
                    Err(meta.error("unknown xml variant attribute"))
                }
            })?;
        }
        Ok(parsed)
    }
}

fn string_value(meta: &ParseNestedMeta<'_>) -> syn::Result<String> {
    let lit: LitStr = meta.value()?.parse()?;
    Ok(lit.value())
}

/// Parses `key = "value"` or a bare `key`.
fn optional_string_value(meta: &ParseNestedMeta<'_>) -> syn::Result<Option<String>> {
    if meta.input.peek(Token![=]) {
        string_value(meta).map(Some)
    } else {
        Ok(None)
    }
}
