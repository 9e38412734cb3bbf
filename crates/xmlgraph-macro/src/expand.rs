use crate::attrs::{Callable, ContainerAttrs, Encoding, FieldAttrs, VariantAttrs};
use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::ext::IdentExt;
use syn::{Data, DataEnum, DeriveInput, Fields, FieldsNamed, Generics, Ident, Type, parse_quote};

/// Types whose default value stands in for a member missing from the document.
const DEFAULTABLE_TYPES: &[&str] = &[
    "Option", "Vec", "VecDeque", "HashSet", "BTreeSet", "HashMap", "BTreeMap",
];

pub(crate) fn derive_xml_type(ast: &DeriveInput) -> syn::Result<TokenStream> {
    let container = ContainerAttrs::parse(&ast.attrs)?;
    match &ast.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => expand_struct(ast, &container, fields),
            _ => Err(syn::Error::new_spanned(
                &ast.ident,
                "XmlType can only be derived for structs with named fields",
            )),
        },
        Data::Enum(data) => expand_enum(ast, &container, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &ast.ident,
            "XmlType cannot be derived for unions",
        )),
    }
}

fn krate() -> TokenStream {
    quote!(::helios_xmlgraph)
}

/// Friendly type name: `rename` or the identifier.
fn type_name(ast: &DeriveInput, container: &ContainerAttrs) -> String {
    container
        .rename
        .clone()
        .unwrap_or_else(|| ast.ident.unraw().to_string())
}

fn name_hint(name: Option<&str>, namespace: Option<&str>, prefix: Option<&str>) -> TokenStream {
    let krate = krate();
    let name = name.unwrap_or_default();
    let mut hint = quote!(#krate::name::NameHint::named(#name));
    if let Some(namespace) = namespace {
        hint = quote!(#hint.in_namespace(#namespace));
    }
    if let Some(prefix) = prefix {
        hint = quote!(#hint.with_prefix(#prefix));
    }
    hint
}

fn root_hint(container: &ContainerAttrs) -> TokenStream {
    if !container.has_root_hint() {
        return TokenStream::new();
    }
    let hint = name_hint(
        container.root.as_deref(),
        container.namespace.as_deref(),
        container.prefix.as_deref(),
    );
    quote!(.with_root(#hint))
}

/// Adds `FromXml + Reflect` bounds for every type parameter.
fn bounded_generics(generics: &Generics) -> Generics {
    let krate = krate();
    let mut generics = generics.clone();
    let params: Vec<Ident> = generics.type_params().map(|p| p.ident.clone()).collect();
    let where_clause = generics.make_where_clause();
    for param in params {
        where_clause.predicates.push(parse_quote!(
            #param: #krate::reconstruct::FromXml + #krate::reflect::Reflect
        ));
    }
    generics
}

/// `Typed` impl caching `info` in the appropriate cell.
fn impl_typed(ast: &DeriveInput, generics: &Generics, info: TokenStream) -> TokenStream {
    let krate = krate();
    let ident = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let cell = if ast.generics.type_params().next().is_some() {
        quote! {
            static CELL: #krate::reflect::GenericTypeInfoCell =
                #krate::reflect::GenericTypeInfoCell::new();
            CELL.get_or_insert::<Self>(|| #info)
        }
    } else {
        quote! {
            static CELL: #krate::reflect::NonGenericTypeInfoCell =
                #krate::reflect::NonGenericTypeInfoCell::new();
            CELL.get_or_init(|| #info)
        }
    };

    quote! {
        impl #impl_generics #krate::reflect::Typed for #ident #ty_generics #where_clause {
            fn type_info() -> &'static #krate::reflect::TypeInfo {
                #cell
            }
        }
    }
}

fn impl_reflect(ast: &DeriveInput, generics: &Generics, reflect_ref: TokenStream) -> TokenStream {
    let krate = krate();
    let ident = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    quote! {
        impl #impl_generics #krate::reflect::Reflect for #ident #ty_generics #where_clause {
            fn reflect_type_info(&self) -> &'static #krate::reflect::TypeInfo {
                <Self as #krate::reflect::Typed>::type_info()
            }

            fn reflect_ref(&self) -> #krate::reflect::ReflectRef<'_> {
                #reflect_ref
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }
        }
    }
}

struct FieldModel<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    attrs: FieldAttrs,
    /// Member name recorded in the descriptor.
    member_name: String,
    /// Name the value is captured under when reading; unused for text
    /// members, which read the element's own character data.
    xml_name: String,
    is_pub: bool,
    is_defaultable: bool,
}

impl FieldModel<'_> {
    fn is_ignored(&self) -> bool {
        self.attrs.encoding == Encoding::Ignore
    }

    fn is_text(&self) -> bool {
        self.attrs.encoding == Encoding::Text
    }
}

fn is_defaultable(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| DEFAULTABLE_TYPES.contains(&segment.ident.to_string().as_str())),
        _ => false,
    }
}

/// Same rule as `helios_xmlgraph::name::sanitize`.
fn sanitize(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '.' | '-'))
        .collect();
    kept.trim_start_matches(|c: char| c.is_numeric() || c == '.')
        .to_string()
}

/// The first candidate that is non-empty once sanitized, like the name
/// resolver's fallbacks.
fn local_name(candidates: &[&str]) -> String {
    candidates
        .iter()
        .map(|candidate| sanitize(candidate))
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| "Item".to_string())
}

fn field_models<'a>(
    fields: &'a FieldsNamed,
    container: &ContainerAttrs,
) -> syn::Result<Vec<FieldModel<'a>>> {
    let mut models = Vec::new();
    for field in &fields.named {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let attrs = FieldAttrs::parse(&field.attrs)?;
        let member_name = match (&attrs.rename, container.rename_all) {
            (Some(rename), _) => rename.clone(),
            (None, Some(rule)) => rule.apply(&ident.unraw().to_string()),
            (None, None) => ident.unraw().to_string(),
        };
        let xml_name = local_name(&[
            attrs.hint_name.as_deref().unwrap_or_default(),
            &member_name,
        ]);
        models.push(FieldModel {
            ident,
            ty: &field.ty,
            is_pub: matches!(field.vis, syn::Visibility::Public(_)),
            is_defaultable: is_defaultable(&field.ty),
            attrs,
            member_name,
            xml_name,
        });
    }
    Ok(models)
}

fn member_info(field: &FieldModel<'_>) -> TokenStream {
    let krate = krate();
    let name = &field.member_name;
    let ty = field.ty;
    if field.is_ignored() {
        return quote!(#krate::reflect::MemberInfo::ignored(#name));
    }

    let attrs = &field.attrs;
    let hint = || {
        name_hint(
            attrs.hint_name.as_deref(),
            attrs.namespace.as_deref(),
            attrs.prefix.as_deref(),
        )
    };
    let naming = match attrs.encoding {
        Encoding::Attribute => {
            let hint = hint();
            Some(quote!(#krate::name::NamingHint::Attribute(#hint)))
        }
        Encoding::Element => {
            let hint = hint();
            Some(quote!(#krate::name::NamingHint::Element(#hint)))
        }
        Encoding::Default if attrs.namespace.is_some() || attrs.prefix.is_some() => {
            let hint = hint();
            Some(quote!(#krate::name::NamingHint::Element(#hint)))
        }
        Encoding::Text => Some(quote!(#krate::name::NamingHint::Text)),
        Encoding::Default | Encoding::Ignore => None,
    };

    match naming {
        Some(naming) => quote!(#krate::reflect::MemberInfo::new::<#ty>(#name).with_hint(#naming)),
        None => quote!(#krate::reflect::MemberInfo::new::<#ty>(#name)),
    }
}

fn callable_name(callable: &Callable) -> String {
    callable
        .path
        .to_token_stream()
        .to_string()
        .replace(' ', "")
}

/// Arguments naming a text member take the element's character data and
/// are left out of the matched names.
fn callable_candidate(kind: &str, callable: &Callable, text_members: &[&str]) -> TokenStream {
    let method = Ident::new(kind, proc_macro2::Span::call_site());
    let name = callable_name(callable);
    let path = &callable.path;
    let args: Vec<String> = callable.args.iter().map(|arg| sanitize(arg)).collect();
    let is_text = |arg: &str| text_members.iter().any(|m| m.eq_ignore_ascii_case(arg));
    let params = args.iter().filter(|arg| !is_text(arg.as_str()));
    let values = args.iter().map(|arg| {
        if is_text(arg.as_str()) {
            quote!(c.take_text()?)
        } else {
            quote!(c.take(#arg)?)
        }
    });
    quote! {
        .#method(#name, &[#(#params),*], |c| Ok(#path(#(#values),*)))
    }
}

fn expand_struct(
    ast: &DeriveInput,
    container: &ContainerAttrs,
    fields: &FieldsNamed,
) -> syn::Result<TokenStream> {
    let krate = krate();
    let ident = &ast.ident;
    let name = type_name(ast, container);
    let fields = field_models(fields, container)?;
    let generics = bounded_generics(&ast.generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let members = fields.iter().map(member_info);
    let root = root_hint(container);
    let typed = impl_typed(
        ast,
        &generics,
        quote! {
            #krate::reflect::TypeInfo::complex::<Self>(#name, vec![#(#members),*])#root
        },
    );

    let reflect = impl_reflect(
        ast,
        &generics,
        quote!(#krate::reflect::ReflectRef::Struct(self)),
    );

    let field_len = fields.len();
    let accessors = fields.iter().enumerate().map(|(index, field)| {
        let field_ident = field.ident;
        if field.is_ignored() {
            quote!(#index => None,)
        } else {
            quote!(#index => Some(&self.#field_ident as &dyn #krate::reflect::Reflect),)
        }
    });
    let structure = quote! {
        impl #impl_generics #krate::reflect::Struct for #ident #ty_generics #where_clause {
            fn field_at(&self, index: usize) -> Option<&dyn #krate::reflect::Reflect> {
                match index {
                    #(#accessors)*
                    _ => None,
                }
            }

            fn field_len(&self) -> usize {
                #field_len
            }
        }
    };

    let named = |f: &&FieldModel<'_>| !f.is_ignored() && !f.is_text();
    let required: Vec<&str> = fields
        .iter()
        .filter(named)
        .filter(|f| !f.is_defaultable)
        .map(|f| f.xml_name.as_str())
        .collect();
    let optional: Vec<&str> = fields
        .iter()
        .filter(named)
        .filter(|f| f.is_defaultable)
        .map(|f| f.xml_name.as_str())
        .collect();
    let text_members: Vec<&str> = fields
        .iter()
        .filter(|f| f.is_text())
        .map(|f| f.xml_name.as_str())
        .collect();
    let initializers = fields.iter().map(|field| {
        let field_ident = field.ident;
        let xml_name = &field.xml_name;
        if field.is_ignored() {
            quote!(#field_ident: ::core::default::Default::default())
        } else if field.is_text() && field.is_defaultable {
            quote! {
                #field_ident: if c.text().is_some() {
                    c.take_text()?
                } else {
                    ::core::default::Default::default()
                }
            }
        } else if field.is_text() {
            quote!(#field_ident: c.take_text()?)
        } else if field.is_defaultable {
            quote! {
                #field_ident: if c.contains(#xml_name) {
                    c.take(#xml_name)?
                } else {
                    ::core::default::Default::default()
                }
            }
        } else {
            quote!(#field_ident: c.take(#xml_name)?)
        }
    });

    let constructors = container
        .constructors
        .iter()
        .map(|callable| callable_candidate("constructor", callable, &text_members));
    let factories = container
        .factories
        .iter()
        .map(|callable| callable_candidate("factory", callable, &text_members));
    let setters = fields
        .iter()
        .filter(|f| f.is_pub && !f.is_ignored())
        .map(|field| {
            let field_ident = field.ident;
            let xml_name = &field.xml_name;
            if field.is_text() {
                quote! {
                    .text_setter(|v, c| {
                        v.#field_ident = c.take_text()?;
                        Ok(())
                    })
                }
            } else {
                quote! {
                    .setter(#xml_name, |v, c| {
                        v.#field_ident = c.take(#xml_name)?;
                        Ok(())
                    })
                }
            }
        });

    let from_xml = quote! {
        impl #impl_generics #krate::reconstruct::FromXml for #ident #ty_generics #where_clause {
            fn reconstruct(captured: &#krate::reconstruct::Captured) -> #krate::Result<Self> {
                #krate::reconstruct::Reconstruction::<Self>::new()
                    #(#constructors)*
                    .constructor_with_optional(
                        "memberwise",
                        &[#(#required),*],
                        &[#(#optional),*],
                        |c| Ok(Self { #(#initializers),* }),
                    )
                    #(#factories)*
                    #(#setters)*
                    .reconstruct(captured)
            }
        }
    };

    Ok(quote! {
        #typed
        #reflect
        #structure
        #from_xml
    })
}

fn expand_enum(
    ast: &DeriveInput,
    container: &ContainerAttrs,
    data: &DataEnum,
) -> syn::Result<TokenStream> {
    let krate = krate();
    let ident = &ast.ident;
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            ident,
            "XmlType cannot be derived for enums without variants",
        ));
    }

    let mut variants = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "XmlType can only be derived for enums with unit variants",
            ));
        }
        let attrs = VariantAttrs::parse(&variant.attrs)?;
        let written = match (attrs.rename, container.rename_all) {
            (Some(rename), _) => rename,
            (None, Some(rule)) => rule.apply(&variant.ident.unraw().to_string()),
            (None, None) => variant.ident.unraw().to_string(),
        };
        variants.push((&variant.ident, written));
    }

    let name = type_name(ast, container);
    let generics = bounded_generics(&ast.generics);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let root = root_hint(container);
    let typed = impl_typed(
        ast,
        &generics,
        quote!(#krate::reflect::TypeInfo::simple::<Self>(#name)#root),
    );

    let to_text = variants
        .iter()
        .map(|(variant, written)| quote!(Self::#variant => #written,));
    let reflect = impl_reflect(
        ast,
        &generics,
        quote! {
            #krate::reflect::ReflectRef::Value(::std::borrow::Cow::Borrowed(match self {
                #(#to_text)*
            }))
        },
    );

    let from_text = variants
        .iter()
        .map(|(variant, written)| quote!(#written => Ok(Self::#variant),));
    let from_xml = quote! {
        impl #impl_generics #krate::reconstruct::FromXml for #ident #ty_generics #where_clause {
            fn from_xml_text(
                text: &str,
            ) -> ::core::result::Result<Self, #krate::error::ConversionError> {
                match text.trim() {
                    #(#from_text)*
                    other => Err(#krate::error::ConversionError::new::<Self>(
                        other,
                        "unknown variant",
                    )),
                }
            }
        }
    };

    Ok(quote! {
        #typed
        #reflect
        #from_xml
    })
}
