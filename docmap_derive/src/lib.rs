use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    Data, DeriveInput, Fields, Ident, LitStr, Path, Type, parse_macro_input, spanned::Spanned,
};

/// Derives `docmap::Document`, describing the struct's fields and markers.
///
/// Only syntax is checked here. Whether the markers make sense together is
/// decided when the registry compiles the descriptor into a handle.
#[proc_macro_derive(Document, attributes(document))]
pub fn derive_document(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_document(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_document(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            input.generics,
            "Document does not support generic structs",
        ));
    }

    let type_options = parse_document_options(&input.attrs)?;

    let data_struct = match input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new(
                struct_name.span(),
                "Document can only be derived for structs",
            ));
        }
    };

    let named_fields = match data_struct.fields {
        Fields::Named(fields) => fields,
        _ => {
            return Err(syn::Error::new(
                struct_name.span(),
                "Document requires named fields",
            ));
        }
    };

    let mut field_exprs = Vec::<TokenStream2>::new();
    let mut parent: Option<(Ident, Type)> = None;

    for field in named_fields.named {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new(field.span(), "Document requires named fields"))?;
        let options = parse_field_options(&field.attrs)?;

        if options.parent {
            if parent.is_some() {
                return Err(syn::Error::new(
                    field.span(),
                    "Only one #[document(parent)] field is allowed",
                ));
            }
            parent = Some((ident, field.ty));
            continue;
        }

        field_exprs.push(field_descriptor_expr(&struct_name, &ident, &field.ty, &options));
    }

    let constructor = match &type_options.constructor {
        Some(path) => quote!(#path),
        None => quote!(<#struct_name as ::core::default::Default>::default),
    };

    let collection = type_options
        .collection
        .as_ref()
        .map(|collection| quote!(.collection(#collection)));

    let extends = parent.map(|(ident, ty)| {
        quote! {
            .extends({
                fn project(target: &#struct_name) -> &#ty {
                    &target.#ident
                }
                fn project_mut(target: &mut #struct_name) -> &mut #ty {
                    &mut target.#ident
                }
                <#ty as ::docmap::Document>::descriptor().lift(project, project_mut)
            })
        }
    });

    Ok(quote! {
        impl ::docmap::Document for #struct_name {
            fn descriptor() -> ::docmap::ClassDescriptor<Self> {
                ::docmap::ClassDescriptor::new(stringify!(#struct_name))
                    .constructor(#constructor)
                    #collection
                    #( .field(#field_exprs) )*
                    #extends
            }
        }
    })
}

fn field_descriptor_expr(
    struct_name: &Ident,
    ident: &Ident,
    ty: &Type,
    options: &FieldOptions,
) -> TokenStream2 {
    let field_name = ident.to_string().trim_start_matches("r#").to_string();
    let getter = format_ident!("get");
    let getter_mut = format_ident!("get_mut");

    let type_info = if options.parsable {
        quote!(::docmap::TypeInfo::parsable::<#ty>())
    } else {
        quote!(::docmap::TypeInfo::of::<#ty>())
    };

    let mut markers = Vec::<TokenStream2>::new();
    match options.key {
        Some(KeyOption::Manual) => markers.push(quote!(.key())),
        Some(KeyOption::Auto) => markers.push(quote!(.auto_key())),
        None => {}
    }
    if let Some(rename) = &options.rename {
        markers.push(quote!(.rename(#rename)));
    }
    if let Some(content_type) = &options.file {
        markers.push(quote!(.file(#content_type)));
    }
    if options.web {
        markers.push(quote!(.web()));
    }
    if let Some(converter) = &options.converter {
        markers.push(quote!(.converted(::docmap::ConverterRef::of::<#converter>())));
    }
    if options.transient {
        markers.push(quote!(.transient()));
    }
    if options.constant {
        markers.push(quote!(.constant()));
    }

    let accessor = if options.transient || options.constant {
        quote!(::docmap::FieldAccessor::unmapped(#field_name))
    } else {
        quote! {
            {
                fn #getter(target: &#struct_name) -> &#ty {
                    &target.#ident
                }
                fn #getter_mut(target: &mut #struct_name) -> &mut #ty {
                    &mut target.#ident
                }
                ::docmap::FieldAccessor::for_field(#getter, #getter_mut)
            }
        }
    };

    quote! {
        ::docmap::FieldDescriptor::new(#field_name, #type_info, #accessor)
        #( #markers )*
    }
}

struct DocumentOptions {
    collection: Option<LitStr>,
    constructor: Option<Path>,
}

#[derive(Clone, Copy)]
enum KeyOption {
    Manual,
    Auto,
}

#[derive(Default)]
struct FieldOptions {
    key: Option<KeyOption>,
    rename: Option<LitStr>,
    file: Option<LitStr>,
    web: bool,
    converter: Option<Path>,
    transient: bool,
    constant: bool,
    parent: bool,
    parsable: bool,
}

fn parse_document_options(attrs: &[syn::Attribute]) -> syn::Result<DocumentOptions> {
    let mut options = DocumentOptions {
        collection: None,
        constructor: None,
    };

    for attr in attrs {
        if !attr.path().is_ident("document") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value = meta.value()?;
                options.collection = Some(value.parse()?);
                return Ok(());
            }

            if meta.path.is_ident("constructor") {
                let value = meta.value()?;
                options.constructor = Some(value.parse()?);
                return Ok(());
            }

            Err(meta.error(
                "Unsupported #[document(...)] option on a struct. Supported: collection = \"...\", constructor = path",
            ))
        })?;
    }

    Ok(options)
}

fn parse_field_options(attrs: &[syn::Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    let mut seen = false;

    for attr in attrs {
        if !attr.path().is_ident("document") {
            continue;
        }

        if seen {
            return Err(syn::Error::new(
                attr.span(),
                "Duplicate #[document(...)] attribute on field",
            ));
        }
        seen = true;

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("key") {
                options.key = Some(KeyOption::Manual);
                if meta.input.peek(syn::token::Paren) {
                    meta.parse_nested_meta(|inner| {
                        if inner.path.is_ident("auto") {
                            options.key = Some(KeyOption::Auto);
                            return Ok(());
                        }
                        Err(inner.error("Unsupported key option. Supported: auto"))
                    })?;
                }
                return Ok(());
            }

            if meta.path.is_ident("rename") {
                let value = meta.value()?;
                options.rename = Some(value.parse()?);
                return Ok(());
            }

            if meta.path.is_ident("file") {
                let value = meta.value()?;
                options.file = Some(value.parse()?);
                return Ok(());
            }

            if meta.path.is_ident("web") {
                options.web = true;
                return Ok(());
            }

            if meta.path.is_ident("converter") {
                let value = meta.value()?;
                options.converter = Some(value.parse()?);
                return Ok(());
            }

            if meta.path.is_ident("transient") {
                options.transient = true;
                return Ok(());
            }

            if meta.path.is_ident("constant") {
                options.constant = true;
                return Ok(());
            }

            if meta.path.is_ident("parent") {
                options.parent = true;
                return Ok(());
            }

            if meta.path.is_ident("parsable") {
                options.parsable = true;
                return Ok(());
            }

            Err(meta.error(
                "Unsupported #[document(...)] field option. Supported: key, key(auto), rename = \"...\", file = \"...\", web, converter = Path, transient, constant, parent, parsable",
            ))
        })?;
    }

    let has_markers = options.key.is_some()
        || options.rename.is_some()
        || options.file.is_some()
        || options.web
        || options.converter.is_some()
        || options.transient
        || options.constant
        || options.parsable;
    if options.parent && has_markers {
        return Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            "#[document(parent)] cannot be combined with other field options",
        ));
    }

    Ok(options)
}
