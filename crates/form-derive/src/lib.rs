//! Derive macros for `micro_form::Fields` and `micro_form::Decode`.
//!
//! Both derives read `#[form(...)]` attributes:
//!
//! - on fields: `rename = "key"`, `validate`, `embed`, `nested`, `required`, `skip`
//! - on the struct: `max_upload_size = <bytes>`

use proc_macro::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Attribute, Data, DeriveInput, Fields, LitInt, LitStr, Member, Type};

/// Derive `micro_form::Fields`, the validation walk over the struct's marked fields.
#[proc_macro_derive(Fields, attributes(form))]
pub fn derive_fields(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand_fields(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derive `micro_form::Decode` and `micro_form::Fields`.
#[proc_macro_derive(Form, attributes(form))]
pub fn derive_form(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let expanded = expand_fields(&input).and_then(|fields| {
        let decode = expand_decode(&input)?;
        Ok(quote! {
            #fields
            #decode
        })
    });
    match expanded {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_fields(input: &DeriveInput) -> Result<proc_macro2::TokenStream, syn::Error> {
    parse_container(&input.attrs)?;
    let fields = parse_fields(input, false)?;

    // embedded, nested and validatable fields are all walked as their own node
    let checks = fields.iter().filter(|field| field.validate || matches!(field.role, Role::Embed | Role::Nested)).map(|field| {
        let member = &field.member;
        quote! {
            ::micro_form::validate(&self.#member)?;
        }
    });

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::micro_form::Fields for #name #ty_generics #where_clause {
            fn validate_fields(&self) -> ::core::result::Result<(), ::micro_form::BoxError> {
                #(#checks)*
                ::core::result::Result::Ok(())
            }
        }
    })
}

fn expand_decode(input: &DeriveInput) -> Result<proc_macro2::TokenStream, syn::Error> {
    let container = parse_container(&input.attrs)?;
    let fields = parse_fields(input, true)?;

    let mut describe = Vec::new();
    let mut arms = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let member = &field.member;
        let ty = field.ty;
        match field.role {
            Role::Skip => {}
            Role::Value => {
                let key = &field.key;
                let required = field.required;
                describe.push(quote! { schema.value(#index, #key, #required); });
                arms.push(quote! {
                    [#index] => ::micro_form::decode::assign_value(&mut self.#member, values),
                });
            }
            Role::Embed => {
                describe.push(quote! { schema.embed::<#ty>(#index); });
                arms.push(quote! {
                    [#index, rest @ ..] => ::micro_form::Decode::assign(&mut self.#member, rest, values),
                });
            }
            Role::Nested => {
                let key = &field.key;
                describe.push(quote! { schema.nested::<#ty>(#index, #key); });
                arms.push(quote! {
                    [#index, rest @ ..] => ::micro_form::Decode::assign(&mut self.#member, rest, values),
                });
            }
        }
    }
    if describe.is_empty() {
        describe.push(quote! { let _ = schema; });
    }
    let unused_values = arms.is_empty().then(|| quote! { let _ = values; });

    let max_upload_size = container.max_upload_size.map(|limit| {
        quote! {
            const MAX_UPLOAD_SIZE: ::core::option::Option<u64> = ::core::option::Option::Some(#limit);
        }
    });

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::micro_form::Decode for #name #ty_generics #where_clause {
            #max_upload_size

            fn describe(schema: &mut ::micro_form::SchemaBuilder) {
                #(#describe)*
            }

            fn assign(
                &mut self,
                path: &[usize],
                values: &[::std::string::String],
            ) -> ::core::result::Result<(), ::micro_form::BoxError> {
                #unused_values
                match path {
                    #(#arms)*
                    _ => ::core::result::Result::Err(::micro_form::decode::unknown_path(path)),
                }
            }
        }
    })
}

#[derive(Debug, Default)]
struct Container {
    max_upload_size: Option<LitInt>,
}

fn parse_container(attrs: &[Attribute]) -> Result<Container, syn::Error> {
    let mut container = Container::default();
    for attr in attrs {
        if !attr.path().is_ident("form") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("max_upload_size") {
                if container.max_upload_size.is_some() {
                    return Err(meta.error("duplicate form(max_upload_size = ...)"));
                }
                let limit: LitInt = meta.value()?.parse()?;
                limit.base10_parse::<u64>()?;
                container.max_upload_size = Some(limit);
                return Ok(());
            }
            Err(meta.error("unsupported form attribute on container"))
        })?;
    }
    Ok(container)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Value,
    Embed,
    Nested,
    Skip,
}

struct Field<'a> {
    member: Member,
    ty: &'a Type,
    key: LitStr,
    role: Role,
    validate: bool,
    required: bool,
}

fn parse_fields(input: &DeriveInput, named_only: bool) -> Result<Vec<Field<'_>>, syn::Error> {
    let Data::Struct(struct_data) = &input.data else {
        return Err(syn::Error::new_spanned(input, "form derives can only be used on structs"));
    };
    if named_only && !matches!(struct_data.fields, Fields::Named(_)) {
        return Err(syn::Error::new_spanned(&struct_data.fields, "Form requires named fields"));
    }

    let mut fields = Vec::new();
    for (index, field) in struct_data.fields.iter().enumerate() {
        let member = match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(index.into()),
        };
        let default_key = field.ident.as_ref().map_or_else(|| index.to_string(), |ident| ident.unraw().to_string());
        fields.push(parse_field(&field.attrs, member, &field.ty, default_key)?);
    }
    Ok(fields)
}

fn parse_field<'a>(attrs: &[Attribute], member: Member, ty: &'a Type, default_key: String) -> Result<Field<'a>, syn::Error> {
    let mut rename: Option<LitStr> = None;
    let mut role = Role::Value;
    let mut validate = false;
    let mut required = false;

    for attr in attrs {
        if !attr.path().is_ident("form") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                if rename.is_some() {
                    return Err(meta.error("duplicate form(rename = ...)"));
                }
                rename = Some(meta.value()?.parse()?);
                return Ok(());
            }
            if meta.path.is_ident("validate") {
                validate = true;
                return Ok(());
            }
            if meta.path.is_ident("required") {
                required = true;
                return Ok(());
            }
            let next = if meta.path.is_ident("embed") {
                Role::Embed
            } else if meta.path.is_ident("nested") {
                Role::Nested
            } else if meta.path.is_ident("skip") {
                Role::Skip
            } else {
                return Err(meta.error("unsupported form attribute on field"));
            };
            if role != Role::Value {
                return Err(meta.error("only one of embed, nested and skip is allowed"));
            }
            role = next;
            Ok(())
        })?;
    }

    if role == Role::Embed && rename.is_some() {
        return Err(syn::Error::new_spanned(ty, "embedded fields have no key to rename"));
    }
    if required && role != Role::Value {
        return Err(syn::Error::new_spanned(ty, "required can only be used on value fields"));
    }
    if validate && matches!(role, Role::Embed | Role::Nested) {
        return Err(syn::Error::new_spanned(ty, "embedded and nested fields are always validated"));
    }

    let key = rename.unwrap_or_else(|| LitStr::new(&default_key, proc_macro2::Span::call_site()));
    Ok(Field { member, ty, key, role, validate, required })
}
