//! Derive macros for retrace property-based testing.
//!
//! `#[derive(Generate)]` implements `retrace::Arbitrary` for a struct or
//! enum by building a derived generator that makes one named generation
//! call per field. The derived value shrinks through those calls.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, parse_quote, Data, DeriveInput, Fields, GenericParam};

/// Derive `retrace::Arbitrary` for a custom type.
///
/// Every field type must itself implement `Arbitrary`, and the type must
/// be `Clone + Debug`. Struct fields are generated under their own names
/// (`"0"`, `"1"`, ... for tuple structs). Enums first generate a
/// `"variant"` index, which shrinks toward the first variant, then the
/// chosen variant's fields under `"Variant.field"`.
///
/// # Example
///
/// ```rust,ignore
/// use retrace::*;
///
/// #[derive(Generate, Debug, Clone, PartialEq)]
/// struct User {
///     name: String,
///     age: u32,
///     active: bool,
/// }
///
/// check(|runner: &mut Runner| {
///     let user = runner.generate("user", User::arbitrary());
///     user.name.len() < 100
/// });
/// ```
#[proc_macro_derive(Generate)]
pub fn derive_generate(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Generate the `Arbitrary` implementation.
fn generate_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;

    let mut generics = input.generics.clone();
    let type_params: Vec<_> = generics
        .params
        .iter()
        .filter_map(|param| match param {
            GenericParam::Type(ty) => Some(ty.ident.clone()),
            _ => None,
        })
        .collect();
    let where_clause = generics.make_where_clause();
    for param in type_params {
        where_clause
            .predicates
            .push(parse_quote!(#param: ::retrace::Arbitrary));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let generator_impl = match &input.data {
        Data::Struct(data) => generate_struct_impl(data)?,
        Data::Enum(data) => generate_enum_impl(input, data)?,
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Generate derive macro does not support unions",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::retrace::Arbitrary for #name #ty_generics #where_clause {
            fn arbitrary() -> ::retrace::Gen<Self> {
                #generator_impl
            }
        }
    })
}

/// One named generation call per field, in declaration order, building
/// the constructor `path`.
fn construct(path: TokenStream2, fields: &Fields, prefix: Option<String>) -> TokenStream2 {
    let call_name = |field: String| match &prefix {
        Some(prefix) => format!("{prefix}.{field}"),
        None => field,
    };

    match fields {
        Fields::Named(fields) => {
            let assignments = fields.named.iter().filter_map(|field| {
                let ident = field.ident.as_ref()?;
                let ty = &field.ty;
                let call = call_name(ident.to_string());
                Some(quote! {
                    #ident: runner.generate(#call, <#ty as ::retrace::Arbitrary>::arbitrary())
                })
            });
            quote! { #path { #(#assignments),* } }
        }
        Fields::Unnamed(fields) => {
            let values = fields.unnamed.iter().enumerate().map(|(i, field)| {
                let ty = &field.ty;
                let call = call_name(i.to_string());
                quote! {
                    runner.generate(#call, <#ty as ::retrace::Arbitrary>::arbitrary())
                }
            });
            quote! { #path(#(#values),*) }
        }
        Fields::Unit => path,
    }
}

/// Generate implementation for structs.
fn generate_struct_impl(data: &syn::DataStruct) -> Result<TokenStream2, syn::Error> {
    if let Fields::Unit = data.fields {
        return Ok(quote! {
            ::retrace::Gen::constant(Self)
        });
    }

    let value = construct(quote! { Self }, &data.fields, None);
    Ok(quote! {
        ::retrace::Gen::derive(|runner| #value)
    })
}

/// Generate implementation for enums.
fn generate_enum_impl(
    input: &DeriveInput,
    data: &syn::DataEnum,
) -> Result<TokenStream2, syn::Error> {
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            input,
            "Generate derive macro needs at least one enum variant",
        ));
    }

    let count = data.variants.len();
    let arms = data.variants.iter().enumerate().map(|(i, variant)| {
        let variant_name = &variant.ident;
        let value = construct(
            quote! { Self::#variant_name },
            &variant.fields,
            Some(variant_name.to_string()),
        );
        if i + 1 == count {
            quote! { _ => #value }
        } else {
            quote! { #i => #value }
        }
    });

    Ok(quote! {
        ::retrace::Gen::derive(|runner| {
            let variant = runner.generate("variant", ::retrace::Gen::<usize>::index(#count));
            match variant {
                #(#arms),*
            }
        })
    })
}
