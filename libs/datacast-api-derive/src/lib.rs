use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr, Path};

/// Derive macro for record declarations.
///
/// Generates two impls on the annotated struct:
///
/// - `Declare`: the declared record shape (field names, types, aliases,
///   default providers, override encoders), consumed by the resolver.
/// - `FromValue`: typed extraction from a coerced `Value::Record`.
///
/// # Example
///
/// ```ignore
/// #[derive(Model)]
/// #[model(name = "User")]
/// pub struct User {
///     pub id: i64,
///
///     #[field(alias = "emailAddress")]
///     pub email_address: String,
///
///     #[field(default = "default_created_at")]
///     pub created_at: chrono::NaiveDateTime,
///
///     #[field(default)]
///     pub friends: Vec<i64>,
///
///     #[field(encoder = "encode_upper")]
///     pub code: String,
/// }
/// ```
///
/// `default = "path"` names a zero-argument function whose result converts
/// into `Value`; a bare `default` uses `Default::default()` of the field type.
/// `encoder = "path"` names a function usable as an `Encoder`.
#[proc_macro_derive(Model, attributes(model, field))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens,
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Model does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Model only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Model only supports structs",
            ))
        }
    };

    // Parse #[model(...)] attribute.
    let mut model_name = name.to_string();
    for attr in &input.attrs {
        if !attr.path().is_ident("model") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                model_name = value.value();
                Ok(())
            } else {
                Err(meta.error("unknown model attribute (expected 'name')"))
            }
        })?;
    }

    let mut field_decl_tokens = Vec::new();
    let mut from_value_tokens = Vec::new();

    for field in fields {
        let field_name = field.ident.as_ref().ok_or_else(|| {
            syn::Error::new_spanned(field, "expected named field")
        })?;
        let field_name_str = field_name.to_string();
        let field_ty = &field.ty;

        // Parse #[field(...)] attribute.
        let mut alias: Option<String> = None;
        let mut default_fn: Option<Path> = None;
        let mut default_trait = false;
        let mut encoder_fn: Option<Path> = None;

        for attr in &field.attrs {
            if !attr.path().is_ident("field") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("alias") {
                    let value: LitStr = meta.value()?.parse()?;
                    alias = Some(value.value());
                } else if meta.path.is_ident("default") {
                    if meta.input.peek(syn::Token![=]) {
                        let value: LitStr = meta.value()?.parse()?;
                        default_fn = Some(value.parse()?);
                    } else {
                        default_trait = true;
                    }
                } else if meta.path.is_ident("encoder") {
                    let value: LitStr = meta.value()?.parse()?;
                    encoder_fn = Some(value.parse()?);
                } else {
                    return Err(meta.error(
                        "unknown field attribute (expected 'alias', 'default' or 'encoder')",
                    ));
                }
                Ok(())
            })?;
        }

        let alias_expr = alias.map(|a| quote! { .alias(#a) });

        let default_expr = match (default_fn, default_trait) {
            (Some(path), _) => Some(quote! {
                .default_with(|| datacast_api::value::Value::from(#path()))
            }),
            (None, true) => Some(quote! {
                .default_with(|| datacast_api::value::Value::from(
                    <#field_ty as ::std::default::Default>::default()
                ))
            }),
            (None, false) => None,
        };

        let encoder_expr = encoder_fn.map(|path| {
            quote! { .encoder(::std::sync::Arc::new(#path)) }
        });

        field_decl_tokens.push(quote! {
            datacast_api::declare::FieldDecl::new(
                #field_name_str,
                <#field_ty as datacast_api::declare::Declare>::declare(),
            )
            #alias_expr
            #default_expr
            #encoder_expr
        });

        from_value_tokens.push(quote! {
            #field_name: datacast_api::from_value::FromValue::from_value(
                __record.take(#field_name_str)
            )
            .map_err(|e| e.with_field(#field_name_str))?
        });
    }

    let expanded = quote! {
        impl datacast_api::declare::Declare for #name {
            fn declare() -> datacast_api::declare::DeclaredType {
                datacast_api::declare::DeclaredType::Record(
                    datacast_api::declare::RecordDecl::of::<#name>(#model_name, || {
                        vec![
                            #(#field_decl_tokens),*
                        ]
                    })
                )
            }
        }

        impl datacast_api::from_value::FromValue for #name {
            fn from_value(
                __value: datacast_api::value::Value,
            ) -> Result<Self, datacast_api::error::ConversionError> {
                let mut __record = match __value {
                    datacast_api::value::Value::Record(record) => record,
                    other => {
                        return Err(datacast_api::error::ConversionError::composite(format!(
                            "expected record {}, got {}",
                            #model_name,
                            other.type_name()
                        )))
                    }
                };
                Ok(Self {
                    #(#from_value_tokens),*
                })
            }
        }
    };

    Ok(TokenStream::from(expanded))
}
