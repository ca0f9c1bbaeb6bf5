use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Field, Fields, LitStr, parse_macro_input};

/// Derives `FormModel` for a struct with named fields.
///
/// Rules are attached per field with `#[field(rules = "required|email")]`;
/// `id = "..."` overrides the element id.
#[proc_macro_derive(FormModel, attributes(field))]
pub fn derive_form_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormModel derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    let model_ident = input.ident;
    let fields_struct_ident = format_ident!("{model_ident}Fields");

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new(
                    Span::call_site(),
                    "FormModel derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(
                Span::call_site(),
                "FormModel derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let root = schoolform_path();
    let mut lens_defs = Vec::new();
    let mut fields_methods = Vec::new();
    let mut configs = Vec::new();
    let mut value_arms = Vec::new();

    for field in named_fields {
        let attrs = match FieldAttrs::parse(&field) {
            Ok(attrs) => attrs,
            Err(error) => return error.to_compile_error().into(),
        };
        let Some(field_ident) = field.ident else {
            continue;
        };
        let field_ty = field.ty;
        let field_name = field_ident.to_string();
        let lens_ident = format_ident!("{model_ident}{}Lens", to_pascal_case(&field_name));

        lens_defs.push(quote! {
            #[derive(Clone, Copy, Debug, Default)]
            pub struct #lens_ident;

            impl #root::form::FieldLens<#model_ident> for #lens_ident {
                type Value = #field_ty;

                fn key(self) -> #root::form::FieldKey {
                    #root::form::FieldKey::new(#field_name)
                }

                fn get<'a>(self, model: &'a #model_ident) -> &'a Self::Value {
                    &model.#field_ident
                }

                fn set(self, model: &mut #model_ident, value: Self::Value) {
                    model.#field_ident = value;
                }
            }
        });

        fields_methods.push(quote! {
            pub const fn #field_ident(&self) -> #lens_ident {
                #lens_ident
            }
        });

        let rules = attrs.rules.unwrap_or_else(|| LitStr::new("", Span::call_site()));
        let config = match attrs.id {
            Some(id) => quote!(#root::form::FieldConfig::new(#rules).with_id(#id)),
            None => quote!(#root::form::FieldConfig::new(#rules)),
        };
        configs.push(quote! {
            (#root::form::FieldKey::new(#field_name), #config)
        });

        value_arms.push(quote! {
            #field_name => #root::form::ToFieldValue::to_field_value(&self.#field_ident),
        });
    }

    quote! {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct #fields_struct_ident;

        impl #fields_struct_ident {
            #(#fields_methods)*
        }

        impl #root::form::FormModel for #model_ident {
            type Fields = #fields_struct_ident;

            fn fields() -> Self::Fields {
                #fields_struct_ident
            }

            fn field_configs(
            ) -> ::std::vec::Vec<(#root::form::FieldKey, #root::form::FieldConfig)> {
                ::std::vec![#(#configs),*]
            }

            fn field_value(&self, key: #root::form::FieldKey) -> #root::form::FieldValue {
                match key.as_str() {
                    #(#value_arms)*
                    _ => #root::form::FieldValue::Missing,
                }
            }
        }

        #(#lens_defs)*
    }
    .into()
}

#[derive(Default)]
struct FieldAttrs {
    rules: Option<LitStr>,
    id: Option<LitStr>,
}

impl FieldAttrs {
    fn parse(field: &Field) -> syn::Result<Self> {
        let mut attrs = Self::default();
        for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("field")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rules") {
                    attrs.rules = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("id") {
                    attrs.id = Some(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("expected `rules` or `id`"))
                }
            })?;
        }
        Ok(attrs)
    }
}

fn schoolform_path() -> TokenStream2 {
    match crate_name("schoolform") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) => quote!(crate),
        Err(_) => quote!(::schoolform),
    }
}

fn to_pascal_case(input: &str) -> String {
    let mut out = String::new();
    for segment in input.split('_') {
        if segment.is_empty() {
            continue;
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
