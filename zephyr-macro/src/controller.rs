use crate::injectable::generate_injectable_impl;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    DeriveInput, ItemStruct, LitStr, Token,
    parse::{Parse, ParseStream},
    parse_macro_input,
};

struct ControllerArgs {
    path: String,
}

impl Parse for ControllerArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut path = None;
        while !input.is_empty() {
            let name: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            if name == "path" {
                let lit: LitStr = input.parse()?;
                path = Some(lit.value());
            } else {
                return Err(syn::Error::new_spanned(name, "unknown controller option, expected `path`"));
            }
            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(ControllerArgs {
            path: path.unwrap_or_default(),
        })
    }
}

pub fn controller_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ControllerArgs);
    let input = parse_macro_input!(item as ItemStruct);
    TokenStream::from(generate_controller_impl(&args, input))
}

fn generate_controller_impl(args: &ControllerArgs, mut input: ItemStruct) -> TokenStream2 {
    let derive_input: DeriveInput = input.clone().into();
    let injectable_impl = match generate_injectable_impl(&derive_input) {
        Ok(tokens) => tokens,
        Err(errors) => return errors,
    };

    // `#[injectable]` is only inert under the derive; strip it here.
    input.attrs.retain(|attr| !attr.path().is_ident("injectable"));
    for field in input.fields.iter_mut() {
        field.attrs.retain(|attr| !attr.path().is_ident("injectable"));
    }

    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let base_path = &args.path;

    quote! {
        #input
        #injectable_impl

        impl #impl_generics #struct_name #ty_generics #where_clause {
            /// Prefix prepended to every route of this controller
            pub const BASE_PATH: &'static str = #base_path;
        }
    }
}
