use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Attribute, ItemStruct, LitStr, Path, Token, Type,
    parse::{Parse, ParseStream},
    parse_macro_input,
};

struct ModuleItem {
    attrs: Vec<Attribute>,
    path: Path,
}

impl Parse for ModuleItem {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let path = input.parse()?;
        Ok(ModuleItem { attrs, path })
    }
}

/// Represents a trait binding: (dyn Trait => Impl)
struct BindingItem {
    trait_type: Type,
    impl_type: Path,
}

impl Parse for BindingItem {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let content;
        syn::parenthesized!(content in input);

        let trait_type: Type = content.parse()?;
        content.parse::<Token![=>]>()?;
        let impl_type: Path = content.parse()?;

        Ok(BindingItem {
            trait_type,
            impl_type,
        })
    }
}

#[derive(Default)]
struct ModuleArgs {
    name: Option<String>,
    imports: Vec<ModuleItem>,
    controllers: Vec<ModuleItem>,
    providers: Vec<ModuleItem>,
    bindings: Vec<BindingItem>,
}

impl Parse for ModuleArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = ModuleArgs::default();

        while !input.is_empty() {
            let name: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            if name == "name" {
                args.name = Some(input.parse::<LitStr>()?.value());
            } else {
                // Parse array: [Item1, Item2, ...]
                let content;
                syn::bracketed!(content in input);

                if name == "imports" {
                    args.imports = content.parse_terminated(ModuleItem::parse, Token![,])?.into_iter().collect();
                } else if name == "controllers" {
                    args.controllers = content.parse_terminated(ModuleItem::parse, Token![,])?.into_iter().collect();
                } else if name == "providers" {
                    args.providers = content.parse_terminated(ModuleItem::parse, Token![,])?.into_iter().collect();
                } else if name == "bindings" {
                    args.bindings = content.parse_terminated(BindingItem::parse, Token![,])?.into_iter().collect();
                } else {
                    return Err(syn::Error::new_spanned(
                        name,
                        "unknown module option, expected name, imports, controllers, providers or bindings",
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

pub fn module_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ModuleArgs);
    let input = parse_macro_input!(item as ItemStruct);
    TokenStream::from(generate_module_impl(&args, &input))
}

fn generate_module_impl(args: &ModuleArgs, input: &ItemStruct) -> TokenStream2 {
    let module_name = &input.ident;
    let display_name = args.name.clone().unwrap_or_else(|| module_name.to_string());

    // Imported modules are unit structs; their items come first.
    let import_services = args.imports.iter().map(|item| {
        let path = &item.path;
        let attrs = &item.attrs;
        quote! {
            #(#attrs)*
            services.extend(::zephyr::Module::services(&#path)?);
        }
    });
    let import_controllers = args.imports.iter().map(|item| {
        let path = &item.path;
        let attrs = &item.attrs;
        quote! {
            #(#attrs)*
            controllers.extend(::zephyr::Module::controllers(&#path)?);
        }
    });

    let provider_registrations = args.providers.iter().map(|item| {
        let path = &item.path;
        let attrs = &item.attrs;
        quote! {
            #(#attrs)*
            services.push(::zephyr::di::ServiceDescriptor::of::<#path>());
        }
    });

    let binding_registrations = args.bindings.iter().map(|binding| {
        let trait_type = &binding.trait_type;
        let impl_type = &binding.impl_type;
        quote! {
            services.push(::zephyr::di::ServiceDescriptor::binding::<#trait_type, #impl_type, _>(|i| {
                i as ::std::sync::Arc<#trait_type>
            }));
        }
    });

    let controller_registrations = args.controllers.iter().map(|item| {
        let path = &item.path;
        let attrs = &item.attrs;
        quote! {
            #(#attrs)*
            controllers.push(::zephyr::controller::ControllerRegistration::of::<#path>());
        }
    });

    quote! {
        #input

        impl ::zephyr::Module for #module_name {
            fn name(&self) -> &str {
                #display_name
            }

            #[allow(unused_mut)]
            fn services(&self) -> ::zephyr::Result<::std::vec::Vec<::zephyr::di::ServiceDescriptor>> {
                let mut services = ::std::vec::Vec::new();
                #(#import_services)*
                #(#provider_registrations)*
                #(#binding_registrations)*
                ::core::result::Result::Ok(services)
            }

            #[allow(unused_mut)]
            fn controllers(&self) -> ::zephyr::Result<::std::vec::Vec<::zephyr::controller::ControllerRegistration>> {
                let mut controllers = ::std::vec::Vec::new();
                #(#import_controllers)*
                #(#controller_registrations)*
                ::core::result::Result::Ok(controllers)
            }
        }
    }
}
