use darling::{FromDeriveInput, FromField, ast::Data, util::Flag, util::Ignored};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, GenericArgument, Ident, PathArguments, Type, parse_macro_input};

#[derive(FromDeriveInput)]
#[darling(attributes(injectable), supports(struct_named, struct_unit))]
struct InjectableOpts {
    ident: Ident,
    generics: syn::Generics,
    data: Data<Ignored, InjectableField>,
    #[darling(default)]
    name: Option<String>,
    #[darling(default)]
    lifetime: Option<String>,
    #[darling(default)]
    on_init: Flag,
    #[darling(default)]
    on_destroy: Flag,
}

#[derive(FromField)]
#[darling(attributes(injectable))]
struct InjectableField {
    ident: Option<Ident>,
    ty: Type,
    #[darling(default)]
    default: Flag,
}

pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_injectable_impl(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(error) => TokenStream::from(error),
    }
}

/// Expand an `Injectable` impl; errors come back as compile-error tokens
pub(crate) fn generate_injectable_impl(input: &DeriveInput) -> Result<TokenStream2, TokenStream2> {
    let opts = InjectableOpts::from_derive_input(input).map_err(|e| e.write_errors())?;

    let struct_name = &opts.ident;
    let (impl_generics, ty_generics, where_clause) = opts.generics.split_for_impl();

    let fields = match &opts.data {
        Data::Struct(fields) => &fields.fields,
        Data::Enum(_) => {
            return Err(syn::Error::new_spanned(struct_name, "#[derive(Injectable)] can only be applied to structs")
                .to_compile_error());
        }
    };

    let mut field_injections = Vec::new();
    let mut dependencies = Vec::new();
    for field in fields {
        let field_name = &field.ident;
        if field.default.is_present() {
            field_injections.push(quote! {
                #field_name: ::core::default::Default::default()
            });
            continue;
        }

        let Some(inner) = arc_inner_type(&field.ty) else {
            return Err(syn::Error::new_spanned(
                &field.ty,
                "injected fields must be `Arc<T>`; mark other fields with #[injectable(default)]",
            )
            .to_compile_error());
        };
        field_injections.push(quote! {
            #field_name: container.resolve::<#inner>()?
        });
        dependencies.push(quote! {
            ::zephyr::di::Dependency::of::<#inner>()
        });
    }

    let service_name = opts.name.as_ref().map(|name| {
        quote! {
            fn service_name() -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed(#name)
            }
        }
    });

    let lifetime = match opts.lifetime.as_deref() {
        None => None,
        Some(value) => {
            let variant = match value.to_ascii_lowercase().as_str() {
                "singleton" => quote!(Singleton),
                "scoped" => quote!(Scoped),
                "transient" => quote!(Transient),
                other => {
                    let message = format!(
                        "unknown lifetime '{other}', expected \"singleton\", \"scoped\" or \"transient\""
                    );
                    return Err(syn::Error::new_spanned(struct_name, message).to_compile_error());
                }
            };
            Some(quote! {
                fn lifetime() -> ::zephyr::di::Lifetime {
                    ::zephyr::di::Lifetime::#variant
                }
            })
        }
    };

    let initialize = opts.on_init.is_present().then(|| {
        quote! {
            fn initialize(&self) -> ::zephyr::Result<()> {
                ::zephyr::OnInit::on_init(self)
            }
        }
    });

    let teardown = opts.on_destroy.is_present().then(|| {
        quote! {
            fn teardown(&self) {
                ::zephyr::OnDestroy::on_destroy(self)
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::zephyr::Injectable for #struct_name #ty_generics #where_clause {
            #service_name
            #lifetime

            fn dependencies() -> ::std::vec::Vec<::zephyr::di::Dependency> {
                ::std::vec![#(#dependencies),*]
            }

            #[allow(unused_variables)]
            fn inject(
                container: &::zephyr::Container
            ) -> ::zephyr::Result<Self> {
                ::core::result::Result::Ok(Self {
                    #(#field_injections),*
                })
            }

            #initialize
            #teardown
        }
    })
}

/// Extract `T` from `Arc<T>` (including `Arc<dyn Trait>`)
pub(crate) fn arc_inner_type(ty: &Type) -> Option<&Type> {
    wrapped_type(ty, "Arc")
}

pub(crate) fn wrapped_type<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}
