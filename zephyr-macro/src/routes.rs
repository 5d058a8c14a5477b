use crate::injectable::{arc_inner_type, wrapped_type};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    Attribute, FnArg, ImplItem, ImplItemFn, ItemImpl, LitStr, Pat, Token, Type,
    parse::{Parse, ParseStream},
    parse_macro_input, spanned::Spanned,
};

const VERBS: [&str; 9] = [
    "get", "post", "put", "delete", "patch", "head", "options", "trace", "connect",
];
const SOURCES: [&str; 7] = ["param", "query", "body", "headers", "form", "multipart", "inject"];

/// `#[route("VERB", "/path")]`
struct RouteArgs {
    verb: LitStr,
    path: Option<LitStr>,
}

impl Parse for RouteArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let verb = input.parse()?;
        let path = if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            Some(input.parse()?)
        } else {
            None
        };
        Ok(RouteArgs { verb, path })
    }
}

struct RouteInfo {
    verb: String,
    path: String,
    fn_name: syn::Ident,
    is_async: bool,
    params: Vec<ParamInfo>,
}

struct ParamInfo {
    ty: Type,
    source: TokenStream2,
}

pub fn routes_attribute(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemImpl);
    match generate_routes_impl(input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(error) => TokenStream::from(error.to_compile_error()),
    }
}

fn generate_routes_impl(mut input: ItemImpl) -> syn::Result<TokenStream2> {
    let mut routes = Vec::new();

    for item in input.items.iter_mut() {
        if let ImplItem::Fn(method) = item {
            if let Some(route) = extract_route_info(method)? {
                routes.push(route);
                method.attrs.retain(|attr| !is_route_attr(attr));
                for arg in method.sig.inputs.iter_mut() {
                    if let FnArg::Typed(pat_type) = arg {
                        pat_type.attrs.retain(|attr| !is_source_attr(attr));
                    }
                }
            }
        }
    }

    let route_defs = routes.iter().map(|route| {
        let verb = &route.verb;
        let path = &route.path;
        let fn_name = &route.fn_name;
        let name = fn_name.to_string();

        let temps: Vec<_> = (0..route.params.len())
            .map(|i| format_ident!("__p_{}", i))
            .collect();
        let types = route.params.iter().map(|param| &param.ty);
        let sources = route.params.iter().map(|param| &param.source);

        let rebind = (!route.params.is_empty()).then(|| quote! { let mut __args = __args; });
        let call = if route.is_async {
            quote! { __controller.#fn_name(#(#temps),*).await }
        } else {
            quote! { __controller.#fn_name(#(#temps),*) }
        };

        quote! {
            ::zephyr::controller::RouteDef::new(
                #verb,
                #path,
                |__controller: ::std::sync::Arc<Self>, __args: ::zephyr::dispatch::Args| async move {
                    #rebind
                    #(let #temps = __args.next::<#types>()?;)*
                    ::zephyr::dispatch::IntoReply::into_reply(#call)
                },
            )
            .name(#name)
            #(.param(#sources))*
        }
    });

    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        #input

        impl #impl_generics ::zephyr::controller::Controller for #self_ty #where_clause {
            fn base_path() -> &'static str {
                Self::BASE_PATH
            }

            fn routes() -> ::std::vec::Vec<::zephyr::controller::RouteDef<Self>> {
                ::std::vec![#(#route_defs),*]
            }
        }
    })
}

fn extract_route_info(method: &ImplItemFn) -> syn::Result<Option<RouteInfo>> {
    let mut verb_and_path = None;

    for attr in &method.attrs {
        let Some(ident) = attr.path().get_ident() else {
            continue;
        };
        let name = ident.to_string();

        let parsed = if VERBS.contains(&name.as_str()) {
            let path = match &attr.meta {
                syn::Meta::Path(_) => String::new(),
                _ => attr.parse_args::<LitStr>()?.value(),
            };
            (name.to_uppercase(), path)
        } else if name == "route" {
            let args: RouteArgs = attr.parse_args()?;
            let path = args.path.map(|lit| lit.value()).unwrap_or_default();
            (args.verb.value(), path)
        } else {
            continue;
        };

        if verb_and_path.is_some() {
            return Err(syn::Error::new_spanned(attr, "a method can only have one route attribute"));
        }
        verb_and_path = Some(parsed);
    }

    let Some((verb, path)) = verb_and_path else {
        return Ok(None);
    };

    let mut params = Vec::new();
    for arg in method.sig.inputs.iter() {
        if let FnArg::Typed(pat_type) = arg {
            params.push(param_info(&pat_type.attrs, &pat_type.pat, &pat_type.ty)?);
        }
    }

    Ok(Some(RouteInfo {
        verb,
        path,
        fn_name: method.sig.ident.clone(),
        is_async: method.sig.asyncness.is_some(),
        params,
    }))
}

fn param_info(attrs: &[Attribute], pat: &Pat, ty: &Type) -> syn::Result<ParamInfo> {
    let mut found = attrs.iter().filter(|attr| is_source_attr(attr));
    let Some(attr) = found.next() else {
        return Err(syn::Error::new(
            pat.span(),
            "route parameters need one of #[param], #[query], #[body], #[headers], #[form], #[multipart] or #[inject]",
        ));
    };
    if let Some(extra) = found.next() {
        return Err(syn::Error::new_spanned(extra, "a parameter can only have one source"));
    }

    let kind = attr.path().get_ident().map(|ident| ident.to_string()).unwrap_or_default();
    let source = match kind.as_str() {
        "body" => quote! { ::zephyr::controller::ParamSource::Body },
        "headers" => quote! { ::zephyr::controller::ParamSource::Headers },
        "inject" => {
            let inner = arc_inner_type(ty)
                .or_else(|| wrapped_type(ty, "Inject"))
                .ok_or_else(|| syn::Error::new_spanned(ty, "#[inject] parameters must be `Arc<T>` or `Inject<T>`"))?;
            quote! { ::zephyr::controller::ParamSource::service::<#inner>() }
        }
        named => {
            let name = source_name(attr, pat)?;
            match named {
                "param" => quote! { ::zephyr::controller::ParamSource::path(#name) },
                "query" => quote! { ::zephyr::controller::ParamSource::query(#name) },
                "form" => quote! { ::zephyr::controller::ParamSource::form_field(#name) },
                _ => quote! { ::zephyr::controller::ParamSource::multipart_field(#name) },
            }
        }
    };

    Ok(ParamInfo {
        ty: ty.clone(),
        source,
    })
}

/// The explicit name in `#[param("id")]`, else the parameter's own name
fn source_name(attr: &Attribute, pat: &Pat) -> syn::Result<String> {
    if let syn::Meta::List(_) = &attr.meta {
        return Ok(attr.parse_args::<LitStr>()?.value());
    }

    match pat {
        Pat::Ident(pat_ident) => Ok(pat_ident.ident.to_string().trim_start_matches('_').to_string()),
        _ => Err(syn::Error::new(
            pat.span(),
            "destructured parameters need an explicit name, e.g. #[query(\"page\")]",
        )),
    }
}

fn is_route_attr(attr: &Attribute) -> bool {
    attr.path()
        .get_ident()
        .is_some_and(|ident| ident == "route" || VERBS.contains(&ident.to_string().as_str()))
}

fn is_source_attr(attr: &Attribute) -> bool {
    attr.path()
        .get_ident()
        .is_some_and(|ident| SOURCES.contains(&ident.to_string().as_str()))
}
