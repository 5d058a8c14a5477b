use crate::controller::ParamSource;
use crate::dispatch::{Args, Reply};
use crate::error::{Result, ZephyrError};
use axum::http::Method;
use axum::routing::MethodFilter;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by a bound handler
pub type HandlerFuture = Pin<Box<dyn Future<Output = anyhow::Result<Reply>> + Send>>;

type BoundHandler = Arc<dyn Fn(Args) -> HandlerFuture + Send + Sync>;
type MethodHandler<C> = Arc<dyn Fn(Arc<C>, Args) -> HandlerFuture + Send + Sync>;

/// One annotated controller method, not yet bound to an instance
///
/// Emitted by `#[routes]`; can also be written by hand.
pub struct RouteDef<C> {
    verb: String,
    path: String,
    name: String,
    params: BTreeMap<usize, ParamSource>,
    handler: MethodHandler<C>,
}

impl<C: Send + Sync + 'static> RouteDef<C> {
    pub fn new<F, Fut>(verb: impl Into<String>, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Arc<C>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Reply>> + Send + 'static,
    {
        Self {
            verb: verb.into(),
            path: path.into(),
            name: String::new(),
            params: BTreeMap::new(),
            handler: Arc::new(move |controller: Arc<C>, args: Args| -> HandlerFuture {
                Box::pin(handler(controller, args))
            }),
        }
    }

    /// Method name, used in logs and route listings
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Declare the source of the next parameter
    pub fn param(mut self, source: ParamSource) -> Self {
        let index = self.params.keys().next_back().map_or(0, |last| last + 1);
        self.params.insert(index, source);
        self
    }

    /// Declare the source of the parameter at `index`
    pub fn param_at(mut self, index: usize, source: ParamSource) -> Self {
        self.params.insert(index, source);
        self
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Sources from index 0 up to the first gap
    pub fn sources(&self) -> Vec<ParamSource> {
        (0..)
            .map_while(|index| self.params.get(&index).cloned())
            .collect()
    }

    /// Bind the handler to a controller instance under `prefix`
    pub(crate) fn bind(self, prefix: &str, controller: &Arc<C>, controller_name: &str) -> Result<RouteDescriptor> {
        let path = format!("{prefix}{}", self.path);
        let method = parse_method(&self.verb, &path)?;
        let params = self.sources();

        let instance = Arc::clone(controller);
        let handler = self.handler;
        let bound: BoundHandler =
            Arc::new(move |args: Args| handler(Arc::clone(&instance), args));

        Ok(RouteDescriptor {
            method,
            path,
            controller_path: prefix.to_string(),
            controller: controller_name.to_string(),
            handler_name: self.name,
            params,
            handler: bound,
        })
    }
}

/// Parse a verb the router can serve
///
/// Verbs are matched case-insensitively. Anything outside the standard set
/// is `UnsupportedHttpMethod`.
pub fn parse_method(verb: &str, route: &str) -> Result<Method> {
    let unsupported = || ZephyrError::UnsupportedHttpMethod {
        method: verb.to_string(),
        route: route.to_string(),
    };

    let method = Method::from_bytes(verb.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| unsupported())?;
    MethodFilter::try_from(method.clone()).map_err(|_| unsupported())?;
    Ok(method)
}

/// A route ready to hand to the router
#[derive(Clone)]
pub struct RouteDescriptor {
    pub method: Method,
    /// Controller prefix followed by the method's fragment
    pub path: String,
    pub controller_path: String,
    pub controller: String,
    pub handler_name: String,
    pub params: Vec<ParamSource>,
    handler: BoundHandler,
}

impl RouteDescriptor {
    /// A route backed by a plain function, without a controller
    pub fn from_fn<F, Fut>(method: Method, path: impl Into<String>, params: Vec<ParamSource>, handler: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Reply>> + Send + 'static,
    {
        Self {
            method,
            path: path.into(),
            controller_path: String::new(),
            controller: String::new(),
            handler_name: String::new(),
            params,
            handler: Arc::new(move |args: Args| -> HandlerFuture { Box::pin(handler(args)) }),
        }
    }

    pub fn call(&self, args: Args) -> HandlerFuture {
        (self.handler)(args)
    }

    /// Whether dispatch must open a request scope
    pub fn needs_scope(&self) -> bool {
        self.params
            .iter()
            .any(|source| matches!(source, ParamSource::Service(_)))
    }

    /// Path in the router's syntax: `:id` becomes `{id}`, `*rest` becomes `{*rest}`
    pub fn router_path(&self) -> String {
        to_router_path(&self.path)
    }

    pub fn method_filter(&self) -> Result<MethodFilter> {
        MethodFilter::try_from(self.method.clone()).map_err(|_| ZephyrError::UnsupportedHttpMethod {
            method: self.method.to_string(),
            route: self.path.clone(),
        })
    }
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("controller", &self.controller)
            .field("handler_name", &self.handler_name)
            .field("params", &self.params)
            .finish()
    }
}

pub(crate) fn to_router_path(path: &str) -> String {
    let converted: Vec<String> = path
        .split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':') {
                format!("{{{name}}}")
            } else if let Some(name) = segment.strip_prefix('*') {
                format!("{{*{name}}}")
            } else {
                segment.to_string()
            }
        })
        .collect();

    let joined = converted.join("/");
    if joined.starts_with('/') {
        joined
    } else {
        format!("/{joined}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::IntoReply;

    struct Probe;

    fn def(verb: &str, path: &str) -> RouteDef<Probe> {
        RouteDef::new(verb, path, |_: Arc<Probe>, _| async { ().into_reply() })
    }

    #[test]
    fn test_bound_path_is_plain_concatenation() {
        let controller = Arc::new(Probe);
        let route = def("get", "/:id").bind("/users", &controller, "Probe").unwrap();
        assert_eq!(route.path, "/users/:id");
        assert_eq!(route.controller_path, "/users");

        let doubled = def("get", "/list").bind("/users/", &controller, "Probe").unwrap();
        assert_eq!(doubled.path, "/users//list");
    }

    #[test]
    fn test_router_path_syntax() {
        assert_eq!(to_router_path("/users/:id"), "/users/{id}");
        assert_eq!(to_router_path("/files/*rest"), "/files/{*rest}");
        assert_eq!(to_router_path(""), "/");
        assert_eq!(to_router_path("health"), "/health");
        assert_eq!(to_router_path("/users/{id}"), "/users/{id}");
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("patch", "/x").unwrap(), Method::PATCH);
        assert_eq!(parse_method("CONNECT", "/x").unwrap(), Method::CONNECT);
        assert!(matches!(
            parse_method("PURGE", "/x"),
            Err(ZephyrError::UnsupportedHttpMethod { .. })
        ));
        assert!(parse_method("no spaces", "/x").is_err());
    }

    #[test]
    fn test_sources_stop_at_first_gap() {
        let route = def("post", "/")
            .param(ParamSource::path("id"))
            .param(ParamSource::Body)
            .param_at(3, ParamSource::Headers);

        assert_eq!(route.sources(), vec![ParamSource::path("id"), ParamSource::Body]);
    }
}
