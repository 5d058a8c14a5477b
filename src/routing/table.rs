use crate::controller::RouteDescriptor;
use crate::dispatch::Dispatcher;
use crate::error::{Result, ZephyrError};
use axum::{
    Router,
    extract::Request,
    http::Method,
    routing::{on, options},
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// The generated routes, unique by method and path
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
    keys: HashSet<(Method, String)>,
    // Router path per shape, where a shape is the path with parameter names erased.
    shapes: HashMap<String, String>,
    // Every accepted route mounted on no-op handlers. The router rejects
    // overlapping or malformed paths by panicking, so batches are tried here first.
    shadow: Router,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a batch of routes, all or nothing
    ///
    /// Fails with `RouteConflict` when a route repeats a method and path
    /// already present (in the table or earlier in the batch), or when its
    /// path only differs from an existing one by parameter names. Fails with
    /// `InvalidRoute` when the router would refuse the path, e.g. a parameter
    /// and a catch-all at the same position or a parameter without a name.
    pub fn insert_all(&mut self, routes: Vec<RouteDescriptor>) -> Result<()> {
        let mut keys = HashSet::new();
        let mut shapes = HashMap::new();

        for route in &routes {
            let path = route.router_path();
            let conflict = || ZephyrError::RouteConflict {
                method: route.method.to_string(),
                path: route.path.clone(),
            };

            let key = (route.method.clone(), path.clone());
            if self.keys.contains(&key) || !keys.insert(key) {
                return Err(conflict());
            }

            let shape = shape_of(&path);
            let known = self.shapes.get(&shape).or_else(|| shapes.get(&shape));
            if known.is_some_and(|known| *known != path) {
                return Err(conflict());
            }
            shapes.insert(shape, path);
        }

        let mut shadow = self.shadow.clone();
        for route in &routes {
            shadow = try_mount(shadow, route)?;
        }

        self.keys.extend(keys);
        self.shapes.extend(shapes);
        self.shadow = shadow;
        self.routes.extend(routes);
        Ok(())
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Build the router, wrapping every route in the dispatcher
    ///
    /// Paths that declare no `OPTIONS` route answer preflight requests
    /// through the dispatcher, which refuses them while no CORS policy is
    /// configured.
    pub fn into_router(self, dispatcher: Arc<Dispatcher>) -> Result<Router> {
        let mut router = Router::new();
        let mut paths = BTreeSet::new();
        let mut with_options = BTreeSet::new();

        for route in self.routes {
            let filter = route.method_filter()?;
            let path = route.router_path();
            tracing::debug!(method = %route.method, path = %route.path, "Mounting route");

            if route.method == Method::OPTIONS {
                with_options.insert(path.clone());
            }
            paths.insert(path.clone());

            let route = Arc::new(route);
            let dispatcher = Arc::clone(&dispatcher);
            router = router.route(
                &path,
                on(filter, move |request: Request| {
                    let dispatcher = Arc::clone(&dispatcher);
                    let route = Arc::clone(&route);
                    async move { dispatcher.handle(&route, request).await }
                }),
            );
        }

        for path in paths.difference(&with_options) {
            let dispatcher = Arc::clone(&dispatcher);
            router = router.route(
                path,
                options(move |request: Request| {
                    let dispatcher = Arc::clone(&dispatcher);
                    async move { dispatcher.preflight(request).await }
                }),
            );
        }

        Ok(router)
    }
}

/// Mount `route` on a no-op handler, turning a router panic into an error
fn try_mount(router: Router, route: &RouteDescriptor) -> Result<Router> {
    let filter = route.method_filter()?;
    let path = route.router_path();

    catch_unwind(AssertUnwindSafe(|| router.route(&path, on(filter, || async {})))).map_err(
        |panic| {
            let reason = panic
                .downcast_ref::<String>()
                .cloned()
                .or_else(|| panic.downcast_ref::<&str>().map(|reason| reason.to_string()))
                .unwrap_or_else(|| "rejected by the router".to_string());
            tracing::warn!(method = %route.method, path = %route.path, %reason, "Route refused");

            ZephyrError::InvalidRoute {
                method: route.method.to_string(),
                path: route.path.clone(),
                reason,
            }
        },
    )
}

fn shape_of(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.starts_with("{*") {
                "{*}"
            } else if segment.starts_with('{') {
                "{}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::Container;
    use crate::dispatch::IntoReply;

    fn route(method: Method, path: &str) -> RouteDescriptor {
        RouteDescriptor::from_fn(method, path, Vec::new(), |_| async { ().into_reply() })
    }

    #[test]
    fn test_same_path_different_methods() {
        let mut table = RouteTable::new();
        table
            .insert_all(vec![
                route(Method::GET, "/users/:id"),
                route(Method::PATCH, "/users/:id"),
            ])
            .unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_duplicate_route_rejects_whole_batch() {
        let mut table = RouteTable::new();
        table.insert_all(vec![route(Method::GET, "/users")]).unwrap();

        let error = table
            .insert_all(vec![route(Method::POST, "/users"), route(Method::GET, "/users")])
            .unwrap_err();
        assert!(matches!(error, ZephyrError::RouteConflict { .. }));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_paths_the_router_refuses_are_rejected() {
        let mut table = RouteTable::new();
        table.insert_all(vec![route(Method::GET, "/files/:id")]).unwrap();

        let error = table
            .insert_all(vec![route(Method::GET, "/files/*rest")])
            .unwrap_err();
        assert!(matches!(error, ZephyrError::InvalidRoute { ref path, .. } if path == "/files/*rest"));

        for path in ["/blobs/*", "/x/:"] {
            assert!(matches!(
                table.insert_all(vec![route(Method::GET, path)]),
                Err(ZephyrError::InvalidRoute { .. })
            ));
        }
        assert_eq!(table.len(), 1);

        // The router built from what was accepted mounts without trouble.
        let router = table.into_router(Arc::new(Dispatcher::new(Container::new())));
        assert!(router.is_ok());
    }

    #[test]
    fn test_nested_paths_with_other_parameter_names_are_accepted() {
        let mut table = RouteTable::new();
        table
            .insert_all(vec![
                route(Method::GET, "/users/:id"),
                route(Method::GET, "/users/:userId/posts"),
            ])
            .unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_parameter_name_mismatch_conflicts() {
        let mut table = RouteTable::new();
        table.insert_all(vec![route(Method::GET, "/users/:id")]).unwrap();

        assert!(
            table
                .insert_all(vec![route(Method::DELETE, "/users/:name")])
                .is_err()
        );
        assert!(
            table
                .insert_all(vec![route(Method::GET, "/users/me")])
                .is_ok()
        );
    }
}
