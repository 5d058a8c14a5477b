//! Controllers and their route tables.
//!
//! Controllers are normally declared with macros:
//! - `#[controller(path = "...")]` on the struct, making it injectable
//! - `#[routes]` on its impl block, with `#[get]`, `#[post]`, `#[put]`,
//!   `#[patch]`, `#[delete]`, `#[head]`, `#[options]`, `#[trace]`,
//!   `#[connect]` or `#[route("VERB", "...")]` on methods
//!
//! The macros generate:
//! 1. an [`Injectable`] implementation for DI
//! 2. a [`Controller`] implementation listing one [`RouteDef`] per annotated method

mod param;
mod route;

pub use param::ParamSource;
pub use route::{HandlerFuture, RouteDef, RouteDescriptor, parse_method};
pub(crate) use route::to_router_path;

use crate::di::{Container, Injectable, short_type_name};
use crate::error::Result;
use std::sync::Arc;

/// A type whose methods are bound to HTTP routes
pub trait Controller: Injectable {
    /// Prefix prepended verbatim to every route fragment
    fn base_path() -> &'static str {
        ""
    }

    fn routes() -> Vec<RouteDef<Self>>;
}

type Binder = Box<dyn Fn(&Container) -> Result<Vec<RouteDescriptor>> + Send + Sync>;

/// A controller type listed by a module, bound lazily against a container
pub struct ControllerRegistration {
    name: &'static str,
    binder: Binder,
}

impl ControllerRegistration {
    pub fn of<C: Controller>() -> Self {
        Self {
            name: short_type_name(std::any::type_name::<C>()),
            binder: Box::new(|container: &Container| -> Result<Vec<RouteDescriptor>> {
                // Registered controllers share the container's instance.
                let controller = if container.contains_type::<C>() {
                    container.resolve::<C>()?
                } else {
                    Arc::new(container.instantiate::<C>()?)
                };

                let name = short_type_name(std::any::type_name::<C>());
                C::routes()
                    .into_iter()
                    .map(|route| route.bind(C::base_path(), &controller, name))
                    .collect()
            }),
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Instantiate the controller and bind every route to it
    pub fn routes(&self, container: &Container) -> Result<Vec<RouteDescriptor>> {
        (self.binder)(container)
    }
}
