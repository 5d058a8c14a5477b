use crate::controller::RouteDescriptor;
use crate::di::Container;
use crate::error::Result;
use crate::module::{Module, ModuleFailure};
use crate::routing::RouteTable;
use std::sync::Arc;

/// Routes produced by [`RouteGenerator::generate`]
#[derive(Debug, Default)]
pub struct GeneratedRoutes {
    pub table: RouteTable,
    pub failures: Vec<ModuleFailure>,
}

/// Turns module controllers into a route table
///
/// Each module is all or nothing: an unsupported verb, a failed controller
/// construction or a route conflict drops every route of that module, and
/// the remaining modules are still processed.
pub struct RouteGenerator<'a> {
    container: &'a Container,
}

impl<'a> RouteGenerator<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub fn generate(&self, modules: &[Arc<dyn Module>]) -> GeneratedRoutes {
        let mut generated = GeneratedRoutes::default();

        for module in modules {
            let outcome = self
                .module_routes(module.as_ref())
                .and_then(|routes| {
                    let count = routes.len();
                    generated.table.insert_all(routes).map(|()| count)
                });

            match outcome {
                Ok(count) => {
                    tracing::debug!(module = %module.name(), routes = count, "Generated module routes")
                }
                Err(error) => generated
                    .failures
                    .push(ModuleFailure::new(module.name(), error)),
            }
        }

        tracing::info!(
            routes = generated.table.len(),
            failed = generated.failures.len(),
            "Route generation complete"
        );
        generated
    }

    fn module_routes(&self, module: &dyn Module) -> Result<Vec<RouteDescriptor>> {
        let mut routes = Vec::new();
        for registration in module.controllers()? {
            let bound = registration.routes(self.container)?;
            tracing::debug!(
                controller = %registration.name(),
                routes = bound.len(),
                "Bound controller"
            );
            routes.extend(bound);
        }
        Ok(routes)
    }
}
