//! Modules group services and controllers; they are the unit of discovery.

use crate::controller::ControllerRegistration;
use crate::di::{Container, ServiceDescriptor};
use crate::error::{Result, ZephyrError};
use std::sync::Arc;

/// Trait for application modules
///
/// Modules are typically defined using the `#[module]` macro, which
/// implements this trait from the listed providers and controllers.
///
/// # Example
/// ```
/// use zephyr::{Injectable, module};
///
/// #[derive(Injectable)]
/// pub struct UserRepository {}
///
/// #[module(providers = [UserRepository])]
/// pub struct UserModule;
///
/// use zephyr::Module;
/// assert_eq!(UserModule.name(), "UserModule");
/// ```
pub trait Module: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Services this module provides
    fn services(&self) -> Result<Vec<ServiceDescriptor>> {
        Ok(Vec::new())
    }

    /// Controllers whose routes this module contributes
    fn controllers(&self) -> Result<Vec<ControllerRegistration>> {
        Ok(Vec::new())
    }
}

/// A module that could not be loaded, kept for reporting
#[derive(Debug)]
pub struct ModuleFailure {
    pub module: String,
    pub error: ZephyrError,
}

impl ModuleFailure {
    pub(crate) fn new(module: &str, error: ZephyrError) -> Self {
        let error = match error {
            ZephyrError::ModuleLoadFailure { .. } => error,
            other => ZephyrError::module_load(module, other.to_string()),
        };
        tracing::error!(module = %module, error = %error, "Skipping module");

        Self {
            module: module.to_string(),
            error,
        }
    }
}

/// Outcome of [`discover_services`]
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    pub registered: usize,
    pub failures: Vec<ModuleFailure>,
}

/// Register every service of every module, in list order
///
/// A module whose services cannot be loaded is skipped as a whole; the
/// remaining modules still register.
pub fn discover_services(container: &Container, modules: &[Arc<dyn Module>]) -> DiscoveryReport {
    let mut report = DiscoveryReport::default();

    for module in modules {
        match module.services() {
            Ok(services) => {
                let count = services.len();
                for descriptor in services {
                    container.add(descriptor);
                }
                tracing::debug!(module = %module.name(), services = count, "Registered module services");
                report.registered += count;
            }
            Err(error) => report.failures.push(ModuleFailure::new(module.name(), error)),
        }
    }

    tracing::info!(
        modules = modules.len(),
        services = report.registered,
        failed = report.failures.len(),
        "Service discovery complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::Injectable;

    struct Cache;

    impl Injectable for Cache {
        fn inject(_: &Container) -> Result<Self> {
            Ok(Self)
        }
    }

    struct Healthy;

    impl Module for Healthy {
        fn name(&self) -> &str {
            "Healthy"
        }

        fn services(&self) -> Result<Vec<ServiceDescriptor>> {
            Ok(vec![ServiceDescriptor::of::<Cache>()])
        }
    }

    struct Failing;

    impl Module for Failing {
        fn name(&self) -> &str {
            "Failing"
        }

        fn services(&self) -> Result<Vec<ServiceDescriptor>> {
            Err(ZephyrError::Config("bad provider list".into()))
        }
    }

    #[test]
    fn test_failed_module_is_skipped() {
        let container = Container::new();
        let modules: Vec<Arc<dyn Module>> = vec![Arc::new(Failing), Arc::new(Healthy)];

        let report = discover_services(&container, &modules);

        assert_eq!(report.registered, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].module, "Failing");
        assert!(matches!(
            report.failures[0].error,
            ZephyrError::ModuleLoadFailure { .. }
        ));
        assert!(container.contains("Cache"));
    }

    #[test]
    fn test_empty_module_list_is_a_no_op() {
        let container = Container::new();
        let report = discover_services(&container, &[]);
        assert_eq!(report.registered, 0);
        assert!(report.failures.is_empty());
        assert!(container.is_empty());
    }
}
