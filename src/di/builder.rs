use crate::di::{Container, Injectable, Lifetime, ServiceDescriptor};
use std::sync::Arc;

/// Builder for constructing a dependency injection container
///
/// Use this to configure and register services before handing the container
/// to the application.
///
/// # Example
/// ```
/// use zephyr::{ContainerBuilder, Injectable};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {}
///
/// #[derive(Injectable)]
/// struct SystemClock {}
///
/// impl Clock for SystemClock {}
///
/// let container = ContainerBuilder::new()
///     .register::<SystemClock>()
///     .bind::<dyn Clock, SystemClock, _>(|clock| clock as Arc<dyn Clock>)
///     .build();
///
/// assert!(container.resolve::<dyn Clock>().is_ok());
/// ```
pub struct ContainerBuilder {
    container: Container,
}

impl ContainerBuilder {
    /// Create a new container builder
    pub fn new() -> Self {
        Self {
            container: Container::new(),
        }
    }

    /// Register an injectable type with its declared name and lifetime
    pub fn register<T: Injectable>(self) -> Self {
        self.container.register::<T>();
        self
    }

    /// Register an injectable type under an explicit name and lifetime
    pub fn register_with<T: Injectable>(self, name: impl Into<String>, lifetime: Lifetime) -> Self {
        self.container.register_with::<T>(name, lifetime);
        self
    }

    /// Register a service instance
    pub fn instance<T: Send + Sync + 'static>(self, instance: T) -> Self {
        self.container.register_instance(instance);
        self
    }

    /// Register a prepared descriptor
    pub fn descriptor(self, descriptor: ServiceDescriptor) -> Self {
        self.container.add(descriptor);
        self
    }

    /// Bind a trait to a concrete implementation
    ///
    /// This enables resolving `Arc<dyn Trait>` to the registered implementation.
    /// The implementation must have been registered first (or will be).
    pub fn bind<Trait, Impl, F>(self, caster: F) -> Self
    where
        Trait: ?Sized + Send + Sync + 'static,
        Impl: Send + Sync + 'static,
        F: Fn(Arc<Impl>) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.container.bind::<Trait, Impl, F>(caster);
        self
    }

    /// Build the container
    pub fn build(self) -> Container {
        self.container
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
