use crate::di::{Container, Dependency, Injectable, Lifetime, short_type_name};
use crate::error::Result;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A type-erased service instance. The inner value is always an `Arc<T>`.
pub type Instance = Arc<dyn Any + Send + Sync>;

type Factory = Arc<dyn Fn(&Container) -> Result<Instance> + Send + Sync>;
type Teardown = Arc<dyn Fn(&Instance) + Send + Sync>;

/// Everything the container knows about one registered service.
#[derive(Clone)]
pub struct ServiceDescriptor {
    name: String,
    lifetime: Lifetime,
    type_id: TypeId,
    type_name: &'static str,
    dependencies: Vec<Dependency>,
    factory: Factory,
    teardown: Option<Teardown>,
}

impl ServiceDescriptor {
    /// Descriptor for an [`Injectable`] type using its own name and lifetime.
    pub fn of<T: Injectable>() -> Self {
        let factory: Factory = Arc::new(|container: &Container| {
            let service = container.construct::<T>()?;
            Ok(Arc::new(Arc::new(service)) as Instance)
        });
        let teardown: Teardown = Arc::new(|instance: &Instance| {
            if let Some(service) = instance.downcast_ref::<Arc<T>>() {
                service.teardown();
            }
        });

        Self {
            name: T::service_name().into_owned(),
            lifetime: T::lifetime(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            dependencies: T::dependencies(),
            factory,
            teardown: Some(teardown),
        }
    }

    /// Descriptor for an already constructed value. Always a singleton.
    pub fn instance<T: Send + Sync + 'static>(value: T) -> Self {
        let instance: Instance = Arc::new(Arc::new(value));
        Self {
            name: short_type_name(std::any::type_name::<T>()).to_string(),
            lifetime: Lifetime::Singleton,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            dependencies: Vec::new(),
            factory: Arc::new(move |_: &Container| Ok(instance.clone())),
            teardown: None,
        }
    }

    /// Descriptor exposing `Impl` as `Arc<Trait>`.
    ///
    /// The binding itself is never cached; the lifetime of `Impl` decides
    /// whether callers share an instance.
    pub fn binding<Trait, Impl, F>(caster: F) -> Self
    where
        Trait: ?Sized + Send + Sync + 'static,
        Impl: Send + Sync + 'static,
        F: Fn(Arc<Impl>) -> Arc<Trait> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |container: &Container| {
            let concrete = container.resolve::<Impl>()?;
            let bound: Arc<Trait> = caster(concrete);
            Ok(Arc::new(bound) as Instance)
        });

        Self {
            name: short_type_name(std::any::type_name::<Trait>()).to_string(),
            lifetime: Lifetime::Transient,
            type_id: TypeId::of::<Trait>(),
            type_name: std::any::type_name::<Trait>(),
            dependencies: vec![Dependency::of::<Impl>()],
            factory,
            teardown: None,
        }
    }

    /// Register under a different name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub(crate) fn construct(&self, container: &Container) -> Result<Instance> {
        (self.factory)(container)
    }

    pub(crate) fn tear_down(&self, instance: &Instance) {
        if let Some(teardown) = &self.teardown {
            teardown(instance);
        }
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("name", &self.name)
            .field("lifetime", &self.lifetime)
            .field("type_name", &self.type_name)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}
