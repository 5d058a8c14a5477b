use crate::di::cache::InstanceCache;
use crate::di::{Dependency, Injectable, Instance, Lifetime, ServiceDescriptor};
use crate::error::{Result, ZephyrError};
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;

/// Thread-safe dependency injection container.
///
/// Services are registered by name; typed lookups go through the name a type
/// was registered under (its alias) or, failing that, its bare type name.
/// Clones share every registry and cache. [`Container::create_scope`] returns
/// a container sharing registrations and singletons but with its own scoped
/// cache.
#[derive(Clone)]
pub struct Container {
    services: Arc<DashMap<String, Arc<ServiceDescriptor>>>,
    type_names: Arc<DashMap<TypeId, String>>,
    singletons: Arc<InstanceCache>,
    scoped: Arc<InstanceCache>,
}

impl Container {
    pub fn new() -> Self {
        Self {
            services: Arc::new(DashMap::new()),
            type_names: Arc::new(DashMap::new()),
            singletons: Arc::new(InstanceCache::default()),
            scoped: Arc::new(InstanceCache::default()),
        }
    }

    /// Register a descriptor. Registering a name twice keeps the last one.
    pub fn add(&self, descriptor: ServiceDescriptor) -> &Self {
        let name = descriptor.name().to_string();
        tracing::debug!(
            service = %name,
            lifetime = %descriptor.lifetime(),
            "Registering service"
        );

        self.type_names.insert(descriptor.type_id(), name.clone());
        if self.services.insert(name.clone(), Arc::new(descriptor)).is_some() {
            tracing::warn!(service = %name, "Service registered twice, keeping the last registration");
        }
        self
    }

    /// Register an injectable type under its own name and lifetime.
    pub fn register<T: Injectable>(&self) -> &Self {
        self.add(ServiceDescriptor::of::<T>())
    }

    /// Register an injectable type under an explicit name and lifetime.
    pub fn register_with<T: Injectable>(&self, name: impl Into<String>, lifetime: Lifetime) -> &Self {
        self.add(
            ServiceDescriptor::of::<T>()
                .named(name)
                .with_lifetime(lifetime),
        )
    }

    /// Register an already constructed value as a singleton.
    pub fn register_instance<T: Send + Sync + 'static>(&self, instance: T) -> &Self {
        self.add(ServiceDescriptor::instance(instance))
    }

    /// Make `Arc<Trait>` resolvable through the registered `Impl`.
    pub fn bind<Trait, Impl, F>(&self, caster: F) -> &Self
    where
        Trait: ?Sized + Send + Sync + 'static,
        Impl: Send + Sync + 'static,
        F: Fn(Arc<Impl>) -> Arc<Trait> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::binding::<Trait, Impl, F>(caster))
    }

    /// Resolve the service registered for type `T`.
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let name = self.name_of(&Dependency::of::<T>());
        self.resolve_named::<T>(&name)
    }

    /// Resolve a service by name and downcast it to `T`.
    pub fn resolve_named<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        let instance = self.resolve_any(name)?;
        instance
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| ZephyrError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    /// Resolve whatever a declared dependency points at.
    pub fn resolve_dependency(&self, dependency: &Dependency) -> Result<Instance> {
        self.resolve_any(&self.name_of(dependency))
    }

    /// Resolve a service by name, honouring its lifetime.
    pub fn resolve_any(&self, name: &str) -> Result<Instance> {
        let descriptor = self.descriptor(name)?;

        match descriptor.lifetime() {
            Lifetime::Transient => self.build(&descriptor),
            Lifetime::Singleton => self
                .singletons
                .get_or_try_init(name, || self.build(&descriptor)),
            Lifetime::Scoped => self.scoped.get_or_try_init(name, || self.build(&descriptor)),
        }
    }

    /// Construct `T` with its declared dependencies and run its init hook.
    ///
    /// The result is not cached and `T` does not have to be registered.
    pub fn instantiate<T: Injectable>(&self) -> Result<T> {
        for dependency in T::dependencies() {
            let name = self.name_of(&dependency);
            let mut path = vec![T::service_name().into_owned()];
            let owner = (T::lifetime() == Lifetime::Singleton).then(|| T::service_name().into_owned());
            self.check_graph(&name, &mut path, owner.as_deref())?;
        }

        self.construct::<T>()
    }

    /// Inject and initialise `T` without walking its graph first.
    ///
    /// Descriptor factories land here: [`Container::build`] has already
    /// checked the graph under the registered name and lifetime.
    pub(crate) fn construct<T: Injectable>(&self) -> Result<T> {
        let service = T::inject(self)?;
        service.initialize()?;
        Ok(service)
    }

    /// A container sharing registrations and singletons with a fresh scoped cache.
    pub fn create_scope(&self) -> Container {
        Self {
            services: Arc::clone(&self.services),
            type_names: Arc::clone(&self.type_names),
            singletons: Arc::clone(&self.singletons),
            scoped: Arc::new(InstanceCache::default()),
        }
    }

    /// Tear down and forget every instance cached in this scope.
    pub fn clear_scope(&self) {
        let drained = self.scoped.drain();
        let count = drained.len();
        for (name, instance) in drained {
            self.tear_down(&name, &instance);
        }
        tracing::debug!(instances = count, "Cleared scoped instances");
    }

    /// Tear down every cached singleton, most recently created first.
    pub fn dispose(&self) {
        self.clear_scope();
        let drained = self.singletons.drain();
        let count = drained.len();
        for (name, instance) in drained {
            self.tear_down(&name, &instance);
        }
        tracing::debug!(instances = count, "Disposed singleton instances");
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn contains_type<T: ?Sized + 'static>(&self) -> bool {
        self.contains(&self.name_of(&Dependency::of::<T>()))
    }

    /// Snapshot of every registered descriptor.
    pub fn descriptors(&self) -> Vec<Arc<ServiceDescriptor>> {
        self.services.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    pub fn scoped_len(&self) -> usize {
        self.scoped.len()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// The name a dependency is registered under.
    pub fn name_of(&self, dependency: &Dependency) -> String {
        self.type_names
            .get(&dependency.type_id())
            .map(|name| name.value().clone())
            .unwrap_or_else(|| dependency.default_name().to_string())
    }

    fn descriptor(&self, name: &str) -> Result<Arc<ServiceDescriptor>> {
        self.services
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ZephyrError::not_found(name))
    }

    fn build(&self, descriptor: &ServiceDescriptor) -> Result<Instance> {
        let owner = (descriptor.lifetime() == Lifetime::Singleton).then(|| descriptor.name());
        let mut path = Vec::new();
        self.check_graph(descriptor.name(), &mut path, owner)?;
        descriptor.construct(self)
    }

    /// Walks the declared dependency graph before anything is constructed.
    fn check_graph(&self, name: &str, path: &mut Vec<String>, owner: Option<&str>) -> Result<()> {
        if let Some(position) = path.iter().position(|seen| seen == name) {
            let mut cycle = path[position..].to_vec();
            cycle.push(name.to_string());
            return Err(ZephyrError::CircularDependency {
                cycle: cycle.join(" -> "),
            });
        }

        let descriptor = self.descriptor(name)?;
        if descriptor.lifetime() == Lifetime::Scoped {
            if let Some(owner) = owner {
                return Err(ZephyrError::ScopeMismatch {
                    message: format!("singleton '{owner}' depends on scoped service '{name}'"),
                });
            }
        }

        path.push(name.to_string());
        for dependency in descriptor.dependencies() {
            let dependency_name = self.name_of(dependency);
            self.check_graph(&dependency_name, path, owner)?;
        }
        path.pop();
        Ok(())
    }

    fn tear_down(&self, name: &str, instance: &Instance) {
        if let Ok(descriptor) = self.descriptor(name) {
            tracing::debug!(service = %name, "Tearing down service");
            descriptor.tear_down(instance);
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

    struct Database {
        url: String,
    }

    impl Injectable for Database {
        fn inject(_container: &Container) -> Result<Self> {
            Ok(Self {
                url: "memory://".to_string(),
            })
        }
    }

    struct UserRepository {
        database: Arc<Database>,
    }

    impl Injectable for UserRepository {
        fn lifetime() -> Lifetime {
            Lifetime::Transient
        }

        fn dependencies() -> Vec<Dependency> {
            vec![Dependency::of::<Database>()]
        }

        fn inject(container: &Container) -> Result<Self> {
            Ok(Self {
                database: container.resolve::<Database>()?,
            })
        }
    }

    struct Orphan {
        _missing: Arc<MissingService>,
    }

    struct MissingService;

    impl Injectable for Orphan {
        fn dependencies() -> Vec<Dependency> {
            vec![Dependency::of::<MissingService>()]
        }

        fn inject(container: &Container) -> Result<Self> {
            CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
            Ok(Self {
                _missing: container.resolve::<MissingService>()?,
            })
        }
    }

    struct RequestLog {
        torn_down: Arc<AtomicUsize>,
    }

    #[derive(Default)]
    struct TeardownCounter(Arc<AtomicUsize>);

    impl Injectable for RequestLog {
        fn lifetime() -> Lifetime {
            Lifetime::Scoped
        }

        fn dependencies() -> Vec<Dependency> {
            vec![Dependency::of::<TeardownCounter>()]
        }

        fn inject(container: &Container) -> Result<Self> {
            let counter = container.resolve::<TeardownCounter>()?;
            Ok(Self {
                torn_down: Arc::clone(&counter.0),
            })
        }

        fn teardown(&self) {
            self.torn_down.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Ping;
    struct Pong;

    impl Injectable for Ping {
        fn dependencies() -> Vec<Dependency> {
            vec![Dependency::of::<Pong>()]
        }

        fn inject(container: &Container) -> Result<Self> {
            container.resolve::<Pong>()?;
            Ok(Self)
        }
    }

    impl Injectable for Pong {
        fn dependencies() -> Vec<Dependency> {
            vec![Dependency::of::<Ping>()]
        }

        fn inject(container: &Container) -> Result<Self> {
            container.resolve::<Ping>()?;
            Ok(Self)
        }
    }

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    impl Greeter for Database {
        fn greet(&self) -> String {
            format!("hello from {}", self.url)
        }
    }

    #[test]
    fn test_singleton_is_shared() {
        let container = Container::new();
        container.register::<Database>();

        let first = container.resolve::<Database>().unwrap();
        let second = container.resolve::<Database>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_transient_is_rebuilt_with_shared_dependencies() {
        let container = Container::new();
        container.register::<Database>().register::<UserRepository>();

        let first = container.resolve::<UserRepository>().unwrap();
        let second = container.resolve::<UserRepository>().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first.database, &second.database));
    }

    #[test]
    fn test_unregistered_name_is_not_found() {
        let container = Container::new();
        let error = container.resolve_any("Nope").err().unwrap();
        assert!(matches!(error, ZephyrError::DependencyNotFound { ref name } if name == "Nope"));
    }

    #[test]
    fn test_missing_dependency_constructs_nothing() {
        let container = Container::new();
        container.register::<Orphan>();

        let error = container.resolve::<Orphan>().err().unwrap();
        assert!(matches!(error, ZephyrError::DependencyNotFound { ref name } if name == "MissingService"));
        assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_scoped_instances_and_teardown() {
        let container = Container::new();
        container
            .register_instance(TeardownCounter::default())
            .register::<RequestLog>();
        let counter = container.resolve::<TeardownCounter>().unwrap();

        let first = container.resolve::<RequestLog>().unwrap();
        let again = container.resolve::<RequestLog>().unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(container.scoped_len(), 1);

        container.clear_scope();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert_eq!(container.scoped_len(), 0);

        let fresh = container.resolve::<RequestLog>().unwrap();
        assert!(!Arc::ptr_eq(&first, &fresh));

        container.clear_scope();
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_child_scopes_are_isolated() {
        let container = Container::new();
        container
            .register_instance(TeardownCounter::default())
            .register::<RequestLog>();

        let scope_a = container.create_scope();
        let scope_b = container.create_scope();
        let a = scope_a.resolve::<RequestLog>().unwrap();
        let b = scope_b.resolve::<RequestLog>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));

        let counter_a = scope_a.resolve::<TeardownCounter>().unwrap();
        let counter_b = scope_b.resolve::<TeardownCounter>().unwrap();
        assert!(Arc::ptr_eq(&counter_a, &counter_b));
    }

    #[test]
    fn test_circular_dependency_is_reported() {
        let container = Container::new();
        container.register::<Ping>().register::<Pong>();

        let error = container.resolve::<Ping>().err().unwrap();
        match error {
            ZephyrError::CircularDependency { cycle } => assert_eq!(cycle, "Ping -> Pong -> Ping"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_singleton_cannot_capture_scoped() {
        struct Holder;

        impl Injectable for Holder {
            fn dependencies() -> Vec<Dependency> {
                vec![Dependency::of::<RequestLog>()]
            }

            fn inject(container: &Container) -> Result<Self> {
                container.resolve::<RequestLog>()?;
                Ok(Self)
            }
        }

        let container = Container::new();
        container
            .register_instance(TeardownCounter::default())
            .register::<RequestLog>()
            .register::<Holder>();

        assert!(matches!(
            container.resolve::<Holder>(),
            Err(ZephyrError::ScopeMismatch { .. })
        ));
    }

    #[test]
    fn test_registered_lifetime_overrides_default() {
        struct Cart {
            log: Arc<RequestLog>,
        }

        impl Injectable for Cart {
            fn dependencies() -> Vec<Dependency> {
                vec![Dependency::of::<RequestLog>()]
            }

            fn inject(container: &Container) -> Result<Self> {
                Ok(Self {
                    log: container.resolve::<RequestLog>()?,
                })
            }
        }

        let container = Container::new();
        container
            .register_instance(TeardownCounter::default())
            .register::<RequestLog>()
            .register_with::<Cart>("Cart", Lifetime::Scoped);

        let cart = container.resolve::<Cart>().unwrap();
        let again = container.resolve::<Cart>().unwrap();
        assert!(Arc::ptr_eq(&cart, &again));
        assert!(Arc::ptr_eq(&cart.log, &container.resolve::<RequestLog>().unwrap()));

        container.clear_scope();
        assert!(!Arc::ptr_eq(&cart, &container.resolve::<Cart>().unwrap()));
    }

    #[test]
    fn test_dispose_tears_down_newest_first() {
        static TORN_DOWN: std::sync::Mutex<Vec<&'static str>> = std::sync::Mutex::new(Vec::new());

        struct Wheel;
        struct Engine;

        impl Injectable for Wheel {
            fn inject(_container: &Container) -> Result<Self> {
                Ok(Self)
            }

            fn teardown(&self) {
                TORN_DOWN.lock().unwrap().push("Wheel");
            }
        }

        impl Injectable for Engine {
            fn dependencies() -> Vec<Dependency> {
                vec![Dependency::of::<Wheel>()]
            }

            fn inject(container: &Container) -> Result<Self> {
                container.resolve::<Wheel>()?;
                Ok(Self)
            }

            fn teardown(&self) {
                TORN_DOWN.lock().unwrap().push("Engine");
            }
        }

        let container = Container::new();
        container.register::<Engine>().register::<Wheel>();
        container.resolve::<Engine>().unwrap();

        container.dispose();
        assert_eq!(*TORN_DOWN.lock().unwrap(), vec!["Engine", "Wheel"]);

        container.dispose();
        assert_eq!(TORN_DOWN.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_named_registration_and_trait_binding() {
        let container = Container::new();
        container
            .register_with::<Database>("primary-db", Lifetime::Singleton)
            .bind::<dyn Greeter, Database, _>(|db| db as Arc<dyn Greeter>);

        assert!(container.contains("primary-db"));
        assert!(container.contains_type::<Database>());

        let greeter = container.resolve::<dyn Greeter>().unwrap();
        assert_eq!(greeter.greet(), "hello from memory://");

        let by_name = container.resolve_named::<Database>("primary-db").unwrap();
        let by_type = container.resolve::<Database>().unwrap();
        assert!(Arc::ptr_eq(&by_name, &by_type));
    }

    #[test]
    fn test_concurrent_first_resolve_builds_one_singleton() {
        let container = Container::new();
        container.register::<Database>();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let container = container.clone();
                std::thread::spawn(move || container.resolve::<Database>().unwrap())
            })
            .collect();
        let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(instances.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    }
}
