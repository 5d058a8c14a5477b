//! Application Bootstrap
//!
//! Composes configuration, service discovery and route generation into a
//! ready-to-serve [`App`].

use super::shutdown_signal;
use crate::config::{Config, ConfigLoader, ConfigService};
use crate::controller::RouteDescriptor;
use crate::di::Container;
use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::module::{Module, ModuleFailure, discover_services};
use crate::routing::RouteGenerator;
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// A fully built application
///
/// Every service is registered and every route mounted by the time an `App`
/// exists; [`App::listen`] only starts accepting connections.
///
/// # Example
///
/// ```rust,ignore
/// use zephyr::App;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     App::builder()
///         .module(UserModule)
///         .build()
///         .await?
///         .listen()
///         .await?;
///     Ok(())
/// }
/// ```
pub struct App {
    config: Arc<Config>,
    container: Container,
    router: Router,
    routes: Vec<RouteDescriptor>,
    failures: Vec<ModuleFailure>,
}

impl App {
    /// Create a new application builder
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// The mounted routes, in generation order
    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    /// Modules skipped during discovery or route generation
    pub fn failures(&self) -> &[ModuleFailure] {
        &self.failures
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind the configured address and serve until Ctrl+C or SIGTERM
    pub async fn listen(self) -> Result<()> {
        let address = self.config.app.address();
        let listener = TcpListener::bind(&address).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on `listener` until `signal` completes, then dispose services
    pub async fn serve<F>(self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(
            address = %listener.local_addr()?,
            routes = self.routes.len(),
            "Listening"
        );

        axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(signal)
            .await?;

        self.shutdown();
        Ok(())
    }

    /// Tear down the root scope and every singleton
    pub fn shutdown(&self) {
        tracing::info!("Starting graceful shutdown...");
        self.container.dispose();
        tracing::info!("Graceful shutdown complete");
    }
}

/// Builder for [`App`]
pub struct AppBuilder {
    config: Option<Config>,
    loader: ConfigLoader,
    container: Option<Container>,
    modules: Vec<Arc<dyn Module>>,
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            loader: ConfigLoader::new(),
            container: None,
            modules: Vec::new(),
        }
    }

    /// Use this configuration instead of loading one
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn config_loader(mut self, loader: ConfigLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Start from a pre-populated container
    pub fn container(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    /// Add a module. Modules are discovered and routed in the order added.
    pub fn module(mut self, module: impl Module) -> Self {
        self.modules.push(Arc::new(module));
        self
    }

    pub fn modules(mut self, modules: impl IntoIterator<Item = Arc<dyn Module>>) -> Self {
        self.modules.extend(modules);
        self
    }

    /// Load config, register services, generate routes and build the router
    pub async fn build(self) -> Result<App> {
        let config = match self.config {
            Some(config) => config,
            None => self.loader.load().await?,
        };
        let config = Arc::new(config);

        let container = self.container.unwrap_or_default();
        let config_service = ConfigService::new(config.as_ref().clone());
        container.register_instance(config_service.clone());

        let discovery = discover_services(&container, &self.modules);
        let generated = RouteGenerator::new(&container).generate(&self.modules);

        let routes = generated.table.routes().to_vec();
        let dispatcher = Dispatcher::new(container.clone())
            .with_config(config_service)
            .with_body_limit(config.app.body_limit);
        let router = generated.table.into_router(Arc::new(dispatcher))?;

        let mut failures = discovery.failures;
        failures.extend(generated.failures);

        tracing::info!(
            modules = self.modules.len(),
            services = container.len(),
            routes = routes.len(),
            failed = failures.len(),
            "Application bootstrapped"
        );

        Ok(App {
            config,
            container,
            router,
            routes,
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{Controller, ControllerRegistration, RouteDef};
    use crate::di::{Injectable, ServiceDescriptor};
    use crate::dispatch::IntoReply;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    static DISPOSED: AtomicUsize = AtomicUsize::new(0);

    struct Health {
        config: Arc<ConfigService>,
    }

    impl Injectable for Health {
        fn dependencies() -> Vec<crate::di::Dependency> {
            vec![crate::di::Dependency::of::<ConfigService>()]
        }

        fn inject(container: &Container) -> Result<Self> {
            Ok(Self {
                config: container.resolve()?,
            })
        }

        fn teardown(&self) {
            DISPOSED.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Controller for Health {
        fn routes() -> Vec<RouteDef<Self>> {
            vec![RouteDef::new("GET", "/health", |this: Arc<Self>, _| async move {
                this.config.get().app.port.into_reply()
            })]
        }
    }

    struct HealthModule;

    impl Module for HealthModule {
        fn name(&self) -> &str {
            "HealthModule"
        }

        fn services(&self) -> Result<Vec<ServiceDescriptor>> {
            Ok(vec![ServiceDescriptor::of::<Health>()])
        }

        fn controllers(&self) -> Result<Vec<ControllerRegistration>> {
            Ok(vec![ControllerRegistration::of::<Health>()])
        }
    }

    #[tokio::test]
    async fn test_serve_and_dispose_on_shutdown() {
        let mut config = Config::default();
        config.app.port = 4000;

        let app = App::builder()
            .config(config)
            .module(HealthModule)
            .build()
            .await
            .unwrap();
        assert_eq!(app.routes().len(), 1);
        assert!(app.failures().is_empty());
        assert!(app.container().contains_type::<ConfigService>());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(app.serve(listener, async {
            stopped.await.ok();
        }));

        let mut stream = tokio::net::TcpStream::connect(address).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        assert!(raw.starts_with("HTTP/1.1 200 OK"), "{raw}");
        assert!(raw.ends_with("4000"), "{raw}");

        stop.send(()).unwrap();
        server.await.unwrap().unwrap();
        assert_eq!(DISPOSED.load(Ordering::SeqCst), 1);
    }
}
