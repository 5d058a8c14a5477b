use crate::di::Container;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use std::sync::Arc;

/// A service resolved from the container
///
/// In controller methods, mark the parameter with `#[inject]` and the service
/// is resolved from the request scope. In hand-written axum handlers it works
/// as an extractor for any state implementing [`HasContainer`].
///
/// # Example
/// ```
/// use zephyr::{Container, Inject};
/// use axum::{Router, routing::get};
///
/// struct Greeting(&'static str);
///
/// async fn hello(Inject(greeting): Inject<Greeting>) -> &'static str {
///     greeting.0
/// }
///
/// let container = Container::new();
/// container.register_instance(Greeting("hi"));
/// let app: Router = Router::new().route("/hello", get(hello)).with_state(container);
/// ```
pub struct Inject<T: ?Sized>(pub Arc<T>);

/// Trait that router state must implement to provide the DI container
pub trait HasContainer {
    fn get_container(&self) -> &Container;
}

impl HasContainer for Container {
    fn get_container(&self) -> &Container {
        self
    }
}

impl<S, T> FromRequestParts<S> for Inject<T>
where
    S: Send + Sync + HasContainer,
    T: ?Sized + Send + Sync + 'static,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        state.get_container().resolve::<T>().map(Inject).map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Dependency injection failed: {}", e),
            )
        })
    }
}

impl<T: ?Sized> std::ops::Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: ?Sized> Clone for Inject<T> {
    fn clone(&self) -> Self {
        Inject(Arc::clone(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    struct Greeting(&'static str);

    async fn hello(Inject(greeting): Inject<Greeting>) -> &'static str {
        greeting.0
    }

    #[tokio::test]
    async fn test_inject_extractor_resolves_from_state() {
        let container = Container::new();
        container.register_instance(Greeting("hi"));
        let app = Router::new().route("/hello", get(hello)).with_state(container);

        let response = app
            .oneshot(Request::builder().uri("/hello").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_inject_extractor_missing_service_is_500() {
        let app = Router::new()
            .route("/hello", get(hello))
            .with_state(Container::new());

        let response = app
            .oneshot(Request::builder().uri("/hello").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
