use crate::common::Response;
use crate::controller::RouteDescriptor;
use crate::config::ConfigService;
use crate::di::Container;
use crate::dispatch::{Args, Reply, RequestContext};
use crate::error::ZephyrError;
use axum::{
    extract::Request,
    http::{StatusCode, header::ORIGIN},
    response::IntoResponse,
};
use tracing::Instrument;
use uuid::Uuid;

/// Default cap on buffered request bodies (2 MiB)
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Bridges the HTTP layer and bound controller methods
///
/// Every request runs CORS check, argument extraction, invocation and
/// response mapping in sequence. Any failure becomes a structured 500.
#[derive(Clone)]
pub struct Dispatcher {
    container: Container,
    config: ConfigService,
    body_limit: usize,
}

impl Dispatcher {
    pub fn new(container: Container) -> Self {
        Self {
            container,
            config: ConfigService::default(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Read the CORS policy from `config` on every request, so a reload
    /// takes effect without rebuilding the router
    pub fn with_config(mut self, config: ConfigService) -> Self {
        self.config = config;
        self
    }

    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn config(&self) -> &ConfigService {
        &self.config
    }

    /// Answer a CORS preflight for a path with no `OPTIONS` handler of its own
    pub async fn preflight(&self, request: Request) -> axum::response::Response {
        let config = self.config.get();
        let Some(cors) = &config.cors else {
            return StatusCode::METHOD_NOT_ALLOWED.into_response();
        };
        if !cors.allows(request.method(), request.headers()) {
            tracing::warn!(origin = ?request.headers().get(ORIGIN), "Preflight refused by CORS policy");
            return Response::error(StatusCode::FORBIDDEN, ZephyrError::CorsViolation.to_string())
                .into_response();
        }

        let mut response = Response::new(StatusCode::NO_CONTENT).into_response();
        if let Some(origin) = request.headers().get(ORIGIN) {
            cors.decorate(origin, request.method(), response.headers_mut());
        }
        response
    }

    /// Handle one HTTP request for `route`
    pub async fn handle(&self, route: &RouteDescriptor, request: Request) -> axum::response::Response {
        let span = tracing::debug_span!(
            "request",
            request_id = %Uuid::new_v4(),
            method = %route.method,
            path = %route.path,
        );

        async move {
            let method = request.method().clone();
            let origin = request.headers().get(ORIGIN).cloned();
            let config = self.config.get();

            if let Some(cors) = &config.cors {
                if !cors.allows(&method, request.headers()) {
                    tracing::warn!(origin = ?origin, "Request refused by CORS policy");
                    return Response::error(StatusCode::FORBIDDEN, ZephyrError::CorsViolation.to_string())
                        .into_response();
                }
            }

            let response = match RequestContext::from_request(request, self.body_limit).await {
                Ok(context) => self.dispatch(route, &context).await,
                Err(error) => {
                    tracing::error!(error = %error, "Failed to read request");
                    Response::from_error(&error)
                }
            };

            let mut response = response.into_response();
            if let (Some(cors), Some(origin)) = (&config.cors, origin) {
                cors.decorate(&origin, &method, response.headers_mut());
            }
            response
        }
        .instrument(span)
        .await
    }

    /// Extract, invoke and map, for an already buffered request
    pub async fn dispatch(&self, route: &RouteDescriptor, context: &RequestContext) -> Response {
        let scope = route.needs_scope().then(|| self.container.create_scope());
        let container = scope.as_ref().unwrap_or(&self.container);

        let outcome = self.invoke(route, context, container).await;
        if let Some(scope) = &scope {
            scope.clear_scope();
        }

        match outcome {
            Ok(reply) => {
                let response = reply.into_structured();
                tracing::debug!(status = %response.status, "Request handled");
                response
            }
            Err(error) => {
                tracing::error!(
                    error = %error,
                    handler = %route.handler_name,
                    controller = %route.controller,
                    "Handler failed"
                );
                Response::from_error(&error)
            }
        }
    }

    async fn invoke(
        &self,
        route: &RouteDescriptor,
        context: &RequestContext,
        container: &Container,
    ) -> anyhow::Result<Reply> {
        let args = Args::extract(&route.params, context, container).await?;
        route.call(args).await
    }
}
