//! # Zephyr
//!
//! A convention-based web framework with controller routing and dependency
//! injection, built on axum.
//!
//! Controllers are plain structs whose annotated methods become routes;
//! services are resolved from a container with singleton, scoped or
//! transient lifetimes; modules group both and are handed to [`App`].
//!
//! ## Features
//!
//! - **Dependency Injection**: thread-safe container, single-flight singletons,
//!   request scopes, cycle and missing-dependency detection before construction
//! - **Controller-based Routing**: `#[controller]` + `#[routes]` expand to a
//!   static route table
//! - **Parameter Sources**: `#[param]`, `#[query]`, `#[body]`, `#[headers]`,
//!   `#[form]`, `#[multipart]`, `#[inject]`
//! - **Response Mapping**: return values become 200/204 by shape, or full
//!   control through [`Response`]
//! - **Trait Object Support**: inject `Arc<dyn Trait>` through module bindings
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use zephyr::prelude::*;
//! use serde_json::{Value, json};
//!
//! #[derive(Injectable)]
//! pub struct UserService {}
//!
//! impl UserService {
//!     pub fn find(&self, id: u64) -> Option<Value> {
//!         (id == 1).then(|| json!({ "id": 1, "name": "Ann" }))
//!     }
//! }
//!
//! #[controller(path = "/users")]
//! pub struct UserController {
//!     users: Arc<UserService>,
//! }
//!
//! #[routes]
//! impl UserController {
//!     #[get("/:id")]
//!     async fn find(&self, #[param] id: u64) -> Option<Value> {
//!         self.users.find(id)
//!     }
//! }
//!
//! #[module(controllers = [UserController], providers = [UserService])]
//! pub struct AppModule;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     App::builder().module(AppModule).build().await?.listen().await?;
//!     Ok(())
//! }
//! ```

extern crate self as zephyr;

pub mod common;
pub mod config;
pub mod controller;
pub mod cors;
pub mod di;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod module;
pub mod routing;

// Re-export core types
pub use common::Response;
pub use config::{Config, ConfigLoader, ConfigService};
pub use controller::{Controller, ControllerRegistration, ParamSource, RouteDef, RouteDescriptor};
pub use cors::CorsPolicy;
pub use di::{Container, ContainerBuilder, HasContainer, Inject, Injectable, Lifetime};
pub use dispatch::{IntoReply, Reply};
pub use error::{Result, ZephyrError};
pub use lifecycle::{App, AppBuilder, OnDestroy, OnInit};
pub use module::Module;

// Re-export macros
pub use zephyr_macro::{
    Injectable, body, connect, controller, delete, form, get, head, headers, inject, module,
    multipart, options, param, patch, post, put, query, route, routes, trace,
};

// Re-export commonly used types from dependencies
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use zephyr::prelude::*;
/// ```
pub mod prelude {
    pub use crate::common::Response;
    pub use crate::config::{Config, ConfigService};
    pub use crate::controller::Controller;
    pub use crate::di::{Container, ContainerBuilder, Inject, Lifetime};
    pub use crate::dispatch::{IntoReply, Reply};
    pub use crate::error::{Result, ZephyrError};
    pub use crate::lifecycle::{App, OnDestroy, OnInit};
    pub use crate::module::Module;
    pub use crate::{
        Injectable, body, connect, controller, delete, form, get, head, headers, inject, module,
        multipart, options, param, patch, post, put, query, route, routes, trace,
    };
    pub use axum::{Json, http::StatusCode};
    pub use std::sync::Arc;
}
