//! Lifecycle hook traits
//!
//! Implement these and opt in with `#[injectable(on_init)]` or
//! `#[injectable(on_destroy)]`; the derive wires them into the container.

use crate::error::Result;

/// Called once after the container has constructed the service
///
/// An error aborts the resolve that triggered construction; nothing is cached.
///
/// # Example
///
/// ```rust
/// use zephyr::{Injectable, OnInit, Result};
///
/// #[derive(Injectable)]
/// #[injectable(on_init)]
/// pub struct CacheWarmer {}
///
/// impl OnInit for CacheWarmer {
///     fn on_init(&self) -> Result<()> {
///         tracing::info!("Warming cache");
///         Ok(())
///     }
/// }
/// ```
pub trait OnInit: Send + Sync {
    fn on_init(&self) -> Result<()>;
}

/// Called when a cached instance is evicted
///
/// Scoped services see this when their scope is cleared (for request scopes,
/// when the request completes); singletons at application shutdown.
pub trait OnDestroy: Send + Sync {
    fn on_destroy(&self);
}
