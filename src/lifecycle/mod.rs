//! Application bootstrap and lifecycle hooks
//!
//! # Lifecycle Phases
//!
//! ```text
//! 1. Configuration Loading
//!    ↓
//! 2. Service Discovery (module providers registered)
//!    ↓
//! 3. Route Generation (controllers instantiated, OnInit)
//!    ↓
//! 4. Server Start
//!    ↓
//! [Running...]  request scopes cleared per request (OnDestroy)
//!    ↓
//! 5. Shutdown Signal (SIGTERM/SIGINT)
//!    ↓
//! 6. Singletons disposed (OnDestroy)
//! ```

mod application;
mod shutdown;
mod traits;

pub use application::{App, AppBuilder};
pub use shutdown::shutdown_signal;
pub use traits::{OnDestroy, OnInit};
