use crate::modules::health::HealthModule;
use crate::modules::user::{InMemoryUserRepository, UserModule, UserRepository};
use zephyr::prelude::*;

/// Root application module
///
/// Pulls in the feature modules and binds the repository trait to its
/// in-memory implementation.
#[module(
    name = "app",
    imports = [HealthModule, UserModule],
    bindings = [(dyn UserRepository => InMemoryUserRepository)],
)]
pub struct AppModule;
