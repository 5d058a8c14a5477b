use zephyr::prelude::*;

mod audit;
mod controller;
mod model;
mod repository;
mod service;

pub use repository::{InMemoryUserRepository, UserRepository};

#[module(
    controllers = [controller::UserController],
    providers = [InMemoryUserRepository, service::UserService, audit::AuditTrail]
)]
pub struct UserModule;
