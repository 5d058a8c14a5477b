//! Dependency injection: descriptors, lifetimes and the container.

mod builder;
mod cache;
mod container;
mod descriptor;
mod extractor;
mod injectable;
mod lifetime;

pub use builder::ContainerBuilder;
pub use container::Container;
pub use descriptor::{Instance, ServiceDescriptor};
pub use extractor::{HasContainer, Inject};
pub use injectable::{Dependency, Injectable, short_type_name};
pub use lifetime::Lifetime;
