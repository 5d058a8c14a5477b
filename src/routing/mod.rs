//! Route generation from modules, and the route table handed to the router.

mod generator;
mod table;

pub use generator::{GeneratedRoutes, RouteGenerator};
pub use table::RouteTable;
