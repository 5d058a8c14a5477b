pub mod response;

pub use response::{Response, StatusMessage, default_message};
