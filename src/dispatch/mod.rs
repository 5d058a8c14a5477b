//! Per-request adapter between the HTTP layer and controller methods.

mod args;
mod context;
mod dispatcher;
mod reply;

pub use args::{Arg, ArgError, ArgRejection, Args, FromArg};
pub use context::{Part, RequestContext};
pub use dispatcher::{DEFAULT_BODY_LIMIT, Dispatcher};
pub use reply::{IntoReply, Reply};
