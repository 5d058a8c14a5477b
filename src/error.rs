use thiserror::Error;

pub type Result<T> = std::result::Result<T, ZephyrError>;

#[derive(Debug, Error)]
pub enum ZephyrError {
    #[error("Dependency not found: {name}")]
    DependencyNotFound { name: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    #[error("Scope mismatch: {message}")]
    ScopeMismatch { message: String },

    #[error("Unsupported HTTP method '{method}' for route '{route}'")]
    UnsupportedHttpMethod { method: String, route: String },

    #[error("Route conflict: {method} {path} is already registered")]
    RouteConflict { method: String, path: String },

    #[error("Invalid route {method} {path}: {reason}")]
    InvalidRoute {
        method: String,
        path: String,
        reason: String,
    },

    #[error("Failed to load module '{module}': {message}")]
    ModuleLoadFailure { module: String, message: String },

    #[error("CORS policy violation: Request not allowed")]
    CorsViolation,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ZephyrError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::DependencyNotFound { name: name.into() }
    }

    pub fn module_load(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModuleLoadFailure {
            module: module.into(),
            message: message.into(),
        }
    }
}
