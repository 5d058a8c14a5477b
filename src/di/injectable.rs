use crate::di::{Container, Lifetime};
use crate::error::Result;
use std::any::TypeId;
use std::borrow::Cow;

/// Trait for types that can be constructed by the DI container
///
/// This trait is typically implemented automatically via `#[derive(Injectable)]`
/// (or `#[controller]`), which resolves every `Arc<T>` field from the container
/// and reports the same fields from [`Injectable::dependencies`].
///
/// # Example
/// ```
/// use zephyr::Injectable;
/// use std::sync::Arc;
///
/// #[derive(Injectable)]
/// pub struct UserRepository {}
///
/// #[derive(Injectable)]
/// #[injectable(lifetime = "transient")]
/// pub struct UserService {
///     repository: Arc<UserRepository>,
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Name the service is registered under. Defaults to the bare type name.
    fn service_name() -> Cow<'static, str> {
        Cow::Borrowed(short_type_name(std::any::type_name::<Self>()))
    }

    /// Lifetime used when the service is registered without an explicit one.
    fn lifetime() -> Lifetime {
        Lifetime::Singleton
    }

    /// Dependencies resolved by [`Injectable::inject`], in declaration order.
    ///
    /// The container walks this list before constructing anything, so it must
    /// name every service `inject` resolves.
    fn dependencies() -> Vec<Dependency> {
        Vec::new()
    }

    /// Create an instance by resolving dependencies from the container
    ///
    /// # Errors
    /// Returns an error if any required dependency is not found in the container.
    fn inject(container: &Container) -> Result<Self>;

    /// Runs once after construction, before the instance is handed out.
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Runs when a cached instance is evicted (scope cleared, container disposed).
    fn teardown(&self) {}
}

/// A declared dependency: the type a constructor asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dependency {
    type_id: TypeId,
    type_name: &'static str,
}

impl Dependency {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Name used when the type was never registered under an alias.
    pub fn default_name(&self) -> &'static str {
        short_type_name(self.type_name)
    }
}

/// Strips module paths, generics and `dyn` from a type name.
///
/// `my_app::users::UserService` becomes `UserService`,
/// `dyn my_app::Repo + Send + Sync` becomes `Repo`.
pub fn short_type_name(full: &str) -> &str {
    let trimmed = full.strip_prefix("dyn ").unwrap_or(full);
    let end = trimmed
        .find(|c: char| c == '<' || c == ' ')
        .unwrap_or(trimmed.len());
    let head = &trimmed[..end];
    head.rsplit("::").next().unwrap_or(head)
}
