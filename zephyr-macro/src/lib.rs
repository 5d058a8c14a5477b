use proc_macro::TokenStream;

mod controller;
mod injectable;
mod module;
mod routes;

/// Derive macro for making a struct injectable into the DI container
///
/// Every `Arc<T>` field is resolved from the container and reported as a
/// dependency. Other fields must be marked `#[injectable(default)]`.
///
/// Struct options: `name = "..."`, `lifetime = "singleton" | "scoped" |
/// "transient"`, `on_init` (calls `OnInit::on_init` after construction),
/// `on_destroy` (calls `OnDestroy::on_destroy` on eviction).
///
/// # Example
/// ```ignore
/// use zephyr::Injectable;
///
/// #[derive(Injectable)]
/// #[injectable(lifetime = "scoped")]
/// pub struct UserService {
///     repository: Arc<dyn UserRepository>,
///     #[injectable(default)]
///     hits: AtomicUsize,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(injectable))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    injectable::derive_injectable(input)
}

/// Attribute macro for defining a controller with automatic DI registration
///
/// The struct becomes injectable (same rules as `#[derive(Injectable)]`) and
/// `path` becomes the prefix of every route declared in its `#[routes]` block.
///
/// # Example
/// ```ignore
/// use zephyr::controller;
///
/// #[controller(path = "/users")]
/// pub struct UserController {
///     user_service: Arc<UserService>,
/// }
/// ```
#[proc_macro_attribute]
pub fn controller(attr: TokenStream, item: TokenStream) -> TokenStream {
    controller::controller_attribute(attr, item)
}

/// Attribute macro for defining routes in an impl block
///
/// Methods carrying a verb attribute become routes; every parameter after
/// `&self` needs a source attribute.
///
/// # Example
/// ```ignore
/// #[routes]
/// impl UserController {
///     #[patch("/:id")]
///     async fn update(&self, #[param] id: u64, #[body] changes: Value) -> Result<Json<User>> {
///         // ...
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn routes(attr: TokenStream, item: TokenStream) -> TokenStream {
    routes::routes_attribute(attr, item)
}

/// Attribute macro for defining a module with providers and controllers
///
/// # Example
/// ```ignore
/// use zephyr::module;
///
/// #[module(
///     controllers = [UserController],
///     providers = [UserService, InMemoryUserRepository],
///     bindings = [(dyn UserRepository => InMemoryUserRepository)],
/// )]
/// pub struct UserModule;
/// ```
#[proc_macro_attribute]
pub fn module(attr: TokenStream, item: TokenStream) -> TokenStream {
    module::module_attribute(attr, item)
}

// Verb and parameter attributes are consumed by `#[routes]`. Outside of it
// they leave the item untouched.

macro_rules! passthrough_attribute {
    ($($(#[$doc:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[proc_macro_attribute]
            pub fn $name(_attr: TokenStream, item: TokenStream) -> TokenStream {
                item
            }
        )*
    };
}

passthrough_attribute! {
    /// HTTP GET route: `#[get("/path")]`
    get,
    /// HTTP POST route: `#[post("/path")]`
    post,
    /// HTTP PUT route: `#[put("/path")]`
    put,
    /// HTTP DELETE route: `#[delete("/path")]`
    delete,
    /// HTTP PATCH route: `#[patch("/path")]`
    patch,
    /// HTTP HEAD route: `#[head("/path")]`
    head,
    /// HTTP OPTIONS route: `#[options("/path")]`
    options,
    /// HTTP TRACE route: `#[trace("/path")]`
    trace,
    /// HTTP CONNECT route: `#[connect("/path")]`
    connect,
    /// Route with an explicit verb: `#[route("PATCH", "/path")]`
    route,
    /// Path variable, named after the parameter unless given: `#[param("id")]`
    param,
    /// Query-string value: `#[query("q")]`
    query,
    /// Parsed request body
    body,
    /// Full request header map
    headers,
    /// Url-encoded or multipart text field: `#[form("name")]`
    form,
    /// Multipart part: `#[multipart("file")]`
    multipart,
    /// Service resolved from the request scope
    inject,
}
