use axum::Router;

/// A service module that contributes HTTP routes.
///
/// The binary entry point collects every module and merges its routes
/// into a single Router.
pub trait Module: Send + Sync {
    /// Module name, used for logging.
    fn name(&self) -> &str;

    /// Return the module's routes. Paths are absolute; the module owns its
    /// URL space.
    fn routes(&self) -> Router;
}
