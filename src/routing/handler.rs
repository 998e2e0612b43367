//! Route handlers and helpers for building them from application objects.
//!
//! A handler receives the match parameters and returns `true` to accept the
//! URL or `false` to decline it, letting dispatch try the next route.

use std::collections::HashMap;
use std::sync::Arc;

use crate::routing::response::Parameters;

/// Callback invoked for an accepted match.
pub type Handler = Arc<dyn Fn(&Parameters) -> bool + Send + Sync>;

/// Handlers by target name, used to bind configured routes.
pub type HandlerTable = HashMap<String, Handler>;

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&Parameters) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// An object that can handle a matched route.
pub trait RouteTarget: Send + Sync {
    fn handle_route(&self, parameters: &Parameters) -> bool;
}

/// A type that can be built from match parameters.
pub trait FromRouteParameters: Sized {
    /// `None` declines the route.
    fn from_route_parameters(parameters: &Parameters) -> Option<Self>;
}

/// Handler that forwards to `target` without keeping it alive.
///
/// Once the last strong reference is dropped the handler declines every
/// match; the route itself stays registered until removed.
pub fn weak_target<T>(target: &Arc<T>) -> Handler
where
    T: RouteTarget + ?Sized + 'static,
{
    let weak = Arc::downgrade(target);
    Arc::new(move |parameters: &Parameters| match weak.upgrade() {
        Some(target) => target.handle_route(parameters),
        None => {
            tracing::debug!(
                pattern = parameters.pattern().unwrap_or_default(),
                "Route target dropped, declining"
            );
            false
        }
    })
}

/// Handler that builds a `T` from the parameters and passes it to `completion`.
///
/// The router does not own the built value; `completion` decides what to do with it.
pub fn constructed<T, F>(completion: F) -> Handler
where
    T: FromRouteParameters + 'static,
    F: Fn(T) -> bool + Send + Sync + 'static,
{
    Arc::new(move |parameters: &Parameters| {
        match T::from_route_parameters(parameters) {
            Some(created) => completion(created),
            None => false,
        }
    })
}
