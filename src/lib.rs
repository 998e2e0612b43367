//! Deep-link URL router library

pub mod config;
pub mod observability;
pub mod routing;

pub use config::schema::RouterConfig;
pub use routing::{
    handler, Handler, HandlerTable, Parameters, RouteDefinition, RouterManager, SchemeRouter,
    GLOBAL_SCHEME,
};
