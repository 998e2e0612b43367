//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration:
//!     pattern string
//!     → pattern.rs (split optional groups, expand, compile)
//!     → segment.rs (CompiledPattern per candidate, most specific first)
//!     → definition.rs (RouteDefinition with priority + handler)
//!     → router.rs (insert into scheme list by priority)
//!
//! Dispatch:
//!     URL
//!     → request.rs (path components, query, options, extra params)
//!     → router.rs (walk scheme routes in priority order)
//!     → matcher.rs (bind variables / wildcard, merge parameters)
//!     → handler accepts (stop) or declines (next route)
//!     → global fallback, then unmatched callback
//! ```
//!
//! # Design Decisions
//! - Patterns are compiled at registration; bad patterns never reach dispatch
//! - Deterministic: same route table and URL always pick the same handler
//! - First accepting handler wins (ordered by priority, then registration)

pub mod definition;
pub mod handler;
pub mod matcher;
pub mod pattern;
pub mod request;
pub mod response;
pub mod router;
pub mod segment;

pub use definition::RouteDefinition;
pub use handler::{
    constructed, handler, weak_target, FromRouteParameters, Handler, HandlerTable, RouteTarget,
};
pub use pattern::{compile_pattern, expand_optional_patterns, PatternError, MAX_OPTIONAL_GROUPS};
pub use request::{RequestOptions, RouteRequest};
pub use response::{
    ParamValue, Parameters, RouteResponse, ROUTE_PATTERN_KEY, ROUTE_SCHEME_KEY, ROUTE_URL_KEY,
    ROUTE_WILDCARD_COMPONENTS_KEY,
};
pub use router::{RouterManager, SchemeRouter, UnmatchedHandler, GLOBAL_SCHEME};
pub use segment::{CompiledPattern, Segment};
