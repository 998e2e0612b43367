//! Registered route: pattern, priority and handler.

use std::fmt;

use crate::routing::handler::Handler;
use crate::routing::matcher;
use crate::routing::pattern::{compile_pattern, PatternError};
use crate::routing::request::RouteRequest;
use crate::routing::response::{Parameters, RouteResponse};
use crate::routing::segment::CompiledPattern;

/// A route as stored by a scheme router.
///
/// Equality is structural (scheme, pattern, priority), so registering the same
/// route twice is detectable even though handlers cannot be compared.
#[derive(Clone)]
pub struct RouteDefinition {
    scheme: String,
    pattern: String,
    priority: u32,
    compiled: Vec<CompiledPattern>,
    handler: Option<Handler>,
}

impl RouteDefinition {
    /// Compile `pattern`. Fails on malformed optional groups.
    ///
    /// A definition without a handler accepts every match.
    pub fn new(
        pattern: impl Into<String>,
        priority: u32,
        handler: Option<Handler>,
    ) -> Result<Self, PatternError> {
        let pattern = pattern.into();
        let compiled = compile_pattern(&pattern)?;
        Ok(Self {
            scheme: String::new(),
            pattern,
            priority,
            compiled,
            handler,
        })
    }

    /// Scheme this route was registered under; empty until registered.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Pattern as written at registration.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Concrete patterns, most specific first.
    pub fn compiled_patterns(&self) -> &[CompiledPattern] {
        &self.compiled
    }

    pub(crate) fn register_for_scheme(&mut self, scheme: &str) {
        self.scheme = scheme.to_string();
    }

    /// First concrete pattern that matches `request`, as a response.
    pub fn route_response(&self, request: &RouteRequest) -> RouteResponse {
        self.compiled
            .iter()
            .map(|pattern| matcher::route_response(pattern, &self.scheme, request))
            .find(RouteResponse::is_match)
            .unwrap_or_else(RouteResponse::invalid)
    }

    /// Run the handler. `true` means the URL was accepted.
    pub fn call_handler(&self, parameters: &Parameters) -> bool {
        match &self.handler {
            Some(handler) => handler(parameters),
            None => true,
        }
    }
}

impl PartialEq for RouteDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme
            && self.pattern == other.pattern
            && self.priority == other.priority
    }
}

impl Eq for RouteDefinition {}

impl fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("scheme", &self.scheme)
            .field("pattern", &self.pattern)
            .field("priority", &self.priority)
            .field("compiled", &self.compiled.len())
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl fmt::Display for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (priority {})", self.pattern, self.priority)
    }
}
