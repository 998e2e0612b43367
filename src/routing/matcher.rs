//! Route matching logic.
//!
//! # Responsibilities
//! - Line up a compiled pattern against request path components
//! - Bind variables and capture trailing wildcard components
//! - Assemble the parameter map for a successful match
//!
//! # Design Decisions
//! - Literal matching is case-sensitive
//! - Without a wildcard the component counts must be equal (no partial matches)
//! - First mismatching segment short-circuits
//! - Parameter precedence: reserved keys > variables > query > additional

use crate::routing::request::{decode_component, RouteRequest};
use crate::routing::response::{
    Parameters, RouteResponse, ROUTE_PATTERN_KEY, ROUTE_SCHEME_KEY, ROUTE_URL_KEY,
    ROUTE_WILDCARD_COMPONENTS_KEY,
};
use crate::routing::segment::{CompiledPattern, Segment};

/// Structural result of a match, before parameters are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternMatch {
    /// Bound variables in pattern order.
    pub variables: Vec<(String, String)>,
    /// Components captured by a trailing wildcard.
    pub wildcard: Vec<String>,
}

/// Match `pattern` against the request path. `None` on the first mismatch.
pub fn bind(pattern: &CompiledPattern, request: &RouteRequest) -> Option<PatternMatch> {
    let components = request.path_components();
    let fixed = pattern.fixed_segments();

    if pattern.has_wildcard() {
        if fixed.len() > components.len() {
            return None;
        }
    } else if fixed.len() != components.len() {
        return None;
    }

    let decode_plus = request.options().decode_plus_symbols;
    let mut matched = PatternMatch::default();

    for (segment, component) in fixed.iter().zip(components) {
        match segment {
            Segment::Literal(text) => {
                if !literal_matches(text, component) {
                    return None;
                }
            }
            Segment::Variable { name, decode } => {
                let value = if *decode {
                    decode_component(component, decode_plus)
                } else {
                    component.clone()
                };
                matched.variables.push((name.clone(), value));
            }
            // Never part of the fixed prefix.
            Segment::Wildcard => return None,
        }
    }

    if pattern.has_wildcard() {
        matched.wildcard = components[fixed.len()..].to_vec();
    }
    Some(matched)
}

/// Match `pattern` and, on success, build the full parameter map.
pub fn route_response(
    pattern: &CompiledPattern,
    scheme: &str,
    request: &RouteRequest,
) -> RouteResponse {
    let Some(matched) = bind(pattern, request) else {
        return RouteResponse::invalid();
    };

    let mut params = request.additional_params().clone();
    params.overlay(request.query_params());
    for (name, value) in matched.variables {
        params.insert(name, value);
    }
    if !matched.wildcard.is_empty() {
        params.insert(ROUTE_WILDCARD_COMPONENTS_KEY, matched.wildcard);
    }
    params.overlay(&default_parameters(pattern, scheme, request));

    RouteResponse::matched(params)
}

fn default_parameters(
    pattern: &CompiledPattern,
    scheme: &str,
    request: &RouteRequest,
) -> Parameters {
    Parameters::new()
        .with(ROUTE_PATTERN_KEY, pattern.as_str())
        .with(ROUTE_URL_KEY, request.source_url())
        .with(ROUTE_SCHEME_KEY, scheme)
}

fn literal_matches(text: &str, component: &str) -> bool {
    text == component || (component.contains('%') && text == decode_component(component, false))
}
