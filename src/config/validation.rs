//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile every pattern so malformed routes fail at load time
//! - Detect duplicate or reserved scheme names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::{RouteConfig, RouterConfig};
use crate::routing::pattern::{compile_pattern, PatternError};
use crate::routing::router::GLOBAL_SCHEME;

/// A single semantic problem in a config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("scheme #{index} has an empty name")]
    EmptySchemeName { index: usize },

    #[error("scheme `{name}` is declared more than once")]
    DuplicateScheme { name: String },

    #[error("scheme name `{name}` is reserved")]
    ReservedScheme { name: String },

    #[error("route for target `{target}` in scheme `{scheme}` has no pattern")]
    MissingPattern { scheme: String, target: String },

    #[error("route `{pattern}` in scheme `{scheme}` has an empty target")]
    EmptyTarget { scheme: String, pattern: String },

    #[error("scheme `{scheme}`: {source}")]
    InvalidPattern {
        scheme: String,
        #[source]
        source: PatternError,
    },
}

/// Check `config`, collecting every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_routes(GLOBAL_SCHEME, &config.routes, &mut errors);

    let mut seen = HashSet::new();
    for (index, scheme) in config.schemes.iter().enumerate() {
        let name = scheme.name.trim().to_ascii_lowercase();
        if name.is_empty() {
            errors.push(ValidationError::EmptySchemeName { index });
        } else if name == GLOBAL_SCHEME {
            errors.push(ValidationError::ReservedScheme {
                name: scheme.name.clone(),
            });
        } else if !seen.insert(name) {
            errors.push(ValidationError::DuplicateScheme {
                name: scheme.name.clone(),
            });
        }
        validate_routes(&scheme.name, &scheme.routes, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        for error in &errors {
            tracing::warn!(%error, "Invalid route configuration");
        }
        Err(errors)
    }
}

fn validate_routes(scheme: &str, routes: &[RouteConfig], errors: &mut Vec<ValidationError>) {
    for route in routes {
        let mut any_pattern = false;
        for pattern in route.all_patterns() {
            any_pattern = true;
            if route.target.trim().is_empty() {
                errors.push(ValidationError::EmptyTarget {
                    scheme: scheme.to_string(),
                    pattern: pattern.to_string(),
                });
            }
            if let Err(source) = compile_pattern(pattern) {
                errors.push(ValidationError::InvalidPattern {
                    scheme: scheme.to_string(),
                    source,
                });
            }
        }
        if !any_pattern {
            errors.push(ValidationError::MissingPattern {
                scheme: scheme.to_string(),
                target: route.target.clone(),
            });
        }
    }
}
