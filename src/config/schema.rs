//! Configuration schema definitions.
//!
//! This module defines the route table file format.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::request::RequestOptions;

/// Root configuration for the router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Request decomposition flags (plus decoding, host handling).
    pub options: RequestOptions,

    /// Logging settings.
    pub observability: ObservabilityConfig,

    /// Routes registered under the global scheme.
    pub routes: Vec<RouteConfig>,

    /// Per-scheme route tables.
    pub schemes: Vec<SchemeConfig>,
}

/// Routes for one URL scheme.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchemeConfig {
    /// Scheme name, e.g. `myapp` for `myapp://...` URLs.
    pub name: String,

    /// Try the global routes when none of this scheme's routes accept.
    #[serde(default)]
    pub fallback_to_global: bool,

    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// One route entry mapping patterns to a named target.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Single pattern, e.g. `/user/:id`.
    #[serde(default)]
    pub pattern: Option<String>,

    /// Several patterns sharing the same target.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Route priority (higher = tried first).
    #[serde(default)]
    pub priority: u32,

    /// Name of the handler that receives matches.
    pub target: String,
}

impl RouteConfig {
    /// `pattern` followed by `patterns`.
    pub fn all_patterns(&self) -> impl Iterator<Item = &str> {
        self.pattern
            .iter()
            .chain(self.patterns.iter())
            .map(String::as_str)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RouterConfig::default();
        assert!(config.options.decode_plus_symbols);
        assert!(!config.options.treat_host_as_path_component);
        assert_eq!(config.observability.log_level, "info");
        assert!(config.routes.is_empty());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: RouterConfig = toml::from_str(
            r#"
            [options]
            decode_plus_symbols = false

            [observability]
            log_format = "json"

            [[routes]]
            pattern = "/help"
            target = "help"

            [[schemes]]
            name = "myapp"
            fallback_to_global = true

            [[schemes.routes]]
            patterns = ["/user/:id", "/profile/:id"]
            priority = 10
            target = "profile"
            "#,
        )
        .unwrap();

        assert!(!config.options.decode_plus_symbols);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.routes[0].pattern.as_deref(), Some("/help"));
        assert_eq!(config.schemes[0].name, "myapp");
        assert!(config.schemes[0].fallback_to_global);
        let route = &config.schemes[0].routes[0];
        assert_eq!(route.priority, 10);
        assert_eq!(route.all_patterns().collect::<Vec<_>>(), ["/user/:id", "/profile/:id"]);
    }
}
