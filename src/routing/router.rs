//! Route registry and dispatch.
//!
//! # Responsibilities
//! - Own one priority-ordered route list per scheme
//! - Hand out per-scheme router handles
//! - Dispatch URLs: first accepting handler wins, declines fall through
//! - Fall back to the global scheme and report unmatched URLs
//!
//! # Design Decisions
//! - One mutex guards the whole table; readers take a snapshot of `Arc`s
//! - Handlers run with no lock held, so they may re-enter the router
//! - Equal priorities keep registration order
//! - Request options live in an `ArcSwap` and are read lock-free per dispatch

use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

use crate::config::loader::ConfigError;
use crate::config::schema::{RouteConfig, RouterConfig};
use crate::config::validation::validate_config;
use crate::observability::metrics;
use crate::routing::definition::RouteDefinition;
use crate::routing::handler::{Handler, HandlerTable};
use crate::routing::pattern::PatternError;
use crate::routing::request::{RequestOptions, RouteRequest};
use crate::routing::response::Parameters;

/// Name of the scheme that is always present and used as the fallback.
pub const GLOBAL_SCHEME: &str = "__global__";

/// Called when no route accepted a URL: router, URL, caller parameters.
pub type UnmatchedHandler = Arc<dyn Fn(&SchemeRouter, &str, &Parameters) + Send + Sync>;

#[derive(Default)]
struct SchemeEntry {
    routes: Vec<Arc<RouteDefinition>>,
    fallback_to_global: bool,
    unmatched: Option<UnmatchedHandler>,
}

struct Shared {
    table: Mutex<HashMap<String, SchemeEntry>>,
    options: ArcSwap<RequestOptions>,
}

impl Shared {
    /// Every mutation is a single `Vec`/`HashMap` call, so a poisoned table is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, SchemeEntry>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn routes_of(&self, scheme: &str) -> Vec<Arc<RouteDefinition>> {
        self.lock()
            .get(scheme)
            .map(|entry| entry.routes.clone())
            .unwrap_or_default()
    }
}

fn normalize_scheme(scheme: &str) -> String {
    scheme.to_ascii_lowercase()
}

/// Owner of every scheme's routes and of the request options.
///
/// Cloning is cheap and yields a handle to the same registry.
#[derive(Clone)]
pub struct RouterManager {
    shared: Arc<Shared>,
}

impl RouterManager {
    pub fn new() -> Self {
        Self::with_options(RequestOptions::default())
    }

    pub fn with_options(options: RequestOptions) -> Self {
        let mut table = HashMap::new();
        table.insert(GLOBAL_SCHEME.to_string(), SchemeEntry::default());
        Self {
            shared: Arc::new(Shared {
                table: Mutex::new(table),
                options: ArcSwap::from_pointee(options),
            }),
        }
    }

    /// Build a manager from a validated config, resolving targets through `handlers`.
    pub fn from_config(
        config: &RouterConfig,
        handlers: &HandlerTable,
    ) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let manager = Self::with_options(config.options);
        let global = manager.global_routes();
        for definition in build_definitions(GLOBAL_SCHEME, &config.routes, handlers)? {
            global.add_route(definition);
        }

        for scheme in &config.schemes {
            let definitions = build_definitions(&scheme.name, &scheme.routes, handlers)?;
            let router = manager.routes_for_scheme(&scheme.name);
            router.set_fallback_to_global(scheme.fallback_to_global);
            for definition in definitions {
                router.add_route(definition);
            }
        }

        tracing::info!(
            schemes = config.schemes.len(),
            routes = manager.all_routes().values().map(Vec::len).sum::<usize>(),
            "Route table loaded"
        );
        Ok(manager)
    }

    pub fn options(&self) -> RequestOptions {
        **self.shared.options.load()
    }

    pub fn set_options(&self, options: RequestOptions) {
        self.shared.options.store(Arc::new(options));
    }

    pub fn set_decode_plus_symbols(&self, enabled: bool) {
        self.shared.options.rcu(|current| {
            Arc::new(RequestOptions {
                decode_plus_symbols: enabled,
                ..**current
            })
        });
    }

    pub fn set_treat_host_as_path_component(&self, enabled: bool) {
        self.shared.options.rcu(|current| {
            Arc::new(RequestOptions {
                treat_host_as_path_component: enabled,
                ..**current
            })
        });
    }

    /// Router for the global scheme.
    pub fn global_routes(&self) -> SchemeRouter {
        self.routes_for_scheme(GLOBAL_SCHEME)
    }

    /// Router for `scheme`, creating the scheme on first use.
    pub fn routes_for_scheme(&self, scheme: &str) -> SchemeRouter {
        let scheme = normalize_scheme(scheme);
        self.shared.lock().entry(scheme.clone()).or_default();
        SchemeRouter {
            shared: self.shared.clone(),
            scheme,
        }
    }

    pub fn has_scheme(&self, scheme: &str) -> bool {
        self.shared.lock().contains_key(&normalize_scheme(scheme))
    }

    /// Drop a scheme with its routes and settings. The global scheme is reset instead.
    pub fn unregister_scheme(&self, scheme: &str) {
        let scheme = normalize_scheme(scheme);
        let mut table = self.shared.lock();
        if scheme == GLOBAL_SCHEME {
            table.insert(scheme.clone(), SchemeEntry::default());
        } else {
            table.remove(&scheme);
        }
        drop(table);
        tracing::debug!(scheme = %scheme, "Scheme unregistered");
    }

    /// Drop every scheme, leaving an empty global scheme.
    pub fn unregister_all_schemes(&self) {
        let mut table = self.shared.lock();
        table.clear();
        table.insert(GLOBAL_SCHEME.to_string(), SchemeEntry::default());
        drop(table);
        tracing::debug!("All schemes unregistered");
    }

    /// Snapshot of every scheme's routes, in priority order.
    pub fn all_routes(&self) -> HashMap<String, Vec<Arc<RouteDefinition>>> {
        self.shared
            .lock()
            .iter()
            .map(|(scheme, entry)| (scheme.clone(), entry.routes.clone()))
            .collect()
    }

    /// Router for the URL's scheme if registered, otherwise the global router.
    pub fn router_for_url(&self, url: &str) -> SchemeRouter {
        let scheme = Url::parse(url)
            .ok()
            .map(|parsed| normalize_scheme(parsed.scheme()))
            .filter(|scheme| self.has_scheme(scheme))
            .unwrap_or_else(|| GLOBAL_SCHEME.to_string());
        SchemeRouter {
            shared: self.shared.clone(),
            scheme,
        }
    }

    pub fn route_url(&self, url: &str) -> bool {
        self.router_for_url(url).route_url(url)
    }

    pub fn route_url_with_parameters(&self, url: &str, parameters: Parameters) -> bool {
        self.router_for_url(url).route_url_with_parameters(url, parameters)
    }

    pub fn can_route_url(&self, url: &str) -> bool {
        self.router_for_url(url).can_route_url(url)
    }

    pub fn can_route_url_with_parameters(&self, url: &str, parameters: Parameters) -> bool {
        self.router_for_url(url).can_route_url_with_parameters(url, parameters)
    }
}

impl Default for RouterManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RouterManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.shared.lock();
        let mut schemes: Vec<&String> = table.keys().collect();
        schemes.sort();
        f.debug_struct("RouterManager")
            .field("schemes", &schemes)
            .field("options", &self.options())
            .finish()
    }
}

fn build_definitions(
    scheme: &str,
    routes: &[RouteConfig],
    handlers: &HandlerTable,
) -> Result<Vec<RouteDefinition>, ConfigError> {
    let mut definitions = Vec::new();
    for route in routes {
        let handler = handlers
            .get(&route.target)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownTarget {
                scheme: scheme.to_string(),
                target: route.target.clone(),
            })?;
        for pattern in route.all_patterns() {
            definitions.push(RouteDefinition::new(
                pattern,
                route.priority,
                Some(handler.clone()),
            )?);
        }
    }
    Ok(definitions)
}

/// Handle to one scheme's routes.
#[derive(Clone)]
pub struct SchemeRouter {
    shared: Arc<Shared>,
    scheme: String,
}

impl SchemeRouter {
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn is_global(&self) -> bool {
        self.scheme == GLOBAL_SCHEME
    }

    /// Insert after every route of higher or equal priority.
    pub fn add_route(&self, mut definition: RouteDefinition) -> Arc<RouteDefinition> {
        definition.register_for_scheme(&self.scheme);
        let definition = Arc::new(definition);

        let count = {
            let mut table = self.shared.lock();
            let routes = &mut table.entry(self.scheme.clone()).or_default().routes;
            let index = routes
                .iter()
                .position(|existing| existing.priority() < definition.priority())
                .unwrap_or(routes.len());
            routes.insert(index, definition.clone());
            routes.len()
        };

        tracing::debug!(
            scheme = %self.scheme,
            pattern = definition.pattern(),
            priority = definition.priority(),
            "Route registered"
        );
        metrics::record_route_count(&self.scheme, count);
        definition
    }

    /// Register `pattern` with priority 0.
    pub fn add(
        &self,
        pattern: &str,
        handler: Handler,
    ) -> Result<Arc<RouteDefinition>, PatternError> {
        self.add_with_priority(pattern, 0, handler)
    }

    pub fn add_with_priority(
        &self,
        pattern: &str,
        priority: u32,
        handler: Handler,
    ) -> Result<Arc<RouteDefinition>, PatternError> {
        let definition = RouteDefinition::new(pattern, priority, Some(handler))?;
        Ok(self.add_route(definition))
    }

    /// Register one handler under several patterns. Nothing is registered if any pattern fails.
    pub fn add_routes<I, S>(
        &self,
        patterns: I,
        handler: Handler,
    ) -> Result<Vec<Arc<RouteDefinition>>, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let definitions = patterns
            .into_iter()
            .map(|pattern| RouteDefinition::new(pattern.as_ref(), 0, Some(handler.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(definitions
            .into_iter()
            .map(|definition| self.add_route(definition))
            .collect())
    }

    /// Add `pattern` when a handler is given, otherwise remove the first route with that pattern.
    pub fn set_route(&self, pattern: &str, handler: Option<Handler>) -> Result<(), PatternError> {
        match handler {
            Some(handler) => {
                self.add(pattern, handler)?;
            }
            None => {
                self.remove_route_with_pattern(pattern);
            }
        }
        Ok(())
    }

    /// Remove the first route structurally equal to `definition`.
    ///
    /// An unregistered definition (from [`RouteDefinition::new`]) is compared as if it
    /// belonged to this router's scheme.
    pub fn remove_route(&self, definition: &RouteDefinition) -> bool {
        self.remove_first(|existing| self.is_same_route(existing, definition))
    }

    /// Remove the first route registered with exactly `pattern`.
    pub fn remove_route_with_pattern(&self, pattern: &str) -> bool {
        self.remove_first(|existing| existing.pattern() == pattern)
    }

    fn remove_first(&self, predicate: impl Fn(&RouteDefinition) -> bool) -> bool {
        let removed = {
            let mut table = self.shared.lock();
            match table.get_mut(&self.scheme) {
                Some(entry) => match entry.routes.iter().position(|r| predicate(r)) {
                    Some(index) => Some((entry.routes.remove(index), entry.routes.len())),
                    None => None,
                },
                None => None,
            }
        };

        match removed {
            Some((definition, count)) => {
                tracing::debug!(
                    scheme = %self.scheme,
                    pattern = definition.pattern(),
                    "Route removed"
                );
                metrics::record_route_count(&self.scheme, count);
                true
            }
            None => false,
        }
    }

    pub fn remove_all_routes(&self) {
        if let Some(entry) = self.shared.lock().get_mut(&self.scheme) {
            entry.routes.clear();
        }
        metrics::record_route_count(&self.scheme, 0);
    }

    /// Snapshot of this scheme's routes in the order they are tried.
    pub fn routes(&self) -> Vec<Arc<RouteDefinition>> {
        self.shared.routes_of(&self.scheme)
    }

    pub fn contains_route(&self, definition: &RouteDefinition) -> bool {
        self.shared
            .lock()
            .get(&self.scheme)
            .is_some_and(|entry| {
                entry
                    .routes
                    .iter()
                    .any(|existing| self.is_same_route(existing, definition))
            })
    }

    fn is_same_route(&self, existing: &RouteDefinition, definition: &RouteDefinition) -> bool {
        let scheme = match definition.scheme() {
            "" => self.scheme.as_str(),
            scheme => scheme,
        };
        existing.scheme() == scheme
            && existing.pattern() == definition.pattern()
            && existing.priority() == definition.priority()
    }

    pub fn fallback_to_global(&self) -> bool {
        self.shared
            .lock()
            .get(&self.scheme)
            .is_some_and(|entry| entry.fallback_to_global)
    }

    /// Try the global routes when none of this scheme's routes accept a URL.
    pub fn set_fallback_to_global(&self, enabled: bool) {
        self.shared
            .lock()
            .entry(self.scheme.clone())
            .or_default()
            .fallback_to_global = enabled;
    }

    pub fn set_unmatched_handler<F>(&self, handler: F)
    where
        F: Fn(&SchemeRouter, &str, &Parameters) + Send + Sync + 'static,
    {
        self.shared
            .lock()
            .entry(self.scheme.clone())
            .or_default()
            .unmatched = Some(Arc::new(handler));
    }

    pub fn clear_unmatched_handler(&self) {
        if let Some(entry) = self.shared.lock().get_mut(&self.scheme) {
            entry.unmatched = None;
        }
    }

    /// Whether some route would match `url`. Handlers are not called.
    pub fn can_route_url(&self, url: &str) -> bool {
        self.dispatch(url, Parameters::new(), false)
    }

    pub fn can_route_url_with_parameters(&self, url: &str, parameters: Parameters) -> bool {
        self.dispatch(url, parameters, false)
    }

    /// Route `url`; `true` if some handler accepted it.
    pub fn route_url(&self, url: &str) -> bool {
        self.dispatch(url, Parameters::new(), true)
    }

    pub fn route_url_with_parameters(&self, url: &str, parameters: Parameters) -> bool {
        self.dispatch(url, parameters, true)
    }

    fn dispatch(&self, url: &str, parameters: Parameters, execute: bool) -> bool {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(error) => {
                tracing::debug!(scheme = %self.scheme, url, %error, "Ignoring unparseable URL");
                if execute {
                    metrics::record_dispatch(&self.scheme, "invalid_url");
                }
                return false;
            }
        };
        let request = RouteRequest::new(url, parsed, **self.shared.options.load(), parameters);

        let (routes, fallback, unmatched) = {
            let table = self.shared.lock();
            match table.get(&self.scheme) {
                Some(entry) => (
                    entry.routes.clone(),
                    entry.fallback_to_global,
                    entry.unmatched.clone(),
                ),
                None => (Vec::new(), false, None),
            }
        };

        let mut handled = walk(&routes, &request, execute);
        if !handled && fallback && !self.is_global() {
            tracing::debug!(scheme = %self.scheme, url, "Falling back to global routes");
            handled = walk(&self.shared.routes_of(GLOBAL_SCHEME), &request, execute);
        }

        if execute {
            if handled {
                metrics::record_dispatch(&self.scheme, "handled");
            } else {
                tracing::debug!(scheme = %self.scheme, url, "No route handled URL");
                metrics::record_dispatch(&self.scheme, "unmatched");
                if let Some(unmatched) = unmatched {
                    unmatched(self, url, request.additional_params());
                }
            }
        }
        handled
    }
}

impl fmt::Debug for SchemeRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemeRouter")
            .field("scheme", &self.scheme)
            .finish()
    }
}

/// Try `routes` in order. Without `execute`, the first structural match wins.
fn walk(routes: &[Arc<RouteDefinition>], request: &RouteRequest, execute: bool) -> bool {
    for definition in routes {
        let response = definition.route_response(request);
        let Some(parameters) = response.parameters() else {
            continue;
        };
        if !execute {
            return true;
        }

        tracing::debug!(
            scheme = definition.scheme(),
            pattern = parameters.pattern().unwrap_or_default(),
            priority = definition.priority(),
            "Route matched"
        );
        if definition.call_handler(parameters) {
            return true;
        }
        tracing::debug!(
            scheme = definition.scheme(),
            pattern = definition.pattern(),
            "Route handler declined"
        );
        metrics::record_decline(definition.scheme());
    }
    false
}
