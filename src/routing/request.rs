//! URL decomposition into a matchable request.
//!
//! # Responsibilities
//! - Split a URL into path components and decoded query parameters
//! - Decide whether the host is really the first path component
//! - Merge query-style fragments and keep path-style fragments
//!
//! # Design Decisions
//! - Path components stay percent-encoded; decoding happens per variable at match time
//! - A host without a dot (and not `localhost`) is treated as a path component,
//!   so `app://user/42` has the components `user`, `42`
//! - Repeated query keys produce a list in declaration order

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use url::Url;

use crate::routing::response::{ParamValue, Parameters};

/// Process-wide flags read when a request is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// Treat `+` as a space in query values and variables.
    pub decode_plus_symbols: bool,

    /// Always prepend the URL host to the path components.
    pub treat_host_as_path_component: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            decode_plus_symbols: true,
            treat_host_as_path_component: false,
        }
    }
}

/// A URL broken down for matching. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    source_url: String,
    url: Url,
    path_components: Vec<String>,
    query_params: Parameters,
    options: RequestOptions,
    additional_params: Parameters,
}

impl RouteRequest {
    /// `source_url` is the text the caller routed, kept verbatim for `route_url`.
    pub fn new(
        source_url: impl Into<String>,
        url: Url,
        options: RequestOptions,
        additional_params: Parameters,
    ) -> Self {
        let mut path = url.path().to_string();
        if let Some(host) = url.host_str().filter(|host| !host.is_empty()) {
            if options.treat_host_as_path_component || host_is_path_component(host) {
                path = format!("{}/{}", host, path.trim_start_matches('/'));
            }
        }

        let mut query = parse_query(url.query().unwrap_or(""), options.decode_plus_symbols);

        if let Some(fragment) = url.fragment().filter(|f| !f.is_empty()) {
            let (fragment_path, fragment_query) = match fragment.split_once('?') {
                Some((path, query)) => (path, query),
                // A bare fragment may itself be a query string.
                None => (fragment, fragment),
            };
            let items = parse_query(fragment_query, options.decode_plus_symbols);
            let fragment_has_query = items
                .first()
                .and_then(|(_, value)| value.as_deref())
                .is_some_and(|value| !value.is_empty());

            if fragment_has_query {
                query.extend(items);
            }
            let path_is_query = fragment_has_query && fragment_path == fragment_query;
            if !fragment_path.is_empty() && !path_is_query {
                path.push('#');
                path.push_str(fragment_path);
            }
        }

        Self {
            source_url: source_url.into(),
            path_components: split_path(&path),
            query_params: collect_query(query),
            url,
            options,
            additional_params,
        }
    }

    /// Parse `url` and build a request from it.
    pub fn parse(
        url: &str,
        options: RequestOptions,
        additional_params: Parameters,
    ) -> Result<Self, url::ParseError> {
        Ok(Self::new(url, Url::parse(url)?, options, additional_params))
    }

    /// The URL exactly as the caller passed it.
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// The parsed (normalized) URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn path_components(&self) -> &[String] {
        &self.path_components
    }

    pub fn query_params(&self) -> &Parameters {
        &self.query_params
    }

    pub fn options(&self) -> RequestOptions {
        self.options
    }

    pub fn additional_params(&self) -> &Parameters {
        &self.additional_params
    }
}

/// Percent-decode `value`, first turning `+` into spaces when `decode_plus` is set.
pub fn decode_component(value: &str, decode_plus: bool) -> String {
    let value: Cow<'_, str> = if decode_plus && value.contains('+') {
        Cow::Owned(value.replace('+', " "))
    } else {
        Cow::Borrowed(value)
    };
    percent_decode_str(&value).decode_utf8_lossy().into_owned()
}

fn host_is_path_component(host: &str) -> bool {
    host != "localhost" && !host.contains('.')
}

fn split_path(path: &str) -> Vec<String> {
    let trimmed = path.trim_start_matches('/').trim_end_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').map(str::to_string).collect()
}

/// Query items in order; `None` for items without `=`.
fn parse_query(query: &str, decode_plus: bool) -> Vec<(String, Option<String>)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (
                decode_component(key, false),
                Some(decode_component(value, decode_plus)),
            ),
            None => (decode_component(pair, false), None),
        })
        .collect()
}

fn collect_query(items: Vec<(String, Option<String>)>) -> Parameters {
    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for (key, value) in items {
        if let Some(value) = value {
            grouped.entry(key).or_default().push(value);
        }
    }
    grouped
        .into_iter()
        .map(|(key, mut values)| {
            let value = if values.len() == 1 {
                ParamValue::Text(values.remove(0))
            } else {
                ParamValue::List(values)
            };
            (key, value)
        })
        .collect()
}
