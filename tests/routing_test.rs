//! End-to-end routing tests through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use deeplink_router::routing::{
    compile_pattern, constructed, handler, weak_target, FromRouteParameters, Parameters,
    RouteDefinition, RouteTarget, RouterManager, GLOBAL_SCHEME,
};

mod common;
use common::CallLog;

#[test]
fn test_variable_binding_and_reserved_keys() {
    let manager = RouterManager::new();
    let log = CallLog::new();
    let router = manager.routes_for_scheme("myapp");
    router.add("/user/:id", log.handler("user", true)).unwrap();

    assert!(router.route_url("myapp://user/42"));

    let params = log.last().unwrap();
    assert_eq!(params.get_str("id"), Some("42"));
    assert_eq!(params.pattern(), Some("/user/:id"));
    assert_eq!(params.url(), Some("myapp://user/42"));
    assert_eq!(params.scheme(), Some("myapp"));
    assert!(params.wildcard_components().is_none());
}

#[test]
fn test_route_url_keeps_input_text() {
    let manager = RouterManager::new();
    let log = CallLog::new();
    manager
        .routes_for_scheme("myapp")
        .add("/user/:name", log.handler("user", true))
        .unwrap();

    assert!(manager.route_url("MyApp://user/John Doe"));
    let params = log.last().unwrap();
    assert_eq!(params.url(), Some("MyApp://user/John Doe"));
    assert_eq!(params.get_str("name"), Some("John Doe"));
}

#[test]
fn test_hash_style_link_with_query() {
    let manager = RouterManager::new();
    let log = CallLog::new();
    manager
        .routes_for_scheme("app")
        .add("/x/#/a", log.handler("hash", true))
        .unwrap();

    assert!(manager.route_url("app://x#/a?b=1"));
    let params = log.last().unwrap();
    assert_eq!(params.pattern(), Some("/x/#/a"));
    assert_eq!(params.get_str("b"), Some("1"));
}

#[test]
fn test_optional_groups_match_any_order() {
    let manager = RouterManager::new();
    let log = CallLog::new();
    let router = manager.routes_for_scheme("myapp");
    router.add("/a/(/b)(/c)", log.handler("a", true)).unwrap();

    for (url, expected) in [
        ("myapp://a/b/c", "/a/b/c"),
        ("myapp://a/c/b", "/a/c/b"),
        ("myapp://a/c", "/a/c"),
        ("myapp://a", "/a"),
    ] {
        assert!(router.route_url(url), "{url} should route");
        assert_eq!(log.last().unwrap().pattern(), Some(expected));
    }
    assert!(!router.route_url("myapp://a/d"));
}

#[test]
fn test_expansion_prefers_longest_candidate() {
    let compiled = compile_pattern("/a/(/b)(/c)").unwrap();
    let patterns: Vec<&str> = compiled.iter().map(|p| p.as_str()).collect();

    assert_eq!(patterns, ["/a/b/c", "/a/c/b", "/a/b", "/a/c", "/a"]);
    assert_eq!(compile_pattern("/a/(/b)(/c)").unwrap(), compiled);
}

#[test]
fn test_wildcard_capture() {
    let manager = RouterManager::new();
    let log = CallLog::new();
    let router = manager.routes_for_scheme("myapp");
    router.add("/files/*", log.handler("files", true)).unwrap();

    assert!(router.route_url("myapp://files/x/y/z"));
    let params = log.last().unwrap();
    let captured: Vec<&str> = params
        .wildcard_components()
        .unwrap()
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(captured, ["x", "y", "z"]);

    assert!(router.route_url("myapp://files"));
    assert!(log.last().unwrap().wildcard_components().is_none());
}

#[test]
fn test_priority_then_registration_order() {
    let manager = RouterManager::new();
    let log = CallLog::new();
    let router = manager.routes_for_scheme("myapp");
    router.add("/item/:id", log.handler("a", false)).unwrap();
    router
        .add_with_priority("/item/:id", 5, log.handler("b", false))
        .unwrap();
    router.add("/item/:id", log.handler("c", false)).unwrap();

    assert!(!router.route_url("myapp://item/1"));
    assert_eq!(log.names(), ["b", "a", "c"]);
}

#[test]
fn test_decline_continues_to_next_route() {
    let manager = RouterManager::new();
    let log = CallLog::new();
    let router = manager.routes_for_scheme("myapp");
    router
        .add_with_priority("/item/:id", 10, log.handler("picky", false))
        .unwrap();
    router.add("/item/:id", log.handler("fallback", true)).unwrap();

    let unmatched = Arc::new(AtomicUsize::new(0));
    let counter = unmatched.clone();
    router.set_unmatched_handler(move |_, _, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert!(router.route_url("myapp://item/7"));
    assert_eq!(log.names(), ["picky", "fallback"]);
    assert_eq!(unmatched.load(Ordering::SeqCst), 0);
}

#[test]
fn test_unmatched_callback_fires_once() {
    let manager = RouterManager::new();
    let log = CallLog::new();
    let router = manager.routes_for_scheme("myapp");
    router.add("/item/:id", log.handler("one", false)).unwrap();
    router.add("/item/:id", log.handler("two", false)).unwrap();

    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = seen.clone();
    router.set_unmatched_handler(move |router, url, params| {
        let source = params.get_str("src").map(str::to_string);
        sink.lock()
            .unwrap()
            .push((router.scheme().to_string(), url.to_string(), source));
    });

    let extra: Parameters = [("src", "push")].into_iter().collect();
    assert!(!router.route_url_with_parameters("myapp://item/7", extra));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "myapp");
    assert_eq!(seen[0].1, "myapp://item/7");
    assert_eq!(seen[0].2.as_deref(), Some("push"));
}

#[test]
fn test_query_parameters() {
    let manager = RouterManager::new();
    let log = CallLog::new();
    manager
        .routes_for_scheme("myapp")
        .add("/search", log.handler("search", true))
        .unwrap();

    assert!(manager.route_url("myapp://search?q=hello+world&tag=a&tag=b&flag"));
    let params = log.last().unwrap();
    assert_eq!(params.get_str("q"), Some("hello world"));
    let tags = params.get("tag").and_then(|value| value.as_list()).unwrap();
    assert_eq!(tags, ["a", "b"]);
    assert!(!params.contains_key("flag"));
}

#[test]
fn test_plus_decoding_can_be_disabled() {
    let manager = RouterManager::new();
    let log = CallLog::new();
    manager
        .routes_for_scheme("myapp")
        .add("/search", log.handler("search", true))
        .unwrap();
    manager.set_decode_plus_symbols(false);

    assert!(manager.route_url("myapp://search?q=hello+world"));
    assert_eq!(log.last().unwrap().get_str("q"), Some("hello+world"));
}

#[test]
fn test_fragment_query_is_merged() {
    let manager = RouterManager::new();
    let log = CallLog::new();
    manager
        .routes_for_scheme("myapp")
        .add("/search", log.handler("search", true))
        .unwrap();

    assert!(manager.route_url("myapp://search#q=rust"));
    assert_eq!(log.last().unwrap().get_str("q"), Some("rust"));
}

#[test]
fn test_parameter_precedence() {
    let manager = RouterManager::new();
    let log = CallLog::new();
    let router = manager.routes_for_scheme("myapp");
    router.add("/user/:id", log.handler("user", true)).unwrap();

    let extra: Parameters = [("id", "extra"), ("ref", "extra"), ("origin", "widget")]
        .into_iter()
        .collect();
    assert!(router.route_url_with_parameters(
        "myapp://user/42?ref=mail&route_pattern=spoofed",
        extra
    ));

    let params = log.last().unwrap();
    assert_eq!(params.get_str("id"), Some("42"));
    assert_eq!(params.get_str("ref"), Some("mail"));
    assert_eq!(params.get_str("origin"), Some("widget"));
    assert_eq!(params.pattern(), Some("/user/:id"));
}

#[test]
fn test_raw_variable_is_not_decoded() {
    let manager = RouterManager::new();
    let log = CallLog::new();
    let router = manager.routes_for_scheme("myapp");
    router.add("/raw/:name#", log.handler("raw", true)).unwrap();
    router.add("/tag/:name", log.handler("tag", true)).unwrap();

    assert!(router.route_url("myapp://raw/a%20b"));
    assert_eq!(log.last().unwrap().get_str("name"), Some("a%20b"));

    assert!(router.route_url("myapp://tag/a%20b"));
    assert_eq!(log.last().unwrap().get_str("name"), Some("a b"));
}

#[test]
fn test_fallback_to_global() {
    let manager = RouterManager::new();
    let log = CallLog::new();
    manager
        .global_routes()
        .add("/help", log.handler("help", true))
        .unwrap();

    let router = manager.routes_for_scheme("myapp");
    assert!(!router.route_url("myapp://help"));

    router.set_fallback_to_global(true);
    assert!(router.route_url("myapp://help"));
    assert_eq!(log.last().unwrap().scheme(), Some(GLOBAL_SCHEME));
}

#[test]
fn test_manager_uses_global_for_unknown_scheme() {
    let manager = RouterManager::new();
    let log = CallLog::new();
    manager
        .global_routes()
        .add("/help", log.handler("global", true))
        .unwrap();
    manager
        .routes_for_scheme("myapp")
        .add("/help", log.handler("myapp", true))
        .unwrap();

    assert!(manager.route_url("other://help"));
    assert!(manager.route_url("MyApp://help"));
    assert_eq!(log.names(), ["global", "myapp"]);
}

#[test]
fn test_can_route_does_not_dispatch() {
    let manager = RouterManager::new();
    let log = CallLog::new();
    let router = manager.routes_for_scheme("myapp");
    router.add("/user/:id", log.handler("user", false)).unwrap();

    assert!(router.can_route_url("myapp://user/1"));
    assert!(!router.can_route_url("myapp://post/1"));
    assert!(!router.can_route_url("not a url"));
    assert_eq!(log.len(), 0);
}

#[test]
fn test_host_as_path_component_option() {
    let manager = RouterManager::new();
    let log = CallLog::new();
    let router = manager.routes_for_scheme("https");
    router.add("/example.com/x", log.handler("host", true)).unwrap();
    router.add("/x", log.handler("path", true)).unwrap();

    assert!(router.route_url("https://example.com/x"));
    manager.set_treat_host_as_path_component(true);
    assert!(router.route_url("https://example.com/x"));
    assert_eq!(log.names(), ["path", "host"]);
}

#[test]
fn test_handlerless_route_accepts() {
    let manager = RouterManager::new();
    let router = manager.routes_for_scheme("myapp");
    router.add_route(RouteDefinition::new("/ping", 0, None).unwrap());

    assert!(router.route_url("myapp://ping"));
}

struct Inbox {
    opened: AtomicUsize,
}

impl RouteTarget for Inbox {
    fn handle_route(&self, parameters: &Parameters) -> bool {
        self.opened.fetch_add(1, Ordering::SeqCst);
        parameters.contains_key("folder")
    }
}

#[test]
fn test_weak_target_declines_after_drop() {
    let manager = RouterManager::new();
    let router = manager.routes_for_scheme("mail");
    let inbox = Arc::new(Inbox {
        opened: AtomicUsize::new(0),
    });
    router.add("/inbox/:folder", weak_target(&inbox)).unwrap();

    assert!(router.route_url("mail://inbox/work"));
    assert_eq!(inbox.opened.load(Ordering::SeqCst), 1);

    drop(inbox);
    assert!(!router.route_url("mail://inbox/work"));
    assert_eq!(router.routes().len(), 1);
}

struct Profile {
    id: u64,
}

impl FromRouteParameters for Profile {
    fn from_route_parameters(parameters: &Parameters) -> Option<Self> {
        let id = parameters.get_str("id")?.parse().ok()?;
        Some(Profile { id })
    }
}

#[test]
fn test_constructed_target() {
    let manager = RouterManager::new();
    let router = manager.routes_for_scheme("myapp");
    let opened = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = opened.clone();
    router
        .add(
            "/profile/:id",
            constructed(move |profile: Profile| {
                sink.lock().unwrap().push(profile.id);
                true
            }),
        )
        .unwrap();

    assert!(router.route_url("myapp://profile/12"));
    assert!(!router.route_url("myapp://profile/abc"));
    assert_eq!(*opened.lock().unwrap(), [12]);
}

#[test]
fn test_handler_may_register_routes() {
    let manager = RouterManager::new();
    let router = manager.routes_for_scheme("myapp");
    let inner = router.clone();
    router
        .add(
            "/setup",
            handler(move |_| {
                inner
                    .add("/ready", handler(|_| true))
                    .is_ok()
            }),
        )
        .unwrap();

    assert!(!router.can_route_url("myapp://ready"));
    assert!(router.route_url("myapp://setup"));
    assert!(router.route_url("myapp://ready"));
}
