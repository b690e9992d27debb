//! Navigation lifecycle: transitions, guards, history modes and scroll.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use waymark::{
    GuardDecision, LocationDriver, LocationSpec, MemoryDriver, Position, Redirect, Route,
    RouteConfig, Router, RouterError, RouterMode, RouterOptions, ScrollBehavior, ScrollTarget,
};

fn routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("/").with_name("home").with_component("Home"),
        RouteConfig::new("/a").with_name("a").with_component("A"),
        RouteConfig::new("/b").with_name("b").with_component("B"),
        RouteConfig::new("/user/:id").with_name("user").with_component("User"),
        RouteConfig::new("/parent")
            .with_component("Parent")
            .with_child(RouteConfig::new("x").with_component("X"))
            .with_child(RouteConfig::new("y").with_component("Y")),
    ]
}

fn memory_router() -> Router {
    Router::new(RouterOptions {
        routes: routes(),
        ..RouterOptions::default()
    })
}

#[test]
fn test_push_and_replace() {
    let router = memory_router();
    router.init().unwrap();
    assert_eq!(router.current_route().path, "/");

    let route = router.push("/a").unwrap();
    assert_eq!(route.path, "/a");
    assert_eq!(router.current_route().path, "/a");

    router.replace("/b").unwrap();
    assert_eq!(router.current_route().path, "/b");
    // The replace consumed /a's entry, so there is nothing to go back to
    // except the stack bottom.
    router.back();
    assert_eq!(router.current_route().path, "/b");
}

#[test]
fn test_duplicate_navigation_is_rejected() {
    let router = memory_router();
    router.init().unwrap();
    router.push("/a").unwrap();

    let err = router.push("/a").unwrap_err();
    assert_eq!(err, RouterError::NavigationDuplicated("/a".to_string()));
    assert_eq!(router.current_route().path, "/a");
}

#[test]
fn test_push_by_name() {
    let router = memory_router();
    router.init().unwrap();
    let route = router
        .push(LocationSpec::name("user").with_param("id", "3"))
        .unwrap();
    assert_eq!(route.path, "/user/3");
    assert_eq!(route.name.as_deref(), Some("user"));
}

#[test]
fn test_guard_abort_keeps_current_route() {
    let router = memory_router();
    router.before_each(|to, _from| {
        if to.path == "/b" {
            GuardDecision::Abort
        } else {
            GuardDecision::Proceed
        }
    });
    router.init().unwrap();
    router.push("/a").unwrap();

    let err = router.push("/b").unwrap_err();
    assert_eq!(err, RouterError::NavigationAborted);
    assert_eq!(router.current_route().path, "/a");
}

#[test]
fn test_guard_redirect() {
    let router = memory_router();
    router.before_each(|to, _from| {
        if to.path == "/a" {
            GuardDecision::Redirect("/b".into())
        } else {
            GuardDecision::Proceed
        }
    });
    router.init().unwrap();

    let route = router.push("/a").unwrap();
    assert_eq!(route.path, "/b");
    assert_eq!(router.current_route().path, "/b");
}

#[test]
fn test_guard_order_and_arguments() {
    let log = Rc::new(RefCell::new(Vec::new()));

    let router = memory_router();
    let l = Rc::clone(&log);
    router.before_each(move |to, from| {
        l.borrow_mut().push(format!("before {} -> {}", from.path, to.path));
        GuardDecision::Proceed
    });
    let l = Rc::clone(&log);
    router.before_resolve(move |to, from| {
        l.borrow_mut().push(format!("resolve {} -> {}", from.path, to.path));
        GuardDecision::Proceed
    });
    let l = Rc::clone(&log);
    router.after_each(move |to, from| {
        l.borrow_mut().push(format!("after {} -> {}", from.path, to.path));
    });

    router.init().unwrap();
    router.push("/a").unwrap();

    let log = log.borrow();
    let a_entries: Vec<_> = log.iter().filter(|e| e.ends_with("-> /a")).collect();
    assert_eq!(
        a_entries,
        vec!["before / -> /a", "resolve / -> /a", "after / -> /a"]
    );
}

#[test]
fn test_enter_guard_runs_only_for_newly_activated_records() {
    let parent_entries = Rc::new(Cell::new(0));
    let counter = Rc::clone(&parent_entries);

    let router = Router::new(RouterOptions {
        routes: vec![
            RouteConfig::new("/").with_component("Home"),
            RouteConfig::new("/parent")
                .with_component("Parent")
                .with_before_enter(move |_, _| {
                    counter.set(counter.get() + 1);
                    GuardDecision::Proceed
                })
                .with_child(RouteConfig::new("x").with_component("X"))
                .with_child(RouteConfig::new("y").with_component("Y")),
        ],
        ..RouterOptions::default()
    });
    router.init().unwrap();

    router.push("/parent/x").unwrap();
    assert_eq!(parent_entries.get(), 1);

    // Sibling navigation keeps the parent record active.
    router.push("/parent/y").unwrap();
    assert_eq!(parent_entries.get(), 1);

    router.push("/").unwrap();
    router.push("/parent/x").unwrap();
    assert_eq!(parent_entries.get(), 2);
}

#[test]
fn test_reentrant_navigation_supersedes_the_older_one() {
    let router = Rc::new(memory_router());
    router.init().unwrap();

    let inner = Rc::clone(&router);
    router.before_each(move |to, _from| {
        if to.path == "/a" {
            // Starts a second navigation while the first is mid-guard.
            inner.push("/b").unwrap();
        }
        GuardDecision::Proceed
    });

    let err = router.push("/a").unwrap_err();
    assert_eq!(err, RouterError::NavigationAborted);
    assert_eq!(router.current_route().path, "/b");
}

#[test]
fn test_config_redirect_through_coordinator() {
    let router = Router::new(RouterOptions {
        routes: vec![
            RouteConfig::new("/").with_component("Home"),
            RouteConfig::new("/old").with_redirect(Redirect::path("/new")),
            RouteConfig::new("/new").with_component("New"),
        ],
        ..RouterOptions::default()
    });
    router.init().unwrap();

    let route = router.push("/old?keep=1").unwrap();
    assert_eq!(route.path, "/new");
    assert_eq!(route.full_path, "/new?keep=1");
    assert_eq!(route.redirected_from.as_deref(), Some("/old?keep=1"));
}

#[test]
fn test_listener_and_after_each_fire_on_commit() {
    let commits = Rc::new(RefCell::new(Vec::new()));
    let router = memory_router();

    let seen = Rc::clone(&commits);
    router.listen(move |to: &Route, from: &Route| {
        seen.borrow_mut().push((from.path.clone(), to.path.clone()));
    });

    router.init().unwrap();
    router.push("/a").unwrap();
    let _ = router.push("/a"); // duplicate, no commit

    let commits = commits.borrow();
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[1], ("/".to_string(), "/a".to_string()));
}

#[test]
fn test_listener_may_register_more_listeners() {
    let router = Rc::new(memory_router());
    let inner_fires = Rc::new(Cell::new(0));

    let registrar = Rc::clone(&router);
    let counter = Rc::clone(&inner_fires);
    router.listen(move |_, _| {
        let counter = Rc::clone(&counter);
        registrar.listen(move |_, _| counter.set(counter.get() + 1));
    });

    router.init().unwrap();
    // The listener added during the first commit fires on the second.
    router.push("/a").unwrap();
    assert_eq!(inner_fires.get(), 1);
}

#[test]
fn test_on_ready_fires_once_settled() {
    let ready = Rc::new(Cell::new(false));
    let router = memory_router();

    let flag = Rc::clone(&ready);
    router.on_ready(move |_| flag.set(true), |_| panic!("unexpected ready error"));
    assert!(!ready.get());

    router.init().unwrap();
    assert!(ready.get());

    // Late registration resolves immediately.
    let late = Rc::new(Cell::new(false));
    let flag = Rc::clone(&late);
    router.on_ready(move |_| flag.set(true), |_| panic!("unexpected ready error"));
    assert!(late.get());
}

#[test]
fn test_on_ready_error_when_initial_navigation_aborts() {
    let failed = Rc::new(Cell::new(false));
    let router = memory_router();
    router.before_each(|_, _| GuardDecision::Abort);

    let flag = Rc::clone(&failed);
    router.on_ready(|_| panic!("should not be ready"), move |_| flag.set(true));

    assert!(router.init().is_err());
    assert!(failed.get());
}

#[test]
fn test_memory_traversal() {
    let router = memory_router();
    router.init().unwrap();
    router.push("/a").unwrap();
    router.push("/b").unwrap();

    router.back();
    assert_eq!(router.current_route().path, "/a");

    router.forward();
    assert_eq!(router.current_route().path, "/b");

    // Out of range either way is a no-op.
    router.forward();
    assert_eq!(router.current_route().path, "/b");
    router.go(-10);
    assert_eq!(router.current_route().path, "/b");
}

#[test]
fn test_memory_push_from_mid_stack_drops_forward_entries() {
    let router = memory_router();
    router.init().unwrap();
    router.push("/a").unwrap();
    router.push("/b").unwrap();
    router.back();
    router.push("/user/1").unwrap();

    router.forward();
    assert_eq!(router.current_route().path, "/user/1");
    router.back();
    assert_eq!(router.current_route().path, "/a");
}

#[test]
fn test_add_routes_makes_new_paths_matchable() {
    let router = Router::new(RouterOptions {
        routes: vec![
            RouteConfig::new("/").with_component("Home"),
            RouteConfig::new("*").with_component("NotFound"),
        ],
        ..RouterOptions::default()
    });
    router.init().unwrap();

    assert_eq!(router.push("/late").unwrap().matched[0].path, "*");

    router.add_routes(vec![RouteConfig::new("/late/:id").with_component("Late")]);
    let route = router.push("/late/5").unwrap();
    assert_eq!(route.matched[0].path, "/late/:id");
    assert_eq!(route.params["id"], "5");
}

#[test]
fn test_resolve_does_not_navigate() {
    let router = memory_router();
    router.init().unwrap();

    let resolved = router.resolve(LocationSpec::name("user").with_param("id", "7"));
    assert_eq!(resolved.route.path, "/user/7");
    assert_eq!(resolved.href, "/user/7");
    assert_eq!(router.current_route().path, "/");
}

#[test]
fn test_resolve_href_prefers_requested_url_over_redirect() {
    let router = Router::new(RouterOptions {
        routes: vec![
            RouteConfig::new("/old").with_redirect(Redirect::path("/new")),
            RouteConfig::new("/new").with_component("New"),
        ],
        mode: RouterMode::Html5,
        driver: Some(Rc::new(MemoryDriver::new())),
        ..RouterOptions::default()
    });

    let resolved = router.resolve("/old");
    assert_eq!(resolved.route.path, "/new");
    assert_eq!(resolved.href, "/old");
}

#[test]
fn test_hash_mode_writes_fragment() {
    let driver = Rc::new(MemoryDriver::with_url("/index.html"));
    let router = Router::new(RouterOptions {
        routes: routes(),
        mode: RouterMode::Hash,
        driver: Some(driver.clone()),
        ..RouterOptions::default()
    });
    router.init().unwrap();

    router.push("/a").unwrap();
    assert_eq!(driver.url(), "/index.html#/a");

    router.replace("/b").unwrap();
    assert_eq!(driver.url(), "/index.html#/b");
}

#[test]
fn test_hash_mode_external_change() {
    let driver = Rc::new(MemoryDriver::with_url("/index.html#/a"));
    let router = Router::new(RouterOptions {
        routes: routes(),
        mode: RouterMode::Hash,
        driver: Some(driver.clone()),
        ..RouterOptions::default()
    });
    router.init().unwrap();
    assert_eq!(router.current_route().path, "/a");

    driver.replace("/index.html#/user/9");
    let route = router.handle_external_change().unwrap();
    assert_eq!(route.path, "/user/9");
}

#[test]
fn test_html5_mode_applies_base() {
    let driver = Rc::new(MemoryDriver::with_url("/app/"));
    let router = Router::new(RouterOptions {
        routes: routes(),
        mode: RouterMode::Html5,
        base: "/app".to_string(),
        driver: Some(driver.clone()),
        ..RouterOptions::default()
    });
    router.init().unwrap();
    assert_eq!(router.current_route().path, "/");

    router.push("/user/1").unwrap();
    assert_eq!(driver.url(), "/app/user/1");
    assert_eq!(router.current_route().path, "/user/1");
}

#[test]
fn test_html5_traversal_restores_scroll() {
    let driver = Rc::new(MemoryDriver::new());
    let behavior: Rc<ScrollBehavior> =
        Rc::new(|_to, _from, saved| Ok(saved.map(ScrollTarget::Position)));

    let router = Router::new(RouterOptions {
        routes: routes(),
        mode: RouterMode::Html5,
        driver: Some(driver.clone()),
        scroll_behavior: Some(behavior),
        ..RouterOptions::default()
    });
    router.init().unwrap();

    router.push("/a").unwrap();
    driver.set_scroll(Position::new(0.0, 250.0));
    router.push("/b").unwrap();
    driver.set_scroll(Position::new(0.0, 10.0));

    // Traverse back to /a and feed the change in, like a host would.
    driver.go(-1);
    let route = router.handle_external_change().unwrap();
    assert_eq!(route.path, "/a");
    assert_eq!(driver.scroll_offset(), Position::new(0.0, 250.0));
}

#[test]
fn test_scroll_behavior_selector_fallback() {
    let driver = Rc::new(MemoryDriver::new());
    let behavior: Rc<ScrollBehavior> = Rc::new(|_to, _from, _saved| {
        Ok(Some(ScrollTarget::Selector {
            selector: "#missing".to_string(),
            offset: Position::default(),
            fallback: Some(Position::new(0.0, 42.0)),
        }))
    });

    let router = Router::new(RouterOptions {
        routes: routes(),
        mode: RouterMode::Html5,
        driver: Some(driver.clone()),
        scroll_behavior: Some(behavior),
        ..RouterOptions::default()
    });
    router.init().unwrap();

    router.push("/a").unwrap();
    // MemoryDriver resolves no selectors, so the fallback position wins.
    assert_eq!(driver.scroll_offset(), Position::new(0.0, 42.0));
}

#[test]
fn test_fallback_driver_uses_full_load_writes() {
    let driver = Rc::new(MemoryDriver::without_push_state("/index.html"));
    let router = Router::new(RouterOptions {
        routes: routes(),
        mode: RouterMode::Html5,
        driver: Some(driver.clone()),
        ..RouterOptions::default()
    });
    // html5 falls back to hash when structured entries are unavailable.
    assert_eq!(router.mode(), RouterMode::Hash);

    router.init().unwrap();
    router.push("/a").unwrap();
    assert_eq!(driver.url(), "/index.html#/a");
    assert_eq!(driver.state_key(), None);
}
