//! Reloading a running application

use proptest::prelude::*;
use sprig_core::{Component, HandlerError, HookError};
use sprig_runtime::{make_component, App, AppBuilder, Initializer, RELOAD_ROUTE};
use sprig_testkit::strategies::{arb_local_addr, arb_remote_addr};
use sprig_testkit::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

fn reload_from(app: &App<Site>, io: &mut MockRequest) -> Result<(), HandlerError> {
    app.serve(io)
}

#[test]
fn test_remote_reload_is_refused_and_changes_nothing() {
    init_test_tracing();
    let events = event_log();
    let app = build_site(events.clone(), InMemoryConfigSource::new()).unwrap();

    let mut io = MockRequest::remote(format!("/{RELOAD_ROUTE}"));
    assert_eq!(reload_from(&app, &mut io), Err(HandlerError::NotHandled));
    assert_eq!(io.body(), "");
    assert_eq!(io.status(), None);
    assert_eq!(app.read(|s| s.value.blog.value.comments.value.count), Some(1));
    assert_eq!(events.lock().iter().filter(|e| *e == "hook:comments").count(), 1);
}

#[test]
fn test_local_reload_reruns_hooks() {
    let events = event_log();
    let app = build_site(events.clone(), InMemoryConfigSource::new()).unwrap();

    let mut io = MockRequest::local(RELOAD_ROUTE);
    assert_eq!(reload_from(&app, &mut io), Ok(()));
    assert_eq!(
        io.body(),
        "Re-ran 1 post-init hook(s)\nSite successfully reloaded.\n"
    );
    assert_eq!(io.status(), None);
    assert_eq!(app.read(|s| s.value.blog.value.comments.value.count), Some(2));

    let mut io = MockRequest::local("/blog/comments/count");
    app.serve(&mut io).unwrap();
    assert_eq!(io.body(), "2");
}

#[test]
fn test_programmatic_reload() {
    let app = build_site(event_log(), InMemoryConfigSource::new()).unwrap();
    assert_eq!(app.reload(), Ok("Re-ran 1 post-init hook(s)\n".to_string()));
    assert_eq!(app.read(|s| s.value.blog.value.comments.value.count), Some(2));
}

#[derive(Debug, Clone, Default)]
struct Trace {
    steps: Vec<String>,
}

/// Three hooks; the middle one fails once `armed` is set.
fn three_hooks(armed: Arc<AtomicBool>) -> App<Trace> {
    let init = make_component("trace", "", move |cx: &mut Initializer<'_, Trace, Trace>| {
        cx.add_post_init_hook(|t: &mut Trace| {
            t.steps.push("first".into());
            Ok(())
        });
        cx.add_post_init_hook(move |_: &mut Trace| {
            if armed.load(Ordering::SeqCst) {
                Err(HookError::new("boom"))
            } else {
                Ok(())
            }
        });
        cx.add_post_init_hook(|t: &mut Trace| {
            t.steps.push("third".into());
            Ok(())
        });
        Ok(Trace::default())
    });
    AppBuilder::new(init)
        .config(fixture_config())
        .config_source(InMemoryConfigSource::new())
        .build()
        .unwrap()
}

#[test]
fn test_failed_reload_reports_first_error_and_keeps_earlier_effects() {
    let armed = Arc::new(AtomicBool::new(false));
    let app = three_hooks(Arc::clone(&armed));
    assert_eq!(app.read(|t| t.value.steps.clone()), Some(vec!["first".into(), "third".into()]));

    armed.store(true, Ordering::SeqCst);
    let mut io = MockRequest::local(RELOAD_ROUTE);
    assert_eq!(app.serve(&mut io), Ok(()));
    assert_eq!(io.status(), Some(500));
    assert_eq!(io.body(), "Error reloading site!\n\nboom");
    assert_eq!(
        app.read(|t| t.value.steps.clone()),
        Some(vec!["first".into(), "third".into(), "first".into()])
    );
}

#[test]
fn test_reload_recovers_after_failure() {
    let armed = Arc::new(AtomicBool::new(false));
    let app = three_hooks(Arc::clone(&armed));
    armed.store(true, Ordering::SeqCst);
    assert_eq!(app.reload(), Err("boom".to_string()));

    armed.store(false, Ordering::SeqCst);
    assert_eq!(app.reload(), Ok("Re-ran 3 post-init hook(s)\n".to_string()));
}

#[derive(Debug, Clone)]
struct Patched {
    n: u32,
}

#[test]
fn test_live_patch_from_a_hook_is_refused_not_deadlocked() {
    init_test_tracing();
    let init = make_component("patched", "", |cx: &mut Initializer<'_, Patched, Patched>| {
        cx.add_post_init_hook_cell(|cell: &mut Component<Patched>| {
            cell.value.n += 1;
            cell.patch_live(Patched { n: 7 });
            Ok(())
        });
        Ok(Patched { n: 0 })
    });
    let app = AppBuilder::new(init)
        .config(fixture_config())
        .config_source(InMemoryConfigSource::new())
        .build()
        .unwrap();
    assert_eq!(app.read(|root| root.value.n), Some(1));

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let reloaded = app.reload();
        let n = app.read(|root| root.value.n);
        let _ = tx.send((reloaded, n));
    });
    let (reloaded, n) = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("reload blocked on the live root lock");
    assert_eq!(reloaded, Ok("Re-ran 1 post-init hook(s)\n".to_string()));
    assert_eq!(n, Some(2));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn only_loopback_origins_may_reload(local in arb_local_addr(), remote in arb_remote_addr()) {
        let app = build_site(event_log(), InMemoryConfigSource::new()).unwrap();

        let mut io = MockRequest::new(remote, RELOAD_ROUTE);
        prop_assert_eq!(app.serve(&mut io), Err(HandlerError::NotHandled));
        prop_assert_eq!(app.read(|s| s.value.blog.value.comments.value.count), Some(1));

        let mut io = MockRequest::new(local, RELOAD_ROUTE);
        prop_assert_eq!(app.serve(&mut io), Ok(()));
        prop_assert_eq!(app.read(|s| s.value.blog.value.comments.value.count), Some(2));
    }
}
