//! Integration Tests for the Script Loader
//!
//! These tests verify that registration, resolution and printing work together
//! correctly, end to end through `Printer::print`.

use loader_core::{
    Emission, FetchPriority, InlinePosition, LoaderConfig, LoaderDiagnostic, LoadingPass,
    PrintPlan, Printer, Registration, Registry, Strategy, Zone,
};

fn print(registry: &Registry) -> PrintPlan {
    Printer::new(LoaderConfig::default()).print(registry)
}

fn strategy_of(plan: &PrintPlan, name: &str) -> Strategy {
    plan.tag(name)
        .unwrap_or_else(|| panic!("no tag for {name}"))
        .strategy
}

/// Assert every printed handle comes after all of its printed dependencies.
fn assert_dependency_order(registry: &Registry, plan: &PrintPlan) {
    let order = plan.load_order();
    for (index, name) in order.iter().enumerate() {
        let handle = registry.get(name).expect("printed handle is registered");
        for dep in leaf_dependencies(registry, handle.dependencies()) {
            if let Some(dep_index) = order.iter().position(|n| *n == dep) {
                assert!(
                    dep_index < index,
                    "{dep} printed after its dependent {name}: {order:?}"
                );
            }
        }
    }
}

/// Expand aliases into the leaves they group.
fn leaf_dependencies<'a>(registry: &'a Registry, deps: &'a [String]) -> Vec<&'a str> {
    let mut leaves = Vec::new();
    let mut stack: Vec<&str> = deps.iter().map(String::as_str).collect();
    let mut seen = std::collections::HashSet::new();
    while let Some(dep) = stack.pop() {
        if !seen.insert(dep) {
            continue;
        }
        match registry.get(dep) {
            Some(handle) if handle.is_alias() => {
                stack.extend(handle.dependencies().iter().map(String::as_str));
            }
            _ => leaves.push(dep),
        }
    }
    leaves
}

/// Test that dependencies always print before dependents, over many graphs.
#[test]
fn dependencies_print_before_dependents() {
    for seed in 1..=25u64 {
        let mut state = seed;
        let mut next = move |bound: u64| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 33) % bound
        };

        let mut registry = Registry::scripts();
        let count = 30;
        for i in 0..count {
            let mut registration = Registration::script(format!("h{i}"), format!("/h{i}.js"));
            if i > 0 {
                let deps: Vec<String> = (0..next(4)).map(|_| format!("h{}", next(i))).collect();
                registration = registration.deps(deps);
            }
            if next(3) == 0 {
                registration = registration.in_footer();
            }
            registration = match next(3) {
                0 => registration.strategy("defer"),
                1 => registration.strategy("async"),
                _ => registration,
            };
            registry.register(registration);
        }
        // Enqueue in reverse so enqueue order fights dependency order.
        for i in (0..count).rev().step_by(3) {
            registry.enqueue(&format!("h{i}"));
        }

        let plan = print(&registry);
        assert_dependency_order(&registry, &plan);
        assert!(plan.diagnostics.is_empty());

        for emission in &plan.head {
            for name in emission.loads() {
                let handle = registry.get(name).unwrap();
                for dep in handle.dependencies() {
                    assert_ne!(plan.zone_of(dep), Some(Zone::Footer), "{name} in head needs footer {dep}");
                }
            }
        }
    }
}

/// Test that a blocking dependent forces its deferred dependency to block.
#[test]
fn blocking_dependent_forces_blocking_dependency() {
    let mut registry = Registry::scripts();
    registry.register(Registration::script("a", "/a.js").strategy("defer"));
    registry.register(Registration::script("b", "/b.js").deps(["a"]));
    registry.enqueue("b");

    let plan = print(&registry);
    assert_eq!(strategy_of(&plan, "a"), Strategy::Blocking);
    assert_eq!(strategy_of(&plan, "b"), Strategy::Blocking);
    assert_eq!(plan.tag("a").unwrap().declared_strategy, Some(Strategy::Defer));
}

/// Test that a chain of deferred scripts stays deferred.
#[test]
fn deferred_chain_stays_deferred() {
    let mut registry = Registry::scripts();
    registry.register(Registration::script("a", "/a.js").strategy("defer"));
    registry.register(Registration::script("b", "/b.js").deps(["a"]).strategy("defer"));
    registry.register(Registration::script("c", "/c.js").deps(["b"]).strategy("defer"));
    registry.enqueue("c");

    let plan = print(&registry);
    for name in ["a", "b", "c"] {
        assert_eq!(strategy_of(&plan, name), Strategy::Defer, "{name}");
    }
    assert_eq!(plan.load_order(), vec!["a", "b", "c"]);
}

/// Test that an async dependency of a deferred dependent is emitted as defer.
#[test]
fn async_dependency_of_deferred_dependent_becomes_defer() {
    let mut registry = Registry::scripts();
    registry.register(Registration::script("a", "/a.js").strategy("async"));
    registry.register(Registration::script("b", "/b.js").deps(["a"]).strategy("defer"));
    registry.enqueue("b");

    let plan = print(&registry);
    assert_eq!(strategy_of(&plan, "a"), Strategy::Defer);
    assert_eq!(strategy_of(&plan, "b"), Strategy::Defer);
}

/// Test that registered but unenqueued dependents do not constrain.
#[test]
fn unenqueued_dependents_do_not_constrain() {
    let mut registry = Registry::scripts();
    registry.register(Registration::script("a", "/a.js").strategy("defer"));
    registry.register(Registration::script("b", "/b.js").deps(["a"]));
    registry.enqueue("a");

    let plan = print(&registry);
    assert_eq!(strategy_of(&plan, "a"), Strategy::Defer);
    assert!(!plan.loads("b"));
}

/// Test that a missing dependency removes only the handle that needs it.
#[test]
fn missing_dependency_excludes_only_the_dependent() {
    let mut registry = Registry::scripts();
    registry.register(Registration::script("dep", "/dep.js"));
    registry.register(Registration::script("main", "/main.js").deps(["dep", "ghost"]));
    registry.register(Registration::script("third", "/third.js"));
    registry.enqueue("main");
    registry.enqueue("third");

    let plan = print(&registry);
    assert!(plan.tag("main").is_none());
    assert!(plan.tag("third").is_some());
    assert_eq!(
        plan.diagnostics,
        vec![LoaderDiagnostic::MissingDependencies {
            kind: loader_core::AssetKind::Script,
            handle: "main".to_string(),
            missing: vec!["ghost".to_string()],
        }]
    );

    let message = plan.diagnostics[0].to_string();
    assert!(message.contains("main"));
    assert!(message.contains("ghost"));
}

/// Test that a high-priority dependent bumps its whole dependency chain.
#[test]
fn fetch_priority_bump_propagates_up_the_chain() {
    let mut registry = Registry::scripts();
    registry.register(Registration::script("bajo", "/bajo.js").fetchpriority("low"));
    registry.register(
        Registration::script("auto2", "/auto2.js")
            .deps(["bajo"])
            .fetchpriority("auto"),
    );
    registry.register(
        Registration::script("alto", "/alto.js")
            .deps(["auto2"])
            .fetchpriority("high"),
    );
    registry.enqueue("alto");

    let plan = print(&registry);

    let bajo = plan.tag("bajo").unwrap();
    assert_eq!(bajo.fetch_priority, FetchPriority::High);
    assert_eq!(bajo.declared_fetch_priority, Some(FetchPriority::Low));

    let auto2 = plan.tag("auto2").unwrap();
    assert_eq!(auto2.fetch_priority, FetchPriority::High);
    assert_eq!(auto2.declared_fetch_priority, Some(FetchPriority::Auto));

    let alto = plan.tag("alto").unwrap();
    assert_eq!(alto.fetch_priority, FetchPriority::High);
    assert_eq!(alto.declared_fetch_priority, None);
}

/// Test that self-dependencies through an alias terminate.
#[test]
fn cycles_through_aliases_terminate() {
    let mut registry = Registry::scripts();
    registry.register(Registration::alias("group").deps(["app"]));
    registry.register(
        Registration::script("app", "/app.js")
            .deps(["group"])
            .strategy("defer")
            .fetchpriority("low"),
    );
    registry.enqueue("app");

    let plan = print(&registry);
    assert_eq!(plan.load_order(), vec!["app"]);
    assert_eq!(strategy_of(&plan, "app"), Strategy::Defer);
    assert_eq!(plan.tag("app").unwrap().fetch_priority, FetchPriority::Low);

    let mut pass = LoadingPass::new(&registry);
    assert_eq!(pass.effective_strategy("app"), Strategy::Defer);
}

/// Test that printing the same registry twice gives the same plan.
#[test]
fn printing_is_idempotent() {
    let mut registry = Registry::scripts();
    registry.register(Registration::script("a", "/a.js").strategy("async").fetchpriority("low"));
    registry.register(Registration::script("b", "/b.js").deps(["a"]).strategy("defer"));
    registry.register(Registration::script("c", "/c.js").deps(["b"]).fetchpriority("high").in_footer());
    registry.register(Registration::script("d", "/d.js").deps(["missing"]));
    registry.enqueue("c");
    registry.enqueue("d");

    let printer = Printer::new(LoaderConfig::default());
    let first = printer.print(&registry);
    let second = printer.print(&registry);
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

/// Test that caches do not leak between passes when the queue changes.
#[test]
fn passes_do_not_share_state() {
    let mut registry = Registry::scripts();
    registry.register(Registration::script("lib", "/lib.js").strategy("defer"));
    registry.register(Registration::script("sync", "/sync.js").deps(["lib"]));
    registry.enqueue("lib");

    let printer = Printer::default();
    assert_eq!(strategy_of(&printer.print(&registry), "lib"), Strategy::Defer);

    registry.enqueue("sync");
    assert_eq!(strategy_of(&printer.print(&registry), "lib"), Strategy::Blocking);

    registry.dequeue("sync");
    assert_eq!(strategy_of(&printer.print(&registry), "lib"), Strategy::Defer);
}

/// Test that an invalid strategy prints as blocking with a diagnostic.
#[test]
fn invalid_strategy_degrades_to_blocking() {
    let mut registry = Registry::scripts();
    registry.register(Registration::script("odd", "/odd.js").strategy("eventually"));
    registry.enqueue("odd");

    let plan = print(&registry);
    assert_eq!(strategy_of(&plan, "odd"), Strategy::Blocking);
    assert!(matches!(
        registry.diagnostics(),
        [LoaderDiagnostic::InvalidStrategy { value, .. }] if value == "eventually"
    ));
}

/// Test that a conditional handle is skipped while its dependents print.
#[test]
fn conditional_handles_emit_nothing() {
    let mut registry = Registry::scripts();
    registry.register(Registration::script("html5shiv", "/html5shiv.js"));
    registry.add_data("html5shiv", "conditional", "lt IE 9");
    registry.register(Registration::script("app", "/app.js").deps(["html5shiv"]));
    registry.enqueue("app");

    let plan = print(&registry);
    assert!(!plan.loads("html5shiv"));
    assert_eq!(plan.load_order(), vec!["app"]);
}

/// Test that a head script with a footer dependency moves to the footer.
#[test]
fn footer_placement_bubbles_to_dependents() {
    let mut registry = Registry::scripts();
    registry.register(Registration::script("vendor", "/vendor.js").in_footer());
    registry.register(Registration::script("widget", "/widget.js").deps(["vendor"]));
    registry.register(Registration::script("early", "/early.js"));
    registry.enqueue("widget");
    registry.enqueue("early");

    let plan = print(&registry);
    assert_eq!(plan.zone_of("early"), Some(Zone::Head));
    assert_eq!(plan.zone_of("vendor"), Some(Zone::Footer));
    assert_eq!(plan.zone_of("widget"), Some(Zone::Footer));
    assert_eq!(plan.load_order(), vec!["early", "vendor", "widget"]);
}

/// Test that a skipped conditional handle does not move its dependents.
#[test]
fn conditional_footer_handle_places_nothing() {
    let mut registry = Registry::scripts();
    registry.register(Registration::script("shiv", "/shiv.js").in_footer());
    registry.add_data("shiv", "conditional", "lt IE 9");
    registry.register(Registration::script("app", "/app.js").deps(["shiv"]));
    registry.enqueue("app");

    let plan = print(&registry);
    assert!(!plan.loads("shiv"));
    assert_eq!(plan.zone_of("app"), Some(Zone::Head));
    assert!(plan.footer.is_empty());
}

/// Test that cycle members get the same answers in any query order.
#[test]
fn cycle_results_do_not_depend_on_query_order() {
    let mut registry = Registry::scripts();
    registry.register(Registration::script("p", "/p.js").deps(["q"]).strategy("defer"));
    registry.register(Registration::script("q", "/q.js").deps(["p"]).strategy("defer"));
    registry.register(
        Registration::script("h", "/h.js")
            .deps(["p"])
            .fetchpriority("high"),
    );
    registry.enqueue("h");

    let mut forward = LoadingPass::new(&registry);
    let forward_answers = [
        (forward.effective_fetch_priority("p"), forward.effective_strategy("p")),
        (forward.effective_fetch_priority("q"), forward.effective_strategy("q")),
    ];

    let mut backward = LoadingPass::new(&registry);
    let q = (backward.effective_fetch_priority("q"), backward.effective_strategy("q"));
    let p = (backward.effective_fetch_priority("p"), backward.effective_strategy("p"));

    assert_eq!(forward_answers, [p, q]);
    assert_eq!(q, (FetchPriority::High, Strategy::Blocking));
}

/// Test a realistic page: config from JSON, bundles, inline blocks and
/// delayed scripts printed together.
#[test]
fn full_page_with_concatenation() {
    let config = LoaderConfig::from_json(
        r#"{
            "base_url": "https://example.org",
            "default_version": "6.5",
            "concatenate": true,
            "default_dirs": ["/wp-includes/js/"],
            "concat_endpoint": "/wp-admin/load-scripts.php"
        }"#,
    )
    .unwrap();

    let mut registry = Registry::scripts();
    registry.register(Registration::script("jquery-core", "/wp-includes/js/jquery/jquery.js"));
    registry.register(Registration::script("jquery-migrate", "/wp-includes/js/jquery/jquery-migrate.js"));
    registry.register(Registration::alias("jquery").deps(["jquery-core", "jquery-migrate"]));
    registry.register(Registration::script("utils", "/wp-includes/js/utils.js").deps(["jquery"]));
    registry.register(
        Registration::script("plugin", "/wp-content/plugins/p/plugin.js")
            .deps(["utils"])
            .version("2.1"),
    );
    registry.register(
        Registration::script("analytics", "https://cdn.example.net/a.js")
            .strategy("async")
            .in_footer(),
    );
    registry.add_inline("plugin", "window.pluginConfig = {};", InlinePosition::Before);
    registry.enqueue("plugin");
    registry.enqueue("analytics");

    let plan = Printer::new(config).print(&registry);

    assert_eq!(plan.head.len(), 3);
    match &plan.head[0] {
        Emission::ConcatenatedBundle(bundle) => {
            assert_eq!(bundle.members, vec!["jquery-core", "jquery-migrate", "utils"]);
            assert_eq!(
                bundle.url,
                "https://example.org/wp-admin/load-scripts.php?c=0&load%5Bchunk_0%5D=jquery-core,jquery-migrate,utils&ver=6.5"
            );
        }
        other => panic!("expected a bundle, got {other:?}"),
    }
    assert!(matches!(&plan.head[1], Emission::Inline(inline) if inline.owner == "plugin"));
    match &plan.head[2] {
        Emission::Tag(tag) => {
            assert_eq!(tag.src, "https://example.org/wp-content/plugins/p/plugin.js?ver=2.1");
        }
        other => panic!("expected a tag, got {other:?}"),
    }

    let analytics = plan.tag("analytics").unwrap();
    assert_eq!(analytics.strategy, Strategy::Async);
    assert_eq!(analytics.src, "https://cdn.example.net/a.js?ver=6.5");
    assert_eq!(plan.zone_of("analytics"), Some(Zone::Footer));
    assert_dependency_order(&registry, &plan);

    let json = plan.to_json().unwrap();
    assert!(json.contains(r#""kind":"concatenated-bundle""#));
}
