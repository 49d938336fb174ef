//! petsim Headless Scenario Harness
//!
//! Drives the pet engine on its virtual clock and validates the need
//! catalog, scheduling, message arbitration and autonomy end to end.
//! Runs entirely in-process: no display, no real timers.
//!
//! Usage:
//!   cargo run -p petsim-simtest
//!   cargo run -p petsim-simtest -- --verbose
//!   cargo run -p petsim-simtest -- --config pet.json --json

use std::cell::RefCell;
use std::rc::Rc;

use petsim_core::prelude::*;
use petsim_core::registry::DEFAULT_NEEDS_JSON;
use petsim_logic::constants::need_ids;
use petsim_logic::message::{AmbientKind, Candidate, Category, DropReason, SubmitOutcome};
use petsim_logic::need::{FulfillFailure, NeedDescriptor};
use petsim_logic::status::Status;
use serde::Serialize;

/// Room every scenario runs in.
const GRID_WIDTH: i32 = 12;
const GRID_HEIGHT: i32 = 8;

// ── Test harness ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: String) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail,
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose");
    let json = args.iter().any(|a| a == "--json");
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1));

    let config = match config_path {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => PetConfig::default(),
    };

    println!("=== petsim Scenario Harness ===\n");

    let mut results = Vec::new();

    // 1. Need catalog validation
    results.extend(validate_need_catalog(verbose));

    // 2. Degradation and ranking sweep
    results.extend(validate_degradation(&config, verbose));

    // 3. Message arbitration
    results.extend(validate_message_queue(&config, verbose));

    // 4. Autonomy: walk, eat, pantry
    results.extend(validate_autonomy(&config, verbose));

    // 5. Sleep cycle
    results.extend(validate_sleep_cycle(&config, verbose));

    // 6. Pause / resume / stop
    results.extend(validate_pause(&config, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if json {
        match serde_json::to_string_pretty(&results) {
            Ok(out) => println!("{}", out),
            Err(e) => eprintln!("Failed to serialize results: {}", e),
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn load_config(path: &str) -> Result<PetConfig, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    PetConfig::from_json(&text).map_err(|e| e.to_string())
}

/// Builtin needs with some values overridden.
fn registry_with(values: &[(&str, f32)]) -> Result<NeedRegistry, PetError> {
    let mut registry = NeedRegistry::builtin()?;
    for (id, value) in values {
        if let Some(need) = registry.get_mut(id) {
            need.set_value(*value);
        }
    }
    Ok(registry)
}

fn engine_for(
    config: &PetConfig,
    values: &[(&str, f32)],
    habitat: GridHabitat,
) -> Result<PetEngine, PetError> {
    let config = PetConfig {
        waste_chance: 0.0,
        ..config.clone()
    };
    Ok(PetEngine::new(config, registry_with(values)?)?
        .with_habitat(habitat)
        .with_agent(PetBody::new())
        .with_inventory(Pantry::new().with_stock("kibble", 3)))
}

fn setup_failure(name: &str, e: PetError) -> Vec<TestResult> {
    vec![check(name, false, format!("setup failed: {}", e))]
}

// ── 1. Need Catalog ─────────────────────────────────────────────────────

fn validate_need_catalog(verbose: bool) -> Vec<TestResult> {
    println!("--- Need Catalog ---");
    let mut results = Vec::new();

    let descriptors: Vec<NeedDescriptor> = match serde_json::from_str(DEFAULT_NEEDS_JSON) {
        Ok(d) => d,
        Err(e) => {
            results.push(check("catalog_parse", false, format!("JSON parse error: {}", e)));
            return results;
        }
    };

    results.push(check(
        "catalog_not_empty",
        descriptors.len() >= 5,
        format!("{} needs loaded", descriptors.len()),
    ));

    let registry = NeedRegistry::from_descriptors(descriptors.clone());
    results.push(check(
        "catalog_valid",
        registry.is_ok(),
        match &registry {
            Ok(r) => format!("{} needs pass validation", r.len()),
            Err(e) => e.to_string(),
        },
    ));

    // Every fulfillable need reacts after being helped
    let silent: Vec<&str> = descriptors
        .iter()
        .filter(|d| !d.methods.is_empty() && d.fulfillment_reactions.is_empty())
        .map(|d| d.id.as_str())
        .collect();
    results.push(check(
        "catalog_fulfillment_reactions",
        silent.is_empty(),
        if silent.is_empty() {
            "every fulfillable need reacts".into()
        } else {
            format!("no fulfillment reactions: {:?}", silent)
        },
    ));

    // Alarming statuses should be announced for decaying needs
    let mute: Vec<&str> = descriptors
        .iter()
        .filter(|d| {
            !d.announcements
                .iter()
                .any(|a| a.status == Status::Critical || a.status == Status::Urgent)
        })
        .map(|d| d.id.as_str())
        .filter(|id| *id != need_ids::COZINESS)
        .collect();
    results.push(check(
        "catalog_alarm_announcements",
        mute.is_empty(),
        if mute.is_empty() {
            "all needs announce urgent/critical".into()
        } else {
            format!("never announce alarms: {:?}", mute)
        },
    ));

    // Reactions only make sense on adjacent bands
    let bad_reactions: Vec<String> = descriptors
        .iter()
        .flat_map(|d| {
            d.reactions
                .iter()
                .filter(|r| !r.from.is_adjacent(r.to))
                .map(move |r| format!("{}:{}->{}", d.id, r.from.label(), r.to.label()))
        })
        .collect();
    results.push(check(
        "catalog_adjacent_reactions",
        bad_reactions.is_empty(),
        if bad_reactions.is_empty() {
            "all reactions are one-band transitions".into()
        } else {
            format!("unreachable reactions: {:?}", bad_reactions)
        },
    ));

    if verbose {
        for d in &descriptors {
            println!(
                "  {} {:<12} initial {:>5.1}  methods {}",
                d.icon,
                d.id,
                d.initial,
                d.methods.len()
            );
        }
    }

    results
}

// ── 2. Degradation ──────────────────────────────────────────────────────

fn validate_degradation(config: &PetConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Degradation & Ranking ---");
    let mut results = Vec::new();

    let mut engine = match registry_with(&[])
        .and_then(|registry| PetEngine::new(config.clone(), registry))
    {
        Ok(engine) => engine,
        Err(e) => return setup_failure("degradation_setup", e),
    };

    let hunger_start = engine.need(need_ids::HUNGER).map_or(0.0, |n| n.value());
    engine.update(10_000);
    let hunger_after = engine.need(need_ids::HUNGER).map_or(0.0, |n| n.value());
    let expected = hunger_start - 0.05 * 10.0;
    results.push(check(
        "degrade_ten_seconds",
        (hunger_after - expected).abs() < 0.01,
        format!("hunger {:.2} -> {:.2}", hunger_start, hunger_after),
    ));

    let mut unsorted_ticks = 0;
    for minute in 0..60 {
        for _ in 0..60 {
            engine.update(1_000);
        }
        let ranked = engine.ranked_needs();
        if !ranked.windows(2).all(|w| w[0].urgency >= w[1].urgency) {
            unsorted_ticks += 1;
        }
        if verbose && minute % 15 == 0 {
            let top = ranked.first().map_or("-", |r| r.need_id.as_str());
            println!("  t+{:>2}m  most urgent: {}", minute, top);
        }
    }
    results.push(check(
        "ranking_sorted",
        unsorted_ticks == 0,
        format!("{} unsorted samples over an hour", unsorted_ticks),
    ));

    let out_of_range: Vec<&str> = engine
        .registry()
        .iter()
        .filter(|n| !(0.0..=100.0).contains(&n.value()))
        .map(|n| n.id())
        .collect();
    results.push(check(
        "values_bounded",
        out_of_range.is_empty(),
        format!("{} needs out of range after an hour", out_of_range.len()),
    ));

    results
}

// ── 3. Message Queue ────────────────────────────────────────────────────

fn validate_message_queue(config: &PetConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Message Queue ---");
    let mut results = Vec::new();

    let mut engine = match registry_with(&[])
        .and_then(|registry| PetEngine::new(config.clone(), registry))
    {
        Ok(engine) => engine,
        Err(e) => return setup_failure("queue_setup", e),
    };

    let normal = |text: &str| Candidate::new(text, "", Category::StatusChange);
    engine.submit_message(normal("first"));
    engine.update(500);
    let second = engine.submit_message(normal("second"));
    results.push(check(
        "min_display_drops_normal",
        second == SubmitOutcome::Dropped(DropReason::MinimumDisplayTime),
        format!("{:?}", second),
    ));

    let urgent = engine.submit_message(Candidate::new("Yay!", "", Category::Fulfillment));
    results.push(check(
        "fulfillment_preempts",
        matches!(urgent, SubmitOutcome::Preempted { .. }),
        format!("{:?}", urgent),
    ));

    engine.update(2_000);
    let walk = || Candidate::new("Walking", "🐾", Category::Ambient(AmbientKind::Movement));
    let a = engine.submit_message(walk());
    let b = engine.submit_message(walk());
    let waiting = engine
        .messages()
        .waiting()
        .iter()
        .filter(|m| m.category == Category::Ambient(AmbientKind::Movement))
        .count();
    results.push(check(
        "ambient_deduplicated",
        waiting <= 1 && a.accepted(),
        format!("{:?} then {:?}, {} waiting", a, b, waiting),
    ));

    for _ in 0..30 {
        engine.update(1_000);
        if engine.messages().current().is_none() {
            break;
        }
    }
    let idle_line = engine.current_message();
    let (expected, _) = AgentState::Idle.status_line();
    results.push(check(
        "fallback_line",
        engine.messages().current().is_none() && idle_line.text == expected,
        format!("display shows '{}'", idle_line.text),
    ));

    results
}

// ── 4. Autonomy ─────────────────────────────────────────────────────────

fn validate_autonomy(config: &PetConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Autonomy ---");
    let mut results = Vec::new();

    let mut habitat = GridHabitat::new(GRID_WIDTH, GRID_HEIGHT);
    habitat.spawn_pet(GridPos::new(0, 0));
    habitat.place_item("apple", 90, GridPos::new(2, 1));
    habitat.place_item("ball", 60, GridPos::new(6, 4));

    let mut engine = match engine_for(config, &[(need_ids::HUNGER, 65.0)], habitat) {
        Ok(engine) => engine,
        Err(e) => return setup_failure("autonomy_setup", e),
    };
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    engine.add_listener(move |event| sink.borrow_mut().push(format!("{:?}", event)));

    engine.tick();
    let mut arrived = false;
    for step in 0..5 {
        let outcome = engine.run_autonomy();
        if verbose {
            println!("  step {}: {:?}", step, outcome);
        }
        if matches!(outcome, AutonomyOutcome::Arrived(_)) {
            arrived = true;
            break;
        }
    }

    let position = engine.habitat().and_then(|h| h.agent_position());
    results.push(check(
        "walks_to_food",
        arrived && position == Some(GridPos::new(2, 1)),
        format!("arrived {} at {:?}", arrived, position),
    ));

    let apples = engine.habitat().map_or(0, |h| h.item_count("apple"));
    results.push(check(
        "food_consumed",
        apples == 0,
        format!("{} apples left", apples),
    ));

    let hunger = engine.need(need_ids::HUNGER).map_or(0.0, |n| n.value());
    results.push(check(
        "hunger_restored",
        (hunger - 95.0).abs() < 0.01,
        format!("hunger {:.1}", hunger),
    ));

    let result = engine.fulfill(need_ids::HUNGER, "feed_kibble");
    results.push(check(
        "kibble_from_pantry",
        result.success && engine.need(need_ids::HUNGER).map_or(0.0, |n| n.value()) == 100.0,
        result.message.clone(),
    ));

    let result = engine.fulfill(need_ids::HUNGER, "feed_kibble");
    results.push(check(
        "already_full_reported",
        result.failure == Some(FulfillFailure::AlreadyFull),
        result.message,
    ));

    if verbose {
        for line in log.borrow().iter() {
            println!("  event: {}", line);
        }
    }

    results
}

// ── 5. Sleep ────────────────────────────────────────────────────────────

fn validate_sleep_cycle(config: &PetConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Sleep Cycle ---");
    let mut results = Vec::new();

    let mut habitat = GridHabitat::new(GRID_WIDTH, GRID_HEIGHT);
    habitat.spawn_pet(GridPos::new(3, 3));
    habitat.place_item("bed", 80, GridPos::new(3, 5));

    let mut engine = match engine_for(config, &[(need_ids::SLEEP, 30.0)], habitat) {
        Ok(engine) => engine,
        Err(e) => return setup_failure("sleep_setup", e),
    };

    engine.tick();
    let mut asleep_at = None;
    for _ in 0..4 {
        engine.run_autonomy();
        if engine.agent_state() == Some(AgentState::Sleeping) {
            asleep_at = Some(engine.now_ms());
            break;
        }
    }
    results.push(check(
        "falls_asleep_in_bed",
        asleep_at.is_some(),
        format!("state {:?}", engine.agent_state()),
    ));

    let mut woke_after = None;
    for second in 0..600u64 {
        engine.update(1_000);
        if engine.agent_state() != Some(AgentState::Sleeping) {
            woke_after = Some(second + 1);
            break;
        }
    }
    let energy = engine.need(need_ids::SLEEP).map_or(0.0, |n| n.value());
    if verbose {
        println!("  woke after {:?}s with energy {:.1}", woke_after, energy);
    }
    results.push(check(
        "wakes_rested",
        woke_after.is_some() && energy >= 90.0,
        format!("woke after {:?}s, energy {:.1}", woke_after, energy),
    ));

    results
}

// ── 6. Pause ────────────────────────────────────────────────────────────

fn validate_pause(config: &PetConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Pause / Resume ---");
    let mut results = Vec::new();

    let mut engine = match registry_with(&[(need_ids::FUN, 60.0)])
        .and_then(|registry| PetEngine::new(config.clone(), registry))
    {
        Ok(engine) => engine,
        Err(e) => return setup_failure("pause_setup", e),
    };

    engine.fulfill(need_ids::FUN, "play_fetch");
    let pending_before = engine.pending_events();
    engine.pause();
    engine.pause();
    results.push(check(
        "pause_cancels_reactions",
        pending_before == 1 && engine.pending_events() == 0,
        format!("{} -> {} pending", pending_before, engine.pending_events()),
    ));

    let fun_before = engine.need(need_ids::FUN).map_or(0.0, |n| n.value());
    engine.update(120_000);
    let fun_paused = engine.need(need_ids::FUN).map_or(0.0, |n| n.value());
    results.push(check(
        "pause_freezes_needs",
        fun_before == fun_paused,
        format!("fun {:.2} -> {:.2} over 2 paused minutes", fun_before, fun_paused),
    ));

    engine.resume();
    engine.update(10_000);
    let fun_resumed = engine.need(need_ids::FUN).map_or(0.0, |n| n.value());
    results.push(check(
        "resume_counts_from_now",
        (fun_paused - fun_resumed - 0.4).abs() < 0.01,
        format!("fun {:.2} -> {:.2} after 10s", fun_paused, fun_resumed),
    ));

    engine.stop();
    results.push(check(
        "stop_blanks_display",
        engine.is_paused() && engine.messages().current().is_none(),
        format!("display '{}'", engine.current_message().text),
    ));

    results
}
