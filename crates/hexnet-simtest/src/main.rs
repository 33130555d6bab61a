//! Hexnet Headless Simulation Harness
//!
//! Runs scripted and seeded scenarios against the network pipeline and checks
//! its invariants. Runs entirely in-process: no rendering, no input.
//!
//! Usage:
//!   cargo run -p hexnet-simtest
//!   cargo run -p hexnet-simtest -- --verbose
//!   cargo run -p hexnet-simtest -- --seed 7 --json
//!
//! Set `RUST_LOG=hexnet_core=debug` to see per-tick network summaries.

use std::collections::BTreeSet;

use hexnet_core::generation::{grow, populate};
use hexnet_core::prelude::*;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ── Scenario kinds (minimal templates, independent of the builtin catalog) ──
const SCENARIO_KINDS: &str = r#"[
    { "name": "Source", "placement": { "rule": "root" }, "production": { "amount": 1 } },
    { "name": "Relay", "placement": { "rule": "adjacent" } },
    { "name": "Sink", "placement": { "rule": "adjacent" },
      "construction": { "max": 2 }, "integrity": { "max": 5 } },
    { "name": "Booster", "placement": { "rule": "adjacent" },
      "production": { "amount": 1 }, "consumption": { "amount": 1 },
      "modifier": { "kind": "rate", "delta": 1 } },
    { "name": "Wall", "placement": { "rule": "adjacent" }, "integrity": { "max": 3, "full": true } },
    { "name": "Store", "placement": { "rule": "adjacent" }, "collection": { "max": 3 } },
    { "name": "Mender", "placement": { "rule": "adjacent" },
      "consumption": { "amount": 1 }, "repair": { "radius": 1 } }
]"#;

/// Scattered over the contested grid; no efficiency bonus inflates storage
const CONTESTED_KINDS: [&str; 8] = [
    "Source", "Source", "Relay", "Sink", "Store", "Booster", "Wall", "Mender",
];

const FRAME_MILLIS: f64 = 1000.0 / 60.0;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

struct Options {
    verbose: bool,
    json: bool,
    seed: u64,
}

impl Options {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let seed = args
            .iter()
            .position(|a| a == "--seed")
            .and_then(|i| args.get(i + 1))
            .and_then(|s| s.parse().ok())
            .unwrap_or(42);
        Self {
            verbose: args.iter().any(|a| a == "--verbose"),
            json: args.iter().any(|a| a == "--json"),
            seed,
        }
    }
}

/// Final state dumped by `--json`
#[derive(Serialize)]
struct Snapshot {
    seed: u64,
    frame: u64,
    groups: Vec<Group>,
    tiles: Vec<TileView>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

fn main() {
    let options = Options::parse();
    init_logging();
    println!("=== Hexnet Simulation Harness (seed {}) ===\n", options.seed);

    let mut results = Vec::new();

    // 1. Structure catalog
    results.extend(validate_catalog(options.verbose));

    // 2. Hex graph geometry
    results.extend(validate_graph(options.verbose));

    // 3. Scripted end-to-end line
    results.extend(validate_line_scenario(options.verbose));

    // 4. Pipeline properties
    results.extend(validate_properties(options.verbose));

    // 5. Seeded runs: conservation and determinism
    results.extend(validate_seeded_runs(options.seed, options.verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || options.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if options.json {
        dump_snapshot(options.seed);
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn scenario_engine() -> Result<SimulationEngine, ConfigError> {
    let catalog = Catalog::from_json(SCENARIO_KINDS)?;
    SimulationEngine::with_config(SimulationConfig::default(), catalog)
}

fn spawn(engine: &mut SimulationEngine, kind: &str, agent: u32, q: i32, r: i32) -> Option<usize> {
    let index = engine.grid().graph().index(HexCoord::new(q, r))?;
    let template = engine.catalog().get(kind)?.clone();
    engine
        .spawn_scenario_tile(&template, AgentId(agent), index)
        .then_some(index)
}

fn seeded_engine(seed: u64) -> Result<SimulationEngine, ConfigError> {
    let mut engine = SimulationEngine::new()?;
    let mut rng = StdRng::seed_from_u64(seed);
    populate(&mut engine, AgentId(1), 100, &mut rng);
    populate(&mut engine, AgentId(2), 100, &mut rng);
    grow(&mut engine, AgentId(1), 10, 12, &mut rng);
    grow(&mut engine, AgentId(2), 10, 12, &mut rng);
    Ok(engine)
}

fn setup_failure(name: &str, e: ConfigError) -> Vec<TestResult> {
    vec![TestResult {
        name: name.into(),
        passed: false,
        detail: format!("setup failed: {}", e),
    }]
}

// ── 1. Structure Catalog ────────────────────────────────────────────────

fn validate_catalog(verbose: bool) -> Vec<TestResult> {
    println!("--- Structure Catalog ---");
    let mut results = Vec::new();

    let catalog = match Catalog::builtin() {
        Ok(c) => c,
        Err(e) => return setup_failure("catalog_parse", e),
    };

    results.push(TestResult {
        name: "catalog_not_empty".into(),
        passed: catalog.len() >= 13,
        detail: format!("{} structure kinds loaded", catalog.len()),
    });

    let roots: Vec<_> = catalog
        .iter()
        .filter(|t| t.placement == PlacementRule::Root)
        .map(|t| t.name.as_str())
        .collect();
    results.push(TestResult {
        name: "catalog_has_root_kind".into(),
        passed: !roots.is_empty(),
        detail: format!("root kinds: {:?}", roots),
    });

    let unplaceable: Vec<_> = catalog
        .iter()
        .filter(|t| t.placement == PlacementRule::Never)
        .map(|t| t.name.as_str())
        .collect();
    results.push(TestResult {
        name: "catalog_scenario_only_kinds".into(),
        passed: unplaceable == ["Portal"],
        detail: format!("never placeable: {:?}", unplaceable),
    });

    let emitters_without_upkeep: Vec<_> = catalog
        .iter()
        .filter(|t| t.modifier.is_some() && t.consumption.is_none())
        .map(|t| t.name.as_str())
        .collect();
    results.push(TestResult {
        name: "catalog_emitters_consume".into(),
        passed: emitters_without_upkeep.is_empty(),
        detail: if emitters_without_upkeep.is_empty() {
            "every modifier emitter has upkeep".into()
        } else {
            format!("emitters that can never fire: {:?}", emitters_without_upkeep)
        },
    });

    if verbose {
        for template in catalog.iter() {
            println!("  {} {} ({:?})", template.icon, template.name, template.placement);
        }
    }
    results
}

// ── 2. Hex Graph ────────────────────────────────────────────────────────

fn validate_graph(verbose: bool) -> Vec<TestResult> {
    println!("--- Hex Graph ---");
    let mut results = Vec::new();
    let grid = HexGrid::new(&GridConfig::default());
    let graph = grid.graph();

    let valid = graph.valid_indices().count();
    results.push(TestResult {
        name: "graph_hexagonal_area".into(),
        passed: valid == 61,
        detail: format!("{} valid cells on a 9x9 grid", valid),
    });

    let asymmetric: Vec<(usize, usize)> = graph
        .valid_indices()
        .flat_map(|a| graph.neighbors(a).iter().map(move |&b| (a, b)))
        .filter(|&(a, b)| !graph.neighbors(b).contains(&a))
        .collect();
    results.push(TestResult {
        name: "graph_adjacency_symmetric".into(),
        passed: asymmetric.is_empty(),
        detail: format!("{} one-way edges", asymmetric.len()),
    });

    let drift: Vec<usize> = graph
        .valid_indices()
        .filter(|&i| graph.center(i).and_then(|p| graph.index_at(p)) != Some(i))
        .collect();
    results.push(TestResult {
        name: "graph_cartesian_round_trip".into(),
        passed: drift.is_empty(),
        detail: format!("{} cells fail hex → cartesian → hex", drift.len()),
    });

    if verbose {
        let inner = graph
            .valid_indices()
            .filter(|&i| graph.neighbors(i).len() == 6)
            .count();
        println!("  {} interior cells with six neighbors", inner);
    }
    results
}

// ── 3. Line Scenario ────────────────────────────────────────────────────

fn validate_line_scenario(verbose: bool) -> Vec<TestResult> {
    println!("--- Line Scenario ---");
    let mut results = Vec::new();

    let mut engine = match scenario_engine() {
        Ok(e) => e,
        Err(e) => return setup_failure("line_setup", e),
    };
    let (Some(source), Some(_), Some(sink)) = (
        spawn(&mut engine, "Source", 1, 3, 4),
        spawn(&mut engine, "Relay", 1, 4, 4),
        spawn(&mut engine, "Sink", 1, 5, 4),
    ) else {
        return vec![TestResult {
            name: "line_setup".into(),
            passed: false,
            detail: "could not place scenario tiles".into(),
        }];
    };

    let first = engine.tick(FRAME_MILLIS);
    let pool = first.groups.first().map(|g| g.matter);
    let value = engine
        .view(sink)
        .and_then(|v| v.construction)
        .map(|c| c.value);
    results.push(TestResult {
        name: "line_tick1_funds_site".into(),
        passed: pool == Some(0) && value == Some(1),
        detail: format!("pool {:?}, site value {:?}", pool, value),
    });

    engine.tick(FRAME_MILLIS);
    let value = engine
        .view(sink)
        .and_then(|v| v.construction)
        .map(|c| c.value);
    results.push(TestResult {
        name: "line_tick2_reaches_max".into(),
        passed: value == Some(2),
        detail: format!("site value {:?}", value),
    });

    let third = engine.tick(FRAME_MILLIS);
    let view = engine.view(sink);
    let joined = engine
        .network()
        .group_of(source)
        .zip(engine.network().group_of(sink))
        .map_or(false, |(a, b)| a == b);
    results.push(TestResult {
        name: "line_site_completes".into(),
        passed: third.completed == [sink]
            && view.as_ref().map_or(false, |v| v.active)
            && view
                .as_ref()
                .and_then(|v| v.integrity.as_ref())
                .map_or(false, |h| h.value == h.max)
            && joined,
        detail: format!("completed {:?}, joined source group: {}", third.completed, joined),
    });

    if verbose {
        for line in view.map(|v| v.lines).unwrap_or_default() {
            println!("  {}", line);
        }
    }
    results
}

// ── 4. Pipeline Properties ──────────────────────────────────────────────

fn validate_properties(verbose: bool) -> Vec<TestResult> {
    println!("--- Pipeline Properties ---");
    let mut results = Vec::new();

    // Flood fill: A-B-C mutually adjacent, D foreign
    if let Ok(mut engine) = scenario_engine() {
        let cells = [
            spawn(&mut engine, "Relay", 1, 4, 4),
            spawn(&mut engine, "Relay", 1, 5, 4),
            spawn(&mut engine, "Relay", 1, 5, 3),
            spawn(&mut engine, "Relay", 2, 3, 4),
        ];
        engine.tick(FRAME_MILLIS);
        let expected: BTreeSet<usize> = cells[..3].iter().flatten().copied().collect();
        let found: BTreeSet<usize> = cells[0]
            .and_then(|a| engine.network().group_of(a))
            .and_then(|id| engine.network().group(id))
            .map(|g| g.members.iter().copied().collect())
            .unwrap_or_default();
        results.push(TestResult {
            name: "flood_fill_same_agent".into(),
            passed: expected.len() == 3 && found == expected,
            detail: format!("group {:?}", found),
        });
    }

    // Bootstrap: lone Extractor finishes in max ticks
    if let Ok(mut engine) = SimulationEngine::new() {
        let index = engine.grid().graph().index(HexCoord::new(4, 4));
        let placed = index.map_or(false, |i| engine.place("Extractor", AgentId(1), i));
        let max = engine
            .catalog()
            .get("Extractor")
            .and_then(|t| t.construction.as_ref())
            .map_or(0, |c| c.max);
        for _ in 0..max {
            engine.tick(FRAME_MILLIS);
        }
        let report = engine.tick(FRAME_MILLIS);
        results.push(TestResult {
            name: "construction_bootstrap".into(),
            passed: placed && index.map_or(false, |i| report.completed == [i]),
            detail: format!("completed {:?} after {} funded ticks", report.completed, max),
        });
    }

    // Armor amortization
    let mut health = Integrity::full(100);
    health.armor = 3;
    let mut drift = 0;
    for call in 1..=100u64 {
        let before = health.value;
        health.damage(1, call);
        let expected = i32::from(call % 4 == 0);
        if before - health.value != expected || health.remainder > health.armor {
            drift += 1;
        }
    }
    results.push(TestResult {
        name: "armor_amortization".into(),
        passed: drift == 0 && health.value == 75,
        detail: format!("value {} after 100 hits, {} drifted", health.value, drift),
    });

    // Modifier never applies to its emitter
    if let Ok(mut engine) = scenario_engine() {
        let booster = spawn(&mut engine, "Booster", 1, 4, 4);
        let neighbor = spawn(&mut engine, "Source", 1, 5, 4);
        engine.tick(FRAME_MILLIS);
        let own = booster
            .and_then(|i| engine.view(i))
            .and_then(|v| v.production)
            .map(|p| p.multiplier);
        let theirs = neighbor
            .and_then(|i| engine.view(i))
            .and_then(|v| v.production)
            .map(|p| p.multiplier);
        results.push(TestResult {
            name: "modifier_skips_emitter".into(),
            passed: own == Some(0) && theirs == Some(1),
            detail: format!("emitter multiplier {:?}, neighbor {:?}", own, theirs),
        });
    }

    // Destruction
    if let Ok(mut engine) = scenario_engine() {
        spawn(&mut engine, "Source", 1, 4, 4);
        let wall = spawn(&mut engine, "Wall", 1, 5, 4);
        engine.tick(FRAME_MILLIS);
        let hit = wall.map_or(false, |w| engine.damage(w, 4));
        let report = engine.tick(FRAME_MILLIS);
        let gone = wall.map_or(false, |w| {
            engine.grid().get(w).is_none() && report.groups.iter().all(|g| !g.members.contains(&w))
        });
        results.push(TestResult {
            name: "destroyed_cell_removed".into(),
            passed: hit && gone,
            detail: format!("destroyed {:?}", report.destroyed),
        });
    }

    if verbose {
        println!("  {} property checks", results.len());
    }
    results
}

// ── 5. Seeded Runs ──────────────────────────────────────────────────────

fn validate_seeded_runs(seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- Seeded Runs ---");
    let mut results = Vec::new();

    let (mut left, mut right) = match (seeded_engine(seed), seeded_engine(seed)) {
        (Ok(l), Ok(r)) => (l, r),
        (Err(e), _) | (_, Err(e)) => return setup_failure("seeded_setup", e),
    };
    info!(
        "seed {}: {} tiles, {} groups after growth",
        seed,
        left.views().len(),
        left.network().groups().len()
    );

    let mut overdrawn = 0;
    let mut diverged = None;
    let mut spawns = 0;
    for step in 0..120 {
        let a = left.tick(FRAME_MILLIS);
        let b = right.tick(FRAME_MILLIS);
        overdrawn += a.groups.iter().filter(|g| g.matter < 0).count();
        spawns += a.spawns.len();
        if diverged.is_none() && a != b {
            diverged = Some(step);
        }
    }

    results.push(TestResult {
        name: "conservation_pools_non_negative".into(),
        passed: overdrawn == 0,
        detail: format!("{} overdrawn group-ticks over 120 ticks", overdrawn),
    });
    results.push(match contested_run(seed) {
        Ok((violations, requested)) => TestResult {
            name: "conservation_contested".into(),
            passed: violations == 0 && requested > 0,
            detail: format!(
                "{} ticks held more than production + carried storage, {} matter requested",
                violations, requested
            ),
        },
        Err(e) => TestResult {
            name: "conservation_contested".into(),
            passed: false,
            detail: format!("setup failed: {}", e),
        },
    });
    results.push(TestResult {
        name: "determinism_reports".into(),
        passed: diverged.is_none(),
        detail: match diverged {
            Some(step) => format!("runs diverged at tick {}", step),
            None => "120 identical tick reports".into(),
        },
    });
    results.push(TestResult {
        name: "determinism_views".into(),
        passed: left.views() == right.views(),
        detail: format!("{} tiles compared", left.views().len()),
    });

    if verbose {
        println!("  {} spawn requests emitted", spawns);
        for group in left.network().groups() {
            println!(
                "  group {} {}: {} tiles, matter {}, production {}, consumption {}, stored {}",
                group.id.0,
                group.agent,
                group.len(),
                group.matter,
                group.production,
                group.consumption,
                group.stored
            );
        }
    }
    results
}

/// Scatter consumers, repairers, sites and stores for two agents, damage a
/// random tile every tick, and count agent-ticks whose pools plus storage end
/// up above what production and carried storage supplied.
fn contested_run(seed: u64) -> Result<(usize, i32), ConfigError> {
    let mut engine = scenario_engine()?;
    let mut rng = StdRng::seed_from_u64(seed);
    let addresses: Vec<usize> = engine.grid().graph().valid_indices().collect();
    for index in addresses {
        if rng.gen_bool(0.25) {
            continue;
        }
        let kind = CONTESTED_KINDS[rng.gen_range(0..CONTESTED_KINDS.len())];
        if let Some(template) = engine.catalog().get(kind).cloned() {
            engine.spawn_scenario_tile(&template, AgentId(rng.gen_range(1..=2)), index);
        }
    }

    let agents = [AgentId(1), AgentId(2)];
    let occupied: Vec<usize> = engine.views().iter().map(|v| v.index).collect();
    let (mut violations, mut requested) = (0, 0);
    for _ in 0..120 {
        let views = engine.views();
        let carried = agents.map(|agent| {
            views
                .iter()
                .filter(|v| v.agent == agent && v.active && !v.suspended)
                .filter_map(|v| v.collection.as_ref())
                .map(|c| c.value)
                .sum::<i32>()
        });
        if !occupied.is_empty() {
            let target = occupied[rng.gen_range(0..occupied.len())];
            engine.damage(target, rng.gen_range(1..=3));
        }
        let report = engine.tick(FRAME_MILLIS);

        for (agent, carried) in agents.into_iter().zip(carried) {
            let (mut available, mut held) = (carried, 0);
            for group in report.groups.iter().filter(|g| g.agent == agent) {
                available += group.production;
                held += group.matter + group.stored;
                requested += group.consumption;
            }
            if held > available {
                violations += 1;
            }
        }
    }
    Ok((violations, requested))
}

fn dump_snapshot(seed: u64) {
    let mut engine = match seeded_engine(seed) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("snapshot setup failed: {}", e);
            return;
        }
    };
    let report = engine.tick(FRAME_MILLIS);
    let snapshot = Snapshot {
        seed,
        frame: report.frame,
        groups: report.groups,
        tiles: engine.views(),
    };
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("snapshot serialization failed: {}", e),
    }
}
