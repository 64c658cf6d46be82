//! HallPlan Headless Harness
//!
//! Sweeps the pure layout logic over randomly generated buildings, then
//! drives the authoring and browsing sessions end to end against the
//! in-memory tables. No network, no rendering.
//!
//! Usage:
//!   cargo run -p hallplan-simtest
//!   cargo run -p hallplan-simtest -- --verbose --seed 7 --iterations 2000
//!   cargo run -p hallplan-simtest -- --config server.json

use hallplan_logic::grid::{
    authoring_grid, authoring_to_browsing, browsing_grid, GridCache, GridCell,
};
use hallplan_logic::occupancy::{CellState, Occupant, RequestEvent, RequestStatus, RoomType};
use hallplan_logic::placement::{LayoutDraft, LayoutRecord, PlacementError};
use hallplan_logic::shape::{
    validate_shape, Orientation, ShapeConfig, ShapeError, ShapeKind, Side,
};
use hallplan_logic::slot::{
    index_to_letters, letters_to_index, room_number_to_slot, slot_to_room_number, SlotAddress,
};
use hallplan_server::reducers::{
    cancel_room_request, commit_layout, edit_shape, open_draft, submit_room_request,
};
use hallplan_server::{BrowseSession, MemoryTables, ServerConfig, SessionError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::time::Duration;

// ── Room type catalog (seed data for the sessions) ──────────────────────
const ROOM_TYPES_JSON: &str = include_str!("../data/room_types.json");

const DEFAULT_SEED: u64 = 0x4841_4c4c;
const DEFAULT_ITERATIONS: usize = 500;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

struct Args {
    verbose: bool,
    seed: u64,
    iterations: usize,
    config_path: Option<String>,
}

fn parse_args() -> Args {
    let mut args = Args {
        verbose: false,
        seed: DEFAULT_SEED,
        iterations: DEFAULT_ITERATIONS,
        config_path: None,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--verbose" => args.verbose = true,
            "--seed" => {
                if let Some(seed) = it.next().and_then(|s| s.parse().ok()) {
                    args.seed = seed;
                }
            }
            "--iterations" => {
                if let Some(n) = it.next().and_then(|s| s.parse().ok()) {
                    args.iterations = n;
                }
            }
            "--config" => args.config_path = it.next(),
            other => eprintln!("ignoring unknown argument: {}", other),
        }
    }
    args
}

fn main() {
    let args = parse_args();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "warn" }),
    )
    .init();

    println!("=== HallPlan Harness (seed {}) ===\n", args.seed);
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut results = Vec::new();

    // 1. Runtime settings
    let (config_results, config) = load_config(args.config_path.as_deref());
    results.extend(config_results);

    // 2. Room type catalog
    let (catalog_results, catalog) = validate_room_catalog(args.verbose);
    results.extend(catalog_results);

    // 3. Room-number codec
    results.extend(validate_codec(args.verbose));

    // 4. Random shape sweep
    results.extend(validate_shape_sweep(&mut rng, args.iterations, args.verbose));

    // 5. Draft lifecycle over random placements
    results.extend(validate_draft_lifecycle(
        &mut rng,
        &catalog,
        args.iterations / 5,
        args.verbose,
    ));

    // 6. Sessions against in-memory tables
    results.extend(validate_sessions(&catalog, &config, args.verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Counts property violations across a sweep and keeps the first example.
#[derive(Default)]
struct Tally {
    checked: usize,
    failures: usize,
    first: Option<String>,
}

impl Tally {
    fn check(&mut self, ok: bool, describe: impl FnOnce() -> String) {
        self.checked += 1;
        if !ok {
            self.failures += 1;
            if self.first.is_none() {
                self.first = Some(describe());
            }
        }
    }

    fn into_result(self, name: &str) -> TestResult {
        TestResult {
            name: name.into(),
            passed: self.failures == 0,
            detail: match self.first {
                None => format!("{} checks", self.checked),
                Some(first) => format!(
                    "{}/{} checks failed, first: {}",
                    self.failures, self.checked, first
                ),
            },
        }
    }
}

fn random_shape(rng: &mut StdRng) -> ShapeConfig {
    const KINDS: [ShapeKind; 4] = [
        ShapeKind::Single,
        ShapeKind::L,
        ShapeKind::U,
        ShapeKind::Square,
    ];
    const ORIENTATIONS: [Orientation; 4] = [
        Orientation::TopLeft,
        Orientation::TopRight,
        Orientation::BottomLeft,
        Orientation::BottomRight,
    ];
    let mut shape = ShapeConfig {
        shape_kind: KINDS[rng.gen_range(0..KINDS.len())],
        floors: rng.gen_range(1..=6),
        top_count: rng.gen_range(0..=12),
        bottom_count: rng.gen_range(0..=12),
        left_count: rng.gen_range(0..=8),
        right_count: rng.gen_range(0..=8),
        orientation: ORIENTATIONS[rng.gen_range(0..ORIENTATIONS.len())],
        open_side: Side::ALL[rng.gen_range(0..Side::ALL.len())],
        entrance_side: Some(Side::ALL[rng.gen_range(0..Side::ALL.len())]),
    };
    shape.normalize_entrance();
    shape
}

/// A random shape that commits.
fn random_committable_shape(rng: &mut StdRng) -> ShapeConfig {
    loop {
        let mut shape = random_shape(rng);
        if shape.entrance_side.is_none() {
            shape.entrance_side = shape.valid_entrance_sides().iter().next();
        }
        if validate_shape(&shape).is_empty() {
            return shape;
        }
    }
}

fn authoring_slots(shape: &ShapeConfig) -> Vec<SlotAddress> {
    let grid = authoring_grid(shape);
    (0..shape.floors)
        .flat_map(|f| {
            grid.room_cells()
                .map(move |(r, c, _)| SlotAddress::new(f, r, c))
                .collect::<Vec<_>>()
        })
        .collect()
}

// ── 1. Runtime Settings ─────────────────────────────────────────────────

fn load_config(path: Option<&str>) -> (Vec<TestResult>, ServerConfig) {
    println!("--- Runtime Settings ---");
    let mut results = Vec::new();

    let config = match path {
        None => ServerConfig::default(),
        Some(path) => {
            let parsed = std::fs::read_to_string(path)
                .map_err(|e| e.to_string())
                .and_then(|json| ServerConfig::from_json(&json).map_err(|e| e.to_string()));
            match parsed {
                Ok(config) => config,
                Err(e) => {
                    results.push(TestResult {
                        name: "config_parse".into(),
                        passed: false,
                        detail: format!("{}: {}", path, e),
                    });
                    ServerConfig::default()
                }
            }
        }
    };

    let errors = config.validate();
    results.push(TestResult {
        name: "config_valid".into(),
        passed: errors.is_empty(),
        detail: if errors.is_empty() {
            format!(
                "{} concurrent fetches, {} ms timeout",
                config.max_concurrent_fetches, config.occupant_fetch_timeout_ms
            )
        } else {
            errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
        },
    });

    (results, config)
}

// ── 2. Room Type Catalog ────────────────────────────────────────────────

fn validate_room_catalog(verbose: bool) -> (Vec<TestResult>, Vec<RoomType>) {
    println!("--- Room Type Catalog ---");
    let mut results = Vec::new();

    let catalog: Vec<RoomType> = match serde_json::from_str(ROOM_TYPES_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult {
                name: "catalog_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return (results, Vec::new());
        }
    };

    results.push(TestResult {
        name: "catalog_not_empty".into(),
        passed: !catalog.is_empty(),
        detail: format!("{} room types loaded", catalog.len()),
    });

    let keys: HashSet<&str> = catalog.iter().map(|t| t.key.as_str()).collect();
    results.push(TestResult {
        name: "catalog_unique_keys".into(),
        passed: keys.len() == catalog.len(),
        detail: format!("{} distinct keys", keys.len()),
    });

    let bad_cap: Vec<_> = catalog.iter().filter(|t| t.capacity == 0).collect();
    results.push(TestResult {
        name: "catalog_positive_capacity".into(),
        passed: bad_cap.is_empty(),
        detail: if bad_cap.is_empty() {
            "all room types hold someone".into()
        } else {
            format!("{} room types with zero capacity", bad_cap.len())
        },
    });

    if verbose {
        for t in &catalog {
            println!("  {:<12} {:<20} cap {}", t.key, t.name, t.capacity);
        }
    }

    (results, catalog)
}

// ── 3. Room-Number Codec ────────────────────────────────────────────────

fn validate_codec(verbose: bool) -> Vec<TestResult> {
    println!("--- Room-Number Codec ---");
    let mut results = Vec::new();

    let known = [(0, "A"), (25, "Z"), (26, "AA"), (701, "ZZ"), (702, "AAA")];
    let bad: Vec<_> = known
        .iter()
        .filter(|(n, s)| index_to_letters(*n) != *s)
        .collect();
    results.push(TestResult {
        name: "letters_known_values".into(),
        passed: bad.is_empty(),
        detail: format!("{} known values, {} wrong", known.len(), bad.len()),
    });

    let mut tally = Tally::default();
    for n in 0..=100_000u64 {
        tally.check(letters_to_index(&index_to_letters(n)) == Some(n), || {
            format!("n = {}", n)
        });
    }
    tally.check(
        letters_to_index(&index_to_letters(u64::MAX)) == Some(u64::MAX),
        || "u64::MAX".into(),
    );
    results.push(tally.into_result("letters_roundtrip"));

    let parsed = room_number_to_slot("3-B12", 5);
    results.push(TestResult {
        name: "room_number_example".into(),
        passed: parsed == Some(SlotAddress::new(2, 1, 11)),
        detail: format!("3-B12 on 5 floors → {:?}", parsed),
    });

    let malformed = ["X-B12", "3B12", "3-12", "3-B", "3-B-12", "", "-A1", "3-A1x"];
    let accepted: Vec<_> = malformed
        .iter()
        .filter(|s| room_number_to_slot(s, 5).is_some())
        .collect();
    results.push(TestResult {
        name: "room_number_rejects_malformed".into(),
        passed: accepted.is_empty(),
        detail: if accepted.is_empty() {
            format!("{} malformed numbers rejected", malformed.len())
        } else {
            format!("accepted {:?}", accepted)
        },
    });

    if verbose {
        println!("  ZZ+1 = {}", index_to_letters(702));
    }

    results
}

// ── 4. Shape Sweep ──────────────────────────────────────────────────────

fn validate_shape_sweep(rng: &mut StdRng, iterations: usize, verbose: bool) -> Vec<TestResult> {
    println!("--- Shape Sweep ({} buildings) ---", iterations);

    let mut entrance = Tally::default();
    let mut determinism = Tally::default();
    let mut room_counts = Tally::default();
    let mut wing_mapping = Tally::default();
    let mut walkways = Tally::default();
    let mut numbering = Tally::default();
    let mut cache = GridCache::default();
    let mut cache_agrees = Tally::default();
    let mut invalid = 0usize;

    for _ in 0..iterations {
        let shape = random_shape(rng);
        let errors = validate_shape(&shape);
        if !errors.is_empty() {
            invalid += 1;
        }
        entrance.check(
            !errors
                .iter()
                .any(|e| matches!(e, ShapeError::EntranceNotPresent { .. })),
            || format!("{:?} → {:?}", shape, errors),
        );

        let browsing = browsing_grid(&shape);
        let authoring = authoring_grid(&shape);
        determinism.check(
            browsing == browsing_grid(&shape) && authoring == authoring_grid(&shape),
            || format!("{:?}", shape),
        );

        let authoring_rooms = authoring.count(GridCell::is_room) as u32;
        room_counts.check(authoring_rooms == shape.rooms_per_floor(), || {
            format!(
                "{:?}: authoring {} vs {}",
                shape,
                authoring_rooms,
                shape.rooms_per_floor()
            )
        });

        // every authoring room lands on a browsing room of the same wing
        let mut targets = HashSet::new();
        for (r, c, side) in authoring.room_cells() {
            let target = authoring_to_browsing(&shape, r, c);
            let landed = target.and_then(|(br, bc)| browsing.get(br, bc));
            wing_mapping.check(
                matches!(landed, Some(GridCell::Room(s)) if s == side || browsing.width() == 1),
                || format!("{:?}: ({}, {}) → {:?} = {:?}", shape, r, c, target, landed),
            );
            if let Some(target) = target {
                targets.insert(target);
            }
        }
        if browsing.width() > 1 {
            wing_mapping.check(targets.len() as u32 == authoring_rooms, || {
                format!("{:?}: {} distinct targets", shape, targets.len())
            });
        }

        let present = shape.present_sides();
        for (_, _, cell) in authoring.iter() {
            if let GridCell::Walkway(side) = cell {
                walkways.check(present.contains(side), || {
                    format!("{:?}: walkway on {}", shape, side)
                });
            }
        }

        for floor in 0..shape.floors {
            for (r, c, _) in browsing.room_cells() {
                let slot = SlotAddress::new(floor, r, c);
                let number = slot_to_room_number(slot, shape.floors);
                numbering.check(
                    room_number_to_slot(&number, shape.floors) == Some(slot),
                    || format!("{} on {} floors", number, shape.floors),
                );
            }
        }

        cache_agrees.check(
            *cache.browsing(&shape) == browsing && *cache.authoring(&shape) == authoring,
            || format!("{:?}", shape),
        );
    }

    let (hits, misses) = cache.stats();
    if verbose {
        println!(
            "  {} invalid shapes (expected: zero rooms or no entrance), cache {} hits / {} misses",
            invalid, hits, misses
        );
    }

    vec![
        entrance.into_result("shape_entrance_normalized"),
        determinism.into_result("grid_deterministic"),
        room_counts.into_result("authoring_room_count"),
        wing_mapping.into_result("authoring_maps_to_browsing"),
        walkways.into_result("walkways_on_present_wings"),
        numbering.into_result("room_number_roundtrip"),
        cache_agrees.into_result("grid_cache_consistent"),
    ]
}

// ── 5. Draft Lifecycle ──────────────────────────────────────────────────

fn validate_draft_lifecycle(
    rng: &mut StdRng,
    catalog: &[RoomType],
    iterations: usize,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Draft Lifecycle ({} layouts) ---", iterations);
    if catalog.is_empty() {
        return vec![TestResult {
            name: "draft_lifecycle".into(),
            passed: false,
            detail: "no room types to place".into(),
        }];
    }

    let mut record_roundtrip = Tally::default();
    let mut materialized = Tally::default();
    let mut palette = Tally::default();
    let mut pruning = Tally::default();
    let mut placed_total = 0usize;
    let mut shared = 0usize;

    for _ in 0..iterations {
        let shape = random_committable_shape(rng);
        let mut draft = LayoutDraft::new(shape.clone());
        for slot in authoring_slots(&shape) {
            if rng.gen_bool(0.6) {
                let key = &catalog[rng.gen_range(0..catalog.len())].key;
                match draft.place(slot, key.as_str()) {
                    Ok(_) => {}
                    // one-column halls: left and right share a browsing cell
                    Err(PlacementError::SharedBrowsingCell { .. }) => shared += 1,
                    Err(e) => {
                        materialized.check(false, || format!("{:?}: {} at {}", shape, e, slot));
                    }
                }
            }
        }
        placed_total += draft.placements().len();

        // commit, serialize, and resume
        let record = match draft.commit() {
            Ok(r) => r,
            Err(e) => {
                record_roundtrip.check(false, || format!("{:?}: {}", shape, e));
                continue;
            }
        };
        let resumed = serde_json::to_string(&record)
            .ok()
            .and_then(|json| serde_json::from_str::<LayoutRecord>(&json).ok())
            .and_then(|r| LayoutDraft::from_record(&r).ok());
        record_roundtrip.check(
            resumed.as_ref().map(|d| d.placements()) == Some(draft.placements()),
            || format!("{:?}", shape),
        );

        let rooms = draft.materialize_rooms();
        let numbers: HashSet<&str> = rooms.iter().map(|r| r.room_number.as_str()).collect();
        materialized.check(
            rooms.len() == draft.placements().len() && numbers.len() == rooms.len(),
            || format!("{:?}: {} rooms, {} numbers", shape, rooms.len(), numbers.len()),
        );

        let summed: usize = draft.palette_summary().values().sum();
        palette.check(summed == draft.placements().len(), || {
            format!("{:?}: palette {} vs {}", shape, summed, draft.placements().len())
        });

        // shrink every wing; survivors plus removed must account for all
        let before = draft.placements().len();
        let mut smaller = shape.clone();
        smaller.top_count /= 2;
        smaller.bottom_count /= 2;
        smaller.left_count /= 2;
        smaller.right_count /= 2;
        let report = draft.set_shape(smaller);
        pruning.check(
            report.removed.len() + draft.placements().len() == before
                && draft.stale_slots().is_empty(),
            || format!("{:?}: {} removed of {}", shape, report.removed.len(), before),
        );
    }

    if verbose {
        println!(
            "  {} placements across {} layouts, {} rejected on shared cells",
            placed_total, iterations, shared
        );
    }

    vec![
        record_roundtrip.into_result("layout_record_roundtrip"),
        materialized.into_result("materialized_rooms_unique"),
        palette.into_result("palette_summary_total"),
        pruning.into_result("shape_edit_prunes"),
    ]
}

// ── 6. Sessions ─────────────────────────────────────────────────────────

fn validate_sessions(
    catalog: &[RoomType],
    config: &ServerConfig,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Sessions (in-memory tables) ---");
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            return vec![TestResult {
                name: "session_runtime".into(),
                passed: false,
                detail: format!("cannot start runtime: {}", e),
            }];
        }
    };
    runtime.block_on(run_sessions(catalog, config, verbose))
}

fn hall_shape() -> ShapeConfig {
    ShapeConfig {
        shape_kind: ShapeKind::U,
        floors: 3,
        top_count: 5,
        bottom_count: 0,
        left_count: 3,
        right_count: 3,
        open_side: Side::Bottom,
        entrance_side: Some(Side::Top),
        ..ShapeConfig::default()
    }
}

async fn run_sessions(
    catalog: &[RoomType],
    config: &ServerConfig,
    verbose: bool,
) -> Vec<TestResult> {
    let mut results = Vec::new();
    let backend = MemoryTables::new();
    backend.set_room_types(catalog.to_vec());
    let Some(room_type) = catalog.iter().find(|t| t.capacity >= 2).or(catalog.first()) else {
        results.push(TestResult {
            name: "session_seed".into(),
            passed: false,
            detail: "no room types to place".into(),
        });
        return results;
    };

    // Authoring: invalid entrance is blocked, a valid layout commits
    let mut draft = match open_draft(&backend).await {
        Ok(d) => d,
        Err(e) => {
            results.push(TestResult {
                name: "session_open_draft".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };
    let mut no_entrance = hall_shape();
    no_entrance.entrance_side = None;
    edit_shape(&mut draft, no_entrance);
    let blocked = commit_layout(&backend, &draft).await;
    results.push(TestResult {
        name: "commit_requires_entrance".into(),
        passed: matches!(blocked, Err(SessionError::InvalidShape(_))) && backend.layout().is_none(),
        detail: match &blocked {
            Err(e) => e.to_string(),
            Ok(_) => "saved without an entrance".into(),
        },
    });

    edit_shape(&mut draft, hall_shape());
    for slot in authoring_slots(draft.shape()) {
        if draft.place(slot, room_type.key.as_str()).is_err() {
            log::warn!("could not place {} at {}", room_type.key, slot);
        }
    }
    let committed = commit_layout(&backend, &draft).await;
    let expected_rooms = hall_shape().rooms_per_floor() as usize * hall_shape().floors as usize;
    results.push(TestResult {
        name: "commit_materializes_rooms".into(),
        passed: committed.is_ok() && backend.rooms().len() == expected_rooms,
        detail: format!("{} rooms materialized", backend.rooms().len()),
    });

    // Browsing: occupants, a failing fetch, and a request
    let rooms = backend.rooms();
    let (full_room, broken_room, open_room) = match rooms.as_slice() {
        [a, b, c, ..] => (a.room_id, b.room_id, c.room_id),
        _ => {
            results.push(TestResult {
                name: "session_rooms".into(),
                passed: false,
                detail: format!("only {} rooms", rooms.len()),
            });
            return results;
        }
    };
    for i in 0..room_type.capacity {
        backend.add_occupant(
            full_room,
            Occupant {
                user_id: 1000 + i,
                name: format!("Resident {}", i + 1),
                roll_number: format!("R{:04}", 1000 + i),
            },
        );
    }
    backend.fail_occupants_for(broken_room);

    let session = BrowseSession::new(config.clone());
    let view = match session.load(&backend).await {
        Ok(v) => v,
        Err(e) => {
            results.push(TestResult {
                name: "browse_load".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };
    results.push(TestResult {
        name: "browse_places_every_room".into(),
        passed: view.room_count() == expected_rooms && view.excluded.is_empty(),
        detail: format!(
            "{} placed, {} excluded across {} floors",
            view.room_count(),
            view.excluded.len(),
            view.floors.len()
        ),
    });
    results.push(TestResult {
        name: "browse_full_room".into(),
        passed: view.room(full_room).map(|r| r.state) == Some(CellState::Full),
        detail: format!("{:?}", view.room(full_room).map(|r| r.state)),
    });
    results.push(TestResult {
        name: "browse_degrades_failed_fetch".into(),
        passed: view.occupant_fetch_failures == vec![broken_room]
            && view.room(broken_room).map(|r| r.occupants.is_empty()) == Some(true),
        detail: format!("failures: {:?}", view.occupant_fetch_failures),
    });

    let request = submit_room_request(&backend, &view, open_room).await;
    let refused_full = submit_room_request(&backend, &view, full_room).await;
    results.push(TestResult {
        name: "request_open_room".into(),
        passed: matches!(&request, Ok(r) if r.status == RequestStatus::Pending)
            && refused_full.is_err(),
        detail: format!("open → {:?}, full → {:?}", request.is_ok(), refused_full.is_ok()),
    });

    if let Ok(request) = request {
        let reloaded = session.load(&backend).await.ok();
        let pinned = reloaded
            .as_ref()
            .and_then(|v| v.room(open_room))
            .map(|r| r.state);
        results.push(TestResult {
            name: "request_pins_cell".into(),
            passed: pinned == Some(CellState::Requested(RequestStatus::Pending)),
            detail: format!("{:?}", pinned),
        });

        let cancelled = cancel_room_request(&backend, &request).await;
        let resubmitted = match session.load(&backend).await {
            Ok(v) => submit_room_request(&backend, &v, open_room).await,
            Err(e) => Err(e),
        };
        let approved = resubmitted
            .as_ref()
            .ok()
            .and_then(|r| backend.decide_request(r.request_id, RequestEvent::Approve).ok());
        let late_cancel = match &approved {
            Some(r) => cancel_room_request(&backend, r).await.is_err(),
            None => false,
        };
        results.push(TestResult {
            name: "request_lifecycle".into(),
            passed: cancelled.is_ok() && approved.is_some() && late_cancel,
            detail: format!(
                "cancel {:?}, approve {:?}, approved cancel refused {}",
                cancelled.map(|r| r.status),
                approved.map(|r| r.status),
                late_cancel
            ),
        });
    }

    // Cancellation: tearing down the view drops in-flight fetches
    backend.set_occupant_delay(Duration::from_secs(10));
    let doomed = BrowseSession::new(config.clone());
    let load = doomed.load(&backend);
    let unmount = async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(doomed);
    };
    let (outcome, ()) = tokio::join!(load, unmount);
    let (started, finished) = backend.occupant_fetch_counts();
    results.push(TestResult {
        name: "browse_cancel_on_drop".into(),
        passed: matches!(outcome, Err(SessionError::Cancelled)),
        detail: format!("{} fetches started, {} finished overall", started, finished),
    });

    if verbose {
        for floor in &view.floors {
            println!(
                "  floor {}: {} rooms",
                floor.floor_number,
                floor.rooms().count()
            );
        }
    }

    results
}
