//! End-to-end scenarios over the public API.

use planecolor::conflict::{first_fit_coloring, Optimizer};
use planecolor::heuristics::{Algorithm, Color as _};
use planecolor::instance::Instance;
use planecolor::params::Parameters;
use planecolor::solution::{read_labels, Writer};
use planecolor::{Clock, Coloring, Core, CrossingMap, SegIdx};

fn geometry_core(pairs: &[((i64, i64), (i64, i64))], seed: u64) -> Core {
    let text = cgshop_json(pairs);
    let instance = Instance::from_json(&text).unwrap();
    Core::seeded(instance.segments, instance.crossings, seed)
}

/// Render endpoint pairs as a CG:SHOP instance document, two fresh vertices
/// per segment.
fn cgshop_json(pairs: &[((i64, i64), (i64, i64))]) -> String {
    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut edge_i = Vec::new();
    let mut edge_j = Vec::new();
    for (p, q) in pairs {
        edge_i.push(x.len());
        x.push(p.0);
        y.push(p.1);
        edge_j.push(x.len());
        x.push(q.0);
        y.push(q.1);
    }
    serde_json::json!({
        "type": "Instance_CGSHOP2022",
        "id": "scenario",
        "x": x,
        "y": y,
        "edge_i": edge_i,
        "edge_j": edge_j,
    })
    .to_string()
}

fn constructives() -> Vec<Algorithm> {
    vec![
        Algorithm::Greedy,
        Algorithm::Angle,
        Algorithm::Bad,
        Algorithm::DSatur,
        Algorithm::DSatHull,
    ]
}

fn colors_for_all(pairs: &[((i64, i64), (i64, i64))]) -> Vec<usize> {
    constructives()
        .into_iter()
        .enumerate()
        .map(|(seed, algo)| {
            let mut core = geometry_core(pairs, seed as u64);
            let coloring = algo.constructive().unwrap().color(&mut core).unwrap();
            assert!(coloring.is_valid(&core.crossings), "{algo:?} broke a class");
            coloring.num_colors()
        })
        .collect()
}

#[test]
fn crossing_pair_takes_two_colors() {
    let pairs = [((0, 0), (10, 0)), ((5, -5), (5, 5))];
    assert!(colors_for_all(&pairs).iter().all(|&c| c == 2));
}

#[test]
fn disjoint_collinear_segments_take_one_color() {
    let pairs = [((0, 0), (2, 0)), ((3, 0), (5, 0)), ((6, 0), (8, 0))];
    assert!(colors_for_all(&pairs).iter().all(|&c| c == 1));
}

#[test]
fn shared_endpoints_take_one_color() {
    let pairs = [((0, 0), (1, 1)), ((1, 1), (2, 0)), ((0, 0), (2, 0))];
    assert!(colors_for_all(&pairs).iter().all(|&c| c == 1));
}

#[test]
fn pierced_triangle_takes_two_colors() {
    // A triangle and a fourth segment through its apex: the fourth meets all
    // three sides, the sides only meet each other at shared endpoints.
    let pairs = [
        ((0, 0), (12, 0)),
        ((0, 0), (6, 12)),
        ((12, 0), (6, 12)),
        ((5, 18), (9, -6)),
    ];
    assert!(colors_for_all(&pairs).iter().all(|&c| c == 2));
}

#[test]
fn fan_through_an_apex_takes_one_color() {
    let pairs: Vec<_> = (1..=6i64).map(|i| ((0, 0), (12, i))).collect();
    assert!(colors_for_all(&pairs).iter().all(|&c| c == 1));
}

#[test]
fn single_segment_takes_one_color() {
    let pairs = [((0, 0), (3, 7))];
    assert!(colors_for_all(&pairs).iter().all(|&c| c == 1));
}

#[test]
fn pairwise_crossing_bundle_takes_all_colors() {
    // Five segments through the origin with distinct slopes: a clique.
    let pairs: Vec<_> = [1i64, 2, 5, -3, -8]
        .iter()
        .map(|&s| ((-10, -s), (10, s)))
        .collect();
    assert!(colors_for_all(&pairs).iter().all(|&c| c == 5));
}

#[test]
fn duplicate_segments_share_a_color() {
    let pairs = [((0, 0), (4, 4)), ((0, 0), (4, 4))];
    assert!(colors_for_all(&pairs).iter().all(|&c| c == 1));
}

#[test]
fn dimacs_k5_takes_five_colors_and_cannot_improve() {
    let text = serde_json::json!({
        "type": "graph",
        "id": "k5",
        "edges": 5,
        "pairs": (1..=5u32)
            .flat_map(|i| (i + 1..=5).map(move |j| [i, j]))
            .collect::<Vec<_>>(),
    })
    .to_string();
    let instance = Instance::from_json(&text).unwrap();
    let map = instance.crossings;

    for algo in [Algorithm::Greedy, Algorithm::DSatur] {
        let mut core = Core::seeded(None, map.clone(), 9);
        let coloring = algo.constructive().unwrap().color(&mut core).unwrap();
        assert_eq!(coloring.num_colors(), 5);
    }

    let params = Parameters {
        max_queue: 2,
        dfs: false,
        easy: false,
        ..Parameters::default()
    };
    let mut core = Core::seeded(None, map, 9);
    let initial = first_fit_coloring(&core);
    assert_eq!(initial.num_colors(), 5);
    let mut optimizer = Optimizer::new(&mut core, initial, &params, Clock::new(1)).unwrap();
    let mut improvements = Vec::new();
    let outcome = optimizer.run(|coloring, _| improvements.push(coloring.num_colors()));
    assert!(improvements.is_empty());
    if outcome.is_ok() {
        assert_eq!(optimizer.coloring().num_colors(), 5);
    }
}

#[test]
fn optimizer_recovers_from_a_wasteful_start() {
    // A diamond (four segments, five of the six pairs crossing): three
    // colors suffice, the warm start wastes four.
    let map = CrossingMap::from_edges(4, vec![(0, 1), (0, 3), (1, 2), (1, 3), (2, 3)]);
    let start = Coloring::from_labels(&[0, 1, 2, 3]);
    assert!(start.is_valid(&map));

    let params = Parameters {
        max_queue: 4,
        easy: false,
        ..Parameters::default()
    };
    let mut core = Core::seeded(None, map, 13);
    let mut optimizer = Optimizer::new(&mut core, start, &params, Clock::new(1)).unwrap();
    let mut improvements = Vec::new();
    let outcome = optimizer.run(|coloring, _| {
        improvements.push((coloring.num_colors(), coloring.labels().is_some()));
    });

    assert_eq!(improvements.first(), Some(&(3, true)));
    // Color counts only ever go down.
    assert!(improvements.windows(2).all(|w| w[1].0 < w[0].0));
    if outcome.is_ok() {
        let final_coloring = optimizer.coloring();
        drop(optimizer);
        assert_eq!(final_coloring.num_colors(), 3);
        assert!(final_coloring.is_valid(&core.crossings));
    }
}

#[test]
fn solution_files_round_trip() {
    let pairs = [((0, 0), (10, 0)), ((5, -5), (5, 5)), ((20, 0), (30, 1))];
    let mut core = geometry_core(&pairs, 17);
    let coloring = Algorithm::Greedy
        .constructive()
        .unwrap()
        .color(&mut core)
        .unwrap();

    let path = std::env::temp_dir().join(format!(
        "planecolor-roundtrip-{}.sol.json",
        std::process::id()
    ));
    let writer = Writer::new("scenario", "scenario.json", "greedy");
    writer.write_to(&path, &coloring, 0.5).unwrap();

    let labels = read_labels(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(labels.len(), 3);
    let reread = Coloring::from_labels(&labels);
    assert_eq!(reread.color_of(), coloring.color_of());
    assert!(reread.is_valid(&core.crossings));
}

#[test]
fn every_heuristic_covers_every_segment() {
    let pairs: Vec<_> = (0..7)
        .map(|i| ((i, 0), (6 - i, 10)))
        .map(|((a, b), (c, d))| ((a as i64, b as i64), (c as i64, d as i64)))
        .collect();
    for (seed, algo) in constructives().into_iter().enumerate() {
        let mut core = geometry_core(&pairs, seed as u64);
        let coloring = algo.constructive().unwrap().color(&mut core).unwrap();
        let colored = coloring.color_of().iter().filter(|c| c.is_some()).count();
        assert_eq!(colored, pairs.len(), "{algo:?} left segments uncolored");
        assert_eq!(coloring.num_segments(), pairs.len());
    }
}

#[test]
fn clique_side_info_marks_optimality_immediately() {
    let edges: Vec<_> = (0..4).flat_map(|i| (i + 1..4).map(move |j| (i, j))).collect();
    let map = CrossingMap::from_edges(4, edges);
    let mut core =
        Core::seeded(None, map, 21).with_clique((0..4).map(SegIdx).collect());
    let initial = first_fit_coloring(&core);
    let params = Parameters {
        max_queue: 8,
        ..Parameters::default()
    };
    let mut optimizer = Optimizer::new(&mut core, initial, &params, Clock::new(3600)).unwrap();
    let mut called = false;
    optimizer.run(|_, _| called = true).unwrap();
    assert!(!called);
    assert_eq!(optimizer.coloring().num_colors(), 4);
}
