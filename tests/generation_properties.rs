//! Property tests for level generation: determinism, grid bounds and
//! start-to-exit connectivity across arbitrary seeds and viewports.

use delve::*;
use pathfinding::prelude::bfs;
use proptest::prelude::*;

fn exit_path_len(nav: &NavGrid) -> Option<usize> {
    let map = nav.map();
    bfs(&map.start(), |p| nav.neighbors4(*p), |p| *p == map.exit()).map(|path| path.len())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_generation_is_deterministic(
        floor in 0u32..40,
        seed in any::<u32>(),
        width in 320.0f64..2400.0,
        height in 240.0f64..1600.0,
    ) {
        let a = generate_level(floor, seed, width, height);
        let b = generate_level(floor, seed, width, height);
        prop_assert_eq!(&a, &b);

        let nav_a = NavGrid::new(a);
        let nav_b = NavGrid::new(b);
        prop_assert_eq!(
            EncounterGenerator::new().generate(&nav_a),
            EncounterGenerator::new().generate(&nav_b)
        );
        prop_assert_eq!(
            ItemGenerator::new().generate(&nav_a),
            ItemGenerator::new().generate(&nav_b)
        );
    }

    #[test]
    fn test_grid_stays_within_clamp(
        seed in any::<u32>(),
        width in 0.0f64..8000.0,
        height in 0.0f64..8000.0,
    ) {
        let map = generate_level(1, seed, width, height);
        prop_assert!((52..=92).contains(&map.width()));
        prop_assert!((34..=64).contains(&map.height()));
        prop_assert_eq!(map.tiles().len(), (map.width() * map.height()) as usize);
        prop_assert_eq!(map.tile_size(), 32);
    }

    #[test]
    fn test_border_is_wall_and_exit_is_reachable(
        floor in 1u32..30,
        seed in any::<u32>(),
    ) {
        let nav = NavGrid::new(generate_level(floor, seed, 1024.0, 768.0));
        let map = nav.map();
        let (w, h) = (map.width() as i32, map.height() as i32);
        for x in 0..w {
            prop_assert!(nav.is_wall(Position::new(x, 0)));
            prop_assert!(nav.is_wall(Position::new(x, h - 1)));
        }
        for y in 0..h {
            prop_assert!(nav.is_wall(Position::new(0, y)));
            prop_assert!(nav.is_wall(Position::new(w - 1, y)));
        }

        prop_assert!(nav.is_walkable(map.start()));
        prop_assert!(nav.is_walkable(map.exit()));
        prop_assert!(exit_path_len(&nav).is_some());
        prop_assert!(generation::utils::validate_level(&nav).is_ok());
    }

    #[test]
    fn test_spawns_land_on_floor(seed in any::<u32>()) {
        let nav = NavGrid::new(generate_level(3, seed, 800.0, 600.0));
        for enemy in EncounterGenerator::new().generate(&nav) {
            prop_assert!(nav.is_walkable(nav.to_tile(enemy.position)));
        }
        for pickup in ItemGenerator::new().generate(&nav) {
            prop_assert!(nav.is_walkable(nav.to_tile(pickup.position)));
        }
    }
}

#[test]
fn test_seed_42_first_floor() {
    let map = generate_level(1, 42, 800.0, 600.0);
    assert!((52..=92).contains(&map.width()));
    assert!((34..=64).contains(&map.height()));
    assert_eq!(map.seed(), 42 ^ 0x9e37_79b9);
    assert_ne!(map.start(), map.exit());

    let nav = NavGrid::new(map);
    assert!(exit_path_len(&nav).is_some());
}

/// Floor 1 of seed 42 on an 800x600 viewport, as shipped in the reference levels.
const SEED_42_FLOOR_1: [&str; 37] = [
    "####################################################",
    "####################################################",
    "########################...........####........#####",
    "########################...........####........#####",
    "################...............................#####",
    "###.......##...................................#####",
    "###.......##...................................#####",
    "###.......##........####...........####........#####",
    "###.................####...........#################",
    "###.............S...#######....#####################",
    "###.................#######....#####################",
    "###.......##........#######....#####################",
    "###.......##........#######....#####################",
    "######...#####.....########....#####################",
    "######...#####.....########....#####################",
    "######...#####......#######....#####################",
    "###........###......#######....#####################",
    "###.................#######....#####################",
    "###..#.........................#####################",
    "###...........................######################",
    "###...........................######################",
    "###........###......#######...###.......############",
    "###........###...##########...###.......############",
    "#####...######...########......##.......############",
    "#####...######...########......##.......############",
    "#####...####.......######......##.......############",
    "###......###.......######......##.......############",
    "###......###.......######......##...E...############",
    "###................######...............############",
    "###................######...............############",
    "###................######...............############",
    "###..#...###.......######...#..##.......############",
    "###......###.......######..#...##.......############",
    "###......###.......######......#####################",
    "###......################......#####################",
    "####################################################",
    "####################################################",
];

#[test]
fn test_seed_42_first_floor_layout_is_pinned() {
    let map = generate_level(1, 42, 800.0, 600.0);
    assert_eq!(map.seed(), 2_654_435_731);
    assert_eq!((map.width(), map.height()), (52, 37));
    assert_eq!(map.start(), Position::new(16, 9));
    assert_eq!(map.exit(), Position::new(36, 27));
    assert_eq!(map.to_ascii(&[]), SEED_42_FLOOR_1.join("\n"));
}

#[test]
fn test_start_and_exit_usually_differ() {
    let coincident = (0..200u32)
        .filter(|seed| {
            let map = generate_level(1, *seed, 800.0, 600.0);
            map.start() == map.exit()
        })
        .count();
    // Only a single-room layout can put both on the same centre.
    assert!(coincident <= 2, "{} of 200 levels had start == exit", coincident);
}

#[test]
fn test_floors_of_one_run_differ() {
    let first = generate_level(1, 7, 800.0, 600.0);
    let second = generate_level(2, 7, 800.0, 600.0);
    assert_ne!(first.seed(), second.seed());
    assert_ne!(first.tiles(), second.tiles());
}
