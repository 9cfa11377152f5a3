//! Integration tests for section interpolation.

use rstest::{fixture, rstest};

use arbor_sampler::domain::{interpolate_positions, Arbor, InterpolatableSections, Position, Positions};
use arbor_sampler::util::testing;

const TOLERANCE: f64 = 1e-9;

/// Chain 1 -> 2 -> 3 -> 4 -> 5 along Z with sections every 40nm.
/// Nodes 3 and 4 are traced off the line through 2 and 5.
#[fixture]
fn chain() -> (Arbor, Positions) {
    testing::init_test_setup();
    let arbor = Arbor::from_edges([(1, None), (2, Some(1)), (3, Some(2)), (4, Some(3)), (5, Some(4))]).unwrap();
    let positions = Positions::from([
        (1, Position::new(0.0, 0.0, 0.0)),
        (2, Position::new(0.0, 0.0, 40.0)),
        (3, Position::new(500.0, -300.0, 80.0)),
        (4, Position::new(-250.0, 90.0, 120.0)),
        (5, Position::new(120.0, 0.0, 160.0)),
    ]);
    (arbor, positions)
}

fn z_sections(z: &[f64]) -> InterpolatableSections {
    InterpolatableSections::new(vec![], vec![], z.to_vec())
}

#[rstest]
fn given_single_broken_node_when_interpolating_then_moves_to_line_between_neighbours(
    chain: (Arbor, Positions),
) {
    // Arrange
    let (arbor, mut positions) = chain;

    // Act
    let moved = interpolate_positions(&arbor, &mut positions, &z_sections(&[120.0])).unwrap();

    // Assert: halfway between node 3 (z=80) and node 5 (z=160)
    assert_eq!(moved, 1);
    let expected = Position::new(310.0, -150.0, 120.0);
    assert!((positions[&4] - expected).norm() < TOLERANCE);
}

#[rstest]
fn given_consecutive_broken_nodes_when_interpolating_then_all_land_on_one_line(
    chain: (Arbor, Positions),
) {
    // Arrange
    let (arbor, mut positions) = chain;

    // Act
    let moved = interpolate_positions(&arbor, &mut positions, &z_sections(&[80.0, 120.0])).unwrap();

    // Assert: line from node 2 (0, 0, 40) to node 5 (120, 0, 160)
    assert_eq!(moved, 2);
    for id in [3, 4] {
        let p = positions[&id];
        assert!((p.x - (p.z - 40.0)).abs() < TOLERANCE, "node {id} off line: {p:?}");
        assert!(p.y.abs() < TOLERANCE);
    }
    assert_eq!(positions[&3].z, 80.0);
    assert_eq!(positions[&4].z, 120.0);
}

#[rstest]
fn given_interpolated_positions_when_interpolating_again_then_nothing_moves(
    chain: (Arbor, Positions),
) {
    // Arrange
    let (arbor, mut positions) = chain;
    let sections = z_sections(&[80.0, 120.0]);
    interpolate_positions(&arbor, &mut positions, &sections).unwrap();
    let once = positions.clone();

    // Act
    let moved = interpolate_positions(&arbor, &mut positions, &sections).unwrap();

    // Assert
    assert_eq!(moved, 0);
    assert_eq!(positions, once);
}

#[rstest]
fn given_no_sections_when_interpolating_then_positions_unchanged(chain: (Arbor, Positions)) {
    let (arbor, mut positions) = chain;
    let before = positions.clone();

    let moved = interpolate_positions(&arbor, &mut positions, &InterpolatableSections::default()).unwrap();

    assert_eq!(moved, 0);
    assert_eq!(positions, before);
}

#[rstest]
#[case(160.0)]
#[case(0.0)]
fn given_broken_root_or_leaf_when_interpolating_then_keeps_location(
    chain: (Arbor, Positions),
    #[case] section: f64,
) {
    let (arbor, mut positions) = chain;
    let before = positions.clone();

    let moved = interpolate_positions(&arbor, &mut positions, &z_sections(&[section])).unwrap();

    assert_eq!(moved, 0);
    assert_eq!(positions, before);
}

#[rstest]
fn given_section_off_by_more_than_tolerance_when_interpolating_then_ignored(
    chain: (Arbor, Positions),
) {
    let (arbor, mut positions) = chain;
    let before = positions.clone();

    let moved = interpolate_positions(&arbor, &mut positions, &z_sections(&[80.5])).unwrap();

    assert_eq!(moved, 0);
    assert_eq!(positions, before);
}
