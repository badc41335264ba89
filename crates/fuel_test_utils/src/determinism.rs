//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the fuel world produces
//! identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Sources of non-determinism the world guards against:
//!
//! - **Floating-point math**: positions and radii use
//!   [`fuel_core::math::Fixed`] throughout.
//!
//! - **Map iteration order**: actors, players and tanks live in ordered
//!   maps and every tick phase walks them in ascending id order.
//!
//! - **Spatial query order**: area refuelers visit candidates by id, not
//!   by distance or insertion order.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual components (tank, generator, consumer)
//! 2. **Property tests**: random tank operation sequences keep invariants
//! 3. **Integration tests**: full refuelling scenarios are reproducible

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use fuel_core::world::World;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic world).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the world was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "World is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance the state by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use fuel_test_utils::determinism::verify_determinism;
/// use fuel_test_utils::fixtures::{demo_world, step_demo};
///
/// let result = verify_determinism(
///     3,   // Run 3 times
///     50,  // 50 ticks each
///     || demo_world(4),
///     step_demo,
///     |world| world.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a world twice with identical setup and compare the final hashes.
///
/// The world is advanced with plain [`World::tick`] calls, so only
/// actors' own fuel logic runs.
pub fn verify_world_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> World,
{
    let result = verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |world| {
            world.tick();
        },
        |world| world.state_hash(),
    );
    result.is_deterministic
}

/// Compare two runs tick-by-tick, finding first divergence.
///
/// Useful for debugging non-determinism by finding exactly when
/// worlds start to differ.
///
/// # Returns
///
/// `None` if the runs are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F, Step>(setup_fn: F, step: Step, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> World,
    Step: Fn(&mut World),
{
    let mut world1 = setup_fn();
    let mut world2 = setup_fn();

    if world1.state_hash() != world2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        step(&mut world1);
        step(&mut world2);

        if world1.state_hash() != world2.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for fuel testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of tank invariants and world determinism.
pub mod strategies {
    use fuel_core::data::TankData;
    use fuel_core::math::{CellPos, Fixed};
    use proptest::prelude::*;

    /// One mutation applied to a tank.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum TankOp {
        /// `receive_fuel(n)`.
        Receive(i32),
        /// `take_fuel(n)`.
        Take(i32),
        /// `add_capacity(n)`.
        AddCapacity(i32),
        /// `remove_capacity(n)`.
        RemoveCapacity(i32),
    }

    /// Generate fuel amounts, including zero, negatives and extremes.
    pub fn arb_amount() -> impl Strategy<Value = i32> {
        prop_oneof![
            8 => -50i32..200i32,
            1 => Just(0),
            1 => Just(i32::MAX),
            1 => Just(i32::MIN),
        ]
    }

    /// Generate a single tank operation.
    pub fn arb_tank_op() -> impl Strategy<Value = TankOp> {
        prop_oneof![
            3 => arb_amount().prop_map(TankOp::Receive),
            3 => arb_amount().prop_map(TankOp::Take),
            1 => arb_amount().prop_map(TankOp::AddCapacity),
            1 => arb_amount().prop_map(TankOp::RemoveCapacity),
        ]
    }

    /// Generate a sequence of tank operations.
    pub fn arb_tank_ops(max_len: usize) -> impl Strategy<Value = Vec<TankOp>> {
        proptest::collection::vec(arb_tank_op(), 0..max_len)
    }

    /// Generate a tank definition.
    pub fn arb_tank_data() -> impl Strategy<Value = TankData> {
        (0i32..500i32, any::<bool>(), 0i32..=100i32).prop_map(
            |(capacity, start_empty, low_fuel_warning_percent)| TankData {
                capacity,
                start_empty,
                low_fuel_warning_percent,
                low_fuel_conditions: vec!["low-fuel".to_string()],
            },
        )
    }

    /// Generate a cell on a small map.
    pub fn arb_cell() -> impl Strategy<Value = CellPos> {
        (-20i32..20i32, -20i32..20i32).prop_map(|(x, y)| CellPos::new(x, y))
    }

    /// Generate a path of cells.
    pub fn arb_path(max_len: usize) -> impl Strategy<Value = Vec<CellPos>> {
        proptest::collection::vec(arb_cell(), 0..max_len)
    }

    /// Generate an area refueler radius in whole cells.
    pub fn arb_radius() -> impl Strategy<Value = Fixed> {
        (0i32..10i32).prop_map(Fixed::from_num)
    }
}

#[cfg(test)]
mod tests {
    use super::strategies::*;
    use super::*;
    use crate::fixtures::{demo_world, spawn, step_demo, world};
    use fuel_core::math::CellPos;
    use proptest::prelude::*;

    // =========================================================================
    // Basic determinism tests
    // =========================================================================

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 10, || 0u64, |n| *n += 1, compute_hash);
        assert!(result.is_deterministic);
        assert_eq!(result.unique_hashes().len(), 1);
    }

    #[test]
    fn test_empty_world_determinism() {
        assert!(verify_world_determinism(world, 100));
    }

    #[test]
    fn test_demo_world_determinism() {
        let result = verify_determinism(4, 200, || demo_world(10), step_demo, |w| {
            w.state_hash()
        });
        result.assert_deterministic();
    }

    #[test]
    fn test_find_divergence_on_deterministic_world() {
        assert_eq!(find_first_divergence(|| demo_world(6), step_demo, 100), None);
    }

    #[test]
    fn test_state_hash_changes_with_fuel() {
        let mut world = world();
        let player = world.add_player();
        let truck = spawn(&mut world, "truck", player, 0, 0);
        let before = world.state_hash();

        world.move_to_cell(truck, CellPos::new(1, 0)).unwrap();
        world.tick();

        assert_ne!(before, world.state_hash());
    }

    #[test]
    fn test_divergent_setup_detected() {
        use std::cell::Cell;

        let calls = Cell::new(0);
        let divergence = find_first_divergence(
            || {
                calls.set(calls.get() + 1);
                let mut world = world();
                let player = world.add_player();
                spawn(&mut world, "truck", player, calls.get(), 0);
                world
            },
            |w| {
                w.tick();
            },
            10,
        );
        assert_eq!(divergence, Some(0));
    }

    // =========================================================================
    // Property tests
    // =========================================================================

    proptest! {
        #[test]
        fn prop_truck_paths_are_deterministic(path in arb_path(40)) {
            let run = || {
                let mut world = world();
                let player = world.add_player();
                let truck = spawn(&mut world, "truck", player, 0, 0);
                for cell in &path {
                    world.move_to_cell(truck, *cell).unwrap();
                    world.tick();
                }
                world.state_hash()
            };
            prop_assert_eq!(run(), run());
        }
    }
}
