use super::*;
use crate::config::DishConfigError;
use crate::metrics::CycleReport;
use crate::occupant::{Device, DeviceKind, Spread, Supply};
use crate::constants::MAX_DEVICE_FREQUENCY;
use crate::substance::{AgentType, EnergyType};
use proptest::prelude::*;
use rand::Rng;

fn make_dish(width: usize, height: usize) -> PetriDish {
    let config = DishConfig {
        width,
        height,
        ..DishConfig::default()
    };
    PetriDish::new(config).unwrap()
}

fn populate_live(dish: &mut PetriDish, live: &[(usize, usize)]) {
    dish.populate(|x, y| Occupant::conway(live.contains(&(x, y))));
}

fn populate_device(dish: &mut PetriDish, at: (usize, usize), device: Device) {
    dish.populate(|x, y| {
        if (x, y) == at {
            Occupant::Device(device.clone())
        } else {
            Occupant::Empty
        }
    });
}

fn total_heat(dish: &PetriDish) -> f64 {
    dish.stats()
        .energy_totals
        .get(&EnergyType::Heat)
        .copied()
        .unwrap_or(0.0)
}

fn remaining_supply(dish: &PetriDish, x: isize, y: isize) -> u64 {
    match dish.get(x, y).as_device().map(Device::supply) {
        Some(Supply::Remaining(n)) => n,
        other => panic!("expected a device with finite supply, found {other:?}"),
    }
}

fn north_spawner(frequency: f32, supply: Supply) -> Device {
    Device::new(
        DeviceKind::Spawner {
            organism: Organism::LIVE,
        },
        Spread::from_numbers([1]).unwrap(),
        frequency,
        1.0,
        supply,
    )
    .unwrap()
}

#[test]
fn new_rejects_invalid_config() {
    let config = DishConfig {
        width: 0,
        ..DishConfig::default()
    };
    assert!(matches!(
        PetriDish::new(config),
        Err(DishInitError::Config(DishConfigError::InvalidWidth))
    ));
}

#[test]
fn blinker_is_reported_as_period_two_from_generation_zero() {
    let mut dish = make_dish(5, 5);
    populate_live(&mut dish, &[(1, 2), (2, 2), (3, 2)]);
    assert_eq!(dish.generation(), 0);

    assert_eq!(dish.advance(), None);
    assert_eq!(dish.generation(), 1);
    assert!(dish.get(2, 1).is_alive());
    assert!(dish.get(2, 3).is_alive());
    assert!(!dish.get(1, 2).is_alive());

    let cycle = dish.advance().expect("blinker repeats after two generations");
    assert_eq!(
        cycle,
        Cycle {
            period: 2,
            start_generation: 0
        }
    );
    assert_eq!(dish.repeat_period(), 2);
    assert_eq!(
        dish.message(),
        Some("cycle detected: period 2, starting at generation 0")
    );

    // Detection is reported once; the period sticks while the pattern keeps repeating.
    assert_eq!(dish.advance(), None);
    assert_eq!(dish.repeat_period(), 2);
}

#[test]
fn block_is_a_still_life() {
    let mut dish = make_dish(4, 4);
    populate_live(&mut dish, &[(1, 1), (2, 1), (1, 2), (2, 2)]);
    let cycle = dish.advance().expect("block never changes");
    assert_eq!(cycle.period, 1);
    assert_eq!(cycle.start_generation, 0);
}

#[test]
fn lone_cell_dies_and_the_empty_dish_settles() {
    let mut dish = make_dish(3, 3);
    populate_live(&mut dish, &[(1, 1)]);
    assert_eq!(dish.advance(), None);
    assert!(!dish.get(1, 1).is_alive());
    let cycle = dish.advance().expect("dead dish is a fixed point");
    assert_eq!(cycle.period, 1);
    assert_eq!(cycle.start_generation, 1);
    assert_eq!(dish.stats().live_organisms, 0);
}

#[test]
fn populate_resets_generation_and_detection() {
    let mut dish = make_dish(5, 5);
    populate_live(&mut dish, &[(1, 2), (2, 2), (3, 2)]);
    dish.advance();
    dish.advance();
    assert_eq!(dish.repeat_period(), 2);

    populate_live(&mut dish, &[]);
    assert_eq!(dish.generation(), 0);
    assert_eq!(dish.repeat_period(), 0);
    assert_eq!(dish.message(), None);
    assert_eq!(dish.stats().live_organisms, 0);
}

#[test]
fn populate_pattern_places_glider_and_checks_fit() {
    let glider = Pattern::parse(".O.\n..O\nOOO\n").unwrap();
    let mut dish = make_dish(6, 6);
    assert!(matches!(
        dish.populate_pattern(&glider, (4, 0)),
        Err(PatternError::DoesNotFit { .. })
    ));
    dish.populate_pattern(&glider, (1, 1)).unwrap();
    assert_eq!(dish.stats().live_organisms, 5);
    assert!(dish.get(2, 1).is_alive());
    assert!(!dish.get(1, 1).is_alive());
}

#[test]
fn random_population_is_reproducible_per_seed() {
    let mut a = make_dish(8, 8);
    let mut b = make_dish(8, 8);
    a.populate_random();
    b.populate_random();
    for y in 0..8 {
        for x in 0..8 {
            assert_eq!(a.get(x, y), b.get(x, y));
        }
    }
}

#[test]
fn diffusion_spreads_heat_from_the_center() {
    let mut dish = make_dish(3, 3);
    dish.populate(|_, _| Occupant::Empty);
    assert!(dish.deposit(1, 1, EnergyType::Heat, 0.9));
    dish.advance();
    for y in 0..3 {
        for x in 0..3 {
            assert!((dish.local_intensity(x, y, EnergyType::Heat) - 0.1).abs() < 1e-6);
        }
    }
    assert!((total_heat(&dish) - 0.9).abs() < 1e-5);
}

#[test]
fn fully_resisting_cell_receives_nothing() {
    let mut dish = make_dish(3, 3);
    dish.populate(|_, _| Occupant::Empty);
    dish.deposit(1, 1, EnergyType::Heat, 0.9);
    dish.deposit(0, 0, AgentType::Insulator, 1.0);
    dish.advance();
    assert_eq!(dish.local_intensity(0, 0, EnergyType::Heat), 0.0);
    assert!((dish.local_intensity(1, 1, EnergyType::Heat) - 0.2).abs() < 1e-6);
    assert!((dish.local_intensity(2, 2, EnergyType::Heat) - 0.1).abs() < 1e-6);
    assert!((total_heat(&dish) - 0.9).abs() < 1e-5);
}

#[test]
fn ambient_levels_are_read_but_never_diffused() {
    let mut dish = make_dish(3, 3);
    dish.populate(|_, _| Occupant::Empty);
    dish.set_ambient(EnergyType::Light, 0.3);
    dish.deposit(1, 1, EnergyType::Light, 0.45);
    assert!((dish.intensity(1, 1, EnergyType::Light) - 0.75).abs() < 1e-6);
    assert!((dish.intensity(0, 0, EnergyType::Light) - 0.3).abs() < 1e-6);
    assert_eq!(dish.intensity(-1, 0, EnergyType::Light), 0.0);
    dish.advance();
    assert!((dish.local_intensity(0, 0, EnergyType::Light) - 0.05).abs() < 1e-6);
    assert!((dish.intensity(0, 0, EnergyType::Light) - 0.35).abs() < 1e-6);
}

#[test]
fn ambient_levels_from_config_are_applied() {
    let mut config = DishConfig {
        width: 2,
        height: 2,
        ..DishConfig::default()
    };
    config.ambient_agents.insert(AgentType::Pressure, 0.25);
    let dish = PetriDish::new(config).unwrap();
    assert!((dish.intensity(1, 1, AgentType::Pressure) - 0.25).abs() < 1e-6);
    assert_eq!(dish.local_intensity(1, 1, AgentType::Pressure), 0.0);
}

#[test]
fn deposit_clamps_and_dissolves() {
    let mut dish = make_dish(2, 2);
    dish.populate(|_, _| Occupant::Empty);
    dish.deposit(0, 0, EnergyType::Heat, 1.5);
    assert_eq!(dish.local_intensity(0, 0, EnergyType::Heat), 1.0);
    dish.deposit(0, 0, EnergyType::Heat, 0.0);
    assert!(!dish.grid().cell(0, 0).unwrap().has_substances());
    assert!(!dish.deposit(9, 9, EnergyType::Heat, 0.5));
}

#[test]
fn spawner_spends_its_supply_then_makes_a_final_attempt_on_itself() {
    let mut dish = make_dish(3, 3);
    populate_device(&mut dish, (1, 1), north_spawner(1.0, Supply::Remaining(1)));

    dish.advance();
    assert!(dish.get(1, 0).is_alive());
    let device = dish.get(1, 1).as_device().expect("device still present");
    assert_eq!(device.supply(), Supply::Remaining(0));

    dish.advance();
    // The lone spawned cell starves while the device spawns into its own cell.
    assert!(!dish.get(1, 0).is_alive());
    assert_eq!(dish.get(1, 1), &Occupant::conway(true));
}

#[test]
fn exhausted_replicator_leaves_an_empty_cell() {
    let mut dish = make_dish(3, 3);
    populate_device(
        &mut dish,
        (1, 1),
        Device::replicator().with_supply(Supply::Remaining(0)),
    );
    dish.advance();
    assert_eq!(dish.get(1, 1), &Occupant::Empty);
}

#[test]
fn whole_frequency_grants_that_many_activations() {
    let mut dish = make_dish(3, 3);
    populate_device(&mut dish, (1, 1), north_spawner(2.0, Supply::Remaining(5)));
    dish.advance();
    let device = dish.get(1, 1).as_device().expect("device still present");
    assert_eq!(device.supply(), Supply::Remaining(3));
}

#[test]
fn zero_frequency_device_never_acts() {
    let mut dish = make_dish(3, 3);
    populate_device(&mut dish, (1, 1), north_spawner(0.0, Supply::Remaining(1)));
    for _ in 0..3 {
        dish.advance();
    }
    assert_eq!(dish.get(1, 0), &Occupant::Empty);
    let device = dish.get(1, 1).as_device().expect("device still present");
    assert_eq!(device.supply(), Supply::Remaining(1));
}

#[test]
fn spawner_targets_outside_the_dish_are_skipped() {
    let mut dish = make_dish(3, 3);
    populate_device(&mut dish, (1, 0), north_spawner(1.0, Supply::Remaining(1)));
    dish.advance();
    let device = dish.get(1, 0).as_device().expect("device still present");
    assert_eq!(device.supply(), Supply::Remaining(1));
    assert_eq!(dish.stats().live_organisms, 0);
}

#[test]
fn replicator_copies_its_substances_instead_of_diffusing_them() {
    let east = Device::new(
        DeviceKind::Replicator,
        Spread::from_numbers([3]).unwrap(),
        1.0,
        1.0,
        Supply::Infinite,
    )
    .unwrap();
    let mut dish = make_dish(3, 3);
    populate_device(&mut dish, (1, 1), east);
    dish.deposit(1, 1, AgentType::Acid, 0.4);
    dish.advance();
    assert!((dish.local_intensity(1, 1, AgentType::Acid) - 0.4).abs() < 1e-6);
    assert!((dish.local_intensity(2, 1, AgentType::Acid) - 0.4).abs() < 1e-6);
    assert_eq!(dish.local_intensity(1, 0, AgentType::Acid), 0.0);
    assert_eq!(dish.local_intensity(0, 1, AgentType::Acid), 0.0);
}

#[test]
fn edit_and_toggle_restart_detection_but_keep_the_counter() {
    let mut dish = make_dish(4, 4);
    populate_live(&mut dish, &[(1, 1), (2, 1), (1, 2), (2, 2)]);
    dish.advance();
    assert_eq!(dish.repeat_period(), 1);

    assert!(dish.edit(0, 0, Occupant::conway(true)));
    assert_eq!(dish.repeat_period(), 0);
    assert_eq!(dish.message(), None);
    assert_eq!(dish.generation(), 1);
    assert!(dish.get(0, 0).is_alive());
    assert!(!dish.edit(4, 0, Occupant::conway(true)));

    assert!(dish.toggle(0, 0));
    assert!(!dish.get(0, 0).is_alive());
    dish.edit(3, 3, Occupant::Empty);
    assert!(!dish.toggle(3, 3));

    // The block itself was never touched, so the next generation repeats the edited state.
    let cycle = dish.advance().expect("block still life after edits");
    assert_eq!(cycle.period, 1);
    assert_eq!(cycle.start_generation, 1);
}

#[test]
fn run_rejects_bad_arguments() {
    let mut dish = make_dish(3, 3);
    populate_live(&mut dish, &[]);
    assert_eq!(dish.run(5, 0).unwrap_err(), RunError::InvalidSampleEvery);
    assert!(matches!(
        dish.run(PetriDish::MAX_RUN_GENERATIONS + 1, 1),
        Err(RunError::TooManyGenerations { .. })
    ));
}

#[test]
fn run_samples_and_reports_cycles() {
    let mut dish = make_dish(5, 5);
    populate_live(&mut dish, &[(1, 2), (2, 2), (3, 2)]);
    let summary = dish.run(5, 2).unwrap();
    assert_eq!(summary.samples.len(), 3);
    assert_eq!(summary.samples[0].generation, 2);
    assert_eq!(
        summary.cycles,
        vec![CycleReport {
            period: 2,
            start_generation: 0
        }]
    );
    assert_eq!(summary.restarts, 0);
    assert_eq!(summary.final_stats.generation, 5);
    assert_eq!(summary.final_stats.live_organisms, 3);
}

#[test]
fn run_restarts_on_cycle_when_configured() {
    let config = DishConfig {
        width: 6,
        height: 6,
        restart_on_cycle: true,
        ..DishConfig::default()
    };
    let mut dish = PetriDish::new(config).unwrap();
    populate_live(&mut dish, &[]);
    let summary = dish.run(3, 1).unwrap();
    assert!(summary.restarts >= 1);
    assert_eq!(
        summary.cycles[0],
        CycleReport {
            period: 1,
            start_generation: 0
        }
    );
    assert!(summary.final_stats.generation <= 2);
}

#[test]
fn new_rejects_zero_history_capacity() {
    let config = DishConfig {
        width: 3,
        height: 3,
        history_capacity: 0,
        ..DishConfig::default()
    };
    assert!(matches!(
        PetriDish::new(config),
        Err(DishInitError::Config(DishConfigError::InvalidHistoryCapacity))
    ));
}

#[test]
fn populate_draws_from_the_stream_of_its_epoch() {
    let mut dish = make_dish(3, 3);
    populate_live(&mut dish, &[]);
    assert_eq!(dish.epoch, 1);
    let mut expected = crate::rng::derive_epoch_rng(dish.config.seed, 0);
    assert_eq!(dish.rng.random::<u64>(), expected.random::<u64>());

    populate_live(&mut dish, &[]);
    assert_eq!(dish.epoch, 2);
    let mut expected = crate::rng::derive_epoch_rng(dish.config.seed, 1);
    assert_eq!(dish.rng.random::<u64>(), expected.random::<u64>());
}

#[test]
fn thickener_diffuses_and_lets_other_agents_through() {
    let mut dish = make_dish(3, 3);
    dish.populate(|_, _| Occupant::Empty);
    dish.deposit(1, 1, AgentType::Thickener, 0.9);
    dish.deposit(1, 1, AgentType::Acid, 0.9);
    dish.advance();
    for y in 0..3 {
        for x in 0..3 {
            assert!((dish.local_intensity(x, y, AgentType::Thickener) - 0.1).abs() < 1e-6);
            assert!((dish.local_intensity(x, y, AgentType::Acid) - 0.1).abs() < 1e-6);
        }
    }
}

#[test]
fn activations_follow_frequency_and_are_capped() {
    let mut dish = make_dish(3, 3);
    populate_live(&mut dish, &[]);
    assert_eq!(dish.activations(0.0), 0);
    assert_eq!(dish.activations(3.0), 3);
    assert_eq!(dish.activations(1e10), MAX_DEVICE_FREQUENCY as u32);
    assert_eq!(dish.activations(f32::INFINITY), 0);
    for _ in 0..16 {
        let n = dish.activations(2.5);
        assert!(n == 2 || n == 3);
    }
}

#[test]
fn fractional_frequency_activates_on_some_generations_only() {
    let mut dish = make_dish(3, 3);
    populate_device(&mut dish, (1, 1), north_spawner(0.5, Supply::Remaining(1000)));
    let mut acted = 0;
    let mut idle = 0;
    for _ in 0..64 {
        let before = remaining_supply(&dish, 1, 1);
        dish.advance();
        match before - remaining_supply(&dish, 1, 1) {
            0 => idle += 1,
            1 => acted += 1,
            spent => panic!("one activation spends at most one unit, spent {spent}"),
        }
    }
    assert!(acted > 0, "device never activated");
    assert!(idle > 0, "device activated every generation");
}

#[test]
fn partial_probability_hits_a_reproducible_subset_of_targets() {
    let device = Device::new(
        DeviceKind::Spawner {
            organism: Organism::LIVE,
        },
        Spread::ALL,
        1.0,
        0.5,
        Supply::Remaining(100),
    )
    .unwrap();

    let mut a = make_dish(3, 3);
    let mut b = make_dish(3, 3);
    populate_device(&mut a, (1, 1), device.clone());
    populate_device(&mut b, (1, 1), device.clone());
    a.advance();
    b.advance();
    for y in 0..3 {
        for x in 0..3 {
            assert_eq!(a.get(x, y), b.get(x, y));
        }
    }

    let mut saw_partial = false;
    for _ in 0..16 {
        populate_device(&mut a, (1, 1), device.clone());
        a.advance();
        let spawned = a.stats().live_organisms as u64;
        // Supply drops once per successful target and never for failed trials.
        assert_eq!(remaining_supply(&a, 1, 1), 100 - spawned);
        saw_partial |= spawned > 0 && spawned < 8;
    }
    assert!(saw_partial);
}

#[test]
fn spawns_never_replace_another_device() {
    let east_spawner = Device::new(
        DeviceKind::Spawner {
            organism: Organism::LIVE,
        },
        Spread::from_numbers([3]).unwrap(),
        1.0,
        1.0,
        Supply::Remaining(5),
    )
    .unwrap();
    let mut dish = make_dish(3, 1);
    dish.populate(|x, _| match x {
        0 => Occupant::Device(east_spawner.clone()),
        1 => Occupant::Device(Device::replicator()),
        _ => Occupant::Empty,
    });
    dish.advance();
    assert_eq!(dish.get(1, 0), &Occupant::Device(Device::replicator()));
    assert_eq!(dish.stats().live_organisms, 0);
    // The trial still succeeded, so the supply was spent.
    assert_eq!(remaining_supply(&dish, 0, 0), 4);
}

struct Glyphs;

impl Projector for Glyphs {
    type View = char;

    fn occupant(&self, occupant: &Occupant) -> Option<char> {
        occupant.is_visible().then_some('#')
    }
}

#[test]
fn projection_only_yields_visible_occupants() {
    let mut dish = make_dish(5, 5);
    populate_live(&mut dish, &[(1, 2), (2, 2), (3, 2)]);
    let drawn: Vec<_> = dish.project(&Glyphs).into_iter().map(|p| (p.x, p.y)).collect();
    assert_eq!(drawn, vec![(1, 2), (2, 2), (3, 2)]);
}

proptest! {
    #[test]
    fn proptest_diffusion_conserves_heat_without_clamping(
        deposits in proptest::collection::vec((0usize..4, 0usize..4, 0.01f32..0.2), 1..4),
        generations in 1usize..5,
    ) {
        let mut dish = make_dish(4, 4);
        dish.populate(|_, _| Occupant::Empty);
        for (x, y, heat) in &deposits {
            let current = dish.local_intensity(*x as isize, *y as isize, EnergyType::Heat);
            dish.deposit(*x as isize, *y as isize, EnergyType::Heat, current + heat);
        }
        let before = total_heat(&dish);
        for _ in 0..generations {
            dish.advance();
        }
        prop_assert!((total_heat(&dish) - before).abs() < 1e-4);
    }
}
