#![cfg(not(target_arch = "wasm32"))]

use hero_viz::curve::{assign_icon_slots, IconSlot, LATE_BOUNDARY};
use hero_viz::orbit::advance_orbits;
use hero_viz::scene::Category;
use hero_viz::variant::PRESETS;
use hero_viz::{SceneState, VariantConfig};
use proptest::prelude::*;

fn icon_opacities(state: &SceneState) -> Vec<f32> {
    state.registry().by_category(Category::Icon).map(|o| o.opacity()).collect()
}

fn snapshot(state: &SceneState) -> Vec<(f32, bool)> {
    state.registry().objects().iter().map(|o| (o.opacity(), o.visible())).collect()
}

fn preset() -> impl Strategy<Value = &'static str> {
    prop::sample::select(PRESETS)
}

proptest! {
    #[test]
    fn applying_a_phase_is_idempotent(
        name in preset(),
        phase in 0.0f64..=1.0,
        detour in 0.0f64..=1.0,
    ) {
        let mut state = SceneState::new(VariantConfig::preset(name).unwrap(), 1.0).unwrap();
        state.set_phase(phase);
        let first = snapshot(&state);
        state.set_phase(detour);
        state.set_phase(phase);
        prop_assert_eq!(first.clone(), snapshot(&state));
        state.set_phase(phase);
        prop_assert_eq!(first, snapshot(&state));
    }

    #[test]
    fn opacities_stay_in_unit_range(name in preset(), phase in prop::num::f64::ANY) {
        let mut state = SceneState::new(VariantConfig::preset(name).unwrap(), 1.0).unwrap();
        state.set_phase(phase);
        prop_assert!((0.0..=1.0).contains(&state.phase()));
        for object in state.registry().objects() {
            let o = object.opacity();
            prop_assert!(o.is_finite() && (0.0..=1.0).contains(&o), "{} = {}", object.id(), o);
            prop_assert_eq!(object.visible(), o > 0.01);
        }
    }

    #[test]
    fn one_way_fades_never_decrease(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let mut state = SceneState::new(VariantConfig::timeline(), 1.0).unwrap();
        let ids = ["sphere", "wellC", "ring[0]", "ring[1]", "ring[2]"];
        state.set_phase(lo);
        let before: Vec<f32> =
            ids.iter().map(|id| state.registry().get(id).unwrap().opacity()).collect();
        state.set_phase(hi);
        for (id, old) in ids.iter().zip(before) {
            let new = state.registry().get(id).unwrap().opacity();
            prop_assert!(new >= old, "{id} fell from {old} to {new}");
        }
    }

    #[test]
    fn no_icon_drops_at_the_boundary(name in preset(), below in 1e-5f32..1e-2) {
        let mut state = SceneState::new(VariantConfig::preset(name).unwrap(), 1.0).unwrap();
        state.set_phase(f64::from(LATE_BOUNDARY - below));
        let before = icon_opacities(&state);
        state.set_phase(f64::from(LATE_BOUNDARY));
        let after = icon_opacities(&state);
        for (old, new) in before.iter().zip(&after) {
            prop_assert!(new >= old);
            if *old > 0.0 {
                prop_assert_eq!(*new, 1.0);
                prop_assert!(*old > 0.99);
            }
        }
    }

    #[test]
    fn late_icon_ranks_follow_catalog_order(
        count in 1usize..20,
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..8),
    ) {
        let mut early: Vec<usize> = picks.iter().map(|p| p.index(count)).collect();
        let mut seen = std::collections::HashSet::new();
        early.retain(|i| seen.insert(*i));

        let slots = assign_icon_slots(count, &early).unwrap();
        let late: Vec<usize> = slots
            .iter()
            .filter_map(|slot| match slot {
                IconSlot::Late { rank, len } => {
                    assert_eq!(*len, count - early.len());
                    Some(*rank)
                }
                IconSlot::Early { .. } => None,
            })
            .collect();
        prop_assert_eq!(late, (0..count - early.len()).collect::<Vec<_>>());
    }

    #[test]
    fn icon_opacity_falls_with_stagger_rank(name in preset(), phase in 0.0f64..=1.0) {
        let mut state = SceneState::new(VariantConfig::preset(name).unwrap(), 1.0).unwrap();
        state.set_phase(phase);
        let mut early = Vec::new();
        let mut late = Vec::new();
        for index in state.registry().indices_of(Category::Icon) {
            let opacity = state.registry().objects()[index].opacity();
            match state.curves().icon_slot(index).unwrap() {
                IconSlot::Early { rank, .. } => early.push((rank, opacity)),
                IconSlot::Late { rank, .. } => late.push((rank, opacity)),
            }
        }
        for tier in [&mut early, &mut late] {
            tier.sort_by_key(|&(rank, _)| rank);
            for pair in tier.windows(2) {
                prop_assert!(pair[0].1 >= pair[1].1, "rank {} below rank {}", pair[0].0, pair[1].0);
            }
        }
    }

    #[test]
    fn orbits_hold_still_below_activation(phase in 0.0f64..0.4, frames in 1usize..200) {
        let mut state = SceneState::new(VariantConfig::timeline(), 1.0).unwrap();
        state.set_phase(1.0);
        let before: Vec<f32> = orbit_angles(&state);
        let phase = phase as f32;
        for _ in 0..frames {
            advance_orbits(1.0 / 60.0, phase, state.registry_mut().objects_mut());
        }
        prop_assert_eq!(before, orbit_angles(&state));
    }
}

fn orbit_angles(state: &SceneState) -> Vec<f32> {
    let objects = state.registry().objects();
    objects.iter().filter_map(|o| o.orbit.map(|orbit| orbit.current_angle)).collect()
}

#[test]
fn orbit_speed_approaches_full_rate_near_one() {
    let mut state = SceneState::new(VariantConfig::timeline(), 1.0).unwrap();
    state.set_phase(1.0);
    let index = state.registry().index_of("sphereOrbit[0]").unwrap();
    let speed = state.registry().objects()[index].orbit.unwrap().angular_speed;

    let mut last = state.registry().objects()[index].orbit.unwrap().current_angle;
    let start = last;
    for _ in 0..60 {
        state.advance(1.0 / 60.0);
        let angle = state.registry().objects()[index].orbit.unwrap().current_angle;
        assert!(angle > last);
        last = angle;
    }
    assert!((last - start - speed).abs() < 1e-3);
}
