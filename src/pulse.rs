//! Click pulse and hover scaling for pickable objects.
//!
//! A pulse is a damped sine on the object's scale. While it runs, hover
//! changes are recorded but never touch the scale.

use serde::{Deserialize, Serialize};

use crate::scene::SceneObject;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseProfile {
    /// Oscillation frequency in radians per second.
    pub omega: f32,
    pub amplitude: f32,
    pub decay: f32,
    /// Seconds until the object snaps back to rest.
    pub duration: f32,
    pub hover_scale: f32,
    pub emissive_rest: f32,
    pub emissive_peak: f32,
}

impl Default for PulseProfile {
    fn default() -> Self {
        Self {
            omega: 14.0,
            amplitude: 0.35,
            decay: 2.2,
            duration: 1.5,
            hover_scale: 1.3,
            emissive_rest: 0.0,
            emissive_peak: 0.6,
        }
    }
}

impl PulseProfile {
    /// Scale multiplier `elapsed` seconds into a pulse.
    pub fn scale_factor(&self, elapsed: f32) -> f32 {
        1.0 + (elapsed * self.omega).sin() * self.amplitude * (-elapsed * self.decay).exp()
    }

    pub fn emissive(&self, elapsed: f32) -> f32 {
        let envelope = (-elapsed * self.decay).exp();
        self.emissive_rest + (self.emissive_peak - self.emissive_rest) * envelope
    }
}

/// Start a pulse. Returns false when the object cannot pulse or already is.
pub fn trigger_pulse(object: &mut SceneObject) -> bool {
    match object.animation.as_mut() {
        Some(animation) if !animation.is_animating => {
            animation.is_animating = true;
            animation.elapsed = 0.0;
            true
        }
        _ => false,
    }
}

/// Step every running pulse. Returns the number still running.
pub fn advance_pulses(delta: f32, objects: &mut [SceneObject], profile: &PulseProfile) -> usize {
    let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
    let mut running = 0;

    for object in objects.iter_mut() {
        let base = object.base_scale;
        let Some(animation) = object.animation.as_mut() else {
            continue;
        };
        if !animation.is_animating {
            continue;
        }

        animation.elapsed += delta;
        if animation.elapsed >= profile.duration {
            animation.is_animating = false;
            animation.elapsed = 0.0;
            animation.emissive = profile.emissive_rest;
            object.scale = if object.hovered { base * profile.hover_scale } else { base };
        } else {
            animation.emissive = profile.emissive(animation.elapsed);
            object.scale = base * profile.scale_factor(animation.elapsed);
            running += 1;
        }
    }
    running
}

/// Apply or clear hover scaling. A running pulse owns the scale until it ends.
pub fn set_hover(object: &mut SceneObject, hovered: bool, profile: &PulseProfile) {
    object.hovered = hovered;
    if object.is_animating() {
        return;
    }
    object.scale = if hovered {
        object.base_scale * profile.hover_scale
    } else {
        object.base_scale
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{AnimationParams, Category};

    fn icon() -> SceneObject {
        let mut object = SceneObject::new("icon[0]", Category::Icon).with_scale(0.5);
        object.animation = Some(AnimationParams::default());
        object
    }

    #[test]
    fn pulse_settles_to_exact_base() {
        let profile = PulseProfile::default();
        let mut objects = vec![icon()];
        assert!(trigger_pulse(&mut objects[0]));

        let mut saw_growth = false;
        for _ in 0..120 {
            advance_pulses(1.0 / 60.0, &mut objects, &profile);
            saw_growth |= objects[0].scale > 0.5;
        }
        assert!(saw_growth);
        assert_eq!(objects[0].scale, 0.5);
        assert!(!objects[0].is_animating());
        assert_eq!(objects[0].animation.unwrap().emissive, profile.emissive_rest);
    }

    #[test]
    fn second_trigger_is_ignored() {
        let profile = PulseProfile::default();
        let mut objects = vec![icon()];
        assert!(trigger_pulse(&mut objects[0]));
        advance_pulses(0.5, &mut objects, &profile);
        assert!(!trigger_pulse(&mut objects[0]));
        assert!((objects[0].animation.unwrap().elapsed - 0.5).abs() < 1e-6);
    }

    #[test]
    fn objects_without_animation_never_pulse() {
        let mut sphere = SceneObject::new("sphere", Category::PrimaryBody);
        assert!(!trigger_pulse(&mut sphere));
    }

    #[test]
    fn hover_does_not_stomp_a_pulse() {
        let profile = PulseProfile::default();
        let mut objects = vec![icon()];
        set_hover(&mut objects[0], true, &profile);
        assert!((objects[0].scale - 0.65).abs() < 1e-6);

        trigger_pulse(&mut objects[0]);
        advance_pulses(0.05, &mut objects, &profile);
        let pulsing = objects[0].scale;
        set_hover(&mut objects[0], false, &profile);
        assert_eq!(objects[0].scale, pulsing);
        assert!(!objects[0].hovered);
    }

    #[test]
    fn pulse_ends_at_hover_scale_while_hovered() {
        let profile = PulseProfile::default();
        let mut objects = vec![icon()];
        set_hover(&mut objects[0], true, &profile);
        trigger_pulse(&mut objects[0]);
        advance_pulses(profile.duration, &mut objects, &profile);
        assert!(!objects[0].is_animating());
        assert_eq!(objects[0].scale, 0.5 * profile.hover_scale);
    }
}
