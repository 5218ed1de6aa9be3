//! Pointer hit-testing against the visible icons and hover bookkeeping.

use crate::camera::Ray;
use crate::pulse::{set_hover, PulseProfile};
use crate::scene::{Category, SceneObject};

/// Where the hovered icon's name is shown.
pub trait Tooltip {
    fn show(&mut self, text: &str);
    fn hide(&mut self);
}

/// Nearest visible icon along `ray`.
pub fn pick_icon(ray: &Ray, objects: &[SceneObject]) -> Option<usize> {
    objects
        .iter()
        .enumerate()
        .filter(|(_, o)| o.category() == Category::Icon && o.visible())
        .filter_map(|(i, o)| {
            ray.intersect_sphere(o.position, o.pick_radius * o.scale.max(o.base_scale))
                .map(|t| (i, t))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoverChange {
    Unchanged,
    Entered(usize),
    Moved { from: usize, to: usize },
    Left(usize),
}

#[derive(Clone, Debug, Default)]
pub struct HoverTracker {
    current: Option<usize>,
}

impl HoverTracker {
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Let go of the hovered icon if it is no longer visible.
    pub fn release_hidden(
        &mut self,
        objects: &mut [SceneObject],
        profile: &PulseProfile,
    ) -> HoverChange {
        match self.current {
            Some(index) if !objects[index].visible() => {
                set_hover(&mut objects[index], false, profile);
                self.current = None;
                HoverChange::Left(index)
            }
            _ => HoverChange::Unchanged,
        }
    }

    /// Move hover to `hit`, rescaling both ends and updating the tooltip.
    pub fn update(
        &mut self,
        hit: Option<usize>,
        objects: &mut [SceneObject],
        profile: &PulseProfile,
        tooltip: &mut dyn Tooltip,
    ) -> HoverChange {
        if hit == self.current {
            return HoverChange::Unchanged;
        }

        if let Some(previous) = self.current {
            set_hover(&mut objects[previous], false, profile);
        }
        let change = match (self.current, hit) {
            (None, Some(to)) => HoverChange::Entered(to),
            (Some(from), Some(to)) => HoverChange::Moved { from, to },
            (Some(from), None) => HoverChange::Left(from),
            (None, None) => HoverChange::Unchanged,
        };
        self.current = hit;

        match hit {
            Some(index) => {
                let object = &mut objects[index];
                set_hover(object, true, profile);
                tooltip.show(object.label.as_deref().unwrap_or_else(|| object.id()));
            }
            None => tooltip.hide(),
        }
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::AnimationParams;
    use glam::Vec3;

    #[derive(Default)]
    struct Recorder {
        shown: Option<String>,
    }

    impl Tooltip for Recorder {
        fn show(&mut self, text: &str) {
            self.shown = Some(text.to_string());
        }
        fn hide(&mut self) {
            self.shown = None;
        }
    }

    fn icon(id: &str, z: f32) -> SceneObject {
        let mut object = SceneObject::new(id, Category::Icon).with_position(Vec3::new(0.0, 0.0, z));
        object.pick_radius = 0.5;
        object.label = Some(id.to_uppercase());
        object.animation = Some(AnimationParams::default());
        object.set_opacity(1.0);
        object
    }

    fn down_z() -> Ray {
        Ray { origin: Vec3::new(0.0, 0.0, 10.0), direction: Vec3::NEG_Z }
    }

    #[test]
    fn nearest_visible_icon_wins() {
        let mut objects = vec![icon("far", 0.0), icon("near", 2.0)];
        assert_eq!(pick_icon(&down_z(), &objects), Some(1));
        objects[1].set_opacity(0.0);
        assert_eq!(pick_icon(&down_z(), &objects), Some(0));
    }

    #[test]
    fn hover_moves_scale_and_tooltip() {
        let profile = PulseProfile::default();
        let mut objects = vec![icon("a", 0.0), icon("b", 1.0)];
        let mut tracker = HoverTracker::default();
        let mut tooltip = Recorder::default();

        let change = tracker.update(Some(0), &mut objects, &profile, &mut tooltip);
        assert_eq!(change, HoverChange::Entered(0));
        assert_eq!(tooltip.shown.as_deref(), Some("A"));
        assert!((objects[0].scale - 1.3).abs() < 1e-6);

        let change = tracker.update(Some(1), &mut objects, &profile, &mut tooltip);
        assert_eq!(change, HoverChange::Moved { from: 0, to: 1 });
        assert_eq!(objects[0].scale, 1.0);
        assert_eq!(tooltip.shown.as_deref(), Some("B"));

        let change = tracker.update(None, &mut objects, &profile, &mut tooltip);
        assert_eq!(change, HoverChange::Left(1));
        assert_eq!(tooltip.shown, None);
        assert_eq!(objects[1].scale, 1.0);
    }

    #[test]
    fn hidden_icon_loses_hover() {
        let profile = PulseProfile::default();
        let mut objects = vec![icon("a", 0.0)];
        let mut tracker = HoverTracker::default();
        let mut tooltip = Recorder::default();
        tracker.update(Some(0), &mut objects, &profile, &mut tooltip);

        assert_eq!(tracker.release_hidden(&mut objects, &profile), HoverChange::Unchanged);
        objects[0].set_opacity(0.0);
        assert_eq!(tracker.release_hidden(&mut objects, &profile), HoverChange::Left(0));
        assert_eq!(tracker.current(), None);
        assert!(!objects[0].hovered);
        assert_eq!(objects[0].scale, 1.0);
    }
}
