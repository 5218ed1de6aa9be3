//! Scene registry: the fixed set of named objects every subsystem mutates.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::curve::{clamp01, VISIBILITY_EPSILON};
use crate::error::VizError;
use crate::orbit::OrbitParams;
use crate::variant::VariantConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Background,
    PrimaryBody,
    Well,
    Ring,
    Icon,
    OrbitParticle,
}

/// Pulse bookkeeping for objects that react to clicks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimationParams {
    pub is_animating: bool,
    pub elapsed: f32,
    /// Secondary highlight intensity, driven alongside the pulse scale.
    pub emissive: f32,
}

#[derive(Clone, Debug)]
pub struct SceneObject {
    id: String,
    category: Category,
    opacity: f32,
    pub position: Vec3,
    pub rotation: Vec3,
    pub base_scale: f32,
    pub scale: f32,
    pub orbit: Option<OrbitParams>,
    pub animation: Option<AnimationParams>,
    /// Tooltip text for pickable objects.
    pub label: Option<String>,
    pub pick_radius: f32,
    pub hovered: bool,
}

impl SceneObject {
    pub fn new(id: impl Into<String>, category: Category) -> Self {
        Self {
            id: id.into(),
            category,
            opacity: 0.0,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            base_scale: 1.0,
            scale: 1.0,
            orbit: None,
            animation: None,
            label: None,
            pick_radius: 0.0,
            hovered: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = clamp01(opacity);
    }

    pub fn visible(&self) -> bool {
        self.opacity > VISIBILITY_EPSILON
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some_and(|a| a.is_animating)
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.base_scale = scale;
        self.scale = scale;
        self
    }

    pub fn with_orbit(mut self, orbit: OrbitParams) -> Self {
        self.position = orbit.project();
        self.orbit = Some(orbit);
        self
    }
}

/// Fixed collection of scene objects, built once per variant.
#[derive(Clone, Debug, Default)]
pub struct SceneRegistry {
    objects: Vec<SceneObject>,
}

impl SceneRegistry {
    pub fn from_objects(objects: Vec<SceneObject>) -> Result<Self, VizError> {
        for (i, object) in objects.iter().enumerate() {
            if objects[..i].iter().any(|o| o.id == object.id) {
                return Err(VizError::InvalidConfig(format!("duplicate object id `{}`", object.id)));
            }
        }
        Ok(Self { objects })
    }

    /// Create every object a variant declares. Creation-time randomness is
    /// drawn from the variant's seed.
    pub fn build(config: &VariantConfig) -> Result<Self, VizError> {
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let mut objects = Vec::new();

        for decl in &config.objects {
            let mut object = SceneObject::new(decl.id.clone(), decl.category)
                .with_position(Vec3::from(decl.position))
                .with_scale(decl.scale);
            object.rotation = Vec3::from(decl.rotation);
            if let Some(orbit) = &decl.orbit {
                object = object.with_orbit(orbit.to_params());
            }
            objects.push(object);
        }

        if let Some(swarm) = &config.orbit_particles {
            for i in 0..swarm.count {
                let radius = rng.gen_range(swarm.radius.0..=swarm.radius.1);
                let orbit = OrbitParams {
                    base_angle: rng.gen_range(0.0..std::f32::consts::TAU),
                    current_angle: 0.0,
                    angular_speed: rng.gen_range(swarm.speed.0..=swarm.speed.1),
                    radius_major: radius,
                    radius_minor: radius * swarm.flatten,
                    tilt: swarm.tilt,
                    center: Vec3::from(swarm.center),
                    activation: swarm.activation,
                }
                .at_base();
                let size = rng.gen_range(swarm.size.0..=swarm.size.1);
                objects.push(
                    SceneObject::new(format!("{}[{i}]", swarm.id_prefix), Category::OrbitParticle)
                        .with_scale(size)
                        .with_orbit(orbit),
                );
            }
        }

        let catalog = &config.icons;
        let count = catalog.entries.len();
        for (i, entry) in catalog.entries.iter().enumerate() {
            let layout = &catalog.layout;
            let orbit = OrbitParams {
                base_angle: i as f32 / count.max(1) as f32 * std::f32::consts::TAU,
                current_angle: 0.0,
                angular_speed: layout.speed,
                radius_major: layout.radius_major,
                radius_minor: layout.radius_minor,
                tilt: layout.tilt,
                center: Vec3::from(layout.center),
                activation: layout.activation,
            }
            .at_base();
            let mut icon = SceneObject::new(format!("icon[{i}]"), Category::Icon)
                .with_scale(layout.scale)
                .with_orbit(orbit);
            icon.label = Some(entry.name.clone());
            icon.pick_radius = layout.pick_radius;
            icon.animation = Some(AnimationParams::default());
            objects.push(icon);
        }

        let registry = Self::from_objects(objects)?;
        log::debug!("scene `{}` built with {} objects", config.name, registry.len());
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut [SceneObject] {
        &mut self.objects
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.objects.iter().position(|o| o.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn indices_of(&self, category: Category) -> impl Iterator<Item = usize> + '_ {
        self.objects
            .iter()
            .enumerate()
            .filter(move |(_, o)| o.category == category)
            .map(|(i, _)| i)
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &SceneObject> + '_ {
        self.objects.iter().filter(move |o| o.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_follows_opacity() {
        let mut object = SceneObject::new("nebula", Category::Background);
        assert!(!object.visible());
        object.set_opacity(0.01);
        assert!(!object.visible());
        object.set_opacity(0.02);
        assert!(object.visible());
        object.set_opacity(f32::NAN);
        assert_eq!(object.opacity(), 0.0);
        assert!(!object.visible());
        object.set_opacity(4.0);
        assert_eq!(object.opacity(), 1.0);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let objects = vec![
            SceneObject::new("sphere", Category::PrimaryBody),
            SceneObject::new("sphere", Category::PrimaryBody),
        ];
        assert!(matches!(SceneRegistry::from_objects(objects), Err(VizError::InvalidConfig(_))));
    }

    #[test]
    fn build_is_deterministic_for_a_seed() {
        let config = VariantConfig::timeline();
        let a = SceneRegistry::build(&config).unwrap();
        let b = SceneRegistry::build(&config).unwrap();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.objects().iter().zip(b.objects()) {
            assert_eq!(x.id(), y.id());
            assert_eq!(x.position, y.position);
            assert_eq!(x.orbit.map(|o| o.angular_speed), y.orbit.map(|o| o.angular_speed));
        }
    }

    #[test]
    fn icons_carry_labels_and_pulse_state() {
        let registry = SceneRegistry::build(&VariantConfig::timeline()).unwrap();
        let icons: Vec<_> = registry.by_category(Category::Icon).collect();
        assert_eq!(icons.len(), 12);
        assert!(icons.iter().all(|i| i.label.is_some() && i.animation.is_some()));
        assert_eq!(icons[7].id(), "icon[7]");
    }
}
