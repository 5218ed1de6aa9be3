//! Variant configuration. Every hero variant runs the same engine; what
//! differs between them is the data in here.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::ambient::{AmbientMotion, ParticleFieldConfig};
use crate::camera::CameraConfig;
use crate::curve::{
    assign_icon_slots, IconStaggerPolicy, OpacityCurve, PhaseCurveSpec, Stagger, LATE_BOUNDARY,
};
use crate::error::VizError;
use crate::orbit::{OrbitActivation, OrbitParams};
use crate::pulse::PulseProfile;
use crate::readiness::RetryPolicy;
use crate::scene::Category;

/// Names accepted by [`VariantConfig::preset`].
pub const PRESETS: &[&str] = &["nebula", "sphere", "gravity-well", "timeline"];

fn unit_scale() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrbitDecl {
    pub radius_major: f32,
    pub radius_minor: f32,
    #[serde(default)]
    pub tilt: f32,
    #[serde(default)]
    pub angle: f32,
    pub speed: f32,
    #[serde(default)]
    pub center: [f32; 3],
    pub activation: OrbitActivation,
}

impl OrbitDecl {
    pub fn to_params(&self) -> OrbitParams {
        OrbitParams {
            base_angle: self.angle,
            current_angle: self.angle,
            angular_speed: self.speed,
            radius_major: self.radius_major,
            radius_minor: self.radius_minor,
            tilt: self.tilt,
            center: self.center.into(),
            activation: self.activation,
        }
    }
}

/// One statically declared scene object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectDecl {
    pub id: String,
    pub category: Category,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "unit_scale")]
    pub scale: f32,
    #[serde(default)]
    pub orbit: Option<OrbitDecl>,
}

impl ObjectDecl {
    fn new(id: &str, category: Category) -> Self {
        Self {
            id: id.to_string(),
            category,
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: 1.0,
            orbit: None,
        }
    }

    fn at(mut self, position: [f32; 3]) -> Self {
        self.position = position;
        self
    }

    fn scaled(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    fn tilted(mut self, tilt: f32) -> Self {
        self.rotation[0] = tilt;
        self
    }
}

/// Randomised cloud of small bodies orbiting the primary body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrbitSwarm {
    pub id_prefix: String,
    pub count: usize,
    pub radius: (f32, f32),
    /// Minor radius as a fraction of the major radius.
    pub flatten: f32,
    pub speed: (f32, f32),
    pub size: (f32, f32),
    pub tilt: f32,
    #[serde(default)]
    pub center: [f32; 3],
    pub activation: OrbitActivation,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IconEntry {
    pub name: String,
    pub glyph: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IconLayout {
    pub radius_major: f32,
    pub radius_minor: f32,
    pub tilt: f32,
    pub speed: f32,
    #[serde(default)]
    pub center: [f32; 3],
    pub activation: OrbitActivation,
    pub scale: f32,
    pub pick_radius: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IconCatalog {
    pub entries: Vec<IconEntry>,
    /// Catalog indices shown before the late boundary, in reveal order.
    #[serde(default)]
    pub early_subset: Vec<usize>,
    #[serde(default)]
    pub stagger: Option<IconStaggerPolicy>,
    pub layout: IconLayout,
}

impl IconCatalog {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            early_subset: Vec::new(),
            stagger: None,
            layout: IconLayout {
                radius_major: 0.0,
                radius_minor: 0.0,
                tilt: 0.0,
                speed: 0.0,
                center: [0.0; 3],
                activation: OrbitActivation::ALWAYS,
                scale: 1.0,
                pick_radius: 0.0,
            },
        }
    }

    fn named(
        names: &[(&str, &str)],
        early_subset: Vec<usize>,
        stagger: IconStaggerPolicy,
        layout: IconLayout,
    ) -> Self {
        Self {
            entries: names
                .iter()
                .map(|(name, glyph)| IconEntry { name: name.to_string(), glyph: glyph.to_string() })
                .collect(),
            early_subset,
            stagger: Some(stagger),
            layout,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub background: String,
    pub grid: String,
    pub nebula_core: String,
    pub nebula_outer: String,
    pub nebula_highlight: String,
    pub particles: String,
    pub rings: String,
    pub sphere: String,
    pub well: String,
    pub icon: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: "#F5F3E8".into(),
            grid: "#D4D0C4".into(),
            nebula_core: "#4A90D9".into(),
            nebula_outer: "#2B5797".into(),
            nebula_highlight: "#7BB3F0".into(),
            particles: "#3B7DD8".into(),
            rings: "#B8B4A8".into(),
            sphere: "#2B5797".into(),
            well: "#7BB3F0".into(),
            icon: "#1F3F6E".into(),
        }
    }
}

impl Palette {
    fn entries(&self) -> [&str; 10] {
        [
            &self.background,
            &self.grid,
            &self.nebula_core,
            &self.nebula_outer,
            &self.nebula_highlight,
            &self.particles,
            &self.rings,
            &self.sphere,
            &self.well,
            &self.icon,
        ]
    }
}

/// Parse `#RRGGBB` into linear 0..1 channels.
pub fn parse_hex_color(hex: &str) -> Option<[f32; 3]> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(digits, 16).ok()?;
    Some([
        ((value >> 16) & 0xff) as f32 / 255.0,
        ((value >> 8) & 0xff) as f32 / 255.0,
        (value & 0xff) as f32 / 255.0,
    ])
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub size: f32,
    pub divisions: u32,
    pub opacity: f32,
    pub depth: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { size: 20.0, divisions: 40, opacity: 0.3, depth: -5.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariantConfig {
    pub name: String,
    #[serde(default)]
    pub seed: u64,
    pub camera: CameraConfig,
    #[serde(default)]
    pub palette: Palette,
    #[serde(default)]
    pub grid: Option<GridConfig>,
    pub objects: Vec<ObjectDecl>,
    pub curves: Vec<PhaseCurveSpec>,
    pub icons: IconCatalog,
    #[serde(default)]
    pub orbit_particles: Option<OrbitSwarm>,
    #[serde(default)]
    pub particle_field: Option<ParticleFieldConfig>,
    #[serde(default)]
    pub pulse: PulseProfile,
    #[serde(default)]
    pub ambient: AmbientMotion,
    #[serde(default)]
    pub readiness: RetryPolicy,
}

fn check_range(what: &str, range: (f32, f32)) -> Result<(), VizError> {
    if range.0.is_finite() && range.1.is_finite() && range.0 <= range.1 {
        Ok(())
    } else {
        Err(VizError::InvalidConfig(format!("{what} range {range:?} is not ordered")))
    }
}

impl VariantConfig {
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "nebula" => Some(Self::nebula()),
            "sphere" => Some(Self::sphere()),
            "gravity-well" => Some(Self::gravity_well()),
            "timeline" => Some(Self::timeline()),
            _ => None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, VizError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, VizError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Structural checks the registry and curve compiler cannot make.
    pub fn validate(&self) -> Result<(), VizError> {
        if let Some(swarm) = &self.orbit_particles {
            check_range("orbit particle radius", swarm.radius)?;
            check_range("orbit particle speed", swarm.speed)?;
            check_range("orbit particle size", swarm.size)?;
        }
        if let Some(field) = &self.particle_field {
            for band in &field.bands {
                check_range("particle radius", band.radius)?;
                check_range("particle speed", band.speed)?;
                check_range("particle size", band.size)?;
            }
        }
        assign_icon_slots(self.icons.entries.len(), &self.icons.early_subset)?;
        if !self.icons.entries.is_empty() && self.icons.stagger.is_none() {
            return Err(VizError::InvalidConfig("icons declared without a stagger policy".into()));
        }
        let colors = self.palette.entries();
        if let Some(bad) = colors.into_iter().find(|c| parse_hex_color(c).is_none()) {
            return Err(VizError::InvalidConfig(format!("palette color `{bad}` is not #RRGGBB")));
        }
        Ok(())
    }

    /// The plain nebula hero: a spinning nebula over a grid, ringed by
    /// decorative ellipses and a drifting particle field.
    pub fn nebula() -> Self {
        let radii = [1.2, 2.0, 2.8, 3.6, 4.4];
        let mut objects = vec![ObjectDecl::new("nebula", Category::Background).scaled(8.0)];
        let mut curves = vec![PhaseCurveSpec::for_id("nebula", OpacityCurve::FadeOut { k: 1.5 })];
        for (i, radius) in radii.iter().enumerate() {
            let id = format!("ring[{i}]");
            objects.push(
                ObjectDecl::new(&id, Category::Ring)
                    .at([0.0, 0.0, -1.0])
                    .scaled(*radius)
                    .tilted(PI * 0.1),
            );
            let value = 0.25 - i as f32 * 0.03;
            curves.push(PhaseCurveSpec::for_id(&id, OpacityCurve::Constant { value }));
        }

        Self {
            name: "nebula".into(),
            seed: 1,
            camera: CameraConfig::Orthographic { frustum_size: 10.0, distance: 10.0 },
            palette: Palette::default(),
            grid: Some(GridConfig::default()),
            objects,
            curves,
            icons: IconCatalog::empty(),
            orbit_particles: None,
            particle_field: Some(ParticleFieldConfig::nebula()),
            pulse: PulseProfile::default(),
            ambient: AmbientMotion::default(),
            readiness: RetryPolicy::default(),
        }
    }

    /// Nebula giving way to a glowing sphere circled by particles and icons.
    pub fn sphere() -> Self {
        let tilt = 0.35;
        let mut objects = vec![
            ObjectDecl::new("nebula", Category::Background).at([0.0, 0.0, -4.0]).scaled(10.0),
            ObjectDecl::new("sphere", Category::PrimaryBody).scaled(1.4),
            ObjectDecl::new("sphereGlow", Category::PrimaryBody).scaled(1.9),
            ObjectDecl::new("sphereRing", Category::Ring).scaled(1.8).tilted(tilt),
        ];
        let mut curves = vec![
            PhaseCurveSpec::for_id("nebula", OpacityCurve::FadeOut { k: 2.5 }),
            PhaseCurveSpec::for_id("sphere", ramp_in(0.25, 4.0, 1.0)),
            PhaseCurveSpec::for_id("sphereGlow", scaled("sphere", 0.25)),
            PhaseCurveSpec::for_id("sphereRing", scaled("sphere", 0.6)),
            PhaseCurveSpec::for_category(Category::OrbitParticle, scaled("sphere", 0.8)),
        ];
        for (i, radius) in [2.2, 2.9, 3.6].iter().enumerate() {
            let id = format!("ring[{i}]");
            objects.push(ObjectDecl::new(&id, Category::Ring).scaled(*radius).tilted(tilt));
            curves.push(PhaseCurveSpec::for_id(&id, ramp_in(0.35, 2.5, 0.7)));
        }

        let icons = IconCatalog::named(
            &[
                ("Analytics", "A"),
                ("Payments", "P"),
                ("Messaging", "M"),
                ("Storage", "S"),
                ("Identity", "I"),
                ("Search", "Q"),
            ],
            (0..6).collect(),
            IconStaggerPolicy {
                boundary: LATE_BOUNDARY,
                early: Stagger { start: 0.4, window: 0.15, rate: 10.0 },
                late: Stagger { start: 0.7, window: 0.15, rate: 8.0 },
            },
            IconLayout {
                radius_major: 3.2,
                radius_minor: 2.6,
                tilt,
                speed: 0.25,
                center: [0.0; 3],
                activation: OrbitActivation { threshold: 0.4, rate: 2.0 },
                scale: 0.45,
                pick_radius: 0.6,
            },
        );

        Self {
            name: "sphere".into(),
            seed: 2,
            camera: perspective([0.0, 2.5, 9.0]),
            palette: Palette::default(),
            grid: None,
            objects,
            curves,
            icons,
            orbit_particles: Some(OrbitSwarm {
                id_prefix: "sphereOrbit".into(),
                count: 24,
                radius: (1.8, 2.4),
                flatten: 0.85,
                speed: (0.3, 0.7),
                size: (0.03, 0.06),
                tilt,
                center: [0.0; 3],
                activation: OrbitActivation { threshold: 0.4, rate: 2.0 },
            }),
            particle_field: None,
            pulse: PulseProfile::default(),
            ambient: AmbientMotion::default(),
            readiness: RetryPolicy::default(),
        }
    }

    /// Sphere with a wireframe gravity well that only exists mid-timeline.
    pub fn gravity_well() -> Self {
        let tilt = 0.3;
        let mut objects = vec![
            ObjectDecl::new("nebula", Category::Background).at([0.0, 0.0, -4.0]).scaled(10.0),
            ObjectDecl::new("sphere", Category::PrimaryBody).scaled(1.2),
            ObjectDecl::new("sphereGlow", Category::PrimaryBody).scaled(1.7),
            ObjectDecl::new("wellB", Category::Well).at([0.0, -1.2, 0.0]).scaled(4.0),
        ];
        let mut curves = vec![
            PhaseCurveSpec::for_id("nebula", OpacityCurve::FadeOut { k: 2.0 }),
            PhaseCurveSpec::for_id("sphere", ramp_in(0.3, 3.0, 1.0)),
            PhaseCurveSpec::for_id("sphereGlow", scaled("sphere", 0.25)),
            PhaseCurveSpec::for_id("wellB", triangle(0.2, 0.45, 0.75, 0.9)),
        ];
        push_rings_with_arrows(&mut objects, &mut curves, tilt, 0.7);

        let icons = IconCatalog::named(
            &[
                ("Analytics", "A"),
                ("Payments", "P"),
                ("Messaging", "M"),
                ("Storage", "S"),
                ("Identity", "I"),
                ("Search", "Q"),
                ("Scheduling", "T"),
                ("Reporting", "R"),
            ],
            vec![0, 1, 2, 3, 5, 6],
            IconStaggerPolicy {
                boundary: LATE_BOUNDARY,
                early: Stagger { start: 0.35, window: 0.2, rate: 8.0 },
                late: Stagger { start: 0.7, window: 0.15, rate: 8.0 },
            },
            IconLayout {
                radius_major: 3.4,
                radius_minor: 2.8,
                tilt,
                speed: 0.2,
                center: [0.0; 3],
                activation: OrbitActivation { threshold: 0.7, rate: 3.0 },
                scale: 0.45,
                pick_radius: 0.6,
            },
        );

        Self {
            name: "gravity-well".into(),
            seed: 3,
            camera: perspective([0.0, 3.0, 9.5]),
            palette: Palette::default(),
            grid: None,
            objects,
            curves,
            icons,
            orbit_particles: None,
            particle_field: None,
            pulse: PulseProfile {
                omega: 12.0,
                decay: 2.0,
                duration: 1.2,
                ..PulseProfile::default()
            },
            ambient: AmbientMotion::default(),
            readiness: RetryPolicy::default(),
        }
    }

    /// The scrub-able Rev A/B/C timeline: every structure, two wells, and a
    /// twelve-icon catalog revealed in two tiers.
    pub fn timeline() -> Self {
        let tilt = 0.3;
        let mut objects = vec![
            ObjectDecl::new("nebula", Category::Background).at([0.0, 0.0, -4.0]).scaled(10.0),
            ObjectDecl::new("sphere", Category::PrimaryBody).scaled(1.2),
            ObjectDecl::new("sphereGlow", Category::PrimaryBody).scaled(1.7),
            ObjectDecl::new("sphereRing", Category::Ring).scaled(1.6).tilted(tilt),
            ObjectDecl::new("wellB", Category::Well).at([0.0, -1.2, 0.0]).scaled(4.0),
            ObjectDecl::new("wellC", Category::Well).at([0.0, -1.4, 0.0]).scaled(5.0),
        ];
        let mut curves = vec![
            PhaseCurveSpec::for_id("nebula", OpacityCurve::FadeOut { k: 2.0 }),
            PhaseCurveSpec::for_id("sphere", ramp_in(0.3, 3.0, 1.0)),
            PhaseCurveSpec::for_id("sphereGlow", scaled("sphere", 0.25)),
            PhaseCurveSpec::for_id("sphereRing", scaled("sphere", 0.6)),
            PhaseCurveSpec::for_id("wellB", triangle(0.15, 0.4, 0.7, 1.0)),
            PhaseCurveSpec::for_id("wellC", ramp_in(0.6, 3.0, 1.0)),
            PhaseCurveSpec::for_category(Category::OrbitParticle, scaled("sphere", 0.8)),
        ];
        push_rings_with_arrows(&mut objects, &mut curves, tilt, 0.6);

        let icons = IconCatalog::named(
            &[
                ("Analytics", "A"),
                ("Payments", "P"),
                ("Messaging", "M"),
                ("Storage", "S"),
                ("Identity", "I"),
                ("Search", "Q"),
                ("Scheduling", "T"),
                ("Reporting", "R"),
                ("Automation", "W"),
                ("Security", "L"),
                ("Integrations", "N"),
                ("Insights", "G"),
            ],
            vec![0, 2, 4, 6, 8, 10],
            IconStaggerPolicy {
                boundary: LATE_BOUNDARY,
                early: Stagger { start: 0.35, window: 0.2, rate: 8.0 },
                late: Stagger { start: 0.7, window: 0.15, rate: 8.0 },
            },
            IconLayout {
                radius_major: 3.6,
                radius_minor: 3.0,
                tilt,
                speed: 0.2,
                center: [0.0; 3],
                activation: OrbitActivation { threshold: 0.7, rate: 3.0 },
                scale: 0.42,
                pick_radius: 0.55,
            },
        );

        Self {
            name: "timeline".into(),
            seed: 4,
            camera: perspective([0.0, 3.0, 10.0]),
            palette: Palette::default(),
            grid: None,
            objects,
            curves,
            icons,
            orbit_particles: Some(OrbitSwarm {
                id_prefix: "sphereOrbit".into(),
                count: 32,
                radius: (1.6, 2.3),
                flatten: 0.85,
                speed: (0.3, 0.7),
                size: (0.03, 0.06),
                tilt,
                center: [0.0; 3],
                activation: OrbitActivation { threshold: 0.4, rate: 2.0 },
            }),
            particle_field: None,
            pulse: PulseProfile::default(),
            ambient: AmbientMotion::default(),
            readiness: RetryPolicy { max_attempts: 30, delay: 0.1 },
        }
    }
}

fn ramp_in(start: f32, rate: f32, cap: f32) -> OpacityCurve {
    OpacityCurve::RampIn { start, rate, cap }
}

fn scaled(source: &str, factor: f32) -> OpacityCurve {
    OpacityCurve::Scaled { source: source.to_string(), factor }
}

fn triangle(start: f32, mid: f32, end: f32, peak: f32) -> OpacityCurve {
    OpacityCurve::Triangle { start, mid, end, peak }
}

/// 45 degree camera looking at the origin.
fn perspective(eye: [f32; 3]) -> CameraConfig {
    CameraConfig::Perspective { fov_y_degrees: 45.0, eye, target: [0.0; 3] }
}

/// Three capped decoration rings, each with a direction arrow that shares
/// its opacity.
fn push_rings_with_arrows(
    objects: &mut Vec<ObjectDecl>,
    curves: &mut Vec<PhaseCurveSpec>,
    tilt: f32,
    cap: f32,
) {
    for (i, radius) in [2.4, 3.0, 3.6].iter().enumerate() {
        let ring = format!("ring[{i}]");
        let arrow = format!("ring[{i}].arrow");
        objects.push(ObjectDecl::new(&ring, Category::Ring).scaled(*radius).tilted(tilt));
        objects.push(
            ObjectDecl::new(&arrow, Category::Ring)
                .at([*radius, 0.0, 0.0])
                .scaled(0.15)
                .tilted(tilt),
        );
        curves.push(PhaseCurveSpec::for_id(&ring, ramp_in(0.35, 2.5, cap)));
        curves.push(PhaseCurveSpec::for_id(&arrow, scaled(&ring, 1.0)));
    }
}
