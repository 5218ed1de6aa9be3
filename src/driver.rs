//! Scene state and the per-frame driver.
//!
//! `SceneState` owns everything the subsystems mutate; the driver owns the
//! state plus a renderer and decides, per display frame, what runs.

use glam::Vec2;

use crate::ambient::{AmbientMotion, ParticleField};
use crate::camera::Camera;
use crate::curve::{apply_phase, sanitize_phase, CurveTable};
use crate::error::VizError;
use crate::orbit::advance_orbits;
use crate::pick::{pick_icon, HoverChange, HoverTracker, Tooltip};
use crate::pulse::{advance_pulses, trigger_pulse, PulseProfile};
use crate::readiness::{Readiness, ReadinessPoll};
use crate::scene::SceneRegistry;
use crate::timeline::PhaseReadout;
use crate::variant::VariantConfig;

/// Longest step a single frame may take, in seconds.
pub const MAX_FRAME_DELTA: f64 = 0.1;

/// Which glyph source icon textures should be drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlyphSource {
    Font,
    Placeholder,
}

/// Draws the scene. Everything GPU-side belongs to the implementation.
pub trait Renderer {
    fn render(&mut self, scene: &SceneState);

    /// Whether assets the icon textures depend on (fonts) are usable.
    fn assets_ready(&self) -> bool {
        true
    }

    /// Rebuild icon textures once readiness resolves.
    fn regenerate_icon_textures(&mut self, _source: GlyphSource) {}

    /// Free GPU resources. Called once on teardown.
    fn release(&mut self) {}
}

pub struct SceneState {
    config: VariantConfig,
    registry: SceneRegistry,
    curves: CurveTable,
    phase: f32,
    readout: PhaseReadout,
    camera: Camera,
    hover: HoverTracker,
    particles: Option<ParticleField>,
    readiness: ReadinessPoll,
    time: f64,
}

impl SceneState {
    pub fn new(config: VariantConfig, aspect: f32) -> Result<Self, VizError> {
        config.validate()?;
        let registry = SceneRegistry::build(&config)?;
        let curves = CurveTable::compile(
            &config.curves,
            &registry,
            config.icons.stagger,
            &config.icons.early_subset,
        )?;
        if let Some(field) = &config.particle_field {
            if registry.index_of(&field.follows).is_none() {
                return Err(VizError::UnknownObject(field.follows.clone()));
            }
        }
        let particles = config.particle_field.as_ref().map(|f| ParticleField::new(f, config.seed));

        let mut state = Self {
            camera: Camera::new(config.camera, aspect),
            readiness: ReadinessPoll::new(config.readiness),
            registry,
            curves,
            phase: 0.0,
            readout: PhaseReadout::for_phase(0.0),
            hover: HoverTracker::default(),
            particles,
            time: 0.0,
            config,
        };
        state.set_phase(0.0);
        log::info!("variant `{}` ready with {} objects", state.config.name, state.registry.len());
        Ok(state)
    }

    pub fn config(&self) -> &VariantConfig {
        &self.config
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SceneRegistry {
        &mut self.registry
    }

    pub fn curves(&self) -> &CurveTable {
        &self.curves
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn particles(&self) -> Option<&ParticleField> {
        self.particles.as_ref()
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness.state()
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn readout(&self) -> PhaseReadout {
        self.readout
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hover.current()
    }

    /// Seconds of processed frame time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Time uniform for the nebula effect.
    pub fn effect_time(&self) -> f32 {
        (self.time * f64::from(self.config.ambient.effect_flow)) as f32
    }

    pub fn pulse_profile(&self) -> &PulseProfile {
        &self.config.pulse
    }

    pub fn ambient(&self) -> &AmbientMotion {
        &self.config.ambient
    }

    /// Apply a new phase. Any finite or non-finite input is accepted.
    ///
    /// A hovered icon the new phase hides stops being hovered; the tooltip
    /// is hidden when one is given.
    pub fn set_phase(&mut self, phase: f64) -> PhaseReadout {
        self.set_phase_with(phase, None)
    }

    pub fn set_phase_with(
        &mut self,
        phase: f64,
        tooltip: Option<&mut dyn Tooltip>,
    ) -> PhaseReadout {
        let phase = sanitize_phase(phase);
        let previous = self.readout.sub_phase;
        self.phase = phase;
        apply_phase(phase, self.registry.objects_mut(), &self.curves);
        let change = self.hover.release_hidden(self.registry.objects_mut(), &self.config.pulse);
        if let (HoverChange::Left(_), Some(tooltip)) = (change, tooltip) {
            tooltip.hide();
        }
        self.readout = PhaseReadout::for_phase(phase);
        if self.readout.sub_phase != previous {
            log::debug!("entered {} at phase {phase:.3}", self.readout.sub_phase);
        }
        self.readout
    }

    pub fn resize(&mut self, aspect: f32) {
        self.camera.set_aspect(aspect);
    }

    /// Hit-test at a pointer position and move hover accordingly.
    pub fn pointer_move(&mut self, ndc: Vec2, tooltip: &mut dyn Tooltip) -> HoverChange {
        let ray = self.camera.ray_from_ndc(ndc);
        let hit = pick_icon(&ray, self.registry.objects());
        self.hover.update(hit, self.registry.objects_mut(), &self.config.pulse, tooltip)
    }

    /// Pulse the icon under the pointer. Returns the index that started pulsing.
    pub fn click(&mut self, ndc: Vec2) -> Option<usize> {
        let ray = self.camera.ray_from_ndc(ndc);
        let hit = pick_icon(&ray, self.registry.objects())?;
        trigger_pulse(&mut self.registry.objects_mut()[hit]).then_some(hit)
    }

    /// Everything that advances with time, in frame order.
    pub fn advance(&mut self, delta: f32) {
        self.time += f64::from(delta);
        let objects = self.registry.objects_mut();
        self.config.ambient.advance(delta, objects);
        advance_orbits(delta, self.phase, objects);
        advance_pulses(delta, objects, &self.config.pulse);
        if let Some(field) = self.particles.as_mut() {
            field.advance(delta, self.time as f32);
        }
    }
}

/// What a call to [`FrameDriver::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tick {
    /// Torn down; the host must not schedule another frame.
    Stopped,
    /// Page hidden; reschedule but nothing advanced.
    Skipped,
    Rendered { delta: f64 },
}

pub struct FrameDriver<R: Renderer> {
    state: SceneState,
    renderer: R,
    last_time: Option<f64>,
    page_visible: bool,
    running: bool,
}

impl<R: Renderer> FrameDriver<R> {
    pub fn new(state: SceneState, renderer: R) -> Self {
        Self { state, renderer, last_time: None, page_visible: true, running: true }
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SceneState {
        &mut self.state
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_page_visible(&mut self, visible: bool) {
        if self.page_visible != visible {
            log::debug!("page {}", if visible { "visible" } else { "hidden" });
        }
        self.page_visible = visible;
    }

    /// One display frame at host time `now` (seconds).
    pub fn tick(&mut self, now: f64) -> Tick {
        if !self.running {
            return Tick::Stopped;
        }
        if !self.page_visible {
            return Tick::Skipped;
        }

        let delta = match self.last_time {
            Some(last) if now.is_finite() => (now - last).clamp(0.0, MAX_FRAME_DELTA),
            _ => 0.0,
        };
        if now.is_finite() {
            self.last_time = Some(now);
        }

        let renderer = &self.renderer;
        if let Some(outcome) = self.state.readiness.poll(now, || renderer.assets_ready()) {
            let source = match outcome {
                Readiness::GaveUp => GlyphSource::Placeholder,
                _ => GlyphSource::Font,
            };
            self.renderer.regenerate_icon_textures(source);
        }

        self.state.advance(delta as f32);
        self.renderer.render(&self.state);
        Tick::Rendered { delta }
    }

    /// Stop ticking and release renderer resources. Idempotent.
    pub fn teardown(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.renderer.release();
        log::info!("variant `{}` torn down", self.state.config.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingRenderer {
        frames: usize,
        ready: bool,
        regenerated: Vec<GlyphSource>,
        released: usize,
    }

    impl Renderer for CountingRenderer {
        fn render(&mut self, _scene: &SceneState) {
            self.frames += 1;
        }
        fn assets_ready(&self) -> bool {
            self.ready
        }
        fn regenerate_icon_textures(&mut self, source: GlyphSource) {
            self.regenerated.push(source);
        }
        fn release(&mut self) {
            self.released += 1;
        }
    }

    fn driver() -> FrameDriver<CountingRenderer> {
        let state = SceneState::new(VariantConfig::timeline(), 16.0 / 9.0).unwrap();
        FrameDriver::new(state, CountingRenderer::default())
    }

    #[test]
    fn delta_is_clamped() {
        let mut driver = driver();
        assert_eq!(driver.tick(1.0), Tick::Rendered { delta: 0.0 });
        assert_eq!(driver.tick(1.016), Tick::Rendered { delta: 1.016 - 1.0 });
        assert_eq!(driver.tick(3.0), Tick::Rendered { delta: MAX_FRAME_DELTA });
        assert_eq!(driver.tick(2.0), Tick::Rendered { delta: 0.0 });
    }

    #[test]
    fn hidden_page_skips_work() {
        let mut driver = driver();
        driver.tick(0.0);
        driver.tick(0.05);
        let time = driver.state().time();
        driver.set_page_visible(false);
        assert_eq!(driver.tick(0.1), Tick::Skipped);
        assert_eq!(driver.tick(5.0), Tick::Skipped);
        assert_eq!(driver.state().time(), time);
        assert_eq!(driver.renderer().frames, 2);

        driver.set_page_visible(true);
        assert_eq!(driver.tick(5.01), Tick::Rendered { delta: MAX_FRAME_DELTA });
    }

    #[test]
    fn teardown_stops_and_releases_once() {
        let mut driver = driver();
        driver.teardown();
        driver.teardown();
        assert_eq!(driver.tick(1.0), Tick::Stopped);
        assert_eq!(driver.renderer().released, 1);
        assert!(!driver.is_running());
    }

    #[test]
    fn placeholders_after_readiness_gives_up() {
        let mut driver = driver();
        let mut now = 0.0;
        for _ in 0..200 {
            driver.tick(now);
            now += 0.05;
        }
        assert_eq!(driver.renderer().regenerated, vec![GlyphSource::Placeholder]);
        assert_eq!(driver.state().readiness(), Readiness::GaveUp);
    }

    #[test]
    fn font_textures_once_ready() {
        let mut driver = driver();
        driver.renderer_mut().ready = true;
        driver.tick(0.0);
        driver.tick(0.016);
        assert_eq!(driver.renderer().regenerated, vec![GlyphSource::Font]);
    }

    #[test]
    fn phase_is_not_reapplied_per_frame() {
        let mut driver = driver();
        driver.state_mut().set_phase(0.5);
        let sphere = driver.state().registry().index_of("sphere").unwrap();
        driver.state_mut().registry_mut().objects_mut()[sphere].set_opacity(0.123);
        driver.tick(0.0);
        driver.tick(0.016);
        assert_eq!(driver.state().registry().objects()[sphere].opacity(), 0.123);
    }
}
