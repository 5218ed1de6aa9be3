//! Phase curve engine: maps the controlling phase scalar onto per-object
//! opacity.
//!
//! Every evaluation depends only on the phase passed in. Applying the same
//! phase twice leaves the scene exactly as the first call did.

use serde::{Deserialize, Serialize};

use crate::error::VizError;
use crate::scene::{Category, SceneObject, SceneRegistry};

/// Objects at or below this opacity are not drawn.
pub const VISIBILITY_EPSILON: f32 = 0.01;

/// Boundary between the "Rev B" and "Rev C" bands.
pub const LATE_BOUNDARY: f32 = 2.0 / 3.0;

/// Clamp into `[0, 1]`, mapping NaN to 0.
pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Interpret an unconstrained caller-supplied phase.
pub fn sanitize_phase(phase: f64) -> f32 {
    if phase.is_nan() {
        0.0
    } else {
        phase.clamp(0.0, 1.0) as f32
    }
}

/// Linear ramp `clamp((phase - start) * rate, 0, 1)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ramp {
    pub start: f32,
    pub rate: f32,
}

impl Ramp {
    pub fn new(start: f32, rate: f32) -> Self {
        Self { start, rate }
    }

    /// Ramp reaching 1 at `end`. A zero-width window becomes a step at `start`.
    pub fn over(start: f32, end: f32) -> Self {
        let width = end - start;
        let rate = if width > f32::EPSILON { 1.0 / width } else { f32::INFINITY };
        Self { start, rate }
    }

    /// Phase at which the ramp reaches 1.
    pub fn end(&self) -> f32 {
        if self.rate.is_finite() && self.rate > 0.0 {
            self.start + 1.0 / self.rate
        } else {
            self.start
        }
    }

    pub fn eval(&self, phase: f32) -> f32 {
        if self.rate == f32::INFINITY {
            return if phase >= self.start { 1.0 } else { 0.0 };
        }
        if self.rate.is_nan() || self.rate <= 0.0 {
            return 0.0;
        }
        clamp01((phase - self.start) * self.rate)
    }
}

/// Inclusive phase interval a curve is active in; outside it the target is
/// fully transparent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseRange {
    pub min: f32,
    pub max: f32,
}

impl Default for PhaseRange {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl PhaseRange {
    pub fn contains(&self, phase: f32) -> bool {
        phase >= self.min && phase <= self.max
    }
}

fn full_cap() -> f32 {
    1.0
}

/// Shape of one object's opacity as a function of phase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OpacityCurve {
    /// `max(0, 1 - phase * k)`.
    FadeOut { k: f32 },
    /// One-way ramp-in, held at `cap` once complete.
    RampIn {
        start: f32,
        rate: f32,
        #[serde(default = "full_cap")]
        cap: f32,
    },
    /// Up from `start` to `peak` at `mid`, back down to zero at `end`.
    Triangle {
        start: f32,
        mid: f32,
        end: f32,
        #[serde(default = "full_cap")]
        peak: f32,
    },
    /// Another object's opacity times `factor`.
    Scaled { source: String, factor: f32 },
    Constant { value: f32 },
}

impl OpacityCurve {
    /// Phase range over which the value changes, if it is an independent curve.
    pub fn ramp_range(&self) -> Option<(f32, f32)> {
        match *self {
            OpacityCurve::FadeOut { k } => {
                let end = if k > 0.0 { 1.0 / k } else { f32::INFINITY };
                Some((0.0, end))
            }
            OpacityCurve::RampIn { start, rate, .. } => Some((start, Ramp::new(start, rate).end())),
            OpacityCurve::Triangle { start, end, .. } => Some((start, end)),
            OpacityCurve::Scaled { .. } | OpacityCurve::Constant { .. } => None,
        }
    }

    /// Evaluate an independent curve. Derived curves evaluate to 0 here; the
    /// table resolves them against their source.
    pub fn eval(&self, phase: f32) -> f32 {
        match *self {
            OpacityCurve::FadeOut { k } => clamp01(1.0 - phase * k.max(0.0)),
            OpacityCurve::RampIn { start, rate, cap } => {
                Ramp::new(start, rate).eval(phase) * clamp01(cap)
            }
            OpacityCurve::Triangle { start, mid, end, peak } => {
                if phase <= start || phase >= end {
                    return 0.0;
                }
                let up = Ramp::over(start, mid).eval(phase);
                let down = 1.0 - Ramp::over(mid, end).eval(phase);
                clamp01(up.min(down) * clamp01(peak))
            }
            OpacityCurve::Constant { value } => clamp01(value),
            OpacityCurve::Scaled { .. } => 0.0,
        }
    }
}

/// Which objects a curve writes to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveTarget {
    Id(String),
    Category(Category),
}

/// Declarative per-object phase curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseCurveSpec {
    pub target: CurveTarget,
    pub curve: OpacityCurve,
    #[serde(default)]
    pub applies_when: PhaseRange,
}

impl PhaseCurveSpec {
    pub fn for_id(id: &str, curve: OpacityCurve) -> Self {
        Self {
            target: CurveTarget::Id(id.to_string()),
            curve,
            applies_when: PhaseRange::default(),
        }
    }

    pub fn for_category(category: Category, curve: OpacityCurve) -> Self {
        Self {
            target: CurveTarget::Category(category),
            curve,
            applies_when: PhaseRange::default(),
        }
    }

    pub fn ramp_start(&self) -> Option<f32> {
        self.curve.ramp_range().map(|(start, _)| start)
    }

    pub fn ramp_end(&self) -> Option<f32> {
        self.curve.ramp_range().map(|(_, end)| end)
    }
}

/// Staggered ramp for a ranked group of icons.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stagger {
    pub start: f32,
    pub window: f32,
    pub rate: f32,
}

impl Stagger {
    /// `start + rank / len * window`.
    pub fn delay(&self, rank: usize, len: usize) -> f32 {
        self.start + rank as f32 / len.max(1) as f32 * self.window
    }

    /// Phase at which the last of `len` ranks is fully shown. Never, for a
    /// stagger that cannot rise.
    pub fn settled_at(&self, len: usize) -> f32 {
        if len == 0 {
            return 0.0;
        }
        if self.rate.is_nan() || self.rate <= 0.0 {
            return f32::INFINITY;
        }
        Ramp::new(self.delay(len - 1, len), self.rate).end()
    }

    pub fn opacity(&self, phase: f32, rank: usize, len: usize) -> f32 {
        Ramp::new(self.delay(rank, len), self.rate).eval(phase)
    }
}

/// Two-tier icon visibility. Below `boundary` only the early subset shows;
/// from `boundary` on, early icons hold at 1 and the rest stagger in.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IconStaggerPolicy {
    #[serde(default = "late_boundary")]
    pub boundary: f32,
    pub early: Stagger,
    pub late: Stagger,
}

fn late_boundary() -> f32 {
    LATE_BOUNDARY
}

/// An icon's place in the stagger order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IconSlot {
    Early { rank: usize, len: usize },
    Late { rank: usize, len: usize },
}

impl IconStaggerPolicy {
    pub fn opacity(&self, phase: f32, slot: IconSlot) -> f32 {
        match (phase < self.boundary, slot) {
            (true, IconSlot::Early { rank, len }) => self.early.opacity(phase, rank, len),
            (true, IconSlot::Late { .. }) => 0.0,
            (false, IconSlot::Early { .. }) => 1.0,
            (false, IconSlot::Late { rank, len }) => self.late.opacity(phase, rank, len),
        }
    }

    /// Phase at which the slowest early icon is fully shown.
    pub fn early_settled_at(&self, len: usize) -> f32 {
        self.early.settled_at(len)
    }

    /// Phase at which the slowest late icon is fully shown.
    pub fn late_settled_at(&self, len: usize) -> f32 {
        self.late.settled_at(len)
    }
}

/// Rank every icon. Early icons rank by their position in `early_subset`;
/// the rest rank among themselves in catalog order.
pub fn assign_icon_slots(
    icon_count: usize,
    early_subset: &[usize],
) -> Result<Vec<IconSlot>, VizError> {
    let mut early_rank = vec![None; icon_count];
    for (rank, &index) in early_subset.iter().enumerate() {
        let slot = early_rank.get_mut(index).ok_or_else(|| {
            VizError::InvalidConfig(format!(
                "early icon index {index} out of range ({icon_count} icons)"
            ))
        })?;
        if slot.is_some() {
            return Err(VizError::InvalidConfig(format!("early icon index {index} listed twice")));
        }
        *slot = Some(rank);
    }

    let early_len = early_subset.len();
    let late_len = icon_count - early_len;
    let mut late_rank = 0;
    Ok(early_rank
        .into_iter()
        .map(|rank| match rank {
            Some(rank) => IconSlot::Early { rank, len: early_len },
            None => {
                let slot = IconSlot::Late { rank: late_rank, len: late_len };
                late_rank += 1;
                slot
            }
        })
        .collect())
}

#[derive(Clone, Debug)]
struct CompiledCurve {
    targets: Vec<usize>,
    curve: OpacityCurve,
    source: Option<usize>,
    applies_when: PhaseRange,
}

impl CompiledCurve {
    fn value(&self, phase: f32, objects: &[SceneObject]) -> f32 {
        if !self.applies_when.contains(phase) {
            return 0.0;
        }
        match (&self.curve, self.source) {
            (OpacityCurve::Scaled { factor, .. }, Some(source)) => {
                clamp01(objects[source].opacity() * factor)
            }
            (curve, _) => curve.eval(phase),
        }
    }
}

/// Curve specs resolved against a registry.
#[derive(Clone, Debug)]
pub struct CurveTable {
    independent: Vec<CompiledCurve>,
    derived: Vec<CompiledCurve>,
    icons: Vec<(usize, IconSlot)>,
    icon_policy: Option<IconStaggerPolicy>,
}

impl CurveTable {
    /// Resolve ids to registry indices. Derived curves must name an
    /// independently curved source.
    pub fn compile(
        specs: &[PhaseCurveSpec],
        registry: &SceneRegistry,
        icon_policy: Option<IconStaggerPolicy>,
        early_subset: &[usize],
    ) -> Result<Self, VizError> {
        let mut independent = Vec::new();
        let mut derived = Vec::new();

        for spec in specs {
            let targets: Vec<usize> = match &spec.target {
                CurveTarget::Id(id) => vec![registry
                    .index_of(id)
                    .ok_or_else(|| VizError::UnknownObject(id.clone()))?],
                CurveTarget::Category(category) => registry.indices_of(*category).collect(),
            };

            let source = match &spec.curve {
                OpacityCurve::Scaled { source, .. } => Some(
                    registry
                        .index_of(source)
                        .ok_or_else(|| VizError::UnknownObject(source.clone()))?,
                ),
                _ => None,
            };

            let compiled = CompiledCurve {
                targets,
                curve: spec.curve.clone(),
                source,
                applies_when: spec.applies_when,
            };
            if source.is_some() {
                derived.push(compiled);
            } else {
                independent.push(compiled);
            }
        }

        for curve in &derived {
            let source = curve.source.unwrap_or_default();
            if derived.iter().any(|other| other.targets.contains(&source)) {
                return Err(VizError::InvalidConfig(format!(
                    "`{}` is itself derived and cannot drive another curve",
                    registry.objects()[source].id()
                )));
            }
        }

        let icon_indices: Vec<usize> = registry.indices_of(Category::Icon).collect();
        let slots = assign_icon_slots(icon_indices.len(), early_subset)?;
        if let Some(policy) = &icon_policy {
            let settled = policy.early_settled_at(early_subset.len());
            if settled > policy.boundary + 1e-4 {
                return Err(VizError::InvalidConfig(format!(
                    "early icons settle at phase {settled:.3}, after the boundary {:.3}",
                    policy.boundary
                )));
            }
            let late_len = icon_indices.len() - early_subset.len();
            let settled = policy.late_settled_at(late_len);
            if settled > 1.0 + 1e-4 {
                return Err(VizError::InvalidConfig(format!(
                    "late icons settle at phase {settled:.3}, after the end of the timeline"
                )));
            }
        }

        Ok(Self {
            independent,
            derived,
            icons: icon_indices.into_iter().zip(slots).collect(),
            icon_policy,
        })
    }

    /// Slot assigned to the icon at registry index `index`.
    pub fn icon_slot(&self, index: usize) -> Option<IconSlot> {
        self.icons.iter().find(|(i, _)| *i == index).map(|(_, slot)| *slot)
    }
}

/// Write every curved object's opacity for `phase`.
pub fn apply_phase(phase: f32, objects: &mut [SceneObject], table: &CurveTable) {
    let phase = clamp01(phase);

    for curve in &table.independent {
        let value = curve.value(phase, objects);
        for &target in &curve.targets {
            objects[target].set_opacity(value);
        }
    }
    if let Some(policy) = &table.icon_policy {
        for &(index, slot) in &table.icons {
            objects[index].set_opacity(policy.opacity(phase, slot));
        }
    }
    // Derived curves read sources written above in this same call.
    for curve in &table.derived {
        let value = curve.value(phase, objects);
        for &target in &curve.targets {
            objects[target].set_opacity(value);
        }
    }
}
