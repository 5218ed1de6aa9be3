use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement};

use crate::pick::Tooltip;
use crate::timeline::PhaseReadout;

/// Page elements written as side effects of phase and hover changes. Any of
/// them may be missing; the visualization runs without.
pub struct DomSurface {
    label: Option<Element>,
    month: Option<Element>,
    slider: Option<HtmlInputElement>,
    tooltip: Option<HtmlElement>,
}

impl DomSurface {
    pub fn find(document: &Document) -> Self {
        Self {
            label: document.get_element_by_id("phase-label"),
            month: document.get_element_by_id("phase-month"),
            slider: document
                .get_element_by_id("phase-slider")
                .and_then(|e| e.dyn_into::<HtmlInputElement>().ok()),
            tooltip: document
                .get_element_by_id("tooltip")
                .and_then(|e| e.dyn_into::<HtmlElement>().ok()),
        }
    }

    pub fn slider(&self) -> Option<&HtmlInputElement> {
        self.slider.as_ref()
    }

    pub fn show_readout(&self, readout: PhaseReadout) {
        if let Some(label) = &self.label {
            label.set_text_content(Some(readout.sub_phase.label()));
        }
        if let Some(month) = &self.month {
            month.set_text_content(Some(&readout.month.to_string()));
        }
    }

    /// Move the slider when the phase was set from script.
    pub fn sync_slider(&self, phase: f32) {
        if let Some(slider) = &self.slider {
            slider.set_value_as_number(f64::from(phase));
        }
    }
}

impl Tooltip for DomSurface {
    fn show(&mut self, text: &str) {
        if let Some(tooltip) = &self.tooltip {
            tooltip.set_text_content(Some(text));
            tooltip.style().set_property("display", "block").ok();
        }
    }

    fn hide(&mut self) {
        if let Some(tooltip) = &self.tooltip {
            tooltip.style().set_property("display", "none").ok();
        }
    }
}
