#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

use hero_viz::{SceneState, VariantConfig};

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn support_check_matches_a_fresh_context() {
    let document = web_sys::window().unwrap().document().unwrap();
    let canvas = document
        .create_element("canvas")
        .unwrap()
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .unwrap();
    let has_webgl2 = canvas.get_context("webgl2").unwrap().is_some();
    assert_eq!(hero_viz::is_supported(), has_webgl2);
}

#[wasm_bindgen_test]
fn phase_api_is_inert_without_a_canvas() {
    hero_viz::set_phase(0.7);
    assert_eq!(hero_viz::get_phase(), 0.0);
    hero_viz::dispose();
}

#[wasm_bindgen_test]
fn core_runs_in_the_browser() {
    let mut state = SceneState::new(VariantConfig::timeline(), 1.0).unwrap();
    let readout = state.set_phase(1.0);
    assert_eq!(readout.sub_phase.label(), "Rev C");
    state.advance(0.016);
}
