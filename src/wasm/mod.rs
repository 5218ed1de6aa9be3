//! Browser shell: finds the page's canvas, wires DOM events into the scene
//! state and drives frames from `requestAnimationFrame`.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    window, Document, Event, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent, Window,
};

use crate::camera::pointer_to_ndc;
use crate::driver::{FrameDriver, SceneState, Tick};
use crate::error::VizError;
use crate::variant::{VariantConfig, PRESETS};

mod dom;
mod render;

use dom::DomSurface;
use render::GlRenderer;

const CANVAS_ID: &str = "c";
const DEFAULT_VARIANT: &str = "timeline";

struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

struct App {
    driver: FrameDriver<GlRenderer>,
    dom: DomSurface,
    canvas: HtmlCanvasElement,
    window: Window,
    frame: Option<i32>,
    listeners: Vec<Listener>,
}

type Shared = Rc<RefCell<App>>;

thread_local! {
    static APP: RefCell<Option<Shared>> = const { RefCell::new(None) };
}

fn with_app<T>(f: impl FnOnce(&mut App) -> T) -> Option<T> {
    APP.with(|slot| slot.borrow().as_ref().map(|app| f(&mut app.borrow_mut())))
}

/// Drawing-buffer size in device pixels (ratio capped at 2) and the CSS aspect.
fn fit_canvas(window: &Window, canvas: &HtmlCanvasElement) -> (u32, u32, f32) {
    let css = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(1.0).max(1.0);
    let width = css(window.inner_width());
    let height = css(window.inner_height());
    let ratio = window.device_pixel_ratio().min(2.0);
    let (w, h) = ((width * ratio) as u32, (height * ratio) as u32);
    canvas.set_width(w);
    canvas.set_height(h);
    (w, h, (width / height) as f32)
}

fn variant_for(canvas: &HtmlCanvasElement) -> Result<VariantConfig, VizError> {
    if let Some(json) = canvas.get_attribute("data-config") {
        return VariantConfig::from_json(&json);
    }
    let name = canvas
        .get_attribute("data-variant")
        .unwrap_or_else(|| DEFAULT_VARIANT.to_string());
    VariantConfig::preset(&name).ok_or_else(|| {
        VizError::InvalidConfig(format!("unknown variant `{name}`, expected one of {PRESETS:?}"))
    })
}

fn show_fallback(document: &Document, canvas: &HtmlCanvasElement) {
    canvas.style().set_property("display", "none").ok();
    if let Some(fallback) = document
        .get_element_by_id("video-fallback")
        .and_then(|e| e.dyn_into::<HtmlElement>().ok())
    {
        fallback.style().set_property("display", "block").ok();
    }
}

impl App {
    fn new(
        window: Window,
        document: &Document,
        canvas: HtmlCanvasElement,
        config: VariantConfig,
    ) -> Result<Self, VizError> {
        let (width, height, aspect) = fit_canvas(&window, &canvas);
        let renderer = GlRenderer::new(&canvas, document.clone(), &config.palette, config.grid)?;
        let state = SceneState::new(config, aspect)?;
        let mut driver = FrameDriver::new(state, renderer);
        driver.renderer_mut().resize(width, height);

        let dom = DomSurface::find(document);
        dom.show_readout(driver.state().readout());
        dom.sync_slider(driver.state().phase());

        Ok(Self { driver, dom, canvas, window, frame: None, listeners: Vec::new() })
    }

    fn set_phase(&mut self, phase: f64) {
        let readout = self.driver.state_mut().set_phase_with(phase, Some(&mut self.dom));
        self.dom.show_readout(readout);
    }

    fn pointer_ndc(&self, event: &MouseEvent) -> Vec2 {
        pointer_to_ndc(
            event.offset_x() as f32,
            event.offset_y() as f32,
            self.canvas.client_width() as f32,
            self.canvas.client_height() as f32,
        )
    }

    fn resize(&mut self) {
        let (width, height, aspect) = fit_canvas(&self.window, &self.canvas);
        self.driver.renderer_mut().resize(width, height);
        self.driver.state_mut().resize(aspect);
    }

    fn teardown(&mut self) {
        if let Some(id) = self.frame.take() {
            self.window.cancel_animation_frame(id).ok();
        }
        for listener in self.listeners.drain(..) {
            let callback = listener.callback.as_ref().unchecked_ref();
            listener.target.remove_event_listener_with_callback(listener.kind, callback).ok();
        }
        self.driver.teardown();
    }
}

fn listen<F>(
    app: &Shared,
    target: &EventTarget,
    kind: &'static str,
    mut handler: F,
) -> Result<(), JsValue>
where
    F: FnMut(&mut App, Event) + 'static,
{
    let weak = Rc::downgrade(app);
    let callback = Closure::wrap(Box::new(move |event: Event| {
        if let Some(app) = weak.upgrade() {
            handler(&mut app.borrow_mut(), event);
        }
    }) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?;
    app.borrow_mut().listeners.push(Listener { target: target.clone(), kind, callback });
    Ok(())
}

fn wire_events(app: &Shared, document: &Document) -> Result<(), JsValue> {
    let (window, canvas, slider) = {
        let app = app.borrow();
        (app.window.clone(), app.canvas.clone(), app.dom.slider().cloned())
    };

    if let Some(slider) = slider {
        listen(app, &slider, "input", |app, _| {
            if let Some(value) = app.dom.slider().map(|s| s.value_as_number()) {
                app.set_phase(value);
            }
        })?;
    }

    listen(app, &canvas, "mousemove", |app, event| {
        if let Some(event) = event.dyn_ref::<MouseEvent>() {
            let ndc = app.pointer_ndc(event);
            app.driver.state_mut().pointer_move(ndc, &mut app.dom);
        }
    })?;

    listen(app, &canvas, "click", |app, event| {
        if let Some(event) = event.dyn_ref::<MouseEvent>() {
            let ndc = app.pointer_ndc(event);
            if let Some(index) = app.driver.state_mut().click(ndc) {
                log::debug!("pulse on {}", app.driver.state().registry().objects()[index].id());
            }
        }
    })?;

    let doc = document.clone();
    listen(app, document, "visibilitychange", move |app, _| {
        app.driver.set_page_visible(!doc.hidden());
    })?;

    listen(app, &window, "resize", |app, _| app.resize())?;
    Ok(())
}

fn start_loop(app: &Shared) -> Result<(), JsValue> {
    // `f` holds the animation-frame closure so it can reschedule itself.
    let f: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();
    let weak = Rc::downgrade(app);

    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
        let Some(app) = weak.upgrade() else {
            return;
        };
        let mut app = app.borrow_mut();
        if app.driver.tick(timestamp / 1000.0) == Tick::Stopped {
            app.frame = None;
            return;
        }
        if let Some(callback) = f.borrow().as_ref() {
            match app.window.request_animation_frame(callback.as_ref().unchecked_ref()) {
                Ok(id) => app.frame = Some(id),
                Err(err) => log::error!("request_animation_frame failed: {err:?}"),
            }
        }
    }) as Box<dyn FnMut(f64)>));

    let first = g.borrow();
    let callback = first.as_ref().ok_or("animation closure missing")?;
    let id = app.borrow().window.request_animation_frame(callback.as_ref().unchecked_ref())?;
    app.borrow_mut().frame = Some(id);
    Ok(())
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();

    let window = window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let Some(element) = document.get_element_by_id(CANVAS_ID) else {
        log::warn!("canvas #{CANVAS_ID} not found");
        return Ok(());
    };
    let canvas = element
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| "element #c is not a canvas")?;

    if !is_supported() {
        log::warn!("WebGL2 unavailable, showing fallback");
        show_fallback(&document, &canvas);
        return Ok(());
    }

    let config = variant_for(&canvas)?;
    let app: Shared = Rc::new(RefCell::new(App::new(window, &document, canvas, config)?));
    wire_events(&app, &document)?;
    start_loop(&app)?;
    APP.with(|slot| *slot.borrow_mut() = Some(app));
    Ok(())
}

/// Drive the visualization to `phase`. Values outside [0, 1] are clamped.
#[wasm_bindgen(js_name = setPhase)]
pub fn set_phase(phase: f64) {
    with_app(|app| {
        app.set_phase(phase);
        app.dom.sync_slider(app.driver.state().phase());
    });
}

#[wasm_bindgen(js_name = getPhase)]
pub fn get_phase() -> f64 {
    with_app(|app| f64::from(app.driver.state().phase())).unwrap_or(0.0)
}

/// Whether this browser can run the visualization at all.
#[wasm_bindgen(js_name = isSupported)]
pub fn is_supported() -> bool {
    let Some(document) = window().and_then(|w| w.document()) else {
        return false;
    };
    document
        .create_element("canvas")
        .ok()
        .and_then(|e| e.dyn_into::<HtmlCanvasElement>().ok())
        .and_then(|c| c.get_context("webgl2").ok().flatten())
        .is_some()
}

/// Stop the frame loop, detach listeners and free GPU resources.
#[wasm_bindgen]
pub fn dispose() {
    if let Some(app) = APP.with(|slot| slot.borrow_mut().take()) {
        app.borrow_mut().teardown();
    }
}
