use thiserror::Error;

/// Errors raised while setting a visualization up.
///
/// Nothing on the per-frame or phase paths returns these; numeric edge cases
/// there are clamped instead.
#[derive(Debug, Error)]
pub enum VizError {
    #[error("curve targets unknown scene object `{0}`")]
    UnknownObject(String),

    #[error("invalid variant config: {0}")]
    InvalidConfig(String),

    #[error("failed to parse variant config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("platform unsupported: {0}")]
    Unsupported(&'static str),

    #[error("browser call failed: {0}")]
    Js(String),
}

#[cfg(target_arch = "wasm32")]
impl From<VizError> for wasm_bindgen::JsValue {
    fn from(err: VizError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for VizError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        VizError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}
