/// Bias Lens - browser extension widget and companion page for bias analysis
/// Built with Rust + WASM + Yew

mod analysis;
mod config;
mod fetch;
mod host;
mod markup;
mod requester;
mod widget;
pub mod ui;

use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::Element;
use yew::AppHandle;

use crate::config::{AnalyzerConfig, ValidatedConfig};
pub use crate::analysis::NO_RESPONSE_MESSAGE;
use crate::ui::form::{AnalyzeForm, AnalyzeFormProps};
use crate::ui::panel::{AnalyzerPanel, AnalyzerPanelProps};

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// Parse a JS config object (or nothing) and validate it against the page
fn load_config(raw: JsValue) -> Result<ValidatedConfig, JsValue> {
    let config: AnalyzerConfig = if raw.is_null() || raw.is_undefined() {
        AnalyzerConfig::default()
    } else {
        serde_wasm_bindgen::from_value(raw).map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
    };

    config
        .validate(host::page_location().as_ref())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// One floating widget on the host page. Several may coexist; each owns
/// its container and is removed with `dispose`.
#[wasm_bindgen]
pub struct Widget {
    app: AppHandle<AnalyzerPanel>,
    container: Element,
}

#[wasm_bindgen]
impl Widget {
    pub fn id(&self) -> String {
        self.container.id()
    }

    pub fn dispose(self) {
        let Widget { app, container } = self;
        app.destroy();
        container.remove();
        log::info!("Widget {} disposed", container.id());
    }
}

// Mount the floating widget from the content script
#[wasm_bindgen]
pub fn mount_widget(config: JsValue) -> Result<Widget, JsValue> {
    let config = Rc::new(load_config(config)?);
    let instance = uuid::Uuid::new_v4();
    let container = host::mount_container(&instance)?;

    let app = yew::Renderer::<AnalyzerPanel>::with_root_and_props(container.clone(), AnalyzerPanelProps { config })
        .render();
    log::info!("Widget {} mounted", container.id());

    Ok(Widget { app, container })
}

// Start the Yew app for the companion analysis page
#[wasm_bindgen]
pub fn start_form(config: JsValue) -> Result<(), JsValue> {
    let config = Rc::new(load_config(config)?);
    yew::Renderer::<AnalyzeForm>::with_props(AnalyzeFormProps { config }).render();
    Ok(())
}
