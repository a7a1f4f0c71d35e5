/// Host page integration: page content, selection, mounting, frame delivery
use serde::Serialize;
use url::Url;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlIFrameElement, Window};

use crate::analysis::AnalysisInput;
use crate::config::PageSource;

pub const CONTAINER_PREFIX: &str = "bias-lens";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime"], js_name = getURL)]
    fn runtime_get_url(path: &str) -> Result<String, JsValue>;
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("no window available")]
    NoWindow,
    #[error("no document available")]
    NoDocument,
    #[error("document has no body")]
    NoBody,
    #[error("frame has no content window")]
    NoFrameWindow,
    #[error("DOM operation failed: {0}")]
    Dom(String),
    #[error("could not serialize message: {0}")]
    Serialize(String),
}

impl From<HostError> for JsValue {
    fn from(e: HostError) -> JsValue {
        JsValue::from_str(&e.to_string())
    }
}

/// Page content the widget falls back to when nothing is selected
#[derive(Debug, Clone, PartialEq)]
pub enum PageContent {
    Text(String),
    Url(String),
}

/// The selection wins over page content when it has any non-blank text
pub fn input_for_page(selection: Option<String>, page: PageContent) -> AnalysisInput {
    match selection.filter(|s| !s.trim().is_empty()) {
        Some(selected) => AnalysisInput::from_text(selected.trim()),
        None => match page {
            PageContent::Text(text) => AnalysisInput::from_text(text),
            PageContent::Url(url) => AnalysisInput::from_url(url),
        },
    }
}

pub fn container_id(instance: &uuid::Uuid) -> String {
    format!("{}-{}", CONTAINER_PREFIX, instance.simple())
}

fn window() -> Result<Window, HostError> {
    web_sys::window().ok_or(HostError::NoWindow)
}

fn document() -> Result<Document, HostError> {
    window()?.document().ok_or(HostError::NoDocument)
}

fn dom_error(e: JsValue) -> HostError {
    HostError::Dom(e.as_string().unwrap_or_else(|| format!("{:?}", e)))
}

pub fn page_location() -> Option<Url> {
    let href = window().ok()?.location().href().ok()?;
    Url::parse(&href).ok()
}

pub fn selected_text() -> Option<String> {
    let selection = window().ok()?.get_selection().ok()??;
    Some(String::from(selection.to_string()))
}

/// What to analyze right now: the selection, else page text or page URL
pub fn current_input(source: PageSource) -> Result<AnalysisInput, HostError> {
    let page = match source {
        PageSource::Text => {
            let body = document()?.body().ok_or(HostError::NoBody)?;
            PageContent::Text(body.inner_text())
        }
        PageSource::Url => PageContent::Url(window()?.location().href().map_err(dom_error)?),
    };
    Ok(input_for_page(selected_text(), page))
}

/// Append a fresh container for one widget instance to the page body
pub fn mount_container(instance: &uuid::Uuid) -> Result<Element, HostError> {
    let document = document()?;
    let body = document.body().ok_or(HostError::NoBody)?;
    let container = document.create_element("div").map_err(dom_error)?;
    container.set_id(&container_id(instance));
    body.append_child(&container).map_err(dom_error)?;
    Ok(container)
}

/// URL of a resource bundled with the extension; the bare path outside one
pub fn extension_resource(path: &str) -> String {
    match runtime_get_url(path) {
        Ok(url) => url,
        Err(_) => {
            log::debug!("chrome.runtime unavailable, using {} as-is", path);
            path.to_string()
        }
    }
}

/// Deliver a result to an embedded frame, only to the given origin
pub fn post_to_frame<T: Serialize>(frame: &HtmlIFrameElement, message: &T, target_origin: &str) -> Result<(), HostError> {
    let target = frame.content_window().ok_or(HostError::NoFrameWindow)?;
    let value = message
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| HostError::Serialize(e.to_string()))?;
    target.post_message(&value, target_origin).map_err(dom_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_takes_precedence() {
        let input = input_for_page(
            Some("  quoted claim  ".to_string()),
            PageContent::Text("whole page".to_string()),
        );

        assert_eq!(input, AnalysisInput::from_text("quoted claim"));
    }

    #[test]
    fn test_blank_selection_falls_back_to_page_text() {
        let input = input_for_page(Some(" \n".to_string()), PageContent::Text("whole page".to_string()));

        assert_eq!(input, AnalysisInput::from_text("whole page"));
    }

    #[test]
    fn test_page_url_source() {
        let input = input_for_page(None, PageContent::Url("https://news.example.com/story".to_string()));

        assert_eq!(input, AnalysisInput::from_url("https://news.example.com/story"));
    }

    #[test]
    fn test_container_ids_are_unique() {
        let a = container_id(&uuid::Uuid::new_v4());
        let b = container_id(&uuid::Uuid::new_v4());

        assert!(a.starts_with("bias-lens-"));
        assert_ne!(a, b);
    }
}
