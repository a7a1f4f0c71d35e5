/// Browser `fetch` transport with an abort-based timeout
use std::time::Duration;

use gloo::timers::callback::Timeout;
use url::Url;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, Headers, Request, RequestInit, Response};

use crate::requester::{AnalysisTransport, HttpReply, TransportError};

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

impl AnalysisTransport for FetchTransport {
    async fn post_json(&self, endpoint: &Url, body: String, timeout: Duration) -> Result<HttpReply, TransportError> {
        let construction = |e: JsValue| TransportError::Construction(describe(&e));

        let window = web_sys::window().ok_or_else(|| TransportError::Construction("no window".to_string()))?;
        let controller = AbortController::new().map_err(construction)?;

        let headers = Headers::new().map_err(construction)?;
        headers.set("Content-Type", "application/json").map_err(construction)?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(&body));
        init.set_signal(Some(&controller.signal()));

        let request = Request::new_with_str_and_init(endpoint.as_str(), &init).map_err(construction)?;

        // Dropping the timer before it fires cancels the abort
        let millis = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
        let _deadline = Timeout::new(millis, move || controller.abort());

        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| TransportError::NoResponse(describe(&e)))?;
        let response: Response = response
            .dyn_into()
            .map_err(|e| TransportError::NoResponse(describe(&e)))?;

        let text = response
            .text()
            .map_err(|e| TransportError::NoResponse(describe(&e)))?;
        let body = JsFuture::from(text)
            .await
            .map_err(|e| TransportError::NoResponse(describe(&e)))?
            .as_string()
            .unwrap_or_default();

        Ok(HttpReply {
            status: response.status(),
            body,
        })
    }
}

/// Best-effort message from a thrown JS value
fn describe(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
