/// Companion page: analyze a pasted URL or article text

use std::rc::Rc;

use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlTextAreaElement};
use yew::prelude::*;

use crate::analysis::AnalysisInput;
use crate::config::{InputPolicy, ValidatedConfig};
use crate::fetch::FetchTransport;
use crate::requester::{AnalysisRequester, RequestSlot};
use crate::ui::components::ResultView;

const EMPTY_INPUT_MESSAGE: &str = "Enter a URL or paste some text to analyze.";
const FIELD_STYLE: &str = "width: 100%; box-sizing: border-box; padding: 8px; \
    border: 1px solid #d2d2d2; border-radius: 4px; font: inherit;";

#[derive(Properties, PartialEq)]
pub struct AnalyzeFormProps {
    pub config: Rc<ValidatedConfig>,
}

/// Which of the two fields are disabled, as (url, text)
pub fn disabled_fields(policy: InputPolicy, url: &str, text: &str) -> (bool, bool) {
    match policy {
        InputPolicy::Combined => (false, false),
        InputPolicy::Exclusive => (!text.trim().is_empty(), !url.trim().is_empty()),
    }
}

#[function_component(AnalyzeForm)]
pub fn analyze_form(props: &AnalyzeFormProps) -> Html {
    let url = use_state(String::new);
    let text = use_state(String::new);
    let notice = use_state(|| None::<String>);
    let slot = use_reducer(RequestSlot::new);
    let config = props.config.clone();
    let policy = config.settings.input_policy;

    let on_url_input = {
        let url = url.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                url.set(input.value());
            }
        })
    };

    let on_text_input = {
        let text = text.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlTextAreaElement>() {
                text.set(input.value());
            }
        })
    };

    let on_analyze = {
        let url = url.clone();
        let text = text.clone();
        let notice = notice.clone();
        let dispatcher = slot.dispatcher();
        let config = config.clone();

        Callback::from(move |_| {
            let input = AnalysisInput::from_fields(&url, &text, policy);
            if input.is_empty() {
                notice.set(Some(EMPTY_INPUT_MESSAGE.to_string()));
                return;
            }
            notice.set(None);

            let dispatcher = dispatcher.clone();
            let config = config.clone();
            spawn_local(async move {
                let requester = AnalysisRequester::new(FetchTransport, config.endpoint.clone(), config.timeout());
                requester
                    .run(input, js_sys::Date::now(), |action| dispatcher.dispatch(action))
                    .await;
            });
        })
    };

    let (url_disabled, text_disabled) = disabled_fields(policy, &url, &text);

    html! {
        <div class="bias-lens-form" style="padding: 20px; max-width: 720px; margin: 0 auto;">
            <h1 class="bias-lens-title" style="font-size: 1.5em; margin-bottom: 16px;">{"Bias Detector"}</h1>

            <div class="bias-lens-fields" style="display: flex; flex-direction: column; gap: 10px;">
                <input
                    type="text"
                    class="bias-lens-input"
                    style={FIELD_STYLE}
                    placeholder="Paste a news article URL..."
                    value={(*url).clone()}
                    oninput={on_url_input}
                    disabled={url_disabled}
                />
                <textarea
                    class="bias-lens-input"
                    style={FIELD_STYLE}
                    rows="8"
                    placeholder="...or paste the article text"
                    value={(*text).clone()}
                    oninput={on_text_input}
                    disabled={text_disabled}
                />
                <Button onclick={on_analyze} variant={ButtonVariant::Primary} block={true}>
                    {"Analyze"}
                </Button>
            </div>

            if let Some(message) = (*notice).clone() {
                <Alert r#type={AlertType::Warning} title={message} inline={true}>
                </Alert>
            }

            <div class="bias-lens-result" style="margin-top: 16px;">
                <ResultView slot={(*slot).clone()} />
            </div>
        </div>
    }
}
