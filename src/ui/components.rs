/// Reusable UI components

use patternfly_yew::prelude::*;
use yew::prelude::*;

use crate::markup::{Entry, ResultDocument, Span};
use crate::requester::RequestSlot;

fn render_spans(spans: &[Span]) -> Html {
    html! {
        <>
            {for spans.iter().map(|span| match span {
                Span::Plain(text) => html! { <span>{text}</span> },
                Span::Emphasis(text) => html! { <strong>{text}</strong> },
            })}
        </>
    }
}

fn render_entry(entry: &Entry) -> Html {
    match entry {
        Entry::Field { label, value } => html! {
            <p class="bias-lens-field" style="margin: 4px 0;">
                <strong>{format!("{}: ", label)}</strong>
                <span class="bias-lens-field-value">{value}</span>
            </p>
        },
        Entry::Heading { level, spans } => {
            let content = render_spans(spans);
            match *level {
                1 => html! { <h1 class="bias-lens-heading" style="margin: 12px 0 6px;">{content}</h1> },
                2 => html! { <h2 class="bias-lens-heading" style="margin: 12px 0 6px;">{content}</h2> },
                3 => html! { <h3 class="bias-lens-heading" style="margin: 12px 0 6px;">{content}</h3> },
                _ => html! { <h4 class="bias-lens-heading" style="margin: 12px 0 6px;">{content}</h4> },
            }
        }
        Entry::Paragraph(spans) => html! {
            <p class="bias-lens-paragraph" style="margin: 6px 0; white-space: pre-line;">{render_spans(spans)}</p>
        },
        Entry::Preformatted(text) => html! {
            <pre class="bias-lens-preformatted" style="white-space: pre-wrap; word-break: break-word; margin: 0;">{text}</pre>
        },
        Entry::Error(message) => html! {
            <Alert r#type={AlertType::Danger} title={"Analysis failed"} inline={true}>
                {message.clone()}
            </Alert>
        },
    }
}

#[derive(Properties, PartialEq)]
pub struct ResultViewProps {
    pub slot: RequestSlot,
    #[prop_or_default]
    pub loading_message: Option<String>,
}

/// Loading indicator, error or rendered analysis for one result slot
#[function_component(ResultView)]
pub fn result_view(props: &ResultViewProps) -> Html {
    if props.slot.loading {
        let message = props
            .loading_message
            .clone()
            .unwrap_or_else(|| "Analyzing...".to_string());
        return html! {
            <div class="bias-lens-loading" style="text-align: center; padding: 12px;">
                <Spinner />
                <p class="bias-lens-loading-text" style="margin-top: 8px;">{message}</p>
            </div>
        };
    }

    match &props.slot.outcome {
        Some(outcome) => {
            let document = ResultDocument::from_outcome(outcome);
            html! {
                <div class="bias-lens-result-card" style="line-height: 1.4;">
                    {for document.entries.iter().map(render_entry)}
                </div>
            }
        }
        None => html! {},
    }
}
