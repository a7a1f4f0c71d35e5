/// Floating analysis panel injected into the host page

use std::rc::Rc;

use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use patternfly_yew::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlElement, HtmlIFrameElement};
use yew::prelude::*;

use crate::analysis::AnalysisOutcome;
use crate::config::ValidatedConfig;
use crate::fetch::FetchTransport;
use crate::host;
use crate::requester::{self, AnalysisRequester, RequestSlot, SlotAction};
use crate::ui::components::ResultView;
use crate::widget::{Phase, Point, Position, WidgetAction, WidgetState};

// Above anything a host page is likely to stack
const Z_INDEX: u32 = 2_147_483_000;
const HIDDEN_SCALE: f64 = 0.95;

#[derive(Properties, PartialEq)]
pub struct AnalyzerPanelProps {
    pub config: Rc<ValidatedConfig>,
}

/// Inline style for the panel in its current state
pub fn panel_style(state: &WidgetState, transition_ms: u32) -> String {
    let (opacity, scale, visibility, pointer_events) = match state.phase() {
        Phase::Open => (1.0, 1.0, "visible", "auto"),
        Phase::Closing(_) => (0.0, HIDDEN_SCALE, "visible", "none"),
        Phase::Hidden => (0.0, HIDDEN_SCALE, "hidden", "none"),
    };

    let placement = match state.position() {
        Position::Centered => format!(
            "top: 50%; left: 50%; transform: translate(-50%, -50%) scale({});",
            scale
        ),
        Position::At(Point { x, y }) => format!(
            "top: {}px; left: {}px; transform: scale({});",
            px(y),
            px(x),
            scale
        ),
    };

    // Animating transform while dragging makes the panel trail the pointer
    let transition = if state.dragging() {
        format!("opacity {}ms ease", transition_ms)
    } else {
        format!("opacity {ms}ms ease, transform {ms}ms ease", ms = transition_ms)
    };

    format!(
        "position: fixed; {} width: 360px; max-height: 70vh; display: flex; flex-direction: column; \
         background: white; border: 2px solid #ccc; border-radius: 10px; box-shadow: 0 4px 10px rgba(0,0,0,0.2); \
         overflow: hidden; z-index: {}; opacity: {}; visibility: {}; pointer-events: {}; transition: {};",
        placement, Z_INDEX, opacity, visibility, pointer_events, transition
    )
}

fn px(value: f64) -> i64 {
    value.round() as i64
}

/// Kick off one analysis of the current selection or page
fn start_analysis(config: Rc<ValidatedConfig>, slot: UseReducerDispatcher<RequestSlot>) {
    let input = match host::current_input(config.settings.page_source) {
        Ok(input) => input,
        Err(e) => {
            log::error!("Could not read page content: {}", e);
            requester::reject_locally(e.to_string(), |action| slot.dispatch(action));
            return;
        }
    };

    spawn_local(async move {
        let requester = AnalysisRequester::new(FetchTransport, config.endpoint.clone(), config.timeout());
        requester
            .run(input, js_sys::Date::now(), |action| slot.dispatch(action))
            .await;
    });
}

#[function_component(AnalyzerPanel)]
pub fn analyzer_panel(props: &AnalyzerPanelProps) -> Html {
    let widget = use_reducer(WidgetState::new);
    let slot = use_reducer(RequestSlot::new);
    let panel_ref = use_node_ref();
    let frame_ref = use_node_ref();
    let config = props.config.clone();

    // Visibility side effects: analyze on open, finish the hide after the
    // transition, drop the result once hidden
    {
        let config = config.clone();
        let widget_dispatch = widget.dispatcher();
        let slot_dispatch = slot.dispatcher();

        use_effect_with(widget.phase(), move |phase| {
            let mut pending_hide = None;
            match *phase {
                Phase::Open => start_analysis(config.clone(), slot_dispatch),
                Phase::Closing(ticket) => {
                    pending_hide = Some(Timeout::new(config.settings.transition_ms, move || {
                        widget_dispatch.dispatch(WidgetAction::FinishHide(ticket));
                    }));
                }
                Phase::Hidden => slot_dispatch.dispatch(SlotAction::Discard),
            }
            move || drop(pending_hide)
        });
    }

    // Pointer tracking is document-wide so releasing anywhere ends the drag
    {
        let dispatcher = widget.dispatcher();

        use_effect_with(widget.dragging(), move |dragging| {
            let document = web_sys::window().and_then(|w| w.document());
            let listeners = match (*dragging, document) {
                (true, Some(document)) => {
                    let on_move = {
                        let dispatcher = dispatcher.clone();
                        EventListener::new(&document, "mousemove", move |event| {
                            if let Some(e) = event.dyn_ref::<MouseEvent>() {
                                dispatcher.dispatch(WidgetAction::UpdateDrag(Point::new(
                                    e.client_x() as f64,
                                    e.client_y() as f64,
                                )));
                            }
                        })
                    };
                    let on_up = EventListener::new(&document, "mouseup", move |_| {
                        dispatcher.dispatch(WidgetAction::EndDrag);
                    });
                    Some((on_move, on_up))
                }
                _ => None,
            };
            move || drop(listeners)
        });
    }

    // Forward successful results to the embedded frame, if configured
    {
        let config = config.clone();
        let frame_ref = frame_ref.clone();

        use_effect_with(slot.outcome.clone(), move |outcome| {
            if let (Some(AnalysisOutcome::Success(result)), Some(origin)) = (outcome, &config.frame_origin) {
                if let Some(frame) = frame_ref.cast::<HtmlIFrameElement>() {
                    if let Err(e) = host::post_to_frame(&frame, &result.raw, origin) {
                        log::warn!("Could not deliver result to frame: {}", e);
                    }
                }
            }
            || ()
        });
    }

    let on_toggle = {
        let widget = widget.clone();
        Callback::from(move |_: MouseEvent| widget.dispatch(WidgetAction::Toggle))
    };

    let on_close = {
        let widget = widget.clone();
        Callback::from(move |_: MouseEvent| widget.dispatch(WidgetAction::Close))
    };

    let on_header_down = {
        let widget = widget.clone();
        let panel_ref = panel_ref.clone();
        Callback::from(move |e: MouseEvent| {
            if e.button() != 0 {
                return;
            }
            e.prevent_default();
            let origin = panel_ref
                .cast::<HtmlElement>()
                .map(|panel| {
                    let rect = panel.get_bounding_client_rect();
                    Point::new(rect.left(), rect.top())
                })
                .unwrap_or_default();
            widget.dispatch(WidgetAction::StartDrag {
                pointer: Point::new(e.client_x() as f64, e.client_y() as f64),
                origin,
            });
        })
    };

    let on_rerun = {
        let config = config.clone();
        let slot = slot.clone();
        Callback::from(move |_| start_analysis(config.clone(), slot.dispatcher()))
    };

    let icon_url = host::extension_resource(&config.settings.icon_path);
    let header_cursor = if widget.dragging() { "grabbing" } else { "grab" };

    html! {
        <>
            <button
                class="bias-lens-icon"
                title="Analyze bias"
                onclick={on_toggle}
                style={format!("position: fixed; bottom: 20px; right: 20px; width: 48px; height: 48px; padding: 0; border: none; border-radius: 50%; background: #007bff; box-shadow: 0 2px 6px rgba(0,0,0,0.3); cursor: pointer; z-index: {};", Z_INDEX)}
            >
                <img src={icon_url} alt="Bias Lens" style="width: 100%; height: 100%; border-radius: 50%;" />
            </button>

            <div ref={panel_ref} class="bias-lens-panel" style={panel_style(&widget, config.settings.transition_ms)}>
                <div
                    class="bias-lens-header"
                    onmousedown={on_header_down}
                    style={format!("display: flex; align-items: center; justify-content: space-between; height: 28px; padding: 0 8px; background: #007bff; color: white; font-size: 14px; font-weight: bold; user-select: none; cursor: {};", header_cursor)}
                >
                    <span>{"Bias Lens"}</span>
                    <button
                        class="bias-lens-close"
                        title="Close"
                        onmousedown={Callback::from(|e: MouseEvent| e.stop_propagation())}
                        onclick={on_close}
                        style="background: none; border: none; color: white; font-size: 16px; cursor: pointer;"
                    >
                        {"✕"}
                    </button>
                </div>

                <div class="bias-lens-body" style="padding: 12px; overflow-y: auto;">
                    <ResultView slot={(*slot).clone()} loading_message={"Analyzing page...".to_string()} />
                    if !slot.loading && slot.outcome.is_some() {
                        <Button onclick={on_rerun} variant={ButtonVariant::Secondary} block={true}>
                            {"Analyze again"}
                        </Button>
                    }
                </div>

                if let Some(frame) = &config.settings.result_frame {
                    <iframe
                        ref={frame_ref}
                        class="bias-lens-frame"
                        src={host::extension_resource(&frame.src)}
                        style="width: 100%; height: 180px; border: none; background: white;"
                    />
                }
            </div>
        </>
    }
}
