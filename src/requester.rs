/// Issues analysis requests and tracks the single result slot
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;
use url::Url;

use crate::analysis::{AnalysisError, AnalysisInput, AnalysisOutcome, AnalysisRequest, AnalysisResult};

static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

/// Monotonic sequence number attached to each submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn issue() -> Ticket {
        Ticket(NEXT_TICKET.fetch_add(1, Ordering::Relaxed))
    }
}

/// Raw reply from the transport, before classification
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("could not send request: {0}")]
    Construction(String),
    #[error("no response: {0}")]
    NoResponse(String),
}

/// Sends one JSON POST. Implemented over `fetch` in the browser and by
/// scripted mocks in tests.
#[allow(async_fn_in_trait)]
pub trait AnalysisTransport {
    async fn post_json(&self, endpoint: &Url, body: String, timeout: Duration) -> Result<HttpReply, TransportError>;
}

/// Loading flag and current outcome for one widget or form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSlot {
    latest: Option<Ticket>,
    pub loading: bool,
    pub outcome: Option<AnalysisOutcome>,
}

#[derive(Debug, Clone)]
pub enum SlotAction {
    Begin(Ticket),
    Settle(Ticket, AnalysisOutcome),
    Discard,
}

impl RequestSlot {
    pub fn new() -> Self {
        RequestSlot::default()
    }

    /// Apply an action; returns false when it left the slot untouched,
    /// e.g. a stale completion
    pub fn apply(&mut self, action: SlotAction) -> bool {
        match action {
            SlotAction::Begin(ticket) => {
                self.latest = Some(ticket);
                self.loading = true;
                self.outcome = None;
                true
            }
            SlotAction::Settle(ticket, outcome) => {
                if self.latest != Some(ticket) {
                    log::debug!("Dropping stale analysis result {:?}", ticket);
                    return false;
                }
                self.loading = false;
                self.outcome = Some(outcome);
                true
            }
            SlotAction::Discard => {
                if *self == RequestSlot::default() {
                    return false;
                }
                // Any in-flight ticket no longer matches
                *self = RequestSlot::default();
                true
            }
        }
    }
}

impl yew::Reducible for RequestSlot {
    type Action = SlotAction;

    fn reduce(self: Rc<Self>, action: SlotAction) -> Rc<Self> {
        let mut next = (*self).clone();
        if next.apply(action) {
            Rc::new(next)
        } else {
            self
        }
    }
}

pub struct AnalysisRequester<T> {
    transport: T,
    endpoint: Url,
    timeout: Duration,
}

impl<T: AnalysisTransport> AnalysisRequester<T> {
    pub fn new(transport: T, endpoint: Url, timeout: Duration) -> Self {
        AnalysisRequester {
            transport,
            endpoint,
            timeout,
        }
    }

    /// Run one submission: `Begin` is dispatched before the request goes
    /// out and `Settle` once it completes. Never fails; every error ends
    /// up in the slot as `AnalysisOutcome::Failed`.
    pub async fn run<F>(&self, input: AnalysisInput, submitted_at: f64, dispatch: F) -> Ticket
    where
        F: Fn(SlotAction),
    {
        let ticket = Ticket::issue();
        dispatch(SlotAction::Begin(ticket));

        let request = AnalysisRequest::new(input, submitted_at);
        log::info!(
            "Submitting analysis {:?} to {} at {}",
            ticket,
            self.endpoint,
            request.submitted_at
        );
        let outcome = self.send(&request).await;

        if let Some(message) = outcome.error_message() {
            log::warn!("Analysis {:?} failed: {}", ticket, message);
        }
        dispatch(SlotAction::Settle(ticket, outcome));
        ticket
    }

    async fn send(&self, request: &AnalysisRequest) -> AnalysisOutcome {
        let body = match request.body() {
            Ok(body) => body,
            Err(e) => return AnalysisOutcome::Failed(AnalysisError::RequestConstructionFailed(e.to_string())),
        };

        match self.transport.post_json(&self.endpoint, body, self.timeout).await {
            Ok(reply) => classify_reply(reply),
            Err(TransportError::Construction(msg)) => {
                AnalysisOutcome::Failed(AnalysisError::RequestConstructionFailed(msg))
            }
            Err(TransportError::NoResponse(msg)) => {
                log::debug!("Transport gave no response: {}", msg);
                AnalysisOutcome::Failed(AnalysisError::NoResponse)
            }
        }
    }
}

/// Settle a submission that failed before anything could be sent
pub fn reject_locally<F>(message: String, dispatch: F) -> Ticket
where
    F: Fn(SlotAction),
{
    let ticket = Ticket::issue();
    dispatch(SlotAction::Begin(ticket));
    dispatch(SlotAction::Settle(
        ticket,
        AnalysisOutcome::Failed(AnalysisError::RequestConstructionFailed(message)),
    ));
    ticket
}

/// Map an HTTP reply onto the outcome taxonomy
pub fn classify_reply(reply: HttpReply) -> AnalysisOutcome {
    let parsed = serde_json::from_str::<Value>(&reply.body);

    if (200..300).contains(&reply.status) {
        return match parsed {
            Ok(value) => AnalysisOutcome::Success(AnalysisResult::from_value(value)),
            Err(e) => AnalysisOutcome::Failed(AnalysisError::ServerRejected {
                status: reply.status,
                message: format!("Analysis service returned an unreadable response: {}", e),
            }),
        };
    }

    let detail = parsed.ok().and_then(|body| match body.get("detail") {
        Some(Value::String(message)) => Some(message.clone()),
        Some(Value::Null) | None => None,
        // Validation errors arrive as a list of objects
        Some(other) => Some(other.to_string()),
    });

    AnalysisOutcome::Failed(AnalysisError::ServerRejected {
        status: reply.status,
        message: detail.unwrap_or_else(|| format!("Analysis service responded with status {}", reply.status)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisBody, NO_RESPONSE_MESSAGE};
    use futures::executor::block_on;
    use std::cell::RefCell;

    struct ScriptedTransport {
        reply: Result<HttpReply, TransportError>,
        sent: RefCell<Vec<String>>,
    }

    impl ScriptedTransport {
        fn replying(status: u16, body: &str) -> Self {
            ScriptedTransport {
                reply: Ok(HttpReply {
                    status,
                    body: body.to_string(),
                }),
                sent: RefCell::new(Vec::new()),
            }
        }

        fn failing(error: TransportError) -> Self {
            ScriptedTransport {
                reply: Err(error),
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    impl AnalysisTransport for ScriptedTransport {
        async fn post_json(&self, _endpoint: &Url, body: String, _timeout: Duration) -> Result<HttpReply, TransportError> {
            self.sent.borrow_mut().push(body);
            self.reply.clone()
        }
    }

    fn requester(transport: ScriptedTransport) -> AnalysisRequester<ScriptedTransport> {
        AnalysisRequester::new(
            transport,
            Url::parse("http://localhost:8000/analyze").unwrap(),
            Duration::from_secs(30),
        )
    }

    fn run_into_slot(requester: &AnalysisRequester<ScriptedTransport>, input: AnalysisInput) -> RequestSlot {
        let slot = RefCell::new(RequestSlot::new());
        block_on(requester.run(input, 0.0, |action| {
            slot.borrow_mut().apply(action);
        }));
        slot.into_inner()
    }

    #[test]
    fn test_one_request_per_run() {
        let requester = requester(ScriptedTransport::replying(200, r#"{"analysis": "ok"}"#));

        run_into_slot(&requester, AnalysisInput::from_url("https://a.example"));
        run_into_slot(&requester, AnalysisInput::from_text("pasted"));

        let sent = requester.transport.sent.borrow();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], r#"{"url":"https://a.example"}"#);
        assert_eq!(sent[1], r#"{"text":"pasted"}"#);
    }

    #[test]
    fn test_success_sets_result() {
        let requester = requester(ScriptedTransport::replying(
            200,
            r#"{"overallBias": "High", "analysis": "Neutral reporting."}"#,
        ));

        let slot = run_into_slot(&requester, AnalysisInput::from_text("article"));

        assert!(!slot.loading);
        match slot.outcome {
            Some(AnalysisOutcome::Success(result)) => {
                assert_eq!(result.overall_bias.as_deref(), Some("High"));
                assert_eq!(result.analysis, Some(AnalysisBody::Text("Neutral reporting.".to_string())));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn test_network_failure_resolves_with_connectivity_error() {
        let requester = requester(ScriptedTransport::failing(TransportError::NoResponse(
            "TypeError: Failed to fetch".to_string(),
        )));

        let slot = run_into_slot(&requester, AnalysisInput::from_text("article"));

        assert!(!slot.loading);
        assert_eq!(slot.outcome, Some(AnalysisOutcome::Failed(AnalysisError::NoResponse)));
        assert_eq!(
            slot.outcome.and_then(|o| o.error_message()).as_deref(),
            Some(NO_RESPONSE_MESSAGE)
        );
    }

    #[test]
    fn test_server_detail_is_surfaced() {
        let requester = requester(ScriptedTransport::replying(400, r#"{"detail": "bad input"}"#));

        let slot = run_into_slot(&requester, AnalysisInput::from_text(""));

        assert!(!slot.loading);
        assert_eq!(
            slot.outcome.and_then(|o| o.error_message()).as_deref(),
            Some("bad input")
        );
    }

    #[test]
    fn test_construction_failure_message() {
        let requester = requester(ScriptedTransport::failing(TransportError::Construction(
            "no window".to_string(),
        )));

        let slot = run_into_slot(&requester, AnalysisInput::from_text("x"));

        assert_eq!(
            slot.outcome,
            Some(AnalysisOutcome::Failed(AnalysisError::RequestConstructionFailed(
                "no window".to_string()
            )))
        );
    }

    #[test]
    fn test_classify_structured_detail() {
        let outcome = classify_reply(HttpReply {
            status: 422,
            body: r#"{"detail": [{"loc": ["body", "url"], "msg": "field required"}]}"#.to_string(),
        });

        match outcome {
            AnalysisOutcome::Failed(AnalysisError::ServerRejected { status, message }) => {
                assert_eq!(status, 422);
                assert!(message.contains("field required"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_classify_missing_detail() {
        let outcome = classify_reply(HttpReply {
            status: 502,
            body: "<html>Bad Gateway</html>".to_string(),
        });

        assert_eq!(
            outcome.error_message().as_deref(),
            Some("Analysis service responded with status 502")
        );
    }

    #[test]
    fn test_classify_unreadable_success_body() {
        let outcome = classify_reply(HttpReply {
            status: 200,
            body: "not json".to_string(),
        });

        assert!(matches!(
            outcome,
            AnalysisOutcome::Failed(AnalysisError::ServerRejected { status: 200, .. })
        ));
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let mut slot = RequestSlot::new();
        let first = Ticket::issue();
        let second = Ticket::issue();

        slot.apply(SlotAction::Begin(first));
        slot.apply(SlotAction::Begin(second));

        let fresh = AnalysisOutcome::Failed(AnalysisError::NoResponse);
        let stale = AnalysisOutcome::Success(AnalysisResult::from_value(serde_json::json!({})));

        assert!(slot.apply(SlotAction::Settle(second, fresh.clone())));
        assert!(!slot.apply(SlotAction::Settle(first, stale)));
        assert_eq!(slot.outcome, Some(fresh));
        assert!(!slot.loading);
    }

    #[test]
    fn test_discard_invalidates_in_flight() {
        let mut slot = RequestSlot::new();
        let ticket = Ticket::issue();

        slot.apply(SlotAction::Begin(ticket));
        slot.apply(SlotAction::Discard);

        assert!(!slot.apply(SlotAction::Settle(ticket, AnalysisOutcome::Failed(AnalysisError::NoResponse))));
        assert_eq!(slot, RequestSlot::new());
    }

    #[test]
    fn test_begin_clears_previous_outcome() {
        let mut slot = RequestSlot::new();
        let first = Ticket::issue();
        slot.apply(SlotAction::Begin(first));
        slot.apply(SlotAction::Settle(first, AnalysisOutcome::Failed(AnalysisError::NoResponse)));

        slot.apply(SlotAction::Begin(Ticket::issue()));

        assert!(slot.loading);
        assert!(slot.outcome.is_none());
    }

    #[test]
    fn test_discard_on_empty_slot_is_noop() {
        let mut slot = RequestSlot::new();

        assert!(!slot.apply(SlotAction::Discard));
    }

    #[test]
    fn test_reject_locally() {
        let slot = RefCell::new(RequestSlot::new());

        reject_locally("document has no body".to_string(), |action| {
            slot.borrow_mut().apply(action);
        });

        let slot = slot.into_inner();
        assert!(!slot.loading);
        assert_eq!(
            slot.outcome.and_then(|o| o.error_message()).as_deref(),
            Some("document has no body")
        );
    }

    #[test]
    fn test_tickets_increase() {
        let a = Ticket::issue();
        let b = Ticket::issue();
        assert!(b > a);
    }
}
