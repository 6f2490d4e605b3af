//! Per-conversation order session.

use chrono::Utc;
use paydesk_core::{
    ChatId, Order, OrderKind, PaydeskError, PaymentCreated, PaymentMethod, PaymentRequest,
    Requester, Result,
};
use paydesk_gateway::PaymentGateway;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::draft::{Draft, FreeSaleDraft, ProductDraft};
use crate::flow::{transition, FlowEvent, FlowField, FlowState, Origin};

/// Something the manager did in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntakeEvent {
    /// Begin a new order, discarding any current draft.
    Start { kind: OrderKind },
    /// Text answer to the current field.
    Input { text: String },
    /// Re-open a field from the review screen.
    Edit { field: String },
    /// Select a payment method.
    ChooseMethod { method: String },
    /// Confirm the order.
    Confirm,
    Back,
    Cancel,
}

/// Everything the tracker needs once a link has been issued.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssuedLink {
    pub chat_id: ChatId,
    pub order: Order,
    pub method: PaymentMethod,
    pub payment: PaymentCreated,
}

/// One entry of the draft as shown to the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftEntry {
    pub field: &'static str,
    pub value: Option<String>,
}

/// Snapshot of a session for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepView {
    pub chat_id: ChatId,
    pub kind: Option<OrderKind>,
    /// `idle`, `field`, `reviewing`, `payment_method_chosen`,
    /// `awaiting_link_request` or `resolved`.
    pub state: &'static str,
    pub field: Option<&'static str>,
    pub origin: Option<Origin>,
    pub prompt: String,
    pub draft: Vec<DraftEntry>,
    pub method: Option<PaymentMethod>,
    pub order: Option<Order>,
    pub payment: Option<PaymentCreated>,
}

/// A running flow of one order kind.
#[derive(Debug, Clone)]
struct Intake<D: Draft> {
    state: FlowState<D::Field>,
    draft: D,
    method: Option<PaymentMethod>,
    order: Option<Order>,
    payment: Option<PaymentCreated>,
}

impl<D: Draft> Intake<D> {
    fn new() -> Self {
        Self {
            state: FlowState::start(),
            draft: D::default(),
            method: None,
            order: None,
            payment: None,
        }
    }

    /// Look up the target state without committing to it.
    fn target(&self, event: FlowEvent<D::Field>) -> Result<FlowState<D::Field>> {
        transition(self.state, event).ok_or_else(|| PaydeskError::invalid_transition(self.state, event))
    }

    fn commit(&mut self, next: FlowState<D::Field>) {
        debug!(from = self.state.label(), to = next.label(), "Intake transition");
        self.state = next;
    }

    fn apply(&mut self, event: &IntakeEvent, requester: &Requester) -> Result<()> {
        match event {
            IntakeEvent::Input { text } => {
                let FlowState::Field { field, .. } = self.state else {
                    return Err(PaydeskError::invalid_transition(self.state, event));
                };
                self.draft.set(field, text)?;
                let next = self.target(FlowEvent::Accepted {
                    missing: self.draft.first_missing(),
                })?;
                self.commit(next);
            }
            IntakeEvent::Edit { field } => {
                let field = D::Field::parse(field)
                    .ok_or_else(|| PaydeskError::invalid_transition(self.state, event))?;
                let next = self.target(FlowEvent::Edit(field))?;
                self.commit(next);
            }
            IntakeEvent::ChooseMethod { method } => {
                let next = self.target(FlowEvent::ChooseMethod)?;
                let method: PaymentMethod = method.parse()?;
                self.method = Some(method);
                self.commit(next);
            }
            IntakeEvent::Confirm => {
                let next = self.target(FlowEvent::Confirm)?;
                let order = self.draft.build(requester, Utc::now()).ok_or_else(|| {
                    PaydeskError::Internal("confirmed draft is incomplete".to_string())
                })?;
                self.order = Some(order);
                self.commit(next);
            }
            IntakeEvent::Back => {
                let next = self.target(FlowEvent::Back)?;
                if matches!(self.state, FlowState::AwaitingLinkRequest) {
                    self.order = None;
                }
                self.commit(next);
            }
            IntakeEvent::Start { .. } | IntakeEvent::Cancel => {
                return Err(PaydeskError::invalid_transition(self.state, event));
            }
        }
        Ok(())
    }

    async fn request_link(
        &mut self,
        chat_id: ChatId,
        gateway: &dyn PaymentGateway,
    ) -> Result<IssuedLink> {
        let next = self.target(FlowEvent::LinkIssued)?;
        let (Some(order), Some(method)) = (self.order.clone(), self.method) else {
            return Err(PaydeskError::Internal(
                "awaiting link without a confirmed order".to_string(),
            ));
        };

        // Every attempt is a new payment with its own order id.
        let request = PaymentRequest::for_order(&order, method);
        let payment = match gateway.create_payment(&request).await {
            Ok(payment) => payment,
            Err(e) => {
                warn!(chat_id = %chat_id, order_id = %request.order_id, error = %e, "Payment link request failed");
                return Err(e);
            }
        };

        info!(
            chat_id = %chat_id,
            order_id = %payment.order_id,
            payment_id = %payment.payment_id,
            "Payment link issued"
        );

        // The order is issued; only the order and payment are kept for display.
        self.draft = D::default();
        self.payment = Some(payment.clone());
        self.commit(next);

        Ok(IssuedLink {
            chat_id,
            order,
            method,
            payment,
        })
    }

    fn view(&self) -> (Option<&'static str>, Option<Origin>, String, Vec<DraftEntry>) {
        let draft = D::Field::CHAIN
            .iter()
            .map(|f| DraftEntry {
                field: f.name(),
                value: self.draft.value(*f),
            })
            .collect();

        match self.state {
            FlowState::Field { field, origin } => {
                (Some(field.name()), Some(origin), field.prompt().to_string(), draft)
            }
            FlowState::Reviewing => (
                None,
                None,
                "Check the order and choose a payment method".to_string(),
                draft,
            ),
            FlowState::PaymentMethodChosen => (None, None, "Confirm the order".to_string(), draft),
            FlowState::AwaitingLinkRequest => {
                (None, None, "Request the payment link".to_string(), draft)
            }
            FlowState::Resolved => {
                let prompt = match self.payment.as_ref().and_then(|p| p.payment_url.as_deref()) {
                    Some(url) => format!("Payment link: {}", url),
                    None => "Payment created".to_string(),
                };
                (None, None, prompt, Vec::new())
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Flow {
    Idle,
    FreeSale(Intake<FreeSaleDraft>),
    Product(Intake<ProductDraft>),
}

/// The order intake of a single conversation.
///
/// A session is owned by exactly one conversation; callers serialize access.
#[derive(Debug, Clone)]
pub struct OrderSession {
    chat_id: ChatId,
    requester: Requester,
    flow: Flow,
}

impl OrderSession {
    pub fn new(chat_id: ChatId, requester: Requester) -> Self {
        Self {
            chat_id,
            requester,
            flow: Flow::Idle,
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    pub fn set_requester(&mut self, requester: Requester) {
        self.requester = requester;
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.flow, Flow::Idle)
    }

    /// Apply a conversational event.
    ///
    /// On error the session is left exactly as it was.
    pub fn apply(&mut self, event: IntakeEvent) -> Result<StepView> {
        match &event {
            IntakeEvent::Start { kind } => {
                info!(chat_id = %self.chat_id, kind = ?kind, "Starting order intake");
                self.flow = match kind {
                    OrderKind::FreeSale => Flow::FreeSale(Intake::new()),
                    OrderKind::Product => Flow::Product(Intake::new()),
                };
            }
            IntakeEvent::Cancel => self.cancel(),
            _ => match &mut self.flow {
                Flow::Idle => return Err(PaydeskError::invalid_transition("Idle", &event)),
                Flow::FreeSale(intake) => intake.apply(&event, &self.requester)?,
                Flow::Product(intake) => intake.apply(&event, &self.requester)?,
            },
        }
        Ok(self.view())
    }

    /// Clear the draft and return to idle. Cancelling an idle session is a
    /// no-op.
    pub fn cancel(&mut self) {
        if !self.is_idle() {
            info!(chat_id = %self.chat_id, "Order intake cancelled");
        }
        self.flow = Flow::Idle;
    }

    /// Ask the gateway for a payment link for the confirmed order.
    ///
    /// On failure the session stays where it was, so the request can be
    /// retried or the order cancelled.
    pub async fn request_link(&mut self, gateway: &dyn PaymentGateway) -> Result<IssuedLink> {
        let chat_id = self.chat_id;
        match &mut self.flow {
            Flow::Idle => Err(PaydeskError::invalid_transition("Idle", "RequestLink")),
            Flow::FreeSale(intake) => intake.request_link(chat_id, gateway).await,
            Flow::Product(intake) => intake.request_link(chat_id, gateway).await,
        }
    }

    pub fn view(&self) -> StepView {
        let (kind, state, parts, method, order, payment) = match &self.flow {
            Flow::Idle => {
                return StepView {
                    chat_id: self.chat_id,
                    kind: None,
                    state: "idle",
                    field: None,
                    origin: None,
                    prompt: "Start a free sale or a product order".to_string(),
                    draft: Vec::new(),
                    method: None,
                    order: None,
                    payment: None,
                }
            }
            Flow::FreeSale(i) => (
                OrderKind::FreeSale,
                i.state.label(),
                i.view(),
                i.method,
                i.order.clone(),
                i.payment.clone(),
            ),
            Flow::Product(i) => (
                OrderKind::Product,
                i.state.label(),
                i.view(),
                i.method,
                i.order.clone(),
                i.payment.clone(),
            ),
        };
        let (field, origin, prompt, draft) = parts;

        StepView {
            chat_id: self.chat_id,
            kind: Some(kind),
            state,
            field,
            origin,
            prompt,
            draft,
            method,
            order,
            payment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use paydesk_core::{Amount, PaymentRecord, ValidationError};
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Gateway that fails a set number of times, then succeeds.
    struct FlakyGateway {
        failures_left: Mutex<u32>,
        requests: Mutex<Vec<PaymentRequest>>,
    }

    impl FlakyGateway {
        fn new(failures: u32) -> Self {
            Self {
                failures_left: Mutex::new(failures),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for FlakyGateway {
        async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentCreated> {
            self.requests.lock().unwrap().push(request.clone());
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(PaydeskError::Http { status: 503 });
            }
            Ok(PaymentCreated {
                order_id: request.order_id,
                payment_id: "pay-1".into(),
                payment_url: Some("https://pay.example/1".into()),
                amount: request.amount,
            })
        }

        async fn check_status(&self, _order_id: Uuid) -> Result<PaymentRecord> {
            Err(PaydeskError::Internal("not used".into()))
        }
    }

    fn session() -> OrderSession {
        OrderSession::new(ChatId(42), Requester::new(7, Some("manager".into())))
    }

    fn input(session: &mut OrderSession, text: &str) -> Result<StepView> {
        session.apply(IntakeEvent::Input { text: text.into() })
    }

    fn filled_free_sale() -> OrderSession {
        let mut s = session();
        s.apply(IntakeEvent::Start { kind: OrderKind::FreeSale }).unwrap();
        for text in ["Boost", "client@example.com", "vip client", "1500,5"] {
            input(&mut s, text).unwrap();
        }
        s
    }

    fn confirmed_free_sale() -> OrderSession {
        let mut s = filled_free_sale();
        s.apply(IntakeEvent::ChooseMethod { method: "SBP".into() }).unwrap();
        s.apply(IntakeEvent::Confirm).unwrap();
        s
    }

    fn value(view: &StepView, field: &str) -> Option<String> {
        view.draft.iter().find(|e| e.field == field).and_then(|e| e.value.clone())
    }

    #[test]
    fn test_complete_fields_reach_review_verbatim() {
        let s = filled_free_sale();
        let view = s.view();
        assert_eq!(view.state, "reviewing");
        assert_eq!(value(&view, "service_name").as_deref(), Some("Boost"));
        assert_eq!(value(&view, "client_login").as_deref(), Some("client@example.com"));
        assert_eq!(value(&view, "comment").as_deref(), Some("vip client"));
        assert_eq!(value(&view, "amount").as_deref(), Some("1500.50"));
    }

    #[test]
    fn test_validation_failure_repeats_the_step() {
        let mut s = session();
        s.apply(IntakeEvent::Start { kind: OrderKind::FreeSale }).unwrap();
        for text in ["Boost", "client", "note"] {
            input(&mut s, text).unwrap();
        }
        let before = s.view();

        let err = input(&mut s, "0").unwrap_err();
        assert!(matches!(err, PaydeskError::Validation(ValidationError::NonPositive)));
        assert!(err.is_recoverable());
        assert_eq!(s.view(), before);
        assert_eq!(s.view().field, Some("amount"));
    }

    #[test]
    fn test_edit_overwrites_only_that_field() {
        let mut s = filled_free_sale();
        let view = s.apply(IntakeEvent::Edit { field: "client_login".into() }).unwrap();
        assert_eq!(view.field, Some("client_login"));
        assert_eq!(view.origin, Some(Origin::Review));

        let view = input(&mut s, "other@example.com").unwrap();
        assert_eq!(view.state, "reviewing");
        assert_eq!(value(&view, "client_login").as_deref(), Some("other@example.com"));
        assert_eq!(value(&view, "service_name").as_deref(), Some("Boost"));
        assert_eq!(value(&view, "comment").as_deref(), Some("vip client"));
        assert_eq!(value(&view, "amount").as_deref(), Some("1500.50"));
    }

    #[test]
    fn test_back_from_edit_returns_to_review() {
        let mut s = filled_free_sale();
        s.apply(IntakeEvent::Edit { field: "amount".into() }).unwrap();
        let view = s.apply(IntakeEvent::Back).unwrap();
        assert_eq!(view.state, "reviewing");
        assert_eq!(value(&view, "amount").as_deref(), Some("1500.50"));
    }

    #[test]
    fn test_back_along_the_chain() {
        let mut s = session();
        s.apply(IntakeEvent::Start { kind: OrderKind::Product }).unwrap();
        input(&mut s, "Elden Ring").unwrap();
        let view = s.apply(IntakeEvent::Back).unwrap();
        assert_eq!(view.field, Some("game_title"));
        assert!(matches!(
            s.apply(IntakeEvent::Back),
            Err(PaydeskError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_product_flow_validates_catalogue() {
        let mut s = session();
        s.apply(IntakeEvent::Start { kind: OrderKind::Product }).unwrap();
        input(&mut s, "Elden Ring").unwrap();
        assert!(matches!(
            input(&mut s, "Xbox"),
            Err(PaydeskError::Validation(ValidationError::UnknownConsole(_)))
        ));
        input(&mut s, "ps5").unwrap();
        assert!(input(&mut s, "П9").is_err());
        for text in ["П3", "player@example.com", "lead", "2499"] {
            input(&mut s, text).unwrap();
        }
        s.apply(IntakeEvent::ChooseMethod { method: "card".into() }).unwrap();
        let view = s.apply(IntakeEvent::Confirm).unwrap();
        assert_eq!(view.state, "awaiting_link_request");
        let order = view.order.unwrap();
        assert_eq!(order.product_name(), "Elden Ring (PS5, П3)");
        assert_eq!(order.amount(), Amount::parse("2499").unwrap());
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        let mut s = filled_free_sale();
        assert!(matches!(
            s.apply(IntakeEvent::ChooseMethod { method: "crypto".into() }),
            Err(PaydeskError::Validation(ValidationError::UnknownPaymentMethod(_)))
        ));
        assert_eq!(s.view().state, "reviewing");

        s.apply(IntakeEvent::ChooseMethod { method: "card".into() }).unwrap();
        let view = s.apply(IntakeEvent::ChooseMethod { method: "sber_pay".into() }).unwrap();
        assert_eq!(view.method, Some(PaymentMethod::SberPay));
    }

    #[test]
    fn test_invalid_transitions_leave_state_unchanged() {
        let mut s = session();
        assert!(matches!(
            s.apply(IntakeEvent::Confirm),
            Err(PaydeskError::InvalidTransition { .. })
        ));
        assert!(s.is_idle());

        let mut s = filled_free_sale();
        let before = s.view();
        assert!(s.apply(IntakeEvent::Confirm).is_err());
        assert!(s.apply(IntakeEvent::Input { text: "x".into() }).is_err());
        assert!(s.apply(IntakeEvent::Edit { field: "game_title".into() }).is_err());
        assert_eq!(s.view(), before);
    }

    #[test]
    fn test_cancel_leaves_no_residue() {
        for mut s in [session(), filled_free_sale(), confirmed_free_sale()] {
            let view = s.apply(IntakeEvent::Cancel).unwrap();
            assert_eq!(view.state, "idle");
            assert!(view.draft.is_empty());
            // Idempotent.
            assert_eq!(s.apply(IntakeEvent::Cancel).unwrap(), view);

            let view = s.apply(IntakeEvent::Start { kind: OrderKind::FreeSale }).unwrap();
            assert!(view.draft.iter().all(|e| e.value.is_none()));
            assert_eq!(view.method, None);
            assert_eq!(view.order, None);
        }
    }

    #[test]
    fn test_start_discards_current_draft() {
        let mut s = filled_free_sale();
        let view = s.apply(IntakeEvent::Start { kind: OrderKind::Product }).unwrap();
        assert_eq!(view.kind, Some(OrderKind::Product));
        assert_eq!(view.field, Some("game_title"));
        assert!(view.draft.iter().all(|e| e.value.is_none()));
    }

    #[tokio::test]
    async fn test_link_failure_keeps_state_and_retry_uses_new_order_id() {
        let gateway = FlakyGateway::new(1);
        let mut s = confirmed_free_sale();
        let before = s.view();

        let err = s.request_link(&gateway).await.unwrap_err();
        assert!(matches!(err, PaydeskError::Http { status: 503 }));
        assert_eq!(s.view(), before);

        let issued = s.request_link(&gateway).await.unwrap();
        assert_eq!(issued.chat_id, ChatId(42));
        assert_eq!(issued.method, PaymentMethod::FastPayment);
        assert_eq!(issued.payment.payment_id, "pay-1");

        let view = s.view();
        assert_eq!(view.state, "resolved");
        assert_eq!(view.prompt, "Payment link: https://pay.example/1");

        let requests = gateway.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_ne!(requests[0].order_id, requests[1].order_id);
        assert_eq!(requests[1].product_name, "Boost");
        assert_eq!(requests[1].customer_identifier, "client@example.com");
        assert_eq!(requests[1].description, "vip client");
        assert_eq!(requests[1].preferred_methods, vec![PaymentMethod::FastPayment]);
    }

    #[tokio::test]
    async fn test_draft_is_discarded_once_link_is_issued() {
        let gateway = FlakyGateway::new(0);
        let mut s = confirmed_free_sale();
        let issued = s.request_link(&gateway).await.unwrap();

        let view = s.view();
        assert_eq!(view.state, "resolved");
        assert!(view.draft.is_empty());
        assert_eq!(view.order, Some(issued.order));
        assert_eq!(view.payment, Some(issued.payment));
        match &s.flow {
            Flow::FreeSale(intake) => assert_eq!(intake.draft, FreeSaleDraft::default()),
            other => panic!("unexpected flow {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_link_requires_confirmation() {
        let gateway = FlakyGateway::new(0);
        let mut s = filled_free_sale();
        assert!(matches!(
            s.request_link(&gateway).await,
            Err(PaydeskError::InvalidTransition { .. })
        ));
        assert!(gateway.requests.lock().unwrap().is_empty());

        let mut idle = session();
        assert!(idle.request_link(&gateway).await.is_err());
    }

    #[test]
    fn test_back_from_awaiting_link_drops_order() {
        let mut s = confirmed_free_sale();
        let view = s.apply(IntakeEvent::Back).unwrap();
        assert_eq!(view.state, "payment_method_chosen");
        assert_eq!(view.order, None);
        let view = s.apply(IntakeEvent::Back).unwrap();
        assert_eq!(view.state, "reviewing");
    }
}
