//! Flow states and the transition table.
//!
//! Both order flows share one state shape, [`FlowState`], parameterised by the
//! flow's closed set of fields. [`transition`] is the single table of legal
//! moves; anything it does not list is an invalid transition.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// A field of an order flow, in chain order.
pub trait FlowField: Copy + Eq + Debug + Send + Sync + 'static {
    /// All fields in the order they are asked for.
    const CHAIN: &'static [Self];

    /// Stable identifier, used in views and edit requests.
    fn name(self) -> &'static str;

    /// Question shown when the field is asked for.
    fn prompt(self) -> &'static str;

    fn parse(name: &str) -> Option<Self> {
        Self::CHAIN.iter().copied().find(|f| f.name() == name)
    }

    fn first() -> Self {
        Self::CHAIN[0]
    }

    fn last() -> Self {
        Self::CHAIN[Self::CHAIN.len() - 1]
    }

    fn position(self) -> usize {
        Self::CHAIN.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn next(self) -> Option<Self> {
        Self::CHAIN.get(self.position() + 1).copied()
    }

    fn prev(self) -> Option<Self> {
        self.position().checked_sub(1).and_then(|i| Self::CHAIN.get(i).copied())
    }
}

/// Fields of a free-sale order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreeSaleField {
    ServiceName,
    ClientLogin,
    Comment,
    Amount,
}

impl FlowField for FreeSaleField {
    const CHAIN: &'static [Self] = &[
        FreeSaleField::ServiceName,
        FreeSaleField::ClientLogin,
        FreeSaleField::Comment,
        FreeSaleField::Amount,
    ];

    fn name(self) -> &'static str {
        match self {
            FreeSaleField::ServiceName => "service_name",
            FreeSaleField::ClientLogin => "client_login",
            FreeSaleField::Comment => "comment",
            FreeSaleField::Amount => "amount",
        }
    }

    fn prompt(self) -> &'static str {
        match self {
            FreeSaleField::ServiceName => "Enter the service name",
            FreeSaleField::ClientLogin => "Enter the client's login or email",
            FreeSaleField::Comment => "Enter a comment for the order",
            FreeSaleField::Amount => "Enter the amount in RUB, for example 1000 or 1500.50",
        }
    }
}

/// Fields of a catalogue product order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductField {
    GameTitle,
    Console,
    Slot,
    AccountLogin,
    Comment,
    Amount,
}

impl FlowField for ProductField {
    const CHAIN: &'static [Self] = &[
        ProductField::GameTitle,
        ProductField::Console,
        ProductField::Slot,
        ProductField::AccountLogin,
        ProductField::Comment,
        ProductField::Amount,
    ];

    fn name(self) -> &'static str {
        match self {
            ProductField::GameTitle => "game_title",
            ProductField::Console => "console",
            ProductField::Slot => "slot",
            ProductField::AccountLogin => "account_login",
            ProductField::Comment => "comment",
            ProductField::Amount => "amount",
        }
    }

    fn prompt(self) -> &'static str {
        match self {
            ProductField::GameTitle => "Enter the game title",
            ProductField::Console => "Choose the console: PS4 or PS5",
            ProductField::Slot => "Choose the slot: П2, П3 or П3.1",
            ProductField::AccountLogin => "Enter the account login or email",
            ProductField::Comment => "Enter a comment for the order",
            ProductField::Amount => "Enter the amount in RUB, for example 1000 or 1500.50",
        }
    }
}

/// How a field state was entered, which decides where `Back` and a
/// successful submission lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Reached by walking the chain forward or backward.
    Chain,
    /// Reached by an edit from the review screen.
    Review,
}

/// State of one order flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState<F> {
    /// Asking for a field.
    Field { field: F, origin: Origin },
    /// All fields entered, showing the summary.
    Reviewing,
    /// A payment method has been selected.
    PaymentMethodChosen,
    /// The order is confirmed and waiting for the link request.
    AwaitingLinkRequest,
    /// The payment link was issued.
    Resolved,
}

impl<F: FlowField> FlowState<F> {
    /// Entry state of a freshly started flow.
    pub fn start() -> Self {
        FlowState::Field {
            field: F::first(),
            origin: Origin::Chain,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FlowState::Field { .. } => "field",
            FlowState::Reviewing => "reviewing",
            FlowState::PaymentMethodChosen => "payment_method_chosen",
            FlowState::AwaitingLinkRequest => "awaiting_link_request",
            FlowState::Resolved => "resolved",
        }
    }
}

/// Inputs to the transition table.
///
/// Field values are validated before an `Accepted` event is raised, so the
/// table itself never sees raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEvent<F> {
    /// The current field's value was stored. `missing` is the first field of
    /// the draft that is still empty afterwards.
    Accepted { missing: Option<F> },
    /// Re-open a field from the review screen.
    Edit(F),
    /// A payment method was selected.
    ChooseMethod,
    /// The order was confirmed.
    Confirm,
    /// The gateway issued a payment link.
    LinkIssued,
    Back,
}

/// The transition table. Returns `None` when the event is not allowed in
/// `state`.
pub fn transition<F: FlowField>(state: FlowState<F>, event: FlowEvent<F>) -> Option<FlowState<F>> {
    use FlowState::*;

    let next = match (state, event) {
        (Field { field, origin: Origin::Chain }, FlowEvent::Accepted { missing }) => {
            match (field.next(), missing) {
                (Some(next), _) => Field { field: next, origin: Origin::Chain },
                (None, Some(missing)) => Field { field: missing, origin: Origin::Review },
                (None, None) => Reviewing,
            }
        }
        (Field { origin: Origin::Review, .. }, FlowEvent::Accepted { missing }) => match missing {
            Some(missing) => Field { field: missing, origin: Origin::Review },
            None => Reviewing,
        },
        (Field { field, origin: Origin::Chain }, FlowEvent::Back) => Field {
            field: field.prev()?,
            origin: Origin::Chain,
        },
        (Field { origin: Origin::Review, .. }, FlowEvent::Back) => Reviewing,

        (Reviewing, FlowEvent::Edit(field)) => Field { field, origin: Origin::Review },
        (Reviewing, FlowEvent::Back) => Field { field: F::last(), origin: Origin::Chain },
        (Reviewing | PaymentMethodChosen, FlowEvent::ChooseMethod) => PaymentMethodChosen,

        (PaymentMethodChosen, FlowEvent::Confirm) => AwaitingLinkRequest,
        (PaymentMethodChosen, FlowEvent::Back) => Reviewing,

        (AwaitingLinkRequest, FlowEvent::LinkIssued) => Resolved,
        (AwaitingLinkRequest, FlowEvent::Back) => PaymentMethodChosen,

        _ => return None,
    };

    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field<F>(field: F, origin: Origin) -> FlowState<F> {
        FlowState::Field { field, origin }
    }

    #[test]
    fn test_chain_navigation() {
        assert_eq!(FreeSaleField::first(), FreeSaleField::ServiceName);
        assert_eq!(FreeSaleField::last(), FreeSaleField::Amount);
        assert_eq!(ProductField::Console.next(), Some(ProductField::Slot));
        assert_eq!(ProductField::GameTitle.prev(), None);
        assert_eq!(ProductField::parse("account_login"), Some(ProductField::AccountLogin));
        assert_eq!(ProductField::parse("service_name"), None);
    }

    #[test]
    fn test_accepted_walks_the_chain() {
        let state = field(FreeSaleField::ClientLogin, Origin::Chain);
        let next = transition(state, FlowEvent::Accepted { missing: Some(FreeSaleField::Comment) });
        assert_eq!(next, Some(field(FreeSaleField::Comment, Origin::Chain)));

        let last = field(FreeSaleField::Amount, Origin::Chain);
        assert_eq!(
            transition(last, FlowEvent::Accepted { missing: None }),
            Some(FlowState::Reviewing)
        );
    }

    #[test]
    fn test_edit_returns_to_review() {
        let editing = transition(FlowState::Reviewing, FlowEvent::Edit(ProductField::Console));
        assert_eq!(editing, Some(field(ProductField::Console, Origin::Review)));

        let back = transition(field(ProductField::Console, Origin::Review), FlowEvent::Back);
        assert_eq!(back, Some(FlowState::Reviewing));

        let dependent = transition(
            field(ProductField::Console, Origin::Review),
            FlowEvent::Accepted { missing: Some(ProductField::Slot) },
        );
        assert_eq!(dependent, Some(field(ProductField::Slot, Origin::Review)));
    }

    #[test]
    fn test_back_edges() {
        let back: Option<FlowState<FreeSaleField>> =
            transition(FlowState::Reviewing, FlowEvent::Back);
        assert_eq!(back, Some(field(FreeSaleField::Amount, Origin::Chain)));
        assert_eq!(
            transition::<FreeSaleField>(FlowState::PaymentMethodChosen, FlowEvent::Back),
            Some(FlowState::Reviewing)
        );
        assert_eq!(
            transition::<FreeSaleField>(FlowState::AwaitingLinkRequest, FlowEvent::Back),
            Some(FlowState::PaymentMethodChosen)
        );
        assert_eq!(
            transition(field(FreeSaleField::ServiceName, Origin::Chain), FlowEvent::Back),
            None
        );
    }

    #[test]
    fn test_unlisted_events_are_rejected() {
        assert_eq!(
            transition::<FreeSaleField>(FlowState::Reviewing, FlowEvent::Confirm),
            None
        );
        assert_eq!(
            transition::<FreeSaleField>(FlowState::Resolved, FlowEvent::Back),
            None
        );
        assert_eq!(
            transition(field(FreeSaleField::Comment, Origin::Chain), FlowEvent::ChooseMethod),
            None
        );
        assert_eq!(
            transition::<FreeSaleField>(FlowState::PaymentMethodChosen, FlowEvent::LinkIssued),
            None
        );
    }

    #[test]
    fn test_method_can_be_rechosen() {
        assert_eq!(
            transition::<ProductField>(FlowState::PaymentMethodChosen, FlowEvent::ChooseMethod),
            Some(FlowState::PaymentMethodChosen)
        );
    }
}
