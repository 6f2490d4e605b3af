//! In-progress order data.

use chrono::{DateTime, Utc};
use paydesk_core::{
    Amount, Console, FreeSaleOrder, Order, ProductOrder, Requester, ValidationError,
};

use crate::flow::{FlowField, FreeSaleField, ProductField};

/// Mutable order data collected by a flow.
pub trait Draft: Default + Send + Sync {
    type Field: FlowField;

    /// Validate `raw` and store it into `field`.
    ///
    /// On error nothing is changed. A successful store may clear dependent
    /// fields that the new value invalidates.
    fn set(&mut self, field: Self::Field, raw: &str) -> Result<(), ValidationError>;

    /// Current value of a field, formatted for display.
    fn value(&self, field: Self::Field) -> Option<String>;

    /// Build the confirmed order. `None` while any field is missing.
    fn build(&self, requester: &Requester, created_at: DateTime<Utc>) -> Option<Order>;

    /// First field in chain order that has no value.
    fn first_missing(&self) -> Option<Self::Field> {
        Self::Field::CHAIN
            .iter()
            .copied()
            .find(|f| self.value(*f).is_none())
    }
}

/// Free text is stored as typed; only blank input is rejected.
fn text(field: &'static str, raw: &str) -> Result<String, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(raw.to_string())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FreeSaleDraft {
    pub service_name: Option<String>,
    pub client_login: Option<String>,
    pub comment: Option<String>,
    pub amount: Option<Amount>,
}

impl Draft for FreeSaleDraft {
    type Field = FreeSaleField;

    fn set(&mut self, field: FreeSaleField, raw: &str) -> Result<(), ValidationError> {
        match field {
            FreeSaleField::ServiceName => self.service_name = Some(text("service name", raw)?),
            FreeSaleField::ClientLogin => self.client_login = Some(text("client login", raw)?),
            FreeSaleField::Comment => self.comment = Some(text("comment", raw)?),
            FreeSaleField::Amount => self.amount = Some(Amount::parse(raw)?),
        }
        Ok(())
    }

    fn value(&self, field: FreeSaleField) -> Option<String> {
        match field {
            FreeSaleField::ServiceName => self.service_name.clone(),
            FreeSaleField::ClientLogin => self.client_login.clone(),
            FreeSaleField::Comment => self.comment.clone(),
            FreeSaleField::Amount => self.amount.map(|a| a.to_string()),
        }
    }

    fn build(&self, requester: &Requester, created_at: DateTime<Utc>) -> Option<Order> {
        Some(Order::FreeSale(FreeSaleOrder {
            service_name: self.service_name.clone()?,
            client_login: self.client_login.clone()?,
            comment: self.comment.clone()?,
            amount: self.amount?,
            requester_id: requester.id,
            requester_handle: requester.handle.clone(),
            created_at,
        }))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDraft {
    pub game_title: Option<String>,
    pub console: Option<Console>,
    pub slot: Option<String>,
    pub account_login: Option<String>,
    pub comment: Option<String>,
    pub amount: Option<Amount>,
}

impl Draft for ProductDraft {
    type Field = ProductField;

    fn set(&mut self, field: ProductField, raw: &str) -> Result<(), ValidationError> {
        match field {
            ProductField::GameTitle => self.game_title = Some(text("game title", raw)?),
            ProductField::Console => {
                let console: Console = raw.parse()?;
                // A slot the new console does not offer has to be chosen again.
                if let Some(slot) = &self.slot {
                    if console.slot(slot).is_err() {
                        self.slot = None;
                    }
                }
                self.console = Some(console);
            }
            ProductField::Slot => {
                let console = self.console.ok_or(ValidationError::Empty { field: "console" })?;
                self.slot = Some(console.slot(raw)?);
            }
            ProductField::AccountLogin => self.account_login = Some(text("account login", raw)?),
            ProductField::Comment => self.comment = Some(text("comment", raw)?),
            ProductField::Amount => self.amount = Some(Amount::parse(raw)?),
        }
        Ok(())
    }

    fn value(&self, field: ProductField) -> Option<String> {
        match field {
            ProductField::GameTitle => self.game_title.clone(),
            ProductField::Console => self.console.map(|c| c.to_string()),
            ProductField::Slot => self.slot.clone(),
            ProductField::AccountLogin => self.account_login.clone(),
            ProductField::Comment => self.comment.clone(),
            ProductField::Amount => self.amount.map(|a| a.to_string()),
        }
    }

    fn build(&self, requester: &Requester, created_at: DateTime<Utc>) -> Option<Order> {
        Some(Order::Product(ProductOrder {
            game_title: self.game_title.clone()?,
            console: self.console?,
            slot: self.slot.clone()?,
            account_login: self.account_login.clone()?,
            comment: self.comment.clone()?,
            amount: self.amount?,
            requester_id: requester.id,
            requester_handle: requester.handle.clone(),
            created_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_text_fields_are_kept_verbatim_and_required() {
        let mut draft = FreeSaleDraft::default();
        draft.set(FreeSaleField::ServiceName, "  Boost  ").unwrap();
        assert_eq!(draft.service_name.as_deref(), Some("  Boost  "));
        draft.set(FreeSaleField::Comment, "line one\nline two").unwrap();
        assert_eq!(draft.value(FreeSaleField::Comment).as_deref(), Some("line one\nline two"));

        let err = draft.set(FreeSaleField::ClientLogin, "   ").unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: "client login" });
        assert!(draft.client_login.is_none());
        assert_eq!(draft.first_missing(), Some(FreeSaleField::ClientLogin));
    }

    #[test]
    fn test_failed_amount_keeps_previous_value() {
        let mut draft = FreeSaleDraft::default();
        draft.set(FreeSaleField::Amount, "1500,5").unwrap();
        assert!(draft.set(FreeSaleField::Amount, "abc").is_err());
        assert_eq!(draft.amount.map(|a| a.value()), Some(dec!(1500.50)));
    }

    #[test]
    fn test_slot_requires_catalogue_entry() {
        let mut draft = ProductDraft::default();
        assert_eq!(
            draft.set(ProductField::Slot, "П2"),
            Err(ValidationError::Empty { field: "console" })
        );

        draft.set(ProductField::Console, "ps4").unwrap();
        assert!(matches!(
            draft.set(ProductField::Slot, "П7"),
            Err(ValidationError::UnknownSlot { .. })
        ));
        draft.set(ProductField::Slot, "П3.1").unwrap();
        assert_eq!(draft.value(ProductField::Slot).as_deref(), Some("П3.1"));

        // Every console offers the same slots, so switching keeps the choice.
        draft.set(ProductField::Console, "PS5").unwrap();
        assert_eq!(draft.slot.as_deref(), Some("П3.1"));
    }

    #[test]
    fn test_build_requires_every_field() {
        let requester = Requester::new(5, Some("manager".into()));
        let mut draft = FreeSaleDraft::default();
        draft.set(FreeSaleField::ServiceName, "Boost").unwrap();
        draft.set(FreeSaleField::ClientLogin, "client").unwrap();
        draft.set(FreeSaleField::Comment, "vip").unwrap();
        assert!(draft.build(&requester, Utc::now()).is_none());

        draft.set(FreeSaleField::Amount, "100").unwrap();
        let order = draft.build(&requester, Utc::now()).unwrap();
        assert_eq!(order.product_name(), "Boost");
        assert_eq!(order.customer(), "client");
        assert_eq!(draft.first_missing(), None);
    }
}
