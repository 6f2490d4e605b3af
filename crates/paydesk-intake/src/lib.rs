//! # Paydesk Intake
//!
//! Conversational order intake.
//!
//! Each conversation owns an [`OrderSession`] that walks the manager through
//! one of two order flows, keeps the draft, and finally asks the gateway for a
//! payment link.

pub mod draft;
pub mod flow;
pub mod session;

pub use draft::{Draft, FreeSaleDraft, ProductDraft};
pub use flow::{transition, FlowEvent, FlowField, FlowState, FreeSaleField, Origin, ProductField};
pub use session::{DraftEntry, IntakeEvent, IssuedLink, OrderSession, StepView};
