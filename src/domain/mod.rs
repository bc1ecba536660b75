//! Domain layer: lead model, payload decoding, and event classification.
//!
//! Everything here is pure. No I/O happens in this module; storage and
//! scheduling live in [`crate::persistence`] and [`crate::service`].

pub mod lead;
pub mod normalizer;
pub mod payload;

pub use lead::{Lead, LeadStatus, LeadType, NewLead};
pub use normalizer::{ClassifiedEvent, classify};
pub use payload::decode_payload;
