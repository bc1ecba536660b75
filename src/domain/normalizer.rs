//! Event classification: untyped webhook payload → [`ClassifiedEvent`].
//!
//! [`classify`] is total and side-effect free. Whatever shape the payload
//! has, it yields either a canonical [`NewLead`] or
//! [`ClassifiedEvent::Unrecognized`].

use serde_json::Value;

use super::lead::{LeadType, NewLead};

/// Event names that produce a sale.
pub const SALE_EVENTS: [&str; 3] = ["PURCHASE_APPROVED", "PURCHASE_COMPLETE", "APPROVED"];

/// Event name that produces an abandonment.
pub const ABANDONMENT_EVENT: &str = "CART_ABANDONMENT";

/// Placeholder name for sales without `name_client`.
pub const DEFAULT_SALE_NAME: &str = "Cliente Hotmart";
/// Placeholder name for abandonments without `name_client`.
pub const DEFAULT_ABANDONMENT_NAME: &str = "Visitante";
/// Placeholder for a missing `email_client`.
pub const DEFAULT_EMAIL: &str = "email@test.com";
/// Placeholder for a missing `prod_name`.
pub const DEFAULT_PRODUCT: &str = "Producto";

/// Result of classifying one inbound payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedEvent {
    /// Approved or completed purchase.
    Sale(NewLead),
    /// Abandoned checkout.
    Abandonment(NewLead),
    /// Anything else; discarded without a record.
    Unrecognized {
        /// The `event` value, if the payload carried a string one.
        event: Option<String>,
    },
}

impl ClassifiedEvent {
    /// Returns the lead to persist, or `None` for unrecognized events.
    #[must_use]
    pub fn into_new_lead(self) -> Option<NewLead> {
        match self {
            Self::Sale(lead) | Self::Abandonment(lead) => Some(lead),
            Self::Unrecognized { .. } => None,
        }
    }

    /// Short label used in logs and counters.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Sale(_) => "sale",
            Self::Abandonment(_) => "abandonment",
            Self::Unrecognized { .. } => "unrecognized",
        }
    }
}

/// Classifies a decoded webhook payload.
#[must_use]
pub fn classify(payload: &Value) -> ClassifiedEvent {
    let event = payload.get("event").and_then(Value::as_str);

    match event {
        Some(name) if SALE_EVENTS.contains(&name) => ClassifiedEvent::Sale(NewLead {
            lead_type: LeadType::Sale,
            name: text_or(payload, "name_client", DEFAULT_SALE_NAME),
            email: text_or(payload, "email_client", DEFAULT_EMAIL),
            product: text_or(payload, "prod_name", DEFAULT_PRODUCT),
            price: payload.get("value").map_or(0.0, coerce_price),
            phone: text_field(payload, "phone_number"),
        }),
        Some(name) if name == ABANDONMENT_EVENT => ClassifiedEvent::Abandonment(NewLead {
            lead_type: LeadType::Abandonment,
            name: text_or(payload, "name_client", DEFAULT_ABANDONMENT_NAME),
            email: text_or(payload, "email_client", DEFAULT_EMAIL),
            product: text_or(payload, "prod_name", DEFAULT_PRODUCT),
            price: 0.0,
            phone: text_field(payload, "phone_number"),
        }),
        _ => ClassifiedEvent::Unrecognized {
            event: event.map(str::to_string),
        },
    }
}

fn text_or(payload: &Value, key: &str, default: &str) -> String {
    text_field(payload, key).unwrap_or_else(|| default.to_string())
}

/// Reads a scalar field as text. Strings are kept as received.
fn text_field(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(scalar_text)
}

/// Renders a scalar as text; `null`, arrays and objects yield `None`.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Best-effort numeric coercion. Never returns a non-finite value.
pub(crate) fn coerce_price(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<f64>()
                .ok()
                .or_else(|| trimmed.replacen(',', ".", 1).parse::<f64>().ok())
        }
        _ => None,
    };
    parsed.filter(|p| p.is_finite()).unwrap_or(0.0)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::lead::LeadStatus;

    fn expect_sale(payload: &Value) -> NewLead {
        let ClassifiedEvent::Sale(lead) = classify(payload) else {
            panic!("expected sale for {payload}");
        };
        lead
    }

    #[test]
    fn every_sale_event_yields_approved_sale() {
        for name in SALE_EVENTS {
            let lead = expect_sale(&json!({"event": name, "value": 42.5}));
            assert_eq!(lead.lead_type, LeadType::Sale);
            assert_eq!(lead.status(), LeadStatus::Approved);
            assert!((lead.price - 42.5).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn sale_maps_all_fields() {
        let lead = expect_sale(&json!({
            "event": "PURCHASE_APPROVED",
            "name_client": "Ana",
            "email_client": "a@x.com",
            "prod_name": "Course",
            "value": 99.9,
            "phone_number": "+55 11 99999-0000"
        }));
        assert_eq!(lead.name, "Ana");
        assert_eq!(lead.email, "a@x.com");
        assert_eq!(lead.product, "Course");
        assert!((lead.price - 99.9).abs() < f64::EPSILON);
        assert_eq!(lead.phone.as_deref(), Some("+55 11 99999-0000"));
    }

    #[test]
    fn abandonment_forces_zero_price() {
        let event = classify(&json!({
            "event": "CART_ABANDONMENT",
            "name_client": "Luis",
            "value": 250
        }));
        let ClassifiedEvent::Abandonment(lead) = event else {
            panic!("expected abandonment");
        };
        assert_eq!(lead.name, "Luis");
        assert_eq!(lead.status(), LeadStatus::Abandoned);
        assert!(lead.price.abs() < f64::EPSILON);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let lead = expect_sale(&json!({"event": "APPROVED"}));
        assert_eq!(lead.name, DEFAULT_SALE_NAME);
        assert_eq!(lead.email, DEFAULT_EMAIL);
        assert_eq!(lead.product, DEFAULT_PRODUCT);
        assert!(lead.price.abs() < f64::EPSILON);
        assert!(lead.phone.is_none());

        let Some(abandoned) = classify(&json!({"event": "CART_ABANDONMENT", "name_client": null}))
            .into_new_lead()
        else {
            panic!("expected abandonment lead");
        };
        assert_eq!(abandoned.name, DEFAULT_ABANDONMENT_NAME);
    }

    #[test]
    fn unknown_events_are_unrecognized() {
        assert_eq!(
            classify(&json!({"event": "SOMETHING_ELSE"})),
            ClassifiedEvent::Unrecognized {
                event: Some("SOMETHING_ELSE".to_string())
            }
        );
        assert_eq!(
            classify(&json!({"event": "purchase_approved"})).label(),
            "unrecognized"
        );
        assert!(classify(&json!({})).into_new_lead().is_none());
        assert!(classify(&json!({"event": 5})).into_new_lead().is_none());
    }

    #[test]
    fn non_object_payloads_are_unrecognized() {
        for payload in [json!(null), json!([1, 2]), json!("PURCHASE_APPROVED"), json!(3)] {
            assert_eq!(
                classify(&payload),
                ClassifiedEvent::Unrecognized { event: None }
            );
        }
    }

    #[test]
    fn price_coercion_is_best_effort() {
        let cases = [
            (json!("99.90"), 99.9),
            (json!(" 12 "), 12.0),
            (json!("19,90"), 19.9),
            (json!("abc"), 0.0),
            (json!("NaN"), 0.0),
            (json!("inf"), 0.0),
            (json!(true), 0.0),
            (json!({"amount": 3}), 0.0),
            (json!(7), 7.0),
        ];
        for (value, expected) in cases {
            let lead = expect_sale(&json!({"event": "PURCHASE_COMPLETE", "value": value}));
            assert!(
                (lead.price - expected).abs() < 1e-9,
                "value {value} coerced to {}",
                lead.price
            );
        }
    }

    #[test]
    fn present_values_are_kept_as_received() {
        let lead = expect_sale(&json!({
            "event": "APPROVED",
            "name_client": "",
            "email_client": "  ana@x.com ",
            "prod_name": 1234,
            "phone_number": ""
        }));
        assert_eq!(lead.name, "");
        assert_eq!(lead.email, "  ana@x.com ");
        assert_eq!(lead.product, "1234");
        assert_eq!(lead.phone.as_deref(), Some(""));

        let lead = expect_sale(&json!({"event": "APPROVED", "prod_name": ["x"]}));
        assert_eq!(lead.product, DEFAULT_PRODUCT);
    }
}
