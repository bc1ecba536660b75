//! Canonical lead record and its classification enums.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind of commercial event a lead represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeadType {
    /// A completed or approved purchase.
    Sale,
    /// A checkout that was started and not finished.
    Abandonment,
}

impl LeadType {
    /// Returns the status paired with this type.
    #[must_use]
    pub const fn status(self) -> LeadStatus {
        match self {
            Self::Sale => LeadStatus::Approved,
            Self::Abandonment => LeadStatus::Abandoned,
        }
    }

    /// Returns the wire name (`"SALE"` / `"ABANDONMENT"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sale => "SALE",
            Self::Abandonment => "ABANDONMENT",
        }
    }
}

impl fmt::Display for LeadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SALE" => Ok(Self::Sale),
            "ABANDONMENT" => Ok(Self::Abandonment),
            other => Err(format!("unknown lead type '{other}'")),
        }
    }
}

/// Lifecycle status of a lead, derived 1:1 from [`LeadType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    /// Payment approved.
    Approved,
    /// Cart abandoned.
    Abandoned,
}

impl LeadStatus {
    /// Returns the wire name (`"approved"` / `"abandoned"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(Self::Approved),
            "abandoned" => Ok(Self::Abandoned),
            other => Err(format!("unknown lead status '{other}'")),
        }
    }
}

/// A classified lead that has not been persisted yet.
///
/// Carries no `id` and no `saved_at`: both are assigned by the storage
/// backend at append time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLead {
    /// Sale or abandonment.
    #[serde(rename = "type")]
    pub lead_type: LeadType,
    /// Customer name.
    pub name: String,
    /// Customer email.
    pub email: String,
    /// Product name.
    pub product: String,
    /// Sale amount; always `0.0` for abandonments.
    pub price: f64,
    /// Customer phone, when supplied.
    pub phone: Option<String>,
}

impl NewLead {
    /// Status implied by the lead type.
    #[must_use]
    pub const fn status(&self) -> LeadStatus {
        self.lead_type.status()
    }

    /// Promotes this lead to a stored record.
    #[must_use]
    pub fn into_lead(self, id: i64, saved_at: DateTime<Utc>) -> Lead {
        Lead {
            id,
            status: self.status(),
            lead_type: self.lead_type,
            name: self.name,
            email: self.email,
            product: self.product,
            price: self.price,
            phone: self.phone,
            saved_at,
        }
    }
}

/// A persisted lead as returned by the read API.
///
/// Deserialization is lenient so that documents written by earlier
/// versions load: a missing or textual `price` is coerced, scalar text
/// fields may be numbers or `null`, and `phone` may be omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Lead {
    /// Backend-assigned identifier, unique within one backend.
    pub id: i64,
    /// Sale or abandonment.
    #[serde(rename = "type")]
    pub lead_type: LeadType,
    /// Customer name.
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    /// Customer email.
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: String,
    /// Product name.
    #[serde(default, deserialize_with = "lenient::text")]
    pub product: String,
    /// Sale amount; always `0.0` for abandonments.
    #[serde(default, deserialize_with = "lenient::price")]
    pub price: f64,
    /// Customer phone, when supplied.
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub phone: Option<String>,
    /// Status paired with `type`.
    pub status: LeadStatus,
    /// Moment the backend stored the record.
    #[serde(with = "saved_at_format")]
    #[schema(value_type = String, format = DateTime)]
    pub saved_at: DateTime<Utc>,
}

/// Field readers for stored documents, sharing the webhook coercion rules.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::domain::normalizer::{coerce_price, scalar_text};

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(scalar_text(&Value::deserialize(deserializer)?).unwrap_or_default())
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(scalar_text(&Value::deserialize(deserializer)?))
    }

    pub fn price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(coerce_price(&Value::deserialize(deserializer)?))
    }
}

/// RFC 3339 on output; also accepts the `YYYY-MM-DD HH:MM:SS` layout that
/// older lead documents were written with (read as UTC).
mod saved_at_format {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S")
                    .map(|ndt| DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
            })
            .map_err(|e| serde::de::Error::custom(format!("invalid saved_at '{raw}': {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn sample(lead_type: LeadType) -> NewLead {
        NewLead {
            lead_type,
            name: "Ana".to_string(),
            email: "a@x.com".to_string(),
            product: "Course".to_string(),
            price: 10.0,
            phone: None,
        }
    }

    #[test]
    fn status_follows_type() {
        assert_eq!(LeadType::Sale.status(), LeadStatus::Approved);
        assert_eq!(LeadType::Abandonment.status(), LeadStatus::Abandoned);
        let lead = sample(LeadType::Abandonment).into_lead(7, Utc::now());
        assert_eq!(lead.status, LeadStatus::Abandoned);
        assert_eq!(lead.id, 7);
    }

    #[test]
    fn serializes_with_wire_names() {
        let lead = sample(LeadType::Sale).into_lead(1, Utc::now());
        let Ok(value) = serde_json::to_value(&lead) else {
            panic!("lead should serialize");
        };
        assert_eq!(value["type"], "SALE");
        assert_eq!(value["status"], "approved");
        assert!(value["phone"].is_null());
        assert!(value["saved_at"].is_string());
    }

    #[test]
    fn reads_legacy_saved_at_layout() {
        let raw = r#"{"id":1,"type":"ABANDONMENT","name":"Luis","email":"e","product":"p",
            "price":0.0,"phone":null,"status":"abandoned","saved_at":"2024-05-01 10:20:30"}"#;
        let Ok(lead) = serde_json::from_str::<Lead>(raw) else {
            panic!("legacy document should parse");
        };
        assert_eq!(lead.saved_at.to_rfc3339(), "2024-05-01T10:20:30+00:00");
    }

    #[test]
    fn reads_documents_with_loose_field_types() {
        let raw = r#"[
            {"id":2,"type":"SALE","name":"Ana","email":"a@x.com","product":"Course",
             "price":"99.9","phone":5511999990000,"status":"approved",
             "saved_at":"2024-05-01 10:21:00"},
            {"id":1,"type":"ABANDONMENT","name":null,"email":"e@x.com","product":"Course",
             "status":"abandoned","saved_at":"2024-05-01 10:20:30"}
        ]"#;
        let Ok(leads) = serde_json::from_str::<Vec<Lead>>(raw) else {
            panic!("older lead documents should parse");
        };
        let [sale, abandonment] = leads.as_slice() else {
            panic!("two leads expected");
        };
        assert!((sale.price - 99.9).abs() < f64::EPSILON);
        assert_eq!(sale.phone.as_deref(), Some("5511999990000"));
        assert!(abandonment.price.abs() < f64::EPSILON);
        assert_eq!(abandonment.name, "");
        assert!(abandonment.phone.is_none());
    }

    #[test]
    fn parses_type_and_status_names() {
        assert_eq!("SALE".parse::<LeadType>(), Ok(LeadType::Sale));
        assert!("sale".parse::<LeadType>().is_err());
        assert_eq!("abandoned".parse::<LeadStatus>(), Ok(LeadStatus::Abandoned));
    }
}
