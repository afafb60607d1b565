//! # Offering Data Model
//!
//! The [`Offering`] is the unit of data moved through the system: one priced
//! compute-capacity purchase option (on-demand or reserved) for a given
//! zone/OS/instance-type/term. Every field is optional and serialization is
//! sparse: absent fields are omitted entirely rather than emitted as null,
//! which serde expresses once with `skip_serializing_if` instead of a
//! hand-rolled null check per field.
//!
//! [`ReservedOfferingRecord`] is the wire shape the reserved-offerings
//! upstream returns; converting it into an [`Offering`] applies the
//! hourly-price resolution policy (first recurring charge wins, scalar usage
//! price is the fallback).

use serde::{Deserialize, Serialize};

/// One-year reservation term, in seconds
pub const SECONDS_IN_YEAR: i64 = 31_536_000;

/// Three-year reservation term, in seconds
pub const SECONDS_IN_THREE_YEARS: i64 = 94_608_000;

/// A normalized pricing record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offering {
    /// e.g. "us-east-1a"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,

    /// e.g. "Heavy Utilization"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offering_type: Option<String>,

    /// e.g. "m1.small"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<String>,

    /// e.g. "Linux/UNIX (Amazon VPC)"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_description: Option<String>,

    /// Reservation term in seconds, e.g. [`SECONDS_IN_YEAR`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,

    /// e.g. "USD"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,

    /// Upfront cost, e.g. 169.0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_price: Option<f64>,

    /// Recurring or usage-based rate, e.g. 0.014
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_price: Option<f64>,
}

/// Response envelope: `{ "ec2offerings": [...] }`
///
/// The on-demand pricing document uses the same shape, so this doubles as the
/// deserialization target for that upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OfferingEnvelope {
    pub ec2offerings: Vec<Offering>,
}

/// A recurring charge attached to a reserved offering record
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringCharge {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

/// Raw reserved-offering record as returned by the upstream query service
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservedOfferingRecord {
    pub availability_zone: Option<String>,
    pub offering_type: Option<String>,
    pub instance_type: Option<String>,
    pub product_description: Option<String>,
    pub currency_code: Option<String>,
    pub duration: Option<i64>,
    pub fixed_price: Option<f64>,
    /// Scalar rate some instance families (e.g. c1.medium) report instead of
    /// a recurring-charges list
    pub usage_price: Option<f64>,
    #[serde(default)]
    pub recurring_charges: Vec<RecurringCharge>,
}

impl From<ReservedOfferingRecord> for Offering {
    fn from(record: ReservedOfferingRecord) -> Self {
        // Hourly price policy: the first recurring charge if the upstream
        // provided any, otherwise the scalar usage price.
        let hourly_price = match record.recurring_charges.first() {
            Some(charge) => charge.amount,
            None => record.usage_price,
        };

        Self {
            availability_zone: record.availability_zone,
            offering_type: record.offering_type,
            instance_type: record.instance_type,
            product_description: record.product_description,
            duration: record.duration,
            currency_code: record.currency_code,
            fixed_price: record.fixed_price,
            hourly_price,
        }
    }
}
