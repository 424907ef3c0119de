//! Oracle requests and fulfillments
//!
//! A request is issued when an owner asks for a rebalance and is resolved,
//! later and out of band, by the oracle quoting the same request id. Once a
//! request leaves `Pending` it never changes again.

use crate::{OwnerId, Quantity, RequestId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an oracle request
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RequestStatus {
    /// Awaiting the oracle
    #[default]
    Pending,
    /// Resolved and applied to the owner's allocation
    Fulfilled {
        resolved_amount: Quantity,
        fulfilled_at: DateTime<Utc>,
    },
    /// Timed out without a valid fulfillment
    Expired { expired_at: DateTime<Utc> },
}

/// An outbound rebalance request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OracleRequest {
    pub id: RequestId,
    pub owner_id: OwnerId,
    pub requested_amount: Quantity,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: RequestStatus,
}

impl OracleRequest {
    pub fn new(
        id: RequestId,
        owner_id: OwnerId,
        requested_amount: Quantity,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            requested_amount,
            issued_at,
            expires_at,
            status: RequestStatus::Pending,
        }
    }

    pub fn fulfilled(&self) -> bool {
        matches!(self.status, RequestStatus::Fulfilled { .. })
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, RequestStatus::Pending)
    }

    /// Strictly after `expires_at`
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Why a fulfillment was dropped without touching any allocation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    UnknownRequest,
    AlreadyFulfilled,
    Expired,
    InvalidAmount,
    MalformedPayload,
    OwnerMismatch,
    SystemPaused,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::UnknownRequest => write!(f, "unknown request"),
            RejectReason::AlreadyFulfilled => write!(f, "already fulfilled"),
            RejectReason::Expired => write!(f, "expired"),
            RejectReason::InvalidAmount => write!(f, "invalid amount"),
            RejectReason::MalformedPayload => write!(f, "malformed payload"),
            RejectReason::OwnerMismatch => write!(f, "owner no longer awaits this request"),
            RejectReason::SystemPaused => write!(f, "system paused"),
        }
    }
}

/// Result of delivering a fulfillment to the coordinator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FulfillmentOutcome {
    Applied {
        request_id: RequestId,
        owner_id: OwnerId,
        amount: Quantity,
    },
    Rejected {
        request_id: RequestId,
        reason: RejectReason,
    },
}

impl FulfillmentOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FulfillmentOutcome::Applied { .. })
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            FulfillmentOutcome::Rejected { reason, .. } => Some(*reason),
            FulfillmentOutcome::Applied { .. } => None,
        }
    }
}

/// Decode an oracle's opaque numeric payload
///
/// Accepts UTF-8 decimal text (`142.5`), a JSON number, or a JSON object
/// with an `amount` field. Range checks are left to [`Quantity::new`].
pub fn decode_oracle_amount(payload: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(payload).ok()?.trim();
    if let Ok(value) = text.parse::<f64>() {
        return Some(value);
    }
    match serde_json::from_str::<serde_json::Value>(text).ok()? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::Object(map) => map.get("amount")?.as_f64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_expiry_is_strict() {
        let now = Utc::now();
        let req = OracleRequest::new(
            RequestId::first(),
            OwnerId::new("owner-x"),
            Quantity::new(150.0).unwrap(),
            now,
            now + Duration::minutes(5),
        );
        assert!(req.is_pending());
        assert!(!req.fulfilled());
        assert!(!req.is_past_expiry(req.expires_at));
        assert!(req.is_past_expiry(req.expires_at + Duration::milliseconds(1)));
    }

    #[test]
    fn test_decode_oracle_amount() {
        assert_eq!(decode_oracle_amount(b"142.5"), Some(142.5));
        assert_eq!(decode_oracle_amount(b" 7 \n"), Some(7.0));
        assert_eq!(decode_oracle_amount(br#"{"amount": 99.25}"#), Some(99.25));
        assert_eq!(decode_oracle_amount(b"not a number"), None);
        assert_eq!(decode_oracle_amount(br#"{"value": 1}"#), None);
        assert_eq!(decode_oracle_amount(&[0xff, 0xfe]), None);
    }

    #[test]
    fn test_outcome_helpers() {
        let rejected = FulfillmentOutcome::Rejected {
            request_id: RequestId(1),
            reason: RejectReason::AlreadyFulfilled,
        };
        assert!(!rejected.is_applied());
        assert_eq!(rejected.reject_reason(), Some(RejectReason::AlreadyFulfilled));
        assert_eq!(RejectReason::Expired.to_string(), "expired");
    }
}
