//! Oracle Request Broker
//!
//! Correlates rebalance requests with fulfillments that arrive later, out
//! of order, twice, or never. Validation here is the only thing standing
//! between a stale or replayed oracle response and an allocation balance, so
//! every rejection leaves all state untouched.

use crate::allocation::AllocationLedger;
use crate::config::OracleConfig;
use chrono::{DateTime, Duration, Utc};
use gaia_types::{
    FulfillmentOutcome, LedgerEvent, OracleRequest, OwnerId, Quantity, RejectReason, RequestId,
    RequestStatus,
};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Issues and resolves oracle requests
#[derive(Debug, Clone)]
pub struct OracleBroker {
    timeout: Duration,
    requests: BTreeMap<RequestId, OracleRequest>,
    next_id: RequestId,
}

impl OracleBroker {
    pub fn new(config: OracleConfig) -> Self {
        Self {
            timeout: config.request_timeout(),
            requests: BTreeMap::new(),
            next_id: RequestId::first(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issue a request using the configured timeout
    pub fn issue(
        &mut self,
        owner: &OwnerId,
        requested_amount: Quantity,
        now: DateTime<Utc>,
        journal: &mut Vec<LedgerEvent>,
    ) -> RequestId {
        self.issue_with_timeout(owner, requested_amount, self.timeout, now, journal)
    }

    /// Issue a request that expires `timeout` after `now`
    pub fn issue_with_timeout(
        &mut self,
        owner: &OwnerId,
        requested_amount: Quantity,
        timeout: Duration,
        now: DateTime<Utc>,
        journal: &mut Vec<LedgerEvent>,
    ) -> RequestId {
        let id = self.next_id;
        let expires_at = now.checked_add_signed(timeout).unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.requests.insert(
            id,
            OracleRequest::new(id, owner.clone(), requested_amount, now, expires_at),
        );
        self.next_id = id.next();

        journal.push(LedgerEvent::RebalanceRequested {
            request_id: id,
            owner_id: owner.clone(),
            requested_amount,
            expires_at,
        });
        id
    }

    /// Validate a fulfillment and, if it is acceptable, apply it
    pub fn fulfill(
        &mut self,
        request_id: RequestId,
        resolved_amount: f64,
        ledger: &mut AllocationLedger,
        now: DateTime<Utc>,
        journal: &mut Vec<LedgerEvent>,
    ) -> FulfillmentOutcome {
        let reject = |reason: RejectReason| {
            warn!(
                request_id = %request_id,
                resolved_amount,
                reason = %reason,
                "Oracle fulfillment rejected"
            );
            FulfillmentOutcome::Rejected { request_id, reason }
        };

        let Some(request) = self.requests.get_mut(&request_id) else {
            return reject(RejectReason::UnknownRequest);
        };
        match request.status {
            RequestStatus::Pending => {}
            RequestStatus::Fulfilled { .. } => return reject(RejectReason::AlreadyFulfilled),
            RequestStatus::Expired { .. } => return reject(RejectReason::Expired),
        }
        if request.is_past_expiry(now) {
            return reject(RejectReason::Expired);
        }
        let Ok(amount) = Quantity::new(resolved_amount) else {
            return reject(RejectReason::InvalidAmount);
        };

        let owner_id = request.owner_id.clone();
        if ledger
            .apply_fulfillment(&owner_id, request_id, amount, now)
            .is_err()
        {
            return reject(RejectReason::OwnerMismatch);
        }
        request.status = RequestStatus::Fulfilled {
            resolved_amount: amount,
            fulfilled_at: now,
        };

        info!(
            request_id = %request_id,
            owner = %owner_id,
            amount = amount.value(),
            "Oracle fulfillment applied"
        );

        journal.push(LedgerEvent::FulfillmentApplied {
            request_id,
            owner_id: owner_id.clone(),
            amount,
        });
        FulfillmentOutcome::Applied {
            request_id,
            owner_id,
            amount,
        }
    }

    /// Expire every pending request past its deadline
    pub fn expire_stale(
        &mut self,
        now: DateTime<Utc>,
        ledger: &mut AllocationLedger,
        journal: &mut Vec<LedgerEvent>,
    ) -> Vec<RequestId> {
        self.expire_matching(now, ledger, journal, |_| true)
    }

    /// Expire the owner's pending request if it is past its deadline
    pub fn expire_stale_for(
        &mut self,
        owner: &OwnerId,
        now: DateTime<Utc>,
        ledger: &mut AllocationLedger,
        journal: &mut Vec<LedgerEvent>,
    ) -> Vec<RequestId> {
        self.expire_matching(now, ledger, journal, |request| &request.owner_id == owner)
    }

    fn expire_matching(
        &mut self,
        now: DateTime<Utc>,
        ledger: &mut AllocationLedger,
        journal: &mut Vec<LedgerEvent>,
        matches: impl Fn(&OracleRequest) -> bool,
    ) -> Vec<RequestId> {
        let mut expired = Vec::new();
        for request in self.requests.values_mut() {
            if !request.is_pending() || !request.is_past_expiry(now) || !matches(request) {
                continue;
            }
            request.status = RequestStatus::Expired { expired_at: now };
            ledger.clear_pending(&request.owner_id, request.id, now);
            warn!(
                request_id = %request.id,
                owner = %request.owner_id,
                expires_at = %request.expires_at,
                "Oracle request expired"
            );
            expired.push(request.id);
        }

        if !expired.is_empty() {
            journal.push(LedgerEvent::RequestsExpired {
                request_ids: expired.clone(),
            });
        }
        expired
    }

    pub fn request(&self, request_id: RequestId) -> Option<&OracleRequest> {
        self.requests.get(&request_id)
    }

    pub fn requests(&self) -> impl Iterator<Item = &OracleRequest> {
        self.requests.values()
    }

    pub fn pending_count(&self) -> usize {
        self.requests.values().filter(|r| r.is_pending()).count()
    }
}
