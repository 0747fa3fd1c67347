use super::error::BridgeError;
use crate::domain::bridge::{RequestId, Topic};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

pub type PendingReply = Result<Value, BridgeError>;

struct PendingRequest {
    topic: Topic,
    created_at: DateTime<Utc>,
    reply: oneshot::Sender<PendingReply>,
}

/// A pending entry removed from the ledger, ready to be settled.
pub struct PendingContinuation {
    request_id: RequestId,
    topic: Topic,
    created_at: DateTime<Utc>,
    reply: oneshot::Sender<PendingReply>,
}

impl PendingContinuation {
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `false` when the waiter is gone.
    pub fn resolve(self, value: Value) -> bool {
        self.reply.send(Ok(value)).is_ok()
    }

    pub fn reject(self, error: BridgeError) -> bool {
        self.reply.send(Err(error)).is_ok()
    }
}

#[derive(Default)]
struct LedgerState {
    entries: HashMap<RequestId, PendingRequest>,
    closed: bool,
}

/// Requests issued to a mini-app that still await a reply. Each entry is
/// settled at most once: by reply, by timeout, or by cancellation.
#[derive(Default)]
pub struct PendingLedger {
    state: Mutex<LedgerState>,
}

impl PendingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register(
        &self,
        request_id: RequestId,
        topic: Topic,
    ) -> Result<oneshot::Receiver<PendingReply>, BridgeError> {
        let mut state = self.lock();
        if state.closed {
            return Err(BridgeError::Closed);
        }
        if state.entries.contains_key(&request_id) {
            return Err(BridgeError::DuplicateRequest(request_id.to_string()));
        }
        let (tx, rx) = oneshot::channel();
        state.entries.insert(
            request_id,
            PendingRequest {
                topic,
                created_at: Utc::now(),
                reply: tx,
            },
        );
        Ok(rx)
    }

    pub fn take(&self, request_id: &RequestId) -> Option<PendingContinuation> {
        let entry = self.lock().entries.remove(request_id)?;
        Some(PendingContinuation {
            request_id: request_id.clone(),
            topic: entry.topic,
            created_at: entry.created_at,
            reply: entry.reply,
        })
    }

    pub fn resolve(&self, request_id: &RequestId, value: Value) -> bool {
        self.take(request_id)
            .map(|pending| pending.resolve(value))
            .unwrap_or(false)
    }

    pub fn reject(&self, request_id: &RequestId, error: BridgeError) -> bool {
        self.take(request_id)
            .map(|pending| pending.reject(error))
            .unwrap_or(false)
    }

    /// Drops an entry without settling it.
    pub fn discard(&self, request_id: &RequestId) -> bool {
        self.lock().entries.remove(request_id).is_some()
    }

    /// Rejects every entry with [`BridgeError::Cancelled`] and refuses new ones.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<PendingRequest> = {
            let mut state = self.lock();
            state.closed = true;
            state.entries.drain().map(|(_, entry)| entry).collect()
        };
        let count = drained.len();
        for entry in drained {
            let _ = entry.reply.send(Err(BridgeError::Cancelled));
        }
        count
    }

    pub fn contains(&self, request_id: &RequestId) -> bool {
        self.lock().entries.contains_key(request_id)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
