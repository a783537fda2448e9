//! Return-value channel.
//!
//! Results of REPL blocks (and errors raised outside any block) are queued
//! here, tagged by block id, until an external transport drains them as one
//! JSON batch:
//!
//! ```json
//! {"status":"OK","values":[{"status":"OK","value":"3","type":"return","blockid":"1"}]}
//! ```
//!
//! The channel is the only bridge part shared across threads. Producers live on
//! the interpreter thread; the transport may drain from anywhere.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::coerce::Coercer;
use crate::value::Value;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("block id must not be empty")]
    EmptyBlockId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResultStatus {
    #[serde(rename = "OK")]
    Ok,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultKind {
    Return,
    Error,
    PushScreen,
    PopScreen,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingResult {
    pub block_id: String,
    pub status: ResultStatus,
    pub payload: Value,
    pub kind: ResultKind,
}

/// Wire form of one drained result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    pub status: ResultStatus,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: ResultKind,
    pub blockid: String,
}

/// Wire form of a drained batch. The outer status is always `OK`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Batch {
    pub status: ResultStatus,
    pub values: Vec<BatchEntry>,
}

#[derive(Debug, Default)]
pub struct ReturnChannel {
    queue: Mutex<Vec<PendingResult>>,
    ready: Notify,
    coercer: Coercer,
}

impl ReturnChannel {
    pub fn new(coercer: Coercer) -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
            ready: Notify::new(),
            coercer,
        }
    }

    /// Queue a block result.
    pub fn push(&self, block_id: impl Into<String>, status: ResultStatus, payload: Value) -> Result<(), ChannelError> {
        self.push_kind(block_id, status, payload, ResultKind::Return)
    }

    pub fn push_kind(
        &self,
        block_id: impl Into<String>,
        status: ResultStatus,
        payload: Value,
        kind: ResultKind,
    ) -> Result<(), ChannelError> {
        let block_id = block_id.into();
        if block_id.is_empty() {
            warn!(?kind, "rejected result without block id");
            return Err(ChannelError::EmptyBlockId);
        }
        debug!(%block_id, ?status, ?kind, "queued result");
        self.lock().push(PendingResult {
            block_id,
            status,
            payload,
            kind,
        });
        self.ready.notify_one();
        Ok(())
    }

    /// Serialize pending results. With `clear` the queue is drained in the
    /// same critical section, so concurrent drains never see the same entry.
    pub fn fetch(&self, clear: bool) -> String {
        let batch = self.fetch_batch(clear);
        serde_json::to_string(&batch).unwrap_or_else(|_| r#"{"status":"OK","values":[]}"#.to_string())
    }

    pub fn fetch_batch(&self, clear: bool) -> Batch {
        let pending = {
            let mut queue = self.lock();
            if clear {
                std::mem::take(&mut *queue)
            } else {
                queue.clone()
            }
        };
        Batch {
            status: ResultStatus::Ok,
            values: pending.into_iter().map(|r| self.entry(r)).collect(),
        }
    }

    /// Wait until at least one result is queued, then drain.
    pub async fn fetch_when_ready(&self) -> String {
        loop {
            let notified = self.ready.notified();
            if !self.is_empty() {
                return self.fetch(true);
            }
            notified.await;
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn entry(&self, result: PendingResult) -> BatchEntry {
        BatchEntry {
            status: result.status,
            value: self.coercer.display(&result.payload),
            kind: result.kind,
            blockid: result.block_id,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PendingResult>> {
        // Entries are pushed whole, so a panicking holder cannot leave a
        // half-written queue behind
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_drain() {
        let channel = ReturnChannel::default();
        channel.push("1", ResultStatus::Ok, Value::from(3)).unwrap();
        assert_eq!(
            channel.fetch(true),
            r#"{"status":"OK","values":[{"status":"OK","value":"3","type":"return","blockid":"1"}]}"#
        );
        assert_eq!(channel.fetch(true), r#"{"status":"OK","values":[]}"#);
    }

    #[test]
    fn test_peek_keeps_entries() {
        let channel = ReturnChannel::default();
        channel.push("7", ResultStatus::Error, Value::from("bad")).unwrap();
        let first = channel.fetch(false);
        assert_eq!(first, channel.fetch(false));
        assert_eq!(channel.len(), 1);
        assert!(first.contains(r#""status":"Error","value":"bad""#));
    }

    #[test]
    fn test_empty_block_id_is_rejected() {
        let channel = ReturnChannel::default();
        assert_eq!(
            channel.push("", ResultStatus::Ok, Value::nothing()),
            Err(ChannelError::EmptyBlockId)
        );
        assert!(channel.is_empty());
    }

    #[test]
    fn test_kinds_serialize_camel_case() {
        let channel = ReturnChannel::default();
        channel
            .push_kind("-1", ResultStatus::Ok, Value::from("Screen2"), ResultKind::PushScreen)
            .unwrap();
        assert!(channel.fetch(true).contains(r#""type":"pushScreen""#));
    }

    #[test]
    fn test_payload_uses_display_string() {
        let channel = ReturnChannel::default();
        channel
            .push("2", ResultStatus::Ok, Value::List(vec![Value::from("a"), Value::from(1.5)]))
            .unwrap();
        let batch = channel.fetch_batch(true);
        assert_eq!(batch.values[0].value, r#"["a", 1.5]"#);
    }
}
