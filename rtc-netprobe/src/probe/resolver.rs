use tokio::sync::oneshot;

use super::outcome::ProbeOutcome;
use crate::error::Result;

/// One-shot delivery slot for the result of a run.
///
/// The sender is taken on first use, so every later attempt to resolve is a
/// no-op regardless of which path (deadline, terminal state, error) it comes
/// from.
#[derive(Debug)]
pub(crate) struct OutcomeSlot {
    tx: Option<oneshot::Sender<Result<ProbeOutcome>>>,
}

impl OutcomeSlot {
    pub(crate) fn new() -> (Self, oneshot::Receiver<Result<ProbeOutcome>>) {
        let (tx, rx) = oneshot::channel();
        (OutcomeSlot { tx: Some(tx) }, rx)
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.tx.is_none()
    }

    /// Delivers `result` unless something was already delivered. Returns
    /// whether this call resolved the slot.
    pub(crate) fn resolve(&mut self, result: Result<ProbeOutcome>) -> bool {
        let Some(tx) = self.tx.take() else {
            return false;
        };
        if tx.send(result).is_err() {
            log::debug!("probe outcome dropped, receiver is gone");
        }
        true
    }

    /// Closes the slot without delivering anything.
    pub(crate) fn abandon(&mut self) {
        self.tx.take();
    }
}
