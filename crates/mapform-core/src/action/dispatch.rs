//! Token allocation, in-flight tracking, and failure notifications.

use std::collections::BTreeMap;
use std::collections::VecDeque;

use tracing::{debug, warn};

use super::{SyncEnvelope, SyncOutcome, SyncRequest, SyncSettlement, Transport};
use crate::error::ErrorCode;
use crate::optimistic::MutationToken;

/// Notification severity, mirrored by the TUI status line and CLI stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient, user-facing message (the toast equivalent). Never modal,
/// never a retry surface: repeating a failed mutation means repeating the
/// gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    pub code: Option<ErrorCode>,
}

impl Notification {
    #[must_use]
    pub fn warning(message: impl Into<String>, code: Option<ErrorCode>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            code,
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            code: None,
        }
    }
}

/// Dispatches envelopes over a [`Transport`] and converts settlements into
/// notifications. The dispatcher owns no optimistic state; callers pair the
/// returned token with their own patch queue.
#[derive(Debug)]
pub struct Dispatcher<Tr> {
    transport: Tr,
    next_token: u64,
    in_flight: BTreeMap<MutationToken, &'static str>,
    notifications: VecDeque<Notification>,
}

impl<Tr: Transport> Dispatcher<Tr> {
    #[must_use]
    pub const fn new(transport: Tr) -> Self {
        Self {
            transport,
            next_token: 1,
            in_flight: BTreeMap::new(),
            notifications: VecDeque::new(),
        }
    }

    /// Fire-and-forget dispatch. Allocates a token, submits the envelope,
    /// and returns the token for pairing with an optimistic patch.
    pub fn dispatch(&mut self, request: SyncRequest) -> MutationToken {
        let token = MutationToken::new(self.next_token);
        self.next_token += 1;

        let label = request.describe();
        debug!(token = token.raw(), action = label, "dispatch");
        self.in_flight.insert(token, label);
        self.transport.submit(SyncEnvelope { token, request });
        token
    }

    /// Drain settlements that have arrived. Failures are converted into
    /// warning notifications; both kinds are returned so the caller can
    /// settle its optimistic state.
    pub fn poll(&mut self) -> Vec<SyncSettlement> {
        let settlements = self.transport.poll();
        for settlement in &settlements {
            let label = self
                .in_flight
                .remove(&settlement.token)
                .unwrap_or("mutation");
            match &settlement.outcome {
                SyncOutcome::Success(_) => {
                    debug!(token = settlement.token.raw(), action = label, "settled");
                }
                SyncOutcome::Failure { code, message } => {
                    warn!(
                        token = settlement.token.raw(),
                        action = label,
                        code = %code,
                        "sync action failed: {message}"
                    );
                    self.notifications.push_back(Notification::warning(
                        format!("There was an error trying to {label}: {message}"),
                        Some(*code),
                    ));
                }
            }
        }
        settlements
    }

    /// Number of dispatched mutations with no settlement yet.
    #[must_use]
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// Push a client-originated notification (guards, confirmations).
    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push_back(notification);
    }

    /// Take every queued notification, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    /// Access the underlying transport (the simulator ticks it directly).
    pub fn transport_mut(&mut self) -> &mut Tr {
        &mut self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::{Dispatcher, Severity};
    use crate::action::{
        SyncEnvelope, SyncOutcome, SyncRequest, SyncSettlement, Transport,
    };
    use crate::error::ErrorCode;
    use crate::model::{PageId, ProjectId};

    /// Transport that answers every submission on the next poll, in reverse
    /// arrival order, with a canned outcome.
    #[derive(Default)]
    struct ReplyTransport {
        queue: Vec<SyncEnvelope>,
        fail: bool,
    }

    impl Transport for ReplyTransport {
        fn submit(&mut self, envelope: SyncEnvelope) {
            self.queue.push(envelope);
        }

        fn poll(&mut self) -> Vec<SyncSettlement> {
            let fail = self.fail;
            self.queue
                .drain(..)
                .rev()
                .map(|envelope| SyncSettlement {
                    token: envelope.token,
                    outcome: if fail {
                        SyncOutcome::Failure {
                            code: ErrorCode::StoreWriteFailed,
                            message: "disk full".to_string(),
                        }
                    } else {
                        SyncOutcome::Success(None)
                    },
                })
                .collect()
        }
    }

    fn reorder_request() -> SyncRequest {
        SyncRequest::ReorderPages {
            project_id: ProjectId(1),
            ordered_ids: vec![PageId(2), PageId(1)],
        }
    }

    #[test]
    fn tokens_are_unique_and_tracked() {
        let mut dispatcher = Dispatcher::new(ReplyTransport::default());
        let a = dispatcher.dispatch(reorder_request());
        let b = dispatcher.dispatch(reorder_request());
        assert_ne!(a, b);
        assert_eq!(dispatcher.in_flight_len(), 2);

        let settlements = dispatcher.poll();
        assert_eq!(settlements.len(), 2);
        assert_eq!(dispatcher.in_flight_len(), 0);
        assert!(dispatcher.drain_notifications().is_empty());
    }

    #[test]
    fn failures_become_warning_notifications() {
        let mut dispatcher = Dispatcher::new(ReplyTransport {
            fail: true,
            ..ReplyTransport::default()
        });
        dispatcher.dispatch(reorder_request());
        dispatcher.poll();

        let notes = dispatcher.drain_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].severity, Severity::Warning);
        assert!(notes[0].message.contains("reorder pages"));
        assert_eq!(notes[0].code, Some(ErrorCode::StoreWriteFailed));
    }
}
