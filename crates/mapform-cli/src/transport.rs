//! Thread-backed transport for interactive sessions.
//!
//! The TUI stays single-threaded and cooperative; mutations leave through a
//! channel to a worker that owns its own store connection, and settlements
//! come back on the next poll. This is the same submit/poll contract the
//! simulator implements, so the editor cannot tell them apart.

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use tracing::warn;

use mapform_core::action::{SyncEnvelope, SyncOutcome, SyncSettlement, Transport};
use mapform_core::db::{self, store};
use mapform_core::error::ErrorCode;

pub struct LocalTransport {
    requests: mpsc::Sender<SyncEnvelope>,
    settlements: mpsc::Receiver<SyncSettlement>,
}

impl LocalTransport {
    /// Spawn the worker thread over the store at `store_path`.
    pub fn spawn(store_path: PathBuf) -> Self {
        let (request_tx, request_rx) = mpsc::channel::<SyncEnvelope>();
        let (settlement_tx, settlement_rx) = mpsc::channel::<SyncSettlement>();

        thread::spawn(move || {
            let mut conn = db::open_store(&store_path);
            for envelope in request_rx {
                let outcome = match &mut conn {
                    Ok(conn) => match store::execute_request(conn, &envelope.request) {
                        Ok(created) => SyncOutcome::Success(created),
                        Err(err) => SyncOutcome::Failure {
                            code: err.code(),
                            message: err.to_string(),
                        },
                    },
                    Err(err) => SyncOutcome::Failure {
                        code: ErrorCode::CorruptStore,
                        message: err.to_string(),
                    },
                };
                if settlement_tx
                    .send(SyncSettlement {
                        token: envelope.token,
                        outcome,
                    })
                    .is_err()
                {
                    // session went away; nothing left to settle
                    break;
                }
            }
        });

        Self {
            requests: request_tx,
            settlements: settlement_rx,
        }
    }
}

impl Transport for LocalTransport {
    fn submit(&mut self, envelope: SyncEnvelope) {
        if self.requests.send(envelope).is_err() {
            warn!("store worker is gone; dropping request");
        }
    }

    fn poll(&mut self) -> Vec<SyncSettlement> {
        self.settlements.try_iter().collect()
    }
}
