//! Fault-injecting transport over a real store connection.
//!
//! Requests execute against SQLite at *delivery* time, so the store applies
//! mutations in the same shuffled order the settlements come back in —
//! exactly the race a slow network produces for fire-and-forget actions.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use mapform_core::action::{SyncEnvelope, SyncOutcome, SyncSettlement, Transport};
use mapform_core::db::store;

use crate::rng::DeterministicRng;

/// Fault injection configuration for simulated delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultConfig {
    /// Maximum delivery delay in ticks.
    pub max_delay_ticks: u8,
    /// Percentage of requests lost in flight (no settlement, no effect).
    pub drop_rate_percent: u8,
    /// Percentage of settlements delivered twice.
    pub duplicate_rate_percent: u8,
    /// Percentage chance of shuffling ready deliveries at each tick.
    pub reorder_rate_percent: u8,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            max_delay_ticks: 2,
            drop_rate_percent: 0,
            duplicate_rate_percent: 0,
            reorder_rate_percent: 5,
        }
    }
}

impl FaultConfig {
    /// A perfectly reliable, in-order, next-tick network.
    #[must_use]
    pub const fn reliable() -> Self {
        Self {
            max_delay_ticks: 1,
            drop_rate_percent: 0,
            duplicate_rate_percent: 0,
            reorder_rate_percent: 0,
        }
    }
}

#[derive(Debug)]
struct PendingDelivery {
    deliver_at_tick: u64,
    envelope: SyncEnvelope,
}

/// Counters for what the faults actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultStats {
    pub dropped: u64,
    pub duplicated: u64,
    pub reordered_ticks: u64,
    pub failures: u64,
}

/// Deterministic fault-injecting [`Transport`].
pub struct SimTransport {
    conn: Connection,
    rng: DeterministicRng,
    fault: FaultConfig,
    tick: u64,
    pending: Vec<PendingDelivery>,
    arrived: Vec<SyncSettlement>,
    stats: FaultStats,
}

impl SimTransport {
    #[must_use]
    pub fn new(conn: Connection, fault: FaultConfig, seed: u64) -> Self {
        Self {
            conn,
            rng: DeterministicRng::new(seed),
            fault,
            tick: 0,
            pending: Vec::new(),
            arrived: Vec::new(),
            stats: FaultStats::default(),
        }
    }

    #[must_use]
    pub const fn stats(&self) -> FaultStats {
        self.stats
    }

    /// Requests submitted but neither delivered nor dropped yet.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Advance simulated time by one tick: execute every ready request
    /// against the store and queue its settlement for the next poll.
    pub fn advance(&mut self) {
        self.tick += 1;
        let tick = self.tick;

        let mut ready: Vec<PendingDelivery> = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].deliver_at_tick <= tick {
                ready.push(self.pending.swap_remove(index));
            } else {
                index += 1;
            }
        }
        // swap_remove scrambles relative order; restore submission order
        // first so reordering is an injected fault, not an accident
        ready.sort_by_key(|d| d.envelope.token);

        if ready.len() > 1 && self.rng.percent(self.fault.reorder_rate_percent) {
            self.stats.reordered_ticks += 1;
            // deterministic shuffle: rotate by a random amount
            let rotation = self.rng.pick_index(ready.len());
            ready.rotate_left(rotation);
        }

        for delivery in ready {
            let outcome = match store::execute_request(&mut self.conn, &delivery.envelope.request)
            {
                Ok(created) => SyncOutcome::Success(created),
                Err(err) => {
                    self.stats.failures += 1;
                    SyncOutcome::Failure {
                        code: err.code(),
                        message: err.to_string(),
                    }
                }
            };
            debug!(
                token = delivery.envelope.token.raw(),
                tick, "delivered"
            );
            let settlement = SyncSettlement {
                token: delivery.envelope.token,
                outcome,
            };
            if self.rng.percent(self.fault.duplicate_rate_percent) {
                self.stats.duplicated += 1;
                self.arrived.push(settlement.clone());
            }
            self.arrived.push(settlement);
        }
    }
}

impl Transport for SimTransport {
    fn submit(&mut self, envelope: SyncEnvelope) {
        if self.rng.percent(self.fault.drop_rate_percent) {
            self.stats.dropped += 1;
            debug!(token = envelope.token.raw(), "dropped in flight");
            return;
        }
        let delay = 1 + self.rng.next_bounded(u64::from(self.fault.max_delay_ticks).max(1));
        self.pending.push(PendingDelivery {
            deliver_at_tick: self.tick + delay,
            envelope,
        });
    }

    fn poll(&mut self) -> Vec<SyncSettlement> {
        self.arrived.drain(..).collect()
    }
}
