//! Write-ahead local state: confirmed base plus pending patches.
//!
//! The visible value is always `confirmed` projected through the pending
//! queue in arrival order. Settlement behavior, per mutation:
//!
//! | Settlement | Effect on the queue | Visible change |
//! |---|---|---|
//! | success | patch folds into `confirmed`, then retires | none |
//! | failure | patch stays in the queue (no rollback) | none |
//! | rebase  | queue is discarded wholesale | snapshot wins |
//!
//! No-rollback-on-failure is intentional observed behavior, not an
//! oversight to repair: a failed mutation keeps its optimistic value on
//! screen until the next full snapshot rebase replaces everything. Tests
//! pin this down so any future change is deliberate.
//!
//! There is no token/version fencing between in-flight mutations; patches
//! project in arrival order regardless of the order settlements come back.

/// Identifies one in-flight mutation from dispatch to settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationToken(u64);

impl MutationToken {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// A local mutation that can be projected over a state value.
///
/// Implementations must be deterministic; `apply` runs once per projection
/// and once more when the mutation settles successfully.
pub trait Patch<T> {
    fn apply(&self, target: &mut T);
}

/// Client-local view of an entity or collection: last confirmed server
/// state plus the pending patch queue.
#[derive(Debug, Clone)]
pub struct Optimistic<T, P> {
    confirmed: T,
    pending: Vec<(MutationToken, P)>,
}

impl<T, P> Optimistic<T, P>
where
    T: Clone,
    P: Patch<T>,
{
    #[must_use]
    pub const fn new(confirmed: T) -> Self {
        Self {
            confirmed,
            pending: Vec::new(),
        }
    }

    /// Last confirmed server state, without pending patches.
    #[must_use]
    pub const fn confirmed(&self) -> &T {
        &self.confirmed
    }

    /// Project the visible value: confirmed reduced by every pending patch
    /// in arrival order.
    #[must_use]
    pub fn current(&self) -> T {
        let mut value = self.confirmed.clone();
        for (_, patch) in &self.pending {
            patch.apply(&mut value);
        }
        value
    }

    /// Queue a patch for immediate local visibility. The caller dispatches
    /// the corresponding server request separately; this store never owns
    /// network I/O.
    pub fn apply(&mut self, token: MutationToken, patch: P) {
        self.pending.push((token, patch));
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn has_pending(&self, token: MutationToken) -> bool {
        self.pending.iter().any(|(t, _)| *t == token)
    }

    /// Retire a successfully settled patch: fold it into `confirmed` and
    /// drop it from the queue. Folding first keeps the retirement invisible
    /// to the renderer.
    ///
    /// Returns `false` when the token is unknown (already retired or
    /// discarded by a rebase).
    pub fn settle_success(&mut self, token: MutationToken) -> bool {
        let Some(index) = self.pending.iter().position(|(t, _)| *t == token) else {
            return false;
        };
        let (_, patch) = self.pending.remove(index);
        patch.apply(&mut self.confirmed);
        true
    }

    /// Record a failed settlement. The patch stays in the queue, so the
    /// optimistic value remains visible until the next rebase.
    ///
    /// Returns `false` when the token is unknown.
    #[must_use]
    pub fn settle_failure(&self, token: MutationToken) -> bool {
        self.has_pending(token)
    }

    /// Replace the confirmed base with a fresh server snapshot and discard
    /// every pending patch, resolved or not. Last full snapshot wins.
    pub fn rebase(&mut self, confirmed: T) {
        self.confirmed = confirmed;
        self.pending.clear();
    }

    /// Edit the confirmed base in place without touching the queue. Used
    /// when a settlement carries server-assigned state (a created entity)
    /// that was never expressed as an optimistic patch.
    pub fn amend_confirmed(&mut self, amend: impl FnOnce(&mut T)) {
        amend(&mut self.confirmed);
    }
}
