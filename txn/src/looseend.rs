use std::collections::VecDeque;

use protocol::rpc::looseend::LooseEndAction;

/// Drains the deferred log actions a `_WITH_CLIENT_LOOSE_ENDS` commit or
/// abort leaves behind (§4.6, GLOSSARY "Loose-end action"). The server
/// hands these back one at a time via `get_first_*`/`get_next_*`; this
/// queues what's been fetched so far and tracks whether the drain has
/// reached the end, so repeated calls after the queue is already empty
/// are a cheap no-op rather than a fresh round-trip (property 6:
/// idempotent re-invocation).
#[derive(Debug, Default)]
pub struct LooseEndRegistry {
    pending: VecDeque<LooseEndAction>,
    exhausted: bool,
    /// Whether any fetch round trip has happened yet this drain: the
    /// first one must call `get_first_*`, every subsequent one
    /// `get_next_*`.
    primed: bool,
}

impl LooseEndRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted && self.pending.is_empty()
    }

    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Feeds one fetched action (or `None` for "no more") into the
    /// registry; `txn::manager` calls this once per
    /// `get_first_*`/`get_next_*` round trip.
    pub fn push_fetched(&mut self, action: Option<LooseEndAction>) {
        self.primed = true;
        match action {
            Some(a) => self.pending.push_back(a),
            None => self.exhausted = true,
        }
    }

    /// Takes the next queued action to run, if any. Running an action is
    /// the caller's job (`rcvindex`-keyed dispatch lives outside this
    /// registry, per the closed catalogue in spec.md GLOSSARY); this
    /// type only owns the fetch/queue bookkeeping.
    pub fn take_next(&mut self) -> Option<LooseEndAction> {
        self.pending.pop_front()
    }

    pub fn reset(&mut self) {
        self.pending.clear();
        self.exhausted = false;
        self.primed = false;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn action(rcvindex: i32) -> LooseEndAction {
        LooseEndAction {
            rcvindex,
            payload: vec![],
        }
    }

    #[test]
    fn drains_in_fetch_order_and_settles_exhausted() {
        let mut reg = LooseEndRegistry::new();
        assert!(!reg.is_exhausted());

        reg.push_fetched(Some(action(1)));
        reg.push_fetched(Some(action(2)));
        reg.push_fetched(None);

        assert_eq!(reg.take_next().unwrap().rcvindex, 1);
        assert_eq!(reg.take_next().unwrap().rcvindex, 2);
        assert!(reg.take_next().is_none());
        assert!(reg.is_exhausted());
    }

    #[test]
    fn repeated_drain_after_exhausted_is_noop() {
        let mut reg = LooseEndRegistry::new();
        reg.push_fetched(None);
        assert!(reg.take_next().is_none());
        assert!(reg.take_next().is_none());
        assert!(reg.is_exhausted());
    }
}
