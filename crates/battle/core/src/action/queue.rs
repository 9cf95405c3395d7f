use std::collections::VecDeque;

use super::BattleAction;
use crate::state::BattlerId;

/// Actions chosen but not yet executed, in selection order.
#[derive(Clone, Debug, Default)]
pub struct ActionQueue {
    pending: VecDeque<BattleAction>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: BattleAction) {
        self.pending.push_back(action);
    }

    /// Inserts an action ahead of everything already queued.
    pub fn push_front(&mut self, action: BattleAction) {
        self.pending.push_front(action);
    }

    pub fn pop(&mut self) -> Option<BattleAction> {
        self.pending.pop_front()
    }

    /// Returns true if `source` already has an action waiting.
    pub fn has_source(&self, source: BattlerId) -> bool {
        self.pending.iter().any(|a| a.source == source)
    }

    /// Drops every queued action. Returns how many were discarded.
    pub fn discard_all(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BattleAction> {
        self.pending.iter()
    }
}
