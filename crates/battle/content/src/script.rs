//! Pre-recorded party commands, used for headless runs and replays.

use std::collections::{HashMap, VecDeque};

use battle_core::{ActionRequest, Battler, BattlerId, CommandProvider, Roster};

/// Plays back a fixed list of commands per battler.
///
/// Once a battler's list runs out the fallback provider, if any, decides for
/// it; without one the battler simply keeps waiting.
#[derive(Default)]
pub struct ScriptedCommands {
    pending: HashMap<BattlerId, VecDeque<ActionRequest>>,
    fallback: Option<Box<dyn CommandProvider>>,
}

impl ScriptedCommands {
    pub fn new(requests: impl IntoIterator<Item = ActionRequest>) -> Self {
        let mut script = Self::default();
        for request in requests {
            script.push(request);
        }
        script
    }

    pub fn push(&mut self, request: ActionRequest) {
        self.pending.entry(request.source).or_default().push_back(request);
    }

    #[must_use]
    pub fn with_fallback(mut self, provider: impl CommandProvider + 'static) -> Self {
        self.fallback = Some(Box::new(provider));
        self
    }

    /// Commands not played back yet.
    pub fn remaining(&self) -> usize {
        self.pending.values().map(VecDeque::len).sum()
    }
}

impl CommandProvider for ScriptedCommands {
    fn select(&mut self, battler: &Battler, roster: &Roster) -> Option<ActionRequest> {
        if let Some(request) = self
            .pending
            .get_mut(&battler.id)
            .and_then(VecDeque::pop_front)
        {
            return Some(request);
        }
        self.fallback.as_mut()?.select(battler, roster)
    }
}
