//! Status window that writes party and troop vitals to the log.

use std::collections::HashMap;

use battle_core::{BattlerId, Roster, StatusWindow};

/// Logs a battler's HP/SP line whenever it differs from the last refresh.
#[derive(Debug, Default)]
pub struct LogStatusWindow {
    last: HashMap<BattlerId, String>,
}

impl StatusWindow for LogStatusWindow {
    fn refresh(&mut self, roster: &Roster) {
        for battler in roster.iter() {
            let mut line = format!(
                "{:<10} HP {:>4}/{:<4} SP {:>3}/{:<3}",
                battler.name, battler.hp.current, battler.hp.maximum, battler.sp.current, battler.sp.maximum
            );
            if battler.is_dead() {
                line.push_str(" (down)");
            } else if battler.has_fled() {
                line.push_str(" (fled)");
            }
            for condition in battler.conditions.iter() {
                line.push(' ');
                line.push_str(&condition.kind.to_string());
            }

            if self.last.get(&battler.id) != Some(&line) {
                tracing::info!(side = %battler.side, "{}", line);
                self.last.insert(battler.id, line);
            }
        }
    }
}
