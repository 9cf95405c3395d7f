//! Battle participants and their mutable state.
//!
//! The [`Roster`] is the single owner of every [`Battler`]. It is mutated only
//! by the scene's per-frame update, never concurrently.

mod battler;
mod common;
mod conditions;
mod roster;

pub use battler::{Battler, BattlerStats};
pub use common::{BattlerId, Facing, ResourceMeter, ScreenPosition, Side};
pub use conditions::{ActiveCondition, ConditionKind, ConditionSet};
pub use roster::{Roster, RosterError};
