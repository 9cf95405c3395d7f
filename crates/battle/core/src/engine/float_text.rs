//! Short-lived overlays drawn above battlers (damage numbers, "Miss").

use crate::state::ScreenPosition;

/// Palette index used for a floating text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum FloatColor {
    Damage,
    Heal,
    Miss,
    Critical,
}

/// One overlay with its own countdown.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FloatText {
    pub position: ScreenPosition,
    pub color: FloatColor,
    pub text: String,
    pub remaining_time: u32,
}

/// Owns every live floating text.
#[derive(Clone, Debug, Default)]
pub struct FloatTextManager {
    texts: Vec<FloatText>,
    lifetime: u32,
}

impl FloatTextManager {
    pub fn new(lifetime: u32) -> Self {
        Self {
            texts: Vec::new(),
            lifetime: lifetime.max(1),
        }
    }

    pub fn draw_float_text(
        &mut self,
        position: ScreenPosition,
        color: FloatColor,
        text: impl Into<String>,
    ) {
        self.texts.push(FloatText {
            position,
            color,
            text: text.into(),
            remaining_time: self.lifetime,
        });
    }

    /// Counts one frame down on every entry and drops the expired ones.
    pub fn update(&mut self) {
        for text in &mut self.texts {
            text.remaining_time = text.remaining_time.saturating_sub(1);
        }
        self.texts.retain(|t| t.remaining_time > 0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &FloatText> {
        self.texts.iter()
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}
