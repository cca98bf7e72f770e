//! Timed status conditions and their stacking/refresh semantics
//!
//! A combatant holds at most one instance per tag: reapplying a tag
//! refreshes magnitude and duration instead of stacking a second copy.
//! Derived-stat queries sum additively across tags, so two different
//! sources of the same polarity (e.g. AttackUp and Blessed gear) still
//! combine through their distinct tags.

use serde::{Deserialize, Serialize};

/// Closed set of status conditions
///
/// Magnitude units vary by tag: flat points for attack/defense, percent
/// points for speed, per-turn HP for the recurring tags, and multiplier
/// fractions for Vulnerable/Protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusTag {
    AttackUp,
    AttackDown,
    DefenseUp,
    DefenseDown,
    SpeedUp,
    SpeedDown,
    Poison,
    Regeneration,
    Vulnerable,
    Protected,
    Blessed,
    Cursed,
}

impl StatusTag {
    /// Conditions removed by a cleanse or an interrupt revive
    pub fn is_negative(&self) -> bool {
        matches!(
            self,
            StatusTag::AttackDown
                | StatusTag::DefenseDown
                | StatusTag::SpeedDown
                | StatusTag::Poison
                | StatusTag::Vulnerable
                | StatusTag::Cursed
        )
    }

    /// Per-turn recurring effect, if the condition has one
    pub fn recurring(&self) -> Option<Recurring> {
        match self {
            StatusTag::Poison | StatusTag::Cursed => Some(Recurring::Damage),
            StatusTag::Regeneration | StatusTag::Blessed => Some(Recurring::Heal),
            _ => None,
        }
    }
}

/// What a recurring condition does on its turn tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurring {
    /// Deals magnitude damage, ignoring defense
    Damage,
    /// Heals magnitude HP
    Heal,
}

/// A live condition instance on a combatant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEffect {
    pub tag: StatusTag,
    pub magnitude: f32,
    pub remaining_turns: u32,
}

/// A condition scheduled to fire during a turn tick
///
/// Collected up front so recurring effects can mutate the owner without
/// holding a borrow of the status list.
#[derive(Debug, Clone)]
pub struct PendingTick {
    pub tag: StatusTag,
    pub magnitude: f32,
    pub expires: bool,
}

/// Insertion-ordered set of live conditions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusSet {
    effects: Vec<StatusEffect>,
}

impl StatusSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a condition, refreshing the existing instance if the tag is
    /// already present
    pub fn apply(&mut self, tag: StatusTag, magnitude: f32, duration: u32) {
        if let Some(existing) = self.effects.iter_mut().find(|e| e.tag == tag) {
            existing.magnitude = magnitude;
            existing.remaining_turns = duration;
        } else {
            self.effects.push(StatusEffect {
                tag,
                magnitude,
                remaining_turns: duration,
            });
        }
    }

    pub fn contains(&self, tag: StatusTag) -> bool {
        self.effects.iter().any(|e| e.tag == tag)
    }

    pub fn get(&self, tag: StatusTag) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.tag == tag)
    }

    /// Sum of magnitudes across all instances of a tag
    pub fn sum(&self, tag: StatusTag) -> f32 {
        self.effects
            .iter()
            .filter(|e| e.tag == tag)
            .map(|e| e.magnitude)
            .sum()
    }

    /// Decrement every condition's remaining turns and collect the ticks
    /// to fire, in insertion order
    ///
    /// Removal happens later via [`StatusSet::remove_expired`] so a
    /// condition's final tick still fires.
    pub fn begin_turn(&mut self) -> Vec<PendingTick> {
        self.effects
            .iter_mut()
            .map(|effect| {
                effect.remaining_turns = effect.remaining_turns.saturating_sub(1);
                PendingTick {
                    tag: effect.tag,
                    magnitude: effect.magnitude,
                    expires: effect.remaining_turns == 0,
                }
            })
            .collect()
    }

    /// Drop conditions whose remaining turns reached zero
    pub fn remove_expired(&mut self) {
        self.effects.retain(|e| e.remaining_turns > 0);
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    /// Remove negative conditions, returning the tags that were cleared
    pub fn clear_negative(&mut self) -> Vec<StatusTag> {
        let removed: Vec<StatusTag> = self
            .effects
            .iter()
            .filter(|e| e.tag.is_negative())
            .map(|e| e.tag)
            .collect();
        self.effects.retain(|e| !e.tag.is_negative());
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reapply_refreshes_instead_of_stacking() {
        let mut set = StatusSet::new();
        set.apply(StatusTag::Poison, 10.0, 3);
        set.apply(StatusTag::Poison, 15.0, 2);

        assert_eq!(set.len(), 1);
        let poison = set.get(StatusTag::Poison).unwrap();
        assert_eq!(poison.magnitude, 15.0);
        assert_eq!(poison.remaining_turns, 2);
    }

    #[test]
    fn test_distinct_tags_coexist() {
        let mut set = StatusSet::new();
        set.apply(StatusTag::AttackUp, 5.0, 3);
        set.apply(StatusTag::SpeedUp, 20.0, 3);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_begin_turn_preserves_insertion_order() {
        let mut set = StatusSet::new();
        set.apply(StatusTag::Regeneration, 8.0, 2);
        set.apply(StatusTag::Poison, 5.0, 2);
        set.apply(StatusTag::SpeedUp, 10.0, 2);

        let ticks = set.begin_turn();
        let tags: Vec<StatusTag> = ticks.iter().map(|t| t.tag).collect();
        assert_eq!(
            tags,
            vec![StatusTag::Regeneration, StatusTag::Poison, StatusTag::SpeedUp]
        );
    }

    #[test]
    fn test_duration_one_fires_then_expires() {
        let mut set = StatusSet::new();
        set.apply(StatusTag::Poison, 5.0, 1);

        let ticks = set.begin_turn();
        assert_eq!(ticks.len(), 1);
        assert!(ticks[0].expires, "final tick should still be collected");

        set.remove_expired();
        assert!(set.is_empty());
    }

    #[test]
    fn test_removal_only_after_tick() {
        let mut set = StatusSet::new();
        set.apply(StatusTag::Regeneration, 8.0, 2);

        let first = set.begin_turn();
        assert!(!first[0].expires);
        set.remove_expired();
        assert_eq!(set.len(), 1);

        let second = set.begin_turn();
        assert!(second[0].expires);
        set.remove_expired();
        assert!(set.is_empty());
    }

    #[test]
    fn test_clear_negative_keeps_positive() {
        let mut set = StatusSet::new();
        set.apply(StatusTag::Poison, 5.0, 3);
        set.apply(StatusTag::AttackUp, 4.0, 3);
        set.apply(StatusTag::Cursed, 6.0, 2);

        let removed = set.clear_negative();
        assert_eq!(removed, vec![StatusTag::Poison, StatusTag::Cursed]);
        assert_eq!(set.len(), 1);
        assert!(set.contains(StatusTag::AttackUp));
    }

    #[test]
    fn test_recurring_classification() {
        assert_eq!(StatusTag::Poison.recurring(), Some(Recurring::Damage));
        assert_eq!(StatusTag::Cursed.recurring(), Some(Recurring::Damage));
        assert_eq!(StatusTag::Regeneration.recurring(), Some(Recurring::Heal));
        assert_eq!(StatusTag::Blessed.recurring(), Some(Recurring::Heal));
        assert_eq!(StatusTag::AttackUp.recurring(), None);
    }
}
