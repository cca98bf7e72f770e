//! Battle system constants - all tunable values in one place

// Readiness gauge
pub const READINESS_MAX: f32 = 100.0;
pub const DEFAULT_TICK_SCALE: f32 = 1.0;
/// Upper bound for the random readiness offset combatants start with
pub const READINESS_SEED_MAX: f32 = 15.0;

// Damage
/// Floor applied after defense subtraction, before the multiplier
pub const MIN_DAMAGE: f32 = 1.0;
/// The damage multiplier never drops below this
pub const MIN_DAMAGE_MULTIPLIER: f32 = 0.1;

// Interrupt resolution
/// Fraction of max HP restored when a last-stand negotiation revives
pub const REVIVE_HP_FRACTION: f32 = 0.25;
