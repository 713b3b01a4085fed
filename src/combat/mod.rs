//! Combat primitives
//!
//! Stats, damage events, and the rules that turn a hit into a reaction.

mod damage;
mod resolution;
mod stat;

pub use damage::{Damage, Damageable};
pub use resolution::{HitOutcome, Knockback, Posture, resolve_hit};
pub use stat::Stat;
