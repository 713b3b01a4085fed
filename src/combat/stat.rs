//! Bounded numeric stats
//!
//! Health, stamina and ammo all share the same shape: a current value kept
//! inside `[0, max]` that can be spent, restored and regenerated over time.

use serde::{Deserialize, Serialize};

/// A consumable value clamped to `[0, max]` with optional regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    /// Current value
    current: f32,
    /// Upper bound
    max: f32,
    /// Units restored per second while the owner is alive
    #[serde(default)]
    regen_rate: f32,
    /// Value used by `initialize()`; `None` means start full
    #[serde(default)]
    start: Option<f32>,
}

impl Stat {
    /// Create a full stat with no regeneration.
    #[must_use]
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self {
            current: max,
            max,
            regen_rate: 0.0,
            start: None,
        }
    }

    /// Set the regeneration rate (units per second).
    #[must_use]
    pub fn with_regen(mut self, regen_rate: f32) -> Self {
        self.regen_rate = regen_rate.max(0.0);
        self
    }

    /// Set the value `initialize()` resets to.
    #[must_use]
    pub fn with_start(mut self, start: f32) -> Self {
        self.start = Some(start);
        self.current = start.clamp(0.0, self.max);
        self
    }

    /// Reset to the configured start value (or max).
    pub fn initialize(&mut self) {
        self.current = self.start.unwrap_or(self.max).clamp(0.0, self.max);
    }

    /// `current = max(0, current - amount)`
    pub fn decrease(&mut self, amount: f32) {
        self.current = (self.current - amount.max(0.0)).max(0.0);
    }

    /// `current = min(max, current + amount)`
    pub fn increase(&mut self, amount: f32) {
        self.current = (self.current + amount.max(0.0)).min(self.max);
    }

    /// Spend `amount` if available.
    ///
    /// Returns `false` and leaves the value untouched when `amount > current`.
    pub fn try_consume(&mut self, amount: f32) -> bool {
        if self.current < amount {
            return false;
        }
        self.decrease(amount);
        true
    }

    /// Regenerate for `dt` seconds.
    pub fn regenerate(&mut self, dt: f32) {
        if self.regen_rate > 0.0 && dt > 0.0 {
            self.increase(self.regen_rate * dt);
        }
    }

    /// Current value
    #[must_use]
    #[inline]
    pub fn value(&self) -> f32 {
        self.current
    }

    /// Maximum value
    #[must_use]
    #[inline]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Regeneration per second
    #[must_use]
    #[inline]
    pub fn regen_rate(&self) -> f32 {
        self.regen_rate
    }

    /// Fraction of max in `[0, 1]`
    #[must_use]
    pub fn ratio(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }

    /// True when the value has reached zero.
    #[must_use]
    #[inline]
    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }
}

impl Default for Stat {
    fn default() -> Self {
        Self::new(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_to_max_or_start() {
        let mut full = Stat::new(100.0);
        full.decrease(40.0);
        full.initialize();
        assert_eq!(full.value(), 100.0);

        let mut partial = Stat::new(100.0).with_start(30.0);
        partial.increase(50.0);
        partial.initialize();
        assert_eq!(partial.value(), 30.0);
    }

    #[test]
    fn test_decrease_then_increase_restores_value() {
        let mut stat = Stat::new(100.0).with_start(60.0);
        stat.decrease(25.0);
        stat.increase(25.0);
        assert_eq!(stat.value(), 60.0);
    }

    #[test]
    fn test_try_consume_rejects_overdraw() {
        let mut ammo = Stat::new(10.0).with_start(3.0);
        assert!(!ammo.try_consume(4.0));
        assert_eq!(ammo.value(), 3.0, "failed consume must not change value");

        assert!(ammo.try_consume(3.0));
        assert_eq!(ammo.value(), 0.0);
    }

    #[test]
    fn test_regenerate_caps_at_max() {
        let mut stamina = Stat::new(100.0).with_start(95.0).with_regen(20.0);
        stamina.regenerate(1.0);
        assert_eq!(stamina.value(), 100.0);
    }

    #[test]
    fn test_negative_amounts_are_ignored() {
        let mut stat = Stat::new(10.0).with_start(5.0);
        stat.decrease(-3.0);
        stat.increase(-3.0);
        assert_eq!(stat.value(), 5.0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Decrease(f32),
        Increase(f32),
        Consume(f32),
        Regenerate(f32),
        Initialize,
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (-50.0f32..500.0).prop_map(Op::Decrease),
            (-50.0f32..500.0).prop_map(Op::Increase),
            (0.0f32..500.0).prop_map(Op::Consume),
            (0.0f32..10.0).prop_map(Op::Regenerate),
            Just(Op::Initialize),
        ]
    }

    fn arb_stat() -> impl Strategy<Value = Stat> {
        let ranges = (0.0f32..1000.0, 0.0f32..1.0, 0.0f32..50.0, -100.0f32..1100.0);
        ranges.prop_map(|(max, fill, regen, start)| {
            let mut stat = Stat::new(max).with_regen(regen).with_start(start);
            stat.decrease(max * fill);
            stat
        })
    }

    proptest! {
        #[test]
        fn test_value_stays_in_bounds(
            mut stat in arb_stat(),
            ops in prop::collection::vec(arb_op(), 0..64),
        ) {
            for op in ops {
                match op {
                    Op::Decrease(amount) => stat.decrease(amount),
                    Op::Increase(amount) => stat.increase(amount),
                    Op::Consume(amount) => {
                        let before = stat.value();
                        if !stat.try_consume(amount) {
                            prop_assert_eq!(stat.value(), before);
                        }
                    }
                    Op::Regenerate(dt) => stat.regenerate(dt),
                    Op::Initialize => stat.initialize(),
                }
                prop_assert!(
                    stat.value() >= 0.0 && stat.value() <= stat.max(),
                    "value {} escaped [0, {}] after {:?}",
                    stat.value(),
                    stat.max(),
                    op
                );
            }
        }

        #[test]
        fn test_decrease_then_increase_round_trips(
            max in 1.0f32..1000.0,
            start in 0.0f32..1.0,
            share in 0.0f32..=1.0,
        ) {
            let mut stat = Stat::new(max).with_start(max * start);
            let before = stat.value();
            let amount = before * share;

            stat.decrease(amount);
            stat.increase(amount);

            prop_assert!(
                (stat.value() - before).abs() <= before.max(1.0) * 1e-5,
                "{} -> {} with amount {}",
                before,
                stat.value(),
                amount
            );
        }

        #[test]
        fn test_failed_consume_leaves_value(
            max in 0.0f32..1000.0,
            start in 0.0f32..1.0,
            excess in 0.001f32..100.0,
        ) {
            let mut stat = Stat::new(max).with_start(max * start);
            let before = stat.value();

            prop_assert!(!stat.try_consume(before + excess));
            prop_assert_eq!(stat.value(), before);
        }
    }
}
