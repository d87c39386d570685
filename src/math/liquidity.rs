use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use bigdecimal::BigDecimal;
use num_traits::Zero;

use crate::error::DomainError;
use crate::math::precision::{decimal_from_f64, Precision};
use crate::math::tick_math::{check_tick, check_tick_spacing, rounded_tick};

/// Liquidity registered per tick-spacing bucket. A key `t` covers the
/// right-open price segment `[t, t + spacing)`.
#[derive(Clone, Debug, PartialEq)]
pub struct LiquidityProfile {
    tick_spacing: i32,
    ticks: BTreeMap<i32, BigDecimal>,
}

impl LiquidityProfile {
    pub fn new(tick_spacing: i32) -> Result<Self, DomainError> {
        check_tick_spacing(tick_spacing)?;
        Ok(Self { tick_spacing, ticks: BTreeMap::new() })
    }

    pub fn from_entries<I>(tick_spacing: i32, entries: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = (i32, BigDecimal)>,
    {
        let mut profile = Self::new(tick_spacing)?;
        for (tick, liquidity) in entries {
            profile.insert(tick, liquidity)?;
        }
        Ok(profile)
    }

    /// Build from external float amounts; the one place profile data crosses
    /// from `f64` into the decimal core.
    pub fn from_f64_entries(tick_spacing: i32, entries: &[(i32, f64)]) -> Result<Self, DomainError> {
        let converted = entries
            .iter()
            .map(|&(tick, liquidity)| decimal_from_f64(liquidity).map(|l| (tick, l)))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_entries(tick_spacing, converted)
    }

    /// Register `liquidity` at `tick`, replacing any previous amount.
    pub fn insert(&mut self, tick: i32, liquidity: BigDecimal) -> Result<Option<BigDecimal>, DomainError> {
        check_tick(tick)?;
        if tick % self.tick_spacing != 0 {
            return Err(DomainError::UnalignedTick { tick, spacing: self.tick_spacing });
        }
        if liquidity < BigDecimal::zero() {
            return Err(DomainError::NegativeAmount { what: "liquidity", value: liquidity.to_string() });
        }
        Ok(self.ticks.insert(tick, liquidity))
    }

    #[inline]
    pub fn tick_spacing(&self) -> i32 {
        self.tick_spacing
    }

    #[inline]
    pub fn get(&self, tick: i32) -> Option<&BigDecimal> {
        self.ticks.get(&tick)
    }

    /// Liquidity registered exactly at `tick`, zero when uninitialized.
    pub fn liquidity_at(&self, tick: i32) -> BigDecimal {
        self.ticks.get(&tick).cloned().unwrap_or_else(BigDecimal::zero)
    }

    /// Largest initialized tick `<= tick`.
    pub fn floor_tick(&self, tick: i32) -> Option<i32> {
        self.ticks.range(..=tick).next_back().map(|(t, _)| *t)
    }

    /// Smallest initialized tick `>= tick`.
    pub fn ceiling_tick(&self, tick: i32) -> Option<i32> {
        self.ticks.range(tick..).next().map(|(t, _)| *t)
    }

    /// Largest initialized tick strictly below `tick`.
    pub fn prev_below(&self, tick: i32) -> Option<i32> {
        self.ticks.range(..tick).next_back().map(|(t, _)| *t)
    }

    /// Smallest initialized tick strictly above `tick`.
    pub fn next_above(&self, tick: i32) -> Option<i32> {
        self.ticks.range((Excluded(tick), Unbounded)).next().map(|(t, _)| *t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&i32, &BigDecimal)> {
        self.ticks.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}

/// Liquidity split at the bucket the price currently sits in.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveLiquidity {
    pub bucket: i32,
    pub passive: BigDecimal,
    pub jit: BigDecimal,
    pub total: BigDecimal,
}

/// Read-only union of the passive profile and the JIT position's profile.
#[derive(Clone, Copy, Debug)]
pub struct MergedLiquidity<'a> {
    passive: &'a LiquidityProfile,
    jit: &'a LiquidityProfile,
}

impl<'a> MergedLiquidity<'a> {
    pub fn new(passive: &'a LiquidityProfile, jit: &'a LiquidityProfile) -> Result<Self, DomainError> {
        if passive.tick_spacing != jit.tick_spacing {
            return Err(DomainError::TickSpacingMismatch { passive: passive.tick_spacing, jit: jit.tick_spacing });
        }
        Ok(Self { passive, jit })
    }

    #[inline]
    pub fn tick_spacing(&self) -> i32 {
        self.passive.tick_spacing
    }

    pub fn active_at(&self, tick: i32, ctx: &Precision) -> Result<ActiveLiquidity, DomainError> {
        let bucket = rounded_tick(tick, self.tick_spacing())?;
        let passive = self.passive.liquidity_at(bucket);
        let jit = self.jit.liquidity_at(bucket);
        let total = ctx.add(&passive, &jit);
        Ok(ActiveLiquidity { bucket, passive, jit, total })
    }

    /// Largest initialized tick strictly below `tick` on either side.
    pub fn prev_below(&self, tick: i32) -> Option<i32> {
        match (self.passive.prev_below(tick), self.jit.prev_below(tick)) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }

    /// Smallest initialized tick strictly above `tick` on either side.
    pub fn next_above(&self, tick: i32) -> Option<i32> {
        match (self.passive.next_above(tick), self.jit.next_above(tick)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Sorted union of initialized ticks from both sides.
    pub fn ticks(&self) -> Vec<i32> {
        let mut ticks: Vec<i32> = self.passive.ticks.keys().chain(self.jit.ticks.keys()).copied().collect();
        ticks.sort_unstable();
        ticks.dedup();
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(spacing: i32, entries: &[(i32, f64)]) -> LiquidityProfile {
        LiquidityProfile::from_f64_entries(spacing, entries).unwrap()
    }

    #[test]
    fn rejects_unaligned_and_negative_entries() {
        let mut p = LiquidityProfile::new(10).unwrap();
        assert_eq!(p.insert(15, BigDecimal::from(1)), Err(DomainError::UnalignedTick { tick: 15, spacing: 10 }));
        assert!(matches!(p.insert(10, BigDecimal::from(-1)), Err(DomainError::NegativeAmount { .. })));
        assert_eq!(LiquidityProfile::new(0), Err(DomainError::InvalidTickSpacing(0)));
        assert_eq!(p.insert(10, BigDecimal::from(3)).unwrap(), None);
        assert_eq!(p.insert(10, BigDecimal::from(4)).unwrap(), Some(BigDecimal::from(3)));
    }

    #[test]
    fn floor_and_ceiling_lookup() {
        let p = profile(10, &[(-20, 1.0), (0, 2.0), (30, 3.0)]);
        assert_eq!(p.floor_tick(5), Some(0));
        assert_eq!(p.floor_tick(0), Some(0));
        assert_eq!(p.floor_tick(-21), None);
        assert_eq!(p.ceiling_tick(1), Some(30));
        assert_eq!(p.ceiling_tick(31), None);
        assert_eq!(p.next_above(0), Some(30));
        assert_eq!(p.prev_below(0), Some(-20));
        assert_eq!(p.prev_below(-20), None);
    }

    #[test]
    fn merged_view_unions_and_sums() {
        let passive = profile(20, &[(0, 500_000.0), (20, 200_000.0)]);
        let jit = profile(20, &[(-40, 1.0), (0, 500_000.0)]);
        let merged = MergedLiquidity::new(&passive, &jit).unwrap();
        let ctx = Precision::default();

        let active = merged.active_at(7, &ctx).unwrap();
        assert_eq!(active.bucket, 0);
        assert_eq!(active.total, BigDecimal::from(1_000_000));

        let active = merged.active_at(25, &ctx).unwrap();
        assert_eq!(active.bucket, 20);
        assert!(active.jit.is_zero());

        assert_eq!(merged.prev_below(-1), Some(-40));
        assert_eq!(merged.prev_below(0), Some(-40));
        assert_eq!(merged.prev_below(1), Some(0));
        assert_eq!(merged.prev_below(-40), None);
        assert_eq!(merged.next_above(0), Some(20));
        assert_eq!(merged.next_above(20), None);
        assert_eq!(merged.ticks(), vec![-40, 0, 20]);
    }

    #[test]
    fn merged_view_requires_matching_spacing() {
        let passive = profile(20, &[]);
        let jit = profile(10, &[]);
        assert_eq!(
            MergedLiquidity::new(&passive, &jit).err(),
            Some(DomainError::TickSpacingMismatch { passive: 20, jit: 10 })
        );
    }
}
