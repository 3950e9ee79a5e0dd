//! Stat stages and revealed battle stats

use pilot_protocol::Stat;

const ALL_STATS: [Stat; 7] = [
    Stat::Atk,
    Stat::Def,
    Stat::Spa,
    Stat::Spd,
    Stat::Spe,
    Stat::Accuracy,
    Stat::Evasion,
];

/// Stat stages (-6 to +6)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StatStages {
    pub atk: i8,
    pub def: i8,
    pub spa: i8,
    pub spd: i8,
    pub spe: i8,
    pub accuracy: i8,
    pub evasion: i8,
}

impl StatStages {
    /// Create new stat stages (all at 0)
    pub fn new() -> Self {
        Self::default()
    }

    /// Get stage for a stat
    pub fn get(&self, stat: Stat) -> i8 {
        match stat {
            Stat::Atk => self.atk,
            Stat::Def => self.def,
            Stat::Spa => self.spa,
            Stat::Spd => self.spd,
            Stat::Spe => self.spe,
            Stat::Accuracy => self.accuracy,
            Stat::Evasion => self.evasion,
        }
    }

    /// Set stage for a stat (clamped to -6..+6)
    pub fn set(&mut self, stat: Stat, value: i8) {
        let clamped = value.clamp(-6, 6);
        let slot = match stat {
            Stat::Atk => &mut self.atk,
            Stat::Def => &mut self.def,
            Stat::Spa => &mut self.spa,
            Stat::Spd => &mut self.spd,
            Stat::Spe => &mut self.spe,
            Stat::Accuracy => &mut self.accuracy,
            Stat::Evasion => &mut self.evasion,
        };
        *slot = clamped;
    }

    /// Apply a boost to a stat, returns actual change applied
    pub fn boost(&mut self, stat: Stat, amount: i8) -> i8 {
        let current = self.get(stat);
        let new_value = current.saturating_add(amount).clamp(-6, 6);
        self.set(stat, new_value);
        new_value - current
    }

    /// Reset all stages to 0
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Check if all stats are at 0
    pub fn is_clear(&self) -> bool {
        *self == Self::default()
    }

    /// Stats with a non-zero stage, in display order
    pub fn changed(&self) -> Vec<(Stat, i8)> {
        ALL_STATS
            .iter()
            .map(|&stat| (stat, self.get(stat)))
            .filter(|(_, stage)| *stage != 0)
            .collect()
    }
}

/// Battle stats revealed by a request (our own side only)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BattleStats {
    pub hp: u32,
    pub atk: u32,
    pub def: u32,
    pub spa: u32,
    pub spd: u32,
    pub spe: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stages_are_zero() {
        let stages = StatStages::new();
        assert!(stages.is_clear());
        assert!(stages.changed().is_empty());
    }

    #[test]
    fn test_set_clamps_to_bounds() {
        let mut stages = StatStages::new();
        stages.set(Stat::Atk, 10);
        assert_eq!(stages.atk, 6);

        stages.set(Stat::Def, -10);
        assert_eq!(stages.def, -6);
    }

    #[test]
    fn test_boost_reports_applied_change() {
        let mut stages = StatStages::new();
        assert_eq!(stages.boost(Stat::Atk, 2), 2);

        stages.atk = 5;
        assert_eq!(stages.boost(Stat::Atk, 3), 1);
        assert_eq!(stages.boost(Stat::Atk, 1), 0);

        stages.spe = -5;
        assert_eq!(stages.boost(Stat::Spe, -2), -1);
        assert_eq!(stages.spe, -6);
    }

    #[test]
    fn test_changed_in_display_order() {
        let mut stages = StatStages::new();
        stages.set(Stat::Spe, -1);
        stages.set(Stat::Atk, 2);

        assert_eq!(stages.changed(), vec![(Stat::Atk, 2), (Stat::Spe, -1)]);

        stages.clear();
        assert!(stages.is_clear());
    }
}
