//! Type matchup helpers for decision making

use crate::types::Type;

/// Defensive profile of a type combination against all 18 attacking types
#[derive(Debug, Clone, PartialEq)]
pub struct Matchup {
    /// Attacking types dealing more than 1x, with their multiplier
    pub weaknesses: Vec<(Type, f32)>,

    /// Attacking types dealing between 0x and 1x, with their multiplier
    pub resistances: Vec<(Type, f32)>,

    /// Attacking types dealing no damage
    pub immunities: Vec<Type>,
}

impl Matchup {
    /// Compute the profile of a defender with the given types
    pub fn defending(defender_types: &[Type]) -> Self {
        let mut matchup = Matchup {
            weaknesses: Vec::new(),
            resistances: Vec::new(),
            immunities: Vec::new(),
        };

        if defender_types.is_empty() {
            return matchup;
        }

        for attacker in Type::ALL {
            let multiplier = attacker.effectiveness_multi(defender_types);
            if multiplier == 0.0 {
                matchup.immunities.push(attacker);
            } else if multiplier > 1.0 {
                matchup.weaknesses.push((attacker, multiplier));
            } else if multiplier < 1.0 {
                matchup.resistances.push((attacker, multiplier));
            }
        }

        matchup
    }

    /// One-line summary, e.g. "Weak to: Ground (2x) | Resists: Fire (0.5x) | Immune to: none"
    pub fn describe(&self) -> String {
        fn list(entries: &[(Type, f32)]) -> String {
            if entries.is_empty() {
                return "none".to_string();
            }
            entries
                .iter()
                .map(|(t, m)| format!("{} ({}x)", t, m))
                .collect::<Vec<_>>()
                .join(", ")
        }

        let immunities = if self.immunities.is_empty() {
            "none".to_string()
        } else {
            self.immunities
                .iter()
                .map(Type::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };

        format!(
            "Weak to: {} | Resists: {} | Immune to: {}",
            list(&self.weaknesses),
            list(&self.resistances),
            immunities
        )
    }
}

/// Best multiplier any of the attacking types achieves against the defender
pub fn best_effectiveness(attacking_types: &[Type], defender_types: &[Type]) -> Option<f32> {
    attacking_types
        .iter()
        .map(|t| t.effectiveness_multi(defender_types))
        .fold(None, |best, m| match best {
            Some(b) if b >= m => Some(b),
            _ => Some(m),
        })
}

/// Parse a list of type names, skipping anything unrecognized
pub fn parse_types<S: AsRef<str>>(names: &[S]) -> Vec<Type> {
    names
        .iter()
        .filter_map(|name| Type::from_protocol(name.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_type_profile() {
        let steel = Matchup::defending(&[Type::Steel]);
        let weak: Vec<Type> = steel.weaknesses.iter().map(|(t, _)| *t).collect();
        assert_eq!(weak, vec![Type::Fire, Type::Fighting, Type::Ground]);
        assert_eq!(steel.immunities, vec![Type::Poison]);
        assert!(steel.resistances.iter().any(|(t, _)| *t == Type::Fairy));
    }

    #[test]
    fn test_dual_type_profile() {
        // Water/Ground is only weak to Grass, at 4x
        let swampert = Matchup::defending(&[Type::Water, Type::Ground]);
        assert_eq!(swampert.weaknesses, vec![(Type::Grass, 4.0)]);
        assert_eq!(swampert.immunities, vec![Type::Electric]);
    }

    #[test]
    fn test_describe() {
        let ghost = Matchup::defending(&[Type::Ghost]);
        let text = ghost.describe();
        assert!(text.starts_with("Weak to: Ghost (2x), Dark (2x)"));
        assert!(text.ends_with("Immune to: Normal, Fighting"));

        assert_eq!(
            Matchup::defending(&[]).describe(),
            "Weak to: none | Resists: none | Immune to: none"
        );
    }

    #[test]
    fn test_best_effectiveness() {
        let attacking = [Type::Fire, Type::Ground];
        assert_eq!(
            best_effectiveness(&attacking, &[Type::Electric, Type::Steel]),
            Some(4.0)
        );
        assert_eq!(best_effectiveness(&[], &[Type::Water]), None);
    }

    #[test]
    fn test_parse_types() {
        assert_eq!(
            parse_types(&["Water", "Stellar", "ground"]),
            vec![Type::Water, Type::Ground]
        );
    }
}
