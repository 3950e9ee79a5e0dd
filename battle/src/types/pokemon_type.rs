//! Pokemon types and the type effectiveness chart

/// Pokemon types (18 types as of Gen 6+)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}

/// How one attacking type relates to defending types
struct Relations {
    super_effective: &'static [Type],
    not_very_effective: &'static [Type],
    no_effect: &'static [Type],
}

impl Type {
    /// All 18 Pokemon types
    pub const ALL: [Type; 18] = [
        Type::Normal,
        Type::Fire,
        Type::Water,
        Type::Electric,
        Type::Grass,
        Type::Ice,
        Type::Fighting,
        Type::Poison,
        Type::Ground,
        Type::Flying,
        Type::Psychic,
        Type::Bug,
        Type::Rock,
        Type::Ghost,
        Type::Dragon,
        Type::Dark,
        Type::Steel,
        Type::Fairy,
    ];

    fn relations(&self) -> Relations {
        use Type::*;

        let (super_effective, not_very_effective, no_effect): (
            &'static [Type],
            &'static [Type],
            &'static [Type],
        ) = match self {
            Normal => (&[], &[Rock, Steel], &[Ghost]),
            Fire => (&[Grass, Ice, Bug, Steel], &[Fire, Water, Rock, Dragon], &[]),
            Water => (&[Fire, Ground, Rock], &[Water, Grass, Dragon], &[]),
            Electric => (&[Water, Flying], &[Electric, Grass, Dragon], &[Ground]),
            Grass => (
                &[Water, Ground, Rock],
                &[Fire, Grass, Poison, Flying, Bug, Dragon, Steel],
                &[],
            ),
            Ice => (&[Grass, Ground, Flying, Dragon], &[Fire, Water, Ice, Steel], &[]),
            Fighting => (
                &[Normal, Ice, Rock, Dark, Steel],
                &[Poison, Flying, Psychic, Bug, Fairy],
                &[Ghost],
            ),
            Poison => (&[Grass, Fairy], &[Poison, Ground, Rock, Ghost], &[Steel]),
            Ground => (
                &[Fire, Electric, Poison, Rock, Steel],
                &[Grass, Bug],
                &[Flying],
            ),
            Flying => (&[Grass, Fighting, Bug], &[Electric, Rock, Steel], &[]),
            Psychic => (&[Fighting, Poison], &[Psychic, Steel], &[Dark]),
            Bug => (
                &[Grass, Psychic, Dark],
                &[Fire, Fighting, Poison, Flying, Ghost, Steel, Fairy],
                &[],
            ),
            Rock => (&[Fire, Ice, Flying, Bug], &[Fighting, Ground, Steel], &[]),
            Ghost => (&[Psychic, Ghost], &[Dark], &[Normal]),
            Dragon => (&[Dragon], &[Steel], &[Fairy]),
            Dark => (&[Psychic, Ghost], &[Fighting, Dark, Fairy], &[]),
            Steel => (&[Ice, Rock, Fairy], &[Fire, Water, Electric, Steel], &[]),
            Fairy => (&[Fighting, Dragon, Dark], &[Fire, Poison, Steel], &[]),
        };

        Relations {
            super_effective,
            not_very_effective,
            no_effect,
        }
    }

    /// Get type effectiveness against a single defending type
    pub fn effectiveness(&self, defender: Type) -> f32 {
        let relations = self.relations();
        if relations.no_effect.contains(&defender) {
            0.0
        } else if relations.super_effective.contains(&defender) {
            2.0
        } else if relations.not_very_effective.contains(&defender) {
            0.5
        } else {
            1.0
        }
    }

    /// Get type effectiveness against multiple defending types (multiplied)
    pub fn effectiveness_multi(&self, defenders: &[Type]) -> f32 {
        defenders.iter().map(|t| self.effectiveness(*t)).product()
    }

    /// Parse a type name (case-insensitive)
    pub fn from_protocol(s: &str) -> Option<Self> {
        Type::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Type::Normal => "Normal",
            Type::Fire => "Fire",
            Type::Water => "Water",
            Type::Electric => "Electric",
            Type::Grass => "Grass",
            Type::Ice => "Ice",
            Type::Fighting => "Fighting",
            Type::Poison => "Poison",
            Type::Ground => "Ground",
            Type::Flying => "Flying",
            Type::Psychic => "Psychic",
            Type::Bug => "Bug",
            Type::Rock => "Rock",
            Type::Ghost => "Ghost",
            Type::Dragon => "Dragon",
            Type::Dark => "Dark",
            Type::Steel => "Steel",
            Type::Fairy => "Fairy",
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_effectiveness_single() {
        assert_eq!(Type::Fire.effectiveness(Type::Grass), 2.0);
        assert_eq!(Type::Fire.effectiveness(Type::Water), 0.5);
        assert_eq!(Type::Fire.effectiveness(Type::Normal), 1.0);
        assert_eq!(Type::Normal.effectiveness(Type::Ghost), 0.0);
        assert_eq!(Type::Electric.effectiveness(Type::Ground), 0.0);
        assert_eq!(Type::Dragon.effectiveness(Type::Fairy), 0.0);
        assert_eq!(Type::Poison.effectiveness(Type::Steel), 0.0);
    }

    #[test]
    fn test_type_effectiveness_multi() {
        assert_eq!(
            Type::Fire.effectiveness_multi(&[Type::Grass, Type::Steel]),
            4.0
        );
        assert_eq!(
            Type::Fire.effectiveness_multi(&[Type::Water, Type::Rock]),
            0.25
        );
        assert_eq!(
            Type::Ground.effectiveness_multi(&[Type::Flying, Type::Steel]),
            0.0
        );
    }

    #[test]
    fn test_type_from_protocol() {
        assert_eq!(Type::from_protocol("Fire"), Some(Type::Fire));
        assert_eq!(Type::from_protocol("fairy"), Some(Type::Fairy));
        assert_eq!(Type::from_protocol("Stellar"), None);
    }
}
