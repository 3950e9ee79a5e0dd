//! Field and side conditions

/// Weather conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weather {
    Sun,
    Rain,
    Sand,
    Hail,
    Snow,        // Gen 9 replacement for Hail
    HarshSun,    // Desolate Land
    HeavyRain,   // Primordial Sea
    StrongWinds, // Delta Stream
}

impl Weather {
    /// Parse from protocol string ("SunnyDay", "RainDance", "none", ...)
    pub fn from_protocol(s: &str) -> Option<Self> {
        match pilot_protocol::to_id(s).as_str() {
            "sunnyday" | "sun" => Some(Weather::Sun),
            "raindance" | "rain" => Some(Weather::Rain),
            "sandstorm" | "sand" => Some(Weather::Sand),
            "hail" => Some(Weather::Hail),
            "snow" | "snowscape" => Some(Weather::Snow),
            "desolateland" => Some(Weather::HarshSun),
            "primordialsea" => Some(Weather::HeavyRain),
            "deltastream" => Some(Weather::StrongWinds),
            _ => None,
        }
    }

    /// Get display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Weather::Sun => "Sun",
            Weather::Rain => "Rain",
            Weather::Sand => "Sandstorm",
            Weather::Hail => "Hail",
            Weather::Snow => "Snow",
            Weather::HarshSun => "Harsh Sun",
            Weather::HeavyRain => "Heavy Rain",
            Weather::StrongWinds => "Strong Winds",
        }
    }

    /// Battle text shown when this weather starts
    pub fn start_message(&self) -> &'static str {
        match self {
            Weather::Sun => "The sunlight turned harsh!",
            Weather::Rain => "It started to rain!",
            Weather::Sand => "A sandstorm kicked up!",
            Weather::Hail => "It started to hail!",
            Weather::Snow => "It started to snow!",
            Weather::HarshSun => "The sunlight turned extremely harsh!",
            Weather::HeavyRain => "A heavy rain began to fall!",
            Weather::StrongWinds => "Mysterious strong winds are protecting Flying-type Pokémon!",
        }
    }
}

impl std::fmt::Display for Weather {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terrain conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terrain {
    Electric,
    Grassy,
    Misty,
    Psychic,
}

impl Terrain {
    /// Parse from protocol string ("move: Electric Terrain", "Grassy Terrain")
    pub fn from_protocol(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        if lower.contains("electric") {
            Some(Terrain::Electric)
        } else if lower.contains("grassy") {
            Some(Terrain::Grassy)
        } else if lower.contains("misty") {
            Some(Terrain::Misty)
        } else if lower.contains("psychic") {
            Some(Terrain::Psychic)
        } else {
            None
        }
    }

    /// Get display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Terrain::Electric => "Electric Terrain",
            Terrain::Grassy => "Grassy Terrain",
            Terrain::Misty => "Misty Terrain",
            Terrain::Psychic => "Psychic Terrain",
        }
    }
}

impl std::fmt::Display for Terrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a side condition is tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionCategory {
    Hazard,
    Screen,
    Tailwind,
}

/// Side conditions the battle state tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SideCondition {
    // Entry hazards
    Spikes,      // Stackable 1-3
    ToxicSpikes, // Stackable 1-2
    StealthRock,
    StickyWeb,

    // Screens
    Reflect,
    LightScreen,
    AuroraVeil,

    Tailwind,
}

impl SideCondition {
    /// Look a condition up in the closed table; anything else is untracked
    pub fn from_protocol(s: &str) -> Option<Self> {
        let clean = s.strip_prefix("move: ").unwrap_or(s);

        match pilot_protocol::to_id(clean).as_str() {
            "spikes" => Some(SideCondition::Spikes),
            "toxicspikes" => Some(SideCondition::ToxicSpikes),
            "stealthrock" => Some(SideCondition::StealthRock),
            "stickyweb" => Some(SideCondition::StickyWeb),
            "reflect" => Some(SideCondition::Reflect),
            "lightscreen" => Some(SideCondition::LightScreen),
            "auroraveil" => Some(SideCondition::AuroraVeil),
            "tailwind" => Some(SideCondition::Tailwind),
            _ => None,
        }
    }

    pub fn category(&self) -> ConditionCategory {
        match self {
            SideCondition::Spikes
            | SideCondition::ToxicSpikes
            | SideCondition::StealthRock
            | SideCondition::StickyWeb => ConditionCategory::Hazard,
            SideCondition::Reflect | SideCondition::LightScreen | SideCondition::AuroraVeil => {
                ConditionCategory::Screen
            }
            SideCondition::Tailwind => ConditionCategory::Tailwind,
        }
    }

    /// Get maximum layers for this condition
    pub fn max_layers(&self) -> usize {
        match self {
            SideCondition::Spikes => 3,
            SideCondition::ToxicSpikes => 2,
            _ => 1,
        }
    }

    /// Get display name
    pub fn as_str(&self) -> &'static str {
        match self {
            SideCondition::Spikes => "Spikes",
            SideCondition::ToxicSpikes => "Toxic Spikes",
            SideCondition::StealthRock => "Stealth Rock",
            SideCondition::StickyWeb => "Sticky Web",
            SideCondition::Reflect => "Reflect",
            SideCondition::LightScreen => "Light Screen",
            SideCondition::AuroraVeil => "Aurora Veil",
            SideCondition::Tailwind => "Tailwind",
        }
    }
}

impl std::fmt::Display for SideCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_from_protocol() {
        assert_eq!(Weather::from_protocol("SunnyDay"), Some(Weather::Sun));
        assert_eq!(Weather::from_protocol("RainDance"), Some(Weather::Rain));
        assert_eq!(Weather::from_protocol("Sandstorm"), Some(Weather::Sand));
        assert_eq!(Weather::from_protocol("Snow"), Some(Weather::Snow));
        assert_eq!(
            Weather::from_protocol("DesolateLand"),
            Some(Weather::HarshSun)
        );
        assert_eq!(Weather::from_protocol("none"), None);
    }

    #[test]
    fn test_weather_start_message() {
        assert_eq!(Weather::Rain.start_message(), "It started to rain!");
        assert_eq!(Weather::Sand.start_message(), "A sandstorm kicked up!");
    }

    #[test]
    fn test_terrain_from_protocol() {
        assert_eq!(
            Terrain::from_protocol("move: Electric Terrain"),
            Some(Terrain::Electric)
        );
        assert_eq!(
            Terrain::from_protocol("Psychic Terrain"),
            Some(Terrain::Psychic)
        );
        assert_eq!(Terrain::from_protocol("Trick Room"), None);
    }

    #[test]
    fn test_side_condition_table() {
        assert_eq!(
            SideCondition::from_protocol("move: Stealth Rock"),
            Some(SideCondition::StealthRock)
        );
        assert_eq!(
            SideCondition::from_protocol("Toxic Spikes"),
            Some(SideCondition::ToxicSpikes)
        );
        assert_eq!(SideCondition::from_protocol("Safeguard"), None);

        assert_eq!(
            SideCondition::StickyWeb.category(),
            ConditionCategory::Hazard
        );
        assert_eq!(
            SideCondition::AuroraVeil.category(),
            ConditionCategory::Screen
        );
        assert_eq!(
            SideCondition::Tailwind.category(),
            ConditionCategory::Tailwind
        );
    }

    #[test]
    fn test_side_condition_max_layers() {
        assert_eq!(SideCondition::Spikes.max_layers(), 3);
        assert_eq!(SideCondition::ToxicSpikes.max_layers(), 2);
        assert_eq!(SideCondition::StealthRock.max_layers(), 1);
    }
}
