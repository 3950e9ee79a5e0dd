//! Status conditions (volatile and non-volatile)

/// Major status ailment (persists through switching)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Burn,
    Freeze,
    Paralysis,
    Poison,
    BadPoison, // Toxic
    Sleep,
}

impl Status {
    /// Parse from protocol string ("brn", "frz", "par", "psn", "tox", "slp")
    pub fn from_protocol(s: &str) -> Option<Self> {
        match s {
            "brn" => Some(Status::Burn),
            "frz" => Some(Status::Freeze),
            "par" => Some(Status::Paralysis),
            "psn" => Some(Status::Poison),
            "tox" => Some(Status::BadPoison),
            "slp" => Some(Status::Sleep),
            _ => None,
        }
    }

    /// Protocol abbreviation
    pub fn to_protocol(&self) -> &'static str {
        match self {
            Status::Burn => "brn",
            Status::Freeze => "frz",
            Status::Paralysis => "par",
            Status::Poison => "psn",
            Status::BadPoison => "tox",
            Status::Sleep => "slp",
        }
    }

    /// Past participle used in battle text ("X was burned!")
    pub fn inflicted(&self) -> &'static str {
        match self {
            Status::Burn => "burned",
            Status::Freeze => "frozen",
            Status::Paralysis => "paralyzed",
            Status::Poison => "poisoned",
            Status::BadPoison => "badly poisoned",
            Status::Sleep => "put to sleep",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Status::Burn => "Burned",
            Status::Freeze => "Frozen",
            Status::Paralysis => "Paralyzed",
            Status::Poison => "Poisoned",
            Status::BadPoison => "Badly Poisoned",
            Status::Sleep => "Asleep",
        };
        f.write_str(name)
    }
}

/// Volatile conditions (cleared on switching)
///
/// Only the conditions that matter when weighing a decision get their own
/// variant. Everything else is kept verbatim in [`Volatile::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Volatile {
    Confusion,
    Taunt,
    Encore,
    Disable,
    Torment,
    Infatuation,
    LeechSeed,
    Substitute,
    PerishSong,
    Yawn,
    Trapped,
    PartialTrap,
    FocusEnergy,
    Charging,
    Recharging,
    LockedMove,
    Protosynthesis,
    QuarkDrive,
    FlashFire,
    SaltCure,
    TypeChange,
    Transformed,

    /// Any other `-start` effect, as sent by the server
    Other(String),
}

impl Volatile {
    /// Parse the effect of a `-start`/`-end` message
    pub fn from_protocol(s: &str) -> Self {
        let clean = s
            .strip_prefix("move: ")
            .or_else(|| s.strip_prefix("ability: "))
            .or_else(|| s.strip_prefix("item: "))
            .unwrap_or(s);

        match pilot_protocol::to_id(clean).as_str() {
            "confusion" => Volatile::Confusion,
            "taunt" => Volatile::Taunt,
            "encore" => Volatile::Encore,
            "disable" => Volatile::Disable,
            "torment" => Volatile::Torment,
            "attract" => Volatile::Infatuation,
            "leechseed" => Volatile::LeechSeed,
            "substitute" => Volatile::Substitute,
            "perish0" | "perish1" | "perish2" | "perish3" | "perishsong" => Volatile::PerishSong,
            "yawn" => Volatile::Yawn,
            "trapped" => Volatile::Trapped,
            "partiallytrapped" | "bind" | "wrap" | "firespin" | "whirlpool" | "sandtomb"
            | "magmastorm" | "infestation" => Volatile::PartialTrap,
            "focusenergy" => Volatile::FocusEnergy,
            "twoturnmove" | "solarbeam" | "meteorbeam" | "electroshot" => Volatile::Charging,
            "mustrecharge" => Volatile::Recharging,
            "lockedmove" | "outrage" | "petaldance" | "thrash" => Volatile::LockedMove,
            "protosynthesis" | "protosynthesisatk" | "protosynthesisdef" | "protosynthesisspa"
            | "protosynthesisspd" | "protosynthesisspe" => Volatile::Protosynthesis,
            "quarkdrive" | "quarkdriveatk" | "quarkdrivedef" | "quarkdrivespa"
            | "quarkdrivespd" | "quarkdrivespe" => Volatile::QuarkDrive,
            "flashfire" => Volatile::FlashFire,
            "saltcure" => Volatile::SaltCure,
            "typechange" => Volatile::TypeChange,
            "transform" => Volatile::Transformed,
            _ => Volatile::Other(clean.to_string()),
        }
    }

    /// Display name
    pub fn as_str(&self) -> &str {
        match self {
            Volatile::Confusion => "Confusion",
            Volatile::Taunt => "Taunt",
            Volatile::Encore => "Encore",
            Volatile::Disable => "Disable",
            Volatile::Torment => "Torment",
            Volatile::Infatuation => "Infatuation",
            Volatile::LeechSeed => "Leech Seed",
            Volatile::Substitute => "Substitute",
            Volatile::PerishSong => "Perish Song",
            Volatile::Yawn => "Yawn",
            Volatile::Trapped => "Trapped",
            Volatile::PartialTrap => "Partially Trapped",
            Volatile::FocusEnergy => "Focus Energy",
            Volatile::Charging => "Charging",
            Volatile::Recharging => "Recharging",
            Volatile::LockedMove => "Locked Move",
            Volatile::Protosynthesis => "Protosynthesis",
            Volatile::QuarkDrive => "Quark Drive",
            Volatile::FlashFire => "Flash Fire",
            Volatile::SaltCure => "Salt Cure",
            Volatile::TypeChange => "Type Change",
            Volatile::Transformed => "Transformed",
            Volatile::Other(s) => s.as_str(),
        }
    }
}

impl std::fmt::Display for Volatile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
