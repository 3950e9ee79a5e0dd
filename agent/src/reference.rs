//! Read-only reference data used to enrich prompts
//!
//! Lookups are by display name and normalized with [`to_id`], so
//! "Rotom-Wash", "rotomwash" and "Rotom Wash" all hit the same record.
//! A miss never fails a decision; the prompt just carries less context.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::Context;
use pilot_protocol::to_id;
use serde::Deserialize;

/// Sets a species runs with in random battles
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RandomBattleSet {
    pub level: Option<u8>,
    pub roles: Vec<String>,
    pub abilities: Vec<String>,
    pub items: Vec<String>,
    pub moves: Vec<String>,
    pub tera_types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpeciesRecord {
    pub name: String,
    pub types: Vec<String>,
    pub base_stats: BTreeMap<String, u32>,
    pub abilities: Vec<String>,
    pub roles: Vec<String>,
    pub random_battle: Option<RandomBattleSet>,
}

impl SpeciesRecord {
    /// All roles the species is known for, random battle roles first
    pub fn all_roles(&self) -> Vec<&str> {
        let mut roles: Vec<&str> = self
            .random_battle
            .iter()
            .flat_map(|set| set.roles.iter().map(String::as_str))
            .collect();
        for role in &self.roles {
            if !roles.contains(&role.as_str()) {
                roles.push(role);
            }
        }
        roles
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MoveRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub move_type: String,
    pub category: String,
    pub power: Option<u32>,
    pub accuracy: Option<u32>,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AbilityRecord {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ItemRecord {
    pub name: String,
    pub description: String,
}

/// Result of a reference lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Species(SpeciesRecord),
    Move(MoveRecord),
    Ability(AbilityRecord),
    Item(ItemRecord),
}

/// Lookup of static game data
pub trait ReferenceData: Send + Sync {
    /// Describe whatever `name` refers to, trying species, moves, abilities
    /// and items in that order
    fn describe(&self, name: &str) -> Option<Record>;

    fn species(&self, name: &str) -> Option<SpeciesRecord> {
        match self.describe(name)? {
            Record::Species(species) => Some(species),
            _ => None,
        }
    }

    fn move_info(&self, name: &str) -> Option<MoveRecord> {
        match self.describe(name)? {
            Record::Move(record) => Some(record),
            _ => None,
        }
    }
}

/// Reference data that knows nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReferenceData;

impl ReferenceData for NoReferenceData {
    fn describe(&self, _name: &str) -> Option<Record> {
        None
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReferenceDocument {
    species: HashMap<String, SpeciesRecord>,
    moves: HashMap<String, MoveRecord>,
    abilities: HashMap<String, AbilityRecord>,
    items: HashMap<String, ItemRecord>,
}

/// Reference data loaded from a JSON document
///
/// The document has `species`, `moves`, `abilities` and `items` maps.
/// Keys are re-normalized on load.
#[derive(Debug, Default)]
pub struct JsonReferenceData {
    species: HashMap<String, SpeciesRecord>,
    moves: HashMap<String, MoveRecord>,
    abilities: HashMap<String, AbilityRecord>,
    items: HashMap<String, ItemRecord>,
}

impl JsonReferenceData {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let doc: ReferenceDocument = serde_json::from_str(json).context("invalid reference data")?;

        Ok(Self {
            species: normalize_keys(doc.species),
            moves: normalize_keys(doc.moves),
            abilities: normalize_keys(doc.abilities),
            items: normalize_keys(doc.items),
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read reference data from {}", path.display()))?;
        let data = Self::from_json(&json)?;

        tracing::info!(
            path = %path.display(),
            species = data.species.len(),
            moves = data.moves.len(),
            abilities = data.abilities.len(),
            items = data.items.len(),
            "loaded reference data"
        );
        Ok(data)
    }

    pub fn ability(&self, name: &str) -> Option<&AbilityRecord> {
        self.abilities.get(&to_id(name))
    }

    pub fn item(&self, name: &str) -> Option<&ItemRecord> {
        self.items.get(&to_id(name))
    }
}

fn normalize_keys<T>(map: HashMap<String, T>) -> HashMap<String, T> {
    map.into_iter().map(|(key, value)| (to_id(&key), value)).collect()
}

impl ReferenceData for JsonReferenceData {
    fn describe(&self, name: &str) -> Option<Record> {
        let id = to_id(name);
        if let Some(species) = self.species.get(&id) {
            return Some(Record::Species(species.clone()));
        }
        if let Some(record) = self.moves.get(&id) {
            return Some(Record::Move(record.clone()));
        }
        if let Some(ability) = self.abilities.get(&id) {
            return Some(Record::Ability(ability.clone()));
        }
        self.items.get(&id).cloned().map(Record::Item)
    }

    // Direct lookups so a name shared by a move and an item still resolves
    fn species(&self, name: &str) -> Option<SpeciesRecord> {
        self.species.get(&to_id(name)).cloned()
    }

    fn move_info(&self, name: &str) -> Option<MoveRecord> {
        self.moves.get(&to_id(name)).cloned()
    }
}
