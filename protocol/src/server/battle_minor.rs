//! Minor battle action message parsers
//!
//! These are secondary effects in battle: damage, stat changes, status, etc.
//! In the official client, they're usually displayed in smaller font.

use super::battle::{parse_hp_status, parse_pokemon, parse_stat, Pokemon, Side};
use super::{find_from_tag, ServerMessage};
use anyhow::Result;

fn required(parts: &[&str], index: usize, what: &str) -> Result<String> {
    parts
        .get(index)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Missing {}", what))
}

fn parse_side(parts: &[&str], index: usize) -> Result<Side> {
    parts
        .get(index)
        .and_then(|s| Side::parse(s))
        .ok_or_else(|| anyhow::anyhow!("Missing side"))
}

fn parse_amount(parts: &[&str], index: usize) -> Result<i8> {
    parts
        .get(index)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| anyhow::anyhow!("Missing amount"))
}

/// Parse |-damage|POKEMON|HP STATUS
pub fn parse_damage(parts: &[&str]) -> Result<ServerMessage> {
    let pokemon = parse_pokemon(parts, 2)?;
    let hp_status = parse_hp_status(parts, 3);
    let from = find_from_tag(parts, 4);

    Ok(ServerMessage::Damage {
        pokemon,
        hp_status,
        from,
    })
}

/// Parse |-heal|POKEMON|HP STATUS
pub fn parse_heal(parts: &[&str]) -> Result<ServerMessage> {
    let pokemon = parse_pokemon(parts, 2)?;
    let hp_status = parse_hp_status(parts, 3);
    let from = find_from_tag(parts, 4);

    Ok(ServerMessage::Heal {
        pokemon,
        hp_status,
        from,
    })
}

/// Parse |-sethp|POKEMON|HP
pub fn parse_sethp(parts: &[&str]) -> Result<ServerMessage> {
    let pokemon = parse_pokemon(parts, 2)?;
    let hp_status = parse_hp_status(parts, 3);

    Ok(ServerMessage::SetHp { pokemon, hp_status })
}

/// Parse |-status|POKEMON|STATUS
pub fn parse_status(parts: &[&str]) -> Result<ServerMessage> {
    let pokemon = parse_pokemon(parts, 2)?;
    let status = required(parts, 3, "status")?;

    Ok(ServerMessage::Status { pokemon, status })
}

/// Parse |-curestatus|POKEMON|STATUS
pub fn parse_curestatus(parts: &[&str]) -> Result<ServerMessage> {
    let pokemon = parse_pokemon(parts, 2)?;
    let status = parts.get(3).unwrap_or(&"").to_string();

    Ok(ServerMessage::CureStatus { pokemon, status })
}

/// Parse |-cureteam|POKEMON
pub fn parse_cureteam(parts: &[&str]) -> Result<ServerMessage> {
    let pokemon = parse_pokemon(parts, 2)?;
    Ok(ServerMessage::CureTeam(pokemon))
}

/// Parse |-boost|POKEMON|STAT|AMOUNT
pub fn parse_boost(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::Boost {
        pokemon: parse_pokemon(parts, 2)?,
        stat: parse_stat(parts, 3)?,
        amount: parse_amount(parts, 4)?,
    })
}

/// Parse |-unboost|POKEMON|STAT|AMOUNT
pub fn parse_unboost(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::Unboost {
        pokemon: parse_pokemon(parts, 2)?,
        stat: parse_stat(parts, 3)?,
        amount: parse_amount(parts, 4)?,
    })
}

/// Parse |-setboost|POKEMON|STAT|AMOUNT
pub fn parse_setboost(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::SetBoost {
        pokemon: parse_pokemon(parts, 2)?,
        stat: parse_stat(parts, 3)?,
        amount: parse_amount(parts, 4)?,
    })
}

/// Parse |-clearboost|POKEMON
pub fn parse_clearboost(parts: &[&str]) -> Result<ServerMessage> {
    let pokemon = parse_pokemon(parts, 2)?;
    Ok(ServerMessage::ClearBoost(pokemon))
}

/// Parse |-weather|WEATHER or |-weather|WEATHER|[upkeep]
pub fn parse_weather(parts: &[&str]) -> Result<ServerMessage> {
    let weather = required(parts, 2, "weather")?;
    let upkeep = parts.iter().skip(3).any(|part| *part == "[upkeep]");

    Ok(ServerMessage::Weather { weather, upkeep })
}

/// Parse |-fieldstart|CONDITION
pub fn parse_fieldstart(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::FieldStart(required(parts, 2, "field condition")?))
}

/// Parse |-fieldend|CONDITION
pub fn parse_fieldend(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::FieldEnd(required(parts, 2, "field condition")?))
}

/// Parse |-sidestart|SIDE|CONDITION
pub fn parse_sidestart(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::SideStart {
        side: parse_side(parts, 2)?,
        condition: required(parts, 3, "side condition")?,
    })
}

/// Parse |-sideend|SIDE|CONDITION
pub fn parse_sideend(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::SideEnd {
        side: parse_side(parts, 2)?,
        condition: required(parts, 3, "side condition")?,
    })
}

/// Parse |-start|POKEMON|EFFECT
pub fn parse_volatile_start(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::VolatileStart {
        pokemon: parse_pokemon(parts, 2)?,
        effect: required(parts, 3, "effect")?,
    })
}

/// Parse |-end|POKEMON|EFFECT
pub fn parse_volatile_end(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::VolatileEnd {
        pokemon: parse_pokemon(parts, 2)?,
        effect: required(parts, 3, "effect")?,
    })
}

/// Parse |-item|POKEMON|ITEM
pub fn parse_item(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::Item {
        pokemon: parse_pokemon(parts, 2)?,
        item: required(parts, 3, "item")?,
        from: find_from_tag(parts, 4),
    })
}

/// Parse |-enditem|POKEMON|ITEM
pub fn parse_enditem(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::EndItem {
        pokemon: parse_pokemon(parts, 2)?,
        item: required(parts, 3, "item")?,
        from: find_from_tag(parts, 4),
    })
}

/// Parse |-ability|POKEMON|ABILITY
pub fn parse_ability(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::Ability {
        pokemon: parse_pokemon(parts, 2)?,
        ability: required(parts, 3, "ability")?,
        from: find_from_tag(parts, 4),
    })
}

/// Parse |-terastallize|POKEMON|TYPE
pub fn parse_terastallize(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::Terastallize {
        pokemon: parse_pokemon(parts, 2)?,
        tera_type: required(parts, 3, "tera type")?,
    })
}

/// Parse |-crit|POKEMON
pub fn parse_crit(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::Crit(parse_pokemon(parts, 2)?))
}

/// Parse |-supereffective|POKEMON
pub fn parse_supereffective(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::SuperEffective(parse_pokemon(parts, 2)?))
}

/// Parse |-resisted|POKEMON
pub fn parse_resisted(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::Resisted(parse_pokemon(parts, 2)?))
}

/// Parse |-immune|POKEMON
pub fn parse_immune(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::Immune(parse_pokemon(parts, 2)?))
}

/// Parse |-miss|SOURCE|TARGET
pub fn parse_miss(parts: &[&str]) -> Result<ServerMessage> {
    let source = parse_pokemon(parts, 2)?;
    let target = parts.get(3).and_then(|s| Pokemon::parse(s));

    Ok(ServerMessage::Miss { source, target })
}

/// Parse |-fail|POKEMON|ACTION
pub fn parse_fail(parts: &[&str]) -> Result<ServerMessage> {
    let pokemon = parse_pokemon(parts, 2)?;
    let action = parts.get(3).map(|s| s.to_string());

    Ok(ServerMessage::Fail { pokemon, action })
}

/// Parse |-message|MESSAGE
pub fn parse_message(parts: &[&str]) -> Result<ServerMessage> {
    Ok(ServerMessage::Message(
        parts.get(2..).map(|p| p.join("|")).unwrap_or_default(),
    ))
}
