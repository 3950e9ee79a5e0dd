//! Battle summaries and oracle prompts

use std::fmt::Write as _;

use pilot_battle::query::{Matchup, best_effectiveness, parse_types};
use pilot_battle::{BattleState, Combatant, DecisionKind, SideCondition, SideState, Type};
use pilot_client::BattleConcluded;

use crate::command::{CommandError, Exclusions};
use crate::reference::ReferenceData;

/// Types a combatant currently has: its tera type once terastallized,
/// otherwise whatever the reference data lists for the species
fn combatant_types(combatant: &Combatant, reference: &dyn ReferenceData) -> Vec<Type> {
    if combatant.terastallized
        && let Some(tera) = combatant.tera_type.as_deref().and_then(Type::from_protocol)
    {
        return vec![tera];
    }

    reference
        .species(&combatant.species)
        .or_else(|| reference.species(&combatant.name))
        .map(|species| parse_types(&species.types))
        .unwrap_or_default()
}

fn type_list(types: &[Type]) -> String {
    types.iter().map(Type::as_str).collect::<Vec<_>>().join("/")
}

fn hp_line(combatant: &Combatant) -> String {
    let mut line = format!("- {} (HP: {}%", combatant.name, combatant.hp_percent());
    if let Some(status) = combatant.status {
        let _ = write!(line, ", Status: {}", status);
    }
    line.push(')');
    line
}

fn boosts_line(combatant: &Combatant) -> Option<String> {
    let changed = combatant.boosts.changed();
    if changed.is_empty() {
        return None;
    }
    let boosts: Vec<String> = changed
        .iter()
        .map(|(stat, value)| format!("{}: {:+}", stat.as_str().to_uppercase(), value))
        .collect();
    Some(format!("  Boosts: {}", boosts.join(", ")))
}

fn stats_line(combatant: &Combatant) -> Option<String> {
    let stats = combatant.stats.as_ref()?;
    Some(format!(
        "  Stats: HP: {}, ATK: {}, DEF: {}, SPA: {}, SPD: {}, SPE: {}",
        stats.hp, stats.atk, stats.def, stats.spa, stats.spd, stats.spe
    ))
}

fn volatiles_line(combatant: &Combatant) -> Option<String> {
    if combatant.volatiles.is_empty() {
        return None;
    }
    let names: Vec<&str> = combatant.volatiles.iter().map(|v| v.as_str()).collect();
    Some(format!("  Volatile Status: {}", names.join(", ")))
}

fn own_active(out: &mut Vec<String>, battle: &BattleState, active: &Combatant, reference: &dyn ReferenceData) {
    let species = reference.species(&active.species);
    let role = species
        .as_ref()
        .and_then(|s| s.all_roles().first().map(|r| r.to_string()))
        .unwrap_or_else(|| "Unknown".to_string());
    let types = combatant_types(active, reference);

    out.push("YOUR ACTIVE POKEMON:".to_string());
    out.push(hp_line(active));
    out.push(format!("  Role: {}", role));
    if !types.is_empty() {
        out.push(format!("  Types: {}", type_list(&types)));
        out.push(format!("  Matchup: {}", Matchup::defending(&types).describe()));
    }
    if let Some(ability) = &active.ability {
        out.push(format!("  Ability: {}", ability));
    }
    if !active.known_moves.is_empty() {
        out.push(format!("  Known moves: {}", active.known_moves.join(", ")));
    }
    if let Some(item) = &active.item {
        out.push(format!("  Item: {}", item));
    }
    if let Some(tera) = &active.tera_type {
        let note = if active.terastallized {
            "Currently Terastallized"
        } else if battle.tera_used() {
            "Tera already used this battle"
        } else if battle.legal.as_ref().is_some_and(|l| l.can_terastallize) {
            "Can Terastallize"
        } else {
            "Cannot Terastallize right now"
        };
        out.push(format!("  Tera Type: {} ({})", tera, note));
    }
    out.extend(volatiles_line(active));
    out.extend(boosts_line(active));
    out.extend(stats_line(active));
}

fn opponent_active(out: &mut Vec<String>, active: &Combatant, reference: &dyn ReferenceData) {
    let types = combatant_types(active, reference);

    out.push("OPPONENT'S ACTIVE POKEMON:".to_string());
    out.push(hp_line(active));
    if !types.is_empty() {
        out.push(format!("  Types: {}", type_list(&types)));
        out.push(format!("  Matchup: {}", Matchup::defending(&types).describe()));
    }

    if let Some(species) = reference.species(&active.species) {
        let roles = species.all_roles();
        if !roles.is_empty() {
            out.push(format!("  Possible Roles: {}", roles.join(", ")));
        }
        if let Some(set) = &species.random_battle {
            if let Some(level) = set.level {
                out.push(format!("  Level: {}", level));
            }
            let lists = [
                ("Possible Abilities", &set.abilities),
                ("Possible Items", &set.items),
                ("Possible Moves", &set.moves),
                ("Possible Tera Types", &set.tera_types),
            ];
            for (label, values) in lists {
                if !values.is_empty() {
                    out.push(format!("  {}: {}", label, values.join(", ")));
                }
            }
        }
    }

    if let Some(ability) = &active.ability {
        out.push(format!("  Known Ability: {}", ability));
    }
    if !active.known_moves.is_empty() {
        out.push(format!("  Revealed Moves: {}", active.known_moves.join(", ")));
    }
    if let Some(item) = &active.item {
        out.push(format!("  Known Item: {}", item));
    }
    if let Some(tera) = &active.tera_type {
        let note = if active.terastallized { " (Currently Terastallized)" } else { "" };
        out.push(format!("  Tera Type: {}{}", tera, note));
    }
    out.extend(volatiles_line(active));
    out.extend(boosts_line(active));
}

fn roster(out: &mut Vec<String>, title: &str, side: &SideState) {
    out.push(title.to_string());
    if side.roster.is_empty() {
        out.push("- none revealed".to_string());
    }

    for (i, member) in side.roster.iter().enumerate() {
        let mut line = hp_line(member);
        line.pop();
        if let Some(ability) = &member.ability {
            let _ = write!(line, ", Ability: {}", ability);
        }
        if let Some(item) = &member.item {
            let _ = write!(line, ", Item: {}", item);
        }
        line.push(')');
        if side.active == Some(i) {
            line.push_str(" [active]");
        } else if member.fainted {
            line.push_str(" [fainted]");
        } else if !member.revealed {
            line.push_str(" [not yet seen]");
        }
        out.push(line);

        if !member.known_moves.is_empty() {
            out.push(format!("  Known moves: {}", member.known_moves.join(", ")));
        }
        if let Some(tera) = &member.tera_type {
            let note = if member.terastallized { " (Currently Terastallized)" } else { "" };
            out.push(format!("  Tera Type: {}{}", tera, note));
        }
    }
}

fn condition_list(conditions: &[SideCondition]) -> String {
    let mut seen: Vec<SideCondition> = Vec::new();
    let mut parts = Vec::new();
    for condition in conditions {
        if seen.contains(condition) {
            continue;
        }
        seen.push(*condition);
        let layers = conditions.iter().filter(|c| *c == condition).count();
        if layers > 1 {
            parts.push(format!("{} x{}", condition, layers));
        } else {
            parts.push(condition.to_string());
        }
    }
    parts.join(", ")
}

fn side_conditions(out: &mut Vec<String>, label: &str, side: Option<&SideState>) {
    out.push(format!("{}:", label));
    let Some(side) = side else {
        out.push("- none".to_string());
        return;
    };
    if side.hazards.is_empty() && side.screens.is_empty() {
        out.push("- none".to_string());
    }
    if !side.hazards.is_empty() {
        out.push(format!("- Hazards: {}", condition_list(&side.hazards)));
    }
    if !side.screens.is_empty() {
        out.push(format!("- Screens: {}", condition_list(&side.screens)));
    }
}

fn field(out: &mut Vec<String>, battle: &BattleState) {
    out.push("FIELD CONDITIONS:".to_string());
    let mut conditions = Vec::new();
    if let Some(weather) = battle.field.weather {
        conditions.push(format!("Weather: {}", weather));
    }
    if let Some(terrain) = battle.field.terrain {
        conditions.push(format!("Terrain: {}", terrain));
    }
    if battle.field.trick_room {
        conditions.push("Trick Room is active".to_string());
    }
    if let Some(me) = battle.perspective() {
        if battle.field.tailwind(me) {
            conditions.push("Tailwind on your side".to_string());
        }
        if battle.field.tailwind(me.opponent()) {
            conditions.push("Tailwind on the opponent's side".to_string());
        }
    }
    if conditions.is_empty() {
        conditions.push("No active field conditions".to_string());
    }
    out.extend(conditions.into_iter().map(|c| format!("- {}", c)));
}

fn actions(out: &mut Vec<String>, battle: &BattleState, reference: &dyn ReferenceData, exclusions: &Exclusions) {
    let Some(legal) = battle.legal.as_ref().filter(|_| battle.decision_pending) else {
        return;
    };

    out.push(String::new());
    out.push("AVAILABLE ACTIONS:".to_string());
    if legal.kind == DecisionKind::ForceSwitch {
        out.push("Your active Pokemon must be replaced: choose a switch.".to_string());
    }

    let opponent = battle.opponent().and_then(|side| side.active_combatant());
    let opponent_types = opponent.map(|c| combatant_types(c, reference)).unwrap_or_default();
    let tera_open = legal.can_terastallize && !battle.tera_used();

    let moves: Vec<String> = legal
        .moves
        .iter()
        .filter(|mv| exclusions.allows_move(mv.index))
        .map(|mv| {
            let record = reference.move_info(&mv.name);
            let move_type = mv
                .move_type
                .clone()
                .or_else(|| record.as_ref().map(|r| r.move_type.clone()))
                .filter(|t| !t.is_empty());

            let mut line = format!(
                "- Move {}: {} (Type: {}, PP: {}/{}",
                mv.index,
                mv.name,
                move_type.as_deref().unwrap_or("Unknown"),
                mv.pp,
                mv.max_pp
            );
            let is_status = record.as_ref().is_some_and(|r| r.category.eq_ignore_ascii_case("status"));
            if !is_status
                && let (Some(opponent), Some(t)) = (opponent, move_type.as_deref().and_then(Type::from_protocol))
                && let Some(multiplier) = best_effectiveness(&[t], &opponent_types)
            {
                let _ = write!(line, ", {}x vs {}", multiplier, opponent.name);
            }
            line.push(')');
            if tera_open && mv.can_terastallize && exclusions.allows_tera(mv.index) {
                let _ = write!(line, " [Can Terastallize with 'move {}t']", mv.index);
            }
            line
        })
        .collect();

    if !moves.is_empty() {
        out.push("Available moves:".to_string());
        out.extend(moves);
    }

    if legal.trapped || exclusions.switching_blocked() {
        out.push("Switching is not possible right now.".to_string());
        return;
    }

    let switches: Vec<String> = legal
        .switches
        .iter()
        .filter(|s| exclusions.allows_switch(s.index))
        .map(|s| format!("- Switch {}: {} ({}, HP: {}%)", s.index, s.name, s.condition, s.hp_percent))
        .collect();

    if !switches.is_empty() {
        out.push("Available switches:".to_string());
        out.extend(switches);
    }
}

/// Human-readable summary of everything known about the battle
///
/// Excluded options are left out of the available actions.
pub fn battle_summary(battle: &BattleState, reference: &dyn ReferenceData, exclusions: &Exclusions) -> String {
    let mut out = Vec::new();
    let format = if battle.format.is_empty() { "unknown format" } else { battle.format.as_str() };
    out.push(format!("=== BATTLE SITUATION (turn {}, {}) ===", battle.turn, format));
    out.push(String::new());

    let me = battle.me();
    let opponent = battle.opponent();

    if let Some(active) = me.and_then(|s| s.active_combatant()) {
        own_active(&mut out, battle, active, reference);
        out.push(String::new());
    }
    if let Some(active) = opponent.and_then(|s| s.active_combatant()) {
        opponent_active(&mut out, active, reference);
        out.push(String::new());
    }

    if let Some(side) = me {
        roster(&mut out, "YOUR TEAM:", side);
        out.push(String::new());
    }
    if let Some(side) = opponent {
        roster(&mut out, "REVEALED OPPONENT POKEMON:", side);
        out.push(String::new());
    }

    field(&mut out, battle);
    out.push(String::new());

    out.push("SIDE CONDITIONS:".to_string());
    side_conditions(&mut out, "Your side", me);
    side_conditions(&mut out, "Opponent's side", opponent);

    actions(&mut out, battle, reference, exclusions);

    out.push(String::new());
    out.push("=== END BATTLE SITUATION ===".to_string());
    out.join("\n")
}

/// Prompt asking the oracle for this turn's action
pub fn decision_prompt(
    battle: &BattleState,
    reference: &dyn ReferenceData,
    exclusions: &Exclusions,
    prior_error: Option<&str>,
) -> String {
    let mut prompt = String::from(
        "Based on the battle situation below, choose the best action for this turn. \
         Consider every available move and switch.\n\n",
    );
    prompt.push_str(&battle_summary(battle, reference, exclusions));
    prompt.push_str("\n\n");

    if let Some(reason) = prior_error {
        let _ = write!(
            prompt,
            "PREVIOUS ATTEMPT FAILED: {}\nDo not repeat that choice; pick another listed option.\n\n",
            reason
        );
    }

    prompt.push_str(
        "Explain your reasoning first. Then, separated by a blank line, give your choice on its own line \
         starting with \"CHOSEN MOVE:\". For example:\n\
         - CHOSEN MOVE: move 1\n\
         - CHOSEN MOVE: move 1t (use move 1 and terastallize)\n\
         - CHOSEN MOVE: switch 3\n\
         Only choose options listed under AVAILABLE ACTIONS. Terastallize only when it is offered and worth it.",
    );
    prompt
}

/// Appended to a prompt whose reply could not be parsed
pub fn format_correction(error: &CommandError) -> String {
    format!(
        "Your previous reply could not be used ({}). Answer again and finish with exactly one line of the form \
         \"CHOSEN MOVE: move N\", \"CHOSEN MOVE: move Nt\" or \"CHOSEN MOVE: switch N\".",
        error
    )
}

/// Prompt asking for a short review of a finished battle
pub fn analysis_prompt(concluded: &BattleConcluded, reference: &dyn ReferenceData) -> String {
    format!(
        "The battle {room} is over. Result for you: {outcome}.\n\n\
         Battle log:\n{log}\n\n\
         Final situation:\n{summary}\n\n\
         Review the battle in a few short sentences: the turning points, your best and worst decisions, \
         and what you would do differently. Keep it under 250 characters so it fits in one chat message.",
        room = concluded.room_id,
        outcome = concluded.outcome,
        log = concluded.transcript.render(),
        summary = battle_summary(&concluded.final_state, reference, &Exclusions::new()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilot_battle::Transcript;
    use pilot_client::Outcome;
    use pilot_protocol::parse_server_frame;

    use crate::command::Command;
    use crate::reference::{JsonReferenceData, NoReferenceData};

    const ROOM: &str = "battle-gen9randombattle-77";

    const REFERENCE: &str = r#"{
        "species": {
            "garchomp": {"name": "Garchomp", "types": ["Dragon", "Ground"], "roles": ["Fast Attacker"]},
            "heatran": {
                "name": "Heatran",
                "types": ["Fire", "Steel"],
                "random_battle": {
                    "level": 80,
                    "roles": ["Bulky Support"],
                    "abilities": ["Flash Fire"],
                    "items": ["Air Balloon", "Leftovers"],
                    "moves": ["Magma Storm", "Earth Power", "Stealth Rock"],
                    "tera_types": ["Grass"]
                }
            }
        },
        "moves": {
            "earthquake": {"name": "Earthquake", "type": "Ground", "category": "Physical", "power": 100},
            "swordsdance": {"name": "Swords Dance", "type": "Normal", "category": "Status"}
        }
    }"#;

    const FRAMES: &[&str] = &[
        ">battle-gen9randombattle-77\n|init|battle\n|player|p1|Pilot|1|\n|player|p2|Rival|2|\n|tier|[Gen 9] Random Battle\n|start\n|switch|p1a: Garchomp|Garchomp, L77, M|271/271\n|switch|p2a: Heatran|Heatran, L80|100/100\n|-sidestart|p2: Rival|move: Spikes\n|-sidestart|p2: Rival|move: Spikes\n|-weather|RainDance\n|-boost|p1a: Garchomp|atk|2\n|turn|2",
        r#">battle-gen9randombattle-77
|request|{"active":[{"moves":[{"move":"Earthquake","id":"earthquake","pp":16,"maxpp":16,"disabled":false},{"move":"Dragon Claw","id":"dragonclaw","pp":24,"maxpp":24,"type":"Dragon","disabled":false},{"move":"Swords Dance","id":"swordsdance","pp":32,"maxpp":32,"disabled":false}],"canTerastallize":"Ground"}],"side":{"name":"Pilot","id":"p1","pokemon":[{"ident":"p1: Garchomp","details":"Garchomp, L77, M","condition":"271/271","active":true,"stats":{"atk":240,"def":200,"spa":160,"spd":170,"spe":210},"moves":["earthquake","dragonclaw","swordsdance"],"ability":"Rough Skin","item":"Life Orb","teraType":"Ground","terastallized":""},{"ident":"p1: Rotom","details":"Rotom-Wash, L86","condition":"240/240","active":false,"moves":["hydropump"],"item":"Leftovers","teraType":"Water","terastallized":""}]},"rqid":4}"#,
    ];

    fn battle() -> BattleState {
        let mut battle = BattleState::for_user(ROOM, "Pilot");
        for text in FRAMES {
            for message in &parse_server_frame(text).messages {
                battle.apply(message);
            }
        }
        battle
    }

    #[test]
    fn test_summary_sections() {
        let reference = JsonReferenceData::from_json(REFERENCE).unwrap();
        let summary = battle_summary(&battle(), &reference, &Exclusions::new());

        assert!(summary.starts_with("=== BATTLE SITUATION (turn 2, [Gen 9] Random Battle) ==="));
        assert!(summary.contains("YOUR ACTIVE POKEMON:\n- Garchomp (HP: 100%)\n  Role: Fast Attacker"));
        assert!(summary.contains("  Types: Dragon/Ground"));
        assert!(summary.contains("  Tera Type: Ground (Can Terastallize)"));
        assert!(summary.contains("  Boosts: ATK: +2"));
        assert!(summary.contains("  Item: Life Orb"));

        assert!(summary.contains("OPPONENT'S ACTIVE POKEMON:\n- Heatran (HP: 100%)"));
        assert!(summary.contains("Weak to: Water (2x), Fighting (2x), Ground (4x)"));
        assert!(summary.contains("  Possible Moves: Magma Storm, Earth Power, Stealth Rock"));
        assert!(summary.contains("  Level: 80"));

        assert!(summary.contains("- Rotom (HP: 100%, Item: Leftovers)"));
        assert!(summary.contains("- Weather: Rain"));
        assert!(summary.contains("Opponent's side:\n- Hazards: Spikes x2"));
        assert!(summary.ends_with("=== END BATTLE SITUATION ==="));
    }

    #[test]
    fn test_available_actions() {
        let reference = JsonReferenceData::from_json(REFERENCE).unwrap();
        let summary = battle_summary(&battle(), &reference, &Exclusions::new());

        assert!(summary.contains(
            "- Move 1: Earthquake (Type: Ground, PP: 16/16, 4x vs Heatran) [Can Terastallize with 'move 1t']"
        ));
        assert!(summary.contains("- Move 2: Dragon Claw (Type: Dragon, PP: 24/24, 0.5x vs Heatran)"));
        // Status moves get no effectiveness note
        assert!(summary.contains("- Move 3: Swords Dance (Type: Normal, PP: 32/32) [Can"));
        assert!(summary.contains("Available switches:\n- Switch 2: Rotom (240/240, HP: 100%)"));
    }

    #[test]
    fn test_exclusions_remove_options() {
        let mut exclusions = Exclusions::new();
        exclusions.exclude(Command::Move { index: 2, tera: false });
        exclusions.block_switching();
        exclusions.block_tera();

        let summary = battle_summary(&battle(), &NoReferenceData, &exclusions);
        assert!(summary.contains("- Move 1: Earthquake (Type: Unknown, PP: 16/16)"));
        assert!(!summary.contains("Move 2:"));
        assert!(!summary.contains("Can Terastallize with"));
        assert!(summary.contains("Switching is not possible right now."));
        assert!(!summary.contains("Switch 2:"));
    }

    #[test]
    fn test_decision_prompt_retry() {
        let battle = battle();
        let first = decision_prompt(&battle, &NoReferenceData, &Exclusions::new(), None);
        assert!(!first.contains("PREVIOUS ATTEMPT FAILED"));
        assert!(first.contains("CHOSEN MOVE: move 1t"));

        let retry = decision_prompt(
            &battle,
            &NoReferenceData,
            &Exclusions::new(),
            Some("[Invalid choice] Can't move: Garchomp's Dragon Claw is disabled"),
        );
        assert!(retry.contains("PREVIOUS ATTEMPT FAILED: [Invalid choice] Can't move: Garchomp's Dragon Claw is disabled"));
    }

    #[test]
    fn test_format_correction() {
        let text = format_correction(&CommandError::MissingMarker);
        assert!(text.contains("no \"CHOSEN MOVE:\" line"));
        assert!(text.contains("\"CHOSEN MOVE: switch N\""));
    }

    #[test]
    fn test_analysis_prompt() {
        let mut transcript = Transcript::new();
        transcript.push("Garchomp used **Earthquake**!");
        let concluded = BattleConcluded {
            room_id: ROOM.to_string(),
            final_state: battle(),
            transcript,
            outcome: Outcome::Won,
        };

        let prompt = analysis_prompt(&concluded, &NoReferenceData);
        assert!(prompt.contains("Result for you: won."));
        assert!(prompt.contains("Battle log:\nGarchomp used **Earthquake**!"));
        assert!(prompt.contains("=== END BATTLE SITUATION ==="));
    }
}
