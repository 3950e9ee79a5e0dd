//! Update logic for processing ServerMessage into battle state

use pilot_protocol::{HpStatus, Player, Pokemon, PokemonDetails, ServerMessage};

use super::battle::BattleState;
use crate::transcript::boost_phrase;
use crate::types::{Combatant, SideCondition, Status, Volatile, round1};

impl BattleState {
    /// Apply one server message, returning the transcript events it produces
    pub fn apply(&mut self, msg: &ServerMessage) -> Vec<String> {
        let mut events = Vec::new();

        match msg {
            // === Battle Initialization ===
            ServerMessage::BattlePlayer {
                player, username, ..
            } => {
                // A bare |player|p1| marks a player leaving; the side stays as is
                if username.is_empty() {
                    return events;
                }
                self.side_entry(*player).username = username.clone();
                if self.is_own_username(username) && self.set_perspective(*player) {
                    tracing::debug!(room = %self.room_id, player = player.as_str(), "perspective assigned");
                }
            }

            ServerMessage::Poke {
                player, details, ..
            } => {
                let side = self.side_entry(*player);
                if side.find(&details.species).is_none() {
                    side.roster
                        .push(Combatant::from_details(&details.species, details));
                }
            }

            ServerMessage::Gen(generation) => {
                self.generation = *generation;
            }

            ServerMessage::Tier(tier) => {
                self.format = tier.clone();
            }

            ServerMessage::Turn(turn) => {
                self.turn = *turn;
                events.push(format!("\n=== Turn {} ===\n", turn));
            }

            ServerMessage::Upkeep => {
                events.push("\n=== Upkeep Phase ===\n".to_string());
            }

            // === Major Actions ===
            ServerMessage::Switch {
                pokemon,
                details,
                hp_status,
            } => {
                self.handle_switch(pokemon, details, hp_status.as_ref(), false, &mut events);
            }

            ServerMessage::Drag {
                pokemon,
                details,
                hp_status,
            } => {
                self.handle_switch(pokemon, details, hp_status.as_ref(), true, &mut events);
            }

            ServerMessage::Move {
                pokemon,
                move_name,
                from,
                ..
            } => {
                events.push(format!("{} used **{}**!", self.name_of(pokemon), move_name));

                // Moves called by another move or an ability are not part of the moveset
                if from.is_none()
                    && let Some(combatant) = self.combatant_mut(pokemon)
                {
                    combatant.record_move(move_name);
                }
            }

            ServerMessage::DetailsChange {
                pokemon,
                details,
                hp_status,
            } => {
                let name = self.name_of(pokemon);
                let mut changed_species = None;

                if let Some(combatant) = self.combatant_mut(pokemon) {
                    if combatant.species != details.species && !details.species.is_empty() {
                        changed_species = Some(details.species.clone());
                    }
                    combatant.apply_details(details);
                    if let Some(hp) = hp_status {
                        combatant.apply_condition(hp);
                    }
                }

                if let Some(species) = changed_species {
                    events.push(format!("{} transformed into {}!", name, species));
                }
            }

            ServerMessage::Cant {
                pokemon, reason, ..
            } => {
                events.push(format!("{} couldn't move ({})!", self.name_of(pokemon), reason));
            }

            ServerMessage::Faint(pokemon) => {
                self.handle_faint(pokemon);
                events.push(format!("{} fainted!", self.name_of(pokemon)));
            }

            // === HP Changes ===
            ServerMessage::Damage {
                pokemon, hp_status, ..
            } => {
                let Some(hp) = hp_status else {
                    tracing::debug!(room = %self.room_id, pokemon = %pokemon.name, "damage without a readable hp token");
                    return events;
                };
                let name = self.name_of(pokemon);
                if let Some((before, after)) = self.apply_hp(pokemon, hp) {
                    let lost = round1(before - after);
                    if lost > 0.0 {
                        events.push(format!("({} lost {}% of its health!)", name, lost));
                    }
                }
            }

            ServerMessage::Heal {
                pokemon, hp_status, ..
            } => {
                let Some(hp) = hp_status else {
                    tracing::debug!(room = %self.room_id, pokemon = %pokemon.name, "heal without a readable hp token");
                    return events;
                };
                let name = self.name_of(pokemon);
                if let Some((_, after)) = self.apply_hp(pokemon, hp) {
                    events.push(format!("({} restored its HP to {}%!)", name, after));
                }
            }

            ServerMessage::SetHp {
                pokemon, hp_status, ..
            } => {
                if let Some(hp) = hp_status {
                    self.apply_hp(pokemon, hp);
                }
            }

            // === Status ===
            ServerMessage::Status { pokemon, status } => {
                let name = self.name_of(pokemon);
                if let Some(status) = Status::from_protocol(status)
                    && let Some(combatant) = self.combatant_mut(pokemon)
                {
                    combatant.status = Some(status);
                    events.push(format!("{} was {}!", name, status.inflicted()));
                }
            }

            ServerMessage::CureStatus { pokemon, .. } => {
                let name = self.name_of(pokemon);
                if let Some(combatant) = self.combatant_mut(pokemon) {
                    combatant.status = None;
                    events.push(format!("{}'s status was cured!", name));
                }
            }

            ServerMessage::CureTeam(pokemon) => {
                if let Some(side) = self.side_mut(pokemon.player) {
                    for combatant in &mut side.roster {
                        combatant.status = None;
                    }
                }
                events.push(format!("{}'s team was cured of its status conditions!", self.name_of(pokemon)));
            }

            // === Boosts ===
            ServerMessage::Boost {
                pokemon,
                stat,
                amount,
            } => {
                let name = self.name_of(pokemon);
                if let Some(combatant) = self.combatant_mut(pokemon) {
                    combatant.boosts.boost(*stat, *amount);
                    events.push(format!("{}'s {} {}!", name, stat.display_name(), boost_phrase(*amount)));
                }
            }

            ServerMessage::Unboost {
                pokemon,
                stat,
                amount,
            } => {
                let name = self.name_of(pokemon);
                if let Some(combatant) = self.combatant_mut(pokemon) {
                    let amount = amount.saturating_neg();
                    combatant.boosts.boost(*stat, amount);
                    events.push(format!("{}'s {} {}!", name, stat.display_name(), boost_phrase(amount)));
                }
            }

            ServerMessage::SetBoost {
                pokemon,
                stat,
                amount,
            } => {
                let name = self.name_of(pokemon);
                if let Some(combatant) = self.combatant_mut(pokemon) {
                    combatant.boosts.set(*stat, *amount);
                    events.push(format!("{}'s {} was set to {:+}!", name, stat.display_name(), amount));
                }
            }

            ServerMessage::ClearBoost(pokemon) => {
                let name = self.name_of(pokemon);
                if let Some(combatant) = self.combatant_mut(pokemon) {
                    combatant.boosts.clear();
                    events.push(format!("{}'s stat changes were removed!", name));
                }
            }

            ServerMessage::ClearAllBoost => {
                for side in self.sides_mut() {
                    if let Some(combatant) = side.active_combatant_mut() {
                        combatant.boosts.clear();
                    }
                }
                events.push("All stat changes were eliminated!".to_string());
            }

            // === Volatiles ===
            ServerMessage::VolatileStart { pokemon, effect } => {
                let name = self.name_of(pokemon);
                if let Some(combatant) = self.combatant_mut(pokemon) {
                    let volatile = Volatile::from_protocol(effect);
                    events.push(format!("{} is affected by {}!", name, volatile));
                    combatant.add_volatile(volatile);
                }
            }

            ServerMessage::VolatileEnd { pokemon, effect } => {
                let name = self.name_of(pokemon);
                if let Some(combatant) = self.combatant_mut(pokemon) {
                    let volatile = Volatile::from_protocol(effect);
                    if combatant.remove_volatile(&volatile) {
                        events.push(format!("{}'s {} ended!", name, volatile));
                    }
                }
            }

            // === Field Conditions ===
            ServerMessage::Weather { weather, upkeep } => {
                // Upkeep lines repeat the current weather every turn
                if !upkeep {
                    let previous = self.field.weather;
                    self.field.set_weather(weather);
                    match self.field.weather {
                        Some(current) => events.push(current.start_message().to_string()),
                        None if previous.is_some() => {
                            events.push("The weather returned to normal.".to_string())
                        }
                        None => {}
                    }
                }
            }

            ServerMessage::FieldStart(condition) => {
                self.field.apply_field_start(condition);
                events.push(format!("{} started!", effect_name(condition)));
            }

            ServerMessage::FieldEnd(condition) => {
                self.field.apply_field_end(condition);
                events.push(format!("{} ended!", effect_name(condition)));
            }

            // === Side Conditions ===
            ServerMessage::SideStart { side, condition } => {
                let owner = self.side_owner(side.player);
                match SideCondition::from_protocol(condition) {
                    Some(SideCondition::Tailwind) => {
                        self.field.set_tailwind(side.player, true);
                    }
                    Some(tracked) => {
                        self.side_entry(side.player).add_condition(tracked);
                    }
                    None => {
                        tracing::debug!(room = %self.room_id, condition = %condition, "untracked side condition");
                    }
                }
                events.push(format!("{} was set up on {}!", effect_name(condition), owner));
            }

            ServerMessage::SideEnd { side, condition } => {
                let owner = self.side_owner(side.player);
                match SideCondition::from_protocol(condition) {
                    Some(SideCondition::Tailwind) => {
                        self.field.set_tailwind(side.player, false);
                    }
                    Some(tracked) => {
                        self.side_entry(side.player).remove_condition(tracked);
                    }
                    None => {}
                }
                events.push(format!("{} ended on {}!", effect_name(condition), owner));
            }

            // === Items and Abilities ===
            ServerMessage::Item { pokemon, item, .. } => {
                let name = self.name_of(pokemon);
                if let Some(combatant) = self.combatant_mut(pokemon) {
                    combatant.item = Some(item.clone());
                    events.push(format!("{} is holding {}!", name, item));
                }
            }

            ServerMessage::EndItem { pokemon, item, .. } => {
                let name = self.name_of(pokemon);
                if let Some(combatant) = self.combatant_mut(pokemon) {
                    combatant.item = None;
                    events.push(format!("{} used its {}!", name, item));
                }
            }

            ServerMessage::Ability {
                pokemon, ability, ..
            } => {
                let name = self.name_of(pokemon);
                if let Some(combatant) = self.combatant_mut(pokemon) {
                    combatant.ability = Some(ability.clone());
                    events.push(format!("{}'s {}!", name, ability));
                }
            }

            ServerMessage::Terastallize { pokemon, tera_type } => {
                let name = self.name_of(pokemon);
                if let Some(combatant) = self.combatant_mut(pokemon) {
                    combatant.terastallized = true;
                    combatant.tera_type = Some(tera_type.clone());
                }
                self.side_entry(pokemon.player).tera_used = true;
                events.push(format!("{} terastallized into the {} type!", name, tera_type));
            }

            // === Transcript only ===
            ServerMessage::Crit(_) => {
                events.push("A critical hit!".to_string());
            }

            ServerMessage::SuperEffective(_) => {
                events.push("It's super effective!".to_string());
            }

            ServerMessage::Resisted(_) => {
                events.push("It's not very effective...".to_string());
            }

            ServerMessage::Immune(pokemon) => {
                events.push(format!("It doesn't affect {}...", self.mid_name_of(pokemon)));
            }

            ServerMessage::Miss { source, target } => {
                let event = match target {
                    Some(target) => format!("The attack missed {}!", self.mid_name_of(target)),
                    None => format!("{}'s attack missed!", self.name_of(source)),
                };
                events.push(event);
            }

            ServerMessage::Fail { .. } => {
                events.push("But it failed!".to_string());
            }

            ServerMessage::Message(text) => {
                events.push(text.clone());
            }

            // === Battle Progress ===
            ServerMessage::Request(request) => {
                self.apply_request(request);
            }

            ServerMessage::Error(text) => {
                self.decision_pending = true;
                self.rejection_seq += 1;
                self.last_rejection = Some(text.clone());
                tracing::warn!(room = %self.room_id, error = %text, seq = self.rejection_seq, "choice rejected");
            }

            // === Battle End ===
            ServerMessage::Win(winner) => {
                self.ended = true;
                self.decision_pending = false;
                self.winner = Some(winner.clone());
                events.push(format!("{} won the battle!", winner));
            }

            ServerMessage::Tie => {
                self.ended = true;
                self.decision_pending = false;
                self.tie = true;
                events.push("The battle ended in a tie!".to_string());
            }

            // === Fallbacks ===
            ServerMessage::Unparsed { line, error } => {
                tracing::warn!(room = %self.room_id, line = %line, error = %error, "skipping unparseable line");
            }

            ServerMessage::Raw(line) => {
                if !line.is_empty() {
                    tracing::debug!(room = %self.room_id, line = %line, "unhandled line");
                }
            }

            // Room bookkeeping and global messages carry no battle facts
            _ => {}
        }

        events
    }

    /// Handle a switch (or drag) message
    fn handle_switch(
        &mut self,
        pokemon: &Pokemon,
        details: &PokemonDetails,
        hp_status: Option<&HpStatus>,
        is_drag: bool,
        events: &mut Vec<String>,
    ) {
        let side = self.side_entry(pokemon.player);
        let idx = side.resolve_or_insert(&pokemon.name, details);

        let switched = side.switch_in(idx);
        if switched {
            let combatant = &mut side.roster[idx];
            combatant.apply_details(details);
            if let Some(hp) = hp_status {
                combatant.apply_condition(hp);
            }
            if combatant.terastallized {
                side.tera_used = true;
            }
        }

        if !switched {
            tracing::warn!(room = %self.room_id, pokemon = %pokemon.name, "ignoring switch to a fainted pokemon");
            return;
        }

        let name = self.name_of(pokemon);
        if is_drag {
            events.push(format!("{} was dragged out!", name));
        } else {
            events.push(format!("{} was sent out!", name));
        }
    }

    /// Handle a faint message
    fn handle_faint(&mut self, pokemon: &Pokemon) {
        let Some(side) = self.side_mut(pokemon.player) else {
            return;
        };
        let Some(idx) = side.find(&pokemon.name) else {
            return;
        };

        side.roster[idx].faint();
        if side.active == Some(idx) {
            side.active = None;
        }
    }

    /// Apply an HP token, returning the HP percentage before and after
    fn apply_hp(&mut self, pokemon: &Pokemon, hp: &HpStatus) -> Option<(f64, f64)> {
        let combatant = self.combatant_mut(pokemon)?;
        let before = combatant.hp_percent();
        combatant.apply_condition(hp);
        Some((before, combatant.hp_percent()))
    }

    /// Find a Combatant by protocol identifier
    fn combatant_mut(&mut self, pokemon: &Pokemon) -> Option<&mut Combatant> {
        self.side_mut(pokemon.player)?.find_mut(&pokemon.name)
    }

    fn name_of(&self, pokemon: &Pokemon) -> String {
        self.display_name(pokemon.player, &pokemon.name)
    }

    /// Name for use mid-sentence ("the opposing Garchomp")
    fn mid_name_of(&self, pokemon: &Pokemon) -> String {
        if self.is_opponent(pokemon.player) {
            format!("the opposing {}", pokemon.name)
        } else {
            pokemon.name.clone()
        }
    }

    fn side_owner(&self, player: Player) -> String {
        if self.is_opponent(player) {
            return "the opposing side".to_string();
        }
        match self.side(player) {
            Some(side) if !side.username.is_empty() => format!("{}'s side", side.username),
            _ => format!("{}'s side", player.as_str()),
        }
    }
}

/// Strip the "move: " / "ability: " style prefix from an effect name
fn effect_name(effect: &str) -> &str {
    effect
        .split_once(": ")
        .map(|(_, name)| name)
        .unwrap_or(effect)
}
