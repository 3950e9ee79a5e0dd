//! Authoritative resync of our own side from a `|request|` payload

use std::collections::HashMap;

use pilot_protocol::{BattleRequest, PokemonDetails, SidePokemon, to_id};

use super::battle::BattleState;
use super::legal::LegalActions;
use crate::types::{BattleStats, Combatant, Status};

impl BattleState {
    /// Rewrite our side from a request and recompute the legal actions
    ///
    /// Applying the same request twice leaves the state unchanged apart from
    /// `request_seq`, which counts requests rather than distinct payloads.
    pub fn apply_request(&mut self, request: &BattleRequest) {
        if let Some(side_info) = &request.side {
            match side_info.player() {
                Some(player) => {
                    self.set_perspective(player);

                    // Display names for the active Pokemon's move ids
                    let move_names: HashMap<&str, &str> = request
                        .active
                        .iter()
                        .flat_map(|a| a.moves.iter())
                        .map(|slot| (slot.id.as_str(), slot.name.as_str()))
                        .collect();

                    let side = self.side_entry(player);
                    if side.username.is_empty() {
                        side.username = side_info.name.clone();
                    }

                    for member in &side_info.pokemon {
                        let details = PokemonDetails::parse(&member.details);
                        let idx = side.resolve_or_insert(member.name(), &details);
                        let combatant = &mut side.roster[idx];
                        sync_member(combatant, member, &move_names);

                        if member.active && !combatant.fainted {
                            combatant.revealed = true;
                            side.active = Some(idx);
                        }
                    }

                    if side.roster.iter().any(|c| c.terastallized) {
                        side.tera_used = true;
                    }
                }
                None => {
                    tracing::warn!(room = %self.room_id, side = %side_info.id, "request for unknown side");
                }
            }
        }

        let tera_used = self.tera_used();
        self.legal = LegalActions::from_request(request, tera_used);

        if self.legal.is_some() {
            self.decision_pending = true;
            self.request_seq += 1;
            tracing::debug!(
                room = %self.room_id,
                rqid = ?request.rqid,
                seq = self.request_seq,
                "request requires a decision"
            );
        } else {
            self.decision_pending = false;
        }
    }
}

fn sync_member(
    combatant: &mut Combatant,
    member: &SidePokemon,
    move_names: &HashMap<&str, &str>,
) {
    let hp = member.hp();

    combatant.stats = Some(BattleStats {
        hp: hp.map(|(_, max)| max).unwrap_or(combatant.hp_max),
        atk: member.stats.atk,
        def: member.stats.def,
        spa: member.stats.spa,
        spd: member.stats.spd,
        spe: member.stats.spe,
    });

    if !member.ability.is_empty() {
        combatant.ability = Some(member.ability.clone());
    } else if !member.base_ability.is_empty() {
        combatant.ability = Some(member.base_ability.clone());
    }

    combatant.item = if member.item.is_empty() {
        None
    } else {
        Some(member.item.clone())
    };

    if member.is_fainted() {
        if !combatant.fainted {
            combatant.faint();
        }
    } else if !combatant.fainted {
        if let Some((current, max)) = hp {
            combatant.set_hp(current, max);
        }
        combatant.status = member.status().and_then(Status::from_protocol);
    }

    if let Some(tera) = &member.tera_type {
        combatant.tera_type = Some(tera.clone());
    }
    if member.is_terastallized() {
        combatant.terastallized = true;
    }

    combatant.active = member.active && !combatant.fainted;

    // Request order first, then anything seen earlier that the payload lacks
    let mut moves: Vec<String> = member
        .moves
        .iter()
        .map(|id| {
            move_names
                .get(id.as_str())
                .map(|name| name.to_string())
                .or_else(|| {
                    combatant
                        .known_moves
                        .iter()
                        .find(|known| to_id(known) == to_id(id))
                        .cloned()
                })
                .unwrap_or_else(|| id.clone())
        })
        .collect();

    for known in &combatant.known_moves {
        if !moves.iter().any(|m| to_id(m) == to_id(known)) {
            moves.push(known.clone());
        }
    }
    combatant.known_moves = moves;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::DecisionKind;
    use pilot_protocol::Player;

    fn request(json: &str) -> BattleRequest {
        BattleRequest::from_json(json).unwrap()
    }

    const REQUEST: &str = r#"{
        "active": [{
            "moves": [
                {"move": "Earthquake", "id": "earthquake", "pp": 16, "maxpp": 16, "disabled": false},
                {"move": "Swords Dance", "id": "swordsdance", "pp": 32, "maxpp": 32, "disabled": false}
            ],
            "canTerastallize": "Steel"
        }],
        "side": {
            "name": "Pilot",
            "id": "p2",
            "pokemon": [
                {
                    "ident": "p2: Garchomp",
                    "details": "Garchomp, L77, M",
                    "condition": "211/271 brn",
                    "active": true,
                    "stats": {"atk": 250, "def": 210, "spa": 180, "spd": 190, "spe": 230},
                    "moves": ["earthquake", "swordsdance"],
                    "baseAbility": "roughskin",
                    "ability": "",
                    "item": "lifeorb",
                    "teraType": "Steel",
                    "terastallized": ""
                },
                {
                    "ident": "p2: Heatran",
                    "details": "Heatran, L80",
                    "condition": "0 fnt",
                    "active": false,
                    "moves": ["magmastorm"],
                    "ability": "flashfire",
                    "item": ""
                }
            ]
        }
    }"#;

    #[test]
    fn test_request_rewrites_own_side() {
        let mut battle = BattleState::new("room");
        battle.apply_request(&request(REQUEST));

        assert_eq!(battle.perspective(), Some(Player::P2));
        let me = battle.me().unwrap();
        assert_eq!(me.username, "Pilot");
        assert_eq!(me.active, Some(0));

        let garchomp = &me.roster[0];
        assert_eq!(garchomp.hp_current, 211);
        assert_eq!(garchomp.hp_max, 271);
        assert_eq!(garchomp.status, Some(Status::Burn));
        assert_eq!(garchomp.ability.as_deref(), Some("roughskin"));
        assert_eq!(garchomp.item.as_deref(), Some("lifeorb"));
        assert_eq!(garchomp.known_moves, vec!["Earthquake", "Swords Dance"]);
        assert_eq!(garchomp.stats.as_ref().unwrap().hp, 271);
        assert!(!garchomp.terastallized);

        let heatran = &me.roster[1];
        assert!(heatran.fainted);
        assert_eq!(heatran.item, None);
        assert_eq!(heatran.known_moves, vec!["magmastorm"]);

        assert!(battle.decision_pending);
        assert_eq!(battle.request_seq, 1);
        assert_eq!(battle.legal.as_ref().unwrap().kind, DecisionKind::Move);
    }

    #[test]
    fn test_reapplying_is_idempotent() {
        let mut battle = BattleState::new("room");
        battle.apply_request(&request(REQUEST));
        let first = battle.me().cloned();

        battle.apply_request(&request(REQUEST));
        assert_eq!(battle.me().cloned(), first);
        assert_eq!(battle.request_seq, 2);
    }

    #[test]
    fn test_known_moves_never_shrink() {
        let mut battle = BattleState::new("room");
        battle.apply_request(&request(REQUEST));
        battle
            .me_mut()
            .unwrap()
            .roster[0]
            .record_move("Protect");

        battle.apply_request(&request(REQUEST));
        assert_eq!(
            battle.me().unwrap().roster[0].known_moves,
            vec!["Earthquake", "Swords Dance", "Protect"]
        );
    }

    #[test]
    fn test_terastallized_member_sets_tera_used() {
        let json = REQUEST.replace(r#""terastallized": """#, r#""terastallized": "Steel""#);
        let mut battle = BattleState::new("room");
        battle.apply_request(&request(&json));

        assert!(battle.tera_used());
        assert!(battle.me().unwrap().roster[0].terastallized);
        assert!(!battle.legal.as_ref().unwrap().can_terastallize);
    }

    #[test]
    fn test_wait_request_clears_pending() {
        let mut battle = BattleState::new("room");
        battle.apply_request(&request(REQUEST));

        let wait = r#"{"wait": true, "side": {"name": "Pilot", "id": "p2", "pokemon": []}}"#;
        battle.apply_request(&request(wait));
        assert!(!battle.decision_pending);
        assert!(battle.legal.is_none());
        assert_eq!(battle.request_seq, 1);
    }

    #[test]
    fn test_fainted_member_stays_fainted() {
        let mut battle = BattleState::new("room");
        battle.apply_request(&request(REQUEST));

        let revived = REQUEST.replace(r#""condition": "0 fnt""#, r#""condition": "160/320""#);
        battle.apply_request(&request(&revived));
        let heatran = &battle.me().unwrap().roster[1];
        assert!(heatran.fainted);
        assert_eq!(heatran.hp_current, 0);
    }
}
