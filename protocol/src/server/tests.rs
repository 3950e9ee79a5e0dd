#[cfg(test)]
mod tests {
    use crate::{
        parse_server_frame, parse_server_message, HpStatus, Player, RoomType, ServerMessage, Stat,
    };

    #[test]
    fn test_parse_challstr() {
        let line = "|challstr|4|1234abc";
        let message = parse_server_message(line).unwrap();

        assert_eq!(message, ServerMessage::Challstr("4|1234abc".into()))
    }

    #[test]
    fn test_parse_challstr_invalid() {
        let line = "|challstr|";
        let result = parse_server_message(line);

        assert!(result.is_err());
    }

    #[test]
    fn test_parse_unknown() {
        let line = "|someunknown|data";
        let message = parse_server_message(line).unwrap();

        assert_eq!(message, ServerMessage::Raw("|someunknown|data".to_string()));
    }

    #[test]
    fn test_parse_empty() {
        let line = "";
        let message = parse_server_message(line).unwrap();

        assert_eq!(message, ServerMessage::Raw("".to_string()));
    }

    #[test]
    fn test_parse_updateuser() {
        let message = parse_server_message("|updateuser| pilotbot|1|225|{}").unwrap();
        match message {
            ServerMessage::UpdateUser { user, named, avatar } => {
                assert_eq!(user.username, "pilotbot");
                assert!(named);
                assert_eq!(avatar, "225");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_updatechallenges() {
        let line = r#"|updatechallenges|{"challengesFrom":{"rival":"gen9randombattle"},"challengeTo":null}"#;
        match parse_server_message(line).unwrap() {
            ServerMessage::UpdateChallenges(state) => {
                assert_eq!(
                    state.challenges_from.get("rival").map(String::as_str),
                    Some("gen9randombattle")
                );
                assert!(state.challenge_to.is_none());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_keeps_pipes() {
        let line = "|error|[Invalid choice] Can't switch: You can't switch to an active Pokémon";
        assert_eq!(
            parse_server_message(line).unwrap(),
            ServerMessage::Error(
                "[Invalid choice] Can't switch: You can't switch to an active Pokémon".into()
            )
        );
    }

    #[test]
    fn test_parse_move_with_tags() {
        let line = "|move|p1a: Garchomp|Earthquake|p2a: Heatran|[miss]";
        match parse_server_message(line).unwrap() {
            ServerMessage::Move {
                pokemon,
                move_name,
                target,
                miss,
                from,
            } => {
                assert_eq!(pokemon.player, Player::P1);
                assert_eq!(move_name, "Earthquake");
                assert_eq!(target.map(|t| t.name), Some("Heatran".to_string()));
                assert!(miss);
                assert!(from.is_none());
            }
            other => panic!("unexpected message: {:?}", other),
        }

        let called = "|move|p2a: Heatran|Protect|p2a: Heatran|[from]move: Sleep Talk";
        match parse_server_message(called).unwrap() {
            ServerMessage::Move { from, .. } => {
                assert_eq!(from.as_deref(), Some("move: Sleep Talk"));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_damage_from_item() {
        let line = "|-damage|p2a: Heatran|81/100|[from] item: Life Orb";
        match parse_server_message(line).unwrap() {
            ServerMessage::Damage {
                pokemon,
                hp_status,
                from,
            } => {
                assert_eq!(pokemon.name, "Heatran");
                assert_eq!(
                    hp_status,
                    Some(HpStatus {
                        current: 81,
                        max: Some(100),
                        status: None
                    })
                );
                assert_eq!(from.as_deref(), Some("item: Life Orb"));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_boost_and_unboost() {
        assert_eq!(
            parse_server_message("|-unboost|p1a: Garchomp|atk|1").unwrap(),
            ServerMessage::Unboost {
                pokemon: crate::Pokemon::parse("p1a: Garchomp").unwrap(),
                stat: Stat::Atk,
                amount: 1,
            }
        );
        assert!(parse_server_message("|-boost|p1a: Garchomp|luck|1").is_err());
    }

    #[test]
    fn test_parse_weather_upkeep() {
        assert_eq!(
            parse_server_message("|-weather|Sandstorm|[upkeep]").unwrap(),
            ServerMessage::Weather {
                weather: "Sandstorm".into(),
                upkeep: true
            }
        );
    }

    #[test]
    fn test_parse_request_line() {
        let line = r#"|request|{"wait":true,"side":{"name":"pilotbot","id":"p1","pokemon":[]},"rqid":3}"#;
        match parse_server_message(line).unwrap() {
            ServerMessage::Request(request) => {
                assert!(request.wait);
                assert_eq!(request.rqid, Some(3));
                assert!(!request.needs_decision());
            }
            other => panic!("unexpected message: {:?}", other),
        }

        // An empty |request| line is sent before team preview in some formats
        assert!(parse_server_message("|request|").is_err());
    }

    #[test]
    fn test_parse_battle_frame() {
        let frame = ">battle-gen9randombattle-1234\n|init|battle\n|title|pilotbot vs. rival\n|player|p1|pilotbot|225|\n|turn|1";
        let parsed = parse_server_frame(frame);

        assert_eq!(
            parsed.room_id.as_deref(),
            Some("battle-gen9randombattle-1234")
        );
        assert_eq!(parsed.messages.len(), 4);
        assert_eq!(parsed.messages[0], ServerMessage::Init(RoomType::Battle));
        assert_eq!(parsed.messages[3], ServerMessage::Turn(1));
    }

    #[test]
    fn test_frame_keeps_going_after_bad_line() {
        let frame = ">battle-x\n|turn|soon\n|-crit|p2a: Heatran\n\n|upkeep";
        let parsed = parse_server_frame(frame);

        assert_eq!(parsed.messages.len(), 3);
        assert!(matches!(
            &parsed.messages[0],
            ServerMessage::Unparsed { line, .. } if line == "|turn|soon"
        ));
        assert!(matches!(parsed.messages[1], ServerMessage::Crit(_)));
        assert_eq!(parsed.messages[2], ServerMessage::Upkeep);
    }

    #[test]
    fn test_global_frame_has_no_room() {
        let parsed = parse_server_frame("|challstr|4|abc");
        assert!(parsed.room_id.is_none());
        assert_eq!(
            parsed.messages,
            vec![ServerMessage::Challstr("4|abc".into())]
        );
    }
}
