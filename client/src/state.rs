use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use pilot_battle::{BattleState, Transcript};
use pilot_protocol::{ChallengeState, RoomType, ServerFrame, ServerMessage};
use tokio::sync::watch;

use crate::events::{BattleConcluded, Outcome, SessionEvent};

/// Information about the currently logged-in user
#[derive(Debug, Clone, PartialEq)]
pub struct UserInfo {
    pub username: String,
    pub logged_in: bool,
    pub avatar: String,
}

/// The battle currently being played
#[derive(Debug, Clone)]
pub struct BattleRoom {
    pub room_id: String,
    pub state: BattleState,
    pub transcript: Transcript,
    pub forfeited: bool,
}

impl BattleRoom {
    fn new(room_id: &str, own_username: Option<&str>) -> Self {
        let state = match own_username {
            Some(name) => BattleState::for_user(room_id, name),
            None => BattleState::new(room_id),
        };
        Self {
            room_id: room_id.to_string(),
            state,
            transcript: Transcript::new(),
            forfeited: false,
        }
    }

    fn conclude(self) -> BattleConcluded {
        let outcome = if self.forfeited {
            Outcome::Forfeited
        } else if self.state.tie {
            Outcome::Tie
        } else {
            match &self.state.winner {
                Some(winner) if self.state.is_own_username(winner) => Outcome::Won,
                Some(_) => Outcome::Lost,
                None => Outcome::Abandoned,
            }
        };

        BattleConcluded {
            room_id: self.room_id,
            final_state: self.state,
            transcript: self.transcript,
            outcome,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    challstr: Option<String>,
    user: Option<UserInfo>,
    own_username: Option<String>,
    challenges: ChallengeState,
    battle: Option<BattleRoom>,
}

/// State shared between the receive loop and every [`SessionHandle`]
///
/// The receive loop is the only writer of battle facts. Locks are held only
/// for the duration of a frame and never across an `.await`.
///
/// [`SessionHandle`]: crate::SessionHandle
#[derive(Debug)]
pub struct SessionState {
    inner: RwLock<Inner>,
    version: watch::Sender<u64>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            inner: RwLock::new(Inner::default()),
            version,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a frame and report what happened
    ///
    /// Battle lines go through the interpreter in arrival order. The watch
    /// version is bumped once per frame after all lines are applied.
    pub fn process_frame(&self, frame: &ServerFrame) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        {
            let mut inner = self.write();
            let room = frame.room_id.as_deref().filter(|r| !r.is_empty());

            for msg in &frame.messages {
                match room {
                    Some(room_id) => process_room_message(&mut inner, room_id, msg, &mut events),
                    None => process_global_message(&mut inner, msg, &mut events),
                }
            }
        }

        self.version.send_modify(|v| *v += 1);
        events
    }

    /// Subscribe to frame notifications
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Clone of the battle in `room_id`, if it is still in progress
    pub fn snapshot(&self, room_id: &str) -> Option<BattleState> {
        self.read()
            .battle
            .as_ref()
            .filter(|b| b.room_id == room_id && !b.forfeited)
            .map(|b| b.state.clone())
    }

    /// Clone of the transcript so far for the battle in `room_id`
    pub fn transcript(&self, room_id: &str) -> Option<Transcript> {
        self.read()
            .battle
            .as_ref()
            .filter(|b| b.room_id == room_id)
            .map(|b| b.transcript.clone())
    }

    /// Room id of the battle in progress
    pub fn current_battle(&self) -> Option<String> {
        self.read().battle.as_ref().map(|b| b.room_id.clone())
    }

    pub fn challstr(&self) -> Option<String> {
        self.read().challstr.clone()
    }

    pub fn user(&self) -> Option<UserInfo> {
        self.read().user.clone()
    }

    pub fn challenges(&self) -> ChallengeState {
        self.read().challenges.clone()
    }

    /// Name used to recognize our side in new battles
    pub fn set_own_username(&self, username: &str) {
        self.write().own_username = Some(username.to_string());
    }

    /// Record that our side has spent its terastallization
    pub fn mark_tera_used(&self, room_id: &str) {
        if let Some(battle) = self.write().battle.as_mut().filter(|b| b.room_id == room_id) {
            battle.state.mark_tera_used();
        }
        self.version.send_modify(|v| *v += 1);
    }

    /// Flag the battle as forfeited so no further decisions are made for it
    pub fn mark_forfeited(&self, room_id: &str) {
        if let Some(battle) = self.write().battle.as_mut().filter(|b| b.room_id == room_id) {
            battle.forfeited = true;
        }
        self.version.send_modify(|v| *v += 1);
    }

    /// Append a line to the battle's transcript
    pub fn note(&self, room_id: &str, text: impl Into<String>) {
        if let Some(battle) = self.write().battle.as_mut().filter(|b| b.room_id == room_id) {
            battle.transcript.push(text);
        }
    }
}

fn process_global_message(inner: &mut Inner, msg: &ServerMessage, events: &mut Vec<SessionEvent>) {
    match msg {
        ServerMessage::Challstr(challstr) => {
            inner.challstr = Some(challstr.clone());
            events.push(SessionEvent::Challstr(challstr.clone()));
        }
        ServerMessage::UpdateUser {
            user,
            named,
            avatar,
        } => {
            inner.user = Some(UserInfo {
                username: user.username.clone(),
                logged_in: *named,
                avatar: avatar.clone(),
            });
            if *named {
                inner.own_username = Some(user.username.clone());
            }
            events.push(SessionEvent::UserUpdated {
                username: user.username.clone(),
                named: *named,
            });
        }
        ServerMessage::NameTaken { username, message } => {
            events.push(SessionEvent::NameTaken {
                username: username.clone(),
                message: message.clone(),
            });
        }
        ServerMessage::UpdateChallenges(challenges) => {
            inner.challenges = challenges.clone();
            events.push(SessionEvent::Challenges(challenges.clone()));
        }
        ServerMessage::Popup(text) => {
            events.push(SessionEvent::Popup(text.clone()));
        }
        ServerMessage::Pm {
            sender, message, ..
        } => {
            events.push(SessionEvent::Pm {
                from: sender.username.clone(),
                message: message.clone(),
            });
        }
        ServerMessage::Unparsed { line, error } => {
            tracing::warn!(line = %line, error = %error, "skipping unparseable line");
        }
        ServerMessage::Raw(line) if line.is_empty() => {}
        ServerMessage::Raw(line) => {
            events.push(SessionEvent::Raw {
                room: None,
                line: line.clone(),
            });
        }
        _ => {}
    }
}

fn process_room_message(
    inner: &mut Inner,
    room_id: &str,
    msg: &ServerMessage,
    events: &mut Vec<SessionEvent>,
) {
    match msg {
        ServerMessage::Init(RoomType::Battle) => {
            if let Some(previous) = inner.battle.take() {
                tracing::warn!(room = %previous.room_id, "replacing unfinished battle");
                events.push(SessionEvent::BattleConcluded(Box::new(previous.conclude())));
            }
            tracing::info!(room = %room_id, "battle started");
            inner.battle = Some(BattleRoom::new(room_id, inner.own_username.as_deref()));
            events.push(SessionEvent::BattleStarted {
                room_id: room_id.to_string(),
            });
            return;
        }
        ServerMessage::Deinit => {
            if inner.battle.as_ref().is_some_and(|b| b.room_id == room_id)
                && let Some(battle) = inner.battle.take()
            {
                tracing::info!(room = %room_id, "battle room closed");
                events.push(SessionEvent::BattleConcluded(Box::new(battle.conclude())));
            }
            return;
        }
        _ => {}
    }

    let Some(battle) = inner.battle.as_mut().filter(|b| b.room_id == room_id) else {
        if let ServerMessage::Raw(line) = msg
            && !line.is_empty()
        {
            events.push(SessionEvent::Raw {
                room: Some(room_id.to_string()),
                line: line.clone(),
            });
        }
        return;
    };

    let narrated = battle.state.apply(msg);
    if !narrated.is_empty() {
        battle.transcript.record(battle.state.turn, narrated.clone());
        events.push(SessionEvent::BattleEvents {
            room_id: room_id.to_string(),
            events: narrated,
        });
    }

    // Taking the room out makes the conclusion a one-time event
    if battle.state.ended
        && let Some(battle) = inner.battle.take()
    {
        tracing::info!(room = %room_id, winner = ?battle.state.winner, "battle ended");
        events.push(SessionEvent::BattleConcluded(Box::new(battle.conclude())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilot_protocol::parse_server_frame;

    const ROOM: &str = "battle-gen9randombattle-42";

    fn process(state: &SessionState, text: &str) -> Vec<SessionEvent> {
        state.process_frame(&parse_server_frame(text))
    }

    fn start_battle(state: &SessionState) {
        process(state, "|updateuser| Pilot|1|1|{}");
        process(
            state,
            &format!(
                ">{ROOM}\n|init|battle\n|title|Pilot vs. Rival\n|player|p1|Pilot|1|\n|player|p2|Rival|2|\n|switch|p2a: Heatran|Heatran, L80|100/100\n|turn|1"
            ),
        );
    }

    #[test]
    fn test_global_messages_are_recorded() {
        let state = SessionState::new();
        let events = process(&state, "|challstr|4|abcdef");
        assert!(matches!(&events[..], [SessionEvent::Challstr(c)] if c == "4|abcdef"));
        assert_eq!(state.challstr().as_deref(), Some("4|abcdef"));

        process(&state, "|updateuser| Pilot|1|1|{}");
        let user = state.user().unwrap();
        assert_eq!(user.username, "Pilot");
        assert!(user.logged_in);
    }

    #[test]
    fn test_battle_lifecycle() {
        let state = SessionState::new();
        start_battle(&state);

        assert_eq!(state.current_battle().as_deref(), Some(ROOM));
        let snapshot = state.snapshot(ROOM).unwrap();
        assert_eq!(snapshot.turn, 1);
        assert_eq!(snapshot.perspective(), Some(pilot_battle::Player::P1));
        assert!(state.snapshot("battle-other-1").is_none());

        let events = process(&state, &format!(">{ROOM}\n|faint|p2a: Heatran\n|win|Pilot"));
        let concluded: Vec<&BattleConcluded> = events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::BattleConcluded(c) => Some(c.as_ref()),
                _ => None,
            })
            .collect();

        assert_eq!(concluded.len(), 1);
        assert_eq!(concluded[0].outcome, Outcome::Won);
        assert!(concluded[0].final_state.ended);
        assert!(concluded[0].transcript.render().contains("Pilot won the battle!"));

        assert!(state.current_battle().is_none());
        assert!(state.snapshot(ROOM).is_none());
    }

    #[test]
    fn test_conclusion_is_delivered_once() {
        let state = SessionState::new();
        start_battle(&state);

        let first = process(&state, &format!(">{ROOM}\n|win|Rival"));
        let second = process(&state, &format!(">{ROOM}\n|win|Rival\n|deinit"));

        let count = first
            .iter()
            .chain(second.iter())
            .filter(|e| matches!(e, SessionEvent::BattleConcluded(_)))
            .count();
        assert_eq!(count, 1);
        assert!(matches!(
            &first[..],
            [SessionEvent::BattleEvents { .. }, SessionEvent::BattleConcluded(c)] if c.outcome == Outcome::Lost
        ));
    }

    #[test]
    fn test_deinit_abandons_battle() {
        let state = SessionState::new();
        start_battle(&state);

        let events = process(&state, &format!(">{ROOM}\n|deinit"));
        assert!(matches!(
            &events[..],
            [SessionEvent::BattleConcluded(c)] if c.outcome == Outcome::Abandoned
        ));
    }

    #[test]
    fn test_forfeit_hides_snapshot() {
        let state = SessionState::new();
        start_battle(&state);
        state.mark_forfeited(ROOM);

        assert!(state.snapshot(ROOM).is_none());
        let events = process(&state, &format!(">{ROOM}\n|win|Rival"));
        assert!(events.iter().any(
            |e| matches!(e, SessionEvent::BattleConcluded(c) if c.outcome == Outcome::Forfeited)
        ));
    }

    #[test]
    fn test_version_bumps_per_frame() {
        let state = SessionState::new();
        let rx = state.subscribe();
        start_battle(&state);
        assert_eq!(*rx.borrow(), 2);

        state.mark_tera_used(ROOM);
        assert_eq!(*rx.borrow(), 3);
        assert!(state.snapshot(ROOM).unwrap().tera_used());
    }

    #[test]
    fn test_note_appends_to_transcript() {
        let state = SessionState::new();
        start_battle(&state);
        state.note(ROOM, "move failed: [Invalid choice]");

        let events = process(&state, &format!(">{ROOM}\n|win|Pilot"));
        let Some(SessionEvent::BattleConcluded(concluded)) = events.last() else {
            panic!("expected conclusion");
        };
        assert!(
            concluded
                .transcript
                .events()
                .contains(&"move failed: [Invalid choice]".to_string())
        );
    }

    #[test]
    fn test_lines_for_other_rooms_are_raw() {
        let state = SessionState::new();
        let events = process(&state, ">lobby\n|c|+Someone|hello");
        assert!(matches!(
            &events[..],
            [SessionEvent::Raw { room: Some(room), .. }] if room == "lobby"
        ));
    }
}
