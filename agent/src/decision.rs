//! Per-battle decision loop
//!
//! The loop watches the shared battle state, asks the oracle for a choice
//! whenever the server requests one, and submits it. A rejected choice is
//! not an error: the loop narrows the options and asks again, up to the
//! retry budget of the current decision point.
//!
//! ```text
//!            request              reply               error
//!   Idle ─────────────► AwaitingOracle ──► Submitting ──────► AwaitingOracle
//!    ▲                                        │
//!    └──────────── next request ──────────────┘
//! ```
//!
//! Every phase moves to `Concluded` once the battle ends, is forfeited or
//! its room goes away.

use std::sync::Arc;
use std::time::Duration;

use pilot_battle::{BattleState, DecisionKind, FieldState, LegalActions, SideCondition, StatStages, Status, Volatile};
use pilot_client::{SessionError, SessionHandle};
use thiserror::Error;

use crate::command::{Command, CommandError, Exclusions, parse_reply, validate};
use crate::oracle::Oracle;
use crate::prompt;
use crate::reference::ReferenceData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the server to ask for a decision
    Idle,
    /// An oracle call is in flight
    AwaitingOracle,
    /// A choice was sent and the server has not answered yet
    Submitting,
    /// The battle is over for this loop
    Concluded,
}

/// How persistent the loop is after a failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Failed attempts allowed per decision point after the first one
    pub max_retries: u32,
    /// A rejection mentioning `trapped` or `switch` rules out every switch
    pub block_switches_on_trap: bool,
    /// A rejection mentioning `disabled` rules out the rejected move
    pub exclude_disabled_moves: bool,
    /// A rejection mentioning `terastal` rules out tera for the decision
    pub block_tera_on_rejection: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            block_switches_on_trap: true,
            exclude_disabled_moves: true,
            block_tera_on_rejection: true,
        }
    }
}

impl RetryPolicy {
    /// Rule out options after the server rejected `rejected` with `reason`
    pub fn narrow(&self, exclusions: &mut Exclusions, rejected: Command, reason: &str) {
        exclusions.exclude(rejected);

        let reason = reason.to_lowercase();
        if self.block_switches_on_trap && (reason.contains("trapped") || reason.contains("switch")) {
            exclusions.block_switching();
        }
        if self.exclude_disabled_moves
            && reason.contains("disabled")
            && let Command::Move { index, .. } = rejected
        {
            exclusions.exclude_move(index);
        }
        if self.block_tera_on_rejection && reason.contains("terastal") {
            exclusions.block_tera();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopConfig {
    /// Longest wait between two looks at the battle state
    pub poll_interval: Duration,
    /// Pause after a request so lines of the same turn can land
    pub settle_delay: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            settle_delay: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ActiveKey {
    name: String,
    hp_current: u32,
    hp_max: u32,
    fainted: bool,
    status: Option<Status>,
    boosts: StatStages,
    volatiles: Vec<Volatile>,
    terastallized: bool,
}

/// The parts of a battle that can change what the loop should do
///
/// Two snapshots with equal keys need no new look.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionKey {
    actives: Vec<Option<ActiveKey>>,
    field: FieldState,
    side_conditions: Vec<(Vec<SideCondition>, Vec<SideCondition>)>,
    decision_pending: bool,
    legal: Option<LegalActions>,
    request_seq: u64,
    rejection_seq: u64,
    ended: bool,
}

impl DecisionKey {
    pub fn of(battle: &BattleState) -> Self {
        let actives = battle
            .sides()
            .map(|side| {
                side.active_combatant().map(|c| ActiveKey {
                    name: c.name.clone(),
                    hp_current: c.hp_current,
                    hp_max: c.hp_max,
                    fainted: c.fainted,
                    status: c.status,
                    boosts: c.boosts.clone(),
                    volatiles: c.volatiles.clone(),
                    terastallized: c.terastallized,
                })
            })
            .collect();

        Self {
            actives,
            field: battle.field.clone(),
            side_conditions: battle
                .sides()
                .map(|side| (side.hazards.clone(), side.screens.clone()))
                .collect(),
            decision_pending: battle.decision_pending,
            legal: battle.legal.clone(),
            request_seq: battle.request_seq,
            rejection_seq: battle.rejection_seq,
            ended: battle.ended,
        }
    }
}

/// Identity of a decision; retries and exclusions live as long as it does
///
/// A point ends when the server accepts a choice. The next request often
/// arrives before its `|turn|` line, so the turn number cannot tell points
/// apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DecisionPoint {
    /// Choices accepted before this point
    accepted: u32,
    kind: DecisionKind,
}

/// A choice sent to the server, with the counters it was sent against
#[derive(Debug, Clone, Copy)]
struct Pending {
    command: Command,
    request_seq: u64,
    rejection_seq: u64,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("battle has concluded")]
    Concluded,

    #[error(transparent)]
    Invalid(#[from] CommandError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// What a loop did over its battle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopReport {
    pub submissions: u32,
    pub rejections: u32,
    pub abandoned: u32,
}

/// Plays one battle
pub struct DecisionLoop {
    room_id: String,
    handle: SessionHandle,
    oracle: Arc<dyn Oracle>,
    reference: Arc<dyn ReferenceData>,
    policy: RetryPolicy,
    config: LoopConfig,

    phase: Phase,
    last_key: Option<DecisionKey>,
    /// Highest request sequence a decision was started for
    answered_seq: u64,
    point: Option<DecisionPoint>,
    /// Choices the server accepted
    accepted: u32,
    /// Failed attempts at the current decision point
    retries: u32,
    exclusions: Exclusions,
    pending: Option<Pending>,
    report: LoopReport,
}

impl DecisionLoop {
    pub fn new(
        room_id: impl Into<String>,
        handle: SessionHandle,
        oracle: Arc<dyn Oracle>,
        reference: Arc<dyn ReferenceData>,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            handle,
            oracle,
            reference,
            policy: RetryPolicy::default(),
            config: LoopConfig::default(),
            phase: Phase::Idle,
            last_key: None,
            answered_seq: 0,
            point: None,
            accepted: 0,
            retries: 0,
            exclusions: Exclusions::new(),
            pending: None,
            report: LoopReport::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn exclusions(&self) -> &Exclusions {
        &self.exclusions
    }

    pub fn report(&self) -> &LoopReport {
        &self.report
    }

    /// Poll until the battle concludes
    pub async fn run(mut self) -> LoopReport {
        let mut version = self.handle.subscribe();
        tracing::info!(room = %self.room_id, "decision loop started");

        while self.poll().await != Phase::Concluded {
            if let Ok(Err(_)) = tokio::time::timeout(self.config.poll_interval, version.changed()).await {
                self.conclude("session state dropped");
            }
        }

        tracing::info!(
            room = %self.room_id,
            submissions = self.report.submissions,
            rejections = self.report.rejections,
            abandoned = self.report.abandoned,
            "decision loop finished"
        );
        self.report
    }

    /// Take one look at the battle and act on what changed
    pub async fn poll(&mut self) -> Phase {
        if self.phase == Phase::Concluded {
            return self.phase;
        }
        let Some(battle) = self.live_snapshot() else {
            return self.phase;
        };

        let key = DecisionKey::of(&battle);
        if self.last_key.as_ref() == Some(&key) {
            return self.phase;
        }
        self.last_key = Some(key);

        match self.phase {
            Phase::Submitting => self.check_submission(battle).await,
            Phase::Idle => self.start_if_needed(battle).await,
            Phase::AwaitingOracle | Phase::Concluded => {}
        }
        self.phase
    }

    /// Ask the oracle for a command
    ///
    /// A reply without a usable `CHOSEN MOVE:` line is retried once with
    /// a formatting correction appended.
    pub async fn request_decision(
        &self,
        battle: &BattleState,
        prior_error: Option<&str>,
    ) -> anyhow::Result<(String, Command)> {
        let prompt = prompt::decision_prompt(battle, self.reference.as_ref(), &self.exclusions, prior_error);
        let reply = self.oracle.decide(&prompt).await?;

        match parse_reply(&reply) {
            (rationale, Ok(command)) => Ok((rationale, command)),
            (_, Err(error)) => {
                tracing::warn!(room = %self.room_id, error = %error, "unusable oracle reply, asking again");
                let corrected = format!("{}\n\n{}", prompt, prompt::format_correction(&error));
                let reply = self.oracle.decide(&corrected).await?;
                let (rationale, command) = parse_reply(&reply);
                Ok((rationale, command?))
            }
        }
    }

    /// Validate a command against the latest state and send it
    ///
    /// Nothing is sent when validation fails or the battle is over.
    pub fn submit(&mut self, command: Command) -> Result<(), SubmitError> {
        let Some(battle) = self.live_snapshot() else {
            return Err(SubmitError::Concluded);
        };
        validate(command, &battle, &self.exclusions)?;

        self.handle.choose(&self.room_id, &command.to_choice())?;
        if command.is_tera() {
            self.handle.mark_tera_used(&self.room_id);
        }

        self.pending = Some(Pending {
            command,
            request_seq: battle.request_seq,
            rejection_seq: battle.rejection_seq,
        });
        self.answered_seq = self.answered_seq.max(battle.request_seq);
        self.phase = Phase::Submitting;
        self.report.submissions += 1;

        tracing::info!(room = %self.room_id, turn = battle.turn, choice = %command, "submitted choice");
        Ok(())
    }

    /// Forfeit the battle and stop
    pub fn forfeit(&mut self) -> Result<(), SessionError> {
        self.conclude("forfeited");
        self.handle.forfeit(&self.room_id)
    }

    fn conclude(&mut self, reason: &str) {
        if self.phase != Phase::Concluded {
            tracing::info!(room = %self.room_id, reason, "battle concluded");
            self.phase = Phase::Concluded;
            self.pending = None;
        }
    }

    /// Snapshot of a battle still in progress, concluding otherwise
    fn live_snapshot(&mut self) -> Option<BattleState> {
        match self.handle.snapshot(&self.room_id) {
            Some(battle) if !battle.ended => Some(battle),
            Some(_) => {
                self.conclude("battle ended");
                None
            }
            None => {
                self.conclude("battle room closed");
                None
            }
        }
    }

    async fn check_submission(&mut self, battle: BattleState) {
        let Some(pending) = self.pending else {
            self.phase = Phase::Idle;
            return self.start_if_needed(battle).await;
        };

        if battle.rejection_seq > pending.rejection_seq {
            let reason = battle
                .last_rejection
                .clone()
                .unwrap_or_else(|| "choice rejected".to_string());

            self.pending = None;
            self.report.rejections += 1;
            tracing::warn!(room = %self.room_id, choice = %pending.command, reason = %reason, "server rejected choice");

            self.policy.narrow(&mut self.exclusions, pending.command, &reason);
            if !self.record_failure(&reason, battle.request_seq) {
                return;
            }

            tokio::time::sleep(self.config.settle_delay).await;
            if let Some(battle) = self.live_snapshot() {
                self.decide(battle, Some(reason)).await;
            }
        } else if battle.request_seq > pending.request_seq {
            tracing::debug!(room = %self.room_id, choice = %pending.command, "choice accepted");
            self.pending = None;
            self.accepted += 1;
            self.phase = Phase::Idle;
            self.start_if_needed(battle).await;
        }
    }

    async fn start_if_needed(&mut self, battle: BattleState) {
        if !battle.decision_pending || battle.legal.is_none() || battle.request_seq <= self.answered_seq {
            return;
        }

        tokio::time::sleep(self.config.settle_delay).await;
        let Some(battle) = self.live_snapshot() else {
            return;
        };
        let Some(kind) = battle.legal.as_ref().filter(|_| battle.decision_pending).map(|l| l.kind) else {
            return;
        };

        let point = DecisionPoint {
            accepted: self.accepted,
            kind,
        };
        if self.point != Some(point) {
            tracing::debug!(room = %self.room_id, turn = battle.turn, kind = %kind, "new decision point");
            self.point = Some(point);
            self.retries = 0;
            self.exclusions = Exclusions::new();
        }
        self.answered_seq = battle.request_seq;

        if kind == DecisionKind::TeamPreview {
            self.submit_team_order(&battle);
            return;
        }
        if self.retries > self.policy.max_retries {
            // A request newer than the one given up on earns a fresh budget
            tracing::debug!(room = %self.room_id, "new request after giving up, trying again");
            self.retries = 0;
        }

        self.decide(battle, None).await;
    }

    /// Team preview is answered with the default order
    fn submit_team_order(&mut self, battle: &BattleState) {
        let size = battle
            .legal
            .as_ref()
            .map(|l| l.switches.len())
            .filter(|&n| n > 0)
            .unwrap_or(6)
            .min(9);
        let order: String = (1..=size).map(|i| i.to_string()).collect();

        match self.handle.choose(&self.room_id, &format!("team {}", order)) {
            Ok(()) => {
                self.report.submissions += 1;
                tracing::info!(room = %self.room_id, order = %order, "submitted team order");
            }
            Err(e) => {
                tracing::error!(room = %self.room_id, error = %e, "failed to send team order");
                self.conclude("session closed");
            }
        }
    }

    async fn decide(&mut self, mut battle: BattleState, mut prior_error: Option<String>) {
        loop {
            self.phase = Phase::AwaitingOracle;

            let outcome = tokio::select! {
                biased;
                _ = wait_concluded(self.handle.clone(), self.room_id.clone()) => None,
                result = self.request_decision(&battle, prior_error.as_deref()) => Some(result),
            };
            let Some(result) = outcome else {
                self.conclude("battle ended while waiting for the oracle");
                return;
            };

            let reason = match result {
                Ok((rationale, command)) => {
                    tracing::debug!(room = %self.room_id, rationale = %rationale, "oracle rationale");
                    match self.submit(command) {
                        Ok(()) => return,
                        Err(SubmitError::Concluded) => return,
                        Err(SubmitError::Session(e)) => {
                            tracing::error!(room = %self.room_id, error = %e, "failed to send choice");
                            self.conclude("session closed");
                            return;
                        }
                        Err(SubmitError::Invalid(e)) => {
                            tracing::warn!(room = %self.room_id, choice = %command, error = %e, "choice rejected locally");
                            self.exclusions.exclude(command);
                            e.to_string()
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(room = %self.room_id, error = %e, "oracle failed");
                    format!("{:#}", e)
                }
            };

            if !self.record_failure(&reason, battle.request_seq) {
                return;
            }

            let Some(fresh) = self.live_snapshot() else {
                return;
            };
            if !fresh.decision_pending {
                self.phase = Phase::Idle;
                return;
            }
            battle = fresh;
            prior_error = Some(reason);
        }
    }

    /// Count a failed attempt at the request `request_seq`, `false` once
    /// the retry budget is spent
    fn record_failure(&mut self, reason: &str, request_seq: u64) -> bool {
        self.retries += 1;
        if self.retries <= self.policy.max_retries {
            return true;
        }

        tracing::warn!(
            room = %self.room_id,
            attempts = self.retries,
            reason,
            "giving up on this decision"
        );
        self.handle.note(&self.room_id, format!("move failed: {}", reason));
        self.report.abandoned += 1;
        self.answered_seq = self.answered_seq.max(request_seq);
        self.phase = Phase::Idle;
        false
    }
}

/// Resolves once the battle in `room_id` is over or gone
async fn wait_concluded(handle: SessionHandle, room_id: String) {
    let mut version = handle.subscribe();
    loop {
        if handle.snapshot(&room_id).is_none_or(|battle| battle.ended) {
            return;
        }
        if version.changed().await.is_err() {
            return;
        }
    }
}
