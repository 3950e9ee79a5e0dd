//! Session handler that logs in, challenges and plays
//!
//! One [`DecisionLoop`] task is spawned per battle room. Everything after a
//! battle (analysis, private messages, the next challenge or quitting) runs
//! in its own task so the receive loop is never blocked on the oracle.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use pilot_client::{BattleConcluded, Session, SessionError, SessionHandle, SessionHandler};
use pilot_protocol::ChallengeState;
use tokio::task::JoinHandle;

use crate::config::Args;
use crate::decision::{DecisionLoop, LoopReport};
use crate::llm::LlmOracle;
use crate::oracle::Oracle;
use crate::prompt;
use crate::reference::{JsonReferenceData, NoReferenceData, ReferenceData};

/// Pause before challenging again
pub const RECHALLENGE_DELAY: Duration = Duration::from_secs(2);

/// Longest private message the server accepts
const PM_LIMIT: usize = 300;

pub struct Pilot {
    args: Args,
    handle: SessionHandle,
    oracle: Arc<dyn Oracle>,
    reference: Arc<dyn ReferenceData>,
    rechallenge_delay: Duration,

    logged_in: bool,
    completed: u32,
    current: Option<JoinHandle<LoopReport>>,
    fatal: Option<SessionError>,
}

impl Pilot {
    pub fn new(
        args: Args,
        handle: SessionHandle,
        oracle: Arc<dyn Oracle>,
        reference: Arc<dyn ReferenceData>,
    ) -> Self {
        Self {
            args,
            handle,
            oracle,
            reference,
            rechallenge_delay: RECHALLENGE_DELAY,
            logged_in: false,
            completed: 0,
            current: None,
            fatal: None,
        }
    }

    pub fn with_rechallenge_delay(mut self, delay: Duration) -> Self {
        self.rechallenge_delay = delay;
        self
    }

    /// Battles finished so far
    pub fn completed(&self) -> u32 {
        self.completed
    }

    /// Error that ended the session, if any
    pub fn take_fatal(&mut self) -> Option<SessionError> {
        self.fatal.take()
    }

    fn fail(&mut self, error: SessionError) {
        tracing::error!(error = %error, "giving up on the session");
        self.fatal = Some(error);
        if let Err(e) = self.handle.quit() {
            tracing::debug!(error = %e, "quit after failure not sent");
        }
    }
}

#[async_trait]
impl SessionHandler for Pilot {
    async fn on_challstr(&mut self, _challstr: &str) {
        if let Err(e) = self.handle.login(&self.args.username, &self.args.password).await {
            self.fail(e);
        }
    }

    async fn on_logged_in(&mut self, username: &str) {
        if self.logged_in {
            return;
        }
        self.logged_in = true;
        tracing::info!(username = %username, "logged in");

        if let Some(avatar) = &self.args.avatar
            && let Err(e) = self.handle.set_avatar(avatar)
        {
            tracing::warn!(avatar = %avatar, error = %e, "failed to set avatar");
        }

        tracing::info!(opponent = %self.args.opponent, format = %self.args.format, "sending challenge");
        if let Err(e) = self.handle.challenge(&self.args.opponent, &self.args.format) {
            self.fail(e);
        }
    }

    async fn on_name_taken(&mut self, username: &str, message: &str) {
        self.fail(SessionError::Auth(format!("{}: {}", username, message)));
    }

    async fn on_challenges(&mut self, challenges: &ChallengeState) {
        tracing::debug!(
            incoming = challenges.challenges_from.len(),
            outgoing = challenges.challenge_to.is_some(),
            "challenges updated"
        );
    }

    async fn on_popup(&mut self, message: &str) {
        tracing::warn!(message = %message, "server popup");
    }

    async fn on_pm(&mut self, from: &str, message: &str) {
        tracing::info!(from = %from, message = %message, "private message");
    }

    async fn on_battle_started(&mut self, room_id: &str) {
        if let Some(previous) = self.current.take()
            && !previous.is_finished()
        {
            tracing::warn!("previous decision loop still running, stopping it");
            previous.abort();
        }

        let decision_loop = DecisionLoop::new(
            room_id,
            self.handle.clone(),
            Arc::clone(&self.oracle),
            Arc::clone(&self.reference),
        )
        .with_policy(self.args.retry_policy())
        .with_config(self.args.loop_config());

        self.current = Some(tokio::spawn(decision_loop.run()));
    }

    async fn on_battle_events(&mut self, room_id: &str, events: &[String]) {
        for event in events {
            tracing::debug!(room = %room_id, "{}", event.trim());
        }
    }

    async fn on_battle_concluded(&mut self, concluded: BattleConcluded) {
        self.completed += 1;
        tracing::info!(
            room = %concluded.room_id,
            outcome = %concluded.outcome,
            turns = concluded.final_state.turn,
            completed = self.completed,
            target = self.args.battles,
            "battle finished"
        );

        let follow_up = FollowUp {
            handle: self.handle.clone(),
            oracle: Arc::clone(&self.oracle),
            reference: Arc::clone(&self.reference),
            opponent: self.args.opponent.clone(),
            format: self.args.format.clone(),
            analyse: self.args.post_battle_analysis,
            rechallenge: (self.completed < self.args.battles).then_some(self.rechallenge_delay),
        };
        tokio::spawn(follow_up.run(concluded));
    }

    async fn on_raw(&mut self, room: Option<&str>, content: &str) {
        tracing::trace!(room = ?room, line = %content, "unhandled line");
    }
}

/// Work done after a battle ends
struct FollowUp {
    handle: SessionHandle,
    oracle: Arc<dyn Oracle>,
    reference: Arc<dyn ReferenceData>,
    opponent: String,
    format: String,
    analyse: bool,
    /// Delay before the next challenge, `None` to quit
    rechallenge: Option<Duration>,
}

impl FollowUp {
    async fn run(self, concluded: BattleConcluded) {
        if self.analyse {
            self.send_analysis(&concluded).await;
        }

        let result = match self.rechallenge {
            Some(delay) => {
                tokio::time::sleep(delay).await;
                tracing::info!(opponent = %self.opponent, "challenging again");
                self.handle.challenge(&self.opponent, &self.format)
            }
            None => {
                tracing::info!("all battles played, quitting");
                self.handle.quit()
            }
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "session closed before follow-up");
        }
    }

    async fn send_analysis(&self, concluded: &BattleConcluded) {
        self.pm("Analyzing battle results...");

        let prompt = prompt::analysis_prompt(concluded, self.reference.as_ref());
        match self.oracle.decide(&prompt).await {
            Ok(analysis) => {
                tracing::info!(room = %concluded.room_id, "post-battle analysis:\n{}", analysis);
                for line in pm_lines(&analysis) {
                    self.pm(&line);
                }
            }
            Err(e) => tracing::warn!(room = %concluded.room_id, error = %e, "analysis failed"),
        }
    }

    fn pm(&self, message: &str) {
        if let Err(e) = self.handle.pm(&self.opponent, message) {
            tracing::warn!(to = %self.opponent, error = %e, "failed to send private message");
        }
    }
}

/// Split text into non-empty lines that fit in one private message each
fn pm_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.chars().count() > PM_LIMIT {
                let mut cut: String = line.chars().take(PM_LIMIT - 3).collect();
                cut.push_str("...");
                cut
            } else {
                line.to_string()
            }
        })
        .collect()
}

/// Connect, play the configured number of battles and disconnect
pub async fn run(args: Args) -> anyhow::Result<()> {
    let oracle: Arc<dyn Oracle> =
        Arc::new(LlmOracle::new(args.llm_config()).context("cannot configure the LLM oracle")?);

    let reference: Arc<dyn ReferenceData> = match &args.reference_data {
        Some(path) => Arc::new(JsonReferenceData::from_path(path)?),
        None => Arc::new(NoReferenceData),
    };

    let config = args.session_config();
    tracing::info!(server = %config.server_url, username = %args.username, "connecting");
    let (mut session, handle) = Session::connect(&config).await?;

    let mut pilot = Pilot::new(args, handle, oracle, reference);
    session.run(&mut pilot).await?;

    if let Some(error) = pilot.take_fatal() {
        return Err(error.into());
    }
    tracing::info!(battles = pilot.completed(), "session finished");
    Ok(())
}
