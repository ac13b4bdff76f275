//! One conversation, from motion trigger to session end
//!
//! The machine is an explicit state loop. Every wait is bounded and a missed
//! deadline is a transition, never an error; only a broken link escapes as
//! `SessionError`, at which point the accept loop drops the connection and
//! the session with it.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use wallproto::{Envelope, Frames, MessageKind, RecvError};

use super::phrases;
use crate::config::SessionConfig;
use crate::llm::{ChatMessage, Responder};
use crate::speech::{Synthesizer, Transcriber};

/// Where the machine is in one conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Intro,
    AwaitConsent,
    PreChat,
    Chatting,
    Terminated,
    Aborted,
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The chat ran and ended cleanly (exit keyword or turn timeout)
    Completed,
    /// The visitor never consented
    Aborted,
}

/// A session-fatal failure; the connection is abandoned with it
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport fault: {0}")]
    Transport(RecvError),

    #[error("send failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Server-side state for one conversation
pub struct Session<'a, S> {
    frames: &'a mut Frames<S>,
    synth: Arc<dyn Synthesizer>,
    transcriber: Arc<dyn Transcriber>,
    responder: Arc<dyn Responder>,
    config: SessionConfig,
    soil_at_trigger: i64,
    history: Vec<ChatMessage>,
}

impl<'a, S: AsyncRead + AsyncWrite + Unpin> Session<'a, S> {
    /// Start a session from a received motion trigger
    pub fn new(
        frames: &'a mut Frames<S>,
        synth: Arc<dyn Synthesizer>,
        transcriber: Arc<dyn Transcriber>,
        responder: Arc<dyn Responder>,
        config: SessionConfig,
        trigger: &Envelope,
    ) -> Self {
        Self {
            frames,
            synth,
            transcriber,
            responder,
            config,
            soil_at_trigger: trigger.soil_percent(),
            history: vec![ChatMessage::system(phrases::SYSTEM_PROMPT)],
        }
    }

    /// Drive the conversation to its end
    pub async fn run(mut self) -> Result<SessionOutcome, SessionError> {
        let mut state = SessionState::Intro;
        loop {
            debug!(?state, "session: entering state");
            state = match state {
                SessionState::Intro => self.intro().await?,
                SessionState::AwaitConsent => self.await_consent().await?,
                SessionState::PreChat => self.pre_chat().await?,
                SessionState::Chatting => self.chat().await?,
                SessionState::Terminated => {
                    self.frames.send(Envelope::session_end()).await?;
                    info!("session: terminated");
                    return Ok(SessionOutcome::Completed);
                }
                SessionState::Aborted => {
                    self.speak(Envelope::intro_utterance(), phrases::FAREWELL).await?;
                    self.frames.send(Envelope::session_end()).await?;
                    info!("session: aborted without consent");
                    return Ok(SessionOutcome::Aborted);
                }
            };
        }
    }

    async fn intro(&mut self) -> Result<SessionState, SessionError> {
        info!(
            soil = self.soil_at_trigger,
            dry = self.soil_at_trigger < self.config.dry_threshold,
            "session: speaking intro"
        );
        let line = phrases::intro_line(self.soil_at_trigger, self.config.dry_threshold);
        self.speak(Envelope::intro_utterance(), &line).await?;
        Ok(SessionState::AwaitConsent)
    }

    /// First consent wait, one reminder, second wait, then give up
    async fn await_consent(&mut self) -> Result<SessionState, SessionError> {
        if self.wait_for_consent(self.config.consent_wait()).await? {
            return Ok(SessionState::PreChat);
        }

        info!("session: no consent yet, speaking the reminder");
        self.speak(Envelope::intro_utterance(), phrases::REMINDER).await?;

        if self.wait_for_consent(self.config.consent_retry()).await? {
            return Ok(SessionState::PreChat);
        }
        Ok(SessionState::Aborted)
    }

    /// Wait up to `wait` for a consent frame; other kinds are ignored
    async fn wait_for_consent(&mut self, wait: Duration) -> Result<bool, SessionError> {
        let deadline = Instant::now() + wait;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            match self.recv_within(remaining).await? {
                Some(envelope) if envelope.kind == MessageKind::Consent => return Ok(true),
                Some(envelope) => {
                    debug!(kind = ?envelope.kind, "session: ignoring frame while waiting for consent");
                }
                None => return Ok(false),
            }
        }
    }

    /// Recheck a dry reading now that someone had a chance to water, then
    /// open the chat with the contrast remark
    async fn pre_chat(&mut self) -> Result<SessionState, SessionError> {
        let was_dry = self.soil_at_trigger < self.config.dry_threshold;
        let remark = if was_dry {
            let fresh = self.query_soil().await?.unwrap_or(self.soil_at_trigger);
            info!(stale = self.soil_at_trigger, fresh, "session: soil rechecked");
            phrases::recheck_line(fresh, self.config.dry_threshold)
        } else {
            phrases::READY.to_string()
        };

        let opening = phrases::opening_line(&remark);
        self.speak(Envelope::chat_turn(), &opening).await?;
        self.history.push(ChatMessage::assistant(opening));
        Ok(SessionState::Chatting)
    }

    /// The turn-taking loop
    async fn chat(&mut self) -> Result<SessionState, SessionError> {
        loop {
            let envelope = match self.recv_within(self.config.turn_wait()).await? {
                Some(envelope) => envelope,
                None => {
                    info!("session: turn wait expired, ending the conversation");
                    return Ok(SessionState::Terminated);
                }
            };

            if envelope.kind != MessageKind::AudioSubmission {
                debug!(kind = ?envelope.kind, "session: ignoring non-audio frame mid-chat");
                continue;
            }

            let transcript = if envelope.blob_size == 0 {
                warn!("session: audio submission carried no blob");
                String::new()
            } else {
                match self.transcriber.transcribe(self.frames.blob_path()).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "session: transcription failed, treating as silence");
                        String::new()
                    }
                }
            };

            if transcript.is_empty() {
                self.speak(Envelope::chat_turn(), phrases::DIDNT_HEAR).await?;
                continue;
            }
            info!(%transcript, "session: visitor said");

            if phrases::wants_exit(&transcript) {
                self.speak(Envelope::intro_utterance(), phrases::FAREWELL).await?;
                return Ok(SessionState::Terminated);
            }

            if phrases::wants_status(&transcript) {
                if let Some(fresh) = self.query_soil().await? {
                    self.history.push(ChatMessage::system(phrases::soil_note(fresh)));
                }
            }

            self.history.push(ChatMessage::user(transcript));
            let reply = match self.responder.respond(&self.history).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(error = %e, "session: generator failed, using the apology line");
                    phrases::APOLOGY.to_string()
                }
            };
            debug!(chars = reply.len(), "session: wall replies");
            self.history.push(ChatMessage::assistant(reply.clone()));
            self.speak(Envelope::chat_turn(), &reply).await?;
        }
    }

    /// Bounded query for a fresh reading; `None` when the edge does not answer
    async fn query_soil(&mut self) -> Result<Option<i64>, SessionError> {
        self.frames.send(Envelope::soil_query()).await?;
        match self.recv_within(self.config.soil_recheck()).await? {
            Some(envelope) if envelope.kind == MessageKind::SoilReading => Ok(Some(envelope.soil_percent())),
            Some(envelope) => {
                warn!(kind = ?envelope.kind, "session: unexpected frame instead of a soil reading");
                Ok(None)
            }
            None => {
                warn!("session: soil query timed out");
                Ok(None)
            }
        }
    }

    /// Synthesize and send one spoken frame
    ///
    /// Synthesis failure still sends the frame, blobless, so the protocol's
    /// strict alternation survives a speech outage.
    async fn speak(&mut self, envelope: Envelope, text: &str) -> Result<(), SessionError> {
        match self.synth.synthesize(text).await {
            Ok(path) => match tokio::fs::read(&path).await {
                Ok(bytes) => self.frames.send_with_blob(envelope, &bytes).await?,
                Err(e) => {
                    warn!(error = %e, "session: synthesized audio unreadable, sending silent frame");
                    self.frames.send(envelope).await?;
                }
            },
            Err(e) => {
                warn!(error = %e, "session: synthesis failed, sending silent frame");
                self.frames.send(envelope).await?;
            }
        }
        Ok(())
    }

    /// Bounded receive where a timeout is a value, not an error
    async fn recv_within(&mut self, wait: Duration) -> Result<Option<Envelope>, SessionError> {
        match self.frames.recv(wait).await {
            Ok(envelope) => Ok(Some(envelope)),
            Err(RecvError::Timeout(_)) => Ok(None),
            Err(e) => Err(SessionError::Transport(e)),
        }
    }
}
