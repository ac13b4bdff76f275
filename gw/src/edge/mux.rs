//! The edge control loop
//!
//! One loop multiplexes three event sources: inbound brain frames (bounded
//! 50 ms poll), the consent latch, and debounced motion triggers from the
//! sensor hub. Reconnection is explicit state, not an exception wrapper:
//! connect, drive until the link dies, back off, connect again. The hub and
//! the latch live outside the loop and survive every reconnect.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use eyre::Result;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use wallproto::{Envelope, Frames, MessageKind, RecvError};

use super::audio::AudioIo;
use super::consent::ConsentLatch;
use super::sensor::SensorHub;
use crate::config::Config;

/// Per-connection session tracking
#[derive(Debug)]
struct LinkState {
    in_session: bool,
    last_trigger: Option<Instant>,
    prev_motion: bool,
}

impl LinkState {
    fn new() -> Self {
        // prev_motion starts raised so a visitor already standing at the wall
        // cannot fire a trigger until the sensor has gone quiet once
        Self {
            in_session: false,
            last_trigger: None,
            prev_motion: true,
        }
    }

    /// Feed one motion sample; true means send a trigger now
    ///
    /// Armed only outside a session and outside the cooldown window; the
    /// previous-motion bit is updated only while armed, and a trigger needs
    /// a rising edge against it.
    fn observe_motion(&mut self, motion: bool, now: Instant, cooldown: Duration) -> bool {
        if self.in_session {
            return false;
        }
        if let Some(last) = self.last_trigger {
            if now.duration_since(last) < cooldown {
                return false;
            }
        }

        let rising = motion && !self.prev_motion;
        self.prev_motion = motion;
        if rising {
            self.in_session = true;
            self.last_trigger = Some(now);
        }
        rising
    }

    fn end_session(&mut self) {
        self.in_session = false;
        self.prev_motion = true;
    }
}

/// The edge process's client half
pub struct EdgeClient {
    config: Config,
    sensors: Arc<SensorHub>,
    consent: Arc<ConsentLatch>,
    audio: AudioIo,
}

impl EdgeClient {
    pub fn new(config: Config, sensors: Arc<SensorHub>, consent: Arc<ConsentLatch>) -> Self {
        let audio = AudioIo::new(config.audio.clone());
        Self {
            config,
            sensors,
            consent,
            audio,
        }
    }

    /// Connect, drive, back off, reconnect - forever
    pub async fn run(self) -> Result<()> {
        let addr = self.config.net.addr();
        loop {
            debug!(%addr, "connecting to brain");
            match TcpStream::connect(&addr).await {
                Ok(stream) => {
                    info!(%addr, "connected to brain");
                    let frames = Frames::new(stream, self.config.audio.playback_path());
                    if let Err(e) = self.drive(frames).await {
                        warn!(error = %e, "link lost");
                    }
                }
                Err(e) => {
                    warn!(%addr, error = %e, "connect failed");
                }
            }
            tokio::time::sleep(self.config.session.reconnect_delay()).await;
        }
    }

    /// The control loop for one live connection
    async fn drive<S>(&self, mut frames: Frames<S>) -> Result<(), RecvError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut link = LinkState::new();
        loop {
            match frames.recv(self.config.session.poll_interval()).await {
                Ok(envelope) => self.dispatch(envelope, &mut frames, &mut link).await?,
                Err(RecvError::Timeout(_)) => {}
                Err(e) => return Err(e),
            }

            if self.consent.take() && link.in_session {
                debug!("forwarding consent press");
                frames.send(Envelope::consent()).await?;
            }

            let snapshot = self.sensors.snapshot();
            if link.observe_motion(
                snapshot.motion,
                Instant::now(),
                self.config.session.trigger_cooldown(),
            ) {
                info!(soil = snapshot.soil_percent, "motion detected, triggering session");
                self.consent.clear();
                frames.send(Envelope::motion_trigger(snapshot.soil_percent)).await?;
            }
        }
    }

    async fn dispatch<S>(
        &self,
        envelope: Envelope,
        frames: &mut Frames<S>,
        link: &mut LinkState,
    ) -> Result<(), RecvError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        debug!(kind = ?envelope.kind, "frame from brain");
        match envelope.kind {
            MessageKind::IntroUtterance => {
                // Play only, never record after
                self.play_if_present(&envelope, frames.blob_path()).await;
            }
            MessageKind::ChatTurn => {
                self.play_if_present(&envelope, frames.blob_path()).await;
                self.record_and_submit(frames).await?;
            }
            MessageKind::SoilQuery => {
                let snapshot = self.sensors.snapshot();
                debug!(soil = snapshot.soil_percent, "answering soil query");
                frames.send(Envelope::soil_reading(snapshot.soil_percent)).await?;
            }
            MessageKind::SessionEnd => {
                info!("session ended by brain");
                link.end_session();
                self.consent.clear();
            }
            kind => debug!(?kind, "ignoring unexpected frame"),
        }
        Ok(())
    }

    /// Play the delivered utterance, skipping silent frames
    async fn play_if_present(&self, envelope: &Envelope, path: &Path) {
        if envelope.blob_size == 0 {
            debug!("silent frame, nothing to play");
            return;
        }
        if let Err(e) = self.audio.play(path).await {
            warn!(error = %e, "playback failed");
        }
    }

    /// Capture one visitor turn and submit it
    ///
    /// A failed or empty capture submits nothing; the brain's turn wait
    /// decides what happens next.
    async fn record_and_submit<S>(&self, frames: &mut Frames<S>) -> Result<(), RecvError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let capture = self.config.audio.capture_path();
        // Stale capture from the previous turn must never be resubmitted
        let _ = tokio::fs::remove_file(&capture).await;

        if let Err(e) = self.audio.record(&capture, self.config.session.record_secs).await {
            warn!(error = %e, "recording failed, submitting nothing");
            return Ok(());
        }

        match tokio::fs::read(&capture).await {
            Ok(bytes) if !bytes.is_empty() => {
                info!(bytes = bytes.len(), "submitting recorded turn");
                frames.send_with_blob(Envelope::audio_submission(), &bytes).await?;
            }
            Ok(_) => warn!("recorder produced an empty file, submitting nothing"),
            Err(e) => warn!(error = %e, "recorded file unreadable, submitting nothing"),
        }
        Ok(())
    }
}
