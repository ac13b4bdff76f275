//! Accept loop for the brain process
//!
//! One edge device at a time: accept, serve the connection until it drops,
//! accept again. Sessions never outlive their connection.

use std::sync::Arc;
use std::time::Duration;

use eyre::{Context, Result};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use wallproto::{Frames, MessageKind, RecvError};

use super::session::{Session, SessionError};
use crate::config::Config;
use crate::llm::Responder;
use crate::speech::{Synthesizer, Transcriber};

/// Idle poll while waiting for a motion trigger; timeouts just loop
const TRIGGER_IDLE_WAIT: Duration = Duration::from_secs(60);

/// The brain's TCP server
pub struct BrainServer {
    config: Config,
    synth: Arc<dyn Synthesizer>,
    transcriber: Arc<dyn Transcriber>,
    responder: Arc<dyn Responder>,
}

impl BrainServer {
    pub fn new(
        config: Config,
        synth: Arc<dyn Synthesizer>,
        transcriber: Arc<dyn Transcriber>,
        responder: Arc<dyn Responder>,
    ) -> Self {
        Self {
            config,
            synth,
            transcriber,
            responder,
        }
    }

    /// Accept and serve edge connections forever
    pub async fn run(self) -> Result<()> {
        let addr = self.config.net.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        info!(%addr, "brain listening");

        loop {
            let (stream, peer) = listener.accept().await.context("Accept failed")?;
            info!(%peer, "edge connected");
            match self.serve_connection(stream).await {
                Ok(()) => info!(%peer, "edge disconnected"),
                Err(e) => warn!(%peer, error = %e, "connection lost"),
            }
        }
    }

    /// Drive one connection: wait for triggers, run sessions, repeat
    async fn serve_connection<S>(&self, stream: S) -> Result<(), SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut frames = Frames::new(stream, self.config.audio.inbound_audio_path());

        loop {
            match frames.recv(TRIGGER_IDLE_WAIT).await {
                Ok(envelope) if envelope.kind == MessageKind::MotionTrigger => {
                    info!(soil = envelope.soil_percent(), "motion trigger received");
                    let session = Session::new(
                        &mut frames,
                        self.synth.clone(),
                        self.transcriber.clone(),
                        self.responder.clone(),
                        self.config.session.clone(),
                        &envelope,
                    );
                    let outcome = session.run().await?;
                    info!(?outcome, "interaction finished");
                }
                Ok(envelope) => {
                    debug!(kind = ?envelope.kind, "ignoring frame outside a session");
                }
                Err(RecvError::Timeout(_)) => continue,
                Err(e) => return Err(SessionError::Transport(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AudioConfig;
    use crate::llm::MockResponder;
    use crate::speech::{MockSynthesizer, MockTranscriber};
    use tempfile::TempDir;
    use tokio::io::duplex;
    use wallproto::Envelope;

    fn server(temp: &TempDir, transcripts: Vec<&'static str>) -> BrainServer {
        let config = Config {
            audio: AudioConfig {
                work_dir: temp.path().to_path_buf(),
                ..Default::default()
            },
            ..Default::default()
        };
        BrainServer::new(
            config,
            Arc::new(MockSynthesizer::new(temp.path().join("utterance.wav"))),
            Arc::new(MockTranscriber::new(transcripts)),
            Arc::new(MockResponder::new(vec![])),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_runs_back_to_back_sessions() {
        let temp = TempDir::new().unwrap();
        let brain = server(&temp, vec!["bye", "bye"]);
        let (a, b) = duplex(1024 * 1024);
        let mut edge = Frames::new(b, temp.path().join("reply.mp3"));

        let edge_script = async {
            for _ in 0..2 {
                edge.send(Envelope::motion_trigger(80)).await.unwrap();
                loop {
                    let envelope = edge.recv(Duration::from_secs(600)).await.unwrap();
                    match envelope.kind {
                        MessageKind::ChatTurn => {
                            edge.send_with_blob(Envelope::audio_submission(), b"bye").await.unwrap();
                        }
                        MessageKind::Consent | MessageKind::SoilQuery => unreachable!(),
                        MessageKind::IntroUtterance => {
                            edge.send(Envelope::consent()).await.unwrap();
                        }
                        MessageKind::SessionEnd => break,
                        _ => {}
                    }
                }
            }
            drop(edge);
        };

        let (served, ()) = tokio::join!(brain.serve_connection(a), edge_script);
        // The script hangs up once both conversations are done
        assert!(matches!(served.unwrap_err(), SessionError::Transport(RecvError::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_outside_sessions_ignored() {
        let temp = TempDir::new().unwrap();
        let brain = server(&temp, vec![]);
        let (a, b) = duplex(1024 * 1024);
        let mut edge = Frames::new(b, temp.path().join("reply.mp3"));

        let edge_script = async {
            // Stray frames before any trigger must not start a session
            edge.send(Envelope::consent()).await.unwrap();
            edge.send(Envelope::soil_reading(12)).await.unwrap();
            drop(edge);
        };

        let (served, ()) = tokio::join!(brain.serve_connection(a), edge_script);
        assert!(matches!(served.unwrap_err(), SessionError::Transport(RecvError::Closed)));
    }
}
