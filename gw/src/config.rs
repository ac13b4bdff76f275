//! Configuration for both kiosk processes
//!
//! One YAML file serves the brain and the edge device; each process reads the
//! sections it needs. Every field has a default so an empty file (or no file
//! at all) yields a working desk setup.

use std::path::PathBuf;
use std::time::Duration;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub net: NetConfig,

    #[serde(default)]
    pub sensor: SensorConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub speech: SpeechConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    /// Load config from file, or use defaults
    ///
    /// An explicit path must parse; the default locations are tried in order
    /// and silently skipped when absent.
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config {}", config_path.display()))?;
            let config: Config = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config {}", config_path.display()))?;
            return Ok(config);
        }

        let default_paths = [
            dirs::config_dir().map(|p| p.join("greenwall").join("config.yml")),
            Some(PathBuf::from("greenwall.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                let config: Config = serde_yaml::from_str(&content)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?;
                return Ok(config);
            }
        }

        Ok(Config::default())
    }

    /// Create the scratch directory audio files live in
    pub fn ensure_work_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.audio.work_dir)
            .with_context(|| format!("Failed to create work dir {}", self.audio.work_dir.display()))
    }
}

/// Where the brain listens and the edge connects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl NetConfig {
    /// `host:port` as one string for bind/connect
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Serial link to the sensor board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Serial device the sensor board enumerates as
    #[serde(default = "default_sensor_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Seconds to wait before reopening a missing or broken port
    #[serde(default = "default_reopen_secs")]
    pub reopen_secs: u64,
}

fn default_sensor_port() -> String {
    "/dev/ttyACM0".to_string()
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_reopen_secs() -> u64 {
    2
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            port: default_sensor_port(),
            baud_rate: default_baud_rate(),
            reopen_secs: default_reopen_secs(),
        }
    }
}

impl SensorConfig {
    pub fn reopen_delay(&self) -> Duration {
        Duration::from_secs(self.reopen_secs)
    }
}

/// Audio capture/playback tools and scratch paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Directory all transient audio files live in
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    #[serde(default = "default_record_command")]
    pub record_command: String,

    /// ALSA device the microphone enumerates as
    #[serde(default = "default_mic_device")]
    pub mic_device: String,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_play_command")]
    pub play_command: String,
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("greenwall")
}

fn default_record_command() -> String {
    "arecord".to_string()
}

fn default_mic_device() -> String {
    "plughw:1,0".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_play_command() -> String {
    "mpg123".to_string()
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            record_command: default_record_command(),
            mic_device: default_mic_device(),
            sample_rate: default_sample_rate(),
            play_command: default_play_command(),
        }
    }
}

impl AudioConfig {
    /// Edge: where the microphone capture lands before submission
    pub fn capture_path(&self) -> PathBuf {
        self.work_dir.join("capture.wav")
    }

    /// Edge: where inbound spoken replies land for playback
    pub fn playback_path(&self) -> PathBuf {
        self.work_dir.join("reply.mp3")
    }

    /// Brain: where inbound audio submissions land for transcription
    pub fn inbound_audio_path(&self) -> PathBuf {
        self.work_dir.join("visitor.wav")
    }

    /// Brain: where the synthesizer writes each utterance
    pub fn synth_output_path(&self) -> PathBuf {
        self.work_dir.join("utterance.wav")
    }
}

/// Speech synthesis and transcription tools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_synth_command")]
    pub synth_command: String,

    /// Voice passed to the synthesizer
    #[serde(default = "default_voice")]
    pub voice: String,

    #[serde(default = "default_transcribe_command")]
    pub transcribe_command: String,

    /// Acoustic model file for the transcriber, if it needs one
    #[serde(default)]
    pub transcribe_model: Option<PathBuf>,
}

fn default_synth_command() -> String {
    "espeak-ng".to_string()
}

fn default_voice() -> String {
    "en".to_string()
}

fn default_transcribe_command() -> String {
    "whisper-cli".to_string()
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            synth_command: default_synth_command(),
            voice: default_voice(),
            transcribe_command: default_transcribe_command(),
            transcribe_model: None,
        }
    }
}

/// Reply generator endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_model() -> String {
    "gemma2:2b".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Conversation timing and thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Soil percentage below which the wall asks for water
    #[serde(default = "default_dry_threshold")]
    pub dry_threshold: i64,

    /// First wait for the consent press
    #[serde(default = "default_consent_wait_secs")]
    pub consent_wait_secs: u64,

    /// Second wait, after the one reminder
    #[serde(default = "default_consent_retry_secs")]
    pub consent_retry_secs: u64,

    /// Bounded wait for a fresh soil reading
    #[serde(default = "default_soil_recheck_secs")]
    pub soil_recheck_secs: u64,

    /// Wait for the visitor's recorded turn
    #[serde(default = "default_turn_wait_secs")]
    pub turn_wait_secs: u64,

    /// Length of each microphone capture
    #[serde(default = "default_record_secs")]
    pub record_secs: u64,

    /// Minimum spacing between motion triggers
    #[serde(default = "default_trigger_cooldown_secs")]
    pub trigger_cooldown_secs: u64,

    /// Edge backoff between reconnect attempts
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    /// Edge socket poll interval
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_dry_threshold() -> i64 {
    30
}

fn default_consent_wait_secs() -> u64 {
    40
}

fn default_consent_retry_secs() -> u64 {
    30
}

fn default_soil_recheck_secs() -> u64 {
    5
}

fn default_turn_wait_secs() -> u64 {
    60
}

fn default_record_secs() -> u64 {
    8
}

fn default_trigger_cooldown_secs() -> u64 {
    30
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_poll_interval_ms() -> u64 {
    50
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dry_threshold: default_dry_threshold(),
            consent_wait_secs: default_consent_wait_secs(),
            consent_retry_secs: default_consent_retry_secs(),
            soil_recheck_secs: default_soil_recheck_secs(),
            turn_wait_secs: default_turn_wait_secs(),
            record_secs: default_record_secs(),
            trigger_cooldown_secs: default_trigger_cooldown_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl SessionConfig {
    pub fn consent_wait(&self) -> Duration {
        Duration::from_secs(self.consent_wait_secs)
    }

    pub fn consent_retry(&self) -> Duration {
        Duration::from_secs(self.consent_retry_secs)
    }

    pub fn soil_recheck(&self) -> Duration {
        Duration::from_secs(self.soil_recheck_secs)
    }

    pub fn turn_wait(&self) -> Duration {
        Duration::from_secs(self.turn_wait_secs)
    }

    pub fn trigger_cooldown(&self) -> Duration {
        Duration::from_secs(self.trigger_cooldown_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.net.port, 5000);
        assert_eq!(config.sensor.baud_rate, 9600);
        assert_eq!(config.session.dry_threshold, 30);
        assert_eq!(config.session.consent_wait_secs, 40);
        assert_eq!(config.session.consent_retry_secs, 30);
        assert_eq!(config.llm.model, "gemma2:2b");
    }

    #[test]
    fn test_duration_accessors() {
        let session = SessionConfig::default();
        assert_eq!(session.consent_wait(), Duration::from_secs(40));
        assert_eq!(session.consent_retry(), Duration::from_secs(30));
        assert_eq!(session.turn_wait(), Duration::from_secs(60));
        assert_eq!(session.poll_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_addr_joins_host_and_port() {
        let net = NetConfig {
            host: "10.0.0.7".to_string(),
            port: 5055,
        };
        assert_eq!(net.addr(), "10.0.0.7:5055");
    }

    #[test]
    fn test_audio_paths_share_work_dir() {
        let audio = AudioConfig {
            work_dir: PathBuf::from("/tmp/kiosk"),
            ..Default::default()
        };
        assert_eq!(audio.capture_path(), PathBuf::from("/tmp/kiosk/capture.wav"));
        assert_eq!(audio.playback_path(), PathBuf::from("/tmp/kiosk/reply.mp3"));
        assert_eq!(audio.inbound_audio_path(), PathBuf::from("/tmp/kiosk/visitor.wav"));
    }

    #[test]
    fn test_load_partial_yaml_fills_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        std::fs::write(
            &path,
            "net:\n  host: 192.168.137.1\nsession:\n  dry_threshold: 25\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.net.host, "192.168.137.1");
        assert_eq!(config.net.port, 5000);
        assert_eq!(config.session.dry_threshold, 25);
        assert_eq!(config.session.turn_wait_secs, 60);
    }

    #[test]
    fn test_load_missing_explicit_path_errors() {
        let path = PathBuf::from("/nonexistent/greenwall.yml");
        assert!(Config::load(Some(&path)).is_err());
    }
}
