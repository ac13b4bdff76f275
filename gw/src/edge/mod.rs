//! Edge-side device machinery
//!
//! The multiplexer owns the link to the brain; the sensor and consent workers
//! feed it through two single-writer cells that outlive any one connection.

mod audio;
mod consent;
mod mux;
mod sensor;

pub use audio::AudioIo;
pub use consent::{watch_stdin, ConsentLatch};
pub use mux::EdgeClient;
pub use sensor::{run_reader, SensorHub, SensorSnapshot};
