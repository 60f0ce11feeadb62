// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod audio;
pub mod braille;
pub mod chord;
pub mod config;
pub mod expiry;
pub mod game;
pub mod history;
pub mod runtime;
pub mod scheduler;
pub mod sequencer;
pub mod session;
pub mod timer;
pub mod util;
