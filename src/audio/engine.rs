use super::tone::{tone_spec, CueTone, ToneSpec};
use super::CueSink;
use crate::config::SoundTheme;
use crate::game::Cue;
use log::{debug, warn};
use rodio::{OutputStream, Sink};
use std::sync::mpsc::{self, Sender};
use std::thread;

enum AudioCommand {
    Play(ToneSpec),
}

/// Plays cue tones through the default output device.
///
/// The rodio stream is not `Send`, so it lives on a dedicated thread fed by
/// a command channel; `play` only enqueues and never waits on the device.
/// Dropping the sink closes the channel and ends the thread.
pub struct RodioCueSink {
    theme: SoundTheme,
    tx: Sender<AudioCommand>,
}

impl RodioCueSink {
    /// Open the default output device. Fails when there is none, so the
    /// caller can pick another sink.
    pub fn try_new(theme: SoundTheme) -> Result<Self, String> {
        let (tx, rx) = mpsc::channel::<AudioCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        thread::Builder::new()
            .name("cue-audio".to_string())
            .spawn(move || {
                let opened = OutputStream::try_default()
                    .map_err(|e| format!("failed to open audio output: {e}"))
                    .and_then(|(stream, handle)| {
                        Sink::try_new(&handle)
                            .map(|sink| (stream, sink))
                            .map_err(|e| format!("failed to create audio sink: {e}"))
                    });

                let (_stream, sink) = match opened {
                    Ok(pair) => {
                        ready_tx.send(Ok(())).ok();
                        pair
                    }
                    Err(e) => {
                        ready_tx.send(Err(e)).ok();
                        return;
                    }
                };

                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        AudioCommand::Play(spec) => sink.append(CueTone::new(spec)),
                    }
                }
            })
            .map_err(|e| e.to_string())?;

        ready_rx
            .recv()
            .map_err(|e| format!("audio thread exited: {e}"))??;
        Ok(Self { theme, tx })
    }
}

impl CueSink for RodioCueSink {
    fn play(&mut self, cue: Cue) {
        let Some(spec) = tone_spec(self.theme, cue) else {
            return;
        };

        debug!("cue {cue} ({})", self.theme);
        if let Err(e) = self.tx.send(AudioCommand::Play(spec)) {
            warn!("could not play cue {cue}: {e}");
        }
    }
}
