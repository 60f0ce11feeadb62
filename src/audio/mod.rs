//! Fire-and-forget sound cue and speech sinks. Nothing here can fail the game:
//! output errors are logged and dropped.

pub mod engine;
pub mod tone;

use crate::config::{SessionSettings, SoundTheme, SpeechVoice};
use crate::game::{Cue, Effect};
use log::{debug, warn};
use std::collections::VecDeque;
use std::io::Write;
use std::process::{Child, Command, Stdio};

pub use engine::RodioCueSink;

pub trait CueSink {
    fn play(&mut self, cue: Cue);
}

pub trait SpeechSink {
    fn speak_word(&mut self, word: &str);
    fn speak_character(&mut self, character: char, urgent: bool);

    /// Called on every tick so queued speech can move on.
    fn poll(&mut self) {}
}

/// Rings the terminal bell for every cue unless the theme is silent. Used
/// when no audio device can be opened.
pub struct BellSink<W: Write> {
    theme: SoundTheme,
    out: W,
}

impl<W: Write> BellSink<W> {
    pub fn new(theme: SoundTheme, out: W) -> Self {
        Self { theme, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> CueSink for BellSink<W> {
    fn play(&mut self, cue: Cue) {
        if self.theme == SoundTheme::None {
            return;
        }

        debug!("cue {cue} ({}) on the terminal bell", self.theme);
        if let Err(e) = self.out.write_all(b"\x07").and_then(|_| self.out.flush()) {
            warn!("could not play cue {cue}: {e}");
        }
    }
}

/// Only records what would have been said.
#[derive(Debug, Default)]
pub struct LogSpeech;

impl SpeechSink for LogSpeech {
    fn speak_word(&mut self, word: &str) {
        debug!("speak word {word:?}");
    }

    fn speak_character(&mut self, character: char, urgent: bool) {
        debug!("speak character {character:?} urgent={urgent}");
    }
}

/// Speaks through the platform speech command (`say` on macOS, `espeak`
/// elsewhere).
///
/// Utterances play one at a time in order. A new word cuts off whatever is
/// playing and drops the queue; an urgent character only drops the queue,
/// so the word spoken just before it is heard in full. Nothing here waits
/// on the child process.
#[derive(Debug)]
pub struct CommandSpeech {
    program: String,
    base_args: Vec<String>,
    voice: &'static str,
    available: bool,
    queue: VecDeque<String>,
    speaking: Option<Child>,
    killed: Vec<Child>,
}

impl CommandSpeech {
    pub fn new(voice: SpeechVoice) -> Self {
        let (program, voice) = if cfg!(target_os = "macos") {
            match voice {
                SpeechVoice::English => ("say", "Samantha"),
                SpeechVoice::Japanese => ("say", "Kyoko"),
            }
        } else {
            match voice {
                SpeechVoice::English => ("espeak", "en-us"),
                SpeechVoice::Japanese => ("espeak", "ja"),
            }
        };
        Self::with_command(program, Vec::new(), voice)
    }

    /// Run `program base_args.. -v voice text` for every utterance.
    pub fn with_command(program: &str, base_args: Vec<String>, voice: &'static str) -> Self {
        Self {
            program: program.to_string(),
            base_args,
            voice,
            available: true,
            queue: VecDeque::new(),
            speaking: None,
            killed: Vec::new(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.speaking.is_none() && self.queue.is_empty()
    }

    fn enqueue(&mut self, text: String) {
        if !self.available {
            return;
        }
        self.queue.push_back(text);
        self.advance();
    }

    fn interrupt(&mut self) {
        self.queue.clear();
        if let Some(mut child) = self.speaking.take() {
            if let Err(e) = child.kill() {
                debug!("speech process already gone: {e}");
            }
            self.killed.push(child);
        }
    }

    fn reap(&mut self) {
        self.killed
            .retain_mut(|child| matches!(child.try_wait(), Ok(None)));
        let finished = self
            .speaking
            .as_mut()
            .is_some_and(|child| !matches!(child.try_wait(), Ok(None)));
        if finished {
            self.speaking = None;
        }
    }

    /// Start the next queued utterance once the current one has finished.
    fn advance(&mut self) {
        self.reap();
        if self.speaking.is_some() || !self.available {
            return;
        }
        let Some(text) = self.queue.pop_front() else {
            return;
        };

        let spawned = Command::new(&self.program)
            .args(&self.base_args)
            .args(["-v", self.voice, text.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(child) => self.speaking = Some(child),
            Err(e) => {
                warn!("speech disabled, could not run {}: {e}", self.program);
                self.available = false;
                self.queue.clear();
            }
        }
    }
}

impl SpeechSink for CommandSpeech {
    fn speak_word(&mut self, word: &str) {
        self.interrupt();
        self.enqueue(word.to_string());
    }

    fn speak_character(&mut self, character: char, urgent: bool) {
        if urgent {
            self.queue.clear();
        }
        self.enqueue(character.to_string());
    }

    fn poll(&mut self) {
        self.advance();
    }
}

impl Drop for CommandSpeech {
    fn drop(&mut self) {
        self.interrupt();
    }
}

/// Routes game effects to the sound and speech sinks.
pub struct AudioOutput {
    cues: Box<dyn CueSink>,
    speech: Option<Box<dyn SpeechSink>>,
}

impl AudioOutput {
    pub fn new(cues: Box<dyn CueSink>, speech: Option<Box<dyn SpeechSink>>) -> Self {
        Self { cues, speech }
    }

    /// Synthesised cue tones when an output device opens (terminal bell
    /// otherwise), platform speech when sound is enabled.
    pub fn for_settings(settings: &SessionSettings) -> Self {
        let speech: Option<Box<dyn SpeechSink>> = if settings.sound_enabled {
            Some(Box::new(CommandSpeech::new(settings.speech_voice)))
        } else {
            None
        };
        Self::new(cue_sink(settings.sound_theme), speech)
    }

    pub fn silent() -> Self {
        Self::new(
            Box::new(BellSink::new(SoundTheme::None, std::io::sink())),
            Some(Box::new(LogSpeech)),
        )
    }

    pub fn handle(&mut self, effect: &Effect) {
        match effect {
            Effect::Cue(cue) => self.cues.play(*cue),
            Effect::SpeakWord(word) => {
                if let Some(speech) = self.speech.as_mut() {
                    speech.speak_word(word);
                }
            }
            Effect::SpeakCharacter { character, urgent } => {
                if let Some(speech) = self.speech.as_mut() {
                    speech.speak_character(*character, *urgent);
                }
            }
            Effect::PhaseChanged(_) | Effect::NewWord(_) | Effect::Spawned { .. } => {}
        }
    }

    pub fn poll(&mut self) {
        if let Some(speech) = self.speech.as_mut() {
            speech.poll();
        }
    }
}

fn cue_sink(theme: SoundTheme) -> Box<dyn CueSink> {
    if theme == SoundTheme::None {
        return Box::new(BellSink::new(theme, std::io::sink()));
    }

    match RodioCueSink::try_new(theme) {
        Ok(sink) => Box::new(sink),
        Err(e) => {
            warn!("{e}, falling back to the terminal bell");
            Box::new(BellSink::new(theme, std::io::stdout()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    #[test]
    fn bell_rings_once_per_cue() {
        let mut sink = BellSink::new(SoundTheme::Quiz, Vec::new());
        sink.play(Cue::Correct);
        sink.play(Cue::Skip);
        assert_eq!(sink.into_inner(), b"\x07\x07".to_vec());
    }

    #[test]
    fn silent_theme_writes_nothing() {
        let mut sink = BellSink::new(SoundTheme::None, Vec::new());
        sink.play(Cue::Clear);
        assert!(sink.into_inner().is_empty());
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "no device"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failures_are_swallowed() {
        let mut sink = BellSink::new(SoundTheme::Cyber, BrokenWriter);
        sink.play(Cue::Incorrect);
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl CueSink for Recorder {
        fn play(&mut self, cue: Cue) {
            self.0.borrow_mut().push(format!("cue:{cue}"));
        }
    }

    impl SpeechSink for Recorder {
        fn speak_word(&mut self, word: &str) {
            self.0.borrow_mut().push(format!("word:{word}"));
        }

        fn speak_character(&mut self, character: char, urgent: bool) {
            self.0
                .borrow_mut()
                .push(format!("char:{character}:{urgent}"));
        }

        fn poll(&mut self) {
            self.0.borrow_mut().push("poll".to_string());
        }
    }

    #[test]
    fn output_polls_speech_only_when_enabled() {
        let recorder = Recorder::default();
        let mut output = AudioOutput::new(
            Box::new(recorder.clone()),
            Some(Box::new(recorder.clone())),
        );
        output.poll();
        assert_eq!(*recorder.0.borrow(), vec!["poll"]);

        let muted = Recorder::default();
        let mut output = AudioOutput::new(Box::new(muted.clone()), None);
        output.poll();
        assert!(muted.0.borrow().is_empty());
    }

    #[test]
    fn output_routes_effects() {
        let recorder = Recorder::default();
        let mut output = AudioOutput::new(
            Box::new(recorder.clone()),
            Some(Box::new(recorder.clone())),
        );

        output.handle(&Effect::Cue(Cue::Clear));
        output.handle(&Effect::SpeakWord("cat".into()));
        output.handle(&Effect::SpeakCharacter {
            character: 'c',
            urgent: true,
        });
        output.handle(&Effect::NewWord("cat".into()));

        assert_eq!(
            *recorder.0.borrow(),
            vec!["cue:Clear", "word:cat", "char:c:true"]
        );
    }

    #[test]
    fn muted_output_still_plays_cues() {
        let recorder = Recorder::default();
        let mut output = AudioOutput::new(Box::new(recorder.clone()), None);
        output.handle(&Effect::SpeakWord("cat".into()));
        output.handle(&Effect::Cue(Cue::Skip));
        assert_eq!(*recorder.0.borrow(), vec!["cue:Skip"]);
    }

    #[cfg(unix)]
    mod command_speech {
        use super::super::*;
        use std::fs;
        use std::path::Path;
        use std::time::{Duration, Instant};

        /// Speech command stand-in: takes a while, then logs the spoken text.
        fn fake_speaker(dir: &Path, delay: &str) -> (CommandSpeech, std::path::PathBuf) {
            let log = dir.join("spoken.log");
            let script = dir.join("speak.sh");
            fs::write(
                &script,
                format!("sleep {delay}\necho \"$3\" >> \"{}\"\n", log.display()),
            )
            .unwrap();
            let speech = CommandSpeech::with_command(
                "sh",
                vec![script.display().to_string()],
                "en-us",
            );
            (speech, log)
        }

        fn drain(speech: &mut CommandSpeech) {
            let deadline = Instant::now() + Duration::from_secs(5);
            while !speech.is_idle() && Instant::now() < deadline {
                speech.poll();
                std::thread::sleep(Duration::from_millis(20));
            }
        }

        #[test]
        fn word_is_heard_before_the_urgent_first_character() {
            let dir = tempfile::tempdir().unwrap();
            let (mut speech, log) = fake_speaker(dir.path(), "0.3");

            speech.speak_word("cat");
            speech.speak_character('c', true);
            drain(&mut speech);

            assert_eq!(fs::read_to_string(&log).unwrap(), "cat\nc\n");
        }

        #[test]
        fn characters_play_in_order_without_overlap() {
            let dir = tempfile::tempdir().unwrap();
            let (mut speech, log) = fake_speaker(dir.path(), "0.1");

            speech.speak_character('a', false);
            speech.speak_character('b', false);
            speech.speak_character('c', false);
            drain(&mut speech);

            assert_eq!(fs::read_to_string(&log).unwrap(), "a\nb\nc\n");
        }

        #[test]
        fn urgent_character_drops_stale_queue() {
            let dir = tempfile::tempdir().unwrap();
            let (mut speech, log) = fake_speaker(dir.path(), "0.2");

            speech.speak_character('a', false);
            speech.speak_character('b', false);
            speech.speak_character('z', true);
            drain(&mut speech);

            assert_eq!(fs::read_to_string(&log).unwrap(), "a\nz\n");
        }

        #[test]
        fn new_word_cuts_off_current_speech_without_waiting() {
            let dir = tempfile::tempdir().unwrap();
            let (mut speech, log) = fake_speaker(dir.path(), "1");

            speech.speak_word("dog");
            let started = Instant::now();
            speech.speak_word("cat");
            assert!(started.elapsed() < Duration::from_millis(500));
            drain(&mut speech);

            assert_eq!(fs::read_to_string(&log).unwrap(), "cat\n");
        }

        #[test]
        fn missing_program_disables_speech() {
            let mut speech = CommandSpeech::with_command("no-such-speech-program", Vec::new(), "en-us");
            speech.speak_word("cat");
            speech.speak_character('c', true);
            assert!(speech.is_idle());
        }
    }
}
