//! Synthesised cue tones, one short melody per cue and theme.

use crate::config::SoundTheme;
use crate::game::Cue;
use rodio::Source;
use std::f32::consts::PI;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;
const AMPLITUDE: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub freq_hz: f32,
    pub millis: u32,
}

const fn note(freq_hz: f32, millis: u32) -> Note {
    Note { freq_hz, millis }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub waveform: Waveform,
    pub notes: &'static [Note],
}

impl ToneSpec {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.notes.iter().map(|n| n.millis as u64).sum())
    }
}

const QUIZ_CORRECT: &[Note] = &[note(880.0, 90), note(1320.0, 140)];
const QUIZ_INCORRECT: &[Note] = &[note(220.0, 260)];
const QUIZ_SKIP: &[Note] = &[note(660.0, 120), note(440.0, 120), note(330.0, 180)];
const QUIZ_CLEAR: &[Note] = &[
    note(523.0, 90),
    note(659.0, 90),
    note(784.0, 90),
    note(1047.0, 200),
];
const QUIZ_COUNTDOWN: &[Note] = &[note(440.0, 150)];

const CYBER_CORRECT: &[Note] = &[note(1200.0, 60), note(1800.0, 60)];
const CYBER_INCORRECT: &[Note] = &[note(110.0, 200), note(98.0, 200)];
const CYBER_SKIP: &[Note] = &[note(300.0, 80), note(200.0, 80)];
const CYBER_CLEAR: &[Note] = &[
    note(600.0, 50),
    note(900.0, 50),
    note(1200.0, 50),
    note(1500.0, 50),
    note(1800.0, 120),
];
const CYBER_COUNTDOWN: &[Note] = &[note(1000.0, 80)];

/// Tone for a cue under a theme; `None` for the silent theme.
pub fn tone_spec(theme: SoundTheme, cue: Cue) -> Option<ToneSpec> {
    let (waveform, notes) = match theme {
        SoundTheme::None => return None,
        SoundTheme::Quiz => (
            Waveform::Sine,
            match cue {
                Cue::Correct => QUIZ_CORRECT,
                Cue::Incorrect => QUIZ_INCORRECT,
                Cue::Skip => QUIZ_SKIP,
                Cue::Clear => QUIZ_CLEAR,
                Cue::Countdown => QUIZ_COUNTDOWN,
            },
        ),
        SoundTheme::Cyber => (
            Waveform::Square,
            match cue {
                Cue::Correct => CYBER_CORRECT,
                Cue::Incorrect => CYBER_INCORRECT,
                Cue::Skip => CYBER_SKIP,
                Cue::Clear => CYBER_CLEAR,
                Cue::Countdown => CYBER_COUNTDOWN,
            },
        ),
    };
    Some(ToneSpec { waveform, notes })
}

/// Mono sample stream for one `ToneSpec`. Each note decays linearly so
/// consecutive notes do not click.
pub struct CueTone {
    spec: ToneSpec,
    note: usize,
    sample_in_note: u32,
}

impl CueTone {
    pub fn new(spec: ToneSpec) -> Self {
        Self {
            spec,
            note: 0,
            sample_in_note: 0,
        }
    }
}

impl Iterator for CueTone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let current = self.spec.notes.get(self.note)?;
            let len = current.millis * SAMPLE_RATE / 1000;
            if self.sample_in_note >= len {
                self.note += 1;
                self.sample_in_note = 0;
                continue;
            }

            let t = self.sample_in_note as f32 / SAMPLE_RATE as f32;
            let phase = (current.freq_hz * t).fract();
            let raw = match self.spec.waveform {
                Waveform::Sine => (2.0 * PI * phase).sin(),
                Waveform::Square => {
                    if phase < 0.5 {
                        1.0
                    } else {
                        -1.0
                    }
                }
            };
            let envelope = 1.0 - self.sample_in_note as f32 / len as f32;
            self.sample_in_note += 1;

            return Some(raw * envelope * AMPLITUDE);
        }
    }
}

impl Source for CueTone {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(self.spec.duration())
    }
}
