#![allow(dead_code)]

use std::time::Duration;

use colectivo_proto::protocol::RadioStation;
use colectivo_proto::station::{Effect, LoadToken, StationController};

pub const ADVANCE_DELAY: Duration = Duration::from_millis(2000);

pub fn stations(n: u32) -> Vec<RadioStation> {
    (0..n)
        .map(|i| RadioStation {
            id: i + 1,
            name: format!("Estación {}", i + 1),
            stream_url: format!("https://radio.example.org/{}.mp3", i + 1),
            ..RadioStation::default()
        })
        .collect()
}

pub fn controller(n: u32) -> StationController {
    StationController::new(stations(n), 70, ADVANCE_DELAY).unwrap()
}

/// Stand-in for the playback element.  Every `Load` opens a stream and
/// only `Stop` closes them, so a `Load` that is not preceded by a `Stop`
/// shows up as two streams at once.
#[derive(Debug, Default)]
pub struct FakePlayer {
    pub streams: Vec<(String, LoadToken)>,
    pub volume: Option<u8>,
    pub scheduled: Vec<(LoadToken, Duration)>,
    /// Most streams ever open at the same time.
    pub max_concurrent: usize,
}

impl FakePlayer {
    pub fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Load { url, token, volume } => {
                    self.streams.push((url, token));
                    self.volume = Some(volume);
                }
                Effect::Stop => self.streams.clear(),
                Effect::SetVolume(v) => self.volume = Some(v),
                Effect::ScheduleAdvance { token, after } => self.scheduled.push((token, after)),
            }
            self.max_concurrent = self.max_concurrent.max(self.streams.len());
        }
    }

    /// The stream currently open, if exactly one is.
    pub fn loaded(&self) -> Option<&(String, LoadToken)> {
        match self.streams.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn token(&self) -> LoadToken {
        self.loaded().map(|(_, t)| *t).expect("no single stream open")
    }
}
