use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use log::{info, warn};
use rodio::{mixer::Mixer, source::SineWave, Decoder, Sink, Source};

use crate::{alarm::SoundName, error::SoundError, lock, ticker::Ticker};

const BEEP_FREQUENCY: f32 = 880.0;
const BEEP_LENGTH: Duration = Duration::from_millis(200);
/// shortest gap between fallback beeps, anything below would stack tones on the mixer
pub const MIN_BEEP_INTERVAL: Duration = Duration::from_millis(250);

pub trait AudioBackend: Send {
    fn activate_session(&mut self) -> Result<(), SoundError>;

    /// starts playing `asset` on repeat, replacing whatever was playing
    fn play_looping(&mut self, asset: &Path) -> Result<(), SoundError>;

    fn stop(&mut self);

    /// a short system cue, used when no asset can be played
    fn beep(&mut self);
}

/// plays through a rodio mixer, the owner of the output stream must keep it alive
pub struct RodioBackend {
    mixer: Mixer,
    sink: Option<Sink>,
}

impl RodioBackend {
    #[must_use]
    pub const fn new(mixer: Mixer) -> Self {
        Self { mixer, sink: None }
    }
}

impl AudioBackend for RodioBackend {
    fn activate_session(&mut self) -> Result<(), SoundError> {
        // the stream is already open once we have a mixer
        Ok(())
    }

    fn play_looping(&mut self, asset: &Path) -> Result<(), SoundError> {
        let file = File::open(asset)
            .map_err(|_| SoundError::AssetMissing(asset.display().to_string()))?;
        let source = Decoder::new(BufReader::new(file)).map_err(|e| SoundError::Decode {
            path: asset.to_path_buf(),
            reason: e.to_string(),
        })?;
        self.stop();
        let sink = Sink::connect_new(&self.mixer);
        sink.append(source.repeat_infinite());
        sink.play();
        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn beep(&mut self) {
        self.mixer.add(
            SineWave::new(BEEP_FREQUENCY)
                .take_duration(BEEP_LENGTH)
                .amplify(0.3),
        );
    }
}

/// used when no audio device could be opened
#[derive(Debug, Default)]
pub struct SilentBackend;

impl AudioBackend for SilentBackend {
    fn activate_session(&mut self) -> Result<(), SoundError> {
        Err(SoundError::Session("no audio output device".to_string()))
    }

    fn play_looping(&mut self, _asset: &Path) -> Result<(), SoundError> {
        Ok(())
    }

    fn stop(&mut self) {}

    fn beep(&mut self) {}
}

/// file names tried in order for each sound
#[must_use]
pub const fn asset_candidates(sound: SoundName) -> &'static [&'static str] {
    match sound {
        SoundName::Radar => &["Radar.wav", "radar_sound.mp3"],
        SoundName::Beacon => &["Beacon.wav", "beacon_sound.mp3"],
        _ => &["default_alarm.mp3"],
    }
}

#[must_use]
pub fn resolve_asset(sound: SoundName, sounds_dir: &Path) -> Option<PathBuf> {
    asset_candidates(sound)
        .iter()
        .map(|name| sounds_dir.join(name))
        .find(|path| path.is_file())
}

#[derive(Debug, Default)]
struct PlayerState {
    current: Option<SoundName>,
    beeper: Option<Ticker>,
}

/// resolves a sound to a file in the sounds directory and loops it,
/// beeps once per interval instead when the file is missing or can't be decoded
pub struct SoundPlayer {
    backend: Arc<Mutex<Box<dyn AudioBackend>>>,
    sounds_dir: PathBuf,
    beep_interval: Duration,
    state: Mutex<PlayerState>,
    playing: Arc<AtomicBool>,
}

impl std::fmt::Debug for SoundPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundPlayer")
            .field("sounds_dir", &self.sounds_dir)
            .field("playing", &self.is_playing())
            .finish_non_exhaustive()
    }
}

impl SoundPlayer {
    /// activates the audio session, a failure is logged and playback is attempted anyway
    pub fn new(
        mut backend: Box<dyn AudioBackend>,
        sounds_dir: impl Into<PathBuf>,
        beep_interval: Duration,
    ) -> Self {
        if let Err(e) = backend.activate_session() {
            warn!("failed to set up audio session: {e}");
        }
        Self {
            backend: Arc::new(Mutex::new(backend)),
            sounds_dir: sounds_dir.into(),
            beep_interval: beep_interval.max(MIN_BEEP_INTERVAL),
            state: Mutex::new(PlayerState::default()),
            playing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn play(&self, sound: SoundName) {
        self.stop();
        let Some(asset) = resolve_asset(sound, &self.sounds_dir) else {
            warn!("could not find sound file for: {sound}");
            self.play_fallback(sound);
            return;
        };
        let played = lock(&self.backend).play_looping(&asset);
        match played {
            Ok(()) => {
                lock(&self.state).current = Some(sound);
                self.playing.store(true, Ordering::SeqCst);
                info!("playing alarm sound: {sound}");
            }
            Err(e) => {
                warn!("error playing sound: {e}");
                self.play_fallback(sound);
            }
        }
    }

    /// safe to call when nothing is playing
    pub fn stop(&self) {
        let beeper = {
            let mut state = lock(&self.state);
            state.current = None;
            state.beeper.take()
        };
        // joining the beeper before locking the backend, its ticks lock the backend too
        if let Some(mut beeper) = beeper {
            beeper.stop();
        }
        lock(&self.backend).stop();
        if self.playing.swap(false, Ordering::SeqCst) {
            info!("stopped alarm sound");
        }
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    /// shared flag for views that want to watch playback
    #[must_use]
    pub fn playing_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.playing)
    }

    #[must_use]
    pub fn current_sound(&self) -> Option<SoundName> {
        lock(&self.state).current
    }

    #[must_use]
    pub fn is_beeping(&self) -> bool {
        lock(&self.state).beeper.is_some()
    }

    fn play_fallback(&self, sound: SoundName) {
        lock(&self.backend).beep();
        let backend = Arc::clone(&self.backend);
        let beeper = Ticker::spawn(self.beep_interval, move || lock(&backend).beep());
        {
            let mut state = lock(&self.state);
            state.current = Some(sound);
            state.beeper = Some(beeper);
        }
        self.playing.store(true, Ordering::SeqCst);
    }
}

impl Drop for SoundPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}
