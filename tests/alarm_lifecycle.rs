//! End-to-end alarm lifecycle: save, schedule, fire, ring and stop.
//!
//! Wires the real store, scheduler, local notification center, dispatcher and sound player
//! together, with a recording audio backend in place of the sound card.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{Days, NaiveDateTime, NaiveTime};
use mirai_alert::{
    alarm::{NewAlarm, SoundName},
    communication,
    error::{AlarmError, SoundError},
    notification::LocalNotificationCenter,
    receiver::AlarmDispatcher,
    scheduler::{NotificationScheduler, ScheduleOutcome},
    service::AlarmService,
    sound::{AudioBackend, SoundPlayer},
    store::AlarmStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Audio {
    Loop(PathBuf),
    Stop,
    Beep,
}

#[derive(Clone, Default)]
struct RecordingBackend(Arc<Mutex<Vec<Audio>>>);

impl RecordingBackend {
    fn log(&self) -> Vec<Audio> {
        self.0.lock().unwrap().clone()
    }

    /// streams still running after replaying the log
    fn live_streams(&self) -> usize {
        self.log().iter().fold(0, |live, call| match call {
            Audio::Loop(_) => live + 1,
            Audio::Stop => 0,
            Audio::Beep => live,
        })
    }
}

impl AudioBackend for RecordingBackend {
    fn activate_session(&mut self) -> Result<(), SoundError> {
        Ok(())
    }

    fn play_looping(&mut self, asset: &Path) -> Result<(), SoundError> {
        self.0.lock().unwrap().push(Audio::Loop(asset.to_path_buf()));
        Ok(())
    }

    fn stop(&mut self) {
        self.0.lock().unwrap().push(Audio::Stop);
    }

    fn beep(&mut self) {
        self.0.lock().unwrap().push(Audio::Beep);
    }
}

struct App {
    center: Arc<LocalNotificationCenter>,
    service: AlarmService,
    dispatcher: AlarmDispatcher,
    audio: RecordingBackend,
    sounds: tempfile::TempDir,
    _data: tempfile::TempDir,
}

fn now() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2026, 10, 19)
        .unwrap()
        .and_hms_opt(21, 15, 0)
        .unwrap()
}

fn tomorrow_at(hour: u32, minute: u32) -> NaiveDateTime {
    now()
        .date()
        .checked_add_days(Days::new(1))
        .unwrap()
        .and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap())
}

fn app(allow_notifications: bool) -> App {
    let sounds = tempfile::tempdir().expect("tempdir");
    for file in ["Radar.wav", "Beacon.wav", "default_alarm.mp3"] {
        std::fs::write(sounds.path().join(file), b"").unwrap();
    }
    let data = tempfile::tempdir().expect("tempdir");

    let (events, incoming) = communication::channel();
    let center = Arc::new(LocalNotificationCenter::new(allow_notifications, events));
    let scheduler = Arc::new(NotificationScheduler::new(center.clone()));
    scheduler.request_permission();
    let store = AlarmStore::open(data.path().join("alarms.toml")).unwrap();
    let audio = RecordingBackend::default();
    let player = SoundPlayer::new(
        Box::new(audio.clone()),
        sounds.path(),
        Duration::from_secs(60),
    );
    App {
        center,
        service: AlarmService::new(store, scheduler),
        dispatcher: AlarmDispatcher::new(incoming, Arc::new(player)),
        audio,
        sounds,
        _data: data,
    }
}

fn morning_run() -> NewAlarm {
    NewAlarm::new(tomorrow_at(7, 30), "Morning run", SoundName::Radar)
}

#[test]
fn created_alarm_is_listed_and_scheduled_once() {
    let mut app = app(true);
    app.service
        .create(
            NewAlarm::new(tomorrow_at(9, 0), "Meeting", SoundName::Default),
            now(),
        )
        .unwrap();
    let saved = app.service.create(morning_run(), now()).unwrap();
    assert_eq!(saved.schedule, ScheduleOutcome::Scheduled);

    let listed = app.service.alarms();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0], saved.alarm);
    assert!(listed.windows(2).all(|pair| pair[0].date <= pair[1].date));

    let identifier = saved.alarm.id.to_string();
    let triggers: Vec<_> = app
        .service
        .scheduler()
        .pending()
        .into_iter()
        .filter(|request| request.identifier == identifier)
        .collect();
    assert_eq!(triggers.len(), 1);
    let trigger = triggers[0].trigger;
    assert_eq!(
        (trigger.month, trigger.day, trigger.hour, trigger.minute),
        (10, 20, 7, 30)
    );
    assert!(!trigger.repeats);
}

#[test]
fn disabling_removes_the_trigger_but_keeps_the_record() {
    let mut app = app(true);
    let saved = app.service.create(morning_run(), now()).unwrap();
    app.service.set_enabled(saved.alarm.id, false, now()).unwrap();

    assert!(!app.service.scheduler().is_scheduled(saved.alarm.id));
    let record = app.service.get(saved.alarm.id).unwrap();
    assert!(!record.enabled);
    // no disabled alarm has a trigger
    for alarm in app.service.alarms().iter().filter(|alarm| !alarm.enabled) {
        assert!(!app.service.scheduler().is_scheduled(alarm.id));
    }
}

#[test]
fn past_alarm_is_rejected_without_a_trigger() {
    let mut app = app(true);
    let result = app
        .service
        .create(NewAlarm::new(now(), "too late", SoundName::Bell), now());
    assert!(matches!(result, Err(AlarmError::PastDate { .. })));
    assert!(app.service.alarms().is_empty());
    assert!(app.service.scheduler().pending().is_empty());
}

#[test]
fn deleting_removes_record_and_trigger() {
    let mut app = app(true);
    let saved = app.service.create(morning_run(), now()).unwrap();
    app.service.delete(saved.alarm.id).unwrap();
    assert!(app.service.get(saved.alarm.id).is_none());
    assert!(app.service.scheduler().pending().is_empty());
}

#[test]
fn denied_permission_saves_without_scheduling() {
    let mut app = app(false);
    let saved = app.service.create(morning_run(), now()).unwrap();
    assert!(saved.needs_permission());
    assert_eq!(app.service.alarms(), vec![saved.alarm]);
    assert!(app.service.scheduler().pending().is_empty());
}

#[test]
fn foreground_fire_rings_radar_and_exposes_the_payload() {
    let mut app = app(true);
    let saved = app.service.create(morning_run(), now()).unwrap();

    assert_eq!(app.center.fire_due(tomorrow_at(7, 29)), 0);
    assert_eq!(app.center.fire_due(tomorrow_at(7, 30)), 1);
    assert_eq!(app.dispatcher.pump(), 1);

    assert!(app.dispatcher.player().is_playing());
    assert_eq!(
        app.audio.log().last(),
        Some(&Audio::Loop(app.sounds.path().join("Radar.wav")))
    );
    let shown = app.dispatcher.state().presented().unwrap();
    assert_eq!(shown.id, saved.alarm.id.to_string());
    assert_eq!(shown.title, "Alarm");
    assert_eq!(shown.body, "Morning run");
    assert_eq!(shown.sound_name, "Radar");

    app.dispatcher.stop_alarm();
    assert!(!app.dispatcher.player().is_playing());
    assert!(app.dispatcher.state().presented().is_none());
    assert_eq!(app.audio.live_streams(), 0);
}

#[test]
fn triggers_are_restored_once_permission_is_granted() {
    let data = tempfile::tempdir().expect("tempdir");
    let (events, _incoming) = communication::channel();
    let center = Arc::new(LocalNotificationCenter::new(true, events));
    let scheduler = Arc::new(NotificationScheduler::new(center));
    let store = AlarmStore::open(data.path().join("alarms.toml")).unwrap();
    let mut service = AlarmService::new(store, Arc::clone(&scheduler));

    let saved = service.create(morning_run(), now()).unwrap();
    service
        .create(
            NewAlarm::new(tomorrow_at(8, 0), "", SoundName::Bell).disabled(),
            now(),
        )
        .unwrap();
    assert!(saved.needs_permission());
    assert!(scheduler.pending().is_empty());

    assert!(scheduler.request_permission());
    assert_eq!(service.restore_triggers(now()), 1);
    assert!(scheduler.is_scheduled(saved.alarm.id));
}

#[test]
fn alarms_survive_a_restart() {
    let data = tempfile::tempdir().expect("tempdir");
    let path = data.path().join("alarms.toml");
    let (events, _incoming) = communication::channel();
    let scheduler = Arc::new(NotificationScheduler::new(Arc::new(
        LocalNotificationCenter::new(true, events),
    )));
    scheduler.request_permission();

    let mut service = AlarmService::new(AlarmStore::open(&path).unwrap(), Arc::clone(&scheduler));
    let saved = service.create(morning_run(), now()).unwrap();
    drop(service);

    let reopened = AlarmService::new(AlarmStore::open(&path).unwrap(), scheduler);
    assert_eq!(reopened.alarms(), vec![saved.alarm]);
}

#[test]
fn back_to_back_plays_never_overlap() {
    let app = app(true);
    let player = app.dispatcher.player();
    player.play(SoundName::Radar);
    player.play(SoundName::Beacon);
    assert_eq!(app.audio.live_streams(), 1);
    player.stop();
    player.stop();
    assert!(!player.is_playing());
    assert_eq!(app.audio.live_streams(), 0);
}

#[test]
fn background_tap_does_not_open_the_alarm() {
    let mut app = app(true);
    let saved = app.service.create(morning_run(), now()).unwrap();
    app.center.fire_due(tomorrow_at(7, 30));
    app.dispatcher.pump();
    app.dispatcher.stop_alarm();

    assert!(app.center.tap(&saved.alarm.id.to_string()));
    let before = app.audio.log().len();
    app.dispatcher.pump();
    assert!(app.dispatcher.state().presented().is_none());
    assert!(!app.dispatcher.player().is_playing());
    assert_eq!(app.audio.log().len(), before);
}
