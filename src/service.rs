use std::sync::Arc;

use chrono::NaiveDateTime;
use log::info;

use crate::{
    alarm::{Alarm, AlarmId, NewAlarm},
    error::AlarmError,
    scheduler::{NotificationScheduler, ScheduleOutcome},
    store::AlarmStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Saved {
    pub alarm: Alarm,
    pub schedule: ScheduleOutcome,
}

impl Saved {
    /// the ui should point the user at the notification settings
    #[must_use]
    pub fn needs_permission(&self) -> bool {
        self.schedule == ScheduleOutcome::NotAuthorized
    }
}

/// every mutation of a record is paired with the matching trigger change
#[derive(Debug)]
pub struct AlarmService {
    store: AlarmStore,
    scheduler: Arc<NotificationScheduler>,
}

impl AlarmService {
    #[must_use]
    pub const fn new(store: AlarmStore, scheduler: Arc<NotificationScheduler>) -> Self {
        Self { store, scheduler }
    }

    #[must_use]
    pub fn alarms(&self) -> Vec<Alarm> {
        self.store.all()
    }

    #[must_use]
    pub fn get(&self, id: AlarmId) -> Option<&Alarm> {
        self.store.get(id)
    }

    #[must_use]
    pub const fn store(&self) -> &AlarmStore {
        &self.store
    }

    #[must_use]
    pub fn scheduler(&self) -> &NotificationScheduler {
        &self.scheduler
    }

    /// rejects alarms that aren't in the future, then saves and schedules
    pub fn create(&mut self, new: NewAlarm, now: NaiveDateTime) -> Result<Saved, AlarmError> {
        validate_future(&new, now)?;
        let alarm = self.store.create(new)?;
        info!("created alarm {} for {}", alarm.id, alarm.date);
        let schedule = self.scheduler.schedule(&alarm, now);
        Ok(Saved { alarm, schedule })
    }

    pub fn set_enabled(
        &mut self,
        id: AlarmId,
        enabled: bool,
        now: NaiveDateTime,
    ) -> Result<Saved, AlarmError> {
        let alarm = self.store.set_enabled(id, enabled)?;
        let schedule = if enabled {
            self.scheduler.schedule(&alarm, now)
        } else {
            self.scheduler.cancel(id);
            ScheduleOutcome::Disabled
        };
        Ok(Saved { alarm, schedule })
    }

    pub fn toggle(&mut self, id: AlarmId, now: NaiveDateTime) -> Result<Saved, AlarmError> {
        let enabled = self
            .store
            .get(id)
            .map(|alarm| alarm.enabled)
            .ok_or(crate::error::StoreError::NotFound(id))?;
        self.set_enabled(id, !enabled, now)
    }

    /// the trigger is only cancelled once the record is gone
    pub fn delete(&mut self, id: AlarmId) -> Result<Alarm, AlarmError> {
        let alarm = self.store.delete(id)?;
        self.scheduler.cancel(id);
        info!("deleted alarm {id}");
        Ok(alarm)
    }

    pub fn delete_many(&mut self, ids: &[AlarmId]) -> Result<Vec<Alarm>, AlarmError> {
        let removed = self.store.delete_many(ids)?;
        for alarm in &removed {
            self.scheduler.cancel(alarm.id);
        }
        Ok(removed)
    }

    /// editing creates a new alarm with a new id in place of the old one,
    /// triggers only change once the store has taken the swap
    pub fn replace(
        &mut self,
        old: AlarmId,
        new: NewAlarm,
        now: NaiveDateTime,
    ) -> Result<Saved, AlarmError> {
        validate_future(&new, now)?;
        let alarm = self.store.replace(old, new)?;
        self.scheduler.cancel(old);
        info!("replaced alarm {old} with {} for {}", alarm.id, alarm.date);
        let schedule = self.scheduler.schedule(&alarm, now);
        Ok(Saved { alarm, schedule })
    }

    /// schedules every enabled future alarm, the local notification center forgets
    /// its triggers when the process exits
    pub fn restore_triggers(&self, now: NaiveDateTime) -> usize {
        self.store
            .all()
            .iter()
            .filter(|alarm| alarm.is_pending(now))
            .filter(|alarm| self.scheduler.schedule(alarm, now) == ScheduleOutcome::Scheduled)
            .count()
    }
}

pub fn validate_future(new: &NewAlarm, now: NaiveDateTime) -> Result<(), AlarmError> {
    if new.date <= now {
        return Err(AlarmError::PastDate {
            date: new.date,
            now,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::{
        alarm::SoundName, communication, error::StoreError,
        notification::LocalNotificationCenter,
    };
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn now() -> NaiveDateTime {
        at(19, 12, 0)
    }

    fn service(allow: bool) -> AlarmService {
        let (tx, _rx) = communication::channel();
        let scheduler =
            NotificationScheduler::new(Arc::new(LocalNotificationCenter::new(allow, tx)));
        scheduler.request_permission();
        AlarmService::new(AlarmStore::in_memory(), Arc::new(scheduler))
    }

    #[test]
    fn past_alarms_are_rejected_before_saving() {
        let mut service = service(true);
        let result = service.create(NewAlarm::new(now(), "", SoundName::Default), now());
        assert!(matches!(result, Err(AlarmError::PastDate { .. })));
        let result = service.create(NewAlarm::new(at(18, 7, 0), "", SoundName::Default), now());
        assert!(matches!(result, Err(AlarmError::PastDate { .. })));
        assert!(service.alarms().is_empty());
        assert!(service.scheduler().pending().is_empty());
    }

    #[test]
    fn missing_permission_still_saves() {
        let mut service = service(false);
        let saved = service
            .create(NewAlarm::new(at(20, 7, 30), "", SoundName::Default), now())
            .unwrap();
        assert!(saved.needs_permission());
        assert_eq!(service.alarms().len(), 1);
        assert!(service.scheduler().pending().is_empty());
    }

    #[test]
    fn disabling_cancels_and_enabling_reschedules() {
        let mut service = service(true);
        let saved = service
            .create(NewAlarm::new(at(20, 7, 30), "", SoundName::Default), now())
            .unwrap();
        let id = saved.alarm.id;

        let off = service.toggle(id, now()).unwrap();
        assert!(!off.alarm.enabled);
        assert!(!service.scheduler().is_scheduled(id));

        let on = service.toggle(id, now()).unwrap();
        assert!(on.alarm.enabled);
        assert_eq!(on.schedule, ScheduleOutcome::Scheduled);
        assert!(service.scheduler().is_scheduled(id));
    }

    #[test]
    fn enabling_a_past_alarm_creates_no_trigger() {
        let mut service = service(true);
        let saved = service
            .create(NewAlarm::new(at(20, 7, 30), "", SoundName::Default), now())
            .unwrap();
        service.set_enabled(saved.alarm.id, false, now()).unwrap();
        let later = at(21, 0, 0);
        let on = service.set_enabled(saved.alarm.id, true, later).unwrap();
        assert_eq!(on.schedule, ScheduleOutcome::InPast);
        assert!(service.scheduler().pending().is_empty());
    }

    #[test]
    fn delete_removes_record_and_trigger() {
        let mut service = service(true);
        let saved = service
            .create(NewAlarm::new(at(20, 7, 30), "", SoundName::Default), now())
            .unwrap();
        service.delete(saved.alarm.id).unwrap();
        assert!(service.get(saved.alarm.id).is_none());
        assert!(service.scheduler().pending().is_empty());
        assert!(matches!(
            service.delete(saved.alarm.id),
            Err(AlarmError::Store(StoreError::NotFound(_)))
        ));
    }

    #[test]
    fn delete_many_cancels_each_trigger() {
        let mut service = service(true);
        let a = service
            .create(NewAlarm::new(at(20, 7, 30), "", SoundName::Default), now())
            .unwrap();
        let b = service
            .create(NewAlarm::new(at(21, 7, 30), "", SoundName::Default), now())
            .unwrap();
        let c = service
            .create(NewAlarm::new(at(22, 7, 30), "", SoundName::Default), now())
            .unwrap();
        let removed = service.delete_many(&[a.alarm.id, c.alarm.id]).unwrap();
        assert_eq!(removed.len(), 2);
        let pending = service.scheduler().pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].identifier, b.alarm.id.to_string());
    }

    #[test]
    fn replace_recreates_with_a_new_id() {
        let mut service = service(true);
        let old = service
            .create(NewAlarm::new(at(20, 7, 30), "run", SoundName::Radar), now())
            .unwrap();
        let new = service
            .replace(
                old.alarm.id,
                NewAlarm::new(at(20, 8, 0), "walk", SoundName::Bell),
                now(),
            )
            .unwrap();
        assert_ne!(new.alarm.id, old.alarm.id);
        assert_eq!(service.alarms(), vec![new.alarm.clone()]);
        assert!(!service.scheduler().is_scheduled(old.alarm.id));
        assert!(service.scheduler().is_scheduled(new.alarm.id));
    }

    #[test]
    fn replace_with_a_past_date_keeps_the_old_alarm() {
        let mut service = service(true);
        let old = service
            .create(NewAlarm::new(at(20, 7, 30), "run", SoundName::Radar), now())
            .unwrap();
        let result = service.replace(
            old.alarm.id,
            NewAlarm::new(at(18, 8, 0), "walk", SoundName::Bell),
            now(),
        );
        assert!(matches!(result, Err(AlarmError::PastDate { .. })));
        assert_eq!(service.alarms(), vec![old.alarm.clone()]);
        assert!(service.scheduler().is_scheduled(old.alarm.id));
        assert!(service
            .replace(Uuid::new_v4(), NewAlarm::new(at(21, 8, 0), "", SoundName::Bell), now())
            .is_err());
    }

    #[test]
    fn failed_replace_leaves_only_the_old_trigger() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("alarms.toml");
        let (tx, _rx) = communication::channel();
        let scheduler =
            NotificationScheduler::new(Arc::new(LocalNotificationCenter::new(true, tx)));
        scheduler.request_permission();
        let mut service = AlarmService::new(AlarmStore::open(&path).unwrap(), Arc::new(scheduler));
        let old = service
            .create(NewAlarm::new(at(20, 7, 30), "run", SoundName::Radar), now())
            .unwrap();
        // a directory where the file should be makes the next save fail
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir_all(path.join("blocker")).unwrap();

        let result = service.replace(
            old.alarm.id,
            NewAlarm::new(at(20, 8, 0), "walk", SoundName::Bell),
            now(),
        );
        assert!(matches!(result, Err(AlarmError::Store(StoreError::Io { .. }))));
        assert_eq!(service.alarms(), vec![old.alarm.clone()]);
        let pending = service.scheduler().pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].identifier, old.alarm.id.to_string());
    }

    #[test]
    fn restore_only_schedules_pending_alarms() {
        let (tx, _rx) = communication::channel();
        let scheduler = Arc::new(NotificationScheduler::new(Arc::new(
            LocalNotificationCenter::new(true, tx),
        )));
        scheduler.request_permission();
        let mut store = AlarmStore::in_memory();
        store
            .create(NewAlarm::new(at(20, 7, 30), "", SoundName::Default))
            .unwrap();
        store
            .create(NewAlarm::new(at(21, 7, 30), "", SoundName::Default).disabled())
            .unwrap();
        store
            .create(NewAlarm::new(at(18, 7, 30), "", SoundName::Default))
            .unwrap();
        let service = AlarmService::new(store, scheduler);
        assert_eq!(service.restore_triggers(now()), 1);
        assert_eq!(service.scheduler().pending().len(), 1);
    }
}
