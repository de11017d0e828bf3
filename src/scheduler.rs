use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use chrono::NaiveDateTime;
use log::{info, warn};

use crate::{
    alarm::{Alarm, AlarmId, SoundName},
    lock,
    notification::{
        AuthorizationStatus, CalendarTrigger, NotificationCenter, NotificationContent,
        NotificationRequest, NotificationSound,
    },
};

pub const ALARM_TITLE: &str = "Alarm";
pub const ALARM_CATEGORY: &str = "ALARM_CATEGORY";
pub const DEFAULT_BODY: &str = "Time to wake up!";
/// key under which the sound name travels in the notification payload
pub const SOUND_NAME_KEY: &str = "soundName";

/// what happened to a schedule request, none of these are errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Scheduled,
    /// the alarm was kept but no trigger exists until permission is granted
    NotAuthorized,
    Disabled,
    InPast,
    /// the host refused the request, already logged
    Failed,
}

/// turns alarms into one-shot notification triggers
pub struct NotificationScheduler {
    center: Arc<dyn NotificationCenter>,
    status: Mutex<AuthorizationStatus>,
}

impl std::fmt::Debug for NotificationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationScheduler")
            .field("status", &self.authorization_status())
            .finish_non_exhaustive()
    }
}

impl NotificationScheduler {
    /// reads the current authorization status without asking the user
    #[must_use]
    pub fn new(center: Arc<dyn NotificationCenter>) -> Self {
        let status = center.authorization_status();
        Self {
            center,
            status: Mutex::new(status),
        }
    }

    pub fn request_permission(&self) -> bool {
        match self.center.request_authorization() {
            Ok(granted) => info!("notification permission granted: {granted}"),
            Err(e) => warn!("error requesting notification permission: {e}"),
        }
        self.refresh_authorization() == AuthorizationStatus::Authorized
    }

    pub fn refresh_authorization(&self) -> AuthorizationStatus {
        let status = self.center.authorization_status();
        *lock(&self.status) = status;
        status
    }

    #[must_use]
    pub fn authorization_status(&self) -> AuthorizationStatus {
        *lock(&self.status)
    }

    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.authorization_status() == AuthorizationStatus::Authorized
    }

    /// registers the single trigger for `alarm`, replacing any earlier one
    pub fn schedule(&self, alarm: &Alarm, now: NaiveDateTime) -> ScheduleOutcome {
        if !alarm.enabled {
            return ScheduleOutcome::Disabled;
        }
        if alarm.date <= now {
            warn!("alarm {} is in the past, not scheduling", alarm.id);
            return ScheduleOutcome::InPast;
        }
        if !self.is_authorized() {
            warn!(
                "notification permission not granted - alarm {} saved but no notification will be scheduled",
                alarm.id
            );
            return ScheduleOutcome::NotAuthorized;
        }
        match self.center.add(request_for(alarm)) {
            Ok(()) => {
                info!("alarm notification scheduled for: {}", alarm.date);
                ScheduleOutcome::Scheduled
            }
            Err(e) => {
                warn!("error scheduling notification: {e}");
                ScheduleOutcome::Failed
            }
        }
    }

    pub fn cancel(&self, id: AlarmId) {
        self.center.remove_pending(&[id.to_string()]);
        info!("cancelled notification for alarm: {id}");
    }

    pub fn cancel_all(&self) {
        self.center.remove_all_pending();
        info!("all pending notifications cancelled");
    }

    #[must_use]
    pub fn pending(&self) -> Vec<NotificationRequest> {
        self.center.pending()
    }

    #[must_use]
    pub fn is_scheduled(&self, id: AlarmId) -> bool {
        let identifier = id.to_string();
        self.pending()
            .iter()
            .any(|request| request.identifier == identifier)
    }
}

#[must_use]
pub fn request_for(alarm: &Alarm) -> NotificationRequest {
    NotificationRequest {
        identifier: alarm.id.to_string(),
        content: NotificationContent {
            title: ALARM_TITLE.to_string(),
            body: alarm
                .note
                .clone()
                .unwrap_or_else(|| DEFAULT_BODY.to_string()),
            sound: notification_sound(alarm.sound),
            category: ALARM_CATEGORY.to_string(),
            user_info: BTreeMap::from([(
                SOUND_NAME_KEY.to_string(),
                alarm.sound.as_str().to_string(),
            )]),
        },
        trigger: CalendarTrigger::once_at(alarm.date),
    }
}

fn notification_sound(sound: SoundName) -> NotificationSound {
    match sound {
        SoundName::Radar => NotificationSound::Named("Radar.caf".to_string()),
        SoundName::Beacon => NotificationSound::Named("Beacon.caf".to_string()),
        _ => NotificationSound::Default,
    }
}
