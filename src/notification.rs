use std::{
    collections::{BTreeMap, HashMap},
    sync::Mutex,
};

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use crossbeam_channel::Sender;
use log::{info, warn};

use crate::{communication::NotificationEvent, error::NotificationError, lock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationStatus {
    #[default]
    NotDetermined,
    Denied,
    Authorized,
    Provisional,
}

impl AuthorizationStatus {
    #[must_use]
    pub const fn allows_delivery(self) -> bool {
        matches!(self, Self::Authorized | Self::Provisional)
    }
}

/// fires once at the given local calendar minute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarTrigger {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub repeats: bool,
}

impl CalendarTrigger {
    #[must_use]
    pub fn once_at(date: NaiveDateTime) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
            hour: date.hour(),
            minute: date.minute(),
            repeats: false,
        }
    }

    /// `None` when the components don't name a real minute
    #[must_use]
    pub fn fire_date(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)?.and_hms_opt(
            self.hour,
            self.minute,
            0,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NotificationSound {
    #[default]
    Default,
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub sound: NotificationSound,
    pub category: String,
    pub user_info: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequest {
    pub identifier: String,
    pub content: NotificationContent,
    pub trigger: CalendarTrigger,
}

/// a notification the host has delivered, handed to the receiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredNotification {
    pub identifier: String,
    pub content: NotificationContent,
    pub date: NaiveDateTime,
}

/// the host notification service, the scheduler only talks to this
pub trait NotificationCenter: Send + Sync {
    /// asks the user for permission, returns whether it was granted
    fn request_authorization(&self) -> Result<bool, NotificationError>;

    fn authorization_status(&self) -> AuthorizationStatus;

    /// registers a trigger, replacing any pending one with the same identifier
    fn add(&self, request: NotificationRequest) -> Result<(), NotificationError>;

    fn remove_pending(&self, identifiers: &[String]);

    fn remove_all_pending(&self);

    fn pending(&self) -> Vec<NotificationRequest>;
}

type Waker = Box<dyn Fn() + Send + Sync>;

/// keeps triggers in memory, driven by [`LocalNotificationCenter::fire_due`]
pub struct LocalNotificationCenter {
    allow: bool,
    status: Mutex<AuthorizationStatus>,
    pending: Mutex<HashMap<String, NotificationRequest>>,
    /// latest delivery per identifier
    delivered: Mutex<HashMap<String, DeliveredNotification>>,
    events: Sender<NotificationEvent>,
    waker: Mutex<Option<Waker>>,
}

impl std::fmt::Debug for LocalNotificationCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalNotificationCenter")
            .field("allow", &self.allow)
            .field("status", &self.authorization_status())
            .field("pending", &lock(&self.pending).len())
            .finish_non_exhaustive()
    }
}

impl LocalNotificationCenter {
    /// `allow` is the answer the user gives when permission is requested
    #[must_use]
    pub fn new(allow: bool, events: Sender<NotificationEvent>) -> Self {
        Self {
            allow,
            status: Mutex::new(AuthorizationStatus::NotDetermined),
            pending: Mutex::new(HashMap::new()),
            delivered: Mutex::new(HashMap::new()),
            events,
            waker: Mutex::new(None),
        }
    }

    /// called after an event is sent, the gui uses it to request a repaint
    pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *lock(&self.waker) = Some(Box::new(waker));
    }

    /// delivers every pending trigger whose time has come, returns how many fired
    pub fn fire_due(&self, now: NaiveDateTime) -> usize {
        let due: Vec<NotificationRequest> = {
            let mut pending = lock(&self.pending);
            let ids: Vec<String> = pending
                .values()
                .filter(|request| request.trigger.fire_date().is_some_and(|date| date <= now))
                .map(|request| request.identifier.clone())
                .collect();
            ids.iter().filter_map(|id| pending.remove(id)).collect()
        };
        for request in &due {
            info!("trigger {} fired", request.identifier);
            let notification = DeliveredNotification {
                identifier: request.identifier.clone(),
                content: request.content.clone(),
                date: now,
            };
            lock(&self.delivered).insert(notification.identifier.clone(), notification.clone());
            self.send(NotificationEvent::WillPresent(notification));
        }
        due.len()
    }

    /// simulates the user tapping a delivered notification
    pub fn tap(&self, identifier: &str) -> bool {
        let notification = lock(&self.delivered).get(identifier).cloned();
        notification.is_some_and(|notification| {
            self.send(NotificationEvent::DidReceive(notification));
            true
        })
    }

    #[must_use]
    pub fn delivered(&self) -> Vec<DeliveredNotification> {
        let mut delivered: Vec<_> = lock(&self.delivered).values().cloned().collect();
        delivered.sort_by_key(|notification| notification.date);
        delivered
    }

    fn send(&self, event: NotificationEvent) {
        if self.events.send(event).is_err() {
            warn!("notification receiver is gone, dropping event");
            return;
        }
        if let Some(waker) = lock(&self.waker).as_ref() {
            waker();
        }
    }
}

impl NotificationCenter for LocalNotificationCenter {
    fn request_authorization(&self) -> Result<bool, NotificationError> {
        let status = if self.allow {
            AuthorizationStatus::Authorized
        } else {
            AuthorizationStatus::Denied
        };
        *lock(&self.status) = status;
        Ok(self.allow)
    }

    fn authorization_status(&self) -> AuthorizationStatus {
        *lock(&self.status)
    }

    fn add(&self, request: NotificationRequest) -> Result<(), NotificationError> {
        if !self.authorization_status().allows_delivery() {
            return Err(NotificationError::Rejected {
                identifier: request.identifier,
                reason: "notifications are not authorized".to_string(),
            });
        }
        if request.trigger.fire_date().is_none() {
            return Err(NotificationError::Rejected {
                identifier: request.identifier,
                reason: "trigger doesn't name a valid date".to_string(),
            });
        }
        lock(&self.pending).insert(request.identifier.clone(), request);
        Ok(())
    }

    /// also forgets earlier deliveries, a cancelled alarm can't be tapped anymore
    fn remove_pending(&self, identifiers: &[String]) {
        let mut pending = lock(&self.pending);
        let mut delivered = lock(&self.delivered);
        for identifier in identifiers {
            pending.remove(identifier);
            delivered.remove(identifier);
        }
    }

    fn remove_all_pending(&self) {
        lock(&self.pending).clear();
        lock(&self.delivered).clear();
    }

    fn pending(&self) -> Vec<NotificationRequest> {
        let mut pending: Vec<_> = lock(&self.pending).values().cloned().collect();
        pending.sort_by_key(|request| request.trigger.fire_date());
        pending
    }
}
