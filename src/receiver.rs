use std::sync::Arc;

use crossbeam_channel::{Receiver, TryRecvError};
use log::{info, warn};

use crate::{
    alarm::SoundName,
    communication::NotificationEvent,
    notification::DeliveredNotification,
    scheduler::SOUND_NAME_KEY,
    sound::SoundPlayer,
};

/// what the alarm screen needs to know about a fired notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmNotificationData {
    pub id: String,
    pub title: String,
    pub body: String,
    pub sound_name: String,
}

impl AlarmNotificationData {
    #[must_use]
    pub fn from_notification(notification: &DeliveredNotification) -> Self {
        let content = &notification.content;
        Self {
            id: notification.identifier.clone(),
            title: content.title.clone(),
            body: content.body.clone(),
            sound_name: content
                .user_info
                .get(SOUND_NAME_KEY)
                .cloned()
                .unwrap_or_else(|| SoundName::Default.to_string()),
        }
    }

    #[must_use]
    pub fn sound(&self) -> SoundName {
        SoundName::from_name(&self.sound_name)
    }
}

/// how the host should present a notification, an empty set means no banner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresentationOptions {
    pub banner: bool,
    pub sound: bool,
    pub badge: bool,
}

impl PresentationOptions {
    pub const NONE: Self = Self {
        banner: false,
        sound: false,
        badge: false,
    };
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForegroundAlarmState {
    pub current: Option<AlarmNotificationData>,
    pub showing: bool,
}

impl ForegroundAlarmState {
    /// the alarm to show, only while presentation is requested
    #[must_use]
    pub fn presented(&self) -> Option<&AlarmNotificationData> {
        self.current.as_ref().filter(|_| self.showing)
    }

    pub fn dismiss(&mut self) {
        self.showing = false;
        self.current = None;
    }
}

/// the single consumer of notification events, owned by the ui thread
#[derive(Debug)]
pub struct AlarmDispatcher {
    events: Receiver<NotificationEvent>,
    player: Arc<SoundPlayer>,
    state: ForegroundAlarmState,
}

impl AlarmDispatcher {
    #[must_use]
    pub const fn new(events: Receiver<NotificationEvent>, player: Arc<SoundPlayer>) -> Self {
        Self {
            events,
            player,
            state: ForegroundAlarmState {
                current: None,
                showing: false,
            },
        }
    }

    /// handles every queued event, returns how many there were
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.handle(event);
                    handled += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("notification center went away");
                    break;
                }
            }
        }
        handled
    }

    pub fn handle(&mut self, event: NotificationEvent) -> PresentationOptions {
        match event {
            NotificationEvent::WillPresent(notification) => {
                let data = AlarmNotificationData::from_notification(&notification);
                info!("alarm {} fired in the foreground", data.id);
                // sound first, the alarm screen shows up on the next frame
                self.player.play(data.sound());
                self.state.current = Some(data);
                self.state.showing = true;
                PresentationOptions::NONE
            }
            NotificationEvent::DidReceive(notification) => {
                info!("user tapped notification for alarm: {}", notification.identifier);
                PresentationOptions::default()
            }
        }
    }

    #[must_use]
    pub const fn state(&self) -> &ForegroundAlarmState {
        &self.state
    }

    #[must_use]
    pub fn player(&self) -> &SoundPlayer {
        &self.player
    }

    /// stops the sound and clears the foreground alarm
    pub fn stop_alarm(&mut self) {
        self.player.stop();
        self.state.dismiss();
    }
}
