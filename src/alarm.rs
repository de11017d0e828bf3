use std::{fmt, str::FromStr};

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AlarmId = Uuid;

/// represents an alarm
/// contains the date and time that the alarm should go off at,
/// as well as an optional note and the sound to ring with
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub id: AlarmId,
    #[serde(with = "toml_datetime_compat")]
    pub date: NaiveDateTime,
    pub note: Option<String>,
    #[serde(default)]
    pub sound: SoundName,
    #[serde(default = "crate::config::always_true")]
    pub enabled: bool,
}

/// the fields a user supplies when creating an alarm, the id is assigned by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlarm {
    pub date: NaiveDateTime,
    pub note: Option<String>,
    pub sound: SoundName,
    pub enabled: bool,
}

impl NewAlarm {
    #[must_use]
    pub fn new(date: NaiveDateTime, note: &str, sound: SoundName) -> Self {
        Self {
            date: truncate_to_minute(date),
            note: if note.trim().is_empty() {
                None
            } else {
                Some(note.to_string())
            },
            sound,
            enabled: true,
        }
    }

    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl Alarm {
    #[must_use]
    pub fn from_new(id: AlarmId, new: NewAlarm) -> Self {
        Self {
            id,
            date: truncate_to_minute(new.date),
            note: new.note,
            sound: new.sound,
            enabled: new.enabled,
        }
    }

    #[must_use]
    pub fn note_or_empty(&self) -> &str {
        self.note.as_deref().unwrap_or_default()
    }

    /// an alarm can only ring if it is enabled and its date hasn't passed yet
    #[must_use]
    pub fn is_pending(&self, now: NaiveDateTime) -> bool {
        self.enabled && self.date > now
    }
}

/// drops seconds and sub-seconds, alarms only have minute precision
#[must_use]
pub fn truncate_to_minute(date: NaiveDateTime) -> NaiveDateTime {
    date.with_second(0)
        .and_then(|date| date.with_nanosecond(0))
        .unwrap_or(date)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SoundName {
    #[default]
    Default,
    Radar,
    Beacon,
    Chime,
    Bell,
}

impl SoundName {
    pub const ALL: [Self; 5] = [
        Self::Default,
        Self::Radar,
        Self::Beacon,
        Self::Chime,
        Self::Bell,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Radar => "Radar",
            Self::Beacon => "Beacon",
            Self::Chime => "Chime",
            Self::Bell => "Bell",
        }
    }

    /// any name outside the known set falls back to the default sound
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|sound| sound.as_str() == name)
            .unwrap_or_default()
    }
}

impl fmt::Display for SoundName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SoundName {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl From<String> for SoundName {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<SoundName> for String {
    fn from(sound: SoundName) -> Self {
        sound.as_str().to_string()
    }
}
