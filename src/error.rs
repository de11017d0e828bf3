use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::alarm::AlarmId;

/// failure of the persistence gateway
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// reading or writing the store file failed
    #[error("couldn't access alarm store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't serialize alarms: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("couldn't parse alarm store: {0}")]
    Deserialize(#[from] toml::de::Error),

    #[error("no alarm with id {0}")]
    NotFound(AlarmId),
}

/// failure of a user-facing alarm operation
#[derive(Debug, thiserror::Error)]
pub enum AlarmError {
    /// the alarm would fire at or before the current time
    #[error("Please select a date and time in the future.")]
    PastDate { date: NaiveDateTime, now: NaiveDateTime },

    /// the form fields don't describe a real calendar date/time
    #[error("{0} is not a valid date")]
    InvalidDate(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// failure inside the audio backend, never shown to the user
#[derive(Debug, thiserror::Error)]
pub enum SoundError {
    #[error("no sound asset for {0}")]
    AssetMissing(String),

    #[error("couldn't decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("couldn't activate audio session: {0}")]
    Session(String),
}

/// the host notification service refused a request
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification request {identifier} rejected: {reason}")]
    Rejected { identifier: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("couldn't read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("couldn't serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("couldn't determine the project directories")]
    NoProjectDirs,
}
