use std::{
    collections::HashMap,
    hash::Hash,
    path::{Path, PathBuf},
};

use chrono::{Duration, NaiveDateTime};
use log::{error, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    alarm::{Alarm, AlarmId, NewAlarm, SoundName},
    error::StoreError,
};

pub trait GetId<T> {
    fn get_id(&self) -> &T;
}

impl GetId<AlarmId> for Alarm {
    fn get_id(&self) -> &AlarmId {
        &self.id
    }
}

/// Serializable collection, stored as a list but indexed by id
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(from = "Vec<V>", into = "Vec<V>")]
pub struct Collection<K, V>
where
    K: Eq + Hash + Clone,
    V: GetId<K> + Clone,
{
    pub data: HashMap<K, V>,
}

impl<K, V> Default for Collection<K, V>
where
    K: Eq + Hash + Clone,
    V: GetId<K> + Clone,
{
    fn default() -> Self {
        Self {
            data: HashMap::new(),
        }
    }
}

impl<K, V> Collection<K, V>
where
    K: Eq + Hash + Clone,
    V: GetId<K> + Clone,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: V) -> Option<V> {
        let id = item.get_id().to_owned();
        self.data.insert(id, item)
    }
}

impl<K, V> From<Vec<V>> for Collection<K, V>
where
    K: Eq + Hash + Clone,
    V: GetId<K> + Clone,
{
    fn from(value: Vec<V>) -> Self {
        let mut obj: Self = Self::new();
        value.into_iter().for_each(|v| {
            obj.insert(v);
        });
        obj
    }
}

impl<K, V> From<Collection<K, V>> for Vec<V>
where
    K: Eq + Hash + Clone,
    V: GetId<K> + Clone,
{
    fn from(val: Collection<K, V>) -> Self {
        Self::from_iter(val.data.into_values())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
struct StoreFile {
    #[serde(default)]
    alarms: Collection<AlarmId, Alarm>,
}

/// alarm records kept in a toml file (`alarms = [...]`), every mutation is written back
/// before it returns, an in memory store never touches disk
#[derive(Debug)]
pub struct AlarmStore {
    path: Option<PathBuf>,
    alarms: Collection<AlarmId, Alarm>,
}

impl AlarmStore {
    /// opens the store at `path`, an absent file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let alarms = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            toml::from_str::<StoreFile>(&contents)?.alarms
        } else {
            Collection::new()
        };
        info!("loaded {} alarms from {}", alarms.data.len(), path.display());
        Ok(Self {
            path: Some(path),
            alarms,
        })
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            alarms: Collection::new(),
        }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.alarms.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alarms.data.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: AlarmId) -> Option<&Alarm> {
        self.alarms.data.get(&id)
    }

    /// every alarm, soonest first
    #[must_use]
    pub fn all(&self) -> Vec<Alarm> {
        let mut alarms: Vec<Alarm> = self.alarms.data.values().cloned().collect();
        alarms.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        alarms
    }

    pub fn create(&mut self, new: NewAlarm) -> Result<Alarm, StoreError> {
        let alarm = Alarm::from_new(Uuid::new_v4(), new);
        let mut alarms = self.alarms.clone();
        alarms.insert(alarm.clone());
        self.commit(alarms)?;
        Ok(alarm)
    }

    pub fn set_enabled(&mut self, id: AlarmId, enabled: bool) -> Result<Alarm, StoreError> {
        let mut alarms = self.alarms.clone();
        let alarm = alarms.data.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        alarm.enabled = enabled;
        let alarm = alarm.clone();
        self.commit(alarms)?;
        Ok(alarm)
    }

    /// replaces the record with the same id
    pub fn update(&mut self, alarm: Alarm) -> Result<(), StoreError> {
        if !self.alarms.data.contains_key(&alarm.id) {
            return Err(StoreError::NotFound(alarm.id));
        }
        let mut alarms = self.alarms.clone();
        alarms.insert(alarm);
        self.commit(alarms)
    }

    pub fn delete(&mut self, id: AlarmId) -> Result<Alarm, StoreError> {
        let mut alarms = self.alarms.clone();
        let removed = alarms.data.remove(&id).ok_or(StoreError::NotFound(id))?;
        self.commit(alarms)?;
        Ok(removed)
    }

    /// swaps `old` for a fresh record in one write, so either both changes land or neither does
    pub fn replace(&mut self, old: AlarmId, new: NewAlarm) -> Result<Alarm, StoreError> {
        let mut alarms = self.alarms.clone();
        alarms.data.remove(&old).ok_or(StoreError::NotFound(old))?;
        let alarm = Alarm::from_new(Uuid::new_v4(), new);
        alarms.insert(alarm.clone());
        self.commit(alarms)?;
        Ok(alarm)
    }

    /// removes every listed alarm in one write, unknown ids are skipped
    pub fn delete_many(&mut self, ids: &[AlarmId]) -> Result<Vec<Alarm>, StoreError> {
        let mut alarms = self.alarms.clone();
        let removed: Vec<Alarm> = ids.iter().filter_map(|id| alarms.data.remove(id)).collect();
        self.commit(alarms)?;
        Ok(removed)
    }

    /// fills the store with a handful of upcoming alarms
    pub fn seed_samples(&mut self, now: NaiveDateTime) -> Result<(), StoreError> {
        let samples = [
            (1, "Morning run", SoundName::Radar),
            (2, "Doctor appointment", SoundName::Beacon),
            (3, "Meeting", SoundName::Default),
            (7, "Weekly review", SoundName::Radar),
        ];
        let mut alarms = self.alarms.clone();
        for (days, note, sound) in samples {
            alarms.insert(Alarm::from_new(
                Uuid::new_v4(),
                NewAlarm::new(now + Duration::days(days), note, sound),
            ));
        }
        self.commit(alarms)
    }

    // the in memory state is only replaced once the write went through
    fn commit(&mut self, alarms: Collection<AlarmId, Alarm>) -> Result<(), StoreError> {
        if let Some(path) = &self.path {
            if let Err(e) = write_store(path, &alarms) {
                error!("couldn't save alarms: {e}");
                return Err(e);
            }
        }
        self.alarms = alarms;
        Ok(())
    }
}

fn write_store(path: &Path, alarms: &Collection<AlarmId, Alarm>) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    let contents = toml::to_string(&StoreFile {
        alarms: alarms.clone(),
    })?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, contents).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)
}
