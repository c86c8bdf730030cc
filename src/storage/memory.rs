//! In-process [`KeyValueStore`]. Each primitive runs under one shard lock;
//! expired keys are dropped when next touched.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{GeoMember, KeyValueStore, Result, StorageError};
use crate::geo::{haversine_m, DistanceUnit, Point};

const MAX_GEO_LAT: f64 = 85.051_128_78;

#[derive(Debug)]
enum Value {
    Str(String),
    Geo(HashMap<String, Point>),
    Sorted(HashMap<String, f64>),
}

impl Value {
    fn is_empty_collection(&self) -> bool {
        match self {
            Value::Str(_) => false,
            Value::Geo(members) => members.is_empty(),
            Value::Sorted(members) => members.is_empty(),
        }
    }
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn persistent(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys, expired ones excluded.
    pub fn key_count(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .count()
    }

    fn purge_expired(&self, key: &str) {
        let now = Instant::now();
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
    }

    fn drop_if_empty(&self, key: &str) {
        self.entries
            .remove_if(key, |_, entry| entry.value.is_empty_collection());
    }

    fn wrong_type(key: &str) -> StorageError {
        StorageError::WrongType {
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let entry = Entry {
            value: Value::Str(value),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.purge_expired(key);
        match self.entries.get(key) {
            None => Ok(None),
            Some(entry) => match &entry.value {
                Value::Str(value) => Ok(Some(value.clone())),
                _ => Err(Self::wrong_type(key)),
            },
        }
    }

    async fn del(&self, key: &str) -> Result<bool> {
        self.purge_expired(key);
        Ok(self.entries.remove(key).is_some())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        self.purge_expired(key);
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::persistent(Value::Str("0".to_string())));

        match &mut entry.value {
            Value::Str(raw) => {
                let current: i64 = raw.parse().map_err(|_| Self::wrong_type(key))?;
                let next = current
                    .checked_add(1)
                    .ok_or_else(|| StorageError::Backend(format!("increment of {key} overflows")))?;
                *raw = next.to_string();
                Ok(next)
            }
            _ => Err(Self::wrong_type(key)),
        }
    }

    async fn geo_add(&self, key: &str, member: &str, point: Point) -> Result<()> {
        if !(-MAX_GEO_LAT..=MAX_GEO_LAT).contains(&point.lat)
            || !(-180.0..=180.0).contains(&point.lng)
        {
            return Err(StorageError::Backend(format!(
                "invalid longitude,latitude pair {},{}",
                point.lng, point.lat
            )));
        }

        self.purge_expired(key);
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::persistent(Value::Geo(HashMap::new())));

        match &mut entry.value {
            Value::Geo(members) => {
                members.insert(member.to_string(), point);
                Ok(())
            }
            _ => Err(Self::wrong_type(key)),
        }
    }

    async fn geo_radius(
        &self,
        key: &str,
        center: Point,
        radius: f64,
        unit: DistanceUnit,
    ) -> Result<Vec<GeoMember>> {
        self.purge_expired(key);
        let radius_m = unit.to_meters(radius);

        let mut found: Vec<GeoMember> = match self.entries.get(key) {
            None => return Ok(Vec::new()),
            Some(entry) => match &entry.value {
                Value::Geo(members) => members
                    .iter()
                    .filter_map(|(member, point)| {
                        let distance_m = haversine_m(&center, point);
                        (distance_m <= radius_m).then(|| GeoMember {
                            member: member.clone(),
                            point: *point,
                            distance: unit.from_meters(distance_m),
                        })
                    })
                    .collect(),
                _ => return Err(Self::wrong_type(key)),
            },
        };

        found.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(found)
    }

    async fn geo_remove(&self, key: &str, member: &str) -> Result<bool> {
        self.purge_expired(key);
        let removed = match self.entries.get_mut(key) {
            None => return Ok(false),
            Some(mut entry) => match &mut entry.value {
                Value::Geo(members) => members.remove(member).is_some(),
                _ => return Err(Self::wrong_type(key)),
            },
        };

        self.drop_if_empty(key);
        Ok(removed)
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        if score.is_nan() {
            return Err(StorageError::Backend("score is not a number".to_string()));
        }

        self.purge_expired(key);
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::persistent(Value::Sorted(HashMap::new())));

        match &mut entry.value {
            Value::Sorted(members) => {
                members.insert(member.to_string(), score);
                Ok(())
            }
            _ => Err(Self::wrong_type(key)),
        }
    }

    async fn zrange_by_score(&self, key: &str, min: f64, max: f64) -> Result<Vec<String>> {
        self.purge_expired(key);
        let mut in_range: Vec<(String, f64)> = match self.entries.get(key) {
            None => return Ok(Vec::new()),
            Some(entry) => match &entry.value {
                Value::Sorted(members) => members
                    .iter()
                    .filter(|(_, score)| **score >= min && **score <= max)
                    .map(|(member, score)| (member.clone(), *score))
                    .collect(),
                _ => return Err(Self::wrong_type(key)),
            },
        };

        in_range.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(in_range.into_iter().map(|(member, _)| member).collect())
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<bool> {
        self.purge_expired(key);
        let removed = match self.entries.get_mut(key) {
            None => return Ok(false),
            Some(mut entry) => match &mut entry.value {
                Value::Sorted(members) => members.remove(member).is_some(),
                _ => return Err(Self::wrong_type(key)),
            },
        };

        self.drop_if_empty(key);
        Ok(removed)
    }

    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        self.purge_expired(key);
        let removed = match self.entries.get_mut(key) {
            None => return Ok(0),
            Some(mut entry) => match &mut entry.value {
                Value::Sorted(members) => {
                    let before = members.len();
                    members.retain(|_, score| *score < min || *score > max);
                    (before - members.len()) as u64
                }
                _ => return Err(Self::wrong_type(key)),
            },
        };

        self.drop_if_empty(key);
        Ok(removed)
    }

    async fn zcard(&self, key: &str) -> Result<u64> {
        self.purge_expired(key);
        match self.entries.get(key) {
            None => Ok(0),
            Some(entry) => match &entry.value {
                Value::Sorted(members) => Ok(members.len() as u64),
                _ => Err(Self::wrong_type(key)),
            },
        }
    }
}
