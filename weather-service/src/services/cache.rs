use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::models::WeatherConditions;

#[derive(Debug, Clone)]
struct CacheEntry {
    recommendations: Vec<String>,
    inserted_at: Instant,
}

/// TTL cache of generated recommendations keyed by the prompt's conditions.
#[derive(Debug, Clone)]
pub struct RecommendationCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl RecommendationCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Conditions rendered at fixed precision, so equal prompts share a key.
    pub fn key(conditions: &WeatherConditions) -> String {
        format!(
            "{:.2}|{:.2}|{:.2}|{:.2}",
            conditions.temperature, conditions.wind_speed, conditions.pressure, conditions.humidity
        )
    }

    pub fn get(&self, conditions: &WeatherConditions) -> Option<Vec<String>> {
        let key = Self::key(conditions);
        let expired = match self.entries.get(&key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Some(entry.recommendations.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(&key);
        }
        None
    }

    pub fn insert(&self, conditions: &WeatherConditions, recommendations: Vec<String>) {
        let key = Self::key(conditions);
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.evict();
        }
        self.entries.insert(
            key,
            CacheEntry {
                recommendations,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop expired entries; if still full, drop the oldest one.
    fn evict(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);

        if self.entries.len() >= self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.inserted_at)
                .map(|entry| entry.key().clone());
            if let Some(key) = oldest {
                self.entries.remove(&key);
            }
        }
    }
}
