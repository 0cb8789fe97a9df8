//! HTTP parameter pollution protection.
//!
//! When a query parameter appears more than once, the last value wins and
//! takes the position of the key's first occurrence. Keys on the
//! `allow_repeated` list keep every value. The collapsed values are kept
//! aside as [`PollutedParams`] for handlers that want them.

use std::collections::{HashMap, HashSet};

use url::form_urlencoded;

use crate::config::ParamsConfig;

/// Parameters that were collapsed, with every original value in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollutedParams(pub Vec<(String, Vec<String>)>);

impl PollutedParams {
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParamDeduplicator {
    allow_repeated: HashSet<String>,
}

impl ParamDeduplicator {
    pub fn from_config(config: &ParamsConfig) -> Self {
        Self {
            allow_repeated: config.allow_repeated.iter().cloned().collect(),
        }
    }

    /// Collapse repeated keys. Returns `None` when no key repeats.
    pub fn dedupe(&self, query: &str) -> Option<(String, PollutedParams)> {
        let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for (key, _) in &pairs {
            *counts.entry(key.as_str()).or_default() += 1;
        }
        let repeated = |key: &str| {
            counts.get(key).copied().unwrap_or(0) > 1 && !self.allow_repeated.contains(key)
        };
        if !pairs.iter().any(|(k, _)| repeated(k)) {
            return None;
        }

        let mut kept: Vec<(String, String)> = Vec::with_capacity(pairs.len());
        let mut slot: HashMap<String, usize> = HashMap::new();
        let mut polluted: Vec<(String, Vec<String>)> = Vec::new();

        for (key, value) in &pairs {
            if !repeated(key) {
                kept.push((key.clone(), value.clone()));
                continue;
            }
            match slot.get(key) {
                Some(&idx) => {
                    kept[idx].1 = value.clone();
                    if let Some((_, values)) = polluted.iter_mut().find(|(k, _)| k == key) {
                        values.push(value.clone());
                    }
                }
                None => {
                    slot.insert(key.clone(), kept.len());
                    kept.push((key.clone(), value.clone()));
                    polluted.push((key.clone(), vec![value.clone()]));
                }
            }
        }

        let rebuilt = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(kept)
            .finish();
        Some((rebuilt, PollutedParams(polluted)))
    }
}
