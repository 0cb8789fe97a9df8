//! Operator-injection key sanitizer.
//!
//! Keys beginning with `$` (and, unless dots are allowed, keys containing
//! `.`) can smuggle query operators into a document store. Offending
//! characters are rewritten in place; values, field order and field count
//! are left untouched. Running the sanitizer on its own output is a no-op.
//!
//! Bodies, query strings and header names are covered. Route parameter
//! names come from the route table, not the client, so they are not checked.

use std::collections::{HashMap, HashSet};
use std::fmt;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::config::SanitizeConfig;

/// Part of the request a sanitized key was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Body,
    Query,
    Headers,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Body => "body",
            Location::Query => "query",
            Location::Headers => "headers",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rewritten key. `key_path` is the dotted path of the original key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizationEvent {
    pub location: Location,
    pub key_path: String,
}

#[derive(Debug, Clone)]
pub struct KeySanitizer {
    replace_with: String,
    allow_dots: bool,
}

impl Default for KeySanitizer {
    fn default() -> Self {
        Self::from_config(&SanitizeConfig::default())
    }
}

impl KeySanitizer {
    pub fn from_config(config: &SanitizeConfig) -> Self {
        Self {
            replace_with: config.replace_with.clone(),
            allow_dots: config.allow_dots,
        }
    }

    pub fn is_disallowed(&self, key: &str) -> bool {
        key.starts_with('$') || (!self.allow_dots && key.contains('.'))
    }

    /// Rewritten key, or `None` when the key is already clean.
    pub fn rewrite_key(&self, key: &str) -> Option<String> {
        if !self.is_disallowed(key) {
            return None;
        }
        let rest = match key.strip_prefix('$') {
            Some(rest) => {
                let mut out = self.replace_with.clone();
                out.push_str(rest);
                out
            }
            None => key.to_string(),
        };
        if self.allow_dots {
            Some(rest)
        } else {
            Some(rest.replace('.', &self.replace_with))
        }
    }

    /// Sanitize every object key in `value`, recursing through objects and arrays.
    pub fn sanitize_json(&self, value: &mut Value) -> Vec<SanitizationEvent> {
        let mut events = Vec::new();
        self.walk(value, "", &mut events);
        events
    }

    fn walk(&self, value: &mut Value, path: &str, events: &mut Vec<SanitizationEvent>) {
        match value {
            Value::Object(map) => self.walk_object(map, path, events),
            Value::Array(items) => {
                for (i, item) in items.iter_mut().enumerate() {
                    self.walk(item, &join_path(path, &i.to_string()), events);
                }
            }
            _ => {}
        }
    }

    fn walk_object(&self, map: &mut Map<String, Value>, path: &str, events: &mut Vec<SanitizationEvent>) {
        if !map.keys().any(|k| self.is_disallowed(k)) {
            for (key, child) in map.iter_mut() {
                self.walk(child, &join_path(path, key), events);
            }
            return;
        }

        let original = std::mem::take(map);
        let mut taken: HashSet<String> = original.keys().cloned().collect();

        for (key, mut child) in original {
            let child_path = join_path(path, &key);
            let new_key = match self.rewrite_key(&key) {
                Some(mut candidate) => {
                    // Never drop a sibling that already uses the rewritten name.
                    while taken.contains(&candidate) {
                        candidate.push_str(&self.replace_with);
                    }
                    taken.insert(candidate.clone());
                    events.push(SanitizationEvent {
                        location: Location::Body,
                        key_path: child_path.clone(),
                    });
                    candidate
                }
                None => key,
            };
            self.walk(&mut child, &child_path, events);
            map.insert(new_key, child);
        }
    }

    /// Sanitize the keys of a URL query string.
    ///
    /// Bracketed keys (`filter[$gt]`) are checked segment by segment. Returns
    /// `None` when nothing changed, so the original encoding is kept.
    ///
    /// A rewritten key never lands on a key the query already uses; repeats
    /// of one original key share one rewritten name.
    pub fn sanitize_query(&self, query: &str) -> Option<(String, Vec<SanitizationEvent>)> {
        let parsed: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();

        let mut taken: HashSet<String> = parsed.iter().map(|(k, _)| k.clone()).collect();
        let mut renamed: HashMap<String, String> = HashMap::new();
        let mut events = Vec::new();
        let mut pairs = Vec::with_capacity(parsed.len());

        for (key, value) in parsed {
            let new_key = match renamed.get(&key) {
                Some(existing) => Some(existing.clone()),
                None => self.rewrite_bracketed(&key).map(|mut candidate| {
                    while taken.contains(&candidate) {
                        candidate.push_str(&self.replace_with);
                    }
                    taken.insert(candidate.clone());
                    renamed.insert(key.clone(), candidate.clone());
                    candidate
                }),
            };
            match new_key {
                Some(new_key) => {
                    events.push(SanitizationEvent {
                        location: Location::Query,
                        key_path: key,
                    });
                    pairs.push((new_key, value));
                }
                None => pairs.push((key, value)),
            }
        }

        if events.is_empty() {
            return None;
        }
        let rebuilt = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        Some((rebuilt, events))
    }

    /// Rename disallowed header names, keeping every value.
    ///
    /// A name that cannot be represented as a header after rewriting (the
    /// replacement is not a header token) is left as it is.
    pub fn sanitize_headers(&self, headers: &mut HeaderMap) -> Vec<SanitizationEvent> {
        let dirty: Vec<HeaderName> = headers
            .keys()
            .filter(|name| self.is_disallowed(name.as_str()))
            .cloned()
            .collect();

        let mut events = Vec::new();
        for name in dirty {
            let Some(mut candidate) = self.rewrite_key(name.as_str()) else {
                continue;
            };
            while headers.contains_key(candidate.as_str()) {
                candidate.push_str(&self.replace_with);
            }
            let Ok(new_name) = HeaderName::from_bytes(candidate.as_bytes()) else {
                tracing::warn!(header = %name, "Cannot rename header, left unchanged");
                continue;
            };

            let values: Vec<HeaderValue> = headers.get_all(&name).iter().cloned().collect();
            headers.remove(&name);
            for value in values {
                headers.append(new_name.clone(), value);
            }
            events.push(SanitizationEvent {
                location: Location::Headers,
                key_path: name.as_str().to_string(),
            });
        }
        events
    }

    fn rewrite_bracketed(&self, key: &str) -> Option<String> {
        let (base, rest) = match key.find('[') {
            Some(idx) => key.split_at(idx),
            None => (key, ""),
        };

        let mut changed = false;
        let mut out = match self.rewrite_key(base) {
            Some(new_base) => {
                changed = true;
                new_base
            }
            None => base.to_string(),
        };

        let mut remainder = rest;
        while let Some(inner) = remainder.strip_prefix('[') {
            let Some(end) = inner.find(']') else {
                out.push_str(remainder);
                remainder = "";
                break;
            };
            let segment = &inner[..end];
            let segment = match self.rewrite_key(segment) {
                Some(new_segment) => {
                    changed = true;
                    new_segment
                }
                None => segment.to_string(),
            };
            out.push('[');
            out.push_str(&segment);
            out.push(']');
            remainder = &inner[end + 1..];
        }
        out.push_str(remainder);

        changed.then_some(out)
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rewrite_key_allow_dots() {
        let s = KeySanitizer::default();
        assert_eq!(s.rewrite_key("$gt").as_deref(), Some("_gt"));
        assert_eq!(s.rewrite_key("$$where").as_deref(), Some("_$where"));
        assert_eq!(s.rewrite_key("a.b"), None);
        assert_eq!(s.rewrite_key("price$"), None);
    }

    #[test]
    fn test_rewrite_key_without_dots() {
        let s = KeySanitizer::from_config(&SanitizeConfig {
            replace_with: "_".into(),
            allow_dots: false,
        });
        assert_eq!(s.rewrite_key("a.b.c").as_deref(), Some("a_b_c"));
        assert_eq!(s.rewrite_key("$a.b").as_deref(), Some("_a_b"));
    }

    #[test]
    fn test_nested_body_keeps_order_and_values() {
        let s = KeySanitizer::default();
        let mut body = json!({
            "name": "x",
            "filter": {"age": {"$gt": 5}, "tags": [{"$in": ["a"]}]},
            "last": true
        });
        let events = s.sanitize_json(&mut body);

        assert_eq!(
            body,
            json!({
                "name": "x",
                "filter": {"age": {"_gt": 5}, "tags": [{"_in": ["a"]}]},
                "last": true
            })
        );
        let keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["name", "filter", "last"]);
        let paths: Vec<_> = events.iter().map(|e| e.key_path.as_str()).collect();
        assert_eq!(paths, vec!["filter.age.$gt", "filter.tags.0.$in"]);
        assert!(events.iter().all(|e| e.location == Location::Body));
    }

    #[test]
    fn test_sanitizing_twice_is_noop() {
        let s = KeySanitizer::default();
        let mut body = json!({"$where": "1", "$$x": {"$ne": null}, "ok": 1});
        assert_eq!(s.sanitize_json(&mut body).len(), 3);
        let once = body.clone();
        assert!(s.sanitize_json(&mut body).is_empty());
        assert_eq!(body, once);
    }

    #[test]
    fn test_collision_keeps_both_fields() {
        let s = KeySanitizer::default();
        let mut body = json!({"$gt": 1, "_gt": 2});
        let events = s.sanitize_json(&mut body);
        assert_eq!(events.len(), 1);
        assert_eq!(body, json!({"__gt": 1, "_gt": 2}));
        let keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["__gt", "_gt"]);
    }

    #[test]
    fn test_query_collision_keeps_both_fields() {
        let s = KeySanitizer::default();
        let (query, events) = s.sanitize_query("$where=1&_where=2").unwrap();
        assert_eq!(query, "__where=1&_where=2");
        assert_eq!(events.len(), 1);

        let (query, events) = s.sanitize_query("$a=1&_a=2&$a=3").unwrap();
        assert_eq!(query, "__a=1&_a=2&__a=3");
        assert_eq!(events.len(), 2);
        assert!(s.sanitize_query(&query).is_none());
    }

    #[test]
    fn test_header_names_renamed() {
        let s = KeySanitizer::default();
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.append("$where", HeaderValue::from_static("1"));
        headers.append("$where", HeaderValue::from_static("2"));
        headers.insert("_where", HeaderValue::from_static("kept"));

        let events = s.sanitize_headers(&mut headers);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].location, Location::Headers);
        assert_eq!(events[0].key_path, "$where");
        assert!(!headers.contains_key("$where"));
        let moved: Vec<_> = headers.get_all("__where").iter().collect();
        assert_eq!(moved, vec!["1", "2"]);
        assert_eq!(headers["_where"], "kept");
        assert_eq!(headers["content-type"], "application/json");
        assert!(s.sanitize_headers(&mut headers).is_empty());
    }

    #[test]
    fn test_query_brackets() {
        let s = KeySanitizer::default();
        let (query, events) = s.sanitize_query("age[$gt]=5&name=bob&$where=1").unwrap();
        assert_eq!(query, "age%5B_gt%5D=5&name=bob&_where=1");
        let paths: Vec<_> = events.iter().map(|e| e.key_path.as_str()).collect();
        assert_eq!(paths, vec!["age[$gt]", "$where"]);
        assert!(s.sanitize_query(&query).is_none());
    }

    #[test]
    fn test_clean_query_untouched() {
        let s = KeySanitizer::default();
        assert!(s.sanitize_query("a=1&b=%24x").is_none());
    }
}
