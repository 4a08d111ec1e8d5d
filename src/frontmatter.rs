// ABOUTME: Frontmatter model for slides and decks
// ABOUTME: Ordered key-value mapping over a small closed value type, built from YAML

use crate::errors::Result;
use indexmap::IndexMap;
use serde::Serialize;

/// A single frontmatter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FrontmatterValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<FrontmatterValue>),
    Map(Frontmatter),
}

impl FrontmatterValue {
    /// Truthiness as used by `disabled` / `hide` checks.
    pub fn is_truthy(&self) -> bool {
        match self {
            FrontmatterValue::Null => false,
            FrontmatterValue::Bool(b) => *b,
            FrontmatterValue::Integer(i) => *i != 0,
            FrontmatterValue::Float(f) => *f != 0.0 && !f.is_nan(),
            FrontmatterValue::String(s) => !s.is_empty(),
            FrontmatterValue::List(_) | FrontmatterValue::Map(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FrontmatterValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FrontmatterValue::Integer(i) => Some(*i),
            FrontmatterValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    fn from_yaml(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => FrontmatterValue::Null,
            serde_yaml::Value::Bool(b) => FrontmatterValue::Bool(b),
            serde_yaml::Value::Number(n) => match n.as_i64() {
                Some(i) => FrontmatterValue::Integer(i),
                None => FrontmatterValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_yaml::Value::String(s) => FrontmatterValue::String(s),
            serde_yaml::Value::Sequence(items) => {
                FrontmatterValue::List(items.into_iter().map(Self::from_yaml).collect())
            }
            serde_yaml::Value::Mapping(map) => FrontmatterValue::Map(Frontmatter::from_mapping(map)),
            serde_yaml::Value::Tagged(tagged) => Self::from_yaml(tagged.value),
        }
    }
}

impl From<&str> for FrontmatterValue {
    fn from(value: &str) -> Self {
        FrontmatterValue::String(value.to_string())
    }
}

impl From<String> for FrontmatterValue {
    fn from(value: String) -> Self {
        FrontmatterValue::String(value)
    }
}

impl From<bool> for FrontmatterValue {
    fn from(value: bool) -> Self {
        FrontmatterValue::Bool(value)
    }
}

impl From<i64> for FrontmatterValue {
    fn from(value: i64) -> Self {
        FrontmatterValue::Integer(value)
    }
}

/// Insertion-ordered frontmatter mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Frontmatter(IndexMap<String, FrontmatterValue>);

impl Frontmatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML block. Empty or non-mapping documents give an empty frontmatter.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::new());
        }
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        Ok(match value {
            serde_yaml::Value::Mapping(map) => Self::from_mapping(map),
            serde_yaml::Value::Tagged(tagged) => match tagged.value {
                serde_yaml::Value::Mapping(map) => Self::from_mapping(map),
                _ => Self::new(),
            },
            _ => Self::new(),
        })
    }

    fn from_mapping(map: serde_yaml::Mapping) -> Self {
        let mut entries = IndexMap::with_capacity(map.len());
        for (key, value) in map {
            let key = match key {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Null => "null".to_string(),
                _ => continue,
            };
            entries.insert(key, FrontmatterValue::from_yaml(value));
        }
        Frontmatter(entries)
    }

    pub fn get(&self, key: &str) -> Option<&FrontmatterValue> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FrontmatterValue::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_truthy(&self, key: &str) -> bool {
        self.get(key).map(FrontmatterValue::is_truthy).unwrap_or(false)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FrontmatterValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Remove a key, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<FrontmatterValue> {
        self.0.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FrontmatterValue)> {
        self.0.iter()
    }

    /// Whether the slide is switched off through `disabled` or `hide`.
    pub fn is_skipped(&self) -> bool {
        self.is_truthy("disabled") || self.is_truthy("hide")
    }

    pub fn src(&self) -> Option<&FrontmatterValue> {
        self.get("src")
    }

    pub fn title(&self) -> Option<&str> {
        self.get_str("title")
    }

    /// Shallow merge: keys of `other` overwrite keys of `self`.
    pub fn merge(&mut self, other: &Frontmatter) {
        for (key, value) in other.iter() {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Shallow-merged copy of `self` overlaid with an optional override.
    pub fn merged(&self, overrides: Option<&Frontmatter>) -> Frontmatter {
        let mut merged = self.clone();
        if let Some(overrides) = overrides {
            merged.merge(overrides);
        }
        merged
    }
}

impl<K: Into<String>, V: Into<FrontmatterValue>> FromIterator<(K, V)> for Frontmatter {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Frontmatter(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
