//! Aggregate statistics snapshot served by `GET /stats`.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Risk-category label to record count, in the order the backend sent them.
///
/// The keys are dynamic and the order is significant for charting, so this is an ordered list
/// of pairs rather than a hash map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RiskCounts(Vec<(String, u64)>);

impl RiskCounts {
    pub fn new(pairs: Vec<(String, u64)>) -> Self {
        Self(pairs)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(label, count)| (label.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Largest count, or `0` when there are no categories.
    pub fn max_count(&self) -> u64 {
        self.0.iter().map(|(_, c)| *c).max().unwrap_or(0)
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for RiskCounts {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(l, c)| (l.into(), c)).collect())
    }
}

impl Serialize for RiskCounts {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, count) in &self.0 {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RiskCounts {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedCounts;

        impl<'de> Visitor<'de> for OrderedCounts {
            type Value = RiskCounts;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of risk label to count")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(RiskCounts::default())
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((label, count)) = access.next_entry::<String, u64>()? {
                    pairs.push((label, count));
                }
                Ok(RiskCounts(pairs))
            }
        }

        deserializer.deserialize_any(OrderedCounts)
    }
}

/// Aggregate counts derived server-side. Always replaced wholesale, never patched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub with_hypertension: u64,
    pub with_obesity: u64,
    #[serde(default)]
    pub by_risk: RiskCounts,
}
