use crate::models::entity::Record;
use crate::models::filter::Filter;
use crate::source::{MetadataSource, SourceError};
use log::{debug, warn};
use std::collections::{HashMap, VecDeque};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// Fields requested when the caller does not name any.
pub const DEFAULT_FIELDS: [&str; 5] = [
    "code",
    "sg_head_in",
    "sg_tail_out",
    "sg_cut_in",
    "sg_cut_out",
];

/// Bounds on how much and how long the cache holds on to.
///
/// The default keeps every entry for the lifetime of the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachePolicy {
    /// Oldest entry is evicted first once this many are held.
    pub capacity: Option<NonZeroUsize>,
    /// Entries older than this are fetched again on their next access.
    pub ttl: Option<Duration>,
}

impl CachePolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

#[derive(Debug)]
struct CacheEntry {
    record: Record,
    fields: Vec<String>,
    fetched_at: Instant,
}

/// Memoizes entity lookups so each (type, id) reaches the tracking service
/// at most once while cached.
///
/// The requested field list is not part of the key: the first lookup decides which fields are held.
/// Ask for every field you will need on first use.
#[derive(Debug, Default)]
pub struct EntityCache {
    policy: CachePolicy,
    entries: HashMap<String, CacheEntry>,
    // insertion order, oldest first
    order: VecDeque<String>,
}

impl EntityCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn cache_key(entity_type: &str, entity_id: i64) -> String {
        format!("{entity_type}_{entity_id}")
    }

    /// Fetch an entity, going to `source` only on a miss.
    /// An entity the source does not know is cached as an empty record.
    pub fn get<S>(
        &mut self,
        source: &S,
        entity_type: &str,
        entity_id: i64,
        fields: Option<&[&str]>,
    ) -> Result<&Record, SourceError>
    where
        S: MetadataSource + ?Sized,
    {
        let key = Self::cache_key(entity_type, entity_id);
        let fields = fields.unwrap_or(&DEFAULT_FIELDS);
        self.expire(&key);

        match self.entries.get(&key) {
            Some(entry) => {
                debug!("Cache hit for {key}");
                let missing: Vec<&str> = fields
                    .iter()
                    .copied()
                    .filter(|f| !entry.fields.iter().any(|held| held.as_str() == *f))
                    .collect();
                if !missing.is_empty() {
                    warn!(
                        "Cached {key} was fetched without fields {missing:?}; returning cached data"
                    );
                }
            }
            None => {
                let record = source
                    .find_one(entity_type, &[Filter::is("id", entity_id)], fields)?
                    .unwrap_or_default();
                self.insert(
                    key.clone(),
                    CacheEntry {
                        record,
                        fields: fields.iter().map(|f| f.to_string()).collect(),
                        fetched_at: Instant::now(),
                    },
                );
            }
        }

        Ok(&self.entries[&key].record)
    }

    pub fn contains(&self, entity_type: &str, entity_id: i64) -> bool {
        self.entries
            .contains_key(&Self::cache_key(entity_type, entity_id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn expire(&mut self, key: &str) {
        let Some(ttl) = self.policy.ttl else {
            return;
        };
        let stale = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.fetched_at.elapsed() >= ttl);
        if stale {
            debug!("Cache entry {key} expired");
            self.entries.remove(key);
            self.order.retain(|k| k != key);
        }
    }

    fn insert(&mut self, key: String, entry: CacheEntry) {
        if let Some(capacity) = self.policy.capacity {
            while self.entries.len() >= capacity.get() {
                let Some(oldest) = self.order.pop_front() else {
                    break;
                };
                debug!("Evicting {oldest} from cache");
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use serde_json::json;

    fn source() -> MemorySource {
        MemorySource::from_json(
            r#"{
                "Shot": [
                    {"id": 1204, "code": "SH020", "sg_cut_in": 1001, "sg_cut_out": 1096,
                     "sg_status_list": "ip"},
                    {"id": 1205, "code": "SH030", "sg_cut_in": 1001, "sg_cut_out": 1040}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn same_key_hits_source_once() {
        let source = source();
        let mut cache = EntityCache::default();
        let first = cache.get(&source, "Shot", 1204, None).unwrap().clone();
        let second = cache.get(&source, "Shot", 1204, None).unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(first["code"], "SH020");
        assert_eq!(source.lookups(), 1);
    }

    #[test]
    fn distinct_keys_each_hit_source() {
        let source = source();
        let mut cache = EntityCache::default();
        cache.get(&source, "Shot", 1204, None).unwrap();
        cache.get(&source, "Shot", 1205, None).unwrap();
        cache.get(&source, "Asset", 1204, None).unwrap();
        assert_eq!(source.lookups(), 3);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn default_fields_are_requested() {
        let source = source();
        let mut cache = EntityCache::default();
        let shot = cache.get(&source, "Shot", 1204, None).unwrap();
        for field in DEFAULT_FIELDS {
            assert!(shot.contains_key(field), "missing {field}");
        }
        assert!(!shot.contains_key("sg_status_list"));
    }

    #[test]
    fn unknown_entity_is_cached_empty() {
        let source = source();
        let mut cache = EntityCache::default();
        assert!(cache.get(&source, "Shot", 1, None).unwrap().is_empty());
        assert!(cache.get(&source, "Shot", 1, None).unwrap().is_empty());
        assert_eq!(source.lookups(), 1);
        assert!(cache.contains("Shot", 1));
    }

    #[test]
    fn later_fields_do_not_refetch() {
        let source = source();
        let mut cache = EntityCache::default();
        cache.get(&source, "Shot", 1204, Some(&["code"][..])).unwrap();
        let shot = cache
            .get(&source, "Shot", 1204, Some(&["code", "sg_status_list"][..]))
            .unwrap();
        assert!(!shot.contains_key("sg_status_list"));
        assert_eq!(source.lookups(), 1);
    }

    #[test]
    fn source_errors_are_not_cached() {
        let source = source();
        let mut cache = EntityCache::default();
        source.set_offline(true);
        assert!(matches!(
            cache.get(&source, "Shot", 1204, None),
            Err(SourceError::Unavailable(_))
        ));
        assert!(cache.is_empty());

        source.set_offline(false);
        assert_eq!(cache.get(&source, "Shot", 1204, None).unwrap()["code"], json!("SH020"));
    }

    #[test]
    fn capacity_evicts_oldest() {
        let source = source();
        let policy = CachePolicy::unbounded().with_capacity(NonZeroUsize::new(1).unwrap());
        let mut cache = EntityCache::new(policy);
        cache.get(&source, "Shot", 1204, None).unwrap();
        cache.get(&source, "Shot", 1205, None).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains("Shot", 1204));
        assert!(cache.contains("Shot", 1205));

        cache.get(&source, "Shot", 1204, None).unwrap();
        assert_eq!(source.lookups(), 3);
    }

    #[test]
    fn ttl_refetches_stale_entries() {
        let source = source();
        let mut cache = EntityCache::new(CachePolicy::unbounded().with_ttl(Duration::ZERO));
        cache.get(&source, "Shot", 1204, None).unwrap();
        cache.get(&source, "Shot", 1204, None).unwrap();
        assert_eq!(source.lookups(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_forgets_everything() {
        let source = source();
        let mut cache = EntityCache::default();
        cache.get(&source, "Shot", 1204, None).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        cache.get(&source, "Shot", 1204, None).unwrap();
        assert_eq!(source.lookups(), 2);
    }
}
