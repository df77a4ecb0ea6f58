use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single entity as returned by the tracking service: field name to value.
pub type Record = Map<String, Value>;

/// Link to another entity, serialized the way the tracking service expects it:
/// `{"type": .., "id": ..}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub id: i64,
}

impl EntityRef {
    pub fn new(entity_type: impl Into<String>, id: i64) -> Self {
        Self {
            entity_type: entity_type.into(),
            id,
        }
    }

    /// Build a link from a record carrying both `type` and `id`.
    pub fn from_record(record: &Record) -> Option<Self> {
        let entity_type = record.get("type")?.as_str()?;
        let id = record.get("id")?.as_i64()?;
        Some(Self::new(entity_type, id))
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_owned(), Value::from(self.entity_type.as_str()));
        map.insert("id".to_owned(), Value::from(self.id));
        Value::Object(map)
    }
}

impl From<EntityRef> for Value {
    fn from(value: EntityRef) -> Self {
        value.to_value()
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.entity_type, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn link_from_record() {
        let record = json!({"type": "Shot", "id": 1204, "code": "SH020"});
        let link = EntityRef::from_record(record.as_object().unwrap());
        assert_eq!(link, Some(EntityRef::new("Shot", 1204)));
    }

    #[test]
    fn record_without_id_is_not_a_link() {
        let record = json!({"type": "Shot", "code": "SH020"});
        assert!(EntityRef::from_record(record.as_object().unwrap()).is_none());
    }

    #[test]
    fn serializes_with_type_key() {
        let link = EntityRef::new("Asset", 7);
        assert_eq!(link.to_value(), json!({"type": "Asset", "id": 7}));
        assert_eq!(serde_json::to_value(&link).unwrap(), link.to_value());
    }
}
