use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A live application record addressed by item type and id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub item_type: String,
    pub id: i64,
    pub attributes: Map<String, Value>,
}

impl Entity {
    pub fn new(item_type: impl Into<String>, id: i64, attributes: Map<String, Value>) -> Self {
        Self {
            item_type: item_type.into(),
            id,
            attributes,
        }
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }
}
