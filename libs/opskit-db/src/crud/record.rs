use serde::Serialize;
use serde_json::{Map, Value};

/// A root row plus its eager-loaded relations.
///
/// Serializes flat: the model's fields, then one key per relation
/// (an object or `null` for to-one, an array for to-many).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record<M> {
    #[serde(flatten)]
    pub model: M,
    #[serde(flatten)]
    pub relations: Map<String, Value>,
}

impl<M> Record<M> {
    #[must_use]
    pub fn new(model: M) -> Self {
        Self {
            model,
            relations: Map::new(),
        }
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&Value> {
        self.relations.get(name)
    }

    #[must_use]
    pub fn into_model(self) -> M {
        self.model
    }
}
