use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DatasetError;
use crate::model::{Entity, Relation};

/// The loader's wire format: `{ "entities": [...], "relations": [...] }`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Dataset {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl Dataset {
    pub fn from_json(raw: &str) -> Result<Self, DatasetError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let raw = fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            entities = dataset.entities.len(),
            relations = dataset.relations.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    pub fn into_parts(self) -> (Vec<Entity>, Vec<Relation>) {
        (self.entities, self.relations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_format() {
        let raw = r#"{
            "entities": [
                {"id": "acme", "name": "Acme Corp", "group": "company"},
                {"id": 2, "name": "Widget"}
            ],
            "relations": [
                {"sourceId": "acme", "targetId": 2, "relationType": "produces"}
            ]
        }"#;

        let dataset = Dataset::from_json(raw).unwrap();
        assert_eq!(dataset.entities.len(), 2);
        assert_eq!(dataset.entities[0].group_tag.as_deref(), Some("company"));
        assert_eq!(dataset.relations[0].target_id.as_str(), "2");
        assert_eq!(dataset.relations[0].relation_type, "produces");
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let dataset = Dataset::from_json("{}").unwrap();
        assert!(dataset.entities.is_empty());
        assert!(dataset.relations.is_empty());
    }

    #[test]
    fn rejects_relation_without_type() {
        let raw = r#"{"relations": [{"sourceId": "a", "targetId": "b"}]}"#;
        assert!(matches!(
            Dataset::from_json(raw),
            Err(DatasetError::Json(_))
        ));
    }

    #[test]
    fn reports_missing_file() {
        let error = Dataset::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(error, DatasetError::Io { .. }));
    }
}
