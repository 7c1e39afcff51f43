//! [`ActorEntity`] implementation for [`Document`], the unit stored by every remote collection.
//!
//! A document is a key plus a JSON field map. Updates are merge patches: each patched field
//! replaces the stored one, untouched fields stay as they are. Typed records are encoded into
//! field maps on the way in and decoded on the way out, so a collection never depends on the
//! shape of what it stores.

use super::error::DocumentError;
use async_trait::async_trait;
use collection_actor::ActorEntity;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// Field-level merge patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch(pub Fields);

impl FieldPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }
}

impl Document {
    /// Decodes the fields into a typed record.
    pub fn decode<R: DeserializeOwned>(&self) -> Result<R, DocumentError> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| {
            DocumentError::Malformed {
                id: self.id.clone(),
                reason: e.to_string(),
            }
        })
    }
}

/// Encodes a typed record into the field map a collection stores.
pub fn to_fields<R: Serialize>(record: &R) -> Result<Fields, DocumentError> {
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(DocumentError::NotAnObject),
    }
}

#[async_trait]
impl ActorEntity for Document {
    type Id = String;
    type Create = Fields;
    type Update = FieldPatch;
    type Context = ();
    type Error = DocumentError;

    fn from_create_params(id: String, fields: Fields) -> Result<Self, Self::Error> {
        Ok(Self { id, fields })
    }

    async fn on_update(&mut self, patch: FieldPatch, _ctx: &()) -> Result<(), Self::Error> {
        self.fields.extend(patch.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Note {
        body: String,
        pinned_by: Option<String>,
    }

    #[tokio::test]
    async fn test_patch_merges_fields() {
        let fields = to_fields(&Note {
            body: "hello".into(),
            pinned_by: None,
        })
        .unwrap();
        let mut doc = Document::from_create_params("n1".into(), fields).unwrap();

        doc.on_update(FieldPatch::new().set("pinnedBy", "ann"), &())
            .await
            .unwrap();

        let note: Note = doc.decode().unwrap();
        assert_eq!(note.body, "hello");
        assert_eq!(note.pinned_by.as_deref(), Some("ann"));
    }

    #[test]
    fn test_decode_reports_malformed_documents() {
        let mut fields = Fields::new();
        fields.insert("body".into(), json!(42));
        let doc = Document {
            id: "n2".into(),
            fields,
        };

        let err = doc.decode::<Note>().unwrap_err();
        assert!(matches!(err, DocumentError::Malformed { id, .. } if id == "n2"));
    }

    #[test]
    fn test_non_object_records_are_rejected() {
        assert!(matches!(to_fields(&7), Err(DocumentError::NotAnObject)));
    }
}
