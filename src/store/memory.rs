//! In-process document backend.
//!
//! Commits stage every write on a copy of the collection and swap it in only
//! when all writes succeeded, all under one write lock.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{
    DocumentBackend, Fields, FieldValue, Precondition, ServerValue, StoreError, StoredDocument,
    Write,
};

#[derive(Debug, Default)]
pub struct MemoryBackend {
    documents: RwLock<BTreeMap<String, Fields>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check(
    documents: &BTreeMap<String, Fields>,
    id: &str,
    precondition: Option<Precondition>,
) -> Result<(), StoreError> {
    match (precondition, documents.contains_key(id)) {
        (Some(Precondition::Exists), false) => Err(StoreError::NotFound(id.to_string())),
        (Some(Precondition::Missing), true) => Err(StoreError::AlreadyExists(id.to_string())),
        _ => Ok(()),
    }
}

fn apply(
    documents: &mut BTreeMap<String, Fields>,
    write: Write,
    request_time: chrono::DateTime<Utc>,
) -> Result<(), StoreError> {
    match write {
        Write::Update {
            id,
            fields,
            mask,
            precondition,
        } => {
            check(documents, &id, precondition)?;
            match mask {
                None => {
                    documents.insert(id, fields);
                }
                Some(paths) => {
                    let document = documents.entry(id).or_default();
                    for path in paths {
                        match fields.get(&path) {
                            Some(value) => {
                                document.insert(path, value.clone());
                            }
                            None => {
                                document.remove(&path);
                            }
                        }
                    }
                }
            }
        }
        Write::Transform { id, transforms } => {
            let document = documents.entry(id).or_default();
            for transform in transforms {
                let value = match transform.value {
                    ServerValue::RequestTime => FieldValue::Timestamp(request_time),
                };
                document.insert(transform.field_path, value);
            }
        }
        Write::Delete { id, precondition } => {
            check(documents, &id, precondition)?;
            documents.remove(&id);
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
    async fn commit(&self, writes: Vec<Write>, _credential: Option<&str>) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let mut staged = documents.clone();
        let request_time = Utc::now();
        for write in writes {
            apply(&mut staged, write, request_time)?;
        }
        *documents = staged;
        Ok(())
    }

    async fn get(
        &self,
        id: &str,
        _credential: Option<&str>,
    ) -> Result<Option<StoredDocument>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.get(id).map(|fields| StoredDocument {
            id: id.to_string(),
            fields: fields.clone(),
        }))
    }

    async fn list(&self) -> Result<Vec<StoredDocument>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .map(|(id, fields)| StoredDocument {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FieldTransform;

    fn set(id: &str, key: &str, value: &str, precondition: Option<Precondition>) -> Write {
        Write::Update {
            id: id.into(),
            fields: Fields::from([(key.to_string(), FieldValue::String(value.into()))]),
            mask: None,
            precondition,
        }
    }

    #[tokio::test]
    async fn failed_write_rolls_back_whole_commit() {
        let backend = MemoryBackend::new();
        backend
            .commit(vec![set("a", "title", "A", None)], None)
            .await
            .unwrap();

        // Second write violates its precondition; the first must not survive.
        let err = backend
            .commit(
                vec![
                    set("b", "title", "B", Some(Precondition::Missing)),
                    set("a", "title", "A2", Some(Precondition::Missing)),
                ],
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(id) if id == "a"));
        assert!(backend.get("b", None).await.unwrap().is_none());
        assert_eq!(backend.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn masked_update_preserves_other_fields() {
        let backend = MemoryBackend::new();
        backend
            .commit(
                vec![Write::Update {
                    id: "a".into(),
                    fields: Fields::from([
                        ("title".to_string(), FieldValue::String("A".into())),
                        ("label".to_string(), FieldValue::String("a".into())),
                    ]),
                    mask: None,
                    precondition: None,
                }],
                None,
            )
            .await
            .unwrap();

        backend
            .commit(
                vec![Write::Update {
                    id: "a".into(),
                    fields: Fields::from([("title".to_string(), FieldValue::String("B".into()))]),
                    mask: Some(vec!["title".into()]),
                    precondition: Some(Precondition::Exists),
                }],
                None,
            )
            .await
            .unwrap();

        let doc = backend.get("a", None).await.unwrap().unwrap();
        assert_eq!(doc.fields["title"], FieldValue::String("B".into()));
        assert_eq!(doc.fields["label"], FieldValue::String("a".into()));
    }

    #[tokio::test]
    async fn transforms_share_one_request_time() {
        let backend = MemoryBackend::new();
        backend
            .commit(
                vec![Write::Transform {
                    id: "a".into(),
                    transforms: vec![
                        FieldTransform::request_time("createdAt"),
                        FieldTransform::request_time("updatedAt"),
                    ],
                }],
                None,
            )
            .await
            .unwrap();
        let doc = backend.get("a", None).await.unwrap().unwrap();
        assert!(matches!(doc.fields["createdAt"], FieldValue::Timestamp(_)));
        assert_eq!(doc.fields["createdAt"], doc.fields["updatedAt"]);
    }
}
