//! SQLite-backed JSON document store.
//!
//! # Responsibility
//! - Persist admin-authored documents per collection as JSON bodies.
//! - Serve whole-collection snapshots in stable insertion order.
//!
//! # Invariants
//! - `(collection, doc_id)` is unique; re-putting a document keeps its position.
//! - Snapshot order is `position ASC, doc_id ASC`.
//! - Unparseable stored bodies surface as `null` entries, not as fetch errors.
//! - Fetched documents always carry their stored `doc_id` as `"id"`.

use crate::snapshot::{normalize_collection_name, FetchError, FetchResult, SnapshotFetcher};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::time::Instant;
use uuid::Uuid;

/// Summary of one bulk import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub written: usize,
    /// Entries that were not JSON objects.
    pub skipped: usize,
}

/// Document store on top of a migrated connection.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Inserts or replaces one document and returns its id.
    ///
    /// Id resolution: explicit `doc_id`, then the body's `id` field, then a
    /// generated UUID v4.
    pub fn put_document(
        &self,
        collection: &str,
        doc_id: Option<&str>,
        body: &Value,
    ) -> FetchResult<String> {
        let collection = normalize_collection_name(collection)?;
        let object = body.as_object().ok_or_else(|| {
            FetchError::InvalidDocument(format!("expected JSON object, got {}", kind_of(body)))
        })?;

        let doc_id = resolve_doc_id(doc_id, object);
        let serialized = serde_json::to_string(body)
            .map_err(|err| FetchError::InvalidDocument(err.to_string()))?;

        let updated = self.conn.execute(
            "UPDATE documents
             SET body = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE collection = ?1 AND doc_id = ?2;",
            params![collection, doc_id, serialized],
        )?;

        if updated == 0 {
            self.conn.execute(
                "INSERT INTO documents (collection, doc_id, body, position)
                 VALUES (
                    ?1,
                    ?2,
                    ?3,
                    (SELECT COALESCE(MAX(position) + 1, 0) FROM documents WHERE collection = ?1)
                 );",
                params![collection, doc_id, serialized],
            )?;
        }

        Ok(doc_id)
    }

    /// Writes many documents in one transaction; non-object entries are skipped.
    pub fn import_documents(
        &self,
        collection: &str,
        documents: &[Value],
    ) -> FetchResult<ImportReport> {
        normalize_collection_name(collection)?;
        let tx = self.conn.unchecked_transaction()?;
        let mut report = ImportReport::default();

        for document in documents {
            if !document.is_object() {
                report.skipped += 1;
                continue;
            }
            self.put_document(collection, None, document)?;
            report.written += 1;
        }

        tx.commit()?;
        info!(
            "event=documents_import module=snapshot status=ok collection={} written={} skipped={}",
            collection.trim(),
            report.written,
            report.skipped
        );
        Ok(report)
    }

    /// Deletes one document; returns whether it existed.
    pub fn delete_document(&self, collection: &str, doc_id: &str) -> FetchResult<bool> {
        let collection = normalize_collection_name(collection)?;
        let changed = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2;",
            params![collection, doc_id],
        )?;
        Ok(changed > 0)
    }

    /// Returns one stored body, if present.
    pub fn get_document(&self, collection: &str, doc_id: &str) -> FetchResult<Option<Value>> {
        let collection = normalize_collection_name(collection)?;
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2;",
                params![collection, doc_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(body.map(|raw| parse_body(collection, doc_id, &raw)))
    }

    /// Number of documents in one collection.
    pub fn count(&self, collection: &str) -> FetchResult<u64> {
        let collection = normalize_collection_name(collection)?;
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1;",
            [collection],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Distinct collection names, sorted.
    pub fn collections(&self) -> FetchResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT collection FROM documents ORDER BY collection ASC;")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

impl SnapshotFetcher for SqliteDocumentStore<'_> {
    fn fetch_collection(&self, collection: &str) -> FetchResult<Vec<Value>> {
        let started_at = Instant::now();
        let collection = normalize_collection_name(collection)?;

        let mut stmt = self.conn.prepare(
            "SELECT doc_id, body
             FROM documents
             WHERE collection = ?1
             ORDER BY position ASC, doc_id ASC;",
        )?;
        let mut rows = stmt.query([collection])?;
        let mut documents = Vec::new();

        while let Some(row) = rows.next()? {
            let doc_id: String = row.get(0)?;
            let raw: String = row.get(1)?;
            let mut value = parse_body(collection, &doc_id, &raw);
            if let Value::Object(object) = &mut value {
                object.insert("id".to_string(), Value::String(doc_id));
            }
            documents.push(value);
        }

        info!(
            "event=snapshot_fetch module=snapshot status=ok collection={} count={} duration_ms={}",
            collection,
            documents.len(),
            started_at.elapsed().as_millis()
        );
        Ok(documents)
    }
}

fn resolve_doc_id(explicit: Option<&str>, object: &Map<String, Value>) -> String {
    explicit
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| match object.get("id") {
            Some(Value::String(value)) if !value.trim().is_empty() => {
                Some(value.trim().to_string())
            }
            Some(Value::Number(value)) => Some(value.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn parse_body(collection: &str, doc_id: &str, raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|err| {
        warn!(
            "event=document_decode module=snapshot status=error collection={} doc_id={} error={}",
            collection, doc_id, err
        );
        Value::Null
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteDocumentStore;
    use crate::db::open_db_in_memory;
    use crate::snapshot::{FetchError, SnapshotFetcher};
    use serde_json::json;

    #[test]
    fn put_and_fetch_preserves_insertion_order() {
        let conn = open_db_in_memory().expect("open in-memory store");
        let store = SqliteDocumentStore::new(&conn);
        store
            .put_document("projects", Some("zeta"), &json!({"title": "Z"}))
            .expect("put zeta");
        store
            .put_document("projects", Some("alpha"), &json!({"title": "A"}))
            .expect("put alpha");

        let docs = store.fetch_collection("projects").expect("fetch");
        let ids: Vec<_> = docs.iter().map(|doc| doc["id"].clone()).collect();
        assert_eq!(ids, vec![json!("zeta"), json!("alpha")]);
    }

    #[test]
    fn reput_updates_body_but_keeps_position() {
        let conn = open_db_in_memory().expect("open in-memory store");
        let store = SqliteDocumentStore::new(&conn);
        store
            .put_document("projects", Some("p1"), &json!({"title": "First"}))
            .expect("put p1");
        store
            .put_document("projects", Some("p2"), &json!({"title": "Second"}))
            .expect("put p2");
        store
            .put_document("projects", Some("p1"), &json!({"title": "Edited"}))
            .expect("re-put p1");

        let docs = store.fetch_collection("projects").expect("fetch");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["title"], json!("Edited"));
        assert_eq!(store.count("projects").expect("count"), 2);
    }

    #[test]
    fn body_id_wins_over_generated_id() {
        let conn = open_db_in_memory().expect("open in-memory store");
        let store = SqliteDocumentStore::new(&conn);
        let id = store
            .put_document("certificates", None, &json!({"id": "aws-saa"}))
            .expect("put");
        assert_eq!(id, "aws-saa");

        let generated = store
            .put_document("certificates", None, &json!({"title": "No id"}))
            .expect("put");
        assert_eq!(generated.len(), 36);
    }

    #[test]
    fn stored_doc_id_overrides_body_id_on_fetch() {
        let conn = open_db_in_memory().expect("open in-memory store");
        let store = SqliteDocumentStore::new(&conn);
        store
            .put_document("projects", Some("p1"), &json!({"title": "A"}))
            .expect("put p1");
        store
            .put_document("projects", Some("p2"), &json!({"id": "p1", "title": "B"}))
            .expect("put p2");

        let docs = store.fetch_collection("projects").expect("fetch");
        let ids: Vec<_> = docs.iter().map(|doc| doc["id"].clone()).collect();
        assert_eq!(ids, vec![json!("p1"), json!("p2")]);
        assert_eq!(docs[1]["title"], json!("B"));
    }

    #[test]
    fn rejects_non_object_documents() {
        let conn = open_db_in_memory().expect("open in-memory store");
        let store = SqliteDocumentStore::new(&conn);
        let err = store
            .put_document("projects", None, &json!(["not", "object"]))
            .expect_err("arrays are rejected");
        assert!(matches!(err, FetchError::InvalidDocument(_)));
    }

    #[test]
    fn corrupt_body_surfaces_as_null() {
        let conn = open_db_in_memory().expect("open in-memory store");
        conn.execute(
            "INSERT INTO documents (collection, doc_id, body, position)
             VALUES ('projects', 'broken', '{oops', 0);",
            [],
        )
        .expect("seed corrupt row");

        let store = SqliteDocumentStore::new(&conn);
        let docs = store.fetch_collection("projects").expect("fetch");
        assert_eq!(docs, vec![serde_json::Value::Null]);
    }

    #[test]
    fn delete_and_collections() {
        let conn = open_db_in_memory().expect("open in-memory store");
        let store = SqliteDocumentStore::new(&conn);
        store
            .put_document("projects", Some("p1"), &json!({}))
            .expect("put");
        store
            .put_document("certificates", Some("c1"), &json!({}))
            .expect("put");

        assert_eq!(
            store.collections().expect("collections"),
            vec!["certificates".to_string(), "projects".to_string()]
        );
        assert!(store.delete_document("projects", "p1").expect("delete"));
        assert!(!store.delete_document("projects", "p1").expect("delete again"));
        assert!(store.get_document("projects", "p1").expect("get").is_none());
    }
}
