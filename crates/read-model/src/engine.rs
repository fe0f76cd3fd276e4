//! Pipeline execution over a document store.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use document_store::{Collection, Document, DocumentStore, Filter, ID_FIELD};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::join::{Cardinality, Lookup};
use crate::pagination::Page;
use crate::pipeline::{Pipeline, Stage};
use crate::projection::{Redaction, collect_document_path};
use crate::{QueryError, Result};

/// Executes [`Pipeline`]s against a [`DocumentStore`].
///
/// Each lookup stage issues one batched `find` for all input documents, so
/// the number of store round trips depends on the pipeline shape, not on
/// the size of the data.
#[derive(Clone)]
pub struct QueryEngine<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> QueryEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs a pipeline and returns every output document.
    #[tracing::instrument(skip(self, pipeline), fields(source = %pipeline.source))]
    pub async fn run(&self, pipeline: &Pipeline) -> Result<Vec<Document>> {
        if pipeline.paginate_count() > 0 {
            return Err(QueryError::InvalidPipeline(
                "paginate stage requires run_paged".to_string(),
            ));
        }

        let started = Instant::now();
        let docs = self.load_source(pipeline).await?;
        let docs = self.apply_stages(docs, &pipeline.stages, false).await?;
        record_query(pipeline.source, "run", started);
        Ok(docs)
    }

    /// Runs a pipeline and returns its first output document, if any.
    pub async fn run_one(&self, pipeline: &Pipeline) -> Result<Option<Document>> {
        Ok(self.run(pipeline).await?.into_iter().next())
    }

    /// Runs a pipeline containing exactly one `Paginate` stage.
    ///
    /// Stages before it run over the full set; `totalCount` is the number of
    /// documents reaching it. Stages after it run over the page window only.
    #[tracing::instrument(skip(self, pipeline), fields(source = %pipeline.source))]
    pub async fn run_paged(&self, pipeline: &Pipeline) -> Result<Page<Document>> {
        if pipeline.paginate_count() != 1 {
            return Err(QueryError::InvalidPipeline(
                "run_paged requires exactly one paginate stage".to_string(),
            ));
        }
        let Some(at) = pipeline
            .stages
            .iter()
            .position(|s| matches!(s, Stage::Paginate(..)))
        else {
            return Err(QueryError::InvalidPipeline(
                "run_paged requires exactly one paginate stage".to_string(),
            ));
        };
        let Stage::Paginate(sort, request) = &pipeline.stages[at] else {
            return Err(QueryError::InvalidPipeline("paginate stage expected".to_string()));
        };

        let started = Instant::now();
        let docs = self.load_source(pipeline).await?;
        let mut docs = self.apply_stages(docs, &pipeline.stages[..at], false).await?;
        sort.sort(&mut docs);

        let page = Page::from_sorted(docs, *request);
        let items = self
            .apply_stages(page.items, &pipeline.stages[at + 1..], false)
            .await?;
        record_query(pipeline.source, "run_paged", started);

        tracing::debug!(
            total_count = page.total_count,
            page = page.page,
            returned = items.len(),
            "page assembled"
        );
        Ok(Page { items, ..page })
    }

    /// Runs a pipeline ending in a global group and returns its single row.
    ///
    /// Over an empty input the row still exists with every accumulator at 0.
    #[tracing::instrument(skip(self, pipeline), fields(source = %pipeline.source))]
    pub async fn rollup(&self, pipeline: &Pipeline) -> Result<Document> {
        match pipeline.stages.last() {
            Some(Stage::Group(group)) if group.key.is_none() => {}
            _ => {
                return Err(QueryError::InvalidPipeline(
                    "rollup requires a final global group stage".to_string(),
                ));
            }
        }
        self.run(pipeline).await?.into_iter().next().ok_or_else(|| {
            QueryError::InvalidPipeline("global group produced no row".to_string())
        })
    }

    async fn load_source(&self, pipeline: &Pipeline) -> Result<Vec<Document>> {
        self.load(pipeline.source, &pipeline.filter, pipeline.redaction)
            .await
    }

    async fn load(
        &self,
        collection: Collection,
        filter: &Filter,
        redaction: Redaction,
    ) -> Result<Vec<Document>> {
        let mut docs = self.store.find(collection, filter).await?;
        if collection == Collection::Users {
            for doc in &mut docs {
                redaction.apply(doc);
            }
        }
        Ok(docs)
    }

    fn apply_stages<'a>(
        &'a self,
        mut docs: Vec<Document>,
        stages: &'a [Stage],
        nested: bool,
    ) -> BoxFuture<'a, Result<Vec<Document>>> {
        async move {
            for stage in stages {
                docs = match stage {
                    Stage::Match(filter) => {
                        docs.retain(|d| filter.matches(d));
                        docs
                    }
                    Stage::Lookup(lookup) => self.lookup(docs, lookup).await?,
                    Stage::Unwind(path) => unwind(docs, path),
                    Stage::AddFields(fields) => docs
                        .into_iter()
                        .map(|mut doc| {
                            let input = doc.clone();
                            for spec in fields {
                                spec.write(&input, &mut doc);
                            }
                            doc
                        })
                        .collect(),
                    Stage::Project(projection) => {
                        docs.iter().map(|d| projection.apply(d)).collect()
                    }
                    Stage::Sort(sort) => {
                        sort.sort(&mut docs);
                        docs
                    }
                    Stage::Skip(n) => docs.into_iter().skip(*n as usize).collect(),
                    Stage::Limit(n) => docs.into_iter().take(*n as usize).collect(),
                    Stage::Group(group) => {
                        if nested {
                            return Err(QueryError::InvalidPipeline(
                                "group is not allowed inside a lookup".to_string(),
                            ));
                        }
                        group.apply(&docs)
                    }
                    Stage::Paginate(..) => {
                        return Err(QueryError::InvalidPipeline(
                            "paginate is only allowed once at the top level".to_string(),
                        ));
                    }
                };
            }
            Ok(docs)
        }
        .boxed()
    }

    async fn lookup(&self, mut docs: Vec<Document>, lookup: &Lookup) -> Result<Vec<Document>> {
        let mut keys = Vec::new();
        let mut seen = HashSet::new();
        for doc in &docs {
            for value in collect_document_path(doc, &lookup.local_field) {
                if !value.is_null() && seen.insert(value.to_string()) {
                    keys.push(value);
                }
            }
        }

        let targets = if keys.is_empty() {
            Vec::new()
        } else {
            let filter = Filter::new().any_of(lookup.foreign_field.as_str(), keys);
            self.load(lookup.from, &filter, Redaction::Public).await?
        };

        // Foreign key value -> ids of the targets carrying it, in store order.
        let mut by_key: HashMap<String, Vec<String>> = HashMap::new();
        for target in &targets {
            let Some(id) = target.get_str(ID_FIELD) else {
                continue;
            };
            for value in collect_document_path(target, &lookup.foreign_field) {
                by_key.entry(value.to_string()).or_default().push(id.to_string());
            }
        }

        let outputs = self.apply_stages(targets, &lookup.pipeline, true).await?;
        let mut outputs_by_id: HashMap<&str, Vec<&Document>> = HashMap::new();
        for output in &outputs {
            if let Some(id) = output.get_str(ID_FIELD) {
                outputs_by_id.entry(id).or_default().push(output);
            }
        }

        for doc in &mut docs {
            let local_is_array = matches!(doc.get(&lookup.local_field), Some(Value::Array(_)));

            let mut ids: Vec<&str> = Vec::new();
            let mut id_set: HashSet<&str> = HashSet::new();
            for value in collect_document_path(doc, &lookup.local_field) {
                for id in by_key.get(&value.to_string()).into_iter().flatten() {
                    if id_set.insert(id.as_str()) {
                        ids.push(id.as_str());
                    }
                }
            }

            let matched: Vec<&Document> = if local_is_array {
                ids.iter()
                    .filter_map(|id| outputs_by_id.get(id))
                    .flatten()
                    .copied()
                    .collect()
            } else {
                outputs
                    .iter()
                    .filter(|o| o.get_str(ID_FIELD).is_some_and(|id| id_set.contains(id)))
                    .collect()
            };

            let attached = match lookup.cardinality {
                Cardinality::One => matched
                    .first()
                    .map_or(Value::Null, |d| (*d).clone().into_value()),
                Cardinality::Many => Value::Array(
                    matched.into_iter().map(|d| d.clone().into_value()).collect(),
                ),
            };
            doc.set(&lookup.as_field, attached);
        }

        Ok(docs)
    }
}

fn unwind(docs: Vec<Document>, path: &str) -> Vec<Document> {
    let mut out = Vec::with_capacity(docs.len());
    for doc in docs {
        match doc.get(path) {
            Some(Value::Array(items)) => {
                for item in items.clone() {
                    let mut copy = doc.clone();
                    copy.set(path, item);
                    out.push(copy);
                }
            }
            Some(Value::Null) | None => {}
            Some(_) => out.push(doc),
        }
    }
    out
}

fn record_query(source: Collection, kind: &'static str, started: Instant) {
    metrics::counter!("read_model_queries_total", "source" => source.as_str(), "kind" => kind)
        .increment(1);
    metrics::histogram!("read_model_query_duration_seconds", "kind" => kind)
        .record(started.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use document_store::InMemoryDocumentStore;
    use serde_json::json;

    use super::*;
    use crate::aggregation::Group;
    use crate::pagination::{PageRequest, SortSpec};
    use crate::projection::{FieldSpec, Projection};

    async fn insert(store: &InMemoryDocumentStore, collection: Collection, value: Value) -> String {
        let doc = store
            .insert(collection, Document::from_value(value).unwrap())
            .await
            .unwrap();
        doc.get_str(ID_FIELD).unwrap().to_string()
    }

    fn fresh_id() -> String {
        document_store::DocumentId::new().to_string()
    }

    #[tokio::test]
    async fn lookup_one_attaches_redacted_owner() {
        let store = InMemoryDocumentStore::new();
        let owner = insert(
            &store,
            Collection::Users,
            json!({
                "username": "alice",
                "email": "a@example.com",
                "password": "h",
                "refreshToken": "r",
            }),
        )
        .await;
        insert(&store, Collection::Videos, json!({"title": "t", "owner": owner})).await;

        let engine = QueryEngine::new(store);
        let docs = engine
            .run(&Pipeline::new(Collection::Videos).lookup(Lookup::reference(
                Collection::Users,
                "owner",
                "ownerDetails",
            )))
            .await
            .unwrap();

        let details = docs[0].get("ownerDetails").unwrap();
        assert_eq!(details["username"], json!("alice"));
        assert!(details.get("password").is_none());
        assert!(details.get("refreshToken").is_none());
        assert!(details.get("email").is_none());
    }

    #[tokio::test]
    async fn lookup_one_without_match_is_null() {
        let store = InMemoryDocumentStore::new();
        insert(
            &store,
            Collection::Videos,
            json!({"title": "orphan", "owner": fresh_id()}),
        )
        .await;

        let engine = QueryEngine::new(store);
        let docs = engine
            .run(&Pipeline::new(Collection::Videos).lookup(Lookup::reference(
                Collection::Users,
                "owner",
                "ownerDetails",
            )))
            .await
            .unwrap();
        assert_eq!(docs[0].get("ownerDetails"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn lookup_many_follows_local_array_order() {
        let store = InMemoryDocumentStore::new();
        let a = insert(&store, Collection::Videos, json!({"title": "a"})).await;
        let b = insert(&store, Collection::Videos, json!({"title": "b"})).await;
        let c = insert(&store, Collection::Videos, json!({"title": "c"})).await;
        let dangling = fresh_id();
        insert(
            &store,
            Collection::Users,
            json!({"username": "u", "watchHistory": [c, dangling, a, b]}),
        )
        .await;

        let engine = QueryEngine::new(store);
        let user = engine
            .run_one(&Pipeline::new(Collection::Users).lookup(Lookup::many(
                Collection::Videos,
                "watchHistory",
                ID_FIELD,
                "watchHistory",
            )))
            .await
            .unwrap()
            .unwrap();

        let titles: Vec<_> = user
            .get("watchHistory")
            .and_then(Value::as_array)
            .unwrap()
            .iter()
            .map(|v| v["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn nested_lookup_runs_inside_the_join() {
        let store = InMemoryDocumentStore::new();
        let bob = json!({"username": "bob", "fullName": "Bob"});
        let owner = insert(&store, Collection::Users, bob).await;
        let video = insert(&store, Collection::Videos, json!({"title": "v", "owner": owner})).await;
        insert(&store, Collection::Playlists, json!({"name": "p", "videos": [video]})).await;

        let engine = QueryEngine::new(store);
        let playlist = engine
            .run_one(
                &Pipeline::new(Collection::Playlists).lookup(
                    Lookup::many(Collection::Videos, "videos", ID_FIELD, "videos").with_stage(
                        Stage::Lookup(
                            Lookup::reference(Collection::Users, "owner", "owner").with_stage(
                                Stage::Project(Projection::including(["username", "fullName"])),
                            ),
                        ),
                    ),
                ),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            playlist.get("videos").unwrap()[0]["owner"]["username"],
            json!("bob")
        );
    }

    #[tokio::test]
    async fn group_inside_lookup_is_rejected() {
        let store = InMemoryDocumentStore::new();
        insert(&store, Collection::Videos, json!({"title": "v", "owner": "x"})).await;
        let engine = QueryEngine::new(store);

        let result = engine
            .run(&Pipeline::new(Collection::Videos).lookup(
                Lookup::reference(Collection::Users, "owner", "owner")
                    .with_stage(Stage::Group(Group::global().count("n"))),
            ))
            .await;
        assert!(matches!(result, Err(QueryError::InvalidPipeline(_))));
    }

    #[tokio::test]
    async fn run_paged_counts_at_the_paginate_stage() {
        let store = InMemoryDocumentStore::new();
        for i in 0..7 {
            insert(
                &store,
                Collection::Videos,
                json!({"title": format!("v{i}"), "views": i, "isPublished": i % 2 == 0}),
            )
            .await;
        }
        let engine = QueryEngine::new(store);

        let page = engine
            .run_paged(
                &Pipeline::new(Collection::Videos)
                    .matching(Filter::new().eq("isPublished", true))
                    .paginate(SortSpec::descending("views"), PageRequest::new(1, 3).unwrap())
                    .add_fields(vec![FieldSpec::literal("seen", true)]),
            )
            .await
            .unwrap();

        assert_eq!(page.total_count, 4);
        assert_eq!(page.total_pages, 2);
        let views: Vec<_> = page.items.iter().filter_map(|d| d.get_i64("views")).collect();
        assert_eq!(views, vec![6, 4, 2]);
        assert!(page.items.iter().all(|d| d.get("seen") == Some(&json!(true))));
    }

    #[tokio::test]
    async fn run_rejects_paginate_and_run_paged_requires_it() {
        let engine = QueryEngine::new(InMemoryDocumentStore::new());
        let paged = Pipeline::new(Collection::Videos)
            .paginate(SortSpec::newest_first(), PageRequest::default());
        assert!(matches!(
            engine.run(&paged).await,
            Err(QueryError::InvalidPipeline(_))
        ));
        assert!(matches!(
            engine.run_paged(&Pipeline::new(Collection::Videos)).await,
            Err(QueryError::InvalidPipeline(_))
        ));
    }

    #[tokio::test]
    async fn rollup_over_nothing_is_zero() {
        let engine = QueryEngine::new(InMemoryDocumentStore::new());
        let row = engine
            .rollup(
                &Pipeline::new(Collection::Videos)
                    .group(Group::global().sum("totalViews", "views").count("totalVideos")),
            )
            .await
            .unwrap();
        assert_eq!(row.get_i64("totalViews"), Some(0));
        assert_eq!(row.get_i64("totalVideos"), Some(0));
    }

    #[tokio::test]
    async fn unwind_emits_one_document_per_element() {
        let store = InMemoryDocumentStore::new();
        insert(&store, Collection::Playlists, json!({"name": "p", "videos": ["a", "b"]})).await;
        insert(&store, Collection::Playlists, json!({"name": "empty", "videos": []})).await;

        let engine = QueryEngine::new(store);
        let docs = engine
            .run(&Pipeline::new(Collection::Playlists).unwind("videos"))
            .await
            .unwrap();
        let videos: Vec<_> = docs.iter().filter_map(|d| d.get_str("videos")).collect();
        assert_eq!(videos, vec!["a", "b"]);
    }
}
