//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p document-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use document_store::{
    Collection, Document, DocumentId, DocumentStore, DocumentStoreExt, Filter,
    PostgresDocumentStore, StoreError, Update,
};
use serde_json::json;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_documents_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and a cleared table
async fn get_test_store() -> PostgresDocumentStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE documents")
        .execute(&pool)
        .await
        .unwrap();

    PostgresDocumentStore::new(pool)
}

fn doc(value: serde_json::Value) -> Document {
    Document::from_value(value).unwrap()
}

#[tokio::test]
async fn insert_and_find_by_id() {
    let store = get_test_store().await;

    let inserted = store
        .insert(
            Collection::Tweets,
            doc(json!({"content": "first tweet", "owner": DocumentId::new()})),
        )
        .await
        .unwrap();
    let id = inserted.id().unwrap();

    let found = store
        .find_by_id(Collection::Tweets, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.get_str("content"), Some("first tweet"));
    assert!(found.created_at().is_some());

    let other_collection = store.find_by_id(Collection::Videos, id).await.unwrap();
    assert!(other_collection.is_none());
}

#[tokio::test]
async fn unique_username_is_enforced_by_database() {
    let store = get_test_store().await;

    store
        .insert(
            Collection::Users,
            doc(json!({"username": "alice", "email": "a@example.com"})),
        )
        .await
        .unwrap();

    let result = store
        .insert(
            Collection::Users,
            doc(json!({"username": "alice", "email": "other@example.com"})),
        )
        .await;

    assert!(matches!(
        result,
        Err(StoreError::DuplicateKey {
            index: "users_username_unique",
            ..
        })
    ));
}

#[tokio::test]
async fn concurrent_like_inserts_create_one_row() {
    let store = get_test_store().await;
    let like = json!({"likedBy": "u1", "target": {"kind": "video", "id": "v1"}});

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        let like = like.clone();
        handles.push(tokio::spawn(async move {
            store.insert(Collection::Likes, doc(like)).await
        }));
    }

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            created += 1;
        }
    }
    assert_eq!(created, 1);

    let count = store.count(Collection::Likes, &Filter::new()).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn find_supports_array_membership_and_text_search() {
    let store = get_test_store().await;

    store
        .insert(
            Collection::Playlists,
            doc(json!({"name": "Rust basics", "videos": ["v1", "v2"]})),
        )
        .await
        .unwrap();
    store
        .insert(
            Collection::Playlists,
            doc(json!({"name": "Cooking", "videos": ["v3"]})),
        )
        .await
        .unwrap();

    let with_v2 = store
        .find(Collection::Playlists, &Filter::new().eq("videos", "v2"))
        .await
        .unwrap();
    assert_eq!(with_v2.len(), 1);
    assert_eq!(with_v2[0].get_str("name"), Some("Rust basics"));

    let search = store
        .find(
            Collection::Playlists,
            &Filter::new().text_search(["name"], "cook"),
        )
        .await
        .unwrap();
    assert_eq!(search.len(), 1);

    let any = store
        .find(
            Collection::Playlists,
            &Filter::new().any_of("videos", vec![json!("v1"), json!("v3")]),
        )
        .await
        .unwrap();
    assert_eq!(any.len(), 2);
}

#[tokio::test]
async fn replace_and_delete_one() {
    let store = get_test_store().await;

    let mut video = store
        .insert(Collection::Videos, doc(json!({"title": "draft"})))
        .await
        .unwrap();
    video.set("title", json!("final"));
    store.replace(Collection::Videos, video.clone()).await.unwrap();

    let found = store
        .find_one(Collection::Videos, &Filter::new().eq("title", "final"))
        .await
        .unwrap();
    assert!(found.is_some());

    let removed = store
        .delete_one(Collection::Videos, &Filter::new().eq("title", "final"))
        .await
        .unwrap();
    assert_eq!(removed.and_then(|d| d.id()), video.id());
    assert!(!store
        .exists(Collection::Videos, video.id().unwrap())
        .await
        .unwrap());
}

#[tokio::test]
async fn increment_is_atomic_under_concurrency() {
    let store = get_test_store().await;
    let video = store
        .insert(Collection::Videos, doc(json!({"title": "t", "views": 0})))
        .await
        .unwrap();
    let id = video.id().unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.increment(Collection::Videos, id, "views", 1).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let found = store
        .find_by_id(Collection::Videos, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.get_i64("views"), Some(10));
}

#[tokio::test]
async fn replace_missing_document_is_not_found() {
    let store = get_test_store().await;
    let mut ghost = doc(json!({"title": "ghost"}));
    ghost.stamp_new(chrono::Utc::now());

    let result = store.replace(Collection::Videos, ghost).await;
    assert!(matches!(result, Err(StoreError::NotFound { .. })));
}

#[tokio::test]
async fn scalar_equality_matches_array_members() {
    let store = get_test_store().await;
    let tag = format!("tag-{}", DocumentId::new());
    store
        .insert(
            Collection::Videos,
            doc(json!({"title": "tagged", "tags": ["other", tag.clone()]})),
        )
        .await
        .unwrap();

    let found = store
        .count(Collection::Videos, &Filter::new().eq("tags", tag.clone()))
        .await
        .unwrap();
    assert_eq!(found, 1);
}

#[tokio::test]
async fn concurrent_field_updates_do_not_overwrite_each_other() {
    let store = get_test_store().await;
    let user = store
        .insert(
            Collection::Users,
            doc(json!({
                "username": format!("u{}", DocumentId::new().as_uuid().simple()),
                "email": format!("{}@example.com", DocumentId::new()),
                "watchHistory": ["v0"],
            })),
        )
        .await
        .unwrap();
    let id = user.id().unwrap();

    let mut handles = Vec::new();
    for i in 0..5 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .update_by_id(
                    Collection::Users,
                    id,
                    &Update::new().push_front("watchHistory", format!("v{i}")),
                )
                .await
        }));
    }
    let login = store
        .update_by_id(Collection::Users, id, &Update::new().set("refreshToken", "r1"))
        .await
        .unwrap();
    assert!(login.is_some());
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let found = store.find_by_id(Collection::Users, id).await.unwrap().unwrap();
    assert_eq!(found.get_str("refreshToken"), Some("r1"));
    let history = found.get("watchHistory").and_then(|h| h.as_array()).unwrap();
    assert_eq!(history.len(), 5);
    assert!(history.contains(&json!("v0")));
}

#[tokio::test]
async fn guarded_update_applies_once() {
    let store = get_test_store().await;
    let user = store
        .insert(
            Collection::Users,
            doc(json!({
                "username": format!("u{}", DocumentId::new().as_uuid().simple()),
                "email": format!("{}@example.com", DocumentId::new()),
                "refreshToken": "r1",
            })),
        )
        .await
        .unwrap();
    let guard = Filter::by_id(user.id().unwrap()).eq("refreshToken", "r1");
    let rotate = Update::new().set("refreshToken", "r2");

    let first = store.update_one(Collection::Users, &guard, &rotate).await.unwrap();
    let second = store.update_one(Collection::Users, &guard, &rotate).await.unwrap();

    assert_eq!(first.unwrap().get_str("refreshToken"), Some("r2"));
    assert!(second.is_none());
}
