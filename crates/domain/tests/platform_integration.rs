//! Integration tests for the domain services.
//!
//! These tests run every service over the in-memory document store and blob
//! store, with JWT sessions signed by fixed test secrets.

use std::sync::Arc;

use chrono::Utc;
use document_store::{Collection, DocumentId, InMemoryDocumentStore};
use domain::service::playlists::{CreatePlaylist, UpdatePlaylist};
use domain::service::users::{ChangePassword, LoginRequest, RegisterUser};
use domain::service::videos::{PublishVideo, UpdateVideo};
use domain::{
    DomainError, JwtSessionService, LikeTarget, Repository, Services, SessionService,
    ToggleOutcome, User, Video,
};
use media::{InMemoryBlobStore, LocalFile};
use read_model::{PageRequest, VideoFeedQuery};

struct Fixture {
    store: InMemoryDocumentStore,
    blobs: InMemoryBlobStore,
    sessions: Arc<JwtSessionService>,
    services: Services<InMemoryDocumentStore>,
}

fn fixture() -> Fixture {
    let store = InMemoryDocumentStore::new();
    let blobs = InMemoryBlobStore::new().with_video_duration(93.5);
    let sessions = Arc::new(JwtSessionService::new("test-access", "test-refresh"));
    let services = Services::new(store.clone(), Arc::new(blobs.clone()), sessions.clone());
    Fixture {
        store,
        blobs,
        sessions,
        services,
    }
}

/// Seeds a user directly, skipping password hashing.
async fn seed_user(fx: &Fixture, username: &str) -> DocumentId {
    let now = Utc::now();
    let user = User {
        id: DocumentId::new(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        full_name: format!("{username} full"),
        avatar: format!("memory://blobs/{username}"),
        cover_image: None,
        password: "unused".to_string(),
        refresh_token: None,
        watch_history: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    Repository::new(fx.store.clone())
        .insert(&user)
        .await
        .unwrap()
        .id
}

async fn publish(fx: &Fixture, owner: DocumentId, title: &str) -> Video {
    fx.services
        .videos
        .publish(
            owner,
            PublishVideo {
                title: title.to_string(),
                description: format!("about {title}"),
                video_file: Some(LocalFile::new("/tmp/clip.mp4")),
                thumbnail: Some(LocalFile::new("/tmp/thumb.png")),
            },
        )
        .await
        .unwrap()
}

fn registration(username: &str) -> RegisterUser {
    RegisterUser {
        full_name: "Alice Liddell".to_string(),
        username: username.to_string(),
        email: format!("{}@example.com", username.to_lowercase()),
        password: "correct horse".to_string(),
        avatar: Some(LocalFile::new("/tmp/avatar.png")),
        cover_image: Some(LocalFile::new("/tmp/cover.png")),
    }
}

mod videos {
    use super::*;

    #[tokio::test]
    async fn each_fetch_counts_one_view() {
        let fx = fixture();
        let alice = seed_user(&fx, "alice").await;
        let video = publish(&fx, alice, "first").await;
        assert_eq!(video.views, 0);
        assert_eq!(video.duration, 93.5);

        let first = fx.services.videos.watch(video.id, None).await.unwrap();
        assert_eq!(first.get_i64("views"), Some(1));
        let second = fx.services.videos.watch(video.id, None).await.unwrap();
        assert_eq!(second.get_i64("views"), Some(2));
        assert_eq!(second.get_str("owner.username"), Some("alice"));
    }

    #[tokio::test]
    async fn watching_updates_history_most_recent_first() {
        let fx = fixture();
        let alice = seed_user(&fx, "alice").await;
        let bob = seed_user(&fx, "bob").await;
        let a = publish(&fx, alice, "a").await;
        let b = publish(&fx, alice, "b").await;

        for id in [a.id, b.id, a.id] {
            fx.services.videos.watch(id, Some(bob)).await.unwrap();
        }

        let history = fx.services.users.watch_history(bob).await.unwrap();
        let titles: Vec<_> = history.iter().map(|v| v.get_str("title").unwrap()).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn watching_a_missing_video_is_not_found() {
        let fx = fixture();
        let err = fx.services.videos.watch(DocumentId::new(), None).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(what) if what == "video"));
    }

    #[tokio::test]
    async fn unpublished_videos_leave_the_feed() {
        let fx = fixture();
        let alice = seed_user(&fx, "alice").await;
        let video = publish(&fx, alice, "draft").await;
        publish(&fx, alice, "public").await;

        let toggled = fx.services.videos.toggle_publish(alice, video.id).await.unwrap();
        assert!(!toggled.is_published);

        let feed = fx.services.videos.feed(&VideoFeedQuery::default()).await.unwrap();
        assert_eq!(feed.total_count, 1);
        assert_eq!(feed.items[0].get_str("title"), Some("public"));
    }

    #[tokio::test]
    async fn new_thumbnail_replaces_and_releases_the_old_one() {
        let fx = fixture();
        let alice = seed_user(&fx, "alice").await;
        let video = publish(&fx, alice, "clip").await;
        let old_thumbnail = video.thumbnail.clone();

        let updated = fx
            .services
            .videos
            .update(
                alice,
                video.id,
                UpdateVideo {
                    title: "renamed".to_string(),
                    description: "new words".to_string(),
                    thumbnail: Some(LocalFile::new("/tmp/new.png")),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "renamed");
        assert_ne!(updated.thumbnail, old_thumbnail);
        let old_id = old_thumbnail.rsplit('/').next().unwrap().to_string();
        assert!(!fx.blobs.has_asset(&old_id));
        assert_eq!(fx.blobs.asset_count(), 2);
    }
}

mod interleaving {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use document_store::{Document, DocumentStore, DocumentStoreExt, Filter, Update};

    use super::*;

    /// Lands one queued user write right after the next read of a user, the
    /// way a login can commit while another request is mid-flight.
    #[derive(Clone)]
    struct WriteAfterUserRead {
        inner: InMemoryDocumentStore,
        queued: Arc<Mutex<Option<(DocumentId, Update)>>>,
    }

    impl WriteAfterUserRead {
        fn queue(&self, user: DocumentId, update: Update) {
            *self.queued.lock().unwrap() = Some((user, update));
        }

        async fn land_queued(&self, collection: Collection) {
            if collection != Collection::Users {
                return;
            }
            let queued = self.queued.lock().unwrap().take();
            if let Some((id, update)) = queued {
                self.inner
                    .update_by_id(Collection::Users, id, &update)
                    .await
                    .unwrap();
            }
        }
    }

    #[async_trait]
    impl DocumentStore for WriteAfterUserRead {
        async fn insert(
            &self,
            collection: Collection,
            document: Document,
        ) -> document_store::Result<Document> {
            self.inner.insert(collection, document).await
        }

        async fn find_by_id(
            &self,
            collection: Collection,
            id: DocumentId,
        ) -> document_store::Result<Option<Document>> {
            let found = self.inner.find_by_id(collection, id).await;
            self.land_queued(collection).await;
            found
        }

        async fn find(
            &self,
            collection: Collection,
            filter: &Filter,
        ) -> document_store::Result<Vec<Document>> {
            let found = self.inner.find(collection, filter).await;
            self.land_queued(collection).await;
            found
        }

        async fn count(
            &self,
            collection: Collection,
            filter: &Filter,
        ) -> document_store::Result<u64> {
            self.inner.count(collection, filter).await
        }

        async fn replace(
            &self,
            collection: Collection,
            document: Document,
        ) -> document_store::Result<Document> {
            self.inner.replace(collection, document).await
        }

        async fn delete(
            &self,
            collection: Collection,
            id: DocumentId,
        ) -> document_store::Result<bool> {
            self.inner.delete(collection, id).await
        }

        async fn delete_one(
            &self,
            collection: Collection,
            filter: &Filter,
        ) -> document_store::Result<Option<Document>> {
            self.inner.delete_one(collection, filter).await
        }

        async fn increment(
            &self,
            collection: Collection,
            id: DocumentId,
            field: &str,
            by: i64,
        ) -> document_store::Result<Option<Document>> {
            self.inner.increment(collection, id, field, by).await
        }

        async fn update_one(
            &self,
            collection: Collection,
            filter: &Filter,
            update: &Update,
        ) -> document_store::Result<Option<Document>> {
            self.inner.update_one(collection, filter, update).await
        }
    }

    #[tokio::test]
    async fn login_during_a_watch_keeps_its_refresh_token() {
        let fx = fixture();
        let store = WriteAfterUserRead {
            inner: fx.store.clone(),
            queued: Arc::new(Mutex::new(None)),
        };
        let blobs = Arc::new(fx.blobs.clone());
        let services = Services::new(store.clone(), blobs, fx.sessions.clone());
        let alice = seed_user(&fx, "alice").await;
        let video = publish(&fx, alice, "clip").await;

        let tokens = fx.sessions.issue(alice).unwrap();
        let login = Update::new().set("refreshToken", tokens.refresh_token.as_str());
        store.queue(alice, login);
        services.videos.watch(video.id, Some(alice)).await.unwrap();
        store.land_queued(Collection::Users).await;

        let stored: User = Repository::new(fx.store.clone()).require(alice).await.unwrap();
        assert_eq!(stored.refresh_token, Some(tokens.refresh_token.clone()));
        assert_eq!(stored.watch_history, vec![video.id]);
        assert!(services.users.refresh(&tokens.refresh_token).await.is_ok());
    }
}

mod compensation {
    use super::*;

    #[tokio::test]
    async fn failed_thumbnail_upload_deletes_the_video_file() {
        let fx = fixture();
        let alice = seed_user(&fx, "alice").await;
        fx.blobs.fail_uploads_after(1);

        let err = fx
            .services
            .videos
            .publish(
                alice,
                PublishVideo {
                    title: "t".to_string(),
                    description: "d".to_string(),
                    video_file: Some(LocalFile::new("/tmp/clip.mp4")),
                    thumbnail: Some(LocalFile::new("/tmp/thumb.png")),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Dependency(_)));
        assert_eq!(fx.blobs.asset_count(), 0);
        assert_eq!(fx.blobs.deleted(), vec!["asset-0001".to_string()]);
        assert_eq!(fx.store.len(Collection::Videos).await, 0);
    }

    #[tokio::test]
    async fn missing_files_are_rejected_before_uploading() {
        let fx = fixture();
        let alice = seed_user(&fx, "alice").await;
        let err = fx
            .services
            .videos
            .publish(
                alice,
                PublishVideo {
                    title: "t".to_string(),
                    description: "d".to_string(),
                    video_file: Some(LocalFile::new("/tmp/clip.mp4")),
                    thumbnail: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
        assert_eq!(fx.blobs.asset_count(), 0);
    }

    #[tokio::test]
    async fn cover_upload_failure_releases_the_avatar() {
        let fx = fixture();
        fx.blobs.fail_uploads_after(1);

        let err = fx.services.users.register(registration("alice")).await.unwrap_err();
        assert!(matches!(err, DomainError::Dependency(_)));
        assert_eq!(fx.blobs.asset_count(), 0);
        assert_eq!(fx.store.len(Collection::Users).await, 0);
    }
}

mod users {
    use super::*;

    #[tokio::test]
    async fn register_lowercases_username_and_hides_credentials() {
        let fx = fixture();
        let profile = fx.services.users.register(registration("Alice")).await.unwrap();
        assert_eq!(profile.username, "alice");
        assert!(profile.cover_image.is_some());

        let body = serde_json::to_value(&profile).unwrap();
        assert!(body.get("password").is_none());
        assert!(body.get("refreshToken").is_none());

        let err = fx.services.users.register(registration("ALICE")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(fx.blobs.asset_count(), 2);
    }

    #[tokio::test]
    async fn login_refresh_rotation_and_logout() {
        let fx = fixture();
        fx.services.users.register(registration("alice")).await.unwrap();

        let wrong = fx
            .services
            .users
            .login(LoginRequest {
                username: Some("alice".to_string()),
                email: None,
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(wrong, DomainError::Unauthorized(_)));

        let logged_in = fx
            .services
            .users
            .login(LoginRequest {
                username: None,
                email: Some("alice@example.com".to_string()),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();
        let user = logged_in.user.id;
        assert_eq!(
            fx.sessions.verify_access(&logged_in.tokens.access_token).unwrap(),
            user
        );

        let rotated = fx
            .services
            .users
            .refresh(&logged_in.tokens.refresh_token)
            .await
            .unwrap();
        let reused = fx
            .services
            .users
            .refresh(&logged_in.tokens.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(reused, DomainError::Unauthorized(_)));

        fx.services.users.logout(user).await.unwrap();
        assert!(fx.services.users.refresh(&rotated.refresh_token).await.is_err());
        let stored: User = Repository::new(fx.store.clone()).require(user).await.unwrap();
        assert!(stored.refresh_token.is_none());
    }

    #[tokio::test]
    async fn current_user_keeps_email_but_never_credentials() {
        let fx = fixture();
        let profile = fx.services.users.register(registration("alice")).await.unwrap();
        let me = fx.services.users.current_user(profile.id).await.unwrap();
        assert_eq!(me.get_str("email"), Some("alice@example.com"));
        assert!(me.get("password").is_none());
        assert!(me.get("refreshToken").is_none());
    }

    #[tokio::test]
    async fn change_password_checks_the_old_one() {
        let fx = fixture();
        let profile = fx.services.users.register(registration("alice")).await.unwrap();
        let err = fx
            .services
            .users
            .change_password(
                profile.id,
                ChangePassword {
                    old_password: "nope".to_string(),
                    new_password: "next".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        fx.services
            .users
            .change_password(
                profile.id,
                ChangePassword {
                    old_password: "correct horse".to_string(),
                    new_password: "next".to_string(),
                },
            )
            .await
            .unwrap();
        let logged_in = fx
            .services
            .users
            .login(LoginRequest {
                username: Some("alice".to_string()),
                email: None,
                password: "next".to_string(),
            })
            .await;
        assert!(logged_in.is_ok());
    }

    #[tokio::test]
    async fn avatar_update_releases_the_previous_asset() {
        let fx = fixture();
        let profile = fx.services.users.register(registration("alice")).await.unwrap();
        let old = profile.avatar.rsplit('/').next().unwrap().to_string();

        let updated = fx
            .services
            .users
            .update_avatar(profile.id, &LocalFile::new("/tmp/new.png"))
            .await
            .unwrap();
        assert_ne!(updated.avatar, profile.avatar);
        assert!(!fx.blobs.has_asset(&old));
    }
}

mod likes {
    use super::*;

    #[tokio::test]
    async fn liking_a_comment_twice_removes_the_like() {
        let fx = fixture();
        let alice = seed_user(&fx, "alice").await;
        let bob = seed_user(&fx, "bob").await;
        let video = publish(&fx, alice, "clip").await;
        let comment = fx.services.comments.add(alice, video.id, "hi").await.unwrap();
        let target = LikeTarget::comment(comment.id);

        let first = fx.services.likes.toggle(bob, target).await.unwrap();
        assert_eq!(first, ToggleOutcome::Present);
        assert_eq!(fx.store.len(Collection::Likes).await, 1);

        let second = fx.services.likes.toggle(bob, target).await.unwrap();
        assert_eq!(second, ToggleOutcome::Absent);
        assert_eq!(fx.store.len(Collection::Likes).await, 0);
    }

    #[tokio::test]
    async fn liking_a_missing_target_is_not_found() {
        let fx = fixture();
        let bob = seed_user(&fx, "bob").await;
        let err = fx
            .services
            .likes
            .toggle(bob, LikeTarget::tweet(DocumentId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(what) if what == "tweet"));
    }

    #[tokio::test]
    async fn liked_videos_follow_toggles() {
        let fx = fixture();
        let alice = seed_user(&fx, "alice").await;
        let video = publish(&fx, alice, "clip").await;

        fx.services.likes.toggle(alice, LikeTarget::video(video.id)).await.unwrap();
        let liked = fx.services.likes.liked_videos(alice).await.unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].get_str("video.title"), Some("clip"));

        let details = fx.services.videos.watch(video.id, Some(alice)).await.unwrap();
        assert_eq!(details.get_i64("likesCount"), Some(1));
        assert_eq!(details.get("isLiked"), Some(&serde_json::json!(true)));
    }
}

mod subscriptions {
    use super::*;

    #[tokio::test]
    async fn subscribing_to_yourself_is_invalid() {
        let fx = fixture();
        let alice = seed_user(&fx, "alice").await;
        let err = fx.services.subscriptions.toggle(alice, alice).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn toggle_and_list_both_directions() {
        let fx = fixture();
        let alice = seed_user(&fx, "alice").await;
        let bob = seed_user(&fx, "bob").await;

        let outcome = fx.services.subscriptions.toggle(bob, alice).await.unwrap();
        assert_eq!(outcome, ToggleOutcome::Present);

        let subscribers = fx.services.subscriptions.channel_subscribers(alice).await.unwrap();
        assert_eq!(subscribers.len(), 1);
        let channels = fx.services.subscriptions.subscribed_channels(bob).await.unwrap();
        assert_eq!(channels.len(), 1);

        let profile = fx.services.users.channel_profile("alice", Some(bob)).await.unwrap();
        assert_eq!(profile.get_i64("subscribersCount"), Some(1));
        assert_eq!(profile.get("isSubscribed"), Some(&serde_json::json!(true)));

        let outcome = fx.services.subscriptions.toggle(bob, alice).await.unwrap();
        assert_eq!(outcome, ToggleOutcome::Absent);
        assert!(fx.services.subscriptions.channel_subscribers(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_channel_is_not_found() {
        let fx = fixture();
        let bob = seed_user(&fx, "bob").await;
        let err = fx.services.subscriptions.toggle(bob, DocumentId::new()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(what) if what == "channel"));
    }
}

mod playlists {
    use super::*;

    async fn playlist(fx: &Fixture, owner: DocumentId, name: &str) -> DocumentId {
        fx.services
            .playlists
            .create(
                owner,
                CreatePlaylist {
                    name: name.to_string(),
                    description: String::new(),
                },
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn adding_a_video_twice_is_a_conflict() {
        let fx = fixture();
        let alice = seed_user(&fx, "alice").await;
        let video = publish(&fx, alice, "clip").await;
        let list = playlist(&fx, alice, "mix").await;

        fx.services.playlists.add_video(alice, list, video.id).await.unwrap();
        let err = fx
            .services
            .playlists
            .add_video(alice, list, video.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let stored = fx.services.playlists.get(list).await.unwrap();
        assert_eq!(stored.get_i64("totalVideos"), Some(1));
    }

    #[tokio::test]
    async fn removing_an_absent_video_is_not_found() {
        let fx = fixture();
        let alice = seed_user(&fx, "alice").await;
        let list = playlist(&fx, alice, "mix").await;
        let err = fx
            .services
            .playlists
            .remove_video(alice, list, DocumentId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn names_are_unique_per_owner() {
        let fx = fixture();
        let alice = seed_user(&fx, "alice").await;
        let bob = seed_user(&fx, "bob").await;
        let first = playlist(&fx, alice, "mix").await;
        playlist(&fx, bob, "mix").await;
        let second = playlist(&fx, alice, "other").await;

        let err = fx
            .services
            .playlists
            .create(
                alice,
                CreatePlaylist {
                    name: "mix".to_string(),
                    description: String::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let rename = UpdatePlaylist {
            name: Some("mix".to_string()),
            description: None,
        };
        let err = fx
            .services
            .playlists
            .update(alice, second, rename.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        // Keeping its own name is fine.
        fx.services.playlists.update(alice, first, rename).await.unwrap();
    }
}

mod ownership {
    use super::*;

    #[tokio::test]
    async fn non_owners_are_forbidden_even_with_invalid_payloads() {
        let fx = fixture();
        let alice = seed_user(&fx, "alice").await;
        let mallory = seed_user(&fx, "mallory").await;
        let video = publish(&fx, alice, "clip").await;
        let comment = fx.services.comments.add(alice, video.id, "mine").await.unwrap();
        let tweet = fx.services.tweets.create(alice, "mine").await.unwrap();
        let list = fx
            .services
            .playlists
            .create(
                alice,
                CreatePlaylist {
                    name: "mix".to_string(),
                    description: String::new(),
                },
            )
            .await
            .unwrap();

        let results = [
            fx.services
                .videos
                .update(mallory, video.id, UpdateVideo::default())
                .await
                .map(drop),
            fx.services.videos.delete(mallory, video.id).await,
            fx.services.videos.toggle_publish(mallory, video.id).await.map(drop),
            fx.services.comments.update(mallory, comment.id, "").await.map(drop),
            fx.services.comments.delete(mallory, comment.id).await,
            fx.services.tweets.update(mallory, tweet.id, "   ").await.map(drop),
            fx.services.tweets.delete(mallory, tweet.id).await,
            fx.services
                .playlists
                .update(mallory, list.id, UpdatePlaylist::default())
                .await
                .map(drop),
            fx.services
                .playlists
                .add_video(mallory, list.id, DocumentId::new())
                .await
                .map(drop),
            fx.services.playlists.delete(mallory, list.id).await,
        ];

        for result in results {
            assert!(matches!(result, Err(DomainError::Forbidden(_))), "{result:?}");
        }
        assert_eq!(fx.services.tweets.user_tweets(alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn owners_can_edit_and_delete() {
        let fx = fixture();
        let alice = seed_user(&fx, "alice").await;
        let tweet = fx.services.tweets.create(alice, "first").await.unwrap();

        let edited = fx.services.tweets.update(alice, tweet.id, "edited").await.unwrap();
        assert_eq!(edited.content, "edited");
        fx.services.tweets.delete(alice, tweet.id).await.unwrap();
        assert!(fx.services.tweets.user_tweets(alice).await.unwrap().is_empty());
    }
}

mod dashboard {
    use super::*;

    #[tokio::test]
    async fn empty_channel_has_zero_stats() {
        let fx = fixture();
        let alice = seed_user(&fx, "alice").await;
        let stats = fx.services.dashboard.channel_stats(alice).await.unwrap();
        let body = serde_json::to_value(stats).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "totalViews": 0,
                "totalVideos": 0,
                "totalSubscribers": 0,
                "totalLikes": 0
            })
        );

        let videos = fx
            .services
            .dashboard
            .channel_videos(alice, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(videos.total_count, 0);
        assert!(videos.items.is_empty());
    }

    #[tokio::test]
    async fn stats_count_views_videos_and_likes() {
        let fx = fixture();
        let alice = seed_user(&fx, "alice").await;
        let bob = seed_user(&fx, "bob").await;
        let video = publish(&fx, alice, "clip").await;
        fx.services.videos.watch(video.id, Some(bob)).await.unwrap();
        fx.services.likes.toggle(bob, LikeTarget::video(video.id)).await.unwrap();
        fx.services.subscriptions.toggle(bob, alice).await.unwrap();

        let stats = fx.services.dashboard.channel_stats(alice).await.unwrap();
        assert_eq!(stats.total_views, 1);
        assert_eq!(stats.total_videos, 1);
        assert_eq!(stats.total_likes, 1);
        assert_eq!(stats.total_subscribers, 1);
    }
}

mod comments {
    use super::*;

    #[tokio::test]
    async fn listing_comments_of_a_quiet_video_is_an_empty_page() {
        let fx = fixture();
        let alice = seed_user(&fx, "alice").await;
        let video = publish(&fx, alice, "clip").await;

        let page = fx
            .services
            .comments
            .list(video.id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_count, 0);

        fx.services.comments.add(alice, video.id, "first").await.unwrap();
        let page = fx
            .services
            .comments
            .list(video.id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].get_str("owner.username"), Some("alice"));
    }

    #[tokio::test]
    async fn commenting_on_a_missing_video_is_not_found() {
        let fx = fixture();
        let alice = seed_user(&fx, "alice").await;
        let err = fx
            .services
            .comments
            .add(alice, DocumentId::new(), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
