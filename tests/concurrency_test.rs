//! Concurrency tests for feedling.
//!
//! Upserts and subscribes race on a file-backed database with several pooled
//! connections; the unique constraints plus single-statement upserts must
//! keep exactly one row per key.

use std::sync::Arc;

use feedling::db::{NewUser, UserRepository};
use feedling::feed::{FeedRepository, SubscriptionRepository};
use feedling::Database;

const TASKS: usize = 16;

async fn setup_file_db() -> (tempfile::TempDir, Arc<Database>) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_path(dir.path().join("feedling.db"), 8)
        .await
        .unwrap();
    (dir, Arc::new(db))
}

async fn create_test_user(db: &Database, username: &str) -> i64 {
    UserRepository::new(db.pool())
        .create(&NewUser::new(
            username,
            format!("{username}@example.com"),
            "hash",
        ))
        .await
        .unwrap()
        .id
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_upsert_same_url() {
    let (_dir, db) = setup_file_db().await;

    let mut handles = Vec::new();
    for i in 0..TASKS {
        let db = Arc::clone(&db);
        handles.push(tokio::spawn(async move {
            FeedRepository::new(db.pool())
                .upsert("https://x.example/a.xml", &format!("Title {i}"))
                .await
                .unwrap()
                .id
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }

    assert!(ids.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(FeedRepository::new(db.pool()).count().await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_subscribe_same_feed() {
    let (_dir, db) = setup_file_db().await;
    let user_id = create_test_user(&db, "alice").await;
    let feed = FeedRepository::new(db.pool())
        .upsert("https://x.example/a.xml", "A")
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..TASKS {
        let db = Arc::clone(&db);
        let feed_id = feed.id;
        handles.push(tokio::spawn(async move {
            SubscriptionRepository::new(db.pool())
                .subscribe(user_id, feed_id, None)
                .await
                .unwrap()
        }));
    }

    let mut created = 0;
    let mut ids = Vec::new();
    for handle in handles {
        let outcome = handle.await.unwrap();
        if outcome.created {
            created += 1;
        }
        ids.push(outcome.subscription.id);
    }

    assert_eq!(created, 1);
    assert!(ids.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(
        SubscriptionRepository::new(db.pool())
            .count_for_user(user_id)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_subscribe_races_unsubscribe() {
    let (_dir, db) = setup_file_db().await;
    let user_id = create_test_user(&db, "alice").await;
    let feed = FeedRepository::new(db.pool())
        .upsert("https://x.example/a.xml", "A")
        .await
        .unwrap();

    let mut subscribers = Vec::new();
    let mut unsubscribers = Vec::new();
    for _ in 0..TASKS / 2 {
        let sub_db = Arc::clone(&db);
        let feed_id = feed.id;
        subscribers.push(tokio::spawn(async move {
            let repo = SubscriptionRepository::new(sub_db.pool());
            for _ in 0..20 {
                let outcome = repo.subscribe(user_id, feed_id, None).await?;
                assert_eq!(outcome.subscription.feed_id, feed_id);
            }
            Ok::<_, feedling::FeedlingError>(())
        }));

        let unsub_db = Arc::clone(&db);
        unsubscribers.push(tokio::spawn(async move {
            let repo = SubscriptionRepository::new(unsub_db.pool());
            for _ in 0..20 {
                let ids: Vec<i64> = repo
                    .list_for_user(user_id, None)
                    .await
                    .unwrap()
                    .iter()
                    .map(|s| s.id)
                    .collect();
                repo.unsubscribe(&ids, user_id).await.unwrap();
            }
        }));
    }

    for handle in subscribers {
        handle.await.unwrap().unwrap();
    }
    for handle in unsubscribers {
        handle.await.unwrap();
    }

    assert!(
        SubscriptionRepository::new(db.pool())
            .count_for_user(user_id)
            .await
            .unwrap()
            <= 1
    );
}
