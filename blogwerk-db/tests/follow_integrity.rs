//! Exercises the follow edge guarantees against a real database.
//!
//! These tests need `DATABASE_URL` pointing at a PostgreSQL instance and are
//! ignored by default; run them with `cargo test -- --ignored`.

use blogwerk_common::model::{follow::FollowRequest, user::Username};
use blogwerk_db::client::{DbClient, Page};
use time::OffsetDateTime;

async fn test_client() -> DbClient {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let client = DbClient::connect(&database_url).await.expect("connect");
    client.migrate().await.expect("migrate");
    client
}

fn unique_username(prefix: &str) -> Username {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    Username::new(format!("{prefix}{nanos}")).expect("generated username is valid")
}

#[tokio::test]
#[ignore = "needs a PostgreSQL instance"]
async fn duplicate_follow_keeps_a_single_edge() {
    let db = test_client().await;

    let follower = db
        .create_user(&unique_username("df_a_"), false)
        .await
        .unwrap();
    let followee = db
        .create_user(&unique_username("df_b_"), false)
        .await
        .unwrap();
    let request = FollowRequest::new(follower, followee).unwrap();

    assert!(db.create_follow(&request).await.unwrap().is_some());
    assert!(db.create_follow(&request).await.unwrap().is_none());

    assert_eq!(db.count_follows(follower, None).await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "needs a PostgreSQL instance"]
async fn racing_identical_creates_insert_exactly_once() {
    let db = test_client().await;

    let follower = db
        .create_user(&unique_username("race_a_"), false)
        .await
        .unwrap();
    let followee = db
        .create_user(&unique_username("race_b_"), false)
        .await
        .unwrap();
    let request = FollowRequest::new(follower, followee).unwrap();

    let (first, second) = tokio::join!(db.create_follow(&request), db.create_follow(&request));
    let inserted = [first.unwrap(), second.unwrap()];

    assert_eq!(inserted.iter().filter(|id| id.is_some()).count(), 1);
    assert_eq!(db.count_follows(follower, None).await.unwrap(), 1);
}

#[tokio::test]
#[ignore = "needs a PostgreSQL instance"]
async fn listing_only_returns_the_requesters_edges() {
    let db = test_client().await;

    let alice_name = unique_username("scope_alice_");
    let alice = db.create_user(&alice_name, false).await.unwrap();
    let bob = db
        .create_user(&unique_username("scope_bob_"), false)
        .await
        .unwrap();
    let carol = db
        .create_user(&unique_username("scope_carol_"), false)
        .await
        .unwrap();

    db.create_follow(&FollowRequest::new(alice, bob).unwrap())
        .await
        .unwrap();
    db.create_follow(&FollowRequest::new(carol, bob).unwrap())
        .await
        .unwrap();

    let page = Page {
        limit: 50,
        offset: 0,
    };
    let follows = db.list_follows(alice, None, page).await.unwrap();

    assert_eq!(follows.len(), 1);
    assert!(follows.iter().all(|follow| follow.user == alice_name));
}

#[tokio::test]
#[ignore = "needs a PostgreSQL instance"]
async fn search_matches_exact_usernames_only() {
    let db = test_client().await;

    let alice = db
        .create_user(&unique_username("search_alice_"), false)
        .await
        .unwrap();
    let bob_name = unique_username("search_bob_");
    let bob = db.create_user(&bob_name, false).await.unwrap();
    let carol = db
        .create_user(&unique_username("search_carol_"), false)
        .await
        .unwrap();

    db.create_follow(&FollowRequest::new(alice, bob).unwrap())
        .await
        .unwrap();
    db.create_follow(&FollowRequest::new(alice, carol).unwrap())
        .await
        .unwrap();

    let page = Page {
        limit: 50,
        offset: 0,
    };

    let exact = db
        .list_follows(alice, Some(bob_name.get()), page)
        .await
        .unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].following, bob_name);

    let prefix = &bob_name.get()[..bob_name.get().len() - 1];
    let partial = db.list_follows(alice, Some(prefix), page).await.unwrap();
    assert!(partial.is_empty());
}
