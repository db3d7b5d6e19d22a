//! Contract Test: Assignment Idempotency & Allocation
//!
//! Constraints verified:
//! - Repeating an assignment changes nothing and writes nothing
//! - Registration of a bound service returns the same alias
//! - Per-service allocation never repeats the service's own aliases
//! - Aliases are reused across services
//! - Bindings survive a restart

mod common;

use alias_core::{Alias, AliasEngine, FileStateStore, Registration};
use common::*;
use std::collections::HashSet;

async fn engine_for(seed: &str) -> (AliasEngine, MockStateStore) {
    let store = MockStateStore::new();
    let engine = AliasEngine::open(Box::new(store.clone()), gmail())
        .await
        .expect("engine opens");
    engine.generate_domain_names(seed).await.expect("seed is valid");
    (engine, store)
}

#[tokio::test]
async fn repeated_assign_is_a_no_op() {
    let (engine, store) = engine_for("abc@gmail.com").await;

    engine.assign("groq", Alias::from("ab.c@gmail.com")).await.unwrap();
    let after_first = engine.service_aliases("groq").await;
    let writes = store.save_calls();

    engine.assign("groq", Alias::from("ab.c@gmail.com")).await.unwrap();
    assert_eq!(engine.service_aliases("groq").await, after_first);
    assert_eq!(store.save_calls(), writes, "no-op must not write");
}

#[tokio::test]
async fn check_and_assign_twice_returns_same_alias() {
    let (engine, _store) = engine_for("ab@gmail.com").await;

    let first = engine.check_and_assign("groq").await.unwrap();
    let second = engine.check_and_assign("groq").await.unwrap();

    assert_eq!(first, Registration::Assigned(Alias::from("ab@gmail.com")));
    assert_eq!(second, Registration::Existing(Alias::from("ab@gmail.com")));
    assert_eq!(engine.service_aliases("groq").await.len(), 1);
}

#[tokio::test]
async fn registration_after_rotation_returns_latest() {
    let (engine, _store) = engine_for("abc@gmail.com").await;

    engine.check_and_assign("groq").await.unwrap();
    let rotated = engine.assign_next("groq").await.unwrap();

    assert_eq!(
        engine.check_and_assign("groq").await.unwrap(),
        Registration::Existing(rotated)
    );
}

#[tokio::test]
async fn service_walks_whole_pool_then_exhausts() {
    let (engine, _store) = engine_for("abcd@gmail.com").await;
    let pool = engine.pool().await;

    let mut seen = HashSet::new();
    for expected in pool.iter() {
        let next = engine.unused_for_service("groq").await.unwrap();
        assert_eq!(&next, expected, "allocation must follow pool order");
        assert!(seen.insert(next.clone()), "alias handed out twice");
        engine.assign("groq", next).await.unwrap();
    }

    assert_eq!(engine.unused_for_service("groq").await, None);
    assert_eq!(engine.service_aliases("groq").await.len(), pool.len());
}

#[tokio::test]
async fn exhausted_service_reports_exhaustion_on_registration() {
    let (engine, _store) = engine_for("ab@gmail.com").await;

    // Bind both aliases by hand so registration is never the first bind
    engine.assign("other", Alias::from("ab@gmail.com")).await.unwrap();
    engine.assign("groq", Alias::from("ab@gmail.com")).await.unwrap();
    engine.assign("groq", Alias::from("a.b@gmail.com")).await.unwrap();

    assert_eq!(engine.unused_for_service("groq").await, None);
    assert!(engine.check_and_assign("groq").await.unwrap().existed());
    assert!(engine.assign_next("groq").await.is_err());

    // Another service still gets the second alias even though groq holds it
    assert_eq!(
        engine.unused_for_service("other").await,
        Some(Alias::from("a.b@gmail.com"))
    );
}

#[tokio::test]
async fn aliases_are_shared_across_services() {
    let (engine, _store) = engine_for("ab@gmail.com").await;

    let groq = engine.check_and_assign("groq").await.unwrap();
    let openai = engine.check_and_assign("openai").await.unwrap();

    assert_eq!(groq.alias(), openai.alias());
    assert_eq!(engine.next_globally_unused().await, Some(Alias::from("a.b@gmail.com")));
}

#[tokio::test]
async fn bindings_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let pool_path = dir.path().join("gmails.txt");
    let assignments_path = dir.path().join("services_data.json");

    let first = {
        let store = FileStateStore::new(&pool_path, &assignments_path)
            .await
            .unwrap();
        let engine = AliasEngine::open(Box::new(store), gmail()).await.unwrap();
        engine.generate_domain_names("abc@gmail.com").await.unwrap();
        engine.check_and_assign("Groq").await.unwrap()
    };

    let store = FileStateStore::new(&pool_path, &assignments_path)
        .await
        .unwrap();
    let engine = AliasEngine::open(Box::new(store), gmail()).await.unwrap();

    let again = engine.check_and_assign("groq").await.unwrap();
    assert!(again.existed());
    assert_eq!(again.alias(), first.alias());
}
