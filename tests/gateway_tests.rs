//! Integration tests for the task store gateway.

use std::sync::{Arc, Mutex};
use tasklist::cache::{CacheInvalidator, MutationKind, PageCache};
use tasklist::db::Database;
use tasklist::error::ErrorCode;
use tasklist::gateway::{TaskGateway, TaskService};
use tasklist::types::{NewTask, TaskEdit};

/// Records every invalidation the gateway reports.
#[derive(Default)]
struct RecordingInvalidator {
    seen: Mutex<Vec<MutationKind>>,
}

impl RecordingInvalidator {
    fn seen(&self) -> Vec<MutationKind> {
        self.seen.lock().unwrap().clone()
    }
}

impl CacheInvalidator for RecordingInvalidator {
    fn invalidate(&self, kind: MutationKind) {
        self.seen.lock().unwrap().push(kind);
    }
}

fn setup() -> (TaskService, Arc<RecordingInvalidator>) {
    let db = Arc::new(Database::open_in_memory().expect("Failed to create in-memory database"));
    let recorder = Arc::new(RecordingInvalidator::default());
    let service = TaskService::new(db).with_invalidator(recorder.clone());
    (service, recorder)
}

fn edit(title: &str, description: &str) -> TaskEdit {
    TaskEdit {
        title: title.to_string(),
        description: description.to_string(),
    }
}

#[tokio::test]
async fn buy_milk_scenario() {
    let (gateway, _) = setup();

    let created = gateway.create(NewTask::new("Buy milk")).await.unwrap();
    let tasks = gateway.list().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Buy milk");
    assert!(!tasks[0].completed);

    gateway.toggle_completion(created.id).await.unwrap();
    let tasks = gateway.list().await.unwrap();
    assert!(tasks[0].completed);

    gateway
        .update(created.id, edit("Buy oat milk", "2 cartons"))
        .await
        .unwrap();
    let tasks = gateway.list().await.unwrap();
    assert_eq!(tasks[0].title, "Buy oat milk");
    assert_eq!(tasks[0].description.as_deref(), Some("2 cartons"));

    gateway.delete(created.id).await.unwrap();
    assert!(gateway.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn create_adds_exactly_one_fresh_task() {
    let (gateway, _) = setup();
    let existing = gateway.create(NewTask::new("first")).await.unwrap();

    let created = gateway
        .create(NewTask::new("second").with_description("details"))
        .await
        .unwrap();

    let tasks = gateway.list().await.unwrap();
    let matching: Vec<_> = tasks.iter().filter(|t| t.title == "second").collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0], &created);
    assert!(!created.completed);
    assert_ne!(created.id, existing.id);
}

#[tokio::test]
async fn create_rejects_blank_title() {
    let (gateway, recorder) = setup();

    let err = gateway.create(NewTask::new("  ")).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidInput);
    assert_eq!(err.field.as_deref(), Some("title"));
    assert!(gateway.list().await.unwrap().is_empty());
    assert!(recorder.seen().is_empty());
}

#[tokio::test]
async fn toggle_twice_restores_original_value() {
    let (gateway, _) = setup();
    let task = gateway.create(NewTask::new("t")).await.unwrap();

    let once = gateway.toggle_completion(task.id).await.unwrap();
    let twice = gateway.toggle_completion(task.id).await.unwrap();

    assert!(once.completed);
    assert_eq!(twice.completed, task.completed);
}

#[tokio::test]
async fn toggle_missing_task_is_not_found() {
    let (gateway, recorder) = setup();

    let err = gateway.toggle_completion(99).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::NotFound);
    assert!(gateway.list().await.unwrap().is_empty());
    assert!(recorder.seen().is_empty());
}

#[tokio::test]
async fn update_keeps_identity_fields() {
    let (gateway, _) = setup();
    let task = gateway.create(NewTask::new("old")).await.unwrap();
    gateway.toggle_completion(task.id).await.unwrap();

    gateway.update(task.id, edit("new", "desc")).await.unwrap();

    let stored = gateway.list().await.unwrap().remove(0);
    assert_eq!(stored.id, task.id);
    assert_eq!(stored.created_at, task.created_at);
    assert!(stored.completed);
    assert_eq!(stored.title, "new");
    assert_eq!(stored.description.as_deref(), Some("desc"));
}

#[tokio::test]
async fn update_round_trips_whitespace_description() {
    let (gateway, _) = setup();
    let task = gateway.create(NewTask::new("t")).await.unwrap();

    gateway.update(task.id, edit("t", "   ")).await.unwrap();

    let stored = gateway.list().await.unwrap().remove(0);
    assert_eq!(stored.title, "t");
    assert_eq!(stored.description.as_deref(), Some("   "));
}

#[tokio::test]
async fn update_rejects_blank_title() {
    let (gateway, _) = setup();
    let task = gateway.create(NewTask::new("keep me")).await.unwrap();

    let err = gateway.update(task.id, edit("", "x")).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidInput);
    assert_eq!(gateway.list().await.unwrap()[0].title, "keep me");
}

#[tokio::test]
async fn deleted_id_is_gone_for_every_operation() {
    let (gateway, _) = setup();
    let task = gateway.create(NewTask::new("t")).await.unwrap();

    gateway.delete(task.id).await.unwrap();

    assert!(gateway.list().await.unwrap().iter().all(|t| t.id != task.id));
    assert_eq!(
        gateway.update(task.id, edit("x", "")).await.unwrap_err().code,
        ErrorCode::NotFound
    );
    assert_eq!(
        gateway.toggle_completion(task.id).await.unwrap_err().code,
        ErrorCode::NotFound
    );
    assert_eq!(
        gateway.delete(task.id).await.unwrap_err().code,
        ErrorCode::NotFound
    );
}

#[tokio::test]
async fn list_is_newest_first() {
    let (gateway, _) = setup();
    let mut ids = Vec::new();
    for title in ["a", "b", "c", "d"] {
        ids.push(gateway.create(NewTask::new(title)).await.unwrap().id);
    }
    gateway.toggle_completion(ids[0]).await.unwrap();
    gateway.update(ids[1], edit("b2", "")).await.unwrap();

    let listed: Vec<i64> = gateway.list().await.unwrap().iter().map(|t| t.id).collect();
    ids.reverse();
    assert_eq!(listed, ids);

    let tasks = gateway.list().await.unwrap();
    assert!(tasks.windows(2).all(|w| w[0].created_at >= w[1].created_at));
}

#[tokio::test]
async fn successful_writes_invalidate_once_each() {
    let (gateway, recorder) = setup();

    let task = gateway.create(NewTask::new("t")).await.unwrap();
    gateway.toggle_completion(task.id).await.unwrap();
    gateway.update(task.id, edit("u", "")).await.unwrap();
    gateway.delete(task.id).await.unwrap();
    gateway.list().await.unwrap();

    assert_eq!(
        recorder.seen(),
        vec![
            MutationKind::TaskCreated,
            MutationKind::TaskToggled,
            MutationKind::TaskUpdated,
            MutationKind::TaskDeleted,
        ]
    );
}

#[tokio::test]
async fn failed_writes_do_not_invalidate() {
    let (gateway, recorder) = setup();

    let _ = gateway.delete(1).await;
    let _ = gateway.update(1, edit("x", "")).await;

    assert!(recorder.seen().is_empty());
}

#[tokio::test]
async fn write_drops_cached_page() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let cache = Arc::new(PageCache::new());
    let gateway = TaskService::new(db).with_invalidator(cache.clone());
    cache.store(cache.generation(), "<html>cached</html>".to_string());
    assert!(cache.is_cached());

    gateway.create(NewTask::new("new")).await.unwrap();

    assert!(!cache.is_cached());
}

#[tokio::test]
async fn gateway_works_through_arc_dyn() {
    let (service, _) = setup();
    let gateway: Arc<dyn TaskGateway> = Arc::new(service);

    gateway.create(NewTask::new("via dyn")).await.unwrap();

    assert_eq!(gateway.list().await.unwrap().len(), 1);
}
