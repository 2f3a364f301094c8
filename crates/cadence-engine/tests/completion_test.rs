//! Integration tests for the completion tracker.

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use cadence_core::{Error, RecalcKind, RecalcQueue, Recurrence, TodoDraft};
use cadence_db::MemoryStore;
use cadence_engine::Engine;

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn setup() -> (Arc<MemoryStore>, Engine, cadence_core::RecalcReceiver) {
    let store = Arc::new(MemoryStore::new());
    let (recalc, rx) = RecalcQueue::with_capacity(64);
    let engine = Engine::new(store.clone(), store.clone(), store.clone(), recalc);
    (store, engine, rx)
}

fn recurring_draft(anchor: &str) -> TodoDraft {
    TodoDraft {
        title: "daily stretch".to_string(),
        project: None,
        category: Uuid::new_v4(),
        date: Some(d(anchor)),
        deadline: None,
        difficulty: Some(1),
        repeat: Recurrence::Daily {
            interval: 1,
            end_date: None,
        },
    }
}

#[tokio::test]
async fn test_marking_twice_leaves_exactly_one_mark() {
    let (store, engine, _rx) = setup();
    let owner = Uuid::new_v4();
    let todo = engine
        .todos
        .create(owner, recurring_draft("2024-03-01"), &[])
        .await
        .unwrap();
    let day = Some(d("2024-03-04"));

    engine
        .completion
        .set_completion(owner, todo.id, day, true)
        .await
        .unwrap();
    engine
        .completion
        .set_completion(owner, todo.id, day, true)
        .await
        .unwrap();
    assert_eq!(store.mark_count().await, 1);

    engine
        .completion
        .set_completion(owner, todo.id, day, false)
        .await
        .unwrap();
    assert_eq!(store.mark_count().await, 0);
}

#[tokio::test]
async fn test_completion_flag_surfaces_in_day_list() {
    let (_store, engine, _rx) = setup();
    let owner = Uuid::new_v4();
    let todo = engine
        .todos
        .create(owner, recurring_draft("2024-03-01"), &[])
        .await
        .unwrap();

    engine
        .completion
        .set_completion(owner, todo.id, Some(d("2024-03-04")), true)
        .await
        .unwrap();

    let marked_day = engine
        .todos
        .list_for_day(owner, d("2024-03-04"), None)
        .await
        .unwrap();
    assert_eq!(marked_day.len(), 1);
    assert!(marked_day[0].completed);

    // Other instances of the same series are unaffected.
    let other_day = engine
        .todos
        .list_for_day(owner, d("2024-03-05"), None)
        .await
        .unwrap();
    assert_eq!(other_day.len(), 1);
    assert!(!other_day[0].completed);

    // The base record's own flag never moved.
    let base = engine
        .todos
        .list_for_day(owner, d("2024-03-01"), None)
        .await
        .unwrap();
    assert!(!base[0].todo.completed);
}

#[tokio::test]
async fn test_recurring_todo_requires_instance_date() {
    let (_store, engine, _rx) = setup();
    let owner = Uuid::new_v4();
    let todo = engine
        .todos
        .create(owner, recurring_draft("2024-03-01"), &[])
        .await
        .unwrap();

    let err = engine
        .completion
        .set_completion(owner, todo.id, None, true)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn test_plain_todo_uses_its_own_completed_flag() {
    let (store, engine, _rx) = setup();
    let owner = Uuid::new_v4();
    let mut draft = recurring_draft("2024-03-01");
    draft.repeat = Recurrence::None;
    let todo = engine.todos.create(owner, draft, &[]).await.unwrap();

    engine
        .completion
        .set_completion(owner, todo.id, None, true)
        .await
        .unwrap();
    assert!(store.get_todo(todo.id).await.unwrap().completed);
    assert_eq!(store.mark_count().await, 0);

    engine
        .completion
        .set_completion(owner, todo.id, None, false)
        .await
        .unwrap();
    assert!(!store.get_todo(todo.id).await.unwrap().completed);
}

#[tokio::test]
async fn test_completion_enqueues_bonus_recalculation() {
    let (_store, engine, mut rx) = setup();
    let owner = Uuid::new_v4();
    let todo = engine
        .todos
        .create(owner, recurring_draft("2024-03-01"), &[])
        .await
        .unwrap();

    // Drain the busyness task queued by create.
    let created = rx.try_recv().unwrap();
    assert_eq!(created.kind, RecalcKind::Busyness);

    engine
        .completion
        .set_completion(owner, todo.id, Some(d("2024-03-04")), true)
        .await
        .unwrap();

    let task = rx.try_recv().unwrap();
    assert_eq!(task.kind, RecalcKind::Bonus);
    assert_eq!(task.user, owner);
}

#[tokio::test]
async fn test_unknown_todo_is_not_found() {
    let (_store, engine, _rx) = setup();
    let err = engine
        .completion
        .set_completion(Uuid::new_v4(), Uuid::new_v4(), Some(d("2024-03-04")), true)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}
