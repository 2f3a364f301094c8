//! Integration tests for the series split engine.
//!
//! Exercises scoped edits/deletes end to end against the in-memory store:
//! truncation, one-off detachment, continuation forking, and the window
//! invariants that splitting must preserve.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use cadence_core::{
    Error, RecalcQueue, Recurrence, ScheduleDraft, ScopeAction, TodoDraft, TodoInstance,
};
use cadence_db::MemoryStore;
use cadence_engine::{
    Engine, ScheduleDeleteOutcome, ScheduleSplitOutcome, ScopedDelete, ScopedScheduleUpdate,
    ScopedTodoUpdate, TodoDeleteOutcome, TodoSplitOutcome,
};

fn d(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn setup() -> (Arc<MemoryStore>, Engine) {
    let store = Arc::new(MemoryStore::new());
    let (recalc, _rx) = RecalcQueue::with_capacity(64);
    let engine = Engine::new(store.clone(), store.clone(), store.clone(), recalc);
    (store, engine)
}

fn daily_draft(title: &str, anchor: &str) -> TodoDraft {
    TodoDraft {
        title: title.to_string(),
        project: None,
        category: Uuid::new_v4(),
        date: Some(d(anchor)),
        deadline: None,
        difficulty: Some(2),
        repeat: Recurrence::Daily {
            interval: 1,
            end_date: None,
        },
    }
}

fn one_off_draft(title: &str, day: &str) -> TodoDraft {
    TodoDraft {
        title: title.to_string(),
        project: None,
        category: Uuid::new_v4(),
        date: Some(d(day)),
        deadline: None,
        difficulty: None,
        repeat: Recurrence::None,
    }
}

async fn titles_on(engine: &Engine, owner: Uuid, day: &str) -> Vec<(String, bool)> {
    engine
        .todos
        .list_for_day(owner, d(day), None)
        .await
        .unwrap()
        .into_iter()
        .map(|i: TodoInstance| (i.todo.title.clone(), i.todo.repeat.is_recurring()))
        .collect()
}

#[tokio::test]
async fn test_only_this_date_edit_detaches_single_occurrence() {
    let (_store, engine) = setup();
    let owner = Uuid::new_v4();
    let todo = engine
        .todos
        .create(owner, daily_draft("standup notes", "2024-03-01"), &[])
        .await
        .unwrap();

    let outcome = engine
        .todos
        .update_scoped(
            owner,
            todo.id,
            ScopedTodoUpdate {
                action: ScopeAction::OnlyThisDate,
                target_date: d("2024-03-10"),
                draft: one_off_draft("standup notes (moved room)", "2024-03-10"),
            },
        )
        .await
        .unwrap();

    let (edited, continuation) = match outcome {
        TodoSplitOutcome::SplitOne {
            edited,
            continuation,
        } => (edited, continuation),
        other => panic!("expected SplitOne, got {other:?}"),
    };
    assert_eq!(edited.repeat, Recurrence::None);
    assert_eq!(edited.date, Some(d("2024-03-10")));
    assert_eq!(continuation.date, Some(d("2024-03-11")));
    assert_eq!(continuation.repeat.end_date(), None);

    // Days before the target are untouched: one recurring instance.
    let before = titles_on(&engine, owner, "2024-03-05").await;
    assert_eq!(before, vec![("standup notes".to_string(), true)]);

    // The target day shows only the detached one-off.
    let on_target = titles_on(&engine, owner, "2024-03-10").await;
    assert_eq!(
        on_target,
        vec![("standup notes (moved room)".to_string(), false)]
    );

    // Days after the target come from the continuation series.
    let after = titles_on(&engine, owner, "2024-03-15").await;
    assert_eq!(after, vec![("standup notes".to_string(), true)]);
}

#[tokio::test]
async fn test_only_this_date_delete_preserves_future_occurrences() {
    let (_store, engine) = setup();
    let owner = Uuid::new_v4();
    let todo = engine
        .todos
        .create(owner, daily_draft("water plants", "2024-03-01"), &[])
        .await
        .unwrap();

    let outcome = engine
        .todos
        .delete_scoped(
            owner,
            todo.id,
            ScopedDelete {
                action: ScopeAction::OnlyThisDate,
                target_date: d("2024-03-10"),
            },
        )
        .await
        .unwrap();
    assert!(matches!(outcome, TodoDeleteOutcome::DetachedOne { .. }));

    assert!(titles_on(&engine, owner, "2024-03-10").await.is_empty());
    assert_eq!(titles_on(&engine, owner, "2024-03-09").await.len(), 1);
    assert_eq!(titles_on(&engine, owner, "2024-03-11").await.len(), 1);
}

#[tokio::test]
async fn test_from_this_date_edit_replaces_series_forward() {
    let (_store, engine) = setup();
    let owner = Uuid::new_v4();
    let todo = engine
        .todos
        .create(owner, daily_draft("old routine", "2024-03-01"), &[])
        .await
        .unwrap();

    let outcome = engine
        .todos
        .update_scoped(
            owner,
            todo.id,
            ScopedTodoUpdate {
                action: ScopeAction::FromThisDate,
                target_date: d("2024-03-10"),
                draft: daily_draft("new routine", "2024-03-10"),
            },
        )
        .await
        .unwrap();
    assert!(matches!(outcome, TodoSplitOutcome::SplitFrom { .. }));

    assert_eq!(
        titles_on(&engine, owner, "2024-03-05").await,
        vec![("old routine".to_string(), true)]
    );
    assert_eq!(
        titles_on(&engine, owner, "2024-03-10").await,
        vec![("new routine".to_string(), true)]
    );
    assert_eq!(
        titles_on(&engine, owner, "2024-03-20").await,
        vec![("new routine".to_string(), true)]
    );
}

#[tokio::test]
async fn test_from_this_date_delete_truncates_without_replacement() {
    let (store, engine) = setup();
    let owner = Uuid::new_v4();
    let todo = engine
        .todos
        .create(owner, daily_draft("cancelled habit", "2024-03-01"), &[])
        .await
        .unwrap();

    let outcome = engine
        .todos
        .delete_scoped(
            owner,
            todo.id,
            ScopedDelete {
                action: ScopeAction::FromThisDate,
                target_date: d("2024-03-10"),
            },
        )
        .await
        .unwrap();
    assert!(matches!(outcome, TodoDeleteOutcome::TruncatedFrom));

    assert_eq!(titles_on(&engine, owner, "2024-03-09").await.len(), 1);
    assert!(titles_on(&engine, owner, "2024-03-10").await.is_empty());
    assert!(titles_on(&engine, owner, "2024-03-25").await.is_empty());

    // The stored record was truncated, not removed.
    let stored = store.get_todo(todo.id).await.unwrap();
    assert_eq!(stored.repeat.end_date(), Some(d("2024-03-09")));
}

#[tokio::test]
async fn test_all_scope_edits_in_place() {
    let (store, engine) = setup();
    let owner = Uuid::new_v4();
    let todo = engine
        .todos
        .create(owner, daily_draft("rename me", "2024-03-01"), &[])
        .await
        .unwrap();

    let outcome = engine
        .todos
        .update_scoped(
            owner,
            todo.id,
            ScopedTodoUpdate {
                action: ScopeAction::All,
                target_date: d("2024-03-10"),
                draft: daily_draft("renamed", "2024-03-01"),
            },
        )
        .await
        .unwrap();
    assert!(matches!(outcome, TodoSplitOutcome::Updated(_)));

    let stored = store.get_todo(todo.id).await.unwrap();
    assert_eq!(stored.title, "renamed");
    assert_eq!(store.todos_owned_by(owner).await.len(), 1);
}

#[tokio::test]
async fn test_truncation_skipped_when_series_already_ends_before_target() {
    let (store, engine) = setup();
    let owner = Uuid::new_v4();
    let mut draft = daily_draft("short series", "2024-03-01");
    draft.repeat = Recurrence::Daily {
        interval: 1,
        end_date: Some(d("2024-03-05")),
    };
    let todo = engine.todos.create(owner, draft, &[]).await.unwrap();

    engine
        .todos
        .update_scoped(
            owner,
            todo.id,
            ScopedTodoUpdate {
                action: ScopeAction::OnlyThisDate,
                target_date: d("2024-03-08"),
                draft: one_off_draft("late one-off", "2024-03-08"),
            },
        )
        .await
        .unwrap();

    // The original end bound already excluded the target; it must be intact.
    let stored = store.get_todo(todo.id).await.unwrap();
    assert_eq!(stored.repeat.end_date(), Some(d("2024-03-05")));
}

#[tokio::test]
async fn test_foreign_owner_gets_not_found() {
    let (_store, engine) = setup();
    let owner = Uuid::new_v4();
    let todo = engine
        .todos
        .create(owner, daily_draft("private", "2024-03-01"), &[])
        .await
        .unwrap();

    let err = engine
        .todos
        .delete_scoped(
            Uuid::new_v4(),
            todo.id,
            ScopedDelete {
                action: ScopeAction::All,
                target_date: d("2024-03-01"),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_invalid_draft_is_rejected_before_any_write() {
    let (store, engine) = setup();
    let owner = Uuid::new_v4();
    let todo = engine
        .todos
        .create(owner, daily_draft("steady", "2024-03-01"), &[])
        .await
        .unwrap();

    let mut bad = daily_draft("", "2024-03-01");
    bad.title = "".to_string();
    let err = engine
        .todos
        .update_scoped(
            owner,
            todo.id,
            ScopedTodoUpdate {
                action: ScopeAction::OnlyThisDate,
                target_date: d("2024-03-10"),
                draft: bad,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    // No truncation or fork happened.
    let stored = store.get_todo(todo.id).await.unwrap();
    assert_eq!(stored.repeat.end_date(), None);
    assert_eq!(store.todos_owned_by(owner).await.len(), 1);
}

#[tokio::test]
async fn test_create_fans_out_to_project_members() {
    let (store, engine) = setup();
    let owner = Uuid::new_v4();
    let member = Uuid::new_v4();
    let project = Uuid::new_v4();

    let mut draft = one_off_draft("shared task", "2024-03-01");
    draft.project = Some(project);
    engine
        .todos
        .create(owner, draft, &[owner, member])
        .await
        .unwrap();

    assert_eq!(store.todos_owned_by(owner).await.len(), 1);
    let member_todos = store.todos_owned_by(member).await;
    assert_eq!(member_todos.len(), 1);
    assert_eq!(member_todos[0].title, "shared task");
    assert_eq!(member_todos[0].project, Some(project));
}

#[tokio::test]
async fn test_schedule_only_this_date_delete_forks_continuation() {
    let (store, engine) = setup();
    let owner = Uuid::new_v4();

    // Weekly Wednesday 09:00-10:30 starting 2024-03-06.
    let sched = engine
        .schedules
        .create(
            owner,
            ScheduleDraft {
                title: "weekly sync".to_string(),
                project: None,
                category: Uuid::new_v4(),
                start_at: "2024-03-06T09:00:00Z".parse().unwrap(),
                end_at: "2024-03-06T10:30:00Z".parse().unwrap(),
                repeat: Recurrence::Weekly {
                    week_days: vec![3],
                    end_date: None,
                },
            },
        )
        .await
        .unwrap();

    let outcome = engine
        .schedules
        .delete_scoped(
            owner,
            sched.id,
            ScopedDelete {
                action: ScopeAction::OnlyThisDate,
                target_date: d("2024-03-13"),
            },
        )
        .await
        .unwrap();

    let continuation = match outcome {
        ScheduleDeleteOutcome::DetachedOne { continuation } => continuation,
        other => panic!("expected DetachedOne, got {other:?}"),
    };
    // Next Wednesday, same time-of-day and duration.
    assert_eq!(
        continuation.start_at,
        "2024-03-20T09:00:00Z".parse::<chrono::DateTime<Utc>>().unwrap()
    );
    assert_eq!((continuation.end_at - continuation.start_at).num_minutes(), 90);

    let stored = store.get_schedule(sched.id).await.unwrap();
    assert_eq!(stored.repeat.end_date(), Some(d("2024-03-12")));
}

#[tokio::test]
async fn test_schedule_window_list_after_split() {
    let (_store, engine) = setup();
    let owner = Uuid::new_v4();
    let sched = engine
        .schedules
        .create(
            owner,
            ScheduleDraft {
                title: "daily focus".to_string(),
                project: None,
                category: Uuid::new_v4(),
                start_at: "2024-03-01T08:00:00Z".parse().unwrap(),
                end_at: "2024-03-01T09:00:00Z".parse().unwrap(),
                repeat: Recurrence::Daily {
                    interval: 1,
                    end_date: None,
                },
            },
        )
        .await
        .unwrap();

    let outcome = engine
        .schedules
        .update_scoped(
            owner,
            sched.id,
            ScopedScheduleUpdate {
                action: ScopeAction::OnlyThisDate,
                target_date: d("2024-03-10"),
                draft: ScheduleDraft {
                    title: "focus (late start)".to_string(),
                    project: None,
                    category: sched.category,
                    start_at: "2024-03-10T10:00:00Z".parse().unwrap(),
                    end_at: "2024-03-10T11:00:00Z".parse().unwrap(),
                    repeat: Recurrence::Daily {
                        interval: 1,
                        end_date: None,
                    },
                },
            },
        )
        .await
        .unwrap();
    assert!(matches!(outcome, ScheduleSplitOutcome::SplitOne { .. }));

    let window = cadence_core::DayWindow::new(d("2024-03-10"), d("2024-03-10")).unwrap();
    let instances = engine.schedules.list_window(owner, window, None).await.unwrap();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].schedule.title, "focus (late start)");
    // The detached one-off lost its recurrence.
    assert_eq!(instances[0].schedule.repeat, Recurrence::None);
}
