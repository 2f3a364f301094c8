//! In-memory repository implementations.
//!
//! Backs engine and jobs tests with the same trait surface as the Postgres
//! repositories, so the split engine, completion tracker, and calculators can
//! be exercised without a database. Predicates mirror the SQL in the Pg
//! implementations; the two must stay in lockstep.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use cadence_core::{
    day_end, BonusScoreRecord, BonusScoreRepository, BusynessScoreRecord,
    BusynessScoreRepository, CompletionMark, CompletionRepository, DayWindow, Error, Result,
    Schedule, ScheduleRepository, Todo, TodoRepository, UserDirectory,
};

#[derive(Default)]
struct State {
    todos: HashMap<Uuid, Todo>,
    schedules: HashMap<Uuid, Schedule>,
    marks: HashMap<(Uuid, Uuid, NaiveDate), CompletionMark>,
    busyness: HashMap<(Uuid, NaiveDate), BusynessScoreRecord>,
    bonus: HashMap<(Uuid, NaiveDate), BonusScoreRecord>,
    users: Vec<Uuid>,
}

fn project_matches(project: Option<Uuid>, filter: Option<Uuid>) -> bool {
    match filter {
        Some(wanted) => project == Some(wanted),
        None => true,
    }
}

fn by_created_at(todos: &mut Vec<Todo>) {
    todos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

/// Shared in-memory store implementing every cadence repository trait.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user id for the directory.
    pub async fn put_user(&self, id: Uuid) {
        self.state.lock().await.users.push(id);
    }

    /// Seed a todo directly, bypassing validation.
    pub async fn put_todo(&self, todo: Todo) {
        self.state.lock().await.todos.insert(todo.id, todo);
    }

    /// Seed a schedule directly, bypassing validation.
    pub async fn put_schedule(&self, schedule: Schedule) {
        self.state.lock().await.schedules.insert(schedule.id, schedule);
    }

    /// Current state of a todo, if present.
    pub async fn get_todo(&self, id: Uuid) -> Option<Todo> {
        self.state.lock().await.todos.get(&id).cloned()
    }

    /// Current state of a schedule, if present.
    pub async fn get_schedule(&self, id: Uuid) -> Option<Schedule> {
        self.state.lock().await.schedules.get(&id).cloned()
    }

    /// Every todo belonging to `owner`, in creation order.
    pub async fn todos_owned_by(&self, owner: Uuid) -> Vec<Todo> {
        let state = self.state.lock().await;
        let mut todos: Vec<Todo> = state
            .todos
            .values()
            .filter(|t| t.owner == owner)
            .cloned()
            .collect();
        by_created_at(&mut todos);
        todos
    }

    /// Every schedule belonging to `owner`, ordered by start.
    pub async fn schedules_owned_by(&self, owner: Uuid) -> Vec<Schedule> {
        let state = self.state.lock().await;
        let mut schedules: Vec<Schedule> = state
            .schedules
            .values()
            .filter(|s| s.owner == owner)
            .cloned()
            .collect();
        schedules.sort_by(|a, b| a.start_at.cmp(&b.start_at).then(a.id.cmp(&b.id)));
        schedules
    }

    /// Total number of stored completion marks.
    pub async fn mark_count(&self) -> usize {
        self.state.lock().await.marks.len()
    }
}

#[async_trait]
impl TodoRepository for MemoryStore {
    async fn insert(&self, todo: &Todo) -> Result<()> {
        self.state.lock().await.todos.insert(todo.id, todo.clone());
        Ok(())
    }

    async fn insert_bulk(&self, todos: &[Todo]) -> Result<()> {
        let mut state = self.state.lock().await;
        for todo in todos {
            state.todos.insert(todo.id, todo.clone());
        }
        Ok(())
    }

    async fn fetch_owned(&self, id: Uuid, owner: Uuid) -> Result<Todo> {
        self.state
            .lock()
            .await
            .todos
            .get(&id)
            .filter(|t| t.owner == owner)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("todo {id}")))
    }

    async fn fetch_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Todo>> {
        let state = self.state.lock().await;
        let mut todos: Vec<Todo> = ids
            .iter()
            .filter_map(|id| state.todos.get(id).cloned())
            .collect();
        by_created_at(&mut todos);
        Ok(todos)
    }

    async fn update(&self, todo: &Todo) -> Result<()> {
        self.state.lock().await.todos.insert(todo.id, todo.clone());
        Ok(())
    }

    async fn set_repeat_end(&self, id: Uuid, end_date: Option<NaiveDate>) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(todo) = state.todos.get_mut(&id) {
            todo.repeat = todo.repeat.with_end_date(end_date);
            todo.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_completed(&self, id: Uuid, completed: bool) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(todo) = state.todos.get_mut(&id) {
            todo.completed = completed;
            todo.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.state.lock().await.todos.remove(&id);
        Ok(())
    }

    async fn list_one_off_due(
        &self,
        owner: Uuid,
        project: Option<Uuid>,
        day: NaiveDate,
    ) -> Result<Vec<Todo>> {
        let state = self.state.lock().await;
        let mut todos: Vec<Todo> = state
            .todos
            .values()
            .filter(|t| {
                t.owner == owner
                    && project_matches(t.project, project)
                    && !t.repeat.is_recurring()
                    && cadence_core::one_off_todo_due_on(t, day)
            })
            .cloned()
            .collect();
        by_created_at(&mut todos);
        Ok(todos)
    }

    async fn list_one_off_open_in_window(
        &self,
        owner: Uuid,
        window: DayWindow,
    ) -> Result<Vec<Todo>> {
        let state = self.state.lock().await;
        let mut todos: Vec<Todo> = state
            .todos
            .values()
            .filter(|t| {
                t.owner == owner
                    && !t.completed
                    && !t.repeat.is_recurring()
                    && (t.date.is_some_and(|d| window.contains(d))
                        || t.deadline.is_some_and(|d| window.contains(d)))
            })
            .cloned()
            .collect();
        by_created_at(&mut todos);
        Ok(todos)
    }

    async fn list_one_off_completed_on(&self, owner: Uuid, day: NaiveDate) -> Result<Vec<Todo>> {
        let state = self.state.lock().await;
        let mut todos: Vec<Todo> = state
            .todos
            .values()
            .filter(|t| {
                t.owner == owner
                    && t.completed
                    && !t.repeat.is_recurring()
                    && cadence_core::one_off_todo_due_on(t, day)
            })
            .cloned()
            .collect();
        by_created_at(&mut todos);
        Ok(todos)
    }

    async fn list_recurring_reaching(
        &self,
        owner: Uuid,
        project: Option<Uuid>,
        window: DayWindow,
    ) -> Result<Vec<Todo>> {
        let state = self.state.lock().await;
        let mut todos: Vec<Todo> = state
            .todos
            .values()
            .filter(|t| {
                t.owner == owner
                    && project_matches(t.project, project)
                    && t.repeat.is_recurring()
                    && t.date.is_some_and(|d| d <= window.end)
                    && t.repeat.end_date().map_or(true, |end| end >= window.start)
            })
            .cloned()
            .collect();
        by_created_at(&mut todos);
        Ok(todos)
    }
}

#[async_trait]
impl ScheduleRepository for MemoryStore {
    async fn insert(&self, schedule: &Schedule) -> Result<()> {
        self.state
            .lock()
            .await
            .schedules
            .insert(schedule.id, schedule.clone());
        Ok(())
    }

    async fn fetch_owned(&self, id: Uuid, owner: Uuid) -> Result<Schedule> {
        self.state
            .lock()
            .await
            .schedules
            .get(&id)
            .filter(|s| s.owner == owner)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("schedule {id}")))
    }

    async fn update(&self, schedule: &Schedule) -> Result<()> {
        self.state
            .lock()
            .await
            .schedules
            .insert(schedule.id, schedule.clone());
        Ok(())
    }

    async fn set_repeat_end(&self, id: Uuid, end_date: Option<NaiveDate>) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(schedule) = state.schedules.get_mut(&id) {
            schedule.repeat = schedule.repeat.with_end_date(end_date);
            schedule.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.state.lock().await.schedules.remove(&id);
        Ok(())
    }

    async fn list_one_off_overlapping(
        &self,
        owner: Uuid,
        project: Option<Uuid>,
        window: DayWindow,
    ) -> Result<Vec<Schedule>> {
        let state = self.state.lock().await;
        let mut schedules: Vec<Schedule> = state
            .schedules
            .values()
            .filter(|s| {
                s.owner == owner
                    && project_matches(s.project, project)
                    && !s.repeat.is_recurring()
                    && cadence_core::one_off_schedule_overlaps(s, window)
            })
            .cloned()
            .collect();
        schedules.sort_by(|a, b| a.start_at.cmp(&b.start_at).then(a.id.cmp(&b.id)));
        Ok(schedules)
    }

    async fn list_recurring_reaching(
        &self,
        owner: Uuid,
        project: Option<Uuid>,
        window: DayWindow,
    ) -> Result<Vec<Schedule>> {
        let state = self.state.lock().await;
        let mut schedules: Vec<Schedule> = state
            .schedules
            .values()
            .filter(|s| {
                s.owner == owner
                    && project_matches(s.project, project)
                    && s.repeat.is_recurring()
                    && s.start_at < day_end(window.end)
                    && s.repeat.end_date().map_or(true, |end| end >= window.start)
            })
            .cloned()
            .collect();
        schedules.sort_by(|a, b| a.start_at.cmp(&b.start_at).then(a.id.cmp(&b.id)));
        Ok(schedules)
    }
}

#[async_trait]
impl CompletionRepository for MemoryStore {
    async fn mark(&self, todo: Uuid, owner: Uuid, date: NaiveDate) -> Result<()> {
        let mut state = self.state.lock().await;
        state.marks.entry((todo, owner, date)).or_insert(CompletionMark {
            todo,
            owner,
            date,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn unmark(&self, todo: Uuid, owner: Uuid, date: NaiveDate) -> Result<()> {
        self.state.lock().await.marks.remove(&(todo, owner, date));
        Ok(())
    }

    async fn exists(&self, todo: Uuid, owner: Uuid, date: NaiveDate) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .await
            .marks
            .contains_key(&(todo, owner, date)))
    }

    async fn list_for_day(&self, owner: Uuid, date: NaiveDate) -> Result<Vec<CompletionMark>> {
        let state = self.state.lock().await;
        let mut marks: Vec<CompletionMark> = state
            .marks
            .values()
            .filter(|m| m.owner == owner && m.date == date)
            .cloned()
            .collect();
        marks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.todo.cmp(&b.todo)));
        Ok(marks)
    }
}

#[async_trait]
impl BusynessScoreRepository for MemoryStore {
    async fn upsert(&self, record: &BusynessScoreRecord) -> Result<()> {
        self.state
            .lock()
            .await
            .busyness
            .insert((record.user, record.date), record.clone());
        Ok(())
    }

    async fn fetch(&self, user: Uuid, date: NaiveDate) -> Result<Option<BusynessScoreRecord>> {
        Ok(self.state.lock().await.busyness.get(&(user, date)).cloned())
    }
}

#[async_trait]
impl BonusScoreRepository for MemoryStore {
    async fn fetch(&self, user: Uuid, week_start: NaiveDate) -> Result<Option<BonusScoreRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .bonus
            .get(&(user, week_start))
            .cloned())
    }

    async fn upsert(&self, record: &BonusScoreRecord) -> Result<()> {
        self.state
            .lock()
            .await
            .bonus
            .insert((record.user, record.week_start), record.clone());
        Ok(())
    }

    async fn list_for_week(&self, week_start: NaiveDate) -> Result<Vec<BonusScoreRecord>> {
        let state = self.state.lock().await;
        let mut records: Vec<BonusScoreRecord> = state
            .bonus
            .values()
            .filter(|r| r.week_start == week_start)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.total_bonus.cmp(&a.total_bonus).then(a.user.cmp(&b.user)));
        Ok(records)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn list_user_ids(&self) -> Result<Vec<Uuid>> {
        Ok(self.state.lock().await.users.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::Recurrence;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn todo(owner: Uuid, date: Option<NaiveDate>, deadline: Option<NaiveDate>) -> Todo {
        let now = Utc::now();
        Todo {
            id: Uuid::new_v4(),
            owner,
            project: None,
            category: Uuid::new_v4(),
            title: "t".to_string(),
            date,
            deadline,
            difficulty: None,
            completed: false,
            repeat: Recurrence::None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_mark_is_idempotent() {
        let store = MemoryStore::new();
        let (todo_id, owner) = (Uuid::new_v4(), Uuid::new_v4());
        let day = d("2024-03-04");

        CompletionRepository::mark(&store, todo_id, owner, day)
            .await
            .unwrap();
        CompletionRepository::mark(&store, todo_id, owner, day)
            .await
            .unwrap();
        assert_eq!(store.mark_count().await, 1);
        assert!(CompletionRepository::exists(&store, todo_id, owner, day)
            .await
            .unwrap());

        CompletionRepository::unmark(&store, todo_id, owner, day)
            .await
            .unwrap();
        assert_eq!(store.mark_count().await, 0);
    }

    #[tokio::test]
    async fn test_one_off_due_query_matches_sql_predicates() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let day = d("2024-03-04");

        store.put_todo(todo(owner, Some(day), None)).await;
        store
            .put_todo(todo(owner, None, Some(d("2024-03-10"))))
            .await;
        // Deadline already passed: excluded.
        store
            .put_todo(todo(owner, None, Some(d("2024-03-01"))))
            .await;
        // Other owner: excluded.
        store.put_todo(todo(Uuid::new_v4(), Some(day), None)).await;

        let due = TodoRepository::list_one_off_due(&store, owner, None, day)
            .await
            .unwrap();
        assert_eq!(due.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_owned_rejects_foreign_owner() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let t = todo(owner, Some(d("2024-03-04")), None);
        let id = t.id;
        store.put_todo(t).await;

        assert!(TodoRepository::fetch_owned(&store, id, owner).await.is_ok());
        let err = TodoRepository::fetch_owned(&store, id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_set_repeat_end_rewrites_only_the_bound() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let mut t = todo(owner, Some(d("2024-03-01")), None);
        t.repeat = Recurrence::Daily {
            interval: 2,
            end_date: None,
        };
        let id = t.id;
        store.put_todo(t).await;

        TodoRepository::set_repeat_end(&store, id, Some(d("2024-03-09")))
            .await
            .unwrap();
        let stored = store.get_todo(id).await.unwrap();
        assert_eq!(stored.repeat.end_date(), Some(d("2024-03-09")));
        assert!(matches!(stored.repeat, Recurrence::Daily { interval: 2, .. }));
    }
}
