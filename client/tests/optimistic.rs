//! End-to-end tests for the optimistic update protocol, driven through a
//! scriptable mock API.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tasklist_client::{CacheConfig, ClientError, TodoApi, TodoClient};
use tasklist_store::{Clock, Todo, UpdateTodo};

/// Server-side double: an in-memory todo collection plus failure switches
/// and call counters.
#[derive(Default)]
struct MockApi {
    todos: Mutex<Vec<Todo>>,
    next_id: AtomicU64,
    fail_mutations: AtomicBool,
    hold_mutations: AtomicBool,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
}

impl MockApi {
    fn seeded(titles: &[&str]) -> Self {
        let api = Self::default();
        {
            let mut todos = api.todos.lock().unwrap();
            for title in titles {
                let n = api.next_id.fetch_add(1, Ordering::Relaxed);
                todos.push(Todo::new(format!("todo_{n}"), (*title).to_string(), Utc::now()));
            }
        }
        api
    }

    fn fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::Relaxed);
    }

    fn hold_mutations(&self, hold: bool) {
        self.hold_mutations.store(hold, Ordering::Relaxed);
    }

    // Every mutation passes through here: hangs while held, then either
    // proceeds or fails as scripted.
    async fn mutation_checkpoint(&self) -> Result<(), ClientError> {
        while self.hold_mutations.load(Ordering::Relaxed) {
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        if self.fail_mutations.load(Ordering::Relaxed) {
            Err(ClientError::Api {
                code: "INTERNAL_ERROR".to_string(),
                message: "scripted failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TodoApi for MockApi {
    async fn list(&self) -> Result<Vec<Todo>, ClientError> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.todos.lock().unwrap().clone())
    }

    async fn get(&self, id: &str) -> Result<Todo, ClientError> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        self.todos
            .lock()
            .unwrap()
            .iter()
            .find(|todo| todo.id == id)
            .cloned()
            .ok_or_else(|| ClientError::Api {
                code: "NOT_FOUND".to_string(),
                message: format!("Todo with id {id} not found"),
            })
    }

    async fn create(&self, title: &str) -> Result<Todo, ClientError> {
        self.mutation_checkpoint().await?;
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        let todo = Todo::new(format!("todo_{n}"), title.trim().to_string(), Utc::now());
        self.todos.lock().unwrap().push(todo.clone());
        Ok(todo)
    }

    async fn update(&self, id: &str, update: UpdateTodo) -> Result<Todo, ClientError> {
        self.mutation_checkpoint().await?;
        let mut todos = self.todos.lock().unwrap();
        let todo = todos
            .iter_mut()
            .find(|todo| todo.id == id)
            .ok_or_else(|| ClientError::Api {
                code: "NOT_FOUND".to_string(),
                message: format!("Todo with id {id} not found"),
            })?;
        if let Some(title) = update.title {
            todo.title = title;
        }
        if let Some(completed) = update.completed {
            todo.completed = completed;
        }
        todo.updated_at = Utc::now();
        Ok(todo.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.mutation_checkpoint().await?;
        let mut todos = self.todos.lock().unwrap();
        let before = todos.len();
        todos.retain(|todo| todo.id != id);
        if todos.len() == before {
            return Err(ClientError::Api {
                code: "NOT_FOUND".to_string(),
                message: format!("Todo with id {id} not found"),
            });
        }
        Ok(())
    }

    async fn clear_completed(&self) -> Result<usize, ClientError> {
        self.mutation_checkpoint().await?;
        let mut todos = self.todos.lock().unwrap();
        let before = todos.len();
        todos.retain(|todo| !todo.completed);
        Ok(before - todos.len())
    }
}

/// Clock advanced explicitly by the tests.
struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    fn new() -> Self {
        Self {
            now: Mutex::new(Utc::now()),
        }
    }

    fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

fn client_over(api: &Arc<MockApi>, clock: &Arc<ManualClock>) -> TodoClient {
    TodoClient::new(
        Arc::clone(api) as Arc<dyn TodoApi>,
        Arc::clone(clock) as Arc<dyn Clock>,
    )
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("condition not met within 1s");
}

#[tokio::test]
async fn failing_create_rolls_the_list_back_to_its_snapshot() {
    let api = Arc::new(MockApi::seeded(&["existing"]));
    let clock = Arc::new(ManualClock::new());
    let client = client_over(&api, &clock);

    let before = client.todos().await.expect("initial fetch");
    assert_eq!(before.len(), 1);

    api.fail_mutations(true);
    let err = client.create("doomed").await.expect_err("scripted failure");
    assert!(matches!(err, ClientError::Api { .. }));

    // The list view equals exactly its pre-action snapshot: no residual
    // temporary record.
    let after = client.todos().await.expect("cached read");
    assert_eq!(after, before);
}

#[tokio::test]
async fn successful_create_shows_a_provisional_record_then_reconciles() {
    let api = Arc::new(MockApi::seeded(&[]));
    let clock = Arc::new(ManualClock::new());
    let client = client_over(&api, &clock);

    client.todos().await.expect("initial fetch");
    let created = client.create("Buy milk").await.expect("create");
    assert!(created.id.starts_with("todo_"));

    // The cached list still carries the optimistic record (stale, served
    // immediately) until the background refetch reconciles the temp id.
    let optimistic = client.todos().await.expect("stale read");
    assert_eq!(optimistic.len(), 1);
    assert!(optimistic[0].id.starts_with("temp_"));

    // Once the refetch lands, the temp id is reconciled with the real one.
    let mut reconciled = client.todos().await.expect("read");
    for _ in 0..200 {
        if reconciled.first().is_some_and(|todo| todo.id == created.id) {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        reconciled = client.todos().await.expect("read");
    }
    assert_eq!(reconciled.len(), 1);
    assert_eq!(reconciled[0].id, created.id);
}

#[tokio::test]
async fn a_read_during_a_slow_create_keeps_the_optimistic_record() {
    let api = Arc::new(MockApi::seeded(&["existing"]));
    let clock = Arc::new(ManualClock::new());
    let client = Arc::new(client_over(&api, &clock));

    client.todos().await.expect("initial fetch");

    // Age the cached list past the freshness window, then start a create
    // whose network call hangs.
    clock.advance(Duration::minutes(6));
    api.hold_mutations(true);
    let pending = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.create("new item").await }
    });

    // Wait for the optimistic publish to become visible.
    let mut seen = client.todos().await.expect("read");
    for _ in 0..200 {
        if seen.len() == 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        seen = client.todos().await.expect("read");
    }
    assert_eq!(seen.len(), 2);

    // Give any misguided refresh time to land: the optimistic record must
    // stay visible for as long as the create is in flight.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let still = client.todos().await.expect("read during flight");
    assert_eq!(still.len(), 2);
    assert!(still.iter().any(|todo| todo.id.starts_with("temp_")));

    api.hold_mutations(false);
    pending.await.expect("join").expect("create");
}

#[tokio::test]
async fn fresh_reads_do_not_hit_the_network() {
    let api = Arc::new(MockApi::seeded(&["a"]));
    let clock = Arc::new(ManualClock::new());
    let client = client_over(&api, &clock);

    client.todos().await.expect("fetch");
    client.todos().await.expect("cached");
    client.todos().await.expect("cached");
    assert_eq!(api.list_calls.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn stale_reads_serve_immediately_and_refresh_in_the_background() {
    let api = Arc::new(MockApi::seeded(&["a"]));
    let clock = Arc::new(ManualClock::new());
    let client = client_over(&api, &clock);

    client.todos().await.expect("fetch");
    clock.advance(Duration::minutes(6));

    let served = client.todos().await.expect("stale read");
    assert_eq!(served.len(), 1);
    wait_until(|| api.list_calls.load(Ordering::Relaxed) >= 2).await;
}

#[tokio::test]
async fn entries_unused_past_retention_are_evicted() {
    let api = Arc::new(MockApi::seeded(&["a"]));
    let clock = Arc::new(ManualClock::new());
    let client = client_over(&api, &clock);

    client.todos().await.expect("fetch");
    clock.advance(Duration::minutes(16));
    client.evict_expired().await;

    client.todos().await.expect("refetch after eviction");
    assert!(api.list_calls.load(Ordering::Relaxed) >= 2);
}

#[tokio::test]
async fn retention_is_enforced_by_reads_without_an_explicit_sweep() {
    let api = Arc::new(MockApi::seeded(&["original title"]));
    let clock = Arc::new(ManualClock::new());
    let client = client_over(&api, &clock);

    client.todos().await.expect("fetch");

    // Server state changes behind the client's back.
    api.todos.lock().unwrap()[0].title = "renamed on the server".to_string();

    // Past the retention window the entry is gone, so the read refetches
    // instead of serving the expired value while refreshing.
    clock.advance(Duration::minutes(16));
    let list = client.todos().await.expect("refetch");
    assert_eq!(list[0].title, "renamed on the server");
}

#[tokio::test]
async fn failing_update_restores_list_and_detail_views() {
    let api = Arc::new(MockApi::seeded(&["keep me"]));
    let clock = Arc::new(ManualClock::new());
    let client = client_over(&api, &clock);

    let todos = client.todos().await.expect("fetch");
    let id = todos[0].id.clone();
    let detail_before = client.todo(&id).await.expect("detail fetch");

    api.fail_mutations(true);
    client
        .update(&id, UpdateTodo::completed(true))
        .await
        .expect_err("scripted failure");

    let list_after = client.todos().await.expect("cached list");
    assert!(!list_after[0].completed);
    let detail_after = client.todo(&id).await.expect("cached detail");
    assert_eq!(detail_after, detail_before);
}

#[tokio::test]
async fn successful_update_is_visible_immediately_in_both_views() {
    let api = Arc::new(MockApi::seeded(&["task"]));
    let clock = Arc::new(ManualClock::new());
    let client = client_over(&api, &clock);

    let todos = client.todos().await.expect("fetch");
    let id = todos[0].id.clone();
    client.todo(&id).await.expect("detail fetch");

    client
        .update(&id, UpdateTodo::completed(true))
        .await
        .expect("update");

    // Both cached views reflect the merge without waiting for a refetch.
    let list = client.todos().await.expect("list read");
    assert!(list[0].completed);
    let detail = client.todo(&id).await.expect("detail read");
    assert!(detail.completed);
}

#[tokio::test]
async fn successful_delete_drops_the_detail_key() {
    let api = Arc::new(MockApi::seeded(&["goner"]));
    let clock = Arc::new(ManualClock::new());
    let client = client_over(&api, &clock);

    let todos = client.todos().await.expect("fetch");
    let id = todos[0].id.clone();
    client.todo(&id).await.expect("detail fetch");
    let gets_before = api.get_calls.load(Ordering::Relaxed);

    client.delete(&id).await.expect("delete");

    // The list view no longer shows the record.
    assert!(client.todos().await.expect("list read").is_empty());

    // The detail key was dropped: the next read misses and asks the
    // server, which now answers NOT_FOUND.
    let err = client.todo(&id).await.expect_err("gone");
    assert!(matches!(err, ClientError::Api { code, .. } if code == "NOT_FOUND"));
    assert!(api.get_calls.load(Ordering::Relaxed) > gets_before);
}

#[tokio::test]
async fn failing_delete_restores_the_record() {
    let api = Arc::new(MockApi::seeded(&["survivor"]));
    let clock = Arc::new(ManualClock::new());
    let client = client_over(&api, &clock);

    let before = client.todos().await.expect("fetch");
    let id = before[0].id.clone();

    api.fail_mutations(true);
    client.delete(&id).await.expect_err("scripted failure");

    assert_eq!(client.todos().await.expect("cached list"), before);
}

#[tokio::test]
async fn clear_completed_applies_optimistically_and_reports_the_count() {
    let api = Arc::new(MockApi::seeded(&["pending", "done"]));
    {
        let mut todos = api.todos.lock().unwrap();
        todos[1].completed = true;
    }
    let clock = Arc::new(ManualClock::new());
    let client = client_over(&api, &clock);

    client.todos().await.expect("fetch");
    let removed = client.clear_completed().await.expect("sweep");
    assert_eq!(removed, 1);

    let list = client.todos().await.expect("list read");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].title, "pending");
}

#[tokio::test]
async fn custom_config_controls_the_freshness_window() {
    let api = Arc::new(MockApi::seeded(&["a"]));
    let clock = Arc::new(ManualClock::new());
    let client = TodoClient::with_config(
        Arc::clone(&api) as Arc<dyn TodoApi>,
        Arc::clone(&clock) as Arc<dyn Clock>,
        CacheConfig {
            freshness: Duration::seconds(30),
            retention: Duration::minutes(5),
        },
    );

    client.todos().await.expect("fetch");
    clock.advance(Duration::seconds(31));
    client.todos().await.expect("stale read");
    wait_until(|| api.list_calls.load(Ordering::Relaxed) >= 2).await;
}
