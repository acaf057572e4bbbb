//! Тесты машины состояний треда комментариев на фейковом API.
//!
//! Фейк умеет придерживать запросы на семафоре, чтобы честно проверять
//! перемежение фонового опроса и пользовательских операций.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Semaphore;

use feed_client::thread::{
    CommentApi, CommentThread, DeleteOutcome, SubmitOutcome, ThreadPhase, Viewer,
};
use feed_client::{Comment, CommentList, FeedClientError, FeedClientResult, Pagination};

const POST_ID: &str = "p1";
const VIEWER_ID: i64 = 10;

struct FakeState {
    comments: Vec<Comment>,
    next_id: i64,
    fail_fetch_times: u32,
    fail_create: Option<String>,
    fail_delete: Option<String>,
    fetch_calls: u32,
    create_calls: u32,
}

struct FakeApi {
    state: Mutex<FakeState>,
    fetch_gate: Option<Arc<Semaphore>>,
    create_gate: Option<Arc<Semaphore>>,
}

impl FakeApi {
    fn with_comments(count: i64) -> Arc<Self> {
        let comments = (1..=count).map(|id| server_comment(id)).collect();
        Arc::new(Self {
            state: Mutex::new(FakeState {
                comments,
                next_id: count + 1,
                fail_fetch_times: 0,
                fail_create: None,
                fail_delete: None,
                fetch_calls: 0,
                create_calls: 0,
            }),
            fetch_gate: None,
            create_gate: None,
        })
    }

    fn gate_fetch(self: Arc<Self>) -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let api = Arc::new(Self {
            state: Mutex::new(self.take_state()),
            fetch_gate: Some(gate.clone()),
            create_gate: None,
        });
        (api, gate)
    }

    fn gate_create(self: Arc<Self>) -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let api = Arc::new(Self {
            state: Mutex::new(self.take_state()),
            fetch_gate: None,
            create_gate: Some(gate.clone()),
        });
        (api, gate)
    }

    fn take_state(&self) -> FakeState {
        let mut state = self.state.lock().expect("fake state mutex poisoned");
        FakeState {
            comments: std::mem::take(&mut state.comments),
            next_id: state.next_id,
            fail_fetch_times: state.fail_fetch_times,
            fail_create: state.fail_create.take(),
            fail_delete: state.fail_delete.take(),
            fetch_calls: state.fetch_calls,
            create_calls: state.create_calls,
        }
    }

    fn fail_next_fetches(&self, times: u32) {
        self.lock(|s| s.fail_fetch_times = times);
    }

    fn fail_create_with(&self, message: &str) {
        let message = message.to_string();
        self.lock(move |s| s.fail_create = Some(message));
    }

    fn fail_delete_with(&self, message: &str) {
        let message = message.to_string();
        self.lock(move |s| s.fail_delete = Some(message));
    }

    fn fetch_calls(&self) -> u32 {
        self.lock(|s| s.fetch_calls)
    }

    fn create_calls(&self) -> u32 {
        self.lock(|s| s.create_calls)
    }

    fn server_ids(&self) -> Vec<i64> {
        self.lock(|s| s.comments.iter().map(|c| c.id).collect())
    }

    fn lock<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        let mut state = self.state.lock().expect("fake state mutex poisoned");
        f(&mut state)
    }
}

#[async_trait]
impl CommentApi for FakeApi {
    async fn fetch_page(
        &self,
        post_id: &str,
        page: u32,
        limit: u32,
    ) -> FeedClientResult<CommentList> {
        assert_eq!(post_id, POST_ID);
        if let Some(gate) = &self.fetch_gate {
            gate.acquire().await.expect("fetch gate closed").forget();
        }
        self.lock(|s| {
            s.fetch_calls += 1;
            if s.fail_fetch_times > 0 {
                s.fail_fetch_times -= 1;
                return Err(FeedClientError::InvalidRequest("network down".to_string()));
            }
            let mut sorted = s.comments.clone();
            sorted.sort_by(|a, b| b.id.cmp(&a.id));
            let total = sorted.len() as i64;
            let offset = ((page - 1) * limit) as usize;
            let comments: Vec<Comment> = sorted.into_iter().skip(offset).take(limit as usize).collect();
            Ok(CommentList {
                comments,
                pagination: Pagination {
                    page,
                    limit,
                    total,
                    total_pages: (total + limit as i64 - 1) / limit as i64,
                    has_more: (page as i64) * (limit as i64) < total,
                },
            })
        })
    }

    async fn create(&self, post_id: &str, text: &str) -> FeedClientResult<Comment> {
        assert_eq!(post_id, POST_ID);
        if let Some(gate) = &self.create_gate {
            gate.acquire().await.expect("create gate closed").forget();
        }
        self.lock(|s| {
            s.create_calls += 1;
            if let Some(message) = s.fail_create.clone() {
                return Err(FeedClientError::InvalidRequest(message));
            }
            let mut comment = server_comment(s.next_id);
            s.next_id += 1;
            comment.text = text.to_string();
            comment.user_id = VIEWER_ID;
            comment.username = "alice".to_string();
            comment.is_own = true;
            s.comments.push(comment.clone());
            Ok(comment)
        })
    }

    async fn delete(&self, comment_id: i64) -> FeedClientResult<()> {
        self.lock(|s| {
            if let Some(message) = s.fail_delete.clone() {
                return Err(FeedClientError::InvalidRequest(message));
            }
            let before = s.comments.len();
            s.comments.retain(|c| c.id != comment_id);
            if s.comments.len() == before {
                return Err(FeedClientError::NotFound);
            }
            Ok(())
        })
    }
}

fn server_comment(id: i64) -> Comment {
    let now = Utc::now();
    Comment {
        id,
        post_id: POST_ID.to_string(),
        user_id: 100 + id,
        username: format!("user{id}"),
        text: format!("comment {id}"),
        created_at: now,
        updated_at: now,
        is_own: false,
    }
}

fn thread_over(api: Arc<FakeApi>, limit: u32) -> Arc<CommentThread<FakeApi>> {
    Arc::new(CommentThread::new(
        api,
        POST_ID,
        limit,
        Viewer {
            id: VIEWER_ID,
            username: "alice".to_string(),
        },
    ))
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("condition was not reached in time");
}

fn visible_ids(thread: &CommentThread<FakeApi>) -> Vec<i64> {
    thread.entries().iter().map(|e| e.comment.id).collect()
}

#[tokio::test]
async fn open_loads_first_page_newest_first() {
    let api = FakeApi::with_comments(5);
    let thread = thread_over(api, 2);

    assert_eq!(thread.phase(), ThreadPhase::Closed);
    thread.open().await;

    assert_eq!(thread.phase(), ThreadPhase::Loaded);
    assert_eq!(visible_ids(&thread), vec![5, 4]);
    assert!(thread.has_more());
    assert!(thread.take_notice().is_none());
}

#[tokio::test]
async fn open_failure_leaves_empty_loaded_thread_with_notice() {
    let api = FakeApi::with_comments(3);
    api.fail_next_fetches(1);
    let thread = thread_over(api, 20);

    thread.open().await;

    assert_eq!(thread.phase(), ThreadPhase::Loaded);
    assert!(thread.entries().is_empty());
    assert_eq!(thread.take_notice().as_deref(), Some("network down"));

    // следующий тик загружает список
    thread.tick().await;
    assert_eq!(visible_ids(&thread), vec![3, 2, 1]);
}

#[tokio::test]
async fn submit_shows_pending_entry_then_confirms_it() {
    let (api, gate) = FakeApi::with_comments(2).gate_create();
    let thread = thread_over(api.clone(), 20);
    thread.open().await;

    let task = tokio::spawn({
        let thread = thread.clone();
        async move { thread.submit("  hello there  ").await }
    });

    wait_until(|| thread.entries().first().is_some_and(|e| e.is_pending())).await;

    let entries = thread.entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].comment.text, "hello there");
    assert_eq!(entries[0].comment.username, "alice");
    assert!(entries[0].comment.is_own);
    assert!(entries[0].comment.id < 0);

    gate.add_permits(1);
    let outcome = task.await.expect("submit task panicked");

    let SubmitOutcome::Posted(posted) = outcome else {
        panic!("expected Posted outcome");
    };
    assert_eq!(posted.id, 3);
    assert_eq!(posted.text, "hello there");

    let entries = thread.entries();
    assert_eq!(entries[0].comment.id, 3);
    assert!(!entries[0].is_pending());
}

#[tokio::test]
async fn submit_rejection_removes_pending_entry_and_returns_text() {
    let api = FakeApi::with_comments(2);
    api.fail_create_with("post not found");
    let thread = thread_over(api, 20);
    thread.open().await;

    let outcome = thread.submit("valid text").await;

    let SubmitOutcome::Rejected {
        message,
        restored_text,
    } = outcome
    else {
        panic!("expected Rejected outcome");
    };
    assert_eq!(message, "post not found");
    assert_eq!(restored_text, "valid text");
    assert_eq!(visible_ids(&thread), vec![2, 1]);
}

#[tokio::test]
async fn submit_rejects_invalid_text_without_touching_list_or_api() {
    let api = FakeApi::with_comments(1);
    let thread = thread_over(api.clone(), 20);
    thread.open().await;

    let outcome = thread.submit("   ").await;
    assert!(matches!(outcome, SubmitOutcome::Rejected { .. }));

    let outcome = thread.submit(&"x".repeat(501)).await;
    assert!(matches!(outcome, SubmitOutcome::Rejected { .. }));

    assert_eq!(visible_ids(&thread), vec![1]);
    assert_eq!(api.create_calls(), 0);
}

#[tokio::test]
async fn submit_counts_characters_not_bytes() {
    let api = FakeApi::with_comments(0);
    let thread = thread_over(api, 20);
    thread.open().await;

    // 500 кириллических символов валидны, хотя байтов вдвое больше
    let outcome = thread.submit(&"ё".repeat(500)).await;
    assert!(matches!(outcome, SubmitOutcome::Posted(_)));
}

#[tokio::test]
async fn tick_replaces_server_truth_but_keeps_pending_entry() {
    let (api, gate) = FakeApi::with_comments(2).gate_create();
    let thread = thread_over(api.clone(), 20);
    thread.open().await;

    let task = tokio::spawn({
        let thread = thread.clone();
        async move { thread.submit("still pending").await }
    });
    wait_until(|| thread.entries().first().is_some_and(|e| e.is_pending())).await;

    // опрос во время подвисшей отправки не сбрасывает Pending-запись
    thread.tick().await;

    let entries = thread.entries();
    assert_eq!(entries.len(), 3);
    assert!(entries[0].is_pending());
    assert_eq!(entries[0].comment.text, "still pending");
    assert_eq!(entries[1].comment.id, 2);

    gate.add_permits(1);
    let outcome = task.await.expect("submit task panicked");
    assert!(matches!(outcome, SubmitOutcome::Posted(_)));
    assert!(thread.entries().iter().all(|e| !e.is_pending()));
}

#[tokio::test]
async fn tick_error_is_silent_and_keeps_current_list() {
    let api = FakeApi::with_comments(3);
    let thread = thread_over(api.clone(), 20);
    thread.open().await;

    api.fail_next_fetches(1);
    thread.tick().await;

    assert_eq!(visible_ids(&thread), vec![3, 2, 1]);
    assert!(thread.take_notice().is_none());
}

#[tokio::test]
async fn load_more_appends_older_pages_until_exhausted() {
    let api = FakeApi::with_comments(5);
    let thread = thread_over(api.clone(), 2);
    thread.open().await;
    assert_eq!(visible_ids(&thread), vec![5, 4]);

    thread.load_more().await;
    assert_eq!(visible_ids(&thread), vec![5, 4, 3, 2]);
    assert!(thread.has_more());

    thread.load_more().await;
    assert_eq!(visible_ids(&thread), vec![5, 4, 3, 2, 1]);
    assert!(!thread.has_more());

    let calls = api.fetch_calls();
    thread.load_more().await;
    assert_eq!(api.fetch_calls(), calls);
}

#[tokio::test]
async fn delete_removes_entry_and_reconciles_with_server() {
    let api = FakeApi::with_comments(3);
    let thread = thread_over(api.clone(), 20);
    thread.open().await;

    let calls = api.fetch_calls();
    let outcome = thread.delete(2).await;

    assert!(matches!(outcome, DeleteOutcome::Deleted));
    assert_eq!(visible_ids(&thread), vec![3, 1]);
    assert_eq!(api.server_ids(), vec![1, 3]);
    // удаление завершается явной сверкой первой страницы
    assert_eq!(api.fetch_calls(), calls + 1);
}

#[tokio::test]
async fn delete_failure_restores_list_snapshot() {
    let api = FakeApi::with_comments(3);
    api.fail_delete_with("you can only delete your own comments");
    let thread = thread_over(api, 20);
    thread.open().await;

    let outcome = thread.delete(2).await;

    let DeleteOutcome::Failed { message } = outcome else {
        panic!("expected Failed outcome");
    };
    assert_eq!(message, "you can only delete your own comments");
    assert_eq!(visible_ids(&thread), vec![3, 2, 1]);
}

#[tokio::test]
async fn delete_of_missing_comment_reports_not_found() {
    let api = FakeApi::with_comments(2);
    let thread = thread_over(api, 20);
    thread.open().await;

    let outcome = thread.delete(99).await;

    let DeleteOutcome::Failed { message } = outcome else {
        panic!("expected Failed outcome");
    };
    assert_eq!(message, "not found");
    assert_eq!(visible_ids(&thread), vec![2, 1]);
}

#[tokio::test]
async fn close_resets_state_and_discards_in_flight_response() {
    let (api, gate) = FakeApi::with_comments(4).gate_fetch();
    let thread = thread_over(api, 20);

    let task = tokio::spawn({
        let thread = thread.clone();
        async move { thread.open().await }
    });
    wait_until(|| thread.phase() == ThreadPhase::Loading).await;

    thread.close();
    gate.add_permits(1);
    task.await.expect("open task panicked");

    // ответ устаревшей эпохи отброшен
    assert_eq!(thread.phase(), ThreadPhase::Closed);
    assert!(thread.entries().is_empty());
    assert!(!thread.has_more());
    assert!(thread.take_notice().is_none());
}

#[tokio::test]
async fn reopen_after_close_starts_from_scratch() {
    let api = FakeApi::with_comments(3);
    let thread = thread_over(api, 2);

    thread.open().await;
    thread.load_more().await;
    assert_eq!(thread.entries().len(), 3);

    thread.close();
    thread.open().await;

    assert_eq!(visible_ids(&thread), vec![3, 2]);
    assert!(thread.has_more());
}
