//! Клиентская машина состояний ленты комментариев одного поста.
//!
//! Держит видимый список как результат сверки двух источников: последняя
//! страница с сервера (авторитетная) и локальные оптимистичные записи,
//! ещё не подтверждённые сервером. Фоновый опрос (`tick`) молча заменяет
//! серверную часть, не теряя Pending-записи; закрытие треда сбрасывает
//! всё переходное состояние, а устаревшие ответы отбрасываются по эпохе.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::FeedClientResult;
use crate::models::{Comment, CommentList};

/// Интервал фонового опроса по умолчанию, секунды.
pub const DEFAULT_POLL_SECS: u64 = 5;
/// Размер страницы по умолчанию.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

const MAX_TEXT_CHARS: usize = 500;

#[async_trait]
/// Сетевой шов контроллера: то подмножество API, которое нужно треду.
pub trait CommentApi: Send + Sync {
    /// Страница комментариев поста.
    async fn fetch_page(
        &self,
        post_id: &str,
        page: u32,
        limit: u32,
    ) -> FeedClientResult<CommentList>;
    /// Создание комментария.
    async fn create(&self, post_id: &str, text: &str) -> FeedClientResult<Comment>;
    /// Удаление комментария.
    async fn delete(&self, comment_id: i64) -> FeedClientResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Фаза треда комментариев.
pub enum ThreadPhase {
    /// Тред закрыт, состояния нет.
    Closed,
    /// Первая загрузка после открытия.
    Loading,
    /// Список показан, фоновый опрос активен.
    Loaded,
    /// Догружается следующая страница.
    LoadingMore,
}

#[derive(Debug, Clone)]
/// Запись видимого списка: серверный комментарий или локальный Pending.
pub struct ThreadEntry {
    /// Комментарий (для Pending — синтезированный локально).
    pub comment: Comment,
    /// Локальная метка неподтверждённой записи.
    pub pending_tag: Option<u64>,
}

impl ThreadEntry {
    /// Ещё не подтверждён сервером.
    pub fn is_pending(&self) -> bool {
        self.pending_tag.is_some()
    }
}

#[derive(Debug, Clone)]
/// Исход отправки комментария.
pub enum SubmitOutcome {
    /// Сервер подтвердил: Pending-запись заменена серверной.
    Posted(Comment),
    /// Отклонено (до или после оптимистичной вставки); текст возвращается
    /// в поле ввода.
    Rejected {
        /// Сообщение для пользователя.
        message: String,
        /// Текст, который нужно восстановить в поле ввода.
        restored_text: String,
    },
}

#[derive(Debug, Clone)]
/// Исход удаления комментария.
pub enum DeleteOutcome {
    /// Удалено; запущена явная сверка первой страницы.
    Deleted,
    /// Не удалось; снапшот списка восстановлен.
    Failed {
        /// Сообщение для пользователя.
        message: String,
    },
}

#[derive(Debug, Clone)]
/// Текущий пользователь, от имени которого синтезируются Pending-записи.
pub struct Viewer {
    /// Идентификатор пользователя.
    pub id: i64,
    /// Username для отображения Pending-комментариев.
    pub username: String,
}

struct ThreadState {
    epoch: u64,
    phase: ThreadPhase,
    entries: Vec<ThreadEntry>,
    page: u32,
    has_more: bool,
    next_tag: u64,
    notice: Option<String>,
}

impl ThreadState {
    fn new() -> Self {
        Self {
            epoch: 0,
            phase: ThreadPhase::Closed,
            entries: Vec::new(),
            page: 1,
            has_more: false,
            next_tag: 1,
            notice: None,
        }
    }

    fn reset_transient(&mut self) {
        self.entries.clear();
        self.page = 1;
        self.has_more = false;
        self.notice = None;
    }
}

/// Тред комментариев одного поста.
///
/// Состояние лежит за `Mutex` и блокировка никогда не удерживается через
/// `await`, поэтому тик опроса и пользовательская отправка могут честно
/// перемежаться.
pub struct CommentThread<A: CommentApi> {
    api: Arc<A>,
    post_id: String,
    limit: u32,
    viewer: Viewer,
    state: Mutex<ThreadState>,
}

impl<A: CommentApi> CommentThread<A> {
    /// Создаёт закрытый тред для поста `post_id`.
    pub fn new(api: Arc<A>, post_id: impl Into<String>, limit: u32, viewer: Viewer) -> Self {
        Self {
            api,
            post_id: post_id.into(),
            limit,
            viewer,
            state: Mutex::new(ThreadState::new()),
        }
    }

    /// Открывает тред и загружает первую страницу. При сбое тред остаётся
    /// открытым с пустым списком и разовым уведомлением.
    pub async fn open(&self) {
        let epoch = self.lock(|s| {
            s.epoch += 1;
            s.phase = ThreadPhase::Loading;
            s.reset_transient();
            s.epoch
        });

        let result = self.api.fetch_page(&self.post_id, 1, self.limit).await;

        self.lock(|s| {
            if s.epoch != epoch {
                return;
            }
            match result {
                Ok(list) => {
                    s.entries = confirmed_entries(list.comments);
                    s.has_more = list.pagination.has_more;
                    s.page = 1;
                }
                Err(err) => s.notice = Some(err.user_message()),
            }
            s.phase = ThreadPhase::Loaded;
        });
    }

    /// Тик фонового опроса: молчаливая перезагрузка первой страницы.
    ///
    /// Результат заменяет серверную часть списка и `has_more`; ещё не
    /// подтверждённые Pending-записи переживают замену. Сетевые сбои
    /// фонового опроса пользователю не показываются.
    pub async fn tick(&self) {
        let Some(epoch) = self.lock(|s| (s.phase == ThreadPhase::Loaded).then_some(s.epoch))
        else {
            return;
        };

        if let Ok(list) = self.api.fetch_page(&self.post_id, 1, self.limit).await {
            self.lock(|s| {
                if s.epoch != epoch || s.phase != ThreadPhase::Loaded {
                    return;
                }
                s.entries = merge(list.comments, std::mem::take(&mut s.entries));
                s.has_more = list.pagination.has_more;
                s.page = 1;
            });
        }
    }

    /// Догружает следующую страницу. Работает только в фазе `Loaded` и
    /// только пока сервер сообщает `has_more`; иначе вызов игнорируется.
    pub async fn load_more(&self) {
        let Some((epoch, next_page)) = self.lock(|s| {
            if s.phase != ThreadPhase::Loaded || !s.has_more {
                return None;
            }
            s.phase = ThreadPhase::LoadingMore;
            Some((s.epoch, s.page + 1))
        }) else {
            return;
        };

        let result = self
            .api
            .fetch_page(&self.post_id, next_page, self.limit)
            .await;

        self.lock(|s| {
            if s.epoch != epoch {
                return;
            }
            match result {
                Ok(list) => {
                    s.entries.extend(confirmed_entries(list.comments));
                    s.page = next_page;
                    s.has_more = list.pagination.has_more;
                }
                Err(err) => s.notice = Some(err.user_message()),
            }
            s.phase = ThreadPhase::Loaded;
        });
    }

    /// Отправляет комментарий.
    ///
    /// Предварительная проверка (непустой текст, не больше 500 символов
    /// после trim) выполняется до оптимистичной вставки: заведомо
    /// невалидный текст в список не попадает. Валидный текст сразу
    /// появляется первым в списке как Pending и заменяется серверным
    /// комментарием после подтверждения; при отказе запись убирается,
    /// а текст возвращается вызывающему для восстановления в поле ввода.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let trimmed = text.trim().to_string();
        let chars = trimmed.chars().count();
        if chars == 0 {
            return SubmitOutcome::Rejected {
                message: "comment cannot be empty".to_string(),
                restored_text: trimmed,
            };
        }
        if chars > MAX_TEXT_CHARS {
            return SubmitOutcome::Rejected {
                message: "comment cannot exceed 500 characters".to_string(),
                restored_text: trimmed,
            };
        }

        let (epoch, tag) = self.lock(|s| {
            let tag = s.next_tag;
            s.next_tag += 1;
            s.entries.insert(
                0,
                ThreadEntry {
                    comment: self.pending_comment(tag, &trimmed),
                    pending_tag: Some(tag),
                },
            );
            (s.epoch, tag)
        });

        match self.api.create(&self.post_id, &trimmed).await {
            Ok(comment) => {
                self.lock(|s| {
                    if s.epoch != epoch {
                        return;
                    }
                    if let Some(entry) = s
                        .entries
                        .iter_mut()
                        .find(|entry| entry.pending_tag == Some(tag))
                    {
                        entry.comment = comment.clone();
                        entry.pending_tag = None;
                    }
                });
                SubmitOutcome::Posted(comment)
            }
            Err(err) => {
                self.lock(|s| {
                    if s.epoch == epoch {
                        s.entries.retain(|entry| entry.pending_tag != Some(tag));
                    }
                });
                SubmitOutcome::Rejected {
                    message: err.user_message(),
                    restored_text: trimmed,
                }
            }
        }
    }

    /// Удаляет комментарий.
    ///
    /// Подтверждение у пользователя (операция необратима) обязан получить
    /// вызывающий до вызова. Запись убирается из списка сразу; при отказе
    /// сервера восстанавливается снапшот, при успехе запускается явная
    /// сверка первой страницы, потому что удаление сдвигает окна
    /// offset-пагинации.
    pub async fn delete(&self, comment_id: i64) -> DeleteOutcome {
        let Some((epoch, snapshot)) = self.lock(|s| {
            if s.phase != ThreadPhase::Loaded {
                return None;
            }
            let snapshot = s.entries.clone();
            s.entries.retain(|entry| entry.comment.id != comment_id);
            Some((s.epoch, snapshot))
        }) else {
            return DeleteOutcome::Failed {
                message: "thread is not open".to_string(),
            };
        };

        match self.api.delete(comment_id).await {
            Ok(()) => {
                self.refresh(epoch).await;
                DeleteOutcome::Deleted
            }
            Err(err) => {
                self.lock(|s| {
                    if s.epoch == epoch {
                        s.entries = snapshot;
                    }
                });
                DeleteOutcome::Failed {
                    message: err.user_message(),
                }
            }
        }
    }

    /// Закрывает тред и сбрасывает всё переходное состояние. Ответы
    /// запросов, оставшихся в полёте, будут отброшены по эпохе.
    pub fn close(&self) {
        self.lock(|s| {
            s.epoch += 1;
            s.phase = ThreadPhase::Closed;
            s.reset_transient();
        });
    }

    /// Текущая фаза.
    pub fn phase(&self) -> ThreadPhase {
        self.lock(|s| s.phase)
    }

    /// Снимок видимого списка.
    pub fn entries(&self) -> Vec<ThreadEntry> {
        self.lock(|s| s.entries.clone())
    }

    /// Есть ли ещё страницы.
    pub fn has_more(&self) -> bool {
        self.lock(|s| s.has_more)
    }

    /// Забирает разовое уведомление, если оно есть.
    pub fn take_notice(&self) -> Option<String> {
        self.lock(|s| s.notice.take())
    }

    async fn refresh(&self, epoch: u64) {
        let result = self.api.fetch_page(&self.post_id, 1, self.limit).await;
        self.lock(|s| {
            if s.epoch != epoch {
                return;
            }
            match result {
                Ok(list) => {
                    s.entries = merge(list.comments, std::mem::take(&mut s.entries));
                    s.has_more = list.pagination.has_more;
                    s.page = 1;
                }
                Err(err) => s.notice = Some(err.user_message()),
            }
        });
    }

    fn pending_comment(&self, tag: u64, text: &str) -> Comment {
        let now = Utc::now();
        Comment {
            // отрицательный id не пересекается с серверными
            id: -(tag as i64),
            post_id: self.post_id.clone(),
            user_id: self.viewer.id,
            username: self.viewer.username.clone(),
            text: text.to_string(),
            created_at: now,
            updated_at: now,
            is_own: true,
        }
    }

    fn lock<T>(&self, f: impl FnOnce(&mut ThreadState) -> T) -> T {
        let mut state = self.state.lock().expect("thread state mutex poisoned");
        f(&mut state)
    }
}

fn confirmed_entries(comments: Vec<Comment>) -> Vec<ThreadEntry> {
    comments
        .into_iter()
        .map(|comment| ThreadEntry {
            comment,
            pending_tag: None,
        })
        .collect()
}

/// Детерминированная сверка: серверная страница — истина, но локальные
/// Pending-записи, ещё не получившие серверного id, остаются впереди.
fn merge(server: Vec<Comment>, previous: Vec<ThreadEntry>) -> Vec<ThreadEntry> {
    let mut merged: Vec<ThreadEntry> = previous
        .into_iter()
        .filter(ThreadEntry::is_pending)
        .collect();
    merged.extend(confirmed_entries(server));
    merged
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{ThreadEntry, merge};
    use crate::models::Comment;

    fn comment(id: i64, text: &str) -> Comment {
        let now = Utc::now();
        Comment {
            id,
            post_id: "p1".to_string(),
            user_id: 10,
            username: "alice".to_string(),
            text: text.to_string(),
            created_at: now,
            updated_at: now,
            is_own: true,
        }
    }

    #[test]
    fn merge_keeps_pending_entries_in_front_of_server_truth() {
        let previous = vec![
            ThreadEntry {
                comment: comment(-1, "pending"),
                pending_tag: Some(1),
            },
            ThreadEntry {
                comment: comment(5, "old confirmed"),
                pending_tag: None,
            },
        ];
        let server = vec![comment(7, "fresh"), comment(5, "old confirmed")];

        let merged = merge(server, previous);

        assert_eq!(merged.len(), 3);
        assert!(merged[0].is_pending());
        assert_eq!(merged[0].comment.text, "pending");
        assert_eq!(merged[1].comment.id, 7);
        assert_eq!(merged[2].comment.id, 5);
    }

    #[test]
    fn merge_drops_stale_confirmed_entries_missing_from_server() {
        let previous = vec![ThreadEntry {
            comment: comment(5, "deleted elsewhere"),
            pending_tag: None,
        }];
        let server = vec![comment(7, "fresh")];

        let merged = merge(server, previous);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].comment.id, 7);
    }
}
