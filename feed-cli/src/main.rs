use std::fs;
use std::io;
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use feed_client::thread::DEFAULT_POLL_SECS;
use feed_client::{
    AuthResponse, Comment, CommentList, CommentThread, DeleteOutcome, FeedClient, FeedClientError,
    SubmitOutcome, Viewer,
};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::MissedTickBehavior;

const SESSION_FILE: &str = ".feed_session";
const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

#[derive(Debug, Parser)]
#[command(name = "feed-cli", version, about = "CLI клиент для feed-server")]
struct Cli {
    /// Адрес сервера, например http://127.0.0.1:8080.
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Регистрация пользователя.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Вход пользователя.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Завершение сессии.
    Logout,
    /// Список постов ленты.
    Posts,
    /// Страница комментариев поста.
    Comments {
        #[arg(long)]
        post: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Создание комментария (требует сессию).
    Comment {
        #[arg(long)]
        post: String,
        #[arg(long)]
        text: String,
    },
    /// Удаление своего комментария (требует сессию).
    DeleteComment {
        #[arg(long)]
        id: i64,
        /// Не спрашивать подтверждение.
        #[arg(long)]
        yes: bool,
    },
    /// Интерактивный тред комментариев с фоновым обновлением.
    ///
    /// Введённый текст отправляется как комментарий; команды:
    /// /more, /del <id>, /quit.
    Watch {
        #[arg(long)]
        post: String,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let server = normalize_server(cli.server.unwrap_or_else(|| DEFAULT_SERVER.to_string()));
    let mut client = FeedClient::new(server);

    let session = load_session().context("не удалось прочитать .feed_session")?;
    if let Some(session) = &session {
        client.set_token(session.token.clone());
    }

    match cli.command {
        Command::Register { username, password } => {
            let auth = client
                .register(&username, &password)
                .await
                .map_err(map_client_error)?;
            persist_session(&auth).context("не удалось сохранить сессию")?;
            print_auth("Регистрация успешна", &auth);
        }
        Command::Login { username, password } => {
            let auth = client
                .login(&username, &password)
                .await
                .map_err(map_client_error)?;
            persist_session(&auth).context("не удалось сохранить сессию")?;
            print_auth("Вход выполнен", &auth);
        }
        Command::Logout => {
            let result = client.logout().await;
            clear_session().context("не удалось удалить .feed_session")?;
            result.map_err(map_client_error)?;
            println!("Сессия завершена");
        }
        Command::Posts => {
            let posts = client.list_posts().await.map_err(map_client_error)?;
            println!("Постов: {}", posts.len());
            for post in &posts {
                println!("- [{}] {} (@{})", post.id, post.title, post.author);
            }
        }
        Command::Comments { post, page, limit } => {
            let list = client
                .list_comments(&post, page, limit)
                .await
                .map_err(map_client_error)?;
            print_comment_page(&post, &list);
        }
        Command::Comment { post, text } => {
            let comment = client
                .create_comment(&post, &text)
                .await
                .map_err(map_client_error)?;
            println!("Комментарий создан");
            print_comment(&comment);
        }
        Command::DeleteComment { id, yes } => {
            if !yes && !confirm_delete(id)? {
                println!("Отменено");
                return Ok(());
            }
            client.delete_comment(id).await.map_err(map_client_error)?;
            println!("Комментарий удалён: id={id}");
        }
        Command::Watch { post, limit } => {
            let session =
                session.ok_or_else(|| map_client_error(FeedClientError::Unauthorized))?;
            watch(client, session, post, limit).await?;
        }
    }

    Ok(())
}

/// Интерактивный тред: фоновый опрос раз в несколько секунд плюс команды
/// со stdin. Блокировка состояния треда не держится через await, поэтому
/// тик и отправка честно перемежаются.
async fn watch(client: FeedClient, session: Session, post_id: String, limit: u32) -> Result<()> {
    let thread = Arc::new(CommentThread::new(
        Arc::new(client),
        post_id.clone(),
        limit,
        Viewer {
            id: session.user_id,
            username: session.username,
        },
    ));

    thread.open().await;
    println!("Тред поста {post_id}. Текст отправляется как комментарий; /more, /del <id>, /quit.");
    render(&thread);

    let mut ticker = tokio::time::interval(Duration::from_secs(DEFAULT_POLL_SECS));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let before = snapshot_ids(&thread);
                thread.tick().await;
                // перерисовываем только когда опрос что-то изменил
                if snapshot_ids(&thread) != before {
                    render(&thread);
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("не удалось прочитать stdin")? else {
                    break;
                };
                match parse_watch_input(&line) {
                    WatchInput::Empty => {}
                    WatchInput::Quit => break,
                    WatchInput::Help => {
                        println!("Команды: /more (ещё страница), /del <id> (удалить), /quit (выход)");
                    }
                    WatchInput::More => {
                        thread.load_more().await;
                        render(&thread);
                    }
                    WatchInput::Delete(id) => {
                        print!("Удалить комментарий {id}? [y/N]: ");
                        flush_stdout();
                        if read_confirmation(&mut lines).await? {
                            match thread.delete(id).await {
                                DeleteOutcome::Deleted => render(&thread),
                                DeleteOutcome::Failed { message } => {
                                    println!("Не удалось удалить: {message}");
                                }
                            }
                        } else {
                            println!("Отменено");
                        }
                    }
                    WatchInput::Text(text) => {
                        match thread.submit(&text).await {
                            SubmitOutcome::Posted(_) => render(&thread),
                            SubmitOutcome::Rejected { message, restored_text } => {
                                println!("Отклонено: {message}");
                                println!("Ваш текст: {restored_text}");
                            }
                        }
                    }
                }
            }
        }
    }

    thread.close();
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum WatchInput {
    Empty,
    Quit,
    More,
    Delete(i64),
    Help,
    Text(String),
}

fn parse_watch_input(line: &str) -> WatchInput {
    let input = line.trim();
    if input.is_empty() {
        return WatchInput::Empty;
    }
    if !input.starts_with('/') {
        return WatchInput::Text(input.to_string());
    }
    match input {
        "/quit" | "/q" => WatchInput::Quit,
        "/more" => WatchInput::More,
        _ => match input.strip_prefix("/del ") {
            Some(rest) => match rest.trim().parse::<i64>() {
                Ok(id) => WatchInput::Delete(id),
                Err(_) => WatchInput::Help,
            },
            None => WatchInput::Help,
        },
    }
}

async fn read_confirmation(lines: &mut Lines<BufReader<Stdin>>) -> Result<bool> {
    let answer = lines
        .next_line()
        .await
        .context("не удалось прочитать stdin")?
        .unwrap_or_default();
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn confirm_delete(id: i64) -> Result<bool> {
    print!("Удалить комментарий {id}? [y/N]: ");
    flush_stdout();
    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .context("не удалось прочитать stdin")?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn flush_stdout() {
    use io::Write;
    let _ = io::stdout().flush();
}

fn render(thread: &CommentThread<FeedClient>) {
    if let Some(notice) = thread.take_notice() {
        println!("! {notice}");
    }
    let entries = thread.entries();
    println!("--- комментарии ({}) ---", entries.len());
    for entry in &entries {
        let marker = if entry.is_pending() {
            "…"
        } else if entry.comment.is_own {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} [{}] {}: {}",
            entry.comment.id, entry.comment.username, entry.comment.text
        );
    }
    if thread.has_more() {
        println!("(есть ещё, /more)");
    }
}

fn snapshot_ids(thread: &CommentThread<FeedClient>) -> Vec<i64> {
    thread.entries().iter().map(|e| e.comment.id).collect()
}

#[derive(Debug, Serialize, Deserialize)]
struct Session {
    token: String,
    user_id: i64,
    username: String,
}

fn parse_session_content(raw: &str) -> Option<Session> {
    serde_json::from_str(raw).ok()
}

fn load_session() -> io::Result<Option<Session>> {
    if !Path::new(SESSION_FILE).exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(SESSION_FILE)?;
    Ok(parse_session_content(&raw))
}

fn persist_session(auth: &AuthResponse) -> io::Result<()> {
    let session = Session {
        token: auth.access_token.clone(),
        user_id: auth.user.id,
        username: auth.user.username.clone(),
    };
    let raw = serde_json::to_string(&session).expect("session is always serializable");
    fs::write(SESSION_FILE, raw)
}

fn clear_session() -> io::Result<()> {
    if Path::new(SESSION_FILE).exists() {
        fs::remove_file(SESSION_FILE)?;
    }
    Ok(())
}

fn normalize_server(server: String) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("http://{server}")
}

fn map_client_error(err: FeedClientError) -> anyhow::Error {
    let message = match err {
        FeedClientError::Unauthorized => {
            "требуется авторизация: выполните `feed-cli login ...` или `feed-cli register ...`"
                .to_string()
        }
        FeedClientError::Forbidden => "можно удалять только свои комментарии".to_string(),
        FeedClientError::NotFound => "ресурс не найден".to_string(),
        FeedClientError::InvalidRequest(message) => format!("некорректный запрос: {message}"),
        FeedClientError::Http(err) => format!("ошибка HTTP: {err}"),
    };
    anyhow::anyhow!(message)
}

fn print_auth(title: &str, auth: &AuthResponse) {
    println!("{title}");
    println!("user:");
    println!("  id: {}", auth.user.id);
    println!("  username: {}", auth.user.username);
    println!("  created_at: {}", auth.user.created_at);
}

fn print_comment(comment: &Comment) {
    println!("id: {}", comment.id);
    println!("post: {}", comment.post_id);
    println!("author: {}", comment.username);
    println!("text: {}", comment.text);
    println!("created_at: {}", comment.created_at);
}

fn print_comment_page(post_id: &str, list: &CommentList) {
    let p = &list.pagination;
    println!(
        "Комментарии поста {post_id}: страница {}/{} (limit={}, total={})",
        p.page, p.total_pages, p.limit, p.total
    );

    for comment in &list.comments {
        let own = if comment.is_own { " *" } else { "" };
        println!(
            "- [{}] {}: {}{own}",
            comment.id, comment.username, comment.text
        );
    }

    if p.has_more {
        println!("(есть ещё, --page {})", p.page + 1);
    }
}
