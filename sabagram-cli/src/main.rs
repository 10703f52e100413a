use std::fs;
use std::io;
use std::path::Path;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::{Duration, TimeZone, Utc};
use clap::{Parser, Subcommand};
use sabagram_core::data::interaction_gateway::InteractionGateway;
use sabagram_core::data::notifier::MutationNotifier;
use sabagram_core::data::post_repository::{Pagination, PostRepository};
use sabagram_core::data::profile_repository::ProfileRepository;
use sabagram_core::data::repositories::memory::InMemoryStore;
use sabagram_core::domain::interaction::{Comment, CommentDraft};
use sabagram_core::domain::post::{NewPostRequest, Post};
use sabagram_core::domain::profile::{NewProfileRequest, Profile, ProfileUpdateRequest};
use sabagram_core::infrastructure::logging::init_logging;
use sabagram_core::infrastructure::revalidation::TracingNotifier;
use sabagram_core::infrastructure::settings::Settings;
use sabagram_core::{
    AdminService, CollectionKind, CommentAppendCoordinator, CommentId, DEFAULT_PREVIEW_LIMIT,
    DomainError, LikeToggleCoordinator, PostCollection, PostEntry, PostId, PostService,
    ProfileService, SearchResults, SearchService, Session, UserId,
};
use sabagram_rest::{PostgrestClient, PostgrestConfig, RestGateway};
use tracing::debug;
use uuid::Uuid;

const SESSION_FILE: &str = ".sabagram_session";
const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Parser)]
#[command(name = "sabagram-cli", version, about = "CLI клиент Sabagram")]
struct Cli {
    /// Работать с демо-данными в памяти вместо Supabase.
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Сохранить сессию пользователя в `.sabagram_session`.
    Use {
        #[arg(long)]
        user: UserId,
        /// Access token Supabase (JWT пользователя).
        #[arg(long)]
        token: Option<String>,
    },
    /// Лента: новые посты первыми.
    Feed {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Сетка "Интересное": все посты, новые первыми.
    Discover,
    /// Поиск пользователей по имени и постов по подписи.
    Search {
        query: String,
    },
    /// Посты одного автора (по умолчанию текущего пользователя).
    ProfileGrid {
        #[arg(long)]
        user: Option<UserId>,
    },
    /// Посты, которые понравились текущему пользователю.
    Liked,
    /// Поставить или снять лайк.
    Like {
        #[arg(long)]
        post: PostId,
    },
    /// Добавить комментарий.
    Comment {
        #[arg(long)]
        post: PostId,
        #[arg(long)]
        text: String,
    },
    /// Все комментарии поста.
    Comments {
        #[arg(long)]
        post: PostId,
    },
    /// Создать пост (изображение уже загружено, передаётся ссылка).
    Create {
        #[arg(long)]
        image: String,
        #[arg(long)]
        caption: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Удалить собственный пост.
    Delete {
        #[arg(long)]
        post: PostId,
    },
    /// Профиль пользователя.
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
    /// Модерация (требует ключ администратора).
    Admin {
        #[arg(long)]
        key: String,
        #[command(subcommand)]
        action: AdminCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ProfileCommand {
    /// Создать профиль для пользователя сессии после регистрации.
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Показать профиль.
    Show {
        #[arg(long)]
        user: Option<UserId>,
    },
    /// Обновить свой профиль. Незаданные поля очищаются, аватар сохраняется.
    Update {
        #[arg(long)]
        username: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum AdminCommand {
    /// Общая статистика.
    Stats,
    /// Удалить любой пост.
    DeletePost {
        #[arg(long)]
        post: PostId,
    },
    /// Заблокировать пользователя.
    Ban {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Снять блокировку.
    Unban {
        #[arg(long)]
        user: UserId,
    },
}

/// Параметры запуска, общие для обоих хранилищ.
#[derive(Debug, Clone)]
struct Options {
    log_level: String,
    preview_limit: usize,
    page_size: u32,
    admin_key: Option<String>,
}

impl From<&Settings> for Options {
    fn from(settings: &Settings) -> Self {
        Self {
            log_level: settings.log_level.clone(),
            preview_limit: settings.comment_preview_limit,
            page_size: settings.feed_page_size,
            admin_key: settings.admin_key.clone(),
        }
    }
}

impl Options {
    fn offline() -> Self {
        let env = |key: &str| {
            std::env::var(key)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Self {
            log_level: env("LOG_LEVEL")
                .or_else(|| env("RUST_LOG"))
                .unwrap_or_else(|| "info".to_string()),
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
            admin_key: env("ADMIN_KEY"),
        }
    }
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
    dotenvy::dotenv().ok();

    if let Command::Use { user, token } = &cli.command {
        let session = match token {
            Some(token) => Session::new(*user).with_access_token(token.clone()),
            None => Session::new(*user),
        };
        persist_session(&session).context("не удалось сохранить сессию")?;
        println!("Сессия сохранена: user={user}");
        return Ok(());
    }

    let stored = load_session().context("не удалось прочитать .sabagram_session")?;

    if cli.offline {
        let options = Options::offline();
        init_logging(&options.log_level)?;
        let store = seeded_store().await.map_err(map_domain_error)?;
        // без сохранённой сессии действуем от имени демо-пользователя
        let session = stored.or_else(|| Some(Session::new(demo_user(1))));
        return execute(cli.command, store, session, &options).await;
    }

    let settings = Settings::from_env()?;
    let options = Options::from(&settings);
    init_logging(&options.log_level)?;

    let mut client = PostgrestClient::new(PostgrestConfig::from_settings(&settings))
        .map_err(|err| map_domain_error(err.into()))?;
    if let Some(token) = stored.as_ref().and_then(Session::access_token) {
        client = client.with_access_token(token);
    }

    execute(cli.command, RestGateway::new(client), stored, &options).await
}

async fn execute<S>(
    command: Command,
    store: S,
    session: Option<Session>,
    options: &Options,
) -> Result<()>
where
    S: InteractionGateway + PostRepository + ProfileRepository + Clone + 'static,
{
    let notifier: Arc<dyn MutationNotifier> = Arc::new(TracingNotifier);
    let posts = PostService::new(store.clone(), store.clone(), notifier.clone())
        .with_preview_limit(options.preview_limit);
    let viewer = session.as_ref().map(Session::user_id);

    match command {
        Command::Use { .. } => return Err(anyhow!("команда use обрабатывается без хранилища")),
        Command::Feed { limit, offset } => {
            let feed = PostCollection::new(CollectionKind::Feed);
            let pagination = Pagination {
                limit: limit.unwrap_or(options.page_size),
                offset,
            };
            posts
                .load_feed(&feed, pagination)
                .await
                .map_err(map_domain_error)?;
            print_entries("Лента", &feed.snapshot(), viewer);
        }
        Command::Discover => {
            let discover = PostCollection::new(CollectionKind::Discover);
            posts
                .load_discover(&discover)
                .await
                .map_err(map_domain_error)?;
            print_entries("Интересное", &discover.snapshot(), viewer);
        }
        Command::Search { query } => {
            let search = SearchService::new(store.clone(), store);
            let results = search.search(&query).await.map_err(map_domain_error)?;
            print_search(&query, &results);
        }
        Command::ProfileGrid { user } => {
            let author = match user {
                Some(user) => user,
                None => require_session(&session)?.user_id(),
            };
            let grid = PostCollection::new(CollectionKind::ProfileGrid);
            posts
                .load_profile_grid(&grid, author)
                .await
                .map_err(map_domain_error)?;
            print_entries(&format!("Посты пользователя {author}"), &grid.snapshot(), viewer);
        }
        Command::Liked => {
            let session = require_session(&session)?;
            let liked = PostCollection::new(CollectionKind::Liked);
            posts
                .load_liked(&liked, session.user_id())
                .await
                .map_err(map_domain_error)?;
            print_entries("Понравившиеся", &liked.snapshot(), viewer);
        }
        Command::Like { post } => {
            let session = require_session(&session)?;
            let (feed, dialog) = open_post(&posts, post, options.page_size).await?;

            let coordinator = LikeToggleCoordinator::new(store, notifier);
            let outcome = coordinator
                .toggle_like(session, post, &[feed, dialog.clone()])
                .await
                .map_err(map_domain_error)?;

            let likes = dialog.get(post).map(|entry| entry.likes_count()).unwrap_or(0);
            if outcome.liked {
                println!("Лайк поставлен: post={post}, лайков: {likes}");
            } else {
                println!("Лайк снят: post={post}, лайков: {likes}");
            }
        }
        Command::Comment { post, text } => {
            let session = require_session(&session)?;
            let (feed, dialog) = open_post(&posts, post, options.page_size).await?;

            let coordinator = CommentAppendCoordinator::new(store, notifier)
                .with_preview_limit(options.preview_limit);
            let mut draft = CommentDraft::new(text);
            if let Err(err) = coordinator
                .submit_draft(session, post, &mut draft, &[feed, dialog.clone()])
                .await
            {
                if !draft.is_blank() {
                    eprintln!("Черновик сохранён: {}", draft.text());
                }
                return Err(map_domain_error(err));
            }

            println!("Комментарий добавлен: post={post}");
            if let Some(entry) = dialog.get(post) {
                print_comments("Превью", &entry.comments_preview);
            }
        }
        Command::Comments { post } => {
            let coordinator = CommentAppendCoordinator::new(store, notifier);
            let thread = coordinator
                .load_thread(post)
                .await
                .map_err(map_domain_error)?;
            print_comments(&format!("Комментарии к {post}"), &thread);
        }
        Command::Create {
            image,
            caption,
            description,
        } => {
            let session = require_session(&session)?;
            let req = NewPostRequest {
                image_ref: image,
                caption,
                description,
            };
            let post = posts
                .create_post(session, req, &[])
                .await
                .map_err(map_domain_error)?;
            print_post("Пост создан", &post);
        }
        Command::Delete { post } => {
            let session = require_session(&session)?;
            posts
                .delete_post(session, post, &[])
                .await
                .map_err(map_domain_error)?;
            println!("Пост удалён: id={post}");
        }
        Command::Profile { action } => {
            let profiles = ProfileService::new(store, notifier);
            match action {
                ProfileCommand::Create { username, name } => {
                    let session = require_session(&session)?;
                    let req = NewProfileRequest {
                        username,
                        display_name: name,
                    };
                    let profile = profiles
                        .create_profile(session, req)
                        .await
                        .map_err(map_domain_error)?;
                    print_profile("Профиль создан", &profile);
                }
                ProfileCommand::Show { user } => {
                    let id = match user {
                        Some(user) => user,
                        None => require_session(&session)?.user_id(),
                    };
                    let profile = profiles.get_profile(id).await.map_err(map_domain_error)?;
                    print_profile("Профиль", &profile);
                }
                ProfileCommand::Update {
                    username,
                    name,
                    bio,
                    location,
                    avatar,
                } => {
                    let session = require_session(&session)?;
                    let req = ProfileUpdateRequest {
                        username,
                        display_name: name,
                        bio,
                        location,
                        avatar_ref: avatar,
                    };
                    let profile = profiles
                        .update_profile(session, req)
                        .await
                        .map_err(map_domain_error)?;
                    print_profile("Профиль обновлён", &profile);
                }
            }
        }
        Command::Admin { key, action } => {
            let admin = AdminService::new(
                store.clone(),
                store,
                notifier,
                options.admin_key.clone(),
            );
            let grant = admin.verify_admin_key(&key).map_err(map_domain_error)?;
            match action {
                AdminCommand::Stats => {
                    let stats = admin.stats(&grant).await.map_err(map_domain_error)?;
                    println!("Статистика");
                    println!("users: {}", stats.total_users);
                    println!("posts: {}", stats.total_posts);
                    println!("likes: {}", stats.total_likes);
                    println!("comments: {}", stats.total_comments);
                    println!("banned: {}", stats.banned_users);
                }
                AdminCommand::DeletePost { post } => {
                    admin
                        .delete_post(&grant, post, &[])
                        .await
                        .map_err(map_domain_error)?;
                    println!("Пост удалён администратором: id={post}");
                }
                AdminCommand::Ban { user, reason } => {
                    admin
                        .ban_user(&grant, user, reason)
                        .await
                        .map_err(map_domain_error)?;
                    println!("Пользователь заблокирован: id={user}");
                }
                AdminCommand::Unban { user } => {
                    admin
                        .unban_user(&grant, user)
                        .await
                        .map_err(map_domain_error)?;
                    println!("Блокировка снята: id={user}");
                }
            }
        }
    }

    Ok(())
}

/// Открывает пост так, как это делает экран: лента плюс диалог поверх неё.
/// Если поста нет на первой странице ленты, диалог загружается отдельно.
async fn open_post<R, G>(
    posts: &PostService<R, G>,
    post_id: PostId,
    page_size: u32,
) -> Result<(Arc<PostCollection>, Arc<PostCollection>)>
where
    R: PostRepository,
    G: InteractionGateway,
{
    let feed = PostCollection::handle(CollectionKind::Feed);
    posts
        .load_feed(&feed, Pagination::first_page(page_size))
        .await
        .map_err(map_domain_error)?;

    let dialog = PostCollection::handle(CollectionKind::PostDialog);
    let entry = match feed.get(post_id) {
        Some(entry) => entry,
        None => {
            debug!(%post_id, "post is not on the first feed page, loading it directly");
            let post = posts.get_post(post_id).await.map_err(map_domain_error)?;
            posts
                .build_entries(vec![post])
                .await
                .map_err(map_domain_error)?
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("пост не найден: {post_id}"))?
        }
    };
    dialog.load(vec![entry]);
    Ok((feed, dialog))
}

fn require_session(session: &Option<Session>) -> Result<&Session> {
    session.as_ref().ok_or_else(|| {
        anyhow!("требуется сессия: выполните `sabagram-cli use --user <uuid> --token <jwt>`")
    })
}

fn parse_session_content(raw: &str) -> Option<Session> {
    let mut parts = raw.split_whitespace();
    let user_id: UserId = parts.next()?.parse().ok()?;
    let session = Session::new(user_id);
    Some(match parts.next() {
        Some(token) => session.with_access_token(token),
        None => session,
    })
}

fn format_session_content(session: &Session) -> String {
    match session.access_token() {
        Some(token) => format!("{} {token}\n", session.user_id()),
        None => format!("{}\n", session.user_id()),
    }
}

fn load_session() -> io::Result<Option<Session>> {
    if !Path::new(SESSION_FILE).exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(SESSION_FILE)?;
    Ok(parse_session_content(&raw))
}

fn persist_session(session: &Session) -> io::Result<()> {
    fs::write(SESSION_FILE, format_session_content(session))
}

fn map_domain_error(err: DomainError) -> anyhow::Error {
    let local = err.is_local_rejection();
    let message = match err {
        DomainError::Validation { field, message } => {
            format!("некорректные данные: {field} {message}")
        }
        DomainError::Transient(message) => {
            format!("сервис временно недоступен, повторите попытку: {message}")
        }
        DomainError::Permission(message) => format!("недостаточно прав: {message}"),
        DomainError::NotFound(message) => format!("не найдено: {message}"),
        DomainError::Conflict(message) => format!("уже существует: {message}"),
        DomainError::ToggleInFlight { post_id, .. } => {
            format!("лайк для поста {post_id} уже обрабатывается")
        }
        DomainError::Forbidden => "неверный ключ администратора".to_string(),
        DomainError::Unexpected(message) => format!("внутренняя ошибка: {message}"),
    };
    if local {
        anyhow!("{message} (запрос не отправлялся)")
    } else {
        anyhow!(message)
    }
}

fn demo_user(n: u128) -> UserId {
    UserId::from_uuid(Uuid::from_u128(n))
}

fn demo_post(n: u128) -> PostId {
    PostId::from_uuid(Uuid::from_u128(0x100 + n))
}

/// Демо-данные для `--offline`: два автора, три поста, лайки и комментарии.
async fn seeded_store() -> Result<InMemoryStore, DomainError> {
    let store = InMemoryStore::new();
    let start = Utc
        .with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .ok_or_else(|| DomainError::Unexpected("invalid seed timestamp".to_string()))?;

    for (n, username, name) in [(1, "saba", "Saba"), (2, "nika", "Nika")] {
        store.insert_profile(Profile {
            id: demo_user(n),
            username: username.to_string(),
            display_name: Some(name.to_string()),
            avatar_ref: None,
            bio: None,
            location: Some("Tbilisi".to_string()),
            banned: false,
            ban_reason: None,
        })?;
    }

    let seeds = [
        (1, 2, "Old town at dawn"),
        (2, 1, "Khachapuri, finally"),
        (3, 2, "Mtatsminda from below"),
    ];
    for (n, author, caption) in seeds {
        store.insert_post(Post::new(
            demo_post(n),
            format!("https://blob.example/posts/{n}.jpg"),
            Some(caption.to_string()),
            demo_user(author),
            start + Duration::hours(n as i64),
        )?)?;
    }

    store.create_like(demo_post(1), demo_user(1)).await?;
    store.create_like(demo_post(3), demo_user(1)).await?;
    store.create_like(demo_post(3), demo_user(2)).await?;

    let comments = [
        (1, 1, "beautiful light"),
        (1, 2, "thanks!"),
        (1, 1, "where exactly?"),
        (2, 2, "recipe please"),
    ];
    for (i, (post, author, content)) in comments.into_iter().enumerate() {
        store.insert_comment(Comment {
            id: CommentId::from_uuid(Uuid::from_u128(0x200 + i as u128)),
            post_id: demo_post(post),
            author_id: demo_user(author),
            content: content.to_string(),
            created_at: start + Duration::hours(4) + Duration::minutes(i as i64),
        })?;
    }

    Ok(store)
}

fn print_entries(title: &str, entries: &[PostEntry], viewer: Option<UserId>) {
    println!("{title}: {} постов", entries.len());
    for entry in entries {
        let mark = match viewer {
            Some(viewer) if entry.is_liked_by(viewer) => " ♥",
            _ => "",
        };
        println!(
            "- [{}] {} (лайков: {}{mark}, author_id={})",
            entry.post.id,
            entry.post.caption.as_deref().unwrap_or("<без подписи>"),
            entry.likes_count(),
            entry.post.author_id
        );
        for comment in &entry.comments_preview {
            println!("    {}: {}", comment.author_id, comment.content);
        }
    }
}

fn print_search(query: &str, results: &SearchResults) {
    if results.is_empty() {
        println!("По запросу \"{query}\" ничего не найдено");
        return;
    }
    println!("Пользователи: {}", results.profiles.len());
    for profile in &results.profiles {
        println!(
            "- @{} {} (id={})",
            profile.username,
            profile.display_name.as_deref().unwrap_or(""),
            profile.id
        );
    }
    println!("Посты: {}", results.posts.len());
    for post in &results.posts {
        println!(
            "- [{}] {}",
            post.id,
            post.caption.as_deref().unwrap_or("<без подписи>")
        );
    }
}

fn print_comments(title: &str, comments: &[Comment]) {
    println!("{title}: {}", comments.len());
    for comment in comments {
        println!(
            "- {} {}: {}",
            comment.created_at.format("%Y-%m-%d %H:%M"),
            comment.author_id,
            comment.content
        );
    }
}

fn print_post(title: &str, post: &Post) {
    println!("{title}");
    println!("id: {}", post.id);
    println!("image: {}", post.image_ref);
    println!("caption: {}", post.caption.as_deref().unwrap_or(""));
    println!("author_id: {}", post.author_id);
    println!("created_at: {}", post.created_at);
}

fn print_profile(title: &str, profile: &Profile) {
    println!("{title}");
    println!("id: {}", profile.id);
    println!("username: {}", profile.username);
    println!("name: {}", profile.display_name.as_deref().unwrap_or(""));
    println!("bio: {}", profile.bio.as_deref().unwrap_or(""));
    println!("location: {}", profile.location.as_deref().unwrap_or(""));
    if profile.banned {
        println!(
            "banned: {}",
            profile.ban_reason.as_deref().unwrap_or("без причины")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_session_content_reads_user_and_token() {
        let user = demo_user(7);
        let session = parse_session_content(&format!("  {user} abc.def.ghi \n"))
            .expect("session must parse");
        assert_eq!(session.user_id(), user);
        assert_eq!(session.access_token(), Some("abc.def.ghi"));
    }

    #[test]
    fn parse_session_content_rejects_garbage() {
        assert!(parse_session_content("   ").is_none());
        assert!(parse_session_content("not-a-uuid token").is_none());
    }

    #[test]
    fn session_content_round_trips_without_token() {
        let session = Session::new(demo_user(3));
        let parsed = parse_session_content(&format_session_content(&session))
            .expect("session must parse");
        assert_eq!(parsed.user_id(), session.user_id());
        assert!(parsed.access_token().is_none());
    }

    #[test]
    fn cli_parses_nested_admin_command() {
        let user = demo_user(2);
        let cli = Cli::try_parse_from([
            "sabagram-cli",
            "--offline",
            "admin",
            "--key",
            "secret",
            "ban",
            "--user",
            &user.to_string(),
        ])
        .expect("args must parse");

        assert!(cli.offline);
        match cli.command {
            Command::Admin {
                key,
                action: AdminCommand::Ban { user: parsed, reason },
            } => {
                assert_eq!(key, "secret");
                assert_eq!(parsed, user);
                assert!(reason.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_invalid_post_id() {
        assert!(Cli::try_parse_from(["sabagram-cli", "like", "--post", "42"]).is_err());
    }

    #[test]
    fn map_domain_error_explains_in_flight_toggle() {
        let post_id = demo_post(1);
        let err = map_domain_error(DomainError::ToggleInFlight {
            post_id,
            user_id: demo_user(1),
        });
        assert!(err.to_string().contains(&post_id.to_string()));
        assert_eq!(
            map_domain_error(DomainError::Forbidden).to_string(),
            "неверный ключ администратора"
        );
    }

    #[tokio::test]
    async fn seeded_store_has_feed_with_likes_and_comments() {
        let store = seeded_store().await.expect("seed must succeed");
        let notifier: Arc<dyn MutationNotifier> = Arc::new(TracingNotifier);
        let posts = PostService::new(store.clone(), store, notifier);

        let feed = PostCollection::new(CollectionKind::Feed);
        let loaded = posts
            .load_feed(&feed, Pagination::first_page(DEFAULT_PAGE_SIZE))
            .await
            .expect("feed must load");

        assert_eq!(loaded, 3);
        assert_eq!(feed.post_ids()[0], demo_post(3));
        assert_eq!(feed.get(demo_post(3)).expect("post 3").likes_count(), 2);
        let first = feed.get(demo_post(1)).expect("post 1");
        assert_eq!(first.comments_preview.len(), DEFAULT_PREVIEW_LIMIT);
        assert_eq!(first.comments_preview[0].content, "beautiful light");
    }

    #[tokio::test]
    async fn offline_like_toggles_feed_and_dialog_together() {
        let store = seeded_store().await.expect("seed must succeed");
        let notifier: Arc<dyn MutationNotifier> = Arc::new(TracingNotifier);
        let posts = PostService::new(store.clone(), store.clone(), notifier.clone());

        let (feed, dialog) = open_post(&posts, demo_post(2), DEFAULT_PAGE_SIZE)
            .await
            .expect("post must open");
        let coordinator = LikeToggleCoordinator::new(store, notifier);
        let session = Session::new(demo_user(2));

        let outcome = coordinator
            .toggle_like(&session, demo_post(2), &[feed.clone(), dialog.clone()])
            .await
            .expect("toggle must succeed");

        assert!(outcome.liked);
        assert_eq!(feed.is_liked(demo_post(2), demo_user(2)), Some(true));
        assert_eq!(dialog.is_liked(demo_post(2), demo_user(2)), Some(true));
    }

    #[test]
    fn map_domain_error_marks_local_rejections() {
        let err = map_domain_error(DomainError::Validation {
            field: "content",
            message: "must not be blank",
        });
        assert!(err.to_string().ends_with("(запрос не отправлялся)"));

        let err = map_domain_error(DomainError::Conflict("username: saba".to_string()));
        assert_eq!(err.to_string(), "уже существует: username: saba");
    }

    #[test]
    fn cli_parses_search_and_profile_create() {
        let cli =
            Cli::try_parse_from(["sabagram-cli", "search", "tbilisi"]).expect("args must parse");
        match cli.command {
            Command::Search { query } => assert_eq!(query, "tbilisi"),
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from([
            "sabagram-cli",
            "profile",
            "create",
            "--username",
            "lela",
        ])
        .expect("args must parse");
        match cli.command {
            Command::Profile {
                action: ProfileCommand::Create { username, name },
            } => {
                assert_eq!(username, "lela");
                assert!(name.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[tokio::test]
    async fn offline_search_finds_seeded_profile_and_post() {
        let store = seeded_store().await.expect("seed must succeed");
        let search = SearchService::new(store.clone(), store);

        let results = search.search("kha").await.expect("search must succeed");
        assert!(results.profiles.is_empty());
        assert_eq!(results.posts.len(), 1);
        assert_eq!(results.posts[0].id, demo_post(2));

        let results = search.search("NIK").await.expect("search must succeed");
        assert_eq!(results.profiles.len(), 1);
        assert_eq!(results.profiles[0].id, demo_user(2));
    }
}
