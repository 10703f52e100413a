//! Слой согласованности взаимодействий Sabagram.
//!
//! Держит экранное состояние постов (лайки, превью комментариев)
//! согласованным с хранилищем: оптимистичные обновления, сверка с ответом
//! сервера и откат при ошибке. Само хранилище скрыто за трейтами из
//! [`data`]; реализация поверх PostgREST живёт в крейте `sabagram-rest`.
//!
//! Основные точки входа:
//! - [`LikeToggleCoordinator`] - переключение лайка;
//! - [`CommentAppendCoordinator`] - добавление комментария;
//! - [`PostCollection`] - проекция постов для одного экрана.

pub mod application;
pub mod data;
pub mod domain;
pub mod infrastructure;
pub mod view_model;

pub use application::admin_service::AdminService;
pub use application::comment_coordinator::{CommentAppendCoordinator, DEFAULT_PREVIEW_LIMIT};
pub use application::like_coordinator::LikeToggleCoordinator;
pub use application::post_service::PostService;
pub use application::profile_service::ProfileService;
pub use application::search_service::{SEARCH_LIMIT, SearchResults, SearchService};
pub use domain::error::DomainError;
pub use domain::ids::{CommentId, PostId, UserId};
pub use domain::session::{AdminGrant, Session};
pub use view_model::{CollectionHandle, CollectionKind, PostCollection, PostEntry};
