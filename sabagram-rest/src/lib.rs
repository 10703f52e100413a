//! Реализация хранилища Sabagram поверх Supabase PostgREST.
//!
//! [`RestGateway`] реализует трейты `InteractionGateway`, `PostRepository` и
//! `ProfileRepository` из `sabagram-core`, поэтому координаторы лайков и
//! комментариев работают с ним так же, как с хранилищем в памяти.
//!
//! Ошибки PostgREST приводятся к `DomainError`:
//! - повторный лайк (`23505`) не ошибка, а `LikeInsert::AlreadyExisted`;
//! - `401`/`403`/`42501` становятся `Permission`;
//! - `404`/`PGRST116`/`23503` становятся `NotFound`;
//! - таймауты, обрывы соединения и `5xx` становятся `Transient`.
#![warn(missing_docs)]

mod error;
mod gateway;
mod http_client;
mod models;

pub use error::{RestError, RestResult};
pub use gateway::RestGateway;
pub use http_client::{PostgrestClient, PostgrestConfig};
