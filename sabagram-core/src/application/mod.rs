pub mod admin_service;
pub mod comment_coordinator;
pub mod like_coordinator;
pub mod post_service;
pub mod profile_service;
pub mod search_service;
mod revalidation;
