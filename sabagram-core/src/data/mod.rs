pub mod interaction_gateway;
pub mod notifier;
pub mod post_repository;
pub mod profile_repository;
pub mod repositories;
