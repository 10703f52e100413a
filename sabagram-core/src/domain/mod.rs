pub mod error;
pub mod ids;
pub mod interaction;
pub mod post;
pub mod profile;
pub mod session;
