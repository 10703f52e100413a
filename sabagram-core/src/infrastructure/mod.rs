pub mod logging;
pub mod revalidation;
pub mod settings;
