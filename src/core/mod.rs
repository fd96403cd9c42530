pub mod models;
pub mod scheduler;
pub mod settings;
pub mod store;
