pub mod models;
pub mod query;
pub mod schema;
pub mod service;
pub mod store;
pub mod summary;
