pub mod catalog;
pub mod filters;
pub mod property;
pub mod schema;
