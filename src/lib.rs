pub mod auth;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod export;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod reminders;
pub mod snapshot;
pub mod tenant;
