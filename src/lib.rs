pub mod api;
pub mod auth;
pub mod config;
pub mod course;
pub mod db;
pub mod error;
pub mod learner;
pub mod search;
pub mod utils;
pub mod video;
