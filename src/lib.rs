pub mod admin;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod export;
pub mod feed;
pub mod firestore;
pub mod fixtures;
pub mod forms;
pub mod http_client;
pub mod news;
pub mod provider;
pub mod record;
pub mod roster;
pub mod sample;
pub mod standings;
pub mod state;
pub mod store;
