pub mod api;
pub mod clock;
pub mod config;
pub mod geo;
pub mod models;
pub mod redirect;
pub mod service;
pub mod shortcode;
pub mod storage;
