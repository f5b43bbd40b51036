pub mod analyzer;
pub mod api;
pub mod cms;
pub mod config;
pub mod data_models;
pub mod error;
pub mod html;
pub mod search;
