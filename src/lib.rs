pub mod catalog;
pub mod compare;
pub mod config;
pub mod engine;
pub mod output;
pub mod selection;
