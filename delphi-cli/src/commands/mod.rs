pub mod bots;
pub mod clear;
pub mod completion;
pub mod config;
pub mod debug;
pub mod feed;
pub mod post;
pub mod session;
