pub mod api;
pub mod commands;
pub mod config;
pub mod generics;
pub mod humanize;
pub mod observability;
pub mod processors;
