//! HTTP surface of the checker
//!
//! Each endpoint exercises one resolution path: generic pre/post processors,
//! a generic command handler behind middleware, query and header binding,
//! and response caching.

mod binding;
mod cache;
mod error;
pub mod models;
pub mod probes;
pub mod registrations;
mod server;
pub mod services;
pub mod state;

pub use binding::{BindingError, OrderStatus, Permissions, Priority};
pub use cache::ResponseCache;
pub use error::ApiError;
pub use server::{router, run};
