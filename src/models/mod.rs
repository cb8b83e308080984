//! Data models for assistant entities and list responses

mod chat;
mod file;
mod page;
mod user;

pub use chat::*;
pub use file::*;
pub use page::*;
pub use user::*;
