pub mod chats;
pub mod client;
pub mod error;
pub mod friends;
pub mod geo;
pub mod location;
pub mod moments;
pub mod presence;
pub mod store;
pub mod types;

pub use client::Client;
pub use error::{CoreError, Result};
