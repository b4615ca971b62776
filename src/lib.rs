pub mod client;
mod log;
pub mod protocol;
mod traits;
mod utils;

pub use self::client::{Client, Event, Transport};
