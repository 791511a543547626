pub mod hub;
pub mod messages;

pub use hub::Hub;
pub use messages::{ClientMessage, ServerEvent};
