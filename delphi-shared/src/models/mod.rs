pub mod bot;
pub mod debug;
pub mod errors;
pub mod message;
pub mod threads;

pub use bot::{Bot, BotStatus, CreateBotRequest, ToggleRequest};
pub use debug::{DebugInfo, DebugStep};
pub use errors::ErrorResponse;
pub use message::{CreateMessageResponse, InputError, Message, NewMessage};
pub use threads::{ThreadedMessage, flatten_forest, organize_threads};
