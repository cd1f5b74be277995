pub mod commands;
pub mod dispatcher;
pub mod telegram;

pub use dispatcher::Dispatcher;
pub use telegram::TelegramClient;
