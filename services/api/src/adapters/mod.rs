pub mod auth;
pub mod chat_llm;
pub mod clipboard;

pub use auth::InMemoryAuthAdapter;
pub use chat_llm::OpenAiChatAdapter;
pub use clipboard::WsClipboard;
