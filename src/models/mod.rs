pub mod chat;
pub mod document;
pub mod knowledgebase;
pub mod settings;
pub mod upload;
pub mod user;
