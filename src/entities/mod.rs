//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene tutte le entità (models) che rappresentano i dati persistiti nel database.
//! Ogni entity corrisponde a una tabella nel database.

pub mod chat;
pub mod enums;
pub mod friend_request;
pub mod group;
pub mod message;
pub mod user;

// Re-exports per facilitare l'import
pub use chat::Chat;
pub use enums::RequestStatus;
pub use friend_request::FriendRequest;
pub use group::Group;
pub use message::Message;
pub use user::User;
