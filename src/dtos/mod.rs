//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene tutti i DTOs usati per la comunicazione client-server.
//! I DTOs separano la rappresentazione esterna (API) dalla rappresentazione interna (entities).

pub mod chat;
pub mod group;
pub mod message;
pub mod query;
pub mod request;
pub mod user;

// Re-exports per mantenere import compatti nei services
pub use chat::ChatDTO;
pub use group::{CreateGroupDTO, GroupDTO};
pub use message::{CreateMessageDTO, MessageDTO};
pub use query::{MessagesQuery, UserSearchQuery};
pub use request::{CreateFriendRequestDTO, EnrichedRequestDTO, FriendRequestDTO};
pub use user::{CreateUserDTO, ProfileDTO, UpdateProfileDTO, UserDTO};
