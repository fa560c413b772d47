//! Repositories module - Coordinatore per tutti i repository del progetto
//!
//! Questo modulo organizza i repository in sotto-moduli separati per una migliore manutenibilità.
//! Ogni repository gestisce le operazioni di database per una specifica entità.

// ************************* NOTA SU SQLX ************************* //

/*
   Le query usano la forma a funzione (sqlx::query / sqlx::query_as + FromRow),
   verificata a runtime, e non le macro con check a compile-time: le macro
   richiedono un database raggiungibile (o la cache offline) ad ogni build,
   mentre così il crate compila ovunque e lo schema resta verificato dai test
   con #[sqlx::test], che applicano le migrations e i fixtures su un database
   di test isolato.
*/

// Dichiarazione dei sotto-moduli
pub mod chat;
pub mod friend_request;
pub mod group;
pub mod message;
pub mod traits;
pub mod user;

// Re-esportazione dei trait per facilitare l'import
pub use traits::{Create, Delete, Read, Update};

// Re-esportazione delle struct dei repository per facilitare l'import
pub use chat::ChatRepository;
pub use friend_request::FriendRequestRepository;
pub use group::GroupRepository;
pub use message::MessageRepository;
pub use user::UserRepository;
