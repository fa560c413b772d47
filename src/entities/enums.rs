//! Enumerazioni - Tipi enumerati utilizzati nelle entità

use serde::{Deserialize, Serialize};

/// Stato di una richiesta di amicizia.
/// Pending -> Accepted e Pending -> Declined sono le uniche transizioni;
/// entrambi gli stati di arrivo sono terminali.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "UPPERCASE")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
}
