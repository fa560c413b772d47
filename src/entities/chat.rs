//! Chat entity - Chat 1:1 identificata dalla chiave canonica della coppia

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Separatore tra i due id utente nella chiave della chat.
/// Le chiavi di conversazione dei gruppi sono id decimali puri, quindi i due
/// spazi di chiavi non possono collidere.
pub const CHAT_ID_SEPARATOR: char = '_';

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Chat {
    pub chat_id: String,
    pub member_low: i32,
    pub member_high: i32,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    /// Deriva l'identificatore canonico della chat tra due utenti: i due id
    /// vengono resi come stringhe, ordinati lessicograficamente e uniti con
    /// il separatore. Pura e commutativa: derive_id(a, b) == derive_id(b, a),
    /// quindi entrambi i partecipanti risolvono la stessa conversazione senza
    /// alcuna lettura dal database.
    pub fn derive_id(user_a: i32, user_b: i32) -> String {
        let (a, b) = (user_a.to_string(), user_b.to_string());
        if a <= b {
            format!("{a}{CHAT_ID_SEPARATOR}{b}")
        } else {
            format!("{b}{CHAT_ID_SEPARATOR}{a}")
        }
    }

    /// Inversa di derive_id: accetta solo identificatori canonici (due id
    /// distinti, in ordine canonico) e restituisce la coppia di partecipanti.
    pub fn parse_id(chat_id: &str) -> Option<(i32, i32)> {
        let (low, high) = chat_id.split_once(CHAT_ID_SEPARATOR)?;
        if low == high {
            return None;
        }
        let pair = (low.parse().ok()?, high.parse().ok()?);
        // il round-trip esclude forme non canoniche tipo "2_1" o "01_2"
        (Self::derive_id(pair.0, pair.1) == chat_id).then_some(pair)
    }

    /// True se l'utente è uno dei due partecipanti codificati nell'id.
    pub fn involves(chat_id: &str, user_id: i32) -> bool {
        Self::parse_id(chat_id).is_some_and(|(low, high)| low == user_id || high == user_id)
    }

    /// I due partecipanti della chat.
    pub fn members(&self) -> [i32; 2] {
        [self.member_low, self.member_high]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_id_is_commutative() {
        assert_eq!(Chat::derive_id(1, 2), Chat::derive_id(2, 1));
        assert_eq!(Chat::derive_id(1, 2), "1_2");
    }

    #[test]
    fn test_derive_id_sorts_lexicographically() {
        // "10" precede "9" nell'ordine lessicografico delle stringhe
        assert_eq!(Chat::derive_id(9, 10), "10_9");
        assert_eq!(Chat::derive_id(10, 9), "10_9");
    }

    #[test]
    fn test_derive_id_unique_per_pair() {
        let pairs = [(1, 2), (1, 3), (2, 3), (1, 23), (12, 3), (9, 10)];
        for (i, a) in pairs.iter().enumerate() {
            for b in pairs.iter().skip(i + 1) {
                assert_ne!(
                    Chat::derive_id(a.0, a.1),
                    Chat::derive_id(b.0, b.1),
                    "le coppie {:?} e {:?} devono avere id distinti",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn test_parse_id_roundtrip() {
        let id = Chat::derive_id(42, 7);
        assert_eq!(Chat::parse_id(&id), Some((42, 7)));
    }

    #[test]
    fn test_parse_id_rejects_non_canonical() {
        assert_eq!(Chat::parse_id("2_1"), None); // ordine non canonico
        assert_eq!(Chat::parse_id("01_2"), None); // zeri iniziali
        assert_eq!(Chat::parse_id("1_1"), None); // partecipanti coincidenti
        assert_eq!(Chat::parse_id("1_2_3"), None);
        assert_eq!(Chat::parse_id("abc"), None);
        assert_eq!(Chat::parse_id("_2"), None);
        assert_eq!(Chat::parse_id(""), None);
    }

    #[test]
    fn test_involves() {
        assert!(Chat::involves("1_2", 1));
        assert!(Chat::involves("1_2", 2));
        assert!(!Chat::involves("1_2", 3));
        assert!(!Chat::involves("not_an_id", 1));
    }
}
