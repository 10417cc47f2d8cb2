use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::domain::Identifiable;
use crate::core::library::TransactionKind;
use crate::utils::date::serializer;

// TransactionEntity is one immutable record in a member's lending history.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct TransactionEntity {
    pub transaction_id: String,
    pub kind: TransactionKind,
    pub book_id: String,
    pub book_title: String,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
}

impl TransactionEntity {
    pub fn new(kind: TransactionKind, book_id: &str, book_title: &str) -> Self {
        Self {
            transaction_id: Uuid::new_v4().to_string(),
            kind,
            book_id: book_id.to_string(),
            book_title: book_title.to_string(),
            created_at: Utc::now().naive_utc(),
        }
    }
}

// MemberEntity abstracts one registered patron. The issued list holds weak
// references (book ids) in issue order; the transaction log is append-only.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MemberEntity {
    pub member_id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub issued_book_ids: Vec<String>,
    pub transactions: Vec<TransactionEntity>,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
}

impl MemberEntity {
    pub fn new(name: &str, address: &str, phone: &str) -> Self {
        Self {
            member_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            address: address.to_string(),
            phone: phone.to_string(),
            issued_book_ids: Vec::new(),
            transactions: Vec::new(),
            created_at: Utc::now().naive_utc(),
        }
    }

    pub fn issued_count(&self) -> usize {
        self.issued_book_ids.len()
    }

    pub fn has_issued(&self, book_id: &str) -> bool {
        self.issued_book_ids.iter().any(|id| id == book_id)
    }

    pub fn transactions(&self) -> impl Iterator<Item = &TransactionEntity> {
        self.transactions.iter()
    }

    pub(crate) fn issue(&mut self, book_id: &str) {
        if !self.has_issued(book_id) {
            self.issued_book_ids.push(book_id.to_string());
        }
    }

    pub(crate) fn discharge(&mut self, book_id: &str) -> bool {
        let before = self.issued_book_ids.len();
        self.issued_book_ids.retain(|id| id != book_id);
        self.issued_book_ids.len() < before
    }

    pub(crate) fn record(&mut self, transaction: TransactionEntity) {
        self.transactions.push(transaction);
    }
}

impl Identifiable for MemberEntity {
    fn id(&self) -> String {
        self.member_id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use crate::core::library::TransactionKind;
    use crate::members::domain::model::{MemberEntity, TransactionEntity};

    #[test]
    fn test_should_build_member() {
        let member = MemberEntity::new("Ada", "12 Pine St", "555-0134");
        assert_eq!("Ada", member.name.as_str());
        assert_eq!("12 Pine St", member.address.as_str());
        assert_eq!("555-0134", member.phone.as_str());
        assert!(!member.member_id.is_empty());
        assert_eq!(0, member.issued_count());
    }

    #[test]
    fn test_should_issue_and_discharge() {
        let mut member = MemberEntity::new("Ada", "12 Pine St", "555-0134");
        member.issue("B1");
        member.issue("B2");
        member.issue("B1");
        assert_eq!(2, member.issued_count());
        assert!(member.has_issued("B1"));
        assert!(member.discharge("B1"));
        assert!(!member.discharge("B1"));
        assert_eq!(1, member.issued_count());
    }

    #[test]
    fn test_should_append_transactions_in_order() {
        let mut member = MemberEntity::new("Ada", "12 Pine St", "555-0134");
        member.record(TransactionEntity::new(TransactionKind::Issued, "B1", "Dune"));
        member.record(TransactionEntity::new(TransactionKind::Returned, "B1", "Dune"));
        let kinds: Vec<TransactionKind> = member.transactions().map(|t| t.kind).collect();
        assert_eq!(vec![TransactionKind::Issued, TransactionKind::Returned], kinds);
        assert_eq!("Dune", member.transactions[0].book_title.as_str());
    }
}
