use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::core::domain::Identifiable;
use crate::core::library::BookStatus;
use crate::utils::date::serializer;

// BookEntity abstracts one physical book in the catalog. The borrower and
// the due date are assigned by the Library and are always set or cleared
// together; a book carries at most one hold at a time.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BookEntity {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub borrower_id: Option<String>,
    pub due_at: Option<NaiveDateTime>,
    pub hold: Option<HoldEntity>,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
}

impl BookEntity {
    pub fn new(title: &str, author: &str, book_id: &str) -> Self {
        Self {
            book_id: book_id.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            borrower_id: None,
            due_at: None,
            hold: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    pub fn status(&self) -> BookStatus {
        if self.borrower_id.is_some() {
            BookStatus::CheckedOut
        } else {
            BookStatus::Available
        }
    }

    pub fn is_checked_out(&self) -> bool {
        self.borrower_id.is_some()
    }

    pub fn has_hold(&self) -> bool {
        self.hold.is_some()
    }

    pub fn is_removable(&self) -> bool {
        !self.is_checked_out() && !self.has_hold()
    }

    pub fn is_held_by(&self, member_id: &str) -> bool {
        self.hold.as_ref().map(|hold| hold.holder_id == member_id).unwrap_or(false)
    }

    pub(crate) fn issue_to(&mut self, member_id: &str, due_at: NaiveDateTime) {
        self.borrower_id = Some(member_id.to_string());
        self.due_at = Some(due_at);
    }

    pub(crate) fn clear_loan(&mut self) {
        self.borrower_id = None;
        self.due_at = None;
    }

    pub(crate) fn set_hold(&mut self, hold: HoldEntity) {
        self.hold = Some(hold);
    }

    pub(crate) fn take_hold(&mut self) -> Option<HoldEntity> {
        self.hold.take()
    }
}

impl Identifiable for BookEntity {
    fn id(&self) -> String {
        self.book_id.to_string()
    }
}

// HoldEntity records a reservation placed by a member on a currently-issued
// book; the holder gets the book when the hold is processed.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct HoldEntity {
    pub holder_id: String,
    #[serde(with = "serializer")]
    pub placed_at: NaiveDateTime,
    pub duration_days: i64,
}

impl HoldEntity {
    pub fn new(holder_id: &str, duration_days: i64) -> Self {
        Self {
            holder_id: holder_id.to_string(),
            placed_at: Utc::now().naive_utc(),
            duration_days,
        }
    }

    pub fn expires_at(&self) -> NaiveDateTime {
        self.placed_at + Duration::days(self.duration_days)
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expires_at() < now
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use crate::catalog::domain::model::{BookEntity, HoldEntity};
    use crate::core::library::BookStatus;

    #[test]
    fn test_should_build_book() {
        let book = BookEntity::new("Dune", "Herbert", "B1");
        assert_eq!("B1", book.book_id.as_str());
        assert_eq!("Dune", book.title.as_str());
        assert_eq!("Herbert", book.author.as_str());
        assert_eq!(BookStatus::Available, book.status());
        assert!(book.is_removable());
    }

    #[test]
    fn test_should_pair_borrower_and_due_date() {
        let mut book = BookEntity::new("Dune", "Herbert", "B1");
        let due_at = Utc::now().naive_utc() + Duration::days(14);
        book.issue_to("M1", due_at);
        assert_eq!(book.borrower_id.is_some(), book.due_at.is_some());
        assert_eq!(BookStatus::CheckedOut, book.status());
        book.clear_loan();
        assert_eq!(book.borrower_id.is_some(), book.due_at.is_some());
        assert_eq!(BookStatus::Available, book.status());
    }

    #[test]
    fn test_should_track_hold() {
        let mut book = BookEntity::new("Dune", "Herbert", "B1");
        assert!(!book.is_held_by("M2"));
        book.set_hold(HoldEntity::new("M2", 7));
        assert!(book.has_hold());
        assert!(book.is_held_by("M2"));
        assert!(!book.is_removable());
        let hold = book.take_hold().expect("hold");
        assert_eq!("M2", hold.holder_id.as_str());
        assert!(!book.has_hold());
    }

    #[test]
    fn test_should_expire_hold_after_duration() {
        let hold = HoldEntity::new("M2", 7);
        let now = Utc::now().naive_utc();
        assert!(!hold.is_expired(now));
        assert_eq!(hold.placed_at + Duration::days(7), hold.expires_at());
        assert!(hold.is_expired(now + Duration::days(8)));
    }
}
