use std::collections::HashSet;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use crate::catalog::domain::model::BookEntity;
use crate::catalog::domain::service::Catalog;
use crate::core::domain::Configuration;
use crate::core::library::{LibraryError, LibraryResult};
use crate::lending::domain::service::Library;
use crate::members::domain::model::MemberEntity;
use crate::members::domain::service::MemberRegistry;
use crate::utils::date::serializer;

// LibrarySnapshot is the single opaque persistence boundary: a deep copy of
// the whole lending state. Cross references are carried as ids and re-linked
// by validation on restore, never duplicated.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    pub config: Configuration,
    pub books: Vec<BookEntity>,
    pub members: Vec<MemberEntity>,
    #[serde(with = "serializer")]
    pub taken_at: NaiveDateTime,
}

impl Library {
    pub fn snapshot(&self) -> LibrarySnapshot {
        LibrarySnapshot {
            config: self.config().clone(),
            books: self.books().cloned().collect(),
            members: self.members().cloned().collect(),
            taken_at: Utc::now().naive_utc(),
        }
    }

    // Rebuilds a Library from a snapshot, rejecting any snapshot whose cross
    // references do not line up. A corrupt snapshot must fail the restore,
    // not produce a library that violates the lending invariants.
    pub fn restore(snapshot: LibrarySnapshot) -> LibraryResult<Library> {
        validate(&snapshot).map_err(|err| {
            warn!("rejected snapshot taken at {}: {}", snapshot.taken_at, err);
            err
        })?;
        Ok(Library::from_parts(
            snapshot.config,
            Catalog::from_books(snapshot.books),
            MemberRegistry::from_members(snapshot.members),
        ))
    }
}

fn validate(snapshot: &LibrarySnapshot) -> LibraryResult<()> {
    let mut book_ids = HashSet::new();
    for book in &snapshot.books {
        if !book_ids.insert(book.book_id.as_str()) {
            return Err(LibraryError::serialization(
                format!("snapshot contains duplicate book id {}", book.book_id).as_str()));
        }
    }
    let mut member_ids = HashSet::new();
    for member in &snapshot.members {
        if !member_ids.insert(member.member_id.as_str()) {
            return Err(LibraryError::serialization(
                format!("snapshot contains duplicate member id {}", member.member_id).as_str()));
        }
    }

    for book in &snapshot.books {
        if book.borrower_id.is_some() != book.due_at.is_some() {
            return Err(LibraryError::serialization(
                format!("book {} pairs borrower and due date inconsistently", book.book_id).as_str()));
        }
        if let Some(borrower_id) = &book.borrower_id {
            let borrower = snapshot.members.iter()
                .find(|member| member.member_id == *borrower_id)
                .ok_or_else(|| LibraryError::serialization(
                    format!("book {} is issued to unknown member {}", book.book_id, borrower_id).as_str()))?;
            if !borrower.has_issued(book.book_id.as_str()) {
                return Err(LibraryError::serialization(
                    format!("member {} does not list issued book {}", borrower_id, book.book_id).as_str()));
            }
        }
        if let Some(hold) = &book.hold {
            if !member_ids.contains(hold.holder_id.as_str()) {
                return Err(LibraryError::serialization(
                    format!("hold on book {} names unknown member {}", book.book_id, hold.holder_id).as_str()));
            }
            if book.borrower_id.as_deref() == Some(hold.holder_id.as_str()) {
                return Err(LibraryError::serialization(
                    format!("hold on book {} names its own borrower", book.book_id).as_str()));
            }
        }
    }

    for member in &snapshot.members {
        for book_id in &member.issued_book_ids {
            let book = snapshot.books.iter()
                .find(|book| book.book_id == *book_id)
                .ok_or_else(|| LibraryError::serialization(
                    format!("member {} lists unknown issued book {}", member.member_id, book_id).as_str()))?;
            if book.borrower_id.as_deref() != Some(member.member_id.as_str()) {
                return Err(LibraryError::serialization(
                    format!("book {} is not issued to member {}", book_id, member.member_id).as_str()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::core::domain::Configuration;
    use crate::core::library::LibraryError;
    use crate::lending::domain::service::Library;

    fn populated_library() -> (Library, String, String) {
        let mut library = Library::new(Configuration::new());
        let member_id = library.add_member("Ada", "12 Pine St", "555-0134")
            .expect("member").member_id.to_string();
        let holder_id = library.add_member("Grace", "4 Oak Ave", "555-0178")
            .expect("member").member_id.to_string();
        library.add_book("Dune", "Herbert", "B1").expect("book");
        library.add_book("Hyperion", "Simmons", "B2").expect("book");
        library.issue_book(member_id.as_str(), "B1").expect("issue");
        library.place_hold(holder_id.as_str(), "B1", 7).expect("hold");
        (library, member_id, holder_id)
    }

    #[test]
    fn test_should_round_trip_snapshot() {
        let (library, member_id, holder_id) = populated_library();
        let json = serde_json::to_string(&library.snapshot()).expect("serialize");
        let snapshot = serde_json::from_str(json.as_str()).expect("deserialize");
        let restored = Library::restore(snapshot).expect("restore");

        let book = restored.search_book("B1").expect("book");
        assert_eq!(Some(member_id.to_string()), book.borrower_id);
        assert!(book.is_held_by(holder_id.as_str()));
        assert_eq!(2, restored.books().count());
        assert_eq!(2, restored.members().count());
        assert!(restored.search_member(member_id.as_str()).expect("member").has_issued("B1"));
    }

    #[test]
    fn test_should_reject_dangling_borrower() {
        let (library, _, _) = populated_library();
        let mut snapshot = library.snapshot();
        snapshot.members.retain(|member| !member.has_issued("B1"));
        let res = Library::restore(snapshot);
        assert!(matches!(res, Err(LibraryError::Serialization { message: _ })));
    }

    #[test]
    fn test_should_reject_issued_list_mismatch() {
        let (library, _, _) = populated_library();
        let mut snapshot = library.snapshot();
        for member in snapshot.members.iter_mut() {
            member.issued_book_ids.retain(|book_id| book_id != "B1");
        }
        let res = Library::restore(snapshot);
        assert!(matches!(res, Err(LibraryError::Serialization { message: _ })));
    }

    #[test]
    fn test_should_reject_unpaired_due_date() {
        let (library, _, _) = populated_library();
        let mut snapshot = library.snapshot();
        for book in snapshot.books.iter_mut() {
            if book.book_id == "B1" {
                book.due_at = None;
            }
        }
        let res = Library::restore(snapshot);
        assert!(matches!(res, Err(LibraryError::Serialization { message: _ })));
    }

    #[test]
    fn test_should_reject_duplicate_book_ids() {
        let (library, _, _) = populated_library();
        let mut snapshot = library.snapshot();
        let duplicate = snapshot.books[1].clone();
        snapshot.books.push(duplicate);
        let res = Library::restore(snapshot);
        assert!(matches!(res, Err(LibraryError::Serialization { message: _ })));
    }

    #[test]
    fn test_should_reject_hold_held_by_borrower() {
        let (library, member_id, _) = populated_library();
        let mut snapshot = library.snapshot();
        for book in snapshot.books.iter_mut() {
            if let Some(hold) = book.hold.as_mut() {
                hold.holder_id = member_id.to_string();
            }
        }
        let res = Library::restore(snapshot);
        assert!(matches!(res, Err(LibraryError::Serialization { message: _ })));
    }
}
