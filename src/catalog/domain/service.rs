use tracing::debug;
use crate::catalog::domain::model::BookEntity;
use crate::core::domain::id_at_position;
use crate::core::library::{LibraryError, LibraryResult};

// Catalog owns every book in the branch. Insertion order is preserved so the
// filtered views below yield a stable, deterministic sequence; the views are
// plain borrowing iterators over the live collection (one-shot, no snapshot),
// which is only sound because a single Library mutates it between reads.
#[derive(Debug, Default)]
pub struct Catalog {
    books: Vec<BookEntity>,
}

impl Catalog {
    pub fn new() -> Self {
        Self { books: Vec::new() }
    }

    pub(crate) fn from_books(books: Vec<BookEntity>) -> Self {
        Self { books }
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn search(&self, book_id: &str) -> Option<&BookEntity> {
        self.books.iter().find(|book| book.book_id == book_id)
    }

    pub(crate) fn search_mut(&mut self, book_id: &str) -> Option<&mut BookEntity> {
        self.books.iter_mut().find(|book| book.book_id == book_id)
    }

    pub fn insert_book(&mut self, book: BookEntity) -> LibraryResult<()> {
        if self.search(book.book_id.as_str()).is_some() {
            return Err(LibraryError::already_exists(
                format!("book with id {} already in catalog", book.book_id).as_str()));
        }
        debug!("catalog insert {}", book.book_id);
        self.books.push(book);
        Ok(())
    }

    // Removes unconditionally once found; the Library enforces the
    // no-borrower, no-hold preconditions before calling this.
    pub fn remove_book(&mut self, book_id: &str) -> bool {
        let before = self.books.len();
        self.books.retain(|book| book.book_id != book_id);
        self.books.len() < before
    }

    pub fn books(&self) -> impl Iterator<Item = &BookEntity> {
        self.books.iter()
    }

    pub fn checked_out(&self) -> impl Iterator<Item = &BookEntity> {
        self.books.iter().filter(|book| book.is_checked_out())
    }

    pub fn not_checked_out(&self) -> impl Iterator<Item = &BookEntity> {
        self.books.iter().filter(|book| !book.is_checked_out())
    }

    pub fn removable(&self) -> impl Iterator<Item = &BookEntity> {
        self.books.iter().filter(|book| book.is_removable())
    }

    pub fn on_hold(&self) -> impl Iterator<Item = &BookEntity> {
        self.books.iter().filter(|book| book.is_checked_out() && book.has_hold())
    }

    // The sequence must have been generated with the identical filter as the
    // list the position was picked from; interactive flows should capture the
    // displayed id sequence instead and index into that.
    pub fn book_id_at<'a>(position: usize, books: impl Iterator<Item = &'a BookEntity>) -> Option<String> {
        id_at_position(position, books)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use crate::catalog::domain::model::{BookEntity, HoldEntity};
    use crate::catalog::domain::service::Catalog;
    use crate::core::library::LibraryError;

    fn seeded() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.insert_book(BookEntity::new("Dune", "Herbert", "B1")).expect("insert");
        catalog.insert_book(BookEntity::new("Hyperion", "Simmons", "B2")).expect("insert");
        catalog.insert_book(BookEntity::new("Solaris", "Lem", "B3")).expect("insert");
        catalog
    }

    fn issue(catalog: &mut Catalog, book_id: &str, member_id: &str) {
        let due_at = Utc::now().naive_utc() + Duration::days(14);
        catalog.search_mut(book_id).expect("book").issue_to(member_id, due_at);
    }

    #[test]
    fn test_should_insert_and_search() {
        let catalog = seeded();
        assert_eq!(3, catalog.len());
        assert_eq!("Dune", catalog.search("B1").expect("book").title.as_str());
        assert!(catalog.search("B9").is_none());
    }

    #[test]
    fn test_should_reject_duplicate_id() {
        let mut catalog = seeded();
        let res = catalog.insert_book(BookEntity::new("Other", "Other", "B1"));
        assert!(matches!(res, Err(LibraryError::AlreadyExists { message: _ })));
        assert_eq!(3, catalog.len());
    }

    #[test]
    fn test_should_remove_book() {
        let mut catalog = seeded();
        assert!(catalog.remove_book("B2"));
        assert!(!catalog.remove_book("B2"));
        assert_eq!(2, catalog.len());
    }

    #[test]
    fn test_should_filter_views_in_insertion_order() {
        let mut catalog = seeded();
        issue(&mut catalog, "B1", "M1");
        issue(&mut catalog, "B3", "M2");
        catalog.search_mut("B3").expect("book").set_hold(HoldEntity::new("M1", 7));

        let checked_out: Vec<&str> = catalog.checked_out().map(|b| b.book_id.as_str()).collect();
        assert_eq!(vec!["B1", "B3"], checked_out);

        let not_checked_out: Vec<&str> = catalog.not_checked_out().map(|b| b.book_id.as_str()).collect();
        assert_eq!(vec!["B2"], not_checked_out);

        let removable: Vec<&str> = catalog.removable().map(|b| b.book_id.as_str()).collect();
        assert_eq!(vec!["B2"], removable);

        let on_hold: Vec<&str> = catalog.on_hold().map(|b| b.book_id.as_str()).collect();
        assert_eq!(vec!["B3"], on_hold);
    }

    #[test]
    fn test_should_resolve_position_against_matching_sequence() {
        let mut catalog = seeded();
        issue(&mut catalog, "B2", "M1");

        assert_eq!(Some("B3".to_string()), Catalog::book_id_at(2, catalog.not_checked_out()));
        assert_eq!(Some("B2".to_string()), Catalog::book_id_at(1, catalog.checked_out()));
        assert_eq!(None, Catalog::book_id_at(0, catalog.books()));
        assert_eq!(None, Catalog::book_id_at(4, catalog.books()));
    }
}
