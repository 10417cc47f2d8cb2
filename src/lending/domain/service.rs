use chrono::{Duration, NaiveDateTime, Utc};
use tracing::info;
use crate::catalog::domain::model::{BookEntity, HoldEntity};
use crate::catalog::domain::service::Catalog;
use crate::core::domain::Configuration;
use crate::core::library::{LibraryError, LibraryResult, TransactionKind};
use crate::members::domain::model::{MemberEntity, TransactionEntity};
use crate::members::domain::service::MemberRegistry;

// Library orchestrates the lending and hold policy over the catalog and the
// member registry. It is the sole mutator of the borrower/hold linkage:
// every operation validates all of its preconditions before the first
// mutation, so a rejected call leaves no partial state behind.
#[derive(Debug)]
pub struct Library {
    config: Configuration,
    catalog: Catalog,
    members: MemberRegistry,
}

impl Library {
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            catalog: Catalog::new(),
            members: MemberRegistry::new(),
        }
    }

    pub(crate) fn from_parts(config: Configuration, catalog: Catalog, members: MemberRegistry) -> Self {
        Self { config, catalog, members }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    fn due_from(&self, start: NaiveDateTime) -> NaiveDateTime {
        start + Duration::days(self.config.loan_period_days)
    }

    pub fn add_book(&mut self, title: &str, author: &str, book_id: &str) -> LibraryResult<&BookEntity> {
        self.catalog.insert_book(BookEntity::new(title, author, book_id))?;
        info!("added book {} ({})", book_id, title);
        self.catalog.search(book_id)
            .ok_or_else(|| LibraryError::runtime(
                format!("book {} missing after insert", book_id).as_str(), None))
    }

    pub fn add_member(&mut self, name: &str, address: &str, phone: &str) -> LibraryResult<&MemberEntity> {
        let member = MemberEntity::new(name, address, phone);
        let member_id = member.member_id.to_string();
        self.members.insert_member(member)?;
        info!("registered member {} ({})", member_id, name);
        self.members.search(member_id.as_str())
            .ok_or_else(|| LibraryError::runtime(
                format!("member {} missing after insert", member_id).as_str(), None))
    }

    pub fn issue_book(&mut self, member_id: &str, book_id: &str) -> LibraryResult<&BookEntity> {
        let member = self.members.search(member_id)
            .ok_or_else(|| LibraryError::not_found(
                format!("member with id {} not found", member_id).as_str()))?;
        if member.issued_count() >= self.config.max_issued_books {
            return Err(LibraryError::invalid_state(
                format!("member {} already has {} books issued", member_id, member.issued_count()).as_str(),
                Some("over_limit".to_string())));
        }
        let book = self.catalog.search(book_id)
            .ok_or_else(|| LibraryError::not_found(
                format!("book with id {} not found", book_id).as_str()))?;
        if book.is_checked_out() {
            return Err(LibraryError::invalid_state(
                format!("book {} is already checked out", book_id).as_str(),
                Some("book_issued".to_string())));
        }
        let title = book.title.to_string();
        let due_at = self.due_from(Utc::now().naive_utc());

        self.book_mut(book_id)?.issue_to(member_id, due_at);
        let member = self.member_mut(member_id)?;
        member.issue(book_id);
        member.record(TransactionEntity::new(TransactionKind::Issued, book_id, title.as_str()));
        info!("issued book {} to member {}", book_id, member_id);
        self.checked_book(book_id)
    }

    pub fn return_book(&mut self, book_id: &str) -> LibraryResult<()> {
        let book = self.catalog.search(book_id)
            .ok_or_else(|| LibraryError::not_found(
                format!("book with id {} not found", book_id).as_str()))?;
        let borrower_id = match &book.borrower_id {
            Some(borrower_id) => borrower_id.to_string(),
            None => {
                return Err(LibraryError::invalid_state(
                    format!("book {} is not checked out", book_id).as_str(),
                    Some("book_not_issued".to_string())));
            }
        };
        if book.has_hold() {
            // Held books are handed over through process_hold so the holder
            // keeps first claim; an ordinary return would lose that.
            return Err(LibraryError::invalid_state(
                format!("book {} has an active hold", book_id).as_str(),
                Some("book_has_hold".to_string())));
        }
        let title = book.title.to_string();
        if self.members.search(borrower_id.as_str()).is_none() {
            return Err(LibraryError::runtime(
                format!("book {} is issued to unknown member {}", book_id, borrower_id).as_str(), None));
        }

        self.book_mut(book_id)?.clear_loan();
        let member = self.member_mut(borrower_id.as_str())?;
        member.discharge(book_id);
        member.record(TransactionEntity::new(TransactionKind::Returned, book_id, title.as_str()));
        info!("returned book {} from member {}", book_id, borrower_id);
        Ok(())
    }

    pub fn renew_book(&mut self, book_id: &str, member_id: &str) -> LibraryResult<&BookEntity> {
        if self.members.search(member_id).is_none() {
            return Err(LibraryError::not_found(
                format!("member with id {} not found", member_id).as_str()));
        }
        let book = self.catalog.search(book_id)
            .ok_or_else(|| LibraryError::not_found(
                format!("book with id {} not found", book_id).as_str()))?;
        match &book.borrower_id {
            None => {
                return Err(LibraryError::invalid_state(
                    format!("book {} is not checked out", book_id).as_str(),
                    Some("book_not_issued".to_string())));
            }
            Some(borrower_id) if borrower_id != member_id => {
                return Err(LibraryError::invalid_state(
                    format!("book {} is not issued to member {}", book_id, member_id).as_str(),
                    Some("not_issued_to_member".to_string())));
            }
            Some(_) => {}
        }
        if book.has_hold() {
            return Err(LibraryError::invalid_state(
                format!("book {} has an active hold and cannot be renewed", book_id).as_str(),
                Some("book_has_hold".to_string())));
        }
        let title = book.title.to_string();
        // The new due date runs from the renewal date, not the old due date.
        let due_at = self.due_from(Utc::now().naive_utc());

        self.book_mut(book_id)?.issue_to(member_id, due_at);
        self.member_mut(member_id)?
            .record(TransactionEntity::new(TransactionKind::Renewed, book_id, title.as_str()));
        info!("renewed book {} for member {}", book_id, member_id);
        self.checked_book(book_id)
    }

    pub fn remove_book(&mut self, book_id: &str) -> LibraryResult<()> {
        let book = self.catalog.search(book_id)
            .ok_or_else(|| LibraryError::not_found(
                format!("book with id {} not found", book_id).as_str()))?;
        if book.is_checked_out() {
            return Err(LibraryError::invalid_state(
                format!("book {} is currently checked out", book_id).as_str(),
                Some("book_issued".to_string())));
        }
        if book.has_hold() {
            return Err(LibraryError::invalid_state(
                format!("book {} has an active hold", book_id).as_str(),
                Some("book_has_hold".to_string())));
        }
        if !self.catalog.remove_book(book_id) {
            return Err(LibraryError::runtime(
                format!("book {} could not be removed", book_id).as_str(), None));
        }
        info!("removed book {}", book_id);
        Ok(())
    }

    pub fn place_hold(&mut self, member_id: &str, book_id: &str, duration_days: i64) -> LibraryResult<()> {
        let book = self.catalog.search(book_id)
            .ok_or_else(|| LibraryError::not_found(
                format!("book with id {} not found", book_id).as_str()))?;
        if !book.is_checked_out() {
            // A hold on an available book is meaningless: it could simply be
            // issued instead.
            return Err(LibraryError::invalid_state(
                format!("book {} is not checked out", book_id).as_str(),
                Some("book_not_issued".to_string())));
        }
        if self.members.search(member_id).is_none() {
            return Err(LibraryError::not_found(
                format!("member with id {} not found", member_id).as_str()));
        }
        if book.has_hold() {
            return Err(LibraryError::already_exists(
                format!("book {} already has a hold", book_id).as_str()));
        }
        if book.borrower_id.as_deref() == Some(member_id) {
            return Err(LibraryError::invalid_state(
                format!("member {} already has book {} issued", member_id, book_id).as_str(),
                Some("holder_is_borrower".to_string())));
        }
        if duration_days <= 0 {
            return Err(LibraryError::invalid_state(
                format!("hold duration of {} days is not valid", duration_days).as_str(),
                Some("invalid_duration".to_string())));
        }

        self.book_mut(book_id)?.set_hold(HoldEntity::new(member_id, duration_days));
        info!("placed hold on book {} for member {}", book_id, member_id);
        Ok(())
    }

    pub fn remove_hold(&mut self, member_id: &str, book_id: &str) -> LibraryResult<()> {
        let book = self.catalog.search(book_id)
            .ok_or_else(|| LibraryError::not_found(
                format!("book with id {} not found", book_id).as_str()))?;
        if self.members.search(member_id).is_none() {
            return Err(LibraryError::not_found(
                format!("member with id {} not found", member_id).as_str()));
        }
        match &book.hold {
            None => {
                return Err(LibraryError::invalid_state(
                    format!("book {} has no hold", book_id).as_str(),
                    Some("no_hold".to_string())));
            }
            Some(hold) if hold.holder_id != member_id => {
                return Err(LibraryError::invalid_state(
                    format!("hold on book {} does not belong to member {}", book_id, member_id).as_str(),
                    Some("holder_mismatch".to_string())));
            }
            Some(_) => {}
        }

        self.book_mut(book_id)?.take_hold();
        info!("removed hold on book {} for member {}", book_id, member_id);
        Ok(())
    }

    // Transfers a held book directly from its current borrower to the
    // holder: the previous borrower is discharged, the holder becomes the
    // borrower with a fresh due date, and the hold is consumed. The book
    // never passes through an observable available state.
    pub fn process_hold(&mut self, book_id: &str) -> LibraryResult<&MemberEntity> {
        let book = self.catalog.search(book_id)
            .ok_or_else(|| LibraryError::not_found(
                format!("book with id {} not found", book_id).as_str()))?;
        let hold = match &book.hold {
            Some(hold) => hold.clone(),
            None => {
                return Err(LibraryError::invalid_state(
                    format!("book {} has no hold", book_id).as_str(),
                    Some("no_hold".to_string())));
            }
        };
        let borrower_id = match &book.borrower_id {
            Some(borrower_id) => borrower_id.to_string(),
            None => {
                return Err(LibraryError::invalid_state(
                    format!("book {} is not checked out", book_id).as_str(),
                    Some("book_not_issued".to_string())));
            }
        };
        let title = book.title.to_string();
        if hold.is_expired(Utc::now().naive_utc()) {
            // Lapsed holds are purged at processing time.
            self.book_mut(book_id)?.take_hold();
            info!("dropped expired hold on book {}", book_id);
            return Err(LibraryError::invalid_state(
                format!("hold on book {} expired on {}", book_id, hold.expires_at()).as_str(),
                Some("hold_expired".to_string())));
        }
        let holder = self.members.search(hold.holder_id.as_str())
            .ok_or_else(|| LibraryError::runtime(
                format!("hold on book {} names unknown member {}", book_id, hold.holder_id).as_str(), None))?;
        if holder.issued_count() >= self.config.max_issued_books {
            return Err(LibraryError::invalid_state(
                format!("member {} already has {} books issued", hold.holder_id, holder.issued_count()).as_str(),
                Some("over_limit".to_string())));
        }
        if self.members.search(borrower_id.as_str()).is_none() {
            return Err(LibraryError::runtime(
                format!("book {} is issued to unknown member {}", book_id, borrower_id).as_str(), None));
        }
        let due_at = self.due_from(Utc::now().naive_utc());

        let previous = self.member_mut(borrower_id.as_str())?;
        previous.discharge(book_id);
        previous.record(TransactionEntity::new(TransactionKind::Returned, book_id, title.as_str()));
        let book = self.book_mut(book_id)?;
        book.take_hold();
        book.issue_to(hold.holder_id.as_str(), due_at);
        let holder = self.member_mut(hold.holder_id.as_str())?;
        holder.issue(book_id);
        holder.record(TransactionEntity::new(TransactionKind::Issued, book_id, title.as_str()));
        info!("processed hold on book {}: transferred from {} to {}", book_id, borrower_id, hold.holder_id);
        self.members.search(hold.holder_id.as_str())
            .ok_or_else(|| LibraryError::runtime(
                format!("member {} missing after hold transfer", hold.holder_id).as_str(), None))
    }

    pub fn search_book(&self, book_id: &str) -> Option<&BookEntity> {
        self.catalog.search(book_id)
    }

    pub fn search_member(&self, member_id: &str) -> Option<&MemberEntity> {
        self.members.search(member_id)
    }

    pub fn books(&self) -> impl Iterator<Item = &BookEntity> {
        self.catalog.books()
    }

    pub fn checked_out(&self) -> impl Iterator<Item = &BookEntity> {
        self.catalog.checked_out()
    }

    pub fn not_checked_out(&self) -> impl Iterator<Item = &BookEntity> {
        self.catalog.not_checked_out()
    }

    pub fn removable(&self) -> impl Iterator<Item = &BookEntity> {
        self.catalog.removable()
    }

    pub fn on_hold(&self) -> impl Iterator<Item = &BookEntity> {
        self.catalog.on_hold()
    }

    pub fn members(&self) -> impl Iterator<Item = &MemberEntity> {
        self.members.members()
    }

    pub fn member_issued(&self, member_id: &str) -> LibraryResult<impl Iterator<Item = &BookEntity>> {
        let member = self.members.search(member_id)
            .ok_or_else(|| LibraryError::not_found(
                format!("member with id {} not found", member_id).as_str()))?;
        Ok(member.issued_book_ids.iter()
            .filter_map(move |book_id| self.catalog.search(book_id.as_str())))
    }

    pub fn member_holds(&self, member_id: &str) -> LibraryResult<impl Iterator<Item = &BookEntity>> {
        if self.members.search(member_id).is_none() {
            return Err(LibraryError::not_found(
                format!("member with id {} not found", member_id).as_str()));
        }
        let member_id = member_id.to_string();
        Ok(self.catalog.books().filter(move |book| book.is_held_by(member_id.as_str())))
    }

    pub fn member_transactions(&self, member_id: &str) -> LibraryResult<impl Iterator<Item = &TransactionEntity>> {
        let member = self.members.search(member_id)
            .ok_or_else(|| LibraryError::not_found(
                format!("member with id {} not found", member_id).as_str()))?;
        Ok(member.transactions())
    }

    fn book_mut(&mut self, book_id: &str) -> LibraryResult<&mut BookEntity> {
        self.catalog.search_mut(book_id)
            .ok_or_else(|| LibraryError::runtime(
                format!("book {} disappeared during operation", book_id).as_str(), None))
    }

    fn member_mut(&mut self, member_id: &str) -> LibraryResult<&mut MemberEntity> {
        self.members.search_mut(member_id)
            .ok_or_else(|| LibraryError::runtime(
                format!("member {} disappeared during operation", member_id).as_str(), None))
    }

    fn checked_book(&self, book_id: &str) -> LibraryResult<&BookEntity> {
        self.catalog.search(book_id)
            .ok_or_else(|| LibraryError::runtime(
                format!("book {} disappeared during operation", book_id).as_str(), None))
    }
}
