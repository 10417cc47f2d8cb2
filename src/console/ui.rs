// Interaction layer: numbered menus over the Library's filtered views.
// Every "list then select" flow captures the displayed id sequence and
// resolves the chosen index against that capture, so the selection can never
// drift from the list the operator actually saw.

use anyhow::Result;
use dialoguer::{Confirm, Input, Select};
use crate::catalog::domain::model::BookEntity;
use crate::console::store::SnapshotStore;
use crate::lending::domain::service::Library;
use crate::members::domain::model::MemberEntity;
use crate::utils::date;

pub struct Console {
    library: Library,
    store: SnapshotStore,
}

const MENU: &[&str] = &[
    "Add a member",
    "Add books",
    "Issue books",
    "Return books",
    "Renew books",
    "Remove books",
    "Place a hold",
    "Remove a hold",
    "Process holds",
    "Member transactions",
    "Save",
    "Load",
    "Exit",
];

impl Console {
    pub fn new(library: Library, store: SnapshotStore) -> Self {
        Self { library, store }
    }

    // Blocks until the operator picks Exit. One command runs to completion
    // before the next is accepted.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let selection = Select::new()
                .with_prompt("Library")
                .items(MENU)
                .default(0)
                .interact()?;
            match selection {
                0 => self.add_member()?,
                1 => self.add_books()?,
                2 => self.issue_books()?,
                3 => self.return_books()?,
                4 => self.renew_books()?,
                5 => self.remove_books()?,
                6 => self.place_hold()?,
                7 => self.remove_hold()?,
                8 => self.process_holds()?,
                9 => self.member_transactions()?,
                10 => self.save()?,
                11 => self.load()?,
                _ => break,
            }
        }
        Ok(())
    }

    fn add_member(&mut self) -> Result<()> {
        let name: String = Input::new().with_prompt("Member name").interact_text()?;
        let address: String = Input::new().with_prompt("Address").interact_text()?;
        let phone: String = Input::new().with_prompt("Phone").interact_text()?;
        match self.library.add_member(name.as_str(), address.as_str(), phone.as_str()) {
            Ok(member) => println!("Registered {} with id {}", member.name, member.member_id),
            Err(err) => println!("Member could not be added: {}", err),
        }
        Ok(())
    }

    fn add_books(&mut self) -> Result<()> {
        loop {
            let title: String = Input::new().with_prompt("Title").interact_text()?;
            let book_id: String = Input::new().with_prompt("Book id").interact_text()?;
            let author: String = Input::new().with_prompt("Author").interact_text()?;
            match self.library.add_book(title.as_str(), author.as_str(), book_id.as_str()) {
                Ok(book) => println!("Added {}", book_line(book)),
                Err(err) => println!("Book could not be added: {}", err),
            }
            if !more("Add more books?")? {
                break;
            }
        }
        Ok(())
    }

    fn issue_books(&mut self) -> Result<()> {
        let Some(member_id) = select_member("Issue to", self.library.members())? else {
            return Ok(());
        };
        loop {
            let Some(book_id) = select_book("Available books", self.library.not_checked_out())? else {
                break;
            };
            match self.library.issue_book(member_id.as_str(), book_id.as_str()) {
                Ok(book) => match &book.due_at {
                    Some(due_at) => println!("Issued {}, due {}", book.title, date::short(due_at)),
                    None => println!("Issued {}", book.title),
                },
                Err(err) => println!("Book could not be issued: {}", err),
            }
            if !more("Issue more books?")? {
                break;
            }
        }
        Ok(())
    }

    fn return_books(&mut self) -> Result<()> {
        loop {
            let Some(book_id) = select_book("Checked out books", self.library.checked_out())? else {
                break;
            };
            match self.library.return_book(book_id.as_str()) {
                Ok(()) => println!("Book has been returned"),
                Err(err) => println!("Book could not be returned: {}", err),
            }
            if !more("Return more books?")? {
                break;
            }
        }
        Ok(())
    }

    fn renew_books(&mut self) -> Result<()> {
        let Some(member_id) = select_member("Renew for", self.library.members())? else {
            return Ok(());
        };
        loop {
            let issued = match self.library.member_issued(member_id.as_str()) {
                Ok(issued) => issued,
                Err(err) => {
                    println!("{}", err);
                    return Ok(());
                }
            };
            let Some(book_id) = select_book("Books issued to this member", issued)? else {
                break;
            };
            match self.library.renew_book(book_id.as_str(), member_id.as_str()) {
                Ok(book) => match &book.due_at {
                    Some(due_at) => println!("Renewed {}, due {}", book.title, date::short(due_at)),
                    None => println!("Renewed {}", book.title),
                },
                Err(err) => println!("Book is not renewable: {}", err),
            }
            if !more("Renew more books?")? {
                break;
            }
        }
        Ok(())
    }

    fn remove_books(&mut self) -> Result<()> {
        loop {
            let Some(book_id) = select_book("Removable books", self.library.removable())? else {
                break;
            };
            match self.library.remove_book(book_id.as_str()) {
                Ok(()) => println!("Book has been removed"),
                Err(err) => println!("Book could not be removed: {}", err),
            }
            if !more("Remove more books?")? {
                break;
            }
        }
        Ok(())
    }

    fn place_hold(&mut self) -> Result<()> {
        let Some(member_id) = select_member("Hold for", self.library.members())? else {
            return Ok(());
        };
        let Some(book_id) = select_book("Checked out books", self.library.checked_out())? else {
            return Ok(());
        };
        let duration_days: i64 = Input::new()
            .with_prompt("Duration of hold (days)")
            .interact_text()?;
        match self.library.place_hold(member_id.as_str(), book_id.as_str(), duration_days) {
            Ok(()) => println!("A hold has been placed"),
            Err(err) => println!("Hold could not be placed: {}", err),
        }
        Ok(())
    }

    fn remove_hold(&mut self) -> Result<()> {
        let Some(member_id) = select_member("Remove hold for", self.library.members())? else {
            return Ok(());
        };
        let holds = match self.library.member_holds(member_id.as_str()) {
            Ok(holds) => holds,
            Err(err) => {
                println!("{}", err);
                return Ok(());
            }
        };
        let Some(book_id) = select_book("Books on hold for this member", holds)? else {
            return Ok(());
        };
        match self.library.remove_hold(member_id.as_str(), book_id.as_str()) {
            Ok(()) => println!("The hold has been removed"),
            Err(err) => println!("Hold could not be removed: {}", err),
        }
        Ok(())
    }

    fn process_holds(&mut self) -> Result<()> {
        loop {
            let Some(book_id) = select_book("Held books", self.library.on_hold())? else {
                break;
            };
            match self.library.process_hold(book_id.as_str()) {
                Ok(member) => println!("Book goes to {} ({})", member.name, member.phone),
                Err(err) => println!("Hold could not be processed: {}", err),
            }
            if !more("Process more holds?")? {
                break;
            }
        }
        Ok(())
    }

    fn member_transactions(&mut self) -> Result<()> {
        let Some(member_id) = select_member("Transactions for", self.library.members())? else {
            return Ok(());
        };
        match self.library.member_transactions(member_id.as_str()) {
            Ok(transactions) => {
                let mut position = 0;
                for transaction in transactions {
                    position += 1;
                    println!(
                        "   {}.   {} {} ({}) on {}",
                        position,
                        transaction.kind,
                        transaction.book_title,
                        transaction.book_id,
                        date::short(&transaction.created_at),
                    );
                }
                if position == 0 {
                    println!("No transactions for this member");
                } else {
                    println!("There are no more transactions");
                }
            }
            Err(err) => println!("{}", err),
        }
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        match self.store.save(&self.library.snapshot()) {
            Ok(()) => println!("Library saved to {}", self.store.path().display()),
            Err(err) => println!("Library could not be saved: {:#}", err),
        }
        Ok(())
    }

    fn load(&mut self) -> Result<()> {
        let restored = self.store.load().and_then(|snapshot| Ok(Library::restore(snapshot)?));
        match restored {
            Ok(library) => {
                self.library = library;
                println!("Library loaded from {}", self.store.path().display());
            }
            Err(err) => println!("Library could not be loaded: {:#}", err),
        }
        Ok(())
    }
}

fn more(prompt: &str) -> Result<bool> {
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

fn book_line(book: &BookEntity) -> String {
    let mut line = format!("{} ({}) by {} [{}", book.title, book.book_id, book.author, book.status());
    if let Some(due_at) = &book.due_at {
        line.push_str(format!(", due {}", date::short(due_at)).as_str());
    }
    if book.has_hold() {
        line.push_str(", on hold");
    }
    line.push(']');
    line
}

fn member_line(member: &MemberEntity) -> String {
    format!("{} ({}), {}", member.name, member.member_id, member.phone)
}

fn select_book<'a>(prompt: &str, books: impl Iterator<Item = &'a BookEntity>) -> Result<Option<String>> {
    // Captured at display time; the chosen index resolves against this
    // sequence, never against a regenerated filter.
    let captured: Vec<(String, String)> = books
        .map(|book| (book.book_id.to_string(), book_line(book)))
        .collect();
    select_id(prompt, captured)
}

fn select_member<'a>(prompt: &str, members: impl Iterator<Item = &'a MemberEntity>) -> Result<Option<String>> {
    let captured: Vec<(String, String)> = members
        .map(|member| (member.member_id.to_string(), member_line(member)))
        .collect();
    select_id(prompt, captured)
}

fn select_id(prompt: &str, captured: Vec<(String, String)>) -> Result<Option<String>> {
    if captured.is_empty() {
        println!("Nothing to list here");
        return Ok(None);
    }
    let labels: Vec<&str> = captured.iter().map(|(_, label)| label.as_str()).collect();
    let selection = Select::new()
        .with_prompt(format!("{} (Esc to go back)", prompt))
        .items(&labels)
        .default(0)
        .interact_opt()?;
    Ok(selection.and_then(|index| captured.get(index).map(|(id, _)| id.to_string())))
}
