use serde::{Deserialize, Serialize};

// Identifiable defines the lookup key shared by catalog and registry entries
pub trait Identifiable {
    fn id(&self) -> String;
}

// Resolves a 1-based position against an id-bearing sequence. The sequence
// must be generated with the identical filter and order as the list the
// position was picked from, or the resolved id is silently wrong.
pub fn id_at_position<'a, T: Identifiable + 'a>(position: usize, mut entries: impl Iterator<Item = &'a T>) -> Option<String> {
    if position == 0 {
        return None;
    }
    entries.nth(position - 1).map(|entry| entry.id())
}

// Configuration abstracts the lending policy constants for a branch
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct Configuration {
    pub loan_period_days: i64,
    pub max_issued_books: usize,
}

impl Configuration {
    pub fn new() -> Self {
        Configuration {
            loan_period_days: 14,
            max_issued_books: 6,
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::core::domain::{id_at_position, Configuration, Identifiable};

    struct Entry(&'static str);

    impl Identifiable for Entry {
        fn id(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn test_should_build_config() {
        let config = Configuration::new();
        assert_eq!(14, config.loan_period_days);
        assert_eq!(6, config.max_issued_books);
        assert_eq!(config, Configuration::default());
    }

    #[test]
    fn test_should_resolve_one_based_positions() {
        let entries = vec![Entry("a"), Entry("b"), Entry("c")];
        assert_eq!(Some("a".to_string()), id_at_position(1, entries.iter()));
        assert_eq!(Some("c".to_string()), id_at_position(3, entries.iter()));
        assert_eq!(None, id_at_position(0, entries.iter()));
        assert_eq!(None, id_at_position(4, entries.iter()));
    }
}
