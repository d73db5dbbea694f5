//! The four fixed album orderings.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::album::Album;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    NameAsc,
    NameDesc,
}

impl SortOrder {
    pub const ALL: [SortOrder; 4] = [
        SortOrder::Newest,
        SortOrder::Oldest,
        SortOrder::NameAsc,
        SortOrder::NameDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::NameAsc => "name-asc",
            SortOrder::NameDesc => "name-desc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::Newest => "Newest first",
            SortOrder::Oldest => "Oldest first",
            SortOrder::NameAsc => "Name (A-Z)",
            SortOrder::NameDesc => "Name (Z-A)",
        }
    }

    pub fn cycle(&self) -> Self {
        match self {
            SortOrder::Newest => SortOrder::Oldest,
            SortOrder::Oldest => SortOrder::NameAsc,
            SortOrder::NameAsc => SortOrder::NameDesc,
            SortOrder::NameDesc => SortOrder::Newest,
        }
    }

    pub fn compare(&self, a: &Album, b: &Album) -> Ordering {
        match self {
            SortOrder::Newest => b.created_at.cmp(&a.created_at),
            SortOrder::Oldest => a.created_at.cmp(&b.created_at),
            SortOrder::NameAsc => locale_compare(&a.name, &b.name),
            SortOrder::NameDesc => locale_compare(&b.name, &a.name),
        }
    }

    /// Stable sort: albums that compare equal keep their prior order.
    pub fn sort(&self, albums: &mut [Album]) {
        albums.sort_by(|a, b| self.compare(a, b));
    }

    pub fn sort_refs(&self, albums: &mut [&Album]) {
        albums.sort_by(|a, b| self.compare(a, b));
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOrder::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| format!("unknown sort order: {}", s))
    }
}

/// Dictionary-style comparison: case-folded first, then case-sensitive so
/// the order stays total.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| b.cmp(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::album::fixtures::album;

    #[test]
    fn test_locale_compare_ignores_case_first() {
        assert_eq!(locale_compare("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_compare("Zoo", "apple"), Ordering::Greater);
        // lowercase before uppercase on a tie, like localeCompare
        assert_eq!(locale_compare("a", "A"), Ordering::Less);
        assert_eq!(locale_compare("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_sort_by_date() {
        let mut albums = vec![album(1, "a", 3, 1), album(2, "b", 1, 1), album(3, "c", 2, 1)];
        SortOrder::Newest.sort(&mut albums);
        let names: Vec<_> = albums.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["a", "c", "b"]);
        SortOrder::Oldest.sort(&mut albums);
        let names: Vec<_> = albums.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["b", "c", "a"]);
    }

    #[test]
    fn test_ties_keep_prior_order() {
        let mut albums = vec![album(1, "first", 1, 1), album(2, "second", 1, 1)];
        SortOrder::Newest.sort(&mut albums);
        assert_eq!(albums[0].name, "first");
        SortOrder::Oldest.sort(&mut albums);
        assert_eq!(albums[0].name, "first");
    }

    #[test]
    fn test_parse_round_trip_names() {
        for order in SortOrder::ALL {
            assert_eq!(order.as_str().parse::<SortOrder>().unwrap(), order);
        }
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
