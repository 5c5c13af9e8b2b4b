//! Defines the [`Slugger`], which turns post titles into URL-safe slugs that
//! are unique within a single build.

use std::collections::HashMap;

/// Hands out unique slugs in first-seen order. The first occurrence of a base
/// slug is used as-is; later collisions get `-1`, `-2`, etc. appended.
///
/// A [`Slugger`] is scoped to one build. Callers pass it into the collector
/// and get it back afterwards rather than sharing one across runs.
#[derive(Clone, Debug, Default)]
pub struct Slugger {
    /// Every slug handed out so far, mapped to the last suffix tried for it
    /// when it was used as a base.
    occurrences: HashMap<String, usize>,
}

impl Slugger {
    pub fn new() -> Slugger {
        Slugger::default()
    }

    /// Slugifies `title` and makes the result unique against every slug this
    /// [`Slugger`] has produced.
    pub fn slug(&mut self, title: &str) -> String {
        let base = slug::slugify(title);
        let mut candidate = base.clone();
        while self.occurrences.contains_key(&candidate) {
            let counter = self.occurrences.entry(base.clone()).or_insert(0);
            *counter += 1;
            candidate = format!("{}-{}", base, counter);
        }
        self.occurrences.insert(candidate.clone(), 0);
        candidate
    }

    /// Forgets every slug seen so far.
    pub fn reset(&mut self) {
        self.occurrences.clear();
    }

    /// The number of slugs handed out since creation or the last reset.
    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }
}

/// Assigns a slug to each title in order, threading the [`Slugger`] through
/// and handing it back to the caller.
pub fn assign_slugs<'a>(
    mut slugger: Slugger,
    titles: impl IntoIterator<Item = &'a str>,
) -> (Vec<String>, Slugger) {
    let slugs = titles.into_iter().map(|t| slugger.slug(t)).collect();
    (slugs, slugger)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_duplicate_titles() {
        let (slugs, _) = assign_slugs(Slugger::new(), ["My Post", "My Post"]);
        assert_eq!(vec!["my-post", "my-post-1"], slugs);
    }

    #[test]
    fn test_suffix_collides_with_existing_title() {
        let (slugs, _) =
            assign_slugs(Slugger::new(), ["foo-1", "foo", "foo", "foo"]);
        assert_eq!(vec!["foo-1", "foo", "foo-2", "foo-3"], slugs);
    }

    #[test]
    fn test_punctuation_and_case() {
        let mut slugger = Slugger::new();
        assert_eq!("hello-world", slugger.slug("Hello, World!"));
        assert_eq!("rust-2021-edition", slugger.slug("  Rust 2021 Edition "));
    }

    #[test]
    fn test_distinct_titles_yield_distinct_slugs() {
        let titles = ["A", "a", "B!", "b?", "C", "c", "c"];
        let (slugs, slugger) = assign_slugs(Slugger::new(), titles);
        let unique: HashSet<&String> = slugs.iter().collect();
        assert_eq!(titles.len(), unique.len());
        assert_eq!(titles.len(), slugger.len());
    }

    #[test]
    fn test_slugger_is_returned_with_state() {
        let (_, slugger) = assign_slugs(Slugger::new(), ["Intro"]);
        let (slugs, mut slugger) = assign_slugs(slugger, ["Intro"]);
        assert_eq!(vec!["intro-1"], slugs);

        slugger.reset();
        assert!(slugger.is_empty());
        assert_eq!("intro", slugger.slug("Intro"));
    }
}
