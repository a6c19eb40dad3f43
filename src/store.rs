use std::collections::HashSet;

use anyhow::Result;
use tracing::debug;

use crate::models::{FetchedJoke, Joke, JokeIntent};

/// A source of jokes. One call issues one request and yields one record.
pub trait JokeSource {
    fn fetch_joke(&self) -> Result<FetchedJoke>;
}

/// Holds the jokes for one session plus the loading flag the view keys off.
///
/// Invariant: no two jokes in the collection share an id. The set of seen
/// ids is rebuilt from the collection at the start of each fill, never kept
/// around between fills.
#[derive(Debug, Clone)]
pub struct JokeStore {
    jokes: Vec<Joke>,
    loading: bool,
}

impl JokeStore {
    pub fn new() -> Self {
        Self {
            jokes: Vec::new(),
            loading: true,
        }
    }

    pub fn jokes(&self) -> &[Joke] {
        &self.jokes
    }

    pub fn into_jokes(self) -> Vec<Joke> {
        self.jokes
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn locked_count(&self) -> usize {
        self.jokes.iter().filter(|j| j.locked).count()
    }

    /// Fetches jokes one at a time until the collection holds `target`
    /// entries. Records whose id is already present are discarded and the
    /// request is simply repeated, so there is no retry cap: a service that
    /// only ever returns duplicates keeps this looping. A request error
    /// aborts the fill, keeping whatever was appended so far and leaving
    /// the loading flag set.
    pub fn ensure_filled(&mut self, target: usize, source: &dyn JokeSource) -> Result<()> {
        let mut seen: HashSet<String> = self.jokes.iter().map(|j| j.id.clone()).collect();

        while self.jokes.len() < target {
            let record = source.fetch_joke()?;
            if seen.insert(record.id.clone()) {
                self.jokes.push(Joke::new(record.id, record.text));
            } else {
                debug!(id = %record.id, "duplicate joke discarded");
            }
        }

        self.loading = false;
        Ok(())
    }

    /// Drops everything except the locked jokes (order preserved) and flags
    /// the store as loading so the next fill tops it back up. No network
    /// side effect of its own.
    pub fn refresh_unlocked(&mut self) {
        self.jokes.retain(|j| j.locked);
        self.loading = true;
    }

    /// Replaces the collection wholesale, e.g. with the outcome of a fill
    /// that ran on a worker thread.
    pub fn replace(&mut self, jokes: Vec<Joke>) {
        self.jokes = jokes;
        self.loading = false;
    }

    /// Adds `delta` (+1 or -1) to the matching joke's votes. Votes are not
    /// clamped and may go negative. Unknown ids are ignored.
    pub fn vote(&mut self, id: &str, delta: i32) {
        if let Some(joke) = self.jokes.iter_mut().find(|j| j.id == id) {
            joke.votes += delta;
        }
    }

    /// Flips the lock flag on the matching joke. Unknown ids are ignored.
    pub fn toggle_lock(&mut self, id: &str) {
        if let Some(joke) = self.jokes.iter_mut().find(|j| j.id == id) {
            joke.locked = !joke.locked;
        }
    }

    pub fn apply(&mut self, intent: JokeIntent) {
        match intent {
            JokeIntent::Vote { id, delta } => self.vote(&id, delta),
            JokeIntent::ToggleLock { id } => self.toggle_lock(&id),
            JokeIntent::RequestMore => self.refresh_unlocked(),
        }
    }

    /// Copy of the collection sorted by votes descending. The sort is
    /// stable, so jokes with equal votes keep their insertion order, and
    /// the stored order is never touched.
    pub fn sorted_for_display(&self) -> Vec<Joke> {
        let mut sorted = self.jokes.clone();
        sorted.sort_by(|a, b| b.votes.cmp(&a.votes));
        sorted
    }
}

impl Default for JokeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use anyhow::anyhow;

    use super::*;

    /// Test double that replays a script of responses. `Some((id, text))`
    /// is a successful fetch, `None` a request failure.
    struct ScriptedSource {
        script: RefCell<VecDeque<Option<(&'static str, &'static str)>>>,
        calls: RefCell<usize>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Option<(&'static str, &'static str)>>) -> Self {
            Self {
                script: RefCell::new(script.into()),
                calls: RefCell::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.borrow()
        }
    }

    impl JokeSource for ScriptedSource {
        fn fetch_joke(&self) -> Result<FetchedJoke> {
            *self.calls.borrow_mut() += 1;
            match self.script.borrow_mut().pop_front() {
                Some(Some((id, text))) => Ok(FetchedJoke {
                    id: id.to_string(),
                    text: text.to_string(),
                }),
                Some(None) => Err(anyhow!("connection reset")),
                None => Err(anyhow!("script exhausted")),
            }
        }
    }

    fn store_with(jokes: Vec<Joke>) -> JokeStore {
        let mut store = JokeStore::new();
        store.replace(jokes);
        store
    }

    fn joke(id: &str, votes: i32, locked: bool) -> Joke {
        Joke {
            id: id.to_string(),
            text: format!("joke {id}"),
            votes,
            locked,
        }
    }

    #[test]
    fn ensure_filled_reaches_target_with_unique_ids() {
        let source = ScriptedSource::new(vec![
            Some(("a", "one")),
            Some(("b", "two")),
            Some(("c", "three")),
        ]);
        let mut store = JokeStore::new();

        store.ensure_filled(3, &source).unwrap();

        assert_eq!(store.jokes().len(), 3);
        let ids: Vec<_> = store.jokes().iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert!(store.jokes().iter().all(|j| j.votes == 0 && !j.locked));
        assert!(!store.is_loading());
    }

    #[test]
    fn ensure_filled_discards_duplicates_and_keeps_fetching() {
        // ids 1, 2, 2, 3 -- the repeated 2 must not count toward the target
        let source = ScriptedSource::new(vec![
            Some(("1", "first")),
            Some(("2", "second")),
            Some(("2", "second again")),
            Some(("3", "third")),
        ]);
        let mut store = JokeStore::new();

        store.ensure_filled(3, &source).unwrap();

        let ids: Vec<_> = store.jokes().iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
        assert_eq!(source.calls(), 4);
    }

    #[test]
    fn ensure_filled_skips_ids_already_in_collection() {
        // the service can hand back an id that survived a refresh
        let mut store = store_with(vec![joke("a", 2, true)]);
        let source = ScriptedSource::new(vec![Some(("a", "repeat")), Some(("b", "new"))]);
        store.ensure_filled(2, &source).unwrap();

        let ids: Vec<_> = store.jokes().iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        // the existing entry is untouched by the duplicate response
        assert_eq!(store.jokes()[0].votes, 2);
    }

    #[test]
    fn ensure_filled_noop_when_already_at_target() {
        let source = ScriptedSource::new(vec![]);
        let mut store = store_with(vec![joke("a", 0, false), joke("b", 0, false)]);

        store.ensure_filled(2, &source).unwrap();

        assert_eq!(source.calls(), 0);
        assert_eq!(store.jokes().len(), 2);
    }

    #[test]
    fn ensure_filled_error_keeps_partial_state_and_loading_flag() {
        let source = ScriptedSource::new(vec![Some(("a", "one")), None]);
        let mut store = JokeStore::new();

        let result = store.ensure_filled(3, &source);

        assert!(result.is_err());
        // not rolled back: the joke fetched before the failure stays
        assert_eq!(store.jokes().len(), 1);
        assert!(store.is_loading());
    }

    #[test]
    fn vote_accumulates_deltas_without_clamping() {
        let mut store = store_with(vec![joke("a", 0, false)]);

        store.vote("a", 1);
        store.vote("a", 1);
        store.vote("a", -1);
        assert_eq!(store.jokes()[0].votes, 1);

        store.vote("a", -1);
        store.vote("a", -1);
        assert_eq!(store.jokes()[0].votes, -1);
    }

    #[test]
    fn vote_on_unknown_id_is_a_noop() {
        let mut store = store_with(vec![joke("a", 3, false)]);
        store.vote("nope", 1);
        assert_eq!(store.jokes().len(), 1);
        assert_eq!(store.jokes()[0].votes, 3);
    }

    #[test]
    fn toggle_lock_twice_restores_original_state() {
        let mut store = store_with(vec![joke("a", 0, false)]);

        store.toggle_lock("a");
        assert!(store.jokes()[0].locked);
        store.toggle_lock("a");
        assert!(!store.jokes()[0].locked);
    }

    #[test]
    fn toggle_lock_on_unknown_id_is_a_noop() {
        let mut store = store_with(vec![joke("a", 0, true)]);
        store.toggle_lock("nope");
        assert!(store.jokes()[0].locked);
    }

    #[test]
    fn refresh_keeps_locked_jokes_and_refill_appends_after_them() {
        let mut store = store_with(vec![
            joke("a", 5, true),
            joke("b", 1, false),
            joke("c", -2, true),
            joke("d", 0, false),
        ]);

        store.refresh_unlocked();

        assert!(store.is_loading());
        let ids: Vec<_> = store.jokes().iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);

        let source = ScriptedSource::new(vec![Some(("e", "five")), Some(("f", "six"))]);
        store.ensure_filled(4, &source).unwrap();

        let ids: Vec<_> = store.jokes().iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, ["a", "c", "e", "f"]);
        // locked survivors come through unchanged
        assert_eq!(store.jokes()[0].votes, 5);
        assert!(store.jokes()[0].locked);
        assert_eq!(store.jokes()[1].votes, -2);
    }

    #[test]
    fn display_sort_is_descending_and_stable_for_ties() {
        // insertion order A,B,C,D with votes 3,1,3,-2 must render A,C,B,D
        let store = store_with(vec![
            joke("A", 3, false),
            joke("B", 1, false),
            joke("C", 3, false),
            joke("D", -2, false),
        ]);

        let sorted = store.sorted_for_display();
        let ids: Vec<_> = sorted.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, ["A", "C", "B", "D"]);

        // stored order is untouched
        let ids: Vec<_> = store.jokes().iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, ["A", "B", "C", "D"]);
    }

    #[test]
    fn intents_map_to_store_mutations() {
        let mut store = store_with(vec![joke("a", 0, false), joke("b", 0, false)]);

        store.apply(JokeIntent::Vote {
            id: "a".to_string(),
            delta: 1,
        });
        store.apply(JokeIntent::ToggleLock {
            id: "b".to_string(),
        });
        assert_eq!(store.jokes()[0].votes, 1);
        assert!(store.jokes()[1].locked);

        store.apply(JokeIntent::RequestMore);
        assert!(store.is_loading());
        let ids: Vec<_> = store.jokes().iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, ["b"]);
    }

    // The store does not guard against two fills running against the same
    // collection; the app relies on its in-flight check for that. This pins
    // the unguarded behavior down so nobody "fixes" it quietly: a second
    // fill computed from a stale snapshot can re-add an id the first one
    // already appended, and replace() takes whatever it is given.
    #[test]
    fn replace_does_not_dedup_overlapping_fill_results() {
        let mut store = store_with(vec![joke("a", 0, false)]);
        store.replace(vec![joke("a", 0, false), joke("a", 0, false)]);
        assert_eq!(store.jokes().len(), 2);
    }
}
