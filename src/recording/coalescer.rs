use serde::Serialize;
use std::collections::HashMap;

use crate::error::Result;
use crate::models::{ActionInContext, ActionKind};

/// What happened to one incoming event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coalesced {
    /// Retained as a new entry at `index`
    Appended { index: usize },
    /// The page's previous action at `removed` was erased, the event retained at `index`
    Replaced { removed: usize, index: usize },
    /// Duplicate navigation, nothing changed
    Dropped,
}

/// Incremental notification for a consuming UI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionChange {
    Added {
        index: usize,
        action: ActionInContext,
    },
    Removed {
        index: usize,
    },
}

enum Decision {
    Drop,
    Erase,
    Append,
}

#[derive(Debug, Clone)]
struct Entry {
    id: u64,
    action: ActionInContext,
}

/// Folds a raw action stream into a minimal replayable sequence.
///
/// Each incoming event is compared only with the last retained action of the
/// same page. Entries carry a monotonically increasing id, so the retained
/// list stays sorted by id and page pointers survive erasures on other pages.
#[derive(Debug, Clone, Default)]
pub struct ActionCoalescer {
    entries: Vec<Entry>,
    last_by_page: HashMap<String, u64>,
    next_id: u64,
}

impl ActionCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one event. Malformed events are rejected before any state changes.
    pub fn process(&mut self, event: ActionInContext) -> Result<Coalesced> {
        event.validate()?;

        let previous = self.last_position(&event.page_alias).map(|position| {
            let last = &self.entries[position].action;
            (position, decide(&last.action.kind, &event.action.kind))
        });

        match previous {
            Some((_, Decision::Drop)) => {
                tracing::debug!(
                    "Dropped duplicate {} on page {}",
                    event.action.name(),
                    event.page_alias
                );
                Ok(Coalesced::Dropped)
            }
            Some((position, Decision::Erase)) => {
                let erased = self.entries.remove(position);
                let index = self.push(event);
                tracing::debug!(
                    "Replaced {} at {} with {} at {}",
                    erased.action.action.name(),
                    position,
                    self.entries[index].action.action.name(),
                    index
                );
                Ok(Coalesced::Replaced {
                    removed: position,
                    index,
                })
            }
            Some((_, Decision::Append)) | None => {
                let index = self.push(event);
                tracing::debug!(
                    "Appended {} at {}",
                    self.entries[index].action.action.name(),
                    index
                );
                Ok(Coalesced::Appended { index })
            }
        }
    }

    /// Expand an outcome into remove/add notifications
    pub fn changes(&self, outcome: &Coalesced) -> Vec<ActionChange> {
        let added = |index: usize| {
            self.entries.get(index).map(|entry| ActionChange::Added {
                index,
                action: entry.action.clone(),
            })
        };

        match *outcome {
            Coalesced::Dropped => Vec::new(),
            Coalesced::Appended { index } => added(index).into_iter().collect(),
            Coalesced::Replaced { removed, index } => std::iter::once(ActionChange::Removed {
                index: removed,
            })
            .chain(added(index))
            .collect(),
        }
    }

    /// Most recently retained action for a page
    pub fn last_for_page(&self, page_alias: &str) -> Option<&ActionInContext> {
        self.last_position(page_alias)
            .map(|position| &self.entries[position].action)
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionInContext> {
        self.entries.iter().map(|e| &e.action)
    }

    pub fn snapshot(&self) -> Vec<ActionInContext> {
        self.actions().cloned().collect()
    }

    pub fn into_actions(self) -> Vec<ActionInContext> {
        self.entries.into_iter().map(|e| e.action).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, action: ActionInContext) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.last_by_page.insert(action.page_alias.clone(), id);
        self.entries.push(Entry { id, action });
        self.entries.len() - 1
    }

    fn last_position(&self, page_alias: &str) -> Option<usize> {
        let id = self.last_by_page.get(page_alias)?;
        self.entries.binary_search_by_key(id, |e| e.id).ok()
    }
}

/// Merge rules, first match wins
fn decide(last: &ActionKind, next: &ActionKind) -> Decision {
    match (last, next) {
        (ActionKind::Navigate { url: a }, ActionKind::Navigate { url: b }) if a == b => {
            Decision::Drop
        }
        (ActionKind::Fill { selector: a, .. }, ActionKind::Fill { selector: b, .. }) if a == b => {
            Decision::Erase
        }
        (
            ActionKind::Click {
                selector: a,
                click_count: before,
                ..
            },
            ActionKind::Click {
                selector: b,
                click_count: after,
                ..
            },
        ) if a == b && after > before => Decision::Erase,
        (
            ActionKind::Click { selector: a, .. },
            ActionKind::Check { selector: b } | ActionKind::Uncheck { selector: b },
        ) if a == b => Decision::Erase,
        _ => Decision::Append,
    }
}

/// Fold a whole event sequence from an empty state
pub fn coalesce<I>(events: I) -> Result<Vec<ActionInContext>>
where
    I: IntoIterator<Item = ActionInContext>,
{
    let mut coalescer = ActionCoalescer::new();
    for event in events {
        coalescer.process(event)?;
    }
    Ok(coalescer.into_actions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{Action, Signal};

    fn on(page: &str, action: Action) -> ActionInContext {
        ActionInContext::new(page, action)
    }

    #[test]
    fn test_duplicate_navigation_is_dropped() {
        let mut coalescer = ActionCoalescer::new();
        assert_eq!(
            coalescer.process(on("page", Action::navigate("https://a.test"))).unwrap(),
            Coalesced::Appended { index: 0 }
        );
        assert_eq!(
            coalescer.process(on("page", Action::navigate("https://a.test"))).unwrap(),
            Coalesced::Dropped
        );
        assert_eq!(coalescer.len(), 1);
    }

    #[test]
    fn test_navigation_to_new_url_is_kept() {
        let actions = coalesce(vec![
            on("page", Action::navigate("https://a.test")),
            on("page", Action::navigate("https://b.test")),
            on("page", Action::navigate("https://a.test")),
        ])
        .unwrap();
        assert_eq!(actions.len(), 3);
    }

    #[test]
    fn test_fill_keeps_final_value() {
        let actions = coalesce(vec![
            on("page", Action::fill("#q", "a")),
            on("page", Action::fill("#q", "ab")),
            on("page", Action::fill("#q", "abc")),
        ])
        .unwrap();
        assert_eq!(actions, vec![on("page", Action::fill("#q", "abc"))]);
    }

    #[test]
    fn test_fill_on_other_selector_appends() {
        let actions = coalesce(vec![
            on("page", Action::fill("#first", "Ada")),
            on("page", Action::fill("#last", "Lovelace")),
        ])
        .unwrap();
        assert_eq!(actions.len(), 2);
    }

    #[test]
    fn test_click_escalation() {
        let escalated = coalesce(vec![
            on("page", Action::click_with_count("#item", 1)),
            on("page", Action::click_with_count("#item", 2)),
        ])
        .unwrap();
        assert_eq!(escalated, vec![on("page", Action::click_with_count("#item", 2))]);

        let reversed = coalesce(vec![
            on("page", Action::click_with_count("#item", 2)),
            on("page", Action::click_with_count("#item", 1)),
        ])
        .unwrap();
        assert_eq!(reversed.len(), 2);

        let repeated = coalesce(vec![
            on("page", Action::click("#item")),
            on("page", Action::click("#item")),
        ])
        .unwrap();
        assert_eq!(repeated.len(), 2);
    }

    #[test]
    fn test_check_supersedes_click() {
        let checked = coalesce(vec![
            on("page", Action::click("#terms")),
            on("page", Action::check("#terms")),
        ])
        .unwrap();
        assert_eq!(checked, vec![on("page", Action::check("#terms"))]);

        let unchecked = coalesce(vec![
            on("page", Action::click("#news")),
            on("page", Action::uncheck("#news")),
        ])
        .unwrap();
        assert_eq!(unchecked, vec![on("page", Action::uncheck("#news"))]);

        let other = coalesce(vec![
            on("page", Action::click("#news")),
            on("page", Action::check("#terms")),
        ])
        .unwrap();
        assert_eq!(other.len(), 2);
    }

    #[test]
    fn test_escalated_click_then_check_collapses_in_rule_order() {
        let actions = coalesce(vec![
            on("page", Action::click_with_count("#box", 1)),
            on("page", Action::click_with_count("#box", 2)),
            on("page", Action::check("#box")),
        ])
        .unwrap();
        assert_eq!(actions, vec![on("page", Action::check("#box"))]);
    }

    #[test]
    fn test_pages_are_independent() {
        let fills_around_click = coalesce(vec![
            on("p1", Action::fill("#name", "A")),
            on("p2", Action::click("#menu")),
            on("p1", Action::fill("#name", "Ad")),
        ])
        .unwrap();
        assert_eq!(
            fills_around_click,
            vec![
                on("p2", Action::click("#menu")),
                on("p1", Action::fill("#name", "Ad")),
            ]
        );

        let click_first = coalesce(vec![
            on("p2", Action::click("#menu")),
            on("p1", Action::fill("#name", "A")),
            on("p1", Action::fill("#name", "Ad")),
        ])
        .unwrap();
        assert_eq!(
            click_first,
            vec![
                on("p2", Action::click("#menu")),
                on("p1", Action::fill("#name", "Ad")),
            ]
        );

        let same_url = coalesce(vec![
            on("p1", Action::navigate("https://a.test")),
            on("p2", Action::navigate("https://a.test")),
        ])
        .unwrap();
        assert_eq!(same_url.len(), 2);
    }

    #[test]
    fn test_page_pointer_survives_erasure_elsewhere() {
        let mut coalescer = ActionCoalescer::new();
        coalescer.process(on("p2", Action::click("#tab"))).unwrap();
        coalescer.process(on("p1", Action::fill("#q", "x"))).unwrap();
        coalescer.process(on("p2", Action::check("#tab"))).unwrap();

        assert_eq!(coalescer.last_for_page("p1"), Some(&on("p1", Action::fill("#q", "x"))));
        assert_eq!(coalescer.last_for_page("p2"), Some(&on("p2", Action::check("#tab"))));
        assert!(coalescer.last_for_page("p3").is_none());
    }

    #[test]
    fn test_drop_does_not_move_pointer() {
        let mut coalescer = ActionCoalescer::new();
        coalescer.process(on("page", Action::navigate("https://a.test"))).unwrap();
        coalescer.process(on("page", Action::navigate("https://a.test"))).unwrap();
        coalescer.process(on("page", Action::navigate("https://a.test"))).unwrap();
        assert_eq!(coalescer.len(), 1);
    }

    #[test]
    fn test_signal_does_not_prevent_merge() {
        let with_signal = Action::fill("#q", "shoes").with_signal(Signal::Dialog);
        let actions = coalesce(vec![
            on("page", Action::fill("#q", "sho")),
            on("page", with_signal.clone()),
        ])
        .unwrap();
        assert_eq!(actions, vec![on("page", with_signal)]);
    }

    #[test]
    fn test_malformed_event_leaves_state_untouched() {
        let mut coalescer = ActionCoalescer::new();
        coalescer.process(on("page", Action::fill("#q", "a"))).unwrap();

        let err = coalescer.process(on("page", Action::fill("", "ab"))).unwrap_err();
        assert!(matches!(err, AppError::MalformedAction(_)));
        assert_eq!(coalescer.snapshot(), vec![on("page", Action::fill("#q", "a"))]);

        coalescer.process(on("page", Action::fill("#q", "ab"))).unwrap();
        assert_eq!(coalescer.snapshot(), vec![on("page", Action::fill("#q", "ab"))]);
    }

    #[test]
    fn test_changes_describe_outcome() {
        let mut coalescer = ActionCoalescer::new();
        coalescer.process(on("p1", Action::fill("#q", "a"))).unwrap();
        coalescer.process(on("p2", Action::click("#x"))).unwrap();
        let outcome = coalescer.process(on("p1", Action::fill("#q", "ab"))).unwrap();

        assert_eq!(outcome, Coalesced::Replaced { removed: 0, index: 1 });
        assert_eq!(
            coalescer.changes(&outcome),
            vec![
                ActionChange::Removed { index: 0 },
                ActionChange::Added {
                    index: 1,
                    action: on("p1", Action::fill("#q", "ab")),
                },
            ]
        );
        assert!(coalescer.changes(&Coalesced::Dropped).is_empty());
    }
}
