//! Background resolver - first loadable candidate wins.
//!
//! Candidates are probed strictly in order, one at a time. Each `resolve`
//! call takes a new generation; a chain that finds out it is no longer the
//! latest stops without committing, so a slow chain from a previous theme
//! can never overwrite the background of the current one.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::host::ImageProbe;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// This candidate loaded and was committed
    Committed(String),
    /// Every candidate failed; the previous background stays
    Exhausted,
    /// A newer `resolve` call started before this one finished
    Superseded,
}

pub struct ResourceResolver {
    images: Rc<dyn ImageProbe>,
    generation: Cell<u64>,
    current: RefCell<Option<String>>,
}

impl ResourceResolver {
    pub fn new(images: Rc<dyn ImageProbe>) -> Self {
        Self {
            images,
            generation: Cell::new(0),
            current: RefCell::new(None),
        }
    }

    /// Last committed location
    pub fn current(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    pub async fn resolve<F>(&self, candidates: &[String], on_success: F) -> Resolution
    where
        F: FnOnce(&str),
    {
        let ticket = self.generation.get().wrapping_add(1);
        self.generation.set(ticket);

        for candidate in candidates {
            let loaded = self.images.probe(candidate).await;
            if self.generation.get() != ticket {
                tracing::debug!("Background probe superseded at {}", candidate);
                return Resolution::Superseded;
            }
            if !loaded {
                tracing::debug!("Background candidate unavailable: {}", candidate);
                continue;
            }

            *self.current.borrow_mut() = Some(candidate.clone());
            on_success(candidate);
            return Resolution::Committed(candidate.clone());
        }

        tracing::debug!("No background candidate loaded ({} tried)", candidates.len());
        Resolution::Exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Spawner;
    use crate::sim::{SimImages, SimSpawner};
    use futures::executor::block_on;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_success_wins_and_rest_are_skipped() {
        let images = SimImages::new();
        images.make_available("b.jpg");
        images.make_available("c.jpg");
        let resolver = ResourceResolver::new(images.clone());

        let mut committed = None;
        let outcome = block_on(resolver.resolve(&list(&["a.jpg", "b.jpg", "c.jpg"]), |p| {
            committed = Some(p.to_string())
        }));

        assert_eq!(outcome, Resolution::Committed("b.jpg".into()));
        assert_eq!(committed.as_deref(), Some("b.jpg"));
        assert_eq!(images.probed(), list(&["a.jpg", "b.jpg"]));
        assert_eq!(resolver.current().as_deref(), Some("b.jpg"));
    }

    #[test]
    fn test_retry_commits_first_candidate_of_new_list() {
        let images = SimImages::new();
        images.make_available("light-1.jpg");
        let resolver = ResourceResolver::new(images.clone());

        let outcome = block_on(resolver.resolve(&list(&["dark-1.jpg", "dark-2.jpg"]), |_| {}));
        assert_eq!(outcome, Resolution::Exhausted);

        let outcome =
            block_on(resolver.resolve(&list(&["light-1.jpg", "light-2.jpg"]), |_| {}));
        assert_eq!(outcome, Resolution::Committed("light-1.jpg".into()));
    }

    #[test]
    fn test_exhaustion_keeps_previous_value() {
        let images = SimImages::new();
        images.make_available("ok.jpg");
        let resolver = ResourceResolver::new(images.clone());

        block_on(resolver.resolve(&list(&["ok.jpg"]), |_| {}));

        let mut called = false;
        let outcome = block_on(resolver.resolve(&list(&["x.jpg", "y.jpg"]), |_| called = true));

        assert_eq!(outcome, Resolution::Exhausted);
        assert!(!called);
        assert_eq!(resolver.current().as_deref(), Some("ok.jpg"));
    }

    #[test]
    fn test_empty_list_commits_nothing() {
        let resolver = ResourceResolver::new(SimImages::new());
        let outcome = block_on(resolver.resolve(&[], |_| panic!("nothing to commit")));
        assert_eq!(outcome, Resolution::Exhausted);
        assert_eq!(resolver.current(), None);
    }

    #[test]
    fn test_stale_chain_does_not_overwrite_newer_one() {
        let images = SimImages::gated();
        let resolver = Rc::new(ResourceResolver::new(images.clone()));
        let spawner = SimSpawner::new();
        let outcomes = Rc::new(RefCell::new(Vec::new()));

        for candidates in [list(&["old.jpg"]), list(&["new.jpg"])] {
            let resolver = resolver.clone();
            let outcomes = outcomes.clone();
            spawner.spawn(Box::pin(async move {
                let outcome = resolver.resolve(&candidates, |_| {}).await;
                outcomes.borrow_mut().push(outcome);
            }));
            spawner.run_until_stalled();
        }
        assert_eq!(images.pending(), 2);

        // Newer chain finishes first, then the stale one succeeds late
        images.release("new.jpg", true);
        spawner.run_until_stalled();
        images.release("old.jpg", true);
        spawner.run_until_stalled();

        assert_eq!(
            *outcomes.borrow(),
            vec![Resolution::Committed("new.jpg".into()), Resolution::Superseded]
        );
        assert_eq!(resolver.current().as_deref(), Some("new.jpg"));
    }
}
