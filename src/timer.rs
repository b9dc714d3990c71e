//! Restartable timers for self-clearing animation classes.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::error::PageError;
use crate::host::{Element, TimerId, Timers};

/// A single pending timeout. Restarting cancels the pending one first, so
/// the task runs once, `delay` after the *last* restart.
pub struct RestartableTimer {
    timers: Rc<dyn Timers>,
    pending: Rc<Cell<Option<TimerId>>>,
}

impl RestartableTimer {
    pub fn new(timers: Rc<dyn Timers>) -> Self {
        Self {
            timers,
            pending: Rc::new(Cell::new(None)),
        }
    }

    /// On error nothing is pending and `task` never runs
    pub fn restart(
        &self,
        delay: Duration,
        task: impl FnOnce() + 'static,
    ) -> Result<(), PageError> {
        self.cancel();

        let pending = self.pending.clone();
        let wrapped = Box::new(move || {
            pending.set(None);
            task();
        });
        let id = self.timers.set_timeout(delay, wrapped)?;
        self.pending.set(Some(id));
        Ok(())
    }

    pub fn cancel(&self) {
        if let Some(id) = self.pending.take() {
            self.timers.clear_timeout(id);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }
}

/// Adds a class and removes it again after a fixed duration.
pub struct ClassPulse {
    element: Rc<dyn Element>,
    class: &'static str,
    duration: Duration,
    timer: RestartableTimer,
}

impl ClassPulse {
    pub fn new(
        element: Rc<dyn Element>,
        class: &'static str,
        duration: Duration,
        timers: Rc<dyn Timers>,
    ) -> Self {
        Self {
            element,
            class,
            duration,
            timer: RestartableTimer::new(timers),
        }
    }

    /// The class is only added once its removal is scheduled.
    pub fn trigger(&self) {
        let element = self.element.clone();
        let class = self.class;
        match self
            .timer
            .restart(self.duration, move || element.remove_class(class))
        {
            Ok(()) => self.element.add_class(self.class),
            Err(e) => {
                tracing::warn!("Skipping {} animation: {}", self.class, e);
                self.element.remove_class(self.class);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_pending()
    }
}
