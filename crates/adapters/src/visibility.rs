//! First-hidden tracking on top of [`PageHost`].

use crate::page::{PageHost, VisibilityChange, WeakPageHost};
use fid_ports::{FirstHiddenWatch, HiddenCallback, HiddenEvent, HiddenThreshold, VisibilityPort};
use std::cell::Cell;
use std::rc::Rc;

/// Watch reading the host's hidden-transition log.
///
/// A watch opened on a visible page resolves to the first transition
/// recorded after it was opened; one opened on a hidden page starts at `0`.
struct TransitionWatch {
    host: WeakPageHost,
    hidden_at_open: bool,
    first_index: usize,
}

impl FirstHiddenWatch for TransitionWatch {
    fn threshold(&self) -> HiddenThreshold {
        if self.hidden_at_open {
            return HiddenThreshold::at(0.0);
        }
        self.host
            .upgrade()
            .and_then(|host| host.hidden_transition(self.first_index))
            .map_or(HiddenThreshold::Never, HiddenThreshold::at)
    }
}

/// Visibility adapter for the metric core.
#[derive(Clone)]
pub struct FirstHiddenTracker {
    host: WeakPageHost,
}

impl FirstHiddenTracker {
    /// Track visibility of `host`.
    #[must_use]
    pub fn new(host: &PageHost) -> Self {
        Self {
            host: host.downgrade(),
        }
    }
}

impl VisibilityPort for FirstHiddenTracker {
    fn watch_first_hidden(&self) -> Rc<dyn FirstHiddenWatch> {
        let (hidden_at_open, first_index) = self.host.upgrade().map_or((false, 0), |host| {
            (host.is_hidden(), host.hidden_transition_count())
        });
        Rc::new(TransitionWatch {
            host: self.host.clone(),
            hidden_at_open,
            first_index,
        })
    }

    fn is_hidden(&self) -> bool {
        self.host.upgrade().is_some_and(|host| host.is_hidden())
    }

    fn on_hidden(&self, callback: HiddenCallback, once: bool) {
        let Some(host) = self.host.upgrade() else {
            return;
        };
        let own_id = Rc::new(Cell::new(None));
        let listener_id = Rc::clone(&own_id);
        let weak_host = self.host.clone();
        let id = host.add_visibility_listener(Rc::new(move |change: VisibilityChange| {
            if !change.hidden {
                return;
            }
            if once {
                if let (Some(host), Some(id)) = (weak_host.upgrade(), listener_id.get()) {
                    host.remove_visibility_listener(id);
                }
            }
            callback(HiddenEvent {
                time_stamp: change.time_stamp,
            });
        }));
        own_id.set(Some(id));
    }
}
