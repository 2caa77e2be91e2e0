//! Restore notifications from page-show events.

use crate::page::{PageHost, PageShow, WeakPageHost};
use fid_ports::{RestoreCallback, RestoreEvent, RestorePort};
use std::rc::Rc;

/// Restore adapter: forwards persisted page-show events only.
#[derive(Clone)]
pub struct PageShowRestoreNotifier {
    host: WeakPageHost,
}

impl PageShowRestoreNotifier {
    /// Listen for restores of `host`.
    #[must_use]
    pub fn new(host: &PageHost) -> Self {
        Self {
            host: host.downgrade(),
        }
    }
}

impl RestorePort for PageShowRestoreNotifier {
    fn on_restore(&self, callback: RestoreCallback) {
        let Some(host) = self.host.upgrade() else {
            return;
        };
        host.add_page_show_listener(Rc::new(move |event: PageShow| {
            if event.persisted {
                callback(RestoreEvent {
                    time_stamp: event.time_stamp,
                });
            }
        }));
    }
}
