use dioxus::prelude::*;

use crate::usecase::ports::export::{Notice, Notifier};

/// Single notification slot shown above the table. Every notice replaces the
/// previous one.
#[derive(Clone, Copy)]
pub struct SignalNotifier {
    slot: Signal<Option<Notice>>,
}

impl SignalNotifier {
    pub fn new(slot: Signal<Option<Notice>>) -> Self {
        Self { slot }
    }
}

impl Notifier for SignalNotifier {
    fn notify(&self, notice: Notice) {
        let mut slot = self.slot;
        slot.set(Some(notice));
    }
}
