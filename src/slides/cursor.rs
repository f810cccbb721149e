use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::pipeline::SlideEvent;

/// Current slide position of the master console.
///
/// `None` is the "no selection" position (-1). Every mutation, including one that
/// lands on the same index, is emitted in order on the slide event channel.
pub struct NavigationCursor {
    index: Option<usize>,
    deck_len: usize,
    events: mpsc::UnboundedSender<SlideEvent>,
}

impl NavigationCursor {
    pub fn new(events: mpsc::UnboundedSender<SlideEvent>) -> Self {
        Self {
            index: None,
            deck_len: 0,
            events,
        }
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn deck_len(&self) -> usize {
        self.deck_len
    }

    /// Bound the cursor to a newly installed deck. The position is left alone;
    /// callers reset it afterwards.
    pub fn set_deck_len(&mut self, deck_len: usize) {
        self.deck_len = deck_len;
    }

    /// Jump to `index`. Refused (and `false` returned) outside the deck.
    pub fn set_index(&mut self, index: usize) -> bool {
        if index >= self.deck_len {
            warn!("Ignoring slide index {} outside deck of {}", index, self.deck_len);
            return false;
        }
        self.move_to(Some(index));
        true
    }

    /// Back to the "no selection" position.
    pub fn reset(&mut self) {
        self.move_to(None);
    }

    /// One slide forward, stopping at `deck_len - 2`.
    pub fn next(&mut self) {
        let current = self.signed_index();
        if current < self.deck_len as i64 - 2 {
            self.move_to(Some((current + 1) as usize));
        }
    }

    /// One slide back, stopping at 0.
    pub fn back(&mut self) {
        let current = self.signed_index();
        if current > 0 {
            self.move_to(Some((current - 1) as usize));
        }
    }

    pub fn head(&mut self) {
        self.move_to(Some(0));
    }

    /// Last slide, or "no selection" on an empty deck.
    pub fn tail(&mut self) {
        self.move_to(self.deck_len.checked_sub(1));
    }

    fn signed_index(&self) -> i64 {
        self.index.map_or(-1, |i| i as i64)
    }

    fn move_to(&mut self, index: Option<usize>) {
        debug!("Slide cursor moved to {:?}", index);
        self.index = index;
        if self.events.send(SlideEvent::IndexChanged(index)).is_err() {
            warn!("Slide pipeline is gone; index change not forwarded");
        }
    }
}
