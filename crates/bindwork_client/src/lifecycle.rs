//! Lifecycle states of a connected instance.

/// Lifecycle of a connected component instance.
///
/// States only move forward:
/// `Created → Mounting → Mounted → Unmounting → Unmounted`.
/// `Unmounted` is terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    #[default]
    Created,
    Mounting,
    Mounted,
    Unmounting,
    Unmounted,
}

impl Lifecycle {
    /// Whether `next` is the single legal successor of `self`.
    pub fn can_advance_to(self, next: Lifecycle) -> bool {
        matches!(
            (self, next),
            (Lifecycle::Created, Lifecycle::Mounting)
                | (Lifecycle::Mounting, Lifecycle::Mounted)
                | (Lifecycle::Mounted, Lifecycle::Unmounting)
                | (Lifecycle::Unmounting, Lifecycle::Unmounted)
        )
    }

    /// Move to `next` if the transition is legal. Returns whether it moved.
    pub fn advance(&mut self, next: Lifecycle) -> bool {
        if self.can_advance_to(next) {
            *self = next;
            true
        } else {
            false
        }
    }

    pub fn is_mounted(self) -> bool {
        self == Lifecycle::Mounted
    }

    pub fn is_terminal(self) -> bool {
        self == Lifecycle::Unmounted
    }
}
