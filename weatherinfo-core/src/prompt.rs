//! Ownership of the one blocking prompt a screen may show.

use crate::flow::PromptKind;

/// A prompt currently on screen.
pub trait Prompt: Send + Sync {
    fn kind(&self) -> PromptKind;

    /// Remove the prompt. Called at most once, by [`ActivePrompt`].
    fn dismiss(&mut self);
}

/// Dismisses the wrapped prompt when dropped.
pub struct ActivePrompt(Box<dyn Prompt>);

impl ActivePrompt {
    pub fn new(prompt: Box<dyn Prompt>) -> Self {
        Self(prompt)
    }

    pub fn kind(&self) -> PromptKind {
        self.0.kind()
    }
}

impl Drop for ActivePrompt {
    fn drop(&mut self) {
        tracing::debug!(kind = ?self.0.kind(), "dismissing prompt");
        self.0.dismiss();
    }
}

impl std::fmt::Debug for ActivePrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ActivePrompt").field(&self.kind()).finish()
    }
}

/// Holds at most one [`ActivePrompt`]; the previous one is dismissed before
/// a new one takes its place.
#[derive(Debug, Default)]
pub struct PromptSlot {
    current: Option<ActivePrompt>,
}

impl PromptSlot {
    pub fn show(&mut self, prompt: ActivePrompt) {
        // Drop the old guard first so two prompts never coexist.
        self.clear();
        self.current = Some(prompt);
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn is_visible(&self) -> bool {
        self.current.is_some()
    }

    pub fn kind(&self) -> Option<PromptKind> {
        self.current.as_ref().map(ActivePrompt::kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicI32, Ordering},
    };

    struct CountingPrompt {
        kind: PromptKind,
        visible: Arc<AtomicI32>,
    }

    impl CountingPrompt {
        fn open(kind: PromptKind, visible: &Arc<AtomicI32>) -> ActivePrompt {
            visible.fetch_add(1, Ordering::SeqCst);
            ActivePrompt::new(Box::new(Self { kind, visible: Arc::clone(visible) }))
        }
    }

    impl Prompt for CountingPrompt {
        fn kind(&self) -> PromptKind {
            self.kind
        }

        fn dismiss(&mut self) {
            self.visible.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn replacing_dismisses_previous_prompt() {
        let visible = Arc::new(AtomicI32::new(0));
        let mut slot = PromptSlot::default();

        slot.show(CountingPrompt::open(PromptKind::EnableLocation, &visible));
        assert_eq!(visible.load(Ordering::SeqCst), 1);

        // The replacement is opened before the slot gets it, so the count
        // briefly reaches two; after show() only one remains.
        slot.show(CountingPrompt::open(PromptKind::PermissionRationale, &visible));
        assert_eq!(visible.load(Ordering::SeqCst), 1);
        assert_eq!(slot.kind(), Some(PromptKind::PermissionRationale));
    }

    #[test]
    fn clear_and_drop_dismiss() {
        let visible = Arc::new(AtomicI32::new(0));

        let mut slot = PromptSlot::default();
        slot.show(CountingPrompt::open(PromptKind::EnableLocation, &visible));
        slot.clear();
        assert_eq!(visible.load(Ordering::SeqCst), 0);
        assert!(!slot.is_visible());

        {
            let mut scoped = PromptSlot::default();
            scoped.show(CountingPrompt::open(PromptKind::EnableLocation, &visible));
            assert_eq!(visible.load(Ordering::SeqCst), 1);
        }
        assert_eq!(visible.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn clearing_empty_slot_is_noop() {
        let mut slot = PromptSlot::default();
        slot.clear();
        assert_eq!(slot.kind(), None);
    }
}
