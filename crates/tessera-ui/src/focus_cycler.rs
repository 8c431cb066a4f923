//! Keyboard-driven focus movement among the views of a collection.
//!
//! The cycler works out where focus is from the focus tracker's
//! `focused_element` and moves it to the next or previous focusable view,
//! wrapping at the ends. Before wrapping it fires `forwardCycle` or
//! `backwardCycle`; a low priority default listener performs the wrap, so a
//! parent can listen at a higher priority and stop the event to take focus
//! elsewhere instead.

use std::rc::{Rc, Weak};

use tessera_utils::{
    Emitter, EventInfo, FocusTracker, Keystroke, KeystrokeHandler, KeystrokeOptions, ListenOptions,
    Priority, Result,
};

use crate::view::View;
use crate::view_collection::ViewCollection;

/// Keystrokes moving focus backward and forward.
#[derive(Default)]
pub struct FocusCyclerActions {
    pub focus_previous: Vec<Keystroke>,
    pub focus_next: Vec<Keystroke>,
}

impl FocusCyclerActions {
    /// Tab and Shift+Tab.
    pub fn tab() -> Self {
        Self {
            focus_previous: vec!["Shift+Tab".into()],
            focus_next: vec!["Tab".into()],
        }
    }
}

#[derive(Clone)]
pub struct FocusCycler {
    inner: Rc<CyclerInner>,
}

struct CyclerInner {
    emitter: Emitter,
    focusables: ViewCollection,
    focus_tracker: FocusTracker,
}

#[derive(Clone, Copy)]
enum Step {
    Forward,
    Backward,
}

impl FocusCycler {
    /// Cycle over `focusables`. With a keystroke handler the `actions`
    /// keystrokes are registered at high priority, so that editor-wide
    /// handlers for the same keys do not take them first.
    pub fn new(
        focusables: &ViewCollection,
        focus_tracker: &FocusTracker,
        keystrokes: Option<&KeystrokeHandler>,
        actions: FocusCyclerActions,
    ) -> Result<Self> {
        let cycler = Self {
            inner: Rc::new(CyclerInner {
                emitter: Emitter::new(),
                focusables: focusables.clone(),
                focus_tracker: focus_tracker.clone(),
            }),
        };

        if let Some(keystrokes) = keystrokes {
            for (keystrokes_for_step, step) in [
                (actions.focus_previous, Step::Backward),
                (actions.focus_next, Step::Forward),
            ] {
                for keystroke in keystrokes_for_step {
                    let weak = cycler.downgrade();
                    keystrokes.set(
                        keystroke,
                        KeystrokeOptions::priority(Priority::High),
                        move |_, cancel| {
                            if let Some(cycler) = Self::upgrade(&weak) {
                                match step {
                                    Step::Forward => cycler.focus_next(),
                                    Step::Backward => cycler.focus_previous(),
                                }
                                cancel();
                            }
                        },
                    )?;
                }
            }
        }

        let weak = cycler.downgrade();
        cycler.inner.emitter.on_with(
            "forwardCycle",
            ListenOptions::priority(Priority::Low),
            move |_: &mut EventInfo, _: &()| {
                if let Some(cycler) = Self::upgrade(&weak) {
                    cycler.focus_first();
                }
            },
        );
        let weak = cycler.downgrade();
        cycler.inner.emitter.on_with(
            "backwardCycle",
            ListenOptions::priority(Priority::Low),
            move |_: &mut EventInfo, _: &()| {
                if let Some(cycler) = Self::upgrade(&weak) {
                    cycler.focus_last();
                }
            },
        );
        Ok(cycler)
    }

    fn downgrade(&self) -> Weak<CyclerInner> {
        Rc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<CyclerInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Fires `forwardCycle` and `backwardCycle`.
    pub fn emitter(&self) -> &Emitter {
        &self.inner.emitter
    }

    pub fn focusables(&self) -> &ViewCollection {
        &self.inner.focusables
    }

    /// Index of the focusable holding focus according to the tracker.
    pub fn current(&self) -> Option<usize> {
        let focused = self.inner.focus_tracker.focused_element()?;
        self.inner.focusables.index_of_element(&focused)
    }

    pub fn first(&self) -> Option<Rc<dyn View>> {
        self.inner
            .focusables
            .to_vec()
            .into_iter()
            .find(|view| view.is_focusable())
    }

    pub fn last(&self) -> Option<Rc<dyn View>> {
        self.inner
            .focusables
            .to_vec()
            .into_iter()
            .rev()
            .find(|view| view.is_focusable())
    }

    pub fn next(&self) -> Option<Rc<dyn View>> {
        self.focusable_item(Step::Forward)
    }

    pub fn previous(&self) -> Option<Rc<dyn View>> {
        self.focusable_item(Step::Backward)
    }

    pub fn focus_first(&self) {
        if let Some(view) = self.first() {
            view.focus();
        }
    }

    pub fn focus_last(&self) {
        if let Some(view) = self.last() {
            view.focus();
        }
    }

    pub fn focus_next(&self) {
        self.cycle(Step::Forward);
    }

    pub fn focus_previous(&self) {
        self.cycle(Step::Backward);
    }

    fn cycle(&self, step: Step) {
        let Some(target) = self.focusable_item(step) else {
            return;
        };
        let boundary = match step {
            Step::Forward => self.first(),
            Step::Backward => self.last(),
        };
        let index = self.inner.focusables.index_of(&*target);
        // Wrapping around, or a single focusable that is already focused.
        if index == self.current() || boundary.is_some_and(|b| Rc::ptr_eq(&b, &target)) {
            let event = match step {
                Step::Forward => "forwardCycle",
                Step::Backward => "backwardCycle",
            };
            tracing::trace!(event, "focus cycler wrapping");
            self.inner.emitter.fire(event, &());
        } else {
            target.focus();
        }
    }

    fn focusable_item(&self, step: Step) -> Option<Rc<dyn View>> {
        let views = self.inner.focusables.to_vec();
        let len = views.len();
        if len == 0 {
            return None;
        }
        let Some(current) = self.current() else {
            return match step {
                Step::Forward => self.first(),
                Step::Backward => self.last(),
            };
        };
        let advance = |index: usize| match step {
            Step::Forward => (index + 1) % len,
            Step::Backward => (index + len - 1) % len,
        };
        let mut index = advance(current);
        while index != current {
            if views[index].is_focusable() {
                return Some(views[index].clone());
            }
            index = advance(index);
        }
        Some(views[current].clone())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::button::ButtonView;
    use crate::view::ViewContext;
    use tessera_utils::keyboard::{KeyEventData, TAB};
    use tessera_utils::{Document, Env};

    struct Fixture {
        document: Document,
        buttons: Vec<Rc<ButtonView>>,
        tracker: FocusTracker,
        keystrokes: KeystrokeHandler,
        cycler: FocusCycler,
    }

    fn fixture(count: usize) -> Fixture {
        let context = ViewContext::default();
        let focusables = ViewCollection::new();
        let tracker = FocusTracker::new();
        let keystrokes = KeystrokeHandler::with_env(Env::other());
        let buttons: Vec<_> = (0..count)
            .map(|i| {
                let button = ButtonView::new(&context);
                button.label.set(format!("b{i}").into());
                button.render().unwrap();
                context.document.body().append_child(&button.element().unwrap());
                tracker.add(button.trackable()).unwrap();
                focusables.add(button.clone()).unwrap();
                button
            })
            .collect();
        let cycler = FocusCycler::new(
            &focusables,
            &tracker,
            Some(&keystrokes),
            FocusCyclerActions::tab(),
        )
        .unwrap();
        Fixture {
            document: context.document.clone(),
            buttons,
            tracker,
            keystrokes,
            cycler,
        }
    }

    fn focused_index(fixture: &Fixture) -> Option<usize> {
        let active = fixture.document.active_element()?;
        fixture
            .buttons
            .iter()
            .position(|button| button.element().as_ref() == Some(&active))
    }

    #[test]
    fn tab_moves_forward_and_wraps() {
        let f = fixture(3);
        f.buttons[0].focus();

        assert!(f.keystrokes.press(&KeyEventData::new(TAB)));
        assert_eq!(focused_index(&f), Some(1));
        f.cycler.focus_next();
        assert_eq!(focused_index(&f), Some(2));
        f.cycler.focus_next();
        assert_eq!(focused_index(&f), Some(0));
        assert_eq!(f.tracker.focused_element(), f.buttons[0].element());
    }

    #[test]
    fn disabled_views_are_skipped_backwards() {
        let f = fixture(3);
        f.buttons[1].is_enabled.set(false);
        f.buttons[2].focus();

        f.cycler.focus_previous();
        assert_eq!(focused_index(&f), Some(0));
        f.cycler.focus_previous();
        assert_eq!(focused_index(&f), Some(2));
    }

    #[test]
    fn nothing_focused_starts_at_the_ends() {
        let f = fixture(2);
        f.cycler.focus_previous();
        assert_eq!(focused_index(&f), Some(1));
    }

    #[test]
    fn wrapping_can_be_taken_over() {
        let f = fixture(2);
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log = log.clone();
            f.cycler
                .emitter()
                .on("forwardCycle", move |info: &mut EventInfo, _: &()| {
                    log.borrow_mut().push("parent");
                    info.stop();
                });
        }
        f.buttons[1].focus();

        f.cycler.focus_next();

        assert_eq!(*log.borrow(), vec!["parent"]);
        assert_eq!(focused_index(&f), Some(1));
    }
}
