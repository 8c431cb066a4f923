//! Keeps the editing view in sync with the model.

use std::fmt;
use std::rc::{Rc, Weak};

use smol_str::SmolStr;
use tessera_utils::{Document, Emitter, EventInfo};

use crate::conversion::Conversion;
use crate::model::{ChangedRoots, Model};
use crate::view::EditingView;

/// Owns the editing view and re-renders it whenever the model changes or a
/// DOM root is attached.
#[derive(Clone)]
pub struct EditingController {
    inner: Rc<ControllerInner>,
}

struct ControllerInner {
    emitter: Emitter,
    model: Model,
    view: EditingView,
    conversion: Conversion,
}

impl EditingController {
    pub fn new(model: &Model, document: &Document, conversion: &Conversion) -> Self {
        let view = EditingView::new(document);
        let inner = Rc::new_cyclic(|weak: &Weak<ControllerInner>| {
            let emitter = Emitter::new();
            let on_change = weak.clone();
            emitter.listen_to(
                model.emitter(),
                "change:data",
                move |_: &mut EventInfo, _: &ChangedRoots| {
                    if let Some(inner) = on_change.upgrade() {
                        (Self { inner }).render();
                    }
                },
            );
            let on_attach = weak.clone();
            emitter.listen_to(
                view.emitter(),
                "attachDomRoot",
                move |_: &mut EventInfo, _: &SmolStr| {
                    if let Some(inner) = on_attach.upgrade() {
                        (Self { inner }).render();
                    }
                },
            );
            ControllerInner {
                emitter,
                model: model.clone(),
                view,
                conversion: conversion.clone(),
            }
        });
        Self { inner }
    }

    pub fn view(&self) -> &EditingView {
        &self.inner.view
    }

    pub fn model(&self) -> &Model {
        &self.inner.model
    }

    pub fn render(&self) {
        self.inner
            .view
            .render(&self.inner.model, &self.inner.conversion);
    }

    pub fn destroy(&self) {
        self.inner.emitter.stop_listening(None, None, None);
        self.inner.view.destroy();
    }
}

impl fmt::Debug for EditingController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditingController")
            .field("view", &self.inner.view)
            .finish()
    }
}
