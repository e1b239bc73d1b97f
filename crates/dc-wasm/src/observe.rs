//! DOM observers feeding the theme and container size into the session.
//!
//! Callbacks only write into shared cells; the canvas drains them on its
//! next `tick`, so every state change still happens inside one call.

use dc_annotate::{Theme, ThemeSignals};
use dc_core::{Container, Point, Size};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Element, MediaQueryList, MediaQueryListEvent, MutationObserver, MutationObserverInit, ResizeObserver,
    ResizeObserverEntry,
};

const DARK_QUERY: &str = "(prefers-color-scheme: dark)";

/// Theme class on the document root, if it carries one.
fn document_theme(root: &Element) -> Option<Theme> {
    let classes = root.class_list();
    if classes.contains("dark") {
        Some(Theme::Dark)
    } else if classes.contains("light") {
        Some(Theme::Light)
    } else {
        None
    }
}

pub struct Observers {
    container: Element,
    signals: Rc<Cell<ThemeSignals>>,
    signals_dirty: Rc<Cell<bool>>,
    size: Rc<Cell<Option<Size>>>,
    mutation: MutationObserver,
    _mutation_cb: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
    media: Option<MediaQueryList>,
    media_cb: Closure<dyn FnMut(MediaQueryListEvent)>,
    resize: ResizeObserver,
    _resize_cb: Closure<dyn FnMut(js_sys::Array, ResizeObserver)>,
}

impl Observers {
    pub fn attach(container: &Element) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
        let root = document
            .document_element()
            .ok_or_else(|| JsValue::from_str("no document element"))?;
        let media = window.match_media(DARK_QUERY)?;

        let initial = ThemeSignals {
            document: document_theme(&root),
            system_dark: media.as_ref().is_some_and(MediaQueryList::matches),
        };
        let signals = Rc::new(Cell::new(initial));
        let signals_dirty = Rc::new(Cell::new(true));
        let size = Rc::new(Cell::new(None));

        let mutation_cb = {
            let (signals, dirty, root) = (signals.clone(), signals_dirty.clone(), root.clone());
            Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(move |_records: js_sys::Array, _observer: MutationObserver| {
                let next = ThemeSignals {
                    document: document_theme(&root),
                    ..signals.get()
                };
                if next != signals.get() {
                    signals.set(next);
                    dirty.set(true);
                }
            })
        };
        let mutation = MutationObserver::new(mutation_cb.as_ref().unchecked_ref())?;
        let init = MutationObserverInit::new();
        init.set_attributes(true);
        init.set_attribute_filter(&js_sys::Array::of1(&JsValue::from_str("class")));
        mutation.observe_with_options(&root, &init)?;

        let media_cb = {
            let (signals, dirty) = (signals.clone(), signals_dirty.clone());
            Closure::<dyn FnMut(MediaQueryListEvent)>::new(move |event: MediaQueryListEvent| {
                signals.set(ThemeSignals {
                    system_dark: event.matches(),
                    ..signals.get()
                });
                dirty.set(true);
            })
        };
        if let Some(media) = &media {
            media.add_event_listener_with_callback("change", media_cb.as_ref().unchecked_ref())?;
        }

        let resize_cb = {
            let size = size.clone();
            Closure::<dyn FnMut(js_sys::Array, ResizeObserver)>::new(move |entries: js_sys::Array, _observer: ResizeObserver| {
                let Some(entry) = entries.iter().last() else {
                    return;
                };
                let rect = entry.unchecked_into::<ResizeObserverEntry>().content_rect();
                size.set(Some(Size::new(rect.width(), rect.height())));
            })
        };
        let resize = ResizeObserver::new(resize_cb.as_ref().unchecked_ref())?;
        resize.observe(container);

        log::debug!("OBSERVE attached (theme {:?})", initial.resolve());
        Ok(Self {
            container: container.clone(),
            signals,
            signals_dirty,
            size,
            mutation,
            _mutation_cb: mutation_cb,
            media,
            media_cb,
            resize,
            _resize_cb: resize_cb,
        })
    }

    /// Theme signals, if they changed since the last call.
    pub fn take_signals(&self) -> Option<ThemeSignals> {
        self.signals_dirty.replace(false).then(|| self.signals.get())
    }

    /// The container's new geometry, if it was resized since the last call.
    pub fn take_container(&self) -> Option<Container> {
        let size = self.size.take()?;
        let rect = self.container.get_bounding_client_rect();
        Some(Container::new(Point::new(rect.left(), rect.top()), size))
    }
}

impl Drop for Observers {
    fn drop(&mut self) {
        self.mutation.disconnect();
        self.resize.disconnect();
        if let Some(media) = &self.media {
            let _ = media.remove_event_listener_with_callback("change", self.media_cb.as_ref().unchecked_ref());
        }
    }
}
