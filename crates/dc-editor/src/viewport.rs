//! Viewport controller: pan, zoom and pinch over the canvas transform.
//!
//! The transform lives in the graph store; this controller only holds
//! gesture state. Every write goes through `clamp_zoom`, so the scale is
//! never outside `[min_zoom, max_zoom]`, not even transiently.

use crate::config::EditorConfig;
use crate::input::{DeltaMode, TouchPoint, WheelEvent};
use dc_core::{CanvasTransform, Container, GraphStore, TransformPatch, clamp_zoom};
use kurbo::{Point, Rect, Vec2};
use std::collections::BTreeSet;

/// Pixels per wheel "line" when the host reports line deltas.
const LINE_HEIGHT_PX: f64 = 16.0;

/// A named client-space rectangle that never starts a pan (toolbar, dock).
#[derive(Debug, Clone, PartialEq)]
pub struct InteractiveRegion {
    pub name: String,
    pub rect: Rect,
}

/// Scale and finger distance captured when a second touch lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchBaseline {
    pub initial_distance: f64,
    pub initial_scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PanGesture {
    last: Point,
    travelled: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TouchGesture {
    Idle,
    Pan { last: Point },
    Pinch(PinchBaseline),
}

#[derive(Debug, Clone)]
pub struct ViewportController {
    min_zoom: f64,
    max_zoom: f64,
    zoom_step: f64,
    wheel_sensitivity: f64,
    pinch_max_delta: f64,
    drag_threshold: f64,
    container: Container,
    pan: Option<PanGesture>,
    touch: TouchGesture,
    regions: Vec<InteractiveRegion>,
    tags: BTreeSet<String>,
}

impl ViewportController {
    pub fn new(config: &EditorConfig, container: Container) -> Self {
        Self {
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            zoom_step: config.zoom_step,
            wheel_sensitivity: config.wheel_zoom_sensitivity,
            pinch_max_delta: config.pinch_wheel_max_delta,
            drag_threshold: config.drag_threshold,
            container,
            pan: None,
            touch: TouchGesture::Idle,
            regions: Vec::new(),
            tags: config.interactive_tags.iter().cloned().collect(),
        }
    }

    pub fn container(&self) -> Container {
        self.container
    }

    pub fn set_container(&mut self, container: Container) {
        self.container = container;
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some() || matches!(self.touch, TouchGesture::Pan { .. })
    }

    pub fn pinch_baseline(&self) -> Option<PinchBaseline> {
        match self.touch {
            TouchGesture::Pinch(b) => Some(b),
            TouchGesture::Idle | TouchGesture::Pan { .. } => None,
        }
    }

    // ─── Zoom ────────────────────────────────────────────────────────────

    pub fn zoom_in<S: GraphStore>(&self, store: &mut S) {
        let scale = store.state().canvas_transform.scale + self.zoom_step;
        self.set_zoom(store, scale);
    }

    pub fn zoom_out<S: GraphStore>(&self, store: &mut S) {
        let scale = store.state().canvas_transform.scale - self.zoom_step;
        self.set_zoom(store, scale);
    }

    /// Absolute zoom, keeping the container centre fixed.
    pub fn set_zoom<S: GraphStore>(&self, store: &mut S, scale: f64) {
        self.zoom_about(store, scale, self.container.local_center());
    }

    /// Zoom keeping the canvas point under `client` fixed on screen.
    pub fn zoom_at<S: GraphStore>(&self, store: &mut S, scale: f64, client: Point) {
        self.zoom_about(store, scale, self.container.to_local(client));
    }

    fn zoom_about<S: GraphStore>(&self, store: &mut S, scale: f64, focal: Point) {
        let t = store.state().canvas_transform;
        let scale = clamp_zoom(scale, self.min_zoom, self.max_zoom);
        let anchor = (focal - t.translation()).to_vec2() / t.scale;
        let translate = focal.to_vec2() - anchor * scale;
        log::trace!("VIEWPORT zoom {:.3} -> {scale:.3}", t.scale);
        store.set_canvas_transform(CanvasTransform {
            scale,
            translate_x: translate.x,
            translate_y: translate.y,
        });
    }

    pub fn reset_viewport<S: GraphStore>(&self, store: &mut S) {
        store.set_canvas_transform(CanvasTransform::IDENTITY);
    }

    fn translate_by<S: GraphStore>(store: &mut S, delta: Vec2) {
        let t = store.state().canvas_transform;
        store.update_canvas_transform(TransformPatch {
            translate_x: Some(t.translate_x + delta.x),
            translate_y: Some(t.translate_y + delta.y),
            ..TransformPatch::default()
        });
    }

    // ─── Mouse pan ───────────────────────────────────────────────────────

    /// Begin a pan unless the press landed on an interactive element.
    pub fn pan_start(&mut self, client: Point, target: Option<&str>) -> bool {
        if self.is_interactive(client, target) {
            return false;
        }
        self.pan = Some(PanGesture {
            last: client,
            travelled: 0.0,
        });
        true
    }

    pub fn pan_move<S: GraphStore>(&mut self, store: &mut S, client: Point) -> bool {
        let Some(pan) = &mut self.pan else {
            return false;
        };
        let delta = client - pan.last;
        pan.last = client;
        pan.travelled += delta.hypot();
        Self::translate_by(store, delta);
        true
    }

    /// End the pan. Returns whether it travelled past the drag threshold.
    pub fn pan_end(&mut self) -> bool {
        self.pan
            .take()
            .is_some_and(|p| p.travelled > self.drag_threshold)
    }

    // ─── Touch ───────────────────────────────────────────────────────────

    /// One touch pans, two touches pinch.
    pub fn touch_start<S: GraphStore>(&mut self, store: &S, touches: &[TouchPoint], target: Option<&str>) -> bool {
        match touches {
            [one] => {
                if self.is_interactive(one.position(), target) {
                    return false;
                }
                self.touch = TouchGesture::Pan {
                    last: one.position(),
                };
                true
            }
            [a, b, ..] => {
                let initial_distance = a.position().distance(b.position());
                self.touch = TouchGesture::Pinch(PinchBaseline {
                    initial_distance,
                    initial_scale: store.state().canvas_transform.scale,
                });
                log::trace!("VIEWPORT pinch baseline {initial_distance:.1}px");
                true
            }
            [] => false,
        }
    }

    pub fn touch_move<S: GraphStore>(&mut self, store: &mut S, touches: &[TouchPoint]) -> bool {
        match (&mut self.touch, touches) {
            (TouchGesture::Pan { last }, [one, ..]) => {
                let delta = one.position() - *last;
                *last = one.position();
                Self::translate_by(store, delta);
                true
            }
            (TouchGesture::Pinch(baseline), [a, b, ..]) => {
                if baseline.initial_distance <= f64::EPSILON {
                    return false;
                }
                let ratio = a.position().distance(b.position()) / baseline.initial_distance;
                let scale = baseline.initial_scale * ratio;
                let mid = a.position().midpoint(b.position());
                self.zoom_at(store, scale, mid);
                true
            }
            _ => false,
        }
    }

    /// `remaining` are the contacts still down. A pinch that drops to one
    /// finger continues as a pan.
    pub fn touch_end(&mut self, remaining: &[TouchPoint]) {
        self.touch = match remaining {
            [one] => TouchGesture::Pan {
                last: one.position(),
            },
            _ => TouchGesture::Idle,
        };
    }

    // ─── Wheel ───────────────────────────────────────────────────────────

    /// Plain wheel scrolling must not hijack zoom: only modifier-held
    /// wheels and trackpad pinches (small fractional pixel deltas) count.
    pub fn is_zoom_gesture(&self, ev: &WheelEvent) -> bool {
        if ev.modifiers.command() {
            return true;
        }
        ev.delta_mode == DeltaMode::Pixel
            && ev.delta_x == 0.0
            && ev.delta_y.fract() != 0.0
            && ev.delta_y.abs() < self.pinch_max_delta
    }

    /// Zoom around the pointer if the wheel event is a zoom gesture.
    /// Returns `false` when the event was ignored.
    pub fn wheel<S: GraphStore>(&self, store: &mut S, ev: &WheelEvent) -> bool {
        if !self.is_zoom_gesture(ev) {
            return false;
        }
        let dy = match ev.delta_mode {
            DeltaMode::Pixel => ev.delta_y,
            DeltaMode::Line => ev.delta_y * LINE_HEIGHT_PX,
            DeltaMode::Page => ev.delta_y * self.container.size.height,
        };
        let scale = store.state().canvas_transform.scale * (-dy * self.wheel_sensitivity).exp();
        self.zoom_at(store, scale, ev.position());
        true
    }

    // ─── Interactive registry ────────────────────────────────────────────

    /// Register (or move) a named client-space region.
    pub fn register_region(&mut self, name: impl Into<String>, rect: Rect) {
        let name = name.into();
        match self.regions.iter_mut().find(|r| r.name == name) {
            Some(r) => r.rect = rect,
            None => self.regions.push(InteractiveRegion { name, rect }),
        }
    }

    pub fn unregister_region(&mut self, name: &str) -> bool {
        let before = self.regions.len();
        self.regions.retain(|r| r.name != name);
        self.regions.len() != before
    }

    pub fn register_tag(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    pub fn unregister_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    pub fn regions(&self) -> &[InteractiveRegion] {
        &self.regions
    }

    /// Whether a gesture at `client` on `target` belongs to UI chrome.
    pub fn is_interactive(&self, client: Point, target: Option<&str>) -> bool {
        target.is_some_and(|t| self.tags.contains(t)) || self.regions.iter().any(|r| r.rect.contains(client))
    }
}
