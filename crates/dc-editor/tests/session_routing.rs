//! Integration tests: event routing between viewport, graph and overlay.

use dc_annotate::{AnnotationTool, ThemeSignals};
use dc_core::{CanvasTransform, Container, EdgeId, GraphStore, ManualClock, MemoryStore, Node, NodeId, NodeType, Point, Size};
use dc_editor::{DeltaMode, EditorConfig, FinishEvent, InputEvent, Modifiers, Session, TouchPoint, WheelEvent};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

struct Fixture {
    session: Session<MemoryStore>,
    clock: ManualClock,
    finished: Rc<RefCell<Vec<FinishEvent>>>,
}

fn fixture() -> Fixture {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = MemoryStore::from_parts(
        vec![
            Node::new(NodeId(1), NodeType::Start, "Start", Point::new(0.0, 0.0)),
            Node::new(NodeId(2), NodeType::End, "End", Point::new(400.0, 0.0)),
        ],
        vec![],
    );
    let clock = ManualClock::new(1_000);
    let mut session = Session::new(
        store,
        EditorConfig::default(),
        Container::new(Point::ORIGIN, Size::new(800.0, 600.0)),
        Box::new(clock.clone()),
        ThemeSignals::default(),
    );
    let finished = Rc::new(RefCell::new(Vec::new()));
    let sink = finished.clone();
    session.set_on_finish(move |e| sink.borrow_mut().push(*e));
    Fixture {
        session,
        clock,
        finished,
    }
}

fn transform(s: &Session<MemoryStore>) -> CanvasTransform {
    s.store().state().canvas_transform
}

fn ctrl() -> Modifiers {
    Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    }
}

#[test]
fn background_drag_pans() {
    let Fixture { mut session, .. } = fixture();
    session.handle(InputEvent::pointer_down(300.0, 300.0));
    session.handle(InputEvent::pointer_move(350.0, 320.0));
    session.handle(InputEvent::pointer_up(350.0, 320.0));
    let t = transform(&session);
    assert_eq!((t.translate_x, t.translate_y), (50.0, 20.0));
}

#[test]
fn click_ending_a_pan_keeps_selection() {
    let Fixture { mut session, .. } = fixture();
    session.handle(InputEvent::click(20.0, 20.0));
    session.handle(InputEvent::pointer_down(300.0, 300.0));
    session.handle(InputEvent::pointer_move(340.0, 300.0));
    session.handle(InputEvent::pointer_up(340.0, 300.0));
    session.handle(InputEvent::click(340.0, 300.0));
    assert_eq!(session.store().state().selected_node, Some(NodeId(1)));

    session.handle(InputEvent::click(340.0, 300.0));
    assert_eq!(session.store().state().selected_node, None);
}

#[test]
fn interactive_target_does_not_pan() {
    let Fixture { mut session, .. } = fixture();
    let down = InputEvent::PointerDown {
        x: 300.0,
        y: 300.0,
        modifiers: Modifiers::NONE,
        target: Some("toolbar".into()),
    };
    assert!(!session.handle(down));
    session.handle(InputEvent::pointer_move(350.0, 350.0));
    assert_eq!(transform(&session), CanvasTransform::IDENTITY);
}

#[test]
fn connection_gesture_creates_edge_and_reports_it() {
    let Fixture {
        mut session, finished, ..
    } = fixture();
    // Handle sits on node 1's right edge.
    session.handle(InputEvent::pointer_down(160.0, 28.0));
    assert_eq!(session.store().state().connecting, Some(NodeId(1)));
    session.handle(InputEvent::pointer_move(300.0, 40.0));
    assert_eq!(session.store().state().temp_line.unwrap().x2, 300.0);
    session.handle(InputEvent::pointer_up(450.0, 30.0));

    let edge = EdgeId::for_pair(NodeId(1), NodeId(2));
    let state = session.store().state();
    assert_eq!(state.connecting, None);
    assert_eq!(state.temp_line, None);
    assert!(state.edge(edge).is_some());
    assert_eq!(
        finished.borrow().as_slice(),
        &[FinishEvent::Connection {
            source: NodeId(1),
            target: Some(NodeId(2)),
            edge: Some(edge),
        }]
    );
}

#[test]
fn connection_released_on_background_is_dropped() {
    let Fixture {
        mut session, finished, ..
    } = fixture();
    session.handle(InputEvent::pointer_down(160.0, 28.0));
    session.handle(InputEvent::pointer_up(300.0, 300.0));
    assert!(session.store().state().edges.is_empty());
    assert_eq!(session.store().state().temp_line, None);
    assert_eq!(
        finished.borrow().as_slice(),
        &[FinishEvent::Connection {
            source: NodeId(1),
            target: None,
            edge: None,
        }]
    );
}

#[test]
fn global_pointer_up_cancels_connection() {
    let Fixture { mut session, .. } = fixture();
    session.handle(InputEvent::pointer_down(160.0, 28.0));
    assert!(session.handle(InputEvent::GlobalPointerUp));
    assert_eq!(session.store().state().connecting, None);
    assert!(!session.handle(InputEvent::GlobalPointerUp));
}

#[test]
fn escape_cancels_connection_and_returns_to_select() {
    let Fixture { mut session, .. } = fixture();
    session.set_tool(AnnotationTool::Rectangle);
    session.set_tool(AnnotationTool::Select);
    session.handle(InputEvent::pointer_down(160.0, 28.0));
    session.handle(InputEvent::key("Escape", Modifiers::NONE));
    assert_eq!(session.store().state().connecting, None);
    assert_eq!(session.store().state().temp_line, None);
    assert_eq!(session.tool(), AnnotationTool::Select);

    session.handle(InputEvent::key("p", Modifiers::NONE));
    assert_eq!(session.tool(), AnnotationTool::Freehand);
    session.handle(InputEvent::key("Escape", Modifiers::NONE));
    assert_eq!(session.tool(), AnnotationTool::Select);
}

#[test]
fn drawing_tool_suppresses_drag_pan_and_zoom() {
    let Fixture {
        mut session, finished, ..
    } = fixture();
    session.handle(InputEvent::key("r", Modifiers::NONE));
    assert_eq!(session.tool(), AnnotationTool::Rectangle);

    // Starts on top of node 1: draws instead of dragging it.
    session.handle(InputEvent::pointer_down(20.0, 20.0));
    session.handle(InputEvent::pointer_move(120.0, 80.0));
    session.handle(InputEvent::pointer_up(120.0, 80.0));
    assert_eq!(session.store().state().node(NodeId(1)).unwrap().position, Point::ORIGIN);
    assert_eq!(transform(&session), CanvasTransform::IDENTITY);
    assert!(matches!(
        finished.borrow().as_slice(),
        [FinishEvent::Drawing(d)] if d.tool == AnnotationTool::Rectangle
    ));

    let wheel = WheelEvent {
        x: 300.0,
        y: 300.0,
        delta_x: 0.0,
        delta_y: -40.0,
        delta_mode: DeltaMode::Pixel,
        modifiers: ctrl(),
    };
    assert!(!session.handle(InputEvent::Wheel(wheel)));
    assert!(!session.handle(InputEvent::key("=", ctrl())));
    assert_eq!(transform(&session), CanvasTransform::IDENTITY);
}

#[test]
fn keyboard_zoom_and_reset() {
    let Fixture { mut session, .. } = fixture();
    session.handle(InputEvent::key("=", ctrl()));
    assert!((transform(&session).scale - 1.1).abs() < 1e-9);
    session.handle(InputEvent::key("-", ctrl()));
    session.handle(InputEvent::key("-", ctrl()));
    assert!((transform(&session).scale - 0.9).abs() < 1e-9);
    session.handle(InputEvent::key("0", ctrl()));
    assert_eq!(transform(&session), CanvasTransform::IDENTITY);
}

#[test]
fn delete_key_removes_annotation_before_node() {
    let Fixture { mut session, .. } = fixture();
    session.handle(InputEvent::key("r", Modifiers::NONE));
    session.handle(InputEvent::pointer_down(300.0, 300.0));
    session.handle(InputEvent::pointer_move(360.0, 340.0));
    session.handle(InputEvent::pointer_up(360.0, 340.0));
    session.handle(InputEvent::key("v", Modifiers::NONE));

    session.handle(InputEvent::click(20.0, 20.0));
    assert_eq!(session.store().state().selected_node, Some(NodeId(1)));

    // Pressing on the rectangle selects it on the overlay.
    session.handle(InputEvent::pointer_down(300.0, 320.0));
    session.handle(InputEvent::pointer_up(300.0, 320.0));
    assert!(session.annotations().selected().is_some());

    session.handle(InputEvent::key("Delete", Modifiers::NONE));
    assert!(session.annotations().surface().unwrap().committed().is_empty());
    assert_eq!(session.store().state().nodes.len(), 2);

    session.handle(InputEvent::key("Backspace", Modifiers::NONE));
    assert_eq!(session.store().state().nodes.len(), 1);
    assert_eq!(session.store().state().selected_node, None);
}

#[test]
fn undo_redo_shortcuts_drive_annotation_history() {
    let Fixture { mut session, .. } = fixture();
    session.handle(InputEvent::key("o", Modifiers::NONE));
    session.handle(InputEvent::pointer_down(100.0, 100.0));
    session.handle(InputEvent::pointer_move(160.0, 180.0));
    session.handle(InputEvent::pointer_up(160.0, 180.0));
    assert!(session.annotations().can_undo());

    assert!(session.handle(InputEvent::key("z", ctrl())));
    assert!(session.annotations().surface().unwrap().committed().is_empty());

    let redo = Modifiers {
        shift: true,
        ..ctrl()
    };
    assert!(session.handle(InputEvent::key("Z", redo)));
    assert_eq!(session.annotations().surface().unwrap().committed().len(), 1);
}

#[test]
fn typing_goes_to_the_text_being_edited() {
    let Fixture {
        mut session, finished, ..
    } = fixture();
    session.handle(InputEvent::key("t", Modifiers::NONE));
    session.handle(InputEvent::pointer_down(200.0, 200.0));
    session.handle(InputEvent::pointer_up(200.0, 200.0));
    assert!(session.annotations().editing().is_some());

    // "v" is typed, not a tool switch.
    for key in ["v", "i", "a", "x"] {
        session.handle(InputEvent::key(key, Modifiers::NONE));
    }
    session.handle(InputEvent::key("Backspace", Modifiers::NONE));
    assert_eq!(session.tool(), AnnotationTool::Text);

    session.handle(InputEvent::key("Escape", Modifiers::NONE));
    assert_eq!(session.annotations().editing(), None);
    assert_eq!(session.tool(), AnnotationTool::Select);
    let text = session.annotations().surface().unwrap().committed()[0].clone();
    assert!(matches!(text.shape, dc_core::Shape::Text { ref content, .. } if content == "via"));
    assert!(matches!(
        finished.borrow().as_slice(),
        [FinishEvent::Drawing(d)] if d.tool == AnnotationTool::Text
    ));
}

#[test]
fn touch_on_handle_draws_a_connection() {
    let Fixture {
        mut session, finished, ..
    } = fixture();
    let t = |x, y| TouchPoint { id: 1, x, y };
    session.handle(InputEvent::TouchStart {
        touches: [t(160.0, 28.0)].into_iter().collect(),
        target: None,
    });
    assert_eq!(session.store().state().connecting, Some(NodeId(1)));
    assert_eq!(session.store().state().dragging_node, None);

    session.handle(InputEvent::TouchMove {
        touches: [t(300.0, 40.0)].into_iter().collect(),
    });
    assert_eq!(session.store().state().temp_line.unwrap().x2, 300.0);
    session.handle(InputEvent::TouchMove {
        touches: [t(450.0, 30.0)].into_iter().collect(),
    });
    session.handle(InputEvent::TouchEnd {
        touches: Default::default(),
    });

    let edge = EdgeId::for_pair(NodeId(1), NodeId(2));
    let state = session.store().state();
    assert!(state.edge(edge).is_some());
    assert_eq!(state.connecting, None);
    assert_eq!(state.node(NodeId(1)).unwrap().position, Point::new(0.0, 0.0));
    assert!(matches!(
        finished.borrow().as_slice(),
        [FinishEvent::Connection { edge: Some(e), .. }] if *e == edge
    ));
}

#[test]
fn second_finger_drops_a_touch_connection() {
    let Fixture { mut session, .. } = fixture();
    let t = |id, x| TouchPoint { id, x, y: 28.0 };
    session.handle(InputEvent::TouchStart {
        touches: [t(1, 160.0)].into_iter().collect(),
        target: None,
    });
    session.handle(InputEvent::TouchStart {
        touches: [t(1, 160.0), t(2, 600.0)].into_iter().collect(),
        target: None,
    });
    let state = session.store().state();
    assert_eq!(state.connecting, None);
    assert_eq!(state.temp_line, None);
}

#[test]
fn pinch_zooms_only_with_select_tool() {
    let Fixture { mut session, .. } = fixture();
    let t = |id, x| TouchPoint { id, x, y: 300.0 };
    session.handle(InputEvent::TouchStart {
        touches: [t(1, 300.0), t(2, 400.0)].into_iter().collect(),
        target: None,
    });
    session.handle(InputEvent::TouchMove {
        touches: [t(1, 250.0), t(2, 450.0)].into_iter().collect(),
    });
    assert!((transform(&session).scale - 2.0).abs() < 1e-9);
    session.handle(InputEvent::TouchEnd {
        touches: Default::default(),
    });

    session.set_tool(AnnotationTool::Freehand);
    session.handle(InputEvent::TouchStart {
        touches: [t(1, 300.0), t(2, 400.0)].into_iter().collect(),
        target: None,
    });
    session.handle(InputEvent::TouchMove {
        touches: [t(1, 200.0), t(2, 500.0)].into_iter().collect(),
    });
    assert!((transform(&session).scale - 2.0).abs() < 1e-9);
}

#[test]
fn tick_hands_out_auto_save_after_changes() {
    let Fixture {
        mut session, clock, ..
    } = fixture();
    clock.advance(3_000);
    assert!(session.tick().is_none(), "nothing changed yet");

    session.handle(InputEvent::key("r", Modifiers::NONE));
    session.handle(InputEvent::pointer_down(300.0, 300.0));
    session.handle(InputEvent::pointer_move(360.0, 340.0));
    session.handle(InputEvent::pointer_up(360.0, 340.0));
    clock.advance(3_000);
    let saved = session.tick().expect("auto-save due");
    assert_eq!(saved.objects().unwrap().len(), 1);
    session.annotations_mut().save_finished(Ok(()));

    clock.advance(3_000);
    assert!(session.tick().is_none(), "unchanged since last save");
}

#[test]
fn teardown_returns_history_for_remount() {
    let Fixture { mut session, .. } = fixture();
    session.handle(InputEvent::key("a", Modifiers::NONE));
    session.handle(InputEvent::pointer_down(100.0, 100.0));
    session.handle(InputEvent::pointer_move(200.0, 100.0));
    session.handle(InputEvent::pointer_up(200.0, 100.0));
    let export = session.teardown();
    assert_eq!(export.entries.len(), 2);
    assert_eq!(export.cursor, 1);
}
