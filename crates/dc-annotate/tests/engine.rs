use dc_annotate::{
    AnnotationConfig, AnnotationEngine, AnnotationError, AnnotationTool, CanvasState, HistoryExport,
    ThemeSignals,
};
use dc_core::{ManualClock, Point, Size};
use pretty_assertions::assert_eq;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn engine() -> (AnnotationEngine, ManualClock) {
    init_logging();
    let clock = ManualClock::new(10_000);
    let engine = AnnotationEngine::new(
        AnnotationConfig::default(),
        Size::new(800.0, 600.0),
        Box::new(clock.clone()),
        ThemeSignals::default(),
    );
    (engine, clock)
}

fn draw_rect(e: &mut AnnotationEngine, x: f64, y: f64) {
    e.set_tool(AnnotationTool::Rectangle);
    e.pointer_down(Point::new(x, y), false);
    e.pointer_move(Point::new(x + 40.0, y + 30.0), false);
    e.pointer_up(Point::new(x + 40.0, y + 30.0), false);
}

#[test]
fn moving_an_object_is_debounced_into_one_entry() {
    let (mut e, clock) = engine();
    draw_rect(&mut e, 100.0, 100.0);
    assert_eq!(e.history().len(), 2);

    e.set_tool(AnnotationTool::Select);
    e.pointer_down(Point::new(120.0, 115.0), false);
    for step in 1..=10 {
        clock.advance(16);
        e.pointer_move(Point::new(120.0 + step as f64, 115.0), false);
        e.tick();
    }
    e.pointer_up(Point::new(130.0, 115.0), false);
    e.tick();
    assert_eq!(e.history().len(), 2, "still inside the quiet period");

    clock.advance(200);
    e.tick();
    assert_eq!(e.history().len(), 3);
    let moved = &e.surface().unwrap().objects()[0];
    assert_eq!(moved.left, 110.0);
}

#[test]
fn undo_flushes_pending_move_first() {
    let (mut e, _clock) = engine();
    draw_rect(&mut e, 100.0, 100.0);
    e.set_tool(AnnotationTool::Select);
    e.pointer_down(Point::new(120.0, 115.0), false);
    e.pointer_move(Point::new(150.0, 115.0), false);
    e.pointer_up(Point::new(150.0, 115.0), false);

    // The move is still debouncing; undo must revert it, not the rectangle.
    assert!(e.undo());
    let objects = e.surface().unwrap().objects();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].left, 100.0);
    assert!(e.can_redo());
}

#[test]
fn replay_is_never_recorded() {
    let (mut e, clock) = engine();
    draw_rect(&mut e, 0.0, 0.0);
    draw_rect(&mut e, 200.0, 0.0);
    let len = e.history().len();
    e.undo();
    clock.advance(1_000);
    e.tick();
    e.redo();
    clock.advance(1_000);
    e.tick();
    assert_eq!(e.history().len(), len);
}

#[test]
fn teardown_flushes_pending_commit() {
    let (mut e, _clock) = engine();
    draw_rect(&mut e, 10.0, 10.0);
    e.set_tool(AnnotationTool::Select);
    e.pointer_down(Point::new(20.0, 20.0), false);
    e.pointer_move(Point::new(60.0, 20.0), false);
    e.pointer_up(Point::new(60.0, 20.0), false);
    assert_eq!(e.history().len(), 2);

    let export = e.teardown();
    assert_eq!(export.entries.len(), 3);
    assert_eq!(export.cursor, 2);
}

#[test]
fn history_survives_remount() {
    let (mut e, clock) = engine();
    draw_rect(&mut e, 10.0, 10.0);
    draw_rect(&mut e, 300.0, 10.0);
    e.undo();
    let json = e.teardown().to_json().unwrap();

    let mut fresh = AnnotationEngine::new(
        AnnotationConfig::default(),
        Size::new(800.0, 600.0),
        Box::new(clock.clone()),
        ThemeSignals::default(),
    );
    fresh
        .import_history(HistoryExport::from_json(&json).unwrap())
        .unwrap();
    assert_eq!(fresh.surface().unwrap().objects().len(), 1);
    assert!(fresh.can_redo());
    assert!(fresh.redo());
    assert_eq!(fresh.surface().unwrap().objects().len(), 2);
}

#[test]
fn msgpack_history_survives_remount() {
    let (mut e, clock) = engine();
    draw_rect(&mut e, 10.0, 10.0);
    draw_rect(&mut e, 300.0, 10.0);
    let bytes = e.teardown().to_msgpack().unwrap();

    let mut fresh = AnnotationEngine::new(
        AnnotationConfig::default(),
        Size::new(800.0, 600.0),
        Box::new(clock.clone()),
        ThemeSignals::default(),
    );
    let export = HistoryExport::<CanvasState>::from_msgpack(&bytes).unwrap();
    fresh.import_history(export).unwrap();
    assert_eq!(fresh.history().len(), 3);
    assert_eq!(fresh.surface().unwrap().objects().len(), 2);
    assert!(fresh.undo());
    assert_eq!(fresh.surface().unwrap().objects().len(), 1);

    let garbage = HistoryExport::<CanvasState>::from_msgpack(&[0xc1]);
    assert!(garbage.is_err());
}

#[test]
fn bad_history_import_changes_nothing() {
    let (mut e, _) = engine();
    draw_rect(&mut e, 10.0, 10.0);
    let err = e.import_history(HistoryExport {
        entries: vec![],
        cursor: 0,
    });
    assert!(matches!(err, Err(AnnotationError::History(_))));
    assert_eq!(e.history().len(), 2);
    assert_eq!(e.surface().unwrap().objects().len(), 1);
}

#[test]
fn load_restores_and_records() {
    let (mut e, _) = engine();
    draw_rect(&mut e, 10.0, 10.0);
    let saved = e.snapshot().unwrap();
    e.clear();
    assert!(e.surface().unwrap().objects().is_empty());

    e.load(&saved).unwrap();
    assert_eq!(e.surface().unwrap().objects().len(), 1);
    assert_eq!(e.history().len(), 4);
}

#[test]
fn load_rescales_to_current_size() {
    let (mut e, _) = engine();
    draw_rect(&mut e, 100.0, 100.0);
    let mut saved = e.snapshot().unwrap();
    saved.canvas_size = Size::new(400.0, 300.0);
    e.load(&saved).unwrap();
    let obj = &e.surface().unwrap().objects()[0];
    assert_eq!((obj.left, obj.top), (200.0, 200.0));
}

#[test]
fn corrupt_load_leaves_canvas_unchanged() {
    let (mut e, _) = engine();
    draw_rect(&mut e, 10.0, 10.0);
    let before = e.snapshot().unwrap();
    let mut broken = CanvasState::empty(Size::new(800.0, 600.0), 0);
    broken.canvas_data = serde_json::json!({ "objects": "not a list" });
    assert!(e.load(&broken).is_err());
    assert_eq!(e.surface().unwrap().objects().len(), 1);
    assert_eq!(e.snapshot().unwrap().canvas_data, before.canvas_data);
    assert_eq!(e.history().len(), 2);
}

#[test]
fn delete_selected_object() {
    let (mut e, _) = engine();
    draw_rect(&mut e, 10.0, 10.0);
    e.set_tool(AnnotationTool::Select);
    e.pointer_down(Point::new(20.0, 20.0), false);
    e.pointer_up(Point::new(20.0, 20.0), false);
    assert!(e.selected().is_some());
    assert!(e.delete_selected());
    assert!(e.surface().unwrap().objects().is_empty());
    assert_eq!(e.history().len(), 3);
    assert!(!e.delete_selected());
}

#[test]
fn auto_save_skips_while_in_flight() {
    let (mut e, clock) = engine();
    draw_rect(&mut e, 10.0, 10.0);
    assert!(e.poll_auto_save().is_none(), "interval not elapsed");

    clock.advance(2_500);
    let first = e.poll_auto_save();
    assert!(first.is_some());
    assert!(e.is_saving());

    draw_rect(&mut e, 200.0, 10.0);
    clock.advance(2_500);
    assert!(e.poll_auto_save().is_none(), "previous save still running");
    assert!(e.save_now().is_none());

    e.save_finished(Err("network down".into()));
    clock.advance(2_500);
    assert!(e.poll_auto_save().is_some(), "retried after failure");
    e.save_finished(Ok(()));
    clock.advance(2_500);
    assert!(e.poll_auto_save().is_none(), "nothing changed since the save");
}

#[test]
fn tool_aliases_switch_modes() {
    let (mut e, _) = engine();
    assert_eq!(e.set_tool_name("pen"), AnnotationTool::Freehand);
    assert!(e.mode().drawing_mode);
    e.pointer_down(Point::new(0.0, 0.0), false);
    e.pointer_move(Point::new(5.0, 5.0), false);
    let done = e.pointer_up(Point::new(10.0, 5.0), false).unwrap();
    assert_eq!(done.tool, AnnotationTool::Freehand);
    assert_eq!(e.set_tool_name("pointer"), AnnotationTool::Select);
    assert!(e.mode().selection);
}
