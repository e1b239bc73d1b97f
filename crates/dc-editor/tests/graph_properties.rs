//! Integration tests: diagram graph invariants through the session.

use dc_annotate::ThemeSignals;
use dc_core::{Container, EdgeId, GraphStore, ManualClock, MemoryStore, Node, NodeId, NodeType, Point, Size};
use dc_editor::{EditorConfig, GraphController, InputEvent, Session};
use pretty_assertions::assert_eq;

fn session() -> Session<MemoryStore> {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = MemoryStore::from_parts(
        vec![
            Node::new(NodeId(1), NodeType::Start, "Start", Point::new(0.0, 0.0)),
            Node::new(NodeId(2), NodeType::End, "End", Point::new(400.0, 0.0)),
        ],
        vec![],
    );
    Session::new(
        store,
        EditorConfig::default(),
        Container::new(Point::ORIGIN, Size::new(800.0, 600.0)),
        Box::new(ManualClock::new(0)),
        ThemeSignals::default(),
    )
}

fn node_ids(s: &Session<MemoryStore>) -> Vec<NodeId> {
    s.store().state().nodes.iter().map(|n| n.id).collect()
}

#[test]
fn deleting_a_node_cascades_to_its_edges() {
    let mut s = session();
    s.add_edge(NodeId(1), NodeId(2)).unwrap();
    assert!(s.delete_node(NodeId(1)));
    assert_eq!(node_ids(&s), vec![NodeId(2)]);
    assert!(s.store().state().edges.is_empty());
}

#[test]
fn edges_are_deduplicated_in_both_directions() {
    let mut s = session();
    assert_eq!(s.add_edge(NodeId(1), NodeId(2)), Some(EdgeId::for_pair(NodeId(1), NodeId(2))));
    assert_eq!(s.add_edge(NodeId(1), NodeId(2)), None);
    assert_eq!(s.add_edge(NodeId(2), NodeId(1)), None);
    assert_eq!(s.store().state().edges.len(), 1);
}

#[test]
fn selecting_a_node_clears_edge_selection() {
    let mut s = session();
    s.add_edge(NodeId(1), NodeId(2)).unwrap();

    // Click on the edge midway between the nodes, then on node 2.
    assert!(s.handle(InputEvent::click(280.0, 28.0)));
    assert!(s.store().state().selected_edge.is_some());

    s.handle(InputEvent::click(20.0, 20.0));
    s.handle(InputEvent::click(420.0, 20.0));
    let state = s.store().state();
    assert_eq!(state.selected_node, Some(NodeId(2)));
    assert_eq!(state.selected_edge, None);
}

#[test]
fn reselecting_a_node_keeps_it_selected() {
    let mut s = session();
    s.handle(InputEvent::click(20.0, 20.0));
    s.handle(InputEvent::click(20.0, 20.0));
    assert_eq!(s.store().state().selected_node, Some(NodeId(1)));
}

#[test]
fn click_after_drag_does_not_select() {
    let mut s = session();
    s.handle(InputEvent::pointer_down(20.0, 20.0));
    s.handle(InputEvent::pointer_move(60.0, 40.0));
    s.handle(InputEvent::pointer_up(60.0, 40.0));
    s.handle(InputEvent::click(60.0, 40.0));

    let state = s.store().state();
    assert_eq!(state.selected_node, None);
    assert_eq!(state.node(NodeId(1)).unwrap().position, Point::new(40.0, 20.0));
    assert_eq!(state.dragging_node, None);

    // The flag is consumed: the next plain click selects.
    s.handle(InputEvent::click(60.0, 40.0));
    assert_eq!(s.store().state().selected_node, Some(NodeId(1)));
}

#[test]
fn drag_respects_zoom() {
    let mut s = session();
    s.set_zoom(2.0);
    let t = s.store().state().canvas_transform;
    // Client point over node 1's body at (10, 10) in canvas space.
    let grab = Point::new(10.0 * t.scale + t.translate_x, 10.0 * t.scale + t.translate_y);
    s.handle(InputEvent::pointer_down(grab.x, grab.y));
    s.handle(InputEvent::pointer_move(grab.x + 40.0, grab.y));
    s.handle(InputEvent::pointer_up(grab.x + 40.0, grab.y));
    assert_eq!(s.store().state().node(NodeId(1)).unwrap().position, Point::new(20.0, 0.0));
}

#[test]
fn added_nodes_take_the_next_id() {
    let mut s = session();
    let id = s.add_node(NodeType::Process, "Queue", Point::new(200.0, 200.0)).unwrap();
    assert_eq!(id, NodeId(3));
    assert_eq!(s.store().state().node(id).unwrap().icon, "cog");
}

#[test]
fn connecting_ends_a_node_drag() {
    let mut s = session();
    let mut graph = GraphController::new(EditorConfig::default().drag_threshold);
    let store = s.store_mut();
    assert!(graph.drag_start(store, NodeId(1), Point::new(10.0, 10.0)));
    assert!(graph.connection_start(store, NodeId(2)));

    let state = store.state();
    assert_eq!(state.dragging_node, None);
    assert_eq!(state.connecting, Some(NodeId(2)));
    // A stray move no longer drags node 1.
    assert!(!graph.drag_move(store, Point::new(90.0, 90.0)));
    assert_eq!(store.state().node(NodeId(1)).unwrap().position, Point::new(0.0, 0.0));
}

#[test]
fn dragging_abandons_a_connection() {
    let mut s = session();
    let mut graph = GraphController::new(EditorConfig::default().drag_threshold);
    let store = s.store_mut();
    assert!(graph.connection_start(store, NodeId(1)));
    assert!(store.state().temp_line.is_some());
    assert!(graph.drag_start(store, NodeId(2), Point::new(410.0, 10.0)));

    let state = store.state();
    assert_eq!(state.dragging_node, Some(NodeId(2)));
    assert_eq!(state.connecting, None);
    assert_eq!(state.temp_line, None);
    assert_eq!(graph.connection_end(store, NodeId(2)), None);
    assert!(store.state().edges.is_empty());
}

#[test]
fn adding_past_the_largest_id_is_refused() {
    let mut s = session();
    s.store_mut()
        .replace_graph(vec![Node::new(NodeId(u32::MAX), NodeType::End, "Last", Point::ORIGIN)], vec![]);
    assert_eq!(s.add_node(NodeType::Process, "Overflow", Point::new(50.0, 50.0)), None);
    assert_eq!(node_ids(&s), vec![NodeId(u32::MAX)]);
}
