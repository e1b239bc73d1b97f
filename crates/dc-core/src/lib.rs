pub mod clock;
pub mod drawing;
pub mod geometry;
pub mod id;
pub mod model;
pub mod store;
pub mod transform;

pub use clock::{Clock, ManualClock, SystemClock};
pub use drawing::{DrawingObject, ObjectStyle, Shape};
pub use geometry::{
    CircleGeometry, RectGeometry, ResizeScale, calculate_resize_scale, circle_from_drag,
    normalize_rectangle,
};
pub use id::{EdgeId, NodeId, ObjectId};
pub use model::*;
pub use store::{GraphState, GraphStore, MemoryStore, SubscriptionId};
pub use transform::{Container, is_visible, to_canvas, to_viewport};

// Re-export kurbo geometry so downstream crates share one set of types
pub use kurbo::{Point, Rect, Size, Vec2};
