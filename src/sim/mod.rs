pub mod event;
pub mod room;
pub mod save;
pub mod transition;
pub mod world_graph;
pub mod zone;
