pub mod actor;
pub mod collision;
pub mod geom;
pub mod tile;
