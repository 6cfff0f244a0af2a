/// Events emitted by the transition manager.
/// The presentation layer drains these for fades, sounds and messages.

use crate::domain::geom::Point;

use super::transition::TransitionType;

#[derive(Clone, Debug, PartialEq)]
pub enum NavEvent {
    TransitionQueued { from: String, to: String, kind: TransitionType },
    RoomEntered { room: String, spawn: String, at: Point },
    /// Actor fell out of the room and was sent to the fallback room.
    EmergencyRescue { from: String, to: String },
    /// No collision-free spot was found; the actor was placed as requested.
    SpawnFallback { room: String, at: Point },
}
