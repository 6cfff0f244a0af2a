/// `roomwalk`: walk an actor through a zone of Tiled rooms in the terminal.
///
/// Loads the configured start zone, restores the saved world map, and
/// drives the transition manager once per tick. The world map is saved on
/// exit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, warn};

use roomnav::config::NavConfig;
use roomnav::domain::actor::Actor;
use roomnav::domain::geom::Facing;
use roomnav::sim::event::NavEvent;
use roomnav::sim::room::Room;
use roomnav::sim::save;
use roomnav::sim::transition::TransitionManager;
use roomnav::sim::world_graph::WorldGraph;
use roomnav::sim::zone::load_zone;
use roomnav::ui::input::{InputState, Intent};
use roomnav::ui::renderer::{Frame, Renderer};

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const MAX_MESSAGES: usize = 32;

struct Session {
    manager: TransitionManager,
    graph: Arc<WorldGraph>,
    actor: Actor,
    start_room: String,
    messages: Vec<String>,
    show_map: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = NavConfig::load();
    let mut session = match setup(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("roomwalk: {e}");
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut session, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("roomwalk: {e}");
    }

    match save::save_world_graph(&session.graph) {
        Ok(path) => println!("World map saved to {}", path.display()),
        Err(e) => eprintln!("Could not save world map: {e}"),
    }
    println!("Rooms discovered: {}", session.graph.len());
}

fn setup(config: &NavConfig) -> roomnav::Result<Session> {
    let graph = Arc::new(WorldGraph::new(config));
    match save::load_world_graph(&graph) {
        Ok(true) => info!("restored world map with {} rooms", graph.len()),
        Ok(false) => {}
        Err(e) => warn!("ignoring unreadable world map save: {e}"),
    }

    let mut manager = TransitionManager::new(config, Arc::clone(&graph));
    let zones_dir = &config.general.zones_dir;
    let summary = load_zone(&mut manager, zones_dir, &config.general.start_zone, config)?;

    // The fallback room may live in another zone.
    if let Some((zone, _)) = config.general.fallback_room.split_once('/') {
        if zone != summary.zone {
            if let Err(e) = load_zone(&mut manager, zones_dir, zone, config) {
                warn!("fallback zone {zone} unavailable: {e}");
            }
        }
    }

    manager.ensure_fallback_room();

    let start_room = summary
        .start_room(config)
        .map(str::to_string)
        .ok_or_else(|| roomnav::NavError::not_found("room in zone", summary.zone.clone()))?;

    manager.set_current_room(&start_room)?;
    let mut actor = Actor::new(config);
    manager.spawn_actor_in_room(&mut actor, &start_room, &config.general.fallback_spawn)?;

    Ok(Session {
        manager,
        graph,
        actor,
        start_room,
        messages: Vec::new(),
        show_map: false,
    })
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    config: &NavConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.general.tick_rate_ms);
    let mut pending_action = false;

    loop {
        kb.drain_events();
        let intent = kb.intent();
        if intent.quit {
            break;
        }
        if intent.toggle_map {
            session.show_map = !session.show_map;
        }
        // Latch until the next tick so a short tap is not lost.
        pending_action |= intent.action;

        if last_tick.elapsed() >= tick_rate {
            tick(session, Intent { action: std::mem::take(&mut pending_action), ..intent });
            last_tick = Instant::now();
        }

        let Some(room) = session.manager.current_room() else {
            break;
        };
        let frame = Frame {
            room,
            actor: &session.actor,
            triggers: session.manager.transition_points(room.zone_id()),
            graph: &session.graph,
            show_map: session.show_map,
            messages: &session.messages,
        };
        renderer.render(&frame)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn tick(session: &mut Session, intent: Intent) {
    let Session { manager, actor, .. } = session;

    if let Some(room) = manager.current_room() {
        walk_step(room, actor, intent.dx);
    }
    if let Err(e) = manager.update_current_room(actor) {
        warn!("room update failed: {e}");
    }

    if manager.check_transitions(&actor.collision_box(), intent.action) {
        if let Err(e) = manager.process_pending_transition(actor) {
            session.messages.push(format!("Door leads nowhere: {e}"));
        }
    }

    if let Err(e) = session.manager.rescue_if_out_of_bounds(&mut session.actor) {
        warn!("rescue failed, returning to start: {e}");
        respawn_at_start(session);
    }

    session.manager.record_actor_position(&session.actor);
    for event in session.manager.drain_events() {
        session.messages.push(describe(&event));
    }
    if session.messages.len() > MAX_MESSAGES {
        let excess = session.messages.len() - MAX_MESSAGES;
        session.messages.drain(..excess);
    }
}

fn respawn_at_start(session: &mut Session) {
    let start = session.start_room.clone();
    let spawn = session.manager.config().general.fallback_spawn.clone();
    let result = session
        .manager
        .set_current_room(&start)
        .and_then(|()| session.manager.spawn_actor_in_room(&mut session.actor, &start, &spawn));
    match result {
        Ok(_) => session.messages.push(format!("Fell out of the world, back to {start}")),
        Err(e) => warn!("cannot respawn in {start}: {e}"),
    }
}

/// Horizontal walk with wall blocking, then gravity.
fn walk_step(room: &dyn Room, actor: &mut Actor, dx: i32) {
    let unit = room.physics_unit();

    if dx != 0 {
        actor.facing = if dx < 0 { Facing::Left } else { Facing::Right };
        let speed = (unit / 4).max(1);
        let nx = actor.x + dx * speed;
        if !room.box_overlaps_solid(&actor.collision_box_at(nx, actor.y)) {
            actor.x = nx;
        }
    }

    for _ in 0..(unit / 2).max(1) {
        if room.box_overlaps_solid(&actor.collision_box_at(actor.x, actor.y + 1)) {
            break;
        }
        actor.y += 1;
    }
}

fn describe(event: &NavEvent) -> String {
    match event {
        NavEvent::TransitionQueued { from, to, kind } => format!("{kind:?}: {from} -> {to}"),
        NavEvent::RoomEntered { room, spawn, at } => format!("Entered {room} at {spawn} ({}, {})", at.x, at.y),
        NavEvent::EmergencyRescue { from, to } => format!("Rescued from {from} to {to}"),
        NavEvent::SpawnFallback { room, at } => format!("No safe spawn in {room}, placed at ({}, {})", at.x, at.y),
    }
}
