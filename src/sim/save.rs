/// Persist the world graph between sessions.
///
/// The graph is written as its JSON snapshot (`worldmap.json`) into the
/// save directory. Writes go through a temporary file and a rename, so a
/// crash mid-save leaves the previous save intact.
///
/// Every operation has an `_in` variant taking an explicit directory.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{NavError, Result};

use super::world_graph::WorldGraph;

pub const SAVE_FILE: &str = "worldmap.json";

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

/// Where saves live: exe dir if writable, else XDG data home, else CWD.
pub fn save_dir() -> PathBuf {
    // 1. Exe directory (portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let test_path = parent.join(".write_test_roomnav");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home (~/.local/share/roomnav)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/roomnav");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn save_path_in(dir: &Path) -> PathBuf {
    dir.join(SAVE_FILE)
}

// ══════════════════════════════════════════════════════════════
// Operations
// ══════════════════════════════════════════════════════════════

pub fn save_world_graph(graph: &WorldGraph) -> Result<PathBuf> {
    save_world_graph_in(&save_dir(), graph)
}

pub fn save_world_graph_in(dir: &Path, graph: &WorldGraph) -> Result<PathBuf> {
    let path = save_path_in(dir);
    let tmp = path.with_extension("json.tmp");
    let json = graph.to_json()?;
    std::fs::write(&tmp, json).map_err(|e| NavError::io(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| NavError::io(&path, e))?;
    info!("saved world map ({} rooms) to {}", graph.len(), path.display());
    Ok(path)
}

/// Restore the saved graph into `graph`. `Ok(false)` when there is no
/// save; a corrupt save is an error and leaves `graph` unchanged.
pub fn load_world_graph(graph: &WorldGraph) -> Result<bool> {
    load_world_graph_in(&save_dir(), graph)
}

pub fn load_world_graph_in(dir: &Path, graph: &WorldGraph) -> Result<bool> {
    let path = save_path_in(dir);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no save at {}", path.display());
            return Ok(false);
        }
        Err(e) => return Err(NavError::io(&path, e)),
    };
    graph.restore_json(&text).map_err(|e| match e {
        NavError::InvalidFormat { reason, .. } => NavError::invalid(path.display().to_string(), reason),
        other => other,
    })?;
    Ok(true)
}

pub fn has_save() -> bool {
    has_save_in(&save_dir())
}

pub fn has_save_in(dir: &Path) -> bool {
    save_path_in(dir).is_file()
}

pub fn delete_save() -> Result<()> {
    delete_save_in(&save_dir())
}

/// Deleting a save that does not exist is fine.
pub fn delete_save_in(dir: &Path) -> Result<()> {
    let path = save_path_in(dir);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(NavError::io(&path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NavConfig;
    use crate::domain::geom::Direction;
    use crate::sim::room::TileRoom;

    fn graph() -> WorldGraph {
        let cfg = NavConfig::default();
        let g = WorldGraph::new(&cfg);
        g.discover_room(&TileRoom::from_rows("forest/r01", &["    ", "####"], &cfg));
        g.discover_room(&TileRoom::from_rows("forest/r02", &["    ", "####"], &cfg));
        g.connect_rooms("forest/r01", Direction::East, "forest/r02").unwrap();
        g.set_current_room("forest/r02").unwrap();
        g.add_player_position(3, 4);
        g
    }

    #[test]
    fn save_then_load_restores_graph() {
        let dir = tempfile::tempdir().unwrap();
        let g = graph();
        assert!(!has_save_in(dir.path()));
        save_world_graph_in(dir.path(), &g).unwrap();
        assert!(has_save_in(dir.path()));

        let back = WorldGraph::new(&NavConfig::default());
        assert!(load_world_graph_in(dir.path(), &back).unwrap());
        assert_eq!(back.discovered_rooms(), g.discovered_rooms());
        assert_eq!(back.current_room().as_deref(), Some("forest/r02"));
        assert_eq!(back.player_trail(), g.player_trail());
    }

    #[test]
    fn missing_save_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let g = WorldGraph::new(&NavConfig::default());
        assert!(!load_world_graph_in(dir.path(), &g).unwrap());
        delete_save_in(dir.path()).unwrap();
    }

    #[test]
    fn corrupt_save_leaves_graph_untouched() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SAVE_FILE), "{ nope").unwrap();
        let g = graph();
        let err = load_world_graph_in(dir.path(), &g).unwrap_err();
        assert!(matches!(err, NavError::InvalidFormat { .. }));
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn delete_removes_save() {
        let dir = tempfile::tempdir().unwrap();
        save_world_graph_in(dir.path(), &graph()).unwrap();
        delete_save_in(dir.path()).unwrap();
        assert!(!has_save_in(dir.path()));
    }
}
