// Q-table storage, one JSON file per board size
//
// Loading never fails: a missing or unreadable file means starting over
// with an empty table.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SnakeError;
use crate::qlearning::{ActionValues, QTable};
use crate::world::StateKey;

#[derive(Debug, Serialize, Deserialize)]
struct TableEntry {
    state: StateKey,
    values: ActionValues,
}

#[derive(Debug, Serialize, Deserialize)]
struct TableFile {
    board_size: i32,
    entries: Vec<TableEntry>,
}

/// `<dir>/q_table_<n>x<n>.json`
pub fn table_path<P: AsRef<Path>>(dir: P, board_size: i32) -> PathBuf {
    dir.as_ref()
        .join(format!("q_table_{}x{}.json", board_size, board_size))
}

/// Loads the table for `board_size`, or an empty one
pub fn load_table<P: AsRef<Path>>(dir: P, board_size: i32) -> QTable {
    let path = table_path(dir, board_size);

    match read_table(&path, board_size) {
        Ok(table) => {
            info!("Loaded {} states from {}", table.len(), path.display());
            table
        }
        Err(SnakeError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No table at {}, starting empty", path.display());
            QTable::new()
        }
        Err(e) => {
            warn!("Ignoring table at {}: {}", path.display(), e);
            QTable::new()
        }
    }
}

fn read_table(path: &Path, board_size: i32) -> Result<QTable, SnakeError> {
    let contents = fs::read_to_string(path)?;
    let file: TableFile = serde_json::from_str(&contents)?;

    if file.board_size != board_size {
        return Err(SnakeError::BoardSizeMismatch {
            expected: board_size,
            found: file.board_size,
        });
    }

    Ok(file
        .entries
        .into_iter()
        .map(|entry| (entry.state, entry.values))
        .collect())
}

/// Writes the table for `board_size`, creating the directory if needed
pub fn save_table<P: AsRef<Path>>(
    dir: P,
    board_size: i32,
    table: &QTable,
) -> Result<PathBuf, SnakeError> {
    fs::create_dir_all(dir.as_ref())?;
    let path = table_path(dir, board_size);

    let file = TableFile {
        board_size,
        entries: table
            .iter()
            .map(|(state, values)| TableEntry {
                state: state.clone(),
                values: *values,
            })
            .collect(),
    };

    fs::write(&path, serde_json::to_string(&file)?)?;
    info!("Saved {} states to {}", table.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coord, Direction};
    use crate::world::WorldState;

    fn sample_table() -> QTable {
        let mut table = QTable::new();
        let key = WorldState::initial(6).key();
        table.set(&key, Direction::Right, 4.5);
        table.set(&key, Direction::Up, -2.0);

        let mut other = WorldState::initial(6);
        other.set_food(Some(Coord::new(5, 5)));
        table.row_mut(&other.key());
        table
    }

    #[test]
    fn test_table_path_names_board_size() {
        let path = table_path("files", 8);
        assert_eq!(path, Path::new("files").join("q_table_8x8.json"));
    }

    #[test]
    fn test_save_then_load_restores_table() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("tables");
        let table = sample_table();

        let path = save_table(&nested, 6, &table).unwrap();
        assert!(path.exists());
        assert_eq!(load_table(&nested, 6), table);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_table(dir.path(), 8).is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(table_path(dir.path(), 8), "{not json").unwrap();
        assert!(load_table(dir.path(), 8).is_empty());
    }

    #[test]
    fn test_other_board_size_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        save_table(dir.path(), 6, &sample_table()).unwrap();
        fs::rename(table_path(dir.path(), 6), table_path(dir.path(), 7)).unwrap();
        assert!(load_table(dir.path(), 7).is_empty());
    }
}
