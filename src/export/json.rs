//! JSON import/export of study packs.
//! Saves a pack with its flashcards to a file and loads it back into the database.

use crate::database::db;
use crate::error::{Result, ValidationError};
use crate::models::StudyPack;
use rusqlite::Connection;
use std::fs;
use std::path::Path;

/// Exports a study pack to a pretty-printed JSON file.
pub fn export_json_to_path(pack: &StudyPack, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(pack)?;
    fs::write(path, json_string)?;
    log::info!("Study pack '{}' exported to {}", pack.name, path.display());
    Ok(())
}

/// Reads a study pack from a JSON file. Ids in the file are ignored on import.
pub fn import_json(path: &Path) -> Result<StudyPack> {
    let contents = fs::read_to_string(path)?;
    let pack: StudyPack = serde_json::from_str(&contents)?;
    log::info!("Study pack '{}' read from {}", pack.name, path.display());
    Ok(pack)
}

/// Stores an imported pack under its own name and returns the new pack id.
///
/// Fails if a pack with the same name exists; nothing is written in that case.
pub fn store_imported_pack(pack: &StudyPack, conn: &Connection) -> Result<i64> {
    if pack.name.trim().is_empty() {
        return Err(ValidationError::EmptyPackName.into());
    }
    if db::find_study_pack_by_name(&pack.name, conn)?.is_some() {
        return Err(ValidationError::DuplicatePack(pack.name.clone()).into());
    }

    let tx = conn.unchecked_transaction()?;
    let pack_id = db::new_study_pack(&pack.name, &tx)?;
    for card in &pack.flashcards {
        db::add_flashcard(pack_id, &card.front, &card.back, &tx)?;
    }
    tx.commit()?;
    Ok(pack_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StudyError;
    use crate::models::Flashcard;
    use std::path::PathBuf;

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("study_core_{}_{}", std::process::id(), name))
    }

    fn create_test_pack() -> StudyPack {
        StudyPack {
            id: 0,
            name: "Test Pack".to_string(),
            flashcards: vec![
                Flashcard::new("photosynthesis", "light to chemical energy"),
                Flashcard::new("chlorophyll", "green pigment"),
            ],
        }
    }

    #[test]
    fn test_export_and_import() {
        let pack = create_test_pack();
        let path = temp_file("roundtrip.json");

        export_json_to_path(&pack, &path).unwrap();
        let imported = import_json(&path).unwrap();
        assert_eq!(imported.name, pack.name);
        assert_eq!(imported.flashcards.len(), 2);
        assert_eq!(imported.flashcards[1].front, "chlorophyll");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_import_hand_written_file() {
        let path = temp_file("hand_written.json");
        fs::write(
            &path,
            r#"{"name": "Imported", "flashcards": [{"front": "term", "back": "definition"}]}"#,
        )
        .unwrap();

        let pack = import_json(&path).unwrap();
        assert_eq!(pack.name, "Imported");
        assert_eq!(pack.flashcards[0].back, "definition");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_import_errors() {
        assert!(matches!(
            import_json(Path::new("nonexistent_file_xyz123.json")),
            Err(StudyError::Io(_))
        ));

        let path = temp_file("invalid.json");
        fs::write(&path, "{ this is not valid json }").unwrap();
        assert!(matches!(import_json(&path), Err(StudyError::Json(_))));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_store_imported_pack() {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let pack = create_test_pack();

        let id = store_imported_pack(&pack, &conn).unwrap();
        assert_eq!(db::get_flashcards_for_pack(id, &conn).unwrap().len(), 2);

        assert!(matches!(
            store_imported_pack(&pack, &conn),
            Err(StudyError::Validation(ValidationError::DuplicatePack(_)))
        ));
        assert_eq!(db::load_all_study_packs(&conn).unwrap().len(), 1);
    }
}
