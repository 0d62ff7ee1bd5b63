use crate::models::ExerciseRecord;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("exercise catalog unreachable: {0}")]
    Io(#[from] io::Error),
    #[error("exercise catalog malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("exercise catalog lists id {0} more than once")]
    DuplicateId(u32),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

pub fn load_exercises(path: &Path) -> CatalogResult<Vec<ExerciseRecord>> {
    let contents = fs::read_to_string(path)?;
    let exercises = parse_exercises(&contents)?;
    info!(
        path = %path.display(),
        count = exercises.len(),
        "exercise catalog loaded"
    );
    Ok(exercises)
}

/// Parses a JSON array of exercises, keeping catalog order. Ids must be unique
/// because favorites and completion are keyed on them.
pub fn parse_exercises(json: &str) -> CatalogResult<Vec<ExerciseRecord>> {
    let exercises: Vec<ExerciseRecord> = serde_json::from_str(json)?;
    let mut seen = HashSet::with_capacity(exercises.len());
    if let Some(duplicate) = exercises.iter().find(|record| !seen.insert(record.id)) {
        return Err(CatalogError::DuplicateId(duplicate.id));
    }
    Ok(exercises)
}

#[cfg(test)]
mod tests {
    use super::{load_exercises, parse_exercises, CatalogError};
    use crate::models::Category;
    use std::fs;

    const CATALOG: &str = r#"[
        {"id": 1, "name": "Bodyscan meditation", "duration": "8 minuter",
         "instructions": "Ligg på rygg med benen utsträckta.", "category": "Meditation"},
        {"id": 2, "name": "Fyrkantsandning", "duration": "4 minuter",
         "instructions": "Andas in på fyra, håll på fyra.", "category": "Andning"},
        {"id": 3, "name": "Medveten promenad", "duration": "10 minuter",
         "instructions": "Gå långsamt och känn varje steg."}
    ]"#;

    #[test]
    fn parses_in_catalog_order() {
        let exercises = parse_exercises(CATALOG).expect("parse catalog");
        let ids: Vec<u32> = exercises.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(exercises[1].category, Some(Category::Breathing));
        assert!(exercises[2].category.is_none());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let json = r#"[
            {"id": 4, "name": "A", "duration": "1 minut", "instructions": "a"},
            {"id": 4, "name": "B", "duration": "2 minuter", "instructions": "b"}
        ]"#;
        assert!(matches!(
            parse_exercises(json),
            Err(CatalogError::DuplicateId(4))
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            parse_exercises("{\"id\": 1}"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = load_exercises(&dir.path().join("exercises.json"));
        assert!(matches!(result, Err(CatalogError::Io(_))));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("exercises.json");
        fs::write(&path, CATALOG).expect("write catalog");
        assert_eq!(load_exercises(&path).expect("load").len(), 3);
    }
}
