use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::Local;
use directories::ProjectDirs;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    constants::FILE_PATHS,
    domain::{ActivityCatalog, BlockGrid, PlanDocument, PlanError},
    settings::SettingsDocument,
};

const PLAN_EXTENSION: &str = "toml";
const MAX_BACKUPS: usize = 10;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("could not access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("plan \"{name}\" is not valid TOML: {source}")]
    ParsePlan {
        name: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("settings file {} is not valid: {source}", path.display())]
    ParseSettings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("could not serialise document: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("\"{0}\" is not a usable plan name")]
    InvalidPlanName(String),
    #[error("no saved plan named \"{0}\"")]
    PlanNotFound(String),
    #[error("plan \"{name}\" could not be loaded: {source}")]
    Plan {
        name: String,
        #[source]
        source: PlanError,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub settings: PathBuf,
    pub plans_dir: PathBuf,
    pub tunes_dir: PathBuf,
    pub state_dir: PathBuf,
}

impl DataPaths {
    /// Everything under one directory.
    pub fn in_dir(root: &Path) -> Self {
        Self {
            settings: root.join(FILE_PATHS.settings),
            plans_dir: root.join(FILE_PATHS.plans_dir),
            tunes_dir: root.join(FILE_PATHS.tunes_dir),
            state_dir: root.to_path_buf(),
        }
    }

    pub fn resolve(data_dir: Option<PathBuf>) -> Self {
        match data_dir {
            Some(root) => Self::in_dir(&root),
            None => Self::in_dir(&get_data_dir()).with_state_dir(get_state_dir()),
        }
    }

    fn with_state_dir(mut self, state_dir: PathBuf) -> Self {
        self.state_dir = state_dir;
        self
    }

    pub fn log_file(&self) -> PathBuf {
        self.state_dir.join(FILE_PATHS.log_file)
    }

    pub fn ensure_dirs(&self) -> Result<(), StorageError> {
        for dir in [&self.plans_dir, &self.tunes_dir, &self.state_dir] {
            fs::create_dir_all(dir).map_err(io_error(dir))?;
        }
        Ok(())
    }
}

pub fn get_data_dir() -> PathBuf {
    let local_settings = Path::new(".").join(FILE_PATHS.settings);
    let local_plans = Path::new(".").join(FILE_PATHS.plans_dir);
    if local_settings.exists() || local_plans.exists() {
        return PathBuf::from(".");
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "dayblocks", "dayblocks") {
        let data_dir = proj_dirs.data_dir().to_path_buf();
        fs::create_dir_all(&data_dir).ok();
        data_dir
    } else {
        PathBuf::from(".")
    }
}

pub fn get_state_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "dayblocks", "dayblocks") {
        if let Some(state_dir) = proj_dirs.state_dir() {
            let dir = state_dir.to_path_buf();
            fs::create_dir_all(&dir).ok();
            return dir;
        }
    }
    get_data_dir()
}

/// Reads the settings document, writing the default one first if it is missing.
pub fn load_or_create_settings(path: &Path) -> Result<SettingsDocument, StorageError> {
    if !path.exists() {
        info!(path = %path.display(), "writing default settings");
        save_settings(path, &SettingsDocument::default())?;
    }

    let content = fs::read_to_string(path).map_err(io_error(path))?;
    toml::from_str(&content).map_err(|source| StorageError::ParseSettings {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_settings(path: &Path, settings: &SettingsDocument) -> Result<(), StorageError> {
    let content = toml::to_string_pretty(settings)?;
    atomic_write(path, &content)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanDiscovery {
    None,
    Single(String),
    Multiple(Vec<String>),
}

pub fn list_plans(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(PLAN_EXTENSION)
        })
        .filter_map(|path| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .collect();
    names.sort();
    names
}

pub fn discover_plans(dir: &Path) -> PlanDiscovery {
    let mut names = list_plans(dir);
    match names.len() {
        0 => PlanDiscovery::None,
        1 => PlanDiscovery::Single(names.remove(0)),
        _ => PlanDiscovery::Multiple(names),
    }
}

pub fn plan_path(dir: &Path, name: &str) -> Result<PathBuf, StorageError> {
    let name = name.trim();
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);
    if invalid {
        return Err(StorageError::InvalidPlanName(name.to_string()));
    }
    Ok(dir.join(format!("{}.{}", name, PLAN_EXTENSION)))
}

pub fn save_plan(dir: &Path, name: &str, grid: &BlockGrid) -> Result<PathBuf, StorageError> {
    let path = plan_path(dir, name)?;
    fs::create_dir_all(dir).map_err(io_error(dir))?;

    let content = toml::to_string_pretty(&grid.serialize())?;
    atomic_write(&path, &content)?;
    info!(plan = name.trim(), path = %path.display(), "saved plan");
    Ok(path)
}

pub fn load_plan(
    dir: &Path,
    name: &str,
    catalog: &ActivityCatalog,
) -> Result<BlockGrid, StorageError> {
    let path = plan_path(dir, name)?;
    if !path.exists() {
        return Err(StorageError::PlanNotFound(name.trim().to_string()));
    }

    let content = fs::read_to_string(&path).map_err(io_error(&path))?;
    let doc: PlanDocument = toml::from_str(&content).map_err(|source| StorageError::ParsePlan {
        name: name.trim().to_string(),
        source,
    })?;

    let grid = BlockGrid::deserialize(&doc, catalog).map_err(|source| {
        warn!(plan = name.trim(), error = %source, "rejecting malformed plan");
        StorageError::Plan {
            name: name.trim().to_string(),
            source,
        }
    })?;

    info!(plan = name.trim(), linked = grid.count_linked(), "loaded plan");
    Ok(grid)
}

pub fn write_text_file(path: &Path, content: &str) -> Result<(), StorageError> {
    atomic_write(path, content)
}

pub fn create_backup(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        return Ok(());
    }

    let backup_dir = path.parent().unwrap_or(Path::new(".")).join("backups");
    fs::create_dir_all(&backup_dir).map_err(io_error(&backup_dir))?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let prefix = format!("{}.", path.file_name().unwrap_or_default().to_string_lossy());
    let backup_path = backup_dir.join(format!("{}{}", prefix, timestamp));
    fs::copy(path, &backup_path).map_err(io_error(&backup_path))?;

    if let Ok(entries) = fs::read_dir(&backup_dir) {
        let mut backups: Vec<_> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
            .collect();
        backups.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

        let excess = backups.len().saturating_sub(MAX_BACKUPS);
        for oldest in backups.iter().take(excess) {
            let _ = fs::remove_file(oldest.path());
        }
    }

    Ok(())
}

pub fn atomic_write(path: &Path, content: &str) -> Result<(), StorageError> {
    if path.exists() {
        create_backup(path)?;
    }

    let tmp_path = path.with_extension("tmp");
    let mut tmp_file = File::create(&tmp_path).map_err(io_error(&tmp_path))?;
    tmp_file
        .write_all(content.as_bytes())
        .map_err(io_error(&tmp_path))?;
    tmp_file.sync_all().map_err(io_error(&tmp_path))?;
    fs::rename(&tmp_path, path).map_err(io_error(path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::domain::{ActivityId, tests::sample_catalog};

    fn unique_dir(prefix: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = PathBuf::from(format!("/tmp/{}_{}", prefix, now));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_plan_round_trip() {
        let dir = unique_dir("dayblocks_plan_roundtrip");
        let catalog = sample_catalog();
        let mut grid = BlockGrid::new();
        grid.fill(40..52, &ActivityId::new("Work"));
        grid.set(23, 5, ActivityId::new("Sleep"));

        let path = save_plan(&dir, " weekday ", &grid).unwrap();
        assert_eq!(path, dir.join("weekday.toml"));

        let loaded = load_plan(&dir, "weekday", &catalog).unwrap();
        assert_eq!(loaded, grid);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_load_plan_missing_section_is_malformed() {
        let dir = unique_dir("dayblocks_plan_malformed");
        let catalog = sample_catalog();
        let mut doc = BlockGrid::new().serialize();
        doc.remove("23");
        fs::write(dir.join("broken.toml"), toml::to_string(&doc).unwrap()).unwrap();

        let err = load_plan(&dir, "broken", &catalog).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Plan {
                source: PlanError::MissingSection(ref section),
                ..
            } if section == "23"
        ));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_load_plan_accepts_hand_written_document() {
        let dir = unique_dir("dayblocks_plan_handwritten");
        let catalog = sample_catalog();
        let mut content = String::new();
        for row in 0..24 {
            content.push_str(&format!("[\"{:02}\"]\n", row));
            for col in 0..6 {
                let value = if row == 8 && col == 0 { "Work" } else { "-1" };
                content.push_str(&format!("\"{}0\" = \"{}\"\n", col, value));
            }
        }
        fs::write(dir.join("manual.toml"), content).unwrap();

        let grid = load_plan(&dir, "manual", &catalog).unwrap();
        assert_eq!(grid.get(8, 0), &ActivityId::new("Work"));
        assert_eq!(grid.count_linked(), 1);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_backup_pruning_only_touches_its_own_plan() {
        let dir = unique_dir("dayblocks_backup_prefix");
        let grid = BlockGrid::new();
        save_plan(&dir, "alpha", &grid).unwrap();
        save_plan(&dir, "alpha", &grid).unwrap();

        let backup_dir = dir.join("backups");
        for i in 0..12 {
            fs::write(backup_dir.join(format!("a.toml.seed_{:02}", i)), "").unwrap();
        }
        save_plan(&dir, "a", &grid).unwrap();
        save_plan(&dir, "a", &grid).unwrap();

        let count = |prefix: &str| {
            fs::read_dir(&backup_dir)
                .unwrap()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
                .count()
        };
        assert_eq!(count("alpha.toml."), 1);
        assert_eq!(count("a.toml."), MAX_BACKUPS);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_plan_names_are_validated() {
        let dir = PathBuf::from("/tmp");
        assert!(matches!(
            plan_path(&dir, "   "),
            Err(StorageError::InvalidPlanName(_))
        ));
        assert!(matches!(
            plan_path(&dir, "../escape"),
            Err(StorageError::InvalidPlanName(_))
        ));
        assert!(plan_path(&dir, "monday plan").is_ok());
    }

    #[test]
    fn test_discover_plans() {
        let dir = unique_dir("dayblocks_discover");
        assert_eq!(discover_plans(&dir), PlanDiscovery::None);

        save_plan(&dir, "b", &BlockGrid::new()).unwrap();
        assert_eq!(discover_plans(&dir), PlanDiscovery::Single("b".to_string()));

        save_plan(&dir, "a", &BlockGrid::new()).unwrap();
        save_plan(&dir, "a", &BlockGrid::new()).unwrap();
        assert_eq!(
            discover_plans(&dir),
            PlanDiscovery::Multiple(vec!["a".to_string(), "b".to_string()])
        );
        assert!(dir.join("backups").is_dir());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_settings_are_created() {
        let dir = unique_dir("dayblocks_settings");
        let path = dir.join("settings.toml");

        let settings = load_or_create_settings(&path).unwrap();
        assert!(path.exists());
        assert_eq!(settings, SettingsDocument::default());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_save_to_unwritable_location_fails() {
        let dir = unique_dir("dayblocks_unwritable");
        let not_a_dir = dir.join("plain_file");
        fs::write(&not_a_dir, b"").unwrap();

        let err = save_plan(&not_a_dir, "x", &BlockGrid::new()).unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));

        fs::remove_dir_all(dir).ok();
    }
}
