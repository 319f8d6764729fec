//! Source file to destination table mapping

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{LoaderError, LoaderResult};
use super::value::ColumnType;

/// One destination table and the CSV extract that feeds it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSource {
    /// Destination table name
    pub name: String,
    /// Primary CSV file, relative to the data directory unless absolute
    pub file: PathBuf,
    /// File tried when the primary file is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<PathBuf>,
    /// Columns sent to the destination, in order
    pub columns: Vec<String>,
    /// Column types pinned instead of inferred
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub types: BTreeMap<String, ColumnType>,
}

/// Where a table's data was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileResolution {
    Primary(PathBuf),
    Fallback(PathBuf),
    Missing,
}

impl FileResolution {
    pub fn path(&self) -> Option<&Path> {
        match self {
            FileResolution::Primary(p) | FileResolution::Fallback(p) => Some(p),
            FileResolution::Missing => None,
        }
    }
}

impl TableSource {
    pub fn new(name: &str, file: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            file: PathBuf::from(file),
            fallback: None,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            types: BTreeMap::new(),
        }
    }

    pub fn with_fallback(mut self, fallback: &str) -> Self {
        self.fallback = Some(PathBuf::from(fallback));
        self
    }

    pub fn with_type(mut self, column: &str, column_type: ColumnType) -> Self {
        self.types.insert(column.to_string(), column_type);
        self
    }

    /// Locate the primary file, then the fallback
    pub fn resolve(&self, data_dir: &Path) -> FileResolution {
        let primary = data_dir.join(&self.file);
        if primary.is_file() {
            return FileResolution::Primary(primary);
        }

        if let Some(fallback) = &self.fallback {
            let fallback = data_dir.join(fallback);
            if fallback.is_file() {
                return FileResolution::Fallback(fallback);
            }
        }

        FileResolution::Missing
    }
}

/// Ordered set of table sources
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceMapping {
    pub tables: Vec<TableSource>,
}

impl SourceMapping {
    pub fn new(tables: Vec<TableSource>) -> Self {
        Self { tables }
    }

    /// The football staging tables
    pub fn football() -> Self {
        Self::new(vec![
            TableSource::new(
                "leagues_temp",
                "leagues.csv",
                &["leagueID", "name", "understatNotation"],
            ),
            TableSource::new("teams_temp", "teams.csv", &["teamID", "name"]),
            TableSource::new("players_temp", "players_utf8.csv", &["playerID", "name"])
                .with_fallback("players.csv"),
            TableSource::new(
                "games_temp",
                "games.csv",
                &[
                    "gameID",
                    "leagueID",
                    "season",
                    "date",
                    "homeTeamID",
                    "awayTeamID",
                    "homeGoals",
                    "awayGoals",
                    "homeProbability",
                    "drawProbability",
                    "awayProbability",
                    "homeGoalsHalfTime",
                    "awayGoalsHalfTime",
                    "B365H",
                    "B365D",
                    "B365A",
                    "BWH",
                    "BWD",
                    "BWA",
                    "IWH",
                    "IWD",
                    "IWA",
                    "PSH",
                    "PSD",
                    "PSA",
                    "WHH",
                    "WHD",
                    "WHA",
                    "VCH",
                    "VCD",
                    "VCA",
                    "PSCH",
                    "PSCD",
                    "PSCA",
                ],
            ),
            TableSource::new(
                "team_stats_temp",
                "teamstats.csv",
                &[
                    "gameID",
                    "teamID",
                    "season",
                    "date",
                    "location",
                    "goals",
                    "xGoals",
                    "shots",
                    "shotsOnTarget",
                    "deep",
                    "ppda",
                    "fouls",
                    "corners",
                    "yellowCards",
                    "redCards",
                    "result",
                ],
            ),
            TableSource::new(
                "appearances_temp",
                "appearances.csv",
                &[
                    "gameID",
                    "playerID",
                    "goals",
                    "ownGoals",
                    "shots",
                    "xGoals",
                    "xGoalsChain",
                    "xGoalsBuildup",
                    "assists",
                    "keyPasses",
                    "xAssists",
                    "position",
                    "positionOrder",
                    "yellowCard",
                    "redCard",
                    "time",
                    "substituteIn",
                    "substituteOut",
                    "leagueID",
                ],
            ),
            TableSource::new(
                "shots_temp",
                "shots.csv",
                &[
                    "gameID",
                    "shooterID",
                    "assisterID",
                    "minute",
                    "situation",
                    "lastAction",
                    "shotType",
                    "shotResult",
                    "xGoal",
                    "positionX",
                    "positionY",
                ],
            ),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&TableSource> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Keep only the named tables, in mapping order
    pub fn select(&self, names: &[String]) -> LoaderResult<Self> {
        if let Some(unknown) = names.iter().find(|n| self.get(n).is_none()) {
            return Err(LoaderError::UnknownTable(unknown.clone()));
        }

        Ok(Self::new(
            self.tables
                .iter()
                .filter(|t| names.contains(&t.name))
                .cloned()
                .collect(),
        ))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_football_mapping() {
        let mapping = SourceMapping::football();
        assert_eq!(mapping.len(), 7);

        let players = mapping.get("players_temp").unwrap();
        assert_eq!(players.file, PathBuf::from("players_utf8.csv"));
        assert_eq!(players.fallback, Some(PathBuf::from("players.csv")));

        assert_eq!(mapping.get("games_temp").unwrap().columns.len(), 34);
        assert_eq!(mapping.get("shots_temp").unwrap().columns.len(), 11);
    }

    #[test]
    fn test_resolve_primary() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("players_utf8.csv"), "playerID,name\n").unwrap();
        fs::write(dir.path().join("players.csv"), "playerID,name\n").unwrap();

        let mapping = SourceMapping::football();
        let resolution = mapping.get("players_temp").unwrap().resolve(dir.path());
        assert_eq!(
            resolution,
            FileResolution::Primary(dir.path().join("players_utf8.csv"))
        );
    }

    #[test]
    fn test_resolve_fallback() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("players.csv"), "playerID,name\n").unwrap();

        let mapping = SourceMapping::football();
        let resolution = mapping.get("players_temp").unwrap().resolve(dir.path());
        assert_eq!(
            resolution,
            FileResolution::Fallback(dir.path().join("players.csv"))
        );
    }

    #[test]
    fn test_resolve_missing() {
        let dir = TempDir::new().unwrap();
        let mapping = SourceMapping::football();
        let resolution = mapping.get("players_temp").unwrap().resolve(dir.path());
        assert_eq!(resolution, FileResolution::Missing);
        assert!(resolution.path().is_none());
    }

    #[test]
    fn test_select_tables() {
        let mapping = SourceMapping::football();
        let selected = mapping
            .select(&["shots_temp".to_string(), "teams_temp".to_string()])
            .unwrap();

        let names: Vec<&str> = selected.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["teams_temp", "shots_temp"]);

        let err = mapping.select(&["nope".to_string()]).unwrap_err();
        assert!(matches!(err, LoaderError::UnknownTable(name) if name == "nope"));
    }

    #[test]
    fn test_table_source_from_toml() {
        let toml = r#"
name = "games_temp"
file = "games.csv"
columns = ["gameID", "B365H"]

[types]
B365H = "text"
"#;
        let source: TableSource = toml::from_str(toml).unwrap();
        assert_eq!(source.fallback, None);
        assert_eq!(source.types.get("B365H"), Some(&ColumnType::Text));
    }
}
