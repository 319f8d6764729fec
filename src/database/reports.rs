//! Named analytical queries over the football database
//!
//! Aggregates are cast to `float8`/`bigint` and parameters to `bigint` so the
//! results map onto plain JSON numbers without a decimal type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DatabaseError, DatabaseResult, QueryExecutor, QueryResult};

/// Default row limit for ranked reports
pub const DEFAULT_REPORT_LIMIT: i64 = 20;

/// Parameters shared by the report catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportParams {
    pub league_id: Option<i64>,
    pub season: Option<i64>,
    /// Row limit; `None` uses the report's own default
    pub limit: Option<i64>,
}

impl ReportParams {
    pub fn for_season(league_id: i64, season: i64) -> Self {
        Self {
            league_id: Some(league_id),
            season: Some(season),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Which filters a report takes, in placeholder order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportScope {
    /// No filters
    Global,
    /// Required league (`$1`) and season (`$2`)
    Season,
    /// Optional league (`$1`) and season (`$2`), null meaning all
    Filtered,
    /// Optional league (`$1`), null meaning all
    League,
}

/// A report from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportQuery {
    Leagues,
    Seasons,
    DatabaseOverview,
    LeagueStandings,
    TopScorers,
    TeamPerformance,
    GoalsTimeline,
    ShotAnalysis,
    HomeAway,
    PlayerPositions,
    LeagueComparison,
    TeamsByCountry,
    PlayerNationalities,
    LeagueTeams,
    PlayerStats,
    Games,
    Teams,
    TeamSummary,
    Schema,
}

impl ReportQuery {
    pub fn all() -> &'static [ReportQuery] {
        &[
            ReportQuery::Leagues,
            ReportQuery::Seasons,
            ReportQuery::DatabaseOverview,
            ReportQuery::LeagueStandings,
            ReportQuery::TopScorers,
            ReportQuery::TeamPerformance,
            ReportQuery::GoalsTimeline,
            ReportQuery::ShotAnalysis,
            ReportQuery::HomeAway,
            ReportQuery::PlayerPositions,
            ReportQuery::LeagueComparison,
            ReportQuery::TeamsByCountry,
            ReportQuery::PlayerNationalities,
            ReportQuery::LeagueTeams,
            ReportQuery::PlayerStats,
            ReportQuery::Games,
            ReportQuery::Teams,
            ReportQuery::TeamSummary,
            ReportQuery::Schema,
        ]
    }

    /// Name used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            ReportQuery::Leagues => "leagues",
            ReportQuery::Seasons => "seasons",
            ReportQuery::DatabaseOverview => "database-overview",
            ReportQuery::LeagueStandings => "league-standings",
            ReportQuery::TopScorers => "top-scorers",
            ReportQuery::TeamPerformance => "team-performance",
            ReportQuery::GoalsTimeline => "goals-timeline",
            ReportQuery::ShotAnalysis => "shot-analysis",
            ReportQuery::HomeAway => "home-away",
            ReportQuery::PlayerPositions => "player-positions",
            ReportQuery::LeagueComparison => "league-comparison",
            ReportQuery::TeamsByCountry => "teams-by-country",
            ReportQuery::PlayerNationalities => "player-nationalities",
            ReportQuery::LeagueTeams => "league-teams",
            ReportQuery::PlayerStats => "player-stats",
            ReportQuery::Games => "games",
            ReportQuery::Teams => "teams",
            ReportQuery::TeamSummary => "team-summary",
            ReportQuery::Schema => "schema",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ReportQuery::Leagues => "Active leagues",
            ReportQuery::Seasons => "Seasons with recorded games",
            ReportQuery::DatabaseOverview => "Row counts and season range",
            ReportQuery::LeagueStandings => "League table for a season",
            ReportQuery::TopScorers => "Top scorers for a season",
            ReportQuery::TeamPerformance => "Per-team results, shots and possession",
            ReportQuery::GoalsTimeline => "Goals per month",
            ReportQuery::ShotAnalysis => "Shot outcomes and expected goals",
            ReportQuery::HomeAway => "Home versus away performance",
            ReportQuery::PlayerPositions => "Goals and assists by position",
            ReportQuery::LeagueComparison => "All leagues in the latest season",
            ReportQuery::TeamsByCountry => "Teams and goals per country",
            ReportQuery::PlayerNationalities => "Players and output by nationality",
            ReportQuery::LeagueTeams => "Teams with league country, wins and goals",
            ReportQuery::PlayerStats => "Per-player totals and per-90 rates",
            ReportQuery::Games => "Latest completed games with scores",
            ReportQuery::Teams => "Active teams and their leagues",
            ReportQuery::TeamSummary => "All-time team summary",
            ReportQuery::Schema => "Tables and columns of the public schema",
        }
    }

    pub fn scope(&self) -> ReportScope {
        match self {
            ReportQuery::LeagueStandings
            | ReportQuery::TopScorers
            | ReportQuery::TeamPerformance
            | ReportQuery::GoalsTimeline
            | ReportQuery::ShotAnalysis
            | ReportQuery::HomeAway
            | ReportQuery::PlayerPositions => ReportScope::Season,
            ReportQuery::PlayerStats | ReportQuery::Games => ReportScope::Filtered,
            ReportQuery::Teams | ReportQuery::TeamSummary => ReportScope::League,
            _ => ReportScope::Global,
        }
    }

    /// Whether the report is scoped to one league and season
    pub fn requires_season(&self) -> bool {
        self.scope() == ReportScope::Season
    }

    /// Row limit used when none is given; `None` for unlimited reports
    pub fn default_limit(&self) -> Option<i64> {
        match self {
            ReportQuery::TopScorers => Some(DEFAULT_REPORT_LIMIT),
            ReportQuery::PlayerNationalities => Some(30),
            ReportQuery::PlayerStats | ReportQuery::Games => Some(100),
            _ => None,
        }
    }

    pub fn sql(&self) -> &'static str {
        match self {
            ReportQuery::Leagues => {
                "SELECT league_id::bigint AS league_id, name, country \
                 FROM leagues \
                 WHERE is_active = true \
                 ORDER BY name"
            }
            ReportQuery::Seasons => {
                "SELECT DISTINCT season::bigint AS season \
                 FROM games \
                 ORDER BY season DESC"
            }
            ReportQuery::DatabaseOverview => {
                "SELECT \
                    (SELECT COUNT(*) FROM leagues WHERE is_active = true) AS total_leagues, \
                    (SELECT COUNT(*) FROM teams WHERE is_active = true) AS total_teams, \
                    (SELECT COUNT(*) FROM players WHERE is_active = true) AS total_players, \
                    (SELECT COUNT(*) FROM games WHERE status = 'completed') AS total_games, \
                    (SELECT COUNT(*) FROM shots) AS total_shots, \
                    (SELECT COUNT(*) FROM appearances) AS total_appearances, \
                    (SELECT MIN(season)::bigint FROM games) AS first_season, \
                    (SELECT MAX(season)::bigint FROM games) AS last_season, \
                    (SELECT SUM(home_goals + away_goals)::bigint FROM games) AS total_goals"
            }
            ReportQuery::LeagueStandings => {
                "SELECT team_name, \
                    matches_played::bigint AS matches_played, \
                    wins::bigint AS wins, \
                    draws::bigint AS draws, \
                    losses::bigint AS losses, \
                    goals_for::bigint AS goals_for, \
                    goals_against::bigint AS goals_against, \
                    goal_difference::bigint AS goal_difference, \
                    points::bigint AS points, \
                    ROUND(avg_possession::numeric, 1)::float8 AS avg_possession \
                 FROM mv_league_standings \
                 WHERE league_id = $1::bigint AND season = $2::bigint \
                 ORDER BY points DESC, goal_difference DESC, goals_for DESC"
            }
            ReportQuery::TopScorers => {
                "SELECT player_name, nationality, \
                    games_played::bigint AS games_played, \
                    total_goals::bigint AS total_goals, \
                    total_assists::bigint AS total_assists, \
                    ROUND(goals_per_90::numeric, 2)::float8 AS goals_per_90, \
                    ROUND(avg_x_goals::numeric, 2)::float8 AS avg_xg \
                 FROM mv_top_scorers \
                 WHERE league_id = $1::bigint AND season = $2::bigint \
                 ORDER BY total_goals DESC, goals_per_90 DESC \
                 LIMIT $3::bigint"
            }
            ReportQuery::TeamPerformance => {
                "SELECT t.name AS team_name, \
                    COUNT(DISTINCT ts.game_id) AS games_played, \
                    SUM(ts.goals)::bigint AS goals_scored, \
                    ROUND(AVG(ts.x_goals)::numeric, 2)::float8 AS avg_xg, \
                    SUM(ts.shots)::bigint AS total_shots, \
                    SUM(ts.shots_on_target)::bigint AS shots_on_target, \
                    ROUND((SUM(ts.shots_on_target)::numeric / NULLIF(SUM(ts.shots), 0) * 100), 1)::float8 AS shot_accuracy, \
                    ROUND(AVG(ts.possession_percentage)::numeric, 1)::float8 AS avg_possession, \
                    SUM(CASE WHEN ts.result = 'win' THEN 1 ELSE 0 END)::bigint AS wins, \
                    SUM(CASE WHEN ts.result = 'draw' THEN 1 ELSE 0 END)::bigint AS draws, \
                    SUM(CASE WHEN ts.result = 'loss' THEN 1 ELSE 0 END)::bigint AS losses \
                 FROM team_stats ts \
                 JOIN games g ON ts.game_id = g.game_id \
                 JOIN teams t ON ts.team_id = t.team_id \
                 WHERE g.league_id = $1::bigint AND g.season = $2::bigint AND g.status = 'completed' \
                 GROUP BY t.name \
                 ORDER BY wins DESC, goals_scored DESC"
            }
            ReportQuery::GoalsTimeline => {
                "SELECT DATE_TRUNC('month', g.date)::date::text AS month, \
                    SUM(g.home_goals + g.away_goals)::bigint AS total_goals, \
                    COUNT(*) AS matches_played, \
                    ROUND(AVG(g.home_goals + g.away_goals)::numeric, 2)::float8 AS avg_goals_per_match \
                 FROM games g \
                 WHERE g.league_id = $1::bigint AND g.season = $2::bigint AND g.status = 'completed' \
                 GROUP BY DATE_TRUNC('month', g.date) \
                 ORDER BY month"
            }
            ReportQuery::ShotAnalysis => {
                "SELECT shot_result, \
                    COUNT(*) AS shot_count, \
                    ROUND(AVG(x_goal)::numeric, 3)::float8 AS avg_xg, \
                    COUNT(CASE WHEN shot_result = 'Goal' THEN 1 END) AS goals \
                 FROM shots s \
                 JOIN games g ON s.game_id = g.game_id \
                 WHERE g.league_id = $1::bigint AND g.season = $2::bigint \
                    AND shot_result IS NOT NULL \
                 GROUP BY shot_result \
                 ORDER BY shot_count DESC"
            }
            ReportQuery::HomeAway => {
                "SELECT location, \
                    COUNT(*) AS matches, \
                    SUM(CASE WHEN result = 'win' THEN 1 ELSE 0 END)::bigint AS wins, \
                    SUM(CASE WHEN result = 'draw' THEN 1 ELSE 0 END)::bigint AS draws, \
                    SUM(CASE WHEN result = 'loss' THEN 1 ELSE 0 END)::bigint AS losses, \
                    ROUND(AVG(goals)::numeric, 2)::float8 AS avg_goals, \
                    ROUND(AVG(x_goals)::numeric, 2)::float8 AS avg_xg, \
                    ROUND(AVG(possession_percentage)::numeric, 1)::float8 AS avg_possession \
                 FROM team_stats ts \
                 JOIN games g ON ts.game_id = g.game_id \
                 WHERE g.league_id = $1::bigint AND g.season = $2::bigint \
                 GROUP BY location"
            }
            ReportQuery::PlayerPositions => {
                "SELECT COALESCE(a.position, 'Unknown') AS position, \
                    COUNT(DISTINCT a.player_id) AS players_count, \
                    SUM(a.goals)::bigint AS total_goals, \
                    SUM(a.assists)::bigint AS total_assists, \
                    ROUND(AVG(a.time_played)::numeric, 1)::float8 AS avg_minutes \
                 FROM appearances a \
                 JOIN games g ON a.game_id = g.game_id \
                 WHERE g.league_id = $1::bigint AND g.season = $2::bigint \
                    AND a.position IS NOT NULL \
                 GROUP BY a.position \
                 ORDER BY total_goals DESC"
            }
            ReportQuery::LeagueComparison => {
                "WITH latest_season AS (SELECT MAX(season) AS season FROM games) \
                 SELECT l.name AS league, l.country, \
                    COUNT(DISTINCT g.game_id) AS total_matches, \
                    SUM(g.home_goals + g.away_goals)::bigint AS total_goals, \
                    ROUND(AVG(g.home_goals + g.away_goals)::numeric, 2)::float8 AS avg_goals_per_match, \
                    COUNT(DISTINCT ts.team_id) AS teams_count, \
                    SUM(ts.shots)::bigint AS total_shots, \
                    ROUND(AVG(ts.possession_percentage)::numeric, 1)::float8 AS avg_possession \
                 FROM leagues l \
                 JOIN games g ON l.league_id = g.league_id \
                 JOIN team_stats ts ON g.game_id = ts.game_id \
                 JOIN latest_season ls ON g.season = ls.season \
                 WHERE g.status = 'completed' \
                 GROUP BY l.name, l.country \
                 ORDER BY total_goals DESC"
            }
            ReportQuery::TeamsByCountry => {
                "SELECT l.country, \
                    COUNT(DISTINCT t.team_id) AS team_count, \
                    COUNT(DISTINCT g.game_id) AS total_matches, \
                    SUM(g.home_goals + g.away_goals)::bigint AS total_goals \
                 FROM leagues l \
                 JOIN teams t ON l.league_id = t.league_id \
                 LEFT JOIN games g ON (g.home_team_id = t.team_id OR g.away_team_id = t.team_id) \
                 WHERE t.is_active = true AND g.status = 'completed' \
                 GROUP BY l.country \
                 ORDER BY team_count DESC"
            }
            ReportQuery::PlayerNationalities => {
                "SELECT COALESCE(p.nationality, 'Unknown') AS nationality, \
                    COUNT(DISTINCT p.player_id) AS player_count, \
                    SUM(a.goals)::bigint AS total_goals, \
                    SUM(a.assists)::bigint AS total_assists, \
                    COUNT(DISTINCT a.game_id) AS total_appearances \
                 FROM players p \
                 LEFT JOIN appearances a ON p.player_id = a.player_id \
                 WHERE p.is_active = true \
                 GROUP BY p.nationality \
                 HAVING COUNT(DISTINCT p.player_id) >= 5 \
                 ORDER BY player_count DESC \
                 LIMIT $1::bigint"
            }
            ReportQuery::LeagueTeams => {
                "SELECT t.name AS team_name, l.name AS league_name, l.country, \
                    COUNT(DISTINCT g.game_id) AS matches_played, \
                    SUM(CASE WHEN ts.result = 'win' THEN 1 ELSE 0 END)::bigint AS wins, \
                    SUM(ts.goals)::bigint AS total_goals \
                 FROM teams t \
                 JOIN leagues l ON t.league_id = l.league_id \
                 LEFT JOIN games g ON (g.home_team_id = t.team_id OR g.away_team_id = t.team_id) \
                 LEFT JOIN team_stats ts ON ts.game_id = g.game_id AND ts.team_id = t.team_id \
                 WHERE t.is_active = true AND g.status = 'completed' \
                 GROUP BY t.name, l.name, l.country \
                 ORDER BY total_goals DESC"
            }
            ReportQuery::PlayerStats => {
                "SELECT p.player_id::bigint AS player_id, p.name AS player_name, p.nationality, \
                    EXTRACT(YEAR FROM AGE(CURRENT_DATE, p.date_of_birth))::bigint AS age, \
                    COUNT(DISTINCT a.game_id) AS games_played, \
                    SUM(a.goals)::bigint AS total_goals, \
                    SUM(a.assists)::bigint AS total_assists, \
                    SUM(a.time_played)::bigint AS total_minutes, \
                    ROUND((SUM(a.goals)::numeric / NULLIF(SUM(a.time_played), 0) * 90), 3)::float8 AS goals_per_90, \
                    ROUND((SUM(a.assists)::numeric / NULLIF(SUM(a.time_played), 0) * 90), 3)::float8 AS assists_per_90, \
                    ROUND(AVG(a.x_goals)::numeric, 3)::float8 AS avg_x_goals \
                 FROM players p \
                 JOIN appearances a ON p.player_id = a.player_id \
                 JOIN games g ON a.game_id = g.game_id \
                 WHERE ($1::bigint IS NULL OR g.league_id = $1::bigint) \
                    AND ($2::bigint IS NULL OR g.season = $2::bigint) \
                 GROUP BY p.player_id, p.name, p.nationality, p.date_of_birth \
                 HAVING COUNT(DISTINCT a.game_id) > 0 \
                 ORDER BY total_goals DESC, total_assists DESC \
                 LIMIT $3::bigint"
            }
            ReportQuery::Games => {
                "SELECT g.game_id::bigint AS game_id, g.season::bigint AS season, \
                    g.date::text AS date, g.status, \
                    l.name AS league_name, ht.name AS home_team, at.name AS away_team, \
                    g.home_goals::bigint AS home_goals, g.away_goals::bigint AS away_goals, \
                    CASE \
                        WHEN g.home_goals > g.away_goals THEN ht.name \
                        WHEN g.away_goals > g.home_goals THEN at.name \
                        ELSE 'Draw' \
                    END AS winner \
                 FROM games g \
                 JOIN leagues l ON g.league_id = l.league_id \
                 JOIN teams ht ON g.home_team_id = ht.team_id \
                 JOIN teams at ON g.away_team_id = at.team_id \
                 WHERE g.status = 'completed' \
                    AND ($1::bigint IS NULL OR g.league_id = $1::bigint) \
                    AND ($2::bigint IS NULL OR g.season = $2::bigint) \
                 ORDER BY g.date DESC \
                 LIMIT $3::bigint"
            }
            ReportQuery::Teams => {
                "SELECT t.team_id::bigint AS team_id, t.name, \
                    l.name AS league_name, l.league_id::bigint AS league_id \
                 FROM teams t \
                 JOIN leagues l ON t.league_id = l.league_id \
                 WHERE t.is_active = true \
                    AND ($1::bigint IS NULL OR l.league_id = $1::bigint) \
                 ORDER BY l.name, t.name"
            }
            ReportQuery::TeamSummary => {
                "SELECT team_id::bigint AS team_id, team_name, league_name, \
                    games_played::bigint AS games_played, \
                    wins::bigint AS wins, \
                    draws::bigint AS draws, \
                    losses::bigint AS losses, \
                    goals_scored::bigint AS goals_scored, \
                    avg_x_goals::float8 AS avg_x_goals, \
                    total_shots::bigint AS total_shots, \
                    total_shots_on_target::bigint AS total_shots_on_target, \
                    shot_accuracy_pct::float8 AS shot_accuracy_pct, \
                    avg_possession_pct::float8 AS avg_possession_pct \
                 FROM v_team_performance \
                 WHERE ($1::bigint IS NULL \
                    OR team_id IN (SELECT team_id FROM teams WHERE league_id = $1::bigint)) \
                 ORDER BY goals_scored DESC"
            }
            ReportQuery::Schema => {
                "SELECT table_name::text AS table_name, \
                    column_name::text AS column_name, \
                    data_type::text AS data_type, \
                    is_nullable::text AS is_nullable \
                 FROM information_schema.columns \
                 WHERE table_schema = 'public' \
                 ORDER BY table_name, ordinal_position"
            }
        }
    }

    /// Positional parameters for [`ReportQuery::sql`]
    pub fn params(&self, params: &ReportParams) -> DatabaseResult<Vec<Value>> {
        let optional = |value: Option<i64>| value.map_or(Value::Null, Value::from);

        let mut values = match self.scope() {
            ReportScope::Global => Vec::new(),
            ReportScope::Season => {
                let league_id = params.league_id.ok_or_else(|| {
                    DatabaseError::InvalidInput(format!("{} requires a league id", self.name()))
                })?;
                let season = params.season.ok_or_else(|| {
                    DatabaseError::InvalidInput(format!("{} requires a season", self.name()))
                })?;
                vec![Value::from(league_id), Value::from(season)]
            }
            ReportScope::Filtered => vec![optional(params.league_id), optional(params.season)],
            ReportScope::League => vec![optional(params.league_id)],
        };

        if let Some(default) = self.default_limit() {
            let limit = params.limit.unwrap_or(default);
            if limit <= 0 {
                return Err(DatabaseError::InvalidInput(format!(
                    "limit must be positive, got {}",
                    limit
                )));
            }
            values.push(Value::from(limit));
        }
        Ok(values)
    }

    /// Run the report through an executor
    pub async fn run<E: QueryExecutor + ?Sized>(
        &self,
        executor: &E,
        params: &ReportParams,
    ) -> DatabaseResult<QueryResult> {
        let values = self.params(params)?;
        tracing::debug!(report = self.name(), "Running report");
        executor.execute(self.sql(), &values).await
    }
}

impl fmt::Display for ReportQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReportQuery {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        ReportQuery::all()
            .iter()
            .copied()
            .find(|report| report.name() == wanted)
            .ok_or_else(|| DatabaseError::InvalidInput(format!("Unknown report: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::cell::RefCell;

    #[test]
    fn test_names_round_trip() {
        for report in ReportQuery::all() {
            assert_eq!(report.name().parse::<ReportQuery>().unwrap(), *report);
        }
        assert_eq!(
            "top_scorers".parse::<ReportQuery>().unwrap(),
            ReportQuery::TopScorers
        );
        assert!("standings".parse::<ReportQuery>().is_err());
    }

    #[test]
    fn test_placeholders_match_parameters() {
        let params = ReportParams::for_season(1, 2020);
        for report in ReportQuery::all() {
            let values = report.params(&params).unwrap();
            let sql = report.sql();
            for n in 1..=values.len() {
                assert!(
                    sql.contains(&format!("${}::bigint", n)),
                    "{} missing ${}",
                    report,
                    n
                );
            }
            assert!(!sql.contains(&format!("${}", values.len() + 1)));
        }
    }

    #[test]
    fn test_season_reports_require_league_and_season() {
        let missing_season = ReportParams {
            league_id: Some(1),
            ..ReportParams::default()
        };
        assert!(matches!(
            ReportQuery::LeagueStandings.params(&missing_season),
            Err(DatabaseError::InvalidInput(_))
        ));
        assert!(
            ReportQuery::Leagues
                .params(&ReportParams::default())
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_top_scorers_parameters() {
        let params = ReportParams::for_season(2, 2019).with_limit(10);
        assert_eq!(
            ReportQuery::TopScorers.params(&params).unwrap(),
            vec![json!(2), json!(2019), json!(10)]
        );
        assert!(
            ReportQuery::TopScorers
                .params(&params.with_limit(0))
                .is_err()
        );
    }

    #[test]
    fn test_default_limits() {
        let params = ReportParams::for_season(1, 2020);
        assert_eq!(
            ReportQuery::TopScorers.params(&params).unwrap()[2],
            json!(DEFAULT_REPORT_LIMIT)
        );
        assert_eq!(
            ReportQuery::PlayerNationalities
                .params(&ReportParams::default())
                .unwrap(),
            vec![json!(30)]
        );
        assert_eq!(
            ReportQuery::PlayerNationalities
                .params(&ReportParams::default().with_limit(5))
                .unwrap(),
            vec![json!(5)]
        );
        assert_eq!(ReportQuery::LeagueStandings.default_limit(), None);
    }

    #[test]
    fn test_optional_filters_bind_null() {
        let all = ReportParams::default();
        assert_eq!(
            ReportQuery::Games.params(&all).unwrap(),
            vec![Value::Null, Value::Null, json!(100)]
        );
        assert_eq!(
            ReportQuery::PlayerStats
                .params(&ReportParams {
                    season: Some(2015),
                    ..all
                })
                .unwrap(),
            vec![Value::Null, json!(2015), json!(100)]
        );
        assert_eq!(
            ReportQuery::Teams
                .params(&ReportParams {
                    league_id: Some(4),
                    ..all
                })
                .unwrap(),
            vec![json!(4)]
        );
        assert!(ReportQuery::Schema.params(&all).unwrap().is_empty());
        assert!(ReportQuery::TeamSummary.sql().contains("v_team_performance"));
        assert!(ReportQuery::Schema.sql().contains("information_schema.columns"));
    }

    #[derive(Default)]
    struct RecordingExecutor {
        seen: RefCell<Vec<(String, Vec<Value>)>>,
    }

    #[async_trait(?Send)]
    impl QueryExecutor for RecordingExecutor {
        async fn execute(&self, sql: &str, params: &[Value]) -> DatabaseResult<QueryResult> {
            self.seen
                .borrow_mut()
                .push((sql.to_string(), params.to_vec()));
            Ok(QueryResult::empty())
        }
    }

    #[tokio::test]
    async fn test_run_passes_sql_and_parameters() {
        let executor = RecordingExecutor::default();
        ReportQuery::ShotAnalysis
            .run(&executor, &ReportParams::for_season(3, 2018))
            .await
            .unwrap();

        let seen = executor.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].0.contains("FROM shots s"));
        assert_eq!(seen[0].1, vec![json!(3), json!(2018)]);
    }

    #[tokio::test]
    async fn test_run_rejects_missing_parameters_before_executing() {
        let executor = RecordingExecutor::default();
        let result = ReportQuery::HomeAway
            .run(&executor, &ReportParams::default())
            .await;

        assert!(result.is_err());
        assert!(executor.seen.borrow().is_empty());
    }
}
