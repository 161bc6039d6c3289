use crate::core::scoring::objective::Objective;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("No search configuration given for parameter column '{0}'")]
    MissingDimension(String),

    #[error("Search configuration given more than once for column '{0}'")]
    DuplicateDimension(String),

    #[error("Expected configuration for {expected} dimension(s), found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
}

/// Search radii for one parameter dimension.
///
/// `step`/`threshold`/`count_limit` bound the coarse expansion that creates open cells;
/// `near_step`/`near_threshold` bound the fine pass that shares samples with them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DimensionConfig {
    pub column: String,
    pub step: f64,
    pub threshold: f64,
    pub count_limit: usize,
    pub near_step: f64,
    pub near_threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ScoringColumn {
    /// Plain running average of the samples.
    #[serde(rename = "si")]
    Mean,
    /// Running average plus the UCB1 exploration bonus.
    #[serde(rename = "si-ucb")]
    Ucb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankingConfig {
    pub column: ScoringColumn,
    pub top_k: usize,
    pub ucb_alpha: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct StopCondition {
    pub column: String,
    pub target: f64,
    pub tolerance: f64,
}

impl StopCondition {
    #[inline]
    pub fn is_met(&self, observed: f64) -> bool {
        (observed - self.target).abs() < self.tolerance
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignConfig {
    pub parameters: Vec<String>,
    pub objective: Objective,
    /// Aligned with `parameters`: `dimensions[i]` configures `parameters[i]`.
    pub dimensions: Vec<DimensionConfig>,
    pub ranking: RankingConfig,
    pub stop: StopCondition,
    pub max_steps: u64,
}

#[derive(Default)]
pub struct CampaignConfigBuilder {
    parameters: Option<Vec<String>>,
    objective: Option<Objective>,
    dimensions: Vec<DimensionConfig>,
    scoring_column: Option<ScoringColumn>,
    top_k: Option<usize>,
    ucb_alpha: Option<f64>,
    stop: Option<StopCondition>,
    max_steps: Option<u64>,
}

impl CampaignConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parameters<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.parameters = Some(columns.into_iter().map(Into::into).collect());
        self
    }
    pub fn objective(mut self, objective: Objective) -> Self {
        self.objective = Some(objective);
        self
    }
    pub fn dimension(mut self, dimension: DimensionConfig) -> Self {
        self.dimensions.push(dimension);
        self
    }
    pub fn dimensions(mut self, dimensions: Vec<DimensionConfig>) -> Self {
        self.dimensions.extend(dimensions);
        self
    }
    pub fn scoring_column(mut self, column: ScoringColumn) -> Self {
        self.scoring_column = Some(column);
        self
    }
    pub fn top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }
    pub fn ucb_alpha(mut self, alpha: f64) -> Self {
        self.ucb_alpha = Some(alpha);
        self
    }
    pub fn stop(mut self, stop: StopCondition) -> Self {
        self.stop = Some(stop);
        self
    }
    pub fn max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    pub fn build(self) -> Result<CampaignConfig, ConfigError> {
        let parameters = self
            .parameters
            .ok_or(ConfigError::MissingParameter("parameters"))?;
        let objective = self
            .objective
            .ok_or(ConfigError::MissingParameter("objective"))?;
        let ranking = RankingConfig {
            column: self
                .scoring_column
                .ok_or(ConfigError::MissingParameter("scoring_column"))?,
            top_k: self.top_k.ok_or(ConfigError::MissingParameter("top_k"))?,
            ucb_alpha: self
                .ucb_alpha
                .ok_or(ConfigError::MissingParameter("ucb_alpha"))?,
        };
        let stop = self.stop.ok_or(ConfigError::MissingParameter("stop"))?;
        let max_steps = self
            .max_steps
            .ok_or(ConfigError::MissingParameter("max_steps"))?;

        if parameters.is_empty() {
            return Err(invalid("parameters", "at least one parameter column is required"));
        }
        let dimensions = align_dimensions(&parameters, self.dimensions)?;

        validate_objective(&objective)?;
        if ranking.top_k == 0 {
            return Err(invalid("top_k", "must be at least 1"));
        }
        if !(ranking.ucb_alpha >= 0.0 && ranking.ucb_alpha.is_finite()) {
            return Err(invalid("ucb_alpha", "must be a finite, non-negative number"));
        }
        if !(stop.tolerance >= 0.0 && stop.tolerance.is_finite()) {
            return Err(invalid(
                "stop.tolerance",
                "must be a finite, non-negative number",
            ));
        }
        if max_steps == 0 {
            return Err(invalid("max_steps", "must be at least 1"));
        }

        Ok(CampaignConfig {
            parameters,
            objective,
            dimensions,
            ranking,
            stop,
            max_steps,
        })
    }
}

fn invalid(name: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn align_dimensions(
    parameters: &[String],
    mut dimensions: Vec<DimensionConfig>,
) -> Result<Vec<DimensionConfig>, ConfigError> {
    let mut aligned = Vec::with_capacity(parameters.len());
    for column in parameters {
        let matches = dimensions.iter().filter(|d| &d.column == column).count();
        if matches > 1 {
            return Err(ConfigError::DuplicateDimension(column.clone()));
        }
        let pos = dimensions
            .iter()
            .position(|d| &d.column == column)
            .ok_or_else(|| ConfigError::MissingDimension(column.clone()))?;
        aligned.push(dimensions.swap_remove(pos));
    }
    if let Some(extra) = dimensions.first() {
        return Err(invalid(
            &extra.column,
            "search configuration given for a column that is not a campaign parameter",
        ));
    }
    Ok(aligned)
}

fn validate_objective(objective: &Objective) -> Result<(), ConfigError> {
    if objective.terms().is_empty() {
        return Err(invalid("objective", "at least one term is required"));
    }
    for term in objective.terms() {
        let scale = term.function.scale();
        if !(scale > 0.0 && scale.is_finite()) {
            return Err(invalid(
                &format!("objective.{}.scale", term.column),
                "must be finite and positive",
            ));
        }
        if !term.weight.is_finite() {
            return Err(invalid(
                &format!("objective.{}.weight", term.column),
                "must be finite",
            ));
        }
    }
    Ok(())
}
