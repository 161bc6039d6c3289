use crate::core::scoring::objective::{Objective, ObjectiveTerm};
use crate::core::scoring::score::ClampPolicy;
use crate::engine::config::{
    CampaignConfig, CampaignConfigBuilder, ConfigError, DimensionConfig, ScoringColumn,
    StopCondition,
};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CampaignFileError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialObjective {
    clamp: Option<ClampPolicy>,
    terms: Option<Vec<ObjectiveTerm>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialRanking {
    column: Option<ScoringColumn>,
    top_k: Option<usize>,
    ucb_alpha: Option<f64>,
}

/// On-disk form of a campaign. Every field is optional here so that missing values are
/// reported by [`CampaignConfigBuilder::build`] under their own names.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CampaignFile {
    parameters: Option<Vec<String>>,
    max_steps: Option<u64>,
    objective: Option<PartialObjective>,
    #[serde(default)]
    dimensions: Vec<DimensionConfig>,
    ranking: Option<PartialRanking>,
    stop: Option<StopCondition>,
}

impl CampaignFile {
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn load(path: &Path) -> Result<Self, CampaignFileError> {
        debug!("Loading campaign configuration from file: {:?}", path);
        let label = path.to_string_lossy().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| CampaignFileError::Io {
            path: label.clone(),
            source: e,
        })?;
        Self::parse(&content).map_err(|e| CampaignFileError::Toml {
            path: label,
            source: e,
        })
    }

    pub fn into_builder(self) -> Result<CampaignConfigBuilder, ConfigError> {
        let mut builder = CampaignConfigBuilder::new().dimensions(self.dimensions);

        if let Some(parameters) = self.parameters {
            builder = builder.parameters(parameters);
        }
        if let Some(steps) = self.max_steps {
            builder = builder.max_steps(steps);
        }
        if let Some(objective) = self.objective {
            let terms = objective
                .terms
                .ok_or(ConfigError::MissingParameter("objective.terms"))?;
            let clamp = objective
                .clamp
                .ok_or(ConfigError::MissingParameter("objective.clamp"))?;
            builder = builder.objective(Objective::new(terms, clamp));
        }
        if let Some(ranking) = self.ranking {
            if let Some(column) = ranking.column {
                builder = builder.scoring_column(column);
            }
            if let Some(k) = ranking.top_k {
                builder = builder.top_k(k);
            }
            if let Some(alpha) = ranking.ucb_alpha {
                builder = builder.ucb_alpha(alpha);
            }
        }
        if let Some(stop) = self.stop {
            builder = builder.stop(stop);
        }
        Ok(builder)
    }

    pub fn into_config(self) -> Result<CampaignConfig, ConfigError> {
        self.into_builder()?.build()
    }
}

/// Reads and validates a campaign file in one go.
pub fn load_config(path: &Path) -> Result<CampaignConfig, CampaignFileError> {
    Ok(CampaignFile::load(path)?.into_config()?)
}
