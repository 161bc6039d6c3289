use super::config::{RankingConfig, ScoringColumn};
use super::error::{DomainError, EngineError};
use super::open_set::{OpenEntry, OpenSet};
use crate::core::models::params::ParameterVector;
use std::cmp::Ordering;
use tracing::{debug, info, instrument};

/// A ranked open cell, ready to hand to the experiment executor.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub params: ParameterVector,
    /// Mean fitness of the inherited samples; `None` when no closed cell voted.
    pub si: Option<f64>,
    /// UCB-adjusted fitness, present only for UCB rankings.
    pub si_ucb: Option<f64>,
    pub sample_count: usize,
    pub samples: Vec<f64>,
}

impl Candidate {
    pub fn score(&self, column: ScoringColumn) -> Option<f64> {
        match column {
            ScoringColumn::Mean => self.si,
            ScoringColumn::Ucb => self.si_ucb,
        }
    }
}

pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }
}

/// UCB1 score: `mean + alpha * sqrt(2 ln(step) / n)`.
pub fn ucb_score(
    mean: f64,
    alpha: f64,
    step: u64,
    sample_count: usize,
) -> Result<f64, DomainError> {
    if sample_count == 0 {
        return Err(DomainError::ZeroSamples);
    }
    if step == 0 {
        return Err(DomainError::NonPositiveStep { step });
    }
    let bonus = (2.0 * (step as f64).ln() / sample_count as f64).sqrt();
    Ok(mean + alpha * bonus)
}

fn project(entry: &OpenEntry) -> Candidate {
    Candidate {
        params: entry.params.rounded(),
        si: mean(&entry.samples),
        si_ucb: None,
        sample_count: entry.samples.len(),
        samples: entry.samples.clone(),
    }
}

/// Descending by score, unscored last. Equal scores keep their relative order because
/// the caller sorts stably.
fn by_score_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Ranks the open set and returns at most `config.top_k` candidates.
///
/// Mean ranking keeps cells without samples, after every scored cell. UCB ranking
/// drops them, since no confidence bound exists for an empty sample list.
#[instrument(skip_all, name = "candidate_ranking", fields(step = step))]
pub fn rank(
    open: &OpenSet,
    config: &RankingConfig,
    step: u64,
) -> Result<Vec<Candidate>, EngineError> {
    let mut candidates: Vec<Candidate> = match config.column {
        ScoringColumn::Mean => open.iter().map(project).collect(),
        ScoringColumn::Ucb => {
            if step == 0 {
                return Err(DomainError::NonPositiveStep { step }.into());
            }
            let scored: Vec<Candidate> = open
                .iter()
                .filter(|e| !e.samples.is_empty())
                .map(|e| {
                    let mut c = project(e);
                    let si = c.si.ok_or(DomainError::ZeroSamples)?;
                    c.si_ucb = Some(ucb_score(si, config.ucb_alpha, step, c.sample_count)?);
                    Ok(c)
                })
                .collect::<Result<_, DomainError>>()?;
            debug!(
                unscored = open.len() - scored.len(),
                "Excluded open cells without samples from UCB ranking."
            );
            scored
        }
    };

    candidates.sort_by(|a, b| by_score_desc(a.score(config.column), b.score(config.column)));
    candidates.truncate(config.top_k);

    info!(
        open_cells = open.len(),
        returned = candidates.len(),
        best = ?candidates.first().and_then(|c| c.score(config.column)),
        "Candidates ranked."
    );
    Ok(candidates)
}
