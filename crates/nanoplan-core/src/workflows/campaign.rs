use crate::core::models::params::{CanonicalKey, ParameterVector};
use crate::core::models::table::DataTable;
use crate::engine::closed_set;
use crate::engine::config::CampaignConfig;
use crate::engine::error::EngineError;
use crate::engine::open_set;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::ranking::{self, Candidate};
use crate::engine::state::{CampaignOutcome, LoopPhase, StepRecord};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// The boundary to the lab: runs the proposed experiments and returns what was measured.
///
/// The returned table must carry the campaign's parameter columns and measurement
/// columns; other columns are dropped when the batch is appended. The call blocks for
/// as long as the experiments take, so implementations that talk to real instruments
/// should enforce their own deadline and report it as an error.
pub trait ExperimentExecutor {
    fn execute(
        &mut self,
        step: u64,
        candidates: &[Candidate],
        parameters: &[String],
    ) -> Result<DataTable, EngineError>;
}

impl<F> ExperimentExecutor for F
where
    F: FnMut(u64, &[Candidate], &[String]) -> Result<DataTable, EngineError>,
{
    fn execute(
        &mut self,
        step: u64,
        candidates: &[Candidate],
        parameters: &[String],
    ) -> Result<DataTable, EngineError> {
        self(step, candidates, parameters)
    }
}

/// One planning pass over the data collected so far.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub closed_cells: usize,
    pub open_cells: usize,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone)]
pub struct CampaignResult {
    pub outcome: CampaignOutcome,
    /// Initial rows followed by every batch received, in arrival order.
    pub data: DataTable,
    pub history: Vec<StepRecord>,
}

fn in_phase<T>(
    reporter: &ProgressReporter,
    phase: LoopPhase,
    action: impl FnOnce() -> Result<T, EngineError>,
) -> Result<T, EngineError> {
    reporter.report(Progress::PhaseStart { name: phase.name() });
    let result = action()?;
    reporter.report(Progress::PhaseFinish);
    Ok(result)
}

/// Builds the closed and open sets from `data` and ranks the open set for `step`.
///
/// Cells in `excluded` are never proposed; expansion steps over them as if measured.
pub fn propose(
    data: &DataTable,
    config: &CampaignConfig,
    step: u64,
    excluded: &HashSet<CanonicalKey>,
    reporter: &ProgressReporter,
) -> Result<Proposal, EngineError> {
    let closed = in_phase(reporter, LoopPhase::BuildClosed, || {
        closed_set::build(data, &config.parameters, &config.objective)
    })?;
    let open = in_phase(reporter, LoopPhase::BuildOpen, || {
        open_set::expand_excluding(&closed, &config.dimensions, excluded).map(|(open, _)| open)
    })?;
    let candidates = in_phase(reporter, LoopPhase::Rank, || {
        ranking::rank(&open, &config.ranking, step)
    })?;

    Ok(Proposal {
        closed_cells: closed.len(),
        open_cells: open.len(),
        candidates,
    })
}

#[instrument(skip_all, name = "campaign_workflow")]
pub fn run<E: ExperimentExecutor>(
    initial: DataTable,
    config: &CampaignConfig,
    executor: &mut E,
    reporter: &ProgressReporter,
) -> Result<CampaignResult, EngineError> {
    in_phase(reporter, LoopPhase::Init, || {
        info!(
            rows = initial.len(),
            parameters = config.parameters.len(),
            max_steps = config.max_steps,
            "Starting synthesis campaign."
        );
        initial.column_index(&config.stop.column)?;
        for column in &config.parameters {
            initial.column_index(column)?;
        }
        Ok(())
    })?;

    let mut data = initial;
    let mut history = Vec::new();
    // Proposed cells the executor returned nothing for; re-proposing them would stall.
    let mut excluded = HashSet::new();

    for step in 1..=config.max_steps {
        reporter.report(Progress::StepStart { step });
        debug!(step, rows = data.len(), "Starting campaign step.");

        let proposal = propose(&data, config, step, &excluded, reporter)?;
        if proposal.candidates.is_empty() {
            info!(step, "Open set exhausted; no candidates left to try.");
            return Ok(finish(
                reporter,
                CampaignOutcome::OpenSetExhausted { step },
                data,
                history,
            ));
        }
        reporter.report(Progress::CandidatesProposed {
            count: proposal.candidates.len(),
        });

        let batch = in_phase(reporter, LoopPhase::AwaitExperimentResults, || {
            executor.execute(step, &proposal.candidates, &config.parameters)
        })?;

        let first_new_row = data.len();
        let (received, unanswered) = in_phase(reporter, LoopPhase::AppendData, || {
            let received = data.append(&batch);
            let answered = (first_new_row..data.len())
                .map(|row| {
                    data.numbers(row, &config.parameters)
                        .map(|values| ParameterVector::new(values).key())
                })
                .collect::<Result<HashSet<_>, _>>()?;
            let unanswered: Vec<CanonicalKey> = proposal
                .candidates
                .iter()
                .map(|c| c.params.key())
                .filter(|key| !answered.contains(key))
                .collect();
            Ok((received, unanswered))
        })?;
        for key in &unanswered {
            warn!(step, cell = %key, "No measurement returned for proposed cell; excluding it.");
        }
        excluded.extend(unanswered.iter().cloned());
        if received == 0 {
            warn!(step, "Executor returned no measurements for this step.");
            reporter.report(Progress::Message(format!(
                "Step {step}: no measurements returned"
            )));
        }
        reporter.report(Progress::StepFinish {
            step,
            rows_received: received,
        });

        history.push(StepRecord {
            step,
            closed_cells: proposal.closed_cells,
            open_cells: proposal.open_cells,
            candidates: proposal.candidates,
            rows_received: received,
            unanswered,
        });

        let hit = in_phase(reporter, LoopPhase::CheckStop, || {
            for row in first_new_row..data.len() {
                let value = data.number(row, &config.stop.column)?;
                if config.stop.is_met(value) {
                    return Ok(Some((row, value)));
                }
            }
            Ok(None)
        })?;

        if let Some((row, value)) = hit {
            info!(step, row, value, "Target reached.");
            return Ok(finish(
                reporter,
                CampaignOutcome::TargetReached { step, row, value },
                data,
                history,
            ));
        }
    }

    info!(steps = config.max_steps, "Step budget exhausted.");
    Ok(finish(
        reporter,
        CampaignOutcome::BudgetExhausted {
            steps: config.max_steps,
        },
        data,
        history,
    ))
}

fn finish(
    reporter: &ProgressReporter,
    outcome: CampaignOutcome,
    data: DataTable,
    history: Vec<StepRecord>,
) -> CampaignResult {
    reporter.report(Progress::PhaseStart {
        name: LoopPhase::Done.name(),
    });
    reporter.report(Progress::PhaseFinish);
    CampaignResult {
        outcome,
        data,
        history,
    }
}
