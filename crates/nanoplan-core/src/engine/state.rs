use super::ranking::Candidate;
use crate::core::models::params::CanonicalKey;

/// States of the experiment loop, in the order a successful iteration visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Init,
    BuildClosed,
    BuildOpen,
    Rank,
    AwaitExperimentResults,
    AppendData,
    CheckStop,
    Done,
}

impl LoopPhase {
    pub fn name(self) -> &'static str {
        match self {
            LoopPhase::Init => "Initialization",
            LoopPhase::BuildClosed => "Building Closed Set",
            LoopPhase::BuildOpen => "Building Open Set",
            LoopPhase::Rank => "Ranking Candidates",
            LoopPhase::AwaitExperimentResults => "Awaiting Experiment Results",
            LoopPhase::AppendData => "Appending Data",
            LoopPhase::CheckStop => "Checking Stop Condition",
            LoopPhase::Done => "Done",
        }
    }
}

/// What one iteration proposed and what came back.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub step: u64,
    pub closed_cells: usize,
    pub open_cells: usize,
    pub candidates: Vec<Candidate>,
    pub rows_received: usize,
    /// Proposed cells with no matching row in the returned batch. They are not
    /// proposed again.
    pub unanswered: Vec<CanonicalKey>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CampaignOutcome {
    /// A row received at `step` measured `value`, within tolerance of the target.
    TargetReached { step: u64, row: usize, value: f64 },
    /// `steps` iterations ran without hitting the target.
    BudgetExhausted { steps: u64 },
    /// Ranking produced no candidates at `step`; nothing is left to try.
    OpenSetExhausted { step: u64 },
}

impl CampaignOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CampaignOutcome::TargetReached { .. })
    }
}
