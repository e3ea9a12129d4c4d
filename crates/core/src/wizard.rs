//! Step-by-step estimate wizard.
//!
//! The traversal order is not fixed: the plan question always comes first,
//! the matching model/size question (if any) is inserted second, and the
//! common installation-condition block always trails. The sequence is
//! recomputed from the recorded answers on every query, so revising an
//! earlier answer can never leave a stale order behind.

use crate::catalog::{size_question_for_plan, Catalog, PLAN_QUESTION_ID};
use crate::error::CoreError;
use crate::pricing;
use crate::quote::{Answer, ResolvedAnswer};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Wizard position. `Completed` is terminal; a new traversal means a new
/// [`QuoteWizard`], never a resumed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    NotStarted,
    InProgress(usize),
    Completed,
}

/// The finalized output handed to the quote store on the last `advance`.
#[derive(Debug, Clone)]
pub struct FinalizedQuote {
    pub answers: Vec<ResolvedAnswer>,
    pub base_price: i64,
    pub total_price: i64,
}

// ---------------------------------------------------------------------------
// Wizard
// ---------------------------------------------------------------------------

/// Walks a visitor through the answer-dependent question sequence.
#[derive(Debug, Clone)]
pub struct QuoteWizard {
    catalog: Catalog,
    base_price: i64,
    state: WizardState,
    /// Recorded answers in the order they were first given; at most one per
    /// question id (re-selection overwrites in place).
    answers: Vec<Answer>,
}

impl QuoteWizard {
    pub fn new(catalog: Catalog, base_price: i64) -> Self {
        Self {
            catalog,
            base_price,
            state: WizardState::NotStarted,
            answers: Vec::new(),
        }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// Begin the traversal at the first question.
    pub fn start(&mut self) -> Result<(), CoreError> {
        match self.state {
            WizardState::NotStarted => {
                self.state = WizardState::InProgress(0);
                Ok(())
            }
            _ => Err(CoreError::Validation(
                "Wizard has already been started".to_string(),
            )),
        }
    }

    /// The question identifiers to traverse, recomputed from current answers.
    pub fn question_sequence(&self) -> Vec<String> {
        let mut sequence = vec![PLAN_QUESTION_ID.to_string()];
        if let Some(plan) = self.answer_for(PLAN_QUESTION_ID) {
            if let Some(size_question) = size_question_for_plan(plan.selected_option) {
                sequence.push(size_question.to_string());
            }
        }
        sequence.extend(
            self.catalog
                .common_question_ids()
                .into_iter()
                .map(str::to_string),
        );
        sequence
    }

    /// Identifier of the question at the current step, if in progress.
    pub fn current_question_id(&self) -> Option<String> {
        match self.state {
            WizardState::InProgress(index) => self.question_sequence().get(index).cloned(),
            _ => None,
        }
    }

    /// Whether the current question has a recorded answer.
    pub fn can_proceed(&self) -> bool {
        self.current_question_id()
            .is_some_and(|id| self.answer_for(&id).is_some())
    }

    /// Record an answer for a question. Last write wins; a prior answer for
    /// the same question is overwritten, never duplicated. Changing the plan
    /// drops answers to questions that fell out of the sequence.
    pub fn select_option(
        &mut self,
        question_id: &str,
        option_index: usize,
        custom_value: Option<i64>,
    ) -> Result<(), CoreError> {
        if !matches!(self.state, WizardState::InProgress(_)) {
            return Err(CoreError::Validation(
                "Cannot answer before starting or after completion".to_string(),
            ));
        }
        let question = self.catalog.question(question_id).ok_or_else(|| {
            CoreError::Validation(format!("Unknown question: {question_id}"))
        })?;
        if option_index >= question.options.len() {
            return Err(CoreError::Validation(format!(
                "Option index {option_index} out of bounds for question {question_id}"
            )));
        }

        let answer = Answer {
            question_id: question_id.to_string(),
            selected_option: option_index,
            custom_value,
        };
        match self.answers.iter_mut().find(|a| a.question_id == question_id) {
            Some(existing) => *existing = answer,
            None => self.answers.push(answer),
        }

        self.prune_stale_answers();
        Ok(())
    }

    /// Move to the next step; on the final step, finalize the quote and
    /// transition to `Completed` (reachable exactly once per wizard).
    pub fn advance(&mut self) -> Result<Option<FinalizedQuote>, CoreError> {
        let index = match self.state {
            WizardState::InProgress(index) => index,
            WizardState::NotStarted => {
                return Err(CoreError::Validation("Wizard has not been started".to_string()))
            }
            WizardState::Completed => {
                return Err(CoreError::Validation("Wizard is already completed".to_string()))
            }
        };
        if !self.can_proceed() {
            return Err(CoreError::Validation(
                "Current question has no recorded answer".to_string(),
            ));
        }

        let sequence = self.question_sequence();
        if index + 1 < sequence.len() {
            self.state = WizardState::InProgress(index + 1);
            return Ok(None);
        }

        self.state = WizardState::Completed;
        Ok(Some(self.finalize()))
    }

    /// Step back one question; disallowed below the first step.
    pub fn retreat(&mut self) -> Result<(), CoreError> {
        match self.state {
            WizardState::InProgress(index) if index > 0 => {
                self.state = WizardState::InProgress(index - 1);
                Ok(())
            }
            WizardState::InProgress(_) => Err(CoreError::Validation(
                "Already at the first step".to_string(),
            )),
            _ => Err(CoreError::Validation("Wizard is not in progress".to_string())),
        }
    }

    fn answer_for(&self, question_id: &str) -> Option<&Answer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }

    /// Drop answers for questions no longer reachable in the current
    /// sequence, so a revised plan cannot leave a hidden size-question
    /// contribution in the total.
    fn prune_stale_answers(&mut self) {
        let sequence = self.question_sequence();
        self.answers.retain(|a| sequence.contains(&a.question_id));
        // Clamp the position if pruning shortened the sequence.
        if let WizardState::InProgress(index) = self.state {
            let last = self.question_sequence().len() - 1;
            if index > last {
                self.state = WizardState::InProgress(last);
            }
        }
    }

    fn finalize(&self) -> FinalizedQuote {
        FinalizedQuote {
            answers: pricing::resolve_answers(&self.catalog, &self.answers),
            base_price: self.base_price,
            total_price: pricing::compute_total(&self.catalog, self.base_price, &self.answers),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
