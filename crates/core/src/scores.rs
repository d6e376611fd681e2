use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamScore {
    /// 1-based, matching how teams are announced in chat.
    pub team_number: usize,
    pub score: Decimal,
}

/// Running totals, one per team. The board's length is fixed when it is
/// created; every update must supply exactly one value per team.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreBoard {
    scores: Vec<Decimal>,
}

impl ScoreBoard {
    pub fn zeroed(team_count: usize) -> Self {
        Self { scores: vec![Decimal::ZERO; team_count] }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn set_scores(&mut self, values: &[Decimal]) -> Result<(), DomainError> {
        self.check_len(values.len())?;
        self.scores.copy_from_slice(values);
        Ok(())
    }

    /// Adds one delta per team. Nothing is committed unless every sum fits.
    pub fn add_scores(&mut self, deltas: &[Decimal]) -> Result<(), DomainError> {
        self.check_len(deltas.len())?;
        let totals = self
            .scores
            .iter()
            .zip(deltas)
            .enumerate()
            .map(|(index, (score, delta))| {
                score
                    .checked_add(*delta)
                    .ok_or(DomainError::ScoreOverflow { team_number: index + 1 })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.scores = totals;
        Ok(())
    }

    pub fn show_scores(&self) -> Vec<TeamScore> {
        self.scores
            .iter()
            .enumerate()
            .map(|(index, score)| TeamScore { team_number: index + 1, score: *score })
            .collect()
    }

    fn check_len(&self, actual: usize) -> Result<(), DomainError> {
        if actual != self.scores.len() {
            return Err(DomainError::ScoreCountMismatch { expected: self.scores.len(), actual });
        }
        Ok(())
    }
}
