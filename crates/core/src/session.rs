//! Live event session: the current teams and their scores.
//!
//! Score operations are only meaningful once teams exist, so the session is
//! a two-state machine. Forming teams always resets the scoreboard.

use rand::Rng;
use rust_decimal::Decimal;

use crate::errors::DomainError;
use crate::scores::{ScoreBoard, TeamScore};
use crate::teams::{self, Team};

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    NoTeams,
    TeamsFormed { teams: Vec<Team>, scores: ScoreBoard },
}

#[derive(Clone, Debug, Default)]
pub struct TriviaSession {
    state: SessionState,
}

impl TriviaSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn form_teams<R>(
        &mut self,
        team_count: usize,
        names: &[String],
        rng: &mut R,
    ) -> Result<&[Team], DomainError>
    where
        R: Rng + ?Sized,
    {
        let teams = teams::partition(team_count, names, rng)?;
        let scores = ScoreBoard::zeroed(teams.len());
        self.state = SessionState::TeamsFormed { teams, scores };
        self.teams()
    }

    pub fn teams(&self) -> Result<&[Team], DomainError> {
        match &self.state {
            SessionState::TeamsFormed { teams, .. } => Ok(teams),
            SessionState::NoTeams => Err(DomainError::NoTeamsFormed),
        }
    }

    pub fn set_scores(&mut self, values: &[Decimal]) -> Result<Vec<TeamScore>, DomainError> {
        let board = self.board_mut()?;
        board.set_scores(values)?;
        Ok(board.show_scores())
    }

    pub fn add_scores(&mut self, deltas: &[Decimal]) -> Result<Vec<TeamScore>, DomainError> {
        let board = self.board_mut()?;
        board.add_scores(deltas)?;
        Ok(board.show_scores())
    }

    pub fn show_scores(&self) -> Result<Vec<TeamScore>, DomainError> {
        match &self.state {
            SessionState::TeamsFormed { scores, .. } => Ok(scores.show_scores()),
            SessionState::NoTeams => Err(DomainError::NoTeamsFormed),
        }
    }

    fn board_mut(&mut self) -> Result<&mut ScoreBoard, DomainError> {
        match &mut self.state {
            SessionState::TeamsFormed { scores, .. } => Ok(scores),
            SessionState::NoTeams => Err(DomainError::NoTeamsFormed),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal::Decimal;

    use super::{SessionState, TriviaSession};
    use crate::errors::DomainError;

    fn names(count: usize) -> Vec<String> {
        (1..=count).map(|n| format!("player-{n}")).collect()
    }

    fn scores(raw: &[i64]) -> Vec<Decimal> {
        raw.iter().map(|value| Decimal::from(*value)).collect()
    }

    #[test]
    fn score_operations_require_teams() {
        let mut session = TriviaSession::new();

        assert_eq!(session.show_scores(), Err(DomainError::NoTeamsFormed));
        assert_eq!(session.add_scores(&scores(&[1, 2])), Err(DomainError::NoTeamsFormed));
        assert_eq!(session.set_scores(&scores(&[1, 2])), Err(DomainError::NoTeamsFormed));
        assert_eq!(session.teams().map(<[_]>::len), Err(DomainError::NoTeamsFormed));
        assert_eq!(session.state(), &SessionState::NoTeams);
    }

    #[test]
    fn forming_teams_initialises_zero_scores() {
        let mut session = TriviaSession::new();
        let formed = session
            .form_teams(3, &names(7), &mut StdRng::seed_from_u64(9))
            .expect("form teams")
            .len();

        assert_eq!(formed, 3);
        let totals: Vec<Decimal> =
            session.show_scores().expect("scores").into_iter().map(|entry| entry.score).collect();
        assert_eq!(totals, vec![Decimal::ZERO; 3]);
    }

    #[test]
    fn reforming_teams_resets_scores() {
        let mut session = TriviaSession::new();
        let mut rng = StdRng::seed_from_u64(1);
        session.form_teams(2, &names(4), &mut rng).expect("first teams");
        session.add_scores(&scores(&[5, 3])).expect("add");

        session.form_teams(3, &names(6), &mut rng).expect("second teams");

        let totals: Vec<Decimal> =
            session.show_scores().expect("scores").into_iter().map(|entry| entry.score).collect();
        assert_eq!(totals, vec![Decimal::ZERO; 3]);
    }

    #[test]
    fn failed_team_formation_keeps_previous_session() {
        let mut session = TriviaSession::new();
        let mut rng = StdRng::seed_from_u64(2);
        session.form_teams(2, &names(4), &mut rng).expect("teams");
        session.set_scores(&scores(&[10, 12])).expect("set");

        let error = session.form_teams(5, &names(3), &mut rng).expect_err("too few players");

        assert!(matches!(error, DomainError::InsufficientParticipants { .. }));
        assert_eq!(session.teams().expect("teams").len(), 2);
        let totals: Vec<Decimal> =
            session.show_scores().expect("scores").into_iter().map(|entry| entry.score).collect();
        assert_eq!(totals, scores(&[10, 12]));
    }

    #[test]
    fn add_and_set_validate_against_team_count() {
        let mut session = TriviaSession::new();
        session.form_teams(2, &names(5), &mut StdRng::seed_from_u64(4)).expect("teams");

        session.set_scores(&scores(&[0, 0])).expect("set");
        let after_add = session.add_scores(&scores(&[1, 2])).expect("add");
        assert_eq!(after_add.iter().map(|entry| entry.score).collect::<Vec<_>>(), scores(&[1, 2]));

        let error = session.add_scores(&scores(&[1])).expect_err("mismatch");
        assert_eq!(error, DomainError::ScoreCountMismatch { expected: 2, actual: 1 });
    }
}
