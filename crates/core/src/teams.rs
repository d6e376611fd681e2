//! Random team formation.
//!
//! The roster is shuffled and then cut into exactly `team_count`
//! contiguous teams. When the roster does not divide evenly, the leading
//! teams each take one extra name, so team sizes never differ by more
//! than one.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::errors::DomainError;

pub const MIN_TEAMS: usize = 2;

pub type Team = Vec<String>;

pub fn partition<R>(
    team_count: usize,
    names: &[String],
    rng: &mut R,
) -> Result<Vec<Team>, DomainError>
where
    R: Rng + ?Sized,
{
    if team_count < MIN_TEAMS || names.len() <= team_count {
        return Err(DomainError::InsufficientParticipants {
            teams: team_count,
            participants: names.len(),
        });
    }

    let mut shuffled = names.to_vec();
    shuffled.shuffle(rng);

    let base = shuffled.len() / team_count;
    let remainder = shuffled.len() % team_count;

    let mut remaining = shuffled.into_iter();
    let teams = (0..team_count)
        .map(|index| {
            let size = if index < remainder { base + 1 } else { base };
            remaining.by_ref().take(size).collect::<Team>()
        })
        .collect();

    Ok(teams)
}
