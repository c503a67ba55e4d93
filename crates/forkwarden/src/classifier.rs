//! Splits an owner listing into forks to act on, archived forks and the rest.

use crate::entities::Repository;

/// How reconciliation treats a listed repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Live fork; goes through the ledger check and the action.
    Candidate,
    /// Archived fork; recorded as skipped, never acted on.
    Archived,
    /// Not a fork; never ledgered.
    NotAFork,
}

impl Disposition {
    pub fn of(repo: &Repository) -> Self {
        match (repo.fork, repo.archived) {
            (false, _) => Self::NotAFork,
            (true, true) => Self::Archived,
            (true, false) => Self::Candidate,
        }
    }
}

/// Owner listing with a disposition per repository, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    items: Vec<(Disposition, Repository)>,
}

impl Classification {
    pub fn candidates(&self) -> impl Iterator<Item = &Repository> {
        self.with(Disposition::Candidate)
    }

    pub fn archived(&self) -> impl Iterator<Item = &Repository> {
        self.with(Disposition::Archived)
    }

    pub fn non_forks(&self) -> impl Iterator<Item = &Repository> {
        self.with(Disposition::NotAFork)
    }

    /// Candidates and archived forks interleaved as the listing returned them.
    pub fn forks(&self) -> impl Iterator<Item = (Disposition, &Repository)> {
        self.items
            .iter()
            .filter(|(d, _)| *d != Disposition::NotAFork)
            .map(|(d, repo)| (*d, repo))
    }

    pub fn count(&self, disposition: Disposition) -> usize {
        self.items.iter().filter(|(d, _)| *d == disposition).count()
    }

    fn with(&self, disposition: Disposition) -> impl Iterator<Item = &Repository> {
        self.items
            .iter()
            .filter(move |(d, _)| *d == disposition)
            .map(|(_, repo)| repo)
    }
}

/// Classify every repository of an owner listing.
pub fn classify(repositories: Vec<Repository>) -> Classification {
    Classification {
        items: repositories
            .into_iter()
            .map(|repo| (Disposition::of(&repo), repo))
            .collect(),
    }
}
