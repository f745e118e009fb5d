//! Host reshuffling.

use rand::seq::SliceRandom;

use crate::selector::SelectError;

/// Uniformly permute the preference-ordered host list.
///
/// Selectors emit hosts best-first; handing that order straight to the
/// replication layer would always make the highest-scoring node the primary
/// of the group and concentrate write load there. Every selector therefore
/// reshuffles before returning.
///
/// # Errors
///
/// [`SelectError::EmptyReshuffle`] if `hosts` is empty.
pub fn reshuffle_hosts(mut hosts: Vec<String>) -> Result<Vec<String>, SelectError> {
    if hosts.is_empty() {
        return Err(SelectError::EmptyReshuffle);
    }
    hosts.shuffle(&mut rand::thread_rng());
    Ok(hosts)
}
