//! Tallies a poll's votes into the display model.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;

use crate::models::{OptionId, Poll, PollId, PollOption, UserId, Vote};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateError {
    #[error("Poll has no options to tally")]
    NoOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionTally {
    pub option: PollOption,
    pub votes: u64,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResult {
    pub poll_id: PollId,
    /// Most votes first; ties keep the poll's option order.
    pub options: Vec<OptionTally>,
    pub total_votes: u64,
    pub unique_voters: u64,
    pub leading_option_id: Option<OptionId>,
}

pub fn aggregate(
    poll: &Poll,
    options: &[PollOption],
    votes: &[Vote],
) -> Result<AggregatedResult, AggregateError> {
    if options.is_empty() {
        return Err(AggregateError::NoOptions);
    }

    let mut counts: HashMap<&OptionId, u64> = options.iter().map(|o| (&o.id, 0)).collect();
    let mut voters: HashSet<&UserId> = HashSet::new();
    let mut total_votes = 0u64;

    // votes for options we no longer know about are dropped, not reported
    for vote in votes.iter().filter(|v| v.poll_id == poll.id) {
        if let Some(count) = counts.get_mut(&vote.option_id) {
            *count += 1;
            total_votes += 1;
            voters.insert(&vote.user_id);
        }
    }

    let mut tallies: Vec<OptionTally> = options
        .iter()
        .map(|option| {
            let votes = counts.get(&option.id).copied().unwrap_or_default();
            OptionTally {
                option: option.clone(),
                votes,
                percentage: percentage(votes, total_votes),
            }
        })
        .collect();

    // sort_by is stable, which is what keeps ties in option order
    tallies.sort_by(|a, b| b.votes.cmp(&a.votes));

    let leading_option_id = if total_votes > 0 {
        tallies.first().map(|t| t.option.id.clone())
    } else {
        None
    };

    Ok(AggregatedResult {
        poll_id: poll.id.clone(),
        options: tallies,
        total_votes,
        unique_voters: voters.len() as u64,
        leading_option_id,
    })
}

/// `round(100 * count / total)`, halves rounded up, 0 for an empty poll.
/// Options are rounded independently, so the column may add up to 99 or 101.
fn percentage(count: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((200 * count + total) / (2 * total)) as u32
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn user(name: &str) -> UserId {
        UserId::parse(name).unwrap()
    }

    fn poll_with(texts: &[&str]) -> (Poll, Vec<PollOption>) {
        let poll = Poll::new(PollId::generate(), "Best editor", user("owner"), Utc::now()).unwrap();
        let options = texts
            .iter()
            .map(|t| PollOption::new(OptionId::generate(), poll.id.clone(), t).unwrap())
            .collect();
        (poll, options)
    }

    fn vote(poll: &Poll, option: &PollOption, who: &str) -> Vote {
        Vote::cast(poll, option, user(who), Utc::now()).unwrap()
    }

    fn summary(result: &AggregatedResult) -> Vec<(&str, u64, u32)> {
        result
            .options
            .iter()
            .map(|t| (t.option.text.as_str(), t.votes, t.percentage))
            .collect()
    }

    #[test]
    fn three_voters_over_three_options() {
        let (poll, options) = poll_with(&["A", "B", "C"]);
        let votes = vec![
            vote(&poll, &options[0], "user1"),
            vote(&poll, &options[0], "user2"),
            vote(&poll, &options[1], "user3"),
        ];

        let result = aggregate(&poll, &options, &votes).unwrap();

        assert_eq!(summary(&result), vec![("A", 2, 67), ("B", 1, 33), ("C", 0, 0)]);
        assert_eq!(result.total_votes, 3);
        assert_eq!(result.unique_voters, 3);
        assert_eq!(result.leading_option_id, Some(options[0].id.clone()));
    }

    #[test]
    fn empty_poll_has_zero_percentages_and_no_leader() {
        let (poll, options) = poll_with(&["A", "B", "C"]);
        let result = aggregate(&poll, &options, &[]).unwrap();

        assert_eq!(summary(&result), vec![("A", 0, 0), ("B", 0, 0), ("C", 0, 0)]);
        assert_eq!(result.total_votes, 0);
        assert_eq!(result.unique_voters, 0);
        assert_eq!(result.leading_option_id, None);
    }

    #[test]
    fn no_options_is_an_error() {
        let (poll, _) = poll_with(&[]);
        assert_eq!(aggregate(&poll, &[], &[]), Err(AggregateError::NoOptions));
    }

    #[test]
    fn ties_keep_option_order() {
        let (poll, options) = poll_with(&["A", "B", "C", "D"]);
        let votes = vec![
            vote(&poll, &options[3], "u1"),
            vote(&poll, &options[1], "u2"),
            vote(&poll, &options[3], "u3"),
            vote(&poll, &options[1], "u4"),
        ];

        let result = aggregate(&poll, &options, &votes).unwrap();

        assert_eq!(
            summary(&result),
            vec![("B", 2, 50), ("D", 2, 50), ("A", 0, 0), ("C", 0, 0)]
        );
        assert_eq!(result.leading_option_id, Some(options[1].id.clone()));
    }

    #[test]
    fn unknown_options_are_ignored_everywhere() {
        let (poll, options) = poll_with(&["A", "B"]);
        let (other_poll, other_options) = poll_with(&["X", "Y"]);
        let mut orphan = vote(&poll, &options[0], "ghost");
        orphan.option_id = OptionId::generate();

        let votes = vec![
            vote(&poll, &options[1], "u1"),
            orphan,
            vote(&other_poll, &other_options[0], "u2"),
        ];

        let result = aggregate(&poll, &options, &votes).unwrap();
        let counted: u64 = result.options.iter().map(|t| t.votes).sum();

        assert_eq!(result.total_votes, 1);
        assert_eq!(counted, result.total_votes);
        assert_eq!(result.unique_voters, 1);
        assert_eq!(summary(&result), vec![("B", 1, 100), ("A", 0, 0)]);
    }

    #[test]
    fn unique_voters_counts_people_not_votes() {
        let (poll, options) = poll_with(&["X", "Y", "Z"]);
        let votes = vec![
            vote(&poll, &options[0], "user1"),
            vote(&poll, &options[1], "user1"),
            vote(&poll, &options[2], "user2"),
        ];
        let result = aggregate(&poll, &options, &votes).unwrap();
        assert_eq!(result.total_votes, 3);
        assert_eq!(result.unique_voters, 2);
    }

    #[test]
    fn aggregation_is_deterministic() {
        let (poll, options) = poll_with(&["A", "B", "C"]);
        let votes: Vec<Vote> = (0..7)
            .map(|i| vote(&poll, &options[i % 3], &format!("user{i}")))
            .collect();
        let first = aggregate(&poll, &options, &votes).unwrap();
        let second = aggregate(&poll, &options, &votes).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rounding_is_half_up_and_not_normalised() {
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(3, 8), 38);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(0, 0), 0);
        // 3 x 33 leaves the column at 99
        assert_eq!(3 * percentage(1, 3), 99);
        // 1/6 + 1/6 + 4/6 rounds to 17 + 17 + 67
        assert_eq!(percentage(1, 6) * 2 + percentage(4, 6), 101);
    }
}
