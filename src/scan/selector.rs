//! Reaction-based candidate ranking and download selection.

use std::collections::HashSet;

use crate::error::Result;
use crate::media::resolve_group_members;
use crate::scan::scanner::CandidateMessage;
use crate::session::{ChatMeta, ChatSession};

/// The download-cap-adjusted set of messages to process for media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// How many counted units (singletons or whole albums) were accepted.
    pub entry_count: usize,
    /// Every message id to touch for media, in acceptance order.
    pub message_ids: Vec<i64>,
}

/// Sort candidates by reaction count, highest first.
///
/// The sort is stable over the chronological scan order, so equal counts
/// keep their ascending-id relative order. That tie-break is documented
/// behavior, not an accident.
pub fn rank_candidates(candidates: &mut [CandidateMessage]) {
    candidates.sort_by(|a, b| b.reaction_count.cmp(&a.reaction_count));
}

/// Walk the ranked list and apply the optional download cap.
///
/// Without a limit every candidate is selected. With a limit of N, albums
/// count as a single entry: an uncovered grouped message pulls in its whole
/// group, so the processed-id set can exceed N members even though exactly N
/// entries are counted. A group that fails to resolve is accepted as a
/// singleton rather than aborting the run.
pub async fn select_for_download(
    session: &dyn ChatSession,
    chat: &ChatMeta,
    ranked: &[CandidateMessage],
    limit: Option<usize>,
    group_radius: i64,
) -> Result<Selection> {
    let Some(limit) = limit else {
        return Ok(Selection {
            entry_count: ranked.len(),
            message_ids: ranked.iter().map(|c| c.id).collect(),
        });
    };

    let mut covered: HashSet<i64> = HashSet::new();
    let mut message_ids: Vec<i64> = Vec::new();
    let mut entry_count = 0usize;

    for candidate in ranked {
        if entry_count == limit {
            break;
        }
        if covered.contains(&candidate.id) {
            continue;
        }

        let mut accepted: Vec<i64> = match candidate.media_group_id {
            None => vec![candidate.id],
            Some(group_id) => {
                match resolve_group_members(session, chat, candidate.id, group_id, group_radius)
                    .await
                {
                    Ok(members) if !members.is_empty() => {
                        members.iter().map(|m| m.id).collect()
                    }
                    Ok(_) => vec![candidate.id],
                    Err(e) => {
                        tracing::warn!(
                            "Resolving group {} for message {} failed, keeping it as a singleton: {}",
                            group_id,
                            candidate.id,
                            e
                        );
                        vec![candidate.id]
                    }
                }
            }
        };
        if !accepted.contains(&candidate.id) {
            accepted.push(candidate.id);
        }

        covered.extend(accepted.iter().copied());
        message_ids.extend(accepted);
        entry_count += 1;
    }

    tracing::debug!(
        "Selected {} entr(ies) covering {} message(s)",
        entry_count,
        message_ids.len()
    );

    Ok(Selection {
        entry_count,
        message_ids,
    })
}
