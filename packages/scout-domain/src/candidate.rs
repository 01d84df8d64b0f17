use std::collections::HashSet;

/// One vector-index hit.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candidate {
	pub id: String,
	pub score: f32,
}

/// Puts raw index hits into the order the pipeline relies on.
///
/// Non-finite scores and blank ids are dropped, duplicate ids keep their best-placed occurrence,
/// and the list is stable-sorted by descending score so equal scores keep the index's order.
pub fn order_candidates(raw: Vec<Candidate>, k: u32) -> Vec<Candidate> {
	let mut kept: Vec<Candidate> = raw
		.into_iter()
		.filter(|candidate| candidate.score.is_finite() && !candidate.id.trim().is_empty())
		.collect();

	kept.sort_by(|a, b| b.score.total_cmp(&a.score));

	let mut seen = HashSet::new();

	kept.retain(|candidate| seen.insert(candidate.id.clone()));
	kept.truncate(k as usize);

	kept
}

pub fn is_non_increasing(candidates: &[Candidate]) -> bool {
	candidates.windows(2).all(|pair| pair[0].score >= pair[1].score)
}
