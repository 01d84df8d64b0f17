use std::collections::HashSet;

use serde::{Deserialize, Deserializer, de};

/// One entry of the reasoning model's structured answer, before validation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelPick {
	#[serde(deserialize_with = "id_from_string_or_number")]
	pub id: String,
	#[serde(default)]
	pub rank: Option<u32>,
	pub explanation: String,
}

/// A validated pick with its final 1-based position.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RankedExplanation {
	pub id: String,
	pub rank: u32,
	pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
	UnknownId,
	DuplicateId,
	EmptyExplanation,
}

#[derive(Debug, Default)]
pub struct PickSelection {
	pub ranked: Vec<RankedExplanation>,
	pub discarded: Vec<(String, DiscardReason)>,
}

/// Validates model picks against the candidate set and assigns contiguous ranks.
///
/// Picks are ordered by the model's `rank`; unranked picks follow the ranked ones and ties keep
/// the model's order. The output ranks are exactly `1..=n` with `n <= max`.
pub fn select_picks(picks: Vec<ModelPick>, known_ids: &HashSet<&str>, max: usize) -> PickSelection {
	let mut selection = PickSelection::default();
	let mut seen = HashSet::new();
	let mut accepted = Vec::new();

	for (position, pick) in picks.into_iter().enumerate() {
		let id = pick.id.trim().to_string();
		let explanation = pick.explanation.trim().to_string();

		if !known_ids.contains(id.as_str()) {
			selection.discarded.push((id, DiscardReason::UnknownId));

			continue;
		}
		if seen.contains(&id) {
			selection.discarded.push((id, DiscardReason::DuplicateId));

			continue;
		}
		if explanation.is_empty() {
			selection.discarded.push((id, DiscardReason::EmptyExplanation));

			continue;
		}

		seen.insert(id.clone());
		accepted.push((pick.rank.unwrap_or(u32::MAX), position, id, explanation));
	}

	accepted.sort_by_key(|(rank, position, _, _)| (*rank, *position));

	selection.ranked = accepted
		.into_iter()
		.take(max)
		.enumerate()
		.map(|(index, (_, _, id, explanation))| RankedExplanation {
			id,
			rank: index as u32 + 1,
			explanation,
		})
		.collect();

	selection
}

pub fn ranks_are_contiguous(ranked: &[RankedExplanation]) -> bool {
	ranked.iter().enumerate().all(|(index, item)| item.rank == index as u32 + 1)
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum RawId {
		Text(String),
		Unsigned(u64),
		Signed(i64),
	}

	match RawId::deserialize(deserializer) {
		Ok(RawId::Text(text)) => Ok(text),
		Ok(RawId::Unsigned(value)) => Ok(value.to_string()),
		Ok(RawId::Signed(value)) => Ok(value.to_string()),
		Err(_) => Err(de::Error::custom("pick id must be a string or an integer")),
	}
}
