use uuid::Uuid;

use binwise_domain::{
	alias_seed::{AliasSeed, AliasType, generate_aliases},
	normalize::normalize,
	ranking::{RankingParams, SimilarityCandidate, rank_candidates},
	verdict::{self, Verdict},
};

#[test]
fn seed_and_runtime_agree_on_keys() {
	let aliases = generate_aliases("akkus", "de", "Batterie®");

	assert_eq!(aliases[0].alias_norm, normalize("  BATTERIE "));
}

#[test]
fn seed_keeps_one_row_per_alias_across_titles() {
	let mut seed = AliasSeed::new();

	seed.extend(generate_aliases("fruit", "de", "Südfrüchte"));
	seed.extend(generate_aliases("fruit", "de", "Sudfruchte"));
	seed.extend(generate_aliases("peel", "de", "Süd Früchte"));

	let (rows, collisions) = seed.into_parts();
	let mut norms: Vec<&str> = rows.iter().map(|row| row.alias_norm.as_str()).collect();
	let total = norms.len();

	norms.dedup();

	assert_eq!(norms.len(), total);
	assert!(rows.windows(2).all(|pair| pair[0].alias_norm < pair[1].alias_norm));

	// "sudfruchte" is the primary of "fruit" and only the no-space variant of "peel".
	let sudfruchte = rows
		.iter()
		.find(|row| row.alias_norm == "sudfruchte")
		.expect("Expected sudfruchte alias.");

	assert_eq!(sudfruchte.canonical_key, "fruit");
	assert_eq!(sudfruchte.alias_type, AliasType::Primary);
	assert!(
		collisions
			.iter()
			.any(|collision| collision.alias_norm == "sudfruchte" && collision.loser == "peel")
	);
	assert!(collisions.iter().all(|collision| collision.winner != collision.loser));
}

#[test]
fn ranking_respects_configured_limit() {
	let candidates: Vec<SimilarityCandidate> = (1..=6)
		.map(|id| SimilarityCandidate {
			item_id: Uuid::from_u128(id),
			label: format!("Item {id}"),
			similarity: 0.2 + id as f32 * 0.1,
			relevance: 0.0,
		})
		.collect();
	let ranked = rank_candidates(candidates, &RankingParams::default().with_limit(2));

	assert_eq!(ranked.len(), 2);
	assert_eq!(ranked[0].item_id, Uuid::from_u128(6));
	assert_eq!(ranked[1].item_id, Uuid::from_u128(5));
}

#[test]
fn sanitized_provider_reply_is_storable() {
	let verdict = verdict::parse_completion(
		"{\"canonical_key\":\" Pizza_Box \",\"confidence\":1.7,\"labels\":[\"Pizza Box\",\"pizza box\",\"Karton\"],\"notes\":\"greasy\"}",
	)
	.sanitized();

	assert_eq!(
		verdict,
		Verdict {
			canonical_key: Some("pizza_box".to_string()),
			confidence: 1.0,
			labels: vec!["pizza box".to_string(), "karton".to_string()],
			notes: Some("greasy".to_string()),
		}
	);
}
