// ai
//! 🔄 Normalize: the batch transform from [`RawPost`] soup to a [`PostTable`].
//!
//! 🎬 COLD OPEN. INT. DATA JANITOR'S CLOSET. 12:03 AM
//!
//! Two hundred posts arrive. Forty say `edited: false`. Twelve say `edited: true`.
//! Three say `edited: 1700000100.0`, which is neither, and which is also a
//! perfectly valid way for Reddit to say "yes, at this exact second".
//! The janitor sighs, counts the bools, and hands the floats the majority vote.
//!
//! That vote is why this is a *batch* transform and not a per-record one:
//! the fallback for a non-boolean `edited` depends on every other row.
//!
//! 🧠 Knowledge graph:
//! - Pure: no network, no disk. Same batch in, same table out.
//! - Per-field rules live in `coerce.rs`.
//! - The `edited` fallback is [`edited_fallback`]: the mode of the boolean
//!   entries, first-seen wins a tie, `false` when there are no booleans at all.

use serde_json::Value;
use tracing::debug;

use super::coerce;
use crate::common::{NormalizedPost, PostTable, RawPost};

/// 🔄 Normalize one run's batch into the fixed-column table, preserving order.
pub fn normalize(batch: &[RawPost]) -> PostTable {
    let the_majority_vote = edited_fallback(batch);
    debug!(
        "🔄 normalizing {} posts, non-boolean `edited` values will become {}",
        batch.len(),
        the_majority_vote
    );

    let rows = batch
        .iter()
        .map(|raw| normalize_post(raw, the_majority_vote))
        .collect();

    PostTable::new(rows)
}

fn normalize_post(raw: &RawPost, edited_fallback: bool) -> NormalizedPost {
    NormalizedPost {
        id: coerce::text(&raw.id),
        title: coerce::text(&raw.title),
        score: coerce::integer("score", &raw.score),
        num_comments: coerce::integer("num_comments", &raw.num_comments),
        author: coerce::text(&raw.author),
        created_utc: coerce::timestamp(&raw.created_utc),
        url: coerce::text(&raw.url),
        over_18: coerce::truthy(&raw.over_18),
        // -- only a real JSON bool is trusted. edit timestamps take the batch vote.
        edited: match raw.edited {
            Value::Bool(b) => b,
            _ => edited_fallback,
        },
        spoiler: coerce::truthy(&raw.spoiler),
        stickied: coerce::truthy(&raw.stickied),
    }
}

/// 🗳️ The statistical mode of the boolean-valued `edited` entries in the batch.
///
/// Ties go to whichever value showed up first in batch order. A batch with no
/// boolean entries at all (including the empty batch) falls back to `false`.
pub fn edited_fallback(batch: &[RawPost]) -> bool {
    let mut the_trues = 0usize;
    let mut the_falses = 0usize;
    let mut the_first_seen: Option<bool> = None;

    for raw in batch {
        if let Value::Bool(b) = raw.edited {
            if b {
                the_trues += 1;
            } else {
                the_falses += 1;
            }
            the_first_seen.get_or_insert(b);
        }
    }

    match the_trues.cmp(&the_falses) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        // -- a tie, or nobody voted. first to the polls wins; no polls means false.
        std::cmp::Ordering::Equal => the_first_seen.unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawPost {
        serde_json::from_value(value).expect("💀 test fixture should deserialize")
    }

    fn edited_only(values: &[serde_json::Value]) -> Vec<RawPost> {
        values
            .iter()
            .map(|v| raw(json!({ "edited": v })))
            .collect()
    }

    #[test]
    fn the_one_where_post_b_inherits_the_majority_opinion() {
        // 🧪 The two-post scenario: A is clean, B has an edit timestamp.
        let the_batch = vec![
            raw(json!({
                "title": "A", "over_18": 0, "edited": false, "author": "u1",
                "score": "5", "num_comments": "2", "created_utc": 1700000000
            })),
            raw(json!({
                "title": "B", "over_18": 1, "edited": 1700000100, "author": "u2",
                "score": "9", "num_comments": "0", "created_utc": 1700000050
            })),
        ];

        let the_table = normalize(&the_batch);
        assert_eq!(the_table.len(), 2);

        let the_a = &the_table.rows[0];
        assert_eq!(the_a.title, "A");
        assert!(!the_a.over_18);
        assert!(!the_a.edited);
        assert_eq!(the_a.score, 5);
        assert_eq!(the_a.num_comments, 2);
        assert_eq!(the_a.author, "u1");
        assert_eq!(
            the_a.created_utc.map(|ts| ts.timestamp()),
            Some(1_700_000_000)
        );

        let the_b = &the_table.rows[1];
        assert_eq!(the_b.title, "B");
        assert!(the_b.over_18);
        assert!(!the_b.edited, "B's timestamp should take the batch's majority: false");
        assert_eq!(the_b.score, 9);
        assert_eq!(the_b.num_comments, 0);
    }

    #[test]
    fn the_one_where_the_vote_is_not_rigged_toward_true() {
        // -- an edit timestamp means "edited", but the rule is the majority, not `true`
        let the_batch = edited_only(&[json!(false), json!(false), json!(true), json!(1.7e9)]);
        let the_table = normalize(&the_batch);
        assert!(!the_table.rows[3].edited);

        let the_batch = edited_only(&[json!(true), json!(true), json!(false), json!(1.7e9)]);
        let the_table = normalize(&the_batch);
        assert!(the_table.rows[3].edited);
    }

    #[test]
    fn the_one_where_ties_go_to_whoever_showed_up_first() {
        let the_batch = edited_only(&[json!(1.7e9), json!(true), json!(false)]);
        assert!(edited_fallback(&the_batch));

        let the_batch = edited_only(&[json!(false), json!(1.7e9), json!(true)]);
        assert!(!edited_fallback(&the_batch));
    }

    #[test]
    fn the_one_where_nobody_voted_and_false_wins_by_default() {
        assert!(!edited_fallback(&[]));
        assert!(normalize(&[]).is_empty());

        let the_batch = edited_only(&[json!(1.7e9), json!(null), json!("yes")]);
        let the_table = normalize(&the_batch);
        assert!(the_table.rows.iter().all(|row| !row.edited));
    }

    #[test]
    fn the_one_where_over_18_only_ever_speaks_boolean() {
        let the_values = [json!(0), json!(1), json!(null), json!("nsfw"), json!(true)];
        let the_batch: Vec<RawPost> = the_values
            .into_iter()
            .map(|v| raw(json!({ "over_18": v, "spoiler": v, "stickied": v })))
            .collect();

        let the_flags: Vec<bool> = normalize(&the_batch)
            .rows
            .iter()
            .map(|row| row.over_18)
            .collect();
        assert_eq!(the_flags, vec![false, true, false, true, true]);

        let the_table = normalize(&the_batch);
        assert!(
            the_table
                .rows
                .iter()
                .all(|row| row.over_18 == row.spoiler && row.spoiler == row.stickied)
        );
    }

    #[test]
    fn the_one_where_order_is_preserved_like_a_museum_exhibit() {
        let the_batch: Vec<RawPost> = (0..5)
            .map(|i| raw(json!({ "id": format!("p{i}"), "score": i })))
            .collect();
        let the_ids: Vec<String> = normalize(&the_batch).rows.into_iter().map(|r| r.id).collect();
        assert_eq!(the_ids, vec!["p0", "p1", "p2", "p3", "p4"]);
    }

    #[test]
    fn the_one_where_the_same_batch_always_gives_the_same_table() {
        let the_batch = edited_only(&[json!(true), json!(1.7e9), json!(false), json!(true)]);
        assert_eq!(normalize(&the_batch), normalize(&the_batch));
    }
}
