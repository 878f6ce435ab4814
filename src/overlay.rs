use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::model::{Comment, CommentId};

/// How the scheduler spreads comments across lanes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanePolicy {
    /// Lane `i % lanes` for the `i`-th comment, at most one entry per lane
    /// per pass. The classic danmaku striping.
    #[default]
    Striped,
    /// Places the whole backlog on whichever lane frees up first, deferring
    /// each start until its lane is clear.
    EarliestFree,
}

/// Tunables for one layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    pub lanes: usize,
    /// Minimum time an entry stays on screen.
    pub base_duration: Duration,
    /// Upper bound of the random extension added to `base_duration`.
    pub jitter: Duration,
    /// Gap between consecutive entry starts.
    pub stagger: Duration,
    pub policy: LanePolicy,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            lanes: 5,
            base_duration: Duration::from_secs(6),
            jitter: Duration::from_secs(4),
            stagger: Duration::from_millis(1500),
            policy: LanePolicy::Striped,
        }
    }
}

/// One comment placed on the overlay timeline. Delays and durations travel
/// as integer milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayEvent {
    pub comment_id: CommentId,
    pub lane: usize,
    #[serde(with = "duration_millis")]
    pub start_delay: Duration,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    pub text: String,
}

/// Lays out `comments` (newest first) on the overlay timeline.
///
/// [`LanePolicy::Striped`] takes at most `lanes` entries from the head and
/// stripes them round-robin. [`LanePolicy::EarliestFree`] keeps the whole
/// backlog and never overlaps two entries in one lane. Start delays are
/// non-decreasing under both policies.
pub fn layout(comments: &[Comment], params: &LayoutParams, rng: &mut impl Rng) -> Vec<OverlayEvent> {
    if params.lanes == 0 {
        return Vec::new();
    }

    let window = match params.policy {
        LanePolicy::Striped => &comments[..comments.len().min(params.lanes)],
        LanePolicy::EarliestFree => comments,
    };

    let mut free_at = vec![Duration::ZERO; params.lanes];

    window
        .iter()
        .enumerate()
        .map(|(index, comment)| {
            let duration = params.base_duration + jitter(params.jitter, rng);
            let entry_delay = params.stagger * index as u32;

            let (lane, start_delay) = match params.policy {
                LanePolicy::Striped => (index % params.lanes, entry_delay),
                LanePolicy::EarliestFree => {
                    let lane = earliest_free_lane(&free_at);
                    let start_delay = entry_delay.max(free_at[lane]);
                    free_at[lane] = start_delay + duration;

                    (lane, start_delay)
                }
            };

            OverlayEvent {
                comment_id: comment.id.clone(),
                lane,
                start_delay,
                duration,
                text: comment.text.clone(),
            }
        })
        .collect()
}

fn earliest_free_lane(free_at: &[Duration]) -> usize {
    free_at
        .iter()
        .enumerate()
        .min_by_key(|(_, at)| **at)
        .map(|(lane, _)| lane)
        .unwrap_or(0)
}

fn jitter(range: Duration, rng: &mut impl Rng) -> Duration {
    if range.is_zero() {
        return Duration::ZERO;
    }

    Duration::from_millis(rng.gen_range(0..range.as_millis() as u64))
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;

        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn backlog(count: usize) -> Vec<Comment> {
        (0..count)
            .map(|index| {
                Comment::new(
                    format!("u{index}"),
                    format!("Viewer {index}"),
                    format!("comment {index}"),
                )
            })
            .collect()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn no_comments_means_an_empty_timeline() {
        let events = layout(&[], &LayoutParams::default(), &mut rng());

        assert!(events.is_empty());
    }

    #[test]
    fn zero_lanes_means_an_empty_timeline() {
        let params = LayoutParams {
            lanes: 0,
            ..LayoutParams::default()
        };

        let events = layout(&backlog(3), &params, &mut rng());

        assert!(events.is_empty());
    }

    #[test]
    fn striped_assigns_lanes_round_robin() {
        let params = LayoutParams {
            lanes: 3,
            ..LayoutParams::default()
        };

        let events = layout(&backlog(3), &params, &mut rng());

        for (index, event) in events.iter().enumerate() {
            assert_eq!(event.lane, index % 3);
        }
    }

    #[test]
    fn striped_shows_only_the_head_of_the_backlog() {
        let comments = backlog(8);
        let events = layout(&comments, &LayoutParams::default(), &mut rng());

        assert_eq!(events.len(), 5, "one entry per lane at most");

        for (event, comment) in events.iter().zip(&comments) {
            assert_eq!(event.comment_id, comment.id);
            assert_eq!(event.text, comment.text);
        }
    }

    #[test]
    fn start_delays_step_by_the_stagger() {
        let events = layout(&backlog(4), &LayoutParams::default(), &mut rng());

        for (index, event) in events.iter().enumerate() {
            assert_eq!(
                event.start_delay,
                Duration::from_millis(1500) * index as u32,
                "entry {index} must start one stagger after its predecessor"
            );
        }
    }

    #[test]
    fn durations_stay_inside_the_jitter_window() {
        let params = LayoutParams::default();
        let events = layout(&backlog(5), &params, &mut rng());

        for event in events {
            assert!(event.duration >= params.base_duration);
            assert!(event.duration < params.base_duration + params.jitter);
        }
    }

    #[test]
    fn zero_jitter_means_exact_base_duration() {
        let params = LayoutParams {
            jitter: Duration::ZERO,
            ..LayoutParams::default()
        };

        let events = layout(&backlog(5), &params, &mut rng());

        for event in events {
            assert_eq!(event.duration, params.base_duration);
        }
    }

    #[test]
    fn the_same_seed_reproduces_the_same_timeline() {
        let comments = backlog(5);

        let first = layout(&comments, &LayoutParams::default(), &mut rng());
        let second = layout(&comments, &LayoutParams::default(), &mut rng());

        assert_eq!(first, second);
    }

    #[test]
    fn earliest_free_lays_out_the_whole_backlog() {
        let params = LayoutParams {
            policy: LanePolicy::EarliestFree,
            ..LayoutParams::default()
        };

        let events = layout(&backlog(12), &params, &mut rng());

        assert_eq!(events.len(), 12, "earliest-free does not drop the overflow");
        assert!(events.iter().all(|event| event.lane < params.lanes));
    }

    #[test]
    fn earliest_free_never_overlaps_two_entries_in_one_lane() {
        let params = LayoutParams {
            lanes: 2,
            stagger: Duration::from_millis(100),
            policy: LanePolicy::EarliestFree,
            ..LayoutParams::default()
        };

        let events = layout(&backlog(9), &params, &mut rng());
        let mut lane_free_at = vec![Duration::ZERO; params.lanes];

        for event in events {
            assert!(
                event.start_delay >= lane_free_at[event.lane],
                "an entry may not start while its lane is still occupied"
            );
            lane_free_at[event.lane] = event.start_delay + event.duration;
        }
    }

    #[test]
    fn start_delays_never_decrease() {
        for policy in [LanePolicy::Striped, LanePolicy::EarliestFree] {
            let params = LayoutParams {
                lanes: 3,
                policy,
                ..LayoutParams::default()
            };

            let events = layout(&backlog(10), &params, &mut rng());

            for pair in events.windows(2) {
                assert!(
                    pair[0].start_delay <= pair[1].start_delay,
                    "entries must enter the screen in order under {policy:?}"
                );
            }
        }
    }

    #[test]
    fn events_serialize_delays_as_milliseconds() {
        let params = LayoutParams {
            jitter: Duration::ZERO,
            ..LayoutParams::default()
        };

        let events = layout(&backlog(1), &params, &mut rng());
        let json = serde_json::to_value(&events[0]).expect("serialize event");

        assert_eq!(json["start_delay"], 0);
        assert_eq!(json["duration"], 6000);
    }
}
