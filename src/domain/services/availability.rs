use chrono::{Datelike, NaiveDate};

use crate::domain::models::availability::{
    AvailabilityOverride, AvailabilityRule, BlockType, ResolvedInterval,
};

/// Half-open minute range within a single day.
pub type MinuteSpan = (u16, u16);

/// Sorts and coalesces overlapping or touching spans. Zero-length input
/// spans are dropped.
pub fn merge_spans(mut spans: Vec<MinuteSpan>) -> Vec<MinuteSpan> {
    spans.retain(|(s, e)| s < e);
    spans.sort_unstable();

    let mut merged: Vec<MinuteSpan> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some((_, last_end)) if start <= *last_end => {
                if end > *last_end {
                    *last_end = end;
                }
            }
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Removes `block` from every span, splitting or truncating as needed.
/// Spans reduced to zero length disappear rather than degenerate.
pub fn subtract_span(spans: Vec<MinuteSpan>, block: MinuteSpan) -> Vec<MinuteSpan> {
    let (block_start, block_end) = block;
    if block_start >= block_end {
        return spans;
    }

    let mut out = Vec::with_capacity(spans.len() + 1);
    for (start, end) in spans {
        if end <= block_start || start >= block_end {
            out.push((start, end));
            continue;
        }
        if start < block_start {
            out.push((start, block_start));
        }
        if end > block_end {
            out.push((block_end, end));
        }
    }
    out
}

/// True when `[start, end)` lies fully inside a single span.
pub fn contained(spans: &[MinuteSpan], start: u16, end: u16) -> bool {
    spans.iter().any(|&(s, e)| s <= start && end <= e)
}

/// Expands recurring rules plus overrides into the concrete open spans for
/// one trainer on one date. `available` overrides add time (even outside
/// recurring hours); `blocked` overrides subtract from whatever is open, so
/// a blocked range wins when both kinds cover it.
pub fn resolve_day(
    rules: &[AvailabilityRule],
    overrides: &[AvailabilityOverride],
    date: NaiveDate,
) -> Vec<MinuteSpan> {
    let weekday = date.weekday().num_days_from_monday() as i32;

    let mut open: Vec<MinuteSpan> = rules
        .iter()
        .filter(|r| r.day_of_week == weekday)
        .map(|r| (r.start_minute as u16, r.end_minute as u16))
        .collect();

    for o in overrides {
        if o.block_type == BlockType::Available && o.covers(date) {
            open.push(o.minute_window());
        }
    }

    let mut open = merge_spans(open);

    for o in overrides {
        if o.block_type == BlockType::Blocked && o.covers(date) {
            open = subtract_span(open, o.minute_window());
        }
    }

    open
}

/// Resolves every date in the inclusive range. Result intervals are sorted
/// by (date, start) and non-overlapping per date.
pub fn resolve_range(
    rules: &[AvailabilityRule],
    overrides: &[AvailabilityOverride],
    trainer_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<ResolvedInterval> {
    let mut result = Vec::new();
    let mut date = from;
    while date <= to {
        for (start, end) in resolve_day(rules, overrides, date) {
            result.push(ResolvedInterval {
                trainer_id: trainer_id.to_string(),
                date,
                start_minute: start,
                end_minute: end,
            });
        }
        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    result
}

/// Walks the open spans minus already-busy time and returns every start
/// minute at which a session of `duration_minutes` fits, stepped by the
/// same duration.
pub fn enumerate_slot_starts(
    open: &[MinuteSpan],
    busy: &[MinuteSpan],
    duration_minutes: u16,
) -> Vec<u16> {
    if duration_minutes == 0 {
        return Vec::new();
    }

    let mut free = open.to_vec();
    for &b in busy {
        free = subtract_span(free, b);
    }

    let mut starts = Vec::new();
    for (start, end) in free {
        let mut cursor = start;
        while cursor + duration_minutes <= end {
            starts.push(cursor);
            cursor += duration_minutes;
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn rule(day: i32, start: i32, end: i32) -> AvailabilityRule {
        AvailabilityRule::new("t1".into(), day, start, end)
    }

    fn blocked(date: NaiveDate, minutes: Option<(i32, i32)>) -> AvailabilityOverride {
        AvailabilityOverride {
            id: "o1".into(),
            trainer_id: "t1".into(),
            block_type: BlockType::Blocked,
            start_date: date,
            end_date: None,
            start_minute: minutes.map(|(s, _)| s),
            end_minute: minutes.map(|(_, e)| e),
            reason: None,
            created_at: Utc::now(),
        }
    }

    fn available(date: NaiveDate, minutes: Option<(i32, i32)>) -> AvailabilityOverride {
        AvailabilityOverride {
            block_type: BlockType::Available,
            ..blocked(date, minutes)
        }
    }

    // 2026-09-07 is a Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 7).unwrap()
    }

    #[test]
    fn merges_overlapping_and_touching_spans() {
        assert_eq!(
            merge_spans(vec![(600, 660), (540, 600), (700, 720), (710, 730)]),
            vec![(540, 660), (700, 730)]
        );
    }

    #[test]
    fn subtraction_splits_a_span() {
        assert_eq!(subtract_span(vec![(540, 1020)], (600, 660)), vec![(540, 600), (660, 1020)]);
    }

    #[test]
    fn subtraction_drops_zero_length_remainders() {
        // Block exactly covers the span start; no degenerate (540, 540) left.
        assert_eq!(subtract_span(vec![(540, 600)], (540, 570)), vec![(570, 600)]);
        assert_eq!(subtract_span(vec![(540, 600)], (540, 600)), Vec::<MinuteSpan>::new());
    }

    #[test]
    fn weekday_rules_apply_only_on_their_day() {
        let rules = vec![rule(0, 540, 1020)]; // Mon 09:00-17:00
        assert_eq!(resolve_day(&rules, &[], monday()), vec![(540, 1020)]);
        let tuesday = monday().succ_opt().unwrap();
        assert!(resolve_day(&rules, &[], tuesday).is_empty());
    }

    #[test]
    fn blocked_override_without_minutes_blocks_whole_day() {
        let rules = vec![rule(0, 540, 1020)];
        let ov = vec![blocked(monday(), None)];
        assert!(resolve_day(&rules, &ov, monday()).is_empty());
    }

    #[test]
    fn blocked_override_truncates_recurring_hours() {
        let rules = vec![rule(0, 540, 1020)];
        let ov = vec![blocked(monday(), Some((720, 780)))]; // lunch out
        assert_eq!(resolve_day(&rules, &ov, monday()), vec![(540, 720), (780, 1020)]);
    }

    #[test]
    fn available_override_adds_time_outside_recurring_hours() {
        let rules = vec![rule(0, 540, 1020)];
        let ov = vec![available(monday(), Some((1080, 1200)))]; // one-off evening
        assert_eq!(resolve_day(&rules, &ov, monday()), vec![(540, 1020), (1080, 1200)]);
    }

    #[test]
    fn blocked_wins_over_available_on_the_same_range() {
        let ov = vec![
            available(monday(), Some((600, 720))),
            blocked(monday(), Some((600, 720))),
        ];
        assert!(resolve_day(&[], &ov, monday()).is_empty());
    }

    #[test]
    fn multi_date_override_covers_every_date_in_span() {
        let rules = vec![rule(0, 540, 1020), rule(1, 540, 1020)];
        let mut ov = blocked(monday(), None);
        ov.end_date = monday().succ_opt();
        let ov = vec![ov];

        let resolved = resolve_range(&rules, &ov, "t1", monday(), monday().succ_opt().unwrap());
        assert!(resolved.is_empty());
    }

    #[test]
    fn resolved_range_is_sorted_and_tagged_with_dates() {
        let rules = vec![rule(0, 540, 660), rule(1, 480, 600)];
        let resolved = resolve_range(&rules, &[], "t1", monday(), monday().succ_opt().unwrap());
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].date, monday());
        assert_eq!((resolved[0].start_minute, resolved[0].end_minute), (540, 660));
        assert_eq!(resolved[1].date, monday().succ_opt().unwrap());
        assert_eq!((resolved[1].start_minute, resolved[1].end_minute), (480, 600));
    }

    #[test]
    fn slot_enumeration_skips_busy_time() {
        let starts = enumerate_slot_starts(&[(540, 720)], &[(600, 660)], 60);
        assert_eq!(starts, vec![540, 660]);
    }

    #[test]
    fn containment_requires_a_single_span() {
        let spans = vec![(540, 600), (600, 660)];
        assert!(contained(&spans, 540, 600));
        assert!(contained(&spans, 610, 660));
        // Straddles the boundary between two separate spans.
        assert!(!contained(&spans, 570, 630));
    }
}
