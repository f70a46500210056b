//! Assigns the pause, in milliseconds, that should precede each segment's
//! narration — a pure function of segment kind and paragraph adjacency.

use crate::models::{Segment, SegmentKind};

const SCENE_BREAK_MS: u32 = 1000;
const PARAGRAPH_BREAK_MS: u32 = 500;
const DIALOGUE_AFTER_NARRATION_MS: u32 = 350;
const NARRATION_AFTER_DIALOGUE_MS: u32 = 300;
const DIALOGUE_AFTER_DIALOGUE_MS: u32 = 250;
const DEFAULT_MS: u32 = 500;

pub fn execute_stage5(segments: &mut [Segment]) {
    for i in 0..segments.len() {
        segments[i].pause_before_ms = if i == 0 {
            0
        } else {
            pause_for(&segments[i - 1], &segments[i])
        };
    }
}

fn pause_for(prev: &Segment, cur: &Segment) -> u32 {
    let para_gap = cur.paragraph_index as i64 - prev.paragraph_index as i64;
    let both_narration = prev.kind == SegmentKind::Narration && cur.kind == SegmentKind::Narration;

    if para_gap > 1 && !both_narration {
        return SCENE_BREAK_MS;
    }
    if para_gap >= 1 {
        return PARAGRAPH_BREAK_MS;
    }
    match (prev.kind, cur.kind) {
        (SegmentKind::Narration, SegmentKind::Dialogue) => DIALOGUE_AFTER_NARRATION_MS,
        (SegmentKind::Dialogue, SegmentKind::Narration) => NARRATION_AFTER_DIALOGUE_MS,
        (SegmentKind::Dialogue, SegmentKind::Dialogue) => DIALOGUE_AFTER_DIALOGUE_MS,
        _ => DEFAULT_MS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(kind: SegmentKind, paragraph_index: usize) -> Segment {
        Segment::new(1, kind, "x".to_string(), paragraph_index, 0, 0)
    }

    #[test]
    fn first_segment_has_no_pause() {
        let mut segments = vec![segment(SegmentKind::Narration, 0)];
        execute_stage5(&mut segments);
        assert_eq!(segments[0].pause_before_ms, 0);
    }

    #[test]
    fn adjacent_paragraph_narration_gets_paragraph_break() {
        let mut segments = vec![
            segment(SegmentKind::Narration, 0),
            segment(SegmentKind::Narration, 1),
        ];
        execute_stage5(&mut segments);
        assert_eq!(segments[1].pause_before_ms, PARAGRAPH_BREAK_MS);
    }

    #[test]
    fn blank_line_before_dialogue_is_a_scene_break() {
        let mut segments = vec![
            segment(SegmentKind::Narration, 0),
            segment(SegmentKind::Dialogue, 2),
        ];
        execute_stage5(&mut segments);
        assert_eq!(segments[1].pause_before_ms, SCENE_BREAK_MS);
    }

    #[test]
    fn same_paragraph_dialogue_to_dialogue() {
        let mut segments = vec![
            segment(SegmentKind::Dialogue, 0),
            segment(SegmentKind::Dialogue, 0),
        ];
        execute_stage5(&mut segments);
        assert_eq!(segments[1].pause_before_ms, DIALOGUE_AFTER_DIALOGUE_MS);
    }
}
