//! Fragment alignment records and the CIGAR re-scorer.

use log::trace;

use crate::align::cigar::{Cigar, OpCode};
use crate::align::is_match;
use crate::params::AlignmentConfig;
use crate::read::{Read, ReadMetadata};
use crate::reference::ContigList;

/// Half-open read-coordinate interval marking a stretch of bases whose
/// mapping is considered reliable (typically a seed hit). `start == end`
/// denotes an empty anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Anchor {
    pub start: usize,
    pub end: usize,
}

impl Anchor {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

/// One candidate alignment of one read against the reference.
///
/// The CIGAR lives in a shared, caller-owned [`Cigar`] arena; the record
/// stores an `(offset, length)` slice into it. Created by the external
/// seed-extension stage, consumed read-only by the realignment engines, and
/// appended once more by them into the caller's candidate list.
#[derive(Debug, Clone, Default)]
pub struct FragmentAlignment {
    pub contig_id: usize,
    /// Reference position of the first aligned base. Signed: alignments may
    /// overhang the contig start.
    pub position: i64,
    pub reverse: bool,
    /// Read bases the record observes (ALIGN plus INSERT ops of the leading
    /// record; bases past a FLIP belong to the supplementary record).
    pub observed_length: usize,
    /// Soft-clipped bases at the read's left, in read orientation.
    pub begin_clip: usize,
    /// Soft-clipped bases at the read's right, in read orientation.
    pub end_clip: usize,
    pub cigar_offset: usize,
    pub cigar_length: usize,
    pub mismatch_count: u32,
    pub edit_distance: u32,
    pub gap_count: u32,
    pub alignment_score: i32,
    pub first_anchor: Anchor,
    pub last_anchor: Anchor,
    /// Alignment-independent clipping at the low/high cycle end (quality
    /// trimming, adapter masking). Carried across realignment.
    pub low_clipped: usize,
    pub high_clipped: usize,
    /// Cycles at which mismatches occurred, filled when the configuration
    /// asks for it.
    pub mismatch_cycles: Vec<u32>,
}

/// Bookkeeping for one ALIGN segment while re-scoring, used to derive
/// anchors from mismatch-free runs.
#[derive(Debug, Clone, Copy)]
struct AlignRun {
    start: usize,
    end: usize,
    first_mismatch: Option<usize>,
    last_mismatch: Option<usize>,
}

impl FragmentAlignment {
    pub fn new(contig_id: usize, position: i64, reverse: bool) -> Self {
        Self {
            contig_id,
            position,
            reverse,
            ..Self::default()
        }
    }

    /// `position` with the leading soft clip projected back onto the
    /// reference.
    pub fn unclipped_position(&self) -> i64 {
        self.position - self.begin_clip as i64
    }

    pub fn read_length(&self) -> usize {
        self.begin_clip + self.observed_length + self.end_clip
    }

    /// Masking clip at the read's left, in read orientation.
    pub fn left_clipped(&self) -> usize {
        if self.reverse {
            self.high_clipped
        } else {
            self.low_clipped
        }
    }

    /// Masking clip at the read's right, in read orientation.
    pub fn right_clipped(&self) -> usize {
        if self.reverse {
            self.low_clipped
        } else {
            self.high_clipped
        }
    }

    pub fn set_left_clipped(&mut self, value: usize) {
        if self.reverse {
            self.high_clipped = value;
        } else {
            self.low_clipped = value;
        }
    }

    pub fn set_right_clipped(&mut self, value: usize) {
        if self.reverse {
            self.low_clipped = value;
        } else {
            self.high_clipped = value;
        }
    }

    /// Ordering used to arbitrate between two gapped realignment attempts:
    /// fewest mismatches, then fewest gaps, then highest score.
    pub fn is_better_gapped(&self, other: &Self) -> bool {
        self.mismatch_count < other.mismatch_count
            || (self.mismatch_count == other.mismatch_count
                && (self.gap_count < other.gap_count
                    || (self.gap_count == other.gap_count
                        && self.alignment_score > other.alignment_score)))
    }

    /// Clear everything a fresh CIGAR walk will recompute.
    pub fn reset_alignment(&mut self) {
        self.observed_length = 0;
        self.begin_clip = 0;
        self.end_clip = 0;
        self.cigar_length = 0;
        self.mismatch_count = 0;
        self.edit_distance = 0;
        self.gap_count = 0;
        self.alignment_score = 0;
        self.mismatch_cycles.clear();
        self.first_anchor = Anchor::default();
        self.last_anchor = Anchor::default();
    }

    /// Re-score this fragment against a freshly emitted CIGAR.
    ///
    /// `position` is the reference position of the first aligned base; soft
    /// clips consume read only. The walk recomputes observed length, clip
    /// counters, mismatches, edit distance, gap count, alignment score and
    /// anchors. FLIP switches to the opposite strand sequence and restarts
    /// read offsets (the ops after it describe the supplementary record in
    /// its own orientation); CONTIG switches the reference contig; DELETE
    /// moves the reference cursor by its signed length.
    ///
    /// ALIGN bases before the contig start become begin clip and clamp the
    /// position to zero; an ALIGN op overhanging the contig end is clipped so
    /// the terminal kept base lies strictly before the contig's last base.
    ///
    /// Returns `true` iff at least one aligned base matched the reference.
    /// Callers that have just merged two alignments assert on the result: a
    /// merged CIGAR with zero matches means the breakpoint arithmetic is
    /// corrupt.
    #[allow(clippy::too_many_arguments)]
    pub fn update_alignment(
        &mut self,
        cfg: &AlignmentConfig,
        read_metadata: &ReadMetadata,
        read: &Read,
        contigs: &ContigList,
        reverse: bool,
        contig_id: usize,
        position: i64,
        cigar: &Cigar,
        cigar_offset: usize,
    ) -> bool {
        let read_length = read.len();
        debug_assert_eq!(read_metadata.length, read_length);

        self.reset_alignment();
        self.reverse = reverse;
        self.contig_id = contig_id;
        self.position = position;
        self.cigar_offset = cigar_offset;
        self.cigar_length = cigar.len() - cigar_offset;

        let mut contig = &contigs[contig_id];
        let mut current_reverse = reverse;
        let mut sequence = read.strand_sequence(current_reverse);
        let mut read_offset = 0usize;
        let mut reference_offset = position;
        let mut matches = 0usize;
        let mut flipped = false;
        let mut aligned_seen = false;
        let mut first_segment: Option<AlignRun> = None;
        let mut last_segment: Option<AlignRun> = None;

        for &op in cigar.slice(cigar_offset, self.cigar_length) {
            let (value, code) = Cigar::decode(op);
            match code {
                OpCode::SoftClip => {
                    let length = value as usize;
                    if !flipped && !aligned_seen {
                        self.begin_clip += length;
                    }
                    read_offset += length;
                }
                OpCode::HardClip => {
                    read_offset += value as usize;
                }
                OpCode::Align => {
                    let length = value as usize;
                    let contig_len = contig.len() as i64;
                    let op_end = reference_offset + length as i64;
                    // an op running past the contig keeps its terminal base
                    // strictly inside it (validators reject end-of-contig + 1)
                    let keep_limit = if op_end > contig_len {
                        contig_len - 1
                    } else {
                        contig_len
                    };
                    let mut segment: Option<AlignRun> = None;
                    for i in 0..length {
                        let reference_position = reference_offset + i as i64;
                        let read_position = read_offset + i;
                        if reference_position < 0 {
                            if !flipped && !aligned_seen {
                                self.begin_clip += 1;
                            }
                            continue;
                        }
                        if reference_position >= keep_limit {
                            continue;
                        }
                        if !flipped && !aligned_seen {
                            self.position = reference_position;
                        }
                        aligned_seen = true;
                        if !flipped {
                            self.observed_length += 1;
                        }
                        let read_base = sequence[read_position];
                        let reference_base = contig.bases()[reference_position as usize];
                        let mismatch = !is_match(read_base, reference_base);
                        if mismatch {
                            self.mismatch_count += 1;
                            self.edit_distance += 1;
                            self.alignment_score += cfg.mismatch_score;
                            if cfg.collect_mismatch_cycles {
                                let cycle = if current_reverse {
                                    read_length - 1 - read_position
                                } else {
                                    read_position
                                };
                                self.mismatch_cycles.push(cycle as u32);
                            }
                        } else {
                            matches += 1;
                            self.alignment_score += cfg.match_score;
                        }
                        if !flipped {
                            let run = segment.get_or_insert(AlignRun {
                                start: read_position,
                                end: read_position,
                                first_mismatch: None,
                                last_mismatch: None,
                            });
                            run.end = read_position + 1;
                            if mismatch {
                                run.first_mismatch.get_or_insert(read_position);
                                run.last_mismatch = Some(read_position);
                            }
                        }
                    }
                    if let Some(run) = segment {
                        if first_segment.is_none() {
                            first_segment = Some(run);
                        }
                        last_segment = Some(run);
                    }
                    read_offset += length;
                    reference_offset += length as i64;
                }
                OpCode::Insert => {
                    let length = value as usize;
                    if !flipped {
                        self.observed_length += length;
                    }
                    read_offset += length;
                    self.edit_distance += length as u32;
                    self.gap_count += 1;
                    self.alignment_score += cfg.gap_score(length);
                }
                OpCode::Delete => {
                    reference_offset += value;
                    self.edit_distance += value.unsigned_abs() as u32;
                    self.gap_count += 1;
                    self.alignment_score += cfg.gap_score(value.unsigned_abs() as usize);
                }
                OpCode::Flip => {
                    let length = value as usize;
                    assert_eq!(
                        read_offset + length,
                        read_length,
                        "FLIP length must equal the unconsumed read remainder"
                    );
                    current_reverse = !current_reverse;
                    sequence = read.strand_sequence(current_reverse);
                    read_offset = 0;
                    flipped = true;
                    self.gap_count += 1;
                    self.alignment_score += cfg.gap_score(0);
                }
                OpCode::Contig => {
                    contig = &contigs[value as usize];
                }
            }
        }

        if let Some(first) = first_segment {
            self.first_anchor = Anchor::new(first.start, first.first_mismatch.unwrap_or(first.end));
        }
        if let Some(last) = last_segment {
            let start = last
                .last_mismatch
                .map(|m| m + 1)
                .unwrap_or(last.start)
                .max(self.first_anchor.end);
            self.last_anchor = Anchor::new(start, last.end.max(start));
        }

        let consumed = self.begin_clip + self.observed_length;
        assert!(
            consumed <= read_length,
            "CIGAR consumes {consumed} read bases of a {read_length}-cycle read"
        );
        self.end_clip = read_length - consumed;

        trace!(
            "update_alignment read {}: {} at {}:{} mm={} gaps={} score={}",
            read_metadata.index,
            cigar.render(cigar_offset, self.cigar_length),
            self.contig_id,
            self.position,
            self.mismatch_count,
            self.gap_count,
            self.alignment_score
        );

        matches > 0
    }
}
