//! Split-read realignment: rewrite two candidate alignments of one read as
//! a single alignment carrying exactly one structural event.
//!
//! The entry point is [`SplitReadAligner::align_simple_sv`], which probes
//! every candidate pair of the pre-call list prefix. Per pair,
//! [`SplitReadAligner::resolve_conflict`] decides which event family
//! applies (indel, translocation or inversion), probes the pair in both
//! head/tail orders and keeps the better result. Every engine is
//! transactional: a rejected attempt truncates the shared CIGAR buffer back
//! to its pre-call size and appends nothing.

mod deletion;
mod insertion;
mod inversion;
mod scan;

use log::trace;

use crate::align::cigar::Cigar;
use crate::align::fragment::FragmentAlignment;
use crate::params::AlignmentConfig;
use crate::read::{Read, ReadMetadata};
use crate::reference::ContigList;

/// Realignment engine for single-breakpoint structural events.
///
/// Holds only the scoring configuration; all per-call state lives in
/// caller-owned buffers, so one aligner is freely shared across reads.
pub struct SplitReadAligner {
    cfg: AlignmentConfig,
}

impl SplitReadAligner {
    pub fn new(cfg: AlignmentConfig) -> Self {
        Self { cfg }
    }

    /// Catch single structural events by analyzing the conflicts between
    /// the candidate alignments of one read.
    ///
    /// Pairs `head` over the pre-call list prefix with every `tail`
    /// strictly later in it, in deterministic `(head, tail)` index order.
    /// Mismatch-free candidates are already optimal and are skipped. The
    /// list grows as merges succeed; `fragments` must have enough spare
    /// capacity for every append, because callers hold live indices into
    /// it.
    #[allow(clippy::too_many_arguments)]
    pub fn align_simple_sv(
        &self,
        contigs: &ContigList,
        read: &Read,
        read_metadata: &ReadMetadata,
        regular_indels_only: bool,
        cigar_buffer: &mut Cigar,
        fragments: &mut Vec<FragmentAlignment>,
    ) {
        if fragments.len() < 2 {
            return;
        }
        let end_offset = fragments.len();
        for head_offset in 0..end_offset {
            if fragments[head_offset].mismatch_count == 0 {
                trace!("align_simple_sv: head {head_offset} is good enough, skipping");
                continue;
            }
            for tail_offset in head_offset + 1..end_offset {
                if fragments[tail_offset].mismatch_count == 0 {
                    trace!("align_simple_sv: tail {tail_offset} is good enough, skipping");
                    continue;
                }
                let head = fragments[head_offset].clone();
                let tail = fragments[tail_offset].clone();
                self.resolve_conflict(
                    contigs,
                    read,
                    read_metadata,
                    regular_indels_only,
                    cigar_buffer,
                    fragments,
                    &head,
                    &tail,
                );
            }
        }
    }

    /// Decide which event family can reconcile one candidate pair, probe it
    /// in both head/tail orders and append the better merged alignment.
    ///
    /// Returns whether an alignment was appended. On failure the CIGAR
    /// buffer is restored to its pre-call size.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve_conflict(
        &self,
        contigs: &ContigList,
        read: &Read,
        read_metadata: &ReadMetadata,
        regular_indels_only: bool,
        cigar_buffer: &mut Cigar,
        fragments: &mut Vec<FragmentAlignment>,
        head: &FragmentAlignment,
        tail: &FragmentAlignment,
    ) -> bool {
        let before = cigar_buffer.len();
        let mut appended = false;

        if head.reverse == tail.reverse {
            if head.first_anchor.end <= tail.last_anchor.start
                || tail.first_anchor.end <= head.last_anchor.start
            {
                if head.contig_id == tail.contig_id {
                    let mut first = head.clone();
                    let first_worked = self.align_indel(
                        cigar_buffer,
                        contigs,
                        read,
                        read_metadata,
                        regular_indels_only,
                        &mut first,
                        tail,
                    );
                    let mut second = tail.clone();
                    let second_worked = self.align_indel(
                        cigar_buffer,
                        contigs,
                        read,
                        read_metadata,
                        regular_indels_only,
                        &mut second,
                        head,
                    );
                    appended =
                        self.pick_best_split(first_worked, first, second_worked, second, fragments);
                } else if !regular_indels_only {
                    let mut first = head.clone();
                    let first_worked = self.align_translocation(
                        cigar_buffer,
                        contigs,
                        read,
                        read_metadata,
                        &mut first,
                        tail,
                    );
                    let mut second = tail.clone();
                    let second_worked = self.align_translocation(
                        cigar_buffer,
                        contigs,
                        read,
                        read_metadata,
                        &mut second,
                        head,
                    );
                    appended =
                        self.pick_best_split(first_worked, first, second_worked, second, fragments);
                }
            } else {
                trace!("resolve_conflict: head and tail anchors overlap, skipping");
            }
        } else if !regular_indels_only {
            // both parts must cover overlapping read coordinates for a
            // breakpoint to be discoverable; otherwise this would be an
            // insertion combined with an inversion, which is not supported
            if head.observed_length + tail.observed_length > read.len() {
                let read_length = read.len();

                let left_window = (
                    head.first_anchor.end.max(tail.end_clip),
                    (read_length - tail.first_anchor.end).min(read_length - head.end_clip),
                );
                let mut first = head.clone();
                let first_worked = !head.first_anchor.is_empty()
                    && !tail.first_anchor.is_empty()
                    && self.align_left_anchored_inversion(
                        cigar_buffer,
                        contigs,
                        read,
                        read_metadata,
                        &mut first,
                        left_window.0,
                        tail,
                        left_window.1,
                    );

                let right_window = (
                    (read_length - tail.last_anchor.start).max(head.begin_clip),
                    head.last_anchor.start.min(read_length - tail.begin_clip),
                );
                let mut second = head.clone();
                let second_worked = !head.last_anchor.is_empty()
                    && !tail.last_anchor.is_empty()
                    && self.align_right_anchored_inversion(
                        cigar_buffer,
                        contigs,
                        read,
                        read_metadata,
                        &mut second,
                        right_window.0,
                        tail,
                        right_window.1,
                    );

                appended =
                    self.pick_best_split(first_worked, first, second_worked, second, fragments);
            }
        }

        if !appended {
            cigar_buffer.truncate(before);
        }
        appended
    }

    /// Find the optimum location for an insertion, a deletion or a local
    /// back-jump, given two same-strand same-contig alignments of one read.
    ///
    /// The seed geometry decides the event: a larger-than-expected seed
    /// distance means reference bases were skipped (deletion), a smaller or
    /// negative one means read bases were inserted, and a strongly negative
    /// one is a local translocation.
    #[allow(clippy::too_many_arguments)]
    fn align_indel(
        &self,
        cigar_buffer: &mut Cigar,
        contigs: &ContigList,
        read: &Read,
        read_metadata: &ReadMetadata,
        regular_indels_only: bool,
        head: &mut FragmentAlignment,
        tail: &FragmentAlignment,
    ) -> bool {
        if tail.last_anchor.is_empty() || head.first_anchor.is_empty() {
            trace!("align_indel: head or tail anchor missing");
            return false;
        }
        let expected_seed_distance =
            tail.last_anchor.start as i64 - head.first_anchor.end as i64;
        if expected_seed_distance < 0 {
            trace!("align_indel: head and tail anchors overlap");
            return false;
        }

        let distance = tail.unclipped_position() - head.unclipped_position();
        assert!(
            distance != 0,
            "gap introduction requires distinct unclipped positions"
        );
        if distance.abs() >= self.cfg.split_gap_length && regular_indels_only {
            trace!("align_indel: candidates {distance} bases apart, too far for a regular indel");
            return false;
        }

        let head_seed_position = head.unclipped_position() + head.first_anchor.end as i64;
        let tail_seed_position = tail.unclipped_position() + tail.last_anchor.start as i64;
        let actual_seed_distance = tail_seed_position - head_seed_position;

        if expected_seed_distance < actual_seed_distance {
            // reference bases were skipped between the seeds
            let first = head.begin_clip.max(tail.begin_clip);
            // an empty anchor, though legal, must allow for one base at the
            // other side of the deletion
            let last = tail
                .last_anchor
                .start
                .saturating_sub(usize::from(tail.last_anchor.is_empty()));
            self.align_deletion(
                cigar_buffer,
                contigs,
                read,
                read_metadata,
                head,
                first,
                tail,
                last,
            )
        } else if actual_seed_distance >= 0
            || (-actual_seed_distance as usize) < head.first_anchor.len()
        {
            // insertions are allowed only while the tail anchor is not
            // aligned before the head anchor
            let mut merged = tail.clone();
            if self.align_insertion(
                cigar_buffer,
                contigs,
                read,
                read_metadata,
                head,
                head.first_anchor.end,
                &mut merged,
                tail.last_anchor.start,
            ) {
                *head = merged;
                true
            } else {
                false
            }
        } else if !regular_indels_only {
            // the tail anchor maps well before the head anchor: a local
            // back-jump on the same contig
            debug_assert!(
                actual_seed_distance < 0
                    && -actual_seed_distance >= head.first_anchor.len() as i64,
                "unexpected combination of seed distances"
            );
            let first = head.begin_clip.max(tail.begin_clip);
            self.align_deletion(
                cigar_buffer,
                contigs,
                read,
                read_metadata,
                head,
                first,
                tail,
                tail.last_anchor.start,
            )
        } else {
            false
        }
    }

    /// Deletion-shaped event across two contigs. The deletion engine emits
    /// the CONTIG switch; the carried distance is not a genomic length.
    fn align_translocation(
        &self,
        cigar_buffer: &mut Cigar,
        contigs: &ContigList,
        read: &Read,
        read_metadata: &ReadMetadata,
        head: &mut FragmentAlignment,
        tail: &FragmentAlignment,
    ) -> bool {
        let first = tail.begin_clip.max(head.first_anchor.end);
        self.align_deletion(
            cigar_buffer,
            contigs,
            read,
            read_metadata,
            head,
            first,
            tail,
            tail.last_anchor.start,
        )
    }

    /// Arbitrate between the two symmetric probe results and append the
    /// winner to the candidate list.
    fn pick_best_split(
        &self,
        first_worked: bool,
        first: FragmentAlignment,
        second_worked: bool,
        second: FragmentAlignment,
        fragments: &mut Vec<FragmentAlignment>,
    ) -> bool {
        if !first_worked && !second_worked {
            return false;
        }
        let best = if first_worked && (!second_worked || first.is_better_gapped(&second)) {
            first
        } else {
            second
        };
        assert!(
            fragments.capacity() > fragments.len(),
            "no spare capacity to append a split alignment; reserve the candidate list up front \
             (capacity {}, length {})",
            fragments.capacity(),
            fragments.len()
        );
        if best.gap_count == 0 {
            trace!("pick_best_split: best alignment has no gaps");
            return false;
        }
        trace!(
            "pick_best_split: keeping {}:{} mm={} gaps={}",
            best.contig_id,
            best.position,
            best.mismatch_count,
            best.gap_count
        );
        fragments.push(best);
        true
    }
}
