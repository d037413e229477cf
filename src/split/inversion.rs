//! Inversion realignment: the two candidates map opposite strands, and one
//! side of the breakpoint keeps its orientation while the other continues
//! reverse-complemented. Which side stays anchored is a first-class choice,
//! so both variants exist and the conflict resolver probes them
//! symmetrically.
//!
//! The flipped side is walked with reverse iterators over the tail's strand
//! sequence and its reference, which turns both variants into the same
//! incremental sweep as deletions — only the growing/shrinking roles of the
//! two hypotheses differ.

use log::trace;

use crate::align::cigar::{Cigar, OpCode};
use crate::align::count_mismatches;
use crate::align::fragment::FragmentAlignment;
use crate::read::{Read, ReadMetadata};
use crate::reference::ContigList;
use crate::split::scan::scan_breakpoints;
use crate::split::SplitReadAligner;

impl SplitReadAligner {
    /// Inversion in which the left sides of both alignments stay anchored:
    /// the head region extends rightward while the reverse-complemented
    /// tail retreats.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn align_left_anchored_inversion(
        &self,
        cigar_buffer: &mut Cigar,
        contigs: &ContigList,
        read: &Read,
        read_metadata: &ReadMetadata,
        head: &mut FragmentAlignment,
        first_breakpoint_offset: usize,
        tail: &FragmentAlignment,
        last_breakpoint_offset: usize,
    ) -> bool {
        let head_reference = &contigs[head.contig_id];
        let tail_reference = &contigs[tail.contig_id];
        let read_length = read.len();
        let head_sequence = read.strand_sequence(head.reverse);
        let tail_sequence = read.strand_sequence(tail.reverse);

        if first_breakpoint_offset < head.begin_clip {
            trace!(
                "left inversion: window start {first_breakpoint_offset} inside head begin clipping"
            );
            return false;
        }
        if read_length - first_breakpoint_offset < tail.begin_clip {
            trace!("left inversion: breakpoint inside tail begin clipping");
            return false;
        }
        let tail_length = read_length - first_breakpoint_offset - tail.begin_clip;

        assert!(
            tail.unclipped_position() + (read_length - first_breakpoint_offset) as i64
                <= tail_reference.len() as i64,
            "inversion scan would overrun the tail reference"
        );

        // mismatches the head hypothesis accumulates past the window start
        // when no breakpoint is introduced
        let head_walk = head_reference
            .suffix(head.unclipped_position() + first_breakpoint_offset as i64);
        let pre_mismatches = count_mismatches(
            head_sequence[first_breakpoint_offset..]
                .iter()
                .copied()
                .take(tail_length),
            head_walk.iter().copied(),
        );
        if pre_mismatches == 0 {
            trace!("left inversion: the head alignment is already good enough");
            return false;
        }

        let head_length = first_breakpoint_offset - head.begin_clip;
        let head_mismatches = count_mismatches(
            head_sequence[head.begin_clip..]
                .iter()
                .copied()
                .take(head_length),
            head_reference.suffix(head.position).iter().copied(),
        );

        // the flipped side reads the tail strand sequence and the tail
        // reference backwards from the breakpoint's mirror image
        let tail_read_walk = tail_sequence[..read_length - first_breakpoint_offset]
            .iter()
            .rev()
            .copied();
        let tail_reference_walk = tail_reference
            .prefix(
                tail.unclipped_position() + (read_length - first_breakpoint_offset) as i64,
            )
            .iter()
            .rev()
            .copied();
        let tail_mismatches = count_mismatches(
            tail_read_walk.clone().take(tail_length),
            tail_reference_walk.clone(),
        );

        let growing = head_sequence[first_breakpoint_offset..]
            .iter()
            .copied()
            .zip(head_walk.iter().copied());
        let shrinking = tail_read_walk.zip(tail_reference_walk);
        let best = scan_breakpoints(
            first_breakpoint_offset,
            last_breakpoint_offset,
            head_mismatches,
            tail_mismatches,
            growing,
            shrinking,
        );

        let distance = tail.position - (head.unclipped_position() + best.offset as i64);
        self.merge_left_anchored_inversion(
            cigar_buffer,
            contigs,
            read,
            read_metadata,
            head,
            tail,
            best.offset,
            distance,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn merge_left_anchored_inversion(
        &self,
        cigar_buffer: &mut Cigar,
        contigs: &ContigList,
        read: &Read,
        read_metadata: &ReadMetadata,
        head: &mut FragmentAlignment,
        tail: &FragmentAlignment,
        best_offset: usize,
        distance: i64,
    ) -> bool {
        let read_length = read.len();
        let begin_clipping = head.begin_clip;
        let begin_mapped = best_offset - begin_clipping;
        if begin_mapped == 0 {
            trace!("left inversion: best breakpoint is at the start, not accepting");
            return false;
        }
        let end_mapped = tail.observed_length as i64 + tail.end_clip as i64 - best_offset as i64;
        if end_mapped <= 0 {
            trace!("left inversion: the flip consumes the whole tail, not accepting");
            return false;
        }
        let end_mapped = end_mapped as usize;

        let cigar_offset = cigar_buffer.len();

        if begin_clipping > 0 {
            cigar_buffer.push(begin_clipping as i64, OpCode::SoftClip);
        }
        cigar_buffer.push(begin_mapped as i64, OpCode::Align);
        cigar_buffer.push(
            (read_length - begin_mapped - begin_clipping) as i64,
            OpCode::Flip,
        );
        if tail.contig_id != head.contig_id {
            cigar_buffer.push(tail.contig_id as i64, OpCode::Contig);
        }
        cigar_buffer.push(distance, OpCode::Delete);
        if tail.begin_clip > 0 {
            cigar_buffer.push(tail.begin_clip as i64, OpCode::SoftClip);
        }
        cigar_buffer.push(end_mapped as i64, OpCode::Align);
        let trailing = read_length - end_mapped - tail.begin_clip;
        if trailing > 0 {
            cigar_buffer.push(trailing as i64, OpCode::HardClip);
        }

        let reverse = head.reverse;
        let contig_id = head.contig_id;
        let position = head.position;
        // carry over alignment-independent clipping (quality trimming,
        // adapter masking)
        head.set_right_clipped(tail.right_clipped());
        assert!(
            head.update_alignment(
                &self.cfg,
                read_metadata,
                read,
                contigs,
                reverse,
                contig_id,
                position,
                cigar_buffer,
                cigar_offset,
            ),
            "a merged inversion alignment cannot have zero matches"
        );
        trace!(
            "left inversion done: {} at {}:{}",
            cigar_buffer.render(cigar_offset, cigar_buffer.len() - cigar_offset),
            head.contig_id,
            head.position
        );
        true
    }

    /// Inversion in which the right sides of both alignments stay anchored:
    /// the head region retreats leftward while the reverse-complemented
    /// tail claims the read prefix.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn align_right_anchored_inversion(
        &self,
        cigar_buffer: &mut Cigar,
        contigs: &ContigList,
        read: &Read,
        read_metadata: &ReadMetadata,
        head: &mut FragmentAlignment,
        first_breakpoint_offset: usize,
        tail: &FragmentAlignment,
        last_breakpoint_offset: usize,
    ) -> bool {
        let head_reference = &contigs[head.contig_id];
        let tail_reference = &contigs[tail.contig_id];
        let read_length = read.len();
        let head_sequence = read.strand_sequence(head.reverse);
        let tail_sequence = read.strand_sequence(tail.reverse);

        if first_breakpoint_offset > head.begin_clip + head.observed_length {
            trace!(
                "right inversion: window start {first_breakpoint_offset} inside head end clipping"
            );
            return false;
        }
        if read_length - first_breakpoint_offset < tail.begin_clip {
            trace!("right inversion: breakpoint inside tail begin clipping");
            return false;
        }
        if first_breakpoint_offset < tail.end_clip {
            trace!("right inversion: breakpoint inside tail end clipping");
            return false;
        }

        let head_length =
            head.observed_length + head.begin_clip - first_breakpoint_offset;

        assert!(
            tail.unclipped_position() + (read_length - first_breakpoint_offset) as i64
                <= tail_reference.len() as i64,
            "inversion scan would overrun the tail reference"
        );

        // the head prefix the flip would claim, with the begin-clipped bases
        // counted as mismatching: the inversion reveals them
        let seed_region_length = first_breakpoint_offset - head.begin_clip;
        let pre_mismatches = count_mismatches(
            head_sequence[head.begin_clip..]
                .iter()
                .copied()
                .take(seed_region_length),
            head_reference
                .suffix(head.unclipped_position() + head.begin_clip as i64)
                .iter()
                .copied(),
        ) + head.begin_clip as u32;
        if pre_mismatches == 0 {
            trace!("right inversion: the head alignment is already good enough");
            return false;
        }

        // head hypothesis over the suffix it would keep
        let head_walk = head_reference
            .suffix(head.unclipped_position() + first_breakpoint_offset as i64);
        let head_mismatches = count_mismatches(
            head_sequence[first_breakpoint_offset..]
                .iter()
                .copied()
                .take(head_length),
            head_walk.iter().copied(),
        );

        // tail hypothesis over the prefix the flip would claim, walked
        // forward in the tail's own orientation
        let realigned_tail_length = first_breakpoint_offset - tail.end_clip;
        let tail_mismatches = count_mismatches(
            tail_sequence[read_length - first_breakpoint_offset..]
                .iter()
                .copied()
                .take(realigned_tail_length),
            tail_reference
                .suffix(
                    tail.unclipped_position() + (read_length - first_breakpoint_offset) as i64,
                )
                .iter()
                .copied(),
        );

        // here the flipped tail is the growing side and the head shrinks
        let growing = tail_sequence[..read_length - first_breakpoint_offset]
            .iter()
            .rev()
            .copied()
            .zip(
                tail_reference
                    .prefix(
                        tail.unclipped_position()
                            + (read_length - first_breakpoint_offset) as i64,
                    )
                    .iter()
                    .rev()
                    .copied(),
            );
        let shrinking = head_sequence[first_breakpoint_offset..]
            .iter()
            .copied()
            .zip(head_walk.iter().copied());
        // the window's upper bound is exclusive for this variant
        let best = scan_breakpoints(
            first_breakpoint_offset,
            last_breakpoint_offset.saturating_sub(1),
            tail_mismatches,
            head_mismatches,
            growing,
            shrinking,
        );

        let distance = tail.unclipped_position() - head.unclipped_position()
            - best.offset as i64
            + head.end_clip as i64;
        self.merge_right_anchored_inversion(
            cigar_buffer,
            contigs,
            read,
            read_metadata,
            head,
            tail,
            best.offset,
            distance,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn merge_right_anchored_inversion(
        &self,
        cigar_buffer: &mut Cigar,
        contigs: &ContigList,
        read: &Read,
        read_metadata: &ReadMetadata,
        head: &mut FragmentAlignment,
        tail: &FragmentAlignment,
        best_offset: usize,
        distance: i64,
    ) -> bool {
        let read_length = read.len();
        let begin_mapped =
            read_length as i64 - best_offset as i64 - head.end_clip as i64;
        if begin_mapped <= 0 {
            trace!("right inversion: best breakpoint is at the start, not accepting");
            return false;
        }
        // with the first acceptable breakpoint, heavy clipping can consume
        // the whole tail; that is not an alignment
        let end_mapped = best_offset as i64 - tail.end_clip as i64;
        if end_mapped <= 0 {
            trace!("right inversion: the tail gets entirely clipped away, not accepting");
            return false;
        }

        let cigar_offset = cigar_buffer.len();

        if best_offset > 0 {
            cigar_buffer.push(best_offset as i64, OpCode::SoftClip);
        }
        cigar_buffer.push(begin_mapped, OpCode::Align);
        if head.end_clip > 0 {
            cigar_buffer.push(head.end_clip as i64, OpCode::SoftClip);
        }
        // the head record consumes the whole read up to its soft clips
        cigar_buffer.push(0, OpCode::Flip);
        if tail.contig_id != head.contig_id {
            cigar_buffer.push(tail.contig_id as i64, OpCode::Contig);
        }
        cigar_buffer.push(distance, OpCode::Delete);
        cigar_buffer.push((read_length - best_offset) as i64, OpCode::HardClip);
        cigar_buffer.push(end_mapped, OpCode::Align);
        if tail.end_clip > 0 {
            cigar_buffer.push(tail.end_clip as i64, OpCode::SoftClip);
        }

        let reverse = head.reverse;
        let contig_id = head.contig_id;
        let position = head.unclipped_position() + best_offset as i64;
        // carry over alignment-independent clipping (quality trimming,
        // adapter masking)
        head.set_right_clipped(tail.right_clipped());
        assert!(
            head.update_alignment(
                &self.cfg,
                read_metadata,
                read,
                contigs,
                reverse,
                contig_id,
                position,
                cigar_buffer,
                cigar_offset,
            ),
            "a merged inversion alignment cannot have zero matches"
        );
        trace!(
            "right inversion done: {} at {}:{}",
            cigar_buffer.render(cigar_offset, cigar_buffer.len() - cigar_offset),
            head.contig_id,
            head.position
        );
        true
    }
}
