//! Deletion realignment: same strand, with the tail aligned further along
//! the reference than the head. Also the workhorse of translocations, which
//! are deletion-shaped events across two contigs.

use log::trace;

use crate::align::cigar::{Cigar, OpCode};
use crate::align::count_mismatches;
use crate::align::fragment::FragmentAlignment;
use crate::read::{Read, ReadMetadata};
use crate::reference::ContigList;
use crate::split::scan::scan_breakpoints;
use crate::split::SplitReadAligner;

impl SplitReadAligner {
    /// Patch the head alignment with the CIGAR producing the fewest
    /// mismatches, assuming a single deletion somewhere between the head's
    /// first seed and the tail's last seed.
    ///
    /// `first_breakpoint_offset` is the earliest candidate offset in read
    /// coordinates, `last_breakpoint_offset` the latest. On success `head`
    /// is rewritten as the merged alignment; on soft rejection it is left in
    /// an unspecified state and the caller discards it.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn align_deletion(
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

        assert!(
            last_breakpoint_offset as i64 - tail.begin_clip as i64 + tail.position
                <= tail_reference.len() as i64,
            "last breakpoint offset {last_breakpoint_offset} is outside the tail reference"
        );

        let sequence = read.strand_sequence(head.reverse);

        let tail_end_offset = tail.begin_clip + tail.observed_length;
        if tail_end_offset < first_breakpoint_offset {
            trace!(
                "align_deletion: window start {first_breakpoint_offset} clipped by tail end {tail_end_offset}"
            );
            return false;
        }
        let tail_length = tail_end_offset - first_breakpoint_offset;

        assert!(
            head.unclipped_position() >= 0
                || first_breakpoint_offset as i64 >= -head.unclipped_position(),
            "first breakpoint offset {first_breakpoint_offset} is left of the head reference"
        );
        assert!(
            tail.unclipped_position() >= 0
                || first_breakpoint_offset as i64 >= -tail.unclipped_position(),
            "first breakpoint offset {first_breakpoint_offset} is left of the tail reference"
        );

        let head_walk =
            head_reference.suffix(head.unclipped_position() + first_breakpoint_offset as i64);
        let tail_walk =
            tail_reference.suffix(tail.unclipped_position() + first_breakpoint_offset as i64);

        // mismatches the head hypothesis accumulates over the tail region
        // when no deletion is introduced
        let tail_mismatches = count_mismatches(
            sequence[first_breakpoint_offset..]
                .iter()
                .copied()
                .take(tail_length),
            head_walk.iter().copied(),
        );
        if tail_mismatches == 0 {
            trace!("align_deletion: the head alignment already explains the overlap");
            return false;
        }

        // counters for the leftmost breakpoint position: the whole tail of
        // the head alignment is moved by the deletion length
        let head_length = first_breakpoint_offset - head.begin_clip;
        let left_mismatches = count_mismatches(
            sequence[head.begin_clip..].iter().copied().take(head_length),
            head_reference.suffix(head.position).iter().copied(),
        );
        let right_mismatches = count_mismatches(
            sequence[first_breakpoint_offset..]
                .iter()
                .copied()
                .take(tail_length),
            tail_walk.iter().copied(),
        );

        let growing = sequence[first_breakpoint_offset..]
            .iter()
            .copied()
            .zip(head_walk.iter().copied());
        let shrinking = sequence[first_breakpoint_offset..]
            .iter()
            .copied()
            .zip(tail_walk.iter().copied());
        let best = scan_breakpoints(
            first_breakpoint_offset,
            last_breakpoint_offset,
            left_mismatches,
            right_mismatches,
            growing,
            shrinking,
        );

        if best.mismatches() >= head.mismatch_count {
            trace!(
                "align_deletion: best split keeps {} mismatches, head has {}",
                best.mismatches(),
                head.mismatch_count
            );
            return false;
        }

        let deletion_length = tail.unclipped_position() - head.unclipped_position();
        self.merge_deletion(
            cigar_buffer,
            contigs,
            read,
            read_metadata,
            head,
            tail,
            best.offset,
            deletion_length,
        )
    }

    /// Emit the merged deletion CIGAR and re-score the head fragment.
    #[allow(clippy::too_many_arguments)]
    fn merge_deletion(
        &self,
        cigar_buffer: &mut Cigar,
        contigs: &ContigList,
        read: &Read,
        read_metadata: &ReadMetadata,
        head: &mut FragmentAlignment,
        tail: &FragmentAlignment,
        best_offset: usize,
        deletion_length: i64,
    ) -> bool {
        let clipping_offset = head.begin_clip;
        let head_mapped = best_offset - clipping_offset;
        if head_mapped == head.observed_length {
            trace!("align_deletion: head takes the whole length");
            return false;
        }

        let cigar_offset = cigar_buffer.len();

        if clipping_offset > 0 {
            cigar_buffer.push(clipping_offset as i64, OpCode::SoftClip);
        }

        if head_mapped > 0 {
            cigar_buffer.push(head_mapped as i64, OpCode::Align);
            if tail.contig_id != head.contig_id {
                cigar_buffer.push(tail.contig_id as i64, OpCode::Contig);
            }
            cigar_buffer.push(deletion_length, OpCode::Delete);
        } else {
            // a CIGAR must not begin with a deletion
            head.contig_id = tail.contig_id;
            head.position += deletion_length;
        }

        let tail_mapped = tail.observed_length + tail.begin_clip - best_offset;
        if tail_mapped > 0 {
            cigar_buffer.push(tail_mapped as i64, OpCode::Align);
        }

        if tail.end_clip > 0 {
            cigar_buffer.push(tail.end_clip as i64, OpCode::SoftClip);
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
            "a merged deletion alignment cannot have zero matches"
        );
        trace!(
            "align_deletion done: {} at {}:{}",
            cigar_buffer.render(cigar_offset, cigar_buffer.len() - cigar_offset),
            head.contig_id,
            head.position
        );
        true
    }
}
