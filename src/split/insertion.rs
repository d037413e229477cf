//! Insertion realignment: same strand, same contig, with the tail aligned
//! *earlier* on the reference than the head — the difference is the number
//! of read bases inserted relative to the reference.

use log::trace;

use crate::align::cigar::{Cigar, OpCode};
use crate::align::count_mismatches;
use crate::align::fragment::FragmentAlignment;
use crate::read::{Read, ReadMetadata};
use crate::reference::ContigList;
use crate::split::scan::scan_breakpoints;
use crate::split::SplitReadAligner;

impl SplitReadAligner {
    /// Patch the pair with the CIGAR producing the fewest mismatches,
    /// assuming a single insertion between the head's first seed and the
    /// tail's last seed.
    ///
    /// Unlike deletions the inserted bases consume no reference, so the left
    /// and right walkers share one reference pointer and each step retires
    /// the base leaving the insertion on the left while admitting the one
    /// entering it on the right. The rewritten fragment is `tail` (ordered
    /// earlier in the candidate list); `head` is read-only.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn align_insertion(
        &self,
        cigar_buffer: &mut Cigar,
        contigs: &ContigList,
        read: &Read,
        read_metadata: &ReadMetadata,
        head: &FragmentAlignment,
        head_seed_end: usize,
        tail: &mut FragmentAlignment,
        tail_seed_start: usize,
    ) -> bool {
        let insertion_length = usize::try_from(head.unclipped_position() - tail.unclipped_position())
            .expect("insertion requires the tail to be aligned earlier than the head");

        // the inserted bases must fit between the anchoring seeds: placing
        // them inside a seed would let the insertion eat mismatch-free bases
        // and compete unfairly with ungapped candidates
        if tail_seed_start < head_seed_end + insertion_length {
            trace!(
                "align_insertion: insertion of {insertion_length} does not fit between the seeds"
            );
            return false;
        }

        let first_offset = head_seed_end.max(head.begin_clip);
        let last_offset = tail_seed_start - insertion_length;
        if last_offset < first_offset {
            trace!("align_insertion: empty scan window");
            return false;
        }

        let observed_end = tail.begin_clip + tail.observed_length;
        let right_length = observed_end as i64 - first_offset as i64 - insertion_length as i64;
        if right_length <= 0 {
            trace!(
                "align_insertion: no realignable bases right of the window start \
                 (observed end {observed_end}, window start {first_offset})"
            );
            return false;
        }
        let right_length = right_length as usize;

        let sequence = read.strand_sequence(head.reverse);
        let contig = &contigs[head.contig_id];
        // one shared walker: insertions consume no reference
        let reference_walk = contig.suffix(head.unclipped_position() + first_offset as i64);

        // mismatches of the right side with the insertion at the window
        // start; the prefix left of the window start is common to every
        // candidate offset and stays out of the counters
        let right_mismatches = count_mismatches(
            sequence[first_offset + insertion_length..]
                .iter()
                .copied()
                .take(right_length),
            reference_walk.iter().copied(),
        );

        let growing = sequence[first_offset..]
            .iter()
            .copied()
            .zip(reference_walk.iter().copied());
        let shrinking = sequence[first_offset + insertion_length..]
            .iter()
            .copied()
            .zip(reference_walk.iter().copied());
        let best = scan_breakpoints(first_offset, last_offset, 0, right_mismatches, growing, shrinking);

        self.merge_insertion(
            cigar_buffer,
            contigs,
            read,
            read_metadata,
            head,
            tail,
            best.offset,
            insertion_length,
        )
    }

    /// Emit the merged insertion CIGAR and re-score the tail fragment.
    #[allow(clippy::too_many_arguments)]
    fn merge_insertion(
        &self,
        cigar_buffer: &mut Cigar,
        contigs: &ContigList,
        read: &Read,
        read_metadata: &ReadMetadata,
        head: &FragmentAlignment,
        tail: &mut FragmentAlignment,
        best_offset: usize,
        insertion_length: usize,
    ) -> bool {
        let clipping_offset = head.begin_clip;
        let left_mapped = best_offset - clipping_offset;
        assert!(
            left_mapped <= read.len(),
            "left mapped length {left_mapped} exceeds the read length"
        );
        if left_mapped == 0 {
            trace!("align_insertion: insertions may not sit at the very beginning of the read");
            return false;
        }

        let right_mapped = head.observed_length as i64 + head.end_clip as i64
            - left_mapped as i64
            - tail.end_clip as i64
            - insertion_length as i64;
        if right_mapped <= 0 {
            trace!("align_insertion: insertions may not sit at the very end of the read");
            return false;
        }

        let cigar_offset = cigar_buffer.len();

        if clipping_offset > 0 {
            cigar_buffer.push(clipping_offset as i64, OpCode::SoftClip);
        }
        cigar_buffer.push(left_mapped as i64, OpCode::Align);
        cigar_buffer.push(insertion_length as i64, OpCode::Insert);
        cigar_buffer.push(right_mapped, OpCode::Align);
        if tail.end_clip > 0 {
            cigar_buffer.push(tail.end_clip as i64, OpCode::SoftClip);
        }

        // carry over alignment-independent clipping (quality trimming,
        // adapter masking)
        tail.set_left_clipped(head.left_clipped());
        assert!(
            tail.update_alignment(
                &self.cfg,
                read_metadata,
                read,
                contigs,
                head.reverse,
                head.contig_id,
                head.position,
                cigar_buffer,
                cigar_offset,
            ),
            "a merged insertion alignment cannot have zero matches"
        );
        trace!(
            "align_insertion done: {} at {}:{}",
            cigar_buffer.render(cigar_offset, cigar_buffer.len() - cigar_offset),
            tail.contig_id,
            tail.position
        );
        true
    }
}
