//! Split-read realignment core for short-read DNA aligners.
//!
//! Given two candidate alignments of the same sequencing read, the crate
//! discovers the optimal breakpoint between them and rewrites the pair as a
//! single alignment carrying exactly one structural event: a deletion, an
//! insertion, an inversion or a translocation. Breakpoint discovery sweeps a
//! bounded window with incrementally maintained mismatch counts, so each
//! attempt costs O(read length) and is safe to run in the inner loop of
//! per-read alignment.
//!
//! The crate models only the data exchanged with the surrounding aligner:
//! candidate alignments arrive as [`FragmentAlignment`] values referencing a
//! caller-owned [`Cigar`] buffer, and improved alignments are appended to a
//! caller-owned candidate list with pre-reserved capacity. On rejection the
//! CIGAR buffer is truncated back to its pre-call size, so every attempt is
//! transactional.
//!
//! Two non-SAM CIGAR operations, `FLIP` and `CONTIG`, express the
//! strand-switching and contig-switching halves of inversions and
//! translocations inside a single operation sequence; the downstream record
//! emitter lowers them into a primary/supplementary record pair.

pub mod align;
pub mod error;
pub mod params;
pub mod read;
pub mod reference;
pub mod split;

pub use align::cigar::{Cigar, OpCode};
pub use align::fragment::{Anchor, FragmentAlignment};
pub use error::Error;
pub use params::AlignmentConfig;
pub use read::{Read, ReadMetadata};
pub use reference::{Contig, ContigList};
pub use split::SplitReadAligner;
