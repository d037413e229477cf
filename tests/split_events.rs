//! End-to-end split-read realignment scenarios: literal-reference event
//! merges plus synthetic round-trips where a generated structural event must
//! be reconstructed with exactly the generator's operation lengths.

use splitmap::reference::fasta::encode_base;
use splitmap::{
    AlignmentConfig, Anchor, Cigar, Contig, ContigList, FragmentAlignment, OpCode, Read,
    ReadMetadata, SplitReadAligner,
};

fn encode(sequence: &str) -> Vec<u8> {
    sequence.bytes().map(encode_base).collect()
}

fn contig_list(sequences: &[String]) -> ContigList {
    ContigList::new(
        sequences
            .iter()
            .enumerate()
            .map(|(i, s)| Contig::new(format!("chr{}", i + 1), encode(s)))
            .collect(),
    )
}

fn read_from(sequence: &str) -> Read {
    let bases = encode(sequence);
    let qualities = vec![30; bases.len()];
    Read::new(bases, qualities)
}

/// Build a candidate the way the seed-extension stage would: emit its CIGAR
/// into the shared buffer, re-score it, then pin the seed anchors.
#[allow(clippy::too_many_arguments)]
fn candidate(
    contigs: &ContigList,
    read: &Read,
    cigar_buffer: &mut Cigar,
    reverse: bool,
    contig_id: usize,
    position: i64,
    ops: &[(i64, OpCode)],
    first_anchor: (usize, usize),
    last_anchor: (usize, usize),
) -> FragmentAlignment {
    let cfg = AlignmentConfig::default();
    let read_metadata = ReadMetadata::new(0, read.len());
    let cigar_offset = cigar_buffer.len();
    for &(value, code) in ops {
        cigar_buffer.push(value, code);
    }
    let mut fragment = FragmentAlignment::default();
    fragment.update_alignment(
        &cfg,
        &read_metadata,
        read,
        contigs,
        reverse,
        contig_id,
        position,
        cigar_buffer,
        cigar_offset,
    );
    fragment.first_anchor = Anchor::new(first_anchor.0, first_anchor.1);
    fragment.last_anchor = Anchor::new(last_anchor.0, last_anchor.1);
    fragment
}

fn run_aligner(
    contigs: &ContigList,
    read: &Read,
    cigar_buffer: &mut Cigar,
    fragments: &mut Vec<FragmentAlignment>,
) {
    let _ = env_logger::builder().is_test(true).try_init();
    let read_metadata = ReadMetadata::new(0, read.len());
    let aligner = SplitReadAligner::new(AlignmentConfig::default());
    aligner.align_simple_sv(contigs, read, &read_metadata, false, cigar_buffer, fragments);
}

fn assert_partition_invariant(fragment: &FragmentAlignment, read: &Read) {
    assert_eq!(
        fragment.begin_clip + fragment.observed_length + fragment.end_clip,
        read.len(),
        "clip/observed partition must cover the read"
    );
}

#[test]
fn merges_a_deletion_into_one_alignment() {
    let contigs = contig_list(&["AAAACCCCGGGGTTTT".into()]);
    let read = read_from("AAAAGGGGTTTT");
    let mut cigar_buffer = Cigar::new();

    let head = candidate(
        &contigs, &read, &mut cigar_buffer, false, 0, 0,
        &[(12, OpCode::Align)], (0, 4), (0, 4),
    );
    let tail = candidate(
        &contigs, &read, &mut cigar_buffer, false, 0, 4,
        &[(12, OpCode::Align)], (4, 12), (4, 12),
    );
    let (head_mm, tail_mm) = (head.mismatch_count, tail.mismatch_count);
    assert!(head_mm > 0 && tail_mm > 0);

    let mut fragments = Vec::with_capacity(4);
    fragments.push(head);
    fragments.push(tail);
    let before = cigar_buffer.len();
    run_aligner(&contigs, &read, &mut cigar_buffer, &mut fragments);

    assert_eq!(fragments.len(), 3);
    let merged = &fragments[2];
    assert_eq!(
        cigar_buffer.render(merged.cigar_offset, merged.cigar_length),
        "4M4D8M"
    );
    assert_eq!(merged.position, 0);
    assert_eq!(merged.contig_id, 0);
    assert!(cigar_buffer.len() > before);
    assert_partition_invariant(merged, &read);
    assert!(merged.mismatch_count < head_mm.max(tail_mm));
}

#[test]
fn merges_an_insertion_into_one_alignment() {
    let contigs = contig_list(&["AAAATTTT".into()]);
    let read = read_from("AAAACGCGTTTT");
    let mut cigar_buffer = Cigar::new();

    let head = candidate(
        &contigs, &read, &mut cigar_buffer, false, 0, 0,
        &[(12, OpCode::Align)], (0, 4), (0, 4),
    );
    // the tail frame overhangs the contig start by the insertion length
    let tail = candidate(
        &contigs, &read, &mut cigar_buffer, false, 0, -4,
        &[(12, OpCode::Align)], (8, 12), (8, 12),
    );
    assert!(head.mismatch_count > 0 && tail.mismatch_count > 0);

    let mut fragments = Vec::with_capacity(4);
    fragments.push(head);
    fragments.push(tail);
    run_aligner(&contigs, &read, &mut cigar_buffer, &mut fragments);

    assert_eq!(fragments.len(), 3);
    let merged = &fragments[2];
    assert_eq!(
        cigar_buffer.render(merged.cigar_offset, merged.cigar_length),
        "4M4I4M"
    );
    assert_eq!(merged.position, 0);
    assert_eq!(merged.mismatch_count, 0);
    assert_eq!(merged.gap_count, 1);
    assert_partition_invariant(merged, &read);
}

#[test]
fn merges_a_left_anchored_inversion() {
    let contigs = contig_list(&["AAAACCCCGGGGTTTT".into()]);
    // prefix matches reference 0..6 forward, remainder matches reference
    // 2..8 reverse-complemented
    let read = read_from("AAAACCGGGGTT");
    let mut cigar_buffer = Cigar::new();

    let head = candidate(
        &contigs, &read, &mut cigar_buffer, false, 0, 0,
        &[(12, OpCode::Align)], (0, 6), (0, 6),
    );
    let tail = candidate(
        &contigs, &read, &mut cigar_buffer, true, 0, 2,
        &[(12, OpCode::Align)], (0, 6), (0, 6),
    );
    assert!(head.mismatch_count > 0 && tail.mismatch_count > 0);

    let mut fragments = Vec::with_capacity(4);
    fragments.push(head);
    fragments.push(tail);
    run_aligner(&contigs, &read, &mut cigar_buffer, &mut fragments);

    assert_eq!(fragments.len(), 3);
    let merged = &fragments[2];
    assert_eq!(
        cigar_buffer.render(merged.cigar_offset, merged.cigar_length),
        "6M6F-4D6M6H"
    );
    assert_eq!(merged.position, 0);
    assert_eq!(merged.mismatch_count, 0);
    assert_partition_invariant(merged, &read);
}

#[test]
fn merges_a_translocation_across_contigs() {
    let contigs = contig_list(&["AAAACCCC".into(), "GGGGTTTT".into()]);
    let read = read_from("AAAATTTT");
    let mut cigar_buffer = Cigar::new();

    let head = candidate(
        &contigs, &read, &mut cigar_buffer, false, 0, 0,
        &[(8, OpCode::Align)], (0, 4), (0, 4),
    );
    let tail = candidate(
        &contigs, &read, &mut cigar_buffer, false, 1, 0,
        &[(8, OpCode::Align)], (4, 8), (4, 8),
    );
    assert_eq!(head.mismatch_count, 4);
    assert_eq!(tail.mismatch_count, 4);

    let mut fragments = Vec::with_capacity(4);
    fragments.push(head);
    fragments.push(tail);
    run_aligner(&contigs, &read, &mut cigar_buffer, &mut fragments);

    assert_eq!(fragments.len(), 3);
    let merged = &fragments[2];
    assert_eq!(
        cigar_buffer.render(merged.cigar_offset, merged.cigar_length),
        "4M1C0D4M"
    );
    assert_eq!(merged.contig_id, 0);
    assert_eq!(merged.mismatch_count, 0);
    assert_eq!(merged.gap_count, 1);
    assert_partition_invariant(merged, &read);
}

#[test]
fn mismatch_free_candidates_are_left_alone() {
    let contigs = contig_list(&["AAAACCCCGGGGTTTT".into()]);
    let read = read_from("AAAACCCC");
    let mut cigar_buffer = Cigar::new();

    let head = candidate(
        &contigs, &read, &mut cigar_buffer, false, 0, 0,
        &[(8, OpCode::Align)], (0, 8), (0, 8),
    );
    let tail = candidate(
        &contigs, &read, &mut cigar_buffer, false, 0, 8,
        &[(8, OpCode::Align)], (0, 8), (0, 8),
    );
    assert_eq!(head.mismatch_count, 0);

    let mut fragments = Vec::with_capacity(4);
    fragments.push(head);
    fragments.push(tail);
    let before = cigar_buffer.len();
    run_aligner(&contigs, &read, &mut cigar_buffer, &mut fragments);

    assert_eq!(fragments.len(), 2);
    assert_eq!(cigar_buffer.len(), before);
}

#[test]
fn overlapping_anchors_are_skipped() {
    let contigs = contig_list(&["AAAACCCCGGGGTTTT".into()]);
    let read = read_from("AAAAGGGGTTTT");
    let mut cigar_buffer = Cigar::new();

    // both candidates anchor on the same seed region: no breakpoint can
    // separate them
    let head = candidate(
        &contigs, &read, &mut cigar_buffer, false, 0, 0,
        &[(12, OpCode::Align)], (6, 10), (6, 10),
    );
    let tail = candidate(
        &contigs, &read, &mut cigar_buffer, false, 0, 4,
        &[(12, OpCode::Align)], (6, 10), (6, 10),
    );
    assert!(head.mismatch_count > 0 && tail.mismatch_count > 0);

    let mut fragments = Vec::with_capacity(4);
    fragments.push(head);
    fragments.push(tail);
    let before = cigar_buffer.len();
    run_aligner(&contigs, &read, &mut cigar_buffer, &mut fragments);

    assert_eq!(fragments.len(), 2);
    assert_eq!(cigar_buffer.len(), before);
}

/// Alternating-base filler so breakpoint flanks stay distinguishable.
fn pattern(alphabet: &[char], length: usize) -> String {
    (0..length).map(|i| alphabet[i % alphabet.len()]).collect()
}

#[test]
fn round_trips_synthetic_deletions() {
    for &(prefix_len, deletion_len, suffix_len) in
        &[(6usize, 3usize, 6usize), (10, 1, 8), (5, 12, 7), (8, 4, 4)]
    {
        let reference = format!(
            "{}{}{}",
            pattern(&['A', 'C'], prefix_len),
            pattern(&['G'], deletion_len),
            pattern(&['T'], suffix_len),
        );
        let read_sequence = format!(
            "{}{}",
            pattern(&['A', 'C'], prefix_len),
            pattern(&['T'], suffix_len),
        );
        let contigs = contig_list(&[reference]);
        let read = read_from(&read_sequence);
        let read_length = read.len();
        let mut cigar_buffer = Cigar::new();

        let head = candidate(
            &contigs, &read, &mut cigar_buffer, false, 0, 0,
            &[(read_length as i64, OpCode::Align)],
            (0, prefix_len), (0, prefix_len),
        );
        let tail = candidate(
            &contigs, &read, &mut cigar_buffer, false, 0, deletion_len as i64,
            &[(read_length as i64, OpCode::Align)],
            (prefix_len, read_length), (prefix_len, read_length),
        );
        assert!(head.mismatch_count > 0 && tail.mismatch_count > 0);

        let mut fragments = Vec::with_capacity(4);
        fragments.push(head);
        fragments.push(tail);
        run_aligner(&contigs, &read, &mut cigar_buffer, &mut fragments);

        assert_eq!(
            fragments.len(),
            3,
            "deletion ({prefix_len}, {deletion_len}, {suffix_len}) not reconstructed"
        );
        let merged = &fragments[2];
        assert_eq!(
            cigar_buffer.render(merged.cigar_offset, merged.cigar_length),
            format!("{prefix_len}M{deletion_len}D{suffix_len}M"),
            "deletion ({prefix_len}, {deletion_len}, {suffix_len})"
        );
        assert_eq!(merged.mismatch_count, 0);
        assert_partition_invariant(merged, &read);
    }
}

#[test]
fn round_trips_synthetic_insertions() {
    for &(prefix_len, insertion_len, suffix_len) in
        &[(6usize, 3usize, 6usize), (9, 1, 7), (5, 6, 8), (7, 2, 4)]
    {
        let reference = format!(
            "{}{}",
            pattern(&['A', 'C'], prefix_len),
            pattern(&['T'], suffix_len),
        );
        let read_sequence = format!(
            "{}{}{}",
            pattern(&['A', 'C'], prefix_len),
            pattern(&['G'], insertion_len),
            pattern(&['T'], suffix_len),
        );
        let contigs = contig_list(&[reference]);
        let read = read_from(&read_sequence);
        let read_length = read.len();
        let mut cigar_buffer = Cigar::new();

        let head = candidate(
            &contigs, &read, &mut cigar_buffer, false, 0, 0,
            &[(read_length as i64, OpCode::Align)],
            (0, prefix_len), (0, prefix_len),
        );
        let tail = candidate(
            &contigs, &read, &mut cigar_buffer, false, 0, -(insertion_len as i64),
            &[(read_length as i64, OpCode::Align)],
            (prefix_len + insertion_len, read_length),
            (prefix_len + insertion_len, read_length),
        );
        assert!(head.mismatch_count > 0 && tail.mismatch_count > 0);

        let mut fragments = Vec::with_capacity(4);
        fragments.push(head);
        fragments.push(tail);
        run_aligner(&contigs, &read, &mut cigar_buffer, &mut fragments);

        assert_eq!(
            fragments.len(),
            3,
            "insertion ({prefix_len}, {insertion_len}, {suffix_len}) not reconstructed"
        );
        let merged = &fragments[2];
        assert_eq!(
            cigar_buffer.render(merged.cigar_offset, merged.cigar_length),
            format!("{prefix_len}M{insertion_len}I{suffix_len}M"),
            "insertion ({prefix_len}, {insertion_len}, {suffix_len})"
        );
        assert_eq!(merged.mismatch_count, 0);
        assert_partition_invariant(merged, &read);
    }
}
