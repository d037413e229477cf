//! Packed CIGAR operations and the shared, grow-only operation buffer.
//!
//! Each operation is one `u32`: low 4 bits op code, high 28 bits value. The
//! value is an unsigned length for every op except `DELETE`, whose length is
//! a 28-bit two's-complement integer — inversions and local translocations
//! produce back-jumps, so negative deletions are normal. `CONTIG` carries a
//! contig id instead of a length.

const VALUE_BITS: u32 = 28;
const VALUE_MASK: u32 = (1 << VALUE_BITS) - 1;
const CODE_MASK: u32 = 0xf;

/// Maximum encodable unsigned operation length.
pub const MAX_OPERATION_LENGTH: i64 = VALUE_MASK as i64;

/// CIGAR operation codes used by the realignment core.
///
/// `Flip` and `Contig` are non-SAM extensions: `Flip` marks the point where
/// the remainder of the read continues reverse-complemented (its value is
/// the leading record's implied hard clip), `Contig` switches the reference
/// contig mid-alignment. The downstream emitter lowers both into a
/// supplementary record joined by an `SA` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum OpCode {
    Align = 0,
    Insert = 1,
    Delete = 2,
    SoftClip = 4,
    HardClip = 5,
    Flip = 14,
    Contig = 15,
}

impl OpCode {
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Align,
            1 => Self::Insert,
            2 => Self::Delete,
            4 => Self::SoftClip,
            5 => Self::HardClip,
            14 => Self::Flip,
            15 => Self::Contig,
            _ => panic!("unknown CIGAR op code {code}"),
        }
    }

    pub fn op_char(self) -> char {
        match self {
            Self::Align => 'M',
            Self::Insert => 'I',
            Self::Delete => 'D',
            Self::SoftClip => 'S',
            Self::HardClip => 'H',
            Self::Flip => 'F',
            Self::Contig => 'C',
        }
    }
}

/// Grow-only arena of packed CIGAR operations.
///
/// Fragment alignments reference slices of this buffer by `(offset, length)`.
/// The core only ever appends; a failed realignment attempt truncates back
/// to the recorded pre-call size, which keeps every append transactional and
/// all previously handed-out slices stable.
#[derive(Debug, Clone, Default)]
pub struct Cigar {
    ops: Vec<u32>,
}

impl Cigar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ops: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Append one operation. `value` is signed only for `Delete`; every
    /// other op requires a non-negative value.
    pub fn push(&mut self, value: i64, code: OpCode) {
        let encodable = match code {
            OpCode::Delete => {
                value >= -(1 << (VALUE_BITS - 1)) && value < (1 << (VALUE_BITS - 1))
            }
            _ => (0..=MAX_OPERATION_LENGTH).contains(&value),
        };
        assert!(encodable, "CIGAR value {value} out of range for {code:?}");
        self.ops.push(((value as u32) & VALUE_MASK) << 4 | code as u32);
    }

    /// Roll back to a previously recorded size.
    pub fn truncate(&mut self, len: usize) {
        debug_assert!(len <= self.ops.len());
        self.ops.truncate(len);
    }

    pub fn slice(&self, offset: usize, length: usize) -> &[u32] {
        &self.ops[offset..offset + length]
    }

    /// Unpack one operation. `Delete` values are sign-extended.
    pub fn decode(op: u32) -> (i64, OpCode) {
        let code = OpCode::from_code(op & CODE_MASK);
        let raw = op >> 4;
        let value = match code {
            OpCode::Delete => (((raw << 4) as i32) >> 4) as i64,
            _ => raw as i64,
        };
        (value, code)
    }

    /// Human-readable rendering of a slice, e.g. `4M-3D8M`.
    pub fn render(&self, offset: usize, length: usize) -> String {
        let mut out = String::new();
        for &op in self.slice(offset, length) {
            let (value, code) = Self::decode(op);
            out.push_str(&format!("{}{}", value, code.op_char()));
        }
        out
    }
}
