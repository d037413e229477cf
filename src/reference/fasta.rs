use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use log::info;

use crate::error::Error;
use crate::reference::{Contig, ContigList};

/// Encode an ASCII base. Case-insensitive; control characters are the
/// caller's business.
pub fn encode_base(byte: u8) -> u8 {
    match byte {
        b'A' | b'a' => 0,
        b'C' | b'c' => 1,
        b'G' | b'g' => 2,
        b'T' | b't' => 3,
        _ => 4,
    }
}

/// Load a contig list from FASTA files (plain or gzip, detected by
/// extension).
///
/// - Base encoding: A=0, C=1, G=2, T=3, N/other=4
/// - Control characters (ASCII < 32) are skipped
/// - Case-insensitive (a == A)
pub fn load_contigs<P: AsRef<Path>>(paths: &[P]) -> Result<ContigList, Error> {
    let mut contigs = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let reader = open_reader(path)?;

        let mut current_name: Option<String> = None;
        let mut current_bases: Vec<u8> = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.map_err(|e| Error::io(e, path))?;

            if line.is_empty() {
                continue;
            }

            if let Some(stripped) = line.strip_prefix('>') {
                if let Some(name) = current_name.take() {
                    contigs.push(Contig::new(name, std::mem::take(&mut current_bases)));
                }

                // Contig name is everything after '>' up to the first whitespace
                let name = stripped
                    .split_whitespace()
                    .next()
                    .ok_or_else(|| {
                        Error::Fasta(format!(
                            "empty contig name at {}:{}",
                            path.display(),
                            line_num + 1
                        ))
                    })?
                    .to_string();

                current_name = Some(name);
            } else {
                if current_name.is_none() {
                    return Err(Error::Fasta(format!(
                        "sequence data before first header at {}:{}",
                        path.display(),
                        line_num + 1
                    )));
                }

                for &byte in line.as_bytes() {
                    if byte < 32 {
                        continue;
                    }
                    current_bases.push(encode_base(byte));
                }
            }
        }

        if let Some(name) = current_name {
            contigs.push(Contig::new(name, current_bases));
        }
    }

    if contigs.is_empty() {
        return Err(Error::Fasta("no contigs found in FASTA files".to_string()));
    }

    info!(
        "loaded {} contig(s), {} bases total",
        contigs.len(),
        contigs.iter().map(Contig::len).sum::<usize>()
    );

    Ok(ContigList::new(contigs))
}

fn open_reader(path: &Path) -> Result<BufReader<Box<dyn std::io::Read>>, Error> {
    let path_str = path.to_string_lossy();
    let is_gzipped = path_str.ends_with(".gz") || path_str.ends_with(".gzip");

    let file = File::open(path).map_err(|e| Error::io(e, path))?;

    let inner: Box<dyn std::io::Read> = if is_gzipped {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    Ok(BufReader::new(inner))
}
