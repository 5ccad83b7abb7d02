//! Reader for 2-D float arrays in NumPy's `.npy` format.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use locscout_common::{LocScoutError, Result};
use regex::Regex;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::LazyLock;

use crate::store::EmbeddingMatrix;

const MAGIC: &[u8; 6] = b"\x93NUMPY";

static DESCR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"]descr['"]\s*:\s*['"]([^'"]+)['"]"#).unwrap());
static FORTRAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"]fortran_order['"]\s*:\s*(True|False)"#).unwrap());
static SHAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"]shape['"]\s*:\s*\(([^)]*)\)"#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq)]
enum Endian {
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Dtype {
    F32(Endian),
    F64(Endian),
}

impl Dtype {
    fn parse(descr: &str) -> Option<Self> {
        let mut chars = descr.chars();
        let endian = match chars.next()? {
            '<' | '=' => Endian::Little,
            '>' => Endian::Big,
            _ => return None,
        };
        match chars.as_str() {
            "f4" => Some(Self::F32(endian)),
            "f8" => Some(Self::F64(endian)),
            _ => None,
        }
    }

    fn size(&self) -> usize {
        match self {
            Self::F32(_) => 4,
            Self::F64(_) => 8,
        }
    }
}

#[derive(Debug, PartialEq)]
struct Header {
    dtype: Dtype,
    rows: usize,
    cols: usize,
}

fn malformed(msg: impl std::fmt::Display) -> LocScoutError {
    LocScoutError::corpus(format!("Malformed npy data: {}", msg))
}

fn parse_header(text: &str) -> Result<Header> {
    let descr = DESCR_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .ok_or_else(|| malformed("header has no descr"))?
        .as_str();
    let dtype = Dtype::parse(descr)
        .ok_or_else(|| malformed(format!("unsupported dtype '{}', expected f4 or f8", descr)))?;

    let fortran = FORTRAN_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .ok_or_else(|| malformed("header has no fortran_order"))?;
    if fortran.as_str() == "True" {
        return Err(malformed("fortran_order arrays are not supported"));
    }

    let shape = SHAPE_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .ok_or_else(|| malformed("header has no shape"))?;
    let dims = shape
        .as_str()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_end_matches('L').parse::<usize>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| malformed(format!("bad shape '{}': {}", shape.as_str(), e)))?;

    match dims.as_slice() {
        [rows, cols] => Ok(Header {
            dtype,
            rows: *rows,
            cols: *cols,
        }),
        other => Err(malformed(format!("expected a 2-D array, found shape {:?}", other))),
    }
}

fn read_values<R: Read>(reader: &mut R, dtype: Dtype, count: usize) -> std::io::Result<Vec<f32>> {
    match dtype {
        Dtype::F32(endian) => {
            let mut values = vec![0f32; count];
            match endian {
                Endian::Little => reader.read_f32_into::<LittleEndian>(&mut values)?,
                Endian::Big => reader.read_f32_into::<BigEndian>(&mut values)?,
            }
            Ok(values)
        }
        Dtype::F64(endian) => {
            let mut values = vec![0f64; count];
            match endian {
                Endian::Little => reader.read_f64_into::<LittleEndian>(&mut values)?,
                Endian::Big => reader.read_f64_into::<BigEndian>(&mut values)?,
            }
            Ok(values.into_iter().map(|v| v as f32).collect())
        }
    }
}

/// Decode an `.npy` stream into a matrix
pub fn parse_matrix<R: Read>(mut reader: R) -> Result<EmbeddingMatrix> {
    let mut magic = [0u8; 6];
    reader
        .read_exact(&mut magic)
        .map_err(|_| malformed("truncated magic"))?;
    if &magic != MAGIC {
        return Err(malformed("missing \\x93NUMPY magic"));
    }

    let major = reader.read_u8().map_err(|_| malformed("truncated version"))?;
    let _minor = reader.read_u8().map_err(|_| malformed("truncated version"))?;
    let header_len = match major {
        1 => reader.read_u16::<LittleEndian>().map(usize::from),
        2 | 3 => reader.read_u32::<LittleEndian>().map(|n| n as usize),
        other => return Err(malformed(format!("unsupported format version {}", other))),
    }
    .map_err(|_| malformed("truncated header length"))?;

    let mut header = Vec::new();
    reader
        .by_ref()
        .take(header_len as u64)
        .read_to_end(&mut header)?;
    if header.len() != header_len {
        return Err(malformed("truncated header"));
    }
    let header = parse_header(&String::from_utf8_lossy(&header))?;

    let expected = header
        .rows
        .checked_mul(header.cols)
        .and_then(|count| count.checked_mul(header.dtype.size()))
        .ok_or_else(|| malformed("shape overflows"))?;

    // Size the payload before allocating anything from the declared shape
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    if data.len() < expected {
        return Err(malformed(format!(
            "expected {} bytes of {}x{} data, found {}",
            expected,
            header.rows,
            header.cols,
            data.len()
        )));
    }
    if data.len() > expected {
        return Err(malformed("data is longer than the declared shape"));
    }

    let values = read_values(&mut data.as_slice(), header.dtype, header.rows * header.cols)?;

    EmbeddingMatrix::from_rows(header.rows, header.cols, values)
}

/// Read a matrix from an `.npy` file
pub fn read_matrix(path: &Path) -> Result<EmbeddingMatrix> {
    let file = File::open(path).map_err(|e| {
        LocScoutError::corpus(format!("Cannot open {}: {}", path.display(), e))
    })?;
    parse_matrix(BufReader::new(file))
        .map_err(|e| LocScoutError::corpus(format!("{}: {}", path.display(), e)))
}

/// Encode little-endian `f4` data the way `numpy.save` does (format 1.0)
#[cfg(test)]
pub(crate) fn encode_f32(rows: usize, cols: usize, values: &[f32]) -> Vec<u8> {
    let dict = format!(
        "{{'descr': '<f4', 'fortran_order': False, 'shape': ({}, {}), }}",
        rows, cols
    );
    // Header (magic + version + len + dict + newline) is padded to 64 bytes
    let unpadded = MAGIC.len() + 2 + 2 + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    let header = format!("{}{}\n", dict, " ".repeat(padding));

    let mut bytes = Vec::new();
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&[1, 0]);
    bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}
