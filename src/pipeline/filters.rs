//! Stream filter decoding.
//!
//! Undoes a stream's `/Filter` chain so callers get plain bytes: page
//! content, form XObjects and image samples all come through here. Errors
//! are reported rather than swallowed, and output is capped so a hostile
//! stream cannot exhaust memory.
//!
//! Image codecs (`DCTDecode`, `JPXDecode`, `JBIG2Decode`, `CCITTFaxDecode`)
//! end the chain: the bytes decoded so far are returned together with the
//! [`Codec`] that still has to be applied.

use crate::pipeline::content::{dict_get, number, resolve};
use flate2::read::ZlibDecoder;
use lopdf::{Dictionary, Document, Object, Stream};
use std::io::Read;
use thiserror::Error;
use weezl::{decode::Decoder as LzwDecoder, BitOrder};

/// Cap for content streams and anything else without a natural size.
pub const MAX_DECODED_LEN: usize = 1 << 28;

/// Why a stream could not be decoded.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("FlateDecode failed: {0}")]
    Flate(String),

    #[error("LZWDecode failed: {0}")]
    Lzw(String),

    #[error("ASCII85Decode failed: {0}")]
    Ascii85(String),

    #[error("ASCIIHexDecode failed: invalid byte 0x{0:02x}")]
    AsciiHex(u8),

    #[error("predictor {predictor} failed: {detail}")]
    Predictor { predictor: i64, detail: String },

    #[error("decoded data exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("unsupported filter {0}")]
    Unsupported(String),
}

/// Image codec left for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Dct,
    Jpx,
    Jbig2,
    CcittFax,
}

impl Codec {
    pub fn as_str(self) -> &'static str {
        match self {
            Codec::Dct => "DCTDecode",
            Codec::Jpx => "JPXDecode",
            Codec::Jbig2 => "JBIG2Decode",
            Codec::CcittFax => "CCITTFaxDecode",
        }
    }
}

/// Bytes after every non-image filter has been undone.
#[derive(Debug)]
pub struct Decoded {
    pub data: Vec<u8>,
    /// Image codec that stopped the chain, if any.
    pub codec: Option<Codec>,
}

#[derive(Debug, Clone, Copy)]
enum Filter {
    Flate,
    Lzw,
    Ascii85,
    AsciiHex,
    RunLength,
    Image(Codec),
}

impl Filter {
    /// Full names and the abbreviations allowed on inline images.
    fn from_name(name: &[u8]) -> Result<Self, FilterError> {
        let is = |full: &str, short: &str| {
            name.eq_ignore_ascii_case(full.as_bytes())
                || (!short.is_empty() && name.eq_ignore_ascii_case(short.as_bytes()))
        };
        if is("FlateDecode", "Fl") {
            Ok(Filter::Flate)
        } else if is("LZWDecode", "LZW") {
            Ok(Filter::Lzw)
        } else if is("ASCII85Decode", "A85") {
            Ok(Filter::Ascii85)
        } else if is("ASCIIHexDecode", "AHx") {
            Ok(Filter::AsciiHex)
        } else if is("RunLengthDecode", "RL") {
            Ok(Filter::RunLength)
        } else if is("DCTDecode", "DCT") {
            Ok(Filter::Image(Codec::Dct))
        } else if is("JPXDecode", "") {
            Ok(Filter::Image(Codec::Jpx))
        } else if is("JBIG2Decode", "") {
            Ok(Filter::Image(Codec::Jbig2))
        } else if is("CCITTFaxDecode", "CCF") {
            Ok(Filter::Image(Codec::CcittFax))
        } else {
            Err(FilterError::Unsupported(String::from_utf8_lossy(name).into_owned()))
        }
    }
}

/// Decode `stream` through its filter chain, producing at most `limit` bytes.
pub fn decode_stream(doc: &Document, stream: &Stream, limit: usize) -> Result<Decoded, FilterError> {
    let chain = filter_chain(doc, &stream.dict);
    let mut data = stream.content.clone();

    for (name, params) in chain {
        let filter = Filter::from_name(&name)?;
        data = match filter {
            Filter::Flate => flate_decode(&data, limit)?,
            Filter::Lzw => {
                let early_change = params.and_then(|p| param(doc, p, b"EarlyChange")).unwrap_or(1);
                lzw_decode(&data, early_change, limit)?
            }
            Filter::Ascii85 => capped(ascii85_decode(&data)?, limit)?,
            Filter::AsciiHex => capped(ascii_hex_decode(&data)?, limit)?,
            Filter::RunLength => capped(run_length_decode(&data), limit)?,
            Filter::Image(codec) => {
                return Ok(Decoded {
                    data,
                    codec: Some(codec),
                })
            }
        };
        if matches!(filter, Filter::Flate | Filter::Lzw) {
            if let Some(params) = params {
                data = capped(apply_predictor(doc, params, data)?, limit)?;
            }
        }
    }

    Ok(Decoded { data, codec: None })
}

/// Filter names paired with their `/DecodeParms` (abbreviated keys accepted).
fn filter_chain<'a>(doc: &'a Document, dict: &'a Dictionary) -> Vec<(Vec<u8>, Option<&'a Dictionary>)> {
    let lookup = |full: &[u8], short: &[u8]| dict_get(doc, dict, full).or_else(|| dict_get(doc, dict, short));
    let names: Vec<Vec<u8>> = match lookup(b"Filter", b"F") {
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|o| resolve(doc, o).and_then(|o| o.as_name().ok()).map(<[u8]>::to_vec))
            .collect(),
        Some(Object::Name(name)) => vec![name.clone()],
        _ => Vec::new(),
    };
    let params: Vec<Option<&Dictionary>> = match lookup(b"DecodeParms", b"DP") {
        Some(Object::Array(items)) => items
            .iter()
            .map(|o| resolve(doc, o).and_then(|o| o.as_dict().ok()))
            .collect(),
        // one dictionary serves the whole chain
        Some(Object::Dictionary(d)) => vec![Some(d); names.len()],
        _ => Vec::new(),
    };

    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name, params.get(i).copied().flatten()))
        .collect()
}

fn param(doc: &Document, params: &Dictionary, key: &[u8]) -> Option<i64> {
    dict_get(doc, params, key).and_then(number).map(|v| v as i64)
}

fn capped(data: Vec<u8>, limit: usize) -> Result<Vec<u8>, FilterError> {
    if data.len() > limit {
        return Err(FilterError::TooLarge { limit });
    }
    Ok(data)
}

// ── Decompression ────────────────────────────────────────────────────────

fn flate_decode(data: &[u8], limit: usize) -> Result<Vec<u8>, FilterError> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = match decoder.read(&mut buf) {
            Ok(n) => n,
            // keep what a stream with a damaged tail produced
            Err(_) if !out.is_empty() => break,
            Err(e) => return Err(FilterError::Flate(e.to_string())),
        };
        if n == 0 {
            break;
        }
        if out.len().saturating_add(n) > limit {
            return Err(FilterError::TooLarge { limit });
        }
        out.extend_from_slice(&buf[..n]);
    }
    Ok(out)
}

/// PDF LZW: MSB-first codes, 8-bit literals. The default `EarlyChange` 1
/// grows the code size one code early, as TIFF does.
fn lzw_decode(data: &[u8], early_change: i64, limit: usize) -> Result<Vec<u8>, FilterError> {
    let mut decoder = if early_change == 0 {
        LzwDecoder::new(BitOrder::Msb, 8)
    } else {
        LzwDecoder::with_tiff_size_switch(BitOrder::Msb, 8)
    };
    let mut out = Vec::new();
    let result = decoder.into_vec(&mut out).decode(data);
    if let Err(e) = result.status {
        if out.is_empty() {
            return Err(FilterError::Lzw(e.to_string()));
        }
    }
    capped(out, limit)
}

fn ascii85_decode(data: &[u8]) -> Result<Vec<u8>, FilterError> {
    let data = data.strip_prefix(b"<~").unwrap_or(data);
    let data = match data.iter().position(|&b| b == b'~') {
        Some(end) => &data[..end],
        None => data,
    };

    let mut out = Vec::with_capacity(data.len() * 4 / 5);
    let mut group = [0u8; 5];
    let mut filled = 0;
    for &byte in data {
        match byte {
            b' ' | b'\t' | b'\n' | b'\r' | b'\0' | b'\x0C' => continue,
            b'z' if filled == 0 => out.extend_from_slice(&[0; 4]),
            b'!'..=b'u' => {
                group[filled] = byte - b'!';
                filled += 1;
                if filled == 5 {
                    out.extend_from_slice(&ascii85_group(&group)?);
                    filled = 0;
                }
            }
            other => return Err(FilterError::Ascii85(format!("invalid byte 0x{other:02x}"))),
        }
    }
    if filled == 1 {
        return Err(FilterError::Ascii85("dangling final character".into()));
    }
    if filled > 1 {
        group[filled..].fill(b'u' - b'!');
        out.extend_from_slice(&ascii85_group(&group)?[..filled - 1]);
    }
    Ok(out)
}

fn ascii85_group(digits: &[u8; 5]) -> Result<[u8; 4], FilterError> {
    let value = digits.iter().fold(0u64, |acc, &d| acc * 85 + d as u64);
    u32::try_from(value)
        .map(u32::to_be_bytes)
        .map_err(|_| FilterError::Ascii85("group out of range".into()))
}

fn ascii_hex_decode(data: &[u8]) -> Result<Vec<u8>, FilterError> {
    let mut out = Vec::with_capacity(data.len() / 2);
    let mut high: Option<u8> = None;
    for &byte in data {
        let nibble = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            b'A'..=b'F' => byte - b'A' + 10,
            b'>' => break,
            b' ' | b'\t' | b'\n' | b'\r' | b'\0' | b'\x0C' => continue,
            other => return Err(FilterError::AsciiHex(other)),
        };
        match high.take() {
            Some(h) => out.push((h << 4) | nibble),
            None => high = Some(nibble),
        }
    }
    if let Some(h) = high {
        out.push(h << 4);
    }
    Ok(out)
}

fn run_length_decode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        let length = data[i] as usize;
        i += 1;
        match length {
            128 => break,
            0..=127 => {
                let end = (i + length + 1).min(data.len());
                out.extend_from_slice(&data[i..end]);
                i = end;
            }
            _ => {
                if let Some(&byte) = data.get(i) {
                    out.extend(std::iter::repeat_n(byte, 257 - length));
                }
                i += 1;
            }
        }
    }
    out
}

// ── Predictors ───────────────────────────────────────────────────────────

fn apply_predictor(doc: &Document, params: &Dictionary, data: Vec<u8>) -> Result<Vec<u8>, FilterError> {
    let predictor = param(doc, params, b"Predictor").unwrap_or(1);
    if predictor < 2 {
        return Ok(data);
    }
    let colors = param(doc, params, b"Colors").unwrap_or(1);
    let columns = param(doc, params, b"Columns").unwrap_or(1);
    let bits = param(doc, params, b"BitsPerComponent").unwrap_or(8);
    let fail = |detail: String| FilterError::Predictor { predictor, detail };

    if !(1..=32).contains(&colors) || columns < 1 || !matches!(bits, 1 | 2 | 4 | 8 | 16) {
        return Err(fail(format!("colors={colors} columns={columns} bits={bits}")));
    }
    let (colors, columns, bits) = (colors as usize, columns as usize, bits as usize);

    match predictor {
        2 => tiff_predictor(colors, columns, bits, data).map_err(fail),
        10..=15 => png_predictor(colors, columns, bits, &data).map_err(fail),
        other => Err(fail(format!("unknown predictor {other}"))),
    }
}

/// TIFF predictor 2: each sample is stored as the difference from the
/// sample one pixel to the left.
fn tiff_predictor(colors: usize, columns: usize, bits: usize, mut data: Vec<u8>) -> Result<Vec<u8>, String> {
    let row_bytes = (colors * columns * bits).div_ceil(8);
    match bits {
        8 => {
            for row in data.chunks_mut(row_bytes) {
                for i in colors..row.len() {
                    row[i] = row[i].wrapping_add(row[i - colors]);
                }
            }
        }
        16 => {
            let step = colors * 2;
            for row in data.chunks_mut(row_bytes) {
                for i in (step..row.len().saturating_sub(1)).step_by(2) {
                    let prev = u16::from_be_bytes([row[i - step], row[i - step + 1]]);
                    let cur = u16::from_be_bytes([row[i], row[i + 1]]).wrapping_add(prev);
                    row[i..i + 2].copy_from_slice(&cur.to_be_bytes());
                }
            }
        }
        other => return Err(format!("{other}-bit TIFF prediction is not supported")),
    }
    Ok(data)
}

/// PNG predictors: every row carries a leading filter-type byte.
fn png_predictor(colors: usize, columns: usize, bits: usize, data: &[u8]) -> Result<Vec<u8>, String> {
    let row_bytes = (colors * columns * bits).div_ceil(8);
    let bpp = (colors * bits).div_ceil(8).max(1);
    let mut out = Vec::with_capacity(data.len());
    let mut prev = vec![0u8; row_bytes];
    let mut cur = vec![0u8; row_bytes];

    // a short final row is dropped
    for row in data.chunks_exact(row_bytes + 1) {
        let (kind, raw) = (row[0], &row[1..]);
        for i in 0..row_bytes {
            let left = if i >= bpp { cur[i - bpp] } else { 0 };
            let up = prev[i];
            let up_left = if i >= bpp { prev[i - bpp] } else { 0 };
            let predicted = match kind {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((left as u16 + up as u16) / 2) as u8,
                4 => paeth(left, up, up_left),
                other => return Err(format!("invalid PNG row filter {other}")),
            };
            cur[i] = raw[i].wrapping_add(predicted);
        }
        out.extend_from_slice(&cur);
        std::mem::swap(&mut prev, &mut cur);
    }
    Ok(out)
}

const fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
