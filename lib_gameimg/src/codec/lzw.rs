//! Variable-width LZW codec as used by GIF raster streams.
//!
//! Codes start at `min_code_size + 1` bits and grow to 12 as the
//! dictionary fills; code values are packed LSB-first. The clear code
//! resets the dictionary, the end-of-information code terminates the
//! stream. The compressor emits a clear code up front and again whenever
//! the dictionary reaches 4096 entries.

use std::collections::HashMap;
use thiserror::Error;

const MAX_CODE: u16 = 4096;
const MAX_CODE_SIZE: u8 = 12;

#[derive(Debug)]
struct LzwEntry {
    prefix: Option<u16>,
    suffix: u8,
}

#[derive(Error, Debug)]
pub enum LzwCompressionError {
    #[error("invalid minimum code size {0}: must be between 2 and 8")]
    InvalidCodeSize(u8),
    #[error("input byte {byte:#04x} does not fit in {min_code_size}-bit symbols")]
    SymbolOutOfRange { byte: u8, min_code_size: u8 },
}

#[derive(Error, Debug)]
pub enum LzwDecompressionError {
    #[error("invalid minimum code size {0}: must be between 2 and 8")]
    InvalidCodeSize(u8),
    #[error("invalid input data: incomplete code at bit position {position}")]
    IncompleteCode { position: usize },
    #[error("invalid code: code value {code} exceeds dictionary size {dict_size}")]
    InvalidCode { code: usize, dict_size: usize },
}

struct BitWriter {
    out: Vec<u8>,
    accumulator: u32,
    bits: u32,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            out: Vec::new(),
            accumulator: 0,
            bits: 0,
        }
    }

    fn write(&mut self, code: u16, code_size: u8) {
        self.accumulator |= (code as u32) << self.bits;
        self.bits += code_size as u32;
        while self.bits >= 8 {
            self.out.push(self.accumulator as u8);
            self.accumulator >>= 8;
            self.bits -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.out.push(self.accumulator as u8);
        }
        self.out
    }
}

struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    fn read(&mut self, code_size: u8) -> Result<u16, LzwDecompressionError> {
        let end = self.position + code_size as usize;
        if end > self.data.len() * 8 {
            return Err(LzwDecompressionError::IncompleteCode {
                position: self.position,
            });
        }
        let mut value = 0u32;
        for bit in 0..code_size as usize {
            let source = self.position + bit;
            if self.data[source / 8] & (1 << (source % 8)) != 0 {
                value |= 1 << bit;
            }
        }
        self.position = end;
        Ok(value as u16)
    }
}

fn check_code_size(min_code_size: u8) -> bool {
    (2..=8).contains(&min_code_size)
}

pub fn lzw_compression(data: &[u8], min_code_size: u8) -> Result<Vec<u8>, LzwCompressionError> {
    if !check_code_size(min_code_size) {
        return Err(LzwCompressionError::InvalidCodeSize(min_code_size));
    }

    let root_count = 1u16 << min_code_size;
    let clear_code = root_count;
    let end_code = root_count + 1;

    if let Some(&byte) = data.iter().find(|&&b| b as u16 >= root_count) {
        return Err(LzwCompressionError::SymbolOutOfRange {
            byte,
            min_code_size,
        });
    }

    let mut writer = BitWriter::new();
    let mut code_size = min_code_size + 1;
    let mut next_code = end_code + 1;
    let mut dictionary: HashMap<Vec<u8>, u16> = HashMap::new();

    writer.write(clear_code, code_size);

    if data.is_empty() {
        writer.write(end_code, code_size);
        return Ok(writer.finish());
    }

    let mut current = vec![data[0]];
    for &byte in &data[1..] {
        let mut extended = current.clone();
        extended.push(byte);

        if dictionary.contains_key(&extended) {
            current = extended;
            continue;
        }

        let code = dictionary
            .get(&current)
            .copied()
            .unwrap_or_else(|| current[0] as u16);
        writer.write(code, code_size);

        if next_code < MAX_CODE {
            dictionary.insert(extended, next_code);
            // The decoder lags one dictionary entry behind, so the width
            // grows one entry later here than on the decode side.
            if next_code == 1 << code_size && code_size < MAX_CODE_SIZE {
                code_size += 1;
            }
            next_code += 1;
        } else {
            writer.write(clear_code, code_size);
            dictionary.clear();
            code_size = min_code_size + 1;
            next_code = end_code + 1;
        }

        current = vec![byte];
    }

    let code = dictionary
        .get(&current)
        .copied()
        .unwrap_or_else(|| current[0] as u16);
    writer.write(code, code_size);
    writer.write(end_code, code_size);
    Ok(writer.finish())
}

fn get_string(dictionary: &[LzwEntry], mut code: usize) -> Vec<u8> {
    let mut result = Vec::new();
    while let Some(entry) = dictionary.get(code) {
        result.push(entry.suffix);
        if let Some(prefix) = entry.prefix {
            code = prefix as usize;
        } else {
            break;
        }
    }
    result.reverse();
    result
}

pub fn lzw_decompression(data: &[u8], min_code_size: u8) -> Result<Vec<u8>, LzwDecompressionError> {
    if !check_code_size(min_code_size) {
        return Err(LzwDecompressionError::InvalidCodeSize(min_code_size));
    }

    let root_count = 1u16 << min_code_size;
    let clear_code = root_count as usize;
    let end_code = clear_code + 1;

    let make_roots = || {
        let mut dictionary = Vec::with_capacity(MAX_CODE as usize);
        for value in 0..root_count {
            dictionary.push(LzwEntry {
                prefix: None,
                suffix: value as u8,
            });
        }
        // Placeholder slots for the clear and end codes; never dereferenced.
        dictionary.push(LzwEntry {
            prefix: None,
            suffix: 0,
        });
        dictionary.push(LzwEntry {
            prefix: None,
            suffix: 0,
        });
        dictionary
    };

    let mut reader = BitReader::new(data);
    let mut dictionary = make_roots();
    let mut code_size = min_code_size + 1;
    let mut previous: Option<usize> = None;
    let mut result = Vec::new();

    loop {
        let code = reader.read(code_size)? as usize;

        if code == clear_code {
            dictionary = make_roots();
            code_size = min_code_size + 1;
            previous = None;
            continue;
        }
        if code == end_code {
            return Ok(result);
        }

        let Some(prev) = previous else {
            // The first code after a reset must be a root.
            if code >= clear_code {
                return Err(LzwDecompressionError::InvalidCode {
                    code,
                    dict_size: dictionary.len(),
                });
            }
            result.push(code as u8);
            previous = Some(code);
            continue;
        };

        let current_string = if code < dictionary.len() {
            get_string(&dictionary, code)
        } else if code == dictionary.len() && (dictionary.len() as u16) < MAX_CODE {
            let mut s = get_string(&dictionary, prev);
            s.push(s[0]);
            s
        } else {
            return Err(LzwDecompressionError::InvalidCode {
                code,
                dict_size: dictionary.len(),
            });
        };

        result.extend(&current_string);

        if (dictionary.len() as u16) < MAX_CODE {
            dictionary.push(LzwEntry {
                prefix: Some(prev as u16),
                suffix: current_string[0],
            });
            if dictionary.len() as u16 == 1 << code_size && code_size < MAX_CODE_SIZE {
                code_size += 1;
            }
        }

        previous = Some(code);
    }
}
