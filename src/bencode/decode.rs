//! Bencode decoder
//!
//! Recursive descent over a borrowed buffer. The cursor lives in [`Decoder`], so
//! nested calls share position without any global state.
//!
//! Strictness: integers may carry leading zeros or `-0` and must fit in `i64`.
//! [`decode`] ignores bytes after the outermost value and reports how many were
//! consumed; some `.torrent` files in the wild carry trailing padding. Use
//! [`decode_all`] to reject trailing data instead.
//!
//! Lists and dictionaries may nest at most [`MAX_DEPTH`] levels.

use tracing::trace;

use crate::bencode::value::{BencodeDict, BencodeValue};
use crate::error::{ResolverError, Result};

/// Maximum nesting of lists and dictionaries
pub const MAX_DEPTH: usize = 64;

/// Cursor over a bencoded buffer
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, depth: 0 }
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Decode the next complete value
    pub fn decode_value(&mut self) -> Result<BencodeValue> {
        match self.peek()? {
            b'i' => self.decode_int().map(BencodeValue::Int),
            b'l' => self.decode_list(),
            b'd' => self.decode_dict(),
            b'0'..=b'9' => self.decode_bytes().map(BencodeValue::Bytes),
            other => Err(ResolverError::bencode_error(
                format!("Unexpected byte 0x{:02x} where a value was expected", other),
                self.pos,
            )),
        }
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= MAX_DEPTH {
            return Err(ResolverError::bencode_error(
                format!("Nesting too deep (limit {})", MAX_DEPTH),
                self.pos,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn peek(&self) -> Result<u8> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or_else(|| ResolverError::bencode_error("Unexpected end of data", self.pos))
    }

    /// Scan forward to `terminator`, returning the bytes in between and moving past it
    fn take_until(&mut self, terminator: u8, what: &str) -> Result<&'a [u8]> {
        let data = self.data;
        let start = self.pos;
        let offset = data[start..]
            .iter()
            .position(|&b| b == terminator)
            .ok_or_else(|| ResolverError::bencode_error(format!("Unterminated {}", what), start))?;
        self.pos = start + offset + 1;
        Ok(&data[start..start + offset])
    }

    fn decode_int(&mut self) -> Result<i64> {
        let start = self.pos;
        self.pos += 1; // 'i'
        let digits = self.take_until(b'e', "integer")?;
        parse_int(digits).ok_or_else(|| {
            ResolverError::bencode_error(
                format!("Invalid integer '{}'", String::from_utf8_lossy(digits)),
                start,
            )
        })
    }

    fn decode_bytes(&mut self) -> Result<Vec<u8>> {
        let start = self.pos;
        let len_digits = self.take_until(b':', "string length")?;
        let length = std::str::from_utf8(len_digits)
            .ok()
            .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| {
                ResolverError::bencode_error(
                    format!("Invalid string length '{}'", String::from_utf8_lossy(len_digits)),
                    start,
                )
            })?;

        if length > self.remaining() {
            return Err(ResolverError::bencode_error(
                format!("String length {} runs past end of data ({} bytes left)", length, self.remaining()),
                start,
            ));
        }

        let bytes = self.data[self.pos..self.pos + length].to_vec();
        self.pos += length;
        Ok(bytes)
    }

    fn decode_list(&mut self) -> Result<BencodeValue> {
        self.enter()?;
        self.pos += 1; // 'l'
        let mut list = Vec::new();
        while self.peek()? != b'e' {
            list.push(self.decode_value()?);
        }
        self.pos += 1;
        self.depth -= 1;
        Ok(BencodeValue::List(list))
    }

    fn decode_dict(&mut self) -> Result<BencodeValue> {
        self.enter()?;
        self.pos += 1; // 'd'
        let mut dict = BencodeDict::new();
        while self.peek()? != b'e' {
            let key_pos = self.pos;
            let key = match self.decode_value()? {
                BencodeValue::Bytes(b) => b,
                other => {
                    return Err(ResolverError::bencode_error(
                        format!("Dictionary key must be a byte string, found {}", other.kind()),
                        key_pos,
                    ))
                }
            };
            let value = self.decode_value()?;
            dict.insert(key, value);
        }
        self.pos += 1;
        self.depth -= 1;
        Ok(BencodeValue::Dict(dict))
    }
}

fn parse_int(digits: &[u8]) -> Option<i64> {
    let unsigned = digits.strip_prefix(b"-").unwrap_or(digits);
    if unsigned.is_empty() || !unsigned.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

/// Decode the value at the start of `data`, returning it with the number of bytes consumed
pub fn decode(data: &[u8]) -> Result<(BencodeValue, usize)> {
    let mut decoder = Decoder::new(data);
    let value = decoder.decode_value()?;
    if decoder.remaining() > 0 {
        trace!("Ignoring {} trailing bytes after bencoded value", decoder.remaining());
    }
    Ok((value, decoder.position()))
}

/// Decode `data` as exactly one value, rejecting trailing bytes
pub fn decode_all(data: &[u8]) -> Result<BencodeValue> {
    let (value, consumed) = decode(data)?;
    if consumed != data.len() {
        return Err(ResolverError::bencode_error(
            format!("{} trailing bytes after value", data.len() - consumed),
            consumed,
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_value(data: &[u8]) -> BencodeValue {
        decode(data).unwrap().0
    }

    #[test]
    fn test_decode_int() {
        assert_eq!(decode_value(b"i42e"), BencodeValue::Int(42));
        assert_eq!(decode_value(b"i-17e"), BencodeValue::Int(-17));
        assert_eq!(decode_value(b"i0e"), BencodeValue::Int(0));
    }

    #[test]
    fn test_decode_int_is_lenient_about_leading_zeros() {
        assert_eq!(decode_value(b"i007e"), BencodeValue::Int(7));
        assert_eq!(decode_value(b"i-0e"), BencodeValue::Int(0));
    }

    #[test]
    fn test_decode_int_errors() {
        assert!(decode(b"ie").is_err());
        assert!(decode(b"i-e").is_err());
        assert!(decode(b"i4x2e").is_err());
        assert!(decode(b"i42").is_err());
        assert!(decode(b"i99999999999999999999e").is_err());
    }

    #[test]
    fn test_decode_string() {
        assert_eq!(decode_value(b"4:spam"), BencodeValue::bytes("spam"));
        assert_eq!(decode_value(b"0:"), BencodeValue::bytes(""));
        // Binary payloads are kept verbatim
        assert_eq!(decode_value(b"3:\x00\xff:"), BencodeValue::Bytes(vec![0x00, 0xff, b':']));
    }

    #[test]
    fn test_decode_string_past_end() {
        let err = decode(b"10:short").unwrap_err();
        assert!(matches!(err, ResolverError::BencodeDecodeError { position: 0, .. }));
    }

    #[test]
    fn test_decode_string_non_numeric_length() {
        assert!(decode(b"4x:spam").is_err());
        assert!(decode(b"4").is_err());
    }

    #[test]
    fn test_decode_list() {
        assert_eq!(
            decode_value(b"l4:spami42ee"),
            BencodeValue::List(vec![BencodeValue::bytes("spam"), BencodeValue::Int(42)])
        );
        assert_eq!(decode_value(b"le"), BencodeValue::List(vec![]));
    }

    #[test]
    fn test_decode_nested_dict() {
        let value = decode_value(b"d4:infod4:name4:demoe3:numi1ee");
        let info = value.get(b"info").unwrap();
        assert_eq!(info.get(b"name").and_then(|v| v.as_bytes()), Some(b"demo".as_ref()));
        assert_eq!(value.get(b"num").and_then(|v| v.as_int()), Some(1));
    }

    #[test]
    fn test_decode_dict_non_string_key() {
        let err = decode(b"di1ei2ee").unwrap_err();
        assert!(err.to_string().contains("byte string"));
    }

    #[test]
    fn test_decode_unterminated_containers() {
        assert!(decode(b"l4:spam").is_err());
        assert!(decode(b"d3:key5:value").is_err());
    }

    #[test]
    fn test_decode_unknown_leading_byte() {
        let err = decode(b"x").unwrap_err();
        assert!(matches!(err, ResolverError::BencodeDecodeError { position: 0, .. }));
        assert!(decode(b"").is_err());
    }

    #[test]
    fn test_trailing_bytes_are_ignored_by_decode() {
        let (value, consumed) = decode(b"i1egarbage").unwrap();
        assert_eq!(value, BencodeValue::Int(1));
        assert_eq!(consumed, 3);
    }

    #[test]
    fn test_decode_all_rejects_trailing_bytes() {
        assert_eq!(decode_all(b"i1e").unwrap(), BencodeValue::Int(1));
        let err = decode_all(b"i1eXX").unwrap_err();
        assert!(matches!(err, ResolverError::BencodeDecodeError { position: 3, .. }));
    }

    #[test]
    fn test_decoder_cursor_reads_sequential_values() {
        let mut decoder = Decoder::new(b"i1e3:abc");
        assert_eq!(decoder.decode_value().unwrap(), BencodeValue::Int(1));
        assert_eq!(decoder.position(), 3);
        assert_eq!(decoder.decode_value().unwrap(), BencodeValue::bytes("abc"));
        assert_eq!(decoder.remaining(), 0);
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| [vec![b'l'; depth], vec![b'e'; depth]].concat();

        assert!(decode_all(&nested(MAX_DEPTH)).is_ok());

        let err = decode_all(&nested(MAX_DEPTH + 1)).unwrap_err();
        assert!(matches!(err, ResolverError::BencodeDecodeError { position, .. } if position == MAX_DEPTH));
        assert!(err.to_string().contains("Nesting too deep"));
    }

    #[test]
    fn test_deeply_nested_input_is_rejected() {
        assert!(decode(&vec![b'l'; 200_000]).is_err());
        assert!(decode(&b"d1:a".repeat(100_000)).is_err());
    }

    #[test]
    fn test_depth_resets_between_siblings() {
        let inner = [vec![b'l'; MAX_DEPTH - 1], vec![b'e'; MAX_DEPTH - 1]].concat();
        let data = [b"l".to_vec(), inner.clone(), inner, b"e".to_vec()].concat();
        assert!(decode_all(&data).is_ok());
    }
}
