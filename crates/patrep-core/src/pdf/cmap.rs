//! `ToUnicode` CMap parsing and font-aware string decoding.

use std::collections::HashMap;

/// Character code to Unicode mapping read from a font's `ToUnicode` stream.
#[derive(Debug, Clone, Default)]
pub struct ToUnicodeMap {
    map: HashMap<u32, String>,
    /// Width of one character code in bytes.
    code_len: usize,
}

impl ToUnicodeMap {
    /// Parse the decompressed body of a `ToUnicode` CMap stream.
    ///
    /// Only `bfchar` and `bfrange` sections are read; everything else in the
    /// program is ignored.
    pub fn parse(data: &[u8]) -> Self {
        let tokens = tokenize(data);
        let mut map = HashMap::new();
        let mut code_len = 0usize;
        let mut i = 0;

        while i < tokens.len() {
            match &tokens[i] {
                Token::Word(w) if w == "begincodespacerange" => {
                    if let Some(Token::Hex(lo)) = tokens.get(i + 1) {
                        code_len = code_len.max(lo.len());
                    }
                    i += 1;
                }
                Token::Word(w) if w == "beginbfchar" => {
                    i += 1;
                    while let (Some(Token::Hex(src)), Some(Token::Hex(dst))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        code_len = code_len.max(src.len());
                        map.insert(code_value(src), utf16_string(dst));
                        i += 2;
                    }
                }
                Token::Word(w) if w == "beginbfrange" => {
                    i += 1;
                    while let (Some(Token::Hex(lo)), Some(Token::Hex(hi))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        code_len = code_len.max(lo.len());
                        let (lo_code, hi_code) = (code_value(lo), code_value(hi));
                        match tokens.get(i + 2) {
                            Some(Token::Hex(dst)) => {
                                let base = utf16_units(dst);
                                for (offset, code) in (lo_code..=hi_code).enumerate() {
                                    let mut units = base.clone();
                                    if let Some(last) = units.last_mut() {
                                        *last = last.wrapping_add(offset as u16);
                                    }
                                    map.insert(code, String::from_utf16_lossy(&units));
                                }
                                i += 3;
                            }
                            Some(Token::ArrayStart) => {
                                i += 3;
                                let mut code = lo_code;
                                while let Some(Token::Hex(dst)) = tokens.get(i) {
                                    if code <= hi_code {
                                        map.insert(code, utf16_string(dst));
                                    }
                                    code += 1;
                                    i += 1;
                                }
                                if let Some(Token::ArrayEnd) = tokens.get(i) {
                                    i += 1;
                                }
                            }
                            _ => break,
                        }
                    }
                }
                _ => i += 1,
            }
        }

        Self {
            map,
            code_len: code_len.clamp(1, 4),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Decode a shown string. Unmapped codes are dropped.
    pub fn decode(&self, bytes: &[u8]) -> String {
        bytes
            .chunks(self.code_len)
            .filter_map(|chunk| {
                let code = chunk.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
                self.map.get(&code).map(String::as_str)
            })
            .collect()
    }
}

/// Decoder for strings shown with one font.
#[derive(Debug, Clone, Default)]
pub struct FontDecoder {
    to_unicode: Option<ToUnicodeMap>,
}

impl FontDecoder {
    pub fn new(to_unicode: Option<ToUnicodeMap>) -> Self {
        Self {
            to_unicode: to_unicode.filter(|m| !m.is_empty()),
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> String {
        match &self.to_unicode {
            Some(map) => map.decode(bytes),
            None => decode_text_simple(bytes),
        }
    }
}

/// Decode a PDF string without font information: UTF-16BE with BOM, then
/// UTF-8, then Latin-1.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Hex(Vec<u8>),
    Word(String),
    ArrayStart,
    ArrayEnd,
}

fn tokenize(data: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let c = data[i];
        match c {
            b'<' if data.get(i + 1) == Some(&b'<') => i += 2,
            b'>' if data.get(i + 1) == Some(&b'>') => i += 2,
            b'<' => {
                let end = data[i + 1..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map_or(data.len(), |p| i + 1 + p);
                tokens.push(Token::Hex(parse_hex(&data[i + 1..end])));
                i = end + 1;
            }
            b'[' => {
                tokens.push(Token::ArrayStart);
                i += 1;
            }
            b']' => {
                tokens.push(Token::ArrayEnd);
                i += 1;
            }
            b'%' => {
                while i < data.len() && data[i] != b'\n' && data[i] != b'\r' {
                    i += 1;
                }
            }
            c if c.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < data.len()
                    && !data[i].is_ascii_whitespace()
                    && !matches!(data[i], b'<' | b'>' | b'[' | b']' | b'%')
                {
                    i += 1;
                }
                if i == start {
                    i += 1;
                    continue;
                }
                tokens.push(Token::Word(String::from_utf8_lossy(&data[start..i]).into_owned()));
            }
        }
    }

    tokens
}

fn parse_hex(digits: &[u8]) -> Vec<u8> {
    let nibbles: Vec<u8> = digits
        .iter()
        .filter_map(|&b| (b as char).to_digit(16).map(|d| d as u8))
        .collect();

    nibbles
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}

fn code_value(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => *single as u16,
            _ => 0,
        })
        .collect()
}

fn utf16_string(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CMAP: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0003> <0020>
<0011> <002E>
endbfchar
2 beginbfrange
<0024> <0026> <0041>
<0050> <0051> [<0066> <00660069>]
endbfrange
endcmap";

    #[test]
    fn test_parse_bfchar_and_bfrange() {
        let map = ToUnicodeMap::parse(CMAP);
        assert_eq!(map.code_len, 2);
        assert_eq!(map.decode(&[0x00, 0x24, 0x00, 0x03, 0x00, 0x26]), "A C");
        assert_eq!(map.decode(&[0x00, 0x25, 0x00, 0x11]), "B.");
        assert_eq!(map.decode(&[0x00, 0x50, 0x00, 0x51]), "ffi");
    }

    #[test]
    fn test_unmapped_codes_are_dropped() {
        let map = ToUnicodeMap::parse(CMAP);
        assert_eq!(map.decode(&[0x00, 0x24, 0x07, 0x77]), "A");
    }

    #[test]
    fn test_single_byte_cmap() {
        let map = ToUnicodeMap::parse(b"1 beginbfchar <41> <0048> endbfchar");
        assert_eq!(map.code_len, 1);
        assert_eq!(map.decode(b"AA"), "HH");
    }

    #[test]
    fn test_decode_text_simple() {
        assert_eq!(decode_text_simple(b"HOLD 42"), "HOLD 42");
        assert_eq!(decode_text_simple(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0x49]), "HI");
        assert_eq!(decode_text_simple(&[0x47, 0x72, 0xF6, 0xDF, 0x65]), "Größe");
    }

    #[test]
    fn test_font_decoder_falls_back_without_cmap() {
        let decoder = FontDecoder::new(Some(ToUnicodeMap::default()));
        assert_eq!(decoder.decode(b"REV A"), "REV A");
    }
}
