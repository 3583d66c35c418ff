//! Reader for Mojangson, the legacy text notation of NBT (`{Rows:3b,Inventory:[{Slot:0b,id:"stone"}]}`).
//!
//! The grammar is the permissive one older data files were written in: unquoted keys and strings,
//! `N:` index prefixes inside lists and trailing commas are accepted. Numbers take an optional
//! `b`, `s`, `l`, `f` or `d` suffix; unsuffixed integers are ints and unsuffixed decimals are doubles.
//! A bare word that is not a number reads as a string, `true` and `false` read as bytes.

use thiserror::Error;

use crate::{NbtCompound, NbtList, NbtTag, MAX_DEPTH};

#[derive(Debug, Error)]
#[error("{message} at position {pos}")]
pub struct MojangsonError {
    pub message: String,
    pub pos: usize,
}

/// Parses a Mojangson document. The root must be a compound and nothing but whitespace may follow it.
pub fn parse(text: &str) -> Result<NbtCompound, MojangsonError> {
    let mut parser = Parser {
        source: text.as_bytes(),
        pos: 0,
        depth: 0,
    };
    parser.skip_whitespace();
    let root = parser.read_compound()?;
    parser.skip_whitespace();
    if parser.pos < parser.source.len() {
        return Err(parser.error("trailing data after root compound"));
    }
    Ok(root)
}

fn is_unquoted(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'_' | b'-' | b'.' | b'+')
}

struct Parser<'source> {
    source: &'source [u8],
    pos: usize,
    depth: usize,
}

impl<'source> Parser<'source> {
    fn error(&self, message: impl Into<String>) -> MojangsonError {
        MojangsonError {
            message: message.into(),
            pos: self.pos,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: u8) -> Result<(), MojangsonError> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.error(format!(
                "expected '{}', found '{}'",
                expected as char, c as char
            ))),
            None => Err(self.error(format!("expected '{}', found end of text", expected as char))),
        }
    }

    /// Consumes `c` if it is the next non-blank character.
    fn eat(&mut self, c: u8) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn enter(&mut self) -> Result<(), MojangsonError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            Err(self.error(format!("nested deeper than {MAX_DEPTH} levels")))
        } else {
            Ok(())
        }
    }

    fn read_compound(&mut self) -> Result<NbtCompound, MojangsonError> {
        self.expect(b'{')?;
        self.enter()?;
        let mut compound = NbtCompound::new();
        loop {
            if self.eat(b'}') {
                break;
            }
            let key = self.read_key()?;
            self.expect(b':')?;
            if let Some(value) = self.read_value()? {
                compound.insert(key, value);
            }
            if !self.eat(b',') {
                self.expect(b'}')?;
                break;
            }
        }
        self.depth -= 1;
        Ok(compound)
    }

    fn read_key(&mut self) -> Result<String, MojangsonError> {
        self.skip_whitespace();
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => self.read_quoted(quote),
            _ => {
                let word = self.read_word();
                if word.is_empty() {
                    Err(self.error("expected a key"))
                } else {
                    Ok(word.to_owned())
                }
            }
        }
    }

    fn read_word(&mut self) -> &'source str {
        let source = self.source;
        let start = self.pos;
        while self.peek().is_some_and(is_unquoted) {
            self.pos += 1;
        }
        // Only ASCII bytes were consumed.
        std::str::from_utf8(&source[start..self.pos]).unwrap_or_default()
    }

    fn read_quoted(&mut self, quote: u8) -> Result<String, MojangsonError> {
        self.pos += 1;
        let mut bytes = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string")),
                Some(b'\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(c @ (b'\\' | b'"' | b'\'')) => bytes.push(c),
                        Some(c) => {
                            return Err(self.error(format!("invalid escape '\\{}'", c as char)))
                        }
                        None => return Err(self.error("unterminated string")),
                    }
                }
                Some(c) if c == quote => {
                    self.pos += 1;
                    break;
                }
                Some(c) => bytes.push(c),
            }
            self.pos += 1;
        }
        String::from_utf8(bytes).map_err(|_| self.error("string is not valid UTF-8"))
    }

    /// Reads any value. Empty lists read as `None`.
    fn read_value(&mut self) -> Result<Option<NbtTag>, MojangsonError> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'{') => Ok(Some(NbtTag::Compound(self.read_compound()?))),
            Some(b'[') => self.read_list(),
            Some(quote @ (b'"' | b'\'')) => Ok(Some(NbtTag::String(self.read_quoted(quote)?))),
            Some(_) => {
                let start = self.pos;
                let word = self.read_word();
                if word.is_empty() {
                    self.pos = start;
                    Err(self.error("expected a value"))
                } else {
                    Ok(Some(scalar(word)))
                }
            }
            None => Err(self.error("expected a value, found end of text")),
        }
    }

    fn read_list(&mut self) -> Result<Option<NbtTag>, MojangsonError> {
        self.expect(b'[')?;
        self.enter()?;

        let array_kind = self.typed_array_prefix();
        let result = match array_kind {
            Some(b'B') => self.read_array(|v| i8::try_from(v).ok().map(i64::from)).map(|values| {
                Some(NbtTag::ByteArray(values.into_iter().map(|v| v as i8).collect()))
            }),
            Some(b'I') => self.read_array(|v| i32::try_from(v).ok().map(i64::from)).map(|values| {
                Some(NbtTag::IntArray(values.into_iter().map(|v| v as i32).collect()))
            }),
            Some(other) => Err(self.error(format!("unsupported array type '{}'", other as char))),
            None => self.read_list_items(),
        };

        self.depth -= 1;
        result
    }

    /// Consumes a `B;`, `I;` or `L;` array prefix if one follows.
    fn typed_array_prefix(&mut self) -> Option<u8> {
        self.skip_whitespace();
        let kind = self.peek()?;
        let after = self.source.get(self.pos + 1).copied();
        if matches!(kind, b'B' | b'I' | b'L') && after == Some(b';') {
            self.pos += 2;
            Some(kind)
        } else {
            None
        }
    }

    fn read_array(
        &mut self,
        fit: impl Fn(i64) -> Option<i64>,
    ) -> Result<Vec<i64>, MojangsonError> {
        let mut values = Vec::new();
        loop {
            if self.eat(b']') {
                break;
            }
            self.skip_whitespace();
            let start = self.pos;
            let value = match self.read_value()? {
                Some(NbtTag::Byte(v)) => fit(v.into()),
                Some(NbtTag::Short(v)) => fit(v.into()),
                Some(NbtTag::Int(v)) => fit(v.into()),
                Some(NbtTag::Long(v)) => fit(v),
                _ => None,
            };
            let Some(value) = value else {
                self.pos = start;
                return Err(self.error("array element out of range or not an integer"));
            };
            values.push(value);
            if !self.eat(b',') {
                self.expect(b']')?;
                break;
            }
        }
        Ok(values)
    }

    fn read_list_items(&mut self) -> Result<Option<NbtTag>, MojangsonError> {
        let mut list = NbtList::new();
        loop {
            if self.eat(b']') {
                break;
            }
            self.skip_legacy_index();
            let start = self.pos;
            if let Some(value) = self.read_value()? {
                if list.push(value).is_err() {
                    self.pos = start;
                    return Err(self.error(format!("list of {} holds another type", list.element())));
                }
            }
            if !self.eat(b',') {
                self.expect(b']')?;
                break;
            }
        }
        Ok((!list.is_empty()).then_some(NbtTag::List(list)))
    }

    /// Skips the `0:` index older writers put before list elements.
    fn skip_legacy_index(&mut self) {
        self.skip_whitespace();
        let digits = self.source[self.pos..]
            .iter()
            .take_while(|c| c.is_ascii_digit())
            .count();
        if digits > 0 && self.source.get(self.pos + digits) == Some(&b':') {
            self.pos += digits + 1;
        }
    }
}

/// Maps an unquoted word to a number, a boolean byte, or a string.
fn scalar(word: &str) -> NbtTag {
    match word {
        "true" => return NbtTag::Byte(1),
        "false" => return NbtTag::Byte(0),
        _ => {}
    }

    let (body, suffix) = match word.as_bytes().last().map(u8::to_ascii_lowercase) {
        Some(c @ (b'b' | b's' | b'l' | b'f' | b'd')) if word.len() > 1 => {
            (&word[..word.len() - 1], Some(c))
        }
        _ => (word, None),
    };
    let looks_numeric = body
        .bytes()
        .all(|c| c.is_ascii_digit() || matches!(c, b'-' | b'+' | b'.' | b'e' | b'E'))
        && body.bytes().any(|c| c.is_ascii_digit());

    let parsed = if !looks_numeric {
        None
    } else {
        match suffix {
            Some(b'b') => body.parse().ok().map(NbtTag::Byte),
            Some(b's') => body.parse().ok().map(NbtTag::Short),
            Some(b'l') => body.parse().ok().map(NbtTag::Long),
            Some(b'f') => body.parse().ok().map(NbtTag::Float),
            Some(b'd') => body.parse().ok().map(NbtTag::Double),
            _ if body.contains(['.', 'e', 'E']) => body.parse().ok().map(NbtTag::Double),
            _ => body.parse().ok().map(NbtTag::Int),
        }
    };

    parsed.unwrap_or_else(|| NbtTag::String(word.to_owned()))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Tag;

    #[test]
    fn scalars() {
        let tests: &[(&str, NbtTag)] = &[
            ("3b", NbtTag::Byte(3)),
            ("-3B", NbtTag::Byte(-3)),
            ("300s", NbtTag::Short(300)),
            ("12", NbtTag::Int(12)),
            ("-7", NbtTag::Int(-7)),
            ("9000000000L", NbtTag::Long(9_000_000_000)),
            ("0.5f", NbtTag::Float(0.5)),
            ("0.5", NbtTag::Double(0.5)),
            ("2d", NbtTag::Double(2.0)),
            ("true", NbtTag::Byte(1)),
            ("false", NbtTag::Byte(0)),
            ("minecraft.stone", NbtTag::String("minecraft.stone".into())),
            ("300b", NbtTag::String("300b".into())),
            ("3000000000", NbtTag::String("3000000000".into())),
            ("b", NbtTag::String("b".into())),
            ("1.2.3", NbtTag::String("1.2.3".into())),
        ];

        for (text, expected) in tests {
            assert_eq!(&scalar(text), expected, "{text}");
        }
    }

    #[test]
    fn inventory_document() {
        let root = parse(
            r#"{Rows:3b, OwnerName:"Steve \"the\" miner", Inventory:[
                0:{Slot:0b,id:"minecraft:stone",Count:64b,Damage:0s},
                1:{Slot:17b,id:'minecraft:dirt',Count:1b,},
            ]}"#,
        )
        .unwrap();

        assert_eq!(root.get("Rows"), Some(&NbtTag::Byte(3)));
        assert_eq!(root.string("OwnerName"), Some("Steve \"the\" miner"));
        let items = root.list("Inventory").unwrap();
        assert_eq!(items.element(), Tag::Compound);
        let slots: Vec<_> = items.compounds().map(|item| item.byte("Slot")).collect();
        assert_eq!(slots, [Some(0), Some(17)]);
        assert_eq!(
            items.compounds().nth(1).unwrap().string("id"),
            Some("minecraft:dirt")
        );
    }

    #[test]
    fn typed_arrays() {
        let root = parse("{b:[B;1b,-2b,3], i:[I; 1, -2, 3], e:[I;]}").unwrap();
        assert_eq!(root.byte_array("b"), Some(&[1i8, -2, 3][..]));
        assert_eq!(root.int_array("i"), Some(&[1, -2, 3][..]));
        assert_eq!(root.int_array("e"), Some(&[] as &[i32]));

        for text in ["{l:[L;1l]}", "{b:[B;300]}", "{i:[I;\"x\"]}"] {
            assert!(parse(text).is_err(), "{text}");
        }
    }

    #[test]
    fn empty_lists_are_dropped() {
        let root = parse("{a:[], b:[ ], c:1}").unwrap();
        assert_eq!(root.keys().collect::<Vec<_>>(), ["c"]);
    }

    #[test]
    fn rejects_bad_documents() {
        let tests = [
            "",
            "[1,2]",
            "{a:1",
            "{a 1}",
            "{a:}",
            "{:1}",
            "{a:\"open}",
            "{a:[1,\"x\"]}",
            "{a:1} trailing",
            "{a:\"bad \\n escape\"}",
        ];

        for text in tests {
            assert!(parse(text).is_err(), "{text:?} should not parse");
        }
    }

    #[test]
    fn error_position() {
        let err = parse("{a:1,b:[1,\"x\"]}").unwrap_err();
        assert_eq!(err.pos, 10);
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let nested = |depth: usize| format!("{}1{}", "{a:".repeat(depth), "}".repeat(depth));
        assert!(parse(&nested(MAX_DEPTH)).is_ok());
        assert!(parse(&nested(MAX_DEPTH + 1)).is_err());
    }
}
