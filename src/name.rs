//! Domain names: parsing from text, RFC 1035 §4.1.4 compressed decoding,
//! uncompressed encoding, and the label iteration used by [`crate::nametree`].

use crate::buffer::{BufferError, ReadCursor, WriteBuffer};
use std::fmt;

/// Wire names are capped at 255 bytes including the terminal root label.
pub const NAME_MAX_LEN: usize = 255;
/// RFC 1035 caps a label at 63 bytes (the top two bits of the length byte
/// are reserved for the length/pointer tag).
pub const LABEL_MAX_LEN: usize = 63;
/// 127 non-root labels is the most that can fit in 255 bytes (each
/// contributing at least a 1-byte length prefix and 1 byte of content).
pub const MAX_LABELS: usize = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    LabelTooLong,
    NameTooLong,
    TooManyLabels,
    InvalidLabelHeader,
    InvalidPointerAddress,
    NoRootLabel,
    InvalidName,
    WildcardNotFirst,
    WildcardNotAlone,
    NotASubdomain,
    NotEnoughBytes,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::LabelTooLong => "label exceeds 63 bytes",
            Error::NameTooLong => "name exceeds 255 encoded bytes",
            Error::TooManyLabels => "name has more than 127 labels",
            Error::InvalidLabelHeader => "reserved label header bits",
            Error::InvalidPointerAddress => "compression pointer does not point strictly backward",
            Error::NoRootLabel => "buffer ended before the terminating root label",
            Error::InvalidName => "not a valid domain name",
            Error::WildcardNotFirst => "wildcard label is not the leftmost label",
            Error::WildcardNotAlone => "label mixes '*' with other characters",
            Error::NotASubdomain => "name is not a subdomain of the given origin",
            Error::NotEnoughBytes => "not enough bytes to decode a name",
        };
        write!(f, "{msg}")
    }
}

impl std::error::Error for Error {}

impl From<BufferError> for Error {
    fn from(_: BufferError) -> Self {
        Error::NotEnoughBytes
    }
}

/// An in-memory domain name.
///
/// `octets` is the uncompressed wire form (length-prefixed labels followed by
/// the zero-length root label); `labels` is the same data split out leaf to
/// TLD, lowercased, for cheap iteration and comparison. Both are kept in sync
/// by the constructors below; there is no public mutator.
#[derive(Clone)]
pub struct Name {
    octets: Vec<u8>,
    labels: Vec<Vec<u8>>,
}

impl Name {
    pub fn root() -> Name {
        Name {
            octets: vec![0],
            labels: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn encoded_length(&self) -> usize {
        self.octets.len()
    }

    /// Labels leaf to TLD, e.g. `["www", "example", "com"]`.
    pub fn labels(&self) -> impl Iterator<Item = &[u8]> {
        self.labels.iter().map(|l| l.as_slice())
    }

    /// Labels TLD to leaf, e.g. `["com", "example", "www"]`.
    pub fn labels_reverse(&self) -> impl Iterator<Item = &[u8]> {
        self.labels.iter().rev().map(|l| l.as_slice())
    }

    pub fn as_wire_bytes(&self) -> &[u8] {
        &self.octets
    }

    fn from_labels(labels: Vec<Vec<u8>>) -> Result<Name, Error> {
        if labels.len() > MAX_LABELS {
            return Err(Error::TooManyLabels);
        }
        for (i, label) in labels.iter().enumerate() {
            if label.is_empty() || label.len() > LABEL_MAX_LEN {
                return Err(Error::LabelTooLong);
            }
            if label.contains(&b'*') {
                if label.as_slice() != b"*" {
                    return Err(Error::WildcardNotAlone);
                }
                if i != 0 {
                    return Err(Error::WildcardNotFirst);
                }
            }
        }
        let mut octets = Vec::with_capacity(labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1);
        for label in &labels {
            octets.push(label.len() as u8);
            octets.extend_from_slice(label);
        }
        octets.push(0);
        if octets.len() > NAME_MAX_LEN {
            return Err(Error::NameTooLong);
        }
        Ok(Name { octets, labels })
    }

    /// Parses a dotted textual name (`"www.example.com"` or
    /// `"www.example.com."`). A bare `"."` is the root name.
    pub fn from_text(s: &str) -> Result<Name, Error> {
        if s == "." {
            return Ok(Name::root());
        }
        let trimmed = s.strip_suffix('.').unwrap_or(s);
        if trimmed.is_empty() {
            return Ok(Name::root());
        }
        let labels = trimmed
            .split('.')
            .map(|label| label.as_bytes().to_ascii_lowercase())
            .collect::<Vec<_>>();
        Name::from_labels(labels)
    }

    /// Decodes a name starting at `cursor`'s current position, following
    /// RFC 1035 §4.1.4 compression pointers. `cursor` is advanced only
    /// through the sequential bytes the *reader* would see: once a pointer
    /// is followed, `cursor` stops advancing and only the internal parse
    /// position continues, per the spec's reader/parse cursor split.
    pub fn decode(cursor: &mut ReadCursor) -> Result<Name, Error> {
        let mut labels: Vec<Vec<u8>> = Vec::new();
        let mut total_len: usize = 0;
        let mut parse = *cursor;
        let mut reader_caught_up = true;

        loop {
            let label_start = parse.position();
            let first = parse.take_u8().map_err(|_| Error::NoRootLabel)?;
            match first & 0xC0 {
                0x00 => {
                    let len = (first & 0x3F) as usize;
                    if len == 0 {
                        if reader_caught_up {
                            cursor.skip(1)?;
                        }
                        break;
                    }
                    let bytes = parse.take(len).map_err(|_| Error::NoRootLabel)?;
                    if reader_caught_up {
                        cursor.skip(1 + len)?;
                    }
                    total_len += 1 + len;
                    if total_len + 1 > NAME_MAX_LEN {
                        return Err(Error::NameTooLong);
                    }
                    labels.push(bytes.to_ascii_lowercase());
                    if labels.len() > MAX_LABELS {
                        return Err(Error::TooManyLabels);
                    }
                }
                0xC0 => {
                    let second = parse.take_u8().map_err(|_| Error::NoRootLabel)?;
                    let ptr = (((first & 0x3F) as usize) << 8) | second as usize;
                    if ptr >= label_start {
                        return Err(Error::InvalidPointerAddress);
                    }
                    if reader_caught_up {
                        cursor.skip(2)?;
                        reader_caught_up = false;
                    }
                    parse = parse.jump(ptr);
                }
                _ => return Err(Error::InvalidLabelHeader),
            }
        }

        Name::from_labels(labels)
    }

    /// Returns the decoded length (in the convention used by
    /// [`Name::to_dotted_string`]: sum of label lengths plus one separator
    /// per label, i.e. excluding the terminal root byte) and the label
    /// count, without allocating a [`Name`]. Used by callers that need to
    /// size a destination before copying.
    pub fn decoded_length(cursor: &ReadCursor) -> Result<(usize, usize), Error> {
        let mut parse = *cursor;
        let mut total_len: usize = 0;
        let mut label_count: usize = 0;
        loop {
            let label_start = parse.position();
            let first = parse.take_u8().map_err(|_| Error::NoRootLabel)?;
            match first & 0xC0 {
                0x00 => {
                    let len = (first & 0x3F) as usize;
                    if len == 0 {
                        break;
                    }
                    parse.take(len).map_err(|_| Error::NoRootLabel)?;
                    total_len += 1 + len;
                    label_count += 1;
                    if total_len + 1 > NAME_MAX_LEN {
                        return Err(Error::NameTooLong);
                    }
                    if label_count > MAX_LABELS {
                        return Err(Error::TooManyLabels);
                    }
                }
                0xC0 => {
                    let second = parse.take_u8().map_err(|_| Error::NoRootLabel)?;
                    let ptr = (((first & 0x3F) as usize) << 8) | second as usize;
                    if ptr >= label_start {
                        return Err(Error::InvalidPointerAddress);
                    }
                    parse = parse.jump(ptr);
                }
                _ => return Err(Error::InvalidLabelHeader),
            }
        }
        Ok((total_len, label_count))
    }

    /// Writes the uncompressed wire form. Compression on encode is a
    /// permitted optimization this implementation does not perform; callers
    /// always get a spec-conformant, if sometimes larger, frame.
    pub fn encode(&self, buffer: &mut WriteBuffer) -> Result<(), crate::buffer::CapacityExceeded> {
        buffer.write_bytes(&self.octets)
    }

    pub fn to_dotted_string(&self) -> String {
        if self.is_root() {
            return ".".to_string();
        }
        let mut s = String::new();
        for label in &self.labels {
            s.push_str(&String::from_utf8_lossy(label));
            s.push('.');
        }
        s
    }

    /// True iff `self` is equal to or strictly below `origin` in the tree
    /// (TLD-down label comparison, `*` in `origin` matching any label).
    pub fn is_subdomain_of(&self, origin: &Name) -> bool {
        if self.label_count() < origin.label_count() {
            return false;
        }
        self.labels_reverse()
            .zip(origin.labels_reverse())
            .all(|(mine, theirs)| theirs == b"*" || mine.eq_ignore_ascii_case(theirs))
    }

    /// Labels of `self` strictly below `origin`, TLD-most-first (i.e.
    /// `origin`'s depth up to `self`'s leaf). Returns `None` when `self`
    /// equals `origin`; fails with [`Error::NotASubdomain`] when `self` is
    /// not under `origin` at all.
    pub fn iter_context(&self, origin: &Name) -> Result<Option<Vec<&[u8]>>, Error> {
        if !self.is_subdomain_of(origin) {
            return Err(Error::NotASubdomain);
        }
        if self.label_count() == origin.label_count() {
            return Ok(None);
        }
        // `origin`'s own labels occupy the first `origin.label_count()`
        // positions of `self`'s TLD-down order; everything after that is
        // strictly below `origin`, already in origin->leaf order.
        let below: Vec<&[u8]> = self.labels_reverse().skip(origin.label_count()).collect();
        Ok(Some(below))
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.labels.len() == other.labels.len()
            && self
                .labels
                .iter()
                .zip(other.labels.iter())
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

impl Eq for Name {}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.to_dotted_string())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_dotted_string())
    }
}

#[cfg(any(feature = "test-util", test))]
impl<'a> arbitrary::Arbitrary<'a> for Name {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let label_count = u.int_in_range(0..=8)?;
        let mut labels = Vec::new();
        for i in 0..label_count {
            let len = u.int_in_range(1..=16)?;
            let mut label: Vec<u8> = Vec::with_capacity(len);
            for _ in 0..len {
                let c = u.int_in_range(b'a'..=b'z')?;
                label.push(c);
            }
            if i == 0 && bool::arbitrary(u)? {
                label = b"*".to_vec();
            }
            labels.push(label);
        }
        Name::from_labels(labels).map_err(|_| arbitrary::Error::IncorrectFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_text_discards_trailing_dot() {
        let a = Name::from_text("www.example.com").unwrap();
        let b = Name::from_text("www.example.com.").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.label_count(), 3);
    }

    #[test]
    fn bare_dot_is_root() {
        let n = Name::from_text(".").unwrap();
        assert!(n.is_root());
        assert_eq!(n.to_dotted_string(), ".");
    }

    #[test]
    fn label_of_63_accepted_64_rejected() {
        let ok = "a".repeat(63);
        assert!(Name::from_text(&ok).is_ok());
        let too_long = "a".repeat(64);
        assert_eq!(Name::from_text(&too_long).unwrap_err(), Error::LabelTooLong);
    }

    #[test]
    fn name_of_255_bytes_accepted_256_rejected() {
        // 63 + 63 + 63 + 61 byte labels, each with a 1-byte length prefix,
        // plus the terminal root byte: 64*3 + 62 + 1 = 255.
        let text = format!("{}.{}.{}.{}", "a".repeat(63), "a".repeat(63), "a".repeat(63), "a".repeat(61));
        let name = Name::from_text(&text).unwrap();
        assert_eq!(name.encoded_length(), 255);

        let too_long = format!("{}.{}.{}.{}", "a".repeat(63), "a".repeat(63), "a".repeat(63), "a".repeat(62));
        assert_eq!(Name::from_text(&too_long).unwrap_err(), Error::NameTooLong);
    }

    #[test]
    fn labels_127_accepted_128_rejected() {
        let ok = vec!["a"; 127].join(".");
        assert!(Name::from_text(&ok).is_ok());
        let too_many = vec!["a"; 128].join(".");
        assert_eq!(Name::from_text(&too_many).unwrap_err(), Error::TooManyLabels);
    }

    #[test]
    fn wildcard_must_be_leftmost_and_alone() {
        assert!(Name::from_text("*.example.com").is_ok());
        assert_eq!(
            Name::from_text("example.*.com").unwrap_err(),
            Error::WildcardNotFirst
        );
        assert_eq!(
            Name::from_text("*foo.example.com").unwrap_err(),
            Error::WildcardNotAlone
        );
    }

    #[test]
    fn decode_encode_roundtrip() {
        let name = Name::from_text("duckduckgo.com").unwrap();
        let mut buffer = WriteBuffer::new();
        name.encode(&mut buffer).unwrap();
        let octets = buffer.into_vec();
        let mut cursor = ReadCursor::new(&octets);
        let decoded = Name::decode(&mut cursor).unwrap();
        assert_eq!(decoded, name);
        assert_eq!(cursor.position(), octets.len());
    }

    #[test]
    fn compression_pointer_follows_backward() {
        // "example.com." at offset 0, then a second name at offset 13 that
        // is just a pointer back to offset 0.
        let mut octets = Vec::new();
        let base = Name::from_text("example.com").unwrap();
        octets.extend_from_slice(base.as_wire_bytes());
        let pointer_offset = octets.len();
        octets.push(0xC0);
        octets.push(0x00);

        let mut cursor = ReadCursor::new(&octets);
        cursor.skip(pointer_offset).unwrap();
        let decoded = Name::decode(&mut cursor).unwrap();
        assert_eq!(decoded, base);
        assert_eq!(cursor.position(), octets.len());
    }

    #[test]
    fn forward_pointer_is_rejected() {
        // c0 05 00 00 00 03 63 6f 6d 00 -- pointer at offset 0 points to
        // offset 5, which is >= 0, violating the backward-only rule.
        let octets = [0xc0, 0x05, 0x00, 0x00, 0x00, 0x03, 0x63, 0x6f, 0x6d, 0x00];
        let mut cursor = ReadCursor::new(&octets);
        assert_eq!(
            Name::decode(&mut cursor).unwrap_err(),
            Error::InvalidPointerAddress
        );
    }

    #[test]
    fn pointer_to_self_is_rejected() {
        let octets = [0xc0, 0x00];
        let mut cursor = ReadCursor::new(&octets);
        assert_eq!(
            Name::decode(&mut cursor).unwrap_err(),
            Error::InvalidPointerAddress
        );
    }

    #[test]
    fn reserved_label_header_bits_are_rejected() {
        let octets = [0x40, 0x00];
        let mut cursor = ReadCursor::new(&octets);
        assert_eq!(
            Name::decode(&mut cursor).unwrap_err(),
            Error::InvalidLabelHeader
        );
        let octets = [0x80, 0x00];
        let mut cursor = ReadCursor::new(&octets);
        assert_eq!(
            Name::decode(&mut cursor).unwrap_err(),
            Error::InvalidLabelHeader
        );
    }

    #[test]
    fn decoded_length_matches_dotted_string_length() {
        let name = Name::from_text("duckduckgo.com").unwrap();
        let octets = name.as_wire_bytes();
        let cursor = ReadCursor::new(octets);
        let (bytes, labels) = Name::decoded_length(&cursor).unwrap();
        assert_eq!(labels, 2);
        assert_eq!(bytes, name.to_dotted_string().len());
    }

    #[test]
    fn iter_context_below_origin() {
        let origin = Name::from_text("example.com").unwrap();
        let name = Name::from_text("www.example.com").unwrap();
        let below = name.iter_context(&origin).unwrap().unwrap();
        assert_eq!(below, vec![b"www".as_slice()]);
    }

    #[test]
    fn iter_context_two_labels_below_origin_are_origin_to_leaf_order() {
        let origin = Name::from_text("example.com").unwrap();
        let name = Name::from_text("a.b.example.com").unwrap();
        let below = name.iter_context(&origin).unwrap().unwrap();
        assert_eq!(below, vec![b"b".as_slice(), b"a".as_slice()]);
    }

    #[test]
    fn iter_context_equal_to_origin_is_none() {
        let origin = Name::from_text("example.com").unwrap();
        assert_eq!(origin.iter_context(&origin).unwrap(), None);
    }

    #[test]
    fn iter_context_rejects_non_subdomain() {
        let origin = Name::from_text("example.com").unwrap();
        let other = Name::from_text("example.org").unwrap();
        assert_eq!(other.iter_context(&origin).unwrap_err(), Error::NotASubdomain);
    }

    #[test]
    fn from_text_to_text_roundtrip() {
        let name = Name::from_text("www.example.com").unwrap();
        let reparsed = Name::from_text(&name.to_dotted_string()).unwrap();
        assert_eq!(name, reparsed);
    }
}
