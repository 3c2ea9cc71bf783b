//! The 12-byte header, question section, and the full `Message` envelope.
//!
//! The header's four section counts are not stored on [`Header`] itself --
//! only on the wire, where they are always recomputed from the question and
//! answer list lengths at encode time and checked against an invariant on
//! the way in. This mirrors the teacher's own split between `Header` (the
//! logical type) and `WireHeader` (the on-the-wire counts), which exists
//! precisely so nothing has to keep counts and lists in sync by hand.

use crate::buffer::{CapacityExceeded, ReadCursor, WriteBuffer};
use crate::name::{self, Name};
use crate::record::{self, Opcode, QueryClass, QueryType, Rcode, Record, RecordClass, RecordType};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    Record(record::Error),
    Name(name::Error),
    HeaderTooShort,
    CompletelyBusted,
    InvalidType,
    InvalidClass,
    TruncatedMessage,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Record(e) => write!(f, "{e}"),
            Error::Name(e) => write!(f, "{e}"),
            Error::HeaderTooShort => write!(f, "fewer than 12 bytes for the header"),
            Error::CompletelyBusted => write!(f, "fewer than 2 bytes, not even a transaction id"),
            Error::InvalidType => write!(f, "unknown query type"),
            Error::InvalidClass => write!(f, "unknown query class"),
            Error::TruncatedMessage => write!(f, "encoded message would exceed the writer's capacity"),
        }
    }
}

impl std::error::Error for Error {}

impl From<record::Error> for Error {
    fn from(e: record::Error) -> Self {
        Error::Record(e)
    }
}

impl From<name::Error> for Error {
    fn from(e: name::Error) -> Self {
        Error::Name(e)
    }
}

impl From<crate::buffer::BufferError> for Error {
    fn from(_: crate::buffer::BufferError) -> Self {
        Error::HeaderTooShort
    }
}

/// The logical DNS header: transaction id and the flag bits. Section
/// counts live only on the wire -- see the module doc comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub qr: bool,
    pub opcode: Opcode,
    pub aa: bool,
    pub tc: bool,
    pub rd: bool,
    pub ra: bool,
    pub z: bool,
    pub ad: bool,
    pub cd: bool,
    pub rcode: Rcode,
}

impl Header {
    /// A fresh query header: `QR=0`, `OPCODE=Query`, `RD=1`, `AD=1`, all
    /// other flags clear.
    pub fn query(id: u16) -> Header {
        Header {
            id,
            qr: false,
            opcode: Opcode::Query,
            aa: false,
            tc: false,
            rd: true,
            ra: false,
            z: false,
            ad: true,
            cd: false,
            rcode: Rcode::NoError,
        }
    }

    /// Derives a response header from a request header: same id/opcode/rd,
    /// `QR=1`, `RA=1`, `AD=0` (authoritative for the zone, but not claiming
    /// DNSSEC validation).
    pub fn response_to(request: &Header, rcode: Rcode) -> Header {
        Header {
            id: request.id,
            qr: true,
            opcode: request.opcode,
            aa: false,
            tc: false,
            rd: request.rd,
            ra: true,
            z: false,
            ad: false,
            cd: request.cd,
            rcode,
        }
    }

    fn decode(cursor: &mut ReadCursor) -> Result<Header, Error> {
        let id = cursor.take_u16()?;
        let flags1 = cursor.take_u8()?;
        let flags2 = cursor.take_u8()?;
        Ok(Header {
            id,
            qr: flags1 & 0x80 != 0,
            opcode: Opcode::from((flags1 >> 3) & 0x0F),
            aa: flags1 & 0x04 != 0,
            tc: flags1 & 0x02 != 0,
            rd: flags1 & 0x01 != 0,
            ra: flags2 & 0x80 != 0,
            z: flags2 & 0x40 != 0,
            ad: flags2 & 0x20 != 0,
            cd: flags2 & 0x10 != 0,
            rcode: Rcode::from(flags2 & 0x0F),
        })
    }

    fn encode(
        &self,
        buffer: &mut WriteBuffer,
        qdcount: u16,
        ancount: u16,
        nscount: u16,
        arcount: u16,
    ) -> Result<(), CapacityExceeded> {
        buffer.write_u16(self.id)?;
        let mut flags1 = 0u8;
        if self.qr {
            flags1 |= 0x80;
        }
        flags1 |= (u8::from(self.opcode) & 0x0F) << 3;
        if self.aa {
            flags1 |= 0x04;
        }
        if self.tc {
            flags1 |= 0x02;
        }
        if self.rd {
            flags1 |= 0x01;
        }
        let mut flags2 = 0u8;
        if self.ra {
            flags2 |= 0x80;
        }
        if self.z {
            flags2 |= 0x40;
        }
        if self.ad {
            flags2 |= 0x20;
        }
        if self.cd {
            flags2 |= 0x10;
        }
        flags2 |= u8::from(self.rcode) & 0x0F;
        buffer.write_u8(flags1)?;
        buffer.write_u8(flags2)?;
        buffer.write_u16(qdcount)?;
        buffer.write_u16(ancount)?;
        buffer.write_u16(nscount)?;
        buffer.write_u16(arcount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: Name,
    pub qtype: QueryType,
    pub qclass: QueryClass,
}

impl Question {
    fn decode(cursor: &mut ReadCursor) -> Result<Question, Error> {
        let name = Name::decode(cursor)?;
        let qtype = QueryType::from(cursor.take_u16()?);
        if matches!(qtype, QueryType::Reserved(_)) {
            return Err(Error::InvalidType);
        }
        let qclass = QueryClass::from(cursor.take_u16()?);
        if matches!(qclass, QueryClass::Reserved(_)) {
            return Err(Error::InvalidClass);
        }
        Ok(Question { name, qtype, qclass })
    }

    fn encode(&self, buffer: &mut WriteBuffer) -> Result<(), CapacityExceeded> {
        self.name.encode(buffer)?;
        buffer.write_u16(self.qtype.into())?;
        buffer.write_u16(self.qclass.into())
    }
}

/// A DNS message. `authority` and `additional` are decoded and retained as
/// opaque, already-encoded byte spans -- the specification only requires
/// that the section counts be honored enough for the reader cursor to land
/// exactly at the end of the frame, not that this core build typed
/// authority/additional records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<Record>,
    pub authority: Vec<u8>,
    pub additional: Vec<u8>,
}

impl Message {
    pub fn from_question(id: u16, name: Name, qtype: QueryType, qclass: QueryClass) -> Message {
        Message {
            header: Header::query(id),
            questions: vec![Question { name, qtype, qclass }],
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    /// Builds a response carrying `answers`, copying the question section
    /// and transaction id from `self` (which must be a request).
    pub fn make_response(&self, rcode: Rcode, answers: Vec<Record>) -> Message {
        Message {
            header: Header::response_to(&self.header, rcode),
            questions: self.questions.clone(),
            answers,
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    /// A best-effort response to a message this server failed to fully
    /// parse: echoes the header and whatever questions were recovered, sets
    /// `FORMERR`, and carries no answers.
    pub fn make_format_error_response(header: Header, questions: Vec<Question>) -> Message {
        Message {
            header: Header::response_to(&header, Rcode::FormErr),
            questions,
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
        }
    }

    pub fn decode(octets: &[u8]) -> Result<Message, Error> {
        if octets.len() < 2 {
            return Err(Error::CompletelyBusted);
        }
        if octets.len() < 12 {
            return Err(Error::HeaderTooShort);
        }
        let mut cursor = ReadCursor::new(octets);
        let header = Header::decode(&mut cursor)?;
        let qdcount = cursor.take_u16()?;
        let ancount = cursor.take_u16()?;
        let nscount = cursor.take_u16()?;
        let arcount = cursor.take_u16()?;

        let mut questions = Vec::with_capacity(qdcount as usize);
        for _ in 0..qdcount {
            questions.push(Question::decode(&mut cursor)?);
        }

        let mut answers = Vec::with_capacity(ancount as usize);
        for _ in 0..ancount {
            answers.push(Record::decode(&mut cursor)?);
        }

        let authority_start = cursor.position();
        for _ in 0..nscount {
            skip_resource_record(&mut cursor)?;
        }
        let authority = octets[authority_start..cursor.position()].to_vec();

        let additional_start = cursor.position();
        for _ in 0..arcount {
            skip_resource_record(&mut cursor)?;
        }
        let additional = octets[additional_start..cursor.position()].to_vec();

        Ok(Message {
            header,
            questions,
            answers,
            authority,
            additional,
        })
    }

    /// Encodes into a capacity-bounded buffer. Fails with
    /// [`Error::TruncatedMessage`] *before* writing a partial frame if the
    /// message doesn't fit -- callers re-encode with fewer answers and the
    /// TC bit set, rather than ever emitting a cut-off response.
    pub fn encode(&self, capacity: Option<usize>) -> Result<Vec<u8>, Error> {
        let mut buffer = match capacity {
            Some(cap) => WriteBuffer::with_capacity_limit(cap),
            None => WriteBuffer::new(),
        };
        self.header.encode(
            &mut buffer,
            self.questions.len() as u16,
            self.answers.len() as u16,
            0,
            0,
        ).map_err(|_| Error::TruncatedMessage)?;
        for question in &self.questions {
            question.encode(&mut buffer).map_err(|_| Error::TruncatedMessage)?;
        }
        for answer in &self.answers {
            answer.encode(&mut buffer)?;
        }
        Ok(buffer.into_vec())
    }
}

fn skip_resource_record(cursor: &mut ReadCursor) -> Result<(), Error> {
    Name::decode(cursor)?;
    let _rtype = RecordType::from(cursor.take_u16()?);
    let _rclass = RecordClass::from(cursor.take_u16()?);
    let _ttl = cursor.take_u32()?;
    let rdlength = cursor.take_u16()?;
    cursor.skip(rdlength as usize)?;
    Ok(())
}
