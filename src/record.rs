//! DNS codes (type/class/opcode/rcode) and resource records.
//!
//! The wrapper enums follow the teacher's `Reserved(u8)` pattern
//! (`lib-dns-types/src/protocol/types.rs`): a private-constructor variant
//! preserves any wire value this crate doesn't have a named variant for,
//! so `u16::from(RecordType::from(x)) == x` holds for every `x`, not just
//! the ones this core understands.

use crate::buffer::{ReadCursor, WriteBuffer};
use crate::name::{self, Name};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    Name(name::Error),
    InvalidType,
    InvalidClass,
    InvalidRdLength,
    EncodeNotImplemented,
    NotEnoughBytes,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Name(e) => write!(f, "{e}"),
            Error::InvalidType => write!(f, "unknown record type"),
            Error::InvalidClass => write!(f, "unknown record class"),
            Error::InvalidRdLength => write!(f, "rdlength does not match the record type"),
            Error::EncodeNotImplemented => write!(f, "encoding is not implemented for this record"),
            Error::NotEnoughBytes => write!(f, "not enough bytes to decode a record"),
        }
    }
}

impl std::error::Error for Error {}

impl From<name::Error> for Error {
    fn from(e: name::Error) -> Self {
        Error::Name(e)
    }
}

impl From<crate::buffer::BufferError> for Error {
    fn from(_: crate::buffer::BufferError) -> Self {
        Error::NotEnoughBytes
    }
}

macro_rules! wire_enum {
    ($name:ident { $($variant:ident = $value:expr),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)*
            Reserved(u16),
        }

        impl From<u16> for $name {
            fn from(v: u16) -> Self {
                match v {
                    $($value => $name::$variant,)*
                    other => $name::Reserved(other),
                }
            }
        }

        impl From<$name> for u16 {
            fn from(v: $name) -> u16 {
                match v {
                    $($name::$variant => $value,)*
                    $name::Reserved(other) => other,
                }
            }
        }
    };
}

wire_enum!(RecordType {
    A = 1,
    NS = 2,
    CNAME = 5,
    SOA = 6,
    PTR = 12,
    MX = 15,
    TXT = 16,
    AAAA = 28,
});

wire_enum!(RecordClass {
    IN = 1,
    CS = 2,
    CH = 3,
    HS = 4,
});

wire_enum!(QueryType {
    A = 1,
    NS = 2,
    CNAME = 5,
    SOA = 6,
    PTR = 12,
    MX = 15,
    TXT = 16,
    AAAA = 28,
    Wildcard = 255,
});

wire_enum!(QueryClass {
    IN = 1,
    CS = 2,
    CH = 3,
    HS = 4,
    Wildcard = 255,
});

impl RecordType {
    pub fn is_unknown(&self) -> bool {
        matches!(self, RecordType::Reserved(_))
    }
}

impl RecordClass {
    pub fn is_unknown(&self) -> bool {
        matches!(self, RecordClass::Reserved(_))
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Reserved(v) => write!(f, "TYPE{v}"),
            other => write!(f, "{other:?}"),
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordClass::Reserved(v) => write!(f, "CLASS{v}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Opcodes and rcodes use a private-constructor wrapper over a 4-bit field:
/// `Reserved` is never built directly from outside this module, only via
/// `From<u8>`, mirroring the teacher's `Opcode`/`Rcode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Query,
    IQuery,
    Status,
    Reserved(u8),
}

impl From<u8> for Opcode {
    fn from(v: u8) -> Self {
        match v {
            0 => Opcode::Query,
            1 => Opcode::IQuery,
            2 => Opcode::Status,
            other => Opcode::Reserved(other),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(v: Opcode) -> u8 {
        match v {
            Opcode::Query => 0,
            Opcode::IQuery => 1,
            Opcode::Status => 2,
            Opcode::Reserved(other) => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rcode {
    NoError,
    FormErr,
    ServFail,
    NxDomain,
    NotImp,
    Refused,
    Reserved(u8),
}

impl From<u8> for Rcode {
    fn from(v: u8) -> Self {
        match v {
            0 => Rcode::NoError,
            1 => Rcode::FormErr,
            2 => Rcode::ServFail,
            3 => Rcode::NxDomain,
            4 => Rcode::NotImp,
            5 => Rcode::Refused,
            other => Rcode::Reserved(other),
        }
    }
}

impl From<Rcode> for u8 {
    fn from(v: Rcode) -> u8 {
        match v {
            Rcode::NoError => 0,
            Rcode::FormErr => 1,
            Rcode::ServFail => 2,
            Rcode::NxDomain => 3,
            Rcode::NotImp => 4,
            Rcode::Refused => 5,
            Rcode::Reserved(other) => other,
        }
    }
}

/// Resource record data, tagged by type. `Unknown` preserves the original
/// type code and raw octets so an RR this core doesn't understand still
/// round-trips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A { address: Ipv4Addr },
    AAAA { address: Ipv6Addr },
    MX { preference: u16, exchange: Name },
    CNAME { cname: Name },
    NS { nsdname: Name },
    PTR { ptrdname: Name },
    SOA {
        mname: Name,
        rname: Name,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },
    TXT { octets: Vec<u8> },
    Unknown { rtype: RecordType, octets: Vec<u8> },
}

impl RecordData {
    pub fn rtype(&self) -> RecordType {
        match self {
            RecordData::A { .. } => RecordType::A,
            RecordData::AAAA { .. } => RecordType::AAAA,
            RecordData::MX { .. } => RecordType::MX,
            RecordData::CNAME { .. } => RecordType::CNAME,
            RecordData::NS { .. } => RecordType::NS,
            RecordData::PTR { .. } => RecordType::PTR,
            RecordData::SOA { .. } => RecordType::SOA,
            RecordData::TXT { .. } => RecordType::TXT,
            RecordData::Unknown { rtype, .. } => *rtype,
        }
    }

    fn decode(
        rtype: RecordType,
        rdlength: u16,
        cursor: &mut ReadCursor,
    ) -> Result<RecordData, Error> {
        let rdata_start = cursor.position();
        let data = match rtype {
            RecordType::A => {
                if rdlength != 4 {
                    return Err(Error::InvalidRdLength);
                }
                let bytes = cursor.take(4)?;
                RecordData::A {
                    address: Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]),
                }
            }
            RecordType::AAAA => {
                if rdlength != 16 {
                    return Err(Error::InvalidRdLength);
                }
                let bytes = cursor.take(16)?;
                let mut octets = [0u8; 16];
                octets.copy_from_slice(bytes);
                RecordData::AAAA {
                    address: Ipv6Addr::from(octets),
                }
            }
            RecordType::MX => {
                if rdlength < 3 {
                    return Err(Error::InvalidRdLength);
                }
                let preference = cursor.take_u16()?;
                let exchange = Name::decode(cursor)?;
                RecordData::MX {
                    preference,
                    exchange,
                }
            }
            RecordType::CNAME => RecordData::CNAME {
                cname: Name::decode(cursor)?,
            },
            RecordType::NS => RecordData::NS {
                nsdname: Name::decode(cursor)?,
            },
            RecordType::PTR => RecordData::PTR {
                ptrdname: Name::decode(cursor)?,
            },
            RecordType::SOA => {
                let mname = Name::decode(cursor)?;
                let rname = Name::decode(cursor)?;
                let serial = cursor.take_u32()?;
                let refresh = cursor.take_u32()?;
                let retry = cursor.take_u32()?;
                let expire = cursor.take_u32()?;
                let minimum = cursor.take_u32()?;
                RecordData::SOA {
                    mname,
                    rname,
                    serial,
                    refresh,
                    retry,
                    expire,
                    minimum,
                }
            }
            RecordType::TXT => RecordData::TXT {
                octets: cursor.take(rdlength as usize)?.to_vec(),
            },
            RecordType::Reserved(_) => RecordData::Unknown {
                rtype,
                octets: cursor.take(rdlength as usize)?.to_vec(),
            },
        };

        // Names may be compressed, so the consumed length can't be checked
        // up front; verify it after the fact against the declared rdlength.
        if !matches!(rtype, RecordType::MX | RecordType::CNAME | RecordType::NS | RecordType::PTR | RecordType::SOA)
            && cursor.position() - rdata_start != rdlength as usize
        {
            return Err(Error::InvalidRdLength);
        }
        Ok(data)
    }

    fn encode(&self, buffer: &mut WriteBuffer) -> Result<(), Error> {
        match self {
            RecordData::A { address } => buffer
                .write_bytes(&address.octets())
                .map_err(|_| Error::EncodeNotImplemented),
            RecordData::AAAA { address } => buffer
                .write_bytes(&address.octets())
                .map_err(|_| Error::EncodeNotImplemented),
            RecordData::MX {
                preference,
                exchange,
            } => {
                buffer
                    .write_u16(*preference)
                    .map_err(|_| Error::EncodeNotImplemented)?;
                exchange.encode(buffer).map_err(|_| Error::EncodeNotImplemented)
            }
            RecordData::CNAME { cname } => {
                cname.encode(buffer).map_err(|_| Error::EncodeNotImplemented)
            }
            RecordData::NS { nsdname } => {
                nsdname.encode(buffer).map_err(|_| Error::EncodeNotImplemented)
            }
            RecordData::PTR { ptrdname } => {
                ptrdname.encode(buffer).map_err(|_| Error::EncodeNotImplemented)
            }
            RecordData::SOA {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => {
                mname.encode(buffer).map_err(|_| Error::EncodeNotImplemented)?;
                rname.encode(buffer).map_err(|_| Error::EncodeNotImplemented)?;
                buffer.write_u32(*serial).map_err(|_| Error::EncodeNotImplemented)?;
                buffer.write_u32(*refresh).map_err(|_| Error::EncodeNotImplemented)?;
                buffer.write_u32(*retry).map_err(|_| Error::EncodeNotImplemented)?;
                buffer.write_u32(*expire).map_err(|_| Error::EncodeNotImplemented)?;
                buffer.write_u32(*minimum).map_err(|_| Error::EncodeNotImplemented)
            }
            RecordData::TXT { octets } => {
                buffer.write_bytes(octets).map_err(|_| Error::EncodeNotImplemented)
            }
            RecordData::Unknown { octets, .. } => {
                buffer.write_bytes(octets).map_err(|_| Error::EncodeNotImplemented)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: Name,
    pub rclass: RecordClass,
    pub ttl: u32,
    pub data: RecordData,
}

impl Record {
    pub fn new(name: Name, rclass: RecordClass, ttl: u32, data: RecordData) -> Record {
        Record {
            name,
            rclass,
            ttl,
            data,
        }
    }

    pub fn rtype(&self) -> RecordType {
        self.data.rtype()
    }

    pub fn decode(cursor: &mut ReadCursor) -> Result<Record, Error> {
        let name = Name::decode(cursor)?;
        let rtype = RecordType::from(cursor.take_u16()?);
        let rclass = RecordClass::from(cursor.take_u16()?);
        if rclass.is_unknown() {
            return Err(Error::InvalidClass);
        }
        let ttl = cursor.take_u32()?;
        let rdlength = cursor.take_u16()?;
        let data = RecordData::decode(rtype, rdlength, cursor)?;
        Ok(Record::new(name, rclass, ttl, data))
    }

    pub fn encode(&self, buffer: &mut WriteBuffer) -> Result<(), Error> {
        self.name.encode(buffer).map_err(|_| Error::EncodeNotImplemented)?;
        buffer
            .write_u16(u16::from(self.rtype()))
            .map_err(|_| Error::EncodeNotImplemented)?;
        buffer
            .write_u16(u16::from(self.rclass))
            .map_err(|_| Error::EncodeNotImplemented)?;
        buffer.write_u32(self.ttl).map_err(|_| Error::EncodeNotImplemented)?;

        let rdlength_index = buffer.index();
        buffer.write_u16(0).map_err(|_| Error::EncodeNotImplemented)?;
        let rdata_start = buffer.index();
        self.data.encode(buffer)?;
        let rdlength = (buffer.index() - rdata_start) as u16;
        buffer.set_u16_at(rdlength_index, rdlength);
        Ok(())
    }
}
