use fake::{Fake, Faker};

use authdns::buffer::{ReadCursor, WriteBuffer};
use authdns::message::{Header, Message, Question};
use authdns::name::Name;
use authdns::record::{Opcode, QueryClass, QueryType, Rcode, Record, RecordClass, RecordData, RecordType};

#[test]
fn roundtrip_name() {
    for _ in 0..100 {
        let original = arbitrary_name();
        let mut buffer = WriteBuffer::new();
        original.encode(&mut buffer).unwrap();
        let octets = buffer.into_vec();
        let mut cursor = ReadCursor::new(&octets);
        let decoded = Name::decode(&mut cursor).unwrap();
        assert_eq!(original, decoded);
    }
}

#[test]
fn roundtrip_record() {
    for _ in 0..100 {
        let original = arbitrary_record();
        let mut buffer = WriteBuffer::new();
        original.encode(&mut buffer).unwrap();
        let octets = buffer.into_vec();
        let mut cursor = ReadCursor::new(&octets);
        let decoded = Record::decode(&mut cursor).unwrap();
        assert_eq!(original, decoded);
    }
}

#[test]
fn roundtrip_message() {
    for _ in 0..100 {
        let original = arbitrary_message();
        let octets = original.encode(None).unwrap();
        let decoded = Message::decode(&octets).unwrap();
        assert_eq!(original.header, decoded.header);
        assert_eq!(original.questions, decoded.questions);
        assert_eq!(original.answers, decoded.answers);
    }
}

fn arbitrary_message() -> Message {
    let header = arbitrary_header();
    let num_questions: usize = (0..4).fake();
    let num_answers: usize = (0..4).fake();

    let questions = (0..num_questions).map(|_| arbitrary_question()).collect();
    let answers = (0..num_answers).map(|_| arbitrary_record()).collect();

    Message {
        header,
        questions,
        answers,
        authority: Vec::new(),
        additional: Vec::new(),
    }
}

fn arbitrary_header() -> Header {
    Header {
        id: Faker.fake(),
        qr: Faker.fake(),
        opcode: arbitrary_opcode(),
        aa: Faker.fake(),
        tc: Faker.fake(),
        rd: Faker.fake(),
        ra: Faker.fake(),
        z: Faker.fake(),
        ad: Faker.fake(),
        cd: Faker.fake(),
        rcode: arbitrary_rcode(),
    }
}

fn arbitrary_question() -> Question {
    Question {
        name: arbitrary_name(),
        qtype: arbitrary_querytype(),
        qclass: arbitrary_queryclass(),
    }
}

fn arbitrary_record() -> Record {
    Record::new(
        arbitrary_name(),
        arbitrary_recordclass(),
        Faker.fake(),
        arbitrary_recorddata(),
    )
}

fn arbitrary_recorddata() -> RecordData {
    // restricted to the types this core can both encode and decode; unknown
    // types are excluded here since their rtype can't be round-tripped
    // through the named `RecordType` variants this generator picks from.
    match (0..7u8).fake::<u8>() {
        0 => RecordData::A {
            address: std::net::Ipv4Addr::new(Faker.fake(), Faker.fake(), Faker.fake(), Faker.fake()),
        },
        1 => RecordData::AAAA {
            address: std::net::Ipv6Addr::new(
                Faker.fake(),
                Faker.fake(),
                Faker.fake(),
                Faker.fake(),
                Faker.fake(),
                Faker.fake(),
                Faker.fake(),
                Faker.fake(),
            ),
        },
        2 => RecordData::MX {
            preference: Faker.fake(),
            exchange: arbitrary_name(),
        },
        3 => RecordData::CNAME {
            cname: arbitrary_name(),
        },
        4 => RecordData::NS {
            nsdname: arbitrary_name(),
        },
        5 => RecordData::PTR {
            ptrdname: arbitrary_name(),
        },
        _ => RecordData::SOA {
            mname: arbitrary_name(),
            rname: arbitrary_name(),
            serial: Faker.fake(),
            refresh: Faker.fake(),
            retry: Faker.fake(),
            expire: Faker.fake(),
            minimum: Faker.fake(),
        },
    }
}

fn arbitrary_name() -> Name {
    let num_labels = (1..5).fake::<usize>();
    let labels: Vec<String> = (0..num_labels)
        .map(|_| {
            let label_len = (1..20).fake::<usize>();
            (0..label_len)
                .map(|_| (97u8..123).fake::<u8>() as char)
                .collect()
        })
        .collect();
    Name::from_text(&labels.join(".")).unwrap()
}

fn arbitrary_opcode() -> Opcode {
    Opcode::from(Faker.fake::<u8>() & 0b0000_1111)
}

fn arbitrary_rcode() -> Rcode {
    Rcode::from(Faker.fake::<u8>() & 0b0000_1111)
}

fn arbitrary_querytype() -> QueryType {
    // restricted to named variants: `Question::decode` rejects `Reserved`
    match (0..9u8).fake::<u8>() {
        0 => QueryType::A,
        1 => QueryType::NS,
        2 => QueryType::CNAME,
        3 => QueryType::SOA,
        4 => QueryType::PTR,
        5 => QueryType::MX,
        6 => QueryType::TXT,
        7 => QueryType::AAAA,
        _ => QueryType::Wildcard,
    }
}

fn arbitrary_queryclass() -> QueryClass {
    match (0..6u8).fake::<u8>() {
        0 => QueryClass::IN,
        1 => QueryClass::CS,
        2 => QueryClass::CH,
        3 => QueryClass::HS,
        _ => QueryClass::Wildcard,
    }
}

fn arbitrary_recordclass() -> RecordClass {
    match (0..4u8).fake::<u8>() {
        0 => RecordClass::IN,
        1 => RecordClass::CS,
        2 => RecordClass::CH,
        _ => RecordClass::HS,
    }
}
