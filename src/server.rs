//! UDP and TCP transport loops: decode a message, resolve it against the
//! configured zones, and write back a response.
//!
//! Grounded on `bin-resolved/src/main.rs`'s `listen_udp_task`/
//! `listen_tcp_task`/`handle_raw_message`/`resolve_and_build_response`,
//! simplified to non-recursive, in-memory zone lookups only -- no cache, no
//! forwarding, no hosts-file or zone-file loading (all explicit Non-goals).

use crate::buffer::BufferPool;
use crate::message::{Header, Message};
use crate::net::{read_tcp_message, write_tcp_message};
use crate::record::{Opcode, QueryClass, QueryType, Rcode, RecordClass, RecordType};
use crate::zone::{self, Zones};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::RwLock;

/// The largest UDP response this server will emit without setting TC.
pub const UDP_RESPONSE_CAPACITY: usize = 512;
/// The largest UDP request this server will read into a single buffer.
const UDP_RECV_CAPACITY: usize = 4096;
/// Receive buffers in flight at once before a datagram has to wait for one
/// to be returned to the pool.
const UDP_RECV_POOL_SIZE: usize = 64;

pub async fn listen_udp(socket: UdpSocket, zones: Arc<RwLock<Zones>>) -> std::io::Result<()> {
    let socket = Arc::new(socket);
    let pool = BufferPool::new(UDP_RECV_POOL_SIZE, UDP_RECV_CAPACITY);
    loop {
        let mut buf = pool.acquire();
        let (len, peer) = socket.recv_from(&mut buf).await?;
        let socket = socket.clone();
        let zones = zones.clone();
        tokio::spawn(async move {
            handle_udp_datagram(&socket, peer, &buf[..len], &zones).await;
            // `buf` is returned to the pool here, once the request is fully handled.
        });
    }
}

async fn handle_udp_datagram(
    socket: &UdpSocket,
    peer: SocketAddr,
    request: &[u8],
    zones: &RwLock<Zones>,
) {
    let span = tracing::info_span!("query", peer = %peer);
    let _enter = span.enter();

    let response_bytes = match Message::decode(request) {
        Ok(message) => {
            let response = resolve_and_build_response(&message, zones).await;
            encode_for_udp(&response)
        }
        Err(err) => {
            tracing::debug!(error = %err, "failed to decode request");
            match best_effort_format_error(request) {
                Some(response) => encode_for_udp(&response),
                None => return,
            }
        }
    };

    if let Err(err) = socket.send_to(&response_bytes, peer).await {
        tracing::warn!(error = %err, %peer, "failed to send UDP response");
    }
}

pub async fn listen_tcp(listener: TcpListener, zones: Arc<RwLock<Zones>>) -> std::io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let zones = zones.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_tcp_connection(stream, peer, &zones).await {
                tracing::debug!(error = %err, %peer, "TCP connection ended");
            }
        });
    }
}

async fn handle_tcp_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    zones: &RwLock<Zones>,
) -> Result<(), crate::net::TcpError> {
    loop {
        let request = read_tcp_message(&mut stream).await?;
        let span = tracing::info_span!("query", peer = %peer, transport = "tcp");
        let _enter = span.enter();

        let response = match Message::decode(&request) {
            Ok(message) => resolve_and_build_response(&message, zones).await,
            Err(err) => {
                tracing::debug!(error = %err, "failed to decode request");
                match best_effort_format_error(&request) {
                    Some(response) => response,
                    None => return Ok(()),
                }
            }
        };

        // TCP has no 512-byte ceiling; TC is never set on this path.
        let bytes = response.encode(None).expect("unbounded encode cannot fail");
        write_tcp_message(&mut stream, &bytes).await?;
    }
}

/// Resolves every question in `request` (in practice exactly one) against
/// `zones` and builds the response message.
async fn resolve_and_build_response(request: &Message, zones: &RwLock<Zones>) -> Message {
    if !matches!(request.header.opcode, Opcode::Query) {
        return request.make_response(Rcode::NotImp, Vec::new());
    }
    let Some(question) = request.questions.first() else {
        return request.make_response(Rcode::FormErr, Vec::new());
    };

    let zones = zones.read().await;
    let (rcode, answers) = resolve_question(question.name.clone(), question.qtype, question.qclass, &zones);
    tracing::info!(
        qtype = ?question.qtype,
        qclass = ?question.qclass,
        rcode = ?rcode,
        answers = answers.len(),
        "resolved query"
    );
    request.make_response(rcode, answers)
}

fn resolve_question(
    name: crate::name::Name,
    qtype: QueryType,
    qclass: QueryClass,
    zones: &Zones,
) -> (Rcode, Vec<crate::record::Record>) {
    let rtype = RecordType::from(u16::from(qtype));
    let rclass = RecordClass::from(u16::from(qclass));
    match zones.get(&name) {
        None => (Rcode::NxDomain, Vec::new()),
        Some(zone) => match zone.query(&name, rtype, rclass) {
            Ok(Some(records)) => (Rcode::NoError, records.clone()),
            Ok(None) => (Rcode::NoError, Vec::new()),
            Err(zone::Error::Unsupported { .. }) => (Rcode::ServFail, Vec::new()),
        },
    }
}

/// A response that can be built from the bytes of a message this server
/// failed to fully parse: there's always at least enough for a transaction
/// id, even if the rest is garbage. Returns `None` only when there isn't
/// even that (spec.md's `CompletelyBusted`), in which case the server
/// drops the datagram rather than guessing an id to reply to.
fn best_effort_format_error(request: &[u8]) -> Option<Message> {
    if request.len() < 2 {
        return None;
    }
    let id = u16::from_be_bytes([request[0], request[1]]);
    Some(Message::make_format_error_response(Header::query(id), Vec::new()))
}

/// Encodes a response for UDP, setting TC and trimming answers until the
/// frame fits within [`UDP_RESPONSE_CAPACITY`] -- the codec never hands the
/// transport a partial frame (`message::Error::TruncatedMessage` is caught
/// here, not propagated).
fn encode_for_udp(response: &Message) -> Vec<u8> {
    let mut candidate = response.clone();
    loop {
        match candidate.encode(Some(UDP_RESPONSE_CAPACITY)) {
            Ok(bytes) => return bytes,
            Err(_) => {
                if candidate.answers.is_empty() {
                    candidate.header.tc = true;
                    return candidate.encode(None).expect("header and questions alone must fit");
                }
                candidate.answers.pop();
                candidate.header.tc = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Name;
    use crate::record::RecordData;
    use crate::zone::{DictionaryBackend, Zone};
    use std::net::Ipv4Addr;

    fn zones_with_one_a_record() -> Zones {
        let context = Name::from_text("example.com").unwrap();
        let mut backend = DictionaryBackend::new(context.clone());
        backend
            .insert(
                &context,
                RecordClass::IN,
                RecordType::A,
                crate::record::Record::new(
                    context.clone(),
                    RecordClass::IN,
                    300,
                    RecordData::A { address: Ipv4Addr::new(1, 2, 3, 4) },
                ),
            )
            .unwrap();
        let mut zones = Zones::new();
        zones.insert(Zone::new(context, Box::new(backend)));
        zones
    }

    #[test]
    fn resolves_a_configured_record() {
        let zones = zones_with_one_a_record();
        let name = Name::from_text("example.com").unwrap();
        let (rcode, answers) = resolve_question(name, QueryType::A, QueryClass::IN, &zones);
        assert_eq!(rcode, Rcode::NoError);
        assert_eq!(answers.len(), 1);
    }

    #[test]
    fn nxdomain_when_no_zone_covers_the_name() {
        let zones = zones_with_one_a_record();
        let name = Name::from_text("example.org").unwrap();
        let (rcode, answers) = resolve_question(name, QueryType::A, QueryClass::IN, &zones);
        assert_eq!(rcode, Rcode::NxDomain);
        assert!(answers.is_empty());
    }

    #[test]
    fn encode_for_udp_sets_tc_and_trims_when_oversized() {
        let request = Message::from_question(1, Name::from_text("example.com").unwrap(), QueryType::A, QueryClass::IN);
        let mut answers = Vec::new();
        for i in 0..80u8 {
            answers.push(crate::record::Record::new(
                Name::from_text("example.com").unwrap(),
                RecordClass::IN,
                300,
                RecordData::A { address: Ipv4Addr::new(i, i, i, i) },
            ));
        }
        let response = request.make_response(Rcode::NoError, answers);
        let bytes = encode_for_udp(&response);
        assert!(bytes.len() <= UDP_RESPONSE_CAPACITY);
        let decoded = Message::decode(&bytes).unwrap();
        assert!(decoded.header.tc);
        assert!(decoded.answers.len() < 80);
    }
}
