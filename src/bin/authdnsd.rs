//! Command-line entry point: parses arguments, sets up logging, loads any
//! configured zones, and serves UDP + TCP.
//!
//! Grounded on `bin-resolved/src/main.rs`'s `Args`/`begin_logging`/
//! `#[tokio::main] async fn main`, trimmed of recursive-resolution,
//! caching, forwarding, and zone-file/hosts-file loading -- all explicit
//! Non-goals of this core.

use authdns::name::Name;
use authdns::record::{Record, RecordClass, RecordData, RecordType};
use authdns::server::{listen_tcp, listen_udp};
use authdns::settings::{RecordRdataConfig, Settings, ZoneConfig};
use authdns::zone::{DictionaryBackend, Zone, Zones};
use clap::Parser;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::RwLock;

/// A minimal authoritative DNS server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to bind the UDP and TCP sockets on.
    #[arg(long, default_value = "127.0.0.1")]
    interface: Ipv4Addr,

    /// Port to bind the UDP and TCP sockets on.
    #[arg(long, default_value_t = 9091)]
    port: u16,

    /// Optional YAML config file describing statically-defined zones.
    #[arg(long)]
    config: Option<String>,
}

fn begin_logging() {
    let mut builder = tracing_subscriber::fmt().with_env_filter(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    );
    if let Ok(format) = std::env::var("RUST_LOG_FORMAT") {
        let opts: Vec<&str> = format.split(',').map(str::trim).collect();
        if opts.contains(&"no-ansi") {
            builder = builder.with_ansi(false);
        }
        if opts.contains(&"no-time") {
            builder = builder.without_time();
        }
        if opts.contains(&"json") {
            builder.json().init();
            return;
        }
        if opts.contains(&"compact") {
            builder.compact().init();
            return;
        }
    }
    builder.init();
}

fn load_zones(zone_configs: Vec<ZoneConfig>) -> Result<Zones, Box<dyn std::error::Error>> {
    let mut zones = Zones::new();
    for zone_config in zone_configs {
        let origin = Name::from_text(&zone_config.origin)?;
        let mut backend = DictionaryBackend::new(origin.clone());
        if let Some(soa) = &zone_config.soa {
            // A record's TTL isn't given separately for the SOA itself in
            // config; as with the teacher's zone-file format, it defaults
            // to the SOA's own `minimum` field.
            let data = RecordData::SOA {
                mname: Name::from_text(&soa.mname)?,
                rname: Name::from_text(&soa.rname)?,
                serial: soa.serial,
                refresh: soa.refresh,
                retry: soa.retry,
                expire: soa.expire,
                minimum: soa.minimum,
            };
            backend.insert(
                &origin,
                RecordClass::IN,
                RecordType::SOA,
                Record::new(origin.clone(), RecordClass::IN, soa.minimum, data),
            )?;
        }
        for record in zone_config.records {
            let name = Name::from_text(&record.name)?;
            let rclass = record_class_from_str(&record.class)?;
            let (rtype, data) = record_data_from_config(&record.rtype, record.ttl, &record.rdata)?;
            backend.insert(&name, rclass, rtype, Record::new(name.clone(), rclass, record.ttl, data))?;
        }
        zones.insert(Zone::new(origin, Box::new(backend)));
    }
    Ok(zones)
}

fn record_class_from_str(s: &str) -> Result<RecordClass, Box<dyn std::error::Error>> {
    match s.to_ascii_uppercase().as_str() {
        "IN" => Ok(RecordClass::IN),
        "CS" => Ok(RecordClass::CS),
        "CH" => Ok(RecordClass::CH),
        "HS" => Ok(RecordClass::HS),
        other => Err(format!("unknown record class {other}").into()),
    }
}

fn record_data_from_config(
    rtype: &str,
    ttl: u32,
    rdata: &RecordRdataConfig,
) -> Result<(RecordType, RecordData), Box<dyn std::error::Error>> {
    let _ = ttl;
    match (rtype.to_ascii_uppercase().as_str(), rdata) {
        ("A", RecordRdataConfig::Text(addr)) => {
            let address: Ipv4Addr = addr.parse()?;
            Ok((RecordType::A, RecordData::A { address }))
        }
        ("AAAA", RecordRdataConfig::Text(addr)) => {
            let address: std::net::Ipv6Addr = addr.parse()?;
            Ok((RecordType::AAAA, RecordData::AAAA { address }))
        }
        ("CNAME", RecordRdataConfig::Text(target)) => {
            Ok((RecordType::CNAME, RecordData::CNAME { cname: Name::from_text(target)? }))
        }
        ("NS", RecordRdataConfig::Text(target)) => {
            Ok((RecordType::NS, RecordData::NS { nsdname: Name::from_text(target)? }))
        }
        ("PTR", RecordRdataConfig::Text(target)) => {
            Ok((RecordType::PTR, RecordData::PTR { ptrdname: Name::from_text(target)? }))
        }
        ("TXT", RecordRdataConfig::Text(text)) => {
            Ok((RecordType::TXT, RecordData::TXT { octets: text.as_bytes().to_vec() }))
        }
        ("MX", RecordRdataConfig::Mx { preference, exchange }) => Ok((
            RecordType::MX,
            RecordData::MX { preference: *preference, exchange: Name::from_text(exchange)? },
        )),
        (other, _) => Err(format!("unsupported or mismatched record type {other}").into()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    begin_logging();
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => Settings::new(path)?,
        None => Settings::default(),
    };
    let zones = load_zones(settings.zones)?;
    let zones = Arc::new(RwLock::new(zones));

    let address = settings.interface.unwrap_or(args.interface);
    let port = settings.port.unwrap_or(args.port);
    let bind_addr = (address, port);

    let udp_socket = UdpSocket::bind(bind_addr).await?;
    let tcp_listener = TcpListener::bind(bind_addr).await?;
    tracing::info!(%address, %port, "listening");

    let udp_zones = zones.clone();
    let udp_task = tokio::spawn(async move { listen_udp(udp_socket, udp_zones).await });
    let tcp_task = tokio::spawn(async move { listen_tcp(tcp_listener, zones).await });

    tokio::select! {
        result = udp_task => { result??; }
        result = tcp_task => { result??; }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl-c, shutting down");
        }
    }
    Ok(())
}
