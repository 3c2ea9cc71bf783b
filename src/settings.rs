//! Deployment configuration: bind address/port plus statically-defined
//! zones, loaded from YAML with the `config` crate.
//!
//! Grounded on `src/settings/mod.rs`'s `Settings::new`, but in place of the
//! teacher's `zone_files: Vec<String>` (paths into a BIND-style text
//! grammar this core does not implement, see DESIGN.md) this carries the
//! zone data itself as a deserializable struct -- the "programmatic
//! population" the specification calls for, expressed declaratively.

use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub interface: Option<Ipv4Addr>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,
}

impl Settings {
    pub fn new(filename: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(filename))
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ZoneConfig {
    pub origin: String,
    #[serde(default)]
    pub soa: Option<SoaConfig>,
    #[serde(default)]
    pub records: Vec<RecordConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SoaConfig {
    pub mname: String,
    pub rname: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecordConfig {
    pub name: String,
    pub rtype: String,
    #[serde(default = "default_class")]
    pub class: String,
    pub ttl: u32,
    pub rdata: RecordRdataConfig,
}

fn default_class() -> String {
    "IN".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RecordRdataConfig {
    /// A single textual value: an IP address for A/AAAA, a domain name for
    /// CNAME/NS/PTR, or raw text for TXT.
    Text(String),
    /// `(preference, exchange)` for MX.
    Mx { preference: u16, exchange: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_config_deserializes_from_yaml() {
        let yaml = r#"
interface: 127.0.0.1
port: 9091
zones:
  - origin: example.com.
    records:
      - name: example.com.
        rtype: A
        ttl: 300
        rdata: "1.2.3.4"
      - name: mail.example.com.
        rtype: MX
        ttl: 300
        rdata:
          preference: 10
          exchange: mail.example.com.
"#;
        let config = Config::builder()
            .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
            .build()
            .unwrap();
        let settings: Settings = config.try_deserialize().unwrap();
        assert_eq!(settings.port, Some(9091));
        assert_eq!(settings.zones.len(), 1);
        assert_eq!(settings.zones[0].records.len(), 2);
        assert_eq!(
            settings.zones[0].records[0].rdata,
            RecordRdataConfig::Text("1.2.3.4".to_string())
        );
    }
}
