use anyhow::{anyhow, Result};
use clap::ArgMatches;
use lazy_static::lazy_static;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::policy::CRITICAL_VULNERABILITY_THRESHOLD;

pub static SERVICE_NAME: &str = "image-scan-server";

lazy_static! {
    pub(crate) static ref HOSTNAME: String =
        std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("unknown"));
}

pub struct Config {
    pub addr: SocketAddr,
    pub tls_config: Option<TlsConfig>,
    pub scanner_path: PathBuf,
    pub scan_timeout: Option<Duration>,
    pub max_concurrent_scans: usize,
    pub critical_vulnerability_threshold: usize,
    pub metrics_enabled: bool,
    pub log_level: String,
    pub log_fmt: String,
    pub log_no_color: bool,
}

#[derive(Clone, Debug)]
pub struct TlsConfig {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

impl Config {
    pub fn from_args(matches: &ArgMatches) -> Result<Self> {
        let addr = api_bind_address(matches)?;
        let tls_config = tls_config(matches)?;

        let scanner_path = matches
            .get_one::<String>("scanner-path")
            .map(PathBuf::from)
            .expect("This should not happen, there's a default value for scanner-path");
        let scan_timeout = if *matches
            .get_one::<bool>("disable-timeout-protection")
            .expect("clap should have set a default value")
        {
            None
        } else {
            let seconds = matches
                .get_one::<String>("scan-timeout")
                .expect("scan-timeout should always be set")
                .parse::<u64>()
                .map_err(|e| anyhow!("error parsing scan-timeout: {}", e))?;
            Some(Duration::from_secs(seconds))
        };
        let max_concurrent_scans = match matches.get_one::<String>("max-concurrent-scans") {
            Some(v) => v
                .parse::<usize>()
                .map_err(|e| anyhow!("error parsing max-concurrent-scans: {}", e))?,
            None => num_cpus::get(),
        };
        if max_concurrent_scans == 0 {
            return Err(anyhow!("max-concurrent-scans must be greater than zero"));
        }

        let metrics_enabled = matches
            .get_one::<bool>("enable-metrics")
            .expect("clap should have set a default value")
            .to_owned();
        let log_level = matches
            .get_one::<String>("log-level")
            .expect("This should not happen, there's a default value for log-level")
            .to_owned();
        let log_fmt = matches
            .get_one::<String>("log-fmt")
            .expect("This should not happen, there's a default value for log-fmt")
            .to_owned();
        let log_no_color = matches
            .get_one::<bool>("log-no-color")
            .expect("clap should have assigned a default value")
            .to_owned();

        Ok(Self {
            addr,
            tls_config,
            scanner_path,
            scan_timeout,
            max_concurrent_scans,
            critical_vulnerability_threshold: CRITICAL_VULNERABILITY_THRESHOLD,
            metrics_enabled,
            log_level,
            log_fmt,
            log_no_color,
        })
    }
}

fn api_bind_address(matches: &ArgMatches) -> Result<SocketAddr> {
    format!(
        "{}:{}",
        matches
            .get_one::<String>("address")
            .expect("This should not happen, there's a default value for addr"),
        matches
            .get_one::<String>("port")
            .expect("This should not happen, there's a default value for port")
    )
    .parse()
    .map_err(|e| anyhow!("error parsing arguments: {}", e))
}

fn tls_config(matches: &ArgMatches) -> Result<Option<TlsConfig>> {
    let cert_file = matches
        .get_one::<String>("cert-file")
        .expect("This should not happen, there's a default value for cert-file");
    let key_file = matches
        .get_one::<String>("key-file")
        .expect("This should not happen, there's a default value for key-file");

    match (cert_file.is_empty(), key_file.is_empty()) {
        (true, true) => Ok(None),
        (false, false) => Ok(Some(TlsConfig {
            cert_file: PathBuf::from(cert_file),
            key_file: PathBuf::from(key_file),
        })),
        _ => Err(anyhow!("error parsing arguments: either both --cert-file and --key-file must be provided, or neither")),
    }
}
