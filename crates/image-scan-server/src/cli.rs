use clap::builder::PossibleValue;
use clap::{crate_authors, crate_description, crate_name, crate_version, Arg, ArgAction, Command};

use crate::scanner::DEFAULT_SCANNER_PATH;

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .env("IMAGE_SCAN_LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .env("IMAGE_SCAN_LOG_FMT")
            .default_value("text")
            .value_parser([
                PossibleValue::new("text"),
                PossibleValue::new("json"),
                PossibleValue::new("otlp"),
            ])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("IMAGE_SCAN_BIND_ADDRESS")
            .help("Bind against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value("8080")
            .env("IMAGE_SCAN_PORT")
            .help("Listen on PORT"),
        Arg::new("cert-file")
            .long("cert-file")
            .value_name("CERT_FILE")
            .default_value("")
            .env("IMAGE_SCAN_CERT_FILE")
            .help("Path to an X.509 certificate file for HTTPS"),
        Arg::new("key-file")
            .long("key-file")
            .value_name("KEY_FILE")
            .default_value("")
            .env("IMAGE_SCAN_KEY_FILE")
            .help("Path to an X.509 private key file for HTTPS"),
        Arg::new("scanner-path")
            .long("scanner-path")
            .value_name("SCANNER_PATH")
            .default_value(DEFAULT_SCANNER_PATH)
            .env("IMAGE_SCAN_SCANNER_PATH")
            .help("Path to the trivy executable used to scan images"),
        Arg::new("scan-timeout")
            .long("scan-timeout")
            .value_name("MAXIMUM_EXECUTION_TIME_SECONDS")
            .default_value("25")
            .env("IMAGE_SCAN_SCAN_TIMEOUT")
            .help("Interrupt an image scan after the given time. The image is then rejected. Keep it below the webhook timeoutSeconds"),
        Arg::new("disable-timeout-protection")
            .long("disable-timeout-protection")
            .env("IMAGE_SCAN_DISABLE_TIMEOUT_PROTECTION")
            .action(ArgAction::SetTrue)
            .help("Disable image scan timeout protection"),
        Arg::new("max-concurrent-scans")
            .long("max-concurrent-scans")
            .value_name("MAX_CONCURRENT_SCANS")
            .env("IMAGE_SCAN_MAX_CONCURRENT_SCANS")
            .help("Maximum number of scanner processes running at the same time. Defaults to the number of CPUs"),
        Arg::new("enable-metrics")
            .long("enable-metrics")
            .env("IMAGE_SCAN_ENABLE_METRICS")
            .action(ArgAction::SetTrue)
            .help("Enable metrics"),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    Command::new(crate_name!())
        .author(crate_authors!())
        .version(crate_version!())
        .about(crate_description!())
        .args(args)
}
