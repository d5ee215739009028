/// vodomon — scrape the ARSO water station page once and write the snapshot.
///
/// Usage:
///   vodomon                    fetch, extract, write snapshot
///   vodomon --offline <file>   same, reading a saved page instead
///   vodomon --verify           report coordinate coverage, write nothing
///
/// Configuration comes from `vodomon.toml` (or `$VODOMON_CONFIG`).
/// Exits with status 1 on any failure.

use std::process::ExitCode;

use vodomon_service::config::ServiceConfig;
use vodomon_service::dev_mode::FileSource;
use vodomon_service::ingest::arso::{build_client, HtmlSource};
use vodomon_service::logging::{self, init_logger, Source};
use vodomon_service::stations::CoordinateLookup;
use vodomon_service::{trigger, verify, ScrapePipeline};

struct Args {
    offline: Option<String>,
    verify: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args { offline: None, verify: false };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--verify" => args.verify = true,
            "--offline" => {
                args.offline = Some(it.next().ok_or("--offline needs a file path")?);
            }
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }
    Ok(args)
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logger(
        config.logging.min_level(),
        config.logging.file.as_deref(),
        config.logging.timestamps,
    );

    let source: Box<dyn HtmlSource> = match &args.offline {
        Some(path) => Box::new(FileSource::new(path)),
        None => match build_client(&config) {
            Ok(client) => Box::new(client),
            Err(e) => {
                logging::error(Source::System, None, &e.to_string());
                return ExitCode::FAILURE;
            }
        },
    };

    let lookup = CoordinateLookup::load(&config.coordinates_path);

    if args.verify {
        return match verify::verify_coverage(source.as_ref(), &config.source_url, &lookup) {
            Ok(report) => {
                verify::print_summary(&report);
                ExitCode::SUCCESS
            }
            Err(e) => {
                logging::error(Source::System, None, &format!("Verification failed: {}", e));
                ExitCode::FAILURE
            }
        };
    }

    let mut pipeline = ScrapePipeline::from_config(&config, lookup);
    let response = trigger::handle_update("GET", &mut pipeline, source.as_ref());
    println!("{}", response.body_json());

    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
