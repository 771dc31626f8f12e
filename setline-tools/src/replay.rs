//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod config;

use std::fs::File;
use std::io::BufReader;

use clap::{App, Arg};
use setline_engine::parse::Parser;
use setline_engine::recorder;
use setline_engine::render::render;
use setline_engine::resource::set_prefix;
use setline_engine::{Error, Identity, Node, existence};
use setline_resources::ResourceType;
use setline_utils::SET_VERB;
use setline_utils::testing::MockDevice;
use similar::{ChangeTag, TextDiff};
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::Layer;
use tracing_subscriber::prelude::*;

use crate::config::{Config, LoggingFileRotation, LoggingFmtStyle};

fn init_tracing(config: &config::Logging) {
    // Enable logging to a file.
    let file = config.file.enabled.then(|| {
        let file_appender = match config.file.rotation {
            LoggingFileRotation::Never => {
                rolling::never(&config.file.dir, &config.file.name)
            }
            LoggingFileRotation::Hourly => {
                rolling::hourly(&config.file.dir, &config.file.name)
            }
            LoggingFileRotation::Daily => {
                rolling::daily(&config.file.dir, &config.file.name)
            }
        };

        let log_level_filter = LevelFilter::from_level(tracing::Level::TRACE);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(false)
            .with_thread_ids(config.file.fmt.show_thread_id)
            .with_file(config.file.fmt.show_source)
            .with_line_number(config.file.fmt.show_source)
            .with_ansi(config.file.fmt.colors);
        let layer = match config.file.fmt.style {
            LoggingFmtStyle::Compact => layer.compact().boxed(),
            LoggingFmtStyle::Full => layer.boxed(),
            LoggingFmtStyle::Json => layer.json().boxed(),
            LoggingFmtStyle::Pretty => layer.pretty().boxed(),
        };
        layer.with_filter(log_level_filter)
    });

    // Enable logging to stderr, leaving stdout to the replay report.
    let stderr = config.stderr.enabled.then(|| {
        let log_level_filter = LevelFilter::from_level(tracing::Level::TRACE);
        let fmt = &config.stderr.fmt;
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(fmt.show_thread_id)
            .with_file(fmt.show_source)
            .with_line_number(fmt.show_source)
            .with_ansi(fmt.colors);
        let layer = match fmt.style {
            LoggingFmtStyle::Compact => layer.compact().boxed(),
            LoggingFmtStyle::Full => layer.boxed(),
            LoggingFmtStyle::Json => layer.json().boxed(),
            LoggingFmtStyle::Pretty => layer.pretty().boxed(),
        };
        layer.with_filter(log_level_filter)
    });

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive("setline=info".parse().unwrap())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(env_filter)
        .with(file)
        .with(stderr)
        .init();
}

// Reads the object back from the replayed device and checks that parsing
// then rendering reproduces what the device holds.
fn inspect(
    device: &mut MockDevice,
    config: &Config,
    resource: ResourceType,
    id: &str,
) -> Result<(), Error> {
    let identity = Identity::parse(resource.keys(), id)?;
    let address = resource.address(&identity);
    let framing = &config.engine.framing;

    let lines = existence::read_lines(device, framing, &address)?;
    if lines.is_empty() {
        println!("{address}: not configured");
        return Ok(());
    }

    let mut seed = Node::new();
    identity.apply(&mut seed);
    let tree = Parser::new(resource.schema())
        .with_framing(framing.clone())
        .parse_lines(seed, &lines)?;
    match serde_json::to_string_pretty(&tree) {
        Ok(json) => println!("{json}"),
        Err(error) => error!(%error, "failed to serialize tree"),
    }

    // Device lines are relative to the address.
    let prefix = set_prefix(&address);
    let before = lines
        .iter()
        .map(|line| match framing.strip_set(line) {
            "" => format!("{SET_VERB} {address}\n"),
            rest => format!("{prefix}{rest}\n"),
        })
        .collect::<String>();
    let mut after = format!("{SET_VERB} {address}\n");
    for line in render(resource.schema(), &tree, &prefix)? {
        after.push_str(&line);
        after.push('\n');
    }

    if before == after {
        info!(%address, "rendering matches device configuration");
        return Ok(());
    }
    let diff = TextDiff::from_lines(&before, &after);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        print!("{sign}{change}");
    }

    Ok(())
}

fn main() {
    // Parse command-line parameters.
    let matches = App::new("Replay session")
        .about("Replay a recorded configuration session")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("file")
                .help("Specify an alternative configuration file."),
        )
        .arg(
            Arg::with_name("RESOURCE")
                .long("resource")
                .help("Resource type to inspect after the replay")
                .value_name("TYPE")
                .requires("ID"),
        )
        .arg(
            Arg::with_name("ID")
                .long("id")
                .help("Resource identifier (e.g. grp1_-_default_-_v4)")
                .value_name("ID")
                .requires("RESOURCE"),
        )
        .arg(
            Arg::with_name("FILENAME")
                .help("Session record file path")
                .required(true)
                .index(1),
        )
        .get_matches();
    let filename = matches.value_of("FILENAME").unwrap();

    // Read configuration file.
    let config = Config::load(matches.value_of("config"));

    // Initialize tracing.
    init_tracing(&config.logging);

    // Load the recorded session.
    let file = File::open(filename).expect("Unable to open record file");
    let entries = recorder::load(BufReader::new(file))
        .expect("Unable to read record file");
    info!(entries = entries.len(), "replaying session");

    // Replay it against an empty device.
    let mut device = MockDevice::new();
    if let Err(error) = recorder::replay(&mut device, &entries) {
        error!(%error, "replay failed");
        std::process::exit(1);
    }
    for transaction in &device.transactions {
        println!(
            "commit {:?}: {} line(s)",
            transaction.comment,
            transaction.lines.len()
        );
    }

    let (Some(resource), Some(id)) =
        (matches.value_of("RESOURCE"), matches.value_of("ID"))
    else {
        return;
    };
    let Some(resource) = ResourceType::from_name(resource) else {
        eprintln!("Unknown resource type");
        std::process::exit(1);
    };
    if let Err(error) = inspect(&mut device, &config, resource, id) {
        error.log();
        std::process::exit(1);
    }
}
