//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::io::{BufReader, Cursor};
use std::path::PathBuf;

use setline_engine::config::{self, Config};
use setline_engine::driver::Driver;
use setline_engine::recorder::{self, Record, Recorder};
use setline_utils::testing::{MockDevice, setup};

use crate::fixtures::{TestGroup, group};

//
// Helper functions.
//

fn recording_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir()
        .join(format!("setline-{name}-{}.jsonl", std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

fn recorder_config(path: &PathBuf) -> config::Recorder {
    config::Recorder {
        enabled: true,
        path: path.display().to_string(),
    }
}

//
// Tests.
//

#[test]
fn record_and_replay() {
    setup();
    let path = recording_path("replay");
    let config = Config::default();
    let mut session = Recorder::new(MockDevice::new(), &recorder_config(&path));
    assert!(session.is_recording());

    let mut driver = Driver::new(&mut session, &config);
    let mut object = driver
        .plan::<TestGroup>(&group("grp1").with_field("forward_only", true))
        .unwrap();
    driver.create::<TestGroup>(&mut object).unwrap();
    driver.delete::<TestGroup>(&mut object).unwrap();
    let device = session.into_inner();

    let file = std::fs::File::open(&path).unwrap();
    let entries = recorder::load(BufReader::new(file)).unwrap();
    let commits = entries
        .iter()
        .filter_map(|entry| match &entry.record {
            Record::Commit { comment } => Some(comment.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(
        commits,
        ["create resource test_group", "delete resource test_group"]
    );
    assert!(matches!(entries[0].record, Record::Command { .. }));

    let mut replayed = MockDevice::with_config(["set system host-name r1"]);
    recorder::replay(&mut replayed, &entries).unwrap();
    assert!(replayed.commands.is_empty());
    assert_eq!(replayed.transactions, device.transactions);
    assert_eq!(replayed.running(), ["system host-name r1"]);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn disabled_recorder() {
    let path = recording_path("disabled");
    let config = config::Recorder {
        enabled: false,
        ..recorder_config(&path)
    };
    let session = Recorder::new(MockDevice::new(), &config);
    assert!(!session.is_recording());
    assert!(!path.exists());

    let config = config::Recorder {
        enabled: true,
        path: "/nonexistent/setline/session.jsonl".to_owned(),
    };
    let session = Recorder::new(MockDevice::new(), &config);
    assert!(!session.is_recording());
}

#[test]
fn malformed_records_are_skipped() {
    let input = concat!(
        r#"{"timestamp":"2024-05-01T10:00:00Z","type":"clear"}"#,
        "\n",
        "not json\n",
        "\n",
        r#"{"timestamp":"2024-05-01T10:00:01Z","type":"commit","comment":"c"}"#,
        "\n",
    );
    let entries = recorder::load(Cursor::new(input)).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].record, Record::Clear);
    assert_eq!(
        entries[1].record,
        Record::Commit {
            comment: "c".to_owned()
        }
    );
}
