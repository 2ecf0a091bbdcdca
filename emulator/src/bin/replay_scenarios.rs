use std::env;
use std::io;
use std::path::{Path, PathBuf};

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::{Policy, Session, SessionError, TranscriptLogger};
use supervisor_core::script::parse_script;
use supervisor_core::trigger::TriggerDetector;

struct Scenario {
    name: &'static str,
    policy: Policy,
    title: &'static str,
    script: &'static str,
}

const SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "glitch-cold-start",
        policy: Policy::GlitchFilter,
        title: "power-up false pulse on the trigger line is dropped",
        script: "\
# host initializes its pins before the first heartbeat
trigger
advance 1s
status
# every later trigger is real
trigger
advance 100ms
status
",
    },
    Scenario {
        name: "glitch-late-false-pulse",
        policy: Policy::GlitchFilter,
        title: "false pulse after the first heartbeat is still dropped",
        script: "\
heartbeat
advance 2s
trigger
advance 100ms
status
",
    },
    Scenario {
        name: "glitch-heartbeat-timeout",
        policy: Policy::GlitchFilter,
        title: "silent host is reset once after the steady timeout",
        script: "\
heartbeat
advance 59s
heartbeat
advance 60s
advance 50ms
status
",
    },
    Scenario {
        name: "glitch-silent-host",
        policy: Policy::GlitchFilter,
        title: "host never boots: cold-start grace, then steady resets",
        script: "\
advance 5m
advance 60s
status
",
    },
    Scenario {
        name: "pulse-burst",
        policy: Policy::PulseCount,
        title: "ten edges at 50 ms relay one remote action",
        script: "\
heartbeat
trigger 10 every 50ms
advance 1100ms
status
",
    },
    Scenario {
        name: "pulse-noise",
        policy: Policy::PulseCount,
        title: "nine edges then silence are discarded",
        script: "\
heartbeat
trigger 9 every 50ms
advance 1100ms
status
",
    },
    Scenario {
        name: "pulse-deferred-heartbeat",
        policy: Policy::PulseCount,
        title: "heartbeats do not rearm while a relay is in flight",
        script: "\
heartbeat
trigger 10
heartbeat
advance 50ms
status
",
    },
];

fn main() -> Result<(), SessionError> {
    let out_dir = env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("transcripts"), PathBuf::from);

    for scenario in SCENARIOS {
        let path = out_dir.join(format!("{}.log", scenario.name));
        replay(scenario, &path)?;
        println!("{:<26} {}", scenario.name, path.display());
    }
    Ok(())
}

fn replay(scenario: &Scenario, path: &Path) -> Result<(), SessionError> {
    // Reject a broken script before creating its transcript.
    parse_script(scenario.script)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;

    let header = format!("{} ({})", scenario.title, scenario.policy.label());
    let transcript = TranscriptLogger::create(path, &header)?;
    match scenario.policy {
        Policy::GlitchFilter => feed(Session::glitch_filter(Some(transcript))?, scenario.script),
        Policy::PulseCount => feed(Session::pulse_count(Some(transcript))?, scenario.script),
    }
}

fn feed<T: TriggerDetector>(mut session: Session<T>, script: &str) -> Result<(), SessionError> {
    for line in script.lines() {
        session.handle_line(line)?;
    }
    Ok(())
}
