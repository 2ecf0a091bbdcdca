mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use session::{Policy, Session, SessionError, TranscriptLogger};
use supervisor_core::trigger::TriggerDetector;

const USAGE: &str = "Usage: supervisor-emulator [--policy <glitch|pulse>] [--transcript <path>]";

struct Options {
    policy: Policy,
    transcript: Option<PathBuf>,
}

fn main() {
    let options = parse_options().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });

    if let Err(err) = run(options) {
        eprintln!("{err}");
        process::exit(1);
    }
}

fn run(options: Options) -> Result<(), SessionError> {
    let transcript = match options.transcript {
        Some(path) => {
            let header = format!("Supervisor emulator session (policy {})", options.policy.label());
            Some(TranscriptLogger::create(&path, &header)?)
        }
        None => None,
    };

    match options.policy {
        Policy::GlitchFilter => repl(Session::glitch_filter(transcript)?),
        Policy::PulseCount => repl(Session::pulse_count(transcript)?),
    }
}

fn repl<T: TriggerDetector>(mut session: Session<T>) -> Result<(), SessionError> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut line = String::new();

    writeln!(
        writer,
        "Supervisor emulator ready ({}). Type `help` for commands or `exit` to quit.",
        T::KIND
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(writer, "Session closed.")?;
            break;
        }

        for response in session.handle_line(trimmed)? {
            writeln!(writer, "{response}")?;
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn parse_options() -> Result<Options, String> {
    let mut options = Options {
        policy: Policy::GlitchFilter,
        transcript: None,
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--policy=") {
            options.policy = Policy::from_tag(value)?;
        } else if arg == "--policy" {
            let value = args.next().ok_or("Expected value after --policy")?;
            options.policy = Policy::from_tag(&value)?;
        } else if let Some(value) = arg.strip_prefix("--transcript=") {
            options.transcript = Some(PathBuf::from(value));
        } else if arg == "--transcript" {
            let value = args.next().ok_or("Expected value after --transcript")?;
            options.transcript = Some(PathBuf::from(value));
        } else {
            return Err(format!("Unexpected argument `{arg}`"));
        }
    }

    Ok(options)
}
