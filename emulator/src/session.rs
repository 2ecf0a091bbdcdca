use std::cell::{Cell, RefCell};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use supervisor_core::config::{
    ConfigError, GLITCH_FILTER_CONFIG, PULSE_COUNT_BURST, PULSE_COUNT_CONFIG, SupervisorConfig,
};
use supervisor_core::lines::{LineDrive, OutputId};
use supervisor_core::output::{OutputDriver, Pulser};
use supervisor_core::script::{CommandWord, EdgeTrain, Stimulus, parse_line};
use supervisor_core::status::StatusFormatter;
use supervisor_core::supervisor::{HeartbeatOutcome, Supervisor, TickReport};
use supervisor_core::telemetry::SupervisorEventKind;
use supervisor_core::trigger::{EdgeOutcome, GlitchFilter, PulseCounter, TriggerDetector};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Policy {
    GlitchFilter,
    PulseCount,
}

impl Policy {
    pub fn from_tag(tag: &str) -> Result<Self, String> {
        if tag.eq_ignore_ascii_case("glitch") || tag.eq_ignore_ascii_case("glitch-filter") {
            Ok(Self::GlitchFilter)
        } else if tag.eq_ignore_ascii_case("pulse") || tag.eq_ignore_ascii_case("pulse-count") {
            Ok(Self::PulseCount)
        } else {
            Err(format!("Unknown policy `{tag}`"))
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Policy::GlitchFilter => "glitch",
            Policy::PulseCount => "pulse",
        }
    }
}

#[derive(Debug)]
pub enum SessionError {
    Config(ConfigError),
    Io(io::Error),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Config(err) => write!(f, "invalid supervisor configuration: {err}"),
            SessionError::Io(err) => write!(f, "transcript error: {err}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<ConfigError> for SessionError {
    fn from(err: ConfigError) -> Self {
        SessionError::Config(err)
    }
}

impl From<io::Error> for SessionError {
    fn from(err: io::Error) -> Self {
        SessionError::Io(err)
    }
}

/// Virtual time shared by the session, the simulated outputs, and the delay.
pub struct VirtualClock {
    now: Cell<Duration>,
    since_tick: Cell<Duration>,
    tick: Duration,
}

impl VirtualClock {
    fn new(tick: Duration) -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
            since_tick: Cell::new(Duration::ZERO),
            tick,
        }
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    fn until_next_tick(&self) -> Duration {
        self.tick - self.since_tick.get()
    }

    /// Moves time forward by `by`, which must not cross more than one tick
    /// boundary. Returns `true` when the boundary was reached.
    fn step(&self, by: Duration) -> bool {
        let until = self.until_next_tick();
        if by >= until {
            self.now.set(self.now.get() + until);
            self.since_tick.set(Duration::ZERO);
            true
        } else {
            self.now.set(self.now.get() + by);
            self.since_tick.set(self.since_tick.get() + by);
            false
        }
    }
}

/// Blocking delay that keeps the tick running while an output pulse is held.
struct SimDelay<'a, T> {
    supervisor: &'a Supervisor<T>,
    clock: &'a VirtualClock,
    notes: &'a RefCell<Vec<String>>,
}

impl<T: TriggerDetector> DelayNs for SimDelay<'_, T> {
    fn delay_ns(&mut self, ns: u32) {
        let mut remaining = Duration::from_nanos(u64::from(ns));
        while !remaining.is_zero() {
            let step = remaining.min(self.clock.until_next_tick());
            remaining -= step;
            if self.clock.step(step) {
                let report = self.supervisor.on_tick();
                self.notes
                    .borrow_mut()
                    .extend(describe_tick(self.clock.now(), &report));
            }
        }
    }
}

/// Output pins as seen by the emulator.
struct SimOutputs<'a> {
    clock: &'a VirtualClock,
    levels: &'a mut [LineDrive; 2],
    notes: &'a RefCell<Vec<String>>,
}

impl OutputDriver for SimOutputs<'_> {
    fn drive(&mut self, output: OutputId, drive: LineDrive) {
        self.levels[output_index(output)] = drive;
        self.notes.borrow_mut().push(format!(
            "{} {} {}",
            format_offset(self.clock.now()),
            output.line().name,
            drive_label(drive)
        ));
    }
}

pub struct Session<T> {
    supervisor: Supervisor<T>,
    config: SupervisorConfig,
    clock: VirtualClock,
    levels: [LineDrive; 2],
    transcript: Option<TranscriptLogger>,
}

impl Session<GlitchFilter> {
    pub fn glitch_filter(transcript: Option<TranscriptLogger>) -> Result<Self, SessionError> {
        Self::new(GLITCH_FILTER_CONFIG, GlitchFilter::new(), transcript)
    }
}

impl Session<PulseCounter> {
    pub fn pulse_count(transcript: Option<TranscriptLogger>) -> Result<Self, SessionError> {
        let burst = PULSE_COUNT_BURST.ticks(PULSE_COUNT_CONFIG.tick)?;
        Self::new(PULSE_COUNT_CONFIG, PulseCounter::new(burst), transcript)
    }
}

impl<T: TriggerDetector> Session<T> {
    pub fn new(
        config: SupervisorConfig,
        detector: T,
        transcript: Option<TranscriptLogger>,
    ) -> Result<Self, SessionError> {
        let timeouts = config.timeouts()?;
        let mut session = Self {
            supervisor: Supervisor::new(timeouts, detector),
            config,
            clock: VirtualClock::new(config.tick.as_duration()),
            levels: [
                OutputId::Reset.line().idle,
                OutputId::Remote.line().idle,
            ],
            transcript,
        };

        let banner = format!(
            "policy={} tick={} cold-start={} steady={}",
            T::KIND,
            format_duration_short(config.tick.as_duration()),
            format_duration_short(config.cold_start_timeout),
            format_duration_short(config.steady_timeout),
        );
        session.record_output(&[banner])?;
        Ok(session)
    }

    #[must_use]
    pub fn supervisor(&self) -> &Supervisor<T> {
        &self.supervisor
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    #[must_use]
    pub fn level(&self, output: OutputId) -> LineDrive {
        self.levels[output_index(output)]
    }

    /// Runs one stimulus line and returns the emulator's response.
    pub fn handle_line(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(transcript) = self.transcript.as_mut() {
            transcript.append_line(self.clock.now(), TranscriptRole::Host, trimmed)?;
        }

        let lines = match parse_line(trimmed) {
            Ok(None) => Vec::new(),
            Ok(Some(stimulus)) => self.apply(stimulus),
            Err(err) => vec![format!("ERR syntax {err}")],
        };

        self.record_output(&lines)?;
        Ok(lines)
    }

    fn apply(&mut self, stimulus: Stimulus<'_>) -> Vec<String> {
        let mut lines = Vec::new();
        match stimulus {
            Stimulus::Heartbeat(train) => self.heartbeat_train(train, &mut lines),
            Stimulus::Trigger(train) => self.trigger_train(train, &mut lines),
            Stimulus::Advance(duration) => {
                self.advance(duration, &mut lines);
                lines.push(format!("OK now={}", format_offset(self.clock.now())));
            }
            Stimulus::Status => self.status(&mut lines),
            Stimulus::Help(topic) => help(topic, &mut lines),
        }
        lines
    }

    fn heartbeat_train(&mut self, train: EdgeTrain, lines: &mut Vec<String>) {
        let mut deferred = 0u32;
        for index in 0..train.count {
            self.space_edge(train, index, lines);
            match self.supervisor.on_heartbeat_edge() {
                HeartbeatOutcome::Unlocked => lines.push(format!(
                    "{} unlocked phase={}",
                    format_offset(self.clock.now()),
                    self.supervisor.phase().label()
                )),
                HeartbeatOutcome::Deferred => deferred += 1,
                HeartbeatOutcome::Rearmed => {}
            }
        }

        let mut summary = format!("OK heartbeat x{}", train.count);
        if deferred > 0 {
            summary.push_str(&format!(" deferred={deferred}"));
        }
        lines.push(summary);
    }

    fn trigger_train(&mut self, train: EdgeTrain, lines: &mut Vec<String>) {
        let mut last = EdgeOutcome::Pending;
        for index in 0..train.count {
            self.space_edge(train, index, lines);
            last = self.supervisor.on_trigger_edge();
            if last == EdgeOutcome::Unlocked {
                lines.push(format!(
                    "{} unlocked phase={} discarded=1",
                    format_offset(self.clock.now()),
                    self.supervisor.phase().label()
                ));
            }
        }

        let progress = match last {
            EdgeOutcome::Unlocked => "unlock".to_string(),
            EdgeOutcome::Pending => "pending".to_string(),
            EdgeOutcome::Counted(count) => format!("burst={count}"),
            EdgeOutcome::Satisfied => "satisfied".to_string(),
        };
        lines.push(format!("OK trigger x{} {progress}", train.count));
    }

    fn space_edge(&mut self, train: EdgeTrain, index: u16, lines: &mut Vec<String>) {
        if index == 0 {
            return;
        }
        if let Some(gap) = train.spacing {
            self.advance(gap, lines);
        }
    }

    /// Lets virtual time pass, ticking the supervisor and servicing requests
    /// at the instant they are raised.
    fn advance(&mut self, by: Duration, lines: &mut Vec<String>) {
        let Some(deadline) = self.clock.now().checked_add(by) else {
            lines.push(format!("ERR clock overflow advancing {by:?}"));
            return;
        };
        while self.clock.now() < deadline {
            let step = (deadline - self.clock.now()).min(self.clock.until_next_tick());
            if !self.clock.step(step) {
                continue;
            }

            let report = self.supervisor.on_tick();
            lines.extend(describe_tick(self.clock.now(), &report));
            if self.supervisor.has_pending_request() {
                self.service(lines);
            }
        }
    }

    fn service(&mut self, lines: &mut Vec<String>) {
        while self.supervisor.has_pending_request() {
            let notes = RefCell::new(Vec::new());
            let outputs = SimOutputs {
                clock: &self.clock,
                levels: &mut self.levels,
                notes: &notes,
            };
            let delay = SimDelay {
                supervisor: &self.supervisor,
                clock: &self.clock,
                notes: &notes,
            };
            let mut pulser = Pulser::new(outputs, delay, self.config.pulse_widths());
            let report = self.supervisor.service(&mut pulser);

            lines.extend(notes.into_inner());
            if report.is_idle() {
                break;
            }
        }
    }

    fn status(&self, lines: &mut Vec<String>) {
        let snapshot = self.supervisor.snapshot();
        let formatter = StatusFormatter::new(&snapshot, self.config.tick);
        lines.extend(formatter.to_string().lines().map(str::to_string));
        lines.push(format!(
            "outputs now={} {}={} {}={}",
            format_offset(self.clock.now()),
            OutputId::Reset.line().name,
            drive_label(self.level(OutputId::Reset)),
            OutputId::Remote.line().name,
            drive_label(self.level(OutputId::Remote)),
        ));
    }

    fn record_output(&mut self, lines: &[String]) -> io::Result<()> {
        if let Some(transcript) = self.transcript.as_mut() {
            for line in lines {
                transcript.append_line(self.clock.now(), TranscriptRole::Emulator, line)?;
            }
        }
        Ok(())
    }
}

fn help(topic: Option<&str>, lines: &mut Vec<String>) {
    match topic {
        Some(target) => {
            if let Some(command) = CommandWord::lookup(target) {
                lines.push(command.usage().to_string());
            } else {
                lines.push(format!("No help available for `{target}`."));
                lines.push(format!("Available topics: {}", help_topic_list()));
            }
        }
        None => {
            lines.push("Available commands:".to_string());
            for command in CommandWord::ALL {
                lines.push(format!("  {}", command.usage()));
            }
            lines.push("Durations take ms, s, or m suffixes.".to_string());
        }
    }
}

fn help_topic_list() -> String {
    CommandWord::ALL
        .iter()
        .map(|command| command.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_tick(at: Duration, report: &TickReport) -> Vec<String> {
    report
        .events()
        .into_iter()
        .map(|event| match (event, report.noise_discarded) {
            (SupervisorEventKind::NoisyBurst, Some(count)) => {
                format!("{} {event} discarded={count}", format_offset(at))
            }
            _ => format!("{} {event}", format_offset(at)),
        })
        .collect()
}

const fn output_index(output: OutputId) -> usize {
    match output {
        OutputId::Reset => 0,
        OutputId::Remote => 1,
    }
}

const fn drive_label(drive: LineDrive) -> &'static str {
    match drive {
        LineDrive::DriveLow => "drive-low",
        LineDrive::DriveHigh => "drive-high",
        LineDrive::Float => "float",
    }
}

fn format_offset(at: Duration) -> String {
    format!("+{}.{:03}s", at.as_secs(), at.subsec_millis())
}

fn format_duration_short(duration: Duration) -> String {
    if duration.as_secs() == 0 {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}

pub struct TranscriptLogger {
    writer: BufWriter<std::fs::File>,
}

impl TranscriptLogger {
    pub fn create(path: &Path, header: &str) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: BufWriter::new(file),
        };

        logger.write_header(header)?;
        Ok(logger)
    }

    fn write_header(&mut self, header: &str) -> io::Result<()> {
        writeln!(self.writer, "# {header}")?;
        writeln!(
            self.writer,
            "# Timestamps are milliseconds of virtual time since power-up"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(
        &mut self,
        elapsed: Duration,
        role: TranscriptRole,
        line: &str,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>7} ms] {} {}",
            elapsed.as_millis(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}
