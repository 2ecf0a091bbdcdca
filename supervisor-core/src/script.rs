//! Stimulus grammar for driving a supervisor from text.
//!
//! The emulator and the scenario replays describe signal activity one line
//! at a time:
//!
//! ```text
//! heartbeat                  # one heartbeat edge
//! trigger 10 every 50ms      # a burst of ten trigger edges
//! advance 60s                # let virtual time pass
//! status
//! help trigger
//! ```
//!
//! The command word is matched case-insensitively, then `winnow` parses the
//! arguments. Everything stays `no_std`; only [`parse_script`] needs `alloc`.

use core::fmt;
use core::time::Duration;

use winnow::ModalResult;
use winnow::ascii::{Caseless, alpha1, dec_uint, space0, space1};
use winnow::combinator::{alt, opt, preceded, terminated};
use winnow::prelude::*;

/// Longest stretch of virtual time one line may ask for, either as an
/// `advance` or as the span of a spaced edge train.
pub const MAX_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Edges delivered on one input, optionally spaced in time.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EdgeTrain {
    pub count: u16,
    /// Gap between consecutive edges; `None` delivers them back to back.
    pub spacing: Option<Duration>,
}

impl EdgeTrain {
    #[must_use]
    pub const fn single() -> Self {
        Self {
            count: 1,
            spacing: None,
        }
    }

    /// Virtual time consumed between the first and the last edge.
    #[must_use]
    pub fn span(&self) -> Duration {
        match self.spacing {
            Some(gap) => gap.saturating_mul(u32::from(self.count.saturating_sub(1))),
            None => Duration::ZERO,
        }
    }
}

/// One parsed line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Stimulus<'a> {
    Heartbeat(EdgeTrain),
    Trigger(EdgeTrain),
    Advance(Duration),
    Status,
    Help(Option<&'a str>),
}

/// Command words understood by the grammar.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CommandWord {
    Heartbeat,
    Trigger,
    Advance,
    Status,
    Help,
}

impl CommandWord {
    const TABLE: [(&'static str, CommandWord); 6] = [
        ("heartbeat", CommandWord::Heartbeat),
        ("trigger", CommandWord::Trigger),
        ("advance", CommandWord::Advance),
        ("wait", CommandWord::Advance),
        ("status", CommandWord::Status),
        ("help", CommandWord::Help),
    ];

    #[must_use]
    pub fn lookup(word: &str) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(word))
            .map(|(_, command)| *command)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            CommandWord::Heartbeat => "heartbeat",
            CommandWord::Trigger => "trigger",
            CommandWord::Advance => "advance",
            CommandWord::Status => "status",
            CommandWord::Help => "help",
        }
    }

    /// One-line usage string.
    #[must_use]
    pub const fn usage(self) -> &'static str {
        match self {
            CommandWord::Heartbeat => "heartbeat [<count>] [every <duration>]  - edges on the heartbeat input",
            CommandWord::Trigger => "trigger [<count>] [every <duration>]    - edges on the trigger input",
            CommandWord::Advance => "advance <duration>                      - let virtual time pass (alias: wait)",
            CommandWord::Status => "status                                  - show supervisor state and counters",
            CommandWord::Help => "help [<topic>]                          - show help for a command",
        }
    }

    pub const ALL: [CommandWord; 5] = [
        CommandWord::Heartbeat,
        CommandWord::Trigger,
        CommandWord::Advance,
        CommandWord::Status,
        CommandWord::Help,
    ];
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ScriptErrorKind {
    MissingCommand,
    UnknownCommand,
    InvalidArguments(CommandWord),
}

/// Parse failure with the byte offset into the offending line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ScriptError {
    pub kind: ScriptErrorKind,
    pub offset: usize,
    /// 1-based line number when parsing a whole script, 0 for a single line.
    pub line: usize,
}

impl ScriptError {
    const fn new(kind: ScriptErrorKind, offset: usize) -> Self {
        Self {
            kind,
            offset,
            line: 0,
        }
    }

    #[must_use]
    #[must_use]
    pub const fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            write!(f, "line {}: ", self.line)?;
        }
        match self.kind {
            ScriptErrorKind::MissingCommand => write!(f, "expected a command at column {}", self.offset),
            ScriptErrorKind::UnknownCommand => write!(f, "unknown command at column {}", self.offset),
            ScriptErrorKind::InvalidArguments(command) => write!(
                f,
                "invalid arguments for `{}` at column {} (usage: {})",
                command.name(),
                self.offset,
                command.usage()
            ),
        }
    }
}

#[derive(Copy, Clone)]
enum Unit {
    Millis,
    Seconds,
    Minutes,
}

impl Unit {
    fn scale(self, value: u64) -> Option<Duration> {
        match self {
            Unit::Millis => Some(Duration::from_millis(value)),
            Unit::Seconds => Some(Duration::from_secs(value)),
            Unit::Minutes => value.checked_mul(60).map(Duration::from_secs),
        }
    }
}

/// Parses `<int>ms`, `<int>s`, or `<int>m`, up to [`MAX_DURATION`].
pub fn duration(input: &mut &str) -> ModalResult<Duration> {
    (
        dec_uint::<_, u64, _>,
        alt((
            Caseless("ms").value(Unit::Millis),
            Caseless("s").value(Unit::Seconds),
            Caseless("m").value(Unit::Minutes),
        )),
    )
        .verify_map(|(value, unit)| unit.scale(value).filter(|d| *d <= MAX_DURATION))
        .parse_next(input)
}

fn edge_count(input: &mut &str) -> ModalResult<u16> {
    dec_uint.verify(|count: &u16| *count > 0).parse_next(input)
}

fn edge_train(input: &mut &str) -> ModalResult<EdgeTrain> {
    (
        opt(preceded(space1, edge_count)),
        opt(preceded((space1, Caseless("every"), space1), duration)),
        space0,
    )
        .map(|(count, spacing, _)| EdgeTrain {
            count: count.unwrap_or(1),
            spacing,
        })
        .verify(|train: &EdgeTrain| train.span() <= MAX_DURATION)
        .parse_next(input)
}

fn advance(input: &mut &str) -> ModalResult<Duration> {
    terminated(preceded(space1, duration), space0).parse_next(input)
}

fn no_arguments(input: &mut &str) -> ModalResult<()> {
    space0.void().parse_next(input)
}

fn help_topic<'a>(input: &mut &'a str) -> ModalResult<Option<&'a str>> {
    terminated(opt(preceded(space1, alpha1)), space0).parse_next(input)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(index) => &line[..index],
        None => line,
    }
}

/// Parses one line. Blank and comment-only lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Stimulus<'_>>, ScriptError> {
    let content = strip_comment(line).trim_end();
    let body = content.trim_start();
    if body.is_empty() {
        return Ok(None);
    }
    let start = content.len() - body.len();

    let mut rest = body;
    let word: &str = alpha1
        .parse_next(&mut rest)
        .map_err(|_: winnow::error::ErrMode<winnow::error::ContextError>| {
            ScriptError::new(ScriptErrorKind::MissingCommand, start)
        })?;
    let command = CommandWord::lookup(word)
        .ok_or(ScriptError::new(ScriptErrorKind::UnknownCommand, start))?;
    let args_start = start + word.len();

    let parsed = match command {
        CommandWord::Heartbeat => edge_train.map(Stimulus::Heartbeat).parse(rest),
        CommandWord::Trigger => edge_train.map(Stimulus::Trigger).parse(rest),
        CommandWord::Advance => advance.map(Stimulus::Advance).parse(rest),
        CommandWord::Status => no_arguments.value(Stimulus::Status).parse(rest),
        CommandWord::Help => help_topic.map(Stimulus::Help).parse(rest),
    };

    parsed.map(Some).map_err(|err| {
        ScriptError::new(
            ScriptErrorKind::InvalidArguments(command),
            args_start + err.offset(),
        )
    })
}

/// Line-by-line iterator over a script, skipping blanks and comments.
pub struct Script<'a> {
    lines: core::str::Lines<'a>,
    line_no: usize,
}

impl<'a> Script<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
            line_no: 0,
        }
    }
}

impl<'a> Iterator for Script<'a> {
    /// Line number paired with the parsed stimulus.
    type Item = Result<(usize, Stimulus<'a>), ScriptError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            match parse_line(line) {
                Ok(Some(stimulus)) => return Some(Ok((self.line_no, stimulus))),
                Ok(None) => {}
                Err(err) => return Some(Err(err.at_line(self.line_no))),
            }
        }
    }
}

/// Parses a whole script, stopping at the first bad line.
#[cfg(feature = "alloc")]
pub fn parse_script(text: &str) -> Result<alloc::vec::Vec<(usize, Stimulus<'_>)>, ScriptError> {
    Script::new(text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_commands_default_to_one_edge() {
        assert_eq!(
            parse_line("heartbeat"),
            Ok(Some(Stimulus::Heartbeat(EdgeTrain::single())))
        );
        assert_eq!(
            parse_line("  TRIGGER  "),
            Ok(Some(Stimulus::Trigger(EdgeTrain::single())))
        );
        assert_eq!(parse_line("status"), Ok(Some(Stimulus::Status)));
    }

    #[test]
    fn trains_accept_count_and_spacing() {
        let parsed = parse_line("trigger 10 every 50ms").unwrap();
        let train = EdgeTrain {
            count: 10,
            spacing: Some(Duration::from_millis(50)),
        };
        assert_eq!(parsed, Some(Stimulus::Trigger(train)));
        assert_eq!(train.span(), Duration::from_millis(450));

        assert_eq!(
            parse_line("heartbeat every 1s"),
            Ok(Some(Stimulus::Heartbeat(EdgeTrain {
                count: 1,
                spacing: Some(Duration::from_secs(1)),
            })))
        );
    }

    #[test]
    fn advance_parses_units() {
        assert_eq!(
            parse_line("advance 60s"),
            Ok(Some(Stimulus::Advance(Duration::from_secs(60))))
        );
        assert_eq!(
            parse_line("wait 1100ms"),
            Ok(Some(Stimulus::Advance(Duration::from_millis(1_100))))
        );
        assert_eq!(
            parse_line("advance 5m"),
            Ok(Some(Stimulus::Advance(Duration::from_secs(300))))
        );
    }

    #[test]
    fn durations_past_one_day_are_rejected() {
        assert_eq!(
            parse_line("advance 1440m"),
            Ok(Some(Stimulus::Advance(MAX_DURATION)))
        );

        for line in [
            "advance 1441m",
            "advance 18446744073709551615s",
            "advance 18446744073709551615m",
        ] {
            let err = parse_line(line).unwrap_err();
            assert_eq!(
                err.kind,
                ScriptErrorKind::InvalidArguments(CommandWord::Advance),
                "{line}"
            );
        }
    }

    #[test]
    fn spaced_trains_are_capped_on_their_span() {
        assert!(parse_line("trigger 1440 every 60s").is_ok());

        let err = parse_line("trigger 65535 every 1440m").unwrap_err();
        assert_eq!(
            err.kind,
            ScriptErrorKind::InvalidArguments(CommandWord::Trigger)
        );
    }

    #[test]
    fn help_topic_is_optional() {
        assert_eq!(parse_line("help"), Ok(Some(Stimulus::Help(None))));
        assert_eq!(
            parse_line("help trigger"),
            Ok(Some(Stimulus::Help(Some("trigger"))))
        );
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("   # power-up noise"), Ok(None));
        assert_eq!(
            parse_line("status # show counters"),
            Ok(Some(Stimulus::Status))
        );
    }

    #[test]
    fn errors_report_offsets() {
        let unknown = parse_line("  reboot").unwrap_err();
        assert_eq!(unknown.kind, ScriptErrorKind::UnknownCommand);
        assert_eq!(unknown.offset, 2);

        let missing_unit = parse_line("advance 60").unwrap_err();
        assert_eq!(
            missing_unit.kind,
            ScriptErrorKind::InvalidArguments(CommandWord::Advance)
        );

        let zero = parse_line("trigger 0").unwrap_err();
        assert_eq!(
            zero.kind,
            ScriptErrorKind::InvalidArguments(CommandWord::Trigger)
        );

        let symbol = parse_line("42").unwrap_err();
        assert_eq!(symbol.kind, ScriptErrorKind::MissingCommand);
    }

    #[test]
    fn script_iterator_numbers_lines() {
        let text = "# warm-up\nheartbeat\n\nadvance 1s\nbogus\n";
        let mut script = Script::new(text);
        assert_eq!(
            script.next(),
            Some(Ok((2, Stimulus::Heartbeat(EdgeTrain::single()))))
        );
        assert_eq!(
            script.next(),
            Some(Ok((4, Stimulus::Advance(Duration::from_secs(1)))))
        );
        let err = script.next().unwrap().unwrap_err();
        assert_eq!(err.line, 5);
        assert_eq!(err.kind, ScriptErrorKind::UnknownCommand);
        assert_eq!(script.next(), None);
    }
}
