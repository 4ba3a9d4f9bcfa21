//! Purpose: `rowcast` CLI entry point.
//! Role: Binary crate root; parses args, streams typed rows to stdout.
//! Invariants: Rows go to stdout only; errors and notices go to stderr.
//! Invariants: Non-interactive errors and notices are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use rowcast::api::{
    DelimitedReader, Error, ErrorKind, ParserConfig, QuoteMode, RowCursor, Schema, TypedRow,
    to_exit_code,
};
use rowcast::notice::{Notice, notice_json};
use rowcast::render::{bracketed, row_json};
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

#[derive(Parser)]
#[command(
    name = "rowcast",
    version,
    about = "Parse delimited text into schema-typed rows",
    long_about = r#"Parse delimited text into schema-typed rows.

Each record is split into fields (quotes protect delimiters, doubled quotes
escape a literal quote) and every field is converted to its declared column type."#,
    after_help = r#"EXAMPLES
  $ rowcast data.csv --schema int,text,text
  $ rowcast data.csv --schema int,text,float --start 2 --format jsonl
  $ cat data.tsv | rowcast - --schema text,uint --delimiter '\t' --errors skip

TYPES
  text, int, uint, float, bool"#
)]
struct Cli {
    #[arg(
        default_value = "-",
        help = "Input file, or - for stdin",
        value_hint = ValueHint::FilePath
    )]
    input: PathBuf,
    #[arg(long, short = 's', help = "Comma-separated column types, e.g. int,text,float")]
    schema: String,
    #[arg(
        long,
        default_value_t = 1,
        allow_negative_numbers = true,
        help = "First record to emit (1-based); earlier records are skipped"
    )]
    start: i64,
    #[arg(long, short = 'd', default_value = ",", value_parser = parse_char_arg, help = "Column delimiter")]
    delimiter: char,
    #[arg(long, default_value = "\\n", value_parser = parse_char_arg, help = "Record delimiter (ASCII)")]
    record_delimiter: char,
    #[arg(long, short = 'q', default_value = "\"", value_parser = parse_char_arg, help = "Quote character")]
    quote: char,
    #[arg(long, help = "Reject characters that follow a closing quote instead of dropping them")]
    strict_quotes: bool,
    #[arg(long, default_value = "brackets", value_enum, help = "Row output format: brackets|jsonl")]
    format: OutputFormat,
    #[arg(long, short = 'e', default_value = "stop", value_enum, help = "On a bad row: stop|skip")]
    errors: ErrorPolicy,
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Brackets,
    Jsonl,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ErrorPolicy {
    Stop,
    Skip,
}

fn main() {
    let exit_code = match run(std::env::args_os()) {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run<I>(args: I) -> Result<RunOutcome, (Error, ColorMode)>
where
    I: IntoIterator<Item = OsString>,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                return Ok(RunOutcome::with_code(0));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Run `rowcast --help` for usage."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    init_tracing();
    let color_mode = cli.color;
    parse_input(cli).map_err(|err| (err, color_mode))
}

fn parse_input(cli: Cli) -> Result<RunOutcome, Error> {
    let schema: Schema = cli.schema.parse()?;
    let quote_mode = if cli.strict_quotes {
        QuoteMode::Strict
    } else {
        QuoteMode::Lenient
    };
    let config = ParserConfig::new(schema)
        .with_column_delimiter(cli.delimiter)
        .with_record_delimiter(cli.record_delimiter)
        .with_quote(cli.quote)
        .with_quote_mode(quote_mode)
        .with_start_record(cli.start);
    config.validate()?;

    let input_label = cli.input.display().to_string();
    let reader = open_input(&cli.input)?;
    let mut source = DelimitedReader::with_config(reader, &config);
    let cursor = RowCursor::new(&mut source, &config)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut emitted = 0u64;
    let mut skipped = 0u64;
    for result in cursor {
        match result {
            Ok(row) => {
                write_row(&mut out, &row, cli.format)?;
                emitted += 1;
            }
            Err(err) if cli.errors == ErrorPolicy::Skip && is_row_error(err.kind()) => {
                emit_notice(&skip_notice(&err, &input_label), cli.color);
                skipped += 1;
            }
            Err(err) => {
                flush(&mut out)?;
                return Err(err);
            }
        }
    }
    flush(&mut out)?;
    debug!(emitted, skipped, input = %input_label, "input parsed");
    Ok(RunOutcome::ok())
}

fn open_input(path: &Path) -> Result<Box<dyn BufRead>, Error> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    let file = File::open(path).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message(format!("failed to open {}", path.display()))
            .with_source(err)
    })?;
    Ok(Box::new(BufReader::new(file)))
}

fn is_row_error(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::MalformedField | ErrorKind::SchemaMismatch | ErrorKind::FieldConversion
    )
}

fn write_row(out: &mut impl Write, row: &TypedRow, format: OutputFormat) -> Result<(), Error> {
    let line = match format {
        OutputFormat::Brackets => bracketed(row),
        OutputFormat::Jsonl => serde_json::to_string(&row_json(row)).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("json encode failed")
                .with_source(err)
        })?,
    };
    writeln!(out, "{line}").map_err(write_error)
}

fn flush(out: &mut impl Write) -> Result<(), Error> {
    out.flush().map_err(write_error)
}

fn write_error(err: io::Error) -> Error {
    Error::new(ErrorKind::Io)
        .with_message("failed to write output")
        .with_source(err)
}

fn parse_char_arg(value: &str) -> Result<char, String> {
    match value {
        "\\t" => return Ok('\t'),
        "\\n" => return Ok('\n'),
        "\\r" => return Ok('\r'),
        "\\0" => return Ok('\0'),
        _ => {}
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!(
            "expected a single character or one of \\t \\n \\r \\0, got {value:?}"
        )),
    }
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim_start_matches("error:").trim().to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn notice_time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn skip_notice(err: &Error, input: &str) -> Notice {
    let mut details = Map::new();
    details.insert("error_kind".to_string(), json!(format!("{:?}", err.kind())));
    if let Some(field) = err.field() {
        details.insert("field".to_string(), json!(field));
    }
    Notice {
        kind: "skip".to_string(),
        time: notice_time_now().unwrap_or_default(),
        input: input.to_string(),
        line: err.line(),
        message: error_message(err),
        details,
    }
}

#[derive(Copy, Clone)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn emit_notice(notice: &Notice, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        let label = colorize_label("notice:", color_mode.use_color(is_tty), AnsiColor::Yellow);
        match notice.line {
            Some(line) => eprintln!("{label} skipped line {line}: {}", notice.message),
            None => eprintln!("{label} {}", notice.message),
        }
        return;
    }

    let value = notice_json(notice);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error",
        ErrorKind::Usage => "invalid usage",
        ErrorKind::Configuration => "invalid parser configuration",
        ErrorKind::StartOffsetOutOfRange => "start record is beyond the end of input",
        ErrorKind::MalformedField => "malformed quoted field",
        ErrorKind::SchemaMismatch => "field count does not match schema",
        ErrorKind::FieldConversion => "field does not match its column type",
        ErrorKind::CursorExhausted => "no more records",
        ErrorKind::Io => "i/o error",
    }
    .to_string()
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut current = err.source();
    while let Some(source) = current {
        causes.push(source.to_string());
        current = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(line) = err.line() {
        inner.insert("line".to_string(), json!(line));
    }
    if let Some(field) = err.field() {
        inner.insert("field".to_string(), json!(field));
    }
    if let Some(expected) = err.expected() {
        inner.insert("expected".to_string(), json!(expected));
    }
    if let Some(actual) = err.actual() {
        inner.insert("actual".to_string(), json!(actual));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(line) = err.line() {
        let location = match err.field() {
            Some(field) => format!("line {line}, field {field}"),
            None => format!("line {line}"),
        };
        lines.push(format!(
            "{} {location}",
            colorize_label("at:", use_color, AnsiColor::Yellow)
        ));
    }
    if let (Some(expected), Some(actual)) = (err.expected(), err.actual()) {
        lines.push(format!(
            "{} expected {expected} fields, found {actual}",
            colorize_label("schema:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    for cause in error_causes(err) {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }
    lines.join("\n")
}
