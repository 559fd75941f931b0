mod bench;
mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use crossterm::style::Stylize;

use bench::HostEeprom;
use session::Session;

#[derive(Debug, Default)]
struct Options {
    eeprom: Option<PathBuf>,
    transcript: Option<PathBuf>,
}

fn main() -> io::Result<()> {
    let options = parse_options().unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("Usage: rig-emulator [--eeprom <path>] [--transcript <path>]");
        process::exit(2);
    });

    let eeprom = match &options.eeprom {
        Some(path) => HostEeprom::open(path)?,
        None => HostEeprom::blank(),
    };

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut session = Session::new(eeprom, options.transcript.as_deref())?;
    let mut line = String::new();

    writeln!(
        writer,
        "Test stand rig emulator ready ({}). Type `help` for commands or `exit` to quit.",
        session.boot_summary()
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

        for response in session.handle_command(trimmed)? {
            if response.starts_with("ERR") {
                writeln!(writer, "{}", response.red())?;
            } else {
                writeln!(writer, "{response}")?;
            }
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn parse_options() -> Result<Options, String> {
    let mut options = Options::default();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
            None => (arg, None),
        };
        let slot = match flag.as_str() {
            "--eeprom" => &mut options.eeprom,
            "--transcript" => &mut options.transcript,
            other => return Err(format!("Unknown argument `{other}`")),
        };
        let value = match inline {
            Some(value) => value,
            None => args
                .next()
                .ok_or_else(|| format!("Expected value after {flag}"))?,
        };
        *slot = Some(PathBuf::from(value));
    }
    Ok(options)
}
