use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use embedded_storage::{ReadStorage, Storage};
use rig_core::clock::{Micros, Millis};
use rig_core::config::{LOG_CAPACITY, RigConfig};
use rig_core::event_log::{LogStore, RestoreOutcome};
use rig_core::rig::{Rig, RigPorts};
use rig_core::servo::{ServoBank, ServoId};

use crate::bench::{
    CapturedSerial, HostDisplay, HostEeprom, SCROLL_DOWN, SCROLL_NEUTRAL, SCROLL_UP, VirtualIo,
};

const RIG_CONFIG: RigConfig = RigConfig::DEFAULT;

/// Log image offset within the EEPROM.
const LOG_BASE: u32 = 0;
/// Hobby servo frame period.
const SERVO_FRAME_MS: u32 = 20;
/// How long `press`, `up` and `down` hold the control, then release it.
const PRESS_HOLD_MS: u32 = 30;
/// Time given to the rig to sample a changed input.
const SETTLE_MS: u32 = 5;
/// Upper bound for a single `wait`.
const MAX_WAIT_MS: u32 = 600_000;

pub const HELP_TOPICS: &[(&str, &str)] = &[
    (
        "press",
        "press                         - press and release the action button",
    ),
    (
        "scroll",
        "up | down                     - flick the scroll switch",
    ),
    (
        "valve",
        "valve <ipa|n2o> <open|close>  - set an igniter valve level",
    ),
    (
        "servo",
        "servo <ipa|n2o> <us|off>      - drive a main valve servo",
    ),
    (
        "sensor",
        "ig|main|spark <counts>        - set a 10-bit sensor reading",
    ),
    ("wait", "wait <ms>                     - advance the clock"),
    ("screen", "screen                        - show the display"),
    (
        "serial",
        "serial                        - print captured serial output",
    ),
    (
        "status",
        "status                        - show screen, LED and log state",
    ),
    (
        "eeprom",
        "eeprom [corrupt]              - inspect or damage the stored log",
    ),
    (
        "reboot",
        "reboot                        - restart the controller from EEPROM",
    ),
    (
        "help",
        "help [topic]                  - show help for a command",
    ),
];

type CommandResult = Result<Vec<String>, String>;

pub struct Session {
    rig: Rig,
    restore: RestoreOutcome,
    io: VirtualIo,
    servos: ServoBank,
    servo_widths: [Option<u32>; 2],
    display: HostDisplay,
    serial: CapturedSerial,
    eeprom: HostEeprom,
    now_ms: u32,
    led_on: bool,
    events: Vec<String>,
    transcript: Option<TranscriptLogger>,
}

impl Session {
    pub fn new(eeprom: HostEeprom, transcript: Option<&Path>) -> io::Result<Self> {
        let transcript = transcript.map(TranscriptLogger::new).transpose()?;
        let mut session = Self {
            rig: Rig::with_config(RIG_CONFIG, LogStore::new(LOG_BASE)),
            restore: RestoreOutcome::Empty,
            io: VirtualIo::default(),
            servos: RIG_CONFIG.servo_bank(),
            servo_widths: [None, None],
            display: HostDisplay::default(),
            serial: CapturedSerial::default(),
            eeprom,
            now_ms: 0,
            led_on: false,
            events: Vec::new(),
            transcript,
        };
        session.restore = session.rig.boot(&mut session.eeprom);
        Ok(session)
    }

    /// Describes what boot found in the EEPROM.
    #[must_use]
    pub fn boot_summary(&self) -> String {
        describe_restore(self.restore, self.rig.log().sequence())
    }

    #[cfg(test)]
    pub fn display(&self) -> &HostDisplay {
        &self.display
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        self.record(TranscriptRole::Host, &[trimmed.to_string()])?;

        let words: Vec<&str> = trimmed.split_whitespace().collect();
        let lines = match self.execute(&words) {
            Ok(lines) => lines,
            Err(message) => vec![format!("ERR {message}")],
        };

        self.record(TranscriptRole::Emulator, &lines)?;
        Ok(lines)
    }

    fn execute(&mut self, words: &[&str]) -> CommandResult {
        let Some((&command, args)) = words.split_first() else {
            return Ok(Vec::new());
        };

        match command.to_ascii_lowercase().as_str() {
            "help" => Ok(help(args.first().copied())),
            "press" => {
                self.io.action = true;
                self.advance(PRESS_HOLD_MS);
                self.io.action = false;
                self.advance(PRESS_HOLD_MS);
                Ok(self.acknowledge())
            }
            "up" => Ok(self.flick(SCROLL_UP)),
            "down" => Ok(self.flick(SCROLL_DOWN)),
            "valve" => self.handle_valve(args),
            "servo" => self.handle_servo(args),
            "ig" | "main" | "spark" => self.handle_sensor(command, args),
            "wait" => {
                let ms = parse_number(expect_arg(args, 0, "wait <ms>")?)?;
                if ms > MAX_WAIT_MS {
                    return Err(format!("wait is limited to {MAX_WAIT_MS} ms"));
                }
                self.advance(ms);
                Ok(self.acknowledge())
            }
            "screen" => Ok(self.display.framed()),
            "serial" => {
                let lines = self.serial.drain();
                if lines.is_empty() {
                    Ok(vec!["(no serial output)".to_string()])
                } else {
                    Ok(lines)
                }
            }
            "status" => Ok(self.status()),
            "eeprom" => self.handle_eeprom(args),
            "reboot" => {
                self.rig = Rig::with_config(RIG_CONFIG, LogStore::new(LOG_BASE));
                self.restore = self.rig.boot(&mut self.eeprom);
                self.display = HostDisplay::default();
                Ok(vec![self.boot_summary()])
            }
            other => Err(format!("unknown command `{other}` (try `help`)")),
        }
    }

    fn flick(&mut self, counts: u16) -> Vec<String> {
        self.io.scroll = counts;
        self.advance(PRESS_HOLD_MS);
        self.io.scroll = SCROLL_NEUTRAL;
        self.advance(PRESS_HOLD_MS);
        self.acknowledge()
    }

    fn handle_valve(&mut self, args: &[&str]) -> CommandResult {
        let usage = "valve <ipa|n2o> <open|close>";
        let which = expect_arg(args, 0, usage)?;
        let open = match expect_arg(args, 1, usage)?.to_ascii_lowercase().as_str() {
            "open" | "on" => true,
            "close" | "closed" | "off" => false,
            other => return Err(format!("unknown valve state `{other}`")),
        };
        match parse_servo_id(which)? {
            ServoId::Ipa => self.io.ig_ipa_valve = open,
            ServoId::N2o => self.io.ig_n2o_valve = open,
        }
        self.advance(SETTLE_MS);
        Ok(self.acknowledge())
    }

    fn handle_servo(&mut self, args: &[&str]) -> CommandResult {
        let usage = "servo <ipa|n2o> <us|off>";
        let id = parse_servo_id(expect_arg(args, 0, usage)?)?;
        let value = expect_arg(args, 1, usage)?;
        let width = if value.eq_ignore_ascii_case("off") {
            None
        } else {
            let width = parse_number(value)?;
            if width == 0 || width >= SERVO_FRAME_MS * 1_000 {
                return Err(format!("pulse width must be 1..{} us", SERVO_FRAME_MS * 1_000));
            }
            Some(width)
        };
        self.servo_widths[servo_slot(id)] = width;
        self.advance(SERVO_FRAME_MS);
        Ok(self.acknowledge())
    }

    fn handle_sensor(&mut self, sensor: &str, args: &[&str]) -> CommandResult {
        let counts = parse_number(expect_arg(args, 0, "ig|main|spark <counts>")?)?;
        let counts = u16::try_from(counts)
            .ok()
            .filter(|counts| *counts <= 1_023)
            .ok_or_else(|| format!("sensor reading must be 0..=1023, got {counts}"))?;
        match sensor.to_ascii_lowercase().as_str() {
            "ig" => self.io.ig_pressure = counts,
            "main" => self.io.main_pressure = counts,
            _ => self.io.spark = counts,
        }
        self.advance(SETTLE_MS);
        Ok(self.acknowledge())
    }

    fn handle_eeprom(&mut self, args: &[&str]) -> CommandResult {
        let store = *self.rig.store();
        if let Some(action) = args.first() {
            if !action.eq_ignore_ascii_case("corrupt") {
                return Err(format!("unknown eeprom action `{action}`"));
            }
            let offset = store.complement_offset(LOG_CAPACITY);
            let mut byte = [0u8];
            self.eeprom
                .read(offset, &mut byte)
                .map_err(|err| format!("eeprom read failed: {err:?}"))?;
            self.eeprom
                .write(offset, &[byte[0] ^ 0x01])
                .map_err(|err| format!("eeprom write failed: {err:?}"))?;
            return Ok(vec![format!("check byte at {offset} flipped")]);
        }

        let sequence = store
            .read_sequence(&mut self.eeprom, LOG_CAPACITY)
            .map_err(|err| err.to_string())?;
        let (count, complement) = store
            .read_check_bytes(&mut self.eeprom, LOG_CAPACITY)
            .map_err(|err| err.to_string())?;
        let valid = usize::from(count) + usize::from(complement) == LOG_CAPACITY
            && count > 0
            && usize::from(count) < LOG_CAPACITY;
        Ok(vec![format!(
            "image: sequence {sequence}, count {count}, check {complement} ({})",
            if valid { "valid" } else { "invalid" }
        )])
    }

    fn status(&self) -> Vec<String> {
        let log = self.rig.log();
        let screen = self
            .rig
            .active_screen()
            .map_or("none", |screen| screen.title());
        vec![
            format!("clock: {} ms", self.now_ms),
            format!("screen: {screen}"),
            format!(
                "led: {} ({:?})",
                if self.led_on { "on" } else { "off" },
                self.rig.led_mode()
            ),
            format!(
                "log: {} entries, sequence {}, {}",
                log.len(),
                log.sequence(),
                if log.is_enabled() { "recording" } else { "idle" }
            ),
            format!("serial: {} lines pending", self.serial.pending()),
        ]
    }

    /// Runs the rig for `ms` one-millisecond ticks.
    pub fn advance(&mut self, ms: u32) {
        for _ in 0..ms {
            self.now_ms = self.now_ms.wrapping_add(1);
            let now_us = self.now_ms.wrapping_mul(1_000);
            if self.now_ms % SERVO_FRAME_MS == 0 {
                self.pulse_servos(now_us);
            }

            let report = self.rig.tick(
                Millis::new(self.now_ms),
                Micros::new(now_us),
                RigPorts {
                    io: &mut self.io,
                    servos: &self.servos,
                    display: &mut self.display,
                    serial: &mut self.serial,
                    storage: &mut self.eeprom,
                },
            );
            self.led_on = report.led_on;
            if let Some(screen) = report.entered {
                self.events
                    .push(format!("[{:>7} ms] screen -> {}", self.now_ms, screen.title()));
            }
        }
    }

    fn pulse_servos(&self, fall_us: u32) {
        for id in ServoId::ALL {
            if let Some(width) = self.servo_widths[servo_slot(id)] {
                let channel = self.servos.channel(id);
                channel.on_edge(true, Micros::new(fall_us.wrapping_sub(width)));
                channel.on_edge(false, Micros::new(fall_us));
            }
        }
    }

    fn acknowledge(&mut self) -> Vec<String> {
        let mut lines = std::mem::take(&mut self.events);
        lines.push("OK".to_string());
        lines
    }

    fn record(&mut self, role: TranscriptRole, lines: &[String]) -> io::Result<()> {
        if let Some(transcript) = &mut self.transcript {
            for line in lines {
                transcript.append_line(self.now_ms, role, line)?;
            }
        }
        Ok(())
    }
}

fn help(topic: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    match topic {
        Some(target) => {
            if let Some((_, detail)) = HELP_TOPICS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(target))
            {
                lines.push((*detail).to_string());
            } else {
                lines.push(format!("No help available for `{target}`."));
                lines.push(format!("Available topics: {}", help_topic_list()));
            }
        }
        None => {
            lines.push("Available commands:".to_string());
            for (_, detail) in HELP_TOPICS {
                lines.push(format!("  {detail}"));
            }
            lines.push("Type `help <topic>` for a specific command.".to_string());
        }
    }
    lines
}

fn help_topic_list() -> String {
    HELP_TOPICS
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_restore(outcome: RestoreOutcome, sequence: u16) -> String {
    match outcome {
        RestoreOutcome::Restored { entries } => {
            format!("log restored: {entries} entries, sequence {sequence}")
        }
        RestoreOutcome::Empty => format!("log empty, sequence {sequence}"),
        RestoreOutcome::Invalid => "log image invalid; starting empty".to_string(),
        RestoreOutcome::Unreadable => "log storage unreadable; starting empty".to_string(),
    }
}

fn expect_arg<'a>(args: &[&'a str], index: usize, usage: &str) -> Result<&'a str, String> {
    args.get(index)
        .copied()
        .ok_or_else(|| format!("usage: {usage}"))
}

fn parse_number(text: &str) -> Result<u32, String> {
    text.parse()
        .map_err(|_| format!("invalid number `{text}`"))
}

fn parse_servo_id(text: &str) -> Result<ServoId, String> {
    if text.eq_ignore_ascii_case("ipa") {
        Ok(ServoId::Ipa)
    } else if text.eq_ignore_ascii_case("n2o") {
        Ok(ServoId::N2o)
    } else {
        Err(format!("unknown channel `{text}` (expected ipa or n2o)"))
    }
}

const fn servo_slot(id: ServoId) -> usize {
    match id {
        ServoId::Ipa => 0,
        ServoId::N2o => 1,
    }
}

struct TranscriptLogger {
    writer: BufWriter<std::fs::File>,
}

impl TranscriptLogger {
    fn new(path: &Path) -> io::Result<Self> {
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
        logger.write_header()?;
        Ok(logger)
    }

    fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.writer, "# Test stand rig emulator transcript")?;
        writeln!(self.writer, "# Timestamps are virtual milliseconds since boot")?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(&mut self, now_ms: u32, role: TranscriptRole, line: &str) -> io::Result<()> {
        writeln!(self.writer, "[+{now_ms:>7} ms] {} {line}", role.prefix())?;
        self.writer.flush()
    }
}

#[derive(Copy, Clone)]
enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(HostEeprom::blank(), None).unwrap()
    }

    fn run(session: &mut Session, command: &str) -> Vec<String> {
        session.handle_command(command).unwrap()
    }

    #[test]
    fn blank_eeprom_boots_to_menu() {
        let mut session = session();
        assert_eq!(session.boot_summary(), "log image invalid; starting empty");

        run(&mut session, "wait 1");
        assert_eq!(session.display().row(0), "* Full Run          ");
    }

    #[test]
    fn full_run_survives_reboot() {
        let mut session = session();
        let lines = run(&mut session, "press");
        assert!(lines.iter().any(|line| line.ends_with("screen -> Full Run")));

        run(&mut session, "valve ipa open");
        run(&mut session, "valve ipa close");
        let lines = run(&mut session, "press");
        assert!(lines.iter().any(|line| line.ends_with("screen -> Menu")));
        assert_eq!(lines.last().map(String::as_str), Some("OK"));

        let status = run(&mut session, "status");
        assert!(status.contains(&"log: 3 entries, sequence 0, idle".to_string()));

        assert_eq!(
            run(&mut session, "eeprom"),
            ["image: sequence 0, count 3, check 97 (valid)"]
        );
        assert_eq!(
            run(&mut session, "reboot"),
            ["log restored: 3 entries, sequence 0"]
        );
    }

    #[test]
    fn corrupted_image_is_discarded_on_reboot() {
        let mut session = session();
        run(&mut session, "press");
        run(&mut session, "spark 500");
        run(&mut session, "press");

        run(&mut session, "eeprom corrupt");
        assert_eq!(
            run(&mut session, "reboot"),
            ["log image invalid; starting empty"]
        );
    }

    #[test]
    fn log_to_serial_is_captured() {
        let mut session = session();
        run(&mut session, "press");
        run(&mut session, "valve n2o open");
        run(&mut session, "press");

        run(&mut session, "down");
        run(&mut session, "down");
        let lines = run(&mut session, "press");
        assert!(lines.iter().any(|line| line.ends_with("screen -> Log to Serial")));

        let serial = run(&mut session, "serial");
        assert_eq!(serial.len(), 3);
        assert_eq!(serial[0], "Log #:     0");
        assert_eq!(&serial[2][6..17], "IG N2O Open");
        assert_eq!(run(&mut session, "serial"), ["(no serial output)"]);
    }

    #[test]
    fn servo_shows_on_main_valve_screen() {
        let mut session = session();
        for _ in 0..5 {
            run(&mut session, "down");
        }
        run(&mut session, "press");
        run(&mut session, "servo ipa 2400");
        run(&mut session, "wait 400");

        let screen = run(&mut session, "screen");
        assert_eq!(screen[0], format!("+{}+", "-".repeat(20)));
        assert_eq!(screen[3], "|IPA Valve: 2400  180|");
        assert_eq!(screen[4], "|N2O Valve: N/C      |");
    }

    #[test]
    fn bad_input_is_reported() {
        let mut session = session();
        assert_eq!(
            run(&mut session, "valve lox open"),
            ["ERR unknown channel `lox` (expected ipa or n2o)"]
        );
        assert_eq!(run(&mut session, "wait soon"), ["ERR invalid number `soon`"]);
        assert_eq!(
            run(&mut session, "ig 2000"),
            ["ERR sensor reading must be 0..=1023, got 2000"]
        );
        assert_eq!(
            run(&mut session, "launch"),
            ["ERR unknown command `launch` (try `help`)"]
        );
    }

    #[test]
    fn help_lists_topics() {
        let mut session = session();
        let lines = run(&mut session, "help");
        assert_eq!(lines.len(), HELP_TOPICS.len() + 2);
        assert_eq!(run(&mut session, "help wait"), [HELP_TOPICS[5].1]);
    }
}
