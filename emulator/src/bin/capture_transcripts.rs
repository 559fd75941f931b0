use std::io;
use std::path::Path;

#[allow(dead_code)]
#[path = "../bench.rs"]
mod bench;
#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use bench::HostEeprom;
use session::Session;

const TRANSCRIPT_DIR: &str = "transcripts";

fn main() -> io::Result<()> {
    record("full-run", FULL_RUN)?;
    record("diagnostics", DIAGNOSTICS)?;
    record("corrupt-log", CORRUPT_LOG)?;
    Ok(())
}

const FULL_RUN: &[&str] = &[
    "press",
    "spark 600",
    "valve ipa open",
    "valve n2o open",
    "ig 240",
    "wait 250",
    "ig 360",
    "servo ipa 1472",
    "servo n2o 1500",
    "wait 12000",
    "valve ipa close",
    "valve n2o close",
    "spark 0",
    "press",
    "status",
    "down",
    "press",
    "screen",
    "down",
    "down",
    "screen",
    "press",
    "down",
    "press",
    "serial",
];

const DIAGNOSTICS: &[&str] = &[
    "down",
    "down",
    "down",
    "press",
    "spark 700",
    "wait 200",
    "screen",
    "press",
    "down",
    "press",
    "valve ipa open",
    "wait 200",
    "screen",
    "press",
    "down",
    "press",
    "servo ipa 2400",
    "wait 300",
    "screen",
    "servo ipa off",
    "wait 300",
    "screen",
    "press",
    "down",
    "press",
    "ig 348",
    "wait 200",
    "screen",
];

const CORRUPT_LOG: &[&str] = &[
    "press",
    "valve ipa open",
    "press",
    "eeprom",
    "eeprom corrupt",
    "eeprom",
    "reboot",
    "status",
];

fn record(name: &str, script: &[&str]) -> io::Result<()> {
    let path = Path::new(TRANSCRIPT_DIR).join(format!("{name}.log"));
    let mut session = Session::new(HostEeprom::blank(), Some(&path))?;
    for command in script {
        let _ = session.handle_command(command)?;
    }
    println!("wrote {}", path.display());
    Ok(())
}
