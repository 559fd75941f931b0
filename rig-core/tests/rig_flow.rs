mod common;

use common::{Bench, Eeprom, SCROLL_DOWN, SCROLL_UP};
use rig_core::config::RigConfig;
use rig_core::event_log::{LogOp, RestoreOutcome};
use rig_core::led::LedMode;
use rig_core::rig::Rig;
use rig_core::screens::{FullRunPhase, Screen};
use rig_core::servo::ServoId;

fn select(bench: &mut Bench, index: usize) {
    for _ in 0..index {
        bench.scroll(SCROLL_DOWN);
    }
    bench.press();
}

fn ops(bench: &Bench) -> Vec<LogOp> {
    bench
        .rig
        .log()
        .entries()
        .iter()
        .filter_map(|entry| entry.op())
        .collect()
}

#[test]
fn boots_into_menu_with_first_item_marked() {
    let mut bench = Bench::new();
    assert_eq!(bench.screen(), Some(Screen::Menu));
    bench.run(1);

    assert_eq!(bench.lcd.row(0), "* Full Run          ");
    assert_eq!(bench.lcd.row(1), "  Log Review        ");
    assert_eq!(bench.lcd.row(3), "  Spark Test        ");
}

#[test]
fn menu_scroll_moves_marker_and_window() {
    let mut bench = Bench::new();
    bench.run(1);

    bench.scroll(SCROLL_DOWN);
    assert_eq!(bench.rig.menu_selection(), 1);
    assert_eq!(bench.lcd.row(0), "  Full Run          ");
    assert_eq!(bench.lcd.row(1), "* Log Review        ");

    for _ in 0..10 {
        bench.scroll(SCROLL_DOWN);
    }
    assert_eq!(bench.rig.menu_selection(), 6);
    assert_eq!(bench.lcd.row(3), "* Ig Pressure Sensor");
    assert_eq!(bench.lcd.row(0), "  Spark Test        ");

    bench.scroll(SCROLL_UP);
    assert_eq!(bench.rig.menu_selection(), 5);
}

#[test]
fn full_run_logs_inputs_and_persists() {
    let mut bench = Bench::new();
    bench.run(1);
    bench.press();
    assert_eq!(bench.screen(), Some(Screen::FullRun));
    assert!(bench.rig.log().is_enabled());
    assert_eq!(bench.rig.led_mode(), LedMode::Blinking);

    bench.io.ipa = true;
    bench.run(5);
    bench.io.n2o = true;
    bench.run(5);
    bench.io.spark = 500;
    bench.run(5);
    bench.io.ig = 300;
    bench.run(5);
    bench.set_servo(ServoId::Ipa, Some(1_472));
    bench.run(60);

    bench.press();
    assert_eq!(bench.screen(), Some(Screen::Menu));
    assert!(!bench.rig.log().is_enabled());

    assert_eq!(
        ops(&bench),
        [
            LogOp::LogStart,
            LogOp::IgIpaOpen,
            LogOp::IgN2oOpen,
            LogOp::SparkFirst,
            LogOp::IgPressureChange,
            LogOp::IgPressureGood1,
            LogOp::MainIpaChange,
        ]
    );
    let params: Vec<u8> = bench.rig.log().entries().iter().map(|e| e.param).collect();
    assert_eq!(params, [0, 0, 0, 0, 75, 75, 90]);

    let mut reboot = Rig::<100>::new(*bench.rig.store());
    let mut eeprom = bench.eeprom.clone();
    assert_eq!(
        reboot.boot(&mut eeprom),
        RestoreOutcome::Restored { entries: 7 }
    );
    assert_eq!(reboot.log().entries(), bench.rig.log().entries());
}

#[test]
fn closing_edges_are_logged_at_normal_tier() {
    let mut bench = Bench::new();
    bench.run(1);
    bench.press();

    bench.io.ipa = true;
    bench.io.spark = 500;
    bench.run(5);
    bench.io.ipa = false;
    bench.io.spark = 0;
    bench.run(5);
    bench.press();

    assert_eq!(
        ops(&bench),
        [
            LogOp::LogStart,
            LogOp::IgIpaOpen,
            LogOp::SparkFirst,
            LogOp::IgIpaClose,
            LogOp::SparkLast,
        ]
    );
}

#[test]
fn nothing_is_logged_outside_a_run() {
    let mut bench = Bench::new();
    bench.io.ipa = true;
    bench.io.ig = 600;
    bench.set_servo(ServoId::N2o, Some(2_000));
    bench.run(100);
    assert!(bench.rig.log().is_empty());
}

#[test]
fn failed_commit_holds_until_acknowledged() {
    let mut bench = Bench::new();
    bench.run(1);
    bench.press();
    bench.io.n2o = true;
    bench.run(5);

    bench.eeprom.fail_writes = true;
    bench.press();
    assert_eq!(bench.screen(), Some(Screen::FullRun));
    assert_eq!(bench.rig.full_run_phase(), FullRunPhase::SaveFailed);
    assert_eq!(bench.lcd.row(0), "Log save failed     ");

    bench.press();
    assert_eq!(bench.screen(), Some(Screen::Menu));
}

#[test]
fn log_review_pages_through_entries() {
    let mut bench = Bench::new();
    bench.run(1);
    bench.press();
    for _ in 0..3 {
        bench.io.ipa = true;
        bench.run(5);
        bench.io.ipa = false;
        bench.run(5);
    }
    bench.press();
    // LogStart + 3 opens + 3 closes.
    assert_eq!(bench.rig.log().len(), 7);

    select(&mut bench, 1);
    assert_eq!(bench.screen(), Some(Screen::LogReview));
    assert_eq!(bench.lcd.row(0), "Log #:     0        ");
    assert_eq!(bench.lcd.row(1), "    0 LOG Start     ");
    assert_eq!(&bench.lcd.row(2)[6..16], "IG IPA Ope");

    for _ in 0..10 {
        bench.scroll(SCROLL_DOWN);
    }
    // Scrolling stops with the last entry on the bottom row.
    assert_eq!(&bench.lcd.row(3)[6..16], "IG IPA Clo");
    assert_eq!(&bench.lcd.row(0)[6..16], "IG IPA Ope");

    bench.scroll(SCROLL_UP);
    assert_eq!(&bench.lcd.row(0)[6..16], "IG IPA Clo");

    bench.press();
    assert_eq!(bench.screen(), Some(Screen::Menu));
}

#[test]
fn log_to_serial_dumps_then_returns() {
    let mut bench = Bench::new();
    bench.run(1);
    bench.press();
    bench.io.spark = 500;
    bench.run(5);
    bench.press();

    select(&mut bench, 2);
    assert_eq!(bench.screen(), Some(Screen::Menu));
    assert!(bench.entered.contains(&Screen::LogToSerial));

    let lines = &bench.serial.lines;
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Log #:     0");
    assert_eq!(lines[1], format!("{:<30}", "    0 LOG Start"));
    assert_eq!(&lines[2][6..17], "SPARK Start");
    assert_eq!(lines[2].len(), 30);
}

#[test]
fn main_valve_screen_reports_servo_state() {
    let mut bench = Bench::new();
    bench.run(1);
    select(&mut bench, 5);
    assert_eq!(bench.screen(), Some(Screen::MainValveTest));
    bench.run(200);
    assert_eq!(bench.lcd.row(2), "IPA Valve: N/C      ");

    bench.set_servo(ServoId::Ipa, Some(1_472));
    bench.set_servo(ServoId::N2o, Some(3_000));
    bench.run(400);
    assert_eq!(bench.lcd.row(2), "IPA Valve: 1472   90");
    assert_eq!(bench.lcd.row(3), "N2O Valve: error    ");

    bench.set_servo(ServoId::Ipa, None);
    bench.run(400);
    assert_eq!(bench.lcd.row(2), "IPA Valve: N/C      ");
}

#[test]
fn servo_range_comes_from_rig_config() {
    let mut config = RigConfig::DEFAULT;
    config.servo.min_us = 1_000;
    config.servo.max_us = 2_000;
    let mut bench = Bench::with_config(config, Eeprom::blank(1_024));
    bench.run(1);
    select(&mut bench, 5);

    bench.set_servo(ServoId::Ipa, Some(1_500));
    bench.set_servo(ServoId::N2o, Some(2_400));
    bench.run(400);
    assert_eq!(bench.lcd.row(2), "IPA Valve: 1500   90");
    assert_eq!(bench.lcd.row(3), "N2O Valve: error    ");
}

#[test]
fn pressure_screen_shows_raw_and_scaled() {
    let mut bench = Bench::new();
    bench.run(1);
    select(&mut bench, 6);
    assert_eq!(bench.screen(), Some(Screen::IgPressureTest));

    bench.io.ig = 348;
    bench.run(200);
    assert_eq!(bench.lcd.row(0), "Ig Pressure Test    ");
    assert_eq!(bench.lcd.row(2), "Raw Value:    348   ");
    assert_eq!(bench.lcd.row(3), "Pressure:    150 PSI");
}
