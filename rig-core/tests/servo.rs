use std::thread;

use rig_core::clock::Micros;
use rig_core::config::ServoConfig;
use rig_core::servo::{ServoChannel, ServoReading, pulse_to_angle};

const FRAME_US: u32 = 20_000;

fn pulse(channel: &ServoChannel, rise: u32, width: u32) {
    channel.on_edge(true, Micros::new(rise));
    channel.on_edge(false, Micros::new(rise + width));
}

#[test]
fn end_points_and_tolerance_band() {
    let config = ServoConfig::DEFAULT;
    let channel = ServoChannel::new(config);

    let cases = [
        (config.min_us, ServoReading::Angle(0)),
        (config.max_us, ServoReading::Angle(180)),
        (config.min_us - config.tolerance_us, ServoReading::Angle(0)),
        (config.max_us + config.tolerance_us, ServoReading::Angle(180)),
        (config.min_us - config.tolerance_us - 1, ServoReading::OutOfRange),
        (config.max_us + config.tolerance_us + 1, ServoReading::OutOfRange),
    ];
    for (frame, (width, expected)) in (0u32..).zip(cases) {
        let rise = frame * FRAME_US;
        pulse(&channel, rise, width);
        let reading = channel.read(Micros::new(rise + width + 100));
        assert_eq!(reading, expected, "width {width}");
    }
}

#[test]
fn silence_reads_not_connected() {
    let channel = ServoChannel::new(ServoConfig::DEFAULT);
    assert_eq!(channel.read(Micros::new(0)).as_sentinel(), -1);

    pulse(&channel, 0, 1_500);
    let fell = 1_500;
    assert!(channel.read(Micros::new(fell + 50_000)).angle().is_some());
    assert_eq!(channel.read(Micros::new(fell + 50_001)).as_sentinel(), -1);
}

#[test]
fn angle_is_monotonic_across_the_range() {
    let config = ServoConfig::DEFAULT;
    let mut previous = 0;
    for width in config.min_us..=config.max_us {
        let angle = pulse_to_angle(width, &config).unwrap();
        assert!(angle >= previous);
        previous = angle;
    }
    assert_eq!(previous, 180);
}

#[test]
fn snapshot_never_mixes_two_pulses() {
    let channel = ServoChannel::new(ServoConfig::DEFAULT);
    let width_for = |frame: u32| 1_000 + (frame % 2) * 500;

    thread::scope(|scope| {
        scope.spawn(|| {
            for frame in 1..20_000u32 {
                pulse(&channel, frame * FRAME_US, width_for(frame));
            }
        });

        for _ in 0..20_000 {
            let snapshot = channel.snapshot();
            if let Some(fell) = snapshot.last_valid_at {
                let rise = fell.as_u32() - snapshot.pulse_width_us;
                assert_eq!(rise % FRAME_US, 0);
                assert_eq!(snapshot.pulse_width_us, width_for(rise / FRAME_US));
            }
        }
    });
}
