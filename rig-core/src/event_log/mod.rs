//! Severity-tiered event log.
//!
//! Entries are appended during a supervised run and written to non-volatile
//! storage by [`EventLog::commit`]. Capacity is split into tiers so that a
//! burst of low-priority entries can never crowd out the critical ones:
//!
//! | tier     | may fill up to          |
//! |----------|-------------------------|
//! | CRITICAL | `CAP`                   |
//! | NORMAL   | `CAP - NORMAL_RESERVE`  |
//! | DETAIL   | `CAP - DETAIL_RESERVE`  |
//!
//! Timestamps are 16-bit offsets from a rebasing origin. Whenever an entry
//! would land more than [`ROLLOVER_WINDOW_MS`] past the origin, a
//! [`LogOp::TimeRollover`] marker is appended and the origin advances by one
//! window; rendering adds the markers back in as a display bias.

mod persist;
mod render;

pub use persist::{LogStore, PersistError, RestoreOutcome};
pub use render::{LongLine, SequenceLine, ShortLine};

use crate::clock::Millis;
use crate::config::{DETAIL_TIER_RESERVE, NORMAL_TIER_RESERVE, ROLLOVER_WINDOW_MS};

/// Largest offset an entry can carry; the rollover loop keeps every entry at
/// or below one window.
#[allow(clippy::cast_possible_truncation)]
const WINDOW_STAMP: u16 = ROLLOVER_WINDOW_MS as u16;

/// Severity tier carried in the top two bits of an opcode.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Tier {
    Critical = 0,
    Normal = 1,
    Detail = 2,
}

impl Tier {
    const SHIFT: u32 = 6;
    const MASK: u8 = 0b1100_0000;

    /// Extracts the tier from a raw opcode. The unused fourth tier value is
    /// treated as DETAIL.
    #[must_use]
    pub const fn of_opcode(opcode: u8) -> Self {
        match (opcode & Self::MASK) >> Self::SHIFT {
            0 => Tier::Critical,
            1 => Tier::Normal,
            _ => Tier::Detail,
        }
    }

    /// Highest entry count at which an entry of this tier is still accepted.
    #[must_use]
    pub const fn quota(self, capacity: usize) -> usize {
        match self {
            Tier::Critical => capacity,
            Tier::Normal => capacity.saturating_sub(NORMAL_TIER_RESERVE),
            Tier::Detail => capacity.saturating_sub(DETAIL_TIER_RESERVE),
        }
    }
}

/// Every event the rig records.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum LogOp {
    LogStart = 0,
    IgIpaOpen = 1,
    IgIpaClose = 2,
    IgN2oOpen = 3,
    IgN2oClose = 4,
    SparkFirst = 5,
    SparkLast = 6,
    IgPressureGood1 = 7,
    IgPressureGood = 8,
    IgPressureChange = 9,
    MainN2oChange = 10,
    MainIpaChange = 11,
    TimeRollover = 12,
}

const SHORT_NAMES: [&str; 13] = [
    "LOG Start",
    "IG IPA Ope",
    "IG IPA Clo",
    "IG N2O Ope",
    "IG N2O Clo",
    "SPARK Star",
    "SPARK Stop",
    "IG P Good1",
    "IG P Good",
    "IG Pressur",
    "MN N2O Chg",
    "MN IPA Chg",
    "TIME Rollo",
];

const LONG_NAMES: [&str; 13] = [
    "LOG Start",
    "IG IPA Open",
    "IG IPA Close",
    "IG N2O Open",
    "IG N2O Close",
    "SPARK Start",
    "SPARK Stop",
    "IG Press First Good",
    "IG Press Good",
    "IG Pressure Value",
    "MAIN N2O Servo",
    "MAIN IPA Servo",
    "TIME Rollover",
];

impl LogOp {
    pub const ALL: [LogOp; 13] = [
        LogOp::LogStart,
        LogOp::IgIpaOpen,
        LogOp::IgIpaClose,
        LogOp::IgN2oOpen,
        LogOp::IgN2oClose,
        LogOp::SparkFirst,
        LogOp::SparkLast,
        LogOp::IgPressureGood1,
        LogOp::IgPressureGood,
        LogOp::IgPressureChange,
        LogOp::MainN2oChange,
        LogOp::MainIpaChange,
        LogOp::TimeRollover,
    ];

    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn tier(self) -> Tier {
        match self {
            LogOp::IgIpaClose | LogOp::IgN2oClose | LogOp::SparkLast | LogOp::IgPressureGood => {
                Tier::Normal
            }
            LogOp::IgPressureChange => Tier::Detail,
            _ => Tier::Critical,
        }
    }

    /// Raw opcode byte: tier in the top two bits, id below.
    #[must_use]
    pub const fn opcode(self) -> u8 {
        ((self.tier() as u8) << Tier::SHIFT) | self.id()
    }

    /// Decodes a raw opcode, rejecting unknown ids and mismatched tiers.
    #[must_use]
    pub fn from_opcode(opcode: u8) -> Option<Self> {
        let id = usize::from(opcode & !Tier::MASK);
        let op = *Self::ALL.get(id)?;
        (op.opcode() == opcode).then_some(op)
    }

    /// Name padded into a 10-column field.
    #[must_use]
    pub fn short_name(self) -> &'static str {
        SHORT_NAMES.get(usize::from(self.id())).copied().unwrap_or("?")
    }

    /// Name padded into a 20-column field.
    #[must_use]
    pub fn long_name(self) -> &'static str {
        LONG_NAMES.get(usize::from(self.id())).copied().unwrap_or("?")
    }
}

/// One 4-byte log record.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LogEntry {
    pub opcode: u8,
    pub param: u8,
    /// Milliseconds since the origin in force when the entry was written.
    pub timestamp: u16,
}

impl LogEntry {
    pub const ENCODED_LEN: usize = 4;

    #[must_use]
    pub const fn new(op: LogOp, param: u8, timestamp: u16) -> Self {
        Self {
            opcode: op.opcode(),
            param,
            timestamp,
        }
    }

    #[must_use]
    pub fn op(&self) -> Option<LogOp> {
        LogOp::from_opcode(self.opcode)
    }

    #[must_use]
    pub const fn tier(&self) -> Tier {
        Tier::of_opcode(self.opcode)
    }

    #[must_use]
    pub const fn to_bytes(self) -> [u8; Self::ENCODED_LEN] {
        let [lo, hi] = self.timestamp.to_le_bytes();
        [self.opcode, self.param, lo, hi]
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; Self::ENCODED_LEN]) -> Self {
        Self {
            opcode: bytes[0],
            param: bytes[1],
            timestamp: u16::from_le_bytes([bytes[2], bytes[3]]),
        }
    }
}

/// In-memory event log holding up to `CAP` entries.
///
/// `CAP` must be below 255 so the persisted check byte can hold `CAP + 1`.
#[derive(Clone, Debug)]
pub struct EventLog<const CAP: usize> {
    entries: [LogEntry; CAP],
    count: usize,
    origin: Millis,
    sequence: u16,
    sequence_bump_armed: bool,
    enabled: bool,
}

impl<const CAP: usize> Default for EventLog<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAP: usize> EventLog<CAP> {
    #[must_use]
    pub const fn new() -> Self {
        const { assert!(CAP >= 2 && CAP < 255, "log capacity must be in 2..255") };
        Self {
            entries: [LogEntry {
                opcode: 0,
                param: 0,
                timestamp: 0,
            }; CAP],
            count: 0,
            origin: Millis::ZERO,
            sequence: 0,
            sequence_bump_armed: false,
            enabled: false,
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        CAP
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries[..self.count]
    }

    #[must_use]
    pub fn entry(&self, index: usize) -> Option<&LogEntry> {
        self.entries().get(index)
    }

    /// Run sequence number; advanced once per run by [`Self::reset`].
    #[must_use]
    pub const fn sequence(&self) -> u16 {
        self.sequence
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Appends `op` stamped at `now`.
    ///
    /// Returns `false` when logging is disabled or `op`'s tier is at quota,
    /// including when rollover markers used up the last of it. The first entry of a run is preceded by [`LogOp::LogStart`] and
    /// sets the timestamp origin to `now`.
    pub fn record(&mut self, op: LogOp, param: u8, now: Millis) -> bool {
        if !self.enabled || self.count >= op.tier().quota(CAP) {
            return false;
        }

        if self.count == 0 {
            self.origin = now;
            self.push(LogOp::LogStart, 0, 0);
        }

        // Markers are stamped at the window edge they close.
        while now.elapsed_since(self.origin) > ROLLOVER_WINDOW_MS {
            self.origin = self.origin.wrapping_add(ROLLOVER_WINDOW_MS);
            if self.count < CAP - 1 {
                self.push(LogOp::TimeRollover, 0, WINDOW_STAMP);
            }
        }
        if self.count >= op.tier().quota(CAP) {
            return false;
        }

        let offset = u16::try_from(now.elapsed_since(self.origin)).unwrap_or(WINDOW_STAMP);
        self.push(op, param, offset);
        true
    }

    /// Empties the in-memory log. The sequence number advances on the first
    /// reset after [`Self::init`] or [`Self::commit`] and not again until the
    /// next one.
    pub fn reset(&mut self) {
        self.count = 0;
        if core::mem::take(&mut self.sequence_bump_armed) {
            self.sequence = self.sequence.wrapping_add(1);
        }
    }

    /// Number of rollover markers strictly before `index`.
    #[must_use]
    pub fn rollovers_before(&self, index: usize) -> usize {
        let end = index.min(self.count);
        self.entries[..end]
            .iter()
            .filter(|entry| entry.opcode == LogOp::TimeRollover.opcode())
            .count()
    }

    fn push(&mut self, op: LogOp, param: u8, timestamp: u16) {
        if let Some(slot) = self.entries.get_mut(self.count) {
            *slot = LogEntry::new(op, param, timestamp);
            self.count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::vec::Vec;

    use super::*;

    const CAP: usize = 100;

    fn ms(value: u32) -> Millis {
        Millis::new(value)
    }

    fn enabled_log() -> EventLog<CAP> {
        let mut log = EventLog::new();
        log.enable();
        log
    }

    #[test]
    fn opcodes_carry_tier_in_top_bits() {
        assert_eq!(LogOp::LogStart.opcode(), 0x00);
        assert_eq!(LogOp::IgIpaClose.opcode(), 0x42);
        assert_eq!(LogOp::IgPressureChange.opcode(), 0x89);
        assert_eq!(Tier::of_opcode(LogOp::SparkLast.opcode()), Tier::Normal);
        assert_eq!(Tier::of_opcode(0xC0), Tier::Detail);
    }

    #[test]
    fn opcode_decode_rejects_unknown_values() {
        for op in LogOp::ALL {
            assert_eq!(LogOp::from_opcode(op.opcode()), Some(op));
        }
        assert_eq!(LogOp::from_opcode(13), None);
        assert_eq!(LogOp::from_opcode(0xFF), None);
        // Right id, wrong tier.
        assert_eq!(LogOp::from_opcode(LogOp::IgIpaOpen.id() | 0x40), None);
    }

    #[test]
    fn names_fit_their_fields() {
        for op in LogOp::ALL {
            assert!(op.short_name().len() <= 10, "{op:?}");
            assert!(op.long_name().len() <= 20, "{op:?}");
        }
    }

    #[test]
    fn disabled_log_ignores_records() {
        let mut log = EventLog::<CAP>::new();
        assert!(!log.record(LogOp::IgIpaOpen, 0, ms(5)));
        assert!(log.is_empty());
    }

    #[test]
    fn first_record_is_preceded_by_log_start() {
        let mut log = enabled_log();
        assert!(log.record(LogOp::IgIpaOpen, 0, ms(1_000)));
        assert!(log.record(LogOp::IgIpaClose, 0, ms(1_250)));

        let ops: Vec<_> = log.entries().iter().map(LogEntry::op).collect();
        assert_eq!(
            ops,
            [
                Some(LogOp::LogStart),
                Some(LogOp::IgIpaOpen),
                Some(LogOp::IgIpaClose)
            ]
        );
        assert_eq!(log.entry(0).map(|e| e.timestamp), Some(0));
        assert_eq!(log.entry(2).map(|e| e.timestamp), Some(250));
    }

    #[test]
    fn entry_past_count_is_none() {
        let mut log = enabled_log();
        log.record(LogOp::SparkFirst, 0, ms(0));
        assert!(log.entry(1).is_some());
        assert!(log.entry(2).is_none());
    }

    #[test]
    fn rollover_inserts_marker_and_rebases() {
        let mut log = enabled_log();
        log.record(LogOp::IgIpaOpen, 0, ms(0));
        log.record(LogOp::IgIpaClose, 0, ms(10_000));
        assert_eq!(log.len(), 3);

        log.record(LogOp::SparkFirst, 0, ms(25_001));
        let tail: Vec<_> = log.entries()[3..]
            .iter()
            .map(|e| (e.op(), e.timestamp))
            .collect();
        assert_eq!(
            tail,
            [
                (Some(LogOp::TimeRollover), 10_000),
                (Some(LogOp::TimeRollover), 10_000),
                (Some(LogOp::SparkFirst), 5_001),
            ]
        );
        assert_eq!(log.rollovers_before(5), 2);
        assert_eq!(log.rollovers_before(3), 0);
    }

    #[test]
    fn reset_bumps_sequence_once_per_arm() {
        let mut log = enabled_log();
        log.sequence_bump_armed = true;
        log.record(LogOp::IgIpaOpen, 0, ms(0));
        log.reset();
        log.reset();
        assert!(log.is_empty());
        assert_eq!(log.sequence(), 1);
    }
}
