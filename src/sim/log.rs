use std::fmt;

use crate::timeq::Cycle;

#[derive(PartialEq, PartialOrd, Debug, Default, Clone, Copy)]
pub enum LogLevel {
    #[default]
    NONE,
    INFO,
    DEBUG,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::NONE => "NONE",
            LogLevel::INFO => "INFO",
            LogLevel::DEBUG => "DEBUG",
        };
        f.write_str(name)
    }
}

pub fn to_loglevel(ulevel: u64) -> LogLevel {
    match ulevel {
        0 => LogLevel::NONE,
        1 => LogLevel::INFO,
        2 => LogLevel::DEBUG,
        _ => LogLevel::NONE,
    }
}

/// Cycle-stamped trace output for the simulated components, separate from the `log` facade
/// so traces can be enabled per run from the config file.
#[derive(Debug)]
pub struct Logger {
    level: LogLevel,
}

impl Logger {
    pub fn new(ulevel: u64) -> Self {
        let level = to_loglevel(ulevel);
        Logger { level }
    }

    pub fn silent() -> Self {
        Logger { level: LogLevel::NONE }
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::NONE && level <= self.level
    }

    pub fn log(&self, level: LogLevel, cycle: Cycle, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        println!("[{}] @{:>8} {}", level, cycle, args);
    }
}

#[macro_export]
macro_rules! log {
    // usage: log!(logger, level, cycle, "a {} event", "clock")
    ($logger:expr, $level:expr, $cycle:expr, $($arg:tt)+) => {{
        $logger.log($level, $cycle, format_args!($($arg)+));
    }};
}
#[macro_export]
macro_rules! info {
    ($logger:expr, $cycle:expr, $($arg:tt)+) => ( $crate::log!($logger, $crate::sim::log::LogLevel::INFO, $cycle, $($arg)+); )
}
#[macro_export]
macro_rules! debug {
    ($logger:expr, $cycle:expr, $($arg:tt)+) => ( $crate::log!($logger, $crate::sim::log::LogLevel::DEBUG, $cycle, $($arg)+); )
}
