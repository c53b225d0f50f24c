use crate::color::{self, paint_with};
use crate::cli::ColorMode;
use std::fmt;

pub const DEFAULT_EXIT_CODE: i32 = 1;

const ERROR_PREFIX: &str = "error:";
const WARNING_PREFIX: &str = "warning:";

fn fmt_diagnostic(
    f: &mut impl fmt::Write,
    cmode: ColorMode,
    indicator: nu_ansi_term::Style,
    prefix: &str,
    text_style: nu_ansi_term::Style,
    text: &str,
) -> fmt::Result {
    write!(
        f,
        "{} {}",
        paint_with(cmode, indicator, prefix),
        paint_with(cmode, text_style, text)
    )
}

pub(crate) fn fmt_error(f: &mut impl fmt::Write, cmode: ColorMode, text: &str) -> fmt::Result {
    fmt_diagnostic(
        f,
        cmode,
        *color::ERROR_INDICATOR,
        ERROR_PREFIX,
        *color::ERROR_TEXT,
        text,
    )
}

pub(crate) fn fmt_warn(f: &mut impl fmt::Write, cmode: ColorMode, text: &str) -> fmt::Result {
    fmt_diagnostic(
        f,
        cmode,
        *color::WARNING_INDICATOR,
        WARNING_PREFIX,
        *color::WARNING_TEXT,
        text,
    )
}

pub(crate) fn error_internal(text: &str) {
    let mut line = String::new();

    if fmt_error(&mut line, color::color_mode(), text).is_ok() {
        eprintln!("{}", line);
    }
}

pub(crate) fn warn_internal(text: &str) {
    let mut line = String::new();

    if fmt_warn(&mut line, color::color_mode(), text).is_ok() {
        eprintln!("{}", line);
    }
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => ({
        let formatted = format!($($arg)*);
        $crate::utils::errors::warn_internal(&formatted);
    })
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => ({
        let formatted = format!($($arg)*);
        $crate::utils::errors::error_internal(&formatted);
    })
}

#[macro_export]
macro_rules! die {
    ($($arg:tt)*) => ({
        let formatted = format!($($arg)*);
        $crate::utils::errors::error_internal(&formatted);
        ::std::process::exit($crate::utils::errors::DEFAULT_EXIT_CODE);
    })
}
