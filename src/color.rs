use crate::cli::ColorMode;
use lazy_static::lazy_static;
use nu_ansi_term::{AnsiGenericString, Color, Style};
use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

lazy_static! {
    pub(crate) static ref USER_PROMPT: Style = Color::Blue.bold();
    pub(crate) static ref BOT_PROMPT: Style = Color::Green.bold();
    pub(crate) static ref USER_TEXT: Style = Color::Default.bold();
    pub(crate) static ref BOT_TEXT: Style = Color::Default.normal();
    pub(crate) static ref PLACEHOLDER_TEXT: Style = Color::DarkGray.italic();
    pub(crate) static ref RULE: Style = Color::DarkGray.normal();
    pub(crate) static ref SOURCES_HEADER: Style = Color::DarkGray.bold();
    pub(crate) static ref SOURCE_TEXT: Style = Color::DarkGray.normal();
    pub(crate) static ref NOTICE_TEXT: Style = Color::DarkGray.normal();
    pub(crate) static ref BANNER_TEXT: Style = Color::Blue.bold();
    pub(crate) static ref ERROR_INDICATOR: Style = Color::Red.bold();
    pub(crate) static ref WARNING_INDICATOR: Style = Color::Yellow.bold();
    pub(crate) static ref ERROR_TEXT: Style = Color::Default.bold();
    pub(crate) static ref WARNING_TEXT: Style = Color::Default.bold();
}

static USE_COLOR: AtomicBool = AtomicBool::new(true);

pub(crate) fn configure_color(cmode: ColorMode) {
    USE_COLOR.store(matches!(cmode, ColorMode::On), Ordering::Relaxed);
}

pub(crate) fn color_mode() -> ColorMode {
    match USE_COLOR.load(Ordering::Relaxed) {
        true => ColorMode::On,
        false => ColorMode::Off,
    }
}

/// Paints `input` with `style` only when `cmode` allows it.
pub(crate) fn paint_with<'a, I, S: 'a + ToOwned + ?Sized>(
    cmode: ColorMode,
    style: Style,
    input: I,
) -> AnsiGenericString<'a, S>
where
    I: Into<Cow<'a, S>>,
    <S as ToOwned>::Owned: fmt::Debug,
{
    match cmode {
        ColorMode::On => style.paint(input),
        ColorMode::Off => {
            let cow: Cow<'a, S> = input.into();

            cow.into()
        }
    }
}

pub(crate) trait MaybePaint {
    #[must_use]
    fn maybe_paint<'a, I, S: 'a + ToOwned + ?Sized>(self, input: I) -> AnsiGenericString<'a, S>
    where
        I: Into<Cow<'a, S>>,
        <S as ToOwned>::Owned: fmt::Debug;
}

impl MaybePaint for Style {
    fn maybe_paint<'a, I, S: 'a + ToOwned + ?Sized>(self, input: I) -> AnsiGenericString<'a, S>
    where
        I: Into<Cow<'a, S>>,
        <S as ToOwned>::Owned: fmt::Debug,
    {
        paint_with(color_mode(), self, input)
    }
}
