use std::io::{self, IsTerminal};

use crate::RequestedColorMode;

pub(crate) mod chat;
pub(crate) mod health;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub(crate) enum ColorMode {
    On,
    Off,
}

impl ColorMode {
    /// Settles `--color`. An explicit `on` or `off` wins; `auto` turns colour
    /// off under `NO_COLOR` or when standard output is not a terminal.
    pub(crate) fn resolve_auto(cm: RequestedColorMode) -> ColorMode {
        match cm {
            RequestedColorMode::Auto => {
                let no_color = std::env::var_os("NO_COLOR").is_some();

                match no_color || !io::stdout().is_terminal() {
                    true => ColorMode::Off,
                    false => ColorMode::On,
                }
            }
            RequestedColorMode::On => ColorMode::On,
            RequestedColorMode::Off => ColorMode::Off,
        }
    }
}
