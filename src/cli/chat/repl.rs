use std::io;
use std::thread::{self, JoinHandle};

use reedline::{
    default_emacs_keybindings, default_vi_insert_keybindings, default_vi_normal_keybindings,
    EditCommand, EditMode, Emacs, ExternalPrinter, KeyCode, KeyModifiers, Reedline,
    ReedlineEvent, Signal, Vi,
};
use tokio::sync::mpsc;

use crate::{config, error};

use super::highlighter::Highlighter;
use super::prompt::Prompt;

const EXIT_COMMAND: &str = "/exit";

fn edit_mode(keybindings: config::Keybindings) -> Box<dyn EditMode> {
    match keybindings {
        config::Keybindings::Vi => Box::new(Vi::new(
            default_vi_insert_keybindings(),
            default_vi_normal_keybindings(),
        )),
        config::Keybindings::Emacs => {
            let mut keybindings = default_emacs_keybindings();

            keybindings.add_binding(
                KeyModifiers::CONTROL,
                KeyCode::Char('j'),
                ReedlineEvent::Edit(vec![EditCommand::InsertNewline]),
            );

            Box::new(Emacs::new(keybindings))
        }
    }
}

/// What the user asked for at the prompt.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Input {
    /// A line to submit. It may be blank; the conversation ignores those.
    Line(String),
    Exit,
}

/// Interprets an accepted line.
pub(crate) fn classify(line: String) -> Input {
    if line.trim() == EXIT_COMMAND {
        Input::Exit
    } else {
        Input::Line(line)
    }
}

pub(crate) struct Repl {
    line_editor: Reedline,
    prompt: Prompt,
}

impl Repl {
    /// Lines sent through `printer` are shown above the line being edited.
    pub(crate) fn new(keybindings: config::Keybindings, printer: ExternalPrinter<String>) -> Repl {
        let line_editor = Reedline::create()
            .with_edit_mode(edit_mode(keybindings))
            .with_highlighter(Box::new(Highlighter::default()))
            .with_external_printer(printer);

        Repl {
            line_editor,
            prompt: Prompt::default(),
        }
    }

    /// Reads one line. Enter accepts the line; Ctrl-C discards it and
    /// prompts again; Ctrl-D exits.
    pub(crate) fn read(&mut self) -> Input {
        loop {
            match self.line_editor.read_line(&self.prompt) {
                Ok(Signal::Success(line)) => return classify(line),
                Ok(Signal::CtrlC) => continue,
                Ok(Signal::CtrlD) => return Input::Exit,
                Err(err) => {
                    error!("failed to read input: {}", err);
                    return Input::Exit;
                }
            }
        }
    }
}

/// Runs the line editor on its own thread so that reading a line never holds
/// up answers. Every line read is sent to `inputs`; the thread ends after
/// sending [`Input::Exit`] or once nobody is listening.
pub(crate) fn spawn_reader(
    keybindings: config::Keybindings,
    printer: ExternalPrinter<String>,
    inputs: mpsc::UnboundedSender<Input>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("line-editor".to_string())
        .spawn(move || {
            let mut repl = Repl::new(keybindings, printer);

            loop {
                let input = repl.read();
                let exit = input == Input::Exit;

                if inputs.send(input).is_err() || exit {
                    break;
                }
            }
        })
}
