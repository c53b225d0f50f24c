mod highlighter;
mod prompt;
mod repl;
mod view;

use std::io::{self, IsTerminal, Read, Write};
use std::sync::Arc;

use reedline::ExternalPrinter;
use tokio::select;
use tokio::sync::mpsc;

use self::repl::{spawn_reader, Input};
use self::view::TranscriptView;
use crate::color::color_mode;
use crate::config::Config;
use crate::conversation::Session;
use crate::gateway::HttpGateway;
use crate::render::render;
use crate::render::terminal::{terminal_width, Painter};
use crate::ChatArgs;
use crate::{die, error, version};
use prompt::{user_prompt, INPUT_HINT};

/// Lines of output that may queue up while the line editor is busy.
const PRINTER_CAPACITY: usize = 4096;

fn flush_or_die() {
    if let Err(err) = io::stdout().flush() {
        die!("failed to flush the output stream: {}", err);
    }
}

fn show(output: &str) {
    if !output.is_empty() {
        print!("{}", output);
        flush_or_die();
    }
}

/// Hands `output` to the line editor, which prints it above the line being
/// edited. The editor ends each message with a carriage return and newline,
/// so lines are sent one at a time.
fn print_above(printer: &ExternalPrinter<String>, output: &str) {
    let sender = printer.sender();

    for line in output.trim_end_matches('\n').split('\n') {
        if let Err(err) = sender.try_send(line.to_string()) {
            tracing::warn!(%err, "dropped a line of output");
        }
    }
}

pub(crate) async fn chat_cmd(config: &Config, args: &ChatArgs) {
    let in_terminal = io::stdin().is_terminal();
    let out_terminal = io::stdout().is_terminal();

    // Without a prompt argument, chat interactively only when attached to a terminal.
    let interactive = if args.prompt.is_some() {
        args.interactive
    } else {
        in_terminal && out_terminal
    };

    if args.prompt.is_some() && !in_terminal {
        die!("it appears that an initial prompt is being provided both through standard input and the prompt argument");
    }

    // Obtain the initial prompt, either from standard input or from a positional argument.
    let initial_prompt = if let Some(prompt) = &args.prompt {
        Some(prompt.clone())
    } else if !in_terminal {
        let mut buf = String::new();

        if let Err(err) = io::stdin().read_to_string(&mut buf) {
            die!("failed to read the initial prompt from standard input: {}", err);
        }

        Some(buf)
    } else {
        None
    };

    let gateway = match HttpGateway::with_endpoints(
        &config.gateway.api_base,
        &config.gateway.ask_path,
        &config.gateway.health_path,
    ) {
        Ok(gateway) => gateway,
        Err(err) => die!("{}", err),
    };

    tracing::debug!(url = %gateway.ask_url(), interactive, "starting chat");

    let mut session = Session::new(Arc::new(gateway), config.chat.reconcile);

    let painter = Painter::new(terminal_width(), color_mode());

    if interactive {
        let view = TranscriptView::new(painter, false);

        interactive_chat(session, view, config, initial_prompt).await;
    } else {
        let prompt = initial_prompt.unwrap_or_default();

        match one_shot(&mut session, &painter, &prompt).await {
            Some((output, answered)) => {
                println!("{}", output);

                if !answered {
                    std::process::exit(crate::utils::errors::DEFAULT_EXIT_CODE);
                }
            }
            None => die!("the prompt is empty"),
        }
    }
}

/// Asks a single question and paints the answer. The second field is false
/// when the service could not answer, in which case the output is the
/// apology. Returns `None` for a blank prompt.
async fn one_shot(session: &mut Session, painter: &Painter, prompt: &str) -> Option<(String, bool)> {
    session.submit(prompt)?;

    let resolution = session.next_resolution().await?;
    let answered = resolution.outcome.is_ok();

    session.apply(resolution);

    // Only the answer is painted; the placeholder never reaches the output.
    let output = session
        .conversation()
        .last()
        .map(|last| painter.paint_message(&render(last), false))
        .unwrap_or_default();

    Some((output, answered))
}

/// Submits lines as they come in and applies answers as they arrive, until
/// the user leaves. Input is taken at any time, whatever is outstanding.
/// Everything the view paints is passed to `emit`.
async fn converse(
    session: &mut Session,
    view: &mut TranscriptView,
    inputs: &mut mpsc::UnboundedReceiver<Input>,
    mut emit: impl FnMut(&str),
) {
    loop {
        select! {
            input = inputs.recv() => match input {
                Some(Input::Line(line)) => {
                    session.submit(&line);
                }
                Some(Input::Exit) | None => break,
            },
            Some(resolution) = session.next_resolution(), if session.outstanding() > 0 => {
                session.apply(resolution);
            }
        }

        // Answers that arrived meanwhile are painted in the same pass.
        while let Some(resolution) = session.try_resolution() {
            session.apply(resolution);
        }

        let output = view.refresh(session.conversation().transcript());

        if !output.is_empty() {
            emit(&output);
        }

        tracing::trace!(scroll_target = ?view.scroll_target(), "painted");
    }
}

async fn interactive_chat(
    mut session: Session,
    mut view: TranscriptView,
    config: &Config,
    initial_prompt: Option<String>,
) {
    println!("{} version {}", version::NAME, version::VERSION);

    for line in &config.chat.banner {
        println!("{}", view.painter().paint_banner(line));
    }

    println!("{}", view.painter().paint_notice(&format!("{} (/exit to quit)", INPUT_HINT)));
    println!();

    show(&view.refresh(session.conversation().transcript()));

    if let Some(prompt) = initial_prompt {
        println!("{}{}", user_prompt(), prompt.trim());

        session.submit(&prompt);
        show(&view.refresh(session.conversation().transcript()));
    }

    let printer = ExternalPrinter::new(PRINTER_CAPACITY);
    let (input_tx, mut inputs) = mpsc::unbounded_channel();

    let reader = match spawn_reader(config.chat.keybindings, printer.clone(), input_tx) {
        Ok(reader) => reader,
        Err(err) => die!("failed to start the line editor: {}", err),
    };

    converse(&mut session, &mut view, &mut inputs, |output| {
        print_above(&printer, output)
    })
    .await;

    // Output queued after the editor's last read.
    while let Some(line) = printer.get_line() {
        println!("{}", line);
    }

    if reader.join().is_err() {
        error!("the line editor stopped unexpectedly");
    }

    if session.outstanding() > 0 {
        tracing::debug!(
            outstanding = session.outstanding(),
            "leaving with unanswered questions"
        );
    }
}
