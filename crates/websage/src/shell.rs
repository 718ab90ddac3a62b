//! The interactive question-answering loop.

use std::io::{self, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::session::Session;

/// The prompt shown before every question.
pub const PROMPT: &str = "😊 Ask a question (or type \"exit\" to quit): ";

/// A source of input lines.
pub trait LineEditor {
    /// Reads one line, blocking until it is complete.
    fn read_line(&mut self, prompt: &str) -> Result<String, ReadlineError>;

    /// Remembers a line so it can be recalled later in the session.
    fn add_history(&mut self, line: &str);
}

impl LineEditor for DefaultEditor {
    #[inline]
    fn read_line(&mut self, prompt: &str) -> Result<String, ReadlineError> {
        self.readline(prompt)
    }

    fn add_history(&mut self, line: &str) {
        if let Err(err) = self.add_history_entry(line) {
            debug!("failed to add a history entry: {err}");
        }
    }
}

/// A parsed input line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// Leave the shell.
    Exit,
    /// Nothing was typed.
    Empty,
    /// Forget the conversation.
    Clear,
    /// Ask the model.
    Ask(&'a str),
}

/// Interprets one input line. Commands are matched case-sensitively after
/// trimming.
pub fn parse_command(line: &str) -> Command<'_> {
    match line.trim() {
        "exit" | "quit" => Command::Exit,
        "" => Command::Empty,
        "clear" => Command::Clear,
        question => Command::Ask(question),
    }
}

/// The interactive shell: reads questions, prints answers.
pub struct Shell<E, W> {
    editor: E,
    out: W,
    session: Session,
    spinner_style: ProgressStyle,
}

impl<E: LineEditor, W: Write> Shell<E, W> {
    /// Creates a shell reading from `editor` and printing to `out`.
    pub fn new(editor: E, out: W, session: Session) -> Self {
        let spinner_style = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        Self {
            editor,
            out,
            session,
            spinner_style,
        }
    }

    /// Runs until the input ends or the user leaves.
    ///
    /// Failed questions are reported and the loop goes on; only output
    /// errors end it early.
    pub async fn run(&mut self) -> io::Result<()> {
        self.print_welcome()?;

        let prompt = format!("{}", PROMPT.bright_green().bold());
        loop {
            let line = match self.editor.read_line(&prompt) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                    debug!("input closed");
                    break;
                }
                Err(err) => {
                    error!("error reading input: {err}");
                    break;
                }
            };

            match parse_command(&line) {
                Command::Exit => {
                    writeln!(
                        self.out,
                        "{}",
                        "\n👋 Exiting websage. Goodbye!\n".bright_yellow()
                    )?;
                    break;
                }
                Command::Empty => {
                    writeln!(
                        self.out,
                        "{}",
                        "Type a question or use: exit, quit, clear, Ctrl+C"
                            .bright_black()
                    )?;
                }
                Command::Clear => {
                    self.session.clear_history();
                    writeln!(self.out, "{}", "Chat history cleared!".green())?;
                }
                Command::Ask(question) => {
                    self.editor.add_history(question);
                    self.ask(question).await?;
                }
            }
        }

        Ok(())
    }

    /// Consumes the shell, returning its editor and session.
    #[inline]
    pub fn into_parts(self) -> (E, Session) {
        (self.editor, self.session)
    }

    async fn ask(&mut self, question: &str) -> io::Result<()> {
        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(self.spinner_style.clone());
        progress_bar.set_message("🤖 Thinking...");
        progress_bar.enable_steady_tick(Duration::from_millis(100));

        let result = self.session.send(question).await;
        // Finish the progress bar before printing anything else.
        progress_bar.finish_and_clear();

        match result {
            Ok(answer) => {
                writeln!(self.out, "{}", "\n💬 Answer:".bright_cyan())?;
                writeln!(self.out, "{answer}\n")?;
            }
            Err(err) => {
                warn!("question failed: {err}");
                writeln!(self.out, "{}", format!("Error: {err}").red())?;
            }
        }
        self.out.flush()
    }

    fn print_welcome(&mut self) -> io::Result<()> {
        let banner = [
            "",
            "╔════════════════════════════════════════════════════════════╗",
            "║            Welcome to websage - Interactive Mode           ║",
            "╚════════════════════════════════════════════════════════════╝",
        ];
        for line in banner {
            writeln!(self.out, "{}", line.bright_cyan().bold())?;
        }
        writeln!(
            self.out,
            "{}",
            "Type your questions and get AI-powered answers with sources!"
                .bright_black()
        )?;
        writeln!(
            self.out,
            "{}",
            "Chat history is maintained during this session.".bright_black()
        )?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use websage_model::ModelMessage;
    use websage_test_model::{PresetResponse, TestModelProvider};

    use super::*;
    use crate::session::SessionBuilder;

    /// Replays a fixed list of read outcomes, then reports end of input.
    #[derive(Default)]
    struct ScriptedEditor {
        lines: VecDeque<Result<String, ReadlineError>>,
        history: Vec<String>,
        prompts: usize,
    }

    impl ScriptedEditor {
        fn with_lines(lines: &[&str]) -> Self {
            Self {
                lines: lines.iter().map(|l| Ok((*l).to_owned())).collect(),
                ..Default::default()
            }
        }
    }

    impl LineEditor for ScriptedEditor {
        fn read_line(
            &mut self,
            _prompt: &str,
        ) -> Result<String, ReadlineError> {
            self.prompts += 1;
            self.lines.pop_front().unwrap_or(Err(ReadlineError::Eof))
        }

        fn add_history(&mut self, line: &str) {
            self.history.push(line.to_owned());
        }
    }

    fn session_with(provider: &TestModelProvider) -> Session {
        SessionBuilder::with_model_provider(provider.clone())
            .with_system_prompt("sys")
            .build()
    }

    async fn run_shell(
        editor: ScriptedEditor,
        provider: &TestModelProvider,
    ) -> (String, ScriptedEditor, Session) {
        let mut out = Vec::new();
        let (editor, session) = {
            let mut shell =
                Shell::new(editor, &mut out, session_with(provider));
            shell.run().await.unwrap();
            shell.into_parts()
        };
        (String::from_utf8(out).unwrap(), editor, session)
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("  exit "), Command::Exit);
        assert_eq!(parse_command("quit"), Command::Exit);
        assert_eq!(parse_command("EXIT"), Command::Ask("EXIT"));
        assert_eq!(parse_command(" \t"), Command::Empty);
        assert_eq!(parse_command("clear\n"), Command::Clear);
        assert_eq!(
            parse_command(" What is Rust? "),
            Command::Ask("What is Rust?")
        );
    }

    #[tokio::test]
    async fn test_commands_never_reach_the_model() {
        let provider = TestModelProvider::default();
        let editor =
            ScriptedEditor::with_lines(&["", "   ", "clear", "quit", "Hi"]);

        let (output, editor, session) = run_shell(editor, &provider).await;

        assert_eq!(provider.request_count(), 0);
        assert!(output.contains("Welcome to websage"));
        assert!(output.contains("Type a question or use"));
        assert!(output.contains("Chat history cleared!"));
        assert!(output.contains("Goodbye!"));
        // Nothing is read after `quit`.
        assert_eq!(editor.lines.len(), 1);
        assert!(editor.history.is_empty());
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_ask_and_clear() {
        let mut provider = TestModelProvider::default();
        provider.add_user_input_step();
        provider.add_assistant_response_step(PresetResponse::with_text(
            "Rust is a systems language [1].",
        ));

        let editor = ScriptedEditor::with_lines(&[
            "What is Rust?",
            "clear",
            "What is Rust?",
        ]);
        let (output, editor, session) = run_shell(editor, &provider).await;

        assert_eq!(output.matches("Answer:").count(), 2);
        assert!(output.contains("Rust is a systems language [1]."));
        assert_eq!(editor.history, ["What is Rust?", "What is Rust?"]);
        // Reads stop at the end of the script.
        assert_eq!(editor.prompts, 4);

        // The second question was asked on a cleared history.
        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[1].messages,
            vec![
                ModelMessage::System("sys".to_owned()),
                ModelMessage::User("What is Rust?".to_owned()),
            ]
        );
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_error_keeps_looping() {
        let mut provider = TestModelProvider::default();
        provider.add_user_input_step();
        provider.add_assistant_response_step(
            PresetResponse::with_text("unused").with_failures(0),
        );

        let editor = ScriptedEditor::with_lines(&["first", "exit"]);
        let (output, _, session) = run_shell(editor, &provider).await;

        assert!(output.contains("Error: model error:"));
        assert!(output.contains("Goodbye!"));
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn test_interrupt_stops() {
        let provider = TestModelProvider::default();
        let mut editor = ScriptedEditor::default();
        editor.lines.push_back(Err(ReadlineError::Interrupted));
        editor.lines.push_back(Ok("never read".to_owned()));

        let (output, editor, _) = run_shell(editor, &provider).await;
        assert_eq!(editor.lines.len(), 1);
        assert!(!output.contains("Goodbye!"));
        assert_eq!(provider.request_count(), 0);
    }
}
