//! Interactive terminal loop.
//!
//! Plain lines are questions; lines starting with `/` are commands. While
//! voice input is listening, the next line stands in for what was heard.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use agripulse_chat::{ChatController, ChatError, DispatchOutcome, SplashGate, CATEGORIES};
use agripulse_core::{Notice, NoticeSink, Role};
use agripulse_voice::{RecognitionEvent, SpeechAdapter, TypedRecognizer};

pub type InputLines = Lines<BufReader<Stdin>>;

const HELP: &str = "\
Commands:
  <text>            ask a question (opens the chat if needed)
  /modes            list categories
  /mode <LABEL>     start a conversation about a category
  /suggest [N]      list suggestions, or ask suggestion N
  /stage <text>     put text in the input field without sending
  /send             send the input field
  /translate [text] translate the input field (or text) between English and Hindi
  /voice            start or stop voice input
  /history          show the conversation
  /close            close the chat
  /help             show this help
  /quit             exit";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Modes,
    Mode(String),
    Suggest(Option<usize>),
    Stage(String),
    Send,
    Translate(Option<String>),
    Voice,
    History,
    Close,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Ask(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        let arg = (!arg.is_empty()).then(|| arg.to_string());

        match (name.to_lowercase().as_str(), arg) {
            ("modes", _) => Command::Modes,
            ("mode", Some(label)) => Command::Mode(label.to_uppercase()),
            ("suggest", None) => Command::Suggest(None),
            ("suggest", Some(n)) => match n.parse::<usize>() {
                Ok(n) => Command::Suggest(Some(n)),
                Err(_) => Command::Unknown(line.to_string()),
            },
            ("stage", Some(text)) => Command::Stage(text),
            ("send", _) => Command::Send,
            ("translate", text) => Command::Translate(text),
            ("voice", _) => Command::Voice,
            ("history", _) => Command::History,
            ("close", _) => Command::Close,
            ("help", _) => Command::Help,
            ("quit", _) | ("exit", _) => Command::Quit,
            _ => Command::Unknown(line.to_string()),
        }
    }
}

/// Prints notices to the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNoticeSink;

impl NoticeSink for ConsoleNoticeSink {
    fn show(&self, notice: Notice) {
        tracing::debug!(notice = ?notice, "Notice shown");
        println!("! {}", notice.message());
    }
}

/// Show the splash once per session, until timeout or Enter.
pub async fn splash(gate: &SplashGate, duration: Duration, input: &mut InputLines) {
    if !gate.should_show() {
        return;
    }
    println!();
    println!("  🌾  AgriPulse");
    println!("  Smart farming answers, in Hindi and English.");
    println!("  (press Enter to continue)");
    println!();

    tokio::select! {
        _ = tokio::time::sleep(duration) => {}
        line = input.next_line() => {
            if let Err(e) = line {
                tracing::warn!(error = %e, "Failed to read from stdin during splash");
            }
        }
    }
    gate.dismiss();
}

pub struct Repl {
    controller: ChatController,
    speech: Arc<SpeechAdapter>,
}

impl Repl {
    pub fn new(controller: ChatController, speech: Arc<SpeechAdapter>) -> Self {
        Self { controller, speech }
    }

    pub async fn run(&self, input: &mut InputLines) -> std::io::Result<()> {
        println!("Type a question, or /help for commands.");
        print_categories();

        while let Some(line) = input.next_line().await? {
            if self.speech.is_listening() && Command::parse(&line) != Command::Voice {
                self.hear(&line);
                continue;
            }
            match Command::parse(&line) {
                Command::Quit => break,
                command => self.execute(command).await,
            }
        }

        tracing::info!("Input closed, exiting");
        Ok(())
    }

    fn hear(&self, line: &str) {
        let event = TypedRecognizer::event_for_line(line);
        let heard = matches!(event, RecognitionEvent::Transcript(_));
        match self.speech.handle_event(event) {
            Ok(true) if heard => {
                println!("Heard: {}  (/send to ask it)", self.controller.query());
            }
            Ok(_) => println!("Didn't catch that."),
            Err(e) => tracing::error!(error = %e, "Failed to apply recognition event"),
        }
    }

    async fn execute(&self, command: Command) {
        match command {
            Command::Ask(text) => {
                self.controller.set_query(text);
                let outcome = self.with_spinner(self.controller.search()).await;
                self.report(outcome);
            }
            Command::Modes => print_categories(),
            Command::Mode(label) => {
                self.controller.select_mode(&label);
                self.print_last_turn();
                self.print_suggestions();
            }
            Command::Suggest(None) => self.print_suggestions(),
            Command::Suggest(Some(n)) => {
                let suggestions = self.controller.suggestions();
                match n.checked_sub(1).and_then(|i| suggestions.get(i)) {
                    Some(s) => {
                        println!("> {}", s);
                        let outcome = self.with_spinner(self.controller.select_suggestion(s)).await;
                        self.report(outcome);
                    }
                    None => println!("No suggestion {}.", n),
                }
            }
            Command::Stage(text) => {
                self.controller.set_query(text);
                println!("Staged: {}", self.controller.query());
            }
            Command::Send => {
                let outcome = self.with_spinner(self.controller.search()).await;
                self.report(outcome);
            }
            Command::Translate(text) => {
                if let Some(text) = text {
                    self.controller.set_query(text);
                }
                match self.controller.translate_pending().await {
                    Ok(translated) => println!("Staged: {}  (/send to ask it)", translated),
                    Err(ChatError::Busy) => println!("Translation already in progress."),
                    Err(e) => tracing::debug!(error = %e, "Translation not applied"),
                }
            }
            Command::Voice => match self.speech.toggle_listening() {
                Ok(state) if self.speech.is_listening() => {
                    tracing::debug!(state = %state, "Voice toggled");
                    println!("🎤 Listening… say (type) your question, or /voice to stop.");
                }
                Ok(_) => println!("Stopped listening."),
                Err(e) => tracing::debug!(error = %e, "Voice input not started"),
            },
            Command::History => {
                let turns = self.controller.transcript();
                if turns.is_empty() {
                    println!("(no messages)");
                }
                for turn in turns {
                    print_turn(turn.role, &turn.text);
                }
            }
            Command::Close => {
                self.controller.close_chat();
                println!("Chat closed.");
                print_categories();
            }
            Command::Help => println!("{}", HELP),
            Command::Empty => {}
            Command::Unknown(line) => println!("Unknown command: {}  (/help)", line),
            Command::Quit => {}
        }
    }

    async fn with_spinner<F: std::future::Future<Output = DispatchOutcome>>(
        &self,
        fut: F,
    ) -> DispatchOutcome {
        if !self.controller.query().trim().is_empty() {
            println!("AgriPulse is thinking…");
        }
        fut.await
    }

    fn report(&self, outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::Answered(turn) | DispatchOutcome::Apologized(turn) => {
                print_turn(turn.role, &turn.text);
            }
            DispatchOutcome::Busy => println!("Still waiting for the last answer."),
            DispatchOutcome::Empty => {}
        }
    }

    fn print_last_turn(&self) {
        if let Some(turn) = self.controller.transcript().last() {
            print_turn(turn.role, &turn.text);
        }
    }

    fn print_suggestions(&self) {
        let suggestions = self.controller.suggestions();
        if suggestions.is_empty() {
            return;
        }
        println!("Suggestions:");
        for (i, s) in suggestions.iter().enumerate() {
            println!("  {}. {}", i + 1, s);
        }
    }
}

fn print_categories() {
    println!("Categories: {}", CATEGORIES.join(" | "));
}

fn print_turn(role: Role, text: &str) {
    let who = match role {
        Role::User => "You",
        Role::Assistant => "AgriPulse",
    };
    println!("{}: {}", who, text);
    println!();
}
