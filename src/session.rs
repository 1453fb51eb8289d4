//! Line-driven interactive session.
//!
//! Input lines are parsed into [`Command`]s; submits return immediately and their results are
//! printed when the exchange settles, so new commands can be typed while requests are in flight.
//! At end of input the session waits for outstanding requests before returning.

use crate::backend::LearningLevel;
use crate::panel::{Completion, Panel};
use crate::state::Section;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const HELP: &str = "\
Commands:
  file <path>                 select a document (.pdf or .txt)
  upload                      upload the selected document
  ask [question]              ask a question (reuses the last one when omitted)
  summarize [text]            summarize text (reuses the last text when omitted)
  learn [level] <topic>       suggest a learning path (level: beginner|intermediate|advanced)
  show                        render the whole panel
  help                        show this help
  quit                        leave immediately
";

/// A parsed session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Select a file from disk.
    SelectFile(String),
    /// Upload the selected file.
    Upload,
    /// Ask, optionally replacing the question first.
    Ask(Option<String>),
    /// Summarize, optionally replacing the text first.
    Summarize(Option<String>),
    /// Request a learning path.
    Learn {
        /// Level, defaulting to the previous one.
        level: Option<LearningLevel>,
        /// Topic to study.
        topic: String,
    },
    /// Render the whole panel.
    Show,
    /// Print the command list.
    Help,
    /// Exit without waiting for outstanding requests.
    Quit,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let argument = (!rest.is_empty()).then(|| rest.to_string());

    let command = match verb.to_lowercase().as_str() {
        "file" | "select" => {
            Command::SelectFile(argument.ok_or_else(|| "usage: file <path>".to_string())?)
        }
        "upload" => Command::Upload,
        "ask" => Command::Ask(argument),
        "summarize" | "summarise" => Command::Summarize(argument),
        "learn" => {
            let rest = argument.ok_or_else(|| "usage: learn [level] <topic>".to_string())?;
            let (first, remainder) = rest.split_once(char::is_whitespace).unwrap_or((rest.as_str(), ""));
            match first.parse::<LearningLevel>() {
                Ok(level) if !remainder.trim().is_empty() => Command::Learn {
                    level: Some(level),
                    topic: remainder.trim().to_string(),
                },
                _ => Command::Learn {
                    level: None,
                    topic: rest.clone(),
                },
            }
        }
        "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{other}' (type 'help')")),
    };
    Ok(Some(command))
}

/// Drive `panel` from `input`, writing rendered output to `output`.
///
/// Completions must be wired through [`Panel::with_completions`] using the sender paired with
/// `completions`.
pub async fn run<R, W>(
    panel: Panel,
    mut completions: mpsc::UnboundedReceiver<Completion>,
    input: R,
    mut output: W,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut outstanding: Vec<JoinHandle<bool>> = Vec::new();

    output.write_all(panel.render().await.as_bytes()).await?;
    output.write_all(b"\nType 'help' for commands.\n").await?;
    output.flush().await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Ok(None) => {}
                    Ok(Some(Command::Quit)) => {
                        output.flush().await?;
                        return Ok(());
                    }
                    Ok(Some(command)) => {
                        if let Some(handle) = execute(&panel, command, &mut output).await? {
                            outstanding.push(handle);
                        }
                    }
                    Err(message) => {
                        output.write_all(format!("{message}\n").as_bytes()).await?;
                    }
                }
                outstanding.retain(|handle| !handle.is_finished());
                output.flush().await?;
            }
            Some(completion) = completions.recv() => {
                report(&panel, completion, &mut output).await?;
            }
        }
    }

    tracing::debug!(outstanding = outstanding.len(), "Input closed; draining requests");
    for handle in outstanding {
        if let Err(error) = handle.await {
            tracing::error!(%error, "Request task failed");
        }
    }
    while let Ok(completion) = completions.try_recv() {
        report(&panel, completion, &mut output).await?;
    }
    output.flush().await
}

async fn execute<W>(
    panel: &Panel,
    command: Command,
    output: &mut W,
) -> io::Result<Option<JoinHandle<bool>>>
where
    W: AsyncWrite + Unpin,
{
    let (section, handle) = match command {
        Command::SelectFile(path) => {
            let message = match panel.select_file(&path).await {
                Ok(()) => format!("Selected {path}\n"),
                Err(error) => format!("{error}\n"),
            };
            output.write_all(message.as_bytes()).await?;
            return Ok(None);
        }
        Command::Upload => (Section::Upload, panel.upload().await),
        Command::Ask(question) => {
            if let Some(question) = question {
                panel.set_question(question).await;
            }
            (Section::Qa, panel.ask().await)
        }
        Command::Summarize(text) => {
            if let Some(text) = text {
                panel.set_summary_text(text).await;
            }
            (Section::Summary, panel.summarize().await)
        }
        Command::Learn { level, topic } => {
            let level = match level {
                Some(level) => level,
                None => panel.snapshot().await.learning_level(),
            };
            panel.set_learning_path(topic, level).await;
            (Section::LearningPath, panel.learning_path().await)
        }
        Command::Show => {
            output.write_all(panel.render().await.as_bytes()).await?;
            return Ok(None);
        }
        Command::Help => {
            output.write_all(HELP.as_bytes()).await?;
            return Ok(None);
        }
        Command::Quit => return Ok(None),
    };
    // Placeholder, local validation message, or nothing for a no-op.
    output
        .write_all(panel.render_result(section).await.as_bytes())
        .await?;
    Ok(handle)
}

async fn report<W>(panel: &Panel, completion: Completion, output: &mut W) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let Some(text) = panel.render_completion(completion).await else {
        return Ok(());
    };
    output
        .write_all(format!("[{}] {text}", completion.section).as_bytes())
        .await?;
    output.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{
        BackendApi, BackendError, DocumentFile, HealthStatus, LearningPathRequest, QaAnswer,
        QaRequest, SummarizeRequest, UploadReceipt,
    };
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Answers "fast" immediately and never answers anything else.
    struct SelectiveBackend;

    #[async_trait]
    impl BackendApi for SelectiveBackend {
        async fn upload_document(
            &self,
            _document: DocumentFile,
        ) -> Result<UploadReceipt, BackendError> {
            std::future::pending().await
        }

        async fn ask(&self, request: QaRequest) -> Result<QaAnswer, BackendError> {
            if request.question == "fast" {
                Ok(QaAnswer {
                    answer: "fast answer".into(),
                    sources: vec![],
                })
            } else {
                std::future::pending().await
            }
        }

        async fn summarize(&self, _request: SummarizeRequest) -> Result<String, BackendError> {
            std::future::pending().await
        }

        async fn learning_path(
            &self,
            _request: LearningPathRequest,
        ) -> Result<Vec<String>, BackendError> {
            std::future::pending().await
        }

        async fn health(&self) -> Result<HealthStatus, BackendError> {
            std::future::pending().await
        }
    }

    async fn settled_fast_answer() -> (Panel, Completion) {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let panel = Panel::new(Arc::new(SelectiveBackend), 4).with_completions(sender);
        panel.set_question("fast").await;
        panel.ask().await.expect("ask").await.expect("join");
        let completion = receiver.recv().await.expect("completion");
        (panel, completion)
    }

    #[tokio::test]
    async fn report_prints_settled_answer() {
        let (panel, completion) = settled_fast_answer().await;
        let mut output = Vec::new();

        report(&panel, completion, &mut output).await.expect("report");

        assert_eq!(
            String::from_utf8(output).expect("utf8"),
            "[qa] Answer: fast answer\n"
        );
    }

    #[tokio::test]
    async fn report_skips_completion_superseded_by_newer_request() {
        let (panel, completion) = settled_fast_answer().await;
        panel.set_question("slow").await;
        let _pending = panel.ask().await.expect("second ask");
        let mut output = Vec::new();

        report(&panel, completion, &mut output).await.expect("report");

        assert!(output.is_empty(), "{}", String::from_utf8_lossy(&output));
    }

    #[test]
    fn parses_basic_commands() {
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(parse_command("upload"), Ok(Some(Command::Upload)));
        assert_eq!(parse_command("SHOW"), Ok(Some(Command::Show)));
        assert_eq!(parse_command("exit"), Ok(Some(Command::Quit)));
        assert_eq!(
            parse_command("file  ./docs/paper.pdf "),
            Ok(Some(Command::SelectFile("./docs/paper.pdf".into())))
        );
        assert!(parse_command("file").is_err());
        assert!(parse_command("frobnicate").is_err());
    }

    #[test]
    fn ask_and_summarize_keep_full_text() {
        assert_eq!(parse_command("ask"), Ok(Some(Command::Ask(None))));
        assert_eq!(
            parse_command("ask what is   the conclusion?"),
            Ok(Some(Command::Ask(Some("what is   the conclusion?".into()))))
        );
        assert_eq!(
            parse_command("summarize Some long text."),
            Ok(Some(Command::Summarize(Some("Some long text.".into()))))
        );
    }

    #[test]
    fn learn_accepts_optional_level() {
        assert_eq!(
            parse_command("learn advanced distributed systems"),
            Ok(Some(Command::Learn {
                level: Some(LearningLevel::Advanced),
                topic: "distributed systems".into(),
            }))
        );
        assert_eq!(
            parse_command("learn rust"),
            Ok(Some(Command::Learn {
                level: None,
                topic: "rust".into(),
            }))
        );
        // A lone level word is treated as the topic.
        assert_eq!(
            parse_command("learn beginner"),
            Ok(Some(Command::Learn {
                level: None,
                topic: "beginner".into(),
            }))
        );
        assert!(parse_command("learn").is_err());
    }
}
