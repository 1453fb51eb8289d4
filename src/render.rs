//! Pure text rendering of [`ViewState`].
//!
//! Renderers only read state; the same state always produces the same text.

use crate::state::{LearningPathView, Section, UploadStatus, ViewState};
use std::fmt::Write as _;

const TITLE: &str = "AI Microservices Demo";

/// Render the whole panel.
pub fn render(state: &ViewState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{TITLE}");
    let _ = writeln!(out, "{}", "=".repeat(TITLE.len()));
    for section in [
        Section::Upload,
        Section::Qa,
        Section::Summary,
        Section::LearningPath,
    ] {
        out.push('\n');
        out.push_str(&render_section(state, section));
    }
    out
}

/// Render a single section card.
pub fn render_section(state: &ViewState, section: Section) -> String {
    let mut out = String::new();
    match section {
        Section::Upload => render_upload(state, &mut out),
        Section::Qa => render_qa(state, &mut out),
        Section::Summary => render_summary(state, &mut out),
        Section::LearningPath => render_learning_path(state, &mut out),
    }
    out
}

/// Render only the result block of a section, without its heading or inputs.
///
/// Returns an empty string when the section has nothing to show.
pub fn render_result(state: &ViewState, section: Section) -> String {
    let mut out = String::new();
    match section {
        Section::Upload => {
            if *state.upload_status() != UploadStatus::Idle {
                let _ = writeln!(out, "{}", state.upload_status());
            }
        }
        Section::Qa => {
            if let Some(answer) = state.qa_answer() {
                let _ = writeln!(out, "Answer: {}", answer.answer);
                if !answer.sources.is_empty() {
                    let sources = serde_json::to_string_pretty(&answer.sources)
                        .unwrap_or_else(|_| "[]".into());
                    let _ = writeln!(out, "Sources:\n{sources}");
                }
            }
        }
        Section::Summary => {
            if !state.summary().is_empty() {
                let _ = writeln!(out, "Summary: {}", state.summary());
            }
        }
        Section::LearningPath => match state.learning_path() {
            LearningPathView::Empty => {}
            LearningPathView::Generating => {
                let _ = writeln!(out, "{}", crate::state::GENERATING_PATH);
            }
            LearningPathView::Failed => {
                let _ = writeln!(out, "{}", crate::state::LEARNING_PATH_ERROR);
            }
            LearningPathView::Steps(steps) if steps.is_empty() => {
                let _ = writeln!(out, "No steps suggested.");
            }
            LearningPathView::Steps(steps) => {
                for (index, step) in steps.iter().enumerate() {
                    let _ = writeln!(out, "{}. {step}", index + 1);
                }
            }
        },
    }
    out
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "-".repeat(title.chars().count()));
}

fn render_upload(state: &ViewState, out: &mut String) {
    heading(out, "1. Upload a Document for RAG");
    match state.selected_file() {
        Some(file) => {
            let _ = writeln!(out, "File: {} ({} bytes)", file.file_name, file.bytes.len());
        }
        None => {
            let _ = writeln!(out, "File: (none selected)");
        }
    }
    out.push_str(&render_result(state, Section::Upload));
}

fn render_qa(state: &ViewState, out: &mut String) {
    heading(out, "2. Ask a Question (RAG)");
    let _ = writeln!(out, "Ask a question about the document you just uploaded.");
    let _ = writeln!(out, "Question: {}", state.question());
    out.push_str(&render_result(state, Section::Qa));
}

fn render_summary(state: &ViewState, out: &mut String) {
    heading(out, "3. Summarize Text");
    let text = state.summary_text();
    if text.is_empty() {
        let _ = writeln!(out, "Text: (empty)");
    } else {
        let _ = writeln!(out, "Text: {} chars", text.chars().count());
    }
    out.push_str(&render_result(state, Section::Summary));
}

fn render_learning_path(state: &ViewState, out: &mut String) {
    heading(out, "4. Suggest a Learning Path");
    let _ = writeln!(
        out,
        "Topic: {} ({})",
        state.learning_topic(),
        state.learning_level()
    );
    out.push_str(&render_result(state, Section::LearningPath));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DocumentFile, QaAnswer, UploadReceipt};
    use serde_json::json;

    #[test]
    fn empty_view_has_no_result_blocks() {
        let state = ViewState::new();
        let output = render(&state);
        assert!(output.starts_with("AI Microservices Demo\n"));
        assert!(output.contains("File: (none selected)"));
        assert!(!output.contains("Answer:"));
        assert!(!output.contains("Summary:"));
        for section in [
            Section::Upload,
            Section::Qa,
            Section::Summary,
            Section::LearningPath,
        ] {
            assert_eq!(render_result(&state, section), "");
        }
    }

    #[test]
    fn render_is_deterministic() {
        let mut state = ViewState::new();
        state.set_question("why?");
        state.set_summary_text("text");
        assert_eq!(render(&state), render(&state));
    }

    #[test]
    fn sources_render_only_when_present() {
        let mut state = ViewState::new();
        state.set_question("q");
        let ticket = state.begin_ask(4).expect("ticket");
        assert_eq!(render_result(&state, Section::Qa), "Answer: Thinking...\n");

        state.finish_ask(
            ticket.id,
            Ok(QaAnswer {
                answer: "X".into(),
                sources: vec![json!({ "file": "a.txt", "chunk_id": 1 })],
            }),
        );
        let output = render_result(&state, Section::Qa);
        assert!(output.starts_with("Answer: X\nSources:\n[\n"));
        assert!(output.contains("\"file\": \"a.txt\""));
    }

    #[test]
    fn upload_status_and_selection_render() {
        let mut state = ViewState::new();
        state.select_file(DocumentFile {
            file_name: "paper.pdf".into(),
            bytes: vec![0; 42],
        });
        let ticket = state.begin_upload().expect("ticket");
        state.finish_upload(
            ticket.id,
            Ok(UploadReceipt {
                file: None,
                chunks_indexed: 12,
            }),
        );
        let output = render_section(&state, Section::Upload);
        assert!(output.contains("File: paper.pdf (42 bytes)"));
        assert!(output.contains("File uploaded successfully! Chunks indexed: 12"));
    }

    #[test]
    fn learning_path_steps_are_numbered() {
        let mut state = ViewState::new();
        state.set_learning_topic("rust");
        let ticket = state.begin_learning_path().expect("ticket");
        state.finish_learning_path(ticket.id, Ok(vec!["Basics".into(), "Traits".into()]));
        assert_eq!(
            render_result(&state, Section::LearningPath),
            "1. Basics\n2. Traits\n"
        );
        assert!(render_section(&state, Section::LearningPath).contains("Topic: rust (beginner)"));
    }
}
