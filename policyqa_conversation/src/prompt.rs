//! Prompt assembly.
//!
//! Section order is fixed: preamble, file information, document text,
//! previous conversation, current question. The document text is always
//! included in full.

use policyqa_core::{ChatEntry, DocumentContext};

/// Instruction preamble naming the assistant's role and the answer format.
pub const DEFAULT_PREAMBLE: &str = "You are a helpful assistant for HR policy documents. \
Answer the user's question using only the information in the document below. \
Format your answer in Markdown: start with a short heading, use bullet points for lists \
of conditions or steps, and put key figures such as numbers of days or amounts in **bold**. \
If the document does not contain the answer, say so clearly.";

const NO_PREVIOUS_QUESTIONS: &str = "No previous questions.";

/// Render the prompt for `question` against `document` and the given history window.
///
/// `history` is expected oldest first; entries are numbered from 1 in that order.
#[must_use]
pub fn render_prompt(
    preamble: &str,
    document: &DocumentContext,
    history: &[ChatEntry],
    question: &str,
) -> String {
    let meta = document.metadata();
    let mut prompt = String::with_capacity(document.text().len() + preamble.len() + 512);

    prompt.push_str(preamble);
    prompt.push_str("\n\n## File Information\n");
    prompt.push_str(&format!(
        "- Filename: {}\n- Type: {}\n- Characters: {}\n- Words: {}\n",
        meta.filename,
        meta.file_type.label(),
        meta.char_count,
        meta.word_count
    ));

    prompt.push_str("\n## Document Text\n");
    prompt.push_str(document.text());
    prompt.push('\n');

    prompt.push_str("\n## Previous Conversation\n");
    if history.is_empty() {
        prompt.push_str(NO_PREVIOUS_QUESTIONS);
        prompt.push('\n');
    } else {
        let pairs: Vec<String> = history
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let n = i + 1;
                format!("Q{n}: {}\nA{n}: {}\n", entry.question, entry.answer)
            })
            .collect();
        prompt.push_str(&pairs.join("\n"));
    }

    prompt.push_str("\n## Current Question\n");
    prompt.push_str(question);
    prompt.push('\n');

    prompt
}
