//! Question answering over a local file, without the web server.

use policyqa_conversation::{ConversationContext, ConversationManager};
use policyqa_core::{DocumentMetadata, TextExtractor};
use policyqa_extract::DocumentExtractor;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

use super::{build_conversation, build_provider, load_config, new_context};

/// Input parameters for the Ask command strategy.
#[derive(Debug, Clone)]
pub struct AskInput {
    pub config_path: Option<PathBuf>,
    /// Document to load
    pub file: PathBuf,
    /// Optional single question (non-interactive mode)
    pub question: Option<String>,
    /// Optional model override
    pub model: Option<String>,
}

/// Strategy for asking questions about a document from the terminal.
#[derive(Debug, Clone, Copy)]
pub struct AskStrategy;

impl super::CommandStrategy for AskStrategy {
    type Input = AskInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = load_config(input.config_path.as_deref())?;
        config.validate()?;

        let filename = input
            .file
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", input.file.display()))?
            .to_string();
        let bytes = tokio::fs::read(&input.file)
            .await
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", input.file.display()))?;

        let extracted = DocumentExtractor::new().extract(&bytes, &filename)?;
        let metadata = DocumentMetadata::derive(
            &filename,
            u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            extracted.file_type,
            &extracted.text,
        );
        println!(
            "Loaded {} ({}, {} characters, {} words)",
            metadata.filename, metadata.file_type, metadata.char_count, metadata.word_count
        );

        let mut context = new_context(&config);
        context.seed(extracted.text, metadata)?;

        let provider = build_provider(&config.llm);
        let manager = build_conversation(&config, provider, input.model);

        if let Some(question) = input.question {
            let turn = manager.ask(&mut context, &question).await?;
            println!("{}", turn.answer());
        } else {
            run_interactive(&manager, &mut context).await?;
        }

        Ok(())
    }
}

async fn run_interactive(
    manager: &ConversationManager,
    context: &mut ConversationContext,
) -> anyhow::Result<()> {
    println!("Ask questions about the document.");
    println!("Type 'history', 'clear', or 'exit' to end the session.\n");

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if std::io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        match line {
            "" => continue,
            "exit" | "quit" | "q" => break,
            "history" => {
                if context.history().is_empty() {
                    println!("No previous questions.\n");
                }
                for (i, entry) in context.history().iter().enumerate() {
                    println!("Q{}: {}\nA{}: {}\n", i + 1, entry.question, i + 1, entry.answer);
                }
                continue;
            }
            "clear" => {
                context.clear_chat();
                println!("Chat history cleared.\n");
                continue;
            }
            _ => {}
        }

        match manager.ask(context, line).await {
            Ok(turn) => {
                println!("\n{}\n", turn.answer());
                if let Some(usage) = turn.usage {
                    debug!(
                        "Tokens: {} prompt + {} completion = {} total",
                        usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
                    );
                }
            }
            Err(e) => eprintln!("Error: {e}"),
        }
    }

    info!("Session ended after {} question(s)", context.history().len());
    Ok(())
}
