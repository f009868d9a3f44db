//! Run summary reporting.

use console::style;

use crate::run::RunResult;

/// How many ranked messages the summary prints.
const TOP_MESSAGES_SHOWN: usize = 10;

/// Preview width in the summary table.
const PREVIEW_WIDTH: usize = 60;

/// Print the final summary for a completed run.
pub fn print_run_summary(result: &RunResult) {
    println!();
    println!(
        "{}",
        style(format!("Results for {}:", result.chat.display_name())).bold()
    );
    println!("  Scanned:  {} messages", result.scanned);
    println!("  Ranked:   {} messages", result.messages.len());

    if let Some(media) = &result.media {
        println!(
            "  Media:    {} processed, {} downloaded, {} skipped or failed ({} oversized)",
            media.total, media.successes, media.failures, media.oversized
        );
    }
    if let Some(folder) = &result.download_folder {
        println!("  Folder:   {}", folder);
    }

    if result.messages.is_empty() {
        return;
    }

    println!();
    println!("{}", style("Top messages:").bold());
    for (rank, message) in result.messages.iter().take(TOP_MESSAGES_SHOWN).enumerate() {
        let preview: String = message.preview.chars().take(PREVIEW_WIDTH).collect();
        let media_note = if message.media_paths.is_empty() {
            String::new()
        } else {
            format!(" [{} file(s)]", message.media_paths.len())
        };
        println!(
            "  {:>2}. {} {} {}{}",
            rank + 1,
            style(format!("{:>5}", message.reaction_count)).green(),
            style(&message.link).dim(),
            preview,
            style(media_note).cyan()
        );
    }

    let hidden = result.messages.len().saturating_sub(TOP_MESSAGES_SHOWN);
    if hidden > 0 {
        println!("  ... and {} more", hidden);
    }
}
