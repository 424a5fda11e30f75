use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};

use crate::pipeline::PipelineOutput;
use crate::utils::sanitize_filename;

/// Write the original and translated text as plain-text files into `dir`
pub fn save_to_dir(output: &PipelineOutput, dir: &Path) -> Result<Vec<PathBuf>> {
    fs_err::create_dir_all(dir).context("Failed to create output directory")?;

    let files: Vec<(PathBuf, &str)> = match output {
        PipelineOutput::Translated {
            original,
            translated,
            language,
            ..
        } => vec![
            (dir.join("original.txt"), original.as_str()),
            (
                dir.join(format!("translated_{}.txt", sanitize_filename(language))),
                translated.as_str(),
            ),
        ],
        PipelineOutput::Original { text } => vec![(dir.join("original.txt"), text.as_str())],
        PipelineOutput::CaptionLink(link) => vec![(dir.join("captions_url.txt"), link.as_str())],
    };

    for (path, content) in &files {
        fs_err::write(path, content)?;
    }

    Ok(files.into_iter().map(|(path, _)| path).collect())
}

/// Print a pipeline result to the console
pub fn print_to_console(output: &PipelineOutput) {
    match output {
        PipelineOutput::Translated {
            original,
            translated,
            language,
            failed_chunks,
        } => {
            println!("{}", style("Original Transcript / Captions:").bold());
            println!("{}\n", original);
            println!("{}", style(format!("Translated Text ({}):", language)).bold());
            println!("{}", translated);
            if *failed_chunks > 0 {
                eprintln!(
                    "{}",
                    style(format!("{} chunk(s) could not be translated", failed_chunks)).yellow()
                );
            }
        }
        PipelineOutput::Original { text } => {
            println!("{}", style("Original Transcript:").bold());
            println!("{}", text);
        }
        PipelineOutput::CaptionLink(link) => {
            println!("{} {}", style("Captions available at:").cyan(), link);
        }
    }
}
