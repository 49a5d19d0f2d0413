use std::fs;
use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use think_segmenter::config::{ConfigError, SegmenterConfigBuilder, DEFAULT_MAX_BUFFER_SIZE};
use think_segmenter::logging::{init_logging, LoggingConfig};
use think_segmenter::reasoning_parser::TracingObserver;
use think_segmenter::{StreamSegmenter, StructuredSegment, ThinkSegmenter};
use tracing::{info, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One `[kind] content` line per segment
    Text,
    /// One JSON object per line
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "think-segmenter")]
#[command(about = "Replay a reasoning-model completion through the <think> segmenter")]
#[command(long_about = r#"
Replay a reasoning-model completion through the <think> segmenter

The input is cut into fragments the way a streaming transport would deliver
it, fed to the segmenter in order, and every resulting segment is printed.

Examples:
  # Fixed 5-character fragments
  think-segmenter completion.txt --chunk-size 5

  # Random fragment sizes, reproducible with a seed, JSON output
  cat completion.txt | think-segmenter --random-chunks --seed 42 --format json
"#)]
struct CliArgs {
    /// File to read; `-` or absent reads stdin
    input: Option<String>,

    /// Fragment size in characters
    #[arg(long, default_value_t = 16)]
    chunk_size: usize,

    /// Use random fragment sizes between 1 and --chunk-size
    #[arg(long, default_value_t = false)]
    random_chunks: bool,

    /// Seed for --random-chunks
    #[arg(long)]
    seed: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Maximum bytes the segmenter may buffer
    #[arg(long, default_value_t = DEFAULT_MAX_BUFFER_SIZE)]
    max_buffer_size: usize,

    /// Log level
    #[arg(long, default_value = "warn", value_parser = ["trace", "debug", "info", "warn", "error"])]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    log_json: bool,

    /// Directory for rolling log files
    #[arg(long)]
    log_dir: Option<String>,
}

impl CliArgs {
    fn logging_config(&self) -> LoggingConfig {
        let level = match self.log_level.as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "error" => Level::ERROR,
            _ => Level::WARN,
        };
        LoggingConfig {
            level,
            json_format: self.log_json,
            log_dir: self.log_dir.clone(),
            ..Default::default()
        }
    }

    fn read_input(&self) -> Result<String> {
        match self.input.as_deref() {
            None | Some("-") => {
                let mut text = String::new();
                io::stdin()
                    .read_to_string(&mut text)
                    .context("failed to read stdin")?;
                Ok(text)
            }
            Some(path) => {
                fs::read_to_string(path).with_context(|| format!("failed to read {}", path))
            }
        }
    }
}

/// Cut `text` into fragments of `sizes()` characters each.
fn partition(text: &str, mut sizes: impl FnMut() -> usize) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let take = sizes().max(1);
        let end = rest
            .char_indices()
            .nth(take)
            .map_or(rest.len(), |(offset, _)| offset);
        let (fragment, tail) = rest.split_at(end);
        fragments.push(fragment);
        rest = tail;
    }
    fragments
}

fn write_segment(
    out: &mut impl Write,
    segment: &StructuredSegment,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{}", segment)?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(segment)?)?,
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    let _log_guard = init_logging(cli_args.logging_config());

    if cli_args.chunk_size == 0 {
        return Err(ConfigError::ValidationFailed {
            reason: "--chunk-size must be at least 1".to_string(),
        }
        .into());
    }

    let config = SegmenterConfigBuilder::new()
        .max_buffer_size(cli_args.max_buffer_size)
        .build()?;
    let mut segmenter = ThinkSegmenter::try_with_config(config)?.with_observer(TracingObserver);

    let text = cli_args.read_input()?;
    let fragments = if cli_args.random_chunks {
        let mut rng = match cli_args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let max = cli_args.chunk_size;
        partition(&text, || rng.random_range(1..=max))
    } else {
        partition(&text, || cli_args.chunk_size)
    };
    info!(fragments = fragments.len(), bytes = text.len(), "replaying completion");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for fragment in fragments {
        for segment in segmenter.process_fragment(fragment)? {
            write_segment(&mut out, &segment, cli_args.format)?;
        }
    }
    write_segment(&mut out, &segmenter.finalize(), cli_args.format)?;
    out.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_fixed_size() {
        let fragments = partition("abcdefg", || 3);
        assert_eq!(fragments, vec!["abc", "def", "g"]);
    }

    #[test]
    fn test_partition_keeps_chars_whole() {
        let fragments = partition("思考ab", || 1);
        assert_eq!(fragments, vec!["思", "考", "a", "b"]);
        assert!(partition("", || 4).is_empty());
    }
}
