mod display;
mod document;
mod report;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use polcheck_ai::config::DEFAULT_MODEL;
use polcheck_ai::{CheckerConfig, Checker, CorpusRetriever, OpenAiClient};
use polcheck_cite::{citation_statistics, extract_citations, parse_compliance_analysis, validate_citations};
use polcheck_core::Segment;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Parser)]
#[command(name = "polcheck", version)]
#[command(about = "Check internal policies against EU regulations, with verified citations")]
struct Cli {
    /// API key for the completion endpoint.
    #[arg(long, env = "OPENAI_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, env = "OPENAI_BASE_URL", global = true, default_value = DEFAULT_BASE_URL)]
    base_url: String,
    #[arg(long, env = "POLCHECK_MODEL", global = true, default_value = DEFAULT_MODEL)]
    model: String,
    #[arg(long, global = true, default_value_t = 0.0)]
    temperature: f32,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the regulation citations found in a text file.
    Extract { file: PathBuf },
    /// Parse a saved model response and validate its citations offline.
    Validate {
        #[arg(long)]
        response: PathBuf,
        /// JSONL file, one retrieved segment per line.
        #[arg(long)]
        segments: PathBuf,
        /// Name recorded as the analysed document.
        #[arg(long)]
        document: Option<String>,
        /// Parse the response as markdown without trying JSON first.
        #[arg(long, default_value_t = false)]
        markdown: bool,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Ask a question about EU regulations.
    Ask {
        question: String,
        /// Regulation chunk corpus (JSONL).
        #[arg(long)]
        corpus: PathBuf,
    },
    /// Check a policy document against EU regulations and write a report.
    Check {
        document: PathBuf,
        #[arg(long)]
        corpus: PathBuf,
        /// Directory for the markdown report.
        #[arg(long, default_value = "output")]
        output: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    tracing::debug!("polcheck v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Extract { file } => {
            let text = std::fs::read_to_string(file)
                .with_context(|| format!("reading {}", file.display()))?;
            display::print_citations(&extract_citations(&text));
        }
        Commands::Validate {
            response,
            segments,
            document,
            markdown,
            json,
        } => {
            let text = std::fs::read_to_string(response)
                .with_context(|| format!("reading {}", response.display()))?;
            let segments = read_segments(segments)?;

            let mut analysis = parse_compliance_analysis(&text, document.as_deref(), !markdown);
            let validated = validate_citations(&analysis.citations(), &segments);
            let stats = citation_statistics(&validated);
            analysis.apply_citations(validated);

            if *json {
                let out = serde_json::json!({ "analysis": analysis, "stats": stats });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                display::print_analysis(&analysis, &stats, None);
            }
        }
        Commands::Ask { question, corpus } => {
            let checker = checker(&cli, corpus)?;
            let answer = checker.answer(question).await?;
            display::print_answer(&answer);
        }
        Commands::Check {
            document,
            corpus,
            output,
            json,
        } => {
            let checker = checker(&cli, corpus)?;
            let content = document::extract_text(document, checker.config().max_document_length)?;
            let name = document
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| document.display().to_string());

            let check = checker.check_document(&name, &content).await?;
            let report_path = report::write_report(output, &name, &check)?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&check)?);
            } else {
                display::print_analysis(&check.analysis, &check.stats, Some(&check.overview));
                println!();
            }
            eprintln!("Report written to {}", report_path.display());
        }
    }
    Ok(())
}

fn checker(cli: &Cli, corpus: &Path) -> anyhow::Result<Checker<OpenAiClient, CorpusRetriever>> {
    let api_key = cli
        .api_key
        .clone()
        .context("no API key: set OPENAI_API_KEY or pass --api-key")?;
    let config = CheckerConfig {
        model: cli.model.clone(),
        temperature: cli.temperature,
        ..CheckerConfig::default()
    };
    let client = OpenAiClient::new(
        cli.base_url.clone(),
        api_key,
        config.model.clone(),
        config.temperature,
    );
    let retriever = CorpusRetriever::from_jsonl(corpus)
        .with_context(|| format!("loading corpus {}", corpus.display()))?;
    Ok(Checker::new(client, retriever, config))
}

/// One JSON-encoded [`Segment`] per non-blank line.
fn read_segments(path: &Path) -> anyhow::Result<Vec<Segment>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}: line {}", path.display(), i + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_check_arguments() {
        let cli = Cli::try_parse_from([
            "polcheck",
            "--model",
            "gpt-4o",
            "check",
            "policy.txt",
            "--corpus",
            "eu_laws_chunks.jsonl",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.model, "gpt-4o");
        match cli.command {
            Commands::Check {
                document,
                output,
                json,
                ..
            } => {
                assert_eq!(document, PathBuf::from("policy.txt"));
                assert_eq!(output, PathBuf::from("output"));
                assert!(json);
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn reads_segment_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segments.jsonl");
        std::fs::write(
            &path,
            "{\"content\":\"Article 37\",\"metadata\":{\"source\":\"GDPR\",\"article\":37}}\n\n",
        )
        .unwrap();
        let segments = read_segments(&path).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].source(), "GDPR");
    }

    #[test]
    fn bad_segment_line_names_the_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segments.jsonl");
        std::fs::write(&path, "{\"content\":\"x\"}\n").unwrap();
        let err = read_segments(&path).unwrap_err();
        assert!(format!("{err}").ends_with("line 1"));
    }
}
