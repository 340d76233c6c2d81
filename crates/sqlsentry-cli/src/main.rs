//! sqlsentry CLI - Command-line interface for the SQL injection detector

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use sqlsentry_core::{AttackFamily, Explanation, Sentry, SentryConfig};
use sqlsentry_firewall::automata::{automaton, AutomatonKind};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlsentry")]
#[command(about = "sqlsentry - SQL injection detection for request payloads")]
#[command(version)]
struct Cli {
    /// Configuration file path (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Print the verdict for a payload
    Check {
        payload: String,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print every intermediate stage for a payload
    Explain {
        payload: String,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List the active signature catalog
    Rules {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the formal definition of both automata
    Automata,
    /// Run the canonical payloads and verify their verdicts
    Selftest,
    /// Explain payloads read from stdin, one per line
    Repl,
}

/// Canonical payloads and the family each must be classified as.
const SELFTEST_CASES: &[(&str, Option<AttackFamily>)] = &[
    ("username=admin&password=123", None),
    ("id=1' OR '1'='1", Some(AttackFamily::BooleanBased)),
    ("id=1' OR 1=1", Some(AttackFamily::BooleanBased)),
    ("admin'--", Some(AttackFamily::CommentBased)),
    ("user'#", Some(AttackFamily::CommentBased)),
];

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => {
            debug!("Loading config from {}", path.display());
            SentryConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => SentryConfig::default(),
    };
    let sentry = Sentry::new(config).context("Failed to initialize sqlsentry")?;

    match cli.command {
        Some(Commands::Check { payload, json }) => {
            let result = sentry.analyze_payload(&payload);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result);
            }
        }
        Some(Commands::Explain { payload, json }) => {
            let explanation = sentry.explain(&payload);
            if json {
                println!("{}", serde_json::to_string_pretty(&explanation)?);
            } else {
                print!("{}", render_explanation(&explanation));
            }
        }
        Some(Commands::Rules { json }) => {
            let signatures = sentry.list_signatures();
            let fingerprint = sentry.catalog_fingerprint();
            if json {
                let listing = serde_json::json!({
                    "fingerprint": fingerprint,
                    "signatures": signatures,
                });
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                println!("Catalog fingerprint: {}", fingerprint);
                for info in signatures {
                    println!(
                        "  {:<16} {:<6} {}",
                        info.name,
                        info.severity.as_str(),
                        info.pattern
                    );
                }
            }
        }
        Some(Commands::Automata) => {
            for kind in AutomatonKind::ALL {
                println!("{}", automaton(kind));
            }
        }
        Some(Commands::Repl) => repl(&sentry)?,
        Some(Commands::Selftest) | None => selftest(&sentry)?,
    }

    Ok(())
}

fn selftest(sentry: &Sentry) -> anyhow::Result<()> {
    let mut failures = 0;

    for (payload, expected) in SELFTEST_CASES {
        let result = sentry.analyze_payload(payload);
        let status = if result.attack_type == *expected {
            "ok"
        } else {
            failures += 1;
            "FAIL"
        };
        println!("[{:>4}] {}", status, result);
    }

    if failures > 0 {
        bail!("{} of {} selftest cases failed", failures, SELFTEST_CASES.len());
    }
    println!("All {} selftest cases passed", SELFTEST_CASES.len());
    Ok(())
}

fn repl(sentry: &Sentry) -> anyhow::Result<()> {
    run_repl(sentry, io::stdin().lock(), io::stdout())
}

/// Explain each non-blank line of `input` until `exit` or end of input.
fn run_repl(
    sentry: &Sentry,
    mut input: impl BufRead,
    mut output: impl Write,
) -> anyhow::Result<()> {
    loop {
        eprint!("sqlsentry> ");
        io::stderr().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let payload = line.trim();
        if payload.is_empty() {
            continue;
        }
        if payload.eq_ignore_ascii_case("exit") {
            break;
        }
        writeln!(output, "{}", render_explanation(&sentry.explain(payload)))?;
    }

    Ok(())
}

fn render_explanation(explanation: &Explanation) -> String {
    let mut out = String::new();
    let result = &explanation.result;

    out.push_str(&format!("Verdict: {}\n", result));

    out.push_str("\nTokens:\n");
    for token in &explanation.tokens {
        out.push_str(&format!("  {:>4}  {}\n", token.offset, token));
    }
    let summary: Vec<String> = explanation
        .token_summary
        .iter()
        .map(|(kind, count)| format!("{}={}", kind.as_str(), count))
        .collect();
    out.push_str(&format!("  summary: {}\n", summary.join(", ")));

    out.push_str("\nClassification tree:\n");
    out.push_str(&explanation.tree.to_string());

    out.push_str("\nDetector: ");
    match (&explanation.detection.family, &explanation.detection.matched_text) {
        (Some(family), Some(text)) => out.push_str(&format!("{} via {:?}\n", family, text)),
        _ => out.push_str("no match\n"),
    }

    out.push_str("\nSignatures:\n");
    if explanation.signature_matches.is_empty() {
        out.push_str("  (none)\n");
    }
    for m in &explanation.signature_matches {
        out.push_str(&format!("  {} [{} / {}] {}\n", m.name, m.severity, m.action, m.message));
    }

    if !explanation.automata.is_empty() {
        out.push_str("\nAutomata:\n");
        for sim in &explanation.automata {
            out.push_str(&format!(
                "  {}: {} in {} ({})\n",
                sim.automaton,
                if sim.accepted { "accepted" } else { "rejected" },
                sim.final_state,
                sim.trace.join(" ")
            ));
        }
    }

    if let Some(report) = &explanation.semantic {
        out.push_str(&format!(
            "\nSemantic risk: {} (score {}, {})\n",
            report.risk.level, report.risk.score, report.risk.action
        ));
        for issue in &report.issues {
            out.push_str(&format!("  {:?}: {}\n", issue.level, issue.message));
        }
        for recommendation in &report.recommendations {
            out.push_str(&format!("  - {}\n", recommendation));
        }
    }

    if let (Some(program), Some(execution)) = (&explanation.program, &explanation.execution) {
        out.push_str("\nProgram:\n");
        out.push_str(&program.to_string());
        for line in &execution.output {
            out.push_str(&format!("  > {}\n", line));
        }
    }

    out
}
