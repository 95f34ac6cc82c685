//! Subcommand implementations

use crate::app::App;
use factrag_search::{EmbeddedCorpus, ScoredFact};
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Print the fact corpus of `pdf`
pub async fn facts(app: &App, pdf: &Path, json: bool) -> anyhow::Result<()> {
    let corpus = app.ingest(pdf).await?;
    let mut out = std::io::stdout().lock();

    if json {
        serde_json::to_writer_pretty(&mut out, corpus.as_ref())?;
        writeln!(out)?;
    } else {
        for fact in corpus.facts() {
            writeln!(out, "{:>3}. {}", fact.index + 1, fact.text)?;
        }
    }
    Ok(())
}

/// Answer `question`, or every line of stdin when no question is given
pub async fn ask(
    app: &App,
    pdf: &Path,
    question: Option<&str>,
    show_scores: bool,
) -> anyhow::Result<()> {
    let corpus = app.ingest(pdf).await?;
    let embedded = app.embed(corpus).await?;
    eprintln!("Loaded {} facts from {}", embedded.len(), pdf.display());

    if let Some(question) = question {
        return answer_one(app, &embedded, question, show_scores).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        std::io::stderr().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        answer_one(app, &embedded, question, show_scores).await?;
    }
    Ok(())
}

async fn answer_one(
    app: &App,
    corpus: &EmbeddedCorpus,
    question: &str,
    show_scores: bool,
) -> anyhow::Result<()> {
    let answer = app.answer(corpus, question).await?;
    if show_scores {
        print_scores("All facts", &answer.scored)?;
    }
    print_scores("Top facts", &answer.facts)?;
    println!("Answer: {}", answer.text);
    Ok(())
}

fn print_scores(title: &str, facts: &[ScoredFact]) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{title}:")?;
    for scored in facts {
        writeln!(out, "  [{:.4}] {}", scored.score, scored.fact.text)?;
    }
    Ok(())
}
