use anyhow::{Context, Result, bail};
use gitcompare::{
    ChangeTreeProvider, Command, ComparisonContext, Config, GitCli, RefKind, discover_root,
    list_commits, list_references, pages, read_blob, render_text, summary,
};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = Config::parse();

    env_logger::Builder::new()
        .filter_level(config.log_level())
        .parse_default_env()
        .init();

    config.validate()?;

    let git = GitCli::new(&config.git);

    match &config.command {
        Command::Diff {
            path,
            reference,
            html,
            open,
        } => diff(git, path, reference, html.as_deref(), *open).await,
        Command::Refs { path } => refs(path),
        Command::Log {
            path,
            reference,
            limit,
        } => history(&git, path, reference, *limit).await,
        Command::Show { path, reference } => show(&git, path, reference).await,
        Command::Rebase { onto, repo, yes } => rebase(&git, repo, onto, *yes).await,
    }
}

/// Prints the change tree for one comparison and optionally writes a report.
async fn diff(
    git: GitCli,
    path: &Path,
    reference: &str,
    html: Option<&Path>,
    open: bool,
) -> Result<()> {
    let context = ComparisonContext::resolve(&git, path, reference).await?;

    // The provider only reports fetch failures as an empty tree, so a bad
    // reference is caught here where the user can see it.
    git.resolve_revision(context.repository_root(), reference)
        .await?;

    let provider = ChangeTreeProvider::new(git);
    provider.set_context(context.clone()).await;
    let tree = provider.snapshot().unwrap_or_default();

    print!("{}", render_text(&tree));
    println!("{}", summary(&tree, context.reference_label()));

    if let Some(output) = html {
        let markup = pages::report::generate(&context, &tree);
        fs::write(output, markup.into_string())
            .with_context(|| format!("Failed to write report: {}", output.display()))?;
        println!("Generated: {}", output.display());

        if open {
            open::that(output)
                .with_context(|| format!("Failed to open {}", output.display()))?;
        }
    }

    Ok(())
}

/// Lists branches and tags available as comparison targets.
fn refs(path: &Path) -> Result<()> {
    let references = list_references(path)?;
    if references.is_empty() {
        println!("No branches or tags found");
        return Ok(());
    }

    for reference in &references {
        let kind = match reference.kind() {
            RefKind::Branch => "branch",
            RefKind::Tag => "tag",
        };
        println!("{:<6}  {}", kind, reference.name());
    }

    Ok(())
}

/// Lists recent commits available as comparison targets.
async fn history(git: &GitCli, path: &Path, reference: &str, limit: usize) -> Result<()> {
    let root = discover_root(path)?;
    let commit_id = git.resolve_revision(&root, reference).await?;

    for commit in list_commits(&root, &commit_id, Some(limit))? {
        println!(
            "{}  {} ({})",
            commit.short_oid(),
            commit.message(),
            commit.author()
        );
    }

    Ok(())
}

/// Writes a file's content at a revision to stdout.
async fn show(git: &GitCli, path: &Path, reference: &str) -> Result<()> {
    let context = ComparisonContext::resolve(git, path, reference).await?;
    let relative = context
        .relative_path()
        .filter(|p| !p.is_empty())
        .with_context(|| format!("Not a file inside the repository: {}", path.display()))?;

    let commit_id = git
        .resolve_revision(context.repository_root(), reference)
        .await?;
    let content = read_blob(context.repository_root(), &commit_id, &relative)?;

    io::stdout()
        .write_all(&content)
        .context("Failed to write file content")?;
    Ok(())
}

/// Rebases onto a reference after confirmation.
async fn rebase(git: &GitCli, repo: &Path, onto: &str, yes: bool) -> Result<()> {
    let root = discover_root(repo)?;
    git.resolve_revision(&root, onto).await?;

    if !yes && !confirm(&format!("Rebase current branch onto {onto}?"))? {
        println!("Rebase cancelled");
        return Ok(());
    }

    let output = git.rebase_onto(&root, onto).await?;
    print!("{output}");
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush().context("Failed to flush prompt")?;

    let mut answer = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    if read == 0 {
        bail!("No confirmation given; pass --yes to rebase without prompting");
    }

    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
