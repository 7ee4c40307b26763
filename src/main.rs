use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use gitfolio::cache::FallbackDataset;
use gitfolio::models::{DisplayProject, ProjectLanguages, UserStats};
use gitfolio::{Config, GitHubClient, RepositoryCache, Showcase, ShowcaseConfig};

#[derive(Parser, Debug)]
#[command(name = "gitfolio")]
#[command(version)]
#[command(about = "Build a portfolio project showcase from a GitHub profile")]
struct Args {
    /// GitHub username (defaults to GITHUB_USERNAME)
    #[arg(short, long)]
    username: Option<String>,

    /// Number of projects to show (defaults to PROJECT_LIMIT, then 6)
    #[arg(short, long)]
    limit: Option<usize>,

    /// Output format (json, text, markdown)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<String>,

    /// Include profile statistics
    #[arg(long)]
    stats: bool,

    /// Include per-project language breakdowns
    #[arg(long)]
    languages: bool,

    /// Fail on GitHub errors instead of showing sample projects
    #[arg(long)]
    strict: bool,
}

#[derive(Serialize)]
struct Report {
    username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<UserStats>,
    projects: Vec<DisplayProject>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    languages: Vec<ProjectLanguages>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("gitfolio=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = Config::from_env()?;

    let username = args
        .username
        .clone()
        .or_else(|| config.username.clone())
        .ok_or_else(|| anyhow::anyhow!("No username given; pass --username or set GITHUB_USERNAME"))?;
    let limit = args.limit.unwrap_or(config.project_limit);

    let github = GitHubClient::new(config.github_token.as_deref())?.with_base_url(&config.api_url);

    let fallback = match config.fallback_path {
        Some(ref path) => FallbackDataset::from_json_file(path)?,
        None => FallbackDataset::Sample,
    };

    let cache = RepositoryCache::new(Arc::new(github))
        .with_fallback(fallback)
        .with_expiry(config.cache_ttl);

    let showcase = Showcase::new(Arc::new(cache), ShowcaseConfig::from(&config));

    tracing::info!("Building showcase for GitHub user: {}", username);
    let projects = if args.strict {
        showcase.try_get_top_projects(&username, limit).await?
    } else {
        showcase.get_top_projects(&username, limit).await
    };

    let stats = if args.stats {
        let stats = showcase.cache().get_user_stats(&username).await;
        if stats.is_none() {
            tracing::warn!("Profile statistics unavailable for {}", username);
        }
        stats
    } else {
        None
    };

    let languages = if args.languages {
        showcase.project_languages(&username, &projects).await
    } else {
        Vec::new()
    };

    let report = Report {
        username,
        stats,
        projects,
        languages,
    };

    output_report(&report, &args)?;

    Ok(())
}

fn output_report(report: &Report, args: &Args) -> anyhow::Result<()> {
    let output = match args.format.as_str() {
        "json" => serde_json::to_string_pretty(report)?,
        "markdown" => format_markdown(report),
        _ => format_text(report),
    };

    if let Some(ref path) = args.output {
        std::fs::write(path, &output)?;
        tracing::info!("Output written to: {}", path);
    } else {
        println!("{}", output);
    }

    Ok(())
}

fn languages_for<'a>(report: &'a Report, project: &str) -> Option<&'a ProjectLanguages> {
    report
        .languages
        .iter()
        .find(|l| l.project == project && !l.languages.is_empty())
}

fn format_text(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!("\n=== Projects: {} ===\n\n", report.username));

    if let Some(ref stats) = report.stats {
        if let Some(ref name) = stats.name {
            output.push_str(&format!("Name: {}\n", name));
        }
        if let Some(ref bio) = stats.bio {
            output.push_str(&format!("Bio: {}\n", bio));
        }
        output.push_str(&format!(
            "Public repos: {}  Followers: {}  Following: {}\n\n",
            stats.public_repos, stats.followers, stats.following
        ));
    }

    if report.projects.is_empty() {
        output.push_str("No projects to show.\n");
    }

    for project in &report.projects {
        output.push_str(&format!("* {} (★ {}, forks {})\n", project.name, project.stars, project.forks));
        output.push_str(&format!("  {}\n", project.description));
        if !project.technologies.is_empty() {
            output.push_str(&format!("  Tech: {}\n", project.technologies.join(", ")));
        }
        output.push_str(&format!("  Code: {}\n", project.github_url));
        if let Some(ref demo) = project.demo_url {
            output.push_str(&format!("  Demo: {}\n", demo));
        }
        if let Some(languages) = languages_for(report, &project.name) {
            let shares: Vec<_> = languages
                .languages
                .iter()
                .map(|l| format!("{} {:.1}%", l.language, l.percentage))
                .collect();
            output.push_str(&format!("  Languages: {}\n", shares.join(", ")));
        }
        output.push_str(&format!(
            "  Updated: {}\n\n",
            project.updated_at.format("%Y-%m-%d")
        ));
    }

    output
}

fn format_markdown(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Projects: {}\n\n", report.username));

    if let Some(ref stats) = report.stats {
        if let Some(ref name) = stats.name {
            output.push_str(&format!("**{}**\n\n", name));
        }
        if let Some(ref bio) = stats.bio {
            output.push_str(&format!("> {}\n\n", bio));
        }
        output.push_str("| Public Repos | Followers | Following |\n|---|---|---|\n");
        output.push_str(&format!(
            "| {} | {} | {} |\n\n",
            stats.public_repos, stats.followers, stats.following
        ));
    }

    for project in &report.projects {
        output.push_str(&format!("## [{}]({})\n\n", project.name, project.github_url));
        output.push_str(&format!("{}\n\n", project.description));
        if !project.technologies.is_empty() {
            let tags: Vec<_> = project
                .technologies
                .iter()
                .map(|t| format!("`{}`", t))
                .collect();
            output.push_str(&format!("{}\n\n", tags.join(" ")));
        }
        output.push_str(&format!(
            "★ {} · forks {} · updated {}",
            project.stars,
            project.forks,
            project.updated_at.format("%Y-%m-%d")
        ));
        if let Some(ref demo) = project.demo_url {
            output.push_str(&format!(" · [demo]({})", demo));
        }
        output.push_str("\n\n");

        if let Some(languages) = languages_for(report, &project.name) {
            output.push_str("| Language | Share |\n|----------|-------|\n");
            for l in &languages.languages {
                output.push_str(&format!("| {} | {:.1}% |\n", l.language, l.percentage));
            }
            output.push('\n');
        }
    }

    output
}
