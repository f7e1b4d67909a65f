use std::path::Path;

use anyhow::Context as _;
use clap::{Arg, Command};
use issuemd_core::template::validate_template;
use issuemd_core::{
    generate_documents, ConfigFile, Context, DocumentStore, DryRunStore, FsDocumentStore,
    GitHubClient, RunConfig, RunSources,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod git;

fn cli() -> Command {
    Command::new("issuemd")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Render GitHub issue threads into Markdown documents")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("JSON run configuration, rewritten with the new checkpoint")
                .required(true),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let matches = cli().get_matches();
    let config_arg = matches
        .get_one::<String>("config")
        .context("Config path not provided")?;

    let work_dir = std::env::current_dir()?;
    let config_path = work_dir.join(config_arg);

    // Initialize context from environment
    let ctx = Context::from_env()?;
    if ctx.ctx_out {
        info!("Context: {:?}", ctx);
    }

    let mut config_file = ConfigFile::load(&config_path)
        .await
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    info!("Config file loaded");

    let config = config_file.config.clone();
    warn_on_unknown_formatters(&config);

    let output_dir = work_dir.join(&config.output_path);
    let store: Box<dyn DocumentStore> = if ctx.dry_run {
        info!("Dry run: documents are rendered but not written");
        Box::new(DryRunStore::new(&output_dir))
    } else {
        Box::new(FsDocumentStore::create(&output_dir).await?)
    };

    let client = GitHubClient::new(&ctx)?;
    let summary = generate_documents(
        &config,
        RunSources {
            issues: &client,
            comments: &client,
            store: store.as_ref(),
        },
    )
    .await?;

    if summary.is_success {
        info!("Completed generating/updating {} documents", summary.files_count);
    } else {
        error!("Process failed after generating/updating {} documents", summary.files_count);
    }

    if ctx.dry_run {
        return Ok(());
    }

    if let Some(checkpoint) = summary.checkpoint_to_persist() {
        config_file.save_checkpoint(&checkpoint).await?;

        if config.auto_commit {
            publish(&work_dir).await?;
        }
    }

    Ok(())
}

fn warn_on_unknown_formatters(config: &RunConfig) {
    let render_config = config.render_config();
    let file_name_template = config.file_name_template();

    for template in std::iter::once(file_name_template.as_str()).chain(render_config.templates()) {
        if let Err(err) = validate_template(template) {
            warn!("{} in template '{}'", err, template);
        }
    }
}

async fn publish(work_dir: &Path) -> anyhow::Result<()> {
    git::commit_and_push(work_dir)
        .await
        .with_context(|| format!("Publishing from {} failed", work_dir.display()))
}
