use anyhow::{Context, Result, bail};
use clap::Parser;
use metric_intake::{
    config::{AppConfig, Args},
    handlers::TerminalView,
    models::StagedFile,
    services::{
        Controller, HttpSubmissionClient, ResultPresenter, View, WorkflowState,
        workflow::INITIAL_TITLE,
    },
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let args = Args::parse();
    let cfg = AppConfig::from_env_and_args(&args)?;

    tracing::info!("Starting metric-intake with config: {:?}", cfg);

    // --- Build session ---
    let client =
        HttpSubmissionClient::new(cfg.endpoint.clone(), cfg.file_field.clone(), cfg.timeout)?;
    let presenter = ResultPresenter::new(cfg.presenter_config());
    let mut session = Controller::new(
        client,
        TerminalView::stdout(),
        cfg.schema.clone(),
        presenter,
        cfg.dwell,
    );
    session.view_mut().set_title(INITIAL_TITLE);

    // --- Fill and lock the form ---
    for (name, value) in args.field_pairs()? {
        session.set_field(&name, value)?;
    }
    session.prepare()?;
    if *session.state() == WorkflowState::Editing {
        bail!("form is incomplete; supply every required field with --field NAME=VALUE");
    }

    // --- Stage screenshots ---
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let file = StagedFile::from_path(path)
            .await
            .with_context(|| format!("staging {}", path.display()))?;
        files.push(file);
    }
    session.add_files(files)?;

    for name in &args.remove {
        let keys: Vec<_> = session
            .queue()
            .keys()
            .into_iter()
            .filter(|key| &key.name == name)
            .collect();
        if keys.is_empty() {
            tracing::warn!("--remove {}: no staged file with that name", name);
        }
        for key in keys {
            session.remove_file(key)?;
        }
    }

    if args.dry_run {
        tracing::info!("Dry run: {} file(s) staged, nothing submitted", session.queue().len());
        return Ok(());
    }

    // --- Submit ---
    tracing::info!(
        session = %session.session_id(),
        "Submitting {} file(s) to {}",
        session.queue().len(),
        session.backend().endpoint()
    );
    session.submit().await?;

    match session.state() {
        WorkflowState::Success { .. } => {}
        WorkflowState::Error { message } => bail!("submission failed: {}", message),
        other => bail!("nothing submitted (session is {})", other),
    }

    if args.wait {
        tracing::info!("Waiting {:?} for the automatic reset (Ctrl-C resets now)", cfg.dwell);
        let fired = tokio::select! {
            res = session.wait_for_auto_reset() => Some(res?),
            _ = tokio::signal::ctrl_c() => None,
        };
        if fired.is_none() {
            session.reset()?;
        }
        tracing::info!("Session reset to {}", session.state());
    }

    Ok(())
}
