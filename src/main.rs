mod cli;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, ConfigsCommand, DocumentsCommand, PromptsCommand, VerifyArgs};
use fraud_console::app_state::AppState;
use fraud_console::config::AppConfig;
use fraud_console::controllers::verification::Phase;
use fraud_console::controllers::{ManagerError, Notice};
use fraud_console::models::configuration::ConfigGroup;
use fraud_console::models::prompt::PromptDraft;
use fraud_console::services::auth::AuthError;
use fraud_console::services::upload::UploadedImage;
use fraud_console::shell::render;
use fraud_console::shell::{ActiveView, Screen, Shell, View};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so rendered screens on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Failed to load configuration from environment")?;
    let state = AppState::from_config(config);

    match state.session.restore().await {
        Ok(restored) => tracing::debug!(restored, "Session restored"),
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable session file"),
    }

    let mut shell = Shell::new(state);
    run(&mut shell, cli.command).await
}

async fn run(shell: &mut Shell, command: Command) -> Result<()> {
    let idp = shell.state().session.identity_provider().clone();
    match command {
        Command::LoginUrl => println!("{}", idp.login_url()?),
        Command::SignupUrl => println!("{}", idp.signup_url()?),
        Command::ForgotPasswordUrl => println!("{}", idp.forgot_password_url()?),
        Command::SignIn { code } => {
            shell.state().session.complete_sign_in(&code).await?;
            match shell.state().session.username().await {
                Some(name) => println!("Signed in as {name}"),
                None => println!("Signed in"),
            }
        }
        Command::SignOut => println!("{}", shell.sign_out().await?),
        Command::Dashboard => match shell.screen().await? {
            Screen::Guest(links) => println!("{}", render::render_guest(&links)),
            Screen::App { username, .. } => {
                println!("{}", render::render_dashboard(username.as_deref()))
            }
        },
        Command::Documents(cmd) => documents(shell, cmd).await?,
        Command::Verify(args) => verify(shell, args).await?,
        Command::Prompts(cmd) => prompts(shell, cmd).await?,
        Command::Configs(cmd) => configs(shell, cmd).await?,
    }
    Ok(())
}

async fn open(shell: &mut Shell, view: View) -> Result<&mut ActiveView> {
    match shell.open(view).await {
        Ok(active) => Ok(active),
        Err(AuthError::NotSignedIn | AuthError::Expired) => {
            bail!("Not signed in. Run `fraud-console login-url` and complete sign-in first.")
        }
        Err(e) => Err(e.into()),
    }
}

/// Print the success notice, or turn the failure into the user-facing message.
fn finish(notice: Option<&Notice>, result: Result<(), ManagerError>) -> Result<()> {
    if let Err(e) = result {
        if e.is_auth() {
            bail!("Session expired. Sign in again.");
        }
        return Err(anyhow!(e.user_message()));
    }
    if let Some(line) = render::render_notice(notice) {
        println!("{line}");
    }
    Ok(())
}

async fn documents(shell: &mut Shell, cmd: DocumentsCommand) -> Result<()> {
    let ActiveView::Analyzer(analyzer) = open(shell, View::Analyzer).await? else {
        bail!("Document analyzer unavailable");
    };
    match cmd {
        DocumentsCommand::List => {
            let result = analyzer.list().await.map(|_| ());
            finish(analyzer.notice(), result)?;
            println!("{}", render::render_documents(analyzer.documents()));
        }
        DocumentsCommand::Analyze { path } => {
            analyzer.select_image(UploadedImage::open(&path).await?);
            let document = match analyzer.analyze().await {
                Ok(document) => document,
                Err(e) => return finish(analyzer.notice(), Err(e)),
            };
            finish(analyzer.notice(), Ok(()))?;
            println!("{}", render::render_document(&document));
        }
    }
    Ok(())
}

async fn verify(shell: &mut Shell, args: VerifyArgs) -> Result<()> {
    let image = UploadedImage::open(&args.path).await?;
    let ActiveView::Verification(controller) = open(shell, View::Verification).await? else {
        bail!("Verification unavailable");
    };

    controller.select_image(image);
    let mut updates = controller.subscribe();
    let job_id = controller
        .start_verification()
        .await
        .map_err(|e| anyhow!(e.user_message()))?;
    tracing::info!(job_id = %job_id, "Verification submitted");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        let view = updates.borrow_and_update().clone();
        println!("{}\n", render::render_verification(&view));
        if matches!(view.phase, Phase::Completed | Phase::Failed) {
            break;
        }

        let waiting = stdin_open && view.needs_info_prompt().is_some();
        if waiting {
            print!("> ");
            std::io::stdout().flush()?;
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            line = lines.next_line(), if waiting => match line? {
                Some(text) if !text.trim().is_empty() => {
                    controller.set_draft(text.clone());
                    if let Err(e) = controller.submit_additional_info(&text).await {
                        eprintln!("{}", e.user_message());
                    }
                }
                Some(_) => {}
                None => stdin_open = false,
            },
        }
    }

    shell.close();
    Ok(())
}

async fn prompts(shell: &mut Shell, cmd: PromptsCommand) -> Result<()> {
    let ActiveView::Prompts(manager) = open(shell, View::Prompts).await? else {
        bail!("Prompt manager unavailable");
    };
    let listed = manager.list().await.map(|_| ());

    match cmd {
        PromptsCommand::List => {
            finish(manager.notice(), listed)?;
            println!("{}", render::render_prompts(manager.prompts()));
        }
        PromptsCommand::Show { id } => {
            finish(None, listed)?;
            let prompt = manager
                .find(&id)
                .ok_or_else(|| anyhow!("No prompt with ID {id}"))?;
            println!("{}", render::render_prompt(prompt));
        }
        PromptsCommand::Create(fields) => {
            let draft = PromptDraft::new(fields.role, fields.tasks, fields.active);
            let result = manager.create(&draft).await;
            finish(manager.notice(), result)?;
        }
        PromptsCommand::Update { id, fields } => {
            let draft = PromptDraft {
                pk: Some(id),
                ..PromptDraft::new(fields.role, fields.tasks, fields.active)
            };
            let result = manager.update(&draft).await;
            finish(manager.notice(), result)?;
        }
        PromptsCommand::Delete { id } => {
            let result = manager.delete(&id).await;
            finish(manager.notice(), result)?;
        }
    }
    Ok(())
}

async fn configs(shell: &mut Shell, cmd: ConfigsCommand) -> Result<()> {
    let ActiveView::Configs(manager) = open(shell, View::Configs).await? else {
        bail!("Configuration manager unavailable");
    };
    let listed = manager.list().await;
    finish(None, listed)?;

    match cmd {
        ConfigsCommand::List => {}
        ConfigsCommand::Set { group, key, value } => {
            let group: ConfigGroup = group
                .parse()
                .map_err(|_| anyhow!("Unknown configuration group {group}"))?;
            let mut config = manager
                .find(group, &key)
                .cloned()
                .ok_or_else(|| anyhow!("No {group} entry named {key}"))?;
            config.value = value;
            let result = manager.update(config).await;
            finish(manager.notice(), result)?;
        }
        ConfigsCommand::Activate { key } => {
            let result = manager.activate_model(&key).await;
            finish(manager.notice(), result)?;
        }
    }

    println!(
        "{}",
        render::render_configurations(
            manager.models(),
            manager.inference_params(),
            manager.activation()
        )
    );
    Ok(())
}
