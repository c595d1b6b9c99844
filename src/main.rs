use anyhow::Context;
use clap::Parser;
use yatube::{
    config::{CliArgs, Command, GroupCommand, Settings},
    connect_db,
    db_helpers::{create_group_in_db, delete_group_in_db, update_group_in_db},
    run_app, telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = CliArgs::parse();
    let settings =
        Settings::load(args.config_file.as_deref()).context("Failed to load configuration")?;
    telemetry::init(&settings.logging)?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => run_app(&settings).await,
        Command::Group(command) => manage_groups(&settings, command).await,
    }
}

async fn manage_groups(settings: &Settings, command: GroupCommand) -> anyhow::Result<()> {
    let pool = connect_db(&settings.database.url, settings.database.max_connections).await?;
    match command {
        GroupCommand::Create(args) => {
            let group =
                create_group_in_db(&pool, &args.title, &args.slug, &args.description).await?;
            tracing::info!(group_id = group.id, slug = %group.slug, "group created");
            println!("created group {} ({})", group.slug, group.title);
        }
        GroupCommand::Update(args) => {
            let group = update_group_in_db(&pool, &args.slug, args.title, args.description).await?;
            println!("updated group {} ({})", group.slug, group.title);
        }
        GroupCommand::Delete { slug } => {
            delete_group_in_db(&pool, &slug).await?;
            tracing::info!(%slug, "group deleted");
            println!("deleted group {slug}");
        }
    }
    pool.close().await;
    Ok(())
}
