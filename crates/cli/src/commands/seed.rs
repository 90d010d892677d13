use chatdesk_core::config::{AppConfig, LoadOptions};
use chatdesk_db::{connect_with_settings, migrations, seed_demo, SeedSummary};

use crate::commands::CommandResult;

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";

pub fn run(admin_email: &str, admin_password: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let summary = seed_demo(&pool, admin_email, admin_password)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8));

        pool.close().await;
        summary
    });

    match result {
        Ok(summary) => CommandResult::success("seed", describe(&summary, admin_email)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn describe(summary: &SeedSummary, admin_email: &str) -> String {
    let admin = if summary.admin_created {
        format!("created admin `{admin_email}`")
    } else {
        format!("admin `{admin_email}` already present")
    };
    let prompt = if summary.prompt_created { "stored demo prompt" } else { "prompt left unchanged" };

    format!(
        "demo data seeded: {admin}; {prompt}; {} contacts and {} messages added",
        summary.contacts_created, summary.messages_created
    )
}
