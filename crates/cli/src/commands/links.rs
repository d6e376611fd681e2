use crate::commands::{load_config, runtime, CommandResult};
use trivia_db::{connect_with_config, LinkRepository, SqlLinkRepository};

pub const DEFAULT_LIMIT: u32 = 20;

/// Lists the most recently captured links, newest first.
pub fn run(limit: u32) -> CommandResult {
    let config = match load_config("links") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("links") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        let links = SqlLinkRepository::new(pool.clone());
        let listed = async {
            let total = links.count().await?;
            let recent = links.list_recent(limit).await?;
            Ok::<_, trivia_db::RepositoryError>((total, recent))
        }
        .await
        .map_err(|error| {
            (
                "link_archive",
                format!("{error} (run `trivia migrate` if the archive is new)"),
                5u8,
            )
        });
        pool.close().await;
        listed
    });

    match result {
        Ok((total, recent)) => CommandResult::success_with_data(
            "links",
            format!("showing {} of {total} archived link(s)", recent.len()),
            serde_json::to_value(&recent).ok(),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("links", error_class, message, exit_code)
        }
    }
}
