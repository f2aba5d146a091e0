use anyhow::Result;
use zodia::cli::{self, actions, actions::Action};

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    let action = cli::start()?;

    match action {
        Action::Server(args) => actions::server::handle(args).await?,
        Action::HashPassword { password } => actions::hash_password::handle(&password)?,
        Action::Generate2faSecret => actions::two_factor::handle()?,
    }

    Ok(())
}
