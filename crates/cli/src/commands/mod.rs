mod cache;
mod login;

use anyhow::{Context, Result};
use slogin::SessionConfig;

use crate::cli::{Cli, Commands};

pub async fn dispatch(cli: Cli) -> Result<()> {
	let mut config = match &cli.config {
		Some(path) => SessionConfig::from_file(path).with_context(|| format!("failed to load config {}", path.display()))?,
		None => SessionConfig::default(),
	};
	if let Some(file) = cli.file {
		config.cookies_filepath = file;
	}
	if cli.verbose > 0 {
		config.verbose_logging = true;
	}

	match cli.command {
		Commands::Login(args) => {
			if let Some(base_url) = &args.base_url {
				config.base_url = base_url.clone();
			}
			if args.no_landing {
				config.landing_page = None;
			} else if let Some(page) = &args.landing_page {
				config.landing_page = Some(page.clone());
			}
			login::run(config, args).await
		}
		Commands::Show { format } => cache::show(&config, format).await,
		Commands::Clear { user } => cache::clear(&config, user.as_deref()).await,
	}
}
