use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "slogin")]
#[command(about = "Reusable login sessions for browser end-to-end tests")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v debug for slogin, -vv debug for everything)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// JSON configuration file (camelCase session options)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Session cache file, overriding `cookiesFilepath`
	#[arg(long, global = true, value_name = "FILE")]
	pub file: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Establish a session through a WebDriver server, reusing cached cookies
	Login(LoginArgs),

	/// Show the contents of the session cache
	Show {
		#[arg(long, short, value_enum, default_value = "table")]
		format: ShowFormat,
	},

	/// Remove one user's cached cookies, or every user's
	Clear {
		/// Only clear this user's entry
		#[arg(long, short)]
		user: Option<String>,
	},
}

#[derive(clap::Args, Debug)]
pub struct LoginArgs {
	#[arg(long, short)]
	pub username: String,

	#[arg(long, env = "SLOGIN_PASSWORD", hide_env_values = true)]
	pub password: String,

	/// Site origin, overriding `baseUrl`
	#[arg(long, value_name = "URL")]
	pub base_url: Option<String>,

	/// Page to open once the session is established, overriding `landingPage`
	#[arg(long, value_name = "PATH", conflicts_with = "no_landing")]
	pub landing_page: Option<String>,

	/// Stay on the admin dashboard instead of visiting a landing page
	#[arg(long)]
	pub no_landing: bool,

	/// WebDriver server (chromedriver, geckodriver, ...)
	#[arg(long, value_name = "URL", default_value = "http://localhost:4444")]
	pub webdriver: String,

	#[arg(long, value_enum, default_value = "chrome")]
	pub browser: BrowserName,

	/// Show the browser window
	#[arg(long)]
	pub headed: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ShowFormat {
	Table,
	Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BrowserName {
	Chrome,
	Firefox,
}

impl BrowserName {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Chrome => "chrome",
			Self::Firefox => "firefox",
		}
	}
}
