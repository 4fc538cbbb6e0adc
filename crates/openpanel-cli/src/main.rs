// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use openpanel::{ClientSecret, OpenPanel, Options, Properties, PROFILE_ID_KEY};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Send events to an OpenPanel collector
#[derive(Parser, Debug)]
#[command(name = "openpanel", version, about, long_about = None)]
struct Args {
	/// Path to a TOML options file
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// OpenPanel client id
	#[arg(long, env = "OPENPANEL_CLIENT_ID")]
	client_id: Option<String>,

	/// OpenPanel client secret
	#[arg(long, env = "OPENPANEL_CLIENT_SECRET", hide_env_values = true)]
	client_secret: Option<String>,

	/// Collector URL
	#[arg(long, env = "OPENPANEL_API_URL")]
	api_url: Option<String>,

	/// Log every request, header and response
	#[arg(short, long)]
	verbose: bool,

	/// Log output format
	#[arg(long, value_enum, default_value = "compact")]
	log_format: LogFormat,

	#[command(subcommand)]
	command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
	Compact,
	Json,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Track a named event
	Track {
		/// Event name
		name: String,
		/// Event property (repeatable: -p KEY=VALUE)
		#[arg(long = "prop", short = 'p', value_name = "KEY=VALUE")]
		props: Vec<String>,
		/// Attach the event to this profile
		#[arg(long)]
		profile_id: Option<String>,
	},
	/// Identify a profile
	Identify {
		profile_id: String,
		/// Profile trait (repeatable: -p KEY=VALUE)
		#[arg(long = "prop", short = 'p', value_name = "KEY=VALUE")]
		props: Vec<String>,
	},
	/// Link an alias to a profile
	Alias { profile_id: String, alias: String },
	/// Increment a numeric profile property
	Increment {
		profile_id: String,
		property: String,
		#[arg(long)]
		value: Option<i64>,
	},
	/// Decrement a numeric profile property
	Decrement {
		profile_id: String,
		property: String,
		#[arg(long)]
		value: Option<i64>,
	},
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();
	init_tracing(args.log_format);

	let options = load_options(&args)?;
	let client = OpenPanel::new(options).context("failed to create OpenPanel client")?;

	match args.command {
		Command::Track {
			name,
			props,
			profile_id,
		} => {
			let mut properties = parse_props(&props)?;
			if let Some(profile_id) = profile_id {
				properties.set(PROFILE_ID_KEY, profile_id);
			}
			info!(event = %name, "tracking event");
			client.track(name, properties);
		}
		Command::Identify { profile_id, props } => {
			info!(profile_id = %profile_id, "identifying profile");
			client.identify(profile_id, parse_props(&props)?);
		}
		Command::Alias { profile_id, alias } => client.alias(profile_id, alias),
		Command::Increment {
			profile_id,
			property,
			value,
		} => client.increment(profile_id, property, value),
		Command::Decrement {
			profile_id,
			property,
			value,
		} => client.decrement(profile_id, property, value),
	}

	client.shutdown().await;
	Ok(())
}

fn init_tracing(format: LogFormat) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("openpanel=info"));

	match format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Compact => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().compact().with_writer(std::io::stderr))
				.init();
		}
	}
}

/// File first, then `OPENPANEL_*` variables, then flags.
fn load_options(args: &Args) -> Result<Options> {
	let mut options = match &args.config {
		Some(path) => Options::from_toml_file(path)
			.with_context(|| format!("failed to load config from {}", path.display()))?,
		None => Options::default(),
	};
	options
		.apply_lookup(|key| std::env::var(key).ok())
		.context("invalid OPENPANEL_* environment")?;

	if let Some(client_id) = &args.client_id {
		options.client_id = client_id.clone();
	}
	if let Some(secret) = &args.client_secret {
		options.client_secret = Some(ClientSecret::new(secret.as_str()));
	}
	if let Some(api_url) = &args.api_url {
		options.api_url = Some(api_url.clone());
	}
	if args.verbose {
		options.verbose = true;
	}

	Ok(options)
}

/// Parses `KEY=VALUE` pairs. Values that are valid JSON keep their type;
/// anything else is sent as a string.
fn parse_props(pairs: &[String]) -> Result<Properties> {
	let mut properties = Properties::new();
	for pair in pairs {
		let (key, raw) = pair
			.split_once('=')
			.with_context(|| format!("property must be KEY=VALUE: {pair}"))?;
		let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
		properties.set(key, value);
	}
	Ok(properties)
}
