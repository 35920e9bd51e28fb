use std::sync::Arc;
use std::time::{Duration, Instant};

use gateway::{Credentials, MdSession, SessionConfig, SessionState, SimFront};
use quote::{OverloadPolicy, QuoteFeedConfig};
use tracing::{info, warn, Level};

mod instruments;

pub use instruments::{load_instrument_codes, InstrumentEntry};

pub fn init() {
	let _ = tracing_subscriber::fmt()
		.with_max_level(Level::INFO)
		.try_init();
}

pub fn run_live() {
	let instruments = runtime_instruments();
	let credentials = match Credentials::new(
		env_string("QUOTEGATE_BROKER_ID").unwrap_or_else(|| "1013".to_string()),
		env_string("QUOTEGATE_USER_ID").unwrap_or_else(|| "166006".to_string()),
		env_string("QUOTEGATE_PASSWORD").unwrap_or_else(|| "simnow".to_string()),
	) {
		Ok(credentials) => credentials,
		Err(error) => {
			warn!(error = %error, "invalid credentials");
			return;
		}
	};

	let front = env_string("QUOTEGATE_FRONT").unwrap_or_else(|| "sim://local".to_string());
	let mut config = SessionConfig::new(credentials, front, instruments.clone());
	config.feed = runtime_feed_config();

	let api = Arc::new(SimFront::new(Duration::from_millis(
		env_u64("QUOTEGATE_SIM_TICK_MS").unwrap_or(50),
	)));
	let session = match MdSession::new(config, api) {
		Ok(session) => session,
		Err(error) => {
			warn!(error = %error, "session rejected configuration");
			return;
		}
	};

	let mut receivers = instruments
		.iter()
		.map(|instrument| (instrument.clone(), session.feed().subscribe(instrument)))
		.collect::<Vec<_>>();

	if let Err(error) = session.start() {
		warn!(error = %error, "session start failed");
		return;
	}

	let wanted = env_u64("QUOTEGATE_TICKS").unwrap_or(8) as usize;
	let deadline = Instant::now() + Duration::from_millis(env_u64("QUOTEGATE_RUN_MS").unwrap_or(5000));
	let mut seen = 0usize;
	while seen < wanted && Instant::now() < deadline {
		let mut idle = true;
		for (instrument, receiver) in &mut receivers {
			if let Ok(quote) = receiver.try_recv() {
				idle = false;
				seen += 1;
				info!(
					instrument = %instrument,
					last = quote.last_price,
					bid = quote.best_bid().price,
					ask = quote.best_ask().price,
					volume = quote.volume,
					open_interest = quote.open_interest,
					trading_day = %quote.trading_day,
					"tick"
				);
			}
		}
		if idle {
			std::thread::sleep(Duration::from_millis(5));
		}
	}

	let timeout = Duration::from_millis(env_u64("QUOTEGATE_SHUTDOWN_TIMEOUT_MS").unwrap_or(3000));
	let outcome = session.shutdown(timeout);
	info!(outcome = ?outcome, state = %session.state(), "session closed");

	if session.state() != SessionState::Terminated {
		warn!("session left in a non-terminal state");
	}

	let metrics = session.feed().metrics();
	info!(
		published = metrics.published,
		dropped = metrics.dropped,
		ingress_len = metrics.ingress_len,
		ingress_capacity = metrics.ingress_capacity,
		"feed metrics"
	);
}

fn runtime_feed_config() -> QuoteFeedConfig {
	let defaults = QuoteFeedConfig::default();
	QuoteFeedConfig {
		channel_capacity: env_usize("QUOTEGATE_CHANNEL_CAPACITY")
			.unwrap_or(defaults.channel_capacity),
		ingress_capacity: env_usize("QUOTEGATE_INGRESS_CAPACITY")
			.unwrap_or(defaults.ingress_capacity),
		overload_policy: env_overload_policy("QUOTEGATE_OVERLOAD")
			.unwrap_or(defaults.overload_policy),
	}
}

fn env_string(key: &str) -> Option<String> {
	std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
	std::env::var(key)
		.ok()
		.and_then(|value| value.parse::<u64>().ok())
		.filter(|value| *value > 0)
}

fn env_usize(key: &str) -> Option<usize> {
	std::env::var(key)
		.ok()
		.and_then(|value| value.parse::<usize>().ok())
		.filter(|value| *value > 0)
}

fn env_overload_policy(key: &str) -> Option<OverloadPolicy> {
	let value = std::env::var(key).ok()?.to_ascii_lowercase();
	match value.as_str() {
		"drop_newest" => Some(OverloadPolicy::DropNewest),
		"drop_oldest" => Some(OverloadPolicy::DropOldest),
		_ => None,
	}
}

fn runtime_instruments() -> Vec<String> {
	if let Some(path) = env_string("QUOTEGATE_INSTRUMENT_FILE") {
		match load_instrument_codes(&path) {
			Ok(codes) if !codes.is_empty() => return codes,
			Ok(_) => warn!(path = %path, "instrument table is empty"),
			Err(error) => warn!(path = %path, error = %error, "instrument table unreadable"),
		}
	}

	let raw = std::env::var("QUOTEGATE_INSTRUMENTS").unwrap_or_else(|_| "al2412".to_string());
	let mut codes = raw
		.split(',')
		.map(|x| x.trim())
		.filter(|x| !x.is_empty())
		.map(|x| x.to_string())
		.collect::<Vec<_>>();

	if codes.is_empty() {
		codes.push("al2412".to_string());
	}

	let mut deduped = Vec::new();
	for code in codes {
		if !deduped.iter().any(|x| x == &code) {
			deduped.push(code);
		}
	}

	deduped
}

#[cfg(test)]
mod tests {
	use super::runtime_instruments;

	#[test]
	fn instrument_list_parses_and_dedups_env_value() {
		unsafe {
			std::env::set_var("QUOTEGATE_INSTRUMENTS", "al2412, cu2412,al2412 ,,rb2501");
		}
		let codes = runtime_instruments();
		unsafe {
			std::env::remove_var("QUOTEGATE_INSTRUMENTS");
		}

		assert_eq!(
			codes,
			vec![
				"al2412".to_string(),
				"cu2412".to_string(),
				"rb2501".to_string()
			]
		);
	}
}
