use std::fs;
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::TempDir;
use unipfp::testing::{AdapterCall, FakeCapability, FakePage, ScriptedAdapter, ScriptedApiAdapter};
use unipfp::{
	Adapter, ErrorKind, ImageFile, Lifecycle, Orchestrator, PfpError, PlatformOutcome, RunCoordinator, RunObserver,
	SessionStore,
};

fn image(temp: &TempDir) -> ImageFile {
	let path = temp.path().join("avatar.jpg");
	fs::write(&path, b"\xff\xd8\xff").unwrap();
	ImageFile::open(&path).unwrap()
}

fn coordinator(temp: &TempDir) -> RunCoordinator {
	RunCoordinator::new(Orchestrator::new(SessionStore::new(temp.path().join("cookies"))))
}

#[tokio::test]
async fn failing_adapter_does_not_stop_the_run() {
	let temp = TempDir::new().unwrap();
	let capability = FakeCapability::new(FakePage::new());

	let discord = ScriptedAdapter::new("Discord", "discord");
	let github = ScriptedAdapter::new("GitHub", "github")
		.with_status(Ok(false))
		.with_login(Err(PfpError::authentication("Wrong GitHub username or password.")));
	let twitch = ScriptedAdapter::new("Twitch", "twitch");

	let adapters = vec![
		Adapter::Browser(Box::new(discord.clone())),
		Adapter::Browser(Box::new(github.clone())),
		Adapter::Browser(Box::new(twitch.clone())),
	];

	let outcome = coordinator(&temp).run(Some(&capability), &adapters, &image(&temp)).await;

	assert_eq!(outcome.len(), 3);
	let platforms: Vec<_> = outcome.iter().map(|o| o.platform).collect();
	assert_eq!(platforms, ["Discord", "GitHub", "Twitch"]);
	assert!(outcome.iter().nth(1).unwrap().result.is_err());
	assert_eq!(outcome.succeeded().count(), 2);
	assert_eq!(twitch.count(AdapterCall::Update), 1);
	assert_eq!(capability.contexts_opened(), 3);
	assert_eq!(capability.contexts_closed(), 3);
	assert_eq!(capability.close_count(), 0);
}

#[tokio::test]
async fn token_adapters_run_without_a_browser() {
	let temp = TempDir::new().unwrap();
	let gitlab = ScriptedApiAdapter::new("GitLab", Some("glpat-123"));
	let adapters = vec![Adapter::Api(Box::new(gitlab.clone()))];
	assert_eq!(adapters[0].lifecycle(), Lifecycle::Token);

	let outcome = coordinator(&temp).run(None, &adapters, &image(&temp)).await;

	assert!(outcome.all_ok());
	assert_eq!(
		outcome.iter().next().unwrap().result.as_deref().unwrap(),
		"Successfully updated pfp on GitLab."
	);
	assert_eq!(gitlab.tokens_used(), ["glpat-123"]);
}

#[tokio::test]
async fn missing_token_is_a_configuration_failure() {
	let temp = TempDir::new().unwrap();
	let gitlab = ScriptedApiAdapter::new("GitLab", None);
	let adapters = vec![Adapter::Api(Box::new(gitlab.clone()))];

	let outcome = coordinator(&temp).run(None, &adapters, &image(&temp)).await;

	let failure = outcome.failed().next().unwrap();
	assert_eq!(failure.result.as_ref().unwrap_err().kind(), ErrorKind::Configuration);
	assert!(gitlab.tokens_used().is_empty());
}

#[tokio::test]
async fn browser_adapters_without_capability_fail_individually() {
	let temp = TempDir::new().unwrap();
	let steam = ScriptedAdapter::new("Steam", "steam");
	let adapters = vec![
		Adapter::Browser(Box::new(steam.clone())),
		Adapter::Api(Box::new(ScriptedApiAdapter::new("GitLab", Some("token")))),
	];

	let outcome = coordinator(&temp).run(None, &adapters, &image(&temp)).await;

	let results: Vec<bool> = outcome.iter().map(PlatformOutcome::is_ok).collect();
	assert_eq!(results, [false, true]);
	assert!(steam.calls().is_empty());
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<String>>>);

impl RunObserver for Recorder {
	fn on_start(&self, index: usize, total: usize, platform: &str) {
		self.0.lock().push(format!("start {}/{total} {platform}", index + 1));
	}

	fn on_finish(&self, outcome: &PlatformOutcome) {
		self.0.lock().push(format!("finish {} {}", outcome.platform, outcome.is_ok()));
	}
}

#[tokio::test]
async fn observer_sees_every_platform_in_order() {
	let temp = TempDir::new().unwrap();
	let capability = FakeCapability::new(FakePage::new());
	let recorder = Recorder::default();

	let adapters = vec![
		Adapter::Browser(Box::new(ScriptedAdapter::new("Reddit", "reddit").with_update(Err(PfpError::unexpected("no upload input"))))),
		Adapter::Api(Box::new(ScriptedApiAdapter::new("GitLab", Some("token")))),
	];

	coordinator(&temp)
		.with_observer(recorder.clone())
		.run(Some(&capability), &adapters, &image(&temp))
		.await;

	assert_eq!(
		*recorder.0.lock(),
		[
			"start 1/2 Reddit",
			"finish Reddit false",
			"start 2/2 GitLab",
			"finish GitLab true"
		]
	);
}
