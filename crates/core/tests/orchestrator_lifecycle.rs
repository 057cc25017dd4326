use std::fs;

use tempfile::TempDir;
use unipfp::testing::{AdapterCall, FakeCapability, FakePage, ScriptedAdapter, sample_state};
use unipfp::{Challenge, ErrorKind, ImageFile, LoginOutcome, Orchestrator, PfpError, SessionStore};

struct Fixture {
	_temp: TempDir,
	store: SessionStore,
	image: ImageFile,
}

fn fixture() -> Fixture {
	let temp = TempDir::new().unwrap();
	let image_path = temp.path().join("avatar.png");
	fs::write(&image_path, b"\x89PNG\r\n\x1a\n").unwrap();
	Fixture {
		store: SessionStore::new(temp.path().join("cookies")),
		image: ImageFile::open(&image_path).unwrap(),
		_temp: temp,
	}
}

#[tokio::test]
async fn fresh_login_persists_then_updates() {
	let fx = fixture();
	let capability = FakeCapability::new(FakePage::new()).with_storage_state(sample_state("user_session"));
	let adapter = ScriptedAdapter::new("GitHub", "github")
		.with_status(Ok(false))
		.with_login(Ok(LoginOutcome::Authenticated));

	let message = Orchestrator::new(fx.store.clone())
		.run(&capability, &adapter, &fx.image)
		.await
		.unwrap();

	assert_eq!(message, "Successfully updated pfp on GitHub.");
	assert_eq!(
		adapter.calls(),
		[AdapterCall::CheckStatus, AdapterCall::Login, AdapterCall::Update]
	);
	assert_eq!(capability.seeds(), [None]);
	assert_eq!(fx.store.load("github").unwrap(), Some(sample_state("user_session")));
	assert_eq!(capability.contexts_closed(), 1);
	assert!(capability.page().calls().contains(&unipfp::testing::PageCall::Close));
}

#[tokio::test]
async fn reused_session_skips_login() {
	let fx = fixture();
	fx.store.persist("twitch", &sample_state("auth-token")).unwrap();

	let capability = FakeCapability::new(FakePage::new()).with_storage_state(sample_state("auth-token"));
	let adapter = ScriptedAdapter::new("Twitch", "twitch").with_status(Ok(true));

	Orchestrator::new(fx.store.clone())
		.run(&capability, &adapter, &fx.image)
		.await
		.unwrap();

	assert_eq!(adapter.count(AdapterCall::Login), 0);
	assert_eq!(adapter.count(AdapterCall::Update), 1);
	assert_eq!(capability.seeds(), [Some(sample_state("auth-token"))]);
}

#[tokio::test]
async fn wrong_password_aborts_before_persistence() {
	let fx = fixture();
	let capability = FakeCapability::new(FakePage::new());
	let adapter = ScriptedAdapter::new("Reddit", "reddit")
		.with_status(Ok(false))
		.with_login(Err(PfpError::authentication(
			"Wrong Reddit username or password. Please check out your environment file.",
		)));

	let err = Orchestrator::new(fx.store.clone())
		.run(&capability, &adapter, &fx.image)
		.await
		.unwrap_err();

	assert_eq!(err.kind(), ErrorKind::Authentication);
	assert!(err.to_string().starts_with("Wrong Reddit username or password"));
	assert_eq!(adapter.count(AdapterCall::Update), 0);
	assert!(fx.store.load("reddit").unwrap().is_none());
	assert_eq!(capability.contexts_closed(), 1);
}

#[tokio::test]
async fn challenge_is_verified_once() {
	let fx = fixture();
	let capability = FakeCapability::new(FakePage::new());
	let adapter = ScriptedAdapter::new("Discord", "discord")
		.with_status(Ok(false))
		.with_login(Ok(LoginOutcome::NeedsVerification(Challenge::Totp)));

	Orchestrator::new(fx.store.clone())
		.run(&capability, &adapter, &fx.image)
		.await
		.unwrap();

	assert_eq!(
		adapter.calls(),
		[
			AdapterCall::CheckStatus,
			AdapterCall::Login,
			AdapterCall::Verify(Challenge::Totp),
			AdapterCall::Update
		]
	);
	assert!(fx.store.load("discord").unwrap().is_some());
}

#[tokio::test]
async fn failed_verification_propagates_verbatim() {
	let fx = fixture();
	let capability = FakeCapability::new(FakePage::new());
	let adapter = ScriptedAdapter::new("Instagram", "instagram")
		.with_status(Ok(false))
		.with_login(Ok(LoginOutcome::NeedsVerification(Challenge::Totp)))
		.with_verify(Err(PfpError::authentication(
			"Wrong Instagram TOTP. Please check out your environment file.",
		)));

	let err = Orchestrator::new(fx.store.clone())
		.run(&capability, &adapter, &fx.image)
		.await
		.unwrap_err();

	assert_eq!(err.to_string(), "Wrong Instagram TOTP. Please check out your environment file.");
	assert!(fx.store.load("instagram").unwrap().is_none());
}

#[tokio::test]
async fn status_error_aborts_without_login() {
	let fx = fixture();
	let capability = FakeCapability::new(FakePage::new());
	let adapter = ScriptedAdapter::new("Plex", "plex").with_status(Err(PfpError::Timeout("app.plex.tv".into())));

	let err = Orchestrator::new(fx.store.clone())
		.run(&capability, &adapter, &fx.image)
		.await
		.unwrap_err();

	assert_eq!(err.kind(), ErrorKind::Transport);
	assert_eq!(adapter.calls(), [AdapterCall::CheckStatus]);
	assert_eq!(capability.contexts_closed(), 1);
}

#[tokio::test]
async fn corrupt_session_is_treated_as_absent() {
	let fx = fixture();
	fs::create_dir_all(fx.store.dir()).unwrap();
	fs::write(fx.store.path_for("steam"), "{ truncated").unwrap();

	let capability = FakeCapability::new(FakePage::new()).with_storage_state(sample_state("steamLoginSecure"));
	let adapter = ScriptedAdapter::new("Steam", "steam").with_status(Ok(false));

	Orchestrator::new(fx.store.clone())
		.run(&capability, &adapter, &fx.image)
		.await
		.unwrap();

	assert_eq!(capability.seeds(), [None]);
	assert_eq!(fx.store.load("steam").unwrap(), Some(sample_state("steamLoginSecure")));
}

#[tokio::test]
async fn persistence_failure_aborts_before_update() {
	let fx = fixture();
	let capability = FakeCapability::new(FakePage::new()).failing_storage_state();
	let adapter = ScriptedAdapter::new("Twitter(X)", "twitterx");

	let err = Orchestrator::new(fx.store.clone())
		.run(&capability, &adapter, &fx.image)
		.await
		.unwrap_err();

	assert_eq!(err.kind(), ErrorKind::Transport);
	assert_eq!(adapter.count(AdapterCall::Update), 0);
	assert_eq!(capability.contexts_closed(), 1);
}

#[tokio::test]
async fn update_failure_still_keeps_fresh_session() {
	let fx = fixture();
	let capability = FakeCapability::new(FakePage::new());
	let adapter = ScriptedAdapter::new("Threads", "threads")
		.with_status(Ok(false))
		.with_update(Err(PfpError::unexpected("Unexpected error occurred while trying to update pfp on Threads.")));

	let err = Orchestrator::new(fx.store.clone())
		.run(&capability, &adapter, &fx.image)
		.await
		.unwrap_err();

	assert_eq!(err.kind(), ErrorKind::UnexpectedState);
	assert!(fx.store.load("threads").unwrap().is_some());
}

#[tokio::test]
async fn persisting_twice_reloads_the_same_session() {
	let fx = fixture();
	let state = sample_state("user_session");
	let capability = FakeCapability::new(FakePage::new()).with_storage_state(state.clone());
	let adapter = ScriptedAdapter::new("GitHub", "github")
		.with_status(Ok(false))
		.with_status(Ok(true));
	let orchestrator = Orchestrator::new(fx.store.clone());

	orchestrator.run(&capability, &adapter, &fx.image).await.unwrap();
	let first = fx.store.load("github").unwrap();
	orchestrator.run(&capability, &adapter, &fx.image).await.unwrap();
	let second = fx.store.load("github").unwrap();

	assert_eq!(first, second);
	assert_eq!(capability.seeds(), [None, Some(state)]);
	assert_eq!(adapter.count(AdapterCall::Login), 1);
}

#[tokio::test]
async fn context_creation_failure_is_reported() {
	let fx = fixture();
	let capability = FakeCapability::new(FakePage::new()).failing_new_context();
	let adapter = ScriptedAdapter::new("GitHub", "github");

	let err = Orchestrator::new(fx.store.clone())
		.run(&capability, &adapter, &fx.image)
		.await
		.unwrap_err();

	assert!(matches!(err, PfpError::Browser(_)));
	assert!(adapter.calls().is_empty());
}
