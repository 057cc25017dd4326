//! Scripted fakes for exercising adapters and the orchestrator without a browser.
//!
//! [`FakePage`] keeps a set of visible selectors and a log of every call.
//! Reactions registered with `on_goto`/`on_click`/`on_press` toggle
//! visibility when the adapter performs the matching action, which is enough
//! to walk a login form through its states. Reactions may also emit network
//! responses, which [`Page::watch_responses`] watchers armed earlier will see.
//! [`FakeCapability`] hands out
//! contexts that share one page and records the seed of each context.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use unipfp_protocol::{Cookie, StorageState};

use crate::adapter::{ApiAdapter, BrowserAdapter, Challenge, LoginOutcome};
use crate::capability::{BrowsingContext, Capability, ElementState, NetworkResponse, Page, ResponseWatch};
use crate::error::{PfpError, Result};
use crate::image::ImageFile;
use crate::platform::PlatformDescriptor;

/// A call observed by [`FakePage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCall {
	Goto(String),
	Click(String),
	Type { selector: String, text: String },
	Press(String),
	Upload { selector: String, file_name: String },
	WaitFor(String),
	InnerText(String),
	WatchResponses(String),
	Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Trigger {
	Goto(String),
	Click(String),
	Press(String),
}

#[derive(Debug, Clone)]
struct Reaction {
	trigger: Trigger,
	show: Vec<String>,
	hide: Vec<String>,
	respond: Vec<NetworkResponse>,
}

#[derive(Debug, Default)]
struct PageScript {
	visible: HashSet<String>,
	texts: HashMap<String, String>,
	counts: HashMap<String, usize>,
	reactions: Vec<Reaction>,
	responses: Vec<NetworkResponse>,
	calls: Vec<PageCall>,
}

impl PageScript {
	fn fire(&mut self, trigger: &Trigger) {
		let matching: Vec<Reaction> = self.reactions.iter().filter(|r| &r.trigger == trigger).cloned().collect();
		for reaction in matching {
			for selector in reaction.hide {
				self.visible.remove(&selector);
			}
			self.visible.extend(reaction.show);
			self.responses.extend(reaction.respond);
		}
	}
}

fn owned<'a>(selectors: impl IntoIterator<Item = &'a str>) -> Vec<String> {
	selectors.into_iter().map(String::from).collect()
}

/// Scripted [`Page`]. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakePage {
	script: Arc<Mutex<PageScript>>,
}

impl FakePage {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_visible<'a>(self, selectors: impl IntoIterator<Item = &'a str>) -> Self {
		self.script.lock().visible.extend(owned(selectors));
		self
	}

	pub fn with_text(self, selector: &str, text: &str) -> Self {
		self.script.lock().texts.insert(selector.to_string(), text.to_string());
		self
	}

	pub fn with_count(self, selector: &str, count: usize) -> Self {
		self.script.lock().counts.insert(selector.to_string(), count);
		self
	}

	fn react<'a>(self, trigger: Trigger, show: impl IntoIterator<Item = &'a str>, hide: impl IntoIterator<Item = &'a str>) -> Self {
		self.script.lock().reactions.push(Reaction {
			trigger,
			show: owned(show),
			hide: owned(hide),
			respond: Vec::new(),
		});
		self
	}

	/// Shows `show` after navigating to `url`.
	pub fn on_goto<'a>(self, url: &str, show: impl IntoIterator<Item = &'a str>) -> Self {
		self.react(Trigger::Goto(url.to_string()), show, [])
	}

	/// Shows `show` after clicking `selector`.
	pub fn on_click<'a>(self, selector: &str, show: impl IntoIterator<Item = &'a str>) -> Self {
		self.react(Trigger::Click(selector.to_string()), show, [])
	}

	/// Shows `show` and hides `hide` after clicking `selector`.
	pub fn on_click_replace<'a>(
		self,
		selector: &str,
		show: impl IntoIterator<Item = &'a str>,
		hide: impl IntoIterator<Item = &'a str>,
	) -> Self {
		self.react(Trigger::Click(selector.to_string()), show, hide)
	}

	/// Emits `response` after clicking `selector`.
	pub fn on_click_respond(self, selector: &str, response: NetworkResponse) -> Self {
		self.script.lock().reactions.push(Reaction {
			trigger: Trigger::Click(selector.to_string()),
			show: Vec::new(),
			hide: Vec::new(),
			respond: vec![response],
		});
		self
	}

	/// Shows `show` after pressing `key`.
	pub fn on_press<'a>(self, key: &str, show: impl IntoIterator<Item = &'a str>) -> Self {
		self.react(Trigger::Press(key.to_string()), show, [])
	}

	pub fn show(&self, selector: &str) {
		self.script.lock().visible.insert(selector.to_string());
	}

	pub fn hide(&self, selector: &str) {
		self.script.lock().visible.remove(selector);
	}

	/// Emits `response` now.
	pub fn respond(&self, response: NetworkResponse) {
		self.script.lock().responses.push(response);
	}

	pub fn calls(&self) -> Vec<PageCall> {
		self.script.lock().calls.clone()
	}

	/// Text typed into `selector`, concatenated across calls.
	pub fn typed(&self, selector: &str) -> String {
		self.script
			.lock()
			.calls
			.iter()
			.filter_map(|c| match c {
				PageCall::Type { selector: s, text } if s == selector => Some(text.as_str()),
				_ => None,
			})
			.collect()
	}

	pub fn clicked(&self, selector: &str) -> bool {
		self.script.lock().calls.contains(&PageCall::Click(selector.to_string()))
	}

	pub fn visited(&self) -> Vec<String> {
		self.script
			.lock()
			.calls
			.iter()
			.filter_map(|c| match c {
				PageCall::Goto(url) => Some(url.clone()),
				_ => None,
			})
			.collect()
	}

	fn record(&self, call: PageCall) {
		self.script.lock().calls.push(call);
	}
}

#[async_trait]
impl Page for FakePage {
	async fn goto(&self, url: &str) -> Result {
		let mut script = self.script.lock();
		script.calls.push(PageCall::Goto(url.to_string()));
		script.fire(&Trigger::Goto(url.to_string()));
		Ok(())
	}

	async fn is_visible(&self, selector: &str) -> Result<bool> {
		Ok(self.script.lock().visible.contains(selector))
	}

	async fn wait_for(&self, selector: &str, state: ElementState, _timeout: Duration) -> Result {
		let mut script = self.script.lock();
		script.calls.push(PageCall::WaitFor(selector.to_string()));
		let visible = script.visible.contains(selector);
		let satisfied = match state {
			ElementState::Visible => visible,
			ElementState::Hidden => !visible,
			ElementState::Attached => visible || script.counts.get(selector).is_some_and(|n| *n > 0),
		};
		if satisfied {
			Ok(())
		} else {
			Err(PfpError::Timeout(format!("waiting for {selector} to be {state:?}")))
		}
	}

	async fn count(&self, selector: &str) -> Result<usize> {
		let script = self.script.lock();
		Ok(script
			.counts
			.get(selector)
			.copied()
			.unwrap_or_else(|| usize::from(script.visible.contains(selector))))
	}

	async fn click(&self, selector: &str) -> Result {
		let mut script = self.script.lock();
		script.calls.push(PageCall::Click(selector.to_string()));
		script.fire(&Trigger::Click(selector.to_string()));
		Ok(())
	}

	async fn type_text(&self, selector: &str, text: &str, _delay: Duration) -> Result {
		self.record(PageCall::Type {
			selector: selector.to_string(),
			text: text.to_string(),
		});
		Ok(())
	}

	async fn press(&self, key: &str) -> Result {
		let mut script = self.script.lock();
		script.calls.push(PageCall::Press(key.to_string()));
		script.fire(&Trigger::Press(key.to_string()));
		Ok(())
	}

	async fn inner_text(&self, selector: &str) -> Result<String> {
		let mut script = self.script.lock();
		script.calls.push(PageCall::InnerText(selector.to_string()));
		match script.texts.get(selector) {
			Some(text) => Ok(text.clone()),
			None => Err(PfpError::Timeout(format!("waiting for {selector}"))),
		}
	}

	async fn set_input_files(&self, selector: &str, image: &ImageFile) -> Result {
		self.record(PageCall::Upload {
			selector: selector.to_string(),
			file_name: image.file_name(),
		});
		Ok(())
	}

	async fn watch_responses(&self, url_part: &str) -> Result<Box<dyn ResponseWatch>> {
		let mut script = self.script.lock();
		script.calls.push(PageCall::WatchResponses(url_part.to_string()));
		Ok(Box::new(FakeResponseWatch {
			script: Arc::clone(&self.script),
			url_part: url_part.to_string(),
			cursor: script.responses.len(),
		}))
	}

	async fn close(&self) -> Result {
		self.record(PageCall::Close);
		Ok(())
	}
}

/// Replays responses emitted after it was armed. An exhausted log answers
/// `None` at once instead of waiting out the timeout.
struct FakeResponseWatch {
	script: Arc<Mutex<PageScript>>,
	url_part: String,
	cursor: usize,
}

#[async_trait]
impl ResponseWatch for FakeResponseWatch {
	async fn next(&mut self, _timeout: Duration) -> Result<Option<NetworkResponse>> {
		let script = self.script.lock();
		while let Some(response) = script.responses.get(self.cursor) {
			self.cursor += 1;
			if response.url.contains(&self.url_part) {
				return Ok(Some(response.clone()));
			}
		}
		Ok(None)
	}
}

/// A small logged-in snapshot used as the default context state.
pub fn sample_state(cookie: &str) -> StorageState {
	StorageState {
		cookies: vec![Cookie {
			name: cookie.to_string(),
			value: "fake-session-value".to_string(),
			url: None,
			domain: Some("example.com".to_string()),
			path: Some("/".to_string()),
			expires: Some(1_900_000_000.0),
			http_only: Some(true),
			secure: Some(true),
			same_site: None,
		}],
		origins: Vec::new(),
	}
}

#[derive(Debug)]
struct CapabilityState {
	seeds: Vec<Option<StorageState>>,
	storage_state: StorageState,
	contexts_closed: usize,
	closes: usize,
	fail_new_context: bool,
	fail_storage_state: bool,
}

/// Scripted [`Capability`]. Every context shares the same [`FakePage`].
#[derive(Debug, Clone)]
pub struct FakeCapability {
	page: FakePage,
	state: Arc<Mutex<CapabilityState>>,
}

impl FakeCapability {
	pub fn new(page: FakePage) -> Self {
		Self {
			page,
			state: Arc::new(Mutex::new(CapabilityState {
				seeds: Vec::new(),
				storage_state: sample_state("session"),
				contexts_closed: 0,
				closes: 0,
				fail_new_context: false,
				fail_storage_state: false,
			})),
		}
	}

	/// State returned by `storage_state()` of every context.
	pub fn with_storage_state(self, state: StorageState) -> Self {
		self.state.lock().storage_state = state;
		self
	}

	pub fn failing_new_context(self) -> Self {
		self.state.lock().fail_new_context = true;
		self
	}

	pub fn failing_storage_state(self) -> Self {
		self.state.lock().fail_storage_state = true;
		self
	}

	pub fn page(&self) -> &FakePage {
		&self.page
	}

	/// Seed passed to each `new_context` call, in order.
	pub fn seeds(&self) -> Vec<Option<StorageState>> {
		self.state.lock().seeds.clone()
	}

	pub fn contexts_opened(&self) -> usize {
		self.state.lock().seeds.len()
	}

	pub fn contexts_closed(&self) -> usize {
		self.state.lock().contexts_closed
	}

	pub fn close_count(&self) -> usize {
		self.state.lock().closes
	}
}

#[async_trait]
impl Capability for FakeCapability {
	async fn new_context(&self, seed: Option<&StorageState>) -> Result<Box<dyn BrowsingContext>> {
		let mut state = self.state.lock();
		if state.fail_new_context {
			return Err(PfpError::Browser("browser has been closed".into()));
		}
		state.seeds.push(seed.cloned());
		Ok(Box::new(FakeContext {
			page: self.page.clone(),
			capability: Arc::clone(&self.state),
		}))
	}

	async fn close(&self) -> Result {
		self.state.lock().closes += 1;
		Ok(())
	}
}

struct FakeContext {
	page: FakePage,
	capability: Arc<Mutex<CapabilityState>>,
}

#[async_trait]
impl BrowsingContext for FakeContext {
	fn page(&self) -> &dyn Page {
		&self.page
	}

	async fn storage_state(&self) -> Result<StorageState> {
		let state = self.capability.lock();
		if state.fail_storage_state {
			return Err(PfpError::Browser("Target page, context or browser has been closed".into()));
		}
		Ok(state.storage_state.clone())
	}

	async fn close(&self) -> Result {
		self.capability.lock().contexts_closed += 1;
		Ok(())
	}
}

/// A lifecycle step observed by [`ScriptedAdapter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterCall {
	CheckStatus,
	Login,
	Verify(Challenge),
	Update,
}

#[derive(Default)]
struct AdapterScript {
	status: VecDeque<Result<bool>>,
	login: VecDeque<Result<LoginOutcome>>,
	verify: VecDeque<Result>,
	update: VecDeque<Result>,
	calls: Vec<AdapterCall>,
}

/// [`BrowserAdapter`] answering from queued results. An exhausted queue
/// answers with success (`check_status` reports logged in).
#[derive(Clone)]
pub struct ScriptedAdapter {
	descriptor: PlatformDescriptor,
	script: Arc<Mutex<AdapterScript>>,
}

impl ScriptedAdapter {
	pub fn new(name: &'static str, session_key: &'static str) -> Self {
		Self {
			descriptor: PlatformDescriptor {
				name,
				home_url: "https://example.com/",
				login_url: "https://example.com/login",
				settings_url: "https://example.com/settings",
				session_key,
			},
			script: Arc::default(),
		}
	}

	pub fn with_status(self, status: Result<bool>) -> Self {
		self.script.lock().status.push_back(status);
		self
	}

	pub fn with_login(self, login: Result<LoginOutcome>) -> Self {
		self.script.lock().login.push_back(login);
		self
	}

	pub fn with_verify(self, verify: Result) -> Self {
		self.script.lock().verify.push_back(verify);
		self
	}

	pub fn with_update(self, update: Result) -> Self {
		self.script.lock().update.push_back(update);
		self
	}

	pub fn calls(&self) -> Vec<AdapterCall> {
		self.script.lock().calls.clone()
	}

	pub fn count(&self, call: AdapterCall) -> usize {
		self.script.lock().calls.iter().filter(|c| **c == call).count()
	}
}

#[async_trait]
impl BrowserAdapter for ScriptedAdapter {
	fn descriptor(&self) -> &PlatformDescriptor {
		&self.descriptor
	}

	async fn check_status(&self, _page: &dyn Page) -> Result<bool> {
		let mut script = self.script.lock();
		script.calls.push(AdapterCall::CheckStatus);
		script.status.pop_front().unwrap_or(Ok(true))
	}

	async fn perform_login(&self, _page: &dyn Page) -> Result<LoginOutcome> {
		let mut script = self.script.lock();
		script.calls.push(AdapterCall::Login);
		script.login.pop_front().unwrap_or(Ok(LoginOutcome::Authenticated))
	}

	async fn perform_verify(&self, _page: &dyn Page, challenge: Challenge) -> Result {
		let mut script = self.script.lock();
		script.calls.push(AdapterCall::Verify(challenge));
		script.verify.pop_front().unwrap_or(Ok(()))
	}

	async fn perform_update(&self, _page: &dyn Page, _image: &ImageFile) -> Result {
		let mut script = self.script.lock();
		script.calls.push(AdapterCall::Update);
		script.update.pop_front().unwrap_or(Ok(()))
	}
}

/// [`ApiAdapter`] with a fixed token and queued update results.
#[derive(Clone)]
pub struct ScriptedApiAdapter {
	name: &'static str,
	token: Option<String>,
	updates: Arc<Mutex<(VecDeque<Result>, Vec<String>)>>,
}

impl ScriptedApiAdapter {
	pub fn new(name: &'static str, token: Option<&str>) -> Self {
		Self {
			name,
			token: token.map(String::from),
			updates: Arc::default(),
		}
	}

	pub fn with_update(self, update: Result) -> Self {
		self.updates.lock().0.push_back(update);
		self
	}

	/// Tokens passed to `perform_update`, in call order.
	pub fn tokens_used(&self) -> Vec<String> {
		self.updates.lock().1.clone()
	}
}

#[async_trait]
impl ApiAdapter for ScriptedApiAdapter {
	fn name(&self) -> &'static str {
		self.name
	}

	fn token(&self) -> Result<&str> {
		self.token
			.as_deref()
			.ok_or_else(|| PfpError::config(format!("Could not find the {} secret.", self.name)))
	}

	async fn perform_update(&self, token: &str, _image: &ImageFile) -> Result {
		let mut updates = self.updates.lock();
		updates.1.push(token.to_string());
		updates.0.pop_front().unwrap_or(Ok(()))
	}
}
