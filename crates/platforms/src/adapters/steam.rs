use std::time::Duration;

use async_trait::async_trait;
use unipfp::{
	BrowserAdapter, Challenge, Credentials, ElementState, ImageFile, LoginOutcome, Page, PfpError, PlatformDescriptor,
	Result, Transition,
};

use crate::support::{confirm_hidden, login_failed, nth, or_unexpected, type_like_a_human, wait_visible, wrong_login};

const NAME: &str = "Steam";

/// How long the user gets to approve the sign-in on the Steam mobile app.
pub const APPROVAL_TIMEOUT: Duration = Duration::from_secs(30);

const USERNAME: &str = "div[data-featuretarget=login] input[type=text]";
const PASSWORD: &str = "input[type=password]";
const SUBMIT: &str = "button[type=submit]";
const LOGIN_ERROR: &str = "div:has(+ a[href*=\"HelpWithLogin?\"]) >> text=/\\S/";
const MOBILE_PROMPT: &str = "img[src*=\"login_mobile_auth.png\"]";
const CODE_PROMPT: &str = "input[maxlength=\"1\"][data-sharkid=\"__0\"]";
const CROPPER: &str = "div.cropper-container";

#[derive(Clone, Copy)]
enum Screen {
	LoginForm,
	LoggedIn,
	Rejected,
	AwaitingApproval,
}

pub struct Steam {
	descriptor: PlatformDescriptor,
	credentials: Credentials,
}

impl Steam {
	pub fn new(credentials: Credentials) -> Self {
		Self {
			descriptor: PlatformDescriptor {
				name: NAME,
				home_url: "https://store.steampowered.com/",
				login_url: "https://store.steampowered.com/login",
				settings_url: "https://steamcommunity.com/my/edit/avatar",
				session_key: "steam",
			},
			credentials,
		}
	}

	fn avatar(&self) -> Result<String> {
		let username = self.credentials.require_identifier(NAME)?;
		Ok(format!("#global_actions img[alt=\"{username}\"]"))
	}
}

#[async_trait]
impl BrowserAdapter for Steam {
	fn descriptor(&self) -> &PlatformDescriptor {
		&self.descriptor
	}

	async fn check_status(&self, page: &dyn Page) -> Result<bool> {
		let avatar = self.avatar()?;
		page.goto(self.descriptor.settings_url).await?;
		let screen = Transition::new()
			.on(PASSWORD, Screen::LoginForm)
			.on(avatar, Screen::LoggedIn)
			.wait(page, "Steam status check")
			.await?;
		Ok(matches!(screen, Screen::LoggedIn))
	}

	async fn perform_login(&self, page: &dyn Page) -> Result<LoginOutcome> {
		let (username, password) = self.credentials.require_login(NAME)?;
		let avatar = self.avatar()?;

		type_like_a_human(page, USERNAME, username).await?;
		type_like_a_human(page, PASSWORD, password).await?;
		page.click(SUBMIT).await?;

		let screen = Transition::new()
			.on(LOGIN_ERROR, Screen::Rejected)
			.on(avatar, Screen::LoggedIn)
			.on(MOBILE_PROMPT, Screen::AwaitingApproval)
			.on(CODE_PROMPT, Screen::AwaitingApproval)
			.wait(page, "Steam login")
			.await;

		match or_unexpected(screen, login_failed(NAME))? {
			Screen::LoggedIn => Ok(LoginOutcome::Authenticated),
			Screen::AwaitingApproval => Ok(LoginOutcome::NeedsVerification(Challenge::DeviceApproval)),
			Screen::Rejected => Err(wrong_login(NAME)),
			Screen::LoginForm => Err(PfpError::unexpected(login_failed(NAME))),
		}
	}

	/// Nothing to type; the user approves the sign-in on their phone.
	async fn perform_verify(&self, page: &dyn Page, _challenge: Challenge) -> Result {
		let avatar = self.avatar()?;
		tracing::info!(target = "unipfp", "waiting for Steam mobile approval");
		or_unexpected(
			page.wait_for(&avatar, ElementState::Visible, APPROVAL_TIMEOUT).await,
			"Something went wrong while waiting for the user to verify the login in Steam.",
		)
	}

	async fn perform_update(&self, page: &dyn Page, image: &ImageFile) -> Result {
		page.set_input_files("input[type=file]", image).await?;

		wait_visible(page, CROPPER).await?;
		page.click(&nth("#profile_edit_leftcol button", 1)).await?;
		confirm_hidden(page, CROPPER, NAME).await
	}

	fn warning(&self) -> Option<&'static str> {
		Some("You may have to manually comfirm your login on your Steam mobile app.")
	}
}
