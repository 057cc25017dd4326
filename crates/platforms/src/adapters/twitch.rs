use async_trait::async_trait;
use unipfp::{
	BrowserAdapter, Challenge, Credentials, ElementState, ImageFile, LoginOutcome, Page, PfpError, PlatformDescriptor,
	Result, Transition,
};

use crate::support::{
	ELEMENT_TIMEOUT, click_when_visible, confirm_hidden, login_failed, missing_totp_input, nth, or_unexpected,
	type_like_a_human, verify_failed,
};

const NAME: &str = "Twitch";

const PASSPORT_MODAL: &str = "div[data-a-target=\"passport-modal\"]";
const USER_MENU: &str = "button[data-a-target=\"user-menu-toggle\"]";
const USERNAME: &str = "#login-username";
const PASSWORD: &str = "#password-input";
const LOGIN_BUTTON: &str = "button[data-a-target=\"passport-login-button\"]";
const TOTP_INPUT: &str = "#authenticator-token-input";
const REMEMBER_DEVICE: &str = "label:has-text(\"Remember this device for 30 days\")";

#[derive(Clone, Copy)]
enum Screen {
	LoginModal,
	LoggedIn,
	Totp,
}

pub struct Twitch {
	descriptor: PlatformDescriptor,
	credentials: Credentials,
}

impl Twitch {
	pub fn new(credentials: Credentials) -> Self {
		Self {
			descriptor: PlatformDescriptor {
				name: NAME,
				home_url: "https://www.twitch.tv/",
				login_url: "https://www.twitch.tv/login",
				settings_url: "https://www.twitch.tv/settings/profile",
				session_key: "twitch",
			},
			credentials,
		}
	}
}

#[async_trait]
impl BrowserAdapter for Twitch {
	fn descriptor(&self) -> &PlatformDescriptor {
		&self.descriptor
	}

	/// Settings redirect anonymous visitors to the passport modal.
	async fn check_status(&self, page: &dyn Page) -> Result<bool> {
		page.goto(self.descriptor.settings_url).await?;
		let screen = Transition::new()
			.on(PASSPORT_MODAL, Screen::LoginModal)
			.on(USER_MENU, Screen::LoggedIn)
			.wait(page, "Twitch status check")
			.await?;
		Ok(matches!(screen, Screen::LoggedIn))
	}

	async fn perform_login(&self, page: &dyn Page) -> Result<LoginOutcome> {
		let (username, password) = self.credentials.require_login(NAME)?;

		type_like_a_human(page, USERNAME, username).await?;
		type_like_a_human(page, PASSWORD, password).await?;
		page.click(LOGIN_BUTTON).await?;

		let screen = Transition::new()
			.on(TOTP_INPUT, Screen::Totp)
			.on(USER_MENU, Screen::LoggedIn)
			.wait(page, "Twitch login")
			.await;

		match or_unexpected(screen, login_failed(NAME))? {
			Screen::LoggedIn => Ok(LoginOutcome::Authenticated),
			Screen::Totp => Ok(LoginOutcome::NeedsVerification(Challenge::Totp)),
			Screen::LoginModal => Err(PfpError::unexpected(login_failed(NAME))),
		}
	}

	async fn perform_verify(&self, page: &dyn Page, challenge: Challenge) -> Result {
		if challenge != Challenge::Totp || !page.is_visible(&nth(TOTP_INPUT, 0)).await? {
			return Err(missing_totp_input(NAME));
		}

		let code = self.credentials.totp_code(NAME)?;
		type_like_a_human(page, TOTP_INPUT, &code).await?;
		page.click(REMEMBER_DEVICE).await?;
		page.click("button[type=\"submit\"]").await?;

		or_unexpected(
			page.wait_for(USER_MENU, ElementState::Visible, ELEMENT_TIMEOUT).await,
			verify_failed(NAME),
		)?;
		page.goto(self.descriptor.home_url).await
	}

	async fn perform_update(&self, page: &dyn Page, image: &ImageFile) -> Result {
		page.goto(self.descriptor.settings_url).await?;

		click_when_visible(page, "button[data-a-target=\"profile-image-upload-button\"]").await?;
		page.wait_for("input[type=file]", ElementState::Attached, ELEMENT_TIMEOUT).await?;
		page.set_input_files("input[type=file]", image).await?;

		let save = nth("button:has-text(\"Save\")", -1);
		click_when_visible(page, &save).await?;
		confirm_hidden(page, &save, NAME).await
	}
}
