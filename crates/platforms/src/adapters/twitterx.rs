use std::time::Duration;

use async_trait::async_trait;
use unipfp::{
	BrowserAdapter, Challenge, Credentials, ImageFile, LoginOutcome, Page, PfpError, PlatformDescriptor, Result,
	Transition,
};

use crate::support::{
	click_when_visible, confirm_hidden, login_failed, missing_totp_input, nth, or_unexpected, type_like_a_human,
	verify_failed, wrong_totp,
};

const NAME: &str = "Twitter(X)";

const USERNAME: &str = "input[autocomplete=username]";
const PASSWORD: &str = "input[autocomplete=current-password]";
const ACCOUNT_SWITCHER: &str = "button[data-testid=SideNav_AccountSwitcher_Button]";
const TOAST: &str = "div[data-testid=toast]";
const TOTP_INPUT: &str = "input[data-testid=ocfEnterTextTextInput]";
const SAVE: &str = "button[data-testid=Profile_Save_Button]";

/// Pause before pressing Enter so the form registers the input.
const SETTLE: Duration = Duration::from_millis(500);

#[derive(Clone, Copy)]
enum Screen {
	UsernameStep,
	PasswordStep,
	LoggedIn,
	Toast,
	Totp,
}

pub struct TwitterX {
	descriptor: PlatformDescriptor,
	credentials: Credentials,
}

impl TwitterX {
	pub fn new(credentials: Credentials) -> Self {
		Self {
			descriptor: PlatformDescriptor {
				name: NAME,
				home_url: "https://x.com/",
				login_url: "https://x.com/login",
				settings_url: "https://x.com/settings/profile",
				session_key: "twitterx",
			},
			credentials,
		}
	}
}

async fn submit(page: &dyn Page, selector: &str, text: &str) -> Result {
	type_like_a_human(page, selector, text).await?;
	tokio::time::sleep(SETTLE).await;
	page.press("Enter").await
}

#[async_trait]
impl BrowserAdapter for TwitterX {
	fn descriptor(&self) -> &PlatformDescriptor {
		&self.descriptor
	}

	async fn check_status(&self, page: &dyn Page) -> Result<bool> {
		page.goto(self.descriptor.login_url).await?;
		let screen = Transition::new()
			.on(USERNAME, Screen::UsernameStep)
			.on(ACCOUNT_SWITCHER, Screen::LoggedIn)
			.wait(page, "Twitter(X) status check")
			.await?;
		Ok(matches!(screen, Screen::LoggedIn))
	}

	async fn perform_login(&self, page: &dyn Page) -> Result<LoginOutcome> {
		let (username, password) = self.credentials.require_login(NAME)?;

		submit(page, USERNAME, username).await?;
		let screen = Transition::new()
			.on(TOAST, Screen::Toast)
			.on(PASSWORD, Screen::PasswordStep)
			.wait(page, "Twitter(X) username step")
			.await;
		if let Screen::Toast = or_unexpected(screen, login_failed(NAME))? {
			return Err(PfpError::authentication(
				"Wrong Twitter(X) username. Please check out your environment file.",
			));
		}

		submit(page, PASSWORD, password).await?;
		let screen = Transition::new()
			.on(TOAST, Screen::Toast)
			.on(ACCOUNT_SWITCHER, Screen::LoggedIn)
			.on(TOTP_INPUT, Screen::Totp)
			.wait(page, "Twitter(X) password step")
			.await;

		match or_unexpected(screen, login_failed(NAME))? {
			Screen::LoggedIn => Ok(LoginOutcome::Authenticated),
			Screen::Totp => Ok(LoginOutcome::NeedsVerification(Challenge::Totp)),
			Screen::Toast => Err(PfpError::authentication(
				"Wrong Twitter(X) password. Please check out your environment file.",
			)),
			_ => Err(PfpError::unexpected(login_failed(NAME))),
		}
	}

	async fn perform_verify(&self, page: &dyn Page, challenge: Challenge) -> Result {
		if challenge != Challenge::Totp || !page.is_visible(TOTP_INPUT).await? {
			return Err(missing_totp_input(NAME));
		}

		let code = self.credentials.totp_code(NAME)?;
		submit(page, TOTP_INPUT, &code).await?;

		let screen = Transition::new()
			.on(TOAST, Screen::Toast)
			.on(ACCOUNT_SWITCHER, Screen::LoggedIn)
			.wait(page, "Twitter(X) verification")
			.await;

		match or_unexpected(screen, verify_failed(NAME))? {
			Screen::LoggedIn => Ok(()),
			Screen::Toast => Err(wrong_totp(NAME)),
			_ => Err(PfpError::unexpected(verify_failed(NAME))),
		}
	}

	async fn perform_update(&self, page: &dyn Page, image: &ImageFile) -> Result {
		page.goto(self.descriptor.settings_url).await?;
		// The first file input belongs to the banner.
		page.set_input_files(&nth("input[data-testid=fileInput]", 1), image).await?;

		click_when_visible(page, "button[data-testid=applyButton]").await?;
		click_when_visible(page, SAVE).await?;
		confirm_hidden(page, SAVE, NAME).await
	}
}
