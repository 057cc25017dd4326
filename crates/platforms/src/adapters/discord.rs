use async_trait::async_trait;
use unipfp::{
	BrowserAdapter, Challenge, Credentials, ElementState, ImageFile, LoginOutcome, Page, PfpError, PlatformDescriptor,
	Result, Transition,
};

use crate::support::{
	ELEMENT_TIMEOUT, click_when_visible, confirm_hidden, login_failed, missing_totp_input, nth, or_unexpected,
	type_like_a_human, verify_failed, wait_visible, wrong_totp,
};

const NAME: &str = "Discord";

const EMAIL: &str = "input[name=email]";
const PASSWORD: &str = "input[name=password]";
const SUBMIT: &str = "button[type=submit]";
const GUILDS: &str = "nav[class*=guilds]";
const HELPER_TEXT: &str = "div[class*=helperTextContainer]";
const TOTP_INPUT: &str = "input[autocomplete=one-time-code]";
const TOTP_ERROR: &str = "div[class*=error]";

#[derive(Clone, Copy)]
enum Screen {
	LoginForm,
	LoggedIn,
	Rejected,
	Totp,
}

pub struct Discord {
	descriptor: PlatformDescriptor,
	credentials: Credentials,
}

impl Discord {
	pub fn new(credentials: Credentials) -> Self {
		Self {
			descriptor: PlatformDescriptor {
				name: NAME,
				home_url: "https://discord.com/channels/@me",
				login_url: "https://discord.com/login",
				settings_url: "https://discord.com/channels/@me",
				session_key: "discord",
			},
			credentials,
		}
	}
}

#[async_trait]
impl BrowserAdapter for Discord {
	fn descriptor(&self) -> &PlatformDescriptor {
		&self.descriptor
	}

	async fn check_status(&self, page: &dyn Page) -> Result<bool> {
		page.goto(self.descriptor.login_url).await?;
		let screen = Transition::new()
			.on(GUILDS, Screen::LoggedIn)
			.on(EMAIL, Screen::LoginForm)
			.wait(page, "Discord status check")
			.await?;
		Ok(matches!(screen, Screen::LoggedIn))
	}

	async fn perform_login(&self, page: &dyn Page) -> Result<LoginOutcome> {
		let (email, password) = self.credentials.require_login(NAME)?;

		type_like_a_human(page, EMAIL, email).await?;
		type_like_a_human(page, PASSWORD, password).await?;
		page.click(SUBMIT).await?;

		let screen = Transition::new()
			.on(HELPER_TEXT, Screen::Rejected)
			.on(GUILDS, Screen::LoggedIn)
			.on(TOTP_INPUT, Screen::Totp)
			.wait(page, "Discord login")
			.await;

		match or_unexpected(screen, login_failed(NAME))? {
			Screen::LoggedIn => Ok(LoginOutcome::Authenticated),
			Screen::Totp => Ok(LoginOutcome::NeedsVerification(Challenge::Totp)),
			Screen::Rejected => match page.count(HELPER_TEXT).await? {
				// An email confirmation gate, not a credential rejection.
				1 => Err(PfpError::unexpected(
					"New Discord account login location detected. Please check out your email inbox.",
				)),
				2 => Err(PfpError::authentication(
					"Wrong Discord email or password. Please check out your environment file.",
				)),
				_ => Err(PfpError::unexpected(login_failed(NAME))),
			},
			Screen::LoginForm => Err(PfpError::unexpected(login_failed(NAME))),
		}
	}

	async fn perform_verify(&self, page: &dyn Page, challenge: Challenge) -> Result {
		if challenge != Challenge::Totp || !page.is_visible(TOTP_INPUT).await? {
			return Err(missing_totp_input(NAME));
		}

		let code = self.credentials.totp_code(NAME)?;
		type_like_a_human(page, TOTP_INPUT, &code).await?;
		page.click(SUBMIT).await?;

		let screen = Transition::new()
			.on(TOTP_ERROR, Screen::Rejected)
			.on(GUILDS, Screen::LoggedIn)
			.wait(page, "Discord verification")
			.await;

		match or_unexpected(screen, verify_failed(NAME))? {
			Screen::LoggedIn => Ok(()),
			Screen::Rejected => Err(wrong_totp(NAME)),
			_ => Err(PfpError::unexpected(verify_failed(NAME))),
		}
	}

	async fn perform_update(&self, page: &dyn Page, image: &ImageFile) -> Result {
		page.click(&nth("section button", -1)).await?;
		wait_visible(page, "div[role=dialog] div[role=tablist]").await?;
		page.click(&nth("div[role=dialog] div[role=tablist]+div button", 0)).await?;

		click_when_visible(page, &nth("div[role=dialog] h1+div button", 0)).await?;
		page.wait_for("input.file-input", ElementState::Attached, ELEMENT_TIMEOUT).await?;
		page.set_input_files("input.file-input", image).await?;
		wait_visible(page, "img[alt=avatar]").await?;

		click_when_visible(page, &nth("footer button", -1)).await?;

		let save = nth("div[class*=notice] button", -1);
		click_when_visible(page, &save).await?;
		confirm_hidden(page, &save, NAME).await
	}

	fn warning(&self) -> Option<&'static str> {
		Some("You may have to manually bypass Discord reCAPTCHA, as it sometimes shows up.")
	}
}
