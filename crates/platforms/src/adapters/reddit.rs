use async_trait::async_trait;
use unipfp::{
	BrowserAdapter, Challenge, Credentials, ImageFile, LoginOutcome, NetworkResponse, Page, PfpError,
	PlatformDescriptor, Result, Transition, wait_for_response,
};

use crate::support::{
	ELEMENT_TIMEOUT, click_when_visible, login_failed, missing_totp_input, nth, or_unexpected, type_like_a_human,
	verify_failed, wait_visible, wrong_login, wrong_totp,
};

const NAME: &str = "Reddit";

const LOGIN_BUTTON: &str = "#login-button";
const AVATAR: &str = "img[alt=\"User Avatar\"]";
const USERNAME: &str = "input[name=username]";
const PASSWORD: &str = "input[type=password]";
const FORM_BUTTONS: &str = "faceplate-tracker[noun=login] button";
const PASSWORD_ERROR: &str = "#login-password svg[icon-name=error-outline]";
const TOTP_INPUT: &str = "input[name=appOtp]";
const TOTP_ERROR: &str = "#one-time-code-appOtp svg[icon-name=error-outline]";
const AVATAR_DIALOG: &str = "#avatar-dialog";
const PROFILE_MUTATION: &str = "UpdateProfileStyles";

#[derive(Clone, Copy)]
enum Screen {
	LoggedOut,
	LoggedIn,
	Rejected,
	Totp,
}

pub struct Reddit {
	descriptor: PlatformDescriptor,
	credentials: Credentials,
}

impl Reddit {
	pub fn new(credentials: Credentials) -> Self {
		Self {
			descriptor: PlatformDescriptor {
				name: NAME,
				home_url: "https://www.reddit.com/",
				login_url: "https://www.reddit.com/login",
				settings_url: "https://www.reddit.com/settings/profile",
				session_key: "reddit",
			},
			credentials,
		}
	}
}

#[async_trait]
impl BrowserAdapter for Reddit {
	fn descriptor(&self) -> &PlatformDescriptor {
		&self.descriptor
	}

	async fn check_status(&self, page: &dyn Page) -> Result<bool> {
		page.goto(self.descriptor.home_url).await?;
		let screen = Transition::new()
			.on(LOGIN_BUTTON, Screen::LoggedOut)
			.on(AVATAR, Screen::LoggedIn)
			.wait(page, "Reddit status check")
			.await?;
		Ok(matches!(screen, Screen::LoggedIn))
	}

	async fn perform_login(&self, page: &dyn Page) -> Result<LoginOutcome> {
		let (username, password) = self.credentials.require_login(NAME)?;

		page.goto(self.descriptor.login_url).await?;
		type_like_a_human(page, USERNAME, username).await?;
		type_like_a_human(page, PASSWORD, password).await?;
		page.click(&nth(FORM_BUTTONS, 0)).await?;

		let screen = Transition::new()
			.on(PASSWORD_ERROR, Screen::Rejected)
			.on(AVATAR, Screen::LoggedIn)
			.on(TOTP_INPUT, Screen::Totp)
			.wait(page, "Reddit login")
			.await;

		match or_unexpected(screen, login_failed(NAME))? {
			Screen::LoggedIn => Ok(LoginOutcome::Authenticated),
			Screen::Totp => Ok(LoginOutcome::NeedsVerification(Challenge::Totp)),
			Screen::Rejected => Err(wrong_login(NAME)),
			Screen::LoggedOut => Err(PfpError::unexpected(login_failed(NAME))),
		}
	}

	async fn perform_verify(&self, page: &dyn Page, challenge: Challenge) -> Result {
		if challenge != Challenge::Totp || !page.is_visible(TOTP_INPUT).await? {
			return Err(missing_totp_input(NAME));
		}

		let code = self.credentials.totp_code(NAME)?;
		type_like_a_human(page, TOTP_INPUT, &code).await?;
		click_when_visible(page, &nth(FORM_BUTTONS, 1)).await?;

		let screen = Transition::new()
			.on(TOTP_ERROR, Screen::Rejected)
			.on(AVATAR, Screen::LoggedIn)
			.wait(page, "Reddit verification")
			.await;

		match or_unexpected(screen, verify_failed(NAME))? {
			Screen::LoggedIn => Ok(()),
			Screen::Rejected => Err(wrong_totp(NAME)),
			_ => Err(PfpError::unexpected(verify_failed(NAME))),
		}
	}

	async fn perform_update(&self, page: &dyn Page, image: &ImageFile) -> Result {
		page.goto(self.descriptor.settings_url).await?;
		let mut responses = page.watch_responses("graphql").await?;

		page.click("div[data-testid=avatar]").await?;
		wait_visible(page, AVATAR_DIALOG).await?;
		page.set_input_files("settings-dropzone input[type=file]", image).await?;
		click_when_visible(page, &nth("#avatar-dialog button", 0)).await?;

		let saved = wait_for_response(responses.as_mut(), "Reddit profile update", ELEMENT_TIMEOUT, profile_updated)
			.await
			.map(|_| ());
		or_unexpected(saved, format!("Unexpected error occurred while trying to update your pfp in {NAME}."))
	}

	fn warning(&self) -> Option<&'static str> {
		Some("You have to click the Reddit logo in the top left corner to bypass Reddit reCAPTCHA while status check.")
	}
}

/// A successful `UpdateProfileStyles` GraphQL mutation.
fn profile_updated(response: &NetworkResponse) -> bool {
	let Some(body) = response.json.as_ref().filter(|_| response.status == 200) else {
		return false;
	};
	body["operation"] == PROFILE_MUTATION && body["data"]["updateProfileStyles"]["ok"] == true
}
