use async_trait::async_trait;
use unipfp::{
	BrowserAdapter, Challenge, Credentials, ElementState, ImageFile, LoginOutcome, Page, PfpError, PlatformDescriptor,
	Result, Transition,
};

use crate::support::{
	ELEMENT_TIMEOUT, login_failed, missing_totp_input, nth, or_unexpected, type_like_a_human, verify_failed,
	wrong_login, wrong_totp,
};

const NAME: &str = "Instagram";

const LOGIN_SUBMIT: &str = "button[type=submit]";
const PROFILE_PICTURE: &str = "span button img";
pub(crate) const USERNAME: &str = "input[name=username]";
pub(crate) const PASSWORD: &str = "input[name=password]";
const LOGIN_ERROR: &str = "#loginForm span[dir=auto]";
pub(crate) const TOTP_INPUT: &str = "input[name=verificationCode]";
const TOTP_CONFIRM: &str = "form button[type=button]:not(:has(div))";
const TOTP_ERROR: &str = "#twoFactorErrorAlert";

#[derive(Clone, Copy)]
enum Screen {
	LoggedIn,
	LoginForm,
	Rejected,
	Totp,
}

/// Submits the Instagram login form and classifies the result. Threads
/// signs in through the same form, so `platform` names who is logging in
/// and `profile_link` is the element that proves success there.
pub(crate) async fn submit_login(
	page: &dyn Page,
	credentials: &Credentials,
	platform: &str,
	profile_link: &str,
) -> Result<LoginOutcome> {
	let (username, password) = credentials.require_login(NAME)?;

	type_like_a_human(page, USERNAME, username).await?;
	type_like_a_human(page, PASSWORD, password).await?;
	page.click(LOGIN_SUBMIT).await?;

	let screen = Transition::new()
		.on(LOGIN_ERROR, Screen::Rejected)
		.on(profile_link, Screen::LoggedIn)
		.on(TOTP_INPUT, Screen::Totp)
		.wait(page, "Instagram login")
		.await;

	match or_unexpected(screen, login_failed(platform))? {
		Screen::LoggedIn => Ok(LoginOutcome::Authenticated),
		Screen::Totp => Ok(LoginOutcome::NeedsVerification(Challenge::Totp)),
		Screen::Rejected => Err(wrong_login(NAME)),
		Screen::LoginForm => Err(PfpError::unexpected(login_failed(platform))),
	}
}

/// Answers the Instagram two-factor prompt.
pub(crate) async fn submit_totp(page: &dyn Page, credentials: &Credentials, profile_link: &str) -> Result {
	if !page.is_visible(TOTP_INPUT).await? {
		return Err(missing_totp_input(NAME));
	}

	let code = credentials.totp_code(NAME)?;
	type_like_a_human(page, TOTP_INPUT, &code).await?;
	page.click(TOTP_CONFIRM).await?;

	let screen = Transition::new()
		.on(TOTP_ERROR, Screen::Rejected)
		.on(profile_link, Screen::LoggedIn)
		.wait(page, "Instagram verification")
		.await;

	match or_unexpected(screen, verify_failed(NAME))? {
		Screen::LoggedIn => Ok(()),
		Screen::Rejected => Err(wrong_totp(NAME)),
		_ => Err(PfpError::unexpected(verify_failed(NAME))),
	}
}

pub struct Instagram {
	descriptor: PlatformDescriptor,
	credentials: Credentials,
}

impl Instagram {
	pub fn new(credentials: Credentials) -> Self {
		Self {
			descriptor: PlatformDescriptor {
				name: NAME,
				home_url: "https://www.instagram.com/",
				login_url: "https://www.instagram.com/accounts/login",
				settings_url: "https://www.instagram.com/accounts/edit",
				session_key: "instagram",
			},
			credentials,
		}
	}

	fn profile_link(&self) -> Result<String> {
		let username = self.credentials.require_identifier(NAME)?;
		Ok(format!("a[href*=\"{username}\"]"))
	}
}

#[async_trait]
impl BrowserAdapter for Instagram {
	fn descriptor(&self) -> &PlatformDescriptor {
		&self.descriptor
	}

	async fn check_status(&self, page: &dyn Page) -> Result<bool> {
		page.goto(self.descriptor.settings_url).await?;
		let screen = Transition::new()
			.on(PROFILE_PICTURE, Screen::LoggedIn)
			.on(LOGIN_SUBMIT, Screen::LoginForm)
			.wait(page, "Instagram status check")
			.await?;
		Ok(matches!(screen, Screen::LoggedIn))
	}

	async fn perform_login(&self, page: &dyn Page) -> Result<LoginOutcome> {
		let profile_link = self.profile_link()?;
		submit_login(page, &self.credentials, NAME, &profile_link).await
	}

	async fn perform_verify(&self, page: &dyn Page, challenge: Challenge) -> Result {
		if challenge != Challenge::Totp {
			return Err(missing_totp_input(NAME));
		}
		let profile_link = self.profile_link()?;
		submit_totp(page, &self.credentials, &profile_link).await
	}

	async fn perform_update(&self, page: &dyn Page, image: &ImageFile) -> Result {
		page.goto(self.descriptor.settings_url).await?;
		page.set_input_files(&nth("input[type=file]", 0), image).await?;

		or_unexpected(
			page.wait_for("div[role=alert]", ElementState::Visible, ELEMENT_TIMEOUT).await,
			format!("Unexpected error occurred while trying to update your pfp in {NAME}."),
		)
	}
}

#[cfg(test)]
mod tests {
	use unipfp::ErrorKind;
	use unipfp::testing::FakePage;

	use super::*;

	fn adapter() -> Instagram {
		Instagram::new(Credentials::new("sunset.pics", "hunter2").with_totp_secret("JBSWY3DPEHPK3PXP"))
	}

	#[tokio::test]
	async fn login_recognizes_profile_link() {
		let page = FakePage::new()
			.with_visible([USERNAME, PASSWORD])
			.on_click(LOGIN_SUBMIT, ["a[href*=\"sunset.pics\"]"]);

		assert_eq!(adapter().perform_login(&page).await.unwrap(), LoginOutcome::Authenticated);
	}

	#[tokio::test]
	async fn login_error_banner_is_wrong_password() {
		let page = FakePage::new()
			.with_visible([USERNAME, PASSWORD])
			.on_click(LOGIN_SUBMIT, [LOGIN_ERROR]);

		let err = adapter().perform_login(&page).await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Authentication);
		assert!(err.to_string().starts_with("Wrong Instagram username or password"));
	}

	#[tokio::test]
	async fn wrong_code_is_reported() {
		let page = FakePage::new().with_visible([TOTP_INPUT]).on_click(TOTP_CONFIRM, [TOTP_ERROR]);

		let err = adapter().perform_verify(&page, Challenge::Totp).await.unwrap_err();
		assert_eq!(
			err.to_string(),
			"Wrong Instagram TOTP. Please check out your Instagram 2FA secret in your environment file."
		);
	}

	#[tokio::test]
	async fn update_waits_for_confirmation_alert() {
		let temp = tempfile::TempDir::new().unwrap();
		let path = temp.path().join("pfp.jpeg");
		std::fs::write(&path, b"jpeg").unwrap();
		let image = ImageFile::open(&path).unwrap();

		let page = FakePage::new().on_goto("https://www.instagram.com/accounts/edit", ["div[role=alert]"]);
		adapter().perform_update(&page, &image).await.unwrap();

		assert_eq!(page.visited(), ["https://www.instagram.com/accounts/edit"]);
	}
}
