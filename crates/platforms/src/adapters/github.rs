use async_trait::async_trait;
use unipfp::{
	BrowserAdapter, Challenge, Credentials, ImageFile, LoginOutcome, Page, PfpError, PlatformDescriptor, Result,
	Transition,
};

use crate::support::{
	click_when_visible, confirm_hidden, login_failed, missing_totp_input, or_unexpected, type_like_a_human,
	verify_failed, wrong_login, wrong_totp,
};

const NAME: &str = "GitHub";

const LOGGED_OUT: &str = "body.logged-out";
const LOGGED_IN: &str = "body.logged-in";
const LOGIN_FIELD: &str = "#login_field";
const PASSWORD: &str = "#password";
const SUBMIT: &str = "input[type=\"submit\"]";
const FLASH_ERROR: &str = "#js-flash-container .flash-error";
const TOTP_INPUT: &str = "#app_totp";
const AVATAR_INPUT: &str = "input[type=\"file\"]#avatar_upload";
const SET_AVATAR: &str = "button:has-text(\"Set new profile picture\")";

#[derive(Clone, Copy)]
enum Screen {
	LoggedIn,
	LoggedOut,
	Rejected,
	Totp,
}

pub struct GitHub {
	descriptor: PlatformDescriptor,
	credentials: Credentials,
}

impl GitHub {
	pub fn new(credentials: Credentials) -> Self {
		Self {
			descriptor: PlatformDescriptor {
				name: NAME,
				home_url: "https://github.com/",
				login_url: "https://github.com/login",
				settings_url: "https://github.com/settings/profile",
				session_key: "github",
			},
			credentials,
		}
	}
}

#[async_trait]
impl BrowserAdapter for GitHub {
	fn descriptor(&self) -> &PlatformDescriptor {
		&self.descriptor
	}

	async fn check_status(&self, page: &dyn Page) -> Result<bool> {
		page.goto(self.descriptor.login_url).await?;
		let screen = Transition::new()
			.on(LOGGED_OUT, Screen::LoggedOut)
			.on(LOGGED_IN, Screen::LoggedIn)
			.wait(page, "GitHub status check")
			.await?;
		Ok(matches!(screen, Screen::LoggedIn))
	}

	async fn perform_login(&self, page: &dyn Page) -> Result<LoginOutcome> {
		let (username, password) = self.credentials.require_login(NAME)?;

		page.goto(self.descriptor.login_url).await?;
		type_like_a_human(page, LOGIN_FIELD, username).await?;
		type_like_a_human(page, PASSWORD, password).await?;
		page.click(SUBMIT).await?;

		let screen = Transition::new()
			.on(FLASH_ERROR, Screen::Rejected)
			.on(TOTP_INPUT, Screen::Totp)
			.on(LOGGED_IN, Screen::LoggedIn)
			.wait(page, "GitHub login")
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

		// The form submits itself once six digits are entered.
		let code = self.credentials.totp_code(NAME)?;
		type_like_a_human(page, TOTP_INPUT, &code).await?;

		let screen = Transition::new()
			.on(FLASH_ERROR, Screen::Rejected)
			.on(LOGGED_IN, Screen::LoggedIn)
			.wait(page, "GitHub verification")
			.await;

		match or_unexpected(screen, verify_failed(NAME))? {
			Screen::LoggedIn => Ok(()),
			Screen::Rejected => Err(wrong_totp(NAME)),
			_ => Err(PfpError::unexpected(verify_failed(NAME))),
		}
	}

	async fn perform_update(&self, page: &dyn Page, image: &ImageFile) -> Result {
		page.goto(self.descriptor.settings_url).await?;
		page.set_input_files(AVATAR_INPUT, image).await?;

		click_when_visible(page, SET_AVATAR).await?;
		confirm_hidden(page, SET_AVATAR, NAME).await
	}
}

#[cfg(test)]
mod tests {
	use unipfp::testing::{FakePage, PageCall};

	use super::*;

	fn adapter() -> GitHub {
		GitHub::new(Credentials::new("octocat", "hunter2").with_totp_secret("GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ"))
	}

	#[tokio::test]
	async fn logged_out_body_means_no_session() {
		let page = FakePage::new().on_goto("https://github.com/login", [LOGGED_OUT]);
		assert!(!adapter().check_status(&page).await.unwrap());

		let page = FakePage::new().on_goto("https://github.com/login", [LOGGED_IN]);
		assert!(adapter().check_status(&page).await.unwrap());
	}

	#[tokio::test]
	async fn successful_login_is_authenticated() {
		let page = FakePage::new()
			.on_goto("https://github.com/login", [LOGIN_FIELD, PASSWORD])
			.on_click(SUBMIT, [LOGGED_IN]);

		assert_eq!(adapter().perform_login(&page).await.unwrap(), LoginOutcome::Authenticated);
		assert_eq!(page.typed(LOGIN_FIELD), "octocat");
	}

	#[tokio::test]
	async fn flash_error_is_wrong_password() {
		let page = FakePage::new()
			.on_goto("https://github.com/login", [LOGIN_FIELD, PASSWORD])
			.on_click(SUBMIT, [FLASH_ERROR]);

		let err = adapter().perform_login(&page).await.unwrap_err();
		assert_eq!(err.to_string(), "Wrong GitHub username or password. Please check out your environment file.");
	}

	#[tokio::test]
	async fn app_totp_prompt_is_verified() {
		let page = FakePage::new()
			.on_goto("https://github.com/login", [LOGIN_FIELD, PASSWORD])
			.on_click(SUBMIT, [TOTP_INPUT]);

		let outcome = adapter().perform_login(&page).await.unwrap();
		assert_eq!(outcome, LoginOutcome::NeedsVerification(Challenge::Totp));

		page.show(LOGGED_IN);
		adapter().perform_verify(&page, Challenge::Totp).await.unwrap();
		assert_eq!(page.typed(TOTP_INPUT).len(), 6);
	}

	#[tokio::test]
	async fn update_uploads_then_confirms() {
		let page = FakePage::new().on_goto("https://github.com/settings/profile", [SET_AVATAR]);
		let temp = tempfile::TempDir::new().unwrap();
		let path = temp.path().join("me.gif");
		std::fs::write(&path, b"GIF89a").unwrap();
		let image = ImageFile::open(&path).unwrap();

		// Saving closes the crop dialog.
		let page = page.on_click_replace(SET_AVATAR, [], [SET_AVATAR]);
		adapter().perform_update(&page, &image).await.unwrap();

		assert!(page.calls().contains(&PageCall::Upload {
			selector: AVATAR_INPUT.to_string(),
			file_name: "me.gif".to_string(),
		}));
		assert!(page.clicked(SET_AVATAR));
	}
}
