use async_trait::async_trait;
use unipfp::{
	BrowserAdapter, Challenge, Credentials, ImageFile, LoginOutcome, Page, PfpError, PlatformDescriptor, Result,
	Transition,
};

use crate::support::{
	click_when_visible, confirm_hidden, in_frame, login_failed, missing_totp_input, nth, or_unexpected,
	type_like_a_human, verify_failed, wrong_login, wrong_totp,
};

const NAME: &str = "Plex";

/// The sign-in form lives in this iframe.
const FRAME: &str = "#iFrameResizer0";
const USER_LIST: &str = "ul.user-select-list";
const USER_NAMES: &str = "div.username, div.managed-title";
const ACCOUNT_MENU: &str = "button[data-testid=navbarAccountMenuTrigger]";
const FORM_ERROR: &str = "span[style*=\"color: rgb(240, 100, 100);\"]";

#[derive(Clone, Copy)]
enum Screen {
	LoginFrame,
	LoggedIn,
	UserList,
	Rejected,
	Totp,
}

pub struct Plex {
	descriptor: PlatformDescriptor,
	credentials: Credentials,
}

impl Plex {
	pub fn new(credentials: Credentials) -> Self {
		Self {
			descriptor: PlatformDescriptor {
				name: NAME,
				home_url: "https://app.plex.tv/desktop/#!/",
				login_url: "https://app.plex.tv/desktop/#!/login",
				settings_url: "https://app.plex.tv/desktop/#!/settings/account",
				session_key: "plex",
			},
			credentials,
		}
	}

	/// Picks `username` on the managed-user screen of a Plex Home.
	async fn select_user(&self, page: &dyn Page, username: &str) -> Result {
		let total = page.count(USER_NAMES).await?;
		for index in 0..total {
			let entry = nth(USER_NAMES, index as i32);
			if page.inner_text(&entry).await?.trim() == username {
				tracing::debug!(target = "unipfp", index, "selecting Plex home user");
				return page.click(&entry).await;
			}
		}

		Err(PfpError::config(
			"Could not find the username while trying to select user in Plex. Please check out your environment file.",
		))
	}
}

#[async_trait]
impl BrowserAdapter for Plex {
	fn descriptor(&self) -> &PlatformDescriptor {
		&self.descriptor
	}

	async fn check_status(&self, page: &dyn Page) -> Result<bool> {
		let username = self.credentials.require_identifier(NAME)?;
		page.goto(self.descriptor.login_url).await?;

		let screen = Transition::new()
			.on(USER_LIST, Screen::UserList)
			.on(format!("a[href*=\"{username}\"]"), Screen::LoggedIn)
			.on(FRAME, Screen::LoginFrame)
			.wait(page, "Plex status check")
			.await?;

		match screen {
			Screen::UserList => {
				self.select_user(page, username).await?;
				Ok(true)
			}
			Screen::LoginFrame => Ok(false),
			_ => Ok(true),
		}
	}

	async fn perform_login(&self, page: &dyn Page) -> Result<LoginOutcome> {
		let (email, password) = self.credentials.require_login(NAME)?;

		click_when_visible(page, &in_frame(FRAME, "button[data-testid=signIn--email]")).await?;
		type_like_a_human(page, &in_frame(FRAME, "#email"), email).await?;
		type_like_a_human(page, &in_frame(FRAME, "#password"), password).await?;
		page.click(&in_frame(FRAME, "button[data-testid=signIn--submit]")).await?;

		let screen = Transition::new()
			.on(in_frame(FRAME, FORM_ERROR), Screen::Rejected)
			.on(ACCOUNT_MENU, Screen::LoggedIn)
			.on(in_frame(FRAME, "#verificationCode"), Screen::Totp)
			.wait(page, "Plex login")
			.await;

		match or_unexpected(screen, login_failed(NAME))? {
			Screen::LoggedIn => Ok(LoginOutcome::Authenticated),
			Screen::Totp => Ok(LoginOutcome::NeedsVerification(Challenge::Totp)),
			Screen::Rejected => Err(wrong_login(NAME)),
			_ => Err(PfpError::unexpected(login_failed(NAME))),
		}
	}

	async fn perform_verify(&self, page: &dyn Page, challenge: Challenge) -> Result {
		let totp_input = in_frame(FRAME, "#verificationCode");
		if challenge != Challenge::Totp || !page.is_visible(&totp_input).await? {
			return Err(missing_totp_input(NAME));
		}

		let code = self.credentials.totp_code(NAME)?;
		type_like_a_human(page, &totp_input, &code).await?;
		page.click(&in_frame(FRAME, "button[type=submit]")).await?;

		let screen = Transition::new()
			.on(in_frame(FRAME, FORM_ERROR), Screen::Rejected)
			.on(ACCOUNT_MENU, Screen::LoggedIn)
			.wait(page, "Plex verification")
			.await;

		match or_unexpected(screen, verify_failed(NAME))? {
			Screen::LoggedIn => Ok(()),
			Screen::Rejected => Err(wrong_totp(NAME)),
			_ => Err(PfpError::unexpected(verify_failed(NAME))),
		}
	}

	async fn perform_update(&self, page: &dyn Page, image: &ImageFile) -> Result {
		// A "server unavailable" modal sometimes covers the navbar.
		let dismiss = nth("button[data-dismiss=modal]", 0);
		if page.is_visible(&dismiss).await? {
			page.click(&dismiss).await?;
		}

		page.click(ACCOUNT_MENU).await?;
		click_when_visible(page, "a[href*=\"settings/account\"]").await?;
		click_when_visible(page, "div[class*=AvatarImg]").await?;
		page.set_input_files("input[type=file]", image).await?;

		click_when_visible(page, "button[type=submit]").await?;
		confirm_hidden(page, "button[type=submit]", NAME).await
	}
}

#[cfg(test)]
mod tests {
	use unipfp::ErrorKind;
	use unipfp::testing::FakePage;

	use super::*;

	const LOGIN_URL: &str = "https://app.plex.tv/desktop/#!/login";

	fn adapter() -> Plex {
		Plex::new(Credentials::new("moviebuff", "hunter2").with_totp_secret("JBSWY3DPEHPK3PXP"))
	}

	#[tokio::test]
	async fn sign_in_frame_means_logged_out() {
		let page = FakePage::new().on_goto(LOGIN_URL, [FRAME]);
		assert!(!adapter().check_status(&page).await.unwrap());
	}

	#[tokio::test]
	async fn home_user_is_picked_by_name() {
		let page = FakePage::new()
			.on_goto(LOGIN_URL, [USER_LIST])
			.with_count(USER_NAMES, 3)
			.with_text("div.username, div.managed-title >> nth=0", "Kids")
			.with_text("div.username, div.managed-title >> nth=1", " moviebuff ")
			.with_text("div.username, div.managed-title >> nth=2", "Guest");

		assert!(adapter().check_status(&page).await.unwrap());
		assert!(page.clicked("div.username, div.managed-title >> nth=1"));
	}

	#[tokio::test]
	async fn unknown_home_user_is_an_error() {
		let page = FakePage::new()
			.on_goto(LOGIN_URL, [USER_LIST])
			.with_count(USER_NAMES, 1)
			.with_text("div.username, div.managed-title >> nth=0", "Kids");

		let err = adapter().check_status(&page).await.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Configuration);
		assert!(err.to_string().starts_with("Could not find the username while trying to select user in Plex."));
	}

	#[tokio::test]
	async fn login_types_inside_the_frame() {
		let email = in_frame(FRAME, "#email");
		let sign_in = in_frame(FRAME, "button[data-testid=signIn--email]");
		let submit = in_frame(FRAME, "button[data-testid=signIn--submit]");
		let verification = in_frame(FRAME, "#verificationCode");
		let page = FakePage::new()
			.with_visible([sign_in.as_str()])
			.on_click(&sign_in, [email.as_str(), "#iFrameResizer0 >> internal:control=enter-frame >> #password"])
			.on_click(&submit, [verification.as_str()]);

		let outcome = adapter().perform_login(&page).await.unwrap();
		assert_eq!(outcome, LoginOutcome::NeedsVerification(Challenge::Totp));
		assert_eq!(page.typed(&email), "moviebuff");

		page.show(ACCOUNT_MENU);
		adapter().perform_verify(&page, Challenge::Totp).await.unwrap();
		assert_eq!(page.typed(&verification).len(), 6);
	}

	#[tokio::test]
	async fn update_dismisses_modal_first() {
		let dismiss = "button[data-dismiss=modal] >> nth=0";
		let page = FakePage::new()
			.with_visible([dismiss])
			.on_click(ACCOUNT_MENU, ["a[href*=\"settings/account\"]"])
			.on_click("a[href*=\"settings/account\"]", ["div[class*=AvatarImg]"])
			.on_click("div[class*=AvatarImg]", ["button[type=submit]"])
			.on_click_replace("button[type=submit]", [], ["button[type=submit]"]);

		let temp = tempfile::TempDir::new().unwrap();
		let path = temp.path().join("poster.jpg");
		std::fs::write(&path, b"jpg").unwrap();
		let image = ImageFile::open(&path).unwrap();

		adapter().perform_update(&page, &image).await.unwrap();
		assert!(page.clicked(dismiss));
		assert!(page.clicked("button[type=submit]"));
	}
}
