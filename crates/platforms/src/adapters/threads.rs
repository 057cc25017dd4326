use async_trait::async_trait;
use unipfp::{
	BrowserAdapter, Challenge, Credentials, ElementState, ImageFile, LoginOutcome, Page, PlatformDescriptor, Result,
	Transition,
};

use super::instagram;
use crate::support::{ELEMENT_TIMEOUT, click_when_visible, confirm_hidden, missing_totp_input, nth, wait_visible};

const NAME: &str = "Threads";

const PASSWORD: &str = "input[type=password]";
const CONTINUE_WITH_INSTAGRAM: &str = "form div[role=button]:has(i)";

#[derive(Clone, Copy)]
enum Screen {
	LoggedIn,
	LoginForm,
}

/// Threads signs in with the linked Instagram account.
pub struct Threads {
	descriptor: PlatformDescriptor,
	credentials: Credentials,
}

impl Threads {
	pub fn new(credentials: Credentials) -> Self {
		Self {
			descriptor: PlatformDescriptor {
				name: NAME,
				home_url: "https://www.threads.com/",
				login_url: "https://www.threads.com/login",
				settings_url: "https://www.threads.com/",
				session_key: "threads",
			},
			credentials,
		}
	}

	fn username(&self) -> Result<&str> {
		self.credentials.require_identifier("Instagram")
	}

	fn profile_link(&self) -> Result<String> {
		Ok(format!("a[href*=\"{}\"]:has(img)", self.username()?))
	}
}

#[async_trait]
impl BrowserAdapter for Threads {
	fn descriptor(&self) -> &PlatformDescriptor {
		&self.descriptor
	}

	async fn check_status(&self, page: &dyn Page) -> Result<bool> {
		let profile_link = self.profile_link()?;
		page.goto(self.descriptor.login_url).await?;
		let screen = Transition::new()
			.on(PASSWORD, Screen::LoginForm)
			.on(profile_link, Screen::LoggedIn)
			.wait(page, "Threads status check")
			.await?;
		Ok(matches!(screen, Screen::LoggedIn))
	}

	async fn perform_login(&self, page: &dyn Page) -> Result<LoginOutcome> {
		let profile_link = self.profile_link()?;
		click_when_visible(page, CONTINUE_WITH_INSTAGRAM).await?;
		instagram::submit_login(page, &self.credentials, NAME, &profile_link).await
	}

	async fn perform_verify(&self, page: &dyn Page, challenge: Challenge) -> Result {
		if challenge != Challenge::Totp {
			return Err(missing_totp_input(NAME));
		}
		let profile_link = self.profile_link()?;
		instagram::submit_totp(page, &self.credentials, &profile_link).await
	}

	async fn perform_update(&self, page: &dyn Page, image: &ImageFile) -> Result {
		let profile = format!("https://www.threads.com/@{}", self.username()?);
		page.goto(&profile).await?;

		click_when_visible(page, &nth("div[role=region] div[role=button]", 2)).await?;
		let input = nth("input[type=file]", 0);
		page.wait_for(&input, ElementState::Attached, ELEMENT_TIMEOUT).await?;
		page.set_input_files(&input, image).await?;

		let done = nth("div[role=dialog] div[role=button]", -1);
		wait_visible(page, &done).await?;
		page.click(&done).await?;
		confirm_hidden(page, &done, NAME).await
	}

	fn warning(&self) -> Option<&'static str> {
		Some("You must fill in your Instagram username and password since you've selected Threads.")
	}
}

#[cfg(test)]
mod tests {
	use unipfp::ErrorKind;
	use unipfp::testing::{FakePage, PageCall};

	use super::*;

	const PROFILE: &str = "a[href*=\"sunset.pics\"]:has(img)";

	fn adapter() -> Threads {
		Threads::new(Credentials::new("sunset.pics", "hunter2"))
	}

	#[tokio::test]
	async fn status_looks_for_profile_link() {
		let page = FakePage::new().on_goto("https://www.threads.com/login", [PROFILE]);
		assert!(adapter().check_status(&page).await.unwrap());

		let page = FakePage::new().on_goto("https://www.threads.com/login", [PASSWORD]);
		assert!(!adapter().check_status(&page).await.unwrap());
	}

	#[tokio::test]
	async fn login_goes_through_instagram_form() {
		let page = FakePage::new()
			.with_visible([CONTINUE_WITH_INSTAGRAM])
			.on_click(CONTINUE_WITH_INSTAGRAM, [instagram::USERNAME, instagram::PASSWORD])
			.on_click("button[type=submit]", [PROFILE]);

		assert_eq!(adapter().perform_login(&page).await.unwrap(), LoginOutcome::Authenticated);
		assert_eq!(page.typed(instagram::USERNAME), "sunset.pics");
	}

	#[tokio::test]
	async fn login_reports_instagram_totp_prompt() {
		let page = FakePage::new()
			.with_visible([CONTINUE_WITH_INSTAGRAM, instagram::USERNAME, instagram::PASSWORD])
			.on_click("button[type=submit]", [instagram::TOTP_INPUT]);

		let outcome = adapter().perform_login(&page).await.unwrap();
		assert_eq!(outcome, LoginOutcome::NeedsVerification(Challenge::Totp));
	}

	#[tokio::test]
	async fn missing_username_is_reported_against_instagram() {
		let err = Threads::new(Credentials::default())
			.check_status(&FakePage::new())
			.await
			.unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Configuration);
		assert!(err.to_string().contains("Instagram"));
	}

	#[tokio::test]
	async fn update_opens_profile_editor() {
		let edit = "div[role=region] div[role=button] >> nth=2";
		let done = "div[role=dialog] div[role=button] >> nth=-1";
		let page = FakePage::new()
			.on_goto("https://www.threads.com/@sunset.pics", [edit])
			.on_click(edit, ["input[type=file] >> nth=0", done])
			.on_click_replace(done, [], [done]);

		let temp = tempfile::TempDir::new().unwrap();
		let path = temp.path().join("pfp.png");
		std::fs::write(&path, b"png").unwrap();
		let image = ImageFile::open(&path).unwrap();

		adapter().perform_update(&page, &image).await.unwrap();
		assert!(page.calls().contains(&PageCall::Upload {
			selector: "input[type=file] >> nth=0".into(),
			file_name: "pfp.png".into(),
		}));
	}
}
