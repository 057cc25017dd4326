//! Helpers shared by the browser adapters.

use std::time::Duration;

use rand::Rng;
use unipfp::{ElementState, Page, PfpError, Result};

/// Timeout for elements an adapter expects to appear.
pub const ELEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Waits for `selector` and types `text` with a random 50-150 ms delay per key.
pub async fn type_like_a_human(page: &dyn Page, selector: &str, text: &str) -> Result {
	page.wait_for(selector, ElementState::Visible, ELEMENT_TIMEOUT).await?;
	let delay = Duration::from_millis(rand::rng().random_range(50..150));
	page.type_text(selector, text, delay).await
}

pub async fn wait_visible(page: &dyn Page, selector: &str) -> Result {
	page.wait_for(selector, ElementState::Visible, ELEMENT_TIMEOUT).await
}

/// Clicks `selector` once it is visible.
pub async fn click_when_visible(page: &dyn Page, selector: &str) -> Result {
	wait_visible(page, selector).await?;
	page.click(selector).await
}

/// Replaces a timeout with the adapter's own message.
pub fn or_unexpected<T>(result: Result<T>, message: impl Into<String>) -> Result<T> {
	match result {
		Err(PfpError::Timeout(detail)) => {
			tracing::debug!(target = "unipfp", %detail, "wait timed out");
			Err(PfpError::UnexpectedState(message.into()))
		}
		other => other,
	}
}

/// Waits until `selector` disappears, which is how most sites confirm a save.
pub async fn confirm_hidden(page: &dyn Page, selector: &str, platform: &str) -> Result {
	or_unexpected(
		page.wait_for(selector, ElementState::Hidden, ELEMENT_TIMEOUT).await,
		format!("Unexpected error occurred while trying to update your pfp in {platform}."),
	)
}

/// Scopes `selector` to the document of the iframe matched by `frame`.
pub fn in_frame(frame: &str, selector: &str) -> String {
	format!("{frame} >> internal:control=enter-frame >> {selector}")
}

/// The `index`-th match of `selector`; negative counts from the end.
pub fn nth(selector: &str, index: i32) -> String {
	format!("{selector} >> nth={index}")
}

pub fn login_failed(platform: &str) -> String {
	format!("Unexpected error occurred while trying to log into {platform}.")
}

pub fn verify_failed(platform: &str) -> String {
	format!("Unexpected error occurred while trying to verify in {platform}.")
}

pub fn wrong_login(platform: &str) -> PfpError {
	PfpError::authentication(format!(
		"Wrong {platform} username or password. Please check out your environment file."
	))
}

pub fn wrong_totp(platform: &str) -> PfpError {
	PfpError::authentication(format!(
		"Wrong {platform} TOTP. Please check out your {platform} 2FA secret in your environment file."
	))
}

pub fn missing_totp_input(platform: &str) -> PfpError {
	PfpError::unexpected(format!(
		"Expected to find the TOTP input, but it was not found while trying to verify in {platform}."
	))
}
