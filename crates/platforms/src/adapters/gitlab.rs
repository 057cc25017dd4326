use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use unipfp::{ApiAdapter, Credentials, ImageFile, PfpError, Result};

const NAME: &str = "GitLab";

pub const DEFAULT_ENDPOINT: &str = "https://gitlab.com/api/v4/user/avatar";

#[derive(Deserialize)]
struct ApiError {
	message: serde_json::Value,
}

/// Uploads the avatar through the REST API with a personal access token.
pub struct GitLab {
	credentials: Credentials,
	endpoint: String,
	client: reqwest::Client,
}

impl GitLab {
	pub fn new(credentials: Credentials) -> Self {
		Self {
			credentials,
			endpoint: DEFAULT_ENDPOINT.to_string(),
			client: reqwest::Client::new(),
		}
	}

	/// Targets a self-managed instance or a test server.
	pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.endpoint = endpoint.into();
		self
	}
}

#[async_trait]
impl ApiAdapter for GitLab {
	fn name(&self) -> &'static str {
		NAME
	}

	fn token(&self) -> Result<&str> {
		self.credentials.require_secret(NAME)
	}

	async fn perform_update(&self, token: &str, image: &ImageFile) -> Result {
		let part = Part::bytes(image.read()?)
			.file_name(image.file_name())
			.mime_str(image.mime_type())
			.map_err(|e| PfpError::Http(e.to_string()))?;
		let form = Form::new().part("avatar", part);

		tracing::debug!(target = "unipfp", endpoint = %self.endpoint, "uploading GitLab avatar");
		let response = self
			.client
			.put(&self.endpoint)
			.header("PRIVATE-TOKEN", token)
			.multipart(form)
			.send()
			.await
			.map_err(|e| PfpError::Http(e.to_string()))?;

		let status = response.status();
		if status.is_success() {
			return Ok(());
		}

		let body = response.text().await.unwrap_or_default();
		let message = match serde_json::from_str::<ApiError>(&body) {
			Ok(ApiError {
				message: serde_json::Value::String(message),
			}) => message,
			Ok(ApiError { message }) => message.to_string(),
			Err(_) => format!("{status}"),
		};

		if status == reqwest::StatusCode::UNAUTHORIZED {
			return Err(PfpError::authentication(format!("GitLab rejected the token: {message}")));
		}
		Err(PfpError::Http(message))
	}
}

#[cfg(test)]
mod tests {
	use unipfp::ErrorKind;

	use super::*;

	fn image(temp: &tempfile::TempDir) -> ImageFile {
		let path = temp.path().join("avatar.png");
		std::fs::write(&path, b"png-bytes").unwrap();
		ImageFile::open(&path).unwrap()
	}

	fn adapter(server: &mockito::Server) -> GitLab {
		GitLab::new(Credentials {
			secret: Some("glpat-secret".into()),
			..Credentials::default()
		})
		.with_endpoint(format!("{}/api/v4/user/avatar", server.url()))
	}

	#[tokio::test]
	async fn uploads_multipart_avatar_with_token_header() {
		let mut server = mockito::Server::new_async().await;
		let mock = server
			.mock("PUT", "/api/v4/user/avatar")
			.match_header("PRIVATE-TOKEN", "glpat-secret")
			.match_header("content-type", mockito::Matcher::Regex("multipart/form-data".into()))
			.match_body(mockito::Matcher::Regex("name=\"avatar\"; filename=\"avatar.png\"".into()))
			.with_status(200)
			.with_body(r#"{"avatar_url":"https://gitlab.com/uploads/avatar.png"}"#)
			.create_async()
			.await;

		let temp = tempfile::TempDir::new().unwrap();
		let gitlab = adapter(&server);
		let token = gitlab.token().unwrap();
		gitlab.perform_update(token, &image(&temp)).await.unwrap();

		mock.assert_async().await;
	}

	#[tokio::test]
	async fn api_error_message_is_surfaced() {
		let mut server = mockito::Server::new_async().await;
		server
			.mock("PUT", "/api/v4/user/avatar")
			.with_status(400)
			.with_body(r#"{"message":"avatar is too big (should be at most 200 KB)"}"#)
			.create_async()
			.await;

		let temp = tempfile::TempDir::new().unwrap();
		let err = adapter(&server).perform_update("glpat-secret", &image(&temp)).await.unwrap_err();

		assert!(matches!(err, PfpError::Http(msg) if msg == "avatar is too big (should be at most 200 KB)"));
	}

	#[tokio::test]
	async fn unauthorized_is_an_authentication_failure() {
		let mut server = mockito::Server::new_async().await;
		server
			.mock("PUT", "/api/v4/user/avatar")
			.with_status(401)
			.with_body(r#"{"message":"401 Unauthorized"}"#)
			.create_async()
			.await;

		let temp = tempfile::TempDir::new().unwrap();
		let err = adapter(&server).perform_update("expired", &image(&temp)).await.unwrap_err();

		assert_eq!(err.kind(), ErrorKind::Authentication);
		assert!(err.to_string().contains("401 Unauthorized"));
	}

	#[test]
	fn missing_token_is_configuration_error() {
		let gitlab = GitLab::new(Credentials::default());
		let err = gitlab.token().unwrap_err();
		assert_eq!(err.kind(), ErrorKind::Configuration);
		assert!(err.to_string().contains("GitLab"));
	}
}
