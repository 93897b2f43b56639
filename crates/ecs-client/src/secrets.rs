//! Types for working with ECS API credentials

const PROJECT_ID_HEADER: &str = "X-Project-Id";
const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// A method for authenticating to the ECS API
#[derive(Clone)]
pub enum EcsAuth {
    /// No authentication headers are sent. Useful behind an authenticating
    /// proxy and in tests.
    Anonymous,
    /// An IAM token, sent as `X-Auth-Token`
    Token(String),
}

impl std::fmt::Debug for EcsAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EcsAuth::Anonymous => write!(f, "Anonymous"),
            EcsAuth::Token(_) => write!(f, "Token(<redacted>)"),
        }
    }
}

/// Credentials scoping every request to a project.
///
/// Regional services such as ECS are project scoped, so a project ID is
/// always required.
#[derive(Clone, Debug)]
pub struct Credentials {
    project_id: String,
    auth: EcsAuth,
}

impl Credentials {
    /// Start building credentials
    pub fn builder() -> CredentialsBuilder {
        CredentialsBuilder::default()
    }

    /// The project every request is scoped to
    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

/// Builder for [`Credentials`]
#[derive(Default)]
pub struct CredentialsBuilder {
    project_id: Option<String>,
    token: Option<String>,
}

impl CredentialsBuilder {
    /// Set the project ID
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Authenticate with an IAM token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build the credentials. Fails if no project ID was given.
    pub fn build(self) -> Result<Credentials, crate::Error> {
        let project_id = self
            .project_id
            .filter(|p| !p.is_empty())
            .ok_or_else(|| crate::Error::InvalidConfig("project ID is required".to_owned()))?;
        let auth = match self.token {
            Some(t) if !t.is_empty() => EcsAuth::Token(t),
            _ => EcsAuth::Anonymous,
        };
        Ok(Credentials { project_id, auth })
    }
}

pub(crate) trait Authenticable {
    fn apply_authentication(self, credentials: &Credentials) -> Self;
}

impl Authenticable for reqwest::RequestBuilder {
    fn apply_authentication(self, credentials: &Credentials) -> Self {
        let builder = self.header(PROJECT_ID_HEADER, credentials.project_id.as_str());
        match &credentials.auth {
            EcsAuth::Anonymous => builder,
            EcsAuth::Token(token) => builder.header(AUTH_TOKEN_HEADER, token.as_str()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_project_id_required() {
        assert!(Credentials::builder().build().is_err());
        assert!(Credentials::builder().with_project_id("").build().is_err());
    }

    #[test]
    fn test_apply_token() -> Result<(), anyhow::Error> {
        let credentials = Credentials::builder()
            .with_project_id("p-1")
            .with_token("secret")
            .build()?;
        let request = reqwest::Client::new()
            .get("https://ecs.example.com/v1")
            .apply_authentication(&credentials)
            .build()?;
        assert_eq!(request.headers()[PROJECT_ID_HEADER], "p-1");
        assert_eq!(request.headers()[AUTH_TOKEN_HEADER], "secret");
        Ok(())
    }

    #[test]
    fn test_empty_token_is_anonymous() -> Result<(), anyhow::Error> {
        let credentials = Credentials::builder()
            .with_project_id("p-1")
            .with_token("")
            .build()?;
        let request = reqwest::Client::new()
            .get("https://ecs.example.com/v1")
            .apply_authentication(&credentials)
            .build()?;
        assert!(!request.headers().contains_key(AUTH_TOKEN_HEADER));
        assert_eq!("Anonymous", format!("{:?}", credentials.auth));
        Ok(())
    }
}
