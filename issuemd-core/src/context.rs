use anyhow::Context as _;

use crate::constants::{ENV_API_URL, ENV_CTX_OUT, ENV_DRY_RUN, ENV_GITHUB_TOKEN, GITHUB_API_URL};

/// Environment context packed in structure
///
/// Settings that do not belong in the run configuration file (credentials,
/// test endpoints, debug switches) come from the environment.
#[derive(Clone)]
pub struct Context {
    // From GITHUB_TOKEN, sent as `Authorization: token ...` when set
    pub github_token: Option<String>,

    // From ISSUEMD_API_URL, default https://api.github.com
    pub api_url: String,

    // From ISSUEMD_CTXOUT, log this struct at startup
    pub ctx_out: bool,

    // From ISSUEMD_DRY_RUN, render documents but write nothing
    pub dry_run: bool,
}

impl Default for Context {
    fn default() -> Self {
        Context {
            github_token: None,
            api_url: GITHUB_API_URL.to_string(),
            ctx_out: false,
            dry_run: false,
        }
    }
}

// The token never ends up in logs
impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("github_token", &self.github_token.as_ref().map(|_| "<set>"))
            .field("api_url", &self.api_url)
            .field("ctx_out", &self.ctx_out)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl Context {
    /// Load context from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let mut ctx = Self::default();

        if let Ok(token) = std::env::var(ENV_GITHUB_TOKEN) {
            if !token.trim().is_empty() {
                ctx.github_token = Some(token.trim().to_string());
            }
        }

        if let Ok(api_url) = std::env::var(ENV_API_URL) {
            url::Url::parse(&api_url)
                .with_context(|| format!("{} is not a valid URL: {}", ENV_API_URL, api_url))?;
            ctx.api_url = api_url.trim_end_matches('/').to_string();
        }

        ctx.ctx_out = std::env::var(ENV_CTX_OUT).is_ok();
        ctx.dry_run = std::env::var(ENV_DRY_RUN).is_ok();

        Ok(ctx)
    }
}
