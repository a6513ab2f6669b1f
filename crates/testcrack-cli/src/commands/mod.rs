pub mod assess;
pub mod auth;
pub mod config;
pub mod progress;

use std::io::{BufRead, Write};

use testcrack_core::{ApiClient, AuthSession, Config};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Configuration plus the signed-in user, loaded once per command.
pub struct Context {
    pub config: Config,
    pub session: AuthSession,
}

impl Context {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let session = AuthSession::load(config.credential_store()?)?;
        Ok(Self { config, session })
    }

    /// Client carrying the current token, if any.
    pub fn api(&self) -> Result<ApiClient, Box<dyn std::error::Error>> {
        Ok(ApiClient::from_config(&self.config, self.session.token())?)
    }

    /// The service refused our token: forget it and tell the user.
    pub fn expire_session(&mut self) -> Box<dyn std::error::Error> {
        if let Err(e) = self.session.logout() {
            tracing::warn!(error = %e, "failed to clear expired credentials");
        }
        "session expired; sign in again with `testcrack auth signin`".into()
    }
}

pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Print `label` to stderr and read one line from stdin, newline stripped.
pub fn prompt(label: &str) -> std::io::Result<String> {
    let mut err = std::io::stderr();
    write!(err, "{label}")?;
    err.flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
