use clap::Subcommand;
use testcrack_core::auth::validate_email;
use testcrack_core::validate_signup;

use super::{prompt, runtime, CmdResult, Context};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Create an account and sign in
    Signup {
        #[arg(long)]
        email: Option<String>,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
        /// Defaults to --password when that is given
        #[arg(long)]
        confirm: Option<String>,
    },
    /// Sign in to an existing account
    Signin {
        #[arg(long)]
        email: Option<String>,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session and preferences
    Logout,
    /// Show who is signed in
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: AuthAction) -> CmdResult {
    let mut ctx = Context::load()?;
    match action {
        AuthAction::Signup {
            email,
            password,
            confirm,
        } => {
            ctx.session.require_anonymous()?;
            let email = match email {
                Some(e) => e,
                None => prompt("Email: ")?,
            };
            let (password, confirm) = match (password, confirm) {
                (Some(p), Some(c)) => (p, c),
                (Some(p), None) => (p.clone(), p),
                (None, _) => (prompt("Password: ")?, prompt("Confirm password: ")?),
            };
            validate_signup(&email, &password, &confirm)?;

            let api = ctx.api()?;
            let grant = runtime()?.block_on(api.signup(&email, &password))?;
            ctx.session.login(&grant.token, grant.user)?;
            println!("account created; signed in as {}", display_name(&ctx));
        }
        AuthAction::Signin { email, password } => {
            ctx.session.require_anonymous()?;
            let email = match email {
                Some(e) => e,
                None => prompt("Email: ")?,
            };
            validate_email(&email)?;
            let password = match password {
                Some(p) => p,
                None => prompt("Password: ")?,
            };
            if password.is_empty() {
                return Err("password is required".into());
            }

            let api = ctx.api()?;
            let grant = runtime()?.block_on(api.signin(&email, &password))?;
            ctx.session.login(&grant.token, grant.user)?;
            println!("signed in as {}", display_name(&ctx));
        }
        AuthAction::Logout => {
            ctx.session.logout()?;
            println!("signed out");
        }
        AuthAction::Status { json } => {
            if json {
                let status = serde_json::json!({
                    "authenticated": ctx.session.is_authenticated(),
                    "user": ctx.session.user(),
                    "preferences": ctx.session.preferences(),
                });
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else if ctx.session.is_authenticated() {
                println!("signed in as {}", display_name(&ctx));
            } else {
                println!("not signed in");
            }
        }
    }
    Ok(())
}

fn display_name(ctx: &Context) -> String {
    match ctx.session.user() {
        Some(user) if user.name.is_some() => format!("{} <{}>", user.display_name(), user.email),
        Some(user) => user.email.clone(),
        None => "unknown user".to_string(),
    }
}
