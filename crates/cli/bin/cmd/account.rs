use alloy_primitives::Address;
use clap::Parser;
use eyre::Result;
use metaswap_cli::{context::App, utils};

/// CLI arguments for `metaswap login`.
#[derive(Clone, Debug, Parser)]
pub struct LoginArgs {
    /// The remote signer user.
    #[arg(long, value_name = "ID")]
    pub user_id: String,

    /// The user's organization. Defaults to the one stored for the user, then the configured one.
    #[arg(long, value_name = "ID")]
    pub organization_id: Option<String>,

    /// The address of the user's signing key.
    #[arg(long, value_name = "ADDRESS")]
    pub address: Address,
}

impl LoginArgs {
    pub fn run(self, mut app: App) -> Result<()> {
        let organization_id = self
            .organization_id
            .or_else(|| app.session.organization_for(&self.user_id).map(str::to_string))
            .or_else(|| app.config.remote_signer.organization_id.clone());
        let account = app.session.login_remote(self.address, &self.user_id, organization_id)?;

        if app.global.json {
            return utils::print_json(&account);
        }
        match &account.auth {
            Some(auth) => {
                println!("Logged in {} (organization {})", account.address, auth.organization_id)
            }
            None => {
                println!("Logged in {}", account.address);
                eprintln!("No organization is known for this user, pass --organization-id to sign");
            }
        }
        Ok(())
    }
}

/// CLI arguments for `metaswap logout`.
#[derive(Clone, Debug, Parser)]
pub struct LogoutArgs {}

impl LogoutArgs {
    pub fn run(self, mut app: App) -> Result<()> {
        let account = app.session.logout()?;
        if app.global.json {
            return utils::print_json(&account);
        }
        match account {
            Some(account) => println!("Logged out {}", account.address),
            None => println!("No account was connected"),
        }
        Ok(())
    }
}
