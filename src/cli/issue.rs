//! Issue command - mints one temporary key

use clap::Args;
use serde::Serialize;

use crate::domain::temp_key::{KeyPermission, TempKeyId, TemporaryCredential};

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Organization the key is scoped to
    #[arg(long)]
    pub organization_id: String,

    /// Key name; defaults to the configured name
    #[arg(long)]
    pub name: Option<String>,

    /// r, w or rw; defaults to w
    #[arg(long)]
    pub permission: Option<KeyPermission>,
}

#[derive(Debug, Serialize)]
struct IssuedKey<'a> {
    id: &'a TempKeyId,
    api_key: &'a str,
}

impl<'a> From<&'a TemporaryCredential> for IssuedKey<'a> {
    fn from(credential: &'a TemporaryCredential) -> Self {
        Self {
            id: credential.id(),
            api_key: credential.api_key(),
        }
    }
}

pub async fn run(args: IssueArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();
    let services = crate::create_services_with_config(&config).await?;

    let credential = services
        .issuer
        .request_credential(&args.organization_id, args.name.as_deref(), args.permission)
        .await?;

    println!("{}", serde_json::to_string_pretty(&IssuedKey::from(&credential))?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_key_json() {
        let id = TempKeyId::new();
        let credential = TemporaryCredential::new("sk-helicone-abc", id);

        let json = serde_json::to_value(IssuedKey::from(&credential)).unwrap();

        assert_eq!(json["api_key"], "sk-helicone-abc");
        assert_eq!(json["id"], id.to_string());
    }
}
