//! Prints the authorization URLs a login page would navigate to.
//!
//! Run with `RUST_LOG=debug` to see the flow logs.

use ras_identity_flow::{
    BuiltInProvider, FlowClient, FlowConfig, OAuth2ProviderConfig, ProviderConfig,
    SamlProviderConfig,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = FlowClient::in_memory(FlowConfig::new("http://localhost:3000").with_pkce(true));

    let providers = [
        ProviderConfig::OAuth2(OAuth2ProviderConfig::new(
            BuiltInProvider::Google,
            "my-google-client-id",
        )),
        ProviderConfig::Saml(SamlProviderConfig::new(
            "https://idp.example.com/sso",
            "http://localhost:3000/saml/metadata",
            "http://localhost:3000/saml/acs",
        )),
    ];

    for provider in &providers {
        let target = client.build_authorization(provider).await?;
        println!("{}: {:?}", provider.tag(), target);
    }

    Ok(())
}
