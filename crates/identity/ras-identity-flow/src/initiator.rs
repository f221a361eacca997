//! Provider dispatch and the side-effecting login entry points.

use crate::MaybeSendSync;
use crate::client::FlowClient;
use crate::error::FlowResult;
use crate::logging::FlowLogger;
use crate::provider::{ProviderConfig, SamlProviderConfig};
use crate::types::AuthorizationTarget;
use serde_json::json;

/// Host navigation capability
pub trait Navigator: MaybeSendSync {
    /// Send the current tab to `url`
    fn navigate(&self, url: &str) -> FlowResult<()>;

    /// Inject and submit a self-posting form. Must fail with
    /// [`crate::FlowError::NavigationBlocked`] when the host refuses.
    fn submit_form(&self, html: &str) -> FlowResult<()>;
}

impl FlowClient {
    /// Build the start of a login for any provider configuration.
    ///
    /// Only OIDC configurations suspend (on discovery); every other variant
    /// completes without awaiting.
    pub async fn build_authorization(
        &self,
        provider: &ProviderConfig,
    ) -> FlowResult<AuthorizationTarget> {
        match provider {
            ProviderConfig::OAuth2(config) => {
                Ok(AuthorizationTarget::Redirect(self.build_oauth2_url(config)?))
            }
            ProviderConfig::CustomOAuth2(config) => Ok(AuthorizationTarget::Redirect(
                self.build_custom_oauth2_url(config)?,
            )),
            ProviderConfig::Oidc(config) => {
                Ok(AuthorizationTarget::Redirect(self.build_oidc_url(config).await?))
            }
            ProviderConfig::Saml(config) => Ok(AuthorizationTarget::Redirect(
                self.build_saml_redirect_url(config)?,
            )),
        }
    }

    /// Build and perform a login for any provider configuration
    pub async fn initiate_login(
        &self,
        provider: &ProviderConfig,
        navigator: &dyn Navigator,
    ) -> FlowResult<()> {
        match self.build_authorization(provider).await? {
            AuthorizationTarget::Redirect(url) => navigator.navigate(&url),
            AuthorizationTarget::PostForm(html) => navigator.submit_form(&html),
        }
    }

    /// SAML login over the HTTP-Redirect binding
    pub fn initiate_saml_login(
        &self,
        config: &SamlProviderConfig,
        navigator: &dyn Navigator,
    ) -> FlowResult<()> {
        let url = self.build_saml_redirect_url(config)?;
        navigator.navigate(&url)
    }

    /// SAML login over the HTTP-POST binding, for IdPs that reject redirects
    pub fn initiate_saml_post_login(
        &self,
        config: &SamlProviderConfig,
        navigator: &dyn Navigator,
    ) -> FlowResult<()> {
        let form = self.build_saml_post_form(config)?;
        navigator.submit_form(&form).inspect_err(|e| {
            FlowLogger::SAML.error(
                "Could not submit POST binding form",
                json!({ "error": e.to_string() }),
            );
        })
    }
}
