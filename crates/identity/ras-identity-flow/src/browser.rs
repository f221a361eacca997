//! Browser host bindings using web-sys

use crate::client::FlowClient;
use crate::config::FlowConfig;
use crate::error::{FlowError, FlowResult};
use crate::fetch::ReqwestFetcher;
use crate::initiator::Navigator;
use crate::random::OsRandomSource;
use crate::saml::POST_FORM_ID;
use crate::store::FlowStorage;
use std::sync::Arc;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlFormElement, Storage, Window};

fn describe(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}

fn window() -> FlowResult<Window> {
    web_sys::window()
        .ok_or_else(|| FlowError::NavigationBlocked("no window available".to_string()))
}

fn document() -> FlowResult<Document> {
    window()?
        .document()
        .ok_or_else(|| FlowError::NavigationBlocked("no document available".to_string()))
}

/// Origin of the page the client runs in, e.g. `https://app.example`
pub fn current_origin() -> FlowResult<String> {
    window()?
        .location()
        .origin()
        .map_err(|e| FlowError::ConfigError(format!("cannot read origin: {}", describe(&e))))
}

/// `window.sessionStorage` as a [`FlowStorage`] backend
pub struct SessionStorageBackend {
    storage: Storage,
}

impl SessionStorageBackend {
    pub fn new() -> FlowResult<Self> {
        let storage = web_sys::window()
            .ok_or_else(|| FlowError::StorageError("no window available".to_string()))?
            .session_storage()
            .map_err(|e| FlowError::StorageError(describe(&e)))?
            .ok_or_else(|| FlowError::StorageError("sessionStorage is disabled".to_string()))?;

        Ok(Self { storage })
    }
}

impl FlowStorage for SessionStorageBackend {
    fn get_item(&self, key: &str) -> FlowResult<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| FlowError::StorageError(describe(&e)))
    }

    fn set_item(&self, key: &str, value: &str) -> FlowResult<()> {
        self.storage
            .set_item(key, value)
            .map_err(|e| FlowError::StorageError(describe(&e)))
    }

    fn remove_item(&self, key: &str) -> FlowResult<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| FlowError::StorageError(describe(&e)))
    }
}

/// Navigates the current tab
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn navigate(&self, url: &str) -> FlowResult<()> {
        window()?
            .location()
            .set_href(url)
            .map_err(|e| FlowError::NavigationBlocked(describe(&e)))
    }

    fn submit_form(&self, html: &str) -> FlowResult<()> {
        let document = document()?;
        let body = document
            .body()
            .ok_or_else(|| FlowError::NavigationBlocked("document has no body".to_string()))?;

        let container = document
            .create_element("div")
            .map_err(|e| FlowError::NavigationBlocked(describe(&e)))?;
        // Scripts inserted through innerHTML never run, so the form is submitted here
        container.set_inner_html(html);
        body.append_child(&container)
            .map_err(|e| FlowError::NavigationBlocked(describe(&e)))?;

        let form = document
            .get_element_by_id(POST_FORM_ID)
            .and_then(|element| element.dyn_into::<HtmlFormElement>().ok())
            .ok_or_else(|| {
                FlowError::NavigationBlocked(format!("form #{} was not injected", POST_FORM_ID))
            })?;

        form.submit()
            .map_err(|e| FlowError::NavigationBlocked(describe(&e)))
    }
}

impl FlowClient {
    /// Client backed by `sessionStorage`, `crypto.getRandomValues` and `fetch`
    pub fn browser(config: FlowConfig) -> FlowResult<Self> {
        Ok(Self::new(
            config,
            Arc::new(SessionStorageBackend::new()?),
            Arc::new(OsRandomSource),
            Arc::new(ReqwestFetcher::new()),
        ))
    }

    /// [`FlowClient::browser`] with the origin taken from the current page
    pub fn for_current_page() -> FlowResult<Self> {
        Self::browser(FlowConfig::new(current_origin()?))
    }
}
