//! DOM extraction for rendered transaction pages
//!
//! The browser strategy snapshots the rendered page HTML and looks up the
//! sender and receiver nodes with structural CSS locators.

use crate::config::BrowserSettings;
use crate::BridgeError;
use scraper::{Html, Selector};

/// Compiled locators for the two address nodes
#[derive(Debug, Clone)]
pub struct AddressSelectors {
    sender: (String, Selector),
    receiver: (String, Selector),
}

impl AddressSelectors {
    /// Compiles the sender/receiver locators
    pub fn new(sender: &str, receiver: &str) -> Result<Self, BridgeError> {
        Ok(Self {
            sender: (sender.to_string(), compile(sender)?),
            receiver: (receiver.to_string(), compile(receiver)?),
        })
    }

    pub fn from_settings(settings: &BrowserSettings) -> Result<Self, BridgeError> {
        Self::new(&settings.sender_selector, &settings.receiver_selector)
    }

    pub fn sender(&self) -> (&str, &Selector) {
        (&self.sender.0, &self.sender.1)
    }

    pub fn receiver(&self) -> (&str, &Selector) {
        (&self.receiver.0, &self.receiver.1)
    }
}

fn compile(selector: &str) -> Result<Selector, BridgeError> {
    Selector::parse(selector)
        .map_err(|e| BridgeError::Browser(format!("invalid selector '{}': {:?}", selector, e)))
}

/// Returns the trimmed text of the first node matching `selector`
///
/// Nodes whose text is empty after trimming count as not rendered yet.
///
/// # Example
///
/// ```
/// use bridge_resolver::resolver::extract_text;
/// use scraper::Selector;
///
/// let html = r#"<div id="sender"> 0xA1 </div>"#;
/// let selector = Selector::parse("#sender").unwrap();
/// assert_eq!(extract_text(html, &selector), Some("0xA1".to_string()));
/// ```
pub fn extract_text(html: &str, selector: &Selector) -> Option<String> {
    let document = Html::parse_document(html);

    document
        .select(selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}
