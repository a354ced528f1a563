use crate::error::{config_error, PulseResult};
use url::Url;

/// Scheme the widget and notifications open the app with
pub const DEEP_LINK_SCHEME: &str = "calendarpulse";

/// Where a deep link leads; every link currently opens the default view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeepLink {
    Today,
}

/// Parse a routing URL. Host and path are ignored.
pub fn parse(raw: &str) -> PulseResult<DeepLink> {
    let url = Url::parse(raw).map_err(|e| config_error(&format!("Invalid deep link {}: {}", raw, e)))?;
    if url.scheme() != DEEP_LINK_SCHEME {
        return Err(config_error(&format!(
            "Unsupported deep link scheme: {}",
            url.scheme()
        )));
    }
    Ok(DeepLink::Today)
}
