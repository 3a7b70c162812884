use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

// `document.body` equivalent; html5ever always synthesizes one for HTML input.
selector!(BODY_SELECTOR, "body");

/// Local name of the element whose text content is preferred over the whole
/// document's text content.
pub(crate) const BODY_TAG: &[u8] = b"body";
