//! Detection and resolution of redirect interstitial pages.

mod detect;
mod resolve;

pub use detect::{looks_like_redirect_stub, STUB_SCAN_CHARS, VENDOR_MARKER_MAX_CHARS};
pub use resolve::{
    ContinueAnchor, FirstExternalAnchor, MetaRefresh, Resolution, StubAnchor, StubPage,
    StubResolver, TargetStrategy, WrapperParam, MIN_FALLBACK_HREF_CHARS,
};
