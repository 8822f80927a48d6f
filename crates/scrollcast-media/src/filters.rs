//! FFmpeg filter graph definitions.
//!
//! Expressions are single-quoted so commas and colons inside them do not
//! split the filter chain. Arguments are passed without a shell.

use scrollcast_models::OverlayLayout;

/// Label of the composited video stream in [`overlay_filter`].
pub const OVERLAY_OUTPUT_LABEL: &str = "[out]";

/// Square crop anchored top-left, side = min(width, height).
pub const FILTER_SQUARE_CROP: &str = "crop='min(iw,ih)':'min(iw,ih)':0:0";

/// Alpha = 255 inside the inscribed circle, 0 outside. Hard edge.
///
/// Luma and chroma planes are copied through untouched.
pub const FILTER_CIRCLE_ALPHA: &str = concat!(
    "format=yuva420p,",
    "geq=lum='lum(X,Y)':cb='cb(X,Y)':cr='cr(X,Y)'",
    ":a='if(gt(hypot(X-W/2,Y-H/2),min(W,H)/2),0,255)'"
);

/// Build the full single-input mask chain.
pub fn circular_mask_filter() -> String {
    format!("{},{}", FILTER_SQUARE_CROP, FILTER_CIRCLE_ALPHA)
}

/// Build the two-input overlay graph.
///
/// Input 0 is the base page recording, input 1 the masked clip. The clip is
/// scaled to the layout width with height following its aspect ratio, then
/// placed bottom-right. The overlay's alpha channel cuts out the circle.
pub fn overlay_filter(layout: &OverlayLayout) -> String {
    format!(
        "[1:v]scale={}:-1[overlay];\
         [0:v][overlay]overlay=main_w-overlay_w-{}:main_h-overlay_h-{}:format=auto{}",
        layout.width, layout.margin, layout.margin, OVERLAY_OUTPUT_LABEL
    )
}
