//! Horizontal row layout
//!
//! Windows are placed left to right in mapping order. The first window sits
//! at `(margin, margin)`; every following window starts `padding` pixels
//! after the previous window's right edge.

use crate::config::LayoutConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutParams {
    pub margin: i32,
    pub padding: i32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        LayoutConfig::default().into()
    }
}

impl From<LayoutConfig> for LayoutParams {
    fn from(config: LayoutConfig) -> Self {
        Self {
            margin: config.margin,
            padding: config.padding,
        }
    }
}

/// Positions for a row of windows with the given widths.
///
/// `offset_i = margin + sum_{k<i}(w_k + padding)`, all windows at `y = margin`.
/// Zero widths advance the cursor by `padding` only.
pub fn horizontal_positions<I>(widths: I, params: LayoutParams) -> Vec<(i32, i32)>
where
    I: IntoIterator<Item = i32>,
{
    let mut x = params.margin;
    let y = params.margin;
    widths
        .into_iter()
        .map(|width| {
            let position = (x, y);
            x = x.saturating_add(width.max(0)).saturating_add(params.padding);
            position
        })
        .collect()
}
