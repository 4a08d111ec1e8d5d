// ABOUTME: Slide range grammar used by `src: file.md#<range>` imports
// ABOUTME: Turns strings like "1,3-5,8-" into 1-based slide indices

use crate::errors::{DeckError, Result};

/// Evaluate a range string against a document with `total` slides.
///
/// No range, `all` or `*` selects every slide; `none` selects nothing.
/// Otherwise parts separated by `,` or `;` are evaluated in the order
/// written: `n`, `a-b`, `a-` (to the last slide) or `-b` (from the first).
/// Indices outside `1..=total` are dropped.
pub fn parse_range_string(total: usize, range: Option<&str>) -> Result<Vec<usize>> {
    let range = range.map(str::trim).unwrap_or("");
    match range {
        "" | "all" | "*" => return Ok((1..=total).collect()),
        "none" => return Ok(Vec::new()),
        _ => {}
    }

    let mut indices = Vec::new();
    for part in range.split([',', ';']) {
        let part: String = part.chars().filter(|c| !c.is_whitespace()).collect();
        if part.is_empty() {
            continue;
        }
        match part.split_once('-') {
            None => {
                let index = parse_index(&part, range)?;
                if (1..=total).contains(&index) {
                    indices.push(index);
                }
            }
            Some((from, to)) => {
                let from = if from.is_empty() { 1 } else { parse_index(from, range)? };
                let to = if to.is_empty() { total } else { parse_index(to, range)? };
                // Clamp before expanding so oversized bounds cost nothing
                let (from, to) = (from.max(1), to.min(total));
                if from <= to {
                    indices.extend(from..=to);
                }
            }
        }
    }

    Ok(indices)
}

fn parse_index(text: &str, range: &str) -> Result<usize> {
    text.parse::<usize>()
        .map_err(|_| DeckError::InvalidRange(format!("'{}' in '{}'", text, range)))
}
