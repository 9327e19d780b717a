//! SVG optimization using usvg.
//!
//! usvg parses into a normalized tree and writes it back without comments,
//! editor metadata or redundant groups, with numbers rounded to
//! `floatPrecision`. The tree only keeps what renders, so documents carrying
//! anything else (text, symbols, styles, scripts, links, animation, or ids and
//! classes other files may point at) are passed through unchanged.

use tracing::debug;

use crate::config::SvgOptions;
use crate::utils::{OptimizerError, OptimizerResult};

/// Passes stop after this many rounds even if output is still shrinking
const MAX_PASSES: usize = 10;

/// Elements the render tree drops or rewrites beyond recognition
const KEPT_ELEMENTS: [&str; 11] = [
    "text",
    "symbol",
    "style",
    "script",
    "foreignObject",
    "a",
    "animate",
    "animateMotion",
    "animateTransform",
    "set",
    "switch",
];

/// Attributes that may be referenced from outside the document
const KEPT_ATTRIBUTES: [&str; 2] = ["id", "class"];

pub fn optimize(source: &str, options: &SvgOptions) -> OptimizerResult<Vec<u8>> {
    if let Some(reason) = unsafe_to_rewrite(source) {
        debug!("SVG has {}, leaving it as is", reason);
        return Ok(source.as_bytes().to_vec());
    }

    let mut best = write_once(source, options)?;
    if options.multipass {
        for _ in 1..MAX_PASSES {
            let next = write_once(&best, options)?;
            if next.len() >= best.len() {
                break;
            }
            best = next;
        }
    }
    Ok(best.into_bytes())
}

fn write_once(source: &str, options: &SvgOptions) -> OptimizerResult<String> {
    let tree = usvg::Tree::from_str(source, &usvg::Options::default())
        .map_err(|e| OptimizerError::encode(format!("Failed to parse SVG: {e}")))?;

    let write_options = usvg::WriteOptions {
        indent: usvg::Indent::None,
        attributes_indent: usvg::Indent::None,
        coordinates_precision: options.float_precision,
        transforms_precision: options.float_precision,
        ..Default::default()
    };
    Ok(tree.to_string(&write_options))
}

/// Names the first construct a rewrite would lose, if any.
fn unsafe_to_rewrite(source: &str) -> Option<String> {
    for name in element_names(source) {
        if KEPT_ELEMENTS.iter().any(|kept| *kept == name) {
            return Some(format!("<{name}> elements"));
        }
    }
    KEPT_ATTRIBUTES
        .iter()
        .find(|attr| has_attribute(source, attr))
        .map(|attr| format!("{attr} attributes"))
}

/// Local names of opening tags, namespace prefixes stripped.
fn element_names(source: &str) -> impl Iterator<Item = &str> {
    source.split('<').skip(1).map(|tag| {
        let end = tag
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(tag.len());
        let name = &tag[..end];
        name.rsplit(':').next().unwrap_or(name)
    })
}

fn has_attribute(source: &str, attr: &str) -> bool {
    let needle = format!("{attr}=");
    source.match_indices(&needle).any(|(at, _)| {
        source[..at]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERBOSE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<!-- Generator: Some Editor 1.0 -->
<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100">
    <metadata>lots of editor data here</metadata>
    <g>
        <g>
            <rect x="10.000000" y="10.000000" width="80.000000" height="80.000000" fill="#ff0000"/>
        </g>
    </g>
</svg>
"##;

    #[test]
    fn strips_editor_noise() {
        let out = optimize(VERBOSE, &SvgOptions::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.len() < VERBOSE.len());
        assert!(!text.contains("Generator"));
        assert!(!text.contains("<metadata"));
        assert!(text.contains("<svg"));
    }

    #[test]
    fn multipass_never_grows() {
        let single = optimize(VERBOSE, &SvgOptions { multipass: false, float_precision: 3 }).unwrap();
        let multi = optimize(VERBOSE, &SvgOptions { multipass: true, float_precision: 3 }).unwrap();
        assert!(multi.len() <= single.len());
    }

    #[test]
    fn text_documents_pass_through() {
        let source = r#"<svg xmlns="http://www.w3.org/2000/svg"><text x="0" y="10">hi</text></svg>"#;
        assert_eq!(optimize(source, &SvgOptions::default()).unwrap(), source.as_bytes());
    }

    fn sprite_sheet(symbols: usize) -> String {
        let mut out = String::from(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" style="display: none">"#,
        );
        for i in 0..symbols {
            out.push_str(&format!(
                r#"  <symbol id="icon-{i}" viewBox="0 0 24 24"><path d="M 0 0 L 24.000000 24.000000"/></symbol>
"#
            ));
        }
        out.push_str("</svg>\n");
        out
    }

    #[test]
    fn sprite_sheets_keep_their_symbols() {
        let source = sprite_sheet(20);
        let out = optimize(&source, &SvgOptions::default()).unwrap();
        assert_eq!(out, source.as_bytes());
    }

    #[test]
    fn prefixed_text_is_detected() {
        let source = r#"<svg:svg xmlns:svg="http://www.w3.org/2000/svg"><svg:text>hi</svg:text></svg:svg>"#;
        assert_eq!(unsafe_to_rewrite(source).as_deref(), Some("<text> elements"));
    }

    #[test]
    fn referenced_ids_and_classes_are_kept() {
        for source in [
            r#"<svg xmlns="http://www.w3.org/2000/svg"><path id="logo" d="M0 0h1"/></svg>"#,
            r#"<svg xmlns="http://www.w3.org/2000/svg"><path class="accent" d="M0 0h1"/></svg>"#,
            r#"<svg xmlns="http://www.w3.org/2000/svg"><a href="/"><path d="M0 0h1"/></a></svg>"#,
            r#"<svg xmlns="http://www.w3.org/2000/svg"><style>path{fill:red}</style></svg>"#,
        ] {
            assert!(unsafe_to_rewrite(source).is_some(), "{source}");
        }
    }

    #[test]
    fn plain_drawings_are_rewritten() {
        assert_eq!(unsafe_to_rewrite(VERBOSE), None);
        // attribute names merely ending in "id" do not count
        assert_eq!(
            unsafe_to_rewrite(r#"<svg xmlns="http://www.w3.org/2000/svg" data-grid="1"><rect width="1" height="1"/></svg>"#),
            None
        );
    }

    #[test]
    fn malformed_svg_is_an_encode_error() {
        let err = optimize("<svg", &SvgOptions::default()).unwrap_err();
        assert!(matches!(err, OptimizerError::Encode(_)));
    }
}
