//! Settings → CSS override fragment.

use std::fmt;

use crate::settings::{Settings, UNSCALED};

/// Selector the override rule is scoped to.
pub const MATH_SELECTOR: &str = "math";

/// A single style rule injected into pages. Compared byte for byte when it
/// has to be removed again, so it is never rebuilt from anything but
/// [`synthesize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StyleFragment(String);

impl StyleFragment {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StyleFragment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StyleFragment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build the override rule for `settings`, or `None` when nothing is overridden.
pub fn synthesize(settings: &Settings) -> Option<StyleFragment> {
    let rule_end = if settings.math_font_important {
        " !important;"
    } else {
        ";"
    };

    let mut declarations = String::new();
    if !settings.math_font_family.is_empty() {
        let family = escape_single_quotes(&settings.math_font_family);
        declarations.push_str(&format!("font-family: '{family}'{rule_end}"));
    }
    if settings.math_font_scale > 0 && settings.math_font_scale != UNSCALED {
        declarations.push_str(&format!(
            "font-size:{}%{rule_end}",
            settings.math_font_scale
        ));
    }

    if declarations.is_empty() {
        None
    } else {
        Some(StyleFragment(format!("{MATH_SELECTOR} {{{declarations}}}")))
    }
}

fn escape_single_quotes(family: &str) -> String {
    family.replace('\'', "\\'")
}
