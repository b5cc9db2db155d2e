//! Url template interpolation.
//!
//! A template such as `/users/:userID/posts(/:postID)` carries `:label` substitution points and optional
//! `(`, `)`, `|` markup that only documents alternative paths. Interpolation strips the markup, moves the
//! values of matching keys out of `data` (first) or `params` into the url, and normalizes slashes.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::mapping::{pop_first, Mapping};

static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\(\s*|\s*\)|\s*\|\s*)").unwrap_or_else(|_| unreachable!()));
static LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([A-Za-z][A-Za-z0-9_]*)").unwrap_or_else(|_| unreachable!()));
static REPEATED_SLASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[^:])/{2,}").unwrap_or_else(|_| unreachable!()));
static TRAILING_SLASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/+$").unwrap_or_else(|_| unreachable!()));

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Interpolated {
    pub url: String,
    pub params: Mapping,
    pub data: Mapping,
}

/// Interpolate `template` and return the resolved url together with the entries that were not consumed.
pub fn interpolate(template: &str, mut params: Mapping, mut data: Mapping, strip_trailing_slash: bool) -> Interpolated {
    let url = interpolate_url(template, &mut params, &mut data, strip_trailing_slash);
    Interpolated { url, params, data }
}

/// Interpolate `template`, removing every consumed key from `params` and `data`.
///
/// Keys found in `data` take precedence over the same keys in `params`. A label without a value resolves to an
/// empty string, and every occurrence of a label pops again, so a repeated label is only filled once.
pub fn interpolate_url(template: &str, params: &mut Mapping, data: &mut Mapping, strip_trailing_slash: bool) -> String {
    let stripped = MARKUP.replace_all(template, "");

    let substituted = LABEL.replace_all(&stripped, |caps: &Captures| {
        pop_first([&mut *data, &mut *params], &caps[1]).unwrap_or_default()
    });

    // keep the `//` of `scheme://`
    let collapsed = REPEATED_SLASH.replace_all(&substituted, "${1}/");

    if strip_trailing_slash {
        TRAILING_SLASH.replace(&collapsed, "").into_owned()
    } else {
        collapsed.into_owned()
    }
}
