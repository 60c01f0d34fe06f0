use unicode_normalization::UnicodeNormalization;
use unicode_properties::{GeneralCategory, GeneralCategoryGroup, UnicodeGeneralCategory};

use crate::{
    config::NamingConfig,
    error::{Error, Result},
    management::ChangeMarkerCache,
    playlists::NameIndex,
    spotify::SpotifyGateway,
    verbose, warning,
};

/// Keeps one sanitized descriptive line on managed playlists.
///
/// Owns its own [`ChangeMarkerCache`], separate from the sync cache: a
/// playlist whose marker has not moved since the last processed description
/// is skipped without any mutation.
pub struct DescriptionSync {
    markers: ChangeMarkerCache,
    naming: NamingConfig,
    names: NameIndex,
    max_length: usize,
}

impl DescriptionSync {
    pub fn new(
        markers: ChangeMarkerCache,
        naming: NamingConfig,
        names: NameIndex,
        max_length: usize,
    ) -> Self {
        Self {
            markers,
            naming,
            names,
            max_length,
        }
    }

    pub fn markers(&self) -> &ChangeMarkerCache {
        &self.markers
    }

    /// Refreshes the description of `playlist_id`, returning whether it
    /// changed remotely.
    ///
    /// `known_marker` is the live change marker when the caller already has
    /// it (e.g. from a playlist listing); if it matches the cache no remote
    /// call is made at all. An empty `track_uris` slice skips the playlist.
    pub async fn update_description(
        &mut self,
        gateway: &dyn SpotifyGateway,
        playlist_id: &str,
        known_marker: Option<&str>,
        track_uris: Option<&[String]>,
    ) -> Result<bool> {
        if let Some(marker) = known_marker {
            if self.markers.is_unchanged(playlist_id, marker) {
                return Ok(false);
            }
        }

        let meta = gateway.playlist(playlist_id).await?;
        if self.markers.is_unchanged(playlist_id, &meta.snapshot_id) {
            return Ok(false);
        }

        if track_uris.is_some_and(|uris| uris.is_empty()) {
            verbose!("'{}' has no tracks, description left alone", meta.name);
            return Ok(false);
        }

        // The API hands descriptions back HTML-escaped.
        let current = unescape_html(meta.description.as_deref().unwrap_or_default());
        let base = self.base_line(&meta.name, &current);
        let desired = sanitize_description(&strip_brackets(&base), self.max_length);

        if desired.is_empty() {
            verbose!("'{}' would get an empty description, skipped", meta.name);
            return Ok(false);
        }

        if desired == current.trim() {
            self.markers.set(playlist_id, meta.snapshot_id);
            self.markers.persist().await?;
            return Ok(false);
        }

        match gateway
            .change_details(playlist_id, None, Some(&desired))
            .await
        {
            Ok(()) => {}
            Err(Error::Validation(reason)) => {
                let fallback = sanitize_description(&ascii_fallback(&desired), self.max_length);
                if fallback.is_empty() || fallback == desired {
                    return Err(Error::Validation(reason));
                }
                warning!(
                    "Description of '{}' rejected ({}), retrying with plain ASCII",
                    meta.name,
                    reason
                );
                gateway
                    .change_details(playlist_id, None, Some(&fallback))
                    .await?;
            }
            Err(e) => return Err(e),
        }

        // The update itself moved the marker; remember the new one.
        let refreshed = gateway.playlist(playlist_id).await?;
        self.markers.set(playlist_id, refreshed.snapshot_id);
        self.markers.persist().await?;
        Ok(true)
    }

    /// First line of the current description, unless it is empty or just
    /// repeats the name; then the generated line for managed names, else the
    /// name itself.
    fn base_line(&self, name: &str, current: &str) -> String {
        let first = current.lines().next().unwrap_or_default().trim();
        if !first.is_empty() && first != name.trim() {
            return first.to_string();
        }

        match self.names.parse(name) {
            Some((kind, period)) => self.naming.description_for(kind, period),
            None => name.to_string(),
        }
    }
}

/// Removes `(...)` and `[...]` segments and collapses the leftover spaces.
pub fn strip_brackets(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let close = match chars[i] {
            '(' => Some(')'),
            '[' => Some(']'),
            _ => None,
        };
        if let Some(close) = close {
            if let Some(offset) = chars[i + 1..].iter().position(|c| *c == close) {
                i += offset + 2;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    out.split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Makes text acceptable for the playlist description field.
///
/// Drops control, format, private-use and unassigned code points (newlines
/// and tabs survive) as well as variation selectors and emoji, normalizes to
/// NFC and truncates to `max_length` characters. When the text is too long
/// and has several lines, the first line is kept whole and the rest is
/// shortened. Applying it to its own output changes nothing.
pub fn sanitize_description(text: &str, max_length: usize) -> String {
    let filtered: String = text.chars().filter(|c| is_allowed(*c)).collect();
    let normalized: String = filtered.nfc().collect();
    truncate(normalized.trim(), max_length).trim().to_string()
}

fn unescape_html(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&#x2F;", "/")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// ASCII-only rendition used after the API rejected a description.
pub fn ascii_fallback(text: &str) -> String {
    text.nfkd()
        .filter(|c| c.is_ascii() && (*c == '\n' || *c == '\t' || !c.is_ascii_control()))
        .collect()
}

fn is_allowed(c: char) -> bool {
    if c == '\n' || c == '\t' {
        return true;
    }
    // Control, format, surrogate, private-use and unassigned code points.
    if c.general_category_group() == GeneralCategoryGroup::Other {
        return false;
    }
    let code = c as u32;
    if matches!(
        code,
        0x034F | 0x20E3 | 0x2028 | 0x2029 | 0xFE00..=0xFE0F | 0xE0100..=0xE01EF
    ) {
        return false;
    }
    match c.general_category() {
        GeneralCategory::OtherSymbol => !is_emoji_block(code),
        GeneralCategory::ModifierSymbol => !(0x1F3FB..=0x1F3FF).contains(&code),
        _ => true,
    }
}

/// Blocks whose pictographs render as emoji.
fn is_emoji_block(code: u32) -> bool {
    matches!(
        code,
        0x2300..=0x23FF | 0x25A0..=0x27BF | 0x2B00..=0x2BFF | 0x1F000..=0x1FAFF
    )
}

fn truncate(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    if let Some((first, rest)) = text.split_once('\n') {
        let first_len = first.chars().count();
        if first_len + 5 < max_length {
            let keep = max_length - first_len - 5;
            let head: String = rest.chars().take(keep).collect();
            return format!("{first}\n{}...", head.trim_end());
        }
    }

    if max_length <= 3 {
        return text.chars().take(max_length).collect();
    }
    let head: String = text.chars().take(max_length - 3).collect();
    format!("{}...", head.trim_end())
}
