// Turns whatever camera link the backend hands out into an embeddable URL

const EMBED_BASE: &str = "https://www.youtube.com/embed/";
const AUTOPLAY_PARAMS: &str = "autoplay=1&mute=1";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Extraction {
    /// Video id runs from the marker to the terminator or the end of the URL
    IdUntil(char),
    /// URL is already an embed link
    AlreadyEmbedded,
}

#[derive(Clone, Copy, Debug)]
struct StreamRule {
    marker: &'static str,
    extraction: Extraction,
}

// Evaluated in order, the first rule whose marker occurs in the URL wins.
const RULES: [StreamRule; 4] = [
    StreamRule {
        marker: "v=",
        extraction: Extraction::IdUntil('&'),
    },
    StreamRule {
        marker: "/live/",
        extraction: Extraction::IdUntil('?'),
    },
    StreamRule {
        marker: "youtu.be/",
        extraction: Extraction::IdUntil('?'),
    },
    StreamRule {
        marker: "/embed/",
        extraction: Extraction::AlreadyEmbedded,
    },
];

/// Normalize a watch, live, short or embed link into an autoplaying, muted
/// embed URL. Links that match no known shape come back unchanged, and so do
/// links whose video id is empty.
pub fn resolve(raw_url: &str) -> String {
    if raw_url.is_empty() {
        return String::new();
    }

    let Some(rule) = RULES.iter().find(|rule| raw_url.contains(rule.marker)) else {
        return raw_url.to_string();
    };

    match rule.extraction {
        Extraction::AlreadyEmbedded => with_autoplay(raw_url),
        Extraction::IdUntil(terminator) => {
            let video_id = raw_url
                .split_once(rule.marker)
                .and_then(|(_, rest)| rest.split(terminator).next())
                .unwrap_or_default();
            if video_id.is_empty() {
                raw_url.to_string()
            } else {
                format!("{}{}?{}", EMBED_BASE, video_id, AUTOPLAY_PARAMS)
            }
        }
    }
}

fn with_autoplay(embed_url: &str) -> String {
    if embed_url.contains("autoplay=") {
        embed_url.to_string()
    } else if embed_url.contains('?') {
        format!("{}&{}", embed_url, AUTOPLAY_PARAMS)
    } else {
        format!("{}?{}", embed_url, AUTOPLAY_PARAMS)
    }
}

/// A camera link together with its embeddable form. Recomputed every time
/// the stream viewer opens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub raw_url: String,
    pub embed_url: String,
}

impl StreamDescriptor {
    pub fn from_raw(raw_url: &str) -> Self {
        Self {
            raw_url: raw_url.to_string(),
            embed_url: resolve(raw_url),
        }
    }

    /// Whether resolution produced an embed link rather than the raw fallback
    pub fn is_embeddable(&self) -> bool {
        self.embed_url.contains("/embed/")
    }
}
