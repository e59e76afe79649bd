use crate::constants::{TIKTOK_PLATFORM, VK_PLATFORM, YOUTUBE_PLATFORM};

/// The three supported video platforms, each resolved by its own strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Youtube,
    TikTok,
    Vk,
}

impl Platform {
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Youtube => YOUTUBE_PLATFORM,
            Platform::TikTok => TIKTOK_PLATFORM,
            Platform::Vk => VK_PLATFORM,
        }
    }
}

/// Classifies a URL by platform domain. Pure substring match; anything else
/// is unsupported and never reaches a resolver.
pub fn classify(url: &str) -> Option<Platform> {
    if url.contains("youtube.com") || url.contains("youtu.be") {
        Some(Platform::Youtube)
    } else if url.contains("tiktok.com") {
        Some(Platform::TikTok)
    } else if url.contains("vk.com") {
        Some(Platform::Vk)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_youtube_domains() {
        assert_eq!(
            classify("https://www.youtube.com/shorts/dQw4w9WgXcQ"),
            Some(Platform::Youtube)
        );
        assert_eq!(classify("https://youtu.be/dQw4w9WgXcQ"), Some(Platform::Youtube));
    }

    #[test]
    fn classifies_tiktok_and_vk() {
        assert_eq!(
            classify("https://www.tiktok.com/@someone/video/7294837261"),
            Some(Platform::TikTok)
        );
        assert_eq!(classify("https://vk.com/clip-12345_67890"), Some(Platform::Vk));
    }

    #[test]
    fn rejects_unsupported_domains() {
        assert_eq!(classify("https://vimeo.com/12345"), None);
        assert_eq!(classify("not a url at all"), None);
    }
}
