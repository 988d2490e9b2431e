use serde::{Deserialize, Serialize};

use super::EnumParseError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl std::str::FromStr for $name {
            type Err = EnumParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(EnumParseError {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Platform {
    Linkedin => "linkedin",
    Twitter => "twitter",
});

str_enum!(Provider {
    OpenAi => "openai",
    Anthropic => "anthropic",
});

str_enum!(Responsiveness {
    Instant => "instant",
    Active => "active",
    Casual => "casual",
    Zen => "zen",
});

str_enum!(AvatarStyle {
    Micah => "micah",
    Personas => "personas",
    PixelArtNeutral => "pixel-art-neutral",
    AdventurerNeutral => "adventurer-neutral",
    Bottts => "bottts",
});

impl Platform {
    /// Detect the platform from a profile URL's host.
    /// Returns `None` for hosts other than LinkedIn and Twitter/X.
    pub fn from_url(profile_url: &str) -> Option<Self> {
        let parsed = url::Url::parse(profile_url).ok()?;
        let host = parsed.host_str()?.to_ascii_lowercase();
        if host_matches(&host, "linkedin.com") {
            Some(Self::Linkedin)
        } else if host_matches(&host, "twitter.com") || host_matches(&host, "x.com") {
            Some(Self::Twitter)
        } else {
            None
        }
    }
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}

impl Provider {
    /// Human-facing provider name used in error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }

    /// Settings-store key holding this provider's API credential.
    pub fn credential_key(&self) -> &'static str {
        match self {
            Self::OpenAi => "openaiKey",
            Self::Anthropic => "anthropicKey",
        }
    }
}

/// Inclusive response-delay range in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min: u32,
    pub max: u32,
}

impl DelayRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Fixed mapping from responsiveness category to delay range.
pub struct ResponsivenessDelayTable;

impl ResponsivenessDelayTable {
    pub const INSTANT: DelayRange = DelayRange::new(1, 300);
    pub const ACTIVE: DelayRange = DelayRange::new(301, 3600);
    pub const CASUAL: DelayRange = DelayRange::new(3601, 28800);
    pub const ZEN: DelayRange = DelayRange::new(28801, 86400);
    /// Entry for an "unknown" label. Normalisation never produces that label,
    /// so only a raw label lookup can reach it.
    pub const UNKNOWN: DelayRange = Self::CASUAL;

    pub fn range_for(category: Responsiveness) -> DelayRange {
        match category {
            Responsiveness::Instant => Self::INSTANT,
            Responsiveness::Active => Self::ACTIVE,
            Responsiveness::Casual => Self::CASUAL,
            Responsiveness::Zen => Self::ZEN,
        }
    }

    /// Raw label lookup. Unrecognised labels map to the `active` range.
    pub fn range_for_label(label: &str) -> DelayRange {
        if label == "unknown" {
            return Self::UNKNOWN;
        }
        label
            .parse::<Responsiveness>()
            .map(Self::range_for)
            .unwrap_or(Self::ACTIVE)
    }
}

impl Default for Responsiveness {
    fn default() -> Self {
        Self::Active
    }
}

impl Responsiveness {
    /// Lower-case a model-supplied label and validate it against the
    /// enumeration; anything unrecognised becomes `Active`.
    pub fn normalize(label: &str) -> Self {
        label
            .trim()
            .to_lowercase()
            .parse()
            .unwrap_or(Self::Active)
    }

    pub fn delay_range(&self) -> DelayRange {
        ResponsivenessDelayTable::range_for(*self)
    }
}

impl AvatarStyle {
    pub const DEFAULT: AvatarStyle = AvatarStyle::Micah;

    /// Catalog names in prompt order.
    pub fn catalog() -> Vec<&'static str> {
        Self::all().iter().map(|s| s.as_str()).collect()
    }
}
