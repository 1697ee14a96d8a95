//! Display metadata attached to each tier.

/// Metadata fields as written in a `meta.<tier>` section. Unset fields use defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct MetaSpec {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub chat_prefix: Option<String>,
    pub nameplate_prefix: Option<String>,
    pub image_path: Option<String>,
    pub icon_path: Option<String>,
}

/// Resolved display metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct TierMeta {
    pub display_name: String,
    pub description: String,
    pub chat_prefix: String,
    pub nameplate_prefix: String,
    pub image_path: String,
    pub icon_path: String,
}

impl TierMeta {
    pub const DEFAULT_DESCRIPTION: &'static str = "";
    pub const DEFAULT_CHAT_PREFIX: &'static str = "[{name}] ";
    pub const DEFAULT_NAMEPLATE_PREFIX: &'static str = "[{name}]";
    pub const DEFAULT_IMAGE_PATH: &'static str = "Images/Difficulty/normal.png";
    pub const DEFAULT_ICON_PATH: &'static str = "Images/Difficulty/normal@icon.png";

    /// Resolves `spec` for `tier_id`; the display name defaults to the id itself.
    pub fn resolve(tier_id: &str, spec: Option<&MetaSpec>) -> Self {
        let pick = |field: Option<&Option<String>>, default: &str| {
            field
                .and_then(|value| value.clone())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            display_name: pick(spec.map(|s| &s.display_name), tier_id),
            description: pick(spec.map(|s| &s.description), Self::DEFAULT_DESCRIPTION),
            chat_prefix: pick(spec.map(|s| &s.chat_prefix), Self::DEFAULT_CHAT_PREFIX),
            nameplate_prefix: pick(
                spec.map(|s| &s.nameplate_prefix),
                Self::DEFAULT_NAMEPLATE_PREFIX,
            ),
            image_path: pick(spec.map(|s| &s.image_path), Self::DEFAULT_IMAGE_PATH),
            icon_path: pick(spec.map(|s| &s.icon_path), Self::DEFAULT_ICON_PATH),
        }
    }

    /// Chat prefix with `{name}` and `{id}` substituted.
    pub fn render_chat_prefix(&self, tier_id: &str) -> String {
        self.render(&self.chat_prefix, tier_id)
    }

    /// Nameplate prefix with `{name}` and `{id}` substituted.
    pub fn render_nameplate_prefix(&self, tier_id: &str) -> String {
        self.render(&self.nameplate_prefix, tier_id)
    }

    fn render(&self, template: &str, tier_id: &str) -> String {
        template
            .replace("{name}", &self.display_name)
            .replace("{id}", tier_id)
    }
}
