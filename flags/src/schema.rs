//! Per-domain configuration shapes and their default values.
//!
//! The defaults here are the values substituted for any field the remote
//! payload omits or sends with the wrong shape. They are also the fallback
//! maps used by the resolver when a flag is enabled but silent about an item.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BannerIcon {
    AlertCircle,
    #[default]
    AlertTriangle,
    Info,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalConfig {
    pub title: String,
    pub message: String,
    pub button_text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BannerConfig {
    pub message: String,
    pub icon: BannerIcon,
    pub dismissible: bool,
}

/// Text and presentation of the out-of-service notice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutOfServiceConfig {
    pub modal: ModalConfig,
    pub banner: BannerConfig,
}

impl Default for OutOfServiceConfig {
    fn default() -> Self {
        OutOfServiceConfig {
            modal: ModalConfig {
                title: "¡Hola!".into(),
                message: "Por ahora no estamos aceptando nuevos pedidos. \
                          Gracias por tu paciencia, volvemos pronto."
                    .into(),
                button_text: "Entendido".into(),
            },
            banner: BannerConfig {
                message: "Temporalmente sin recibir pedidos".into(),
                icon: BannerIcon::AlertTriangle,
                dismissible: true,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionsVisibility {
    pub hero: bool,
    pub services: bool,
    pub model_viewer: bool,
    pub filament_colors: bool,
    pub gallery: bool,
    pub contact: bool,
}

impl Default for SectionsVisibility {
    fn default() -> Self {
        SectionsVisibility {
            hero: true,
            services: true,
            model_viewer: true,
            filament_colors: true,
            gallery: true,
            contact: true,
        }
    }
}

impl SectionsVisibility {
    /// Looks up a section by its config key (`modelViewer`, not `model-viewer`).
    pub fn get(&self, key: &str) -> Option<bool> {
        match key {
            "hero" => Some(self.hero),
            "services" => Some(self.services),
            "modelViewer" => Some(self.model_viewer),
            "filamentColors" => Some(self.filament_colors),
            "gallery" => Some(self.gallery),
            "contact" => Some(self.contact),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ServicesVisibility {
    pub printing: bool,
    pub prototyping: bool,
    pub custom: bool,
}

impl Default for ServicesVisibility {
    fn default() -> Self {
        ServicesVisibility {
            printing: true,
            prototyping: true,
            custom: true,
        }
    }
}

impl ServicesVisibility {
    pub fn get(&self, service_id: &str) -> Option<bool> {
        match service_id {
            "printing" => Some(self.printing),
            "prototyping" => Some(self.prototyping),
            "custom" => Some(self.custom),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MaterialsVisibility {
    pub pla: bool,
    pub petg: bool,
    pub abs: bool,
    pub tpu: bool,
}

impl Default for MaterialsVisibility {
    // Mirrors the availability in the static material catalog.
    fn default() -> Self {
        MaterialsVisibility {
            pla: true,
            petg: true,
            abs: false,
            tpu: false,
        }
    }
}

impl MaterialsVisibility {
    pub fn get(&self, material_id: &str) -> Option<bool> {
        match material_id {
            "pla" => Some(self.pla),
            "petg" => Some(self.petg),
            "abs" => Some(self.abs),
            "tpu" => Some(self.tpu),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_icon_wire_names() {
        let icon: BannerIcon = serde_json::from_str(r#""alert-circle""#).unwrap();
        assert_eq!(icon, BannerIcon::AlertCircle);
        assert_eq!(serde_json::to_string(&BannerIcon::Info).unwrap(), r#""info""#);
        assert!(serde_json::from_str::<BannerIcon>(r#""warning""#).is_err());
    }

    #[test]
    fn test_section_lookup_uses_config_keys() {
        let sections = SectionsVisibility {
            gallery: false,
            ..Default::default()
        };
        assert_eq!(sections.get("gallery"), Some(false));
        assert_eq!(sections.get("modelViewer"), Some(true));
        assert_eq!(sections.get("model-viewer"), None);
    }

    #[test]
    fn test_materials_defaults() {
        let defaults = MaterialsVisibility::default();
        assert_eq!(defaults.get("pla"), Some(true));
        assert_eq!(defaults.get("abs"), Some(false));
        assert_eq!(defaults.get("nylon"), None);
    }
}
