//! Decides, per item, whether the remote override or the local default applies.
//!
//! Every domain follows the same template: with no flag, or a disabled one, the
//! item takes its local static default. With an enabled flag the remote value
//! wins, falling back to the domain default map when the remote config says
//! nothing about the item. The local defaults differ per domain on purpose:
//! services are visible unless told otherwise, while sections and materials
//! carry their own static per-item setting.

use crate::catalog::{self, Material, SECTIONS, SERVICES, SectionDescriptor, Service};
use crate::schema::{MaterialsVisibility, SectionsVisibility, ServicesVisibility};
use crate::types::{FlagDomain, FlagSet, Toggle, UnknownDomain};
use indexmap::IndexMap;
use serde::Serialize;

/// Item id to visibility, in catalog order.
pub type ResolvedVisibility = IndexMap<String, bool>;

/// The domains whose items have a per-item visibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityDomain {
    Sections,
    Services,
    Materials,
}

impl VisibilityDomain {
    pub const ALL: [VisibilityDomain; 3] = [
        VisibilityDomain::Sections,
        VisibilityDomain::Services,
        VisibilityDomain::Materials,
    ];

    pub const fn flag_domain(&self) -> FlagDomain {
        match self {
            VisibilityDomain::Sections => FlagDomain::SectionsVisibility,
            VisibilityDomain::Services => FlagDomain::ServicesVisibility,
            VisibilityDomain::Materials => FlagDomain::MaterialsVisibility,
        }
    }
}

impl TryFrom<FlagDomain> for VisibilityDomain {
    type Error = UnknownDomain;

    fn try_from(domain: FlagDomain) -> Result<Self, Self::Error> {
        match domain {
            FlagDomain::SectionsVisibility => Ok(VisibilityDomain::Sections),
            FlagDomain::ServicesVisibility => Ok(VisibilityDomain::Services),
            FlagDomain::MaterialsVisibility => Ok(VisibilityDomain::Materials),
            FlagDomain::OutOfService => Err(UnknownDomain(domain.to_string())),
        }
    }
}

/// Sections are looked up by payload key or page id. Unknown sections are hidden.
pub fn is_section_visible(section: &str, flag: Option<&Toggle<SectionsVisibility>>) -> bool {
    let Some(descriptor) = catalog::section(section) else {
        return false;
    };

    match flag {
        Some(toggle) if toggle.enabled => toggle
            .config
            .as_ref()
            .and_then(|config| config.get(descriptor.key))
            .or_else(|| SectionsVisibility::default().get(descriptor.key))
            .unwrap_or(descriptor.enabled),
        _ => descriptor.enabled,
    }
}

/// Unknown services are visible.
pub fn is_service_visible(service_id: &str, flag: Option<&Toggle<ServicesVisibility>>) -> bool {
    match flag {
        Some(toggle) if toggle.enabled => toggle
            .config
            .as_ref()
            .and_then(|config| config.get(service_id))
            .or_else(|| ServicesVisibility::default().get(service_id))
            .unwrap_or(true),
        _ => true,
    }
}

/// Unknown materials are unavailable. Only material-level availability is
/// ever overridden; colors keep their static availability.
pub fn is_material_available(
    material_id: &str,
    flag: Option<&Toggle<MaterialsVisibility>>,
) -> bool {
    let Some(material) = catalog::material(material_id) else {
        return false;
    };

    match flag {
        Some(toggle) if toggle.enabled => toggle
            .config
            .as_ref()
            .and_then(|config| config.get(material_id))
            .or_else(|| MaterialsVisibility::default().get(material_id))
            .unwrap_or(false),
        _ => material.available,
    }
}

pub fn resolve_visibility(flags: &FlagSet, domain: VisibilityDomain, item_id: &str) -> bool {
    match domain {
        VisibilityDomain::Sections => is_section_visible(item_id, flags.sections()),
        VisibilityDomain::Services => is_service_visible(item_id, flags.services()),
        VisibilityDomain::Materials => is_material_available(item_id, flags.materials()),
    }
}

/// Resolves every catalog item of a domain. Sections are keyed by page id.
pub fn resolved_visibility(flags: &FlagSet, domain: VisibilityDomain) -> ResolvedVisibility {
    let ids: Vec<&str> = match domain {
        VisibilityDomain::Sections => SECTIONS.iter().map(|s| s.id).collect(),
        VisibilityDomain::Services => SERVICES.iter().map(|s| s.id).collect(),
        VisibilityDomain::Materials => catalog::MATERIALS.iter().map(|m| m.id).collect(),
    };

    ids.into_iter()
        .map(|id| (id.to_string(), resolve_visibility(flags, domain, id)))
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionWithVisibility {
    #[serde(flatten)]
    pub section: &'static SectionDescriptor,
    pub visible: bool,
}

pub fn sections_with_visibility(flags: &FlagSet) -> Vec<SectionWithVisibility> {
    SECTIONS
        .iter()
        .map(|section| SectionWithVisibility {
            section,
            visible: is_section_visible(section.key, flags.sections()),
        })
        .collect()
}

pub fn visible_services(flags: &FlagSet) -> Vec<&'static Service> {
    SERVICES
        .iter()
        .filter(|service| is_service_visible(service.id, flags.services()))
        .collect()
}

pub fn available_materials(flags: &FlagSet) -> Vec<&'static Material> {
    catalog::MATERIALS
        .iter()
        .filter(|material| is_material_available(material.id, flags.materials()))
        .collect()
}

/// The material catalog with `available` replaced by the resolved value.
pub fn materials_with_override(flags: &FlagSet) -> Vec<Material> {
    let flag = flags.materials();
    catalog::MATERIALS
        .iter()
        .map(|material| Material {
            available: is_material_available(material.id, flag),
            ..material.clone()
        })
        .collect()
}
