//! Field extraction policies
//!
//! Whether a field's value becomes a translation key depends only on the
//! field name and the [`Zone`] of the object holding it. Rules are checked in
//! a fixed order:
//!
//! 1. `link` fields are dropped from the output
//! 2. technical, numeric and identifier fields are kept verbatim
//! 3. priority literals and keyword lists are keyed by their own text
//! 4. the zone's policy (allow-list or verbatim list)
//! 5. default extraction

use crate::zone::Zone;

/// Fields removed from the rewritten tree in every zone.
pub static DROPPED_FIELDS: &[&str] = &["link"];

/// Fields never extracted, in any zone. Any field starting with `show` is
/// treated the same way.
pub static VERBATIM_FIELDS: &[&str] = &[
    "id",
    "faction_id",
    "active",
    "imperialArmour",
    "models",
    "cost",
    "turn",
    "phase",
    "cardType",
    "source",
    "updated",
    "factions",
    "parent_id",
    "is_subfaction",
    "points",
    "value",
    "showInfo",
    "showInvulnerableSave",
    "showAtTop",
    "banner",
    "header",
    "allied_factions",
    "type",
    "invul",
];

/// Fields whose string values double as their own translation keys.
pub static KEYWORD_FIELDS: &[&str] = &["keywords", "keyword"];

/// Short keyword-like values that are always keyed by their own text.
pub static PRIORITY_LITERALS: &[&str] = &[
    // unit categories
    "Epic Hero",
    "Character",
    "Infantry",
    "Battleline",
    "Vehicle",
    "Walker",
    "Monster",
    "Mounted",
    "Beast",
    "Swarm",
    "Fly",
    "Transport",
    "Dedicated Transport",
    "Aircraft",
    "Titanic",
    "Towering",
    "Fortification",
    "Psyker",
    "Grenades",
    "Smoke",
    "Imperium",
    "Chaos",
    // core abilities
    "Hover",
    "Leader",
    "Stealth",
    "Deep Strike",
    "Infiltrators",
    "Lone Operative",
    "Fights First",
    // weapon abilities
    "Assault",
    "Heavy",
    "Pistol",
    "Torrent",
    "Blast",
    "Precision",
    "Lance",
    "Hazardous",
    "Psychic",
    "Lethal Hits",
    "Devastating Wounds",
    "Twin-linked",
    "Ignores Cover",
    "Indirect Fire",
    "Extra Attacks",
    "One Shot",
];

/// Prefixes of parameterised abilities ("Feel No Pain 5+", "Scouts 6\"").
pub static PRIORITY_PREFIXES: &[&str] = &[
    "Feel No Pain ",
    "Scouts ",
    "Deadly Demise ",
    "Firing Deck ",
    "Sustained Hits ",
    "Rapid Fire ",
    "Melta ",
    "Anti-",
];

/// How extracted values inside a zone are keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keying {
    /// Full path of the value (`datasheets.Captain.abilities...`)
    Path,
    /// `stratagems.<stratagem name>.<field>`, independent of depth
    Stratagem,
}

/// Per-zone field rules.
#[derive(Debug, Clone)]
pub struct ZonePolicy {
    pub zone: Zone,
    /// Fields kept verbatim in this zone
    pub verbatim_fields: &'static [&'static str],
    /// When set, only these fields may be extracted; all others pass through
    pub extractable_fields: Option<&'static [&'static str]>,
    /// Whether the generic never-extract list (`VERBATIM_FIELDS`, `show*`)
    /// applies here
    pub generic_verbatim: bool,
    pub keying: Keying,
}

impl ZonePolicy {
    /// Whether `field` may be extracted under this zone.
    pub fn allows(&self, field: &str) -> bool {
        if self.verbatim_fields.contains(&field) {
            return false;
        }
        match self.extractable_fields {
            Some(allowed) => allowed.contains(&field),
            None => true,
        }
    }
}

pub static PROFILE_POLICY: ZonePolicy = ZonePolicy {
    zone: Zone::Profile,
    verbatim_fields: &["ap", "attacks", "damage", "range", "skill", "strength"],
    extractable_fields: Some(&["name"]),
    generic_verbatim: true,
    keying: Keying::Path,
};

pub static STATS_POLICY: ZonePolicy = ZonePolicy {
    zone: Zone::Stats,
    verbatim_fields: &["active", "ld", "m", "oc", "showDamagedMarker", "showName", "sv", "t", "w"],
    extractable_fields: None,
    generic_verbatim: true,
    keying: Keying::Path,
};

pub static ENHANCEMENT_POLICY: ZonePolicy = ZonePolicy {
    zone: Zone::Enhancement,
    verbatim_fields: &[],
    extractable_fields: Some(&["name", "description", "detachment"]),
    generic_verbatim: true,
    keying: Keying::Path,
};

pub static STRATAGEM_POLICY: ZonePolicy = ZonePolicy {
    zone: Zone::Stratagem,
    verbatim_fields: &[],
    extractable_fields: None,
    generic_verbatim: false,
    keying: Keying::Stratagem,
};

pub static GENERIC_POLICY: ZonePolicy = ZonePolicy {
    zone: Zone::Generic,
    verbatim_fields: &[],
    extractable_fields: None,
    generic_verbatim: true,
    keying: Keying::Path,
};

pub fn zone_policy(zone: Zone) -> &'static ZonePolicy {
    match zone {
        Zone::Profile => &PROFILE_POLICY,
        Zone::Stats => &STATS_POLICY,
        Zone::Enhancement => &ENHANCEMENT_POLICY,
        Zone::Stratagem => &STRATAGEM_POLICY,
        Zone::Generic => &GENERIC_POLICY,
    }
}

/// Zone-independent rule for a field, checked before the zone policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Remove the field from the output
    Drop,
    /// Keep the value untouched
    Verbatim,
    /// Key every string by its own text
    SelfKeyed,
    /// Defer to the zone policy
    Zoned,
}

pub fn field_rule(field: &str) -> FieldRule {
    if DROPPED_FIELDS.contains(&field) {
        FieldRule::Drop
    } else if VERBATIM_FIELDS.contains(&field) || field.starts_with("show") {
        FieldRule::Verbatim
    } else if KEYWORD_FIELDS.contains(&field) {
        FieldRule::SelfKeyed
    } else {
        FieldRule::Zoned
    }
}

/// Values that are never given a synthetic key.
pub fn is_priority_literal(text: &str) -> bool {
    let text = text.trim();
    PRIORITY_LITERALS.contains(&text) || PRIORITY_PREFIXES.iter().any(|p| text.starts_with(p))
}

/// Non-empty text that is not a URL.
pub fn is_translatable_text(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && !trimmed.starts_with("http")
}
