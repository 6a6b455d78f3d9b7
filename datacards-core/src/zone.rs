//! Structural zones
//!
//! Every object node falls into exactly one [`Zone`], decided from its path
//! alone, never from the node's content. The zone selects the field policy
//! applied to the node's fields (see [`crate::policy`]).

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Zone {
    /// Weapon statistics inside `meleeWeapons`/`rangedWeapons` profiles
    Profile,
    /// Unit statistics block entry
    Stats,
    /// Detachment enhancement
    Enhancement,
    /// Detachment stratagem
    Stratagem,
    Generic,
}

/// `[meleeWeapons, profiles]` or `[rangedWeapons, profiles]` adjacent once
/// indices are dropped.
pub fn is_profile_path(path: &Path) -> bool {
    path.contains_adjacent("meleeWeapons", "profiles")
        || path.contains_adjacent("rangedWeapons", "profiles")
}

/// `stats` followed by an index.
pub fn is_stats_path(path: &Path) -> bool {
    path.contains_indexed("stats")
}

/// `enhancements` followed by an index.
pub fn is_enhancement_path(path: &Path) -> bool {
    path.contains_indexed("enhancements")
}

/// `stratagems` followed by an index.
pub fn is_stratagem_path(path: &Path) -> bool {
    path.contains_indexed("stratagems")
}

/// Zone of the object node at `path`.
///
/// Enhancement and stratagem zones are checked first since their field
/// rules replace generic handling entirely; profile comes before stats.
pub fn classify(path: &Path) -> Zone {
    if is_enhancement_path(path) {
        Zone::Enhancement
    } else if is_stratagem_path(path) {
        Zone::Stratagem
    } else if is_profile_path(path) {
        Zone::Profile
    } else if is_stats_path(path) {
        Zone::Stats
    } else {
        Zone::Generic
    }
}
