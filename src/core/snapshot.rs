//! The persisted household document.
//!
//! A [`Snapshot`] is the whole unit of state: the member ledger and the chore
//! catalogue. It is loaded, normalized, refreshed, optionally mutated by one
//! completion, and saved back within a single turn. Nothing outside the
//! snapshot carries state between turns.

use crate::core::schemas;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Member {
    #[serde(default)]
    pub points: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "RawChore")]
pub struct Chore {
    pub base_points: u32,
    pub location: String,
    pub last_completed_at: Option<String>,
    pub last_completed_by: Option<String>,
    /// Cached accrual value; rewritten on every refresh.
    pub current_points: u32,
    /// `None` means every current member may complete the chore.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligible_members: Option<BTreeSet<String>>,
}

/// Wire shape accepted on load, including the legacy key names and the
/// oldest schema where a chore only carried `points`.
#[derive(Deserialize)]
struct RawChore {
    #[serde(default, alias = "points_base")]
    base_points: Option<u32>,
    #[serde(default)]
    points: Option<u32>,
    #[serde(default, alias = "lieu")]
    location: String,
    #[serde(default, alias = "derniere_realisation")]
    last_completed_at: Option<String>,
    #[serde(default)]
    last_completed_by: Option<String>,
    #[serde(default, alias = "points_actuels")]
    current_points: Option<u32>,
    #[serde(default)]
    eligible_members: Option<BTreeSet<String>>,
}

impl From<RawChore> for Chore {
    fn from(raw: RawChore) -> Self {
        let base_points = raw
            .base_points
            .or(raw.points)
            .unwrap_or(schemas::MIN_BASE_POINTS);
        Chore {
            base_points,
            location: raw.location,
            last_completed_at: raw.last_completed_at,
            last_completed_by: raw.last_completed_by,
            current_points: raw.current_points.unwrap_or(base_points),
            eligible_members: raw.eligible_members,
        }
    }
}

impl Chore {
    pub fn new(base_points: u32, location: &str) -> Self {
        Chore {
            base_points,
            location: location.to_string(),
            last_completed_at: None,
            last_completed_by: None,
            current_points: base_points,
            eligible_members: None,
        }
    }

    pub fn is_restricted(&self) -> bool {
        self.eligible_members.is_some()
    }

    pub fn has_bonus(&self) -> bool {
        self.current_points > self.base_points
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    #[serde(default, alias = "colocataires")]
    pub members: BTreeMap<String, Member>,
    #[serde(default, alias = "taches")]
    pub chores: BTreeMap<String, Chore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Snapshot {
    /// Single load-time pass that backfills defaults and restores the
    /// per-chore invariants (`base_points >= 1`, `current_points >= base_points`).
    pub fn normalize(&mut self) {
        for chore in self.chores.values_mut() {
            if chore.base_points == 0 {
                chore.base_points = schemas::MIN_BASE_POINTS;
            }
            if chore.current_points < chore.base_points {
                chore.current_points = chore.base_points;
            }
            if chore
                .last_completed_at
                .as_deref()
                .is_some_and(|ts| ts.trim().is_empty())
            {
                chore.last_completed_at = None;
            }
            if chore
                .last_completed_by
                .as_deref()
                .is_some_and(|m| m.trim().is_empty())
            {
                chore.last_completed_by = None;
            }
        }
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn member_names(&self) -> Vec<String> {
        self.members.keys().cloned().collect()
    }

    /// SHA-256 over the canonical JSON form.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        format!("{:x}", hasher.finalize())
    }

    /// The household the game ships with.
    pub fn default_seed() -> Self {
        let members = ["Antoine", "Arthur", "Raphael", "Martin", "Perrinne"]
            .iter()
            .map(|name| (name.to_string(), Member::default()))
            .collect();
        let chores = DEFAULT_CHORES
            .iter()
            .map(|(name, points, location)| (name.to_string(), Chore::new(*points, location)))
            .collect();
        Snapshot {
            members,
            chores,
            last_updated: None,
            created_at: None,
        }
    }
}

const DEFAULT_CHORES: &[(&str, u32, &str)] = &[
    ("Faire la vaisselle", 2, "Cuisine"),
    ("Nettoyer le plan de travail", 1, "Cuisine"),
    ("Nettoyer les plaques de cuisson", 2, "Cuisine"),
    ("Nettoyer le four", 3, "Cuisine"),
    ("Nettoyer le micro-ondes", 2, "Cuisine"),
    ("Nettoyer le frigo (intérieur)", 3, "Cuisine"),
    ("Nettoyer l'évier", 1, "Cuisine"),
    ("Vider le lave-vaisselle", 1, "Cuisine"),
    ("Sortir les poubelles", 1, "Cuisine"),
    ("Nettoyer la hotte", 2, "Cuisine"),
    ("Ranger les courses", 1, "Cuisine"),
    ("Passer l'aspirateur salon", 2, "Salon"),
    ("Épousseter les meubles salon", 1, "Salon"),
    ("Nettoyer la table basse", 1, "Salon"),
    ("Ranger le salon", 1, "Salon"),
    ("Nettoyer les vitres salon", 2, "Salon"),
    ("Nettoyer les toilettes 1er", 2, "SDB 1er"),
    ("Nettoyer la douche 1er", 3, "SDB 1er"),
    ("Nettoyer le lavabo 1er", 1, "SDB 1er"),
    ("Nettoyer le miroir 1er", 1, "SDB 1er"),
    ("Passer la serpillière SDB 1er", 2, "SDB 1er"),
    ("Nettoyer les toilettes 2ème", 2, "SDB 2ème"),
    ("Nettoyer la douche 2ème", 3, "SDB 2ème"),
    ("Nettoyer le lavabo 2ème", 1, "SDB 2ème"),
    ("Nettoyer le miroir 2ème", 1, "SDB 2ème"),
    ("Passer la serpillière SDB 2ème", 2, "SDB 2ème"),
    ("Passer l'aspirateur escaliers", 2, "RDC"),
    ("Épousseter hall d'entrée", 1, "RDC"),
    ("Nettoyer les vitres RDC", 2, "RDC"),
    ("Passer la serpillière RDC", 2, "RDC"),
    ("Ranger le garage", 2, "Garage"),
    ("Balayer le garage", 1, "Garage"),
    ("Sortir les vélos", 1, "Garage"),
    ("Organiser les outils", 1, "Garage"),
    ("Tondre la pelouse", 3, "Jardin"),
    ("Arroser les plantes", 1, "Jardin"),
    ("Désherber", 2, "Jardin"),
    ("Tailler les haies", 3, "Jardin"),
    ("Ramasser les feuilles", 2, "Jardin"),
    ("Nettoyer la terrasse", 2, "Jardin"),
    ("Balayer la cour", 1, "Cour"),
    ("Nettoyer les marches", 1, "Cour"),
    ("Arroser les plantes cour", 1, "Cour"),
    ("Changer les draps communs", 2, "Général"),
    ("Faire une lessive commune", 2, "Général"),
    ("Repasser le linge commun", 2, "Général"),
    ("Acheter produits ménagers", 1, "Général"),
    ("Remplacer ampoules grillées", 1, "Général"),
    ("Nettoyer radiateurs", 2, "Général"),
    ("Dépoussiérer plinthes", 1, "Général"),
    ("Nettoyer interrupteurs", 1, "Général"),
];
