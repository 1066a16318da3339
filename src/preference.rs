//! Profils de préférence.
//!
//! Chaque catégorie donne des listes ordonnées de postes (semaine, jour de
//! week-end travaillé, autre jour de week-end). Le registre les résout une
//! fois par personne et répond aux requêtes de rang par simple lecture.

use crate::calendar::{Day, DayKind};
use crate::model::{PredominanceCategory, ShiftType, Staff, WeekendPreference};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Candidats ordonnés d'une catégorie, meilleur d'abord.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryRanking {
    pub weekday: Vec<ShiftType>,
    /// Jour de week-end travaillé (voir [`WeekendPreference`]).
    #[serde(default)]
    pub working_weekend: Vec<ShiftType>,
    /// Tout autre jour de week-end ou férié.
    #[serde(default)]
    pub rest_weekend: Vec<ShiftType>,
}

impl CategoryRanking {
    pub fn new(weekday: &[ShiftType], working_weekend: &[ShiftType], rest_weekend: &[ShiftType]) -> Self {
        Self {
            weekday: weekday.to_vec(),
            working_weekend: working_weekend.to_vec(),
            rest_weekend: rest_weekend.to_vec(),
        }
    }

    fn all(&self) -> impl Iterator<Item = ShiftType> + '_ {
        self.weekday
            .iter()
            .chain(&self.working_weekend)
            .chain(&self.rest_weekend)
            .copied()
    }
}

/// Table catégorie → classement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankingTable(BTreeMap<PredominanceCategory, CategoryRanking>);

impl Default for RankingTable {
    fn default() -> Self {
        use PredominanceCategory as C;
        use ShiftType::*;

        let mut table = BTreeMap::new();
        table.insert(C::StrictOh, CategoryRanking::new(&[Oh], &[Oh], &[]));
        table.insert(C::OhWeekdayPmWeekendShuffle, CategoryRanking::new(&[Oh], &[Pm], &[]));
        table.insert(C::OhWeekdayPmSunday, CategoryRanking::new(&[Oh], &[Pm], &[]));
        table.insert(C::EmdPredominant, CategoryRanking::new(&[Emd, Oh, Pm], &[Emd, Oh], &[]));
        table.insert(C::PmPredominant, CategoryRanking::new(&[Pm, Oh], &[Pm], &[]));
        table.insert(C::NightPredominant, CategoryRanking::new(&[Night, Oh], &[Night, Oh], &[Night]));
        table.insert(C::BimaPredominant, CategoryRanking::new(&[Bima, Oh], &[Oh, Bima], &[]));
        table.insert(C::General, CategoryRanking::new(&[Oh], &[Oh], &[]));
        Self(table)
    }
}

impl RankingTable {
    pub fn get(&self, category: PredominanceCategory) -> Option<&CategoryRanking> {
        self.0.get(&category)
    }

    pub fn with(mut self, category: PredominanceCategory, ranking: CategoryRanking) -> Self {
        self.0.insert(category, ranking);
        self
    }

    /// Applique `overrides` par-dessus cette table.
    pub fn merged(mut self, overrides: BTreeMap<PredominanceCategory, CategoryRanking>) -> Self {
        self.0.extend(overrides);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PredominanceCategory, &CategoryRanking)> {
        self.0.iter()
    }
}

#[derive(Debug, Clone)]
struct Profile {
    ranking: CategoryRanking,
    weekend: Option<WeekendPreference>,
    broad: BTreeSet<ShiftType>,
}

/// Profils résolus, indexés par position.
#[derive(Debug, Clone)]
pub struct PreferenceRegistry {
    profiles: Vec<Profile>,
}

impl PreferenceRegistry {
    /// Exclusions dures et inaptitude aux nuits sont filtrées ici : aucune
    /// requête ultérieure ne peut les faire ressortir.
    pub fn build(staff: &[Staff], table: &RankingTable) -> Self {
        let profiles = staff
            .iter()
            .map(|member| {
                let source = table.get(member.category).cloned().unwrap_or_default();
                let keep = |list: &[ShiftType]| -> Vec<ShiftType> {
                    let mut out: Vec<ShiftType> = Vec::with_capacity(list.len());
                    for shift in list {
                        if member.is_excluded(*shift) {
                            tracing::debug!(staff = %member.id, %shift, "ranked shift excluded");
                            continue;
                        }
                        if shift.is_recovery() || out.contains(shift) {
                            continue;
                        }
                        out.push(*shift);
                    }
                    out
                };
                let ranking = CategoryRanking {
                    weekday: keep(&source.weekday),
                    working_weekend: keep(&source.working_weekend),
                    rest_weekend: keep(&source.rest_weekend),
                };
                let mut broad: BTreeSet<ShiftType> = ranking.all().collect();
                if member.can_work_nights() {
                    broad.insert(ShiftType::Night);
                }
                Profile {
                    ranking,
                    weekend: member.weekend_preference(),
                    broad,
                }
            })
            .collect();
        Self { profiles }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Candidats ordonnés de `staff` pour `day`, meilleur d'abord.
    pub fn candidates(&self, staff: usize, day: &Day) -> &[ShiftType] {
        let profile = &self.profiles[staff];
        match day.kind() {
            DayKind::Weekday => &profile.ranking.weekday,
            _ if works_weekend_day(profile.weekend, day) => &profile.ranking.working_weekend,
            _ => &profile.ranking.rest_weekend,
        }
    }

    /// Position de `shift` parmi les candidats du jour.
    pub fn rank(&self, staff: usize, day: &Day, shift: ShiftType) -> Option<usize> {
        self.candidates(staff, day).iter().position(|s| *s == shift)
    }

    /// Tous les postes que la personne peut tenir un jour ou l'autre.
    pub fn is_broadly_eligible(&self, staff: usize, shift: ShiftType) -> bool {
        self.profiles[staff].broad.contains(&shift)
    }
}

/// Indique si `day` (week-end ou férié) est le jour travaillé de la personne.
pub fn works_weekend_day(pref: Option<WeekendPreference>, day: &Day) -> bool {
    match (pref, day.kind()) {
        (_, DayKind::Weekday) => true,
        (Some(WeekendPreference::SaturdayOnly), DayKind::Saturday) => true,
        (Some(WeekendPreference::SundayOnly), DayKind::Sunday) => true,
        (Some(WeekendPreference::PmShuffle), DayKind::Saturday) => day.week_index() % 2 == 0,
        (Some(WeekendPreference::PmShuffle), DayKind::Sunday) => day.week_index() % 2 == 1,
        _ => false,
    }
}
