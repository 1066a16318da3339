use crate::calendar::Day;
use crate::config::ConfigError;
use crate::model::{LabUnit, ShiftType};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Clé de jour de la table de couverture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageDay {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
    Holiday,
}

impl CoverageDay {
    pub const WEEKDAYS: [CoverageDay; 5] = [
        CoverageDay::Mon,
        CoverageDay::Tue,
        CoverageDay::Wed,
        CoverageDay::Thu,
        CoverageDay::Fri,
    ];
    pub const WEEKEND: [CoverageDay; 2] = [CoverageDay::Sat, CoverageDay::Sun];
    pub const DAILY: [CoverageDay; 7] = [
        CoverageDay::Mon,
        CoverageDay::Tue,
        CoverageDay::Wed,
        CoverageDay::Thu,
        CoverageDay::Fri,
        CoverageDay::Sat,
        CoverageDay::Sun,
    ];

    pub fn of(day: &Day) -> Self {
        if day.holiday {
            CoverageDay::Holiday
        } else {
            day.weekday.into()
        }
    }
}

impl From<Weekday> for CoverageDay {
    fn from(w: Weekday) -> Self {
        match w {
            Weekday::Mon => CoverageDay::Mon,
            Weekday::Tue => CoverageDay::Tue,
            Weekday::Wed => CoverageDay::Wed,
            Weekday::Thu => CoverageDay::Thu,
            Weekday::Fri => CoverageDay::Fri,
            Weekday::Sat => CoverageDay::Sat,
            Weekday::Sun => CoverageDay::Sun,
        }
    }
}

/// Bornes d'effectif d'une cellule. `max = None` : pas de plafond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRequirement {
    pub min: u32,
    pub max: Option<u32>,
}

impl CoverageRequirement {
    pub const UNBOUNDED: CoverageRequirement = CoverageRequirement { min: 0, max: None };

    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    pub fn exactly(count: u32) -> Self {
        Self {
            min: count,
            max: Some(count),
        }
    }

    pub fn is_satisfied(&self, count: u32) -> bool {
        count >= self.min
    }

    pub fn has_room(&self, count: u32) -> bool {
        self.max.map_or(true, |max| count < max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoverageKey {
    pub unit: LabUnit,
    pub day: CoverageDay,
    pub shift: ShiftType,
}

/// (unité, jour, poste) → (min, max). Construite une fois par run, en lecture seule ensuite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageTable {
    entries: BTreeMap<CoverageKey, CoverageRequirement>,
}

impl CoverageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(
        &mut self,
        unit: LabUnit,
        day: CoverageDay,
        shift: ShiftType,
        req: CoverageRequirement,
    ) -> Result<(), ConfigError> {
        if !shift.applies_to(unit) {
            return Err(ConfigError::InapplicableShift { unit, shift });
        }
        if req.max.is_some_and(|max| max < req.min) {
            return Err(ConfigError::InvalidBounds {
                unit,
                shift,
                min: req.min,
                max: req.max.unwrap_or_default(),
            });
        }
        self.entries.insert(CoverageKey { unit, day, shift }, req);
        Ok(())
    }

    /// Variante builder de [`CoverageTable::set`] sur plusieurs jours.
    pub fn require<I: IntoIterator<Item = CoverageDay>>(
        mut self,
        unit: LabUnit,
        days: I,
        shift: ShiftType,
        min: u32,
        max: Option<u32>,
    ) -> Result<Self, ConfigError> {
        for day in days {
            self.set(unit, day, shift, CoverageRequirement::new(min, max))?;
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bornes d'une cellule. Un férié sans entrée propre reprend celle du
    /// dimanche ; une cellule sans entrée n'est pas bornée.
    pub fn lookup(&self, unit: LabUnit, day: &Day, shift: ShiftType) -> CoverageRequirement {
        let key = CoverageKey {
            unit,
            day: CoverageDay::of(day),
            shift,
        };
        if let Some(req) = self.entries.get(&key) {
            return *req;
        }
        if key.day == CoverageDay::Holiday {
            let sunday = CoverageKey {
                day: CoverageDay::Sun,
                ..key
            };
            if let Some(req) = self.entries.get(&sunday) {
                return *req;
            }
        }
        CoverageRequirement::UNBOUNDED
    }

    /// Toutes les cellules (unité, poste) ayant une entrée pour `day`, dans l'ordre des clés.
    pub fn requirements_for(&self, day: &Day) -> Vec<(LabUnit, ShiftType, CoverageRequirement)> {
        let target = CoverageDay::of(day);
        let mut cells: BTreeMap<(LabUnit, ShiftType), CoverageRequirement> = BTreeMap::new();
        if target == CoverageDay::Holiday {
            for (key, req) in self.entries.iter().filter(|(k, _)| k.day == CoverageDay::Sun) {
                cells.insert((key.unit, key.shift), *req);
            }
        }
        for (key, req) in self.entries.iter().filter(|(k, _)| k.day == target) {
            cells.insert((key.unit, key.shift), *req);
        }
        cells
            .into_iter()
            .map(|((unit, shift), req)| (unit, shift, req))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CoverageKey, &CoverageRequirement)> {
        self.entries.iter()
    }
}
