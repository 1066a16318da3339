use crate::coverage::{CoverageDay, CoverageRequirement, CoverageTable};
use crate::model::{LabUnit, PredominanceCategory, ShiftType};
use crate::preference::{CategoryRanking, RankingTable};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("shift {shift} cannot be served in unit {unit}")]
    InapplicableShift { unit: LabUnit, shift: ShiftType },
    #[error("invalid bounds for {unit}/{shift}: min {min} > max {max}")]
    InvalidBounds {
        unit: LabUnit,
        shift: ShiftType,
        min: u32,
        max: u32,
    },
    #[error("category {category} may never be ranked for {shift}")]
    HardExclusion {
        category: PredominanceCategory,
        shift: ShiftType,
    },
}

/// Configuration immuable d'un run, passée explicitement au moteur.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterConfig {
    pub coverage: CoverageTable,
    pub rankings: RankingTable,
}

impl RosterConfig {
    pub fn new(coverage: CoverageTable, rankings: RankingTable) -> Self {
        Self { coverage, rankings }
    }

    pub fn with_coverage(coverage: CoverageTable) -> Self {
        Self {
            coverage,
            rankings: RankingTable::default(),
        }
    }

    pub fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        let mut coverage = CoverageTable::new();
        for entry in &file.coverage {
            let req = CoverageRequirement::new(entry.min, entry.max);
            for selector in &entry.days {
                for day in selector.expand() {
                    coverage.set(entry.unit, *day, entry.shift, req)?;
                }
            }
        }
        for (category, ranking) in &file.rankings {
            let listed = ranking
                .weekday
                .iter()
                .chain(&ranking.working_weekend)
                .chain(&ranking.rest_weekend);
            for shift in listed {
                if category.hard_exclusions().contains(shift) {
                    return Err(ConfigError::HardExclusion {
                        category: *category,
                        shift: *shift,
                    });
                }
            }
        }
        let rankings = RankingTable::default().merged(file.rankings);
        Ok(Self { coverage, rankings })
    }
}

/// Forme sur disque de [`RosterConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub coverage: Vec<CoverageEntry>,
    #[serde(default)]
    pub rankings: BTreeMap<PredominanceCategory, CategoryRanking>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageEntry {
    pub unit: LabUnit,
    pub shift: ShiftType,
    pub days: Vec<DaySelector>,
    #[serde(default)]
    pub min: u32,
    #[serde(default)]
    pub max: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DaySelector {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
    Weekdays,
    Weekend,
    Daily,
    Holiday,
}

impl DaySelector {
    pub fn expand(self) -> &'static [CoverageDay] {
        match self {
            DaySelector::Mon => &[CoverageDay::Mon],
            DaySelector::Tue => &[CoverageDay::Tue],
            DaySelector::Wed => &[CoverageDay::Wed],
            DaySelector::Thu => &[CoverageDay::Thu],
            DaySelector::Fri => &[CoverageDay::Fri],
            DaySelector::Sat => &[CoverageDay::Sat],
            DaySelector::Sun => &[CoverageDay::Sun],
            DaySelector::Weekdays => &CoverageDay::WEEKDAYS,
            DaySelector::Weekend => &CoverageDay::WEEKEND,
            DaySelector::Daily => &CoverageDay::DAILY,
            DaySelector::Holiday => &[CoverageDay::Holiday],
        }
    }
}

pub fn parse_config(json: &str) -> anyhow::Result<RosterConfig> {
    let file: ConfigFile = serde_json::from_str(json).context("parsing roster config")?;
    Ok(RosterConfig::from_file(file)?)
}

pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<RosterConfig> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_config(&data).with_context(|| format!("loading config {}", path.display()))
}
