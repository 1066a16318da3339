use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Identifiant fort d'un membre du personnel (code court, ex. `NJAM`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(String);

impl StaffId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().trim().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("unknown {what}: {value}")]
pub struct ParseCodeError {
    pub what: &'static str,
    pub value: String,
}

impl ParseCodeError {
    fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_string(),
        }
    }
}

/// Unité de laboratoire où le poste est tenu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabUnit {
    #[serde(alias = "main_lab")]
    Main,
    #[serde(alias = "emd", alias = "emergency_lab")]
    Emergency,
    #[serde(alias = "bima_lab")]
    Bima,
    #[serde(alias = "tb_lab")]
    Tb,
}

impl LabUnit {
    pub const ALL: [LabUnit; 4] = [LabUnit::Main, LabUnit::Emergency, LabUnit::Bima, LabUnit::Tb];

    pub fn code(self) -> &'static str {
        match self {
            LabUnit::Main => "main",
            LabUnit::Emergency => "emergency",
            LabUnit::Bima => "bima",
            LabUnit::Tb => "tb",
        }
    }
}

impl fmt::Display for LabUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LabUnit {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "main" | "main_lab" => Ok(LabUnit::Main),
            "emergency" | "emd" | "emergency_lab" => Ok(LabUnit::Emergency),
            "bima" | "bima_lab" => Ok(LabUnit::Bima),
            "tb" | "tb_lab" => Ok(LabUnit::Tb),
            _ => Err(ParseCodeError::new("lab unit", s)),
        }
    }
}

/// Type de poste tenu sur une journée.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShiftType {
    /// Heures ordinaires (poste de jour).
    #[serde(rename = "OH")]
    Oh,
    /// Après-midi.
    #[serde(rename = "PM")]
    Pm,
    /// Poste de jour au labo des urgences.
    #[serde(rename = "EMD")]
    Emd,
    /// Poste de jour au labo BIMA.
    #[serde(rename = "BIMA")]
    Bima,
    #[serde(rename = "N")]
    Night,
    /// Journée de récupération après une paire de nuits.
    #[serde(rename = "SD")]
    ShortDay,
    #[serde(rename = "DO")]
    DayOff,
}

impl ShiftType {
    pub const COUNT: usize = 7;
    pub const ALL: [ShiftType; ShiftType::COUNT] = [
        ShiftType::Oh,
        ShiftType::Pm,
        ShiftType::Emd,
        ShiftType::Bima,
        ShiftType::Night,
        ShiftType::ShortDay,
        ShiftType::DayOff,
    ];

    pub fn code(self) -> &'static str {
        match self {
            ShiftType::Oh => "OH",
            ShiftType::Pm => "PM",
            ShiftType::Emd => "EMD",
            ShiftType::Bima => "BIMA",
            ShiftType::Night => "N",
            ShiftType::ShortDay => "SD",
            ShiftType::DayOff => "DO",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Unités où ce poste peut être tenu. Vide pour SD et DO.
    pub fn units(self) -> &'static [LabUnit] {
        match self {
            ShiftType::Oh => &[LabUnit::Main, LabUnit::Tb],
            ShiftType::Pm => &[LabUnit::Main, LabUnit::Emergency],
            ShiftType::Emd => &[LabUnit::Emergency],
            ShiftType::Bima => &[LabUnit::Bima],
            ShiftType::Night => &[LabUnit::Main, LabUnit::Emergency],
            ShiftType::ShortDay | ShiftType::DayOff => &[],
        }
    }

    pub fn applies_to(self, unit: LabUnit) -> bool {
        self.units().contains(&unit)
    }

    /// SD et DO : jamais pris dans une liste de préférences.
    pub fn is_recovery(self) -> bool {
        matches!(self, ShiftType::ShortDay | ShiftType::DayOff)
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ShiftType {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OH" => Ok(ShiftType::Oh),
            "PM" => Ok(ShiftType::Pm),
            "EMD" | "OH+EMD" => Ok(ShiftType::Emd),
            "BIMA" | "OH+BIMA" => Ok(ShiftType::Bima),
            "N" => Ok(ShiftType::Night),
            "SD" => Ok(ShiftType::ShortDay),
            "DO" => Ok(ShiftType::DayOff),
            _ => Err(ParseCodeError::new("shift type", s)),
        }
    }
}

/// Catégorie de prédominance : affinité principale d'une personne.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredominanceCategory {
    StrictOh,
    #[serde(alias = "oh_weekdays_pm_weekends")]
    OhWeekdayPmWeekendShuffle,
    #[serde(alias = "oh_weekdays_pm_sunday")]
    OhWeekdayPmSunday,
    EmdPredominant,
    PmPredominant,
    NightPredominant,
    BimaPredominant,
    #[serde(alias = "default")]
    General,
}

impl PredominanceCategory {
    pub const ALL: [PredominanceCategory; 8] = [
        PredominanceCategory::StrictOh,
        PredominanceCategory::OhWeekdayPmWeekendShuffle,
        PredominanceCategory::OhWeekdayPmSunday,
        PredominanceCategory::EmdPredominant,
        PredominanceCategory::PmPredominant,
        PredominanceCategory::NightPredominant,
        PredominanceCategory::BimaPredominant,
        PredominanceCategory::General,
    ];

    pub fn code(self) -> &'static str {
        match self {
            PredominanceCategory::StrictOh => "strict_oh",
            PredominanceCategory::OhWeekdayPmWeekendShuffle => "oh_weekday_pm_weekend_shuffle",
            PredominanceCategory::OhWeekdayPmSunday => "oh_weekday_pm_sunday",
            PredominanceCategory::EmdPredominant => "emd_predominant",
            PredominanceCategory::PmPredominant => "pm_predominant",
            PredominanceCategory::NightPredominant => "night_predominant",
            PredominanceCategory::BimaPredominant => "bima_predominant",
            PredominanceCategory::General => "general",
        }
    }

    /// Postes interdits à cette catégorie, quel que soit le repli.
    pub fn hard_exclusions(self) -> &'static [ShiftType] {
        match self {
            PredominanceCategory::StrictOh => &[ShiftType::Pm, ShiftType::Emd, ShiftType::Bima],
            _ => &[],
        }
    }

    pub fn allows_nights(self) -> bool {
        !matches!(
            self,
            PredominanceCategory::StrictOh | PredominanceCategory::PmPredominant
        )
    }

    pub fn default_weekend(self) -> Option<WeekendPreference> {
        match self {
            PredominanceCategory::OhWeekdayPmWeekendShuffle => Some(WeekendPreference::PmShuffle),
            PredominanceCategory::OhWeekdayPmSunday => Some(WeekendPreference::SundayOnly),
            _ => None,
        }
    }

    pub fn default_units(self) -> BTreeSet<LabUnit> {
        let mut units = BTreeSet::from([LabUnit::Main]);
        match self {
            PredominanceCategory::EmdPredominant => {
                units.insert(LabUnit::Emergency);
            }
            PredominanceCategory::BimaPredominant => {
                units.insert(LabUnit::Bima);
            }
            _ => {}
        }
        units
    }
}

impl fmt::Display for PredominanceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PredominanceCategory {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "strict_oh" => Ok(PredominanceCategory::StrictOh),
            "oh_weekday_pm_weekend_shuffle" | "oh_weekdays_pm_weekends" => {
                Ok(PredominanceCategory::OhWeekdayPmWeekendShuffle)
            }
            "oh_weekday_pm_sunday" | "oh_weekdays_pm_sunday" => {
                Ok(PredominanceCategory::OhWeekdayPmSunday)
            }
            "emd_predominant" | "emd" => Ok(PredominanceCategory::EmdPredominant),
            "pm_predominant" | "pm" => Ok(PredominanceCategory::PmPredominant),
            "night_predominant" | "night" => Ok(PredominanceCategory::NightPredominant),
            "bima_predominant" | "bima" => Ok(PredominanceCategory::BimaPredominant),
            "general" | "default" | "" => Ok(PredominanceCategory::General),
            _ => Err(ParseCodeError::new("predominance category", s)),
        }
    }
}

/// Jour de week-end travaillé.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekendPreference {
    #[serde(alias = "saturday")]
    SaturdayOnly,
    #[serde(alias = "sunday")]
    SundayOnly,
    /// Alterne samedi et dimanche d'une semaine à l'autre.
    #[serde(alias = "shuffle")]
    PmShuffle,
}

impl FromStr for WeekendPreference {
    type Err = ParseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "saturday" | "saturday_only" | "sat" => Ok(WeekendPreference::SaturdayOnly),
            "sunday" | "sunday_only" | "sun" => Ok(WeekendPreference::SundayOnly),
            "shuffle" | "pm_shuffle" => Ok(WeekendPreference::PmShuffle),
            _ => Err(ParseCodeError::new("weekend preference", s)),
        }
    }
}

/// Membre du personnel du laboratoire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub id: StaffId,
    pub name: String,
    pub category: PredominanceCategory,
    #[serde(default)]
    pub weekend: Option<WeekendPreference>,
    pub units: BTreeSet<LabUnit>,
    #[serde(default)]
    pub night_eligible: bool,
}

impl Staff {
    pub fn new<I: AsRef<str>, N: Into<String>>(
        id: I,
        name: N,
        category: PredominanceCategory,
    ) -> Self {
        Self {
            id: StaffId::new(id),
            name: name.into(),
            category,
            weekend: None,
            units: category.default_units(),
            night_eligible: category == PredominanceCategory::NightPredominant,
        }
    }

    pub fn with_weekend(mut self, weekend: WeekendPreference) -> Self {
        self.weekend = Some(weekend);
        self
    }

    pub fn with_units<I: IntoIterator<Item = LabUnit>>(mut self, units: I) -> Self {
        self.units = units.into_iter().collect();
        self
    }

    pub fn with_night_eligible(mut self, eligible: bool) -> Self {
        self.night_eligible = eligible;
        self
    }

    /// Tag de week-end, sinon celui de la catégorie.
    pub fn weekend_preference(&self) -> Option<WeekendPreference> {
        self.weekend.or(self.category.default_weekend())
    }

    pub fn can_work_nights(&self) -> bool {
        self.night_eligible && self.category.allows_nights()
    }

    /// Vrai si `shift` ne peut jamais être attribué à cette personne.
    pub fn is_excluded(&self, shift: ShiftType) -> bool {
        self.category.hard_exclusions().contains(&shift)
            || (shift == ShiftType::Night && !self.can_work_nights())
    }

    pub fn works_in(&self, unit: LabUnit) -> bool {
        self.units.contains(&unit)
    }
}

/// Congé approuvé, bornes incluses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRecord {
    pub staff: StaffId,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl LeaveRecord {
    pub fn new<S: AsRef<str>>(staff: S, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            staff: StaffId::new(staff),
            start,
            end,
        }
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Cellule (personne, jour) du planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RosterCell {
    Duty {
        shift: ShiftType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<LabUnit>,
    },
    /// Congé approuvé.
    Absent,
    Unassigned,
}

impl RosterCell {
    pub fn duty(shift: ShiftType, unit: LabUnit) -> Self {
        RosterCell::Duty {
            shift,
            unit: Some(unit),
        }
    }

    pub fn off() -> Self {
        RosterCell::Duty {
            shift: ShiftType::DayOff,
            unit: None,
        }
    }

    pub fn short_day() -> Self {
        RosterCell::Duty {
            shift: ShiftType::ShortDay,
            unit: None,
        }
    }

    pub fn shift(&self) -> Option<ShiftType> {
        match self {
            RosterCell::Duty { shift, .. } => Some(*shift),
            _ => None,
        }
    }

    pub fn unit(&self) -> Option<LabUnit> {
        match self {
            RosterCell::Duty { unit, .. } => *unit,
            _ => None,
        }
    }

    pub fn is(&self, shift: ShiftType) -> bool {
        self.shift() == Some(shift)
    }

    pub fn code(&self) -> &'static str {
        match self {
            RosterCell::Duty { shift, .. } => shift.code(),
            RosterCell::Absent => "A",
            RosterCell::Unassigned => "",
        }
    }
}

/// Matrice stockée dont le nombre de cellules ne correspond pas au personnel et aux dates.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("roster matrix has {cells} cells, expected {staff} staff x {days} days")]
pub struct MatrixShapeError {
    pub staff: usize,
    pub days: usize,
    pub cells: usize,
}

/// Matrice complète personne × jour, stockée ligne par personne.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix")]
pub struct RosterMatrix {
    pub staff: Vec<StaffId>,
    pub dates: Vec<NaiveDate>,
    cells: Vec<RosterCell>,
}

#[derive(Deserialize)]
struct RawMatrix {
    staff: Vec<StaffId>,
    dates: Vec<NaiveDate>,
    cells: Vec<RosterCell>,
}

impl TryFrom<RawMatrix> for RosterMatrix {
    type Error = MatrixShapeError;

    fn try_from(raw: RawMatrix) -> Result<Self, Self::Error> {
        Self::from_parts(raw.staff, raw.dates, raw.cells)
    }
}

impl RosterMatrix {
    pub fn new(staff: Vec<StaffId>, dates: Vec<NaiveDate>) -> Self {
        let cells = vec![RosterCell::Unassigned; staff.len() * dates.len()];
        Self {
            staff,
            dates,
            cells,
        }
    }

    /// Reconstruit une matrice depuis ses cellules en vérifiant les dimensions.
    pub fn from_parts(
        staff: Vec<StaffId>,
        dates: Vec<NaiveDate>,
        cells: Vec<RosterCell>,
    ) -> Result<Self, MatrixShapeError> {
        if cells.len() != staff.len() * dates.len() {
            return Err(MatrixShapeError {
                staff: staff.len(),
                days: dates.len(),
                cells: cells.len(),
            });
        }
        Ok(Self {
            staff,
            dates,
            cells,
        })
    }

    pub fn day_count(&self) -> usize {
        self.dates.len()
    }

    pub fn staff_index(&self, id: &StaffId) -> Option<usize> {
        self.staff.iter().position(|s| s == id)
    }

    pub fn cell(&self, staff: usize, day: usize) -> RosterCell {
        self.cells[staff * self.dates.len() + day]
    }

    pub fn set(&mut self, staff: usize, day: usize, cell: RosterCell) {
        let days = self.dates.len();
        self.cells[staff * days + day] = cell;
    }

    pub fn row(&self, staff: usize) -> &[RosterCell] {
        let days = self.dates.len();
        &self.cells[staff * days..(staff + 1) * days]
    }

    pub fn get(&self, id: &StaffId, date: NaiveDate) -> Option<RosterCell> {
        let staff = self.staff_index(id)?;
        let day = self.dates.iter().position(|d| *d == date)?;
        Some(self.cell(staff, day))
    }

    /// Cellules de tout le personnel pour un jour, dans l'ordre des personnes.
    pub fn column(&self, day: usize) -> impl Iterator<Item = (usize, RosterCell)> + '_ {
        (0..self.staff.len()).map(move |staff| (staff, self.cell(staff, day)))
    }
}
