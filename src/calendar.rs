//! Horizon de planification et résolution des congés.
//!
//! Le calendrier des congés est déplié une fois par génération en masque de
//! disponibilité (personne × jour). Les entrées invalides sont ignorées et
//! signalées, jamais fatales.

use crate::model::{LeaveRecord, StaffId};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("invalid horizon: {0}")]
    InvalidHorizon(String),
    #[error("invalid leave range for {staff} ({start} .. {end}): {reason}")]
    InvalidLeaveRange {
        staff: StaffId,
        start: NaiveDate,
        end: NaiveDate,
        reason: &'static str,
    },
    #[error("leave record for unknown staff: {0}")]
    UnknownStaff(StaffId),
}

/// Dates consécutives couvertes par un planning, avec ses jours fériés.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Horizon {
    start: NaiveDate,
    len: usize,
    holidays: BTreeSet<NaiveDate>,
}

impl Horizon {
    pub fn new(start: NaiveDate, len: usize) -> Result<Self, CalendarError> {
        if len == 0 {
            return Err(CalendarError::InvalidHorizon(
                "horizon must span at least one day".into(),
            ));
        }
        let days = i64::try_from(len)
            .map_err(|_| CalendarError::InvalidHorizon("horizon too long".into()))?;
        if start.checked_add_signed(Duration::days(days)).is_none() {
            return Err(CalendarError::InvalidHorizon("date overflow".into()));
        }
        Ok(Self {
            start,
            len,
            holidays: BTreeSet::new(),
        })
    }

    /// Mois calendaire complet.
    pub fn month(year: i32, month: u32) -> Result<Self, CalendarError> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| CalendarError::InvalidHorizon(format!("no such month {year}-{month}")))?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| CalendarError::InvalidHorizon("date overflow".into()))?;
        let len = next.signed_duration_since(start).num_days() as usize;
        Self::new(start, len)
    }

    /// Les fériés hors horizon sont ignorés.
    pub fn with_holidays<I: IntoIterator<Item = NaiveDate>>(mut self, holidays: I) -> Self {
        let (start, end) = (self.start, self.end());
        self.holidays
            .extend(holidays.into_iter().filter(|d| *d >= start && *d <= end));
        self
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Dernière date, incluse.
    pub fn end(&self) -> NaiveDate {
        self.start + Duration::days(self.len as i64 - 1)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn holidays(&self) -> &BTreeSet<NaiveDate> {
        &self.holidays
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end()
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.contains(date)
            .then(|| date.signed_duration_since(self.start).num_days() as usize)
    }

    pub fn day(&self, index: usize) -> Option<Day> {
        if index >= self.len {
            return None;
        }
        let date = self.start + Duration::days(index as i64);
        Some(Day {
            index,
            date,
            weekday: date.weekday(),
            holiday: self.holidays.contains(&date),
        })
    }

    pub fn days(&self) -> impl Iterator<Item = Day> + '_ {
        (0..self.len).filter_map(move |i| self.day(i))
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days().map(|d| d.date).collect()
    }
}

/// Classe de jour pour les préférences. Un férié suit les règles du dimanche.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayKind {
    Weekday,
    Saturday,
    Sunday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Day {
    pub index: usize,
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub holiday: bool,
}

impl Day {
    /// Numéro de semaine compté depuis le premier jour de l'horizon.
    pub fn week_index(&self) -> usize {
        self.index / 7
    }

    pub fn kind(&self) -> DayKind {
        match self.weekday {
            _ if self.holiday => DayKind::Sunday,
            Weekday::Sat => DayKind::Saturday,
            Weekday::Sun => DayKind::Sunday,
            _ => DayKind::Weekday,
        }
    }

    pub fn is_weekend(&self) -> bool {
        self.kind() != DayKind::Weekday
    }
}

/// Disponibilité par personne et par jour, indexée par position.
#[derive(Debug, Clone)]
pub struct Availability {
    days: usize,
    on_leave: Vec<bool>,
}

impl Availability {
    pub fn all_available(staff: usize, days: usize) -> Self {
        Self {
            days,
            on_leave: vec![false; staff * days],
        }
    }

    pub fn is_available(&self, staff: usize, day: usize) -> bool {
        !self.is_on_leave(staff, day)
    }

    pub fn is_on_leave(&self, staff: usize, day: usize) -> bool {
        day < self.days && self.on_leave[staff * self.days + day]
    }

    /// Vrai si la personne est disponible sur chaque jour de
    /// `first..first + span` compris dans l'horizon.
    pub fn is_window_clear(&self, staff: usize, first: usize, span: usize) -> bool {
        (first..(first + span).min(self.days)).all(|d| self.is_available(staff, d))
    }

    fn block(&mut self, staff: usize, day: usize) {
        self.on_leave[staff * self.days + day] = true;
    }
}

/// Déplie `leave` en masque de disponibilité sur `staff` (ordre moteur).
///
/// Les entrées avec `start > end`, entièrement hors horizon ou visant une
/// personne inconnue sont ignorées et renvoyées comme erreurs.
/// Celles qui chevauchent un bord de l'horizon sont tronquées.
pub fn resolve_leave(
    horizon: &Horizon,
    staff: &[StaffId],
    leave: &[LeaveRecord],
) -> (Availability, Vec<CalendarError>) {
    let mut mask = Availability::all_available(staff.len(), horizon.len());
    let mut skipped = Vec::new();

    for record in leave {
        if record.start > record.end {
            tracing::warn!(staff = %record.staff, "leave record skipped: start after end");
            skipped.push(CalendarError::InvalidLeaveRange {
                staff: record.staff.clone(),
                start: record.start,
                end: record.end,
                reason: "start after end",
            });
            continue;
        }
        if record.end < horizon.start() || record.start > horizon.end() {
            tracing::debug!(staff = %record.staff, "leave record outside horizon");
            skipped.push(CalendarError::InvalidLeaveRange {
                staff: record.staff.clone(),
                start: record.start,
                end: record.end,
                reason: "outside horizon",
            });
            continue;
        }
        let Some(idx) = staff.iter().position(|s| *s == record.staff) else {
            tracing::warn!(staff = %record.staff, "leave record for unknown staff");
            skipped.push(CalendarError::UnknownStaff(record.staff.clone()));
            continue;
        };

        let first = record.start.max(horizon.start());
        let last = record.end.min(horizon.end());
        let (Some(from), Some(to)) = (horizon.index_of(first), horizon.index_of(last)) else {
            continue;
        };
        for day in from..=to {
            mask.block(idx, day);
        }
    }

    (mask, skipped)
}

/// Garde les congés utiles pour `horizon` : ceux qui le chevauchent, plus
/// les entrées invalides pour qu'elles soient quand même signalées.
pub fn leave_for_horizon(horizon: &Horizon, leave: &[LeaveRecord]) -> Vec<LeaveRecord> {
    leave
        .iter()
        .filter(|r| r.start > r.end || (r.end >= horizon.start() && r.start <= horizon.end()))
        .cloned()
        .collect()
}
