//! Управление временем симуляции

use std::fmt;
use std::ops::Add;
use serde::{Serialize, Deserialize};

/// Момент модельного времени (в секундах)
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct SimTime(f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    pub fn new(seconds: f64) -> Self {
        if seconds.is_finite() {
            SimTime(seconds.max(0.0))
        } else {
            SimTime::ZERO
        }
    }

    pub fn as_seconds(&self) -> f64 {
        self.0
    }

    /// Сколько прошло от `earlier` до `self` (не меньше нуля)
    pub fn since(&self, earlier: SimTime) -> Duration {
        Duration::from_seconds((self.0 - earlier.0).max(0.0))
    }

    /// Формат `м:сс Min`, как в журнале событий
    pub fn minutes_display(&self) -> String {
        let total = self.0.max(0.0);
        let mins = (total / 60.0).floor() as u64;
        let secs = (total % 60.0).floor() as u64;
        format!("{}:{:02} Min", mins, secs)
    }
}

impl Add<Duration> for SimTime {
    type Output = Self;

    fn add(self, other: Duration) -> Self {
        SimTime(self.0 + other.as_seconds())
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.3}s", self.0)
    }
}

/// Длительность в модельных секундах
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Duration(f64);

impl Duration {
    pub const ZERO: Duration = Duration(0.0);

    pub fn from_seconds(secs: f64) -> Self {
        Duration(secs)
    }

    pub fn as_seconds(&self) -> f64 {
        self.0
    }
}

impl Add for Duration {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Duration(self.0 + other.0)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:.1}s", self.0)
    }
}

/// Часы одного прогона
#[derive(Debug, Clone)]
pub struct Clock {
    now: SimTime,
    last_event: SimTime,
    next_arrival: SimTime,
    end_time: Option<SimTime>,
}

impl Clock {
    /// Новые часы на нуле; первое прибытие через `first_gap`
    pub fn new(first_gap: Duration) -> Self {
        let mut clock = Self {
            now: SimTime::ZERO,
            last_event: SimTime::ZERO,
            next_arrival: SimTime::ZERO,
            end_time: None,
        };
        clock.schedule_arrival(first_gap);
        clock
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn last_event(&self) -> SimTime {
        self.last_event
    }

    pub fn next_arrival(&self) -> SimTime {
        self.next_arrival
    }

    pub fn end_time(&self) -> Option<SimTime> {
        self.end_time
    }

    pub fn set_end_time(&mut self, end: Option<SimTime>) {
        self.end_time = end;
    }

    /// Переводит часы на момент события. Время назад не идёт.
    pub fn advance_to(&mut self, time: SimTime) {
        self.last_event = self.now;
        if time > self.now {
            self.now = time;
        }
    }

    /// Следующее прибытие строго позже текущего момента, иначе через 1 с
    pub fn schedule_arrival(&mut self, gap: Duration) {
        let candidate = self.now + gap;
        self.next_arrival = if candidate > self.now {
            candidate
        } else {
            self.now + Duration::from_seconds(1.0)
        };
    }

    pub fn reached_end(&self) -> bool {
        matches!(self.end_time, Some(end) if self.now >= end)
    }
}
