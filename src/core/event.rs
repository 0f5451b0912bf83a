//! Система событий для симуляции

use std::cmp::Ordering;
use super::time::SimTime;
use crate::resources::ServerId;

/// Приоритет события при совпадении времени (меньше = важнее)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    High = 0,
    Normal = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Arrival,
    Departure(ServerId),
}

/// Кандидат на следующее событие
#[derive(Debug, Clone, Copy)]
pub struct Event {
    pub time: SimTime,
    pub priority: Priority,
    pub kind: EventKind,
}

impl Event {
    /// Прибытие выигрывает у окончания обслуживания в тот же момент
    pub fn arrival(time: SimTime) -> Self {
        Self {
            time,
            priority: Priority::High,
            kind: EventKind::Arrival,
        }
    }

    pub fn departure(time: SimTime, server: ServerId) -> Self {
        Self {
            time,
            priority: Priority::Normal,
            kind: EventKind::Departure(server),
        }
    }

    fn tie_key(&self) -> u32 {
        match self.kind {
            EventKind::Arrival => 0,
            EventKind::Departure(server) => server.0,
        }
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Раньше = меньше; затем приоритет; затем меньший id сервера
        match self.time.partial_cmp(&other.time) {
            Some(Ordering::Equal) | None => {
                match self.priority.cmp(&other.priority) {
                    Ordering::Equal => self.tie_key().cmp(&other.tie_key()),
                    other => other,
                }
            }
            Some(ordering) => ordering,
        }
    }
}

/// Выбирает ближайшее событие среди прибытия и завершений обслуживания
pub fn next_event<I>(next_arrival: SimTime, completions: I) -> Event
where
    I: IntoIterator<Item = (ServerId, SimTime)>,
{
    completions
        .into_iter()
        .map(|(server, time)| Event::departure(time, server))
        .fold(Event::arrival(next_arrival), |best, candidate| {
            if candidate < best { candidate } else { best }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: f64) -> SimTime {
        SimTime::new(secs)
    }

    #[test]
    fn earlier_departure_wins() {
        let ev = next_event(t(10.0), vec![(ServerId(1), t(4.0)), (ServerId(2), t(3.0))]);
        assert_eq!(ev.kind, EventKind::Departure(ServerId(2)));
        assert_eq!(ev.time, t(3.0));
    }

    #[test]
    fn arrival_wins_ties() {
        let ev = next_event(t(5.0), vec![(ServerId(1), t(5.0))]);
        assert_eq!(ev.kind, EventKind::Arrival);
    }

    #[test]
    fn equal_completions_go_to_lowest_server_id() {
        let ev = next_event(t(50.0), vec![(ServerId(7), t(5.0)), (ServerId(3), t(5.0))]);
        assert_eq!(ev.kind, EventKind::Departure(ServerId(3)));
    }

    #[test]
    fn no_busy_servers_means_arrival() {
        let ev = next_event(t(1.5), Vec::new());
        assert_eq!(ev.kind, EventKind::Arrival);
        assert_eq!(ev.time, t(1.5));
    }
}
