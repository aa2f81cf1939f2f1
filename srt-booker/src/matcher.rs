//! Departure time matching against the selection policy.
//!
//! Rows are trusted to be in ascending departure order as the site lists
//! them; nothing here re-sorts.

use tracing::debug;

use crate::domain::{ClockTime, SearchCriteria};
use crate::poller::{RowSnapshot, TrainRow};

/// Returns true if the row's departure satisfies the criteria's policy.
///
/// A row whose cell holds no recognisable "HH:MM" never matches.
pub fn matches<R>(row: &TrainRow<R>, criteria: &SearchCriteria) -> bool {
    row.departure()
        .is_some_and(|departure| criteria.policy.accepts(departure))
}

/// Matching rows of a snapshot, in row order, with their departure times.
pub fn candidates<'s, R>(
    snapshot: &'s RowSnapshot<R>,
    criteria: &'s SearchCriteria,
) -> impl Iterator<Item = (&'s TrainRow<R>, ClockTime)> + 's {
    snapshot.rows().iter().filter_map(move |row| {
        let Some(departure) = row.departure() else {
            debug!(text = row.departure_text(), "no departure time in row, skipping");
            return None;
        };
        if criteria.policy.accepts(departure) {
            Some((row, departure))
        } else {
            debug!(%departure, policy = %criteria.policy, "departure outside policy");
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PollConfig;
    use crate::domain::{PassengerCount, SelectionPolicy, StationName};
    use crate::fake::{FakeRow, RowSpec, ScriptedBoard, Step};
    use crate::poller::{AvailabilityPoller, Cycle};
    use chrono::NaiveDate;

    fn t(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    fn criteria(policy: SelectionPolicy) -> SearchCriteria {
        SearchCriteria::new(
            StationName::parse("수서").unwrap(),
            StationName::parse("동대구").unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 17).unwrap(),
            t("08:00"),
            PassengerCount::ONE,
            policy,
        )
    }

    async fn snapshot(texts: &[&str]) -> RowSnapshot<FakeRow> {
        let rows = texts.iter().map(|t| RowSpec::new(t)).collect();
        let board = ScriptedBoard::new([Step::Rows(rows)]);
        let config = PollConfig::default();
        AvailabilityPoller::new(&board, &config).poll().await.unwrap()
    }

    fn row(text: &str) -> TrainRow<()> {
        TrainRow::new(text, (), Cycle::default())
    }

    #[test]
    fn range_boundaries() {
        let c = criteria(SelectionPolicy::RangeTime(t("08:00"), t("19:00")));

        assert!(matches(&row("수서\n18:59"), &c));
        assert!(!matches(&row("수서\n19:00"), &c));
        assert!(!matches(&row("수서\n07:59"), &c));
    }

    #[test]
    fn exact_is_not_numeric_proximity() {
        let c = criteria(SelectionPolicy::ExactTime(t("08:00")));

        assert!(matches(&row("08:00"), &c));
        assert!(!matches(&row("08:01"), &c));
    }

    #[test]
    fn unparseable_rows_never_match() {
        let c = criteria(SelectionPolicy::FromTime(t("00:00")));

        assert!(!matches(&row(""), &c));
        assert!(!matches(&row("수서"), &c));
        assert!(!matches(&row("8:00"), &c));
    }

    #[tokio::test(start_paused = true)]
    async fn candidates_keep_row_order() {
        let snap = snapshot(&["수서\n06:00", "수서\n09:30", "매진", "수서\n08:15"]).await;
        let c = criteria(SelectionPolicy::FromTime(t("08:00")));

        let found: Vec<_> = candidates(&snap, &c).map(|(_, dep)| dep).collect();

        assert_eq!(found, vec![t("09:30"), t("08:15")]);
    }

    #[tokio::test(start_paused = true)]
    async fn first_candidate_trusts_row_order() {
        let snap = snapshot(&["수서\n10:00", "수서\n08:30"]).await;
        let c = criteria(SelectionPolicy::FromTime(t("08:00")));

        let (first, _) = candidates(&snap, &c).next().unwrap();

        assert_eq!(first.departure_text(), "수서\n10:00");
    }

    #[tokio::test(start_paused = true)]
    async fn no_match_in_snapshot() {
        let snap = snapshot(&["수서\n06:00", "수서\n07:00"]).await;
        let c = criteria(SelectionPolicy::ExactTime(t("08:00")));

        assert!(candidates(&snap, &c).next().is_none());
    }
}
